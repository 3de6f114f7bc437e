//! Controllers for the reservation lifecycle

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use chrono::Utc;
use common::{DbPool, Error, PaginationError};
use models::{
	NewProposal,
	Notification,
	Paginated,
	PaginationOptions,
	Place,
	Profile,
	Reservation,
	ReservationFilter,
};
use validator::Validate;

use crate::Config;
use crate::mailer::Mailer;
use crate::schemas::proposal::SuggestTimeRequest;
use crate::schemas::reservation::ReservationResponse;
use crate::session::{AdminSession, Session};

/// Get all reservations of the current profile
#[instrument(skip(pool))]
pub(crate) async fn get_my_reservations(
	State(pool): State<DbPool>,
	session: Session,
) -> Result<Json<Vec<ReservationResponse>>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let reservations =
		Reservation::for_profile(session.data.profile_id, &conn).await?;

	let response = reservations
		.into_iter()
		.map(|(r, place_name)| {
			ReservationResponse::build(r, Some(place_name), None, now)
		})
		.collect();

	Ok(Json(response))
}

/// Get the filtered and paginated admin review queue
#[instrument(skip(pool))]
pub(crate) async fn get_all_reservations(
	State(pool): State<DbPool>,
	_session: AdminSession,
	Query(filter): Query<ReservationFilter>,
	Query(pagination): Query<PaginationOptions>,
) -> Result<Json<Paginated<Vec<ReservationResponse>>>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (total, reservations) = Reservation::get_all(
		filter,
		pagination.limit(),
		pagination.offset(),
		&conn,
	)
	.await?;

	if pagination.offset() >= total && total > 0 {
		return Err(PaginationError::OffsetTooLarge.into());
	}

	let response = reservations
		.into_iter()
		.map(|(r, place_name, username)| {
			ReservationResponse::build(
				r,
				Some(place_name),
				Some(username),
				now,
			)
		})
		.collect();

	Ok(Json(pagination.paginate(total, response)))
}

/// Approve a pending reservation
///
/// The requester is notified in-app and by mail
#[instrument(skip(pool, mailer))]
pub(crate) async fn approve_reservation(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	session: AdminSession,
	Path(r_id): Path<i32>,
) -> Result<Json<ReservationResponse>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let reservation =
		Reservation::approve_by(r_id, session.data.profile_id, &conn).await?;

	let place = Place::get_by_id(reservation.place_id, &conn).await?;
	let requester = Profile::get(reservation.profile_id, &conn).await?;

	Notification::create(
		requester.id,
		format!(
			"Your reservation for {} on {} was approved",
			place.name, reservation.day
		),
		&conn,
	)
	.await?;

	mailer
		.send_reservation_approved(&requester, &reservation, &place.name)
		.await?;

	let response =
		ReservationResponse::build(reservation, Some(place.name), None, now);

	Ok(Json(response))
}

/// Cancel a reservation
///
/// Allowed for the requester themselves and for admins. Cancelling an
/// already cancelled reservation is a no-op. When an admin cancels someone
/// else's reservation the requester is notified.
#[instrument(skip(pool, mailer))]
pub(crate) async fn cancel_reservation(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	session: Session,
	Path(r_id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	let current = Reservation::get_by_id(r_id, &conn).await?;

	let is_owner = current.profile_id == session.data.profile_id;

	if !is_owner && !session.data.profile_is_admin {
		return Err(Error::Forbidden);
	}

	let (reservation, changed) =
		Reservation::cancel_by(r_id, session.data.profile_id, &conn).await?;

	if changed && !is_owner {
		let place = Place::get_by_id(reservation.place_id, &conn).await?;
		let requester = Profile::get(reservation.profile_id, &conn).await?;

		Notification::create(
			requester.id,
			format!(
				"Your reservation for {} on {} was cancelled",
				place.name, reservation.day
			),
			&conn,
		)
		.await?;

		mailer
			.send_reservation_cancelled(&requester, &reservation, &place.name)
			.await?;
	}

	Ok(NoContent)
}

/// Suggest a different time for a pending reservation
///
/// Moves the reservation to the suggested state and mails the requester a
/// single-use link to accept, decline, or counter the suggestion
#[instrument(skip(pool, mailer, config))]
pub(crate) async fn suggest_time(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	State(config): State<Config>,
	session: AdminSession,
	Path(r_id): Path<i32>,
	Json(request): Json<SuggestTimeRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (proposal, reservation) = NewProposal {
		reservation_id:  r_id,
		suggested_day:   request.day,
		suggested_start: request.start_time,
		suggested_end:   request.end_time,
		notes:           request.notes,
		created_by:      session.data.profile_id,
	}
	.insert(config.proposal_token_lifetime, &conn)
	.await?;

	let place = Place::get_by_id(reservation.place_id, &conn).await?;
	let requester = Profile::get(reservation.profile_id, &conn).await?;

	Notification::create(
		requester.id,
		format!(
			"A different time was suggested for your reservation for {}",
			place.name
		),
		&conn,
	)
	.await?;

	mailer
		.send_time_suggested(
			&requester,
			&proposal,
			&place.name,
			&config.frontend_url,
			config.proposal_token_lifetime.num_days(),
		)
		.await?;

	let response =
		ReservationResponse::build(reservation, Some(place.name), None, now);

	Ok((StatusCode::CREATED, Json(response)))
}
