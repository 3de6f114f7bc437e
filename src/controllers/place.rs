//! Controllers for places and their calendars

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, NoContent};
use chrono::Utc;
use common::{DbPool, Error, PaginationError};
use models::{
	NewReservation,
	Paginated,
	PaginationOptions,
	Place,
	PlaceFilter,
	PlaceKind,
	PlaceUpdate,
	Reservation,
};
use validator::Validate;

use crate::schemas::place::CreatePlaceRequest;
use crate::schemas::reservation::{
	CalendarEventResponse,
	CalendarQuery,
	CreateReservationRequest,
	ReservationResponse,
};
use crate::session::{AdminSession, Session};

/// The calendar title shown to users who may not see who booked a slot
const ANONYMOUS_TITLE: &str = "Reserved";

#[instrument(skip(pool))]
pub(crate) async fn create_place(
	State(pool): State<DbPool>,
	session: AdminSession,
	Json(request): Json<CreatePlaceRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;

	let place = request
		.into_new_place(session.data.profile_id)
		.insert(&conn)
		.await?;

	Ok((StatusCode::CREATED, Json(place)))
}

#[instrument(skip(pool))]
pub(crate) async fn get_places(
	State(pool): State<DbPool>,
	Query(filter): Query<PlaceFilter>,
	Query(pagination): Query<PaginationOptions>,
) -> Result<Json<Paginated<Vec<Place>>>, Error> {
	let conn = pool.get().await?;

	let (total, places) = Place::get_all(
		filter,
		pagination.limit(),
		pagination.offset(),
		&conn,
	)
	.await?;

	if pagination.offset() >= total && total > 0 {
		return Err(PaginationError::OffsetTooLarge.into());
	}

	Ok(Json(pagination.paginate(total, places)))
}

#[instrument(skip(pool))]
pub(crate) async fn get_place(
	State(pool): State<DbPool>,
	Path(p_id): Path<i32>,
) -> Result<Json<Place>, Error> {
	let conn = pool.get().await?;

	let place = Place::get_by_id(p_id, &conn).await?;

	Ok(Json(place))
}

#[instrument(skip(pool))]
pub(crate) async fn update_place(
	State(pool): State<DbPool>,
	_session: AdminSession,
	Path(p_id): Path<i32>,
	Json(update): Json<PlaceUpdate>,
) -> Result<Json<Place>, Error> {
	let conn = pool.get().await?;

	let place = update.apply_to(p_id, &conn).await?;

	Ok(Json(place))
}

#[instrument(skip(pool))]
pub(crate) async fn delete_place(
	State(pool): State<DbPool>,
	_session: AdminSession,
	Path(p_id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	Place::delete_by_id(p_id, &conn).await?;

	Ok(NoContent)
}

/// Get the busy calendar of a place for a logged in user
///
/// Admins and the requester of a slot see the requester's username as the
/// event title, everyone else sees an anonymized marker. Cancelled slots are
/// only included for admins who ask for them.
#[instrument(skip(pool))]
pub(crate) async fn get_place_calendar(
	State(pool): State<DbPool>,
	session: Session,
	Path(p_id): Path<i32>,
	Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEventResponse>>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	// 404 for unknown ids, the fail-open behaviour is for the public view only
	Place::get_by_id(p_id, &conn).await?;

	let include_cancelled =
		query.include_cancelled && session.data.profile_is_admin;

	let reservations = Reservation::calendar(
		p_id,
		query.from,
		query.until,
		include_cancelled,
		&conn,
	)
	.await?;

	let events = reservations
		.into_iter()
		.map(|(r, username)| {
			let title = if session.data.profile_is_admin
				|| r.profile_id == session.data.profile_id
			{
				username
			} else {
				ANONYMOUS_TITLE.to_string()
			};

			CalendarEventResponse::build(&r, title, now)
		})
		.collect();

	Ok(Json(events))
}

/// Get the busy calendar of a place without logging in
///
/// Slots are always anonymized and cancelled slots are never included. An
/// unknown place yields an empty calendar rather than an error so public
/// views keep rendering.
#[instrument(skip(pool))]
pub(crate) async fn get_public_calendar(
	State(pool): State<DbPool>,
	Path((p_kind, p_id)): Path<(PlaceKind, i32)>,
	Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarEventResponse>>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let Some(place) = Place::get_by_kind_and_id(p_kind, p_id, &conn).await?
	else {
		return Ok(Json(vec![]));
	};

	let reservations =
		Reservation::calendar(place.id, query.from, query.until, false, &conn)
			.await?;

	let events = reservations
		.into_iter()
		.map(|(r, _)| {
			CalendarEventResponse::build(&r, ANONYMOUS_TITLE.to_string(), now)
		})
		.collect();

	Ok(Json(events))
}

/// Book a slot on a place
///
/// The booking lands as a pending reservation awaiting an admin decision
#[instrument(skip(pool))]
pub(crate) async fn create_reservation(
	State(pool): State<DbPool>,
	session: Session,
	Path(p_id): Path<i32>,
	Json(request): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, Error> {
	request.validate()?;

	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let reservation = NewReservation {
		place_id:   p_id,
		profile_id: session.data.profile_id,
		day:        request.day,
		start_time: request.start_time,
		end_time:   request.end_time,
		seats:      request.seats,
		note:       request.note,
	}
	.insert(&conn)
	.await?;

	let response = ReservationResponse::build(reservation, None, None, now);

	Ok((StatusCode::CREATED, Json(response)))
}
