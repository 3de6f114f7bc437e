//! Controllers for the tokenized proposal flow
//!
//! These routes are reached through a mailed single-use link and require no
//! session, the token itself is the proof of authorization

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use common::{DbPool, Error};
use models::{
	Notification,
	Place,
	Profile,
	Reservation,
	ReservationProposal,
};

use crate::mailer::Mailer;
use crate::schemas::proposal::{CounterProposalRequest, ProposalResponse};
use crate::schemas::reservation::ReservationResponse;

/// Notify the admin who made a proposal of the requester's response
async fn notify_proposer(
	proposer_id: i32,
	reservation: &Reservation,
	outcome: &str,
	pool: &DbPool,
	mailer: &Mailer,
) -> Result<(), Error> {
	let conn = pool.get().await?;

	let place = Place::get_by_id(reservation.place_id, &conn).await?;
	let proposer = Profile::get(proposer_id, &conn).await?;

	Notification::create(
		proposer.id,
		format!("Your suggested time for {} was {outcome}", place.name),
		&conn,
	)
	.await?;

	mailer.send_proposal_update(&proposer, &place.name, outcome).await?;

	Ok(())
}

/// Get the proposal behind a token for rendering the response form
#[instrument(skip(pool))]
pub(crate) async fn get_proposal(
	State(pool): State<DbPool>,
	Path(token): Path<String>,
) -> Result<Json<ProposalResponse>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (proposal, reservation, place_name) =
		ReservationProposal::get_by_token(token, &conn).await?;

	Ok(Json(ProposalResponse::build(proposal, reservation, place_name, now)))
}

/// Accept the suggested time, approving the reservation at that time
#[instrument(skip(pool, mailer))]
pub(crate) async fn accept_proposal(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	Path(token): Path<String>,
) -> Result<Json<ReservationResponse>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (proposal, reservation) =
		ReservationProposal::accept_by_token(token, &conn).await?;

	notify_proposer(
		proposal.created_by,
		&reservation,
		"accepted",
		&pool,
		&mailer,
	)
	.await?;

	let place = Place::get_by_id(reservation.place_id, &conn).await?;
	let requester = Profile::get(reservation.profile_id, &conn).await?;

	mailer
		.send_reservation_approved(&requester, &reservation, &place.name)
		.await?;

	let response =
		ReservationResponse::build(reservation, Some(place.name), None, now);

	Ok(Json(response))
}

/// Decline the suggested time, cancelling the reservation
#[instrument(skip(pool, mailer))]
pub(crate) async fn decline_proposal(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	Path(token): Path<String>,
) -> Result<Json<ReservationResponse>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (proposal, reservation) =
		ReservationProposal::decline_by_token(token, &conn).await?;

	notify_proposer(
		proposal.created_by,
		&reservation,
		"declined",
		&pool,
		&mailer,
	)
	.await?;

	let response = ReservationResponse::build(reservation, None, None, now);

	Ok(Json(response))
}

/// Counter the suggested time with a new requested interval
///
/// The reservation returns to pending at the new time for a fresh admin
/// decision
#[instrument(skip(pool, mailer))]
pub(crate) async fn counter_proposal(
	State(pool): State<DbPool>,
	State(mailer): State<Mailer>,
	Path(token): Path<String>,
	Json(request): Json<CounterProposalRequest>,
) -> Result<Json<ReservationResponse>, Error> {
	let conn = pool.get().await?;
	let now = Utc::now().naive_utc();

	let (proposal, reservation) = ReservationProposal::counter_by_token(
		token,
		request.day,
		request.start_time,
		request.end_time,
		&conn,
	)
	.await?;

	notify_proposer(
		proposal.created_by,
		&reservation,
		"countered",
		&pool,
		&mailer,
	)
	.await?;

	let response = ReservationResponse::build(reservation, None, None, now);

	Ok(Json(response))
}
