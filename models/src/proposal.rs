use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use common::{DbConn, Error, ProposalError, ReservationError};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::reservation::{check_interval, find_conflict};
use crate::schema::{place, reservation, reservation_proposal};
use crate::{Reservation, ReservationState};

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::ProposalStatus"]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
	#[default]
	Pending,
	Accepted,
	Declined,
}

/// An admin counter-offer of a different time for a reservation, resolved by
/// the requester through a single-use tokenized mail link
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = reservation_proposal)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct ReservationProposal {
	pub id:              i32,
	pub reservation_id:  i32,
	pub suggested_day:   NaiveDate,
	pub suggested_start: NaiveTime,
	pub suggested_end:   NaiveTime,
	pub notes:           Option<String>,
	#[serde(skip)]
	pub token:           String,
	pub status:          ProposalStatus,
	pub expires_at:      NaiveDateTime,
	pub responded_at:    Option<NaiveDateTime>,
	pub created_by:      i32,
	pub created_at:      NaiveDateTime,
}

/// Load the pending unexpired proposal for a token, together with its
/// reservation
///
/// Any failure collapses into [`ProposalError::InvalidToken`], the caller
/// must not learn whether the token was unknown, expired, or consumed
fn active_by_token(
	conn: &mut PgConnection,
	p_token: &str,
	now: NaiveDateTime,
) -> Result<(ReservationProposal, Reservation), Error> {
	let found: Option<(ReservationProposal, Reservation)> =
		reservation_proposal::table
			.inner_join(reservation::table)
			.filter(reservation_proposal::token.eq(p_token))
			.select((
				ReservationProposal::as_select(),
				Reservation::as_select(),
			))
			.get_result(conn)
			.optional()?;

	let Some((proposal, reservation)) = found else {
		return Err(ProposalError::InvalidToken.into());
	};

	if proposal.status != ProposalStatus::Pending
		|| proposal.expires_at <= now
		|| reservation.state != ReservationState::Suggested
	{
		return Err(ProposalError::InvalidToken.into());
	}

	Ok((proposal, reservation))
}

impl ReservationProposal {
	/// Get the proposal behind a token for rendering the response form,
	/// along with its reservation and the place name
	#[instrument(skip(conn))]
	pub async fn get_by_token(
		p_token: String,
		conn: &DbConn,
	) -> Result<(Self, Reservation, String), Error> {
		let now = Utc::now().naive_utc();

		let found = conn
			.interact(move |conn| {
				let (proposal, reservation) =
					active_by_token(conn, &p_token, now)?;

				let place_name = place::table
					.find(reservation.place_id)
					.select(place::name)
					.get_result(conn)?;

				Ok::<_, Error>((proposal, reservation, place_name))
			})
			.await??;

		Ok(found)
	}

	/// Accept the suggested time behind a token
	///
	/// Rewrites the reservation to the suggested interval and approves it.
	/// The conflict check reruns inside the transaction, if the slot was
	/// taken in the meantime the accept fails and nothing changes.
	#[instrument(skip(conn))]
	pub async fn accept_by_token(
		p_token: String,
		conn: &DbConn,
	) -> Result<(Self, Reservation), Error> {
		let now = Utc::now().naive_utc();

		let accepted = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<(Self, Reservation), Error> {
						let (proposal, reservation) =
							active_by_token(conn, &p_token, now)?;

						check_interval(
							proposal.suggested_day,
							proposal.suggested_start,
							proposal.suggested_end,
							now,
						)?;

						if let Some(conflicting) = find_conflict(
							conn,
							reservation.place_id,
							proposal.suggested_day,
							proposal.suggested_start,
							proposal.suggested_end,
							Some(reservation.id),
						)? {
							return Err(ReservationError::SlotConflict {
								conflicting,
							}
							.into());
						}

						let reservation = diesel::update(
							reservation::table.find(reservation.id),
						)
						.set((
							reservation::day.eq(proposal.suggested_day),
							reservation::start_time
								.eq(proposal.suggested_start),
							reservation::end_time.eq(proposal.suggested_end),
							reservation::state.eq(ReservationState::Approved),
							reservation::decided_by.eq(proposal.created_by),
							reservation::decided_at.eq(now),
							reservation::updated_at.eq(now),
						))
						.returning(Reservation::as_returning())
						.get_result(conn)?;

						let proposal = diesel::update(
							reservation_proposal::table.find(proposal.id),
						)
						.set((
							reservation_proposal::status
								.eq(ProposalStatus::Accepted),
							reservation_proposal::responded_at.eq(now),
						))
						.returning(Self::as_returning())
						.get_result(conn)?;

						Ok((proposal, reservation))
					},
				)
			})
			.await??;

		info!("accepted proposal {} via token", accepted.0.id);

		Ok(accepted)
	}

	/// Decline the suggested time behind a token, cancelling the reservation
	#[instrument(skip(conn))]
	pub async fn decline_by_token(
		p_token: String,
		conn: &DbConn,
	) -> Result<(Self, Reservation), Error> {
		let now = Utc::now().naive_utc();

		let declined = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<(Self, Reservation), Error> {
						let (proposal, reservation) =
							active_by_token(conn, &p_token, now)?;

						let reservation = diesel::update(
							reservation::table.find(reservation.id),
						)
						.set((
							reservation::state.eq(ReservationState::Cancelled),
							reservation::decided_at.eq(now),
							reservation::updated_at.eq(now),
						))
						.returning(Reservation::as_returning())
						.get_result(conn)?;

						let proposal = diesel::update(
							reservation_proposal::table.find(proposal.id),
						)
						.set((
							reservation_proposal::status
								.eq(ProposalStatus::Declined),
							reservation_proposal::responded_at.eq(now),
						))
						.returning(Self::as_returning())
						.get_result(conn)?;

						Ok((proposal, reservation))
					},
				)
			})
			.await??;

		info!("declined proposal {} via token", declined.0.id);

		Ok(declined)
	}

	/// Counter the suggested time behind a token with a new requested
	/// interval
	///
	/// The reservation returns to pending with the new time for a fresh
	/// admin decision, the proposal is consumed as declined. The new
	/// interval passes the same past and conflict gates as any booking.
	#[instrument(skip(conn))]
	pub async fn counter_by_token(
		p_token: String,
		new_day: NaiveDate,
		new_start: NaiveTime,
		new_end: NaiveTime,
		conn: &DbConn,
	) -> Result<(Self, Reservation), Error> {
		let now = Utc::now().naive_utc();

		check_interval(new_day, new_start, new_end, now)?;

		let countered = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<(Self, Reservation), Error> {
						let (proposal, reservation) =
							active_by_token(conn, &p_token, now)?;

						if let Some(conflicting) = find_conflict(
							conn,
							reservation.place_id,
							new_day,
							new_start,
							new_end,
							Some(reservation.id),
						)? {
							return Err(ReservationError::SlotConflict {
								conflicting,
							}
							.into());
						}

						let reservation = diesel::update(
							reservation::table.find(reservation.id),
						)
						.set((
							reservation::day.eq(new_day),
							reservation::start_time.eq(new_start),
							reservation::end_time.eq(new_end),
							reservation::state.eq(ReservationState::Pending),
							reservation::updated_at.eq(now),
						))
						.returning(Reservation::as_returning())
						.get_result(conn)?;

						let proposal = diesel::update(
							reservation_proposal::table.find(proposal.id),
						)
						.set((
							reservation_proposal::status
								.eq(ProposalStatus::Declined),
							reservation_proposal::responded_at.eq(now),
						))
						.returning(Self::as_returning())
						.get_result(conn)?;

						Ok((proposal, reservation))
					},
				)
			})
			.await??;

		info!("countered proposal {} via token", countered.0.id);

		Ok(countered)
	}
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NewProposal {
	pub reservation_id:  i32,
	pub suggested_day:   NaiveDate,
	pub suggested_start: NaiveTime,
	pub suggested_end:   NaiveTime,
	pub notes:           Option<String>,
	pub created_by:      i32,
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = reservation_proposal)]
#[diesel(check_for_backend(Pg))]
struct InsertableProposal {
	reservation_id:  i32,
	suggested_day:   NaiveDate,
	suggested_start: NaiveTime,
	suggested_end:   NaiveTime,
	notes:           Option<String>,
	token:           String,
	expires_at:      NaiveDateTime,
	created_by:      i32,
}

impl NewProposal {
	/// Insert this [`NewProposal`] with a fresh single-use token, moving the
	/// reservation to the suggested state
	///
	/// The suggested interval passes the same past and conflict gates as any
	/// booking before the proposal is created.
	#[instrument(skip(conn))]
	pub async fn insert(
		self,
		lifetime: TimeDelta,
		conn: &DbConn,
	) -> Result<(ReservationProposal, Reservation), Error> {
		let now = Utc::now().naive_utc();

		check_interval(
			self.suggested_day,
			self.suggested_start,
			self.suggested_end,
			now,
		)?;

		let insertable = InsertableProposal {
			reservation_id:  self.reservation_id,
			suggested_day:   self.suggested_day,
			suggested_start: self.suggested_start,
			suggested_end:   self.suggested_end,
			notes:           self.notes,
			token:           Uuid::new_v4().to_string(),
			expires_at:      now + lifetime,
			created_by:      self.created_by,
		};

		let suggested = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<(ReservationProposal, Reservation), Error> {
						let current: Reservation = reservation::table
							.find(insertable.reservation_id)
							.select(Reservation::as_select())
							.get_result(conn)?;

						if current.state != ReservationState::Pending {
							return Err(ReservationError::AlreadyDecided.into());
						}

						if current.is_passed(now) {
							return Err(ReservationError::AlreadyPassed.into());
						}

						if let Some(conflicting) = find_conflict(
							conn,
							current.place_id,
							insertable.suggested_day,
							insertable.suggested_start,
							insertable.suggested_end,
							Some(current.id),
						)? {
							return Err(ReservationError::SlotConflict {
								conflicting,
							}
							.into());
						}

						let reservation = diesel::update(
							reservation::table.find(current.id),
						)
						.set((
							reservation::state.eq(ReservationState::Suggested),
							reservation::updated_at.eq(now),
						))
						.returning(Reservation::as_returning())
						.get_result(conn)?;

						let proposal = diesel::insert_into(
							reservation_proposal::table,
						)
						.values(insertable)
						.returning(ReservationProposal::as_returning())
						.get_result(conn)?;

						Ok((proposal, reservation))
					},
				)
			})
			.await??;

		info!(
			"created proposal {} for reservation {}",
			suggested.0.id, suggested.1.id
		);

		Ok(suggested)
	}
}
