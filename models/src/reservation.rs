use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::{DbConn, Error, ReservationError};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::schema::{place, profile, reservation, reservation_proposal};
use crate::{Place, PlaceState, ProposalStatus};

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::ReservationState"]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
	#[default]
	Pending,
	Approved,
	Cancelled,
	Suggested,
}

/// Test whether two half-open `[start, end)` intervals overlap
///
/// Back-to-back intervals (`a_end == b_start`) do not overlap
#[must_use]
pub fn overlaps(
	a_start: NaiveTime,
	a_end: NaiveTime,
	b_start: NaiveTime,
	b_end: NaiveTime,
) -> bool {
	a_start < b_end && b_start < a_end
}

/// Validate the shape and timing of a requested interval
///
/// The server clock is authoritative here, any client-side gating of past
/// slots is a UX convenience only
pub fn check_interval(
	day: NaiveDate,
	start: NaiveTime,
	end: NaiveTime,
	now: NaiveDateTime,
) -> Result<(), Error> {
	if start >= end {
		return Err(ReservationError::InvalidInterval.into());
	}

	if day.and_time(start) < now {
		return Err(ReservationError::InPast.into());
	}

	Ok(())
}

/// Find a non-cancelled reservation on `(place, day)` overlapping the given
/// interval, skipping the excluded id when rescheduling
///
/// Must run inside the same transaction as the write it gates
pub(crate) fn find_conflict(
	conn: &mut PgConnection,
	p_id: i32,
	on_day: NaiveDate,
	from: NaiveTime,
	until: NaiveTime,
	exclude: Option<i32>,
) -> QueryResult<Option<i32>> {
	use crate::schema::reservation::dsl::*;

	let booked: Vec<(i32, NaiveTime, NaiveTime)> = reservation
		.filter(place_id.eq(p_id))
		.filter(day.eq(on_day))
		.filter(state.ne(ReservationState::Cancelled))
		.select((id, start_time, end_time))
		.order(start_time.asc())
		.get_results(conn)?;

	let conflict = booked
		.into_iter()
		.filter(|(r_id, _, _)| Some(*r_id) != exclude)
		.find(|(_, b_start, b_end)| overlaps(from, until, *b_start, *b_end))
		.map(|(r_id, _, _)| r_id);

	Ok(conflict)
}

/// A single reservation of a place
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = reservation)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
	pub id:         i32,
	pub place_id:   i32,
	pub profile_id: i32,
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
	pub state:      ReservationState,
	pub seats:      Option<i32>,
	pub note:       Option<String>,
	pub decided_by: Option<i32>,
	pub decided_at: Option<NaiveDateTime>,
	pub created_at: NaiveDateTime,
	pub updated_at: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationFilter {
	pub state:    Option<ReservationState>,
	pub place_id: Option<i32>,
	pub day:      Option<NaiveDate>,
}

impl Reservation {
	/// Whether the end time of this reservation has elapsed
	///
	/// Derived at read time, never stored
	#[must_use]
	pub fn is_passed(&self, now: NaiveDateTime) -> bool {
		self.day.and_time(self.end_time) <= now
	}

	/// Get a [`Reservation`] given its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(r_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let reservation = conn
			.interact(move |conn| {
				use crate::schema::reservation::dsl::*;

				reservation
					.find(r_id)
					.select(Self::as_select())
					.get_result(conn)
			})
			.await??;

		Ok(reservation)
	}

	/// Get all reservations of a profile along with the place names
	#[instrument(skip(conn))]
	pub async fn for_profile(
		p_id: i32,
		conn: &DbConn,
	) -> Result<Vec<(Self, String)>, Error> {
		let reservations = conn
			.interact(move |conn| {
				reservation::table
					.inner_join(place::table)
					.filter(reservation::profile_id.eq(p_id))
					.order((reservation::day.desc(), reservation::start_time))
					.select((Self::as_select(), place::name))
					.get_results(conn)
			})
			.await??;

		Ok(reservations)
	}

	/// Get a filtered and paginated list of all reservations along with the
	/// place name and requester username, newest first
	///
	/// This is the admin review queue
	#[instrument(skip(conn))]
	pub async fn get_all(
		filter: ReservationFilter,
		limit: i64,
		offset: i64,
		conn: &DbConn,
	) -> Result<(i64, Vec<(Self, String, String)>), Error> {
		let reservations = conn
			.interact(move |conn| {
				let mut query = reservation::table
					.inner_join(place::table)
					.inner_join(profile::table)
					.into_boxed();
				let mut count = reservation::table.into_boxed();

				if let Some(s) = filter.state {
					query = query.filter(reservation::state.eq(s));
					count = count.filter(reservation::state.eq(s));
				}

				if let Some(p) = filter.place_id {
					query = query.filter(reservation::place_id.eq(p));
					count = count.filter(reservation::place_id.eq(p));
				}

				if let Some(d) = filter.day {
					query = query.filter(reservation::day.eq(d));
					count = count.filter(reservation::day.eq(d));
				}

				let total = count.count().get_result(conn)?;

				let data = query
					.order((reservation::day.desc(), reservation::start_time))
					.limit(limit)
					.offset(offset)
					.select((Self::as_select(), place::name, profile::username))
					.get_results(conn)?;

				Ok::<_, diesel::result::Error>((total, data))
			})
			.await??;

		Ok(reservations)
	}

	/// Get the busy calendar of a place over a visible window along with the
	/// requester usernames
	///
	/// Cancelled reservations are only included when asked for, and even then
	/// they are never part of the busy set used for conflict checking. An
	/// unknown place id simply yields an empty calendar so views keep
	/// rendering.
	#[instrument(skip(conn))]
	pub async fn calendar(
		p_id: i32,
		from: NaiveDate,
		until: NaiveDate,
		include_cancelled: bool,
		conn: &DbConn,
	) -> Result<Vec<(Self, String)>, Error> {
		let reservations = conn
			.interact(move |conn| {
				let mut query = reservation::table
					.inner_join(profile::table)
					.filter(reservation::place_id.eq(p_id))
					.filter(reservation::day.between(from, until))
					.into_boxed();

				if !include_cancelled {
					query = query.filter(
						reservation::state.ne(ReservationState::Cancelled),
					);
				}

				query
					.order((reservation::day, reservation::start_time))
					.select((Self::as_select(), profile::username))
					.get_results(conn)
			})
			.await??;

		Ok(reservations)
	}

	/// Approve a pending [`Reservation`]
	///
	/// The conflict check reruns inside the same serializable transaction as
	/// the state flip, another reservation may have been approved since this
	/// one was created. On conflict the reservation stays pending.
	#[instrument(skip(conn))]
	pub async fn approve_by(
		r_id: i32,
		admin_id: i32,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let now = Utc::now().naive_utc();

		let approved = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<Self, Error> {
						let current: Self = reservation::table
							.find(r_id)
							.select(Self::as_select())
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
							current.day,
							current.start_time,
							current.end_time,
							Some(r_id),
						)? {
							return Err(ReservationError::SlotConflict {
								conflicting,
							}
							.into());
						}

						let approved = diesel::update(
							reservation::table.find(r_id),
						)
						.set((
							reservation::state.eq(ReservationState::Approved),
							reservation::decided_by.eq(admin_id),
							reservation::decided_at.eq(now),
							reservation::updated_at.eq(now),
						))
						.returning(Self::as_returning())
						.get_result(conn)?;

						Ok(approved)
					},
				)
			})
			.await??;

		info!("approved reservation {r_id} by admin {admin_id}");

		Ok(approved)
	}

	/// Cancel a [`Reservation`]
	///
	/// Idempotent, cancelling an already cancelled reservation is a no-op.
	/// Never consults the conflict checker. Open proposals on the
	/// reservation are invalidated in the same transaction.
	///
	/// Returns the reservation and whether anything changed.
	#[instrument(skip(conn))]
	pub async fn cancel_by(
		r_id: i32,
		actor_id: i32,
		conn: &DbConn,
	) -> Result<(Self, bool), Error> {
		let now = Utc::now().naive_utc();

		let cancelled = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<(Self, bool), Error> {
						let current: Self = reservation::table
							.find(r_id)
							.select(Self::as_select())
							.get_result(conn)?;

						if current.state == ReservationState::Cancelled {
							return Ok((current, false));
						}

						if current.is_passed(now) {
							return Err(ReservationError::AlreadyPassed.into());
						}

						diesel::update(
							reservation_proposal::table
								.filter(
									reservation_proposal::reservation_id
										.eq(r_id),
								)
								.filter(
									reservation_proposal::status
										.eq(ProposalStatus::Pending),
								),
						)
						.set((
							reservation_proposal::status
								.eq(ProposalStatus::Declined),
							reservation_proposal::responded_at.eq(now),
						))
						.execute(conn)?;

						let cancelled = diesel::update(
							reservation::table.find(r_id),
						)
						.set((
							reservation::state.eq(ReservationState::Cancelled),
							reservation::decided_by.eq(actor_id),
							reservation::decided_at.eq(now),
							reservation::updated_at.eq(now),
						))
						.returning(Self::as_returning())
						.get_result(conn)?;

						Ok((cancelled, true))
					},
				)
			})
			.await??;

		if cancelled.1 {
			info!("cancelled reservation {r_id} by profile {actor_id}");
		}

		Ok(cancelled)
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = reservation)]
#[diesel(check_for_backend(Pg))]
pub struct NewReservation {
	pub place_id:   i32,
	pub profile_id: i32,
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
	pub seats:      Option<i32>,
	pub note:       Option<String>,
}

impl NewReservation {
	/// Insert this [`NewReservation`] as a pending reservation
	///
	/// The overlap check and the insert run in one serializable transaction,
	/// two racing bookings for the same slot either serialize cleanly or one
	/// of them aborts with a retryable conflict.
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<Reservation, Error> {
		let now = Utc::now().naive_utc();

		check_interval(self.day, self.start_time, self.end_time, now)?;

		let reservation = conn
			.interact(move |conn| {
				conn.build_transaction().serializable().run(
					|conn| -> Result<Reservation, Error> {
						let booked_place: Place = place::table
							.find(self.place_id)
							.select(Place::as_select())
							.get_result(conn)
							.optional()?
							.ok_or_else(|| {
								Error::NotFound(format!(
									"no place with id {}",
									self.place_id
								))
							})?;

						if booked_place.state != PlaceState::Available {
							return Err(
								ReservationError::PlaceUnavailable.into()
							);
						}

						match (self.seats, booked_place.seat_count) {
							(Some(_), None) => {
								return Err(
									ReservationError::SeatsNotSupported.into()
								);
							},
							(Some(seats), Some(capacity))
								if seats > capacity =>
							{
								return Err(ReservationError::TooManySeats {
									capacity,
								}
								.into());
							},
							_ => {},
						}

						if let Some(conflicting) = find_conflict(
							conn,
							self.place_id,
							self.day,
							self.start_time,
							self.end_time,
							None,
						)? {
							return Err(ReservationError::SlotConflict {
								conflicting,
							}
							.into());
						}

						let reservation = diesel::insert_into(
							reservation::table,
						)
						.values(self)
						.returning(Reservation::as_returning())
						.get_result(conn)?;

						Ok(reservation)
					},
				)
			})
			.await??;

		info!("created reservation {reservation:?}");

		Ok(reservation)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn t(h: u32, m: u32) -> NaiveTime {
		NaiveTime::from_hms_opt(h, m, 0).unwrap()
	}

	#[test]
	fn overlapping_intervals_overlap() {
		assert!(overlaps(t(10, 0), t(11, 0), t(10, 30), t(11, 30)));
		assert!(overlaps(t(10, 30), t(11, 30), t(10, 0), t(11, 0)));
		assert!(overlaps(t(10, 0), t(12, 0), t(10, 30), t(11, 0)));
		assert!(overlaps(t(10, 0), t(11, 0), t(10, 0), t(11, 0)));
	}

	#[test]
	fn back_to_back_intervals_do_not_overlap() {
		assert!(!overlaps(t(10, 0), t(11, 0), t(11, 0), t(12, 0)));
		assert!(!overlaps(t(11, 0), t(12, 0), t(10, 0), t(11, 0)));
	}

	#[test]
	fn disjoint_intervals_do_not_overlap() {
		assert!(!overlaps(t(8, 0), t(9, 0), t(11, 0), t(12, 0)));
	}

	#[test]
	fn interval_start_must_come_before_end() {
		let day = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
		let now = NaiveDate::from_ymd_opt(2030, 1, 1)
			.unwrap()
			.and_time(t(0, 0));

		assert!(check_interval(day, t(11, 0), t(10, 0), now).is_err());
		assert!(check_interval(day, t(10, 0), t(10, 0), now).is_err());
		assert!(check_interval(day, t(10, 0), t(11, 0), now).is_ok());
	}

	#[test]
	fn interval_in_the_past_is_rejected() {
		let day = NaiveDate::from_ymd_opt(2020, 1, 10).unwrap();
		let now = NaiveDate::from_ymd_opt(2030, 1, 1)
			.unwrap()
			.and_time(t(0, 0));

		assert!(check_interval(day, t(10, 0), t(11, 0), now).is_err());
	}
}
