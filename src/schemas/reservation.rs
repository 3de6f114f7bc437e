use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use models::{Reservation, ReservationState};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use validator_derive::Validate;

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
	#[validate(range(
		min = 1,
		message = "at least one seat must be reserved",
		code = "seats-range"
	))]
	pub seats:      Option<i32>,
	#[validate(length(
		max = 500,
		message = "a note can be at most 500 characters long",
		code = "note-length"
	))]
	pub note:       Option<String>,
}

/// The visible window of a place calendar, a week back and two months ahead
/// unless asked otherwise
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
	#[serde(default = "default_window_from")]
	pub from:  NaiveDate,
	#[serde(default = "default_window_until")]
	pub until: NaiveDate,

	#[serde(default)]
	pub include_cancelled: bool,
}

fn default_window_from() -> NaiveDate {
	Utc::now().date_naive() - Days::new(7)
}

fn default_window_until() -> NaiveDate {
	Utc::now().date_naive() + Days::new(60)
}

#[skip_serializing_none]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
	pub id:         i32,
	pub place_id:   i32,
	pub place_name: Option<String>,
	pub requester:  Option<String>,
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
	pub state:      ReservationState,
	pub passed:     bool,
	pub seats:      Option<i32>,
	pub note:       Option<String>,
	pub decided_at: Option<NaiveDateTime>,
	pub created_at: NaiveDateTime,
}

impl ReservationResponse {
	/// Build a response for a reservation, deriving whether it has passed
	/// from the given clock
	#[must_use]
	pub fn build(
		reservation: Reservation,
		place_name: Option<String>,
		requester: Option<String>,
		now: NaiveDateTime,
	) -> Self {
		Self {
			id: reservation.id,
			place_id: reservation.place_id,
			place_name,
			requester,
			day: reservation.day,
			start_time: reservation.start_time,
			end_time: reservation.end_time,
			state: reservation.state,
			passed: reservation.is_passed(now),
			seats: reservation.seats,
			note: reservation.note,
			decided_at: reservation.decided_at,
			created_at: reservation.created_at,
		}
	}
}

/// A single busy block on a place calendar
///
/// The title is the requester's username for admins and for the requester
/// themselves, anyone else only sees an anonymized marker
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEventResponse {
	pub id:     i32,
	pub title:  String,
	pub start:  NaiveDateTime,
	pub end:    NaiveDateTime,
	pub state:  ReservationState,
	pub passed: bool,
}

impl CalendarEventResponse {
	#[must_use]
	pub fn build(
		reservation: &Reservation,
		title: String,
		now: NaiveDateTime,
	) -> Self {
		Self {
			id: reservation.id,
			title,
			start: reservation.day.and_time(reservation.start_time),
			end: reservation.day.and_time(reservation.end_time),
			state: reservation.state,
			passed: reservation.is_passed(now),
		}
	}
}
