use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use models::{Reservation, ReservationProposal};
use serde::{Deserialize, Serialize};
use validator_derive::Validate;

use crate::schemas::reservation::ReservationResponse;

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SuggestTimeRequest {
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
	#[validate(length(
		max = 500,
		message = "a note can be at most 500 characters long",
		code = "notes-length"
	))]
	pub notes:      Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterProposalRequest {
	pub day:        NaiveDate,
	pub start_time: NaiveTime,
	pub end_time:   NaiveTime,
}

/// Everything the requester needs to decide on a suggested time
///
/// The token itself is never echoed back, the caller already holds it
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalResponse {
	pub suggested_day:   NaiveDate,
	pub suggested_start: NaiveTime,
	pub suggested_end:   NaiveTime,
	pub notes:           Option<String>,
	pub expires_at:      NaiveDateTime,
	pub reservation:     ReservationResponse,
}

impl ProposalResponse {
	#[must_use]
	pub fn build(
		proposal: ReservationProposal,
		reservation: Reservation,
		place_name: String,
		now: NaiveDateTime,
	) -> Self {
		Self {
			suggested_day:   proposal.suggested_day,
			suggested_start: proposal.suggested_start,
			suggested_end:   proposal.suggested_end,
			notes:           proposal.notes,
			expires_at:      proposal.expires_at,
			reservation:     ReservationResponse::build(
				reservation,
				Some(place_name),
				None,
				now,
			),
		}
	}
}
