use models::{NewPlace, PlaceKind};
use serde::{Deserialize, Serialize};
use validator_derive::Validate;

#[derive(Clone, Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaceRequest {
	#[validate(length(
		min = 2,
		max = 64,
		message = "name must be between 2 and 64 characters long",
		code = "name-length"
	))]
	pub name:        String,
	pub description: Option<String>,
	pub kind:        PlaceKind,
	#[validate(range(
		min = 1,
		message = "seat count must be at least 1",
		code = "seat-count-range"
	))]
	pub seat_count:  Option<i32>,
}

impl CreatePlaceRequest {
	#[must_use]
	pub fn into_new_place(self, creator_id: i32) -> NewPlace {
		NewPlace {
			name:        self.name,
			description: self.description,
			kind:        self.kind,
			seat_count:  self.seat_count,
			created_by:  Some(creator_id),
		}
	}
}
