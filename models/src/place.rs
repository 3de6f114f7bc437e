use chrono::NaiveDateTime;
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};

use crate::schema::place;

/// What kind of physical resource a [`Place`] is
#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::PlaceKind"]
#[serde(rename_all = "snake_case")]
pub enum PlaceKind {
	#[default]
	Studio,
	MeetingRoom,
	CoworkTable,
}

#[derive(
	Clone, Copy, DbEnum, Debug, Default, Deserialize, PartialEq, Eq, Serialize,
)]
#[ExistingTypePath = "crate::schema::sql_types::PlaceState"]
#[serde(rename_all = "snake_case")]
pub enum PlaceState {
	#[default]
	Available,
	Unavailable,
}

/// A single bookable place
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = place)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Place {
	pub id:          i32,
	pub name:        String,
	pub description: Option<String>,
	pub kind:        PlaceKind,
	pub state:       PlaceState,
	pub seat_count:  Option<i32>,
	pub created_by:  Option<i32>,
	pub created_at:  NaiveDateTime,
	pub updated_at:  NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceFilter {
	pub kind:  Option<PlaceKind>,
	pub state: Option<PlaceState>,
}

impl Place {
	/// Get a [`Place`] given its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(p_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let place = conn
			.interact(move |conn| {
				use crate::schema::place::dsl::*;

				place.find(p_id).select(Self::as_select()).get_result(conn)
			})
			.await??;

		Ok(place)
	}

	/// Get a [`Place`] given its kind and id
	///
	/// Used by the public calendar which addresses places as `{kind}/{id}`
	#[instrument(skip(conn))]
	pub async fn get_by_kind_and_id(
		p_kind: PlaceKind,
		p_id: i32,
		conn: &DbConn,
	) -> Result<Option<Self>, Error> {
		let place = conn
			.interact(move |conn| {
				use crate::schema::place::dsl::*;

				place
					.find(p_id)
					.filter(kind.eq(p_kind))
					.select(Self::as_select())
					.get_result(conn)
					.optional()
			})
			.await??;

		Ok(place)
	}

	/// Get a filtered and paginated list of all [`Place`]s along with the
	/// total amount of matching rows
	#[instrument(skip(conn))]
	pub async fn get_all(
		filter: PlaceFilter,
		limit: i64,
		offset: i64,
		conn: &DbConn,
	) -> Result<(i64, Vec<Self>), Error> {
		let places = conn
			.interact(move |conn| {
				use crate::schema::place::dsl::*;

				let mut query = place.into_boxed();
				let mut count = place.into_boxed();

				if let Some(k) = filter.kind {
					query = query.filter(kind.eq(k));
					count = count.filter(kind.eq(k));
				}

				if let Some(s) = filter.state {
					query = query.filter(state.eq(s));
					count = count.filter(state.eq(s));
				}

				let total = count.count().get_result(conn)?;

				let data = query
					.order(name.asc())
					.limit(limit)
					.offset(offset)
					.select(Self::as_select())
					.get_results(conn)?;

				Ok::<_, diesel::result::Error>((total, data))
			})
			.await??;

		Ok(places)
	}

	/// Delete a [`Place`] given its id
	#[instrument(skip(conn))]
	pub async fn delete_by_id(p_id: i32, conn: &DbConn) -> Result<(), Error> {
		conn.interact(move |conn| {
			use crate::schema::place::dsl::*;

			diesel::delete(place.find(p_id)).execute(conn)
		})
		.await??;

		info!("deleted place with id {p_id}");

		Ok(())
	}
}

#[derive(Clone, Debug, Deserialize, Insertable, Serialize)]
#[diesel(table_name = place)]
#[diesel(check_for_backend(Pg))]
pub struct NewPlace {
	pub name:        String,
	pub description: Option<String>,
	pub kind:        PlaceKind,
	pub seat_count:  Option<i32>,
	pub created_by:  Option<i32>,
}

impl NewPlace {
	/// Insert this [`NewPlace`]
	#[instrument(skip(conn))]
	pub async fn insert(self, conn: &DbConn) -> Result<Place, Error> {
		let place = conn
			.interact(|conn| {
				use self::place::dsl::*;

				diesel::insert_into(place)
					.values(self)
					.returning(Place::as_returning())
					.get_result(conn)
			})
			.await??;

		info!("created place {} ({})", place.id, place.name);

		Ok(place)
	}
}

#[derive(AsChangeset, Clone, Debug, Default, Deserialize, Serialize)]
#[diesel(table_name = place)]
#[serde(rename_all = "camelCase")]
pub struct PlaceUpdate {
	pub name:        Option<String>,
	pub description: Option<String>,
	pub state:       Option<PlaceState>,
	pub seat_count:  Option<i32>,
}

impl PlaceUpdate {
	/// Apply this update to the [`Place`] with the given id
	#[instrument(skip(conn))]
	pub async fn apply_to(
		self,
		p_id: i32,
		conn: &DbConn,
	) -> Result<Place, Error> {
		let place = conn
			.interact(move |conn| {
				use self::place::dsl::*;

				diesel::update(place.find(p_id))
					.set(self)
					.returning(Place::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(place)
	}
}
