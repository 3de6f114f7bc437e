use chrono::{NaiveDateTime, Utc};
use common::{DbConn, Error};
use diesel::pg::Pg;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::notification;

/// An in-app notification written by the reservation lifecycle
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = notification)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	pub id:         i32,
	pub profile_id: i32,
	pub body:       String,
	pub created_at: NaiveDateTime,
	pub read_at:    Option<NaiveDateTime>,
}

impl Notification {
	/// Create a new [`Notification`] for a profile
	#[instrument(skip(conn))]
	pub async fn create(
		p_id: i32,
		n_body: String,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let notification = conn
			.interact(move |conn| {
				use crate::schema::notification::dsl::*;

				diesel::insert_into(notification)
					.values((profile_id.eq(p_id), body.eq(n_body)))
					.returning(Self::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(notification)
	}

	/// Get a [`Notification`] given its id
	#[instrument(skip(conn))]
	pub async fn get_by_id(n_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let notification = conn
			.interact(move |conn| {
				use crate::schema::notification::dsl::*;

				notification
					.find(n_id)
					.select(Self::as_select())
					.get_result(conn)
			})
			.await??;

		Ok(notification)
	}

	/// Get all [`Notification`]s for a profile, newest first
	#[instrument(skip(conn))]
	pub async fn for_profile(
		p_id: i32,
		conn: &DbConn,
	) -> Result<Vec<Self>, Error> {
		let notifs = conn
			.interact(move |conn| {
				use crate::schema::notification::dsl::*;

				notification
					.filter(profile_id.eq(p_id))
					.order(created_at.desc())
					.select(Self::as_select())
					.get_results(conn)
			})
			.await??;

		Ok(notifs)
	}

	/// Mark this [`Notification`] as read
	#[instrument(skip(conn))]
	pub async fn mark_read(n_id: i32, conn: &DbConn) -> Result<(), Error> {
		conn.interact(move |conn| {
			use crate::schema::notification::dsl::*;

			diesel::update(notification.find(n_id))
				.set(read_at.eq(Utc::now().naive_utc()))
				.execute(conn)
		})
		.await??;

		Ok(())
	}

	/// Mark this [`Notification`] as unread
	#[instrument(skip(conn))]
	pub async fn mark_unread(n_id: i32, conn: &DbConn) -> Result<(), Error> {
		conn.interact(move |conn| {
			use crate::schema::notification::dsl::*;

			diesel::update(notification.find(n_id))
				.set(read_at.eq(None::<NaiveDateTime>))
				.execute(conn)
		})
		.await??;

		Ok(())
	}

	/// Delete this [`Notification`]
	#[instrument(skip(conn))]
	pub async fn delete_by_id(n_id: i32, conn: &DbConn) -> Result<(), Error> {
		conn.interact(move |conn| {
			use crate::schema::notification::dsl::*;

			diesel::delete(notification.find(n_id)).execute(conn)
		})
		.await??;

		Ok(())
	}
}
