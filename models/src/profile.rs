use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{NaiveDateTime, Utc};
use common::{DbConn, Error, LoginError};
use diesel::pg::Pg;
use diesel::prelude::*;
use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::schema::profile;

/// A single profile
#[derive(
	Clone, Debug, Deserialize, Identifiable, Queryable, Selectable, Serialize,
)]
#[diesel(table_name = profile)]
#[diesel(check_for_backend(Pg))]
#[serde(rename_all = "camelCase")]
pub struct Profile {
	pub id:            i32,
	pub username:      String,
	#[serde(skip)]
	pub password_hash: String,
	pub email:         String,
	pub admin:         bool,
	pub created_at:    NaiveDateTime,
	pub last_login_at: NaiveDateTime,
}

impl TryFrom<&Profile> for Mailbox {
	type Error = Error;

	fn try_from(value: &Profile) -> Result<Mailbox, Error> {
		Ok(Mailbox::new(
			Some(value.username.to_string()),
			value.email.parse()?,
		))
	}
}

impl Profile {
	/// Hash a password for storage
	pub fn hash_password(password: &str) -> Result<String, Error> {
		let salt = SaltString::generate(&mut OsRng);
		let hash = Argon2::default()
			.hash_password(password.as_bytes(), &salt)
			.map_err(|e| {
				Error::Infallible(format!("could not hash password -- {e}"))
			})?
			.to_string();

		Ok(hash)
	}

	/// Verify a password attempt against this profile's stored hash
	pub fn verify_password(&self, password: &str) -> Result<(), Error> {
		let hash = PasswordHash::new(&self.password_hash).map_err(|e| {
			Error::Infallible(format!("corrupt password hash -- {e}"))
		})?;

		Argon2::default()
			.verify_password(password.as_bytes(), &hash)
			.map_err(|_| LoginError::InvalidPassword.into())
	}

	/// Get a [`Profile`] given its id
	#[instrument(skip(conn))]
	pub async fn get(p_id: i32, conn: &DbConn) -> Result<Self, Error> {
		let profile = conn
			.interact(move |conn| {
				use crate::schema::profile::dsl::*;

				profile.find(p_id).select(Self::as_select()).get_result(conn)
			})
			.await??;

		Ok(profile)
	}

	/// Get a [`Profile`] given its username
	#[instrument(skip(conn))]
	pub async fn get_by_username(
		query_username: String,
		conn: &DbConn,
	) -> Result<Self, Error> {
		let profile = conn
			.interact(|conn| {
				use crate::schema::profile::dsl::*;

				profile
					.filter(username.eq(query_username))
					.select(Self::as_select())
					.first(conn)
			})
			.await??;

		Ok(profile)
	}

	/// Update the last login timestamp of this [`Profile`]
	#[instrument(skip(conn))]
	pub async fn update_last_login(self, conn: &DbConn) -> Result<Self, Error> {
		let profile = conn
			.interact(move |conn| {
				use crate::schema::profile::dsl::*;

				diesel::update(profile.find(self.id))
					.set(last_login_at.eq(Utc::now().naive_utc()))
					.returning(Self::as_returning())
					.get_result(conn)
			})
			.await??;

		Ok(profile)
	}
}
