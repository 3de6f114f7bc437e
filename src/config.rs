use std::sync::Arc;

use chrono::TimeDelta;
use deadpool_diesel::postgres::{Manager, Pool};
use lettre::Address;

use crate::mailer::StubMailbox;

#[derive(Clone, Debug)]
pub struct Config {
	pub database_url: String,
	pub redis_url:    String,
	pub frontend_url: String,
	pub production:   bool,

	pub access_cookie_name:     String,
	pub access_cookie_lifetime: time::Duration,

	pub email_address:       Address,
	pub email_smtp_server:   String,
	pub email_smtp_password: String,
	pub email_queue_size:    usize,

	pub proposal_token_lifetime: TimeDelta,
}

impl Config {
	fn get_env_var(var: &str) -> String {
		std::env::var(var).unwrap_or_else(|_| panic!("{var} must be set"))
	}

	fn get_env_var_or(var: &str, default: &str) -> String {
		std::env::var(var).unwrap_or_else(|_| default.to_string())
	}

	/// Create a new [`Config`] from environment variables
	///
	/// # Panics
	/// Panics if an environment variable is missing or malformed
	#[must_use]
	pub fn from_env() -> Self {
		let database_url = Self::get_env_var("DATABASE_URL");
		let redis_url = Self::get_env_var("REDIS_URL");
		let frontend_url = Self::get_env_var("FRONTEND_URL");
		let production =
			Self::get_env_var_or("PRODUCTION", "false").parse().unwrap();

		let access_cookie_name = Self::get_env_var_or(
			"ACCESS_COOKIE_NAME",
			"studioplan_access_token",
		);
		let access_cookie_lifetime = time::Duration::minutes(
			Self::get_env_var_or("ACCESS_COOKIE_LIFETIME_MINUTES", "1440")
				.parse::<i64>()
				.unwrap(),
		);

		let email_address =
			Self::get_env_var("EMAIL_ADDRESS").parse().unwrap();
		let email_smtp_server = Self::get_env_var("EMAIL_SMTP_SERVER");
		let email_smtp_password =
			Self::get_env_var_or("EMAIL_SMTP_PASSWORD", "");
		let email_queue_size =
			Self::get_env_var_or("EMAIL_QUEUE_SIZE", "32").parse().unwrap();

		let proposal_token_lifetime = TimeDelta::days(
			Self::get_env_var_or("PROPOSAL_TOKEN_LIFETIME_DAYS", "7")
				.parse::<i64>()
				.unwrap(),
		);

		Self {
			database_url,
			redis_url,
			frontend_url,
			production,
			access_cookie_name,
			access_cookie_lifetime,
			email_address,
			email_smtp_server,
			email_smtp_password,
			email_queue_size,
			proposal_token_lifetime,
		}
	}

	/// Create a database pool for the given config
	///
	/// # Panics
	/// Panics if creating the pool fails
	#[must_use]
	pub fn create_database_pool(&self) -> Pool {
		let manager = Manager::new(
			self.database_url.to_string(),
			deadpool_diesel::Runtime::Tokio1,
		);

		Pool::builder(manager).build().unwrap()
	}

	/// Create a redis connection for the given config
	///
	/// # Panics
	/// Panics if connecting to the redis server fails
	pub async fn create_redis_connection(
		&self,
	) -> redis::aio::MultiplexedConnection {
		let client = redis::Client::open(self.redis_url.as_str())
			.expect("COULD NOT CREATE REDIS CLIENT");

		client
			.get_multiplexed_async_connection()
			.await
			.expect("COULD NOT CONNECT TO REDIS")
	}

	/// Create a stub mailbox if this config asks for a stub mail transport
	#[must_use]
	pub fn create_stub_mailbox(&self) -> Option<Arc<StubMailbox>> {
		if self.email_smtp_server == "stub" {
			Some(Arc::new(StubMailbox::default()))
		} else {
			None
		}
	}
}
