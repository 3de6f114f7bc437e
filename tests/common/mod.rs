use std::sync::Arc;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use axum_test::TestServer;
use common::DbPool;
use models::{Paginated, Place};
use studioplan::mailer::{Mailer, StubMailbox};
use studioplan::{
	AppState,
	Config,
	SeedPlace,
	SeedProfile,
	Seeder,
	routes,
};

mod mock_db;
mod mock_redis;

use mock_db::{DATABASE_PROVIDER, DatabaseGuard};
use mock_redis::{RedisUrlGuard, RedisUrlLock};

#[allow(dead_code)]
pub struct TestEnv {
	pub app:          TestServer,
	pub pool:         DbPool,
	pub db_guard:     DatabaseGuard,
	pub redis_guard:  RedisUrlGuard,
	pub stub_mailbox: Arc<StubMailbox>,
}

impl TestEnv {
	/// Get a test environment with mocked resources for running tests
	///
	/// # Panics
	/// Panics if building a test server or mailbox fails
	pub async fn new() -> Self {
		let config = Config::from_env();

		let db_guard = (*DATABASE_PROVIDER).acquire().await;
		let test_pool = db_guard.create_pool();

		{
			let conn = test_pool.get().await.unwrap();
			let seeder = Seeder::new(&conn);

			seeder
				.populate("seed/profiles.json", async |conn, profiles| {
					for profile in profiles {
						SeedProfile::insert(profile, conn).await?;
					}

					Ok(())
				})
				.await
				.populate("seed/places.json", async |conn, places| {
					for place in places {
						SeedPlace::insert(place, conn).await?;
					}

					Ok(())
				})
				.await;
		}

		let redis_guard = RedisUrlLock::get();
		let redis_connection = redis_guard.connect().await;

		let cookie_jar_key = Key::from(&[0u8; 64]);

		let stub_mailbox = config.create_stub_mailbox();

		let mailer = Mailer::new(&config, stub_mailbox.clone());

		let state = AppState {
			config,
			database_pool: test_pool.clone(),
			redis_connection,
			cookie_jar_key,
			mailer,
		};

		let app = TestServer::builder()
			.save_cookies()
			.build(routes::get_app_router(state))
			.unwrap();

		TestEnv {
			app,
			pool: test_pool,
			db_guard,
			redis_guard,
			stub_mailbox: stub_mailbox.unwrap(),
		}
	}

	/// Fish the most recent proposal token out of the database
	///
	/// Tokens are only ever delivered by mail, tests shortcut the inbox
	///
	/// # Panics
	/// Panics if no proposal exists
	#[allow(dead_code)]
	pub async fn latest_proposal_token(&self) -> String {
		let conn = self.pool.get().await.unwrap();

		conn.interact(|conn| {
			use diesel::prelude::*;
			use models::schema::reservation_proposal::dsl::*;

			reservation_proposal
				.order(created_at.desc())
				.select(token)
				.first::<String>(conn)
		})
		.await
		.unwrap()
		.unwrap()
	}

	/// Log in as a seeded profile, saving the access cookie on the server
	#[allow(dead_code)]
	pub async fn login(self, username: &str) -> Self {
		let response = self
			.app
			.post("/auth/login")
			.json(&serde_json::json!({
				"username": username,
				"password": "password",
			}))
			.await;

		response.assert_status_ok();

		self
	}

	/// Log in as the seeded admin profile
	#[allow(dead_code)]
	pub async fn login_admin(self) -> Self { self.login("admin").await }

	/// Look up a seeded place by name
	///
	/// # Panics
	/// Panics if no place with this name exists
	#[allow(dead_code)]
	pub async fn place_id(&self, name: &str) -> i32 {
		let response = self.app.get("/places").await;

		response.assert_status_ok();

		response
			.json::<Paginated<Vec<Place>>>()
			.data
			.into_iter()
			.find(|p| p.name == name)
			.unwrap_or_else(|| panic!("no seeded place named {name}"))
			.id
	}

	/// Run a request and assert that exactly one email lands in the stub
	/// mailbox
	#[allow(dead_code)]
	pub async fn expect_mail<F, R, T>(&self, f: F) -> T
	where
		F: FnOnce() -> R,
		R: Future<Output = T>,
	{
		let outbox_size = { self.stub_mailbox.mailbox.lock().len() };

		let result = f().await;

		// Wait for up to a second or until a condvar notification to make
		// sure queued emails are not missed
		let mut mailbox = self.stub_mailbox.mailbox.lock();
		if mailbox.len() == outbox_size {
			let wait_res = self
				.stub_mailbox
				.signal
				.wait_for(&mut mailbox, Duration::from_secs(1));

			assert!(!wait_res.timed_out(), "timed out waiting for email");
		}

		assert!(
			mailbox.len() > outbox_size,
			"expected an email to be sent"
		);

		result
	}

	/// Run a request and assert that no email is sent
	#[allow(dead_code)]
	pub async fn expect_no_mail<F, R, T>(&self, f: F) -> T
	where
		F: FnOnce() -> R,
		R: Future<Output = T>,
	{
		let outbox_size = { self.stub_mailbox.mailbox.lock().len() };

		let result = f().await;

		let mut mailbox = self.stub_mailbox.mailbox.lock();
		if mailbox.len() == outbox_size {
			self.stub_mailbox
				.signal
				.wait_for(&mut mailbox, Duration::from_secs(1));
		}

		assert_eq!(outbox_size, mailbox.len(), "expected no emails to be sent");

		result
	}
}
