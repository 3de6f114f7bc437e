use std::sync::{LazyLock, Mutex, MutexGuard};

use redis::aio::MultiplexedConnection;
use redis::cmd;

/// Redis ships with 16 logical databases, each test locks one of them
const REDIS_DATABASES: usize = 16;

static REDIS_DATABASE_URLS: LazyLock<[Mutex<String>; REDIS_DATABASES]> =
	LazyLock::new(|| {
		let redis_url = std::env::var("REDIS_URL").unwrap();

		std::array::from_fn(|i| Mutex::new(format!("{redis_url}/{i}")))
	});

pub struct RedisUrlLock;

pub struct RedisUrlGuard(MutexGuard<'static, String>);

impl RedisUrlLock {
	/// Lock a free logical database and return its guard
	pub fn get() -> RedisUrlGuard {
		let mut i = 0;
		loop {
			let mutex = &REDIS_DATABASE_URLS[i];

			if let Ok(lock) = mutex.try_lock() {
				return RedisUrlGuard(lock);
			}

			i = (i + 1) % REDIS_DATABASES;
		}
	}
}

impl RedisUrlGuard {
	pub async fn connect(&self) -> MultiplexedConnection {
		let client = redis::Client::open(self.0.as_str()).unwrap();
		client.get_multiplexed_async_connection().await.unwrap()
	}
}

impl Drop for RedisUrlGuard {
	fn drop(&mut self) {
		futures::executor::block_on(async {
			let mut conn = self.connect().await;

			let _: bool = cmd("FLUSHDB").query_async(&mut conn).await.unwrap();
		});
	}
}
