//! Controllers for authorization

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, NoContent};
use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::Cookie;
use common::{DbPool, Error, LoginError, RedisConn};
use models::Profile;

use crate::Config;
use crate::schemas::auth::LoginRequest;
use crate::session::Session;

#[instrument(skip_all)]
pub(crate) async fn login(
	State(pool): State<DbPool>,
	State(mut r_conn): State<RedisConn>,
	State(config): State<Config>,
	jar: PrivateCookieJar,
	Json(login_data): Json<LoginRequest>,
) -> Result<impl IntoResponse, Error> {
	let conn = pool.get().await?;

	let profile = Profile::get_by_username(login_data.username.clone(), &conn)
		.await
		.map_err(|_| LoginError::UnknownUsername(login_data.username))?;

	profile.verify_password(&login_data.password)?;

	let session =
		Session::create(config.access_cookie_lifetime, &profile, &mut r_conn)
			.await?;

	let access_token_cookie = session.to_access_token_cookie(
		config.access_cookie_name,
		config.access_cookie_lifetime,
		config.production,
	);

	let jar = jar.add(access_token_cookie);

	let profile = profile.update_last_login(&conn).await?;

	info!("logged in profile {}", profile.id);

	Ok((jar, Json(profile)))
}

#[instrument(skip_all)]
pub(crate) async fn logout(
	State(mut r_conn): State<RedisConn>,
	State(config): State<Config>,
	session: Session,
	jar: PrivateCookieJar,
) -> Result<impl IntoResponse, Error> {
	Session::delete(session.id, &mut r_conn).await?;

	let jar = jar.remove(Cookie::from(config.access_cookie_name));

	info!("logged out profile {}", session.data.profile_id);

	Ok((jar, NoContent))
}
