//! Controllers for profiles

use axum::Json;
use axum::extract::State;
use common::{DbPool, Error};
use models::Profile;

use crate::session::Session;

pub(crate) async fn get_current_profile(
	State(pool): State<DbPool>,
	session: Session,
) -> Result<Json<Profile>, Error> {
	let conn = pool.get().await?;

	let profile = Profile::get(session.data.profile_id, &conn).await?;

	Ok(Json(profile))
}
