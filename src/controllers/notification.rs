//! Controllers for in-app notifications

use axum::Json;
use axum::extract::{Path, State};
use axum::response::NoContent;
use common::{DbConn, DbPool, Error};
use models::Notification;

use crate::session::Session;

/// Load a notification and check it belongs to the current profile
async fn get_owned(
	n_id: i32,
	profile_id: i32,
	conn: &DbConn,
) -> Result<Notification, Error> {
	let notification = Notification::get_by_id(n_id, conn).await?;

	if notification.profile_id != profile_id {
		return Err(Error::Forbidden);
	}

	Ok(notification)
}

#[instrument(skip(pool))]
pub(crate) async fn get_my_notifications(
	State(pool): State<DbPool>,
	session: Session,
) -> Result<Json<Vec<Notification>>, Error> {
	let conn = pool.get().await?;

	let notifications =
		Notification::for_profile(session.data.profile_id, &conn).await?;

	Ok(Json(notifications))
}

#[instrument(skip(pool))]
pub(crate) async fn read_notification(
	State(pool): State<DbPool>,
	session: Session,
	Path(n_id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	get_owned(n_id, session.data.profile_id, &conn).await?;
	Notification::mark_read(n_id, &conn).await?;

	Ok(NoContent)
}

#[instrument(skip(pool))]
pub(crate) async fn unread_notification(
	State(pool): State<DbPool>,
	session: Session,
	Path(n_id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	get_owned(n_id, session.data.profile_id, &conn).await?;
	Notification::mark_unread(n_id, &conn).await?;

	Ok(NoContent)
}

#[instrument(skip(pool))]
pub(crate) async fn delete_notification(
	State(pool): State<DbPool>,
	session: Session,
	Path(n_id): Path<i32>,
) -> Result<NoContent, Error> {
	let conn = pool.get().await?;

	get_owned(n_id, session.data.profile_id, &conn).await?;
	Notification::delete_by_id(n_id, &conn).await?;

	Ok(NoContent)
}
