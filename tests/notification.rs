use axum::http::StatusCode;
use chrono::{Days, Utc};
use models::Notification;
use serde_json::json;
use studioplan::schemas::reservation::ReservationResponse;

mod common;

use common::TestEnv;

/// Book a slot as `test` and approve it as the admin, leaving one
/// notification for `test`
async fn approved_booking(env: &TestEnv) -> ReservationResponse {
	let place_id = env.place_id("Studio 1").await;
	let day = Utc::now().date_naive() + Days::new(7);

	let response = env
		.app
		.post(&format!("/places/{place_id}/reservations"))
		.json(&json!({
			"day": day,
			"startTime": "10:00:00",
			"endTime": "11:00:00",
		}))
		.await;
	assert_eq!(response.status_code(), StatusCode::CREATED);
	let reservation = response.json::<ReservationResponse>();

	let response = env
		.app
		.post("/auth/login")
		.json(&json!({ "username": "admin", "password": "password" }))
		.await;
	assert_eq!(response.status_code(), StatusCode::OK);

	let response = env
		.app
		.post(&format!("/reservations/{}/approve", reservation.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::OK);

	response.json::<ReservationResponse>()
}

#[tokio::test(flavor = "multi_thread")]
async fn notifications_start_empty() {
	let env = TestEnv::new().await.login("test").await;

	let response = env.app.get("/notifications").await;

	assert_eq!(response.status_code(), StatusCode::OK);
	assert!(response.json::<Vec<Notification>>().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn approval_notifies_the_requester() {
	let env = TestEnv::new().await.login("test").await;

	approved_booking(&env).await;

	let env = env.login("test").await;

	let response = env.app.get("/notifications").await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<Vec<Notification>>();
	assert_eq!(body.len(), 1);
	assert!(body[0].body.contains("approved"));
	assert!(body[0].read_at.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn mark_notification_read_and_unread() {
	let env = TestEnv::new().await.login("test").await;

	approved_booking(&env).await;

	let env = env.login("test").await;

	let notification =
		env.app.get("/notifications").await.json::<Vec<Notification>>()[0]
			.clone();

	let response = env
		.app
		.post(&format!("/notifications/{}/read", notification.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

	let body = env.app.get("/notifications").await.json::<Vec<Notification>>();
	assert!(body[0].read_at.is_some());

	let response = env
		.app
		.post(&format!("/notifications/{}/unread", notification.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

	let body = env.app.get("/notifications").await.json::<Vec<Notification>>();
	assert!(body[0].read_at.is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_notification() {
	let env = TestEnv::new().await.login("test").await;

	approved_booking(&env).await;

	let env = env.login("test").await;

	let notification =
		env.app.get("/notifications").await.json::<Vec<Notification>>()[0]
			.clone();

	let response = env
		.app
		.delete(&format!("/notifications/{}", notification.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

	let body = env.app.get("/notifications").await.json::<Vec<Notification>>();
	assert!(body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn notifications_of_others_are_forbidden() {
	let env = TestEnv::new().await.login("test").await;

	approved_booking(&env).await;

	let env = env.login("test").await;

	let notification =
		env.app.get("/notifications").await.json::<Vec<Notification>>()[0]
			.clone();

	let env = env.login("carol").await;

	let response = env
		.app
		.post(&format!("/notifications/{}/read", notification.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

	let response = env
		.app
		.delete(&format!("/notifications/{}", notification.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
