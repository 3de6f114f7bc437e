use axum::http::StatusCode;
use chrono::{Days, NaiveDate, NaiveTime, Utc};
use models::ReservationState;
use serde_json::json;
use studioplan::schemas::proposal::ProposalResponse;
use studioplan::schemas::reservation::ReservationResponse;

mod common;

use common::TestEnv;

fn next_week() -> NaiveDate {
	Utc::now().date_naive() + Days::new(7)
}

/// Book a slot as `test` and let the admin suggest a different time,
/// returning the single-use token from the mailed link
async fn setup_suggestion(env: &TestEnv, place_id: i32) -> String {
	let day = next_week();

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
		.expect_mail(async || {
			env.app
				.post(&format!("/reservations/{}/suggest", reservation.id))
				.json(&json!({
					"day": day,
					"startTime": "14:00:00",
					"endTime": "15:00:00",
					"notes": "the morning is fully booked",
				}))
				.await
		})
		.await;
	assert_eq!(response.status_code(), StatusCode::CREATED);

	let suggested = response.json::<ReservationResponse>();
	assert_eq!(suggested.state, ReservationState::Suggested);

	env.latest_proposal_token().await
}

#[tokio::test(flavor = "multi_thread")]
async fn suggest_is_forbidden_for_users() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;
	let day = next_week();

	let response = env
		.app
		.post(&format!("/places/{place_id}/reservations"))
		.json(&json!({
			"day": day,
			"startTime": "10:00:00",
			"endTime": "11:00:00",
		}))
		.await;
	let reservation = response.json::<ReservationResponse>();

	let response = env
		.app
		.post(&format!("/reservations/{}/suggest", reservation.id))
		.json(&json!({
			"day": day,
			"startTime": "14:00:00",
			"endTime": "15:00:00",
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_proposal_by_token() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	let response = env.app.get(&format!("/proposals/{token}")).await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ProposalResponse>();
	assert_eq!(
		body.suggested_start,
		NaiveTime::from_hms_opt(14, 0, 0).unwrap()
	);
	assert_eq!(
		body.notes.as_deref(),
		Some("the morning is fully booked")
	);
	assert_eq!(
		body.reservation.place_name.as_deref(),
		Some("Studio 1")
	);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_token_is_not_found() {
	let env = TestEnv::new().await;

	let response = env.app.get("/proposals/not-a-real-token").await;

	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn expired_token_is_not_found() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	// Age the proposal past its expiry window
	{
		let conn = env.pool.get().await.unwrap();

		conn.interact(|conn| {
			use chrono::{TimeDelta, Utc};
			use diesel::prelude::*;
			use models::schema::reservation_proposal::dsl::*;

			diesel::update(reservation_proposal)
				.set(expires_at.eq(Utc::now().naive_utc() - TimeDelta::days(1)))
				.execute(conn)
		})
		.await
		.unwrap()
		.unwrap();
	}

	// An expired token reads the same as an unknown one
	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

	let response = env.app.post(&format!("/proposals/{token}/accept")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn accept_proposal() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	let response = env
		.expect_mail(async || {
			env.app.post(&format!("/proposals/{token}/accept")).await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationResponse>();
	assert_eq!(body.state, ReservationState::Approved);
	assert_eq!(body.start_time, NaiveTime::from_hms_opt(14, 0, 0).unwrap());
	assert_eq!(body.end_time, NaiveTime::from_hms_opt(15, 0, 0).unwrap());
}

#[tokio::test(flavor = "multi_thread")]
async fn token_is_single_use() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	let response = env.app.post(&format!("/proposals/{token}/accept")).await;
	assert_eq!(response.status_code(), StatusCode::OK);

	// A consumed token is indistinguishable from an unknown one
	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

	let response = env.app.post(&format!("/proposals/{token}/accept")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn decline_proposal_cancels_the_reservation() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	let response = env
		.expect_mail(async || {
			env.app.post(&format!("/proposals/{token}/decline")).await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationResponse>();
	assert_eq!(body.state, ReservationState::Cancelled);

	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn counter_proposal_returns_to_pending() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;
	let day = next_week();

	let token = setup_suggestion(&env, place_id).await;

	let response = env
		.expect_mail(async || {
			env.app
				.post(&format!("/proposals/{token}/counter"))
				.json(&json!({
					"day": day,
					"startTime": "16:00:00",
					"endTime": "17:00:00",
				}))
				.await
		})
		.await;

	assert_eq!(response.status_code(), StatusCode::OK);

	let body = response.json::<ReservationResponse>();
	assert_eq!(body.state, ReservationState::Pending);
	assert_eq!(body.start_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());

	// Countering consumes the token as well
	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn accept_against_a_newer_booking_conflicts() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;
	let day = next_week();

	let token = setup_suggestion(&env, place_id).await;

	// The suggested slot is still free until the proposal is accepted, so
	// another profile can claim it first
	let env = env.login("carol").await;

	let response = env
		.app
		.post(&format!("/places/{place_id}/reservations"))
		.json(&json!({
			"day": day,
			"startTime": "14:00:00",
			"endTime": "15:00:00",
		}))
		.await;
	assert_eq!(response.status_code(), StatusCode::CREATED);

	let response = env.app.post(&format!("/proposals/{token}/accept")).await;
	assert_eq!(response.status_code(), StatusCode::CONFLICT);

	// The failed accept changes nothing, the token stays usable
	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread")]
async fn suggest_on_a_decided_reservation_conflicts() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;
	let day = next_week();

	let response = env
		.app
		.post(&format!("/places/{place_id}/reservations"))
		.json(&json!({
			"day": day,
			"startTime": "10:00:00",
			"endTime": "11:00:00",
		}))
		.await;
	let reservation = response.json::<ReservationResponse>();

	let env = env.login_admin().await;

	let response = env
		.app
		.post(&format!("/reservations/{}/approve", reservation.id))
		.await;
	assert_eq!(response.status_code(), StatusCode::OK);

	let response = env
		.app
		.post(&format!("/reservations/{}/suggest", reservation.id))
		.json(&json!({
			"day": day,
			"startTime": "14:00:00",
			"endTime": "15:00:00",
		}))
		.await;

	assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn cancelling_invalidates_open_proposals() {
	let env = TestEnv::new().await.login("test").await;
	let place_id = env.place_id("Studio 1").await;

	let token = setup_suggestion(&env, place_id).await;

	// The admin is still logged in after the suggestion
	let reservation_id = {
		let response = env.app.get(&format!("/proposals/{token}")).await;
		response.json::<ProposalResponse>().reservation.id
	};

	let response = env
		.app
		.post(&format!("/reservations/{reservation_id}/cancel"))
		.await;
	assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

	let response = env.app.get(&format!("/proposals/{token}")).await;
	assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}
