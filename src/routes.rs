use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, patch, post};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::controllers::auth::{login, logout};
use crate::controllers::healthcheck;
use crate::controllers::notification::{
	delete_notification,
	get_my_notifications,
	read_notification,
	unread_notification,
};
use crate::controllers::place::{
	create_place,
	create_reservation,
	delete_place,
	get_place,
	get_place_calendar,
	get_places,
	get_public_calendar,
	update_place,
};
use crate::controllers::profile::get_current_profile;
use crate::controllers::proposal::{
	accept_proposal,
	counter_proposal,
	decline_proposal,
	get_proposal,
};
use crate::controllers::reservation::{
	approve_reservation,
	cancel_reservation,
	get_all_reservations,
	get_my_reservations,
	suggest_time,
};
use crate::middleware::{AdminLayer, AuthLayer};

/// Get the app router
pub fn get_app_router(state: AppState) -> Router {
	let api_routes = Router::new()
		.route("/healthcheck", get(healthcheck))
		.nest("/auth", auth_routes(&state))
		.nest("/profile", profile_routes(&state))
		.nest("/places", place_routes(&state))
		.nest("/calendar", calendar_routes())
		.nest("/reservations", reservation_routes(&state))
		.nest("/proposals", proposal_routes())
		.nest("/notifications", notification_routes(&state));

	Router::new()
		.merge(api_routes)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(Duration::from_secs(10)))
				.layer(CompressionLayer::new()),
		)
		.with_state(state)
}

/// Authentication routes
fn auth_routes(state: &AppState) -> Router<AppState> {
	Router::new().route("/login", post(login)).route(
		"/logout",
		post(logout).route_layer(AuthLayer::new(state.clone())),
	)
}

/// Profile routes
fn profile_routes(state: &AppState) -> Router<AppState> {
	Router::new()
		.route("/me", get(get_current_profile))
		.route_layer(AuthLayer::new(state.clone()))
}

/// Place routes, admins manage places and anyone logged in can view and
/// book them
fn place_routes(state: &AppState) -> Router<AppState> {
	let protected = Router::new()
		.route("/", post(create_place))
		.route("/{id}", patch(update_place).delete(delete_place))
		.route_layer(AdminLayer::new(state.clone()));

	Router::new()
		.route("/", get(get_places))
		.route("/{id}", get(get_place))
		.route(
			"/{id}/reservations",
			get(get_place_calendar).post(create_reservation),
		)
		.merge(protected)
		.route_layer(AuthLayer::new(state.clone()))
}

/// The public busy calendar, addressed by place kind and id
fn calendar_routes() -> Router<AppState> {
	Router::new().route("/{kind}/{id}", get(get_public_calendar))
}

/// Reservation lifecycle routes
fn reservation_routes(state: &AppState) -> Router<AppState> {
	let protected = Router::new()
		.route("/", get(get_all_reservations))
		.route("/{id}/approve", post(approve_reservation))
		.route("/{id}/suggest", post(suggest_time))
		.route_layer(AdminLayer::new(state.clone()));

	Router::new()
		.route("/mine", get(get_my_reservations))
		.route("/{id}/cancel", post(cancel_reservation))
		.merge(protected)
		.route_layer(AuthLayer::new(state.clone()))
}

/// Proposal token routes, the mailed token is the only authorization
fn proposal_routes() -> Router<AppState> {
	Router::new()
		.route("/{token}", get(get_proposal))
		.route("/{token}/accept", post(accept_proposal))
		.route("/{token}/decline", post(decline_proposal))
		.route("/{token}/counter", post(counter_proposal))
}

/// Notification routes
fn notification_routes(state: &AppState) -> Router<AppState> {
	Router::new()
		.route("/", get(get_my_notifications))
		.route("/{id}", delete(delete_notification))
		.route("/{id}/read", post(read_notification))
		.route("/{id}/unread", post(unread_notification))
		.route_layer(AuthLayer::new(state.clone()))
}
