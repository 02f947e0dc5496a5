use axum::{
    Json, Router, middleware,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};

use crate::announcements;
use crate::auth::{self, AppState};
use crate::events;
use crate::middleware::require_auth;

/// Every route the API serves. CORS and tracing layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/events/public", get(events::list_public_events));

    let protected_routes = Router::new()
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/{event_id}", put(events::update_event).delete(events::delete_event))
        .route("/events/{event_id}/hide", post(events::set_event_hidden))
        .route("/events/rsvp/{event_id}", post(events::rsvp))
        .route("/events/unrsvp/{event_id}", post(events::unrsvp))
        .route("/events/checkin/{event_id}", post(events::check_in))
        .route(
            "/announcements",
            get(announcements::list_announcements).post(announcements::create_announcement),
        )
        .route("/announcements/{announcement_id}", delete(announcements::delete_announcement))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "chapter-api" }))
}
