use axum::{
    Json, Router, middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};

use crate::auth::{self, AppState};
use crate::groups;
use crate::middleware::require_auth;
use crate::reminders;

/// The full HTTP surface. Everything under `/api` except register and login
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/groups", post(groups::create_group).get(groups::list_groups))
        .route("/groups/{id}", get(groups::get_group).delete(groups::delete_group))
        .route(
            "/groups/{id}/reminders",
            get(reminders::list_group_reminders).post(reminders::create_reminder),
        )
        .route(
            "/reminders/{id}",
            put(reminders::update_reminder).delete(reminders::delete_reminder),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/health", get(health))
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
