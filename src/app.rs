use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{auth, resources, shared::AppState};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Builds the full HTTP surface. Resource routes sit behind bearer-token auth; health and the
/// token endpoints are public.
pub fn build_router(state: AppState) -> Router {
    let protected = resources::api_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        auth::jwt_auth,
    ));

    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(auth::register))
        .route("/api/token", post(auth::obtain_token))
        .route("/api/token/refresh", post(auth::refresh_token))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
