//! HTTP routes of the marketplace API

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

pub mod auth;
pub mod availability;
pub mod bookings;
pub mod creator;
pub mod packages;
pub mod transactions;

/// Create the router for the marketplace service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes())
        .merge(creator::routes())
        .merge(packages::routes())
        .merge(availability::routes())
        .merge(bookings::routes())
        .merge(transactions::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint; pings the store
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let storage = state.store.backend();

    let (status, label) = match state.store.health_check().await {
        Ok(true) => (StatusCode::OK, "ok"),
        Ok(false) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable"),
        Err(e) => {
            error!("Store health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "marketplace",
            "storage": storage,
        })),
    )
}
