//! Weekly availability routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::models::{NewAvailability, UpdateAvailability};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/availability", post(create_availability))
        .route("/api/availability/creator/:creator_id", get(list_availability))
        .route(
            "/api/availability/:id",
            put(update_availability).delete(delete_availability),
        )
}

pub async fn list_availability(
    State(state): State<AppState>,
    ApiPath(creator_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let windows = state.store.list_availability_by_creator(creator_id).await?;
    Ok(Json(windows))
}

pub async fn create_availability(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewAvailability>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.get_user(payload.creator_id).await?.is_none() {
        return Err(ApiError::NotFound("Creator"));
    }

    let window = state.store.create_availability(&payload).await?;
    Ok((StatusCode::CREATED, Json(window)))
}

pub async fn update_availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateAvailability>,
) -> Result<impl IntoResponse, ApiError> {
    let window = state
        .store
        .update_availability(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Availability"))?;

    Ok(Json(window))
}

pub async fn delete_availability(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete_availability(id).await? {
        return Err(ApiError::NotFound("Availability"));
    }

    Ok(Json(json!({ "success": true })))
}
