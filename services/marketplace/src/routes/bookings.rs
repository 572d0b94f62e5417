//! Booking routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::models::CreateBookingRequest;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/creator/:creator_id", get(list_bookings))
        .route("/api/bookings/:id", get(get_booking))
}

/// Newest session first
pub async fn list_bookings(
    State(state): State<AppState>,
    ApiPath(creator_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.store.list_bookings_by_creator(creator_id).await?;
    Ok(Json(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state
        .store
        .get_booking(id)
        .await?
        .ok_or(ApiError::NotFound("Booking"))?;

    Ok(Json(booking))
}

/// Checkout endpoint
pub async fn create_booking(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let created = state.bookings.create_booking(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
