//! Account routes: registration, OTP verification and login

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};

use crate::error::ApiError;
use crate::extract::ValidJson;
use crate::models::{LoginRequest, RegisterRequest, VerifyOtpRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/verify-otp", post(verify_otp))
        .route("/api/auth/login", post(login))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.auth.register(payload).await?;
    Ok(Json(response))
}

/// OTP verification endpoint
pub async fn verify_otp(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<VerifyOtpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.auth.verify_otp(payload).await?;
    Ok(Json(response))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.auth.login(payload).await?;
    Ok(Json(response))
}
