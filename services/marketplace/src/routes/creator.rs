//! Creator profile routes

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::models::{CreatorName, PublicProfile, UpdateCreatorProfile};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/creator/profile/:user_id",
            get(get_profile).put(update_profile),
        )
        .route("/api/creator/public/:custom_url", get(get_public_profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .store
        .get_profile_by_user(user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile"))?;

    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateCreatorProfile>,
) -> Result<impl IntoResponse, ApiError> {
    info!("Updating profile of user {}", user_id);

    let profile = state
        .store
        .update_profile(user_id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Profile"))?;

    Ok(Json(profile))
}

/// Public booking page: profile, active packages and creator name
pub async fn get_public_profile(
    State(state): State<AppState>,
    ApiPath(custom_url): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .store
        .get_profile_by_custom_url(&custom_url)
        .await?
        .ok_or(ApiError::NotFound("Profile"))?;

    let packages = state
        .store
        .list_packages_by_creator(profile.user_id)
        .await?
        .into_iter()
        .filter(|p| p.is_active)
        .collect();
    let creator = state
        .store
        .get_user(profile.user_id)
        .await?
        .as_ref()
        .map(CreatorName::from);

    Ok(Json(PublicProfile {
        profile,
        packages,
        creator,
    }))
}
