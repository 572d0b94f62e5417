//! Package routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::models::{NewPackage, UpdatePackage};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/packages", post(create_package))
        .route("/api/packages/creator/:creator_id", get(list_packages))
        .route(
            "/api/packages/:id",
            get(get_package).put(update_package).delete(delete_package),
        )
}

pub async fn list_packages(
    State(state): State<AppState>,
    ApiPath(creator_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let packages = state.store.list_packages_by_creator(creator_id).await?;
    Ok(Json(packages))
}

pub async fn get_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let package = state
        .store
        .get_package(id)
        .await?
        .ok_or(ApiError::NotFound("Package"))?;

    Ok(Json(package))
}

pub async fn create_package(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<NewPackage>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.get_user(payload.creator_id).await?.is_none() {
        return Err(ApiError::NotFound("Creator"));
    }

    let package = state.store.create_package(&payload).await?;
    info!("Package {} created for creator {}", package.id, package.creator_id);

    Ok((StatusCode::CREATED, Json(package)))
}

pub async fn update_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ValidJson(payload): ValidJson<UpdatePackage>,
) -> Result<impl IntoResponse, ApiError> {
    let package = state
        .store
        .update_package(id, &payload)
        .await?
        .ok_or(ApiError::NotFound("Package"))?;

    Ok(Json(package))
}

pub async fn delete_package(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete_package(id).await? {
        return Err(ApiError::NotFound("Package"));
    }
    info!("Package {} deleted", id);

    Ok(Json(json!({ "success": true })))
}
