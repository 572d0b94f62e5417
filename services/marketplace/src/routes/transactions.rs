//! Transaction reporting routes for creators and admins

use axum::{
    Json, Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/transactions/creator/:creator_id",
            get(list_creator_transactions),
        )
        .route("/api/admin/transactions", get(list_all_transactions))
}

pub async fn list_creator_transactions(
    State(state): State<AppState>,
    ApiPath(creator_id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.store.list_transactions_by_creator(creator_id).await?;
    Ok(Json(transactions))
}

/// Every transaction on the platform, newest first
pub async fn list_all_transactions(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.store.list_transactions().await?;
    Ok(Json(transactions))
}
