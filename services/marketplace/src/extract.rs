//! Request extractors

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Request,
        rejection::{JsonRejection, PathRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::validation::Validate;

/// JSON body that has been deserialized and validated.
///
/// Unreadable bodies are reported as a validation failure on `body` (400)
/// rather than axum's default 422.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                debug!("Rejected request body: {}", rejection.body_text());
                ApiError::invalid_field("body", rejection.body_text())
            })?;

        value.validate().map_err(ApiError::Validation)?;
        Ok(ValidJson(value))
    }
}

/// Path parameters; an id that does not parse names no resource, so it is a JSON 404
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(PathRejection::FailedToDeserializePathParams(rejection)) => {
                debug!("Rejected path parameters: {}", rejection.body_text());
                Err(ApiError::NotFound("Resource"))
            }
            Err(rejection) => {
                error!("Path extraction failed: {}", rejection.body_text());
                Err(ApiError::InternalServerError)
            }
        }
    }
}
