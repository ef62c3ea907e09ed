//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the App Access API.

use crate::error::ApiError;
use crate::models::ServiceInfo;
use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use axum::response::Json;

pub mod actions;
pub mod apps;
pub mod connect;
pub mod link;
pub mod signup;

/// JSON body extractor whose rejections render as problem+json
/// `VALIDATION_FAILED` errors instead of axum's plain-text defaults.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(AppJson(value))
    }
}

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}
