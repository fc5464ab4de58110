use axum::extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, QueryRejection},
};

use crate::platform::app_error::AppError;

/// `axum::Json` whose rejections answer with the usual `{ success, error }` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `axum::extract::Query` whose rejections answer with the usual error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        AppError::BadRequest("Invalid request body".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Rejected query string: {}", rejection.body_text());
        AppError::BadRequest("Invalid query parameters".to_string())
    }
}
