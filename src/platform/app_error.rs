use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Error returned by every HTTP handler.
///
/// Client errors carry the message shown to the caller. `Other` wraps anything
/// unexpected; its details only reach the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    ForbiddenResource(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadGateway(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::ForbiddenResource(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = match &self {
            AppError::Other(err) => {
                tracing::error!("Internal server error: {:#}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}

/// Envelope for successful responses: `{ success: true, data, message }`.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> StdResponse<T, M> {
    pub fn ok(data: T, message: M) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

impl<T: Serialize, M: Serialize> IntoResponse for StdResponse<T, M> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
