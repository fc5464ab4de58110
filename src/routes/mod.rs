pub mod admin;
pub mod feedback;
pub mod general_feedback;
pub mod orders;
pub mod products;

use axum::{
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::Value;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::platform::{app_error::AppError, app_state::AppState};

/// Every HTTP route, with the admin-only ones behind the bearer-token check.
pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    orders::routes_with_openapi(state)
        .merge(products::routes_with_openapi())
        .merge(feedback::routes_with_openapi(state))
        .merge(general_feedback::routes_with_openapi(state))
        .merge(admin::routes_with_openapi(state))
}

/// `text/csv` download named `{stem}-YYYY-MM-DD.csv`.
pub(crate) fn csv_attachment(stem: &str, body: String) -> impl IntoResponse {
    let filename = format!("{stem}-{}.csv", Utc::now().format("%Y-%m-%d"));
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

/// Path ids that are not UUIDs cannot name a stored row.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(not_found.to_string()))
}

/// Body field read as text whatever JSON type the client sent. `null` counts as absent.
pub(crate) fn loose_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}
