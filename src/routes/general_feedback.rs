use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;

use crate::{
    feedback,
    filters::DateRange,
    models::{GeneralFeedbackEntity, NewGeneralFeedbackEntity},
    platform::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{AppJson, AppQuery},
        middleware,
    },
    routes::csv_attachment,
    schema::general_feedback,
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let admin = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_general_feedback))
        .routes(utoipa_axum::routes!(export_general_feedback))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_authorization,
        ));

    OpenApiRouter::new().nest(
        "/general-feedback",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(submit_general_feedback))
            .merge(admin),
    )
}

#[derive(Deserialize, ToSchema)]
struct SubmitGeneralFeedbackReq {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    message: Option<String>,
    rating: Option<i64>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Leave a comment about the shop.
#[utoipa::path(
    post,
    path = "/",
    tags = ["General feedback"],
    request_body = SubmitGeneralFeedbackReq,
    responses(
        (status = 201, description = "Feedback stored", body = StdResponse<GeneralFeedbackEntity, String>),
        (status = 400, description = "Missing name or message, or invalid rating")
    )
)]
async fn submit_general_feedback(
    State(state): State<AppState>,
    AppJson(body): AppJson<SubmitGeneralFeedbackReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(name), Some(message)) = (present(body.name), present(body.message)) else {
        return Err(AppError::BadRequest(
            "Name and message are required".to_string(),
        ));
    };
    let rating = match body.rating {
        Some(value) => Some(feedback::rating("rating", Some(value))?),
        None => None,
    };

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let stored: GeneralFeedbackEntity = diesel::insert_into(general_feedback::table)
        .values(NewGeneralFeedbackEntity {
            name,
            email: present(body.email),
            phone: present(body.phone),
            message,
            rating,
        })
        .returning(GeneralFeedbackEntity::as_returning())
        .get_result(conn)
        .await
        .context("Failed to store general feedback")?;

    Ok((
        StatusCode::CREATED,
        StdResponse::ok(stored, "Thank you for your feedback"),
    ))
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct GeneralFeedbackQuery {
    /// Minimum rating. Unrated entries are excluded when set.
    rating: Option<i32>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn load_general_feedback(
    state: &AppState,
    params: &GeneralFeedbackQuery,
) -> Result<Vec<GeneralFeedbackEntity>, AppError> {
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;

    let mut query = general_feedback::table
        .select(GeneralFeedbackEntity::as_select())
        .order_by(general_feedback::created_at.desc())
        .into_boxed();

    if let Some(rating) = params.rating {
        query = query.filter(general_feedback::rating.ge(rating));
    }
    if let Some(start) = range.start {
        query = query.filter(general_feedback::created_at.ge(start));
    }
    if let Some(end) = range.end {
        query = query.filter(general_feedback::created_at.le(end));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    Ok(query
        .load(conn)
        .await
        .context("Failed to get general feedback")?)
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct GeneralFeedbackListing {
    feedback: Vec<GeneralFeedbackEntity>,
    /// `null` when none of the entries carries a rating.
    average_rating: Option<f64>,
    total: usize,
}

/// List general feedback, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["General feedback"],
    security(("bearerAuth" = [])),
    params(GeneralFeedbackQuery),
    responses(
        (status = 200, description = "List general feedback", body = StdResponse<GeneralFeedbackListing, String>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn get_general_feedback(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<GeneralFeedbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = load_general_feedback(&state, &params).await?;

    Ok(StdResponse::ok(
        GeneralFeedbackListing {
            average_rating: feedback::general_average(&rows),
            total: rows.len(),
            feedback: rows,
        },
        "Get general feedback successfully",
    ))
}

/// Download general feedback as CSV.
#[utoipa::path(
    get,
    path = "/export",
    tags = ["General feedback"],
    security(("bearerAuth" = [])),
    params(GeneralFeedbackQuery),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn export_general_feedback(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<GeneralFeedbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = load_general_feedback(&state, &params).await?;
    let csv = feedback::general_feedback_csv(&rows)?;

    Ok(csv_attachment("general-feedback-export", csv))
}
