use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    feedback::{self, Averages, FeedbackRow},
    filters::DateRange,
    models::{FeedbackEntity, NewFeedbackEntity},
    platform::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{AppJson, AppQuery},
        middleware,
    },
    routes::{csv_attachment, parse_id},
    schema::{feedback as feedback_table, orders, products},
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let admin = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_feedback))
        .routes(utoipa_axum::routes!(export_feedback))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_authorization,
        ));

    OpenApiRouter::new().nest(
        "/feedback",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(submit_feedback))
            .routes(utoipa_axum::routes!(get_order_feedback))
            .merge(admin),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct SubmitFeedbackReq {
    order_id: Option<Uuid>,
    overall_rating: Option<i64>,
    product_rating: Option<i64>,
    delivery_rating: Option<i64>,
    comments: Option<String>,
    would_recommend: Option<bool>,
}

/// Rate a completed order.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Feedback"],
    request_body = SubmitFeedbackReq,
    responses(
        (status = 201, description = "Feedback stored", body = StdResponse<FeedbackEntity, String>),
        (status = 400, description = "Invalid rating or feedback already submitted"),
        (status = 404, description = "Order not found")
    )
)]
async fn submit_feedback(
    State(state): State<AppState>,
    AppJson(body): AppJson<SubmitFeedbackReq>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = body
        .order_id
        .ok_or_else(|| AppError::BadRequest("orderId is required".to_string()))?;
    let new_feedback = NewFeedbackEntity {
        order_id,
        overall_rating: feedback::rating("overallRating", body.overall_rating)?,
        product_rating: feedback::rating("productRating", body.product_rating)?,
        delivery_rating: feedback::rating("deliveryRating", body.delivery_rating)?,
        comments: body
            .comments
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        would_recommend: body.would_recommend,
    };

    let stored = feedback::submit(state.feedback.as_ref(), new_feedback).await?;

    Ok((
        StatusCode::CREATED,
        StdResponse::ok(stored, "Thank you for your feedback"),
    ))
}

/// Feedback left for one order.
#[utoipa::path(
    get,
    path = "/order/{order_id}",
    tags = ["Feedback"],
    params(
        ("order_id" = Uuid, Path, description = "Order the feedback belongs to")
    ),
    responses(
        (status = 200, description = "Get feedback successfully", body = StdResponse<FeedbackEntity, String>),
        (status = 404, description = "Feedback not found")
    )
)]
async fn get_order_feedback(
    Path(order_id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&order_id, "Feedback not found")?;
    let feedback = feedback::for_order(state.feedback.as_ref(), order_id).await?;

    Ok(StdResponse::ok(feedback, "Get feedback successfully"))
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct FeedbackQuery {
    /// Minimum overall rating.
    rating: Option<i32>,
    start_date: Option<String>,
    end_date: Option<String>,
}

async fn load_feedback(
    state: &AppState,
    params: &FeedbackQuery,
) -> Result<Vec<FeedbackRow>, AppError> {
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;

    let mut query = feedback_table::table
        .inner_join(orders::table.inner_join(products::table))
        .select((
            FeedbackEntity::as_select(),
            orders::order_reference,
            products::brand,
            products::model,
        ))
        .order_by(feedback_table::created_at.desc())
        .into_boxed();

    if let Some(rating) = params.rating {
        query = query.filter(feedback_table::overall_rating.ge(rating));
    }
    if let Some(start) = range.start {
        query = query.filter(feedback_table::created_at.ge(start));
    }
    if let Some(end) = range.end {
        query = query.filter(feedback_table::created_at.le(end));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rows: Vec<(FeedbackEntity, String, String, String)> = query
        .load(conn)
        .await
        .context("Failed to get feedback")?;

    Ok(rows
        .into_iter()
        .map(|(feedback, order_reference, brand, model)| FeedbackRow {
            feedback,
            order_reference,
            product: format!("{brand} {model}"),
        })
        .collect())
}

#[derive(Serialize, ToSchema)]
struct FeedbackListing {
    feedback: Vec<FeedbackRow>,
    averages: Averages,
}

/// List order feedback, newest first, with average ratings.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Feedback"],
    security(("bearerAuth" = [])),
    params(FeedbackQuery),
    responses(
        (status = 200, description = "List feedback", body = StdResponse<FeedbackListing, String>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn get_feedback(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<FeedbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = load_feedback(&state, &params).await?;
    let averages = feedback::averages(&rows);

    Ok(StdResponse::ok(
        FeedbackListing {
            feedback: rows,
            averages,
        },
        "Get feedback successfully",
    ))
}

/// Download order feedback as CSV.
#[utoipa::path(
    get,
    path = "/export",
    tags = ["Feedback"],
    security(("bearerAuth" = [])),
    params(FeedbackQuery),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn export_feedback(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<FeedbackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = load_feedback(&state, &params).await?;
    let csv = feedback::feedback_csv(&rows)?;

    Ok(csv_attachment("feedback-export", csv))
}
