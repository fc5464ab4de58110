use anyhow::Context;
use axum::{extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    auth,
    models::AdminEntity,
    platform::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppJson,
        middleware,
    },
    schema::{admins, orders},
    sms::SendOutcome,
    stats::{self, OrderStats, Windows},
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let protected = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_stats))
        .routes(utoipa_axum::routes!(test_sms))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_authorization,
        ));

    OpenApiRouter::new().nest(
        "/admin",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(login))
            .merge(protected),
    )
}

#[derive(Deserialize, ToSchema)]
struct LoginReq {
    username: Option<String>,
    password: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct AdminProfile {
    id: Uuid,
    username: String,
    role: String,
}

#[derive(Serialize, ToSchema)]
struct LoginRes {
    token: String,
    admin: AdminProfile,
}

/// Exchange admin credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    tags = ["Admin"],
    request_body = LoginReq,
    responses(
        (status = 200, description = "Logged in", body = StdResponse<LoginRes, String>),
        (status = 400, description = "Username and password required"),
        (status = 401, description = "Invalid credentials")
    )
)]
async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(password)) = (
        body.username.filter(|u| !u.trim().is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Username and password required".to_string(),
        ));
    };

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let admin: Option<AdminEntity> = admins::table
        .filter(admins::username.eq(username.trim()))
        .select(AdminEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get admin")?;

    let admin = match admin {
        Some(admin) => {
            let hash = admin.password_hash.clone();
            let verified =
                tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
                    .await
                    .context("Password check task failed")?;
            verified.then_some(admin)
        }
        None => None,
    };
    let Some(admin) = admin else {
        tracing::warn!("Failed admin login for {}", username.trim());
        return Err(AppError::Unauthorized);
    };

    let token = auth::issue_token(&admin, &state.config.auth)?;
    tracing::info!("Admin {} logged in", admin.username);

    Ok(StdResponse::ok(
        LoginRes {
            token,
            admin: AdminProfile {
                id: admin.id,
                username: admin.username,
                role: admin.role,
            },
        },
        "Logged in successfully",
    ))
}

/// Order counts for today, the last seven days and the last month.
#[utoipa::path(
    get,
    path = "/stats",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Order statistics", body = StdResponse<OrderStats, String>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn get_stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let windows = Windows::ending_at(Utc::now());

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rows: Vec<(String, DateTime<Utc>)> = orders::table
        .filter(orders::created_at.ge(windows.earliest()))
        .select((orders::status, orders::created_at))
        .load(conn)
        .await
        .context("Failed to get orders for stats")?;

    let stats = stats::summarize(
        rows.iter().map(|(status, created_at)| (status.as_str(), *created_at)),
        &windows,
    );

    Ok(StdResponse::ok(stats, "Get stats successfully"))
}

#[derive(Deserialize, ToSchema)]
struct TestSmsReq {
    phone: Option<String>,
    message: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct TestSmsRes {
    #[schema(value_type = Object)]
    response: Value,
}

/// Send a one-off message through the SMS gateway.
#[utoipa::path(
    post,
    path = "/test-sms",
    tags = ["Admin"],
    security(("bearerAuth" = [])),
    request_body = TestSmsReq,
    responses(
        (status = 200, description = "Provider accepted the message", body = StdResponse<TestSmsRes, String>),
        (status = 400, description = "Phone and message required"),
        (status = 502, description = "Provider refused or could not be reached")
    )
)]
async fn test_sms(
    State(state): State<AppState>,
    AppJson(body): AppJson<TestSmsReq>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(phone), Some(message)) = (
        body.phone.filter(|p| !p.trim().is_empty()),
        body.message.filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Phone and message required".to_string()));
    };

    tracing::info!("Testing SMS to {}", phone);
    match state.gateway.send(&phone, &message, None).await {
        SendOutcome::Sent { response } => {
            Ok(StdResponse::ok(TestSmsRes { response }, "SMS sent"))
        }
        SendOutcome::Failed { reason, .. } => Err(AppError::BadGateway(reason.to_string())),
    }
}
