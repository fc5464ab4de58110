use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, OptionalExtension, PgTextExpressionMethods,
    QueryDsl, SelectableHelper, TextExpressionMethods,
};
use diesel_async::RunQueryDsl;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    filters::{DateRange, substring_pattern},
    models::{CustomerEntity, FeedbackEntity, OrderDetail, OrderEntity, ProductEntity},
    orders::{
        intake::{self, OrderRequest, PlacedOrder},
        workflow,
    },
    platform::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::{AppJson, AppQuery},
        middleware,
    },
    routes::{loose_text, parse_id},
    schema::{customers, feedback, orders, products},
};

pub fn routes_with_openapi(state: &AppState) -> OpenApiRouter<AppState> {
    let admin = OpenApiRouter::new()
        .routes(utoipa_axum::routes!(get_orders))
        .routes(utoipa_axum::routes!(get_order))
        .routes(utoipa_axum::routes!(update_order_status))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::admin_authorization,
        ));

    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .merge(admin),
    )
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
struct CreateOrderReq {
    customer_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    #[schema(value_type = Option<String>)]
    product_id: Option<Value>,
    delivery_method: Option<String>,
    delivery_address: Option<String>,
}

/// Place an order from the storefront checkout.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = CreateOrderReq,
    responses(
        (status = 201, description = "Order created", body = StdResponse<PlacedOrder, String>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Product not found")
    )
)]
async fn create_order(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let placed = intake::create_order(
        state.orders.as_ref(),
        &state.config.shop,
        OrderRequest {
            customer_name: body.customer_name,
            phone: body.phone,
            email: body.email,
            product_id: loose_text(body.product_id),
            delivery_method: body.delivery_method,
            delivery_address: body.delivery_address,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        StdResponse::ok(placed, "Order created successfully"),
    ))
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct OrdersQuery {
    status: Option<String>,
    delivery_method: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    /// Matches the order reference, customer name or phone.
    search: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// List orders, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(OrdersQuery),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OrderDetail>, String>),
        (status = 401, description = "Missing or invalid admin token")
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<OrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref())?;

    let mut query = orders::table
        .inner_join(customers::table)
        .inner_join(products::table)
        .select((
            OrderEntity::as_select(),
            CustomerEntity::as_select(),
            ProductEntity::as_select(),
        ))
        .order_by(orders::created_at.desc())
        .into_boxed();

    if let Some(status) = non_blank(&params.status) {
        query = query.filter(orders::status.eq(status.to_string()));
    }
    if let Some(method) = non_blank(&params.delivery_method) {
        query = query.filter(orders::delivery_method.eq(method.to_string()));
    }
    if let Some(start) = range.start {
        query = query.filter(orders::created_at.ge(start));
    }
    if let Some(end) = range.end {
        query = query.filter(orders::created_at.le(end));
    }
    if let Some(search) = non_blank(&params.search) {
        let pattern = substring_pattern(search);
        query = query.filter(
            orders::order_reference
                .ilike(pattern.clone())
                .or(customers::name.ilike(pattern.clone()))
                .or(customers::phone.like(pattern)),
        );
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let rows: Vec<(OrderEntity, CustomerEntity, ProductEntity)> = query
        .load(conn)
        .await
        .context("Failed to get orders")?;

    let orders: Vec<OrderDetail> = rows
        .into_iter()
        .map(|(order, customer, product)| OrderDetail {
            order,
            customer,
            product,
        })
        .collect();

    Ok(StdResponse::ok(orders, "Get orders successfully"))
}

#[derive(Serialize, ToSchema)]
struct GetOrderRes {
    #[serde(flatten)]
    detail: OrderDetail,
    feedback: Option<FeedbackEntity>,
}

/// Fetch one order with its customer, product and feedback.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to fetch")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<GetOrderRes, String>),
        (status = 404, description = "Order not found")
    )
)]
async fn get_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "Order not found")?;
    let detail = state
        .orders
        .find_order_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let feedback: Option<FeedbackEntity> = feedback::table
        .filter(feedback::order_id.eq(id))
        .select(FeedbackEntity::as_select())
        .first(conn)
        .await
        .optional()
        .context("Failed to get order feedback")?;

    Ok(StdResponse::ok(
        GetOrderRes { detail, feedback },
        "Get order successfully",
    ))
}

#[derive(Deserialize, ToSchema)]
struct UpdateStatusReq {
    #[schema(value_type = Option<String>)]
    status: Option<Value>,
}

/// Move an order to a new status and notify the customer where it applies.
#[utoipa::path(
    patch,
    path = "/{id}/status",
    tags = ["Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = Uuid, Path, description = "Order ID to update")
    ),
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Order status updated", body = StdResponse<OrderEntity, String>),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
async fn update_order_status(
    Path(id): Path<String>,
    State(state): State<AppState>,
    AppJson(body): AppJson<UpdateStatusReq>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "Order not found")?;
    let status = loose_text(body.status).unwrap_or_default();
    let order = workflow::update_status(
        state.orders.as_ref(),
        &state.config.shop,
        state.transition_policy(),
        id,
        &status,
    )
    .await?;

    Ok(StdResponse::ok(order, "Order status updated successfully"))
}
