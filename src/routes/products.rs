use anyhow::Context;
use axum::{
    extract::State,
    response::IntoResponse,
};
use diesel::{ExpressionMethods, PgTextExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use utoipa::IntoParams;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    filters::{self, substring_pattern},
    models::ProductEntity,
    platform::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        extract::AppQuery,
    },
    schema::products,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/products",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_products))
            .routes(utoipa_axum::routes!(get_brands)),
    )
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
struct ProductsQuery {
    /// Case-insensitive substring of the brand.
    brand: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    storage: Option<String>,
    ram: Option<String>,
    /// `true` for 5G phones only; any other value for non-5G phones.
    has5g: Option<String>,
    color: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Browse the catalogue, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Products"],
    params(ProductsQuery),
    responses(
        (status = 200, description = "List products", body = StdResponse<Vec<ProductEntity>, String>),
        (status = 400, description = "Invalid query parameters")
    )
)]
async fn get_products(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<ProductsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let mut query = products::table
        .select(ProductEntity::as_select())
        .order_by(products::created_at.desc())
        .into_boxed();

    if let Some(brand) = non_blank(&params.brand) {
        query = query.filter(products::brand.ilike(substring_pattern(&brand)));
    }
    if let Some(min) = params.min_price {
        query = query.filter(products::price.ge(min));
    }
    if let Some(max) = params.max_price {
        query = query.filter(products::price.le(max));
    }
    if let Some(storage) = non_blank(&params.storage) {
        query = query.filter(products::storage_capacity.eq(storage));
    }
    if let Some(ram) = non_blank(&params.ram) {
        query = query.filter(products::ram.eq(ram));
    }
    if let Some(has_5g) = &params.has5g {
        query = query.filter(products::has_5g.eq(filters::flag(Some(has_5g.as_str()))));
    }
    if let Some(color) = non_blank(&params.color) {
        query = query.filter(products::color.ilike(substring_pattern(&color)));
    }

    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let products: Vec<ProductEntity> = query
        .load(conn)
        .await
        .context("Failed to get products")?;

    Ok(StdResponse::ok(products, "Get products successfully"))
}

/// Distinct brands in the catalogue, alphabetically.
#[utoipa::path(
    get,
    path = "/brands",
    tags = ["Products"],
    responses(
        (status = 200, description = "List brands", body = StdResponse<Vec<String>, String>)
    )
)]
async fn get_brands(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let conn = &mut state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let brands: Vec<String> = products::table
        .select(products::brand)
        .distinct()
        .order_by(products::brand.asc())
        .load(conn)
        .await
        .context("Failed to get brands")?;

    Ok(StdResponse::ok(brands, "Get brands successfully"))
}
