pub mod auth;
pub mod consumers;
pub mod feedback;
pub mod filters;
pub mod models;
pub mod orders;
pub mod platform;
pub mod routes;
pub mod schema;
pub mod sms;
pub mod stats;
pub mod store;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::platform::{app_state::AppState, swagger};

/// The HTTP application: every route plus the Swagger UI.
pub fn app(state: AppState) -> Router {
    let routes = routes::routes_with_openapi(&state);

    let mut openapi = routes.get_openapi().clone();
    openapi.info = utoipa::openapi::InfoBuilder::new()
        .title("Simu Hub Storefront API")
        .version(env!("CARGO_PKG_VERSION"))
        .build();
    let swagger_ui = swagger::create_swagger_ui(openapi);

    Router::new()
        .merge(routes)
        .merge(swagger_ui)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
