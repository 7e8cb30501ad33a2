//! HTTP surface: common probes plus the GraphQL endpoint.

mod common;
mod graphql;

pub use common::common_routes;
pub use graphql::graphql_routes;

use crate::config::AppConfig;
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Full application router. `body_limit` replaces axum's built-in 2 MiB extractor cap.
pub fn app(state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(graphql_routes(state, &config.graphql_path))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.body_limit))
}
