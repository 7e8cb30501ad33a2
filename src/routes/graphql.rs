//! GraphQL over HTTP: POST executes a request, GET serves GraphiQL pointed at the same path.

use crate::state::AppState;
use async_graphql::http::GraphiQLSource;
use axum::{extract::State, response::Html, routing::get, Json, Router};

async fn execute(State(state): State<AppState>, Json(req): Json<async_graphql::Request>) -> Json<async_graphql::Response> {
    Json(state.schema.execute(req).await)
}

pub fn graphql_routes(state: AppState, path: &str) -> Router {
    let page = GraphiQLSource::build().endpoint(path).finish();
    Router::new()
        .route(
            path,
            get(move || {
                let page = page.clone();
                async move { Html(page) }
            })
            .post(execute),
        )
        .with_state(state)
}
