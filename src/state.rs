//! Shared application state for all routes: one store handle and the schema built around it.

use crate::graphql::{build_schema, AppSchema};
use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub schema: AppSchema,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>) -> Self {
        let schema = build_schema(Arc::clone(&store));
        AppState { store, schema }
    }
}
