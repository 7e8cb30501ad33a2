//! Entity graph: GraphQL CRUD over users and the posts and components they own.

pub mod config;
pub mod error;
pub mod graphql;
pub mod model;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{AppConfig, StoreBackend};
pub use error::{AppError, ConfigError};
pub use graphql::{build_schema, AppSchema};
pub use routes::{app, common_routes, graphql_routes};
pub use service::{GraphService, Repository};
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables, MemoryStore, PgStore, Store};

use std::sync::Arc;

/// Open the configured store once; every request shares the returned handle.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>, AppError> {
    let store: Arc<dyn Store> = match config.store {
        StoreBackend::Postgres => Arc::new(PgStore::connect(config).await?),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}
