//! GraphQL API over the entity graph:
//! - [`QueryRoot`]: `hello`, `users`, `findUser`
//! - [`MutationRoot`]: create/update/delete users, create posts and component batches

mod mutation;
mod query;
mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;
pub use types::*;

use crate::service::GraphService;
use crate::store::Store;
use async_graphql::{EmptySubscription, Schema};
use std::sync::Arc;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the schema around one shared store handle.
pub fn build_schema(store: Arc<dyn Store>) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(GraphService::new(store))
        .finish()
}
