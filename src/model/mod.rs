//! Entity model: typed records, their descriptors and the relations between them.

mod component;
mod def;
mod post;
mod user;

pub use component::{Component, ComponentType, NewComponent, COMPONENT_DEF};
pub use def::{ColumnDef, ColumnKind, EntityDef, RelationDef, RelationKind};
pub use post::{NewPost, Post, POST_DEF};
pub use user::{NewUser, User, UserPatch, USER_DEF};

use serde::{de::DeserializeOwned, Serialize};

/// A persisted record type. Rows move through the store as JSON objects keyed by
/// column name; relation fields are filled in by name when eagerly loaded.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Shape accepted on insert (no generated key).
    type New: Serialize + Send + Sync;
    /// Partial update; `None` fields are left untouched. Entities that are never
    /// updated use [`ReadOnly`], so `Repository::update` cannot be called for them.
    type Patch: Serialize + Send + Sync;

    fn def() -> &'static EntityDef;
}

/// Patch type of insert-only entities. It has no values.
#[derive(Clone, Copy, Debug, Serialize)]
pub enum ReadOnly {}

/// Every entity known to the store, parents before children.
pub fn all_entities() -> [&'static EntityDef; 3] {
    [&USER_DEF, &POST_DEF, &COMPONENT_DEF]
}
