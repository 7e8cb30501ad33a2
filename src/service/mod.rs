//! Data access and named operations: generic repository, batch validation, graph service.

mod crud;
mod graph;
mod validation;
pub use crud::Repository;
pub use graph::GraphService;
pub use validation::{ComponentDraft, ComponentValidator};
