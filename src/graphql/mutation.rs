//! Mutations report only success. The error behind a `false` is logged, not returned.

use super::types::ComponentInput;
use crate::error::AppError;
use crate::model::UserPatch;
use crate::service::{ComponentDraft, GraphService};
use async_graphql::{Context, Object, Result};

#[derive(Default)]
pub struct MutationRoot;

fn succeeded<T>(op: &'static str, outcome: Result<T, AppError>) -> bool {
    match outcome {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(op, code = e.kind(), error = %e, "mutation failed");
            false
        }
    }
}

#[Object]
impl MutationRoot {
    async fn create_user(&self, ctx: &Context<'_>, name: String) -> Result<bool> {
        let svc = ctx.data::<GraphService>()?;
        Ok(succeeded("createUser", svc.create_user(name).await))
    }

    /// Only `name` can change; omitted arguments leave the field as is.
    async fn update_user(&self, ctx: &Context<'_>, id: i32, name: Option<String>) -> Result<bool> {
        let svc = ctx.data::<GraphService>()?;
        Ok(succeeded("updateUser", svc.update_user(id, UserPatch { name }).await))
    }

    /// True even when no user had this id.
    async fn delete_user(&self, ctx: &Context<'_>, id: i32) -> Result<bool> {
        let svc = ctx.data::<GraphService>()?;
        Ok(succeeded("deleteUser", svc.delete_user(id).await))
    }

    async fn create_post(&self, ctx: &Context<'_>, user_id: i32, text: String) -> Result<bool> {
        let svc = ctx.data::<GraphService>()?;
        Ok(succeeded("createPost", svc.create_post(user_id, text).await))
    }

    /// All components are stored, or none are.
    async fn create_component(
        &self,
        ctx: &Context<'_>,
        user_id: i32,
        components: Vec<ComponentInput>,
    ) -> Result<bool> {
        let svc = ctx.data::<GraphService>()?;
        let drafts: Vec<ComponentDraft> = components.into_iter().map(Into::into).collect();
        Ok(succeeded("createComponent", svc.create_components(user_id, &drafts).await))
    }
}
