use super::types::{UserObject, UserOrder};
use crate::service::GraphService;
use async_graphql::{Context, ErrorExtensions, Object, Result};

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn hello(&self, name: String) -> String {
        format!("Hello, {}", name)
    }

    /// Every user, by id unless `orderBy` says otherwise.
    async fn users(&self, ctx: &Context<'_>, order_by: Option<UserOrder>) -> Result<Vec<UserObject>> {
        let svc = ctx.data::<GraphService>()?;
        let users = svc
            .list_users(order_by.map(Into::into))
            .await
            .map_err(|e| e.extend())?;
        Ok(users.into_iter().map(UserObject::from).collect())
    }

    /// One user with its posts and components, or null.
    async fn find_user(&self, ctx: &Context<'_>, id: i32) -> Result<Option<UserObject>> {
        let svc = ctx.data::<GraphService>()?;
        let user = svc.find_user(id).await.map_err(|e| e.extend())?;
        Ok(user.map(UserObject::from))
    }
}
