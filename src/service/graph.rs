//! Named operations over users and what they own. Every failure comes back as a typed `AppError`.

use super::crud::Repository;
use super::validation::{ComponentDraft, ComponentValidator};
use crate::error::AppError;
use crate::model::{Component, NewPost, NewUser, Post, User, UserPatch};
use crate::store::{Criteria, OrderBy, Store};
use std::sync::Arc;

/// Relations loaded by `find_user`.
const USER_RELATIONS: &[&str] = &["posts", "components"];

#[derive(Clone)]
pub struct GraphService {
    users: Repository<User>,
    posts: Repository<Post>,
    components: Repository<Component>,
}

impl GraphService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        GraphService {
            users: Repository::new(store.clone()),
            posts: Repository::new(store.clone()),
            components: Repository::new(store),
        }
    }

    /// User by id with posts and components loaded; `None` when absent.
    pub async fn find_user(&self, id: i32) -> Result<Option<User>, AppError> {
        self.users.find_by_id(id, USER_RELATIONS).await
    }

    pub async fn list_users(&self, order: Option<OrderBy>) -> Result<Vec<User>, AppError> {
        self.users.find_all(order).await
    }

    /// Posts owned by `user_id`, oldest first.
    pub async fn posts_of(&self, user_id: i32) -> Result<Vec<Post>, AppError> {
        self.posts
            .find_many(&Criteria::new().eq("user_id", user_id), None, &[])
            .await
    }

    /// Components owned by `user_id`, in `index` order.
    pub async fn components_of(&self, user_id: i32) -> Result<Vec<Component>, AppError> {
        self.components
            .find_many(&Criteria::new().eq("user_id", user_id), Some(OrderBy::asc("index")), &[])
            .await
    }

    pub async fn create_user(&self, name: String) -> Result<User, AppError> {
        let user = self.users.insert(&NewUser { name }).await?;
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn update_user(&self, id: i32, patch: UserPatch) -> Result<User, AppError> {
        self.users.update(id, &patch).await
    }

    /// Deletes the user and, through the foreign keys, everything it owns. Missing users are a no-op.
    pub async fn delete_user(&self, id: i32) -> Result<u64, AppError> {
        let removed = self.users.delete(&Criteria::new().eq("id", id)).await?;
        tracing::debug!(user_id = id, removed, "user deleted");
        Ok(removed)
    }

    pub async fn create_post(&self, user_id: i32, text: String) -> Result<Post, AppError> {
        self.require_user(user_id).await?;
        self.posts.insert(&NewPost { text, user_id }).await
    }

    /// Validate the whole batch, then insert it in one unit of work. Nothing is written on any failure.
    pub async fn create_components(
        &self,
        user_id: i32,
        drafts: &[ComponentDraft],
    ) -> Result<Vec<Component>, AppError> {
        let accepted = ComponentValidator::validate(user_id, drafts)?;
        self.require_user(user_id).await?;
        let stored = self.components.insert_many(&accepted).await?;
        tracing::debug!(user_id, count = stored.len(), "components created");
        Ok(stored)
    }

    async fn require_user(&self, id: i32) -> Result<(), AppError> {
        match self.users.find_by_id(id, &[]).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("User {}", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> GraphService {
        GraphService::new(Arc::new(MemoryStore::new()))
    }

    fn draft(index: i32, kind: &str, text: &str) -> ComponentDraft {
        ComponentDraft {
            index,
            kind: kind.into(),
            text: text.into(),
        }
    }

    #[tokio::test]
    async fn components_come_back_in_index_order() {
        let svc = service();
        let u = svc.create_user("ada".into()).await.unwrap();
        svc.create_components(u.id, &[draft(2, "code", "c"), draft(0, "header", "a"), draft(1, "list", "b")])
            .await
            .unwrap();
        let found = svc.find_user(u.id).await.unwrap().unwrap();
        let texts: Vec<_> = found.components.unwrap().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn components_for_missing_user_are_not_found() {
        let svc = service();
        let err = svc.create_components(9, &[draft(0, "code", "x")]).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn post_for_missing_user_is_not_found() {
        let svc = service();
        let err = svc.create_post(9, "x".into()).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
    }

    #[tokio::test]
    async fn delete_user_counts_removed_rows() {
        let svc = service();
        let u = svc.create_user("ada".into()).await.unwrap();
        assert_eq!(svc.delete_user(u.id).await.unwrap(), 1);
        assert_eq!(svc.delete_user(u.id).await.unwrap(), 0);
    }
}
