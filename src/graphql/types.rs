//! External GraphQL shapes and their mapping from entity records.

use crate::model::{Component, Post, User};
use crate::service::{ComponentDraft, GraphService};
use crate::store::{Direction, OrderBy};
use async_graphql::{ComplexObject, Context, Enum, ErrorExtensions, InputObject, Result, SimpleObject};

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "User", complex)]
pub struct UserObject {
    pub id: i32,
    pub name: String,
    #[graphql(skip)]
    pub loaded_posts: Option<Vec<PostObject>>,
    #[graphql(skip)]
    pub loaded_components: Option<Vec<ComponentObject>>,
}

#[ComplexObject]
impl UserObject {
    /// Posts owned by this user; served from the eager load when `findUser` fetched them.
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<PostObject>> {
        if let Some(posts) = &self.loaded_posts {
            return Ok(posts.clone());
        }
        let svc = ctx.data::<GraphService>()?;
        let posts = svc.posts_of(self.id).await.map_err(|e| e.extend())?;
        Ok(posts.into_iter().map(PostObject::from).collect())
    }

    /// Components owned by this user, in `index` order.
    async fn components(&self, ctx: &Context<'_>) -> Result<Vec<ComponentObject>> {
        if let Some(components) = &self.loaded_components {
            return Ok(components.clone());
        }
        let svc = ctx.data::<GraphService>()?;
        let components = svc.components_of(self.id).await.map_err(|e| e.extend())?;
        Ok(components.into_iter().map(ComponentObject::from).collect())
    }
}

impl From<User> for UserObject {
    fn from(u: User) -> Self {
        UserObject {
            id: u.id,
            name: u.name,
            loaded_posts: u.posts.map(|v| v.into_iter().map(PostObject::from).collect()),
            loaded_components: u
                .components
                .map(|v| v.into_iter().map(ComponentObject::from).collect()),
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Post")]
pub struct PostObject {
    pub id: i32,
    pub text: String,
    pub user_id: i32,
}

impl From<Post> for PostObject {
    fn from(p: Post) -> Self {
        PostObject {
            id: p.id,
            text: p.text,
            user_id: p.user_id,
        }
    }
}

#[derive(SimpleObject, Clone, Debug)]
#[graphql(name = "Component")]
pub struct ComponentObject {
    pub id: i32,
    pub user_id: i32,
    pub index: i32,
    #[graphql(name = "type")]
    pub kind: String,
    pub text: String,
}

impl From<Component> for ComponentObject {
    fn from(c: Component) -> Self {
        ComponentObject {
            id: c.id,
            user_id: c.user_id,
            index: c.index,
            kind: c.kind.as_str().to_string(),
            text: c.text,
        }
    }
}

/// A component as submitted to `createComponent`. The type is checked server-side against the allow-list.
#[derive(InputObject, Clone, Debug)]
pub struct ComponentInput {
    pub index: i32,
    #[graphql(name = "type")]
    pub kind: String,
    pub text: String,
}

impl From<ComponentInput> for ComponentDraft {
    fn from(c: ComponentInput) -> Self {
        ComponentDraft {
            index: c.index,
            kind: c.kind,
            text: c.text,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum UserOrderField {
    Id,
    Name,
}

#[derive(Enum, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(InputObject, Clone, Copy, Debug)]
pub struct UserOrder {
    pub field: UserOrderField,
    #[graphql(default)]
    pub direction: SortDirection,
}

impl From<UserOrder> for OrderBy {
    fn from(o: UserOrder) -> Self {
        let column = match o.field {
            UserOrderField::Id => "id",
            UserOrderField::Name => "name",
        };
        OrderBy {
            column: column.to_string(),
            direction: match o.direction {
                SortDirection::Asc => Direction::Asc,
                SortDirection::Desc => Direction::Desc,
            },
        }
    }
}
