use super::def::{ColumnDef, ColumnKind, EntityDef, RelationDef, RelationKind};
use super::{Component, Entity, Post, COMPONENT_DEF, POST_DEF};
use serde::{Deserialize, Serialize};

pub static USER_DEF: EntityDef = EntityDef {
    name: "User",
    table: "users",
    primary_key: "id",
    columns: &[
        ColumnDef::new("id", ColumnKind::Serial),
        ColumnDef::new("name", ColumnKind::Text),
    ],
    relations: &[
        RelationDef {
            name: "posts",
            kind: RelationKind::OneToMany,
            target: post_def,
            our_key: "id",
            their_key: "user_id",
            order_by: None,
        },
        RelationDef {
            name: "components",
            kind: RelationKind::OneToMany,
            target: component_def,
            our_key: "id",
            their_key: "user_id",
            order_by: Some("index"),
        },
    ],
};

pub(super) fn user_def() -> &'static EntityDef {
    &USER_DEF
}

fn post_def() -> &'static EntityDef {
    &POST_DEF
}

fn component_def() -> &'static EntityDef {
    &COMPONENT_DEF
}

/// Root entity; owns posts and components. Relation fields are `None` unless loaded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts: Option<Vec<Post>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewUser {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Entity for User {
    type New = NewUser;
    type Patch = UserPatch;

    fn def() -> &'static EntityDef {
        &USER_DEF
    }
}
