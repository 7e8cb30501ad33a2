use super::def::{ColumnDef, ColumnKind, EntityDef, RelationDef, RelationKind};
use super::user::user_def;
use super::{Entity, ReadOnly, User};
use serde::{Deserialize, Serialize};

pub static POST_DEF: EntityDef = EntityDef {
    name: "Post",
    table: "posts",
    primary_key: "id",
    columns: &[
        ColumnDef::new("id", ColumnKind::Serial),
        ColumnDef::new("text", ColumnKind::Text),
        ColumnDef::new("user_id", ColumnKind::Int).references("users"),
    ],
    relations: &[RelationDef {
        name: "user",
        kind: RelationKind::ManyToOne,
        target: user_def,
        our_key: "user_id",
        their_key: "id",
        order_by: None,
    }],
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub text: String,
    pub user_id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NewPost {
    pub text: String,
    pub user_id: i32,
}

impl Entity for Post {
    type New = NewPost;
    type Patch = ReadOnly;

    fn def() -> &'static EntityDef {
        &POST_DEF
    }
}
