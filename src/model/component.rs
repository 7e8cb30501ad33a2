use super::def::{ColumnDef, ColumnKind, EntityDef, RelationDef, RelationKind};
use super::user::user_def;
use super::{Entity, ReadOnly, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub static COMPONENT_DEF: EntityDef = EntityDef {
    name: "Component",
    table: "components",
    primary_key: "id",
    columns: &[
        ColumnDef::new("id", ColumnKind::Serial),
        ColumnDef::new("user_id", ColumnKind::Int).references("users"),
        ColumnDef::new("index", ColumnKind::Int),
        ColumnDef::new("type", ColumnKind::Text),
        ColumnDef::new("text", ColumnKind::Text),
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

/// Closed set of component type tags. Anything else is rejected before it reaches the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Header,
    Paragraph,
    Image,
    Link,
    List,
    Quote,
    Code,
    Divider,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Header,
        ComponentType::Paragraph,
        ComponentType::Image,
        ComponentType::Link,
        ComponentType::List,
        ComponentType::Quote,
        ComponentType::Code,
        ComponentType::Divider,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentType::Header => "header",
            ComponentType::Paragraph => "paragraph",
            ComponentType::Image => "image",
            ComponentType::Link => "link",
            ComponentType::List => "list",
            ComponentType::Quote => "quote",
            ComponentType::Code => "code",
            ComponentType::Divider => "divider",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown component type '{0}'")]
pub struct UnknownComponentType(pub String);

impl FromStr for ComponentType {
    type Err = UnknownComponentType;

    /// Exact, case-sensitive match against the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownComponentType(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: i32,
    pub user_id: i32,
    pub index: i32,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Box<User>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewComponent {
    pub user_id: i32,
    pub index: i32,
    #[serde(rename = "type")]
    pub kind: ComponentType,
    pub text: String,
}

impl Entity for Component {
    type New = NewComponent;
    type Patch = ReadOnly;

    fn def() -> &'static EntityDef {
        &COMPONENT_DEF
    }
}
