//! Static entity descriptors: tables, columns, foreign keys and relations.

/// Storage type of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// Generated integer primary key (SERIAL).
    Serial,
    Int,
    Text,
}

impl ColumnKind {
    /// PostgreSQL type used in DDL and casts.
    pub fn pg_type(self) -> &'static str {
        match self {
            ColumnKind::Serial => "SERIAL",
            ColumnKind::Int => "INTEGER",
            ColumnKind::Text => "TEXT",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    /// Table whose primary key this column references. Deleting the parent cascades.
    pub references: Option<&'static str>,
}

impl ColumnDef {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        ColumnDef {
            name,
            kind,
            nullable: false,
            references: None,
        }
    }

    pub const fn references(mut self, table: &'static str) -> Self {
        self.references = Some(table);
        self
    }
}

/// Direction of a relation: to_one (we hold the FK) or to_many (they hold the FK to us).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationKind {
    ManyToOne,
    OneToMany,
}

#[derive(Clone, Copy, Debug)]
pub struct RelationDef {
    /// Field name the related rows are loaded into.
    pub name: &'static str,
    pub kind: RelationKind,
    pub target: fn() -> &'static EntityDef,
    /// Our column in the join (our FK for many_to_one; our PK for one_to_many).
    pub our_key: &'static str,
    /// Their column in the join (their PK for many_to_one; their FK for one_to_many).
    pub their_key: &'static str,
    /// Column the related rows are sorted by, ties broken by their primary key.
    pub order_by: Option<&'static str>,
}

#[derive(Debug)]
pub struct EntityDef {
    pub name: &'static str,
    pub table: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
    pub relations: &'static [RelationDef],
}

impl EntityDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Columns written on insert: everything but the generated key.
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.kind != ColumnKind::Serial)
    }
}

impl PartialEq for EntityDef {
    fn eq(&self, other: &Self) -> bool {
        self.table == other.table
    }
}

impl Eq for EntityDef {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{COMPONENT_DEF, POST_DEF, USER_DEF};

    #[test]
    fn writable_columns_skip_generated_key() {
        let cols: Vec<_> = POST_DEF.writable_columns().map(|c| c.name).collect();
        assert_eq!(cols, vec!["text", "user_id"]);
    }

    #[test]
    fn child_relations_point_back_at_users() {
        for def in [&POST_DEF, &COMPONENT_DEF] {
            let fk = def.column("user_id").expect("user_id column");
            assert_eq!(fk.references, Some(USER_DEF.table));
            let owner = def.relation("user").expect("user relation");
            assert_eq!((owner.target)(), &USER_DEF);
            assert_eq!(owner.kind, RelationKind::ManyToOne);
        }
    }

    #[test]
    fn user_relations_target_children() {
        let posts = USER_DEF.relation("posts").expect("posts relation");
        assert_eq!((posts.target)(), &POST_DEF);
        assert_eq!(posts.their_key, "user_id");
        let components = USER_DEF.relation("components").expect("components relation");
        assert_eq!((components.target)(), &COMPONENT_DEF);
        assert_eq!(components.order_by, Some("index"));
    }
}
