//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and DDL from entity descriptors.

use super::params::PgParam;
use crate::error::AppError;
use crate::model::{ColumnDef, ColumnKind, EntityDef};
use crate::store::{Criteria, Direction, Filter, OrderBy, Row};

/// Quote identifier for PostgreSQL (safe: only from descriptors).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, p: PgParam) -> usize {
        self.params.push(p);
        self.params.len()
    }
}

fn column_list(def: &EntityDef) -> String {
    def.columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn column<'a>(def: &'a EntityDef, name: &str) -> Result<&'a ColumnDef, AppError> {
    def.column(name)
        .ok_or_else(|| AppError::Validation(format!("unknown column '{}' on {}", name, def.name)))
}

fn where_clause(q: &mut QueryBuf, def: &EntityDef, criteria: &Criteria) -> Result<String, AppError> {
    let mut parts = Vec::new();
    for f in criteria.filters() {
        let col = column(def, f.column())?;
        match f {
            Filter::Eq { value, .. } => {
                let n = q.push_param(PgParam::from_json(col.kind, col.name, value)?);
                parts.push(format!("{} = ${}", quoted(col.name), n));
            }
            Filter::In { values, .. } => {
                let n = q.push_param(PgParam::array_from_json(col.kind, col.name, values)?);
                parts.push(format!("{} = ANY(${})", quoted(col.name), n));
            }
        }
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

/// SELECT with optional filters; ORDER BY the requested columns, then pk.
pub fn select(
    def: &EntityDef,
    schema: &str,
    criteria: &Criteria,
    order: &[OrderBy],
) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, def.table);
    let where_clause = where_clause(&mut q, def, criteria)?;
    let mut keys = Vec::with_capacity(order.len() + 1);
    for o in order {
        let col = column(def, &o.column)?;
        let dir = match o.direction {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        };
        keys.push(format!("{} {}", quoted(col.name), dir));
    }
    if !order.iter().any(|o| o.column == def.primary_key) {
        keys.push(format!("{} ASC", quoted(def.primary_key)));
    }
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        column_list(def),
        table,
        where_clause,
        keys.join(", ")
    );
    Ok(q)
}

/// INSERT one row. The generated key is never written; the stored row is returned.
pub fn insert(def: &EntityDef, schema: &str, row: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, def.table);
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in def.writable_columns() {
        let Some(v) = row.get(c.name) else { continue };
        let n = q.push_param(PgParam::from_json(c.kind, c.name, v)?);
        cols.push(quoted(c.name));
        placeholders.push(format!("${}", n));
    }
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, column_list(def))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders.join(", "),
            column_list(def)
        )
    };
    Ok(q)
}

/// UPDATE by id: SET only the columns present in `changes`, in descriptor order.
pub fn update(def: &EntityDef, schema: &str, id: i32, changes: &Row) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, def.table);
    let mut sets = Vec::new();
    for c in def.writable_columns() {
        let Some(v) = changes.get(c.name) else { continue };
        let n = q.push_param(PgParam::from_json(c.kind, c.name, v)?);
        sets.push(format!("{} = ${}", quoted(c.name), n));
    }
    if sets.is_empty() {
        return Err(AppError::Validation(format!("no columns to update on {}", def.name)));
    }
    let id_param = q.push_param(PgParam::Int(Some(id)));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        table,
        sets.join(", "),
        quoted(def.primary_key),
        id_param,
        column_list(def)
    );
    Ok(q)
}

/// DELETE matching rows.
pub fn delete(def: &EntityDef, schema: &str, criteria: &Criteria) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let table = qualified_table(schema, def.table);
    let where_clause = where_clause(&mut q, def, criteria)?;
    q.sql = format!("DELETE FROM {}{}", table, where_clause);
    Ok(q)
}

/// CREATE TABLE IF NOT EXISTS, with foreign keys that cascade on delete.
pub fn create_table(def: &EntityDef, schema: &str) -> String {
    let col_defs: Vec<String> = def
        .columns
        .iter()
        .map(|c| {
            let mut s = format!("{} {}", quoted(c.name), c.kind.pg_type());
            if c.name == def.primary_key {
                s.push_str(" PRIMARY KEY");
            } else if !c.nullable {
                s.push_str(" NOT NULL");
            }
            if let Some(parent) = c.references {
                s.push_str(&format!(
                    " REFERENCES {} ({}) ON DELETE CASCADE",
                    qualified_table(schema, parent),
                    quoted("id")
                ));
            }
            s
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(schema, def.table),
        col_defs.join(", ")
    )
}

/// One index per foreign-key column, for relation loading.
pub fn create_fk_indexes(def: &EntityDef, schema: &str) -> Vec<String> {
    def.columns
        .iter()
        .filter(|c| c.references.is_some() && c.kind == ColumnKind::Int)
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_idx", def.table, c.name)),
                qualified_table(schema, def.table),
                quoted(c.name)
            )
        })
        .collect()
}
