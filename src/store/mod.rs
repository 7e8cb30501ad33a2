//! Row-level persistence. Rows are JSON objects keyed by column name; every
//! operation is parameterized by the entity descriptor it touches.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, ensure_tables, PgStore};

use crate::error::AppError;
use crate::model::{ColumnKind, EntityDef};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

pub type Row = serde_json::Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq { column: String, value: Value },
    In { column: String, values: Vec<Value> },
}

impl Filter {
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::In { column, .. } => column,
        }
    }

    fn matches(&self, row: &Row) -> bool {
        let cell = row.get(self.column()).unwrap_or(&Value::Null);
        match self {
            Filter::Eq { value, .. } => cell == value,
            Filter::In { values, .. } => values.iter().any(|v| v == cell),
        }
    }
}

/// Conjunction of column filters. An empty criteria matches every row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    filters: Vec<Filter>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn any_of(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In {
            column: column.into(),
            values,
        });
        self
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Every filtered column must exist on the entity.
    pub fn check(&self, def: &EntityDef) -> Result<(), AppError> {
        for f in &self.filters {
            if def.column(f.column()).is_none() {
                return Err(AppError::Validation(format!(
                    "unknown column '{}' on {}",
                    f.column(),
                    def.name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            direction: Direction::Desc,
        }
    }
}

/// Persistent store shared by every request. Implementations must make `insert`
/// a single unit of work: all rows are stored or none are.
#[async_trait]
pub trait Store: Send + Sync {
    /// Rows matching `criteria`, sorted by `order` then by primary key ascending.
    async fn select(
        &self,
        def: &'static EntityDef,
        criteria: &Criteria,
        order: &[OrderBy],
    ) -> Result<Vec<Row>, AppError>;

    /// Insert rows (generated key omitted) and return them as stored.
    async fn insert(&self, def: &'static EntityDef, rows: &[Row]) -> Result<Vec<Row>, AppError>;

    /// Apply `changes` to the row with primary key `id`. `None` when no such row exists.
    async fn update(
        &self,
        def: &'static EntityDef,
        id: i32,
        changes: &Row,
    ) -> Result<Option<Row>, AppError>;

    /// Delete matching rows (and, through foreign keys, their dependents). Returns rows removed.
    async fn delete(&self, def: &'static EntityDef, criteria: &Criteria) -> Result<u64, AppError>;

    async fn ping(&self) -> Result<(), AppError>;

    fn backend(&self) -> &'static str;
}

/// Check a row against the entity's columns before it is written.
/// `partial` rows (updates) may omit columns; full rows must carry every writable column.
pub(crate) fn check_row(def: &EntityDef, row: &Row, partial: bool) -> Result<(), AppError> {
    for (name, value) in row {
        let col = def.column(name).ok_or_else(|| {
            AppError::Validation(format!("unknown column '{}' on {}", name, def.name))
        })?;
        if col.kind == ColumnKind::Serial {
            return Err(AppError::Validation(format!(
                "{}.{} is generated and cannot be written",
                def.name, name
            )));
        }
        if value.is_null() {
            if !col.nullable {
                return Err(AppError::Conflict(format!("{}.{} must not be null", def.name, name)));
            }
            continue;
        }
        let ok = match col.kind {
            ColumnKind::Serial | ColumnKind::Int => value
                .as_i64()
                .map(|n| i32::try_from(n).is_ok())
                .unwrap_or(false),
            ColumnKind::Text => value.is_string(),
        };
        if !ok {
            return Err(AppError::Validation(format!(
                "{}.{} expects {}",
                def.name,
                name,
                col.kind.pg_type()
            )));
        }
    }
    if !partial {
        for col in def.writable_columns() {
            if !col.nullable && !row.contains_key(col.name) {
                return Err(AppError::Conflict(format!(
                    "{}.{} must not be null",
                    def.name, col.name
                )));
            }
        }
    }
    Ok(())
}

/// Ordering used for sorting rows in memory: nulls first, numbers numerically, strings lexically.
pub(crate) fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => x
            .as_i64()
            .zip(y.as_i64())
            .map(|(x, y)| x.cmp(&y))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{COMPONENT_DEF, USER_DEF};
    use serde_json::json;

    fn row(v: Value) -> Row {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn criteria_match_eq_and_in() {
        let r = row(json!({"id": 3, "name": "ada"}));
        assert!(Criteria::new().matches(&r));
        assert!(Criteria::new().eq("id", 3).matches(&r));
        assert!(!Criteria::new().eq("id", 4).matches(&r));
        assert!(Criteria::new()
            .any_of("id", vec![json!(1), json!(3)])
            .eq("name", "ada")
            .matches(&r));
        assert!(!Criteria::new().any_of("id", vec![]).matches(&r));
    }

    #[test]
    fn criteria_reject_unknown_columns() {
        let err = Criteria::new().eq("age", 3).check(&USER_DEF).unwrap_err();
        assert_eq!(err.kind(), "validation_error");
        assert!(Criteria::new().eq("name", "x").check(&USER_DEF).is_ok());
    }

    #[test]
    fn check_row_enforces_types_and_required_columns() {
        assert!(check_row(&USER_DEF, &row(json!({"name": "ada"})), false).is_ok());
        assert_eq!(
            check_row(&USER_DEF, &row(json!({})), false).unwrap_err().kind(),
            "conflict"
        );
        assert!(check_row(&USER_DEF, &row(json!({})), true).is_ok());
        assert_eq!(
            check_row(&USER_DEF, &row(json!({"name": 5})), true).unwrap_err().kind(),
            "validation_error"
        );
        assert_eq!(
            check_row(&USER_DEF, &row(json!({"id": 5})), true).unwrap_err().kind(),
            "validation_error"
        );
        let too_big = row(json!({"user_id": 1, "index": 4_000_000_000i64, "type": "code", "text": ""}));
        assert_eq!(
            check_row(&COMPONENT_DEF, &too_big, false).unwrap_err().kind(),
            "validation_error"
        );
    }

    #[test]
    fn cells_sort_nulls_first() {
        let mut v = vec![json!("b"), Value::Null, json!("a")];
        v.sort_by(compare_cells);
        assert_eq!(v, vec![Value::Null, json!("a"), json!("b")]);
        assert_eq!(compare_cells(&json!(2), &json!(10)), Ordering::Less);
    }
}
