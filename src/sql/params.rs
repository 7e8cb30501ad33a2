//! Convert JSON cell values into typed parameters sqlx can bind.

use crate::error::AppError;
use crate::model::ColumnKind;
use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value bound to a PostgreSQL query, typed by the column it targets.
#[derive(Clone, Debug, PartialEq)]
pub enum PgParam {
    Int(Option<i32>),
    Text(Option<String>),
    IntArray(Vec<i32>),
    TextArray(Vec<String>),
}

impl PgParam {
    pub fn from_json(kind: ColumnKind, column: &str, v: &Value) -> Result<Self, AppError> {
        Ok(match kind {
            ColumnKind::Serial | ColumnKind::Int => PgParam::Int(match v {
                Value::Null => None,
                v => Some(as_i32(column, v)?),
            }),
            ColumnKind::Text => PgParam::Text(match v {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                _ => return Err(mismatch(column, kind)),
            }),
        })
    }

    /// Array parameter for `column = ANY($n)`.
    pub fn array_from_json(kind: ColumnKind, column: &str, values: &[Value]) -> Result<Self, AppError> {
        Ok(match kind {
            ColumnKind::Serial | ColumnKind::Int => PgParam::IntArray(
                values
                    .iter()
                    .map(|v| as_i32(column, v))
                    .collect::<Result<_, _>>()?,
            ),
            ColumnKind::Text => PgParam::TextArray(
                values
                    .iter()
                    .map(|v| v.as_str().map(String::from).ok_or_else(|| mismatch(column, kind)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    pub fn bind_to<'q>(&self, query: Query<'q, Postgres, PgArguments>) -> Query<'q, Postgres, PgArguments> {
        match self {
            PgParam::Int(v) => query.bind(*v),
            PgParam::Text(v) => query.bind(v.clone()),
            PgParam::IntArray(v) => query.bind(v.clone()),
            PgParam::TextArray(v) => query.bind(v.clone()),
        }
    }
}

fn as_i32(column: &str, v: &Value) -> Result<i32, AppError> {
    v.as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| mismatch(column, ColumnKind::Int))
}

fn mismatch(column: &str, kind: ColumnKind) -> AppError {
    AppError::Validation(format!("{} expects {}", column, kind.pg_type()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ints_and_text_convert_by_column_kind() {
        assert_eq!(
            PgParam::from_json(ColumnKind::Int, "index", &json!(7)).unwrap(),
            PgParam::Int(Some(7))
        );
        assert_eq!(
            PgParam::from_json(ColumnKind::Text, "name", &json!("ada")).unwrap(),
            PgParam::Text(Some("ada".into()))
        );
        assert_eq!(
            PgParam::from_json(ColumnKind::Text, "name", &Value::Null).unwrap(),
            PgParam::Text(None)
        );
    }

    #[test]
    fn mismatched_values_are_validation_errors() {
        let e = PgParam::from_json(ColumnKind::Int, "index", &json!("7")).unwrap_err();
        assert_eq!(e.kind(), "validation_error");
        let e = PgParam::from_json(ColumnKind::Int, "index", &json!(1u64 << 40)).unwrap_err();
        assert_eq!(e.kind(), "validation_error");
        let e = PgParam::array_from_json(ColumnKind::Text, "name", &[json!(1)]).unwrap_err();
        assert_eq!(e.kind(), "validation_error");
    }

    #[test]
    fn arrays_collect_every_value() {
        assert_eq!(
            PgParam::array_from_json(ColumnKind::Int, "user_id", &[json!(1), json!(2)]).unwrap(),
            PgParam::IntArray(vec![1, 2])
        );
    }
}
