//! PostgreSQL store: parameterized statements through a shared pool, table DDL at startup.

use super::{check_row, Criteria, OrderBy, Row, Store};
use crate::config::AppConfig;
use crate::error::{AppError, ConfigError};
use crate::model::{all_entities, ColumnKind, EntityDef};
use crate::sql::{self, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions, PgRow, Postgres};
use sqlx::query::Query;
use sqlx::{ConnectOptions, PgPool, Row as _};
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgStore {
            pool,
            schema: schema.into(),
        }
    }

    /// Create the database if needed, open the pool and make sure every table exists.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        ensure_database_exists(&config.database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        ensure_tables(&pool, &config.db_schema).await?;
        tracing::info!(schema = %config.db_schema, "postgres store ready");
        Ok(PgStore::new(pool, config.db_schema.clone()))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn build(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = p.bind_to(query);
    }
    query
}

fn row_to_json(def: &EntityDef, row: &PgRow) -> Result<Row, AppError> {
    let mut map = Row::new();
    for col in def.columns {
        let v = match col.kind {
            ColumnKind::Serial | ColumnKind::Int => row
                .try_get::<Option<i32>, _>(col.name)?
                .map(Value::from)
                .unwrap_or(Value::Null),
            ColumnKind::Text => row
                .try_get::<Option<String>, _>(col.name)?
                .map(Value::String)
                .unwrap_or(Value::Null),
        };
        map.insert(col.name.to_string(), v);
    }
    Ok(map)
}

#[async_trait]
impl Store for PgStore {
    async fn select(
        &self,
        def: &'static EntityDef,
        criteria: &Criteria,
        order: &[OrderBy],
    ) -> Result<Vec<Row>, AppError> {
        let q = sql::select(def, &self.schema, criteria, order)?;
        let rows = build(&q).fetch_all(&self.pool).await?;
        rows.iter().map(|r| row_to_json(def, r)).collect()
    }

    async fn insert(&self, def: &'static EntityDef, rows: &[Row]) -> Result<Vec<Row>, AppError> {
        let mut queries = Vec::with_capacity(rows.len());
        for row in rows {
            check_row(def, row, false)?;
            queries.push(sql::insert(def, &self.schema, row)?);
        }
        let mut out = Vec::with_capacity(queries.len());
        let mut tx = self.pool.begin().await?;
        for q in &queries {
            let row = build(q).fetch_one(&mut *tx).await?;
            out.push(row_to_json(def, &row)?);
        }
        tx.commit().await?;
        Ok(out)
    }

    async fn update(
        &self,
        def: &'static EntityDef,
        id: i32,
        changes: &Row,
    ) -> Result<Option<Row>, AppError> {
        check_row(def, changes, true)?;
        let q = sql::update(def, &self.schema, id, changes)?;
        let row = build(&q).fetch_optional(&self.pool).await?;
        row.map(|r| row_to_json(def, &r)).transpose()
    }

    async fn delete(&self, def: &'static EntityDef, criteria: &Criteria) -> Result<u64, AppError> {
        let q = sql::delete(def, &self.schema, criteria)?;
        let done = build(&q).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Create `schema` if missing, then every entity table (parents first) and FK indexes.
pub async fn ensure_tables(pool: &PgPool, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", sql::quoted(schema)))
        .execute(pool)
        .await?;
    for def in all_entities() {
        sqlx::query(&sql::create_table(def, schema)).execute(pool).await?;
        for ddl in sql::create_fk_indexes(def, schema) {
            sqlx::query(&ddl).execute(pool).await?;
        }
    }
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin, db_name) = admin_options(database_url)?;
    let db_name = match db_name {
        Some(name) if name != "postgres" => name,
        _ => return Ok(()),
    };
    let mut conn: sqlx::PgConnection = admin.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Options for the `postgres` maintenance database on the same server, plus the database
/// `database_url` names (if any).
fn admin_options(database_url: &str) -> Result<(PgConnectOptions, Option<String>), AppError> {
    let opts = PgConnectOptions::from_str(database_url).map_err(|e| ConfigError::Invalid {
        key: "DATABASE_URL",
        value: database_url.to_string(),
        reason: e.to_string(),
    })?;
    let db_name = opts
        .get_database()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from);
    Ok((opts.database("postgres"), db_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_options_swap_database_name() {
        let (admin, name) = admin_options("postgres://u:p@localhost:5432/graph?sslmode=disable").unwrap();
        assert_eq!(admin.get_database(), Some("postgres"));
        assert_eq!(admin.get_host(), "localhost");
        assert_eq!(admin.get_port(), 5432);
        assert_eq!(name.as_deref(), Some("graph"));
    }

    #[test]
    fn url_without_database_names_nothing() {
        let (admin, name) = admin_options("postgres://localhost").unwrap();
        assert_eq!(name, None);
        assert_eq!(admin.get_host(), "localhost");
    }

    #[test]
    fn socket_host_query_does_not_leak_into_name() {
        let (admin, name) = admin_options("postgres:///entity_graph?host=/var/run/postgresql").unwrap();
        assert_eq!(name.as_deref(), Some("entity_graph"));
        assert_eq!(admin.get_database(), Some("postgres"));
        assert_eq!(
            admin.get_socket().map(|p| p.as_path()),
            Some(std::path::Path::new("/var/run/postgresql"))
        );
    }

    #[test]
    fn unparsable_url_is_a_config_error() {
        let e = admin_options("localhost").unwrap_err();
        assert_eq!(e.kind(), "config_error");
    }
}
