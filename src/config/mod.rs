//! Runtime configuration from environment variables (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/entity_graph";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:4000";
pub const DEFAULT_GRAPHQL_PATH: &str = "/graphql";
pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;
/// Paths served by the common routes; the GraphQL endpoint may not take them.
pub const RESERVED_PATHS: &[&str] = &["/health", "/ready", "/version"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                key: "STORE",
                value: s.to_string(),
                reason: "expected postgres or memory".into(),
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: String,
    /// Schema holding the entity tables. Env `DB_SCHEMA`, default `public`.
    pub db_schema: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub graphql_path: String,
    pub body_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys take their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store = get("STORE")
            .map(|s| s.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Postgres);
        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let db_schema = get("DB_SCHEMA").unwrap_or_else(|| "public".into());
        let max_connections = parse_or(&get, "DB_MAX_CONNECTIONS", 5u32)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_MAX_CONNECTIONS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        let bind_addr = parse_or(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 4000)))?;
        let graphql_path = get("GRAPHQL_PATH").unwrap_or_else(|| DEFAULT_GRAPHQL_PATH.into());
        if !graphql_path.starts_with('/') || graphql_path.len() < 2 {
            return Err(ConfigError::Invalid {
                key: "GRAPHQL_PATH",
                value: graphql_path,
                reason: "must be an absolute path like /graphql".into(),
            });
        }
        if RESERVED_PATHS.contains(&graphql_path.as_str()) {
            return Err(ConfigError::Invalid {
                key: "GRAPHQL_PATH",
                value: graphql_path,
                reason: "already used by a built-in route".into(),
            });
        }
        let body_limit = parse_or(&get, "BODY_LIMIT_BYTES", DEFAULT_BODY_LIMIT)?;
        Ok(AppConfig {
            store,
            database_url,
            db_schema,
            max_connections,
            bind_addr,
            graphql_path,
            body_limit,
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.db_schema, "public");
        assert_eq!(cfg.max_connections, 5);
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(cfg.graphql_path, "/graphql");
        assert_eq!(cfg.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn reads_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("STORE", "Memory"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("GRAPHQL_PATH", "/api/graphql"),
        ]))
        .unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.max_connections, 12);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.graphql_path, "/api/graphql");
    }

    #[test]
    fn rejects_bad_values() {
        for pairs in [
            vec![("STORE", "redis")],
            vec![("DB_MAX_CONNECTIONS", "many")],
            vec![("DB_MAX_CONNECTIONS", "0")],
            vec![("BIND_ADDR", "nowhere")],
            vec![("GRAPHQL_PATH", "graphql")],
            vec![("GRAPHQL_PATH", "/health")],
            vec![("GRAPHQL_PATH", "/ready")],
            vec![("GRAPHQL_PATH", "/version")],
        ] {
            assert!(AppConfig::from_lookup(lookup(&pairs)).is_err(), "{:?}", pairs);
        }
    }
}
