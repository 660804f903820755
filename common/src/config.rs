use crate::error::{Result, SqlPromptError};
use crate::schema::BackendKind;
use std::path::{Path, PathBuf};

const DEFAULT_PG_PORT: u16 = 5432;
const DEFAULT_HIVE_DATABASE: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarehouseAuth {
    None,
    /// bearer token, `HIVE_PASSWORD`; `HIVE_USER` is informational
    Token { user: Option<String>, token: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    /// base url of the statement execution api
    pub host: String,
    pub database: String,
    pub auth: WarehouseAuth,
    pub warehouse_id: Option<String>,
}

/// connection settings for one of the supported backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Postgres(PostgresConfig),
    Warehouse(WarehouseConfig),
}

impl BackendConfig {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendConfig::Postgres(_) => BackendKind::Relational,
            BackendConfig::Warehouse(_) => BackendKind::Warehouse,
        }
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| SqlPromptError::Config(format!("{} is not set", key)))
        };

        let kind: BackendKind = get("DB_TYPE")
            .unwrap_or_else(|| BackendKind::Relational.as_str().to_string())
            .parse()?;

        match kind {
            BackendKind::Relational => {
                let port = match get("DB_PORT") {
                    Some(p) => p.trim().parse().map_err(|e| {
                        SqlPromptError::Config(format!("invalid DB_PORT {:?}: {}", p, e))
                    })?,
                    None => DEFAULT_PG_PORT,
                };

                Ok(BackendConfig::Postgres(PostgresConfig {
                    host: require("DB_HOST")?,
                    port,
                    database: require("DB_NAME")?,
                    user: require("DB_USER")?,
                    password: get("DB_PASSWORD"),
                }))
            }
            BackendKind::Warehouse => {
                let auth = get("HIVE_AUTH")
                    .map(|a| a.to_uppercase())
                    .unwrap_or_else(|| "NONE".to_string());

                let auth = if auth == "NONE" {
                    WarehouseAuth::None
                } else {
                    WarehouseAuth::Token {
                        user: get("HIVE_USER"),
                        token: require("HIVE_PASSWORD")?,
                    }
                };

                Ok(BackendConfig::Warehouse(WarehouseConfig {
                    host: require("HIVE_HOST")?,
                    database: get("HIVE_DATABASE")
                        .unwrap_or_else(|| DEFAULT_HIVE_DATABASE.to_string()),
                    auth,
                    warehouse_id: get("HIVE_WAREHOUSE_ID"),
                }))
            }
        }
    }
}

/// load `.env` from the working directory or its parents. runs before
/// logging exists, so the outcome is returned for the caller to report;
/// `Ok(None)` means no file was found.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    dotenv_outcome(dotenvy::dotenv())
}

pub fn load_dotenv_from(path: &Path) -> Result<Option<PathBuf>> {
    dotenv_outcome(dotenvy::from_path(path).map(|_| path.to_path_buf()))
}

fn dotenv_outcome(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(SqlPromptError::Config(format!("unreadable .env: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_postgres_defaults() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("DB_HOST", "localhost"),
            ("DB_NAME", "shop"),
            ("DB_USER", "app"),
        ]))
        .unwrap();

        assert_eq!(config.kind(), BackendKind::Relational);
        assert_eq!(
            config,
            BackendConfig::Postgres(PostgresConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "shop".to_string(),
                user: "app".to_string(),
                password: None,
            })
        );
    }

    #[test]
    fn test_postgres_invalid_port() {
        let err = BackendConfig::from_lookup(lookup(&[
            ("DB_HOST", "localhost"),
            ("DB_NAME", "shop"),
            ("DB_USER", "app"),
            ("DB_PORT", "abc"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SqlPromptError::Config(_)));
    }

    #[test]
    fn test_warehouse_without_auth() {
        let config = BackendConfig::from_lookup(lookup(&[
            ("DB_TYPE", "HIVE"),
            ("HIVE_HOST", "https://warehouse.example.com"),
        ]))
        .unwrap();

        match config {
            BackendConfig::Warehouse(w) => {
                assert_eq!(w.database, "default");
                assert_eq!(w.auth, WarehouseAuth::None);
                assert!(w.warehouse_id.is_none());
            }
            other => panic!("expected warehouse config, got {:?}", other),
        }
    }

    #[test]
    fn test_warehouse_token_requires_password() {
        let err = BackendConfig::from_lookup(lookup(&[
            ("DB_TYPE", "hive"),
            ("HIVE_HOST", "https://warehouse.example.com"),
            ("HIVE_AUTH", "token"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SqlPromptError::Config(ref m) if m.contains("HIVE_PASSWORD")));
    }

    #[test]
    fn test_dotenv_file_populates_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SQLPROMPT_DOTENV_TEST_LOG=debug\n").unwrap();

        let loaded = load_dotenv_from(&path).unwrap();
        assert_eq!(loaded, Some(path));
        assert_eq!(std::env::var("SQLPROMPT_DOTENV_TEST_LOG").unwrap(), "debug");
    }

    #[test]
    fn test_missing_dotenv_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_dotenv_from(&dir.path().join(".env")).unwrap(), None);
    }

    #[test]
    fn test_unsupported_backend() {
        let err = BackendConfig::from_lookup(lookup(&[("DB_TYPE", "mongodb")])).unwrap_err();
        assert!(matches!(err, SqlPromptError::UnsupportedBackend(_)));
    }
}
