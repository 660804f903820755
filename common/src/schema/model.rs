use crate::error::{Result, SqlPromptError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// which introspection strategy produced a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// catalog-table engine (postgresql information_schema)
    #[serde(rename = "postgresql")]
    Relational,
    /// command-output engine (hive / spark sql)
    #[serde(rename = "hive")]
    Warehouse,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Relational => "postgresql",
            BackendKind::Warehouse => "hive",
        }
    }

    /// namespace used when the backend reports none
    pub fn default_namespace(&self) -> &'static str {
        match self {
            BackendKind::Relational => "public",
            BackendKind::Warehouse => "default",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = SqlPromptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgresql" | "postgres" | "relational" => Ok(BackendKind::Relational),
            "hive" | "spark" | "warehouse" => Ok(BackendKind::Warehouse),
            other => Err(SqlPromptError::UnsupportedBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    #[serde(rename = "schema")]
    pub namespace: String,
    pub columns: Vec<Column>,
    /// `None` when the backend cannot report constraints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    /// `None` unless the table has at least one listed partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<String>>,
}

impl Table {
    pub fn constraints(&self) -> &[Constraint] {
        self.constraints.as_deref().unwrap_or(&[])
    }

    pub fn partitions(&self) -> &[String] {
        self.partitions.as_deref().unwrap_or(&[])
    }
}

/// canonical, backend-agnostic schema; read-only once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "db_type")]
    backend: BackendKind,
    tables: Vec<Table>,
}

impl Schema {
    pub fn new(backend: BackendKind, tables: Vec<Table>) -> Self {
        Self { backend, tables }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backend_kind_parse_aliases() {
        assert_eq!("PostgreSQL".parse::<BackendKind>().unwrap(), BackendKind::Relational);
        assert_eq!("postgres".parse::<BackendKind>().unwrap(), BackendKind::Relational);
        assert_eq!(" hive ".parse::<BackendKind>().unwrap(), BackendKind::Warehouse);
        assert_eq!("warehouse".parse::<BackendKind>().unwrap(), BackendKind::Warehouse);
    }

    #[test]
    fn test_backend_kind_parse_unsupported() {
        let err = "oracle".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, SqlPromptError::UnsupportedBackend(ref s) if s == "oracle"));
    }

    #[test]
    fn test_schema_serializes_to_persisted_shape() {
        let schema = Schema::new(
            BackendKind::Warehouse,
            vec![Table {
                name: "events".to_string(),
                namespace: "default".to_string(),
                columns: vec![Column {
                    name: "id".to_string(),
                    data_type: "bigint".to_string(),
                    nullable: true,
                    default: None,
                    comment: Some("event id".to_string()),
                }],
                constraints: None,
                partitions: Some(vec!["dt=2024-01-01".to_string()]),
            }],
        );

        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(
            value,
            json!({
                "db_type": "hive",
                "tables": [{
                    "name": "events",
                    "schema": "default",
                    "columns": [{
                        "name": "id",
                        "type": "bigint",
                        "nullable": true,
                        "comment": "event id"
                    }],
                    "partitions": ["dt=2024-01-01"]
                }]
            })
        );
    }

    #[test]
    fn test_schema_deserializes_relational_shape() {
        let value = json!({
            "db_type": "postgresql",
            "tables": [{
                "name": "users",
                "schema": "public",
                "columns": [{"name": "id", "type": "integer", "nullable": false, "default": null}],
                "constraints": [{"name": "users_pkey", "type": "PRIMARY KEY"}]
            }]
        });

        let schema: Schema = serde_json::from_value(value).unwrap();
        assert_eq!(schema.backend(), BackendKind::Relational);
        assert_eq!(schema.tables()[0].constraints()[0].kind, "PRIMARY KEY");
        assert!(schema.tables()[0].columns[0].default.is_none());
        assert!(schema.tables()[0].partitions().is_empty());
    }
}
