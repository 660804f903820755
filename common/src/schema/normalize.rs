use super::model::{BackendKind, Column, Constraint, Schema, Table};
use crate::error::{Result, SqlPromptError};
use std::collections::HashSet;

/// `information_schema.columns.is_nullable` value meaning "nullable"
pub const NULLABLE_SENTINEL: &str = "YES";

/// one row of command output; fields may be null and arity varies
pub type Row = Vec<Option<String>>;

/// row from `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumnRow {
    pub name: String,
    pub data_type: String,
    pub is_nullable: String,
    pub default: Option<String>,
}

/// row from `information_schema.table_constraints`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConstraintRow {
    pub name: String,
    pub constraint_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRelationalTable {
    pub name: String,
    pub namespace: String,
    pub columns: Vec<CatalogColumnRow>,
    pub constraints: Vec<CatalogConstraintRow>,
}

/// outcome of a best-effort partition listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionListing {
    Rows(Vec<Row>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawWarehouseTable {
    pub name: String,
    /// `DESCRIBE` output, 2 or 3 fields per well-formed row
    pub columns: Vec<Row>,
    pub partitions: PartitionListing,
}

/// adapter output, tagged by the introspection strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDescriptors {
    Relational(Vec<RawRelationalTable>),
    Warehouse {
        database: Option<String>,
        tables: Vec<RawWarehouseTable>,
    },
}

impl RawDescriptors {
    pub fn backend(&self) -> BackendKind {
        match self {
            RawDescriptors::Relational(_) => BackendKind::Relational,
            RawDescriptors::Warehouse { .. } => BackendKind::Warehouse,
        }
    }
}

/// converge raw descriptors from either adapter into one canonical schema.
///
/// tables and columns keep their input order. malformed warehouse rows and
/// failed partition listings are dropped per row / per table; only a
/// backend mismatch fails the whole call.
#[tracing::instrument(skip_all, fields(backend = %backend))]
pub fn normalize(backend: BackendKind, raw: RawDescriptors) -> Result<Schema> {
    if raw.backend() != backend {
        return Err(SqlPromptError::Config(format!(
            "{} descriptors cannot be normalized as {}",
            raw.backend(),
            backend
        )));
    }

    let tables = match raw {
        RawDescriptors::Relational(tables) => {
            tables.into_iter().map(normalize_relational_table).collect()
        }
        RawDescriptors::Warehouse { database, tables } => {
            let namespace = database
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| BackendKind::Warehouse.default_namespace().to_string());
            tables
                .into_iter()
                .map(|t| normalize_warehouse_table(t, &namespace))
                .collect()
        }
    };

    let schema = Schema::new(backend, tables);
    tracing::debug!(
        tables = schema.tables().len(),
        columns = schema.column_count(),
        "schema normalized"
    );
    Ok(schema)
}

fn normalize_relational_table(raw: RawRelationalTable) -> Table {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(raw.columns.len());

    for row in raw.columns {
        if !seen.insert(row.name.clone()) {
            tracing::warn!(table = %raw.name, column = %row.name, "duplicate catalog column skipped");
            continue;
        }
        columns.push(Column {
            nullable: row.is_nullable == NULLABLE_SENTINEL,
            name: row.name,
            data_type: row.data_type,
            default: row.default,
            comment: None,
        });
    }

    let constraints = raw
        .constraints
        .into_iter()
        .map(|c| Constraint {
            name: c.name,
            kind: c.constraint_type,
        })
        .collect();

    Table {
        name: raw.name,
        namespace: raw.namespace,
        columns,
        constraints: Some(constraints),
        partitions: None,
    }
}

fn normalize_warehouse_table(raw: RawWarehouseTable, namespace: &str) -> Table {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(raw.columns.len());

    for row in raw.columns {
        let Some(column) = describe_row_to_column(row) else {
            continue;
        };
        // hive repeats partition columns below "# Partition Information"
        if !seen.insert(column.name.clone()) {
            continue;
        }
        columns.push(column);
    }

    let partitions = match raw.partitions {
        PartitionListing::Rows(rows) => {
            let keys: Vec<String> = rows
                .into_iter()
                .filter_map(partition_key)
                .collect();
            (!keys.is_empty()).then_some(keys)
        }
        PartitionListing::Failed(reason) => {
            tracing::debug!(table = %raw.name, %reason, "partitions omitted");
            None
        }
    };

    Table {
        name: raw.name,
        namespace: namespace.to_string(),
        columns,
        constraints: None,
        partitions,
    }
}

/// every non-empty field of a listing row, `/`-joined
fn partition_key(row: Row) -> Option<String> {
    let fields: Vec<String> = row
        .into_iter()
        .flatten()
        .map(|f| f.trim().to_string())
        .filter(|f| !f.is_empty())
        .collect();
    (!fields.is_empty()).then(|| fields.join("/"))
}

/// `None` for short rows, section headers and separator rows
fn describe_row_to_column(row: Row) -> Option<Column> {
    if row.len() < 2 {
        return None;
    }

    let mut fields = row.into_iter();
    let name = fields.next().flatten()?.trim().to_string();
    if name.is_empty() || name.starts_with('#') {
        return None;
    }
    let data_type = fields.next().flatten()?.trim().to_string();
    let comment = fields
        .next()
        .flatten()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    Some(Column {
        name,
        data_type,
        nullable: true,
        default: None,
        comment,
    })
}
