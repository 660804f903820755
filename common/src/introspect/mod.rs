//! backend adapters: turn a live connection into raw table descriptors.
//!
//! the set of backends is closed. [`Connection`] tags the concrete session
//! and dispatches to the adapter for that backend; [`normalize`] is the
//! single point where both shapes converge.

pub mod postgres;
pub mod relational;
pub mod statement_api;
pub mod warehouse;

use crate::config::BackendConfig;
use crate::error::Result;
use crate::schema::{normalize, BackendKind, RawDescriptors, Row, Schema};
use async_trait::async_trait;

pub use postgres::PgSession;
pub use statement_api::StatementSession;

/// a session able to run parameterized catalog queries
#[async_trait]
pub trait RelationalSession: Send {
    async fn query(&mut self, sql: &str, binds: &[&str]) -> Result<Vec<Row>>;
}

/// rows of one warehouse command, with the column labels the engine reported
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// a session able to run warehouse commands (`SHOW`, `DESCRIBE`)
#[async_trait]
pub trait WarehouseSession: Send {
    async fn execute(&mut self, command: &str) -> Result<CommandOutput>;
}

pub enum Connection {
    Relational(PgSession),
    Warehouse(StatementSession),
}

impl Connection {
    #[tracing::instrument(skip(config), fields(backend = %config.kind()))]
    pub async fn open(config: &BackendConfig) -> Result<Self> {
        match config {
            BackendConfig::Postgres(pg) => Ok(Connection::Relational(PgSession::connect(pg).await?)),
            BackendConfig::Warehouse(wh) => Ok(Connection::Warehouse(StatementSession::new(wh)?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Connection::Relational(_) => BackendKind::Relational,
            Connection::Warehouse(_) => BackendKind::Warehouse,
        }
    }

    /// run the backend's introspection primitives
    pub async fn extract(&mut self) -> Result<RawDescriptors> {
        match self {
            Connection::Relational(session) => {
                Ok(RawDescriptors::Relational(relational::extract(session).await?))
            }
            Connection::Warehouse(session) => {
                let database = session.database().to_string();
                let tables = warehouse::extract(session).await?;
                Ok(RawDescriptors::Warehouse {
                    database: Some(database),
                    tables,
                })
            }
        }
    }

    pub async fn close(self) {
        match self {
            Connection::Relational(session) => session.close().await,
            Connection::Warehouse(_) => {}
        }
    }
}

/// introspect and normalize in one step
#[tracing::instrument(skip(conn), fields(backend = %conn.kind()))]
pub async fn extract_schema(conn: &mut Connection) -> Result<Schema> {
    let raw = conn.extract().await?;
    let schema = normalize(conn.kind(), raw)?;
    tracing::info!(
        tables = schema.tables().len(),
        columns = schema.column_count(),
        "schema extracted"
    );
    Ok(schema)
}
