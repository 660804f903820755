//! warehouse session over an http statement-execution api.
//!
//! statements are posted to `/api/2.0/sql/statements` and executed
//! synchronously (`wait_timeout`); results come back inline as json arrays
//! of strings, paged through `next_chunk_internal_link`.

use super::{CommandOutput, WarehouseSession};
use crate::config::{WarehouseAuth, WarehouseConfig};
use crate::error::{Result, SqlPromptError};
use crate::schema::Row;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";
const WAIT_TIMEOUT: &str = "50s";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse_id: Option<&'a str>,
    schema: &'a str,
    wait_timeout: &'static str,
    on_wait_timeout: &'static str,
    disposition: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    #[serde(default)]
    status: StatementStatus,
    #[serde(default)]
    manifest: Option<Manifest>,
    #[serde(default)]
    result: Option<ResultChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct StatementStatus {
    #[serde(default)]
    state: String,
    #[serde(default)]
    error: Option<StatementError>,
}

#[derive(Debug, Deserialize)]
struct StatementError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    schema: ManifestSchema,
}

#[derive(Debug, Deserialize)]
struct ManifestSchema {
    #[serde(default)]
    columns: Vec<ManifestColumn>,
}

#[derive(Debug, Deserialize)]
struct ManifestColumn {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultChunk {
    #[serde(default)]
    data_array: Vec<Row>,
    #[serde(default)]
    next_chunk_internal_link: Option<String>,
}

pub struct StatementSession {
    client: reqwest::Client,
    base_url: String,
    database: String,
    warehouse_id: Option<String>,
    token: Option<String>,
}

impl StatementSession {
    pub fn new(config: &WarehouseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let token = match &config.auth {
            WarehouseAuth::None => None,
            WarehouseAuth::Token { user, token } => {
                if let Some(user) = user {
                    tracing::debug!("warehouse token auth for user {}", user);
                }
                Some(token.clone())
            }
        };

        tracing::info!(
            "using warehouse statement api at {} (database {})",
            config.host,
            config.database
        );

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            database: config.database.clone(),
            warehouse_id: config.warehouse_id.clone(),
            token,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SqlPromptError::Introspection(format!(
                "statement api returned {}: {}",
                status, body
            )));
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl WarehouseSession for StatementSession {
    #[tracing::instrument(skip(self), fields(database = %self.database))]
    async fn execute(&mut self, command: &str) -> Result<CommandOutput> {
        let body = StatementRequest {
            statement: command,
            warehouse_id: self.warehouse_id.as_deref(),
            schema: &self.database,
            wait_timeout: WAIT_TIMEOUT,
            on_wait_timeout: "CANCEL",
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        let request = self
            .client
            .post(format!("{}{}", self.base_url, STATEMENTS_PATH))
            .json(&body);
        let response: StatementResponse = Self::read_json(self.authorize(request).send().await?).await?;

        if response.status.state != "SUCCEEDED" {
            let message = response
                .status
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| format!("statement ended in state {:?}", response.status.state));
            return Err(SqlPromptError::Introspection(format!("{}: {}", command, message)));
        }

        let columns = response
            .manifest
            .map(|m| m.schema.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let mut chunk = response.result.unwrap_or_default();
        let mut rows = std::mem::take(&mut chunk.data_array);

        while let Some(link) = chunk.next_chunk_internal_link.take() {
            let request = self.client.get(format!("{}{}", self.base_url, link));
            chunk = Self::read_json(self.authorize(request).send().await?).await?;
            rows.append(&mut chunk.data_array);
        }

        tracing::debug!(rows = rows.len(), "statement succeeded");
        Ok(CommandOutput { columns, rows })
    }
}
