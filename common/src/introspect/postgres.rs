use super::RelationalSession;
use crate::config::PostgresConfig;
use crate::error::Result;
use crate::schema::Row;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::Row as _;

/// catalog session over a single-connection postgres pool
pub struct PgSession {
    pool: PgPool,
}

impl PgSession {
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        tracing::info!(
            "connecting to postgresql at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RelationalSession for PgSession {
    /// every selected column must be text-typed; catalog queries cast with `::text`
    async fn query(&mut self, sql: &str, binds: &[&str]) -> Result<Vec<Row>> {
        let mut query = sqlx::query(sql);
        for value in binds {
            query = query.bind(*value);
        }

        let rows = query.fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut fields = Vec::with_capacity(row.len());
            for idx in 0..row.len() {
                fields.push(row.try_get::<Option<String>, _>(idx)?);
            }
            out.push(fields);
        }

        Ok(out)
    }
}
