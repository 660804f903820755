use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlPromptError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported database type: {0}")]
    UnsupportedBackend(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("introspection failed: {0}")]
    Introspection(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("llm call failed: {0}")]
    Llm(String),

    #[error("model reply contained no sql")]
    NoSqlGenerated,

    #[error("tracing initialization failed: {0}")]
    Tracing(String),
}

pub type Result<T> = std::result::Result<T, SqlPromptError>;
