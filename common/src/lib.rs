pub mod error;
pub mod config;
pub mod schema;
pub mod introspect;
pub mod llm;
pub mod agent;
pub mod tracing;

pub use error::{Result, SqlPromptError};
