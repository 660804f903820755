use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::agent::{generate_sql_with_retry, synthesize, Sanitizer};
use common::config::BackendConfig;
use common::introspect::{extract_schema, Connection};
use common::llm::{ChatModel, ModelConfig};
use common::schema::{load_schema, save_schema, Schema};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sqlprompt")]
#[command(about = "database schema introspection and text-to-sql prompting", long_about = None)]
pub struct Cli {
    /// Database type (postgresql or hive)
    #[arg(long, global = true, env = "DB_TYPE")]
    db_type: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Introspect the configured database and save its schema as JSON
    Extract {
        /// Directory for the schema file
        #[arg(short, long, default_value = common::schema::persist::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,
    },

    /// Print the prompt for a saved schema and a question
    Prompt {
        /// Saved schema JSON file
        #[arg(short, long)]
        schema: PathBuf,

        /// Natural-language question (read from stdin when omitted)
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Generate SQL for a question
    Ask {
        /// Saved schema JSON file; the database is introspected when omitted
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Natural-language question (read from stdin when omitted)
        #[arg(short, long)]
        question: Option<String>,

        /// Maximum generation attempts
        #[arg(long, default_value = "2")]
        max_attempts: usize,

        /// Directory for the schema file saved after live introspection
        #[arg(short, long, default_value = common::schema::persist::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Chat model name
        #[arg(long, env = "LLM_MODEL")]
        model: Option<String>,

        /// Marker treated as commentary by the sanitizer (repeatable)
        #[arg(long = "meta-marker")]
        meta_markers: Vec<String>,
    },

    /// Reduce a saved model reply to its sql lines
    Sanitize {
        /// Reply file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Marker treated as commentary (repeatable)
        #[arg(long = "meta-marker")]
        meta_markers: Vec<String>,
    },
}

impl Cli {
    pub async fn execute(self, dotenv: common::Result<Option<PathBuf>>) -> Result<()> {
        let _guard = common::tracing::init_tracing("sqlprompt")?;
        match dotenv {
            Ok(Some(path)) => tracing::debug!("loaded environment from {}", path.display()),
            Ok(None) => {}
            Err(e) => tracing::warn!("ignoring {}", e),
        }

        let db_type = self.db_type;
        match self.command {
            Commands::Extract { output_dir } => {
                let schema = introspect(db_type.as_deref()).await?;
                let path = save_schema(&schema, Some(&output_dir))?;
                println!("{}", path.display());
                Ok(())
            }
            Commands::Prompt { schema, question } => {
                let schema = load_schema(&schema)
                    .with_context(|| format!("failed to load schema {}", schema.display()))?;
                let question = resolve_question(question)?;
                print!("{}", synthesize(&schema, &question));
                Ok(())
            }
            Commands::Ask {
                schema,
                question,
                max_attempts,
                output_dir,
                model,
                meta_markers,
            } => {
                let question = resolve_question(question)?;
                let schema = match schema {
                    Some(path) => load_schema(&path)
                        .with_context(|| format!("failed to load schema {}", path.display()))?,
                    None => {
                        let schema = introspect(db_type.as_deref()).await?;
                        let path = save_schema(&schema, Some(&output_dir))?;
                        tracing::info!(path = %path.display(), "saved schema");
                        schema
                    }
                };

                let mut config = ModelConfig::from_env()?;
                if let Some(model) = model {
                    config.model = model;
                }
                let model = ChatModel::new(config)?;

                let sql = generate_sql_with_retry(
                    &model,
                    &sanitizer(meta_markers),
                    &schema,
                    &question,
                    max_attempts,
                )
                .await?;
                println!("{}", sql);
                Ok(())
            }
            Commands::Sanitize {
                input,
                meta_markers,
            } => {
                let reply = match input {
                    Some(path) => read_file(&path)?,
                    None => read_stdin()?,
                };
                let sql = sanitizer(meta_markers).require_sql(&reply)?;
                println!("{}", sql);
                Ok(())
            }
        }
    }
}

/// connect with the environment configuration, extract, normalize and close
async fn introspect(db_type: Option<&str>) -> Result<Schema> {
    let config = BackendConfig::from_lookup(|key| match (key, db_type) {
        ("DB_TYPE", Some(value)) => Some(value.to_string()),
        _ => std::env::var(key).ok(),
    })?;

    tracing::info!(backend = %config.kind(), "connecting");
    let mut conn = Connection::open(&config).await?;
    let result = extract_schema(&mut conn).await;
    conn.close().await;

    Ok(result?)
}

fn sanitizer(meta_markers: Vec<String>) -> Sanitizer {
    if meta_markers.is_empty() {
        Sanitizer::default()
    } else {
        Sanitizer::with_markers(meta_markers)
    }
}

fn resolve_question(question: Option<String>) -> Result<String> {
    let question = match question {
        Some(q) => q,
        None => read_stdin()?,
    };
    let question = question.trim();
    if question.is_empty() {
        anyhow::bail!("no question given");
    }
    Ok(question.to_string())
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}
