use crate::agent::prompt::synthesize;
use crate::agent::sanitizer::Sanitizer;
use crate::error::{Result, SqlPromptError};
use crate::llm::model::{ChatCompletion, Message};
use crate::schema::Schema;

/// one round trip: prompt in, sanitized sql out
#[tracing::instrument(skip(model, sanitizer, prompt), fields(prompt_len = prompt.len()))]
pub async fn generate_sql<M>(model: &M, sanitizer: &Sanitizer, prompt: &str) -> Result<String>
where
    M: ChatCompletion + ?Sized,
{
    let output = model.generate(vec![Message::user(prompt)]).await?;
    sanitizer.require_sql(&output)
}

/// synthesize the prompt for `question` and ask the model, retrying with
/// feedback when a reply fails or sanitizes to nothing
#[tracing::instrument(skip(model, sanitizer, schema, question), fields(backend = %schema.backend()))]
pub async fn generate_sql_with_retry<M>(
    model: &M,
    sanitizer: &Sanitizer,
    schema: &Schema,
    question: &str,
    max_attempts: usize,
) -> Result<String>
where
    M: ChatCompletion + ?Sized,
{
    let prompt = synthesize(schema, question);
    let max_attempts = max_attempts.max(1);
    let mut last_error: Option<SqlPromptError> = None;
    let mut current_prompt = prompt.clone();

    for attempt in 1..=max_attempts {
        tracing::info!("sql generation attempt {}/{}", attempt, max_attempts);

        match generate_sql(model, sanitizer, &current_prompt).await {
            Ok(sql) => {
                tracing::info!("sql generation succeeded on attempt {}", attempt);
                return Ok(sql);
            }
            Err(e) => {
                tracing::warn!("sql generation attempt {} failed: {}", attempt, e);

                // append error feedback to prompt for next attempt
                current_prompt = format!(
                    "{}\n\nprevious reply was rejected: {}\n\
                     return only {} sql and sql comments. no prose, no markdown.",
                    prompt,
                    e,
                    schema.backend().as_str().to_uppercase()
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        SqlPromptError::Llm(format!(
            "sql generation failed after {} attempts",
            max_attempts
        ))
    }))
}
