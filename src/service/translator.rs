use std::sync::Arc;
use tracing::{info, warn};

use crate::api::TextModel;
use crate::db::schema::DATABASE_SCHEMA;
use crate::error::AskDbError;

/// Natural-language question -> SQL text through a [`TextModel`].
#[derive(Clone)]
pub struct SqlTranslator {
    model: Arc<dyn TextModel>,
}

impl SqlTranslator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    /// Ask the model for SQL answering `question`. The reply is only stripped
    /// of code fences; no SQL validation happens here.
    pub async fn generate_sql(&self, question: &str) -> Result<String, AskDbError> {
        let prompt = build_prompt(question);
        let reply = self
            .model
            .generate_text(&prompt)
            .await
            .inspect_err(|e| warn!(model = self.model.model_name(), error = %e, "SQL generation failed"))?;

        let sql = extract_sql(&reply);
        if sql.is_empty() {
            return Err(AskDbError::EmptyCompletion("reply contained only code fences".into()));
        }
        info!(model = self.model.model_name(), sql_len = sql.len(), "SQL generated");
        Ok(sql)
    }
}

pub fn build_prompt(question: &str) -> String {
    format!(
        r#"
You are a PostgreSQL expert. Return ONLY SQL query.

Schema:
{DATABASE_SCHEMA}

Question:
{question}
"#
    )
}

/// Drop every "```sql" and "```" marker and trim the ends.
pub fn extract_sql(response_text: &str) -> String {
    response_text
        .replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}
