use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum AskDbError {
    #[error("Incorrect password")]
    AuthFailure,

    #[error("missing configuration: {0}")]
    Config(String),

    #[error("Figment error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database connection failed: {0}")]
    DbConnection(#[source] SqlxError),

    #[error("Query Error: {0}")]
    DbQuery(#[source] SqlxError),

    #[error("Upstream error with status: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Gemini API error: {}", .0.error.message)]
    GeminiServerError(GeminiError),

    #[error("model returned no SQL: {0}")]
    EmptyCompletion(String),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<figment::Error> for AskDbError {
    fn from(e: figment::Error) -> Self {
        AskDbError::Figment(Box::new(e))
    }
}

impl AskDbError {
    /// True for failures of the LLM round trip.
    pub fn is_llm_error(&self) -> bool {
        matches!(
            self,
            AskDbError::Reqwest(_)
                | AskDbError::UrlParse(_)
                | AskDbError::Json(_)
                | AskDbError::UpstreamStatus(_)
                | AskDbError::GeminiServerError(_)
                | AskDbError::EmptyCompletion(_)
        )
    }

    /// Message shown inline on the page when an action fails.
    pub fn user_message(&self) -> String {
        match self {
            AskDbError::AuthFailure => "Incorrect password ❌".to_string(),
            AskDbError::Config(_) => format!("Database connection failed: {self}"),
            AskDbError::DbConnection(_) | AskDbError::DbQuery(_) => self.to_string(),
            AskDbError::GeminiServerError(gemini_err) => match gemini_err.quota_reset_delay() {
                Some(secs) => format!(
                    "AI Error: {} (quota resets in {secs}s)",
                    gemini_err.error.message
                ),
                None => format!("AI Error: {}", gemini_err.error.message),
            },
            e if e.is_llm_error() => format!("AI Error: {e}"),
            _ => "An internal error occurred.".to_string(),
        }
    }
}

/// Only server plumbing failures (session actor, blocking tasks) reach this;
/// every user-facing failure is rendered inline on the page instead.
impl IntoResponse for AskDbError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!(error = %self, "request failed");
        let body = ApiErrorBody {
            code: "INTERNAL_ERROR".to_string(),
            message: "An internal server error occurred.".to_string(),
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiErrorResponse { error: body }),
        )
            .into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// Gemini API error response structure
#[derive(Deserialize, Debug)]
pub struct GeminiError {
    pub error: GeminiErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct GeminiErrorBody {
    pub code: u32,
    pub message: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl GeminiError {
    pub fn quota_reset_delay(&self) -> Option<u64> {
        self.error
            .extra
            .get("details")?
            .as_array()?
            .iter()
            .filter_map(|detail| {
                detail
                    .get("metadata")
                    .and_then(|m| m.get("quotaResetTimeStamp"))
                    .and_then(|ts| ts.as_str())
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            })
            .filter_map(|reset_dt| {
                let reset = reset_dt.with_timezone(&Utc);
                let diff_secs = (reset - Utc::now()).num_seconds();
                (diff_secs > 0).then_some(diff_secs as u64)
            })
            .next()
    }
}
