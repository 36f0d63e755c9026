use async_trait::async_trait;
use tracing::{debug, error};
use url::Url;

use crate::api::TextModel;
use crate::config::LlmConfig;
use crate::error::{AskDbError, GeminiError};
use crate::types::gemini::{GenerateContentRequest, GeminiResponse};

/// Gemini `generateContent` client. Model and endpoint are fixed at construction.
pub struct GeminiApi {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl GeminiApi {
    pub fn new(client: reqwest::Client, cfg: &LlmConfig) -> Result<Self, AskDbError> {
        let model = cfg.model.trim_start_matches("models/").to_string();
        let mut base = Url::parse(&cfg.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(&format!("models/{model}:generateContent"))?;
        Ok(Self {
            client,
            endpoint,
            api_key: cfg.api_key.clone(),
            model,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Shared HTTP client, routed through `proxy` when one is configured.
    pub fn build_client(cfg: &LlmConfig) -> Result<reqwest::Client, AskDbError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = cfg.proxy.as_deref() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl TextModel for GeminiApi {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, AskDbError> {
        let body = GenerateContentRequest::from_prompt(prompt);
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let bytes = resp.bytes().await?;
            error!(model = %self.model, %status, "Gemini generateContent failed");
            return Err(match serde_json::from_slice::<GeminiError>(&bytes) {
                Ok(gemini_err) => AskDbError::GeminiServerError(gemini_err),
                Err(_) => AskDbError::UpstreamStatus(status),
            });
        }

        let parsed: GeminiResponse = resp.json().await?;
        debug!(
            model = %self.model,
            model_version = parsed.modelVersion.as_deref().unwrap_or("-"),
            "Gemini reply received"
        );
        parsed
            .text()
            .ok_or_else(|| AskDbError::EmptyCompletion(parsed.empty_reason()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_targets_configured_model() {
        let cfg = LlmConfig {
            model: "models/gemini-2.5-flash".into(),
            ..LlmConfig::default()
        };
        let api = GeminiApi::new(reqwest::Client::new(), &cfg).unwrap();
        assert_eq!(
            api.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(api.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn base_url_without_trailing_slash_keeps_version_segment() {
        let cfg = LlmConfig {
            base_url: "http://127.0.0.1:9000/v1beta".into(),
            ..LlmConfig::default()
        };
        let api = GeminiApi::new(reqwest::Client::new(), &cfg).unwrap();
        assert_eq!(
            api.endpoint().as_str(),
            "http://127.0.0.1:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
