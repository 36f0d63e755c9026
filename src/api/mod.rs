pub mod gemini_api;

use async_trait::async_trait;

use crate::error::AskDbError;

pub use gemini_api::GeminiApi;

/// Text-in, text-out language model.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn model_name(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String, AskDbError>;
}
