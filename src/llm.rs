//! LLM provider abstraction
//!
//! The chat only ever needs one thing from a provider: turn a prompt into
//! text. `GeminiService` does that over HTTP; `LoggingService` wraps any
//! provider with structured request logging.

mod error;
pub mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::*;

use crate::config::{ConfigError, GeminiConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Configure the generation client from resolved settings.
///
/// This is the "client setup" step of startup; any failure here is fatal.
pub fn build_service(config: &GeminiConfig) -> Result<Arc<dyn LlmService>, ConfigError> {
    let gemini = GeminiService::new(
        config.api_key.clone(),
        &config.model,
        config.base_url.as_deref(),
    )
    .map_err(|e| ConfigError::ClientSetup(e.message))?;

    tracing::info!(model = %gemini.model_id(), "Gemini client configured");
    Ok(Arc::new(LoggingService::new(Arc::new(gemini))))
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    prompt_chars = request.prompt.chars().count(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = e.kind.as_str(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
