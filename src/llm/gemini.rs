//! Google Gemini provider implementation

use super::types::{LlmRequest, LlmResponse, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

/// Public Gemini API endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used when `GEMINI_MODEL` is not set
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    endpoint: Url,
    model_id: String,
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("endpoint", &self.endpoint.as_str())
            .field("model_id", &self.model_id)
            .finish_non_exhaustive()
    }
}

impl GeminiService {
    /// Build the client. Fails if the model name or base URL is unusable or
    /// the HTTP client cannot be constructed.
    ///
    /// No request timeout is configured: a submission waits for as long as
    /// the service takes to answer.
    pub fn new(api_key: String, model: &str, base_url: Option<&str>) -> Result<Self, LlmError> {
        let model = model.trim();
        if model.is_empty() || model.contains('/') || model.contains(char::is_whitespace) {
            return Err(LlmError::invalid_request(format!(
                "invalid model name {model:?}"
            )));
        }

        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/v1beta/models/{model}:generateContent"))
            .map_err(|e| LlmError::invalid_request(format!("invalid base URL {base:?}: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(LlmError::invalid_request(format!(
                "unsupported URL scheme {:?}",
                endpoint.scheme()
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| LlmError::unknown(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: request.max_tokens.map(|max| GeminiGenerationConfig {
                max_output_tokens: Some(max),
            }),
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let candidate = resp.candidates.into_iter().next().ok_or_else(|| {
            match resp.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => LlmError::invalid_request(format!("Prompt was blocked: {reason}")),
                None => LlmError::unknown("No candidates in response"),
            }
        })?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
            return Err(LlmError::unknown(format!(
                "Response contained no text (finish reason: {reason})"
            )));
        }

        let usage = resp.usage_metadata.unwrap_or_default();
        Ok(LlmResponse {
            text,
            finish_reason: candidate.finish_reason,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_token_count),
                output_tokens: u64::from(usage.candidates_token_count),
            },
        })
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let gemini_request = Self::translate_request(request);

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |error_resp| error_resp.error.message);
            return Err(LlmError::from_status(status.as_u16(), &message));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e}")))?;

        Self::normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<GeminiPromptFeedback>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn service(server: &MockServer) -> GeminiService {
        GeminiService::new("test-key".to_string(), DEFAULT_MODEL, Some(&server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_prompt_and_reads_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "Tell me about Kyoto"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Kyoto is "}, {"text": "lovely."}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = service(&server)
            .complete(&LlmRequest::new("Tell me about Kyoto"))
            .await
            .unwrap();

        assert_eq!(response.text, "Kyoto is lovely.");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 4);
    }

    #[tokio::test]
    async fn test_max_tokens_sent_as_generation_config() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "generationConfig": {"maxOutputTokens": 64}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "hello"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = service(&server)
            .complete(&LlmRequest::new("hi").with_max_tokens(Some(64)))
            .await
            .unwrap();
        assert_eq!(response.text, "hello");
        assert_eq!(response.usage, Usage::default());
    }

    #[tokio::test]
    async fn test_error_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .complete(&LlmRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
        assert!(err.message.contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .complete(&LlmRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::InvalidRequest);
        assert!(err.message.contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_candidate_without_text_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"finishReason": "RECITATION"}]
            })))
            .mount(&server)
            .await;

        let err = service(&server)
            .complete(&LlmRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Unknown);
        assert!(err.message.contains("RECITATION"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = service(&server)
            .complete(&LlmRequest::new("hi"))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("Failed to parse response"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Bind then release a port so nothing is listening on it
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let service = GeminiService::new("k".to_string(), DEFAULT_MODEL, Some(&uri)).unwrap();
        let err = service.complete(&LlmRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
    }

    #[test]
    fn test_setup_rejects_bad_settings() {
        assert!(GeminiService::new("k".to_string(), "", None).is_err());
        assert!(GeminiService::new("k".to_string(), "models/gemini", None).is_err());
        assert!(GeminiService::new("k".to_string(), DEFAULT_MODEL, Some("not a url")).is_err());
        assert!(GeminiService::new("k".to_string(), DEFAULT_MODEL, Some("ftp://example.com")).is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let service = GeminiService::new("secret-key".to_string(), DEFAULT_MODEL, None).unwrap();
        let rendered = format!("{service:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("gemini-1.5-flash"));
    }
}
