//! Groq enrichment backend implementation.
//!
//! Speaks the OpenAI-compatible chat-completions API. One request per
//! enrichment operation (summary, title, tags); no retries — failures
//! surface to the caller as [`Error::Enrichment`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use quillnote_core::{EnrichmentBackend, Error, Result};

/// Default Groq endpoint.
pub const DEFAULT_GROQ_URL: &str = quillnote_core::defaults::GROQ_BASE_URL;

/// Default generation model.
pub const DEFAULT_GEN_MODEL: &str = quillnote_core::defaults::GEN_MODEL;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = quillnote_core::defaults::GEN_TIMEOUT_SECS;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Request body for the chat completions endpoint.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from the chat completions endpoint.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// =============================================================================
// BACKEND
// =============================================================================

/// Groq enrichment backend.
pub struct GroqBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GroqBackend {
    /// Create a new Groq backend with default endpoint and model.
    pub fn new(api_key: String) -> Self {
        Self::with_config(
            DEFAULT_GROQ_URL.to_string(),
            api_key,
            DEFAULT_GEN_MODEL.to_string(),
        )
    }

    /// Create a new Groq backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        let timeout = std::env::var("QUILLNOTE_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "inference",
            component = "groq",
            base_url = %base_url,
            model = %model,
            "Initializing Groq backend"
        );

        Self {
            client,
            base_url,
            api_key,
            model,
        }
    }

    /// Create from environment variables.
    ///
    /// `GROQ_API_KEY` is required; `GROQ_BASE_URL` and `GROQ_MODEL` override
    /// the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| Error::Config("GROQ_API_KEY is not set".to_string()))?;
        let base_url =
            std::env::var("GROQ_BASE_URL").unwrap_or_else(|_| DEFAULT_GROQ_URL.to_string());
        let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GEN_MODEL.to_string());
        Ok(Self::with_config(base_url, api_key, model))
    }

    /// Name of the configured generation model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a single-user-message completion and return the assistant text.
    async fn complete(&self, prompt: String) -> Result<String> {
        let start = Instant::now();
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt,
            }],
            temperature: None,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Enrichment(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ApiErrorResponse>()
                .await
                .map(|b| b.error.message)
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(
                subsystem = "inference",
                component = "groq",
                status = %status,
                error = %message,
                "Groq request failed"
            );
            return Err(Error::Enrichment(format!(
                "Groq returned {}: {}",
                status, message
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Enrichment(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(Error::Enrichment("model returned empty response".to_string()));
        }

        debug!(
            subsystem = "inference",
            component = "groq",
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            response_len = content.len(),
            "Generation complete"
        );
        Ok(content)
    }
}

/// Split a comma-separated tag response into trimmed, non-empty tags.
pub fn parse_tags(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(|tag| tag.trim().trim_matches('"').to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[async_trait]
impl EnrichmentBackend for GroqBackend {
    async fn summarize(&self, content: &str) -> Result<String> {
        self.complete(format!(
            "Summarize the following text in 2-3 lines. Do not start with \
             \"here is a summary\"; start directly with the summary.\n{}",
            content
        ))
        .await
    }

    async fn title(&self, content: &str) -> Result<String> {
        self.complete(format!(
            "Generate 1 short title for the following note. Do not start with \
             \"here is a short title\"; start directly with the title.\n{}",
            content
        ))
        .await
        // Models occasionally wrap titles in quotes.
        .map(|t| t.trim_matches('"').to_string())
    }

    async fn tags(&self, content: &str) -> Result<Vec<String>> {
        let response = self
            .complete(format!(
                "Generate 3-5 relevant tags (comma separated) for the note. \
                 Reply with the tags only, no preamble.\n{}",
                content
            ))
            .await?;
        let tags = parse_tags(&response);
        if tags.is_empty() {
            return Err(Error::Enrichment("model returned no tags".to_string()));
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_parse_tags_trims_and_drops_empties() {
        assert_eq!(
            parse_tags("shopping, errands , , groceries"),
            vec!["shopping", "errands", "groceries"]
        );
        assert_eq!(parse_tags("\"rust\", \"notes\""), vec!["rust", "notes"]);
        assert!(parse_tags("  ,  , ").is_empty());
    }

    #[tokio::test]
    async fn test_summarize_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(bearer_token("test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("  A short summary.  ")),
            )
            .mount(&server)
            .await;

        let backend = GroqBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        let summary = backend.summarize("Buy milk and eggs").await.unwrap();
        assert_eq!(summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_request_carries_configured_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(
                serde_json::json!({ "model": "llama-3.1-8b-instant" }),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Groceries")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = GroqBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        let title = backend.title("Buy milk").await.unwrap();
        assert_eq!(title, "Groceries");
    }

    #[tokio::test]
    async fn test_tags_parsed_from_comma_separated_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("shopping, groceries, reminders")),
            )
            .mount(&server)
            .await;

        let backend = GroqBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        let tags = backend.tags("Buy milk").await.unwrap();
        assert_eq!(tags, vec!["shopping", "groceries", "reminders"]);
    }

    #[tokio::test]
    async fn test_api_error_maps_to_enrichment_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "tokens" }
            })))
            .mount(&server)
            .await;

        let backend = GroqBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        let err = backend.summarize("Buy milk").await.unwrap_err();
        match err {
            Error::Enrichment(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("Rate limit reached"));
            }
            other => panic!("Expected Enrichment error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })),
            )
            .mount(&server)
            .await;

        let backend = GroqBackend::with_config(
            server.uri(),
            "test-key".to_string(),
            "llama-3.1-8b-instant".to_string(),
        );
        assert!(backend.summarize("Buy milk").await.is_err());
    }
}
