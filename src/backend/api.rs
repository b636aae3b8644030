//! Completion API client
//!
//! Direct HTTP client for the OpenAI-compatible chat-completions API.
//! The `CompletionApi` trait is the seam between the pipeline and the
//! opaque generation function; tests substitute scripted implementations.

use crate::backend::types::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::BackendConfig;
use crate::error::AppError;
use async_trait::async_trait;

/// Sampling temperature used for every stage call
const TEMPERATURE: f32 = 0.7;

/// Prompt for one pipeline stage
#[derive(Debug, Clone)]
pub struct StagePrompt {
    /// System instructions (output contract for the stage)
    pub system: String,
    /// User content (topic, grade, context, stage inputs)
    pub user: String,
}

/// Opaque generation function: one prompt in, one structured text result out
///
/// Implementations carry no per-request mutable state and are shared across
/// all in-flight requests.
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Run one completion and return the raw model text
    async fn complete(&self, prompt: &StagePrompt) -> Result<String, AppError>;
}

/// Production `CompletionApi` over HTTP
///
/// Holds the shared `reqwest::Client` (connection pooling) and the endpoint
/// configuration. One long-lived instance is constructed at startup.
pub struct HttpCompletionApi {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl HttpCompletionApi {
    /// Create a client from backend configuration
    pub fn new(client: reqwest::Client, config: &BackendConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionApi for HttpCompletionApi {
    async fn complete(&self, prompt: &StagePrompt) -> Result<String, AppError> {
        if self.api_key.is_empty() {
            return Err(AppError::Backend("API key is empty".to_string()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(&prompt.system),
                ChatMessage::user(&prompt.user),
            ],
            temperature: TEMPERATURE,
        };

        tracing::debug!(
            url = %url,
            model = %self.model,
            prompt_len = prompt.user.len(),
            "Calling completion API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to send HTTP request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "Completion API returned error status"
            );

            if status_code == 429 {
                return Err(AppError::Backend(format!(
                    "Rate limit exceeded (HTTP {}): {}",
                    status_code, error_body
                )));
            }

            return Err(AppError::Backend(format!(
                "Completion API returned error status {}: {}",
                status_code, error_body
            )));
        }

        let response_body = response
            .text()
            .await
            .map_err(|e| AppError::Backend(format!("Failed to read response body: {}", e)))?;

        let parsed: ChatResponse = serde_json::from_str(&response_body).map_err(|e| {
            AppError::Backend(format!(
                "Failed to parse JSON response: {} - Response body: {}",
                e, response_body
            ))
        })?;

        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| AppError::Backend("Response contains no choices".to_string()))?;

        if let Some(refusal) = &choice.message.refusal {
            return Err(AppError::Backend(format!(
                "Backend refused the prompt: {}",
                refusal
            )));
        }

        let text = choice
            .message
            .content
            .as_deref()
            .unwrap_or_default()
            .to_string();
        if text.is_empty() {
            return Err(AppError::Backend("Response text is empty".to_string()));
        }

        tracing::debug!(response_len = text.len(), "Completion API call succeeded");

        Ok(text)
    }
}
