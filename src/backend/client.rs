//! Timeout-bounded backend client
//!
//! Wraps the completion API with a per-call wall-clock budget so a stuck
//! call cannot hold an admission gate permit indefinitely.

use crate::backend::api::{CompletionApi, StagePrompt};
use crate::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error};

/// Backend client shared by every pipeline run
///
/// Carries no per-request mutable state. On timeout the in-flight call is
/// dropped (cancelled) and the stage fails with `AppError::BackendTimeout`.
/// No retries happen at this layer.
pub struct BackendClient {
    api: Arc<dyn CompletionApi>,
    call_timeout: Duration,
}

impl BackendClient {
    /// Create a client over the given completion API with a per-call timeout
    pub fn new(api: Arc<dyn CompletionApi>, timeout_secs: u64) -> Self {
        Self {
            api,
            call_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Get the per-call timeout duration
    #[cfg(test)]
    pub fn timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Run one stage call against the backend
    ///
    /// # Arguments
    /// * `stage` - Stage label for logging
    /// * `prompt` - The stage prompt to send
    ///
    /// # Returns
    /// * `Ok(String)` - The raw model text
    /// * `Err(AppError)` - `BackendTimeout` if the budget elapsed, `Backend`
    ///   for any other failure
    pub async fn call(&self, stage: &str, prompt: &StagePrompt) -> Result<String, AppError> {
        debug!(stage = stage, "Calling generation backend");

        match timeout(self.call_timeout, self.api.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    stage = stage,
                    timeout_secs = self.call_timeout.as_secs(),
                    "Backend call timed out"
                );
                Err(AppError::BackendTimeout(self.call_timeout.as_secs()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct InstantApi;

    #[async_trait]
    impl CompletionApi for InstantApi {
        async fn complete(&self, _prompt: &StagePrompt) -> Result<String, AppError> {
            Ok("ok".to_string())
        }
    }

    struct StuckApi;

    #[async_trait]
    impl CompletionApi for StuckApi {
        async fn complete(&self, _prompt: &StagePrompt) -> Result<String, AppError> {
            std::future::pending().await
        }
    }

    fn prompt() -> StagePrompt {
        StagePrompt {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    #[tokio::test]
    async fn test_call_passes_through_success() {
        let client = BackendClient::new(Arc::new(InstantApi), 5);
        let result = client.call("title", &prompt()).await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_call_times_out_with_backend_timeout() {
        // Paused time auto-advances past the budget while the call is stuck.
        tokio::time::pause();
        let client = BackendClient::new(Arc::new(StuckApi), 1);

        let result = client.call("title", &prompt()).await;
        match result {
            Err(AppError::BackendTimeout(secs)) => assert_eq!(secs, 1),
            other => panic!("Expected BackendTimeout, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeout_configured_from_seconds() {
        let client = BackendClient::new(Arc::new(InstantApi), 42);
        assert_eq!(client.timeout().as_secs(), 42);
    }
}
