//! Completion API wire types
//!
//! Structs that mirror the OpenAI-compatible chat-completions JSON format.
//! Used to serialize requests and deserialize API responses into typed
//! Rust structs.

use serde::{Deserialize, Serialize};

/// Request structure for the chat-completions endpoint
#[derive(Serialize, Debug)]
pub struct ChatRequest {
    /// Model name to generate with
    pub model: String,
    /// Ordered conversation messages (system prompt first)
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: f32,
}

/// A single request message
#[derive(Serialize, Debug)]
pub struct ChatMessage {
    /// Message role ("system" or "user")
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Build a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Build a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Top-level chat-completions response
#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    /// List of candidate completions from the model
    pub choices: Vec<ChatChoice>,
}

/// A single candidate completion
#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    /// The message produced for this choice
    pub message: ChatResponseMessage,
    /// Why the model stopped generating (if applicable)
    #[serde(default)]
    #[allow(dead_code)] // Part of API response format, may be used in future
    pub finish_reason: Option<String>,
}

/// The message body of a completion choice
#[derive(Deserialize, Debug)]
pub struct ChatResponseMessage {
    /// Generated text, absent when the model refused
    #[serde(default)]
    pub content: Option<String>,
    /// Refusal explanation, set when the model declined the request
    #[serde(default)]
    pub refusal: Option<String>,
}
