//! Generation backend
//!
//! The opaque generation function behind the pipeline: the completion API
//! seam, its HTTP implementation, and the timeout-bounded client wrapper.

pub mod api;
pub mod client;
pub mod types;

pub use api::{CompletionApi, HttpCompletionApi, StagePrompt};
pub use client::BackendClient;
