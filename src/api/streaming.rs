//! Streaming utilities for Server-Sent Events (SSE)
//!
//! Converts the pipeline's slide stream into an SSE response body. Each
//! slide becomes one `data:` event; abnormal termination is a JSON error
//! event, and every stream ends with the `[DONE]` sentinel.

use crate::error::AppError;
use crate::generation::StreamEvent;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::{Stream, StreamExt};
use serde_json::json;

/// SSE stream termination signal
pub const SSE_DONE_SIGNAL: &str = "[DONE]";

/// Create an SSE response from a pipeline event stream
///
/// # Arguments
/// * `events` - Lazy slide stream from the generation service
///
/// # Returns
/// * `Result<Response, AppError>` - SSE HTTP response or error
pub fn create_sse_stream(
    events: impl Stream<Item = StreamEvent> + Send + 'static,
) -> Result<Response, AppError> {
    let sse_stream = to_event_data(events)
        .map(|data| Ok::<_, std::io::Error>(format!("data: {}\n\n", data)));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(sse_stream))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build SSE response: {}", e)))
}

/// Serialize pipeline events into SSE event payloads
fn to_event_data(
    events: impl Stream<Item = StreamEvent> + Send + 'static,
) -> impl Stream<Item = String> + Send {
    use async_stream::stream;

    stream! {
        futures_util::pin_mut!(events);

        while let Some(event) = events.next().await {
            match event {
                StreamEvent::Slide(slide) => match serde_json::to_string(&slide) {
                    Ok(data) => yield data,
                    Err(e) => {
                        yield json!({"error": format!("Failed to serialize slide: {}", e)})
                            .to_string();
                        break;
                    }
                },
                StreamEvent::Failed { message } => {
                    yield json!({"error": message}).to_string();
                    break;
                }
            }
        }

        yield SSE_DONE_SIGNAL.to_string();
    }
}
