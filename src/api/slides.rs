//! Slide deck API handlers
//!
//! Contains HTTP request handlers for full-deck generation and for
//! streaming slides one by one using Server-Sent Events (SSE).

use crate::api::streaming::create_sse_stream;
use crate::error::AppError;
use crate::generation::{Deck, DeckRequest};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{Json, Response},
};
use serde::Serialize;
use std::time::Instant;

/// Full-deck response body
#[derive(Debug, Serialize)]
pub struct DeckResponse {
    /// Ordered list of slides: title, agenda, content slides, conclusion
    pub slides: Deck,
}

/// POST /api/slides - Generate the full slide deck at once
pub async fn generate_deck(
    State(state): State<AppState>,
    Json(request): Json<DeckRequest>,
) -> Result<Json<DeckResponse>, AppError> {
    request.validate()?;

    let start = Instant::now();
    let slides = state.slides.generate_deck(request).await?;

    tracing::info!(
        slide_count = slides.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Deck generated"
    );

    Ok(Json(DeckResponse { slides }))
}

/// POST /api/slides/stream - Stream slides one by one via SSE
pub async fn stream_deck(
    State(state): State<AppState>,
    Json(request): Json<DeckRequest>,
) -> Result<Response, AppError> {
    request.validate()?;

    let events = state.slides.stream_deck(request)?;
    create_sse_stream(events)
}
