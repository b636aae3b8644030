//! Generation orchestrator
//!
//! Entry point for the two logical operations: full-deck generation
//! (cache → gate → batch pipeline → cache) and streaming generation
//! (gate → streaming pipeline, no cache). Owns the process-wide backend
//! client, admission gate, and result cache.

use crate::backend::BackendClient;
use crate::config::{CacheConfig, GenerationConfig};
use crate::error::AppError;
use crate::generation::cache::DeckCache;
use crate::generation::gate::AdmissionGate;
use crate::generation::pipeline::{PipelineRun, StreamEvent};
use crate::generation::types::{Deck, DeckRequest};
use async_stream::stream;
use futures_util::{Stream, StreamExt};
use std::sync::Arc;
use tracing::{debug, info};

/// Long-lived generation service, constructed once at startup
///
/// All fields are internally synchronized; handlers share the service
/// through an `Arc` without additional locking.
pub struct SlideService {
    backend: Arc<BackendClient>,
    gate: AdmissionGate,
    cache: DeckCache,
}

impl SlideService {
    /// Create the service from its backend client and configuration
    pub fn new(backend: BackendClient, generation: &GenerationConfig, cache: &CacheConfig) -> Self {
        info!(
            max_concurrent = generation.max_concurrent_generations,
            timeout_secs = generation.llm_request_timeout_secs,
            cache_enabled = cache.enabled,
            "Initializing slide generation service"
        );

        Self {
            backend: Arc::new(backend),
            gate: AdmissionGate::new(generation.max_concurrent_generations),
            cache: DeckCache::new(cache),
        }
    }

    /// Number of currently free admission slots
    pub fn available_slots(&self) -> usize {
        self.gate.available()
    }

    /// Generate a complete deck (full-deck path)
    ///
    /// Cache hits return immediately without consuming a concurrency slot.
    /// On a miss the run passes the admission gate, executes the batch
    /// pipeline, and the resulting deck is cached. Failed runs are never
    /// cached; the permit is released on every exit path.
    pub async fn generate_deck(&self, request: DeckRequest) -> Result<Deck, AppError> {
        request.validate()?;
        let key = request.fingerprint();

        if let Some(deck) = self.cache.get(&key).await {
            debug!(topic = %request.topic, "Cache hit, returning cached deck");
            return Ok(deck);
        }

        let _permit = self.gate.acquire().await?;
        let deck = PipelineRun::new(self.backend.clone(), request)
            .run_batch()
            .await?;

        self.cache.put(key, deck.clone()).await;
        Ok(deck)
    }

    /// Generate a deck as a lazy slide stream (streaming path)
    ///
    /// No cache lookup. The admission slot is claimed on first poll, so a
    /// consumer that disconnects while queued abandons the wait without
    /// consuming a permit. The slot is released exactly once when the
    /// stream is exhausted or dropped.
    pub fn stream_deck(
        &self,
        request: DeckRequest,
    ) -> Result<impl Stream<Item = StreamEvent> + Send + 'static, AppError> {
        request.validate()?;

        let backend = self.backend.clone();
        let gate = self.gate.clone();

        Ok(stream! {
            let _permit = match gate.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    yield StreamEvent::Failed { message: e.to_string() };
                    return;
                }
            };

            let events = PipelineRun::new(backend, request).run_streaming();
            futures_util::pin_mut!(events);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }
}
