//! Application state
//!
//! The shared handle passed to every request handler. Holds the long-lived
//! generation service; all synchronization lives inside the service.

use crate::generation::SlideService;
use std::sync::Arc;

/// Shared application state, cheap to clone per request
#[derive(Clone)]
pub struct AppState {
    /// The slide generation service (backend client, gate, cache)
    pub slides: Arc<SlideService>,
}

impl AppState {
    /// Wrap a service constructed at startup
    pub fn new(slides: SlideService) -> Self {
        Self {
            slides: Arc::new(slides),
        }
    }
}
