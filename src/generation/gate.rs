//! Admission gate for pipeline runs
//!
//! Bounds how many generation pipelines run concurrently against the
//! rate-limited backend. Waiters queue FIFO; a waiter that is dropped while
//! queued consumes no permit.

use crate::error::AppError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Counting gate bounding concurrent pipeline runs
///
/// Capacity is fixed for the process lifetime. Exhaustion is backpressure,
/// not an error: `acquire` queues until a slot frees.
#[derive(Debug, Clone)]
pub struct AdmissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// RAII permit for one pipeline run
///
/// Dropping the permit returns the slot to the gate, exactly once, on every
/// exit path including panics.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl AdmissionGate {
    /// Create a gate admitting at most `capacity` concurrent runs
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot and claim it
    ///
    /// Waiters are served in acquisition order. Cancelling the returned
    /// future (dropping it while queued) leaves the gate untouched.
    pub async fn acquire(&self) -> Result<GatePermit, AppError> {
        let waiting = self.semaphore.available_permits() == 0;
        if waiting {
            debug!(capacity = self.capacity, "Admission gate full, queueing");
        }

        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AppError::Cancelled("admission gate closed".to_string()))?;

        Ok(GatePermit { _permit: permit })
    }

    /// Gate capacity (fixed at construction)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently free slots
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
