use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::demo::error::DemoError;

/// Cap on simultaneous fetch-and-process operations across the process.
pub const MAX_CONCURRENT_JOBS: usize = 5;

/// Bounds how many demo jobs may hold a fetch slot at once. Callers past the
/// cap are rejected immediately rather than queued.
pub struct ResourceLimiter {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ResourceLimiter {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Take a slot or fail fast with `ServerBusy`. The slot is returned when
    /// the permit drops, on every exit path.
    pub fn try_acquire(&self) -> Result<FetchPermit, DemoError> {
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => Ok(FetchPermit { _permit: permit }),
            Err(_) => Err(DemoError::ServerBusy),
        }
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ResourceLimiter {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_JOBS)
    }
}

#[derive(Debug)]
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}
