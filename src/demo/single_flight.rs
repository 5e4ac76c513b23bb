use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::demo::error::DemoError;

/// How long a finished job keeps the slot after its terminal state, so the
/// UI can show the completed progress bar before it disappears.
pub const RELEASE_GRACE: Duration = Duration::from_millis(1500);

/// One demo job at a time. A second `begin` while a slot is out fails with
/// `Busy`, also for the same file; requests are rejected, never coalesced.
pub struct SingleFlight {
    busy: Arc<AtomicBool>,
    grace: Duration,
}

impl SingleFlight {
    pub fn new(grace: Duration) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            grace,
        }
    }

    pub fn begin(&self) -> Result<FlightSlot, DemoError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(DemoError::Busy);
        }
        Ok(FlightSlot {
            busy: self.busy.clone(),
            grace: self.grace,
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new(RELEASE_GRACE)
    }
}

/// Held for the lifetime of a job. Dropping it (success or failure alike)
/// schedules the slot release after the grace window.
pub struct FlightSlot {
    busy: Arc<AtomicBool>,
    grace: Duration,
}

impl Drop for FlightSlot {
    fn drop(&mut self) {
        let busy = self.busy.clone();
        let grace = self.grace;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(grace).await;
                    busy.store(false, Ordering::SeqCst);
                });
            }
            // No runtime left (process teardown): release right away.
            Err(_) => busy.store(false, Ordering::SeqCst),
        }
    }
}
