use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Phase boundaries of the fabricated progress curve. The transcoder gives
/// no native progress signal, so each phase advances on a timer and is
/// clamped at its ceiling until the real phase boundary arrives.
pub const FETCH_START: u8 = 1;
pub const FETCH_CEILING: u8 = 30;
pub const ENGINE_START: u8 = 31;
pub const ENGINE_CEILING: u8 = 50;
pub const PREPARE_START: u8 = 51;
pub const PREPARE_CEILING: u8 = 60;
pub const TRANSCODE_START: u8 = 61;
pub const TRANSCODE_CEILING: u8 = 90;
pub const TRANSCODE_DONE: u8 = 91;
pub const READ_START: u8 = 92;
pub const READ_CEILING: u8 = 95;
pub const FINALIZE_START: u8 = 96;
pub const DONE: u8 = 100;

pub const FETCH_TICK: Duration = Duration::from_millis(100);
pub const ENGINE_TICK: Duration = Duration::from_millis(150);
pub const PREPARE_TICK: Duration = Duration::from_millis(50);
pub const TRANSCODE_TICK: Duration = Duration::from_millis(300);
pub const READ_TICK: Duration = Duration::from_millis(100);
pub const FINALIZE_TICK: Duration = Duration::from_millis(50);

/// Publishes a single monotonic 0-100 value for one job through a watch
/// channel. Writes that would lower the value are ignored, so a lagging
/// ramp tick can never undo a checkpoint.
pub struct ProgressReporter {
    tx: watch::Sender<u8>,
}

impl ProgressReporter {
    pub fn channel() -> (Self, watch::Receiver<u8>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    /// Raise the value to `target`. Lower targets are dropped.
    pub fn set(&self, target: u8) {
        self.tx.send_modify(|current| {
            if target > *current {
                *current = target;
            }
        });
    }

    pub fn get(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Start a timer-driven ramp: jump to `start`, then +1 per `tick`,
    /// never past `ceiling`. The ramp stops when the returned guard drops,
    /// on success and failure paths alike.
    pub fn ramp(&self, start: u8, ceiling: u8, tick: Duration) -> RampGuard {
        self.set(start);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(tick);
            // interval fires immediately once; the ramp starts one tick in.
            timer.tick().await;
            loop {
                timer.tick().await;
                let mut at_ceiling = false;
                tx.send_modify(|current| {
                    if *current < ceiling {
                        *current += 1;
                    }
                    at_ceiling = *current >= ceiling;
                });
                if at_ceiling {
                    break;
                }
            }
        });
        RampGuard { handle }
    }

    /// Fixed step sequence: raise to each value in `from..=to`, pausing
    /// between steps. Used where the real work is quick and the curve is
    /// purely cosmetic.
    pub async fn steps(&self, from: u8, to: u8, pause: Duration) {
        for value in from..=to {
            self.set(value);
            tokio::time::sleep(pause).await;
        }
    }
}

pub struct RampGuard {
    handle: JoinHandle<()>,
}

impl Drop for RampGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
