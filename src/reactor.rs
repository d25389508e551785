//! The timer and I/O lifecycle seam of the control plane.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

/// Event loop abstraction the control connection schedules its timers on.
///
/// The control connection never blocks on wall-clock time directly; every
/// backoff interval goes through [`IoReactor::schedule_timer`] so embedders
/// and tests control the clock.
#[async_trait]
pub trait IoReactor: Send + Sync {
    /// Brings the reactor up. Idempotent.
    async fn start(&self);

    /// Stops the reactor. Pending timers resolve; their continuations observe
    /// the current state and exit cleanly.
    async fn stop(&self);

    /// Resolves after `duration` has elapsed.
    async fn schedule_timer(&self, duration: Duration);
}

/// [`IoReactor`] backed by the tokio runtime's timer wheel.
///
/// The runtime itself owns I/O readiness, so `start`/`stop` are bookkeeping
/// only; the type exists to keep the reactor a substitutable seam.
#[derive(Debug, Default)]
pub struct TokioReactor {
    running: AtomicBool,
}

impl TokioReactor {
    pub fn new() -> Self {
        TokioReactor::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IoReactor for TokioReactor {
    async fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    async fn schedule_timer(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
