//! Time source seam for the validator.

use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Abstracts reading the monotonic clock and waiting, so the poll loop can
/// be driven by a fake in tests without real delays.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Production clock backed by tokio timers.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
