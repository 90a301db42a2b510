//! Tokio-based clock implementation.

use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::traits::Clock;

/// Clock backed by Tokio's timer.
///
/// Under a paused Tokio runtime `now()` follows the runtime's virtual time, so
/// deadlines and sleeps stay consistent in tests.
///
/// # Examples
///
/// ```rust
/// use cctx_relay::providers::TokioClock;
///
/// let clock = TokioClock::new();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl TokioClock {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}
