//! Inter-attempt delay for the poller.

use std::time::Duration;

use async_trait::async_trait;

/// Wait performed between poll attempts.
#[async_trait]
pub trait PollDelay: Send + Sync {
    /// Called after the `attempt`-th unfinished poll, before the next one.
    async fn wait(&self, attempt: u32);
}

/// Constant wait using the runtime timer.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl PollDelay for FixedDelay {
    async fn wait(&self, _attempt: u32) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}
