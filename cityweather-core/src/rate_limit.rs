use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Pause between consecutive outbound requests.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn wait(&self);
}

/// Sleeps for the same duration every time. Ignores provider rate-limit headers.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

#[async_trait]
impl RateLimiter for FixedDelay {
    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Used with providers that make no network calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl RateLimiter for NoDelay {
    async fn wait(&self) {}
}
