use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;
use tokio::sync::RwLock;

/// Shared pause for every task in a batched export.
///
/// When the provider signals rate limiting, one task opens the gate for a
/// backoff interval and every task waits it out before continuing.
#[derive(Debug, Clone)]
pub struct RateGate {
    paused_until: Arc<RwLock<Option<Instant>>>,
    pause_duration: Duration,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl RateGate {
    pub fn new(pause_duration: Duration) -> Self {
        Self { paused_until: Arc::new(RwLock::new(None)), pause_duration }
    }

    /// Wait until any active pause has elapsed.
    pub async fn wait_if_paused(&self) {
        let deadline = *self.paused_until.read().await;
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if deadline > now {
                tokio::time::sleep(deadline - now).await;
            }
        }
    }

    /// Record a rate-limit signal, pausing the gate for the configured
    /// interval. Later deadlines win; an earlier signal never shortens one
    /// already in effect.
    pub async fn pause(&self) {
        let deadline = Instant::now() + self.pause_duration;
        let mut paused = self.paused_until.write().await;
        if paused.map_or(true, |current| deadline > current) {
            warn!("Rate limited by provider, pausing batch for {:?}", self.pause_duration);
            *paused = Some(deadline);
        }
    }
}
