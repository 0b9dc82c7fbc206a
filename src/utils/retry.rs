use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;

use crate::error::ProviderError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

/// Exponential backoff delay for the given attempt, with +/-25% jitter.
pub fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let exp = config.backoff_multiplier.powi(attempt.min(6) as i32);
    let raw = (config.base_delay.as_millis() as f64 * exp) as u64;
    let capped = raw.min(config.max_delay.as_millis() as u64);

    let jitter_range = capped / 4;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..=jitter_range * 2) as i64 - jitter_range as i64
    } else {
        0
    };

    Duration::from_millis((capped as i64 + jitter).max(0) as u64)
}

/// Retry a provider call on transient failures only.
///
/// Rate limiting, provider 5xx and transport errors back off and retry up
/// to the attempt bound; everything else surfaces immediately.
pub async fn retry_provider_call<T, F, Fut>(
    config: &RetryConfig,
    operation: F,
) -> Result<T, ProviderError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    for attempt in 1..=config.max_attempts {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() && attempt < config.max_attempts => {
                let delay = backoff_delay(config, attempt - 1);
                debug!(
                    "Attempt {} failed transiently, retrying in {:?}: {}",
                    attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if e.is_transient() {
                    warn!("Operation failed after {} attempts: {}", config.max_attempts, e);
                } else {
                    debug!("Attempt {} failed with non-transient error, not retrying: {}", attempt, e);
                }
                return Err(e);
            }
        }
    }

    unreachable!()
}
