use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AgentError;

/// Linear-backoff retry shared by the network-calling components: attempt
/// `n` (1-based) sleeps `n * base_delay` before the next try.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `op` until it succeeds, it fails with a non-retryable error, or
    /// the attempt budget is spent. Exhaustion surfaces as
    /// `MaxRetriesExceeded` carrying the operation name.
    pub async fn run<T, Fut, F>(&self, operation: &str, mut op: F) -> Result<T, AgentError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    warn!(operation, attempt, %err, "attempt failed");
                    if attempt >= self.max_attempts {
                        return Err(AgentError::MaxRetriesExceeded {
                            operation: operation.to_string(),
                            attempts: attempt,
                        });
                    }
                    let delay = self.delay_for(attempt);
                    warn!(operation, ?delay, "backing off before retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
