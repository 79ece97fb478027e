use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        RetryPolicy {
            max_attempts,
            initial_delay,
        }
    }
}

/// Rate-limit and timeout failures are worth another attempt; anything else
/// is re-raised immediately.
fn is_transient(error: &anyhow::Error) -> bool {
    let message = format!("{error:#}").to_lowercase();
    message.contains("rate limit")
        || message.contains("too many requests")
        || message.contains("429")
        || message.contains("timeout")
        || message.contains("timed out")
}

/// Runs `operation`, sleeping and doubling the delay after each transient
/// failure, up to the policy's attempt budget. The final attempt's error
/// propagates to the caller.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    context: &str,
    mut operation: F,
) -> anyhow::Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts && is_transient(&e) => {
                log::warn!(
                    "{}: attempt {}/{} failed ({:#}), retrying in {:?}",
                    context,
                    attempt,
                    policy.max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(e) => {
                if attempt >= policy.max_attempts {
                    log::error!("{}: retry budget exhausted: {:#}", context, e);
                } else {
                    log::error!("{}: error not eligible for retry: {:#}", context, e);
                }
                return Err(e);
            }
        }
    }
}
