use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Source of delays between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Outcome of a retried operation that did not succeed
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    #[error("operation failed: {0}")]
    Aborted(#[source] E),

    #[error("gave up after {attempts} attempts over {waited:?}")]
    Exhausted { attempts: u32, waited: Duration },
}

/// Bounded retry with a fixed delay between attempts
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    /// A policy that makes at least one attempt
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    ///
    /// `op` receives the zero-based attempt number. No delay follows the
    /// final attempt.
    pub async fn run<T, E, F, Fut, C>(&self, mut op: F, is_retryable: C) -> Result<T, RetryError<E>>
    where
        E: std::error::Error + 'static,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        let mut waited = Duration::ZERO;

        for attempt in 0..self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable(&e) => {
                    if attempt + 1 == self.max_attempts {
                        tracing::warn!("Attempt {} failed: {}. Giving up.", attempt + 1, e);
                        break;
                    }
                    tracing::warn!(
                        "Attempt {} failed: {}. Will try again in {:?}.",
                        attempt + 1,
                        e,
                        self.delay
                    );
                    self.sleeper.sleep(self.delay).await;
                    waited += self.delay;
                }
                Err(e) => return Err(RetryError::Aborted(e)),
            }
        }

        Err(RetryError::Exhausted {
            attempts: self.max_attempts,
            waited,
        })
    }
}
