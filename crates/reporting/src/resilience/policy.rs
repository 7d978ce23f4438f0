//! Combined retry, circuit breaker and bulkhead policy.

use std::fmt::Display;
use std::future::Future;

use super::{
    Bulkhead, CircuitBreaker, CircuitBreakerConfig, ResilienceError, RetryPolicy, Transient,
};

pub const DEFAULT_MAX_CONCURRENT: usize = 10;
pub const DEFAULT_MAX_QUEUED: usize = 50;

#[derive(Debug)]
pub struct ResiliencePolicy {
    name: String,
    retry: RetryPolicy,
    breaker: CircuitBreaker,
    bulkhead: Bulkhead,
}

impl ResiliencePolicy {
    /// Policy with the default retry, breaker and bulkhead settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parts(
            name,
            RetryPolicy::default(),
            CircuitBreakerConfig::default(),
            DEFAULT_MAX_CONCURRENT,
            DEFAULT_MAX_QUEUED,
        )
    }

    pub fn with_parts(
        name: impl Into<String>,
        retry: RetryPolicy,
        breaker: CircuitBreakerConfig,
        max_concurrent: usize,
        max_queued: usize,
    ) -> Self {
        let name = name.into();
        Self {
            breaker: CircuitBreaker::new(name.clone(), breaker),
            bulkhead: Bulkhead::new(name.clone(), max_concurrent, max_queued),
            retry,
            name,
        }
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Runs `op` under the policy.
    ///
    /// Transient failures are retried with backoff and count against the
    /// circuit breaker. Rejections by the breaker or bulkhead are not retried.
    pub async fn execute<T, E, F, Fut>(&self, mut op: F) -> Result<T, ResilienceError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Transient + Display,
    {
        let mut retry = 0;
        loop {
            // The slot is taken first so a bulkhead rejection never uses up
            // a half-open test call.
            let Some(permit) = self.bulkhead.enter().await else {
                return Err(ResilienceError::BulkheadFull {
                    name: self.name.clone(),
                });
            };
            if !self.breaker.is_call_permitted() {
                return Err(ResilienceError::CircuitOpen {
                    name: self.name.clone(),
                });
            }

            let result = op().await;
            drop(permit);

            match result {
                Ok(value) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Err(e) if e.is_transient() => {
                    self.breaker.record_failure();
                    if retry >= self.retry.max_retries {
                        return Err(ResilienceError::Inner(e));
                    }
                    retry += 1;
                    let delay = self.retry.delay_for(retry);
                    tracing::warn!(
                        policy = %self.name,
                        retry,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    // The dependency answered; the request itself was bad.
                    self.breaker.record_success();
                    return Err(ResilienceError::Inner(e));
                }
            }
        }
    }
}
