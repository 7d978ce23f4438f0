//! Resilience primitives for outbound calls.
//!
//! [`ResiliencePolicy`] layers them: retry around circuit breaker around
//! bulkhead.

mod bulkhead;
mod circuit_breaker;
mod policy;
mod retry;

use thiserror::Error;

pub use bulkhead::Bulkhead;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use policy::ResiliencePolicy;
pub use retry::RetryPolicy;

/// Classifies errors that may succeed when retried.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Outcome of a call rejected by, or failing under, a [`ResiliencePolicy`].
#[derive(Debug, Error)]
pub enum ResilienceError<E> {
    /// The circuit breaker rejected the call.
    #[error("circuit breaker '{name}' is open")]
    CircuitOpen { name: String },

    /// The bulkhead had no slot and no queue space.
    #[error("bulkhead '{name}' is full")]
    BulkheadFull { name: String },

    /// The call ran and failed.
    #[error("{0}")]
    Inner(E),
}
