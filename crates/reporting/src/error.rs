//! Reporting error types.

use domain::DomainError;
use thiserror::Error;

use crate::resilience::{ResilienceError, Transient};

/// Errors raised by a [`crate::Mailer`].
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// The transport failed. Worth retrying.
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// The message itself is unacceptable. Retrying will not help.
    #[error("Invalid mail message: {0}")]
    InvalidMessage(String),

    /// The resilience policy refused the call.
    #[error("Mail delivery unavailable: {0}")]
    Unavailable(String),
}

impl Transient for MailError {
    fn is_transient(&self) -> bool {
        matches!(self, MailError::Transport(_))
    }
}

impl From<ResilienceError<MailError>> for MailError {
    fn from(e: ResilienceError<MailError>) -> Self {
        match e {
            ResilienceError::Inner(inner) => inner,
            rejected => MailError::Unavailable(rejected.to_string()),
        }
    }
}

/// Errors that can occur while producing or sending a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Failed to send report: {0}")]
    Mail(#[from] MailError),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
