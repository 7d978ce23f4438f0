//! Monthly transaction reports.
//!
//! - [`ReportService`] gathers a customer's orders for a month and mails them
//! - [`ResilientMailer`] puts any [`Mailer`] behind a [`ResiliencePolicy`]
//! - [`MonthlyReportScheduler`] runs the bulk job on the first of each month

pub mod error;
pub mod mail;
pub mod report;
pub mod resilience;
pub mod scheduler;
pub mod service;

pub use error::{MailError, ReportError, Result};
pub use mail::{
    Attachment, EmailMessage, InMemoryMailer, LogMailer, Mailer, ResilientMailer, Sender,
};
pub use report::{InvalidMonth, MonthlyReport, ReportMonth};
pub use resilience::{
    CircuitBreakerConfig, CircuitState, ResilienceError, ResiliencePolicy, RetryPolicy,
};
pub use scheduler::MonthlyReportScheduler;
pub use service::{BULK_CONCURRENCY, BulkReportSummary, ReportService};
