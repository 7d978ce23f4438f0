//! Outbound email.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::MailError;
use crate::resilience::ResiliencePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

/// Sender identity stamped on every outgoing message.
#[derive(Debug, Clone)]
pub struct Sender {
    pub address: String,
    pub name: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Mailer that writes each message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    sender: Sender,
}

impl LogMailer {
    pub fn new(sender: Sender) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if !message.to.contains('@') {
            return Err(MailError::InvalidMessage(format!(
                "invalid recipient '{}'",
                message.to
            )));
        }
        tracing::info!(
            from = %self.sender.address,
            from_name = %self.sender.name,
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "email sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryMailerState {
    sent: Vec<EmailMessage>,
    failures_remaining: u32,
    fail_on_send: bool,
}

/// Mailer that records messages, for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMailer {
    state: Arc<Mutex<InMemoryMailerState>>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every send fail with a transport error until cleared.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.lock().fail_on_send = fail;
    }

    /// Makes the next `count` sends fail with a transport error.
    pub fn fail_next(&self, count: u32) {
        self.lock().failures_remaining = count;
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.lock().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.lock().sent.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryMailerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let mut state = self.lock();
        if state.fail_on_send {
            return Err(MailError::Transport("SMTP connection refused".to_string()));
        }
        if state.failures_remaining > 0 {
            state.failures_remaining -= 1;
            return Err(MailError::Transport("SMTP timeout".to_string()));
        }
        state.sent.push(message.clone());
        Ok(())
    }
}

/// Wraps a mailer with a [`ResiliencePolicy`].
///
/// The policy is shared so its circuit state can be observed elsewhere.
pub struct ResilientMailer<M> {
    inner: M,
    policy: Arc<ResiliencePolicy>,
}

impl<M: Mailer> ResilientMailer<M> {
    pub fn new(inner: M, policy: Arc<ResiliencePolicy>) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &Arc<ResiliencePolicy> {
        &self.policy
    }
}

#[async_trait]
impl<M: Mailer> Mailer for ResilientMailer<M> {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let inner = &self.inner;
        let result = self.policy.execute(move || inner.send(message)).await;
        match result {
            Ok(()) => {
                metrics::counter!("emails_sent_total").increment(1);
                Ok(())
            }
            Err(e) => {
                metrics::counter!("emails_failed_total").increment(1);
                tracing::error!(to = %message.to, error = %e, "failed to send email");
                Err(e.into())
            }
        }
    }
}
