use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send email: {0}")]
    Send(String),
}

/// Outbound notification channel for password-reset links.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_reset_link(&self, recipient: &str, link: &str) -> Result<(), NotifyError>;
}

/// Logs the reset link instead of delivering it. Stand-in until a real
/// email provider is wired up.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_reset_link(&self, recipient: &str, link: &str) -> Result<(), NotifyError> {
        info!(email = %recipient, reset_link = %link, "sending reset link email");
        Ok(())
    }
}

/// Test mailer that records every delivery.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: tokio::sync::Mutex<Vec<(String, String)>>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_reset_link(&self, recipient: &str, link: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .await
            .push((recipient.to_string(), link.to_string()));
        Ok(())
    }
}

/// Test mailer that always fails, for the non-fatal-delivery path.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FailingMailer;

#[cfg(test)]
#[async_trait]
impl Mailer for FailingMailer {
    async fn send_reset_link(&self, _recipient: &str, _link: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Send("smtp unreachable".into()))
    }
}
