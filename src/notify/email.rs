use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{compose_email, EmailContent, Notifier};
use crate::analyze::verdict::ClassificationResult;
use crate::config::EmailConfig;
use crate::error::{ConfigError, NotificationError};
use crate::ingest::types::Post;

const STARTTLS_PORT: u16 = 587;

/// Authenticated SMTP submission to a single recipient.
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    /// Port 587 uses STARTTLS; any other port uses implicit TLS.
    pub fn new(cfg: &EmailConfig) -> Result<Self, ConfigError> {
        let creds = Credentials::new(cfg.sender.email.to_string(), cfg.app_password.clone());
        let relay = if cfg.smtp_port == STARTTLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
        };
        let builder = relay.map_err(|e| ConfigError::Invalid {
            key: "SMTP_HOST",
            value: cfg.smtp_host.clone(),
            reason: e.to_string(),
        })?;

        let mailer = builder
            .port(cfg.smtp_port)
            .credentials(creds)
            .timeout(Some(Duration::from_secs(20)))
            .build();

        Ok(Self::with_transport(mailer, cfg.sender.clone(), cfg.recipient.clone()))
    }

    pub(crate) fn with_transport(
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
        to: Mailbox,
    ) -> Self {
        Self { mailer, from, to }
    }

    pub async fn send_content(&self, content: EmailContent) -> Result<(), NotificationError> {
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(content.subject)
            .header(header::ContentType::TEXT_PLAIN)
            .body(content.body)
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.mailer.send(msg).await.map_err(map_smtp_error)?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(
        &self,
        post: &Post,
        verdict: Option<&ClassificationResult>,
    ) -> Result<(), NotificationError> {
        self.send_content(compose_email(post, verdict)).await
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

fn map_smtp_error(e: lettre::transport::smtp::Error) -> NotificationError {
    let code = e.status().map(|c| c.to_string());
    error_for_reply_code(code.as_deref(), e.to_string())
}

/// 530 (auth required), 534 (mechanism too weak), 535 (bad credentials) are
/// authentication failures; everything else is transport.
pub(crate) fn error_for_reply_code(code: Option<&str>, message: String) -> NotificationError {
    match code {
        Some("530") | Some("534") | Some("535") => NotificationError::Auth(message),
        _ => NotificationError::Transport(message),
    }
}
