// ============================================================================
// Tala Worker - Outbox Mailer
// File: crates/tala-worker/src/jobs/mailer.rs
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use tala_core::domain::EmailMessage;
use tala_core::repositories::EmailRepository;
use tala_infrastructure::PgEmailRepository;
use tala_shared::config::EmailSettings;

/// Delivers queued outbox rows over SMTP.
pub struct Mailer {
    email_repo: Arc<PgEmailRepository>,
    transport: AsyncSmtpTransport<Tokio1Executor>,
    poll_interval: u64,
    batch_size: i64,
}

impl Mailer {
    pub fn new(
        email_repo: Arc<PgEmailRepository>,
        settings: &EmailSettings,
        poll_interval: u64,
        batch_size: i64,
    ) -> Result<Self> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
                .port(settings.smtp_port);

        // Local relays (mailhog, postfix on localhost) run without auth
        if !settings.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_username.clone(),
                settings.smtp_password.clone(),
            ));
        }

        Ok(Self {
            email_repo,
            transport: builder.build(),
            poll_interval,
            batch_size,
        })
    }

    pub async fn run(self) {
        info!("📬 Mailer started (polling every {}s)", self.poll_interval);

        let mut ticker = tokio::time::interval(Duration::from_secs(self.poll_interval));
        loop {
            ticker.tick().await;

            match self.deliver_due().await {
                Ok(0) => {}
                Ok(sent) => info!("✅ Delivered {} queued email(s)", sent),
                Err(e) => error!("❌ Mailer sweep failed: {}", e),
            }
        }
    }

    /// Claims due messages (they come back already marked SENDING) and
    /// attempts delivery. Failures go back to QUEUED with backoff until the
    /// attempt cap, then stay FAILED.
    async fn deliver_due(&self) -> Result<usize> {
        let claimed = self
            .email_repo
            .claim_due_messages(Utc::now(), self.batch_size)
            .await?;

        let mut sent = 0;
        for mut message in claimed {
            match self.deliver(&message).await {
                Ok(provider_id) => {
                    message.mark_sent(provider_id);
                    sent += 1;
                }
                Err(e) => {
                    warn!("Delivery of email {} failed: {}", message.id, e);
                    message.mark_failed(e.to_string());
                    if message.can_retry() {
                        message.requeue(Utc::now() + retry_delay(message.retry_count));
                    }
                }
            }
            self.email_repo.update_message(&message).await?;
        }

        Ok(sent)
    }

    async fn deliver(&self, message: &EmailMessage) -> Result<String> {
        let email = build_message(message)?;
        let response = self.transport.send(email).await?;
        Ok(response.message().collect::<Vec<_>>().join(" "))
    }
}

/// Builds the wire message from an outbox row. Rows with a text body go out
/// as multipart/alternative; HTML-only rows as a plain text/html part.
fn build_message(message: &EmailMessage) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox(&message.from_name, &message.from_email)?)
        .to(mailbox(&message.to_name, &message.to_email)?)
        .subject(message.subject.clone());

    if !message.reply_to.is_empty() {
        builder = builder.reply_to(mailbox("", &message.reply_to)?);
    }

    let email = if message.text_content.is_empty() {
        builder
            .header(ContentType::TEXT_HTML)
            .body(message.html_content.clone())?
    } else {
        builder.multipart(MultiPart::alternative_plain_html(
            message.text_content.clone(),
            message.html_content.clone(),
        ))?
    };

    Ok(email)
}

fn mailbox(name: &str, email: &str) -> Result<Mailbox> {
    let address: Address = email.parse()?;
    let name = (!name.is_empty()).then(|| name.to_string());
    Ok(Mailbox::new(name, address))
}

/// Backoff ladder between delivery attempts: 5, 10, 20 minutes.
fn retry_delay(retry_count: i32) -> chrono::Duration {
    let exponent = (retry_count.max(1) - 1).min(6) as u32;
    chrono::Duration::minutes(5i64 << exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn queued_message() -> EmailMessage {
        EmailMessage::queued(
            Some(Uuid::new_v4()),
            None,
            "ana@example.com".to_string(),
            "no-reply@tala.app".to_string(),
            "Tala".to_string(),
            "Your assessment is ready".to_string(),
            "<p>Hello Ana</p>".to_string(),
            "Hello Ana".to_string(),
            json!({}),
        )
    }

    #[test]
    fn test_build_message_multipart_when_text_body_present() {
        let email = build_message(&queued_message()).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Your assessment is ready"));
        assert!(raw.contains("To: ana@example.com"));
    }

    #[test]
    fn test_build_message_html_only_when_text_body_empty() {
        let mut message = queued_message();
        message.text_content = String::new();

        let email = build_message(&message).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("text/html"));
        assert!(!raw.contains("multipart/alternative"));
    }

    #[test]
    fn test_build_message_sets_reply_to_when_present() {
        let mut message = queued_message();
        message.reply_to = "hr@example.com".to_string();

        let email = build_message(&message).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Reply-To: hr@example.com"));
    }

    #[test]
    fn test_build_message_rejects_invalid_recipient() {
        let mut message = queued_message();
        message.to_email = "not-an-address".to_string();

        assert!(build_message(&message).is_err());
    }

    #[test]
    fn test_retry_delay_doubles_per_attempt() {
        assert_eq!(retry_delay(1), chrono::Duration::minutes(5));
        assert_eq!(retry_delay(2), chrono::Duration::minutes(10));
        assert_eq!(retry_delay(3), chrono::Duration::minutes(20));
        // A zero count is treated as the first failure
        assert_eq!(retry_delay(0), chrono::Duration::minutes(5));
    }

    #[test]
    fn test_failed_message_requeues_until_attempt_cap() {
        let mut message = queued_message();

        message.mark_sending();
        message.mark_failed("connection refused".to_string());
        assert!(message.can_retry());

        message.requeue(Utc::now() + retry_delay(message.retry_count));
        message.mark_sending();
        message.mark_failed("connection refused".to_string());
        assert!(message.can_retry());

        message.requeue(Utc::now() + retry_delay(message.retry_count));
        message.mark_sending();
        message.mark_failed("connection refused".to_string());
        assert!(!message.can_retry());
    }
}
