//! Email repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{EmailBlacklist, EmailKind, EmailMessage, EmailTemplate, Language};
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailRepository: Send + Sync {
    // Templates
    /// Active template for `(org, kind, language)`. `organization_id` NULL
    /// looks up the global defaults.
    async fn find_template(
        &self,
        organization_id: Option<Uuid>,
        kind: EmailKind,
        language: Language,
    ) -> Result<Option<EmailTemplate>, DomainError>;
    async fn find_template_by_id(&self, id: &Uuid)
        -> Result<Option<EmailTemplate>, DomainError>;
    async fn list_templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<EmailTemplate>, DomainError>;
    async fn create_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<EmailTemplate, DomainError>;
    async fn update_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<EmailTemplate, DomainError>;

    // Outbox
    async fn enqueue(&self, message: &EmailMessage) -> Result<EmailMessage, DomainError>;
    async fn find_message(&self, id: &Uuid) -> Result<Option<EmailMessage>, DomainError>;
    async fn update_message(&self, message: &EmailMessage)
        -> Result<EmailMessage, DomainError>;
    /// Claims due QUEUED messages for delivery: marks them SENDING and
    /// returns them, oldest scheduled first.
    async fn claim_due_messages(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, DomainError>;

    // Blacklist
    async fn is_blacklisted(&self, email: &str) -> Result<bool, DomainError>;
    async fn add_to_blacklist(
        &self,
        entry: &EmailBlacklist,
    ) -> Result<EmailBlacklist, DomainError>;
}
