// ============================================================================
// Tala Infrastructure - PostgreSQL Email Repository
// File: crates/tala-infrastructure/src/database/postgres/email_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    BlacklistReason, EmailBlacklist, EmailKind, EmailMessage, EmailTemplate, Language,
    MessagePriority, MessageStatus,
};
use tala_core::error::DomainError;
use tala_core::repositories::EmailRepository;

/// Runs unscoped on purpose: template resolution and outbox delivery both
/// happen outside a tenant context (global default templates, the worker
/// sweep), and messages themselves may be tenantless (signup, password
/// reset).
pub struct PgEmailRepository {
    pool: PgPool,
}

impl PgEmailRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct TemplateRow {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub kind: String,
    pub language: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    pub from_email: Option<String>,
    pub from_name: String,
    pub reply_to: String,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<TemplateRow> for EmailTemplate {
    fn from(row: TemplateRow) -> Self {
        EmailTemplate {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            kind: EmailKind::from_str(&row.kind).unwrap_or(EmailKind::Custom),
            language: Language::from_str(&row.language).unwrap_or(Language::En),
            subject: row.subject,
            html_content: row.html_content,
            text_content: row.text_content,
            from_email: row.from_email,
            from_name: row.from_name,
            reply_to: row.reply_to,
            is_active: row.is_active,
            is_default: row.is_default,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,
    pub template_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub to_email: String,
    pub to_name: String,
    pub from_email: String,
    pub from_name: String,
    pub reply_to: String,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
    pub context_data: Value,
    pub status: String,
    pub priority: String,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub provider_message_id: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<MessageRow> for EmailMessage {
    fn from(row: MessageRow) -> Self {
        EmailMessage {
            id: row.id,
            organization_id: row.organization_id,
            template_id: row.template_id,
            user_id: row.user_id,
            to_email: row.to_email,
            to_name: row.to_name,
            from_email: row.from_email,
            from_name: row.from_name,
            reply_to: row.reply_to,
            subject: row.subject,
            html_content: row.html_content,
            text_content: row.text_content,
            context_data: row.context_data,
            status: MessageStatus::from_str(&row.status).unwrap_or(MessageStatus::Queued),
            priority: MessagePriority::from_str(&row.priority)
                .unwrap_or(MessagePriority::Normal),
            scheduled_for: row.scheduled_for,
            sent_at: row.sent_at,
            error_message: row.error_message,
            retry_count: row.retry_count,
            max_retries: row.max_retries,
            provider_message_id: row.provider_message_id,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct BlacklistRow {
    pub id: Uuid,
    pub email: String,
    pub reason_kind: String,
    pub reason: String,
    pub source_message_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<BlacklistRow> for EmailBlacklist {
    fn from(row: BlacklistRow) -> Self {
        EmailBlacklist {
            id: row.id,
            email: row.email,
            reason_kind: BlacklistReason::from_str(&row.reason_kind)
                .unwrap_or(BlacklistReason::Manual),
            reason: row.reason,
            source_message_id: row.source_message_id,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl EmailRepository for PgEmailRepository {
    async fn find_template(
        &self,
        organization_id: Option<Uuid>,
        kind: EmailKind,
        language: Language,
    ) -> Result<Option<EmailTemplate>, DomainError> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            FROM email_templates
            WHERE ((organization_id IS NULL AND $1::uuid IS NULL) OR organization_id = $1)
              AND kind = $2 AND language = $3 AND is_active
            ORDER BY is_default DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .bind(kind.as_str())
        .bind(language.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding email template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_template_by_id(
        &self,
        id: &Uuid,
    ) -> Result<Option<EmailTemplate>, DomainError> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            FROM email_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding email template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<EmailTemplate>, DomainError> {
        let rows: Vec<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            FROM email_templates
            WHERE organization_id = $1
            ORDER BY kind ASC, language ASC, name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing email templates: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<EmailTemplate, DomainError> {
        let row: TemplateRow = sqlx::query_as(
            r#"
            INSERT INTO email_templates (
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16)
            RETURNING
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            "#,
        )
        .bind(template.id)
        .bind(template.organization_id)
        .bind(&template.name)
        .bind(template.kind.as_str())
        .bind(template.language.as_str())
        .bind(&template.subject)
        .bind(&template.html_content)
        .bind(&template.text_content)
        .bind(&template.from_email)
        .bind(&template.from_name)
        .bind(&template.reply_to)
        .bind(template.is_active)
        .bind(template.is_default)
        .bind(template.created_at)
        .bind(template.created_by)
        .bind(template.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating email template: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::ValidationError(
                    "a default template for this kind and language already exists".into(),
                )
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        Ok(row.into())
    }

    async fn update_template(
        &self,
        template: &EmailTemplate,
    ) -> Result<EmailTemplate, DomainError> {
        let row: TemplateRow = sqlx::query_as(
            r#"
            UPDATE email_templates SET
                name = $2,
                subject = $3,
                html_content = $4,
                text_content = $5,
                from_email = $6,
                from_name = $7,
                reply_to = $8,
                is_active = $9,
                is_default = $10,
                modified_at = $11
            WHERE id = $1
            RETURNING
                id, organization_id, name, kind, language, subject, html_content,
                text_content, from_email, from_name, reply_to, is_active,
                is_default, created_at, created_by, modified_at
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.subject)
        .bind(&template.html_content)
        .bind(&template.text_content)
        .bind(&template.from_email)
        .bind(&template.from_name)
        .bind(&template.reply_to)
        .bind(template.is_active)
        .bind(template.is_default)
        .bind(template.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating email template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn enqueue(&self, message: &EmailMessage) -> Result<EmailMessage, DomainError> {
        info!("Queueing email to {}: {}", message.to_email, message.subject);

        let row: MessageRow = sqlx::query_as(
            r#"
            INSERT INTO email_messages (
                id, organization_id, template_id, user_id, to_email, to_name,
                from_email, from_name, reply_to, subject, html_content,
                text_content, context_data, status, priority, scheduled_for,
                sent_at, error_message, retry_count, max_retries,
                provider_message_id, created_at, created_by, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING
                id, organization_id, template_id, user_id, to_email, to_name,
                from_email, from_name, reply_to, subject, html_content,
                text_content, context_data, status, priority, scheduled_for,
                sent_at, error_message, retry_count, max_retries,
                provider_message_id, created_at, created_by, modified_at
            "#,
        )
        .bind(message.id)
        .bind(message.organization_id)
        .bind(message.template_id)
        .bind(message.user_id)
        .bind(&message.to_email)
        .bind(&message.to_name)
        .bind(&message.from_email)
        .bind(&message.from_name)
        .bind(&message.reply_to)
        .bind(&message.subject)
        .bind(&message.html_content)
        .bind(&message.text_content)
        .bind(&message.context_data)
        .bind(message.status.as_str())
        .bind(message.priority.as_str())
        .bind(message.scheduled_for)
        .bind(message.sent_at)
        .bind(&message.error_message)
        .bind(message.retry_count)
        .bind(message.max_retries)
        .bind(&message.provider_message_id)
        .bind(message.created_at)
        .bind(message.created_by)
        .bind(message.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error queueing email message: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn find_message(&self, id: &Uuid) -> Result<Option<EmailMessage>, DomainError> {
        let row: Option<MessageRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, template_id, user_id, to_email, to_name,
                from_email, from_name, reply_to, subject, html_content,
                text_content, context_data, status, priority, scheduled_for,
                sent_at, error_message, retry_count, max_retries,
                provider_message_id, created_at, created_by, modified_at
            FROM email_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding email message: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_message(
        &self,
        message: &EmailMessage,
    ) -> Result<EmailMessage, DomainError> {
        let row: MessageRow = sqlx::query_as(
            r#"
            UPDATE email_messages SET
                status = $2,
                scheduled_for = $3,
                sent_at = $4,
                error_message = $5,
                retry_count = $6,
                provider_message_id = $7,
                modified_at = $8
            WHERE id = $1
            RETURNING
                id, organization_id, template_id, user_id, to_email, to_name,
                from_email, from_name, reply_to, subject, html_content,
                text_content, context_data, status, priority, scheduled_for,
                sent_at, error_message, retry_count, max_retries,
                provider_message_id, created_at, created_by, modified_at
            "#,
        )
        .bind(message.id)
        .bind(message.status.as_str())
        .bind(message.scheduled_for)
        .bind(message.sent_at)
        .bind(&message.error_message)
        .bind(message.retry_count)
        .bind(&message.provider_message_id)
        .bind(message.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating email message: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn claim_due_messages(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<EmailMessage>, DomainError> {
        // SKIP LOCKED keeps concurrent workers from claiming the same rows.
        let rows: Vec<MessageRow> = sqlx::query_as(
            r#"
            UPDATE email_messages SET
                status = 'SENDING',
                modified_at = NOW()
            WHERE id IN (
                SELECT id FROM email_messages
                WHERE status = 'QUEUED' AND scheduled_for <= $1
                ORDER BY scheduled_for ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING
                id, organization_id, template_id, user_id, to_email, to_name,
                from_email, from_name, reply_to, subject, html_content,
                text_content, context_data, status, priority, scheduled_for,
                sent_at, error_message, retry_count, max_retries,
                provider_message_id, created_at, created_by, modified_at
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error claiming due email messages: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn is_blacklisted(&self, email: &str) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM email_blacklist
                WHERE LOWER(email) = LOWER($1) AND is_active
            )
            "#,
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error checking email blacklist: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(exists)
    }

    async fn add_to_blacklist(
        &self,
        entry: &EmailBlacklist,
    ) -> Result<EmailBlacklist, DomainError> {
        info!(
            "Blacklisting email address ({}): {}",
            entry.reason_kind.as_str(),
            entry.email
        );

        let row: BlacklistRow = sqlx::query_as(
            r#"
            INSERT INTO email_blacklist (
                id, email, reason_kind, reason, source_message_id, is_active,
                created_at, modified_at
            )
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8)
            ON CONFLICT (LOWER(email)) DO UPDATE SET
                is_active = TRUE,
                reason_kind = EXCLUDED.reason_kind,
                reason = EXCLUDED.reason,
                source_message_id = EXCLUDED.source_message_id,
                modified_at = NOW()
            RETURNING
                id, email, reason_kind, reason, source_message_id, is_active,
                created_at, modified_at
            "#,
        )
        .bind(entry.id)
        .bind(&entry.email)
        .bind(entry.reason_kind.as_str())
        .bind(&entry.reason)
        .bind(entry.source_message_id)
        .bind(entry.is_active)
        .bind(entry.created_at)
        .bind(entry.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error adding email to blacklist: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }
}
