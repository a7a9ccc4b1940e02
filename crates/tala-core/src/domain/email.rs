// ============================================================================
// Tala Core - Email Entities
// File: crates/tala-core/src/domain/email.rs
// Description: Email templates, outbox messages and the blacklist
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tala_shared::constants::MAX_EMAIL_ATTEMPTS;
use uuid::Uuid;
use validator::Validate;

/// Template kind, one per platform notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmailKind {
    AssessmentInvitation,
    AssessmentReminder,
    AssessmentCompleted,
    PdiCreated,
    PdiApproved,
    PdiTaskDue,
    PdiTaskOverdue,
    OrganizationInvite,
    PasswordReset,
    Welcome,
    BillingInvoice,
    BillingPaymentFailed,
    BillingSubscriptionRenewed,
    RecruitingApplication,
    RecruitingInterview,
    RecruitingOffer,
    SystemNotification,
    Custom,
}

impl EmailKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::AssessmentInvitation => "ASSESSMENT_INVITATION",
            EmailKind::AssessmentReminder => "ASSESSMENT_REMINDER",
            EmailKind::AssessmentCompleted => "ASSESSMENT_COMPLETED",
            EmailKind::PdiCreated => "PDI_CREATED",
            EmailKind::PdiApproved => "PDI_APPROVED",
            EmailKind::PdiTaskDue => "PDI_TASK_DUE",
            EmailKind::PdiTaskOverdue => "PDI_TASK_OVERDUE",
            EmailKind::OrganizationInvite => "ORGANIZATION_INVITE",
            EmailKind::PasswordReset => "PASSWORD_RESET",
            EmailKind::Welcome => "WELCOME",
            EmailKind::BillingInvoice => "BILLING_INVOICE",
            EmailKind::BillingPaymentFailed => "BILLING_PAYMENT_FAILED",
            EmailKind::BillingSubscriptionRenewed => "BILLING_SUBSCRIPTION_RENEWED",
            EmailKind::RecruitingApplication => "RECRUITING_APPLICATION",
            EmailKind::RecruitingInterview => "RECRUITING_INTERVIEW",
            EmailKind::RecruitingOffer => "RECRUITING_OFFER",
            EmailKind::SystemNotification => "SYSTEM_NOTIFICATION",
            EmailKind::Custom => "CUSTOM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ASSESSMENT_INVITATION" => Some(EmailKind::AssessmentInvitation),
            "ASSESSMENT_REMINDER" => Some(EmailKind::AssessmentReminder),
            "ASSESSMENT_COMPLETED" => Some(EmailKind::AssessmentCompleted),
            "PDI_CREATED" => Some(EmailKind::PdiCreated),
            "PDI_APPROVED" => Some(EmailKind::PdiApproved),
            "PDI_TASK_DUE" => Some(EmailKind::PdiTaskDue),
            "PDI_TASK_OVERDUE" => Some(EmailKind::PdiTaskOverdue),
            "ORGANIZATION_INVITE" => Some(EmailKind::OrganizationInvite),
            "PASSWORD_RESET" => Some(EmailKind::PasswordReset),
            "WELCOME" => Some(EmailKind::Welcome),
            "BILLING_INVOICE" => Some(EmailKind::BillingInvoice),
            "BILLING_PAYMENT_FAILED" => Some(EmailKind::BillingPaymentFailed),
            "BILLING_SUBSCRIPTION_RENEWED" => Some(EmailKind::BillingSubscriptionRenewed),
            "RECRUITING_APPLICATION" => Some(EmailKind::RecruitingApplication),
            "RECRUITING_INTERVIEW" => Some(EmailKind::RecruitingInterview),
            "RECRUITING_OFFER" => Some(EmailKind::RecruitingOffer),
            "SYSTEM_NOTIFICATION" => Some(EmailKind::SystemNotification),
            "CUSTOM" => Some(EmailKind::Custom),
            _ => None,
        }
    }
}

/// Template language. Resolution falls back to English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "pt-br")]
    PtBr,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::PtBr => "pt-br",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "en" => Some(Language::En),
            "pt-br" => Some(Language::PtBr),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

/// Outbox message status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    Queued,
    Sending,
    Sent,
    Delivered,
    Failed,
    Bounced,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Queued => "QUEUED",
            MessageStatus::Sending => "SENDING",
            MessageStatus::Sent => "SENT",
            MessageStatus::Delivered => "DELIVERED",
            MessageStatus::Failed => "FAILED",
            MessageStatus::Bounced => "BOUNCED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(MessageStatus::Queued),
            "SENDING" => Some(MessageStatus::Sending),
            "SENT" => Some(MessageStatus::Sent),
            "DELIVERED" => Some(MessageStatus::Delivered),
            "FAILED" => Some(MessageStatus::Failed),
            "BOUNCED" => Some(MessageStatus::Bounced),
            _ => None,
        }
    }
}

/// Message priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl MessagePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagePriority::Low => "LOW",
            MessagePriority::Normal => "NORMAL",
            MessagePriority::High => "HIGH",
            MessagePriority::Urgent => "URGENT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(MessagePriority::Low),
            "NORMAL" => Some(MessagePriority::Normal),
            "HIGH" => Some(MessagePriority::High),
            "URGENT" => Some(MessagePriority::Urgent),
            _ => None,
        }
    }
}

/// Why an address is blacklisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlacklistReason {
    Bounce,
    Complaint,
    Manual,
    Unsubscribe,
}

impl BlacklistReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlacklistReason::Bounce => "BOUNCE",
            BlacklistReason::Complaint => "COMPLAINT",
            BlacklistReason::Manual => "MANUAL",
            BlacklistReason::Unsubscribe => "UNSUBSCRIBE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BOUNCE" => Some(BlacklistReason::Bounce),
            "COMPLAINT" => Some(BlacklistReason::Complaint),
            "MANUAL" => Some(BlacklistReason::Manual),
            "UNSUBSCRIBE" => Some(BlacklistReason::Unsubscribe),
            _ => None,
        }
    }
}

/// Handlebars template for one notification kind. `organization_id` is
/// NULL for the global defaults; `(org, kind, language, is_default)` is
/// unique.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailTemplate {
    pub id: Uuid,
    pub organization_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: EmailKind,
    pub language: Language,

    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    pub html_content: String,
    pub text_content: String,

    #[validate(email)]
    pub from_email: Option<String>,
    pub from_name: String,
    pub reply_to: String,

    pub is_active: bool,
    pub is_default: bool,

    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl EmailTemplate {
    /// From-address fallback chain: template, then the organization's
    /// contact email, then the platform default.
    pub fn effective_from_email(&self, org_email: Option<&str>, default: &str) -> String {
        if let Some(from) = self.from_email.as_deref().filter(|s| !s.is_empty()) {
            return from.to_string();
        }
        if let Some(email) = org_email.filter(|s| !s.is_empty()) {
            return email.to_string();
        }
        default.to_string()
    }

    pub fn effective_from_name(&self, org_name: Option<&str>, default: &str) -> String {
        if !self.from_name.is_empty() {
            return self.from_name.clone();
        }
        if let Some(name) = org_name.filter(|s| !s.is_empty()) {
            return name.to_string();
        }
        default.to_string()
    }
}

/// Outbox row; the worker delivers these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
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

    pub status: MessageStatus,
    pub priority: MessagePriority,
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

impl EmailMessage {
    #[allow(clippy::too_many_arguments)]
    pub fn queued(
        organization_id: Option<Uuid>,
        template_id: Option<Uuid>,
        to_email: String,
        from_email: String,
        from_name: String,
        subject: String,
        html_content: String,
        text_content: String,
        context_data: Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            template_id,
            user_id: None,
            to_email,
            to_name: String::new(),
            from_email,
            from_name,
            reply_to: String::new(),
            subject,
            html_content,
            text_content,
            context_data,
            status: MessageStatus::Queued,
            priority: MessagePriority::Normal,
            scheduled_for: now,
            sent_at: None,
            error_message: String::new(),
            retry_count: 0,
            max_retries: MAX_EMAIL_ATTEMPTS,
            provider_message_id: String::new(),
            created_at: now,
            created_by: None,
            modified_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == MessageStatus::Queued && self.scheduled_for <= now
    }

    pub fn mark_sending(&mut self) {
        self.status = MessageStatus::Sending;
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_sent(&mut self, provider_message_id: String) {
        self.status = MessageStatus::Sent;
        self.sent_at = Some(Utc::now());
        self.provider_message_id = provider_message_id;
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: String) {
        self.status = MessageStatus::Failed;
        self.error_message = error_message;
        self.retry_count += 1;
        self.modified_at = Some(Utc::now());
    }

    pub fn can_retry(&self) -> bool {
        self.status == MessageStatus::Failed && self.retry_count < self.max_retries
    }

    /// Re-queues a failed message for another delivery attempt.
    pub fn requeue(&mut self, scheduled_for: DateTime<Utc>) {
        self.status = MessageStatus::Queued;
        self.scheduled_for = scheduled_for;
        self.modified_at = Some(Utc::now());
    }
}

/// Suppressed address; queuing for one is refused. `email` is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailBlacklist {
    pub id: Uuid,
    pub email: String,
    pub reason_kind: BlacklistReason,
    pub reason: String,
    pub source_message_id: Option<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl EmailBlacklist {
    pub fn new(email: String, reason_kind: BlacklistReason, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_lowercase(),
            reason_kind,
            reason,
            source_message_id: None,
            is_active: true,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn template() -> EmailTemplate {
        EmailTemplate {
            id: Uuid::new_v4(),
            organization_id: None,
            name: "Default invite".into(),
            kind: EmailKind::AssessmentInvitation,
            language: Language::En,
            subject: "You are invited, {{user.first_name}}".into(),
            html_content: "<p>Start here: {{link}}</p>".into(),
            text_content: "Start here: {{link}}".into(),
            from_email: None,
            from_name: String::new(),
            reply_to: String::new(),
            is_active: true,
            is_default: true,
            created_at: Utc::now(),
            created_by: None,
            modified_at: None,
        }
    }

    #[test]
    fn test_from_address_fallback_chain() {
        let mut tpl = template();
        assert_eq!(
            tpl.effective_from_email(Some("hr@acme.test"), "noreply@tala.test"),
            "hr@acme.test"
        );
        assert_eq!(
            tpl.effective_from_email(None, "noreply@tala.test"),
            "noreply@tala.test"
        );
        tpl.from_email = Some("invites@acme.test".into());
        assert_eq!(
            tpl.effective_from_email(Some("hr@acme.test"), "noreply@tala.test"),
            "invites@acme.test"
        );

        assert_eq!(tpl.effective_from_name(Some("Acme"), "Tala"), "Acme");
        tpl.from_name = "Acme People Team".into();
        assert_eq!(tpl.effective_from_name(Some("Acme"), "Tala"), "Acme People Team");
    }

    #[test]
    fn test_message_lifecycle() {
        let mut msg = EmailMessage::queued(
            Some(Uuid::new_v4()),
            None,
            "person@acme.test".into(),
            "noreply@tala.test".into(),
            "Tala".into(),
            "Hello".into(),
            "<p>Hello</p>".into(),
            "Hello".into(),
            json!({}),
        );
        assert!(msg.is_due(Utc::now()));

        msg.mark_sending();
        assert_eq!(msg.status, MessageStatus::Sending);

        msg.mark_failed("smtp timeout".into());
        assert_eq!(msg.retry_count, 1);
        assert!(msg.can_retry());

        msg.mark_failed("smtp timeout".into());
        msg.mark_failed("smtp timeout".into());
        assert_eq!(msg.retry_count, 3);
        assert!(!msg.can_retry());
    }

    #[test]
    fn test_scheduled_message_not_due_early() {
        let mut msg = EmailMessage::queued(
            None,
            None,
            "person@acme.test".into(),
            "noreply@tala.test".into(),
            String::new(),
            "Later".into(),
            String::new(),
            String::new(),
            json!({}),
        );
        msg.scheduled_for = Utc::now() + chrono::Duration::hours(2);
        assert!(!msg.is_due(Utc::now()));
    }

    #[test]
    fn test_blacklist_lowercases_address() {
        let entry = EmailBlacklist::new(
            "Bounced@Example.COM".into(),
            BlacklistReason::Bounce,
            "hard bounce".into(),
        );
        assert_eq!(entry.email, "bounced@example.com");
        assert!(entry.is_active);
    }

    #[test]
    fn test_language_serde_tags() {
        assert_eq!(serde_json::to_string(&Language::PtBr).unwrap(), "\"pt-br\"");
        assert_eq!(Language::from_str("pt-br"), Some(Language::PtBr));
        assert_eq!(Language::default(), Language::En);
    }
}
