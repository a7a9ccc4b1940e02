// ============================================================================
// Tala Core - Email Service
// File: crates/tala-core/src/services/email_service.rs
// ============================================================================
//! Template resolution, rendering and outbox queuing

use std::sync::Arc;

use chrono::{Datelike, Utc};
use handlebars::Handlebars;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::domain::{EmailKind, EmailMessage, EmailTemplate, Language, Organization};
use crate::error::DomainError;
use crate::repositories::EmailRepository;

/// Queues templated emails for the worker to deliver.
pub struct EmailService<E: EmailRepository> {
    email_repo: Arc<E>,
    renderer: Handlebars<'static>,
    from_address: String,
    from_name: String,
    public_url: String,
}

impl<E: EmailRepository> EmailService<E> {
    pub fn new(
        email_repo: Arc<E>,
        from_address: String,
        from_name: String,
        public_url: String,
    ) -> Self {
        Self {
            email_repo,
            renderer: Handlebars::new(),
            from_address,
            from_name,
            public_url,
        }
    }

    /// Renders the template for `kind` and queues the message. The caller
    /// supplies the tenant organization when there is one so branded
    /// templates and from-address fallbacks apply.
    pub async fn queue(
        &self,
        kind: EmailKind,
        to_email: &str,
        context: Value,
        organization: Option<&Organization>,
        language: Language,
    ) -> Result<EmailMessage, DomainError> {
        // 1. Refuse blacklisted recipients
        if self.email_repo.is_blacklisted(to_email).await? {
            return Err(DomainError::RecipientBlacklisted(to_email.to_string()));
        }

        // 2. Resolve the template
        let org_id = organization.map(|o| o.id);
        let template = self.resolve_template(org_id, kind, language).await?;

        // 3. Render with the merged context
        let context = self.build_context(context, organization);
        let subject = self.render(&template.subject, &context)?;
        let html_content = self.render(&template.html_content, &context)?;
        let text_content = if template.text_content.is_empty() {
            String::new()
        } else {
            self.render(&template.text_content, &context)?
        };

        // 4. From-address fallbacks: template, organization, platform default
        let org_email = organization.and_then(|o| o.email.as_deref());
        let org_name = organization.map(|o| o.name.as_str());
        let from_email = template.effective_from_email(org_email, &self.from_address);
        let from_name = template.effective_from_name(org_name, &self.from_name);

        // 5. Queue
        let mut message = EmailMessage::queued(
            org_id,
            Some(template.id),
            to_email.to_lowercase(),
            from_email,
            from_name,
            subject,
            html_content,
            text_content,
            context,
        );
        message.reply_to = template.reply_to.clone();
        let message = self.email_repo.enqueue(&message).await?;

        info!(kind = kind.as_str(), to = to_email, "email queued");
        Ok(message)
    }

    /// Org-specific template first, then the global default, then the
    /// English global default.
    pub async fn resolve_template(
        &self,
        organization_id: Option<Uuid>,
        kind: EmailKind,
        language: Language,
    ) -> Result<EmailTemplate, DomainError> {
        if let Some(org_id) = organization_id {
            if let Some(template) = self
                .email_repo
                .find_template(Some(org_id), kind, language)
                .await?
            {
                return Ok(template);
            }
        }

        if let Some(template) = self.email_repo.find_template(None, kind, language).await? {
            return Ok(template);
        }

        if language != Language::En {
            if let Some(template) = self
                .email_repo
                .find_template(None, kind, Language::En)
                .await?
            {
                return Ok(template);
            }
        }

        Err(DomainError::EmailTemplateNotFound)
    }

    // ------------------------------------------------------------------
    // Template management
    // ------------------------------------------------------------------

    pub async fn templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<EmailTemplate>, DomainError> {
        self.email_repo.list_templates(organization_id).await
    }

    /// Global default templates are not editable through here, so a
    /// template belonging to another (or no) organization reads as
    /// missing.
    pub async fn get_template(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<EmailTemplate, DomainError> {
        let template = self
            .email_repo
            .find_template_by_id(id)
            .await?
            .ok_or(DomainError::EmailTemplateNotFound)?;
        if template.organization_id != Some(*organization_id) {
            return Err(DomainError::EmailTemplateNotFound);
        }
        Ok(template)
    }

    /// Rendering the new content against an empty context catches
    /// template syntax errors at save time instead of at send time.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_template(
        &self,
        organization_id: &Uuid,
        name: String,
        kind: EmailKind,
        language: Language,
        subject: String,
        html_content: String,
        text_content: String,
        created_by: Option<Uuid>,
    ) -> Result<EmailTemplate, DomainError> {
        self.check_syntax(&subject, &html_content, &text_content)?;
        let template = EmailTemplate {
            id: Uuid::new_v4(),
            organization_id: Some(*organization_id),
            name,
            kind,
            language,
            subject,
            html_content,
            text_content,
            from_email: None,
            from_name: String::new(),
            reply_to: String::new(),
            is_active: true,
            is_default: false,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
        };
        self.email_repo.create_template(&template).await
    }

    pub async fn update_template(
        &self,
        organization_id: &Uuid,
        template: &EmailTemplate,
    ) -> Result<EmailTemplate, DomainError> {
        self.get_template(organization_id, &template.id).await?;
        self.check_syntax(
            &template.subject,
            &template.html_content,
            &template.text_content,
        )?;
        self.email_repo.update_template(template).await
    }

    fn check_syntax(&self, subject: &str, html: &str, text: &str) -> Result<(), DomainError> {
        self.render(subject, &json!({}))?;
        self.render(html, &json!({}))?;
        if !text.is_empty() {
            self.render(text, &json!({}))?;
        }
        Ok(())
    }

    fn render(&self, template: &str, context: &Value) -> Result<String, DomainError> {
        self.renderer
            .render_template(template, context)
            .map_err(|e| DomainError::TemplateRenderError(e.to_string()))
    }

    /// Base context every template sees, merged under the caller's keys.
    fn build_context(&self, context: Value, organization: Option<&Organization>) -> Value {
        let mut base = json!({
            "site_name": self.from_name,
            "site_url": self.public_url,
            "current_year": Utc::now().year(),
        });
        if let Some(org) = organization {
            base["organization"] = json!({
                "name": org.name,
                "email": org.email,
                "website": org.website,
                "primary_color": org.primary_color,
            });
        }
        if let (Value::Object(base_map), Value::Object(extra)) = (&mut base, context) {
            for (key, value) in extra {
                base_map.insert(key, value);
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrgKind;
    use crate::repositories::email_repository::MockEmailRepository;
    use mockall::predicate::*;

    fn template(org: Option<Uuid>, language: Language) -> EmailTemplate {
        EmailTemplate {
            id: Uuid::new_v4(),
            organization_id: org,
            name: "Invite".into(),
            kind: EmailKind::AssessmentInvitation,
            language,
            subject: "Hello {{user_name}}".into(),
            html_content: "<a href=\"{{link}}\">Start</a>".into(),
            text_content: "Start: {{link}}".into(),
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

    fn service(repo: MockEmailRepository) -> EmailService<MockEmailRepository> {
        EmailService::new(
            Arc::new(repo),
            "noreply@tala.test".into(),
            "Tala".into(),
            "https://tala.test".into(),
        )
    }

    #[tokio::test]
    async fn test_queue_renders_and_enqueues() {
        let mut repo = MockEmailRepository::new();
        repo.expect_is_blacklisted().returning(|_| Ok(false));
        let org_id = Uuid::new_v4();
        repo.expect_find_template()
            .with(eq(Some(org_id)), eq(EmailKind::AssessmentInvitation), eq(Language::En))
            .returning(move |_, _, _| Ok(Some(template(Some(org_id), Language::En))));
        repo.expect_enqueue().returning(|m| Ok(m.clone()));

        let mut org = Organization::new("Acme".into(), OrgKind::Company, None, None).unwrap();
        org.id = org_id;

        let message = service(repo)
            .queue(
                EmailKind::AssessmentInvitation,
                "Person@Acme.test",
                json!({"user_name": "Dana", "link": "https://tala.test/a/t0k"}),
                Some(&org),
                Language::En,
            )
            .await
            .unwrap();

        assert_eq!(message.to_email, "person@acme.test");
        assert_eq!(message.subject, "Hello Dana");
        assert!(message.html_content.contains("https://tala.test/a/t0k"));
        assert_eq!(message.from_name, "Acme");
        assert_eq!(message.from_email, "noreply@tala.test");
    }

    #[tokio::test]
    async fn test_queue_refuses_blacklisted() {
        let mut repo = MockEmailRepository::new();
        repo.expect_is_blacklisted().returning(|_| Ok(true));

        let err = service(repo)
            .queue(
                EmailKind::Welcome,
                "bounced@example.com",
                json!({}),
                None,
                Language::En,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::RecipientBlacklisted(_)));
    }

    #[tokio::test]
    async fn test_resolution_falls_back_to_english_global() {
        let mut repo = MockEmailRepository::new();
        let org_id = Uuid::new_v4();
        // No org template, no pt-br global, then the English global hits.
        repo.expect_find_template()
            .with(eq(Some(org_id)), eq(EmailKind::Welcome), eq(Language::PtBr))
            .returning(|_, _, _| Ok(None));
        repo.expect_find_template()
            .with(eq(None), eq(EmailKind::Welcome), eq(Language::PtBr))
            .returning(|_, _, _| Ok(None));
        repo.expect_find_template()
            .with(eq(None), eq(EmailKind::Welcome), eq(Language::En))
            .returning(|_, _, _| Ok(Some(template(None, Language::En))));

        let resolved = service(repo)
            .resolve_template(Some(org_id), EmailKind::Welcome, Language::PtBr)
            .await
            .unwrap();
        assert_eq!(resolved.language, Language::En);
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let mut repo = MockEmailRepository::new();
        repo.expect_find_template().returning(|_, _, _| Ok(None));

        let err = service(repo)
            .resolve_template(None, EmailKind::Custom, Language::En)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailTemplateNotFound));
    }

    #[tokio::test]
    async fn test_create_template_rejects_broken_syntax() {
        let repo = MockEmailRepository::new();

        let err = service(repo)
            .create_template(
                &Uuid::new_v4(),
                "Broken".into(),
                EmailKind::Custom,
                Language::En,
                "Hi {{user_name".into(),
                "<p>ok</p>".into(),
                String::new(),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::TemplateRenderError(_)));
    }

    #[tokio::test]
    async fn test_get_template_hides_other_organizations() {
        let mut repo = MockEmailRepository::new();
        let other_org = Uuid::new_v4();
        repo.expect_find_template_by_id()
            .returning(move |_| Ok(Some(template(Some(other_org), Language::En))));

        let err = service(repo)
            .get_template(&Uuid::new_v4(), &Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EmailTemplateNotFound));
    }
}
