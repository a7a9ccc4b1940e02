// ============================================================================
// Tala Core - Assessment Service
// File: crates/tala-core/src/services/assessment_service.rs
// ============================================================================
//! Assessment definitions, invitations, token-based taking and scoring

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tala_security::token::generate_token;
use tala_shared::constants::ACCESS_TOKEN_LENGTH;
use tala_shared::types::Pagination;

use crate::domain::{
    score_responses, AssessmentDefinition, AssessmentInstance, EmailKind, Framework,
    InstanceStatus, Language, Organization, Question, QuestionKind, QuestionOption, Response,
    ScoreProfile, UsageType, User,
};
use crate::error::DomainError;
use crate::repositories::{
    AssessmentRepository, BillingRepository, EmailRepository, OrganizationRepository,
    PdiRepository, UserRepository,
};
use crate::services::{BillingService, EmailService, PdiService};

/// One submitted answer, keyed by question. Which value field applies
/// depends on the question kind.
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub numeric_value: Option<i32>,
    pub text_value: Option<String>,
    pub selected_option_id: Option<Uuid>,
}

/// Question with its answer options, loaded for choice kinds only.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionBlock {
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// Everything a taker needs to render and resume an open instance.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentForm {
    pub instance: AssessmentInstance,
    pub definition: AssessmentDefinition,
    pub questions: Vec<QuestionBlock>,
    pub responses: Vec<Response>,
}

/// Read-only view of a completed instance. The profile is missing only
/// for rows completed before scoring existed.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResults {
    pub instance: AssessmentInstance,
    pub definition: AssessmentDefinition,
    pub profile: Option<ScoreProfile>,
    pub responses: Vec<Response>,
}

/// Outcome of opening an invitation link.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TokenAccess {
    Form(AssessmentForm),
    Results(AssessmentResults),
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteOutcome {
    pub invited: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub instance: AssessmentInstance,
    pub answered: usize,
    pub total: usize,
    pub completed: bool,
}

pub struct AssessmentService<A, B, O, P, U, E>
where
    A: AssessmentRepository,
    B: BillingRepository,
    O: OrganizationRepository,
    P: PdiRepository,
    U: UserRepository,
    E: EmailRepository,
{
    assessment_repo: Arc<A>,
    org_repo: Arc<O>,
    user_repo: Arc<U>,
    billing: Arc<BillingService<B, O>>,
    pdi: Arc<PdiService<P, U, E>>,
    emails: Arc<EmailService<E>>,
}

impl<A, B, O, P, U, E> AssessmentService<A, B, O, P, U, E>
where
    A: AssessmentRepository,
    B: BillingRepository,
    O: OrganizationRepository,
    P: PdiRepository,
    U: UserRepository,
    E: EmailRepository,
{
    pub fn new(
        assessment_repo: Arc<A>,
        org_repo: Arc<O>,
        user_repo: Arc<U>,
        billing: Arc<BillingService<B, O>>,
        pdi: Arc<PdiService<P, U, E>>,
        emails: Arc<EmailService<E>>,
    ) -> Self {
        Self {
            assessment_repo,
            org_repo,
            user_repo,
            billing,
            pdi,
            emails,
        }
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    pub async fn create_definition(
        &self,
        organization_id: &Uuid,
        name: &str,
        framework: Framework,
        created_by: Option<Uuid>,
    ) -> Result<AssessmentDefinition, DomainError> {
        let definition =
            AssessmentDefinition::new(*organization_id, name.to_string(), framework, created_by)
                .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let definition = self.assessment_repo.create_definition(&definition).await?;
        info!(
            "Assessment definition created: {} ({}) in org {}",
            definition.id,
            definition.framework.as_str(),
            organization_id
        );
        Ok(definition)
    }

    pub async fn get_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<AssessmentDefinition, DomainError> {
        self.assessment_repo
            .find_definition(organization_id, id)
            .await?
            .ok_or(DomainError::AssessmentNotFound)
    }

    pub async fn list_definitions(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentDefinition>, DomainError> {
        self.assessment_repo
            .list_definitions(organization_id, pagination.clamped())
            .await
    }

    pub async fn update_definition(
        &self,
        organization_id: &Uuid,
        definition: &AssessmentDefinition,
    ) -> Result<AssessmentDefinition, DomainError> {
        self.get_definition(organization_id, &definition.id).await?;
        self.assessment_repo.update_definition(definition).await
    }

    /// Definitions without at least one active question stay in DRAFT.
    pub async fn activate_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<AssessmentDefinition, DomainError> {
        let mut definition = self.get_definition(organization_id, id).await?;
        let questions = self.assessment_repo.list_questions(id).await?;
        if questions.is_empty() {
            return Err(DomainError::ValidationError(
                "assessment has no active questions".to_string(),
            ));
        }
        definition.activate();
        self.assessment_repo.update_definition(&definition).await
    }

    pub async fn archive_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<AssessmentDefinition, DomainError> {
        let mut definition = self.get_definition(organization_id, id).await?;
        definition.archive();
        self.assessment_repo.update_definition(&definition).await
    }

    pub async fn delete_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<(), DomainError> {
        let mut definition = self.get_definition(organization_id, id).await?;
        definition.soft_delete();
        self.assessment_repo.update_definition(&definition).await?;
        info!("Assessment definition removed: {}", id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------

    pub async fn add_question(
        &self,
        organization_id: &Uuid,
        assessment_id: &Uuid,
        text: &str,
        kind: QuestionKind,
        order: i32,
        dimension: String,
    ) -> Result<Question, DomainError> {
        self.get_definition(organization_id, assessment_id).await?;
        let question = Question::new(*assessment_id, text.to_string(), kind, order, dimension)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.assessment_repo.create_question(&question).await
    }

    pub async fn update_question(
        &self,
        organization_id: &Uuid,
        question: &Question,
    ) -> Result<Question, DomainError> {
        self.get_definition(organization_id, &question.assessment_id)
            .await?;
        self.assessment_repo
            .find_question(&question.assessment_id, &question.id)
            .await?
            .ok_or(DomainError::QuestionNotFound)?;
        self.assessment_repo.update_question(question).await
    }

    pub async fn add_option(
        &self,
        organization_id: &Uuid,
        assessment_id: &Uuid,
        question_id: &Uuid,
        text: &str,
        value: i32,
        order: i32,
    ) -> Result<QuestionOption, DomainError> {
        self.get_definition(organization_id, assessment_id).await?;
        self.assessment_repo
            .find_question(assessment_id, question_id)
            .await?
            .ok_or(DomainError::QuestionNotFound)?;
        let option = QuestionOption::new(*question_id, text.to_string(), value, order)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.assessment_repo.create_option(&option).await
    }

    pub async fn questions(
        &self,
        organization_id: &Uuid,
        assessment_id: &Uuid,
    ) -> Result<Vec<QuestionBlock>, DomainError> {
        self.get_definition(organization_id, assessment_id).await?;
        let questions = self.assessment_repo.list_questions(assessment_id).await?;
        self.with_options(questions).await
    }

    // ------------------------------------------------------------------
    // Invitations
    // ------------------------------------------------------------------

    /// Creates one instance per user who does not already hold an open
    /// one, bills the ASSESSMENTS meter for the batch up front, and
    /// queues an invitation email per instance.
    pub async fn invite(
        &self,
        organization_id: &Uuid,
        assessment_id: &Uuid,
        user_ids: &[Uuid],
        expires_in_days: i64,
        invited_by: &User,
        message: String,
    ) -> Result<InviteOutcome, DomainError> {
        // 1. Only ACTIVE definitions accept invitations
        let definition = self.get_definition(organization_id, assessment_id).await?;
        if !definition.is_active() {
            return Err(DomainError::AssessmentNotActive);
        }

        // 2. Drop unknown users and users with an open instance
        let mut eligible = Vec::new();
        let mut skipped = 0u32;
        for user_id in user_ids {
            let Some(user) = self.user_repo.find_by_id(user_id).await? else {
                warn!("Skipping assessment invite for unknown user {}", user_id);
                skipped += 1;
                continue;
            };
            let open = self
                .assessment_repo
                .find_open_instance_for_user(assessment_id, user_id)
                .await?;
            if open.is_some() {
                skipped += 1;
                continue;
            }
            eligible.push(user);
        }
        if eligible.is_empty() {
            return Ok(InviteOutcome { invited: 0, skipped });
        }

        // 3. Bill the whole batch before creating anything; orgs at their
        //    plan limit get the overage error here
        self.billing
            .increment_usage(
                organization_id,
                UsageType::Assessments,
                eligible.len() as i64,
            )
            .await?;

        // 4. Create instances and queue the invitation emails
        let organization = self.organization(organization_id).await;
        let expires_at = Utc::now() + Duration::days(expires_in_days);
        let mut invited = 0u32;
        for user in eligible {
            let instance = AssessmentInstance::new(
                *organization_id,
                *assessment_id,
                user.id,
                generate_token(ACCESS_TOKEN_LENGTH),
                Some(invited_by.id),
                Some(expires_at),
            );
            let instance = self.assessment_repo.create_instance(&instance).await?;
            invited += 1;

            let context = json!({
                "user_name": user.full_name(),
                "assessment_name": definition.name,
                "assessment_token": instance.token,
                "invited_by": invited_by.full_name(),
                "expires_at": expires_at.to_rfc3339(),
                "estimated_duration": definition.estimated_duration,
                "message": message,
            });
            if let Err(e) = self
                .emails
                .queue(
                    EmailKind::AssessmentInvitation,
                    &user.email,
                    context,
                    organization.as_ref(),
                    Language::from_str(&user.language).unwrap_or(Language::En),
                )
                .await
            {
                warn!("Failed to queue assessment invitation email: {}", e);
            }
        }

        info!(
            "Invited {} of {} users to assessment {} ({} skipped)",
            invited,
            user_ids.len(),
            assessment_id,
            skipped
        );
        Ok(InviteOutcome { invited, skipped })
    }

    pub async fn get_instance(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<AssessmentInstance, DomainError> {
        self.assessment_repo
            .find_instance(organization_id, id)
            .await?
            .ok_or(DomainError::InstanceNotFound)
    }

    pub async fn list_instances(
        &self,
        organization_id: &Uuid,
        assessment_id: Option<Uuid>,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentInstance>, DomainError> {
        self.assessment_repo
            .list_instances(
                organization_id,
                assessment_id,
                user_id,
                pagination.clamped(),
            )
            .await
    }

    pub async fn cancel_instance(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<AssessmentInstance, DomainError> {
        let mut instance = self.get_instance(organization_id, id).await?;
        if instance.is_completed() {
            return Err(DomainError::InstanceAlreadyCompleted);
        }
        instance.cancel();
        self.assessment_repo.update_instance(&instance).await
    }

    /// Flips open instances past their deadline to EXPIRED, for the
    /// scheduler.
    pub async fn expire_overdue(&self) -> Result<u64, DomainError> {
        self.assessment_repo.expire_overdue_instances().await
    }

    // ------------------------------------------------------------------
    // Token access
    // ------------------------------------------------------------------

    /// Resolves an invitation link. Completed instances return their
    /// results; the first open access moves INVITED to STARTED.
    pub async fn get_by_token(&self, token: &str) -> Result<TokenAccess, DomainError> {
        let mut instance = self.open_instance(token).await?;
        if instance.is_completed() {
            return Ok(TokenAccess::Results(self.results_for(instance).await?));
        }
        if instance.status == InstanceStatus::Invited {
            instance.mark_started();
            instance = self.assessment_repo.update_instance(&instance).await?;
        }
        Ok(TokenAccess::Form(self.form_for(instance).await?))
    }

    /// Upserts the submitted answers and recomputes progress. Once
    /// every active question is answered the instance completes, scores
    /// are calculated and the profile is stored atomically with it.
    pub async fn submit_responses(
        &self,
        token: &str,
        answers: &[AnswerInput],
    ) -> Result<SubmissionOutcome, DomainError> {
        let mut instance = self.open_instance(token).await?;
        if instance.is_completed() {
            return Err(DomainError::InstanceAlreadyCompleted);
        }

        let definition = self
            .assessment_repo
            .find_definition(&instance.organization_id, &instance.assessment_id)
            .await?
            .ok_or(DomainError::AssessmentNotFound)?;
        let questions = self
            .assessment_repo
            .list_questions(&instance.assessment_id)
            .await?;

        // 1. Upsert each answer with per-kind validation
        for answer in answers {
            let question = questions
                .iter()
                .find(|q| q.id == answer.question_id)
                .ok_or(DomainError::QuestionNotFound)?;
            let response = self.build_response(&instance, question, answer).await?;
            self.assessment_repo.upsert_response(&response).await?;
        }

        // 2. Recompute progress over active questions
        let answered = self.assessment_repo.count_responses(&instance.id).await? as usize;
        let total = questions.len();
        instance.update_progress(answered, total);

        // 3. Complete and score when nothing is left to answer
        if total > 0 && answered >= total {
            let responses = self.assessment_repo.list_responses(&instance.id).await?;
            let breakdown = score_responses(&questions, &responses);
            instance.complete(breakdown.dimensions.clone(), breakdown.percentiles.clone());
            let profile = ScoreProfile::new(
                instance.organization_id,
                instance.id,
                breakdown.dimensions,
                breakdown.percentiles,
            );
            self.assessment_repo
                .complete_instance(&instance, &profile)
                .await?;
            info!(
                "Assessment instance {} completed with {} scored dimensions",
                instance.id,
                profile.dimension_scores.len()
            );
            self.on_completed(&instance, &definition, &profile).await;
            return Ok(SubmissionOutcome {
                instance,
                answered,
                total,
                completed: true,
            });
        }

        instance.mark_in_progress();
        let instance = self.assessment_repo.update_instance(&instance).await?;
        Ok(SubmissionOutcome {
            instance,
            answered,
            total,
            completed: false,
        })
    }

    /// Results for reviewers, by instance id instead of token.
    pub async fn results(
        &self,
        organization_id: &Uuid,
        instance_id: &Uuid,
    ) -> Result<AssessmentResults, DomainError> {
        let instance = self.get_instance(organization_id, instance_id).await?;
        if !instance.is_completed() {
            return Err(DomainError::InstanceNotCompleted);
        }
        self.results_for(instance).await
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Looks the instance up by token and handles the lapsed cases:
    /// cancelled links read as gone, lapsed deadlines flip to EXPIRED.
    async fn open_instance(&self, token: &str) -> Result<AssessmentInstance, DomainError> {
        let mut instance = self
            .assessment_repo
            .find_instance_by_token(token)
            .await?
            .ok_or(DomainError::InstanceNotFound)?;
        match instance.status {
            InstanceStatus::Cancelled => return Err(DomainError::InstanceNotFound),
            InstanceStatus::Expired => return Err(DomainError::InstanceExpired),
            _ => {}
        }
        if !instance.is_completed() && instance.is_expired() {
            instance.mark_expired();
            self.assessment_repo.update_instance(&instance).await?;
            return Err(DomainError::InstanceExpired);
        }
        Ok(instance)
    }

    async fn build_response(
        &self,
        instance: &AssessmentInstance,
        question: &Question,
        answer: &AnswerInput,
    ) -> Result<Response, DomainError> {
        match question.kind {
            QuestionKind::Likert5 | QuestionKind::Likert7 => {
                let value = answer.numeric_value.ok_or_else(|| {
                    DomainError::InvalidResponse(format!(
                        "question {} expects a numeric answer",
                        question.id
                    ))
                })?;
                let max = question.kind.scale_max().unwrap_or(0);
                if value < 1 || value > max {
                    return Err(DomainError::InvalidResponse(format!(
                        "value {} is outside the {} scale",
                        value,
                        question.kind.as_str()
                    )));
                }
                Ok(Response::new(
                    instance.id,
                    question.id,
                    Some(value),
                    String::new(),
                    None,
                ))
            }
            QuestionKind::MultipleChoice | QuestionKind::ForcedChoice => {
                let option_id = answer.selected_option_id.ok_or_else(|| {
                    DomainError::InvalidResponse(format!(
                        "question {} expects a selected option",
                        question.id
                    ))
                })?;
                let options = self.assessment_repo.list_options(&question.id).await?;
                let option = options
                    .iter()
                    .find(|o| o.id == option_id)
                    .ok_or_else(|| {
                        DomainError::InvalidResponse(
                            "selected option does not belong to the question".to_string(),
                        )
                    })?;
                Ok(Response::new(
                    instance.id,
                    question.id,
                    Some(option.value),
                    String::new(),
                    Some(option.id),
                ))
            }
            QuestionKind::Ranking => {
                let value = answer.numeric_value.ok_or_else(|| {
                    DomainError::InvalidResponse(format!(
                        "question {} expects a rank",
                        question.id
                    ))
                })?;
                if value < 1 {
                    return Err(DomainError::InvalidResponse(
                        "rank must be 1 or higher".to_string(),
                    ));
                }
                Ok(Response::new(
                    instance.id,
                    question.id,
                    Some(value),
                    String::new(),
                    None,
                ))
            }
            QuestionKind::Text => {
                let text = answer.text_value.clone().unwrap_or_default();
                if question.required && text.trim().is_empty() {
                    return Err(DomainError::InvalidResponse(format!(
                        "question {} requires an answer",
                        question.id
                    )));
                }
                Ok(Response::new(instance.id, question.id, None, text, None))
            }
        }
    }

    async fn with_options(
        &self,
        questions: Vec<Question>,
    ) -> Result<Vec<QuestionBlock>, DomainError> {
        let mut blocks = Vec::with_capacity(questions.len());
        for question in questions {
            let options = match question.kind {
                QuestionKind::MultipleChoice
                | QuestionKind::ForcedChoice
                | QuestionKind::Ranking => {
                    self.assessment_repo.list_options(&question.id).await?
                }
                _ => Vec::new(),
            };
            blocks.push(QuestionBlock { question, options });
        }
        Ok(blocks)
    }

    async fn form_for(
        &self,
        instance: AssessmentInstance,
    ) -> Result<AssessmentForm, DomainError> {
        let definition = self
            .assessment_repo
            .find_definition(&instance.organization_id, &instance.assessment_id)
            .await?
            .ok_or(DomainError::AssessmentNotFound)?;
        let questions = self
            .assessment_repo
            .list_questions(&instance.assessment_id)
            .await?;
        let questions = self.with_options(questions).await?;
        let responses = self.assessment_repo.list_responses(&instance.id).await?;
        Ok(AssessmentForm {
            instance,
            definition,
            questions,
            responses,
        })
    }

    async fn results_for(
        &self,
        instance: AssessmentInstance,
    ) -> Result<AssessmentResults, DomainError> {
        let definition = self
            .assessment_repo
            .find_definition(&instance.organization_id, &instance.assessment_id)
            .await?
            .ok_or(DomainError::AssessmentNotFound)?;
        let profile = self
            .assessment_repo
            .find_profile_by_instance(&instance.id)
            .await?;
        let responses = self.assessment_repo.list_responses(&instance.id).await?;
        Ok(AssessmentResults {
            instance,
            definition,
            profile,
            responses,
        })
    }

    /// Completion side effects, all best effort: the completion email
    /// and PDI auto-generation.
    async fn on_completed(
        &self,
        instance: &AssessmentInstance,
        definition: &AssessmentDefinition,
        profile: &ScoreProfile,
    ) {
        let organization = self.organization(&instance.organization_id).await;

        match self.user_repo.find_by_id(&instance.user_id).await {
            Ok(Some(user)) => {
                let context = json!({
                    "user_name": user.full_name(),
                    "assessment_name": definition.name,
                    "completed_at": instance
                        .completed_at
                        .map(|at| at.to_rfc3339())
                        .unwrap_or_default(),
                    "results_token": instance.token,
                });
                if let Err(e) = self
                    .emails
                    .queue(
                        EmailKind::AssessmentCompleted,
                        &user.email,
                        context,
                        organization.as_ref(),
                        Language::from_str(&user.language).unwrap_or(Language::En),
                    )
                    .await
                {
                    warn!("Failed to queue assessment completion email: {}", e);
                }
            }
            Ok(None) => warn!("Instance {} has no user record", instance.id),
            Err(e) => warn!("User lookup failed for completion email: {}", e),
        }

        match self
            .pdi
            .generate_for_completion(
                instance,
                &definition.name,
                definition.framework,
                profile,
                organization.as_ref(),
            )
            .await
        {
            Ok(0) => {}
            Ok(generated) => info!(
                "Auto-generated {} development plan(s) from instance {}",
                generated, instance.id
            ),
            Err(e) => warn!(
                "Development plan generation failed for instance {}: {}",
                instance.id, e
            ),
        }
    }

    async fn organization(&self, organization_id: &Uuid) -> Option<Organization> {
        match self.org_repo.find_by_id(organization_id).await {
            Ok(organization) => organization,
            Err(e) => {
                warn!("Organization lookup failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BillingCycle, PaymentProvider, Plan, PlanTier, Subscription, UsageMeter};
    use crate::repositories::assessment_repository::MockAssessmentRepository;
    use crate::repositories::billing_repository::MockBillingRepository;
    use crate::repositories::email_repository::MockEmailRepository;
    use crate::repositories::organization_repository::MockOrganizationRepository;
    use crate::repositories::pdi_repository::MockPdiRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use rust_decimal::Decimal;

    type TestService = AssessmentService<
        MockAssessmentRepository,
        MockBillingRepository,
        MockOrganizationRepository,
        MockPdiRepository,
        MockUserRepository,
        MockEmailRepository,
    >;

    fn service_with(
        assessment_repo: MockAssessmentRepository,
        billing_repo: MockBillingRepository,
        pdi_repo: MockPdiRepository,
        user_repo: MockUserRepository,
    ) -> TestService {
        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_by_id().returning(|_| Ok(None));
        let org_repo = Arc::new(org_repo);
        let user_repo = Arc::new(user_repo);

        let mut email_repo = MockEmailRepository::new();
        email_repo.expect_is_blacklisted().returning(|_| Ok(false));
        email_repo
            .expect_find_template()
            .returning(|_, _, _| Ok(None));
        email_repo.expect_enqueue().returning(|m| Ok(m.clone()));
        let emails = Arc::new(EmailService::new(
            Arc::new(email_repo),
            "noreply@tala.test".into(),
            "Tala".into(),
            "https://tala.test".into(),
        ));

        let billing = Arc::new(BillingService::new(
            Arc::new(billing_repo),
            Arc::clone(&org_repo),
        ));
        let pdi = Arc::new(PdiService::new(
            Arc::new(pdi_repo),
            Arc::clone(&user_repo),
            Arc::clone(&emails),
        ));
        AssessmentService::new(
            Arc::new(assessment_repo),
            org_repo,
            user_repo,
            billing,
            pdi,
            emails,
        )
    }

    fn active_definition(organization_id: Uuid) -> AssessmentDefinition {
        let mut definition = AssessmentDefinition::new(
            organization_id,
            "Big Five".into(),
            Framework::BigFive,
            None,
        )
        .unwrap();
        definition.activate();
        definition
    }

    fn likert_question(assessment_id: Uuid, dimension: &str, order: i32) -> Question {
        Question::new(
            assessment_id,
            "How often?".into(),
            QuestionKind::Likert5,
            order,
            dimension.to_string(),
        )
        .unwrap()
    }

    fn user(first_name: &str) -> User {
        User::new(
            format!("{}@tala.test", first_name.to_lowercase()),
            "hash".into(),
            first_name.into(),
            "Tester".into(),
        )
        .unwrap()
    }

    fn metered_billing(org_id: Uuid, expected_amount: i64) -> MockBillingRepository {
        let plan = Plan {
            id: Uuid::new_v4(),
            name: "Professional".into(),
            description: String::new(),
            tier: PlanTier::Professional,
            price_monthly: Decimal::new(9900, 2),
            price_quarterly: Decimal::new(26700, 2),
            price_yearly: Decimal::new(95000, 2),
            currency: "USD".into(),
            max_assessments_per_month: 100,
            max_team_members: 25,
            max_storage_gb: 10,
            includes_pdi: true,
            includes_recruiting: true,
            includes_advanced_reports: true,
            includes_api_access: false,
            trial_days: 0,
            paypal_plan_id_monthly: String::new(),
            paypal_plan_id_quarterly: String::new(),
            paypal_plan_id_yearly: String::new(),
            stripe_price_id_monthly: String::new(),
            stripe_price_id_quarterly: String::new(),
            stripe_price_id_yearly: String::new(),
            is_active: true,
            is_public: true,
            sort_order: 1,
            created_at: Utc::now(),
            modified_at: None,
        };
        let subscription = Subscription::new(
            org_id,
            &plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            Decimal::new(9900, 2),
        );
        let meter = UsageMeter::new(
            org_id,
            subscription.id,
            UsageType::Assessments,
            100,
            subscription.current_period_start,
            subscription.current_period_end,
        );

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_subscription_for_org()
            .returning(move |_| Ok(Some(subscription.clone())));
        billing_repo
            .expect_find_current_meter()
            .returning(move |_, _, _| Ok(Some(meter.clone())));
        billing_repo
            .expect_update_meter()
            .withf(move |m| m.current_usage == expected_amount)
            .returning(|m| Ok(m.clone()));
        billing_repo
    }

    #[tokio::test]
    async fn test_invite_skips_open_instances_and_meters_rest() {
        let org_id = Uuid::new_v4();
        let definition = active_definition(org_id);
        let assessment_id = definition.id;
        let alice = user("Alice");
        let bob = user("Bob");
        let alice_id = alice.id;
        let bob_id = bob.id;

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(definition.clone())));
        let open = AssessmentInstance::new(
            org_id,
            assessment_id,
            alice_id,
            "open".into(),
            None,
            None,
        );
        assessment_repo
            .expect_find_open_instance_for_user()
            .returning(move |_, user_id| {
                Ok(if *user_id == alice_id {
                    Some(open.clone())
                } else {
                    None
                })
            });
        assessment_repo
            .expect_create_instance()
            .withf(move |i| {
                i.user_id == bob_id
                    && i.status == InstanceStatus::Invited
                    && !i.token.is_empty()
                    && i.expires_at.is_some()
            })
            .returning(|i| Ok(i.clone()));

        let mut user_repo = MockUserRepository::new();
        let users = vec![alice.clone(), bob.clone()];
        user_repo.expect_find_by_id().returning(move |id| {
            Ok(users.iter().find(|u| u.id == *id).cloned())
        });

        let service = service_with(
            assessment_repo,
            metered_billing(org_id, 1),
            MockPdiRepository::new(),
            user_repo,
        );
        let inviter = user("Helen");
        let outcome = service
            .invite(
                &org_id,
                &assessment_id,
                &[alice_id, bob_id],
                7,
                &inviter,
                String::new(),
            )
            .await
            .unwrap();
        assert_eq!(outcome.invited, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[tokio::test]
    async fn test_invite_requires_active_definition() {
        let org_id = Uuid::new_v4();
        let draft = AssessmentDefinition::new(
            org_id,
            "Draft assessment".into(),
            Framework::Disc,
            None,
        )
        .unwrap();
        let assessment_id = draft.id;

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(draft.clone())));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let err = service
            .invite(
                &org_id,
                &assessment_id,
                &[Uuid::new_v4()],
                7,
                &user("Helen"),
                String::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AssessmentNotActive));
    }

    #[tokio::test]
    async fn test_get_by_token_marks_first_access_started() {
        let org_id = Uuid::new_v4();
        let definition = active_definition(org_id);
        let question = likert_question(definition.id, "openness", 1);
        let instance = AssessmentInstance::new(
            org_id,
            definition.id,
            Uuid::new_v4(),
            "tok".into(),
            None,
            Some(Utc::now() + Duration::days(7)),
        );

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance_by_token()
            .returning(move |_| Ok(Some(instance.clone())));
        assessment_repo
            .expect_update_instance()
            .withf(|i| i.status == InstanceStatus::Started && i.started_at.is_some())
            .returning(|i| Ok(i.clone()));
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(definition.clone())));
        assessment_repo
            .expect_list_questions()
            .returning(move |_| Ok(vec![question.clone()]));
        assessment_repo
            .expect_list_responses()
            .returning(|_| Ok(Vec::new()));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let access = service.get_by_token("tok").await.unwrap();
        match access {
            TokenAccess::Form(form) => {
                assert_eq!(form.instance.status, InstanceStatus::Started);
                assert_eq!(form.questions.len(), 1);
            }
            TokenAccess::Results(_) => panic!("open instance returned results"),
        }
    }

    #[tokio::test]
    async fn test_get_by_token_expires_lapsed_invitation() {
        let org_id = Uuid::new_v4();
        let instance = AssessmentInstance::new(
            org_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            None,
            Some(Utc::now() - Duration::hours(1)),
        );

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance_by_token()
            .returning(move |_| Ok(Some(instance.clone())));
        assessment_repo
            .expect_update_instance()
            .withf(|i| i.status == InstanceStatus::Expired)
            .returning(|i| Ok(i.clone()));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let err = service.get_by_token("tok").await.unwrap_err();
        assert!(matches!(err, DomainError::InstanceExpired));
    }

    #[tokio::test]
    async fn test_submit_completes_scores_in_place() {
        let org_id = Uuid::new_v4();
        let definition = active_definition(org_id);
        let q1 = likert_question(definition.id, "openness", 1);
        let q2 = likert_question(definition.id, "rigor", 2);
        let instance = AssessmentInstance::new(
            org_id,
            definition.id,
            Uuid::new_v4(),
            "tok".into(),
            None,
            Some(Utc::now() + Duration::days(7)),
        );
        let instance_id = instance.id;

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance_by_token()
            .returning(move |_| Ok(Some(instance.clone())));
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(definition.clone())));
        let questions = vec![q1.clone(), q2.clone()];
        assessment_repo
            .expect_list_questions()
            .returning(move |_| Ok(questions.clone()));
        assessment_repo
            .expect_upsert_response()
            .times(2)
            .returning(|r| Ok(r.clone()));
        assessment_repo
            .expect_count_responses()
            .returning(|_| Ok(2));
        let stored = vec![
            Response::new(instance_id, q1.id, Some(4), String::new(), None),
            Response::new(instance_id, q2.id, Some(5), String::new(), None),
        ];
        assessment_repo
            .expect_list_responses()
            .returning(move |_| Ok(stored.clone()));
        assessment_repo
            .expect_complete_instance()
            .withf(|i, p| {
                i.status == InstanceStatus::Completed
                    && i.progress_percentage == 100.0
                    && p.dimension_scores.get("openness") == Some(&4.0)
                    && p.dimension_scores.get("rigor") == Some(&5.0)
            })
            .returning(|_, _| Ok(()));

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));
        let mut pdi_repo = MockPdiRepository::new();
        pdi_repo
            .expect_list_auto_templates()
            .returning(|_, _| Ok(Vec::new()));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            pdi_repo,
            user_repo,
        );
        let answers = vec![
            AnswerInput {
                question_id: q1.id,
                numeric_value: Some(4),
                text_value: None,
                selected_option_id: None,
            },
            AnswerInput {
                question_id: q2.id,
                numeric_value: Some(5),
                text_value: None,
                selected_option_id: None,
            },
        ];
        let outcome = service.submit_responses("tok", &answers).await.unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.instance.raw_scores.get("openness"), Some(&4.0));
        assert_eq!(outcome.instance.percentile_scores.len(), 2);
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_scale_value() {
        let org_id = Uuid::new_v4();
        let definition = active_definition(org_id);
        let question = likert_question(definition.id, "openness", 1);
        let question_id = question.id;
        let instance = AssessmentInstance::new(
            org_id,
            definition.id,
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        );

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance_by_token()
            .returning(move |_| Ok(Some(instance.clone())));
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(definition.clone())));
        assessment_repo
            .expect_list_questions()
            .returning(move |_| Ok(vec![question.clone()]));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let answers = vec![AnswerInput {
            question_id,
            numeric_value: Some(9),
            text_value: None,
            selected_option_id: None,
        }];
        let err = service.submit_responses("tok", &answers).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_partial_submission_tracks_progress() {
        let org_id = Uuid::new_v4();
        let definition = active_definition(org_id);
        let q1 = likert_question(definition.id, "openness", 1);
        let q2 = likert_question(definition.id, "rigor", 2);
        let q1_id = q1.id;
        let instance = AssessmentInstance::new(
            org_id,
            definition.id,
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        );

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance_by_token()
            .returning(move |_| Ok(Some(instance.clone())));
        assessment_repo
            .expect_find_definition()
            .returning(move |_, _| Ok(Some(definition.clone())));
        assessment_repo
            .expect_list_questions()
            .returning(move |_| Ok(vec![q1.clone(), q2.clone()]));
        assessment_repo
            .expect_upsert_response()
            .returning(|r| Ok(r.clone()));
        assessment_repo
            .expect_count_responses()
            .returning(|_| Ok(1));
        assessment_repo
            .expect_update_instance()
            .withf(|i| {
                i.status == InstanceStatus::InProgress && i.progress_percentage == 50.0
            })
            .returning(|i| Ok(i.clone()));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let answers = vec![AnswerInput {
            question_id: q1_id,
            numeric_value: Some(3),
            text_value: None,
            selected_option_id: None,
        }];
        let outcome = service.submit_responses("tok", &answers).await.unwrap();
        assert!(!outcome.completed);
        assert_eq!(outcome.answered, 1);
        assert_eq!(outcome.total, 2);
    }

    #[tokio::test]
    async fn test_results_require_completion() {
        let org_id = Uuid::new_v4();
        let instance = AssessmentInstance::new(
            org_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        );
        let instance_id = instance.id;

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance()
            .returning(move |_, _| Ok(Some(instance.clone())));

        let service = service_with(
            assessment_repo,
            MockBillingRepository::new(),
            MockPdiRepository::new(),
            MockUserRepository::new(),
        );
        let err = service.results(&org_id, &instance_id).await.unwrap_err();
        assert!(matches!(err, DomainError::InstanceNotCompleted));
    }
}
