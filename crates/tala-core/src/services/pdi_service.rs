// ============================================================================
// Tala Core - PDI Service
// File: crates/tala-core/src/services/pdi_service.rs
// ============================================================================
//! Development plans, SMART tasks, progress tracking and template generation

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tala_shared::types::Pagination;

use crate::domain::{
    AssessmentInstance, EmailKind, Framework, Language, Organization, PdiPlan, PdiProgressUpdate,
    PdiTask, PdiTemplate, PlanStatus, ScoreProfile, TaskCategory,
};
use crate::error::DomainError;
use crate::repositories::{EmailRepository, PdiRepository, UserRepository};
use crate::services::EmailService;

pub struct PdiService<P, U, E>
where
    P: PdiRepository,
    U: UserRepository,
    E: EmailRepository,
{
    pdi_repo: Arc<P>,
    user_repo: Arc<U>,
    emails: Arc<EmailService<E>>,
}

impl<P, U, E> PdiService<P, U, E>
where
    P: PdiRepository,
    U: UserRepository,
    E: EmailRepository,
{
    pub fn new(pdi_repo: Arc<P>, user_repo: Arc<U>, emails: Arc<EmailService<E>>) -> Self {
        Self { pdi_repo, user_repo, emails }
    }

    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    #[allow(clippy::too_many_arguments)]
    pub async fn create_plan(
        &self,
        organization_id: &Uuid,
        employee_id: &Uuid,
        title: &str,
        description: String,
        start_date: NaiveDate,
        target_completion_date: NaiveDate,
        created_by: Option<Uuid>,
    ) -> Result<PdiPlan, DomainError> {
        if target_completion_date <= start_date {
            return Err(DomainError::ValidationError(
                "target completion date must be after the start date".to_string(),
            ));
        }
        let mut plan = PdiPlan::new(
            *organization_id,
            *employee_id,
            title.to_string(),
            start_date,
            target_completion_date,
            created_by,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        plan.description = description;
        let plan = self.pdi_repo.create_plan(&plan).await?;
        info!("Development plan created: {} in org {}", plan.id, organization_id);
        Ok(plan)
    }

    pub async fn get_plan(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<PdiPlan, DomainError> {
        self.pdi_repo
            .find_plan(organization_id, id)
            .await?
            .ok_or(DomainError::PdiPlanNotFound)
    }

    pub async fn list_plans(
        &self,
        organization_id: &Uuid,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<PdiPlan>, DomainError> {
        self.pdi_repo
            .list_plans(organization_id, user_id, pagination.clamped())
            .await
    }

    pub async fn update_plan(&self, plan: &PdiPlan) -> Result<PdiPlan, DomainError> {
        self.pdi_repo.update_plan(plan).await
    }

    pub async fn submit_for_approval(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
    ) -> Result<PdiPlan, DomainError> {
        let mut plan = self.get_plan(organization_id, plan_id).await?;
        if plan.status != PlanStatus::Draft {
            return Err(DomainError::InvalidStatusTransition(format!(
                "cannot submit a {} plan for approval",
                plan.status.as_str()
            )));
        }
        plan.submit_for_approval();
        self.pdi_repo.update_plan(&plan).await
    }

    pub async fn approve_plan(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
        approved_by: &Uuid,
        notes: String,
    ) -> Result<PdiPlan, DomainError> {
        let mut plan = self.get_plan(organization_id, plan_id).await?;
        if plan.status != PlanStatus::PendingApproval {
            return Err(DomainError::InvalidStatusTransition(format!(
                "cannot approve a {} plan",
                plan.status.as_str()
            )));
        }
        plan.approve(*approved_by, notes);
        let plan = self.pdi_repo.update_plan(&plan).await?;
        info!("Development plan {} approved by {}", plan.id, approved_by);
        Ok(plan)
    }

    pub async fn complete_plan(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
    ) -> Result<PdiPlan, DomainError> {
        let mut plan = self.get_plan(organization_id, plan_id).await?;
        if plan.status.is_closed() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "plan is already {}",
                plan.status.as_str()
            )));
        }
        plan.complete();
        self.pdi_repo.update_plan(&plan).await
    }

    pub async fn cancel_plan(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
    ) -> Result<PdiPlan, DomainError> {
        let mut plan = self.get_plan(organization_id, plan_id).await?;
        if plan.status.is_closed() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "plan is already {}",
                plan.status.as_str()
            )));
        }
        plan.cancel();
        self.pdi_repo.update_plan(&plan).await
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    pub async fn add_task(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
        title: &str,
        description: String,
        category: TaskCategory,
        deadline: NaiveDate,
    ) -> Result<PdiTask, DomainError> {
        let plan = self.get_plan(organization_id, plan_id).await?;
        let task = PdiTask::new(plan.id, title.to_string(), description, category, deadline)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.pdi_repo.create_task(&task).await
    }

    pub async fn list_tasks(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
    ) -> Result<Vec<PdiTask>, DomainError> {
        self.get_plan(organization_id, plan_id).await?;
        self.pdi_repo.list_tasks(plan_id).await
    }

    pub async fn update_task(&self, task: &PdiTask) -> Result<PdiTask, DomainError> {
        self.pdi_repo.update_task(task).await
    }

    /// Applies a progress update to the task and recomputes the plan's
    /// weighted progress. The history entry records the percentage exactly
    /// as submitted.
    pub async fn update_task_progress(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
        task_id: &Uuid,
        percentage: f64,
        notes: String,
        updated_by: Option<Uuid>,
    ) -> Result<(PdiTask, PdiPlan), DomainError> {
        let mut plan = self.get_plan(organization_id, plan_id).await?;
        let mut task = self
            .pdi_repo
            .find_task(plan_id, task_id)
            .await?
            .ok_or(DomainError::PdiTaskNotFound)?;

        // 1. Append the raw history entry
        let update = PdiProgressUpdate::new(task.id, percentage, notes, updated_by);
        self.pdi_repo.record_progress(&update).await?;

        // 2. Apply to the task
        task.apply_progress(percentage);
        let task = self.pdi_repo.update_task(&task).await?;

        // 3. Roll the plan progress up over all active tasks
        let tasks = self.pdi_repo.list_tasks(plan_id).await?;
        plan.recompute_progress(&tasks);
        let plan = self.pdi_repo.update_plan(&plan).await?;

        Ok((task, plan))
    }

    pub async fn task_history(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
        task_id: &Uuid,
    ) -> Result<Vec<PdiProgressUpdate>, DomainError> {
        self.get_plan(organization_id, plan_id).await?;
        self.pdi_repo
            .find_task(plan_id, task_id)
            .await?
            .ok_or(DomainError::PdiTaskNotFound)?;
        self.pdi_repo.list_progress(task_id).await
    }

    // ------------------------------------------------------------------
    // Templates
    // ------------------------------------------------------------------

    pub async fn create_template(
        &self,
        organization_id: &Uuid,
        name: &str,
        framework: Framework,
        created_by: Option<Uuid>,
    ) -> Result<PdiTemplate, DomainError> {
        let template = PdiTemplate::new(*organization_id, name.to_string(), framework, created_by)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.pdi_repo.create_template(&template).await
    }

    pub async fn get_template(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<PdiTemplate, DomainError> {
        self.pdi_repo
            .find_template(organization_id, id)
            .await?
            .ok_or(DomainError::PdiTemplateNotFound)
    }

    pub async fn list_templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<PdiTemplate>, DomainError> {
        self.pdi_repo.list_templates(organization_id).await
    }

    pub async fn update_template(
        &self,
        template: &PdiTemplate,
    ) -> Result<PdiTemplate, DomainError> {
        self.pdi_repo.update_template(template).await
    }

    // ------------------------------------------------------------------
    // Generation from assessment results
    // ------------------------------------------------------------------

    /// Generates one plan from an explicit template, used by the bulk
    /// generation endpoint.
    pub async fn generate_from_assessment(
        &self,
        template_id: &Uuid,
        instance: &AssessmentInstance,
        definition_name: &str,
        framework: Framework,
        profile: &ScoreProfile,
        organization: Option<&Organization>,
    ) -> Result<PdiPlan, DomainError> {
        let template = self
            .get_template(&instance.organization_id, template_id)
            .await?;
        if template.framework != framework {
            return Err(DomainError::ValidationError(format!(
                "template targets {} assessments",
                template.framework.as_str()
            )));
        }
        self.instantiate(&template, instance, definition_name, profile, organization)
            .await
    }

    /// Runs every active auto-generating template for the framework against
    /// a freshly completed instance. Returns how many plans were created.
    pub async fn generate_for_completion(
        &self,
        instance: &AssessmentInstance,
        definition_name: &str,
        framework: Framework,
        profile: &ScoreProfile,
        organization: Option<&Organization>,
    ) -> Result<u32, DomainError> {
        let templates = self
            .pdi_repo
            .list_auto_templates(&instance.organization_id, framework)
            .await?;
        let mut generated = 0;
        for template in templates {
            match self
                .instantiate(&template, instance, definition_name, profile, organization)
                .await
            {
                Ok(_) => generated += 1,
                Err(e) => {
                    warn!(
                        "Auto-generation with template {} failed for instance {}: {}",
                        template.id, instance.id, e
                    );
                }
            }
        }
        Ok(generated)
    }

    async fn instantiate(
        &self,
        template: &PdiTemplate,
        instance: &AssessmentInstance,
        definition_name: &str,
        profile: &ScoreProfile,
        organization: Option<&Organization>,
    ) -> Result<PdiPlan, DomainError> {
        let (plan, tasks) = template
            .generate_plan(instance, definition_name, profile)
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        self.pdi_repo.create_plan_with_tasks(&plan, &tasks).await?;
        info!(
            "Development plan {} generated from template {} ({} tasks)",
            plan.id,
            template.name,
            tasks.len()
        );

        // Tell the employee, best effort.
        match self.user_repo.find_by_id(&instance.user_id).await {
            Ok(Some(user)) => {
                let context = json!({
                    "user_name": user.full_name(),
                    "plan_title": plan.title,
                    "assessment_name": definition_name,
                    "task_count": tasks.len(),
                    "target_date": plan.target_completion_date.to_string(),
                });
                if let Err(e) = self
                    .emails
                    .queue(
                        EmailKind::PdiCreated,
                        &user.email,
                        context,
                        organization,
                        Language::En,
                    )
                    .await
                {
                    warn!("Failed to queue development plan email: {}", e);
                }
            }
            Ok(None) => warn!("Plan employee {} has no user record", instance.user_id),
            Err(e) => warn!("User lookup failed for plan email: {}", e),
        }

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::email_repository::MockEmailRepository;
    use crate::repositories::pdi_repository::MockPdiRepository;
    use crate::repositories::user_repository::MockUserRepository;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;

    fn emails() -> Arc<EmailService<MockEmailRepository>> {
        let mut repo = MockEmailRepository::new();
        repo.expect_is_blacklisted().returning(|_| Ok(false));
        repo.expect_find_template().returning(|_, _, _| Ok(None));
        Arc::new(EmailService::new(
            Arc::new(repo),
            "noreply@tala.test".into(),
            "Tala".into(),
            "https://tala.test".into(),
        ))
    }

    fn service_with(
        pdi_repo: MockPdiRepository,
        user_repo: MockUserRepository,
    ) -> PdiService<MockPdiRepository, MockUserRepository, MockEmailRepository> {
        PdiService::new(Arc::new(pdi_repo), Arc::new(user_repo), emails())
    }

    fn draft_plan(organization_id: Uuid) -> PdiPlan {
        let today = Utc::now().date_naive();
        let mut plan = PdiPlan::new(
            organization_id,
            Uuid::new_v4(),
            "Growth plan".into(),
            today,
            today + Duration::days(90),
            None,
        )
        .unwrap();
        plan.organization_id = organization_id;
        plan
    }

    #[tokio::test]
    async fn test_create_plan_rejects_inverted_dates() {
        let service = service_with(MockPdiRepository::new(), MockUserRepository::new());
        let today = Utc::now().date_naive();
        let err = service
            .create_plan(
                &Uuid::new_v4(),
                &Uuid::new_v4(),
                "Backwards",
                String::new(),
                today,
                today - Duration::days(1),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_approve_requires_pending_status() {
        let org_id = Uuid::new_v4();
        let plan = draft_plan(org_id);

        let mut pdi_repo = MockPdiRepository::new();
        pdi_repo
            .expect_find_plan()
            .returning(move |_, _| Ok(Some(plan.clone())));

        let service = service_with(pdi_repo, MockUserRepository::new());
        let err = service
            .approve_plan(&org_id, &Uuid::new_v4(), &Uuid::new_v4(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition(_)));
    }

    #[tokio::test]
    async fn test_progress_update_records_raw_and_rolls_up() {
        let org_id = Uuid::new_v4();
        let plan = draft_plan(org_id);
        let plan_id = plan.id;
        let task = PdiTask::new(
            plan_id,
            "Course".into(),
            String::new(),
            TaskCategory::TechnicalSkills,
            Utc::now().date_naive() + Duration::days(30),
        )
        .unwrap();
        let task_id = task.id;

        let mut pdi_repo = MockPdiRepository::new();
        let found_plan = plan.clone();
        pdi_repo
            .expect_find_plan()
            .returning(move |_, _| Ok(Some(found_plan.clone())));
        let found_task = task.clone();
        pdi_repo
            .expect_find_task()
            .returning(move |_, _| Ok(Some(found_task.clone())));
        // History keeps the submitted value even beyond the clamp range.
        pdi_repo
            .expect_record_progress()
            .withf(|u| u.progress_percentage == 150.0)
            .returning(|u| Ok(u.clone()));
        pdi_repo
            .expect_update_task()
            .withf(|t| t.progress_percentage == 100.0)
            .returning(|t| Ok(t.clone()));
        pdi_repo.expect_list_tasks().returning(move |_| {
            let mut done = task.clone();
            done.apply_progress(100.0);
            Ok(vec![done])
        });
        pdi_repo
            .expect_update_plan()
            .withf(|p| p.overall_progress == 100.0)
            .returning(|p| Ok(p.clone()));

        let service = service_with(pdi_repo, MockUserRepository::new());
        let (task, plan) = service
            .update_task_progress(&org_id, &plan_id, &task_id, 150.0, String::new(), None)
            .await
            .unwrap();
        assert_eq!(task.progress_percentage, 100.0);
        assert_eq!(plan.overall_progress, 100.0);
    }

    #[tokio::test]
    async fn test_generate_for_completion_counts_plans() {
        let org_id = Uuid::new_v4();
        let mut template =
            PdiTemplate::new(org_id, "Follow-up".into(), Framework::Disc, None).unwrap();
        template.requires_approval = false;

        let mut pdi_repo = MockPdiRepository::new();
        pdi_repo
            .expect_list_auto_templates()
            .returning(move |_, _| Ok(vec![template.clone()]));
        pdi_repo
            .expect_create_plan_with_tasks()
            .returning(|_, _| Ok(()));

        let mut user_repo = MockUserRepository::new();
        user_repo.expect_find_by_id().returning(|_| Ok(None));

        let instance = AssessmentInstance::new(
            org_id,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        );
        let profile = ScoreProfile::new(org_id, instance.id, BTreeMap::new(), BTreeMap::new());

        let service = service_with(pdi_repo, user_repo);
        let generated = service
            .generate_for_completion(&instance, "DISC", Framework::Disc, &profile, None)
            .await
            .unwrap();
        assert_eq!(generated, 1);
    }
}
