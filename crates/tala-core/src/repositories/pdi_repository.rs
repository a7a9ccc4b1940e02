//! Development plan repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Framework, PdiPlan, PdiProgressUpdate, PdiTask, PdiTemplate};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PdiRepository: Send + Sync {
    // Plans
    async fn find_plan(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<PdiPlan>, DomainError>;
    async fn list_plans(
        &self,
        organization_id: &Uuid,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<PdiPlan>, DomainError>;
    async fn create_plan(&self, plan: &PdiPlan) -> Result<PdiPlan, DomainError>;
    async fn update_plan(&self, plan: &PdiPlan) -> Result<PdiPlan, DomainError>;
    /// Persists a generated plan with its tasks in one transaction.
    async fn create_plan_with_tasks(
        &self,
        plan: &PdiPlan,
        tasks: &[PdiTask],
    ) -> Result<(), DomainError>;

    // Tasks
    async fn find_task(&self, plan_id: &Uuid, id: &Uuid) -> Result<Option<PdiTask>, DomainError>;
    async fn list_tasks(&self, plan_id: &Uuid) -> Result<Vec<PdiTask>, DomainError>;
    async fn create_task(&self, task: &PdiTask) -> Result<PdiTask, DomainError>;
    async fn update_task(&self, task: &PdiTask) -> Result<PdiTask, DomainError>;

    // Progress history
    async fn record_progress(
        &self,
        update: &PdiProgressUpdate,
    ) -> Result<PdiProgressUpdate, DomainError>;
    async fn list_progress(&self, task_id: &Uuid)
        -> Result<Vec<PdiProgressUpdate>, DomainError>;

    // Templates
    async fn find_template(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<PdiTemplate>, DomainError>;
    async fn list_templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<PdiTemplate>, DomainError>;
    /// Active auto-generating templates for this assessment framework.
    async fn list_auto_templates(
        &self,
        organization_id: &Uuid,
        framework: Framework,
    ) -> Result<Vec<PdiTemplate>, DomainError>;
    async fn create_template(&self, template: &PdiTemplate)
        -> Result<PdiTemplate, DomainError>;
    async fn update_template(&self, template: &PdiTemplate)
        -> Result<PdiTemplate, DomainError>;
}
