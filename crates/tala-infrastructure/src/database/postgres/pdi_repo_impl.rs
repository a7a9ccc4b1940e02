// ============================================================================
// Tala Infrastructure - PostgreSQL Development Plan Repository
// File: crates/tala-infrastructure/src/database/postgres/pdi_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    Framework, PdiPlan, PdiProgressUpdate, PdiTask, PdiTemplate, PlanPriority, PlanStatus,
    TaskCategory, TaskStatus, TemplateTask,
};
use tala_core::error::DomainError;
use tala_core::repositories::PdiRepository;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgPdiRepository {
    pool: PgPool,
}

impl PgPdiRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct PlanRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub employee_id: Uuid,
    pub manager_id: Option<Uuid>,
    pub hr_contact_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub source_assessment_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub target_completion_date: NaiveDate,
    pub actual_completion_date: Option<NaiveDate>,
    pub overall_progress: f64,
    pub last_review_date: Option<NaiveDate>,
    pub next_review_date: Option<NaiveDate>,
    pub submitted_for_approval_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<PlanRow> for PdiPlan {
    fn from(row: PlanRow) -> Self {
        PdiPlan {
            id: row.id,
            organization_id: row.organization_id,
            employee_id: row.employee_id,
            manager_id: row.manager_id,
            hr_contact_id: row.hr_contact_id,
            title: row.title,
            description: row.description,
            status: PlanStatus::from_str(&row.status).unwrap_or(PlanStatus::Draft),
            priority: PlanPriority::from_str(&row.priority).unwrap_or(PlanPriority::Medium),
            source_assessment_id: row.source_assessment_id,
            start_date: row.start_date,
            target_completion_date: row.target_completion_date,
            actual_completion_date: row.actual_completion_date,
            overall_progress: row.overall_progress,
            last_review_date: row.last_review_date,
            next_review_date: row.next_review_date,
            submitted_for_approval_at: row.submitted_for_approval_at,
            approved_by: row.approved_by,
            approved_at: row.approved_at,
            approval_notes: row.approval_notes,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TaskRow {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub title: String,
    pub description: String,
    pub specific_objective: String,
    pub measurable_criteria: String,
    pub achievable_steps: String,
    pub relevant_justification: String,
    pub time_bound_deadline: NaiveDate,
    pub category: String,
    pub competency_area: String,
    pub status: String,
    pub progress_percentage: f64,
    pub weight: f64,
    pub required_resources: String,
    pub assigned_mentor: Option<Uuid>,
    pub estimated_hours: i32,
    pub actual_hours: i32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_update_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for PdiTask {
    fn from(row: TaskRow) -> Self {
        PdiTask {
            id: row.id,
            plan_id: row.plan_id,
            title: row.title,
            description: row.description,
            specific_objective: row.specific_objective,
            measurable_criteria: row.measurable_criteria,
            achievable_steps: row.achievable_steps,
            relevant_justification: row.relevant_justification,
            time_bound_deadline: row.time_bound_deadline,
            category: TaskCategory::from_str(&row.category)
                .unwrap_or(TaskCategory::TechnicalSkills),
            competency_area: row.competency_area,
            status: TaskStatus::from_str(&row.status).unwrap_or(TaskStatus::NotStarted),
            progress_percentage: row.progress_percentage,
            weight: row.weight,
            required_resources: row.required_resources,
            assigned_mentor: row.assigned_mentor,
            estimated_hours: row.estimated_hours,
            actual_hours: row.actual_hours,
            started_at: row.started_at,
            completed_at: row.completed_at,
            last_update_at: row.last_update_at,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProgressRow {
    pub id: Uuid,
    pub task_id: Uuid,
    pub progress_percentage: f64,
    pub notes: String,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ProgressRow> for PdiProgressUpdate {
    fn from(row: ProgressRow) -> Self {
        PdiProgressUpdate {
            id: row.id,
            task_id: row.task_id,
            progress_percentage: row.progress_percentage,
            notes: row.notes,
            updated_by: row.updated_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TemplateRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub framework: String,
    pub auto_generate: bool,
    pub requires_approval: bool,
    pub default_duration_days: i32,
    pub template_tasks: Json<Vec<TemplateTask>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<TemplateRow> for PdiTemplate {
    fn from(row: TemplateRow) -> Self {
        PdiTemplate {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            framework: Framework::from_str(&row.framework).unwrap_or(Framework::Custom),
            auto_generate: row.auto_generate,
            requires_approval: row.requires_approval,
            default_duration_days: row.default_duration_days,
            template_tasks: row.template_tasks.0,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl PdiRepository for PgPdiRepository {
    async fn find_plan(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<PdiPlan>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            FROM pdi_plans
            WHERE organization_id = $1 AND id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding development plan: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_plans(
        &self,
        organization_id: &Uuid,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<PdiPlan>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            FROM pdi_plans
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR employee_id = $2)
              AND removed_at IS NULL
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing development plans: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_plan(&self, plan: &PdiPlan) -> Result<PdiPlan, DomainError> {
        info!("Creating development plan: {}", plan.title);

        let mut tx = tenant_tx(&self.pool, &plan.organization_id).await?;
        let row: PlanRow = sqlx::query_as(
            r#"
            INSERT INTO pdi_plans (
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            "#,
        )
        .bind(plan.id)
        .bind(plan.organization_id)
        .bind(plan.employee_id)
        .bind(plan.manager_id)
        .bind(plan.hr_contact_id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.status.as_str())
        .bind(plan.priority.as_str())
        .bind(plan.source_assessment_id)
        .bind(plan.start_date)
        .bind(plan.target_completion_date)
        .bind(plan.actual_completion_date)
        .bind(plan.overall_progress)
        .bind(plan.last_review_date)
        .bind(plan.next_review_date)
        .bind(plan.submitted_for_approval_at)
        .bind(plan.approved_by)
        .bind(plan.approved_at)
        .bind(&plan.approval_notes)
        .bind(plan.created_at)
        .bind(plan.created_by)
        .bind(plan.modified_at)
        .bind(plan.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating development plan: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Development plan created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_plan(&self, plan: &PdiPlan) -> Result<PdiPlan, DomainError> {
        let mut tx = tenant_tx(&self.pool, &plan.organization_id).await?;
        let row: PlanRow = sqlx::query_as(
            r#"
            UPDATE pdi_plans SET
                manager_id = $2,
                hr_contact_id = $3,
                title = $4,
                description = $5,
                status = $6,
                priority = $7,
                start_date = $8,
                target_completion_date = $9,
                actual_completion_date = $10,
                overall_progress = $11,
                last_review_date = $12,
                next_review_date = $13,
                submitted_for_approval_at = $14,
                approved_by = $15,
                approved_at = $16,
                approval_notes = $17,
                modified_at = $18,
                removed_at = $19
            WHERE id = $1
            RETURNING
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            "#,
        )
        .bind(plan.id)
        .bind(plan.manager_id)
        .bind(plan.hr_contact_id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.status.as_str())
        .bind(plan.priority.as_str())
        .bind(plan.start_date)
        .bind(plan.target_completion_date)
        .bind(plan.actual_completion_date)
        .bind(plan.overall_progress)
        .bind(plan.last_review_date)
        .bind(plan.next_review_date)
        .bind(plan.submitted_for_approval_at)
        .bind(plan.approved_by)
        .bind(plan.approved_at)
        .bind(&plan.approval_notes)
        .bind(plan.modified_at)
        .bind(plan.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating development plan: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn create_plan_with_tasks(
        &self,
        plan: &PdiPlan,
        tasks: &[PdiTask],
    ) -> Result<(), DomainError> {
        info!(
            "Creating development plan '{}' with {} tasks",
            plan.title,
            tasks.len()
        );

        let mut tx = tenant_tx(&self.pool, &plan.organization_id).await?;

        sqlx::query(
            r#"
            INSERT INTO pdi_plans (
                id, organization_id, employee_id, manager_id, hr_contact_id, title,
                description, status, priority, source_assessment_id, start_date,
                target_completion_date, actual_completion_date, overall_progress,
                last_review_date, next_review_date, submitted_for_approval_at,
                approved_by, approved_at, approval_notes, created_at, created_by,
                modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            "#,
        )
        .bind(plan.id)
        .bind(plan.organization_id)
        .bind(plan.employee_id)
        .bind(plan.manager_id)
        .bind(plan.hr_contact_id)
        .bind(&plan.title)
        .bind(&plan.description)
        .bind(plan.status.as_str())
        .bind(plan.priority.as_str())
        .bind(plan.source_assessment_id)
        .bind(plan.start_date)
        .bind(plan.target_completion_date)
        .bind(plan.actual_completion_date)
        .bind(plan.overall_progress)
        .bind(plan.last_review_date)
        .bind(plan.next_review_date)
        .bind(plan.submitted_for_approval_at)
        .bind(plan.approved_by)
        .bind(plan.approved_at)
        .bind(&plan.approval_notes)
        .bind(plan.created_at)
        .bind(plan.created_by)
        .bind(plan.modified_at)
        .bind(plan.removed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating development plan: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        for task in tasks {
            sqlx::query(
                r#"
                INSERT INTO pdi_tasks (
                    id, plan_id, title, description, specific_objective,
                    measurable_criteria, achievable_steps, relevant_justification,
                    time_bound_deadline, category, competency_area, status,
                    progress_percentage, weight, required_resources, assigned_mentor,
                    estimated_hours, actual_hours, started_at, completed_at,
                    last_update_at, is_active, created_at, modified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                        $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
                "#,
            )
            .bind(task.id)
            .bind(task.plan_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(&task.specific_objective)
            .bind(&task.measurable_criteria)
            .bind(&task.achievable_steps)
            .bind(&task.relevant_justification)
            .bind(task.time_bound_deadline)
            .bind(task.category.as_str())
            .bind(&task.competency_area)
            .bind(task.status.as_str())
            .bind(task.progress_percentage)
            .bind(task.weight)
            .bind(&task.required_resources)
            .bind(task.assigned_mentor)
            .bind(task.estimated_hours)
            .bind(task.actual_hours)
            .bind(task.started_at)
            .bind(task.completed_at)
            .bind(task.last_update_at)
            .bind(task.is_active)
            .bind(task.created_at)
            .bind(task.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database error creating development plan task: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;
        }

        commit(tx).await?;

        info!("Development plan created successfully: {}", plan.id);
        Ok(())
    }

    async fn find_task(&self, plan_id: &Uuid, id: &Uuid) -> Result<Option<PdiTask>, DomainError> {
        let row: Option<TaskRow> = sqlx::query_as(
            r#"
            SELECT
                id, plan_id, title, description, specific_objective,
                measurable_criteria, achievable_steps, relevant_justification,
                time_bound_deadline, category, competency_area, status,
                progress_percentage, weight, required_resources, assigned_mentor,
                estimated_hours, actual_hours, started_at, completed_at,
                last_update_at, is_active, created_at, modified_at
            FROM pdi_tasks
            WHERE plan_id = $1 AND id = $2
            "#,
        )
        .bind(plan_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding development task: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_tasks(&self, plan_id: &Uuid) -> Result<Vec<PdiTask>, DomainError> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            r#"
            SELECT
                id, plan_id, title, description, specific_objective,
                measurable_criteria, achievable_steps, relevant_justification,
                time_bound_deadline, category, competency_area, status,
                progress_percentage, weight, required_resources, assigned_mentor,
                estimated_hours, actual_hours, started_at, completed_at,
                last_update_at, is_active, created_at, modified_at
            FROM pdi_tasks
            WHERE plan_id = $1
            ORDER BY time_bound_deadline ASC, created_at ASC
            "#,
        )
        .bind(plan_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing development tasks: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_task(&self, task: &PdiTask) -> Result<PdiTask, DomainError> {
        let row: TaskRow = sqlx::query_as(
            r#"
            INSERT INTO pdi_tasks (
                id, plan_id, title, description, specific_objective,
                measurable_criteria, achievable_steps, relevant_justification,
                time_bound_deadline, category, competency_area, status,
                progress_percentage, weight, required_resources, assigned_mentor,
                estimated_hours, actual_hours, started_at, completed_at,
                last_update_at, is_active, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING
                id, plan_id, title, description, specific_objective,
                measurable_criteria, achievable_steps, relevant_justification,
                time_bound_deadline, category, competency_area, status,
                progress_percentage, weight, required_resources, assigned_mentor,
                estimated_hours, actual_hours, started_at, completed_at,
                last_update_at, is_active, created_at, modified_at
            "#,
        )
        .bind(task.id)
        .bind(task.plan_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.specific_objective)
        .bind(&task.measurable_criteria)
        .bind(&task.achievable_steps)
        .bind(&task.relevant_justification)
        .bind(task.time_bound_deadline)
        .bind(task.category.as_str())
        .bind(&task.competency_area)
        .bind(task.status.as_str())
        .bind(task.progress_percentage)
        .bind(task.weight)
        .bind(&task.required_resources)
        .bind(task.assigned_mentor)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.last_update_at)
        .bind(task.is_active)
        .bind(task.created_at)
        .bind(task.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating development task: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn update_task(&self, task: &PdiTask) -> Result<PdiTask, DomainError> {
        let row: TaskRow = sqlx::query_as(
            r#"
            UPDATE pdi_tasks SET
                title = $2,
                description = $3,
                specific_objective = $4,
                measurable_criteria = $5,
                achievable_steps = $6,
                relevant_justification = $7,
                time_bound_deadline = $8,
                category = $9,
                competency_area = $10,
                status = $11,
                progress_percentage = $12,
                weight = $13,
                required_resources = $14,
                assigned_mentor = $15,
                estimated_hours = $16,
                actual_hours = $17,
                started_at = $18,
                completed_at = $19,
                last_update_at = $20,
                is_active = $21,
                modified_at = $22
            WHERE id = $1
            RETURNING
                id, plan_id, title, description, specific_objective,
                measurable_criteria, achievable_steps, relevant_justification,
                time_bound_deadline, category, competency_area, status,
                progress_percentage, weight, required_resources, assigned_mentor,
                estimated_hours, actual_hours, started_at, completed_at,
                last_update_at, is_active, created_at, modified_at
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.specific_objective)
        .bind(&task.measurable_criteria)
        .bind(&task.achievable_steps)
        .bind(&task.relevant_justification)
        .bind(task.time_bound_deadline)
        .bind(task.category.as_str())
        .bind(&task.competency_area)
        .bind(task.status.as_str())
        .bind(task.progress_percentage)
        .bind(task.weight)
        .bind(&task.required_resources)
        .bind(task.assigned_mentor)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.started_at)
        .bind(task.completed_at)
        .bind(task.last_update_at)
        .bind(task.is_active)
        .bind(task.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating development task: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn record_progress(
        &self,
        update: &PdiProgressUpdate,
    ) -> Result<PdiProgressUpdate, DomainError> {
        let row: ProgressRow = sqlx::query_as(
            r#"
            INSERT INTO pdi_progress_updates (
                id, task_id, progress_percentage, notes, updated_by, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, task_id, progress_percentage, notes, updated_by, created_at
            "#,
        )
        .bind(update.id)
        .bind(update.task_id)
        .bind(update.progress_percentage)
        .bind(&update.notes)
        .bind(update.updated_by)
        .bind(update.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error recording task progress: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn list_progress(
        &self,
        task_id: &Uuid,
    ) -> Result<Vec<PdiProgressUpdate>, DomainError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, progress_percentage, notes, updated_by, created_at
            FROM pdi_progress_updates
            WHERE task_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing task progress: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_template(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<PdiTemplate>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            FROM pdi_templates
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding plan template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_templates(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<PdiTemplate>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            FROM pdi_templates
            WHERE organization_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing plan templates: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_auto_templates(
        &self,
        organization_id: &Uuid,
        framework: Framework,
    ) -> Result<Vec<PdiTemplate>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<TemplateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            FROM pdi_templates
            WHERE organization_id = $1 AND framework = $2
              AND auto_generate AND is_active
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id)
        .bind(framework.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing auto-generate templates: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_template(&self, template: &PdiTemplate) -> Result<PdiTemplate, DomainError> {
        info!("Creating plan template: {}", template.name);

        let mut tx = tenant_tx(&self.pool, &template.organization_id).await?;
        let row: TemplateRow = sqlx::query_as(
            r#"
            INSERT INTO pdi_templates (
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            "#,
        )
        .bind(template.id)
        .bind(template.organization_id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.framework.as_str())
        .bind(template.auto_generate)
        .bind(template.requires_approval)
        .bind(template.default_duration_days)
        .bind(Json(&template.template_tasks))
        .bind(template.is_active)
        .bind(template.created_at)
        .bind(template.created_by)
        .bind(template.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating plan template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_template(&self, template: &PdiTemplate) -> Result<PdiTemplate, DomainError> {
        let mut tx = tenant_tx(&self.pool, &template.organization_id).await?;
        let row: TemplateRow = sqlx::query_as(
            r#"
            UPDATE pdi_templates SET
                name = $2,
                description = $3,
                framework = $4,
                auto_generate = $5,
                requires_approval = $6,
                default_duration_days = $7,
                template_tasks = $8,
                is_active = $9,
                modified_at = $10
            WHERE id = $1
            RETURNING
                id, organization_id, name, description, framework, auto_generate,
                requires_approval, default_duration_days, template_tasks, is_active,
                created_at, created_by, modified_at
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.framework.as_str())
        .bind(template.auto_generate)
        .bind(template.requires_approval)
        .bind(template.default_duration_days)
        .bind(Json(&template.template_tasks))
        .bind(template.is_active)
        .bind(template.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating plan template: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }
}
