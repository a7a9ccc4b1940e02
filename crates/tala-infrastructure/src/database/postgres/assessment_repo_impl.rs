// ============================================================================
// Tala Infrastructure - PostgreSQL Assessment Repository
// File: crates/tala-infrastructure/src/database/postgres/assessment_repo_impl.rs
// ============================================================================

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    AssessmentDefinition, AssessmentInstance, DefinitionStatus, Framework, InstanceStatus,
    Question, QuestionKind, QuestionOption, Response, ScoreProfile,
};
use tala_core::error::DomainError;
use tala_core::repositories::AssessmentRepository;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgAssessmentRepository {
    pool: PgPool,
}

impl PgAssessmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct DefinitionRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub framework: String,
    pub version: String,
    pub status: String,
    pub instructions: String,
    pub estimated_duration: i32,
    pub randomize_questions: bool,
    pub allow_skip: bool,
    pub show_progress: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<DefinitionRow> for AssessmentDefinition {
    fn from(row: DefinitionRow) -> Self {
        AssessmentDefinition {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            description: row.description,
            framework: Framework::from_str(&row.framework).unwrap_or(Framework::Custom),
            version: row.version,
            status: DefinitionStatus::from_str(&row.status).unwrap_or(DefinitionStatus::Draft),
            instructions: row.instructions,
            estimated_duration: row.estimated_duration,
            randomize_questions: row.randomize_questions,
            allow_skip: row.allow_skip,
            show_progress: row.show_progress,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct QuestionRow {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub text: String,
    pub kind: String,
    pub display_order: i32,
    pub dimension: String,
    pub reverse_scored: bool,
    pub weight: f64,
    pub required: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            assessment_id: row.assessment_id,
            text: row.text,
            kind: QuestionKind::from_str(&row.kind).unwrap_or(QuestionKind::Likert5),
            order: row.display_order,
            dimension: row.dimension,
            reverse_scored: row.reverse_scored,
            weight: row.weight,
            required: row.required,
            is_active: row.is_active,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OptionRow {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub value: i32,
    pub display_order: i32,
}

impl From<OptionRow> for QuestionOption {
    fn from(row: OptionRow) -> Self {
        QuestionOption {
            id: row.id,
            question_id: row.question_id,
            text: row.text,
            value: row.value,
            order: row.display_order,
        }
    }
}

#[derive(Debug, FromRow)]
struct InstanceRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub assessment_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub token: String,
    pub invited_by: Option<Uuid>,
    pub current_question: i32,
    pub progress_percentage: f64,
    pub invited_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub raw_scores: Json<BTreeMap<String, f64>>,
    pub percentile_scores: Json<BTreeMap<String, f64>>,
}

impl From<InstanceRow> for AssessmentInstance {
    fn from(row: InstanceRow) -> Self {
        AssessmentInstance {
            id: row.id,
            organization_id: row.organization_id,
            assessment_id: row.assessment_id,
            user_id: row.user_id,
            status: InstanceStatus::from_str(&row.status).unwrap_or(InstanceStatus::Invited),
            token: row.token,
            invited_by: row.invited_by,
            current_question: row.current_question,
            progress_percentage: row.progress_percentage,
            invited_at: row.invited_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            expires_at: row.expires_at,
            raw_scores: row.raw_scores.0,
            percentile_scores: row.percentile_scores.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct ResponseRow {
    pub id: Uuid,
    pub instance_id: Uuid,
    pub question_id: Uuid,
    pub numeric_value: Option<i32>,
    pub text_value: String,
    pub selected_option_id: Option<Uuid>,
    pub answered_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<ResponseRow> for Response {
    fn from(row: ResponseRow) -> Self {
        Response {
            id: row.id,
            instance_id: row.instance_id,
            question_id: row.question_id,
            numeric_value: row.numeric_value,
            text_value: row.text_value,
            selected_option_id: row.selected_option_id,
            answered_at: row.answered_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub instance_id: Uuid,
    pub dimension_scores: Json<BTreeMap<String, f64>>,
    pub percentile_scores: Json<BTreeMap<String, f64>>,
    pub profile_type: String,
    pub strengths: Vec<String>,
    pub development_areas: Vec<String>,
    pub recommendations: Vec<String>,
    pub calculated_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<ProfileRow> for ScoreProfile {
    fn from(row: ProfileRow) -> Self {
        ScoreProfile {
            id: row.id,
            organization_id: row.organization_id,
            instance_id: row.instance_id,
            dimension_scores: row.dimension_scores.0,
            percentile_scores: row.percentile_scores.0,
            profile_type: row.profile_type,
            strengths: row.strengths,
            development_areas: row.development_areas,
            recommendations: row.recommendations,
            calculated_at: row.calculated_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl AssessmentRepository for PgAssessmentRepository {
    async fn find_definition(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<AssessmentDefinition>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<DefinitionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, framework, version, status,
                instructions, estimated_duration, randomize_questions, allow_skip,
                show_progress, created_at, created_by, modified_at, removed_at
            FROM assessment_definitions
            WHERE organization_id = $1 AND id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding assessment definition: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_definitions(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentDefinition>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<DefinitionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, description, framework, version, status,
                instructions, estimated_duration, randomize_questions, allow_skip,
                show_progress, created_at, created_by, modified_at, removed_at
            FROM assessment_definitions
            WHERE organization_id = $1 AND removed_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing assessment definitions: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_definition(
        &self,
        definition: &AssessmentDefinition,
    ) -> Result<AssessmentDefinition, DomainError> {
        info!(
            "Creating assessment definition: {} ({})",
            definition.name,
            definition.framework.as_str()
        );

        let mut tx = tenant_tx(&self.pool, &definition.organization_id).await?;
        let row: DefinitionRow = sqlx::query_as(
            r#"
            INSERT INTO assessment_definitions (
                id, organization_id, name, description, framework, version, status,
                instructions, estimated_duration, randomize_questions, allow_skip,
                show_progress, created_at, created_by, modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING
                id, organization_id, name, description, framework, version, status,
                instructions, estimated_duration, randomize_questions, allow_skip,
                show_progress, created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(definition.id)
        .bind(definition.organization_id)
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(definition.framework.as_str())
        .bind(&definition.version)
        .bind(definition.status.as_str())
        .bind(&definition.instructions)
        .bind(definition.estimated_duration)
        .bind(definition.randomize_questions)
        .bind(definition.allow_skip)
        .bind(definition.show_progress)
        .bind(definition.created_at)
        .bind(definition.created_by)
        .bind(definition.modified_at)
        .bind(definition.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating assessment definition: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Assessment definition created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_definition(
        &self,
        definition: &AssessmentDefinition,
    ) -> Result<AssessmentDefinition, DomainError> {
        let mut tx = tenant_tx(&self.pool, &definition.organization_id).await?;
        let row: DefinitionRow = sqlx::query_as(
            r#"
            UPDATE assessment_definitions SET
                name = $2,
                description = $3,
                framework = $4,
                version = $5,
                status = $6,
                instructions = $7,
                estimated_duration = $8,
                randomize_questions = $9,
                allow_skip = $10,
                show_progress = $11,
                modified_at = $12,
                removed_at = $13
            WHERE id = $1
            RETURNING
                id, organization_id, name, description, framework, version, status,
                instructions, estimated_duration, randomize_questions, allow_skip,
                show_progress, created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(definition.id)
        .bind(&definition.name)
        .bind(&definition.description)
        .bind(definition.framework.as_str())
        .bind(&definition.version)
        .bind(definition.status.as_str())
        .bind(&definition.instructions)
        .bind(definition.estimated_duration)
        .bind(definition.randomize_questions)
        .bind(definition.allow_skip)
        .bind(definition.show_progress)
        .bind(definition.modified_at)
        .bind(definition.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating assessment definition: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_question(
        &self,
        assessment_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Question>, DomainError> {
        let row: Option<QuestionRow> = sqlx::query_as(
            r#"
            SELECT
                id, assessment_id, text, kind, display_order, dimension,
                reverse_scored, weight, required, is_active, created_at, modified_at
            FROM questions
            WHERE assessment_id = $1 AND id = $2
            "#,
        )
        .bind(assessment_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding question: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_questions(&self, assessment_id: &Uuid) -> Result<Vec<Question>, DomainError> {
        let rows: Vec<QuestionRow> = sqlx::query_as(
            r#"
            SELECT
                id, assessment_id, text, kind, display_order, dimension,
                reverse_scored, weight, required, is_active, created_at, modified_at
            FROM questions
            WHERE assessment_id = $1 AND is_active
            ORDER BY display_order ASC, created_at ASC
            "#,
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing questions: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_question(&self, question: &Question) -> Result<Question, DomainError> {
        let row: QuestionRow = sqlx::query_as(
            r#"
            INSERT INTO questions (
                id, assessment_id, text, kind, display_order, dimension,
                reverse_scored, weight, required, is_active, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING
                id, assessment_id, text, kind, display_order, dimension,
                reverse_scored, weight, required, is_active, created_at, modified_at
            "#,
        )
        .bind(question.id)
        .bind(question.assessment_id)
        .bind(&question.text)
        .bind(question.kind.as_str())
        .bind(question.order)
        .bind(&question.dimension)
        .bind(question.reverse_scored)
        .bind(question.weight)
        .bind(question.required)
        .bind(question.is_active)
        .bind(question.created_at)
        .bind(question.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating question: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn update_question(&self, question: &Question) -> Result<Question, DomainError> {
        let row: QuestionRow = sqlx::query_as(
            r#"
            UPDATE questions SET
                text = $2,
                kind = $3,
                display_order = $4,
                dimension = $5,
                reverse_scored = $6,
                weight = $7,
                required = $8,
                is_active = $9,
                modified_at = $10
            WHERE id = $1
            RETURNING
                id, assessment_id, text, kind, display_order, dimension,
                reverse_scored, weight, required, is_active, created_at, modified_at
            "#,
        )
        .bind(question.id)
        .bind(&question.text)
        .bind(question.kind.as_str())
        .bind(question.order)
        .bind(&question.dimension)
        .bind(question.reverse_scored)
        .bind(question.weight)
        .bind(question.required)
        .bind(question.is_active)
        .bind(question.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating question: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn list_options(&self, question_id: &Uuid) -> Result<Vec<QuestionOption>, DomainError> {
        let rows: Vec<OptionRow> = sqlx::query_as(
            r#"
            SELECT id, question_id, text, value, display_order
            FROM question_options
            WHERE question_id = $1
            ORDER BY display_order ASC
            "#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing question options: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_option(
        &self,
        option: &QuestionOption,
    ) -> Result<QuestionOption, DomainError> {
        let row: OptionRow = sqlx::query_as(
            r#"
            INSERT INTO question_options (id, question_id, text, value, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, question_id, text, value, display_order
            "#,
        )
        .bind(option.id)
        .bind(option.question_id)
        .bind(&option.text)
        .bind(option.value)
        .bind(option.order)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating question option: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn find_instance(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<AssessmentInstance>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<InstanceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            FROM assessment_instances
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding assessment instance: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_instance_by_token(
        &self,
        token: &str,
    ) -> Result<Option<AssessmentInstance>, DomainError> {
        let row: Option<InstanceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            FROM assessment_instances
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding instance by token: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_open_instance_for_user(
        &self,
        assessment_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<Option<AssessmentInstance>, DomainError> {
        let row: Option<InstanceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            FROM assessment_instances
            WHERE assessment_id = $1 AND user_id = $2
              AND status IN ('INVITED', 'STARTED', 'IN_PROGRESS')
            ORDER BY invited_at DESC
            LIMIT 1
            "#,
        )
        .bind(assessment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding open instance for user: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_instances(
        &self,
        organization_id: &Uuid,
        assessment_id: Option<Uuid>,
        user_id: Option<Uuid>,
        pagination: Pagination,
    ) -> Result<Vec<AssessmentInstance>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<InstanceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            FROM assessment_instances
            WHERE organization_id = $1
              AND ($2::uuid IS NULL OR assessment_id = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
            ORDER BY invited_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(organization_id)
        .bind(assessment_id)
        .bind(user_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing assessment instances: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_instance(
        &self,
        instance: &AssessmentInstance,
    ) -> Result<AssessmentInstance, DomainError> {
        info!(
            "Creating assessment instance for user {} on assessment {}",
            instance.user_id, instance.assessment_id
        );

        let mut tx = tenant_tx(&self.pool, &instance.organization_id).await?;
        let row: InstanceRow = sqlx::query_as(
            r#"
            INSERT INTO assessment_instances (
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            "#,
        )
        .bind(instance.id)
        .bind(instance.organization_id)
        .bind(instance.assessment_id)
        .bind(instance.user_id)
        .bind(instance.status.as_str())
        .bind(&instance.token)
        .bind(instance.invited_by)
        .bind(instance.current_question)
        .bind(instance.progress_percentage)
        .bind(instance.invited_at)
        .bind(instance.started_at)
        .bind(instance.completed_at)
        .bind(instance.expires_at)
        .bind(Json(&instance.raw_scores))
        .bind(Json(&instance.percentile_scores))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating assessment instance: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Assessment instance created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_instance(
        &self,
        instance: &AssessmentInstance,
    ) -> Result<AssessmentInstance, DomainError> {
        let mut tx = tenant_tx(&self.pool, &instance.organization_id).await?;
        let row: InstanceRow = sqlx::query_as(
            r#"
            UPDATE assessment_instances SET
                status = $2,
                current_question = $3,
                progress_percentage = $4,
                started_at = $5,
                completed_at = $6,
                expires_at = $7,
                raw_scores = $8,
                percentile_scores = $9
            WHERE id = $1
            RETURNING
                id, organization_id, assessment_id, user_id, status, token,
                invited_by, current_question, progress_percentage, invited_at,
                started_at, completed_at, expires_at, raw_scores, percentile_scores
            "#,
        )
        .bind(instance.id)
        .bind(instance.status.as_str())
        .bind(instance.current_question)
        .bind(instance.progress_percentage)
        .bind(instance.started_at)
        .bind(instance.completed_at)
        .bind(instance.expires_at)
        .bind(Json(&instance.raw_scores))
        .bind(Json(&instance.percentile_scores))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating assessment instance: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn expire_overdue_instances(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE assessment_instances
            SET status = 'EXPIRED'
            WHERE status IN ('INVITED', 'STARTED', 'IN_PROGRESS')
              AND expires_at IS NOT NULL
              AND expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error expiring overdue instances: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected())
    }

    async fn list_responses(&self, instance_id: &Uuid) -> Result<Vec<Response>, DomainError> {
        let rows: Vec<ResponseRow> = sqlx::query_as(
            r#"
            SELECT
                id, instance_id, question_id, numeric_value, text_value,
                selected_option_id, answered_at, modified_at
            FROM responses
            WHERE instance_id = $1
            ORDER BY answered_at ASC
            "#,
        )
        .bind(instance_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing responses: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count_responses(&self, instance_id: &Uuid) -> Result<i64, DomainError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM responses WHERE instance_id = $1"#,
        )
        .bind(instance_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error counting responses: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(count)
    }

    async fn upsert_response(&self, response: &Response) -> Result<Response, DomainError> {
        let row: ResponseRow = sqlx::query_as(
            r#"
            INSERT INTO responses (
                id, instance_id, question_id, numeric_value, text_value,
                selected_option_id, answered_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (instance_id, question_id) DO UPDATE SET
                numeric_value = EXCLUDED.numeric_value,
                text_value = EXCLUDED.text_value,
                selected_option_id = EXCLUDED.selected_option_id,
                modified_at = NOW()
            RETURNING
                id, instance_id, question_id, numeric_value, text_value,
                selected_option_id, answered_at, modified_at
            "#,
        )
        .bind(response.id)
        .bind(response.instance_id)
        .bind(response.question_id)
        .bind(response.numeric_value)
        .bind(&response.text_value)
        .bind(response.selected_option_id)
        .bind(response.answered_at)
        .bind(response.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error upserting response: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn find_profile_by_instance(
        &self,
        instance_id: &Uuid,
    ) -> Result<Option<ScoreProfile>, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, instance_id, dimension_scores, percentile_scores,
                profile_type, strengths, development_areas, recommendations,
                calculated_at, modified_at
            FROM score_profiles
            WHERE instance_id = $1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding score profile: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn complete_instance(
        &self,
        instance: &AssessmentInstance,
        profile: &ScoreProfile,
    ) -> Result<(), DomainError> {
        info!("Completing assessment instance: {}", instance.id);

        let mut tx = tenant_tx(&self.pool, &instance.organization_id).await?;

        sqlx::query(
            r#"
            UPDATE assessment_instances SET
                status = $2,
                current_question = $3,
                progress_percentage = $4,
                started_at = $5,
                completed_at = $6,
                raw_scores = $7,
                percentile_scores = $8
            WHERE id = $1
            "#,
        )
        .bind(instance.id)
        .bind(instance.status.as_str())
        .bind(instance.current_question)
        .bind(instance.progress_percentage)
        .bind(instance.started_at)
        .bind(instance.completed_at)
        .bind(Json(&instance.raw_scores))
        .bind(Json(&instance.percentile_scores))
        .execute(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error completing instance: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO score_profiles (
                id, organization_id, instance_id, dimension_scores, percentile_scores,
                profile_type, strengths, development_areas, recommendations,
                calculated_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (instance_id) DO UPDATE SET
                dimension_scores = EXCLUDED.dimension_scores,
                percentile_scores = EXCLUDED.percentile_scores,
                profile_type = EXCLUDED.profile_type,
                strengths = EXCLUDED.strengths,
                development_areas = EXCLUDED.development_areas,
                recommendations = EXCLUDED.recommendations,
                modified_at = NOW()
            "#,
        )
        .bind(profile.id)
        .bind(profile.organization_id)
        .bind(profile.instance_id)
        .bind(Json(&profile.dimension_scores))
        .bind(Json(&profile.percentile_scores))
        .bind(&profile.profile_type)
        .bind(&profile.strengths)
        .bind(&profile.development_areas)
        .bind(&profile.recommendations)
        .bind(profile.calculated_at)
        .bind(profile.modified_at)
        .execute(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error saving score profile: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        commit(tx).await?;

        info!("Assessment instance completed: {}", instance.id);
        Ok(())
    }
}
