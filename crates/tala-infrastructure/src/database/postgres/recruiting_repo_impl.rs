// ============================================================================
// Tala Infrastructure - PostgreSQL Recruiting Repository
// File: crates/tala-infrastructure/src/database/postgres/recruiting_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    ApplicationStatus, Candidate, CandidateStatus, Client, Interview, InterviewKind,
    InterviewStatus, Job, JobApplication, JobStatus, Placement,
};
use tala_core::error::DomainError;
use tala_core::repositories::RecruitingRepository;
use tala_security::FieldCipher;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgRecruitingRepository {
    pool: PgPool,
    cipher: Arc<FieldCipher>,
}

impl PgRecruitingRepository {
    pub fn new(pool: PgPool, cipher: Arc<FieldCipher>) -> Self {
        Self { pool, cipher }
    }

    fn decrypt_client(&self, mut client: Client) -> Client {
        client.primary_contact_email = self.cipher.decrypt(&client.primary_contact_email);
        client.primary_contact_phone = self.cipher.decrypt(&client.primary_contact_phone);
        client
    }

    fn decrypt_candidate(&self, mut candidate: Candidate) -> Candidate {
        candidate.email = self.cipher.decrypt(&candidate.email);
        candidate.phone = self.cipher.decrypt(&candidate.phone);
        candidate
    }

    fn encrypt(&self, value: &str) -> Result<String, DomainError> {
        self.cipher
            .encrypt(value)
            .map_err(|e| DomainError::InternalError(e.to_string()))
    }

    /// Deterministic digest of the lowercased address, used for equality
    /// lookups over the encrypted email column.
    fn email_digest(email: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(email.trim().to_lowercase().as_bytes());
        hex::encode(hasher.finalize())
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct ClientRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub industry: String,
    pub primary_contact_name: String,
    pub primary_contact_email: String,
    pub primary_contact_phone: String,
    pub website: String,
    pub description: String,
    pub contract_start_date: Option<NaiveDate>,
    pub contract_end_date: Option<NaiveDate>,
    pub commission_rate: Decimal,
    pub payment_terms: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            organization_id: row.organization_id,
            name: row.name,
            industry: row.industry,
            primary_contact_name: row.primary_contact_name,
            primary_contact_email: row.primary_contact_email,
            primary_contact_phone: row.primary_contact_phone,
            website: row.website,
            description: row.description,
            contract_start_date: row.contract_start_date,
            contract_end_date: row.contract_end_date,
            commission_rate: row.commission_rate,
            payment_terms: row.payment_terms,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct JobRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub location: String,
    pub remote_allowed: bool,
    pub min_experience_years: i32,
    pub max_experience_years: Option<i32>,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub currency: String,
    pub status: String,
    pub positions_available: i32,
    pub positions_filled: i32,
    pub posted_date: Option<NaiveDate>,
    pub application_deadline: Option<NaiveDate>,
    pub requires_assessment: bool,
    pub assessment_definition_id: Option<Uuid>,
    pub assigned_recruiter: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<JobRow> for Job {
    fn from(row: JobRow) -> Self {
        Job {
            id: row.id,
            organization_id: row.organization_id,
            client_id: row.client_id,
            title: row.title,
            description: row.description,
            requirements: row.requirements,
            location: row.location,
            remote_allowed: row.remote_allowed,
            min_experience_years: row.min_experience_years,
            max_experience_years: row.max_experience_years,
            required_skills: row.required_skills,
            preferred_skills: row.preferred_skills,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            currency: row.currency,
            status: JobStatus::from_str(&row.status).unwrap_or(JobStatus::Draft),
            positions_available: row.positions_available,
            positions_filled: row.positions_filled,
            posted_date: row.posted_date,
            application_deadline: row.application_deadline,
            requires_assessment: row.requires_assessment,
            assessment_definition_id: row.assessment_definition_id,
            assigned_recruiter: row.assigned_recruiter,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub current_title: String,
    pub current_company: String,
    pub experience_years: i32,
    pub location: String,
    pub willing_to_relocate: bool,
    pub skills: Vec<String>,
    pub languages: Vec<String>,
    pub salary_expectation_min: Option<Decimal>,
    pub salary_expectation_max: Option<Decimal>,
    pub currency: String,
    pub linkedin_url: String,
    pub status: String,
    pub notes: String,
    pub source: String,
    pub assigned_recruiter: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Candidate {
            id: row.id,
            organization_id: row.organization_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            current_title: row.current_title,
            current_company: row.current_company,
            experience_years: row.experience_years,
            location: row.location,
            willing_to_relocate: row.willing_to_relocate,
            skills: row.skills,
            languages: row.languages,
            salary_expectation_min: row.salary_expectation_min,
            salary_expectation_max: row.salary_expectation_max,
            currency: row.currency,
            linkedin_url: row.linkedin_url,
            status: CandidateStatus::from_str(&row.status).unwrap_or(CandidateStatus::New),
            notes: row.notes,
            source: row.source,
            assigned_recruiter: row.assigned_recruiter,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,
    pub status: String,
    pub applied_at: DateTime<Utc>,
    pub cover_letter: String,
    pub assessment_instance_id: Option<Uuid>,
    pub fit_score: Option<f64>,
    pub interview_rating: Option<i32>,
    pub offer_extended_at: Option<DateTime<Utc>>,
    pub offer_amount: Option<Decimal>,
    pub offer_accepted_at: Option<DateTime<Utc>>,
    pub start_date: Option<NaiveDate>,
    pub rejection_at: Option<DateTime<Utc>>,
    pub rejection_reason: String,
    pub recruiter_id: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<ApplicationRow> for JobApplication {
    fn from(row: ApplicationRow) -> Self {
        JobApplication {
            id: row.id,
            organization_id: row.organization_id,
            candidate_id: row.candidate_id,
            job_id: row.job_id,
            status: ApplicationStatus::from_str(&row.status)
                .unwrap_or(ApplicationStatus::Applied),
            applied_at: row.applied_at,
            cover_letter: row.cover_letter,
            assessment_instance_id: row.assessment_instance_id,
            fit_score: row.fit_score,
            interview_rating: row.interview_rating,
            offer_extended_at: row.offer_extended_at,
            offer_amount: row.offer_amount,
            offer_accepted_at: row.offer_accepted_at,
            start_date: row.start_date,
            rejection_at: row.rejection_at,
            rejection_reason: row.rejection_reason,
            recruiter_id: row.recruiter_id,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InterviewRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub application_id: Uuid,
    pub kind: String,
    pub status: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location_or_link: String,
    pub interviewer_id: Uuid,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_rating: Option<i32>,
    pub feedback: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<InterviewRow> for Interview {
    fn from(row: InterviewRow) -> Self {
        Interview {
            id: row.id,
            organization_id: row.organization_id,
            application_id: row.application_id,
            kind: InterviewKind::from_str(&row.kind).unwrap_or(InterviewKind::Video),
            status: InterviewStatus::from_str(&row.status)
                .unwrap_or(InterviewStatus::Scheduled),
            scheduled_at: row.scheduled_at,
            duration_minutes: row.duration_minutes,
            location_or_link: row.location_or_link,
            interviewer_id: row.interviewer_id,
            completed_at: row.completed_at,
            overall_rating: row.overall_rating,
            feedback: row.feedback,
            recommendation: row.recommendation,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PlacementRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub application_id: Uuid,
    pub start_date: NaiveDate,
    pub salary: Decimal,
    pub currency: String,
    pub commission_earned: Option<Decimal>,
    pub guarantee_period_days: i32,
    pub guarantee_end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub termination_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<PlacementRow> for Placement {
    fn from(row: PlacementRow) -> Self {
        Placement {
            id: row.id,
            organization_id: row.organization_id,
            application_id: row.application_id,
            start_date: row.start_date,
            salary: row.salary,
            currency: row.currency,
            commission_earned: row.commission_earned,
            guarantee_period_days: row.guarantee_period_days,
            guarantee_end_date: row.guarantee_end_date,
            is_active: row.is_active,
            termination_date: row.termination_date,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[async_trait]
impl RecruitingRepository for PgRecruitingRepository {
    async fn find_client(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Client>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, industry, primary_contact_name,
                primary_contact_email, primary_contact_phone, website, description,
                contract_start_date, contract_end_date, commission_rate,
                payment_terms, is_active, created_at, created_by, modified_at,
                removed_at
            FROM clients
            WHERE organization_id = $1 AND id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding client: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| self.decrypt_client(r.into())))
    }

    async fn list_clients(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Client>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<ClientRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, name, industry, primary_contact_name,
                primary_contact_email, primary_contact_phone, website, description,
                contract_start_date, contract_end_date, commission_rate,
                payment_terms, is_active, created_at, created_by, modified_at,
                removed_at
            FROM clients
            WHERE organization_id = $1 AND removed_at IS NULL
            ORDER BY name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing clients: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| self.decrypt_client(r.into()))
            .collect())
    }

    async fn create_client(&self, client: &Client) -> Result<Client, DomainError> {
        info!("Creating client: {}", client.name);

        let mut tx = tenant_tx(&self.pool, &client.organization_id).await?;
        let row: ClientRow = sqlx::query_as(
            r#"
            INSERT INTO clients (
                id, organization_id, name, industry, primary_contact_name,
                primary_contact_email, primary_contact_phone, website, description,
                contract_start_date, contract_end_date, commission_rate,
                payment_terms, is_active, created_at, created_by, modified_at,
                removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18)
            RETURNING
                id, organization_id, name, industry, primary_contact_name,
                primary_contact_email, primary_contact_phone, website, description,
                contract_start_date, contract_end_date, commission_rate,
                payment_terms, is_active, created_at, created_by, modified_at,
                removed_at
            "#,
        )
        .bind(client.id)
        .bind(client.organization_id)
        .bind(&client.name)
        .bind(&client.industry)
        .bind(&client.primary_contact_name)
        .bind(self.encrypt(&client.primary_contact_email)?)
        .bind(self.encrypt(&client.primary_contact_phone)?)
        .bind(&client.website)
        .bind(&client.description)
        .bind(client.contract_start_date)
        .bind(client.contract_end_date)
        .bind(client.commission_rate)
        .bind(&client.payment_terms)
        .bind(client.is_active)
        .bind(client.created_at)
        .bind(client.created_by)
        .bind(client.modified_at)
        .bind(client.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating client: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Client created successfully: {}", row.id);
        Ok(self.decrypt_client(row.into()))
    }

    async fn update_client(&self, client: &Client) -> Result<Client, DomainError> {
        let mut tx = tenant_tx(&self.pool, &client.organization_id).await?;
        let row: ClientRow = sqlx::query_as(
            r#"
            UPDATE clients SET
                name = $2,
                industry = $3,
                primary_contact_name = $4,
                primary_contact_email = $5,
                primary_contact_phone = $6,
                website = $7,
                description = $8,
                contract_start_date = $9,
                contract_end_date = $10,
                commission_rate = $11,
                payment_terms = $12,
                is_active = $13,
                modified_at = $14,
                removed_at = $15
            WHERE id = $1
            RETURNING
                id, organization_id, name, industry, primary_contact_name,
                primary_contact_email, primary_contact_phone, website, description,
                contract_start_date, contract_end_date, commission_rate,
                payment_terms, is_active, created_at, created_by, modified_at,
                removed_at
            "#,
        )
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.industry)
        .bind(&client.primary_contact_name)
        .bind(self.encrypt(&client.primary_contact_email)?)
        .bind(self.encrypt(&client.primary_contact_phone)?)
        .bind(&client.website)
        .bind(&client.description)
        .bind(client.contract_start_date)
        .bind(client.contract_end_date)
        .bind(client.commission_rate)
        .bind(&client.payment_terms)
        .bind(client.is_active)
        .bind(client.modified_at)
        .bind(client.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating client: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(self.decrypt_client(row.into()))
    }

    async fn find_job(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Job>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, client_id, title, description, requirements,
                location, remote_allowed, min_experience_years, max_experience_years,
                required_skills, preferred_skills, salary_min, salary_max, currency,
                status, positions_available, positions_filled, posted_date,
                application_deadline, requires_assessment, assessment_definition_id,
                assigned_recruiter, created_at, created_by, modified_at, removed_at
            FROM jobs
            WHERE organization_id = $1 AND id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding job: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_jobs(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Job>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, client_id, title, description, requirements,
                location, remote_allowed, min_experience_years, max_experience_years,
                required_skills, preferred_skills, salary_min, salary_max, currency,
                status, positions_available, positions_filled, posted_date,
                application_deadline, requires_assessment, assessment_definition_id,
                assigned_recruiter, created_at, created_by, modified_at, removed_at
            FROM jobs
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
            error!("Database error listing jobs: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count_open_jobs(&self, organization_id: &Uuid) -> Result<i64, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM jobs
            WHERE organization_id = $1 AND status = 'OPEN' AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error counting open jobs: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(count)
    }

    async fn create_job(&self, job: &Job) -> Result<Job, DomainError> {
        info!("Creating job: {}", job.title);

        let mut tx = tenant_tx(&self.pool, &job.organization_id).await?;
        let row: JobRow = sqlx::query_as(
            r#"
            INSERT INTO jobs (
                id, organization_id, client_id, title, description, requirements,
                location, remote_allowed, min_experience_years, max_experience_years,
                required_skills, preferred_skills, salary_min, salary_max, currency,
                status, positions_available, positions_filled, posted_date,
                application_deadline, requires_assessment, assessment_definition_id,
                assigned_recruiter, created_at, created_by, modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            RETURNING
                id, organization_id, client_id, title, description, requirements,
                location, remote_allowed, min_experience_years, max_experience_years,
                required_skills, preferred_skills, salary_min, salary_max, currency,
                status, positions_available, positions_filled, posted_date,
                application_deadline, requires_assessment, assessment_definition_id,
                assigned_recruiter, created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(job.id)
        .bind(job.organization_id)
        .bind(job.client_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.location)
        .bind(job.remote_allowed)
        .bind(job.min_experience_years)
        .bind(job.max_experience_years)
        .bind(&job.required_skills)
        .bind(&job.preferred_skills)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.currency)
        .bind(job.status.as_str())
        .bind(job.positions_available)
        .bind(job.positions_filled)
        .bind(job.posted_date)
        .bind(job.application_deadline)
        .bind(job.requires_assessment)
        .bind(job.assessment_definition_id)
        .bind(job.assigned_recruiter)
        .bind(job.created_at)
        .bind(job.created_by)
        .bind(job.modified_at)
        .bind(job.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating job: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Job created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_job(&self, job: &Job) -> Result<Job, DomainError> {
        let mut tx = tenant_tx(&self.pool, &job.organization_id).await?;
        let row: JobRow = sqlx::query_as(
            r#"
            UPDATE jobs SET
                client_id = $2,
                title = $3,
                description = $4,
                requirements = $5,
                location = $6,
                remote_allowed = $7,
                min_experience_years = $8,
                max_experience_years = $9,
                required_skills = $10,
                preferred_skills = $11,
                salary_min = $12,
                salary_max = $13,
                currency = $14,
                status = $15,
                positions_available = $16,
                positions_filled = $17,
                posted_date = $18,
                application_deadline = $19,
                requires_assessment = $20,
                assessment_definition_id = $21,
                assigned_recruiter = $22,
                modified_at = $23,
                removed_at = $24
            WHERE id = $1
            RETURNING
                id, organization_id, client_id, title, description, requirements,
                location, remote_allowed, min_experience_years, max_experience_years,
                required_skills, preferred_skills, salary_min, salary_max, currency,
                status, positions_available, positions_filled, posted_date,
                application_deadline, requires_assessment, assessment_definition_id,
                assigned_recruiter, created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(job.id)
        .bind(job.client_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.location)
        .bind(job.remote_allowed)
        .bind(job.min_experience_years)
        .bind(job.max_experience_years)
        .bind(&job.required_skills)
        .bind(&job.preferred_skills)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .bind(&job.currency)
        .bind(job.status.as_str())
        .bind(job.positions_available)
        .bind(job.positions_filled)
        .bind(job.posted_date)
        .bind(job.application_deadline)
        .bind(job.requires_assessment)
        .bind(job.assessment_definition_id)
        .bind(job.assigned_recruiter)
        .bind(job.modified_at)
        .bind(job.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating job: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_candidate(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Candidate>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<CandidateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, first_name, last_name, email, phone,
                current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            FROM candidates
            WHERE organization_id = $1 AND id = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding candidate: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| self.decrypt_candidate(r.into())))
    }

    async fn find_candidate_by_email(
        &self,
        organization_id: &Uuid,
        email: &str,
    ) -> Result<Option<Candidate>, DomainError> {
        let digest = Self::email_digest(email);

        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<CandidateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, first_name, last_name, email, phone,
                current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            FROM candidates
            WHERE organization_id = $1 AND email_digest = $2 AND removed_at IS NULL
            "#,
        )
        .bind(organization_id)
        .bind(&digest)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding candidate by email: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| self.decrypt_candidate(r.into())))
    }

    async fn list_candidates(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Candidate>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<CandidateRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, first_name, last_name, email, phone,
                current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            FROM candidates
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
            error!("Database error listing candidates: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| self.decrypt_candidate(r.into()))
            .collect())
    }

    async fn create_candidate(&self, candidate: &Candidate) -> Result<Candidate, DomainError> {
        info!(
            "Creating candidate: {} {}",
            candidate.first_name, candidate.last_name
        );

        let digest = Self::email_digest(&candidate.email);

        let mut tx = tenant_tx(&self.pool, &candidate.organization_id).await?;
        let row: CandidateRow = sqlx::query_as(
            r#"
            INSERT INTO candidates (
                id, organization_id, first_name, last_name, email, email_digest,
                phone, current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
            RETURNING
                id, organization_id, first_name, last_name, email, phone,
                current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            "#,
        )
        .bind(candidate.id)
        .bind(candidate.organization_id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(self.encrypt(&candidate.email)?)
        .bind(&digest)
        .bind(self.encrypt(&candidate.phone)?)
        .bind(&candidate.current_title)
        .bind(&candidate.current_company)
        .bind(candidate.experience_years)
        .bind(&candidate.location)
        .bind(candidate.willing_to_relocate)
        .bind(&candidate.skills)
        .bind(&candidate.languages)
        .bind(candidate.salary_expectation_min)
        .bind(candidate.salary_expectation_max)
        .bind(&candidate.currency)
        .bind(&candidate.linkedin_url)
        .bind(candidate.status.as_str())
        .bind(&candidate.notes)
        .bind(&candidate.source)
        .bind(candidate.assigned_recruiter)
        .bind(candidate.created_at)
        .bind(candidate.created_by)
        .bind(candidate.modified_at)
        .bind(candidate.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating candidate: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::EmailAlreadyExists(candidate.email.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        info!("Candidate created successfully: {}", row.id);
        Ok(self.decrypt_candidate(row.into()))
    }

    async fn update_candidate(&self, candidate: &Candidate) -> Result<Candidate, DomainError> {
        let digest = Self::email_digest(&candidate.email);

        let mut tx = tenant_tx(&self.pool, &candidate.organization_id).await?;
        let row: CandidateRow = sqlx::query_as(
            r#"
            UPDATE candidates SET
                first_name = $2,
                last_name = $3,
                email = $4,
                email_digest = $5,
                phone = $6,
                current_title = $7,
                current_company = $8,
                experience_years = $9,
                location = $10,
                willing_to_relocate = $11,
                skills = $12,
                languages = $13,
                salary_expectation_min = $14,
                salary_expectation_max = $15,
                currency = $16,
                linkedin_url = $17,
                status = $18,
                notes = $19,
                source = $20,
                assigned_recruiter = $21,
                modified_at = $22,
                removed_at = $23
            WHERE id = $1
            RETURNING
                id, organization_id, first_name, last_name, email, phone,
                current_title, current_company, experience_years, location,
                willing_to_relocate, skills, languages, salary_expectation_min,
                salary_expectation_max, currency, linkedin_url, status, notes,
                source, assigned_recruiter, created_at, created_by, modified_at,
                removed_at
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(self.encrypt(&candidate.email)?)
        .bind(&digest)
        .bind(self.encrypt(&candidate.phone)?)
        .bind(&candidate.current_title)
        .bind(&candidate.current_company)
        .bind(candidate.experience_years)
        .bind(&candidate.location)
        .bind(candidate.willing_to_relocate)
        .bind(&candidate.skills)
        .bind(&candidate.languages)
        .bind(candidate.salary_expectation_min)
        .bind(candidate.salary_expectation_max)
        .bind(&candidate.currency)
        .bind(&candidate.linkedin_url)
        .bind(candidate.status.as_str())
        .bind(&candidate.notes)
        .bind(&candidate.source)
        .bind(candidate.assigned_recruiter)
        .bind(candidate.modified_at)
        .bind(candidate.removed_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating candidate: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::EmailAlreadyExists(candidate.email.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        Ok(self.decrypt_candidate(row.into()))
    }

    async fn find_application(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<JobApplication>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            FROM job_applications
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding application: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_application_for_job(
        &self,
        candidate_id: &Uuid,
        job_id: &Uuid,
    ) -> Result<Option<JobApplication>, DomainError> {
        let row: Option<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            FROM job_applications
            WHERE candidate_id = $1 AND job_id = $2
            "#,
        )
        .bind(candidate_id)
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding application for job: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_applications_for_job(
        &self,
        job_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<JobApplication>, DomainError> {
        let pagination = pagination.clamped();
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            FROM job_applications
            WHERE job_id = $1
            ORDER BY applied_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(job_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing applications: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_application(
        &self,
        application: &JobApplication,
    ) -> Result<JobApplication, DomainError> {
        info!(
            "Creating application of candidate {} for job {}",
            application.candidate_id, application.job_id
        );

        let mut tx = tenant_tx(&self.pool, &application.organization_id).await?;
        let row: ApplicationRow = sqlx::query_as(
            r#"
            INSERT INTO job_applications (
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18)
            RETURNING
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            "#,
        )
        .bind(application.id)
        .bind(application.organization_id)
        .bind(application.candidate_id)
        .bind(application.job_id)
        .bind(application.status.as_str())
        .bind(application.applied_at)
        .bind(&application.cover_letter)
        .bind(application.assessment_instance_id)
        .bind(application.fit_score)
        .bind(application.interview_rating)
        .bind(application.offer_extended_at)
        .bind(application.offer_amount)
        .bind(application.offer_accepted_at)
        .bind(application.start_date)
        .bind(application.rejection_at)
        .bind(&application.rejection_reason)
        .bind(application.recruiter_id)
        .bind(application.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating application: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::ApplicationAlreadyExists
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        info!("Application created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_application(
        &self,
        application: &JobApplication,
    ) -> Result<JobApplication, DomainError> {
        let mut tx = tenant_tx(&self.pool, &application.organization_id).await?;
        let row: ApplicationRow = sqlx::query_as(
            r#"
            UPDATE job_applications SET
                status = $2,
                cover_letter = $3,
                assessment_instance_id = $4,
                fit_score = $5,
                interview_rating = $6,
                offer_extended_at = $7,
                offer_amount = $8,
                offer_accepted_at = $9,
                start_date = $10,
                rejection_at = $11,
                rejection_reason = $12,
                recruiter_id = $13,
                modified_at = $14
            WHERE id = $1
            RETURNING
                id, organization_id, candidate_id, job_id, status, applied_at,
                cover_letter, assessment_instance_id, fit_score, interview_rating,
                offer_extended_at, offer_amount, offer_accepted_at, start_date,
                rejection_at, rejection_reason, recruiter_id, modified_at
            "#,
        )
        .bind(application.id)
        .bind(application.status.as_str())
        .bind(&application.cover_letter)
        .bind(application.assessment_instance_id)
        .bind(application.fit_score)
        .bind(application.interview_rating)
        .bind(application.offer_extended_at)
        .bind(application.offer_amount)
        .bind(application.offer_accepted_at)
        .bind(application.start_date)
        .bind(application.rejection_at)
        .bind(&application.rejection_reason)
        .bind(application.recruiter_id)
        .bind(application.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating application: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_interview(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Interview>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<InterviewRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, application_id, kind, status, scheduled_at,
                duration_minutes, location_or_link, interviewer_id, completed_at,
                overall_rating, feedback, recommendation, created_at, created_by,
                modified_at
            FROM interviews
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding interview: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_interviews_for_application(
        &self,
        application_id: &Uuid,
    ) -> Result<Vec<Interview>, DomainError> {
        let rows: Vec<InterviewRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, application_id, kind, status, scheduled_at,
                duration_minutes, location_or_link, interviewer_id, completed_at,
                overall_rating, feedback, recommendation, created_at, created_by,
                modified_at
            FROM interviews
            WHERE application_id = $1
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing interviews: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_interview(&self, interview: &Interview) -> Result<Interview, DomainError> {
        info!(
            "Scheduling {} interview for application {}",
            interview.kind.as_str(),
            interview.application_id
        );

        let mut tx = tenant_tx(&self.pool, &interview.organization_id).await?;
        let row: InterviewRow = sqlx::query_as(
            r#"
            INSERT INTO interviews (
                id, organization_id, application_id, kind, status, scheduled_at,
                duration_minutes, location_or_link, interviewer_id, completed_at,
                overall_rating, feedback, recommendation, created_at, created_by,
                modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16)
            RETURNING
                id, organization_id, application_id, kind, status, scheduled_at,
                duration_minutes, location_or_link, interviewer_id, completed_at,
                overall_rating, feedback, recommendation, created_at, created_by,
                modified_at
            "#,
        )
        .bind(interview.id)
        .bind(interview.organization_id)
        .bind(interview.application_id)
        .bind(interview.kind.as_str())
        .bind(interview.status.as_str())
        .bind(interview.scheduled_at)
        .bind(interview.duration_minutes)
        .bind(&interview.location_or_link)
        .bind(interview.interviewer_id)
        .bind(interview.completed_at)
        .bind(interview.overall_rating)
        .bind(&interview.feedback)
        .bind(&interview.recommendation)
        .bind(interview.created_at)
        .bind(interview.created_by)
        .bind(interview.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating interview: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_interview(&self, interview: &Interview) -> Result<Interview, DomainError> {
        let mut tx = tenant_tx(&self.pool, &interview.organization_id).await?;
        let row: InterviewRow = sqlx::query_as(
            r#"
            UPDATE interviews SET
                kind = $2,
                status = $3,
                scheduled_at = $4,
                duration_minutes = $5,
                location_or_link = $6,
                interviewer_id = $7,
                completed_at = $8,
                overall_rating = $9,
                feedback = $10,
                recommendation = $11,
                modified_at = $12
            WHERE id = $1
            RETURNING
                id, organization_id, application_id, kind, status, scheduled_at,
                duration_minutes, location_or_link, interviewer_id, completed_at,
                overall_rating, feedback, recommendation, created_at, created_by,
                modified_at
            "#,
        )
        .bind(interview.id)
        .bind(interview.kind.as_str())
        .bind(interview.status.as_str())
        .bind(interview.scheduled_at)
        .bind(interview.duration_minutes)
        .bind(&interview.location_or_link)
        .bind(interview.interviewer_id)
        .bind(interview.completed_at)
        .bind(interview.overall_rating)
        .bind(&interview.feedback)
        .bind(&interview.recommendation)
        .bind(interview.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating interview: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn create_placement(&self, placement: &Placement) -> Result<Placement, DomainError> {
        info!(
            "Creating placement for application {}",
            placement.application_id
        );

        let mut tx = tenant_tx(&self.pool, &placement.organization_id).await?;
        let row: PlacementRow = sqlx::query_as(
            r#"
            INSERT INTO placements (
                id, organization_id, application_id, start_date, salary, currency,
                commission_earned, guarantee_period_days, guarantee_end_date,
                is_active, termination_date, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, organization_id, application_id, start_date, salary, currency,
                commission_earned, guarantee_period_days, guarantee_end_date,
                is_active, termination_date, created_at, modified_at
            "#,
        )
        .bind(placement.id)
        .bind(placement.organization_id)
        .bind(placement.application_id)
        .bind(placement.start_date)
        .bind(placement.salary)
        .bind(&placement.currency)
        .bind(placement.commission_earned)
        .bind(placement.guarantee_period_days)
        .bind(placement.guarantee_end_date)
        .bind(placement.is_active)
        .bind(placement.termination_date)
        .bind(placement.created_at)
        .bind(placement.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating placement: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        info!("Placement created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn list_placements(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Placement>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<PlacementRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, application_id, start_date, salary, currency,
                commission_earned, guarantee_period_days, guarantee_end_date,
                is_active, termination_date, created_at, modified_at
            FROM placements
            WHERE organization_id = $1
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
            error!("Database error listing placements: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_placement(&self, placement: &Placement) -> Result<Placement, DomainError> {
        let mut tx = tenant_tx(&self.pool, &placement.organization_id).await?;
        let row: PlacementRow = sqlx::query_as(
            r#"
            UPDATE placements SET
                start_date = $2,
                salary = $3,
                currency = $4,
                commission_earned = $5,
                guarantee_period_days = $6,
                guarantee_end_date = $7,
                is_active = $8,
                termination_date = $9,
                modified_at = $10
            WHERE id = $1
            RETURNING
                id, organization_id, application_id, start_date, salary, currency,
                commission_earned, guarantee_period_days, guarantee_end_date,
                is_active, termination_date, created_at, modified_at
            "#,
        )
        .bind(placement.id)
        .bind(placement.start_date)
        .bind(placement.salary)
        .bind(&placement.currency)
        .bind(placement.commission_earned)
        .bind(placement.guarantee_period_days)
        .bind(placement.guarantee_end_date)
        .bind(placement.is_active)
        .bind(placement.termination_date)
        .bind(placement.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating placement: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }
}
