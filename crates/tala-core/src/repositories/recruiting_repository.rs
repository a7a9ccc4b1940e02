//! Recruiting repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Candidate, Client, Interview, Job, JobApplication, Placement};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecruitingRepository: Send + Sync {
    // Clients
    async fn find_client(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Client>, DomainError>;
    async fn list_clients(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Client>, DomainError>;
    async fn create_client(&self, client: &Client) -> Result<Client, DomainError>;
    async fn update_client(&self, client: &Client) -> Result<Client, DomainError>;

    // Jobs
    async fn find_job(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Job>, DomainError>;
    async fn list_jobs(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Job>, DomainError>;
    async fn count_open_jobs(&self, organization_id: &Uuid) -> Result<i64, DomainError>;
    async fn create_job(&self, job: &Job) -> Result<Job, DomainError>;
    async fn update_job(&self, job: &Job) -> Result<Job, DomainError>;

    // Candidates
    async fn find_candidate(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Candidate>, DomainError>;
    async fn find_candidate_by_email(
        &self,
        organization_id: &Uuid,
        email: &str,
    ) -> Result<Option<Candidate>, DomainError>;
    async fn list_candidates(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Candidate>, DomainError>;
    async fn create_candidate(&self, candidate: &Candidate) -> Result<Candidate, DomainError>;
    async fn update_candidate(&self, candidate: &Candidate) -> Result<Candidate, DomainError>;

    // Applications
    async fn find_application(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<JobApplication>, DomainError>;
    async fn find_application_for_job(
        &self,
        candidate_id: &Uuid,
        job_id: &Uuid,
    ) -> Result<Option<JobApplication>, DomainError>;
    async fn list_applications_for_job(
        &self,
        job_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<JobApplication>, DomainError>;
    async fn create_application(
        &self,
        application: &JobApplication,
    ) -> Result<JobApplication, DomainError>;
    async fn update_application(
        &self,
        application: &JobApplication,
    ) -> Result<JobApplication, DomainError>;

    // Interviews
    async fn find_interview(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Interview>, DomainError>;
    async fn list_interviews_for_application(
        &self,
        application_id: &Uuid,
    ) -> Result<Vec<Interview>, DomainError>;
    async fn create_interview(&self, interview: &Interview) -> Result<Interview, DomainError>;
    async fn update_interview(&self, interview: &Interview) -> Result<Interview, DomainError>;

    // Placements
    async fn create_placement(&self, placement: &Placement) -> Result<Placement, DomainError>;
    async fn list_placements(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Placement>, DomainError>;
    async fn update_placement(&self, placement: &Placement) -> Result<Placement, DomainError>;
}
