// ============================================================================
// Tala Core - Recruiting Service
// File: crates/tala-core/src/services/recruiting_service.rs
// ============================================================================
//! Clients, jobs, candidates and the application pipeline through placement

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use tala_shared::types::Pagination;

use crate::domain::{
    fit_score, ApplicationStatus, Candidate, CandidateStatus, Client, Interview, InterviewKind,
    InterviewStatus, Job, JobApplication, JobStatus, Placement,
};
use crate::error::DomainError;
use crate::repositories::{AssessmentRepository, RecruitingRepository};

pub struct RecruitingService<R, A>
where
    R: RecruitingRepository,
    A: AssessmentRepository,
{
    recruiting_repo: Arc<R>,
    assessment_repo: Arc<A>,
}

impl<R, A> RecruitingService<R, A>
where
    R: RecruitingRepository,
    A: AssessmentRepository,
{
    pub fn new(recruiting_repo: Arc<R>, assessment_repo: Arc<A>) -> Self {
        Self {
            recruiting_repo,
            assessment_repo,
        }
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    pub async fn create_client(
        &self,
        organization_id: &Uuid,
        name: &str,
        primary_contact_name: String,
        primary_contact_email: String,
        created_by: Option<Uuid>,
    ) -> Result<Client, DomainError> {
        let client = Client::new(
            *organization_id,
            name.to_string(),
            primary_contact_name,
            primary_contact_email,
            created_by,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let client = self.recruiting_repo.create_client(&client).await?;
        info!("Client created: {} in org {}", client.id, organization_id);
        Ok(client)
    }

    pub async fn get_client(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Client, DomainError> {
        self.recruiting_repo
            .find_client(organization_id, id)
            .await?
            .ok_or(DomainError::ClientNotFound)
    }

    pub async fn list_clients(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Client>, DomainError> {
        self.recruiting_repo
            .list_clients(organization_id, pagination.clamped())
            .await
    }

    pub async fn update_client(
        &self,
        organization_id: &Uuid,
        client: &Client,
    ) -> Result<Client, DomainError> {
        self.get_client(organization_id, &client.id).await?;
        self.recruiting_repo.update_client(client).await
    }

    pub async fn delete_client(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<(), DomainError> {
        let mut client = self.get_client(organization_id, id).await?;
        client.soft_delete();
        self.recruiting_repo.update_client(&client).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Jobs
    // ------------------------------------------------------------------

    pub async fn create_job(
        &self,
        organization_id: &Uuid,
        client_id: &Uuid,
        title: &str,
        description: String,
        created_by: Option<Uuid>,
    ) -> Result<Job, DomainError> {
        self.get_client(organization_id, client_id).await?;
        let job = Job::new(
            *organization_id,
            *client_id,
            title.to_string(),
            description,
            created_by,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let job = self.recruiting_repo.create_job(&job).await?;
        info!("Job created: {} for client {}", job.id, client_id);
        Ok(job)
    }

    pub async fn get_job(&self, organization_id: &Uuid, id: &Uuid) -> Result<Job, DomainError> {
        self.recruiting_repo
            .find_job(organization_id, id)
            .await?
            .ok_or(DomainError::JobNotFound)
    }

    pub async fn list_jobs(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Job>, DomainError> {
        self.recruiting_repo
            .list_jobs(organization_id, pagination.clamped())
            .await
    }

    pub async fn update_job(
        &self,
        organization_id: &Uuid,
        job: &Job,
    ) -> Result<Job, DomainError> {
        self.get_job(organization_id, &job.id).await?;
        self.recruiting_repo.update_job(job).await
    }

    /// Publishes a job, stamping the posted date. Closed openings stay
    /// closed.
    pub async fn open_job(&self, organization_id: &Uuid, id: &Uuid) -> Result<Job, DomainError> {
        let mut job = self.get_job(organization_id, id).await?;
        if matches!(
            job.status,
            JobStatus::Filled | JobStatus::Closed | JobStatus::Cancelled
        ) {
            return Err(DomainError::InvalidStatusTransition(format!(
                "cannot reopen a {} job",
                job.status.as_str()
            )));
        }
        job.open();
        self.recruiting_repo.update_job(&job).await
    }

    // ------------------------------------------------------------------
    // Candidates
    // ------------------------------------------------------------------

    pub async fn create_candidate(
        &self,
        organization_id: &Uuid,
        first_name: String,
        last_name: String,
        email: &str,
        created_by: Option<Uuid>,
    ) -> Result<Candidate, DomainError> {
        if self
            .recruiting_repo
            .find_candidate_by_email(organization_id, &email.to_lowercase())
            .await?
            .is_some()
        {
            return Err(DomainError::EmailAlreadyExists(email.to_string()));
        }
        let candidate = Candidate::new(
            *organization_id,
            first_name,
            last_name,
            email.to_string(),
            created_by,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let candidate = self.recruiting_repo.create_candidate(&candidate).await?;
        info!(
            "Candidate created: {} in org {}",
            candidate.id, organization_id
        );
        Ok(candidate)
    }

    pub async fn get_candidate(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Candidate, DomainError> {
        self.recruiting_repo
            .find_candidate(organization_id, id)
            .await?
            .ok_or(DomainError::CandidateNotFound)
    }

    pub async fn list_candidates(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Candidate>, DomainError> {
        self.recruiting_repo
            .list_candidates(organization_id, pagination.clamped())
            .await
    }

    pub async fn update_candidate(
        &self,
        organization_id: &Uuid,
        candidate: &Candidate,
    ) -> Result<Candidate, DomainError> {
        self.get_candidate(organization_id, &candidate.id).await?;
        self.recruiting_repo.update_candidate(candidate).await
    }

    pub async fn delete_candidate(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<(), DomainError> {
        let mut candidate = self.get_candidate(organization_id, id).await?;
        candidate.soft_delete();
        self.recruiting_repo.update_candidate(&candidate).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Applications
    // ------------------------------------------------------------------

    /// One application per (candidate, job); only OPEN jobs accept new
    /// ones.
    pub async fn apply(
        &self,
        organization_id: &Uuid,
        candidate_id: &Uuid,
        job_id: &Uuid,
        recruiter_id: Option<Uuid>,
        cover_letter: String,
    ) -> Result<JobApplication, DomainError> {
        self.get_candidate(organization_id, candidate_id).await?;
        let job = self.get_job(organization_id, job_id).await?;
        if job.status != JobStatus::Open {
            return Err(DomainError::ValidationError(
                "job is not open for applications".to_string(),
            ));
        }
        if self
            .recruiting_repo
            .find_application_for_job(candidate_id, job_id)
            .await?
            .is_some()
        {
            return Err(DomainError::ApplicationAlreadyExists);
        }

        let mut application = JobApplication::new(*organization_id, *candidate_id, *job_id);
        application.cover_letter = cover_letter;
        application.recruiter_id = recruiter_id;
        let application = self.recruiting_repo.create_application(&application).await?;
        info!(
            "Application created: candidate {} -> job {}",
            candidate_id, job_id
        );
        Ok(application)
    }

    pub async fn get_application(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<JobApplication, DomainError> {
        self.recruiting_repo
            .find_application(organization_id, id)
            .await?
            .ok_or(DomainError::ApplicationNotFound)
    }

    pub async fn list_applications(
        &self,
        organization_id: &Uuid,
        job_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<JobApplication>, DomainError> {
        self.get_job(organization_id, job_id).await?;
        self.recruiting_repo
            .list_applications_for_job(job_id, pagination.clamped())
            .await
    }

    /// Moves the application along the pipeline. Terminal applications
    /// stay put.
    pub async fn change_application_status(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
        status: ApplicationStatus,
    ) -> Result<JobApplication, DomainError> {
        let mut application = self.get_application(organization_id, id).await?;
        if !application.is_active() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "application is already {}",
                application.status.as_str()
            )));
        }
        application.change_status(status);
        let application = self.recruiting_repo.update_application(&application).await?;
        info!(
            "Application {} moved to {} after {} day(s) in pipeline",
            id,
            status.as_str(),
            application.days_in_pipeline()
        );
        Ok(application)
    }

    /// Attaches an assessment instance and flips the application to
    /// ASSESSMENT_SENT.
    pub async fn link_assessment(
        &self,
        organization_id: &Uuid,
        application_id: &Uuid,
        instance_id: &Uuid,
    ) -> Result<JobApplication, DomainError> {
        let mut application = self.get_application(organization_id, application_id).await?;
        if !application.is_active() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "application is already {}",
                application.status.as_str()
            )));
        }
        self.assessment_repo
            .find_instance(organization_id, instance_id)
            .await?
            .ok_or(DomainError::InstanceNotFound)?;
        application.link_assessment(*instance_id);
        self.recruiting_repo.update_application(&application).await
    }

    /// Recomputes the candidate-to-job fit and stores it when the linked
    /// assessment is complete. Returns `None` without touching the stored
    /// score when prerequisites are missing.
    pub async fn refresh_fit_score(
        &self,
        organization_id: &Uuid,
        application_id: &Uuid,
    ) -> Result<Option<f64>, DomainError> {
        let mut application = self.get_application(organization_id, application_id).await?;
        let candidate = self
            .get_candidate(organization_id, &application.candidate_id)
            .await?;
        let job = self.get_job(organization_id, &application.job_id).await?;

        let mut instance = None;
        let mut profile = None;
        if let Some(instance_id) = application.assessment_instance_id {
            instance = self
                .assessment_repo
                .find_instance(organization_id, &instance_id)
                .await?;
            profile = self
                .assessment_repo
                .find_profile_by_instance(&instance_id)
                .await?;
        }

        let score = fit_score(
            &application,
            &candidate,
            &job,
            instance.as_ref(),
            profile.as_ref(),
        );
        if let Some(score) = score {
            application.fit_score = Some(score);
            application.modified_at = Some(Utc::now());
            self.recruiting_repo.update_application(&application).await?;
        }
        Ok(score)
    }

    // ------------------------------------------------------------------
    // Interviews
    // ------------------------------------------------------------------

    pub async fn schedule_interview(
        &self,
        organization_id: &Uuid,
        application_id: &Uuid,
        kind: InterviewKind,
        scheduled_at: DateTime<Utc>,
        interviewer_id: &Uuid,
        created_by: Option<Uuid>,
    ) -> Result<Interview, DomainError> {
        let application = self.get_application(organization_id, application_id).await?;
        if !application.is_active() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "application is already {}",
                application.status.as_str()
            )));
        }
        let interview = Interview::new(
            *organization_id,
            *application_id,
            kind,
            scheduled_at,
            *interviewer_id,
            created_by,
        );
        self.recruiting_repo.create_interview(&interview).await
    }

    pub async fn get_interview(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Interview, DomainError> {
        self.recruiting_repo
            .find_interview(organization_id, id)
            .await?
            .ok_or(DomainError::InterviewNotFound)
    }

    pub async fn list_interviews(
        &self,
        organization_id: &Uuid,
        application_id: &Uuid,
    ) -> Result<Vec<Interview>, DomainError> {
        self.get_application(organization_id, application_id).await?;
        self.recruiting_repo
            .list_interviews_for_application(application_id)
            .await
    }

    /// Records the outcome and rolls the rating up onto the application.
    pub async fn complete_interview(
        &self,
        organization_id: &Uuid,
        interview_id: &Uuid,
        overall_rating: Option<i32>,
        feedback: String,
    ) -> Result<Interview, DomainError> {
        let mut interview = self.get_interview(organization_id, interview_id).await?;
        if !matches!(
            interview.status,
            InterviewStatus::Scheduled | InterviewStatus::InProgress
        ) {
            return Err(DomainError::InvalidStatusTransition(format!(
                "interview is already {}",
                interview.status.as_str()
            )));
        }
        interview.complete(overall_rating, feedback);
        let interview = self.recruiting_repo.update_interview(&interview).await?;

        if overall_rating.is_some() {
            let mut application = self
                .get_application(organization_id, &interview.application_id)
                .await?;
            application.interview_rating = overall_rating;
            application.modified_at = Some(Utc::now());
            self.recruiting_repo.update_application(&application).await?;
        }
        Ok(interview)
    }

    // ------------------------------------------------------------------
    // Placements
    // ------------------------------------------------------------------

    /// Hires the candidate: application HIRED, candidate PLACED, one more
    /// opening filled on the job, and a placement row with its guarantee
    /// window.
    pub async fn hire(
        &self,
        organization_id: &Uuid,
        application_id: &Uuid,
        start_date: NaiveDate,
        salary: Decimal,
    ) -> Result<Placement, DomainError> {
        let mut application = self.get_application(organization_id, application_id).await?;
        if !application.is_active() {
            return Err(DomainError::InvalidStatusTransition(format!(
                "application is already {}",
                application.status.as_str()
            )));
        }
        let mut candidate = self
            .get_candidate(organization_id, &application.candidate_id)
            .await?;
        let mut job = self.get_job(organization_id, &application.job_id).await?;
        let days_in_pipeline = application.days_in_pipeline();

        let placement = Placement::new(*organization_id, *application_id, start_date, salary);
        let placement = self.recruiting_repo.create_placement(&placement).await?;

        application.change_status(ApplicationStatus::Hired);
        application.start_date = Some(start_date);
        self.recruiting_repo.update_application(&application).await?;

        candidate.change_status(CandidateStatus::Placed);
        self.recruiting_repo.update_candidate(&candidate).await?;

        job.record_hire();
        self.recruiting_repo.update_job(&job).await?;

        info!(
            "Candidate {} placed on job {} after {} day(s) in pipeline",
            candidate.id, job.id, days_in_pipeline
        );
        Ok(placement)
    }

    pub async fn list_placements(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Placement>, DomainError> {
        self.recruiting_repo
            .list_placements(organization_id, pagination.clamped())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AssessmentInstance, ScoreProfile};
    use crate::repositories::assessment_repository::MockAssessmentRepository;
    use crate::repositories::recruiting_repository::MockRecruitingRepository;
    use std::collections::BTreeMap;

    fn service_with(
        recruiting_repo: MockRecruitingRepository,
        assessment_repo: MockAssessmentRepository,
    ) -> RecruitingService<MockRecruitingRepository, MockAssessmentRepository> {
        RecruitingService::new(Arc::new(recruiting_repo), Arc::new(assessment_repo))
    }

    fn candidate(org: Uuid) -> Candidate {
        Candidate::new(org, "Ana".into(), "Lima".into(), "ana@example.com".into(), None).unwrap()
    }

    fn open_job(org: Uuid) -> Job {
        let mut job = Job::new(org, Uuid::new_v4(), "Backend Engineer".into(), String::new(), None)
            .unwrap();
        job.open();
        job
    }

    #[tokio::test]
    async fn test_apply_rejects_duplicate() {
        let org = Uuid::new_v4();
        let the_candidate = candidate(org);
        let the_job = open_job(org);
        let candidate_id = the_candidate.id;
        let job_id = the_job.id;
        let existing = JobApplication::new(org, candidate_id, job_id);

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_candidate()
            .returning(move |_, _| Ok(Some(the_candidate.clone())));
        recruiting_repo
            .expect_find_job()
            .returning(move |_, _| Ok(Some(the_job.clone())));
        recruiting_repo
            .expect_find_application_for_job()
            .returning(move |_, _| Ok(Some(existing.clone())));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let err = service
            .apply(&org, &candidate_id, &job_id, None, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ApplicationAlreadyExists));
    }

    #[tokio::test]
    async fn test_apply_requires_open_job() {
        let org = Uuid::new_v4();
        let the_candidate = candidate(org);
        let candidate_id = the_candidate.id;
        let draft_job =
            Job::new(org, Uuid::new_v4(), "Draft role".into(), String::new(), None).unwrap();
        let job_id = draft_job.id;

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_candidate()
            .returning(move |_, _| Ok(Some(the_candidate.clone())));
        recruiting_repo
            .expect_find_job()
            .returning(move |_, _| Ok(Some(draft_job.clone())));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let err = service
            .apply(&org, &candidate_id, &job_id, None, String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_hire_places_candidate_and_fills_job() {
        let org = Uuid::new_v4();
        let the_candidate = candidate(org);
        let the_job = open_job(org);
        let application = JobApplication::new(org, the_candidate.id, the_job.id);
        let application_id = application.id;
        let start = Utc::now().date_naive();

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_application()
            .returning(move |_, _| Ok(Some(application.clone())));
        recruiting_repo
            .expect_find_candidate()
            .returning(move |_, _| Ok(Some(the_candidate.clone())));
        recruiting_repo
            .expect_find_job()
            .returning(move |_, _| Ok(Some(the_job.clone())));
        recruiting_repo
            .expect_create_placement()
            .withf(move |p| {
                p.start_date == start
                    && p.guarantee_end_date == Some(start + chrono::Duration::days(90))
            })
            .returning(|p| Ok(p.clone()));
        recruiting_repo
            .expect_update_application()
            .withf(move |a| {
                a.status == ApplicationStatus::Hired && a.start_date == Some(start)
            })
            .returning(|a| Ok(a.clone()));
        recruiting_repo
            .expect_update_candidate()
            .withf(|c| c.status == CandidateStatus::Placed)
            .returning(|c| Ok(c.clone()));
        recruiting_repo
            .expect_update_job()
            .withf(|j| j.status == JobStatus::Filled && j.positions_filled == 1)
            .returning(|j| Ok(j.clone()));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let placement = service
            .hire(&org, &application_id, start, Decimal::new(9000000, 2))
            .await
            .unwrap();
        assert!(placement.is_active);
    }

    #[tokio::test]
    async fn test_refresh_fit_score_persists_result() {
        let org = Uuid::new_v4();
        let mut the_candidate = candidate(org);
        the_candidate.experience_years = 1;
        the_candidate.skills = vec!["Rust".into()];
        let mut the_job = open_job(org);
        the_job.min_experience_years = 4;
        the_job.required_skills = vec!["rust".into(), "go".into()];

        let mut instance =
            AssessmentInstance::new(org, Uuid::new_v4(), Uuid::new_v4(), "tok".into(), None, None);
        let mut dims = BTreeMap::new();
        dims.insert("drive".to_string(), 4.0);
        instance.complete(dims.clone(), BTreeMap::new());
        let profile = ScoreProfile::new(org, instance.id, dims, BTreeMap::new());

        let mut application = JobApplication::new(org, the_candidate.id, the_job.id);
        application.link_assessment(instance.id);
        let application_id = application.id;

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_application()
            .returning(move |_, _| Ok(Some(application.clone())));
        recruiting_repo
            .expect_find_candidate()
            .returning(move |_, _| Ok(Some(the_candidate.clone())));
        recruiting_repo
            .expect_find_job()
            .returning(move |_, _| Ok(Some(the_job.clone())));
        // 50 + min(1/4, 2) * 20 + (1/2) * 30 = 70
        recruiting_repo
            .expect_update_application()
            .withf(|a| a.fit_score.is_some_and(|s| (s - 70.0).abs() < 1e-9))
            .returning(|a| Ok(a.clone()));

        let mut assessment_repo = MockAssessmentRepository::new();
        assessment_repo
            .expect_find_instance()
            .returning(move |_, _| Ok(Some(instance.clone())));
        assessment_repo
            .expect_find_profile_by_instance()
            .returning(move |_| Ok(Some(profile.clone())));

        let service = service_with(recruiting_repo, assessment_repo);
        let score = service
            .refresh_fit_score(&org, &application_id)
            .await
            .unwrap()
            .unwrap();
        assert!((score - 70.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_refresh_fit_score_without_assessment_is_none() {
        let org = Uuid::new_v4();
        let the_candidate = candidate(org);
        let the_job = open_job(org);
        let application = JobApplication::new(org, the_candidate.id, the_job.id);
        let application_id = application.id;

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_application()
            .returning(move |_, _| Ok(Some(application.clone())));
        recruiting_repo
            .expect_find_candidate()
            .returning(move |_, _| Ok(Some(the_candidate.clone())));
        recruiting_repo
            .expect_find_job()
            .returning(move |_, _| Ok(Some(the_job.clone())));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let score = service.refresh_fit_score(&org, &application_id).await.unwrap();
        assert_eq!(score, None);
    }

    #[tokio::test]
    async fn test_complete_interview_rolls_rating_up() {
        let org = Uuid::new_v4();
        let application = JobApplication::new(org, Uuid::new_v4(), Uuid::new_v4());
        let interview = Interview::new(
            org,
            application.id,
            InterviewKind::Technical,
            Utc::now() - chrono::Duration::hours(1),
            Uuid::new_v4(),
            None,
        );
        let interview_id = interview.id;

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_interview()
            .returning(move |_, _| Ok(Some(interview.clone())));
        recruiting_repo
            .expect_update_interview()
            .withf(|i| i.status == InterviewStatus::Completed && i.overall_rating == Some(4))
            .returning(|i| Ok(i.clone()));
        recruiting_repo
            .expect_find_application()
            .returning(move |_, _| Ok(Some(application.clone())));
        recruiting_repo
            .expect_update_application()
            .withf(|a| a.interview_rating == Some(4))
            .returning(|a| Ok(a.clone()));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let completed = service
            .complete_interview(&org, &interview_id, Some(4), "Strong fundamentals".into())
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_terminal_application_cannot_move() {
        let org = Uuid::new_v4();
        let mut application = JobApplication::new(org, Uuid::new_v4(), Uuid::new_v4());
        application.change_status(ApplicationStatus::Rejected);
        let application_id = application.id;

        let mut recruiting_repo = MockRecruitingRepository::new();
        recruiting_repo
            .expect_find_application()
            .returning(move |_, _| Ok(Some(application.clone())));

        let service = service_with(recruiting_repo, MockAssessmentRepository::new());
        let err = service
            .change_application_status(&org, &application_id, ApplicationStatus::Screening)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidStatusTransition(_)));
    }
}
