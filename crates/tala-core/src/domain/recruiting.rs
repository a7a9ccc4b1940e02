// ============================================================================
// Tala Core - Recruiting Entities
// File: crates/tala-core/src/domain/recruiting.rs
// Description: Clients, jobs, candidates and the application pipeline
// ============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::instance::{AssessmentInstance, ScoreProfile};

/// Job lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Draft,
    Open,
    OnHold,
    Filled,
    Closed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "DRAFT",
            JobStatus::Open => "OPEN",
            JobStatus::OnHold => "ON_HOLD",
            JobStatus::Filled => "FILLED",
            JobStatus::Closed => "CLOSED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(JobStatus::Draft),
            "OPEN" => Some(JobStatus::Open),
            "ON_HOLD" => Some(JobStatus::OnHold),
            "FILLED" => Some(JobStatus::Filled),
            "CLOSED" => Some(JobStatus::Closed),
            "CANCELLED" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

/// Candidate pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    New,
    Screening,
    Qualified,
    Rejected,
    Placed,
    Blacklisted,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::New => "NEW",
            CandidateStatus::Screening => "SCREENING",
            CandidateStatus::Qualified => "QUALIFIED",
            CandidateStatus::Rejected => "REJECTED",
            CandidateStatus::Placed => "PLACED",
            CandidateStatus::Blacklisted => "BLACKLISTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "NEW" => Some(CandidateStatus::New),
            "SCREENING" => Some(CandidateStatus::Screening),
            "QUALIFIED" => Some(CandidateStatus::Qualified),
            "REJECTED" => Some(CandidateStatus::Rejected),
            "PLACED" => Some(CandidateStatus::Placed),
            "BLACKLISTED" => Some(CandidateStatus::Blacklisted),
            _ => None,
        }
    }
}

/// Application pipeline status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Applied,
    Screening,
    AssessmentSent,
    AssessmentCompleted,
    Qualified,
    Interviewed,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "APPLIED",
            ApplicationStatus::Screening => "SCREENING",
            ApplicationStatus::AssessmentSent => "ASSESSMENT_SENT",
            ApplicationStatus::AssessmentCompleted => "ASSESSMENT_COMPLETED",
            ApplicationStatus::Qualified => "QUALIFIED",
            ApplicationStatus::Interviewed => "INTERVIEWED",
            ApplicationStatus::Offered => "OFFERED",
            ApplicationStatus::Hired => "HIRED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Withdrawn => "WITHDRAWN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "APPLIED" => Some(ApplicationStatus::Applied),
            "SCREENING" => Some(ApplicationStatus::Screening),
            "ASSESSMENT_SENT" => Some(ApplicationStatus::AssessmentSent),
            "ASSESSMENT_COMPLETED" => Some(ApplicationStatus::AssessmentCompleted),
            "QUALIFIED" => Some(ApplicationStatus::Qualified),
            "INTERVIEWED" => Some(ApplicationStatus::Interviewed),
            "OFFERED" => Some(ApplicationStatus::Offered),
            "HIRED" => Some(ApplicationStatus::Hired),
            "REJECTED" => Some(ApplicationStatus::Rejected),
            "WITHDRAWN" => Some(ApplicationStatus::Withdrawn),
            _ => None,
        }
    }

    /// Terminal statuses leave the active pipeline.
    pub fn is_active(&self) -> bool {
        !matches!(
            self,
            ApplicationStatus::Hired | ApplicationStatus::Rejected | ApplicationStatus::Withdrawn
        )
    }
}

/// Interview format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewKind {
    Phone,
    Video,
    InPerson,
    Technical,
    Behavioral,
    Panel,
    Final,
}

impl InterviewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewKind::Phone => "PHONE",
            InterviewKind::Video => "VIDEO",
            InterviewKind::InPerson => "IN_PERSON",
            InterviewKind::Technical => "TECHNICAL",
            InterviewKind::Behavioral => "BEHAVIORAL",
            InterviewKind::Panel => "PANEL",
            InterviewKind::Final => "FINAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PHONE" => Some(InterviewKind::Phone),
            "VIDEO" => Some(InterviewKind::Video),
            "IN_PERSON" => Some(InterviewKind::InPerson),
            "TECHNICAL" => Some(InterviewKind::Technical),
            "BEHAVIORAL" => Some(InterviewKind::Behavioral),
            "PANEL" => Some(InterviewKind::Panel),
            "FINAL" => Some(InterviewKind::Final),
            _ => None,
        }
    }
}

/// Interview scheduling status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "SCHEDULED",
            InterviewStatus::InProgress => "IN_PROGRESS",
            InterviewStatus::Completed => "COMPLETED",
            InterviewStatus::Cancelled => "CANCELLED",
            InterviewStatus::NoShow => "NO_SHOW",
            InterviewStatus::Rescheduled => "RESCHEDULED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(InterviewStatus::Scheduled),
            "IN_PROGRESS" => Some(InterviewStatus::InProgress),
            "COMPLETED" => Some(InterviewStatus::Completed),
            "CANCELLED" => Some(InterviewStatus::Cancelled),
            "NO_SHOW" => Some(InterviewStatus::NoShow),
            "RESCHEDULED" => Some(InterviewStatus::Rescheduled),
            _ => None,
        }
    }
}

/// Client company a recruiter tenant sources for. Contact and address
/// fields are encrypted at rest by the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Client {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 200))]
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

impl Client {
    pub fn new(
        organization_id: Uuid,
        name: String,
        primary_contact_name: String,
        primary_contact_email: String,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let client = Self {
            id: Uuid::new_v4(),
            organization_id,
            name,
            industry: String::new(),
            primary_contact_name,
            primary_contact_email,
            primary_contact_phone: String::new(),
            website: String::new(),
            description: String::new(),
            contract_start_date: None,
            contract_end_date: None,
            commission_rate: Decimal::new(1500, 2),
            payment_terms: "Net 30".to_string(),
            is_active: true,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        client.validate()?;
        Ok(client)
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
        self.is_active = false;
    }
}

/// Job opening sourced for a client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Job {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub client_id: Uuid,

    #[validate(length(min = 1, max = 200))]
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

    pub status: JobStatus,
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

impl Job {
    pub fn new(
        organization_id: Uuid,
        client_id: Uuid,
        title: String,
        description: String,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let job = Self {
            id: Uuid::new_v4(),
            organization_id,
            client_id,
            title,
            description,
            requirements: String::new(),
            location: String::new(),
            remote_allowed: false,
            min_experience_years: 0,
            max_experience_years: None,
            required_skills: Vec::new(),
            preferred_skills: Vec::new(),
            salary_min: None,
            salary_max: None,
            currency: "USD".to_string(),
            status: JobStatus::Draft,
            positions_available: 1,
            positions_filled: 0,
            posted_date: None,
            application_deadline: None,
            requires_assessment: true,
            assessment_definition_id: None,
            assigned_recruiter: None,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        job.validate()?;
        Ok(job)
    }

    pub fn open(&mut self) {
        self.status = JobStatus::Open;
        self.posted_date = Some(Utc::now().date_naive());
        self.modified_at = Some(Utc::now());
    }

    /// Counts a filled position; the job flips to FILLED once all openings
    /// are taken.
    pub fn record_hire(&mut self) {
        self.positions_filled += 1;
        if self.positions_filled >= self.positions_available {
            self.status = JobStatus::Filled;
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
    }
}

/// Candidate in the pipeline. Email and phone are encrypted at rest by the
/// persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Candidate {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(length(min = 1, max = 150))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150))]
    pub last_name: String,
    #[validate(email)]
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
    pub status: CandidateStatus,
    pub notes: String,
    pub source: String,

    pub assigned_recruiter: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl Candidate {
    pub fn new(
        organization_id: Uuid,
        first_name: String,
        last_name: String,
        email: String,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let candidate = Self {
            id: Uuid::new_v4(),
            organization_id,
            first_name,
            last_name,
            email: email.to_lowercase(),
            phone: String::new(),
            current_title: String::new(),
            current_company: String::new(),
            experience_years: 0,
            location: String::new(),
            willing_to_relocate: false,
            skills: Vec::new(),
            languages: Vec::new(),
            salary_expectation_min: None,
            salary_expectation_max: None,
            currency: "USD".to_string(),
            linkedin_url: String::new(),
            status: CandidateStatus::New,
            notes: String::new(),
            source: String::new(),
            assigned_recruiter: None,
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        candidate.validate()?;
        Ok(candidate)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn change_status(&mut self, status: CandidateStatus) {
        self.status = status;
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
    }
}

/// Application of one candidate to one job; `(candidate_id, job_id)` is
/// unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub candidate_id: Uuid,
    pub job_id: Uuid,

    pub status: ApplicationStatus,
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

impl JobApplication {
    pub fn new(organization_id: Uuid, candidate_id: Uuid, job_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            candidate_id,
            job_id,
            status: ApplicationStatus::Applied,
            applied_at: Utc::now(),
            cover_letter: String::new(),
            assessment_instance_id: None,
            fit_score: None,
            interview_rating: None,
            offer_extended_at: None,
            offer_amount: None,
            offer_accepted_at: None,
            start_date: None,
            rejection_at: None,
            rejection_reason: String::new(),
            recruiter_id: None,
            modified_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn days_in_pipeline(&self) -> i64 {
        (Utc::now().date_naive() - self.applied_at.date_naive()).num_days()
    }

    pub fn change_status(&mut self, status: ApplicationStatus) {
        self.status = status;
        if status == ApplicationStatus::Rejected {
            self.rejection_at = Some(Utc::now());
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn link_assessment(&mut self, instance_id: Uuid) {
        self.assessment_instance_id = Some(instance_id);
        self.status = ApplicationStatus::AssessmentSent;
        self.modified_at = Some(Utc::now());
    }
}

/// Fit of a candidate against a job, from a completed assessment. Base 50,
/// up to 40 from the experience ratio and up to 30 from case-insensitive
/// skill overlap, clamped to [0, 100]. `None` when the application has no
/// completed assessment, the profile carries no dimension scores, or the
/// job lists no required skills.
pub fn fit_score(
    application: &JobApplication,
    candidate: &Candidate,
    job: &Job,
    instance: Option<&AssessmentInstance>,
    profile: Option<&ScoreProfile>,
) -> Option<f64> {
    if application.assessment_instance_id.is_none() {
        return None;
    }
    let instance = instance?;
    if !instance.is_completed() {
        return None;
    }
    let profile = profile?;
    if profile.dimension_scores.is_empty() || job.required_skills.is_empty() {
        return None;
    }

    let mut score = 50.0;

    let exp_match = (f64::from(candidate.experience_years)
        / f64::from(job.min_experience_years.max(1)))
    .min(2.0);
    score += exp_match * 20.0;

    let candidate_skills: std::collections::HashSet<String> = candidate
        .skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let required_skills: std::collections::HashSet<String> = job
        .required_skills
        .iter()
        .map(|s| s.to_lowercase())
        .collect();
    let overlap = candidate_skills.intersection(&required_skills).count();
    score += (overlap as f64 / required_skills.len() as f64) * 30.0;

    Some(score.clamp(0.0, 100.0))
}

/// Interview session for an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interview {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub application_id: Uuid,

    pub kind: InterviewKind,
    pub status: InterviewStatus,

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

impl Interview {
    pub fn new(
        organization_id: Uuid,
        application_id: Uuid,
        kind: InterviewKind,
        scheduled_at: DateTime<Utc>,
        interviewer_id: Uuid,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            application_id,
            kind,
            status: InterviewStatus::Scheduled,
            scheduled_at,
            duration_minutes: 60,
            location_or_link: String::new(),
            interviewer_id,
            completed_at: None,
            overall_rating: None,
            feedback: String::new(),
            recommendation: String::new(),
            created_at: Utc::now(),
            created_by,
            modified_at: None,
        }
    }

    pub fn is_upcoming(&self) -> bool {
        self.scheduled_at > Utc::now() && self.status == InterviewStatus::Scheduled
    }

    pub fn is_overdue(&self) -> bool {
        self.scheduled_at < Utc::now()
            && matches!(
                self.status,
                InterviewStatus::Scheduled | InterviewStatus::InProgress
            )
    }

    pub fn complete(&mut self, overall_rating: Option<i32>, feedback: String) {
        self.status = InterviewStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.overall_rating = overall_rating;
        self.feedback = feedback;
        self.modified_at = Some(Utc::now());
    }
}

/// Hire record for a single application; tracks the guarantee window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
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

impl Placement {
    pub fn new(
        organization_id: Uuid,
        application_id: Uuid,
        start_date: NaiveDate,
        salary: Decimal,
    ) -> Self {
        let guarantee_period_days = 90;
        Self {
            id: Uuid::new_v4(),
            organization_id,
            application_id,
            start_date,
            salary,
            currency: "USD".to_string(),
            commission_earned: None,
            guarantee_period_days,
            guarantee_end_date: Some(
                start_date + chrono::Duration::days(i64::from(guarantee_period_days)),
            ),
            is_active: true,
            termination_date: None,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn in_guarantee_window(&self) -> bool {
        self.guarantee_end_date
            .is_some_and(|end| Utc::now().date_naive() <= end)
    }

    pub fn terminate(&mut self, date: NaiveDate) {
        self.termination_date = Some(date);
        self.is_active = false;
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn fixture(org: Uuid) -> (JobApplication, Candidate, Job) {
        let mut candidate = Candidate::new(
            org,
            "Ana".into(),
            "Lima".into(),
            "Ana.Lima@example.com".into(),
            None,
        )
        .unwrap();
        candidate.experience_years = 4;
        candidate.skills = vec!["Rust".into(), "SQL".into(), "Kubernetes".into()];

        let mut job = Job::new(org, Uuid::new_v4(), "Backend Engineer".into(), "desc".into(), None)
            .unwrap();
        job.min_experience_years = 2;
        job.required_skills = vec!["rust".into(), "sql".into()];

        let application = JobApplication::new(org, candidate.id, job.id);
        (application, candidate, job)
    }

    fn completed_instance(org: Uuid) -> (AssessmentInstance, ScoreProfile) {
        let mut instance = AssessmentInstance::new(
            org,
            Uuid::new_v4(),
            Uuid::new_v4(),
            "tok".into(),
            None,
            None,
        );
        let mut dims = BTreeMap::new();
        dims.insert("drive".to_string(), 4.0);
        instance.complete(dims.clone(), BTreeMap::new());
        let profile = ScoreProfile::new(org, instance.id, dims, BTreeMap::new());
        (instance, profile)
    }

    #[test]
    fn test_fit_score_requires_completed_assessment() {
        let org = Uuid::new_v4();
        let (mut application, candidate, job) = fixture(org);
        assert_eq!(fit_score(&application, &candidate, &job, None, None), None);

        let fresh = AssessmentInstance::new(org, Uuid::new_v4(), Uuid::new_v4(), "t".into(), None, None);
        application.link_assessment(fresh.id);
        assert_eq!(
            fit_score(&application, &candidate, &job, Some(&fresh), None),
            None
        );
    }

    #[test]
    fn test_fit_score_formula() {
        let org = Uuid::new_v4();
        let (mut application, candidate, job) = fixture(org);
        let (instance, profile) = completed_instance(org);
        application.link_assessment(instance.id);

        // 50 + min(4/2, 2) * 20 + (2/2) * 30 = 50 + 40 + 30 = 120 -> 100
        let score = fit_score(&application, &candidate, &job, Some(&instance), Some(&profile));
        assert_eq!(score, Some(100.0));
    }

    #[test]
    fn test_fit_score_partial_overlap() {
        let org = Uuid::new_v4();
        let (mut application, mut candidate, mut job) = fixture(org);
        candidate.experience_years = 1;
        candidate.skills = vec!["Rust".into()];
        job.min_experience_years = 4;
        job.required_skills = vec!["rust".into(), "go".into()];
        let (instance, profile) = completed_instance(org);
        application.link_assessment(instance.id);

        // 50 + min(1/4, 2) * 20 + (1/2) * 30 = 50 + 5 + 15 = 70
        let score = fit_score(&application, &candidate, &job, Some(&instance), Some(&profile))
            .unwrap();
        assert!((score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_score_needs_required_skills() {
        let org = Uuid::new_v4();
        let (mut application, candidate, mut job) = fixture(org);
        job.required_skills.clear();
        let (instance, profile) = completed_instance(org);
        application.link_assessment(instance.id);
        assert_eq!(
            fit_score(&application, &candidate, &job, Some(&instance), Some(&profile)),
            None
        );
    }

    #[test]
    fn test_job_fills_when_openings_taken() {
        let mut job = Job::new(Uuid::new_v4(), Uuid::new_v4(), "SRE".into(), "d".into(), None)
            .unwrap();
        job.positions_available = 2;
        job.open();
        assert_eq!(job.status, JobStatus::Open);
        job.record_hire();
        assert_eq!(job.status, JobStatus::Open);
        job.record_hire();
        assert_eq!(job.status, JobStatus::Filled);
    }

    #[test]
    fn test_application_terminal_statuses() {
        let mut application = JobApplication::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert!(application.is_active());
        application.change_status(ApplicationStatus::Rejected);
        assert!(!application.is_active());
        assert!(application.rejection_at.is_some());
    }

    #[test]
    fn test_placement_guarantee_window() {
        let start = Utc::now().date_naive();
        let placement = Placement::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            start,
            Decimal::new(9000000, 2),
        );
        assert_eq!(
            placement.guarantee_end_date,
            Some(start + chrono::Duration::days(90))
        );
        assert!(placement.in_guarantee_window());
    }
}
