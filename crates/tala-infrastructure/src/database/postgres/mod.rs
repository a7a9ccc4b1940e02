//! PostgreSQL repository implementations

pub mod assessment_repo_impl;
pub mod audit_repo_impl;
pub mod billing_repo_impl;
pub mod email_repo_impl;
pub mod organization_repo_impl;
pub mod pdi_repo_impl;
pub mod recruiting_repo_impl;
pub mod report_repo_impl;
pub mod user_repo_impl;
pub mod workforce_repo_impl;

pub use assessment_repo_impl::PgAssessmentRepository;
pub use audit_repo_impl::PgAuditRepository;
pub use billing_repo_impl::PgBillingRepository;
pub use email_repo_impl::PgEmailRepository;
pub use organization_repo_impl::PgOrganizationRepository;
pub use pdi_repo_impl::PgPdiRepository;
pub use recruiting_repo_impl::PgRecruitingRepository;
pub use report_repo_impl::PgReportRepository;
pub use user_repo_impl::PgUserRepository;
pub use workforce_repo_impl::PgWorkforceRepository;
