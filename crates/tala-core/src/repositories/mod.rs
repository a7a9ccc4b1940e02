//! Repository traits (ports)

pub mod assessment_repository;
pub mod audit_repository;
pub mod billing_repository;
pub mod email_repository;
pub mod organization_repository;
pub mod pdi_repository;
pub mod recruiting_repository;
pub mod report_repository;
pub mod user_repository;
pub mod workforce_repository;

pub use assessment_repository::AssessmentRepository;
pub use audit_repository::AuditRepository;
pub use billing_repository::BillingRepository;
pub use email_repository::EmailRepository;
pub use organization_repository::OrganizationRepository;
pub use pdi_repository::PdiRepository;
pub use recruiting_repository::RecruitingRepository;
pub use report_repository::ReportRepository;
pub use user_repository::UserRepository;
pub use workforce_repository::WorkforceRepository;
