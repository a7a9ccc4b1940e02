//! Domain services (business logic)

pub mod assessment_service;
pub mod audit_service;
pub mod auth_service;
pub mod billing_service;
pub mod email_service;
pub mod organization_service;
pub mod pdi_service;
pub mod recruiting_service;
pub mod report_service;
pub mod workforce_service;

pub use assessment_service::{
    AnswerInput, AssessmentResults, AssessmentService, InviteOutcome, QuestionBlock,
    SubmissionOutcome, TokenAccess,
};
pub use audit_service::AuditService;
pub use auth_service::{AuthService, LoginResult};
pub use billing_service::{BillingService, CouponQuote, RenewalOutcome, UsageSnapshot};
pub use email_service::EmailService;
pub use organization_service::OrganizationService;
pub use pdi_service::PdiService;
pub use recruiting_service::RecruitingService;
pub use report_service::ReportService;
pub use workforce_service::WorkforceService;
