//! Domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    // Accounts
    #[error("User not found")]
    UserNotFound,

    #[error("User not active")]
    UserNotActive,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Password policy violation: {0}")]
    PasswordPolicyViolation(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Invalid or expired token")]
    InvalidToken,

    // Organizations
    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Organization not active")]
    OrganizationNotActive,

    #[error("Organization slug already exists: {0}")]
    SlugAlreadyExists(String),

    #[error("Membership not found")]
    MembershipNotFound,

    #[error("User already belongs to organization")]
    UserAlreadyInOrganization,

    #[error("Invite not found")]
    InviteNotFound,

    #[error("Invite expired")]
    InviteExpired,

    #[error("Invite already accepted")]
    InviteAlreadyAccepted,

    #[error("Invite already exists for: {0}")]
    InviteAlreadyExists(String),

    #[error("Insufficient role for this operation")]
    InsufficientRole,

    #[error("Department not found")]
    DepartmentNotFound,

    #[error("Position not found")]
    PositionNotFound,

    #[error("Employee not found")]
    EmployeeNotFound,

    #[error("Employee record already exists for user")]
    EmployeeAlreadyExists,

    // Assessments
    #[error("Assessment not found")]
    AssessmentNotFound,

    #[error("Assessment is not active")]
    AssessmentNotActive,

    #[error("Question not found")]
    QuestionNotFound,

    #[error("Assessment instance not found")]
    InstanceNotFound,

    #[error("Assessment instance expired")]
    InstanceExpired,

    #[error("Assessment instance already completed")]
    InstanceAlreadyCompleted,

    #[error("Assessment instance not completed")]
    InstanceNotCompleted,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // PDI
    #[error("Development plan not found")]
    PdiPlanNotFound,

    #[error("Development task not found")]
    PdiTaskNotFound,

    #[error("Development template not found")]
    PdiTemplateNotFound,

    #[error("Invalid status transition: {0}")]
    InvalidStatusTransition(String),

    // Recruiting
    #[error("Client not found")]
    ClientNotFound,

    #[error("Job not found")]
    JobNotFound,

    #[error("Candidate not found")]
    CandidateNotFound,

    #[error("Application not found")]
    ApplicationNotFound,

    #[error("Candidate already applied to job")]
    ApplicationAlreadyExists,

    #[error("Interview not found")]
    InterviewNotFound,

    // Billing
    #[error("Billing plan not found")]
    PlanNotFound,

    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Organization already has an active subscription")]
    ActiveSubscriptionExists,

    #[error("Usage limit exceeded for {usage_type}: {current}/{limit}")]
    UsageLimitExceeded {
        usage_type: String,
        current: i64,
        limit: i64,
    },

    #[error("Usage meter not found")]
    UsageMeterNotFound,

    #[error("Coupon not found")]
    CouponNotFound,

    #[error("Coupon not valid: {0}")]
    CouponNotValid(String),

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Webhook event not found")]
    WebhookEventNotFound,

    // Reports
    #[error("Report not found")]
    ReportNotFound,

    #[error("Report format not supported: {0}")]
    ReportFormatUnsupported(String),

    // Emails
    #[error("Email template not found")]
    EmailTemplateNotFound,

    #[error("Recipient is blacklisted: {0}")]
    RecipientBlacklisted(String),

    #[error("Template render error: {0}")]
    TemplateRenderError(String),

    // Generic
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}
