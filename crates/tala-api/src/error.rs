// ============================================================================
// Tala API - Error Mapping
// File: crates/tala-api/src/error.rs
// ============================================================================
//! Converts domain and transport errors into enveloped HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, warn};

use tala_core::error::DomainError;
use tala_security::jwt::JwtError;
use tala_security::webhook::SignatureError;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Authentication required")]
    MissingToken,
    #[error("{0}")]
    InvalidToken(String),
    #[error("Insufficient permissions for this operation")]
    Forbidden,
    #[error("No tenant could be resolved for this request")]
    TenantRequired,
    #[error("{0}")]
    BadRequest(String),
    #[error("Webhook signature verification failed: {0}")]
    InvalidSignature(String),
    #[error("Too many requests, slow down")]
    TooManyRequests,
}

impl From<JwtError> for ApiError {
    fn from(e: JwtError) -> Self {
        ApiError::InvalidToken(e.to_string())
    }
}

impl From<SignatureError> for ApiError {
    fn from(e: SignatureError) -> Self {
        ApiError::InvalidSignature(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl ApiError {
    /// Status and machine-readable code for the envelope.
    pub fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(e) => domain_parts(e),
            ApiError::MissingToken => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::TenantRequired => (StatusCode::BAD_REQUEST, "TENANT_REQUIRED"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::InvalidSignature(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        }
    }
}

fn domain_parts(e: &DomainError) -> (StatusCode, &'static str) {
    use DomainError::*;
    match e {
        InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),

        UserNotActive => (StatusCode::FORBIDDEN, "USER_NOT_ACTIVE"),
        OrganizationNotActive => (StatusCode::FORBIDDEN, "ORGANIZATION_NOT_ACTIVE"),
        InsufficientRole => (StatusCode::FORBIDDEN, "INSUFFICIENT_ROLE"),

        UserNotFound | OrganizationNotFound | MembershipNotFound | InviteNotFound
        | DepartmentNotFound | PositionNotFound | EmployeeNotFound | AssessmentNotFound
        | QuestionNotFound | InstanceNotFound | PdiPlanNotFound | PdiTaskNotFound
        | PdiTemplateNotFound | ClientNotFound | JobNotFound | CandidateNotFound
        | ApplicationNotFound | InterviewNotFound | PlanNotFound | SubscriptionNotFound
        | UsageMeterNotFound | CouponNotFound | InvoiceNotFound | PaymentNotFound
        | WebhookEventNotFound | ReportNotFound | EmailTemplateNotFound => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }

        EmailAlreadyExists(_) | SlugAlreadyExists(_) | InviteAlreadyExists(_)
        | UserAlreadyInOrganization | EmployeeAlreadyExists | ApplicationAlreadyExists => {
            (StatusCode::CONFLICT, "ALREADY_EXISTS")
        }
        ActiveSubscriptionExists => (StatusCode::CONFLICT, "SUBSCRIPTION_EXISTS"),
        InviteAlreadyAccepted => (StatusCode::CONFLICT, "INVITE_ALREADY_ACCEPTED"),
        InstanceAlreadyCompleted => (StatusCode::CONFLICT, "ALREADY_COMPLETED"),

        InviteExpired => (StatusCode::GONE, "INVITE_EXPIRED"),
        InstanceExpired => (StatusCode::GONE, "INSTANCE_EXPIRED"),

        PasswordPolicyViolation(_) => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD"),
        ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        InvalidResponse(_) => (StatusCode::BAD_REQUEST, "INVALID_RESPONSE"),
        InvalidStatusTransition(_) => (StatusCode::BAD_REQUEST, "INVALID_TRANSITION"),
        CouponNotValid(_) => (StatusCode::BAD_REQUEST, "COUPON_NOT_VALID"),
        ReportFormatUnsupported(_) => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
        AssessmentNotActive => (StatusCode::BAD_REQUEST, "ASSESSMENT_NOT_ACTIVE"),
        InstanceNotCompleted => (StatusCode::BAD_REQUEST, "NOT_COMPLETED"),
        RecipientBlacklisted(_) => (StatusCode::BAD_REQUEST, "RECIPIENT_BLACKLISTED"),
        TemplateRenderError(_) => (StatusCode::BAD_REQUEST, "TEMPLATE_ERROR"),

        UsageLimitExceeded { .. } => (StatusCode::TOO_MANY_REQUESTS, "USAGE_LIMIT_EXCEEDED"),

        PasswordHashError(_) | TokenGenerationError(_) | DatabaseError(_) | InternalError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        // Internals stay in the log, not in the payload.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Internal error on request: {}", self);
            "An internal error occurred".to_string()
        } else {
            warn!("Request failed ({}): {}", code, self);
            self.to_string()
        };
        let body = ApiResponse::<()>::error(code, &message);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_family_maps_to_404() {
        let (status, code) = ApiError::from(DomainError::EmployeeNotFound).parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "NOT_FOUND");
    }

    #[test]
    fn test_usage_limit_maps_to_429() {
        let err = ApiError::from(DomainError::UsageLimitExceeded {
            usage_type: "ASSESSMENTS".into(),
            current: 100,
            limit: 100,
        });
        let (status, code) = err.parts();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(code, "USAGE_LIMIT_EXCEEDED");
    }

    #[test]
    fn test_database_errors_hide_details() {
        let err = ApiError::from(DomainError::DatabaseError("relation missing".into()));
        let (status, code) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "SERVER_ERROR");
    }

    #[test]
    fn test_conflict_and_gone_mappings() {
        assert_eq!(
            ApiError::from(DomainError::EmailAlreadyExists("a@b.c".into())).parts().0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DomainError::InviteExpired).parts().0,
            StatusCode::GONE
        );
    }

    #[test]
    fn test_validator_errors_become_bad_request() {
        use validator::Validate;

        #[derive(Validate)]
        struct Probe {
            #[validate(email)]
            email: String,
        }

        let probe = Probe {
            email: "not-an-email".into(),
        };
        let err: ApiError = probe.validate().unwrap_err().into();
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }
}
