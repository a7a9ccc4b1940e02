// ============================================================================
// Tala API - Request Extractors
// File: crates/tala-api/src/extract.rs
// ============================================================================
//! Typed access to what the middleware attached to the request

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tala_core::domain::{MemberRole, TenantContext, User};

use crate::error::ApiError;

/// The authenticated user, attached by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(ApiError::MissingToken)
    }
}

/// The resolved tenant. Handlers that take this reject tenant-less
/// requests with 400 rather than falling through to a cross-tenant query.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantContext);

impl<S> FromRequestParts<S> for Tenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .map(Tenant)
            .ok_or(ApiError::TenantRequired)
    }
}

/// Role gate used at the top of protected handlers. The caller must be a
/// member of the tenant (context carries a role) and the role must pass
/// `check`.
pub fn require_role(
    tenant: &TenantContext,
    check: impl Fn(MemberRole) -> bool,
) -> Result<(), ApiError> {
    if tenant.require_role(check) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tala_core::domain::TenantSource;
    use uuid::Uuid;

    fn context(role: Option<MemberRole>) -> TenantContext {
        let ctx = TenantContext::new(Uuid::new_v4(), "acme".into(), TenantSource::Subdomain);
        match role {
            Some(role) => ctx.with_role(role),
            None => ctx,
        }
    }

    #[tokio::test]
    async fn test_tenant_extractor_rejects_when_unresolved() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let err = Tenant::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert!(matches!(err, ApiError::TenantRequired));
    }

    #[tokio::test]
    async fn test_tenant_extractor_returns_attached_context() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(context(Some(MemberRole::Member)));
        let Tenant(ctx) = Tenant::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.slug, "acme");
    }

    #[test]
    fn test_require_role_refuses_non_members() {
        let err = require_role(&context(None), |r| r.at_least(MemberRole::Viewer)).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
    }

    #[test]
    fn test_require_role_applies_check() {
        let ctx = context(Some(MemberRole::Hr));
        assert!(require_role(&ctx, |r| r.can_manage_users()).is_ok());
        assert!(require_role(&ctx, |r| r.is_admin()).is_err());
    }
}
