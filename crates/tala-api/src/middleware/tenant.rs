// ============================================================================
// Tala API - Tenant Resolution Middleware
// File: crates/tala-api/src/middleware/tenant.rs
// ============================================================================
//! Resolves the tenant organization for a request and attaches a
//! `TenantContext` extension. Resolution is best-effort: a request that
//! matches no tenant proceeds without one, and handlers that need a
//! tenant reject it through the `Tenant` extractor.
//!
//! Resolution order: subdomain, `X-Tenant` header, `/t/<slug>/` path
//! prefix, then the authenticated user's primary membership.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use tala_core::domain::{Organization, TenantContext, TenantSource};
use tala_core::repositories::OrganizationRepository;
use tala_shared::constants::{TENANT_HEADER, TENANT_PATH_PREFIX};

use crate::extract::CurrentUser;
use crate::state::AppState;

pub async fn resolve_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(context) = resolve(&state, &mut request).await {
        request.extensions_mut().insert(context);
    }
    next.run(request).await
}

async fn resolve(state: &AppState, request: &mut Request) -> Option<TenantContext> {
    let headers = request.headers();

    // 1. Tenant subdomain on the Host header
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());
    if let Some(slug) = host_slug(host, &state.config.tenancy.base_label) {
        if let Some(org) = organization_by_slug(state, slug).await {
            let context = TenantContext::new(org.id, org.slug, TenantSource::Subdomain);
            return Some(attach_role(state, request, context).await);
        }
    }

    // 2. Explicit X-Tenant header
    if let Some(slug) = headers.get(TENANT_HEADER).and_then(|v| v.to_str().ok()) {
        if let Some(org) = organization_by_slug(state, slug.trim()).await {
            let context = TenantContext::new(org.id, org.slug, TenantSource::Header);
            return Some(attach_role(state, request, context).await);
        }
    }

    // 3. /t/<slug>/ path prefix
    if let Some(slug) = path_slug(request.uri().path()) {
        if let Some(org) = organization_by_slug(state, slug).await {
            let context = TenantContext::new(org.id, org.slug, TenantSource::PathPrefix);
            return Some(attach_role(state, request, context).await);
        }
    }

    // 4. The authenticated user's primary active membership
    let CurrentUser(user) = request.extensions().get::<CurrentUser>()?;
    let membership = match state.org_repo.find_primary_membership(&user.id).await {
        Ok(Some(m)) if m.is_active => m,
        Ok(_) => return None,
        Err(e) => {
            warn!("Primary membership lookup failed for {}: {}", user.id, e);
            return None;
        }
    };
    match state.org_repo.find_by_id(&membership.organization_id).await {
        Ok(Some(org)) if org.is_active => Some(
            TenantContext::new(org.id, org.slug, TenantSource::PrimaryMembership)
                .with_role(membership.role),
        ),
        Ok(_) => None,
        Err(e) => {
            warn!(
                "Organization lookup failed for membership {}: {}",
                membership.id, e
            );
            None
        }
    }
}

/// Slug lookups go through the TTL cache; misses are cached too so a
/// typo'd subdomain does not hammer the database.
async fn organization_by_slug(state: &AppState, slug: &str) -> Option<Organization> {
    if slug.is_empty() {
        return None;
    }
    if let Some(cached) = state.slug_cache.get(slug) {
        return cached.filter(|org| org.is_active);
    }
    let found = match state.org_repo.find_by_slug(slug).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Tenant lookup for slug '{}' failed: {}", slug, e);
            return None;
        }
    };
    state.slug_cache.insert(slug, found.clone());
    found.filter(|org| org.is_active)
}

/// The membership role rides on the context so handlers can gate without
/// another lookup. A resolved tenant the user does not belong to keeps a
/// role-less context.
async fn attach_role(
    state: &AppState,
    request: &mut Request,
    context: TenantContext,
) -> TenantContext {
    let Some(CurrentUser(user)) = request.extensions().get::<CurrentUser>() else {
        return context;
    };
    match state
        .org_repo
        .find_membership(&user.id, &context.organization_id)
        .await
    {
        Ok(Some(m)) if m.is_active => context.with_role(m.role),
        Ok(_) => context,
        Err(e) => {
            warn!("Membership lookup failed for {}: {}", user.id, e);
            context
        }
    }
}

/// Leftmost DNS label of the host, unless the host is a bare domain or
/// the label is `www` / the configured base label.
fn host_slug<'a>(host: Option<&'a str>, base_label: &str) -> Option<&'a str> {
    let host = host?.split(':').next()?;
    let mut labels = host.split('.');
    let first = labels.next()?;
    labels.next()?;
    if first.is_empty()
        || first.eq_ignore_ascii_case("www")
        || first.eq_ignore_ascii_case(base_label)
    {
        return None;
    }
    Some(first)
}

fn path_slug(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(TENANT_PATH_PREFIX)?;
    let slug = rest.split('/').next()?;
    (!slug.is_empty()).then_some(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_slug_takes_leftmost_label() {
        assert_eq!(host_slug(Some("acme.tala.app"), "app"), Some("acme"));
        assert_eq!(host_slug(Some("acme.tala.app:8080"), "app"), Some("acme"));
    }

    #[test]
    fn test_host_slug_skips_www_and_base_label() {
        assert_eq!(host_slug(Some("www.tala.app"), "app"), None);
        assert_eq!(host_slug(Some("app.tala.io"), "app"), None);
        assert_eq!(host_slug(Some("APP.tala.io"), "app"), None);
    }

    #[test]
    fn test_host_slug_ignores_bare_hosts() {
        assert_eq!(host_slug(Some("localhost"), "app"), None);
        assert_eq!(host_slug(Some("localhost:3000"), "app"), None);
        assert_eq!(host_slug(None, "app"), None);
    }

    #[test]
    fn test_path_slug_parses_prefix() {
        assert_eq!(path_slug("/t/acme/api/v1/reports"), Some("acme"));
        assert_eq!(path_slug("/t/acme"), Some("acme"));
        assert_eq!(path_slug("/api/v1/reports"), None);
        assert_eq!(path_slug("/t//dashboard"), None);
    }
}
