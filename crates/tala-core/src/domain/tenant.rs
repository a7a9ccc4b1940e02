//! Tenant context resolved per request

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::membership::MemberRole;

/// How the tenant was determined, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantSource {
    Subdomain,
    Header,
    PathPrefix,
    PrimaryMembership,
}

/// Resolved tenant for the current request. Carried as a request extension
/// and passed explicitly into every tenant-scoped operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub organization_id: Uuid,
    pub slug: String,
    pub source: TenantSource,
    /// Requesting user's role inside the organization, when authenticated.
    pub role: Option<MemberRole>,
}

impl TenantContext {
    pub fn new(organization_id: Uuid, slug: String, source: TenantSource) -> Self {
        Self { organization_id, slug, source, role: None }
    }

    pub fn with_role(mut self, role: MemberRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn require_role(&self, check: impl Fn(MemberRole) -> bool) -> bool {
        self.role.map(check).unwrap_or(false)
    }
}
