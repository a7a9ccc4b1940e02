//! Organization repository trait (port)

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Membership, Organization, OrganizationInvite};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, DomainError>;
    async fn create(&self, organization: &Organization) -> Result<Organization, DomainError>;
    async fn update(&self, organization: &Organization) -> Result<Organization, DomainError>;

    // Memberships
    async fn find_membership(
        &self,
        user_id: &Uuid,
        organization_id: &Uuid,
    ) -> Result<Option<Membership>, DomainError>;
    async fn find_membership_by_id(&self, id: &Uuid) -> Result<Option<Membership>, DomainError>;
    async fn list_memberships_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<Membership>, DomainError>;
    async fn find_primary_membership(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Membership>, DomainError>;
    async fn list_members(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Membership>, DomainError>;
    async fn count_active_members(&self, organization_id: &Uuid) -> Result<i64, DomainError>;
    async fn create_membership(&self, membership: &Membership) -> Result<Membership, DomainError>;
    async fn update_membership(&self, membership: &Membership) -> Result<Membership, DomainError>;
    /// Unsets `is_primary` on the user's other memberships.
    async fn clear_other_primaries(
        &self,
        user_id: &Uuid,
        keep_membership_id: &Uuid,
    ) -> Result<(), DomainError>;

    // Invites
    async fn create_invite(
        &self,
        invite: &OrganizationInvite,
    ) -> Result<OrganizationInvite, DomainError>;
    async fn find_invite_by_token(
        &self,
        token: &str,
    ) -> Result<Option<OrganizationInvite>, DomainError>;
    async fn find_pending_invite(
        &self,
        organization_id: &Uuid,
        email: &str,
    ) -> Result<Option<OrganizationInvite>, DomainError>;
    async fn list_pending_invites(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<OrganizationInvite>, DomainError>;
    async fn update_invite(
        &self,
        invite: &OrganizationInvite,
    ) -> Result<OrganizationInvite, DomainError>;
    /// Removes unaccepted invites past their expiry; returns how many.
    async fn delete_expired_invites(&self) -> Result<u64, DomainError>;
}
