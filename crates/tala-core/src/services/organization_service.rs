// ============================================================================
// Tala Core - Organization Service
// File: crates/tala-core/src/services/organization_service.rs
// ============================================================================
//! Organizations, memberships and the invitation flow

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tala_security::token::generate_token;
use tala_shared::constants::ACCESS_TOKEN_LENGTH;
use tala_shared::types::Pagination;

use crate::domain::{
    EmailKind, Language, MemberRole, Membership, OrgKind, Organization, OrganizationInvite, User,
};
use crate::error::DomainError;
use crate::repositories::{EmailRepository, OrganizationRepository, UserRepository};
use crate::services::EmailService;

pub struct OrganizationService<O, U, E>
where
    O: OrganizationRepository,
    U: UserRepository,
    E: EmailRepository,
{
    org_repo: Arc<O>,
    user_repo: Arc<U>,
    emails: Arc<EmailService<E>>,
}

impl<O, U, E> OrganizationService<O, U, E>
where
    O: OrganizationRepository,
    U: UserRepository,
    E: EmailRepository,
{
    pub fn new(org_repo: Arc<O>, user_repo: Arc<U>, emails: Arc<EmailService<E>>) -> Self {
        Self { org_repo, user_repo, emails }
    }

    /// Creates the organization and makes the creator its ORG_ADMIN primary
    /// member, demoting any other primary membership they hold.
    pub async fn create_organization(
        &self,
        name: &str,
        kind: OrgKind,
        slug: Option<String>,
        creator: &User,
    ) -> Result<(Organization, Membership), DomainError> {
        let organization = Organization::new(name.to_string(), kind, slug, Some(creator.id))
            .map_err(|e| DomainError::ValidationError(e.to_string()))?;

        if self
            .org_repo
            .find_by_slug(&organization.slug)
            .await?
            .is_some()
        {
            return Err(DomainError::SlugAlreadyExists(organization.slug.clone()));
        }

        let organization = self.org_repo.create(&organization).await?;

        let mut membership = Membership::new(creator.id, organization.id, MemberRole::OrgAdmin);
        membership.mark_primary();
        let membership = self.org_repo.create_membership(&membership).await?;
        self.org_repo
            .clear_other_primaries(&creator.id, &membership.id)
            .await?;

        info!("Organization created: {} ({})", organization.name, organization.slug);
        Ok((organization, membership))
    }

    pub async fn get(&self, id: &Uuid) -> Result<Organization, DomainError> {
        self.org_repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::OrganizationNotFound)
    }

    pub async fn update(&self, organization: &Organization) -> Result<Organization, DomainError> {
        self.org_repo.update(organization).await
    }

    pub async fn list_members(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Membership>, DomainError> {
        self.org_repo
            .list_members(organization_id, pagination.clamped())
            .await
    }

    pub async fn list_memberships_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<Membership>, DomainError> {
        self.org_repo.list_memberships_for_user(user_id).await
    }

    /// Invites an email address into the organization.
    pub async fn invite_member(
        &self,
        organization_id: &Uuid,
        email: &str,
        role: MemberRole,
        invited_by: &User,
        message: String,
    ) -> Result<OrganizationInvite, DomainError> {
        let organization = self.get(organization_id).await?;

        // 1. Already a member?
        if let Some(user) = self.user_repo.find_by_email(email).await? {
            if let Some(membership) = self
                .org_repo
                .find_membership(&user.id, organization_id)
                .await?
            {
                if membership.is_active {
                    return Err(DomainError::UserAlreadyInOrganization);
                }
            }
        }

        // 2. One pending invite per (org, email)
        if self
            .org_repo
            .find_pending_invite(organization_id, email)
            .await?
            .is_some()
        {
            return Err(DomainError::InviteAlreadyExists(email.to_string()));
        }

        let invite = OrganizationInvite::new(
            *organization_id,
            email.to_string(),
            role,
            generate_token(ACCESS_TOKEN_LENGTH),
            invited_by.id,
            message,
        )
        .map_err(|e| DomainError::ValidationError(e.to_string()))?;
        let invite = self.org_repo.create_invite(&invite).await?;

        let context = json!({
            "invite_token": invite.token,
            "role": invite.role.as_str(),
            "message": invite.message,
            "invited_by": invited_by.full_name(),
        });
        if let Err(e) = self
            .emails
            .queue(
                EmailKind::OrganizationInvite,
                email,
                context,
                Some(&organization),
                Language::En,
            )
            .await
        {
            warn!("Failed to queue invite email: {}", e);
        }

        info!("Invite created for {} in org {}", invite.email, organization_id);
        Ok(invite)
    }

    /// Accepting creates the membership and burns the invite. The invite
    /// must match the accepting user's email.
    pub async fn accept_invite(
        &self,
        token: &str,
        user: &User,
    ) -> Result<Membership, DomainError> {
        let mut invite = self
            .org_repo
            .find_invite_by_token(token)
            .await?
            .ok_or(DomainError::InviteNotFound)?;

        if invite.is_accepted {
            return Err(DomainError::InviteAlreadyAccepted);
        }
        if invite.is_expired() {
            return Err(DomainError::InviteExpired);
        }
        if !invite.email.eq_ignore_ascii_case(&user.email) {
            warn!("Invite email mismatch for token acceptance");
            return Err(DomainError::InviteNotFound);
        }
        if self
            .org_repo
            .find_membership(&user.id, &invite.organization_id)
            .await?
            .is_some_and(|m| m.is_active)
        {
            return Err(DomainError::UserAlreadyInOrganization);
        }

        let mut membership = Membership::from_invite(
            user.id,
            invite.organization_id,
            invite.role,
            invite.invited_by,
            invite.created_at,
        );
        // First organization becomes the primary one.
        if self.org_repo.find_primary_membership(&user.id).await?.is_none() {
            membership.mark_primary();
        }
        let membership = self.org_repo.create_membership(&membership).await?;

        invite.mark_accepted();
        self.org_repo.update_invite(&invite).await?;

        info!(
            "Invite accepted: user {} joined org {} as {}",
            user.id,
            invite.organization_id,
            membership.role.as_str()
        );
        Ok(membership)
    }

    pub async fn change_role(
        &self,
        organization_id: &Uuid,
        membership_id: &Uuid,
        role: MemberRole,
    ) -> Result<Membership, DomainError> {
        let mut membership = self
            .org_repo
            .find_membership_by_id(membership_id)
            .await?
            .filter(|m| m.organization_id == *organization_id)
            .ok_or(DomainError::MembershipNotFound)?;
        membership.change_role(role);
        self.org_repo.update_membership(&membership).await
    }

    pub async fn remove_member(
        &self,
        organization_id: &Uuid,
        membership_id: &Uuid,
    ) -> Result<Membership, DomainError> {
        let mut membership = self
            .org_repo
            .find_membership_by_id(membership_id)
            .await?
            .filter(|m| m.organization_id == *organization_id)
            .ok_or(DomainError::MembershipNotFound)?;
        membership.deactivate();
        self.org_repo.update_membership(&membership).await
    }

    /// Makes this membership the user's primary one and demotes the rest.
    pub async fn set_primary(
        &self,
        user_id: &Uuid,
        membership_id: &Uuid,
    ) -> Result<Membership, DomainError> {
        let mut membership = self
            .org_repo
            .find_membership_by_id(membership_id)
            .await?
            .filter(|m| m.user_id == *user_id)
            .ok_or(DomainError::MembershipNotFound)?;
        membership.mark_primary();
        let membership = self.org_repo.update_membership(&membership).await?;
        self.org_repo
            .clear_other_primaries(user_id, membership_id)
            .await?;
        Ok(membership)
    }

    pub async fn list_pending_invites(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<OrganizationInvite>, DomainError> {
        self.org_repo.list_pending_invites(organization_id).await
    }

    /// Drops unaccepted invites past their expiry, for the cleanup sweep.
    pub async fn purge_expired_invites(&self) -> Result<u64, DomainError> {
        let purged = self.org_repo.delete_expired_invites().await?;
        if purged > 0 {
            info!("Purged {} expired organization invite(s)", purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::email_repository::MockEmailRepository;
    use crate::repositories::organization_repository::MockOrganizationRepository;
    use crate::repositories::user_repository::MockUserRepository;

    fn emails() -> Arc<EmailService<MockEmailRepository>> {
        let mut repo = MockEmailRepository::new();
        repo.expect_is_blacklisted().returning(|_| Ok(false));
        repo.expect_find_template().returning(|_, _, _| Ok(None));
        Arc::new(EmailService::new(
            Arc::new(repo),
            "noreply@tala.test".into(),
            "Tala".into(),
            "https://tala.test".into(),
        ))
    }

    fn creator() -> User {
        User::new("founder@acme.test".into(), "hash".into(), "Fran".into(), "Ota".into()).unwrap()
    }

    #[tokio::test]
    async fn test_create_organization_seeds_admin_primary() {
        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_by_slug().returning(|_| Ok(None));
        org_repo.expect_create().returning(|o| Ok(o.clone()));
        org_repo
            .expect_create_membership()
            .withf(|m| m.role == MemberRole::OrgAdmin && m.is_primary)
            .returning(|m| Ok(m.clone()));
        org_repo
            .expect_clear_other_primaries()
            .returning(|_, _| Ok(()));

        let service = OrganizationService::new(
            Arc::new(org_repo),
            Arc::new(MockUserRepository::new()),
            emails(),
        );
        let (org, membership) = service
            .create_organization("Acme Talent", OrgKind::Company, None, &creator())
            .await
            .unwrap();
        assert_eq!(org.slug, "acme-talent");
        assert!(membership.is_primary);
    }

    #[tokio::test]
    async fn test_create_organization_rejects_taken_slug() {
        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_by_slug().returning(|slug| {
            Ok(Some(
                Organization::new("Other".into(), OrgKind::Company, Some(slug.to_string()), None)
                    .unwrap(),
            ))
        });

        let service = OrganizationService::new(
            Arc::new(org_repo),
            Arc::new(MockUserRepository::new()),
            emails(),
        );
        let err = service
            .create_organization("Acme", OrgKind::Company, None, &creator())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::SlugAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_invite_rejects_existing_member() {
        let user = creator();
        let user_id = user.id;
        let org_id = Uuid::new_v4();

        let mut user_repo = MockUserRepository::new();
        user_repo
            .expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let mut org_repo = MockOrganizationRepository::new();
        org_repo.expect_find_by_id().returning(move |id| {
            let mut org =
                Organization::new("Acme".into(), OrgKind::Company, None, None).unwrap();
            org.id = *id;
            Ok(Some(org))
        });
        org_repo.expect_find_membership().returning(move |_, _| {
            Ok(Some(Membership::new(user_id, org_id, MemberRole::Member)))
        });

        let service =
            OrganizationService::new(Arc::new(org_repo), Arc::new(user_repo), emails());
        let err = service
            .invite_member(&org_id, "founder@acme.test", MemberRole::Member, &creator(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::UserAlreadyInOrganization));
    }

    #[tokio::test]
    async fn test_accept_expired_invite_fails() {
        let user = creator();
        let mut invite = OrganizationInvite::new(
            Uuid::new_v4(),
            user.email.clone(),
            MemberRole::Member,
            "tok".into(),
            Uuid::new_v4(),
            String::new(),
        )
        .unwrap();
        invite.expires_at = chrono::Utc::now() - chrono::Duration::days(1);

        let mut org_repo = MockOrganizationRepository::new();
        org_repo
            .expect_find_invite_by_token()
            .returning(move |_| Ok(Some(invite.clone())));

        let service = OrganizationService::new(
            Arc::new(org_repo),
            Arc::new(MockUserRepository::new()),
            emails(),
        );
        let err = service.accept_invite("tok", &user).await.unwrap_err();
        assert!(matches!(err, DomainError::InviteExpired));
    }

    #[tokio::test]
    async fn test_accept_invite_first_membership_is_primary() {
        let user = creator();
        let invite = OrganizationInvite::new(
            Uuid::new_v4(),
            user.email.clone(),
            MemberRole::Hr,
            "tok".into(),
            Uuid::new_v4(),
            String::new(),
        )
        .unwrap();

        let mut org_repo = MockOrganizationRepository::new();
        let found = invite.clone();
        org_repo
            .expect_find_invite_by_token()
            .returning(move |_| Ok(Some(found.clone())));
        org_repo.expect_find_membership().returning(|_, _| Ok(None));
        org_repo
            .expect_find_primary_membership()
            .returning(|_| Ok(None));
        org_repo
            .expect_create_membership()
            .withf(|m| m.is_primary && m.role == MemberRole::Hr && m.accepted_at.is_some())
            .returning(|m| Ok(m.clone()));
        org_repo
            .expect_update_invite()
            .withf(|i| i.is_accepted)
            .returning(|i| Ok(i.clone()));

        let service = OrganizationService::new(
            Arc::new(org_repo),
            Arc::new(MockUserRepository::new()),
            emails(),
        );
        let membership = service.accept_invite("tok", &user).await.unwrap();
        assert!(membership.is_primary);
    }
}
