// ============================================================================
// Tala Infrastructure - PostgreSQL Organization Repository
// File: crates/tala-infrastructure/src/database/postgres/organization_repo_impl.rs
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{MemberRole, Membership, Organization, OrganizationInvite, OrgKind};
use tala_core::error::DomainError;
use tala_core::repositories::OrganizationRepository;
use tala_security::FieldCipher;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

/// Organization lookups run on the bare pool: they happen while the tenant
/// is still being resolved. Membership and invite access is tenant-scoped
/// except for the cross-organization flows (a user's own membership list,
/// primary switching, token-based invite acceptance).
pub struct PgOrganizationRepository {
    pool: PgPool,
    cipher: Arc<FieldCipher>,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool, cipher: Arc<FieldCipher>) -> Self {
        Self { pool, cipher }
    }

    fn decrypt(&self, mut org: Organization) -> Organization {
        org.phone = self.cipher.decrypt(&org.phone);
        org.address_line1 = self.cipher.decrypt(&org.address_line1);
        org.address_line2 = self.cipher.decrypt(&org.address_line2);
        org.tax_id = self.cipher.decrypt(&org.tax_id);
        org
    }

    fn encrypt(&self, value: &str) -> Result<String, DomainError> {
        self.cipher
            .encrypt(value)
            .map_err(|e| DomainError::InternalError(e.to_string()))
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub kind: String,
    pub locale_default: String,
    pub timezone: String,
    pub domain_primary: String,
    pub subdomain: String,
    pub email: Option<String>,
    pub phone: String,
    pub website: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub tax_id: String,
    pub legal_name: String,
    pub is_active: bool,
    pub allow_self_registration: bool,
    pub primary_color: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl From<OrganizationRow> for Organization {
    fn from(row: OrganizationRow) -> Self {
        Organization {
            id: row.id,
            name: row.name,
            slug: row.slug,
            kind: OrgKind::from_str(&row.kind).unwrap_or(OrgKind::Company),
            locale_default: row.locale_default,
            timezone: row.timezone,
            domain_primary: row.domain_primary,
            subdomain: row.subdomain,
            email: row.email,
            phone: row.phone,
            website: row.website,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
            tax_id: row.tax_id,
            legal_name: row.legal_name,
            is_active: row.is_active,
            allow_self_registration: row.allow_self_registration,
            primary_color: row.primary_color,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
            removed_at: row.removed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: String,
    pub is_active: bool,
    pub is_primary: bool,
    pub invited_by: Option<Uuid>,
    pub invited_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<MembershipRow> for Membership {
    fn from(row: MembershipRow) -> Self {
        Membership {
            id: row.id,
            user_id: row.user_id,
            organization_id: row.organization_id,
            role: MemberRole::from_str(&row.role).unwrap_or(MemberRole::Member),
            is_active: row.is_active,
            is_primary: row.is_primary,
            invited_by: row.invited_by,
            invited_at: row.invited_at,
            accepted_at: row.accepted_at,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InviteRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub email: String,
    pub role: String,
    pub token: String,
    pub invited_by: Uuid,
    pub message: String,
    pub is_accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<InviteRow> for OrganizationInvite {
    fn from(row: InviteRow) -> Self {
        OrganizationInvite {
            id: row.id,
            organization_id: row.organization_id,
            email: row.email,
            role: MemberRole::from_str(&row.role).unwrap_or(MemberRole::Member),
            token: row.token,
            invited_by: row.invited_by,
            message: row.message,
            is_accepted: row.is_accepted,
            accepted_at: row.accepted_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, slug, kind, locale_default, timezone,
                domain_primary, subdomain, email, phone, website,
                address_line1, address_line2, city, state, postal_code, country,
                tax_id, legal_name, is_active, allow_self_registration, primary_color,
                created_at, created_by, modified_at, removed_at
            FROM organizations
            WHERE id = $1 AND removed_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding organization by id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| self.decrypt(r.into())))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, DomainError> {
        let row: Option<OrganizationRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, slug, kind, locale_default, timezone,
                domain_primary, subdomain, email, phone, website,
                address_line1, address_line2, city, state, postal_code, country,
                tax_id, legal_name, is_active, allow_self_registration, primary_color,
                created_at, created_by, modified_at, removed_at
            FROM organizations
            WHERE slug = LOWER($1) AND removed_at IS NULL
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding organization by slug: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| self.decrypt(r.into())))
    }

    async fn create(&self, organization: &Organization) -> Result<Organization, DomainError> {
        info!("Creating organization with slug: {}", organization.slug);

        let row: OrganizationRow = sqlx::query_as(
            r#"
            INSERT INTO organizations (
                id, name, slug, kind, locale_default, timezone,
                domain_primary, subdomain, email, phone, website,
                address_line1, address_line2, city, state, postal_code, country,
                tax_id, legal_name, is_active, allow_self_registration, primary_color,
                created_at, created_by, modified_at, removed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26)
            RETURNING
                id, name, slug, kind, locale_default, timezone,
                domain_primary, subdomain, email, phone, website,
                address_line1, address_line2, city, state, postal_code, country,
                tax_id, legal_name, is_active, allow_self_registration, primary_color,
                created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(organization.kind.as_str())
        .bind(&organization.locale_default)
        .bind(&organization.timezone)
        .bind(&organization.domain_primary)
        .bind(&organization.subdomain)
        .bind(&organization.email)
        .bind(self.encrypt(&organization.phone)?)
        .bind(&organization.website)
        .bind(self.encrypt(&organization.address_line1)?)
        .bind(self.encrypt(&organization.address_line2)?)
        .bind(&organization.city)
        .bind(&organization.state)
        .bind(&organization.postal_code)
        .bind(&organization.country)
        .bind(self.encrypt(&organization.tax_id)?)
        .bind(&organization.legal_name)
        .bind(organization.is_active)
        .bind(organization.allow_self_registration)
        .bind(&organization.primary_color)
        .bind(organization.created_at)
        .bind(organization.created_by)
        .bind(organization.modified_at)
        .bind(organization.removed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating organization: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::SlugAlreadyExists(organization.slug.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        info!("Organization created successfully: {}", row.id);
        Ok(self.decrypt(row.into()))
    }

    async fn update(&self, organization: &Organization) -> Result<Organization, DomainError> {
        let row: OrganizationRow = sqlx::query_as(
            r#"
            UPDATE organizations SET
                name = $2,
                slug = $3,
                kind = $4,
                locale_default = $5,
                timezone = $6,
                domain_primary = $7,
                subdomain = $8,
                email = $9,
                phone = $10,
                website = $11,
                address_line1 = $12,
                address_line2 = $13,
                city = $14,
                state = $15,
                postal_code = $16,
                country = $17,
                tax_id = $18,
                legal_name = $19,
                is_active = $20,
                allow_self_registration = $21,
                primary_color = $22,
                modified_at = $23,
                removed_at = $24
            WHERE id = $1
            RETURNING
                id, name, slug, kind, locale_default, timezone,
                domain_primary, subdomain, email, phone, website,
                address_line1, address_line2, city, state, postal_code, country,
                tax_id, legal_name, is_active, allow_self_registration, primary_color,
                created_at, created_by, modified_at, removed_at
            "#,
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(&organization.slug)
        .bind(organization.kind.as_str())
        .bind(&organization.locale_default)
        .bind(&organization.timezone)
        .bind(&organization.domain_primary)
        .bind(&organization.subdomain)
        .bind(&organization.email)
        .bind(self.encrypt(&organization.phone)?)
        .bind(&organization.website)
        .bind(self.encrypt(&organization.address_line1)?)
        .bind(self.encrypt(&organization.address_line2)?)
        .bind(&organization.city)
        .bind(&organization.state)
        .bind(&organization.postal_code)
        .bind(&organization.country)
        .bind(self.encrypt(&organization.tax_id)?)
        .bind(&organization.legal_name)
        .bind(organization.is_active)
        .bind(organization.allow_self_registration)
        .bind(&organization.primary_color)
        .bind(organization.modified_at)
        .bind(organization.removed_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating organization: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::SlugAlreadyExists(organization.slug.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;

        Ok(self.decrypt(row.into()))
    }

    async fn find_membership(
        &self,
        user_id: &Uuid,
        organization_id: &Uuid,
    ) -> Result<Option<Membership>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            FROM memberships
            WHERE user_id = $1 AND organization_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding membership: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_membership_by_id(&self, id: &Uuid) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            FROM memberships
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding membership by id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_memberships_for_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<Membership>, DomainError> {
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            FROM memberships
            WHERE user_id = $1 AND is_active
            ORDER BY is_primary DESC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing memberships for user: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_primary_membership(
        &self,
        user_id: &Uuid,
    ) -> Result<Option<Membership>, DomainError> {
        let row: Option<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            FROM memberships
            WHERE user_id = $1 AND is_primary AND is_active
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding primary membership: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_members(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Membership>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<MembershipRow> = sqlx::query_as(
            r#"
            SELECT
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            FROM memberships
            WHERE organization_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing members: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn count_active_members(&self, organization_id: &Uuid) -> Result<i64, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE organization_id = $1 AND is_active
            "#,
        )
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error counting members: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(count)
    }

    async fn create_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let mut tx = tenant_tx(&self.pool, &membership.organization_id).await?;
        let row: MembershipRow = sqlx::query_as(
            r#"
            INSERT INTO memberships (
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            "#,
        )
        .bind(membership.id)
        .bind(membership.user_id)
        .bind(membership.organization_id)
        .bind(membership.role.as_str())
        .bind(membership.is_active)
        .bind(membership.is_primary)
        .bind(membership.invited_by)
        .bind(membership.invited_at)
        .bind(membership.accepted_at)
        .bind(membership.created_at)
        .bind(membership.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating membership: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::UserAlreadyInOrganization
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        info!("Membership created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn update_membership(&self, membership: &Membership) -> Result<Membership, DomainError> {
        let mut tx = tenant_tx(&self.pool, &membership.organization_id).await?;
        let row: MembershipRow = sqlx::query_as(
            r#"
            UPDATE memberships SET
                role = $2,
                is_active = $3,
                is_primary = $4,
                accepted_at = $5,
                modified_at = $6
            WHERE id = $1
            RETURNING
                id, user_id, organization_id, role, is_active, is_primary,
                invited_by, invited_at, accepted_at, created_at, modified_at
            "#,
        )
        .bind(membership.id)
        .bind(membership.role.as_str())
        .bind(membership.is_active)
        .bind(membership.is_primary)
        .bind(membership.accepted_at)
        .bind(membership.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating membership: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn clear_other_primaries(
        &self,
        user_id: &Uuid,
        keep_membership_id: &Uuid,
    ) -> Result<(), DomainError> {
        // Demotes primaries across all of the user's organizations, so it
        // deliberately runs without a tenant scope.
        sqlx::query(
            r#"
            UPDATE memberships SET
                is_primary = FALSE,
                modified_at = NOW()
            WHERE user_id = $1 AND id <> $2 AND is_primary
            "#,
        )
        .bind(user_id)
        .bind(keep_membership_id)
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error clearing primary memberships: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }

    async fn create_invite(
        &self,
        invite: &OrganizationInvite,
    ) -> Result<OrganizationInvite, DomainError> {
        let mut tx = tenant_tx(&self.pool, &invite.organization_id).await?;
        let row: InviteRow = sqlx::query_as(
            r#"
            INSERT INTO organization_invites (
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            "#,
        )
        .bind(invite.id)
        .bind(invite.organization_id)
        .bind(&invite.email)
        .bind(invite.role.as_str())
        .bind(&invite.token)
        .bind(invite.invited_by)
        .bind(&invite.message)
        .bind(invite.is_accepted)
        .bind(invite.accepted_at)
        .bind(invite.expires_at)
        .bind(invite.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating invite: {}", e);
            let msg = e.to_string();
            if msg.contains("unique") || msg.contains("duplicate") {
                DomainError::InviteAlreadyExists(invite.email.clone())
            } else {
                DomainError::DatabaseError(msg)
            }
        })?;
        commit(tx).await?;

        info!("Invite created successfully: {}", row.id);
        Ok(row.into())
    }

    async fn find_invite_by_token(
        &self,
        token: &str,
    ) -> Result<Option<OrganizationInvite>, DomainError> {
        let row: Option<InviteRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            FROM organization_invites
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding invite by token: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_pending_invite(
        &self,
        organization_id: &Uuid,
        email: &str,
    ) -> Result<Option<OrganizationInvite>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<InviteRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            FROM organization_invites
            WHERE organization_id = $1 AND LOWER(email) = LOWER($2) AND NOT is_accepted
            "#,
        )
        .bind(organization_id)
        .bind(email)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding pending invite: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_pending_invites(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<OrganizationInvite>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<InviteRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            FROM organization_invites
            WHERE organization_id = $1 AND NOT is_accepted AND expires_at > NOW()
            ORDER BY created_at DESC
            "#,
        )
        .bind(organization_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing pending invites: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_invite(
        &self,
        invite: &OrganizationInvite,
    ) -> Result<OrganizationInvite, DomainError> {
        let mut tx = tenant_tx(&self.pool, &invite.organization_id).await?;
        let row: InviteRow = sqlx::query_as(
            r#"
            UPDATE organization_invites SET
                role = $2,
                message = $3,
                is_accepted = $4,
                accepted_at = $5,
                expires_at = $6
            WHERE id = $1
            RETURNING
                id, organization_id, email, role, token, invited_by,
                message, is_accepted, accepted_at, expires_at, created_at
            "#,
        )
        .bind(invite.id)
        .bind(invite.role.as_str())
        .bind(&invite.message)
        .bind(invite.is_accepted)
        .bind(invite.accepted_at)
        .bind(invite.expires_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating invite: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn delete_expired_invites(&self) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM organization_invites
            WHERE NOT is_accepted AND expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error deleting expired invites: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(result.rows_affected())
    }
}
