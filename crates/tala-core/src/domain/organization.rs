// ============================================================================
// Tala Core - Organization Entity
// File: crates/tala-core/src/domain/organization.rs
// Description: Tenant organizations and invitations
// ============================================================================

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tala_shared::constants::INVITE_EXPIRY_DAYS;
use tala_shared::utils::slugify;
use uuid::Uuid;
use validator::Validate;

use super::membership::MemberRole;

/// Organization kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrgKind {
    Company,
    Recruiter,
}

impl OrgKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgKind::Company => "COMPANY",
            OrgKind::Recruiter => "RECRUITER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COMPANY" => Some(OrgKind::Company),
            "RECRUITER" => Some(OrgKind::Recruiter),
            _ => None,
        }
    }
}

/// Tenant organization. `phone`, address lines and `tax_id` are encrypted at
/// rest by the persistence layer; the entity always holds plaintext.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Organization {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1, max = 200))]
    pub slug: String,
    pub kind: OrgKind,

    pub locale_default: String,
    pub timezone: String,

    pub domain_primary: String,
    pub subdomain: String,

    #[validate(email)]
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

    // Audit fields
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub removed_at: Option<DateTime<Utc>>,
}

impl Organization {
    /// Slug and subdomain default to a normalized form of the name.
    pub fn new(
        name: String,
        kind: OrgKind,
        slug: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<Self, validator::ValidationErrors> {
        let slug = slug.unwrap_or_else(|| slugify(&name));
        let org = Self {
            id: Uuid::new_v4(),
            name,
            subdomain: slug.clone(),
            slug,
            kind,
            locale_default: "en".to_string(),
            timezone: "UTC".to_string(),
            domain_primary: String::new(),
            email: None,
            phone: String::new(),
            website: String::new(),
            address_line1: String::new(),
            address_line2: String::new(),
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: String::new(),
            tax_id: String::new(),
            legal_name: String::new(),
            is_active: true,
            allow_self_registration: false,
            primary_color: "#007bff".to_string(),
            created_at: Utc::now(),
            created_by,
            modified_at: None,
            removed_at: None,
        };
        org.validate()?;
        Ok(org)
    }

    pub fn is_company(&self) -> bool {
        self.kind == OrgKind::Company
    }

    pub fn is_recruiter(&self) -> bool {
        self.kind == OrgKind::Recruiter
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.modified_at = Some(Utc::now());
    }

    pub fn soft_delete(&mut self) {
        self.removed_at = Some(Utc::now());
        self.is_active = false;
    }

    pub fn is_deleted(&self) -> bool {
        self.removed_at.is_some()
    }
}

/// Invitation to join an organization, sent by email.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrganizationInvite {
    pub id: Uuid,
    pub organization_id: Uuid,

    #[validate(email)]
    pub email: String,
    pub role: MemberRole,
    pub token: String,

    pub invited_by: Uuid,
    pub message: String,

    pub is_accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl OrganizationInvite {
    pub fn new(
        organization_id: Uuid,
        email: String,
        role: MemberRole,
        token: String,
        invited_by: Uuid,
        message: String,
    ) -> Result<Self, validator::ValidationErrors> {
        let invite = Self {
            id: Uuid::new_v4(),
            organization_id,
            email: email.to_lowercase(),
            role,
            token,
            invited_by,
            message,
            is_accepted: false,
            accepted_at: None,
            expires_at: Utc::now() + Duration::days(INVITE_EXPIRY_DAYS),
            created_at: Utc::now(),
        };
        invite.validate()?;
        Ok(invite)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    pub fn mark_accepted(&mut self) {
        self.is_accepted = true;
        self.accepted_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_defaults_from_name() {
        let org = Organization::new("Nova Talento Ltda.".into(), OrgKind::Company, None, None)
            .unwrap();
        assert_eq!(org.slug, "nova-talento-ltda");
        assert_eq!(org.subdomain, org.slug);
        assert!(org.is_company());
    }

    #[test]
    fn test_explicit_slug_kept() {
        let org = Organization::new(
            "Nova Talento".into(),
            OrgKind::Recruiter,
            Some("talento".into()),
            None,
        )
        .unwrap();
        assert_eq!(org.slug, "talento");
        assert!(org.is_recruiter());
    }

    #[test]
    fn test_invite_expiry_window() {
        let invite = OrganizationInvite::new(
            Uuid::new_v4(),
            "Person@Example.com".into(),
            MemberRole::Member,
            "tok".into(),
            Uuid::new_v4(),
            String::new(),
        )
        .unwrap();
        assert_eq!(invite.email, "person@example.com");
        assert!(!invite.is_expired());
        assert!(invite.expires_at > Utc::now() + Duration::days(INVITE_EXPIRY_DAYS - 1));
    }
}
