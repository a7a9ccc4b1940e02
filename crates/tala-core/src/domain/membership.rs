// ============================================================================
// Tala Core - Membership Entity
// File: crates/tala-core/src/domain/membership.rs
// Description: User membership in organizations with role hierarchy
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Member role within an organization. Ordered by privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    SuperAdmin,
    OrgAdmin,
    Manager,
    Hr,
    Recruiter,
    Member,
    Viewer,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::SuperAdmin => "SUPER_ADMIN",
            MemberRole::OrgAdmin => "ORG_ADMIN",
            MemberRole::Manager => "MANAGER",
            MemberRole::Hr => "HR",
            MemberRole::Recruiter => "RECRUITER",
            MemberRole::Member => "MEMBER",
            MemberRole::Viewer => "VIEWER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SUPER_ADMIN" => Some(MemberRole::SuperAdmin),
            "ORG_ADMIN" => Some(MemberRole::OrgAdmin),
            "MANAGER" => Some(MemberRole::Manager),
            "HR" => Some(MemberRole::Hr),
            "RECRUITER" => Some(MemberRole::Recruiter),
            "MEMBER" => Some(MemberRole::Member),
            "VIEWER" => Some(MemberRole::Viewer),
            _ => None,
        }
    }

    /// Privilege level used for minimum-role checks on routes.
    pub fn level(&self) -> u8 {
        match self {
            MemberRole::SuperAdmin => 6,
            MemberRole::OrgAdmin => 5,
            MemberRole::Manager => 4,
            MemberRole::Hr => 3,
            MemberRole::Recruiter => 2,
            MemberRole::Member => 1,
            MemberRole::Viewer => 0,
        }
    }

    pub fn at_least(&self, required: MemberRole) -> bool {
        self.level() >= required.level()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, MemberRole::SuperAdmin | MemberRole::OrgAdmin)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(
            self,
            MemberRole::SuperAdmin | MemberRole::OrgAdmin | MemberRole::Hr
        )
    }

    pub fn can_view_reports(&self) -> bool {
        matches!(
            self,
            MemberRole::SuperAdmin
                | MemberRole::OrgAdmin
                | MemberRole::Manager
                | MemberRole::Hr
                | MemberRole::Recruiter
        )
    }
}

/// Links a user to an organization. `(user_id, organization_id)` is unique;
/// at most one membership per user is primary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,

    pub is_active: bool,
    pub is_primary: bool,

    // Invitation trail
    pub invited_by: Option<Uuid>,
    pub invited_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Membership {
    pub fn new(user_id: Uuid, organization_id: Uuid, role: MemberRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            organization_id,
            role,
            is_active: true,
            is_primary: false,
            invited_by: None,
            invited_at: None,
            accepted_at: None,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    /// Membership created by accepting an invite keeps the invitation trail.
    pub fn from_invite(
        user_id: Uuid,
        organization_id: Uuid,
        role: MemberRole,
        invited_by: Uuid,
        invited_at: DateTime<Utc>,
    ) -> Self {
        let mut membership = Self::new(user_id, organization_id, role);
        membership.invited_by = Some(invited_by);
        membership.invited_at = Some(invited_at);
        membership.accepted_at = Some(Utc::now());
        membership
    }

    pub fn change_role(&mut self, role: MemberRole) {
        self.role = role;
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_primary(&mut self) {
        self.is_primary = true;
        self.modified_at = Some(Utc::now());
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.is_primary = false;
        self.modified_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(MemberRole::SuperAdmin.at_least(MemberRole::OrgAdmin));
        assert!(MemberRole::Manager.at_least(MemberRole::Member));
        assert!(!MemberRole::Viewer.at_least(MemberRole::Member));
        assert!(MemberRole::Hr.at_least(MemberRole::Hr));
        assert!(!MemberRole::Recruiter.at_least(MemberRole::Manager));
    }

    #[test]
    fn test_role_policies() {
        assert!(MemberRole::OrgAdmin.is_admin());
        assert!(!MemberRole::Hr.is_admin());
        assert!(MemberRole::Hr.can_manage_users());
        assert!(!MemberRole::Manager.can_manage_users());
        assert!(MemberRole::Recruiter.can_view_reports());
        assert!(!MemberRole::Member.can_view_reports());
        assert!(!MemberRole::Viewer.can_view_reports());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [
            MemberRole::SuperAdmin,
            MemberRole::OrgAdmin,
            MemberRole::Manager,
            MemberRole::Hr,
            MemberRole::Recruiter,
            MemberRole::Member,
            MemberRole::Viewer,
        ] {
            assert_eq!(MemberRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(MemberRole::from_str("OWNER"), None);
    }

    #[test]
    fn test_from_invite_keeps_trail() {
        let inviter = Uuid::new_v4();
        let invited_at = Utc::now();
        let membership = Membership::from_invite(
            Uuid::new_v4(),
            Uuid::new_v4(),
            MemberRole::Hr,
            inviter,
            invited_at,
        );
        assert_eq!(membership.invited_by, Some(inviter));
        assert_eq!(membership.invited_at, Some(invited_at));
        assert!(membership.accepted_at.is_some());
        assert!(membership.is_active);
        assert!(!membership.is_primary);
    }

    #[test]
    fn test_deactivate_clears_primary() {
        let mut membership = Membership::new(Uuid::new_v4(), Uuid::new_v4(), MemberRole::Member);
        membership.mark_primary();
        assert!(membership.is_primary);
        membership.deactivate();
        assert!(!membership.is_active);
        assert!(!membership.is_primary);
    }
}
