// ============================================================================
// Tala API - Organization Handlers
// File: crates/tala-api/src/handlers/organizations.rs
// ============================================================================
//! Organization lifecycle, membership management and invitations

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{MemberRole, Membership, OrgKind, Organization, OrganizationInvite};

use crate::error::ApiError;
use crate::extract::{require_role, CurrentUser, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: OrgKind,
    pub slug: Option<String>,
}

/// Optional-field patch; absent fields keep their current value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub locale_default: Option<String>,
    pub timezone: Option<String>,
    pub domain_primary: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_id: Option<String>,
    pub legal_name: Option<String>,
    pub allow_self_registration: Option<bool>,
    pub primary_color: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteMemberRequest {
    #[validate(email)]
    pub email: String,
    pub role: MemberRole,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: MemberRole,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrganization {
    pub organization: Organization,
    pub membership: Membership,
}

/// POST /api/v1/organizations — the caller becomes the ORG_ADMIN.
pub async fn create_organization(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateOrganizationRequest>,
) -> Result<Json<ApiResponse<CreatedOrganization>>, ApiError> {
    payload.validate()?;
    let (organization, membership) = state
        .organizations
        .create_organization(&payload.name, payload.kind, payload.slug, &user)
        .await?;
    Ok(Json(ApiResponse::success(CreatedOrganization {
        organization,
        membership,
    })))
}

/// GET /api/v1/organizations/current
pub async fn current_organization(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Organization>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let organization = state.organizations.get(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(organization)))
}

/// PUT /api/v1/organizations/current
pub async fn update_organization(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<UpdateOrganizationRequest>,
) -> Result<Json<ApiResponse<Organization>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    payload.validate()?;

    let mut organization = state.organizations.get(&ctx.organization_id).await?;
    if let Some(name) = payload.name {
        organization.name = name;
    }
    if let Some(email) = payload.email {
        organization.email = Some(email);
    }
    if let Some(phone) = payload.phone {
        organization.phone = phone;
    }
    if let Some(website) = payload.website {
        organization.website = website;
    }
    if let Some(locale) = payload.locale_default {
        organization.locale_default = locale;
    }
    if let Some(timezone) = payload.timezone {
        organization.timezone = timezone;
    }
    if let Some(domain) = payload.domain_primary {
        organization.domain_primary = domain;
    }
    if let Some(line1) = payload.address_line1 {
        organization.address_line1 = line1;
    }
    if let Some(line2) = payload.address_line2 {
        organization.address_line2 = line2;
    }
    if let Some(city) = payload.city {
        organization.city = city;
    }
    if let Some(region) = payload.state {
        organization.state = region;
    }
    if let Some(postal_code) = payload.postal_code {
        organization.postal_code = postal_code;
    }
    if let Some(country) = payload.country {
        organization.country = country;
    }
    if let Some(tax_id) = payload.tax_id {
        organization.tax_id = tax_id;
    }
    if let Some(legal_name) = payload.legal_name {
        organization.legal_name = legal_name;
    }
    if let Some(allow) = payload.allow_self_registration {
        organization.allow_self_registration = allow;
    }
    if let Some(color) = payload.primary_color {
        organization.primary_color = color;
    }

    let organization = state.organizations.update(&organization).await?;
    // Cached tenant resolution must not serve the pre-update row
    state.slug_cache.invalidate(&organization.slug);
    Ok(Json(ApiResponse::success(organization)))
}

/// GET /api/v1/organizations/memberships — all memberships of the caller.
pub async fn my_memberships(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Vec<Membership>>>, ApiError> {
    let memberships = state
        .organizations
        .list_memberships_for_user(&user.id)
        .await?;
    Ok(Json(ApiResponse::success(memberships)))
}

/// PUT /api/v1/organizations/memberships/{id}/primary
pub async fn set_primary_membership(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(membership_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Membership>>, ApiError> {
    let membership = state
        .organizations
        .set_primary(&user.id, &membership_id)
        .await?;
    Ok(Json(ApiResponse::success(membership)))
}

/// GET /api/v1/members
pub async fn list_members(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Membership>>>, ApiError> {
    require_role(&ctx, |r| r.at_least(MemberRole::Viewer))?;
    let members = state
        .organizations
        .list_members(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(members)))
}

/// POST /api/v1/members/invites
pub async fn invite_member(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<InviteMemberRequest>,
) -> Result<Json<ApiResponse<OrganizationInvite>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    payload.validate()?;
    let invite = state
        .organizations
        .invite_member(
            &ctx.organization_id,
            &payload.email,
            payload.role,
            &user,
            payload.message.unwrap_or_default(),
        )
        .await?;
    Ok(Json(ApiResponse::success(invite)))
}

/// GET /api/v1/members/invites
pub async fn pending_invites(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<OrganizationInvite>>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let invites = state
        .organizations
        .list_pending_invites(&ctx.organization_id)
        .await?;
    Ok(Json(ApiResponse::success(invites)))
}

/// POST /api/v1/members/invites/accept — token-addressed, so no tenant
/// context is needed; the invite says which organization it is for.
pub async fn accept_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AcceptInviteRequest>,
) -> Result<Json<ApiResponse<Membership>>, ApiError> {
    let membership = state
        .organizations
        .accept_invite(&payload.token, &user)
        .await?;
    Ok(Json(ApiResponse::success(membership)))
}

/// PUT /api/v1/members/{id}/role
pub async fn change_member_role(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(membership_id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<Membership>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let membership = state
        .organizations
        .change_role(&ctx.organization_id, &membership_id, payload.role)
        .await?;
    Ok(Json(ApiResponse::success(membership)))
}

/// DELETE /api/v1/members/{id}
pub async fn remove_member(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(membership_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Membership>>, ApiError> {
    require_role(&ctx, |r| r.can_manage_users())?;
    let membership = state
        .organizations
        .remove_member(&ctx.organization_id, &membership_id)
        .await?;
    Ok(Json(ApiResponse::success(membership)))
}
