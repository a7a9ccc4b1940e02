// ============================================================================
// Tala API - Billing Handlers
// File: crates/tala-api/src/handlers/billing.rs
// ============================================================================
//! Plans, subscriptions, usage meters, coupons and invoices

use axum::extract::{Path, Query, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tala_core::domain::{
    BillingCycle, Invoice, InvoiceItem, MonthlyRevenueRow, PaymentProvider, Plan, Subscription,
    UsageTrendRow, UsageType,
};
use tala_core::error::DomainError;
use tala_core::services::{CouponQuote, UsageSnapshot};

use crate::error::ApiError;
use crate::extract::{require_role, Tenant};
use crate::handlers::PageQuery;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
    pub billing_cycle: BillingCycle,
    pub provider: PaymentProvider,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CancelSubscriptionRequest {
    pub reason: Option<String>,
    pub at_period_end: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct IncrementUsageRequest {
    pub usage_type: UsageType,
    pub amount: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PayInvoiceRequest {
    pub payment_method: Option<String>,
}

/// Coupon verdict: invalid codes are a negative answer, not an error.
#[derive(Debug, Serialize)]
pub struct CouponVerdict {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<CouponQuote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

// ---------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------

/// GET /api/v1/billing/plans — public, feeds the pricing page.
pub async fn list_plans(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Plan>>>, ApiError> {
    let plans = state.billing.list_plans().await?;
    Ok(Json(ApiResponse::success(plans)))
}

/// GET /api/v1/billing/plans/{id}
pub async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Plan>>, ApiError> {
    let plan = state.billing.get_plan(&id).await?;
    Ok(Json(ApiResponse::success(plan)))
}

// ---------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------

/// POST /api/v1/billing/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<SubscribeRequest>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let subscription = state
        .billing
        .subscribe(
            &ctx.organization_id,
            &payload.plan_id,
            payload.billing_cycle,
            payload.provider,
            payload.coupon_code.as_deref(),
        )
        .await?;
    Ok(Json(ApiResponse::success(subscription)))
}

/// GET /api/v1/billing/subscription
pub async fn current_subscription(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let subscription = state.billing.current_subscription(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(subscription)))
}

/// POST /api/v1/billing/subscription/cancel
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<CancelSubscriptionRequest>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let subscription = state
        .billing
        .cancel_subscription(
            &ctx.organization_id,
            payload.reason.unwrap_or_default(),
            payload.at_period_end.unwrap_or(true),
        )
        .await?;
    Ok(Json(ApiResponse::success(subscription)))
}

// ---------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------

/// GET /api/v1/billing/usage
pub async fn usage_report(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<UsageSnapshot>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let report = state.billing.usage_report(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(report)))
}

/// POST /api/v1/billing/usage/increment
///
/// Manual metering for API-driven integrations. Meters without an
/// overage allowance answer 429 at their limit.
pub async fn increment_usage(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<IncrementUsageRequest>,
) -> Result<Json<ApiResponse<UsageSnapshot>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    if payload.amount <= 0 {
        return Err(ApiError::BadRequest("amount must be positive".to_string()));
    }
    let snapshot = state
        .billing
        .increment_usage(&ctx.organization_id, payload.usage_type, payload.amount)
        .await?;
    Ok(Json(ApiResponse::success(snapshot)))
}

// ---------------------------------------------------------------------
// Coupons
// ---------------------------------------------------------------------

/// POST /api/v1/billing/coupons/validate
///
/// Always answers 200: the verdict carries whether the code applies and
/// the discounted total when it does.
pub async fn validate_coupon(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Json(payload): Json<ValidateCouponRequest>,
) -> Result<Json<ApiResponse<CouponVerdict>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    payload.validate()?;
    let verdict = match state
        .billing
        .validate_coupon(&ctx.organization_id, &payload.code, payload.amount)
        .await
    {
        Ok(quote) => CouponVerdict {
            valid: true,
            quote: Some(quote),
            message: None,
        },
        Err(DomainError::CouponNotFound) => CouponVerdict {
            valid: false,
            quote: None,
            message: Some("coupon code not found".to_string()),
        },
        Err(DomainError::CouponNotValid(reason)) => CouponVerdict {
            valid: false,
            quote: None,
            message: Some(reason),
        },
        Err(e) => return Err(e.into()),
    };
    Ok(Json(ApiResponse::success(verdict)))
}

// ---------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------

/// GET /api/v1/billing/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let invoices = state
        .billing
        .list_invoices(&ctx.organization_id, page.pagination())
        .await?;
    Ok(Json(ApiResponse::success(invoices)))
}

/// GET /api/v1/billing/invoices/{id}
pub async fn get_invoice(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<InvoiceDetail>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let invoice = state.billing.get_invoice(&ctx.organization_id, &id).await?;
    let items = state.billing.invoice_items(&invoice.id).await?;
    Ok(Json(ApiResponse::success(InvoiceDetail { invoice, items })))
}

/// POST /api/v1/billing/invoices/{id}/pay
///
/// Manual settlement for the MANUAL provider; card providers settle
/// through webhooks instead.
pub async fn pay_invoice(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    Json(payload): Json<PayInvoiceRequest>,
) -> Result<Json<ApiResponse<Invoice>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let invoice = state
        .billing
        .mark_invoice_paid(
            &ctx.organization_id,
            &id,
            payload.payment_method.unwrap_or_else(|| "manual".to_string()),
        )
        .await?;
    Ok(Json(ApiResponse::success(invoice)))
}

// ---------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------

/// GET /api/v1/billing/analytics/revenue
pub async fn monthly_revenue(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<MonthlyRevenueRow>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let rows = state.billing.monthly_revenue(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// GET /api/v1/billing/analytics/usage-trend
pub async fn usage_trend(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> Result<Json<ApiResponse<Vec<UsageTrendRow>>>, ApiError> {
    require_role(&ctx, |r| r.is_admin())?;
    let rows = state.billing.usage_trend(&ctx.organization_id).await?;
    Ok(Json(ApiResponse::success(rows)))
}
