// ============================================================================
// Tala Infrastructure - PostgreSQL Billing Repository
// File: crates/tala-infrastructure/src/database/postgres/billing_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::{error, info};
use uuid::Uuid;

use tala_core::domain::{
    BillingCycle, BillingNotification, Coupon, CouponUsage, DiscountType, Invoice, InvoiceItem,
    InvoiceItemKind, InvoiceStatus, MonthlyRevenueRow, NotificationStatus, NotificationType,
    Payment, PaymentProvider, PaymentStatus, Plan, PlanTier, Subscription, SubscriptionStatus,
    UsageMeter, UsageTrendRow, UsageType, WebhookEvent, WebhookStatus,
};
use tala_core::error::DomainError;
use tala_core::repositories::BillingRepository;
use tala_shared::constants::MAX_WEBHOOK_ATTEMPTS;
use tala_shared::types::Pagination;

use crate::database::connection::{commit, tenant_tx};

pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub tier: String,
    pub price_monthly: Decimal,
    pub price_quarterly: Decimal,
    pub price_yearly: Decimal,
    pub currency: String,
    pub max_assessments_per_month: i64,
    pub max_team_members: i64,
    pub max_storage_gb: i64,
    pub includes_pdi: bool,
    pub includes_recruiting: bool,
    pub includes_advanced_reports: bool,
    pub includes_api_access: bool,
    pub trial_days: i32,
    pub paypal_plan_id_monthly: String,
    pub paypal_plan_id_quarterly: String,
    pub paypal_plan_id_yearly: String,
    pub stripe_price_id_monthly: String,
    pub stripe_price_id_quarterly: String,
    pub stripe_price_id_yearly: String,
    pub is_active: bool,
    pub is_public: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Plan {
            id: row.id,
            name: row.name,
            description: row.description,
            tier: PlanTier::from_str(&row.tier).unwrap_or(PlanTier::Basic),
            price_monthly: row.price_monthly,
            price_quarterly: row.price_quarterly,
            price_yearly: row.price_yearly,
            currency: row.currency,
            max_assessments_per_month: row.max_assessments_per_month,
            max_team_members: row.max_team_members,
            max_storage_gb: row.max_storage_gb,
            includes_pdi: row.includes_pdi,
            includes_recruiting: row.includes_recruiting,
            includes_advanced_reports: row.includes_advanced_reports,
            includes_api_access: row.includes_api_access,
            trial_days: row.trial_days,
            paypal_plan_id_monthly: row.paypal_plan_id_monthly,
            paypal_plan_id_quarterly: row.paypal_plan_id_quarterly,
            paypal_plan_id_yearly: row.paypal_plan_id_yearly,
            stripe_price_id_monthly: row.stripe_price_id_monthly,
            stripe_price_id_quarterly: row.stripe_price_id_quarterly,
            stripe_price_id_yearly: row.stripe_price_id_yearly,
            is_active: row.is_active,
            is_public: row.is_public,
            sort_order: row.sort_order,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct SubscriptionRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: Uuid,
    pub billing_cycle: String,
    pub provider: String,
    pub provider_subscription_id: String,
    pub provider_customer_id: String,
    pub status: String,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub amount: Decimal,
    pub currency: String,
    pub cancel_at_period_end: bool,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Subscription {
            id: row.id,
            organization_id: row.organization_id,
            plan_id: row.plan_id,
            billing_cycle: BillingCycle::from_str(&row.billing_cycle)
                .unwrap_or(BillingCycle::Monthly),
            provider: PaymentProvider::from_str(&row.provider)
                .unwrap_or(PaymentProvider::Manual),
            provider_subscription_id: row.provider_subscription_id,
            provider_customer_id: row.provider_customer_id,
            status: SubscriptionStatus::from_str(&row.status)
                .unwrap_or(SubscriptionStatus::Incomplete),
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            trial_start: row.trial_start,
            trial_end: row.trial_end,
            amount: row.amount,
            currency: row.currency,
            cancel_at_period_end: row.cancel_at_period_end,
            cancelled_at: row.cancelled_at,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MeterRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subscription_id: Uuid,
    pub usage_type: String,
    pub current_usage: i64,
    pub usage_limit: i64,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub overage_allowed: bool,
    pub overage_rate: Decimal,
    pub overage_usage: i64,
    pub overage_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<MeterRow> for UsageMeter {
    fn from(row: MeterRow) -> Self {
        UsageMeter {
            id: row.id,
            organization_id: row.organization_id,
            subscription_id: row.subscription_id,
            usage_type: UsageType::from_str(&row.usage_type).unwrap_or(UsageType::Assessments),
            current_usage: row.current_usage,
            limit: row.usage_limit,
            period_start: row.period_start,
            period_end: row.period_end,
            overage_allowed: row.overage_allowed,
            overage_rate: row.overage_rate,
            overage_usage: row.overage_usage,
            overage_cost: row.overage_cost,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InvoiceRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subscription_id: Uuid,
    pub invoice_number: String,
    pub status: String,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: String,
    pub provider: Option<String>,
    pub provider_invoice_id: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.id,
            organization_id: row.organization_id,
            subscription_id: row.subscription_id,
            invoice_number: row.invoice_number,
            status: InvoiceStatus::from_str(&row.status).unwrap_or(InvoiceStatus::Draft),
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            total_amount: row.total_amount,
            currency: row.currency,
            period_start: row.period_start,
            period_end: row.period_end,
            due_date: row.due_date,
            paid_at: row.paid_at,
            payment_method: row.payment_method,
            provider: row.provider.as_deref().and_then(PaymentProvider::from_str),
            provider_invoice_id: row.provider_invoice_id,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub kind: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub usage_meter_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<ItemRow> for InvoiceItem {
    fn from(row: ItemRow) -> Self {
        InvoiceItem {
            id: row.id,
            invoice_id: row.invoice_id,
            kind: InvoiceItemKind::from_str(&row.kind).unwrap_or(InvoiceItemKind::Subscription),
            description: row.description,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
            usage_meter_id: row.usage_meter_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub invoice_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub provider: String,
    pub provider_payment_id: String,
    pub description: String,
    pub failure_reason: String,
    pub refunded_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Payment {
            id: row.id,
            organization_id: row.organization_id,
            invoice_id: row.invoice_id,
            amount: row.amount,
            currency: row.currency,
            status: PaymentStatus::from_str(&row.status).unwrap_or(PaymentStatus::Pending),
            provider: PaymentProvider::from_str(&row.provider)
                .unwrap_or(PaymentProvider::Manual),
            provider_payment_id: row.provider_payment_id,
            description: row.description,
            failure_reason: row.failure_reason,
            refunded_amount: row.refunded_amount,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CouponRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub description: String,
    pub discount_type: String,
    pub discount_value: Decimal,
    pub currency: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub uses_count: i64,
    pub min_amount: Option<Decimal>,
    pub first_time_customers_only: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Coupon {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            discount_type: DiscountType::from_str(&row.discount_type)
                .unwrap_or(DiscountType::Percentage),
            discount_value: row.discount_value,
            currency: row.currency,
            valid_from: row.valid_from,
            valid_until: row.valid_until,
            max_uses: row.max_uses,
            uses_count: row.uses_count,
            min_amount: row.min_amount,
            first_time_customers_only: row.first_time_customers_only,
            is_active: row.is_active,
            created_at: row.created_at,
            created_by: row.created_by,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CouponUsageRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub coupon_id: Uuid,
    pub subscription_id: Uuid,
    pub invoice_id: Option<Uuid>,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub used_at: DateTime<Utc>,
}

impl From<CouponUsageRow> for CouponUsage {
    fn from(row: CouponUsageRow) -> Self {
        CouponUsage {
            id: row.id,
            organization_id: row.organization_id,
            coupon_id: row.coupon_id,
            subscription_id: row.subscription_id,
            invoice_id: row.invoice_id,
            original_amount: row.original_amount,
            discount_amount: row.discount_amount,
            final_amount: row.final_amount,
            used_at: row.used_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    pub id: Uuid,
    pub provider: String,
    pub event_type: String,
    pub provider_event_id: String,
    pub status: String,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: String,
    pub retry_count: i32,
    pub raw_data: Value,
    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl From<EventRow> for WebhookEvent {
    fn from(row: EventRow) -> Self {
        WebhookEvent {
            id: row.id,
            provider: PaymentProvider::from_str(&row.provider)
                .unwrap_or(PaymentProvider::Manual),
            event_type: row.event_type,
            provider_event_id: row.provider_event_id,
            status: WebhookStatus::from_str(&row.status).unwrap_or(WebhookStatus::Pending),
            processed_at: row.processed_at,
            error_message: row.error_message,
            retry_count: row.retry_count,
            raw_data: row.raw_data,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub notification_type: String,
    pub recipient_email: String,
    pub subject: String,
    pub message: String,
    pub subscription_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,
    pub status: String,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for BillingNotification {
    fn from(row: NotificationRow) -> Self {
        BillingNotification {
            id: row.id,
            organization_id: row.organization_id,
            notification_type: NotificationType::from_str(&row.notification_type)
                .unwrap_or(NotificationType::PaymentSuccess),
            recipient_email: row.recipient_email,
            subject: row.subject,
            message: row.message,
            subscription_id: row.subscription_id,
            invoice_id: row.invoice_id,
            status: NotificationStatus::from_str(&row.status)
                .unwrap_or(NotificationStatus::Pending),
            scheduled_for: row.scheduled_for,
            sent_at: row.sent_at,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RevenueRow {
    pub year: i32,
    pub month: i32,
    pub total: Decimal,
}

#[derive(Debug, FromRow)]
struct TrendRow {
    pub usage_type: String,
    pub year: i32,
    pub month: i32,
    pub total_usage: i64,
}

#[async_trait]
impl BillingRepository for PgBillingRepository {
    async fn find_plan(&self, id: &Uuid) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, description, tier, price_monthly, price_quarterly,
                price_yearly, currency, max_assessments_per_month, max_team_members,
                max_storage_gb, includes_pdi, includes_recruiting,
                includes_advanced_reports, includes_api_access, trial_days,
                paypal_plan_id_monthly, paypal_plan_id_quarterly,
                paypal_plan_id_yearly, stripe_price_id_monthly,
                stripe_price_id_quarterly, stripe_price_id_yearly, is_active,
                is_public, sort_order, created_at, modified_at
            FROM plans
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding plan: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_public_plans(&self) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT
                id, name, description, tier, price_monthly, price_quarterly,
                price_yearly, currency, max_assessments_per_month, max_team_members,
                max_storage_gb, includes_pdi, includes_recruiting,
                includes_advanced_reports, includes_api_access, trial_days,
                paypal_plan_id_monthly, paypal_plan_id_quarterly,
                paypal_plan_id_yearly, stripe_price_id_monthly,
                stripe_price_id_quarterly, stripe_price_id_yearly, is_active,
                is_public, sort_order, created_at, modified_at
            FROM plans
            WHERE is_active AND is_public
            ORDER BY sort_order ASC, price_monthly ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing public plans: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_subscription(&self, id: &Uuid) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding subscription: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_subscription_for_org(
        &self,
        organization_id: &Uuid,
    ) -> Result<Option<Subscription>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            FROM subscriptions
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(organization_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding subscription for organization: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn find_subscription_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            FROM subscriptions
            WHERE provider = $1 AND provider_subscription_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(provider_subscription_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding subscription by provider id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn has_any_subscription(&self, organization_id: &Uuid) -> Result<bool, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(SELECT 1 FROM subscriptions WHERE organization_id = $1)"#,
        )
        .bind(organization_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error checking subscription history: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(exists)
    }

    async fn create_subscription_with_meters(
        &self,
        subscription: &Subscription,
        meters: &[UsageMeter],
    ) -> Result<(), DomainError> {
        info!(
            "Creating subscription for organization {} with {} meters",
            subscription.organization_id,
            meters.len()
        );

        let mut tx = tenant_tx(&self.pool, &subscription.organization_id).await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19)
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.organization_id)
        .bind(subscription.plan_id)
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.provider.as_str())
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.trial_start)
        .bind(subscription.trial_end)
        .bind(subscription.amount)
        .bind(&subscription.currency)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.cancelled_at)
        .bind(&subscription.cancellation_reason)
        .bind(subscription.created_at)
        .bind(subscription.modified_at)
        .execute(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating subscription: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        for meter in meters {
            sqlx::query(
                r#"
                INSERT INTO usage_meters (
                    id, organization_id, subscription_id, usage_type, current_usage,
                    usage_limit, period_start, period_end, overage_allowed,
                    overage_rate, overage_usage, overage_cost, created_at, modified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                "#,
            )
            .bind(meter.id)
            .bind(meter.organization_id)
            .bind(meter.subscription_id)
            .bind(meter.usage_type.as_str())
            .bind(meter.current_usage)
            .bind(meter.limit)
            .bind(meter.period_start)
            .bind(meter.period_end)
            .bind(meter.overage_allowed)
            .bind(meter.overage_rate)
            .bind(meter.overage_usage)
            .bind(meter.overage_cost)
            .bind(meter.created_at)
            .bind(meter.modified_at)
            .execute(&mut *tx)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database error creating usage meter: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;
        }

        commit(tx).await?;

        info!("Subscription created successfully: {}", subscription.id);
        Ok(())
    }

    async fn update_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, DomainError> {
        let mut tx = tenant_tx(&self.pool, &subscription.organization_id).await?;
        let row: SubscriptionRow = sqlx::query_as(
            r#"
            UPDATE subscriptions SET
                plan_id = $2,
                billing_cycle = $3,
                provider = $4,
                provider_subscription_id = $5,
                provider_customer_id = $6,
                status = $7,
                current_period_start = $8,
                current_period_end = $9,
                trial_start = $10,
                trial_end = $11,
                amount = $12,
                currency = $13,
                cancel_at_period_end = $14,
                cancelled_at = $15,
                cancellation_reason = $16,
                modified_at = $17
            WHERE id = $1
            RETURNING
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.plan_id)
        .bind(subscription.billing_cycle.as_str())
        .bind(subscription.provider.as_str())
        .bind(&subscription.provider_subscription_id)
        .bind(&subscription.provider_customer_id)
        .bind(subscription.status.as_str())
        .bind(subscription.current_period_start)
        .bind(subscription.current_period_end)
        .bind(subscription.trial_start)
        .bind(subscription.trial_end)
        .bind(subscription.amount)
        .bind(&subscription.currency)
        .bind(subscription.cancel_at_period_end)
        .bind(subscription.cancelled_at)
        .bind(&subscription.cancellation_reason)
        .bind(subscription.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating subscription: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn list_due_for_renewal(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, plan_id, billing_cycle, provider,
                provider_subscription_id, provider_customer_id, status,
                current_period_start, current_period_end, trial_start, trial_end,
                amount, currency, cancel_at_period_end, cancelled_at,
                cancellation_reason, created_at, modified_at
            FROM subscriptions
            WHERE status IN ('ACTIVE', 'TRIALING') AND current_period_end <= $1
            ORDER BY current_period_end ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing subscriptions due for renewal: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_current_meter(
        &self,
        subscription_id: &Uuid,
        usage_type: UsageType,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageMeter>, DomainError> {
        let row: Option<MeterRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, usage_type, current_usage,
                usage_limit, period_start, period_end, overage_allowed,
                overage_rate, overage_usage, overage_cost, created_at, modified_at
            FROM usage_meters
            WHERE subscription_id = $1 AND usage_type = $2
              AND period_start <= $3 AND period_end > $3
            LIMIT 1
            "#,
        )
        .bind(subscription_id)
        .bind(usage_type.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding current usage meter: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_meters(&self, subscription_id: &Uuid) -> Result<Vec<UsageMeter>, DomainError> {
        let rows: Vec<MeterRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, usage_type, current_usage,
                usage_limit, period_start, period_end, overage_allowed,
                overage_rate, overage_usage, overage_cost, created_at, modified_at
            FROM usage_meters
            WHERE subscription_id = $1 AND period_end > NOW()
            ORDER BY usage_type ASC
            "#,
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing usage meters: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn update_meter(&self, meter: &UsageMeter) -> Result<UsageMeter, DomainError> {
        let mut tx = tenant_tx(&self.pool, &meter.organization_id).await?;
        let row: MeterRow = sqlx::query_as(
            r#"
            UPDATE usage_meters SET
                current_usage = $2,
                usage_limit = $3,
                period_start = $4,
                period_end = $5,
                overage_allowed = $6,
                overage_rate = $7,
                overage_usage = $8,
                overage_cost = $9,
                modified_at = $10
            WHERE id = $1
            RETURNING
                id, organization_id, subscription_id, usage_type, current_usage,
                usage_limit, period_start, period_end, overage_allowed,
                overage_rate, overage_usage, overage_cost, created_at, modified_at
            "#,
        )
        .bind(meter.id)
        .bind(meter.current_usage)
        .bind(meter.limit)
        .bind(meter.period_start)
        .bind(meter.period_end)
        .bind(meter.overage_allowed)
        .bind(meter.overage_rate)
        .bind(meter.overage_usage)
        .bind(meter.overage_cost)
        .bind(meter.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating usage meter: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn list_meters_past_period(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageMeter>, DomainError> {
        let rows: Vec<MeterRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, usage_type, current_usage,
                usage_limit, period_start, period_end, overage_allowed,
                overage_rate, overage_usage, overage_cost, created_at, modified_at
            FROM usage_meters
            WHERE period_end <= $1
              AND EXISTS (
                  SELECT 1 FROM subscriptions s
                  WHERE s.id = usage_meters.subscription_id
                    AND s.status IN ('ACTIVE', 'TRIALING')
              )
            ORDER BY period_end ASC
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing meters past period: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_meters_over_threshold(
        &self,
        threshold_pct: f64,
    ) -> Result<Vec<UsageMeter>, DomainError> {
        let rows: Vec<MeterRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, usage_type, current_usage,
                usage_limit, period_start, period_end, overage_allowed,
                overage_rate, overage_usage, overage_cost, created_at, modified_at
            FROM usage_meters
            WHERE usage_limit > 0
              AND period_end > NOW()
              AND (current_usage::float8 * 100.0 / usage_limit::float8) >= $1
            ORDER BY organization_id, usage_type
            "#,
        )
        .bind(threshold_pct)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing meters over threshold: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn find_invoice(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Invoice>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let row: Option<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, invoice_number, status,
                subtotal, tax_amount, total_amount, currency, period_start,
                period_end, due_date, paid_at, payment_method, provider,
                provider_invoice_id, created_at, modified_at
            FROM invoices
            WHERE organization_id = $1 AND id = $2
            "#,
        )
        .bind(organization_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding invoice: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_invoices(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Invoice>, DomainError> {
        let pagination = pagination.clamped();
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<InvoiceRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, subscription_id, invoice_number, status,
                subtotal, tax_amount, total_amount, currency, period_start,
                period_end, due_date, paid_at, payment_method, provider,
                provider_invoice_id, created_at, modified_at
            FROM invoices
            WHERE organization_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(organization_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing invoices: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn last_invoice_number(&self, prefix: &str) -> Result<Option<String>, DomainError> {
        // Invoice numbers are globally unique, so this runs unscoped.
        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT invoice_number FROM invoices
            WHERE invoice_number LIKE $1 || '-%'
            ORDER BY invoice_number DESC
            LIMIT 1
            "#,
        )
        .bind(prefix)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding last invoice number: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(number)
    }

    async fn create_invoice_with_items(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
    ) -> Result<(), DomainError> {
        info!(
            "Creating invoice {} with {} items",
            invoice.invoice_number,
            items.len()
        );

        let mut tx = tenant_tx(&self.pool, &invoice.organization_id).await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, organization_id, subscription_id, invoice_number, status,
                subtotal, tax_amount, total_amount, currency, period_start,
                period_end, due_date, paid_at, payment_method, provider,
                provider_invoice_id, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18)
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.organization_id)
        .bind(invoice.subscription_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.status.as_str())
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total_amount)
        .bind(&invoice.currency)
        .bind(invoice.period_start)
        .bind(invoice.period_end)
        .bind(invoice.due_date)
        .bind(invoice.paid_at)
        .bind(&invoice.payment_method)
        .bind(invoice.provider.map(|p| p.as_str()))
        .bind(&invoice.provider_invoice_id)
        .bind(invoice.created_at)
        .bind(invoice.modified_at)
        .execute(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating invoice: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    id, invoice_id, kind, description, quantity, unit_price,
                    total_price, usage_meter_id, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(item.invoice_id)
            .bind(item.kind.as_str())
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(item.usage_meter_id)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e: sqlx::Error| {
                error!("Database error creating invoice item: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;
        }

        commit(tx).await?;

        info!("Invoice created successfully: {}", invoice.invoice_number);
        Ok(())
    }

    async fn update_invoice(&self, invoice: &Invoice) -> Result<Invoice, DomainError> {
        let mut tx = tenant_tx(&self.pool, &invoice.organization_id).await?;
        let row: InvoiceRow = sqlx::query_as(
            r#"
            UPDATE invoices SET
                status = $2,
                subtotal = $3,
                tax_amount = $4,
                total_amount = $5,
                paid_at = $6,
                payment_method = $7,
                provider = $8,
                provider_invoice_id = $9,
                modified_at = $10
            WHERE id = $1
            RETURNING
                id, organization_id, subscription_id, invoice_number, status,
                subtotal, tax_amount, total_amount, currency, period_start,
                period_end, due_date, paid_at, payment_method, provider,
                provider_invoice_id, created_at, modified_at
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.status.as_str())
        .bind(invoice.subtotal)
        .bind(invoice.tax_amount)
        .bind(invoice.total_amount)
        .bind(invoice.paid_at)
        .bind(&invoice.payment_method)
        .bind(invoice.provider.map(|p| p.as_str()))
        .bind(&invoice.provider_invoice_id)
        .bind(invoice.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating invoice: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn list_invoice_items(
        &self,
        invoice_id: &Uuid,
    ) -> Result<Vec<InvoiceItem>, DomainError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT
                id, invoice_id, kind, description, quantity, unit_price,
                total_price, usage_meter_id, created_at
            FROM invoice_items
            WHERE invoice_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing invoice items: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_payment(&self, payment: &Payment) -> Result<Payment, DomainError> {
        info!(
            "Creating payment of {} {} for invoice {}",
            payment.amount, payment.currency, payment.invoice_id
        );

        let mut tx = tenant_tx(&self.pool, &payment.organization_id).await?;
        let row: PaymentRow = sqlx::query_as(
            r#"
            INSERT INTO payments (
                id, organization_id, invoice_id, amount, currency, status,
                provider, provider_payment_id, description, failure_reason,
                refunded_amount, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, organization_id, invoice_id, amount, currency, status,
                provider, provider_payment_id, description, failure_reason,
                refunded_amount, created_at, modified_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.organization_id)
        .bind(payment.invoice_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.status.as_str())
        .bind(payment.provider.as_str())
        .bind(&payment.provider_payment_id)
        .bind(&payment.description)
        .bind(&payment.failure_reason)
        .bind(payment.refunded_amount)
        .bind(payment.created_at)
        .bind(payment.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating payment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn update_payment(&self, payment: &Payment) -> Result<Payment, DomainError> {
        let mut tx = tenant_tx(&self.pool, &payment.organization_id).await?;
        let row: PaymentRow = sqlx::query_as(
            r#"
            UPDATE payments SET
                status = $2,
                provider_payment_id = $3,
                description = $4,
                failure_reason = $5,
                refunded_amount = $6,
                modified_at = $7
            WHERE id = $1
            RETURNING
                id, organization_id, invoice_id, amount, currency, status,
                provider, provider_payment_id, description, failure_reason,
                refunded_amount, created_at, modified_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.status.as_str())
        .bind(&payment.provider_payment_id)
        .bind(&payment.description)
        .bind(&payment.failure_reason)
        .bind(payment.refunded_amount)
        .bind(payment.modified_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating payment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_payment_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, invoice_id, amount, currency, status,
                provider, provider_payment_id, description, failure_reason,
                refunded_amount, created_at, modified_at
            FROM payments
            WHERE provider = $1 AND provider_payment_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(provider_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding payment by provider id: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn monthly_revenue(
        &self,
        organization_id: &Uuid,
        months: u32,
    ) -> Result<Vec<MonthlyRevenueRow>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<RevenueRow> = sqlx::query_as(
            r#"
            SELECT
                EXTRACT(YEAR FROM created_at)::int AS year,
                EXTRACT(MONTH FROM created_at)::int AS month,
                SUM(amount) AS total
            FROM payments
            WHERE organization_id = $1 AND status = 'SUCCEEDED'
              AND created_at >= date_trunc('month', NOW()) - make_interval(months => $2)
            GROUP BY 1, 2
            ORDER BY 1, 2
            "#,
        )
        .bind(organization_id)
        .bind(months as i32)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error computing monthly revenue: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| MonthlyRevenueRow {
                year: r.year,
                month: r.month as u32,
                total: r.total,
            })
            .collect())
    }

    async fn usage_trend(
        &self,
        organization_id: &Uuid,
        months: u32,
    ) -> Result<Vec<UsageTrendRow>, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let rows: Vec<TrendRow> = sqlx::query_as(
            r#"
            SELECT
                usage_type,
                EXTRACT(YEAR FROM period_start)::int AS year,
                EXTRACT(MONTH FROM period_start)::int AS month,
                SUM(current_usage)::bigint AS total_usage
            FROM usage_meters
            WHERE organization_id = $1
              AND period_start >= date_trunc('month', NOW()) - make_interval(months => $2)
            GROUP BY usage_type, 2, 3
            ORDER BY usage_type, 2, 3
            "#,
        )
        .bind(organization_id)
        .bind(months as i32)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error computing usage trend: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(rows
            .into_iter()
            .map(|r| UsageTrendRow {
                usage_type: UsageType::from_str(&r.usage_type)
                    .unwrap_or(UsageType::Assessments),
                year: r.year,
                month: r.month as u32,
                total_usage: r.total_usage,
            })
            .collect())
    }

    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT
                id, code, name, description, discount_type, discount_value,
                currency, valid_from, valid_until, max_uses, uses_count, min_amount,
                first_time_customers_only, is_active, created_at, created_by,
                modified_at
            FROM coupons
            WHERE UPPER(code) = UPPER($1)
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding coupon: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_coupon(&self, coupon: &Coupon) -> Result<Coupon, DomainError> {
        let row: CouponRow = sqlx::query_as(
            r#"
            UPDATE coupons SET
                name = $2,
                description = $3,
                discount_type = $4,
                discount_value = $5,
                currency = $6,
                valid_from = $7,
                valid_until = $8,
                max_uses = $9,
                uses_count = $10,
                min_amount = $11,
                first_time_customers_only = $12,
                is_active = $13,
                modified_at = $14
            WHERE id = $1
            RETURNING
                id, code, name, description, discount_type, discount_value,
                currency, valid_from, valid_until, max_uses, uses_count, min_amount,
                first_time_customers_only, is_active, created_at, created_by,
                modified_at
            "#,
        )
        .bind(coupon.id)
        .bind(&coupon.name)
        .bind(&coupon.description)
        .bind(coupon.discount_type.as_str())
        .bind(coupon.discount_value)
        .bind(&coupon.currency)
        .bind(coupon.valid_from)
        .bind(coupon.valid_until)
        .bind(coupon.max_uses)
        .bind(coupon.uses_count)
        .bind(coupon.min_amount)
        .bind(coupon.first_time_customers_only)
        .bind(coupon.is_active)
        .bind(coupon.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating coupon: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn record_coupon_usage(
        &self,
        usage: &CouponUsage,
    ) -> Result<CouponUsage, DomainError> {
        let mut tx = tenant_tx(&self.pool, &usage.organization_id).await?;
        let row: CouponUsageRow = sqlx::query_as(
            r#"
            INSERT INTO coupon_usages (
                id, organization_id, coupon_id, subscription_id, invoice_id,
                original_amount, discount_amount, final_amount, used_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, organization_id, coupon_id, subscription_id, invoice_id,
                original_amount, discount_amount, final_amount, used_at
            "#,
        )
        .bind(usage.id)
        .bind(usage.organization_id)
        .bind(usage.coupon_id)
        .bind(usage.subscription_id)
        .bind(usage.invoice_id)
        .bind(usage.original_amount)
        .bind(usage.discount_amount)
        .bind(usage.final_amount)
        .bind(usage.used_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error recording coupon usage: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn find_event_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError> {
        let row: Option<EventRow> = sqlx::query_as(
            r#"
            SELECT
                id, provider, event_type, provider_event_id, status, processed_at,
                error_message, retry_count, raw_data, created_at, modified_at
            FROM webhook_events
            WHERE provider = $1 AND provider_event_id = $2
            "#,
        )
        .bind(provider.as_str())
        .bind(provider_event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error finding webhook event: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.map(|r| r.into()))
    }

    async fn create_event(&self, event: &WebhookEvent) -> Result<WebhookEvent, DomainError> {
        let row: EventRow = sqlx::query_as(
            r#"
            INSERT INTO webhook_events (
                id, provider, event_type, provider_event_id, status, processed_at,
                error_message, retry_count, raw_data, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, provider, event_type, provider_event_id, status, processed_at,
                error_message, retry_count, raw_data, created_at, modified_at
            "#,
        )
        .bind(event.id)
        .bind(event.provider.as_str())
        .bind(&event.event_type)
        .bind(&event.provider_event_id)
        .bind(event.status.as_str())
        .bind(event.processed_at)
        .bind(&event.error_message)
        .bind(event.retry_count)
        .bind(&event.raw_data)
        .bind(event.created_at)
        .bind(event.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating webhook event: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn update_event(&self, event: &WebhookEvent) -> Result<WebhookEvent, DomainError> {
        let row: EventRow = sqlx::query_as(
            r#"
            UPDATE webhook_events SET
                status = $2,
                processed_at = $3,
                error_message = $4,
                retry_count = $5,
                modified_at = $6
            WHERE id = $1
            RETURNING
                id, provider, event_type, provider_event_id, status, processed_at,
                error_message, retry_count, raw_data, created_at, modified_at
            "#,
        )
        .bind(event.id)
        .bind(event.status.as_str())
        .bind(event.processed_at)
        .bind(&event.error_message)
        .bind(event.retry_count)
        .bind(event.modified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating webhook event: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(row.into())
    }

    async fn list_pending_events(&self, limit: i64) -> Result<Vec<WebhookEvent>, DomainError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT
                id, provider, event_type, provider_event_id, status, processed_at,
                error_message, retry_count, raw_data, created_at, modified_at
            FROM webhook_events
            WHERE status = 'PENDING' AND retry_count < $2
            ORDER BY created_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .bind(MAX_WEBHOOK_ATTEMPTS)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing pending webhook events: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn create_notification(
        &self,
        notification: &BillingNotification,
    ) -> Result<BillingNotification, DomainError> {
        let mut tx = tenant_tx(&self.pool, &notification.organization_id).await?;
        let row: NotificationRow = sqlx::query_as(
            r#"
            INSERT INTO billing_notifications (
                id, organization_id, notification_type, recipient_email, subject,
                message, subscription_id, invoice_id, status, scheduled_for,
                sent_at, error_message, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, organization_id, notification_type, recipient_email, subject,
                message, subscription_id, invoice_id, status, scheduled_for,
                sent_at, error_message, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.organization_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.recipient_email)
        .bind(&notification.subject)
        .bind(&notification.message)
        .bind(notification.subscription_id)
        .bind(notification.invoice_id)
        .bind(notification.status.as_str())
        .bind(notification.scheduled_for)
        .bind(notification.sent_at)
        .bind(&notification.error_message)
        .bind(notification.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error creating billing notification: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn exists_notification(
        &self,
        organization_id: &Uuid,
        notification_type: NotificationType,
        since: DateTime<Utc>,
        message_contains: &str,
    ) -> Result<bool, DomainError> {
        let mut tx = tenant_tx(&self.pool, organization_id).await?;
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM billing_notifications
                WHERE organization_id = $1 AND notification_type = $2
                  AND created_at >= $3
                  AND message LIKE '%' || $4 || '%'
            )
            "#,
        )
        .bind(organization_id)
        .bind(notification_type.as_str())
        .bind(since)
        .bind(message_contains)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error checking billing notification: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(exists)
    }

    async fn update_notification(
        &self,
        notification: &BillingNotification,
    ) -> Result<BillingNotification, DomainError> {
        let mut tx = tenant_tx(&self.pool, &notification.organization_id).await?;
        let row: NotificationRow = sqlx::query_as(
            r#"
            UPDATE billing_notifications SET
                status = $2,
                scheduled_for = $3,
                sent_at = $4,
                error_message = $5
            WHERE id = $1
            RETURNING
                id, organization_id, notification_type, recipient_email, subject,
                message, subscription_id, invoice_id, status, scheduled_for,
                sent_at, error_message, created_at
            "#,
        )
        .bind(notification.id)
        .bind(notification.status.as_str())
        .bind(notification.scheduled_for)
        .bind(notification.sent_at)
        .bind(&notification.error_message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error updating billing notification: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;
        commit(tx).await?;

        Ok(row.into())
    }

    async fn list_due_notifications(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BillingNotification>, DomainError> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT
                id, organization_id, notification_type, recipient_email, subject,
                message, subscription_id, invoice_id, status, scheduled_for,
                sent_at, error_message, created_at
            FROM billing_notifications
            WHERE status = 'PENDING' AND scheduled_for <= $1
            ORDER BY scheduled_for ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error listing due billing notifications: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
