//! Billing repository trait (port)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    BillingNotification, Coupon, CouponUsage, Invoice, InvoiceItem, MonthlyRevenueRow,
    NotificationType, Payment, PaymentProvider, Plan, Subscription, UsageMeter, UsageTrendRow,
    UsageType, WebhookEvent,
};
use crate::error::DomainError;
use tala_shared::types::Pagination;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BillingRepository: Send + Sync {
    // Plans
    async fn find_plan(&self, id: &Uuid) -> Result<Option<Plan>, DomainError>;
    /// Active public plans in sort order.
    async fn list_public_plans(&self) -> Result<Vec<Plan>, DomainError>;

    // Subscriptions
    async fn find_subscription(&self, id: &Uuid) -> Result<Option<Subscription>, DomainError>;
    async fn find_subscription_for_org(
        &self,
        organization_id: &Uuid,
    ) -> Result<Option<Subscription>, DomainError>;
    async fn find_subscription_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;
    async fn has_any_subscription(&self, organization_id: &Uuid) -> Result<bool, DomainError>;
    /// Persists the subscription and its seeded meters atomically.
    async fn create_subscription_with_meters(
        &self,
        subscription: &Subscription,
        meters: &[UsageMeter],
    ) -> Result<(), DomainError>;
    async fn update_subscription(
        &self,
        subscription: &Subscription,
    ) -> Result<Subscription, DomainError>;
    /// Active/trialing subscriptions whose period ended before `now`.
    async fn list_due_for_renewal(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<Subscription>, DomainError>;

    // Usage meters
    async fn find_current_meter(
        &self,
        subscription_id: &Uuid,
        usage_type: UsageType,
        now: DateTime<Utc>,
    ) -> Result<Option<UsageMeter>, DomainError>;
    async fn list_meters(&self, subscription_id: &Uuid) -> Result<Vec<UsageMeter>, DomainError>;
    async fn update_meter(&self, meter: &UsageMeter) -> Result<UsageMeter, DomainError>;
    /// Meters across all tenants whose period has ended.
    async fn list_meters_past_period(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<UsageMeter>, DomainError>;
    /// Meters across all tenants at or over the percentage threshold.
    async fn list_meters_over_threshold(
        &self,
        threshold_pct: f64,
    ) -> Result<Vec<UsageMeter>, DomainError>;

    // Invoices
    async fn find_invoice(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Option<Invoice>, DomainError>;
    async fn list_invoices(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Invoice>, DomainError>;
    /// Highest invoice number carrying this month prefix, if any.
    async fn last_invoice_number(&self, prefix: &str) -> Result<Option<String>, DomainError>;
    async fn create_invoice_with_items(
        &self,
        invoice: &Invoice,
        items: &[InvoiceItem],
    ) -> Result<(), DomainError>;
    async fn update_invoice(&self, invoice: &Invoice) -> Result<Invoice, DomainError>;
    async fn list_invoice_items(
        &self,
        invoice_id: &Uuid,
    ) -> Result<Vec<InvoiceItem>, DomainError>;

    // Payments
    async fn create_payment(&self, payment: &Payment) -> Result<Payment, DomainError>;
    async fn update_payment(&self, payment: &Payment) -> Result<Payment, DomainError>;
    async fn find_payment_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, DomainError>;
    /// SUCCEEDED payment totals per month for the trailing window.
    async fn monthly_revenue(
        &self,
        organization_id: &Uuid,
        months: u32,
    ) -> Result<Vec<MonthlyRevenueRow>, DomainError>;
    /// Usage totals per type per month for the trailing window.
    async fn usage_trend(
        &self,
        organization_id: &Uuid,
        months: u32,
    ) -> Result<Vec<UsageTrendRow>, DomainError>;

    // Coupons
    async fn find_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, DomainError>;
    async fn update_coupon(&self, coupon: &Coupon) -> Result<Coupon, DomainError>;
    async fn record_coupon_usage(&self, usage: &CouponUsage)
        -> Result<CouponUsage, DomainError>;

    // Webhook events
    async fn find_event_by_provider_id(
        &self,
        provider: PaymentProvider,
        provider_event_id: &str,
    ) -> Result<Option<WebhookEvent>, DomainError>;
    async fn create_event(&self, event: &WebhookEvent) -> Result<WebhookEvent, DomainError>;
    async fn update_event(&self, event: &WebhookEvent) -> Result<WebhookEvent, DomainError>;
    /// PENDING events under the retry cap, oldest first.
    async fn list_pending_events(&self, limit: i64) -> Result<Vec<WebhookEvent>, DomainError>;

    // Notifications
    async fn create_notification(
        &self,
        notification: &BillingNotification,
    ) -> Result<BillingNotification, DomainError>;
    /// Whether a notification of this type mentioning `message_contains`
    /// was already created for the organization since `since`. Used to
    /// send usage alerts at most once per meter period.
    async fn exists_notification(
        &self,
        organization_id: &Uuid,
        notification_type: NotificationType,
        since: DateTime<Utc>,
        message_contains: &str,
    ) -> Result<bool, DomainError>;
    async fn update_notification(
        &self,
        notification: &BillingNotification,
    ) -> Result<BillingNotification, DomainError>;
    /// PENDING notifications scheduled at or before `now`.
    async fn list_due_notifications(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<BillingNotification>, DomainError>;
}
