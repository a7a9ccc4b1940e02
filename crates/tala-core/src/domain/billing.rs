// ============================================================================
// Tala Core - Billing Entities
// File: crates/tala-core/src/domain/billing.rs
// Description: Plans, subscriptions, usage meters, invoices, coupons and
//              payment provider webhook events
// ============================================================================

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tala_shared::constants::INVOICE_PREFIX;
use uuid::Uuid;
use validator::Validate;

/// Plan tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    Basic,
    Professional,
    Enterprise,
    Custom,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "BASIC",
            PlanTier::Professional => "PROFESSIONAL",
            PlanTier::Enterprise => "ENTERPRISE",
            PlanTier::Custom => "CUSTOM",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "BASIC" => Some(PlanTier::Basic),
            "PROFESSIONAL" => Some(PlanTier::Professional),
            "ENTERPRISE" => Some(PlanTier::Enterprise),
            "CUSTOM" => Some(PlanTier::Custom),
            _ => None,
        }
    }
}

/// Billing cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "MONTHLY",
            BillingCycle::Quarterly => "QUARTERLY",
            BillingCycle::Yearly => "YEARLY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "MONTHLY" => Some(BillingCycle::Monthly),
            "QUARTERLY" => Some(BillingCycle::Quarterly),
            "YEARLY" => Some(BillingCycle::Yearly),
            _ => None,
        }
    }

    pub fn period_days(&self) -> i64 {
        match self {
            BillingCycle::Monthly => 30,
            BillingCycle::Quarterly => 90,
            BillingCycle::Yearly => 365,
        }
    }
}

/// Payment provider. Serialized lowercase, matching provider API naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Paypal,
    Stripe,
    Manual,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Paypal => "paypal",
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Manual => "manual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "paypal" => Some(PaymentProvider::Paypal),
            "stripe" => Some(PaymentProvider::Stripe),
            "manual" => Some(PaymentProvider::Manual),
            _ => None,
        }
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Cancelled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Trialing => "TRIALING",
            SubscriptionStatus::PastDue => "PAST_DUE",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Unpaid => "UNPAID",
            SubscriptionStatus::Incomplete => "INCOMPLETE",
            SubscriptionStatus::IncompleteExpired => "INCOMPLETE_EXPIRED",
            SubscriptionStatus::Paused => "PAUSED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(SubscriptionStatus::Active),
            "TRIALING" => Some(SubscriptionStatus::Trialing),
            "PAST_DUE" => Some(SubscriptionStatus::PastDue),
            "CANCELLED" => Some(SubscriptionStatus::Cancelled),
            "UNPAID" => Some(SubscriptionStatus::Unpaid),
            "INCOMPLETE" => Some(SubscriptionStatus::Incomplete),
            "INCOMPLETE_EXPIRED" => Some(SubscriptionStatus::IncompleteExpired),
            "PAUSED" => Some(SubscriptionStatus::Paused),
            _ => None,
        }
    }
}

/// Metered usage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UsageType {
    Assessments,
    TeamMembers,
    Storage,
    ApiCalls,
    Reports,
}

impl UsageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageType::Assessments => "ASSESSMENTS",
            UsageType::TeamMembers => "TEAM_MEMBERS",
            UsageType::Storage => "STORAGE",
            UsageType::ApiCalls => "API_CALLS",
            UsageType::Reports => "REPORTS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ASSESSMENTS" => Some(UsageType::Assessments),
            "TEAM_MEMBERS" => Some(UsageType::TeamMembers),
            "STORAGE" => Some(UsageType::Storage),
            "API_CALLS" => Some(UsageType::ApiCalls),
            "REPORTS" => Some(UsageType::Reports),
            _ => None,
        }
    }
}

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Open,
    Paid,
    PastDue,
    Cancelled,
    Uncollectible,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Open => "OPEN",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::PastDue => "PAST_DUE",
            InvoiceStatus::Cancelled => "CANCELLED",
            InvoiceStatus::Uncollectible => "UNCOLLECTIBLE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(InvoiceStatus::Draft),
            "OPEN" => Some(InvoiceStatus::Open),
            "PAID" => Some(InvoiceStatus::Paid),
            "PAST_DUE" => Some(InvoiceStatus::PastDue),
            "CANCELLED" => Some(InvoiceStatus::Cancelled),
            "UNCOLLECTIBLE" => Some(InvoiceStatus::Uncollectible),
            _ => None,
        }
    }
}

/// Invoice line item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceItemKind {
    Subscription,
    Overage,
    OneTime,
    Discount,
    Tax,
}

impl InvoiceItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceItemKind::Subscription => "SUBSCRIPTION",
            InvoiceItemKind::Overage => "OVERAGE",
            InvoiceItemKind::OneTime => "ONE_TIME",
            InvoiceItemKind::Discount => "DISCOUNT",
            InvoiceItemKind::Tax => "TAX",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "SUBSCRIPTION" => Some(InvoiceItemKind::Subscription),
            "OVERAGE" => Some(InvoiceItemKind::Overage),
            "ONE_TIME" => Some(InvoiceItemKind::OneTime),
            "DISCOUNT" => Some(InvoiceItemKind::Discount),
            "TAX" => Some(InvoiceItemKind::Tax),
            _ => None,
        }
    }
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Succeeded => "SUCCEEDED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Cancelled => "CANCELLED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "PROCESSING" => Some(PaymentStatus::Processing),
            "SUCCEEDED" => Some(PaymentStatus::Succeeded),
            "FAILED" => Some(PaymentStatus::Failed),
            "CANCELLED" => Some(PaymentStatus::Cancelled),
            "REFUNDED" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

/// Coupon discount type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
    FreeTrial,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "PERCENTAGE",
            DiscountType::FixedAmount => "FIXED_AMOUNT",
            DiscountType::FreeTrial => "FREE_TRIAL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PERCENTAGE" => Some(DiscountType::Percentage),
            "FIXED_AMOUNT" => Some(DiscountType::FixedAmount),
            "FREE_TRIAL" => Some(DiscountType::FreeTrial),
            _ => None,
        }
    }
}

/// Webhook event processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WebhookStatus {
    Pending,
    Processing,
    Processed,
    Failed,
    Ignored,
}

impl WebhookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Pending => "PENDING",
            WebhookStatus::Processing => "PROCESSING",
            WebhookStatus::Processed => "PROCESSED",
            WebhookStatus::Failed => "FAILED",
            WebhookStatus::Ignored => "IGNORED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(WebhookStatus::Pending),
            "PROCESSING" => Some(WebhookStatus::Processing),
            "PROCESSED" => Some(WebhookStatus::Processed),
            "FAILED" => Some(WebhookStatus::Failed),
            "IGNORED" => Some(WebhookStatus::Ignored),
            _ => None,
        }
    }
}

/// Billing notification type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    PaymentSuccess,
    PaymentFailed,
    InvoiceCreated,
    SubscriptionRenewed,
    SubscriptionCancelled,
    TrialEnding,
    UsageLimitReached,
    OverageAlert,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::PaymentSuccess => "PAYMENT_SUCCESS",
            NotificationType::PaymentFailed => "PAYMENT_FAILED",
            NotificationType::InvoiceCreated => "INVOICE_CREATED",
            NotificationType::SubscriptionRenewed => "SUBSCRIPTION_RENEWED",
            NotificationType::SubscriptionCancelled => "SUBSCRIPTION_CANCELLED",
            NotificationType::TrialEnding => "TRIAL_ENDING",
            NotificationType::UsageLimitReached => "USAGE_LIMIT_REACHED",
            NotificationType::OverageAlert => "OVERAGE_ALERT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PAYMENT_SUCCESS" => Some(NotificationType::PaymentSuccess),
            "PAYMENT_FAILED" => Some(NotificationType::PaymentFailed),
            "INVOICE_CREATED" => Some(NotificationType::InvoiceCreated),
            "SUBSCRIPTION_RENEWED" => Some(NotificationType::SubscriptionRenewed),
            "SUBSCRIPTION_CANCELLED" => Some(NotificationType::SubscriptionCancelled),
            "TRIAL_ENDING" => Some(NotificationType::TrialEnding),
            "USAGE_LIMIT_REACHED" => Some(NotificationType::UsageLimitReached),
            "OVERAGE_ALERT" => Some(NotificationType::OverageAlert),
            _ => None,
        }
    }
}

/// Notification delivery status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Ignored,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Pending => "PENDING",
            NotificationStatus::Sent => "SENT",
            NotificationStatus::Failed => "FAILED",
            NotificationStatus::Ignored => "IGNORED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(NotificationStatus::Pending),
            "SENT" => Some(NotificationStatus::Sent),
            "FAILED" => Some(NotificationStatus::Failed),
            "IGNORED" => Some(NotificationStatus::Ignored),
            _ => None,
        }
    }
}

/// Subscription plan, global across tenants.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Plan {
    pub id: Uuid,

    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: String,
    pub tier: PlanTier,

    pub price_monthly: Decimal,
    pub price_quarterly: Decimal,
    pub price_yearly: Decimal,
    pub currency: String,

    // Usage limits, 0 means unlimited off (metered with limit 0)
    pub max_assessments_per_month: i64,
    pub max_team_members: i64,
    pub max_storage_gb: i64,

    pub includes_pdi: bool,
    pub includes_recruiting: bool,
    pub includes_advanced_reports: bool,
    pub includes_api_access: bool,

    pub trial_days: i32,

    // Provider price ids per cycle
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

impl Plan {
    pub fn price_for_cycle(&self, cycle: BillingCycle) -> Decimal {
        match cycle {
            BillingCycle::Monthly => self.price_monthly,
            BillingCycle::Quarterly => self.price_quarterly,
            BillingCycle::Yearly => self.price_yearly,
        }
    }

    pub fn provider_price_id(
        &self,
        provider: PaymentProvider,
        cycle: BillingCycle,
    ) -> Option<&str> {
        let id = match (provider, cycle) {
            (PaymentProvider::Paypal, BillingCycle::Monthly) => &self.paypal_plan_id_monthly,
            (PaymentProvider::Paypal, BillingCycle::Quarterly) => &self.paypal_plan_id_quarterly,
            (PaymentProvider::Paypal, BillingCycle::Yearly) => &self.paypal_plan_id_yearly,
            (PaymentProvider::Stripe, BillingCycle::Monthly) => &self.stripe_price_id_monthly,
            (PaymentProvider::Stripe, BillingCycle::Quarterly) => &self.stripe_price_id_quarterly,
            (PaymentProvider::Stripe, BillingCycle::Yearly) => &self.stripe_price_id_yearly,
            (PaymentProvider::Manual, _) => return None,
        };
        if id.is_empty() {
            None
        } else {
            Some(id)
        }
    }

    /// Meters seeded when an organization subscribes to this plan.
    pub fn usage_limits(&self) -> Vec<(UsageType, i64)> {
        vec![
            (UsageType::Assessments, self.max_assessments_per_month),
            (UsageType::TeamMembers, self.max_team_members),
            (UsageType::Storage, self.max_storage_gb),
        ]
    }
}

/// Tenant subscription to a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan_id: Uuid,
    pub billing_cycle: BillingCycle,

    pub provider: PaymentProvider,
    pub provider_subscription_id: String,
    pub provider_customer_id: String,

    pub status: SubscriptionStatus,
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

impl Subscription {
    pub fn new(
        organization_id: Uuid,
        plan: &Plan,
        billing_cycle: BillingCycle,
        provider: PaymentProvider,
        amount: Decimal,
    ) -> Self {
        let now = Utc::now();
        let period_end = now + Duration::days(billing_cycle.period_days());
        let (status, trial_start, trial_end) = if plan.trial_days > 0 {
            (
                SubscriptionStatus::Trialing,
                Some(now),
                Some(now + Duration::days(i64::from(plan.trial_days))),
            )
        } else {
            (SubscriptionStatus::Active, None, None)
        };
        Self {
            id: Uuid::new_v4(),
            organization_id,
            plan_id: plan.id,
            billing_cycle,
            provider,
            provider_subscription_id: String::new(),
            provider_customer_id: String::new(),
            status,
            current_period_start: now,
            current_period_end: period_end,
            trial_start,
            trial_end,
            amount,
            currency: plan.currency.clone(),
            cancel_at_period_end: false,
            cancelled_at: None,
            cancellation_reason: String::new(),
            created_at: now,
            modified_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            SubscriptionStatus::Active | SubscriptionStatus::Trialing
        )
    }

    pub fn days_until_renewal(&self) -> i64 {
        let delta = self.current_period_end.date_naive() - Utc::now().date_naive();
        delta.num_days().max(0)
    }

    /// Immediate cancellation flips the status; otherwise the subscription
    /// runs out at the period end.
    pub fn cancel(&mut self, reason: String, at_period_end: bool) {
        self.cancel_at_period_end = at_period_end;
        self.cancellation_reason = reason;
        if !at_period_end {
            self.status = SubscriptionStatus::Cancelled;
            self.cancelled_at = Some(Utc::now());
        }
        self.modified_at = Some(Utc::now());
    }

    pub fn renew(&mut self, next_period_end: DateTime<Utc>) {
        self.current_period_start = self.current_period_end;
        self.current_period_end = next_period_end;
        self.status = SubscriptionStatus::Active;
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_past_due(&mut self) {
        self.status = SubscriptionStatus::PastDue;
        self.modified_at = Some(Utc::now());
    }
}

/// Per-period usage counter. `(subscription_id, usage_type, period_start)`
/// is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMeter {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subscription_id: Uuid,
    pub usage_type: UsageType,

    pub current_usage: i64,
    pub limit: i64,

    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,

    pub overage_allowed: bool,
    pub overage_rate: Decimal,
    pub overage_usage: i64,
    pub overage_cost: Decimal,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl UsageMeter {
    pub fn new(
        organization_id: Uuid,
        subscription_id: Uuid,
        usage_type: UsageType,
        limit: i64,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            subscription_id,
            usage_type,
            current_usage: 0,
            limit,
            period_start,
            period_end,
            overage_allowed: false,
            overage_rate: Decimal::ZERO,
            overage_usage: 0,
            overage_cost: Decimal::ZERO,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn usage_percentage(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        ((self.current_usage as f64 / self.limit as f64) * 100.0).min(100.0)
    }

    pub fn is_over_limit(&self) -> bool {
        self.current_usage > self.limit
    }

    pub fn remaining(&self) -> i64 {
        (self.limit - self.current_usage).max(0)
    }

    /// Without an overage allowance the meter refuses to cross its limit.
    pub fn can_increment(&self, amount: i64) -> bool {
        self.overage_allowed || self.current_usage + amount <= self.limit
    }

    /// Adds usage; the part beyond the limit accrues overage usage and cost
    /// at the meter rate. Callers gate on [`Self::can_increment`] first.
    pub fn increment(&mut self, amount: i64) -> i64 {
        let old_usage = self.current_usage;
        self.current_usage += amount;

        if self.current_usage > self.limit {
            let new_overage = self.current_usage - self.limit;
            let old_overage = (old_usage - self.limit).max(0);
            let increase = new_overage - old_overage;
            if increase > 0 {
                self.overage_usage += increase;
                self.overage_cost += Decimal::from(increase) * self.overage_rate;
            }
        }

        self.modified_at = Some(Utc::now());
        self.current_usage
    }

    pub fn reset_for_period(&mut self, period_start: DateTime<Utc>, period_end: DateTime<Utc>) {
        self.current_usage = 0;
        self.overage_usage = 0;
        self.overage_cost = Decimal::ZERO;
        self.period_start = period_start;
        self.period_end = period_end;
        self.modified_at = Some(Utc::now());
    }
}

/// Builds the `INV-{YYYY}{MM}` prefix for a date.
pub fn invoice_number_prefix(date: NaiveDate) -> String {
    format!("{}-{}{:02}", INVOICE_PREFIX, date.year(), date.month())
}

/// Next number in the month sequence. The counter continues from the last
/// issued number and restarts at 1 when parsing fails or none exists.
pub fn next_invoice_number(prefix: &str, last_in_month: Option<&str>) -> String {
    let next = last_in_month
        .and_then(|number| number.rsplit('-').next())
        .and_then(|tail| tail.parse::<u32>().ok())
        .map_or(1, |n| n + 1);
    format!("{prefix}-{next:04}")
}

/// Invoice for one subscription period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub subscription_id: Uuid,

    pub invoice_number: String,
    pub status: InvoiceStatus,

    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub currency: String,

    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,

    pub due_date: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: String,

    pub provider: Option<PaymentProvider>,
    pub provider_invoice_id: String,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn new(
        organization_id: Uuid,
        subscription_id: Uuid,
        invoice_number: String,
        currency: String,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            subscription_id,
            invoice_number,
            status: InvoiceStatus::Draft,
            subtotal: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            currency,
            period_start,
            period_end,
            due_date,
            paid_at: None,
            payment_method: String::new(),
            provider: None,
            provider_invoice_id: String::new(),
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    pub fn is_overdue(&self) -> bool {
        self.due_date < Utc::now() && !self.is_paid()
    }

    pub fn mark_paid(&mut self, payment_method: String) {
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(Utc::now());
        self.payment_method = payment_method;
        self.modified_at = Some(Utc::now());
    }

    /// Totals roll up from the line items.
    pub fn apply_items(&mut self, items: &[InvoiceItem]) {
        self.subtotal = items
            .iter()
            .filter(|i| i.kind != InvoiceItemKind::Tax)
            .map(|i| i.total_price)
            .sum();
        self.tax_amount = items
            .iter()
            .filter(|i| i.kind == InvoiceItemKind::Tax)
            .map(|i| i.total_price)
            .sum();
        self.total_amount = self.subtotal + self.tax_amount;
        self.modified_at = Some(Utc::now());
    }
}

/// Line item; total is always quantity times unit price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: Uuid,
    pub invoice_id: Uuid,

    pub kind: InvoiceItemKind,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,

    pub usage_meter_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    pub fn new(
        invoice_id: Uuid,
        kind: InvoiceItemKind,
        description: String,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            invoice_id,
            kind,
            description,
            quantity,
            unit_price,
            total_price: quantity * unit_price,
            usage_meter_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Payment attempt against an invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub invoice_id: Uuid,

    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,

    pub provider: PaymentProvider,
    pub provider_payment_id: String,

    pub description: String,
    pub failure_reason: String,

    pub refunded_amount: Decimal,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn new(
        organization_id: Uuid,
        invoice_id: Uuid,
        amount: Decimal,
        currency: String,
        provider: PaymentProvider,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            invoice_id,
            amount,
            currency,
            status: PaymentStatus::Pending,
            provider,
            provider_payment_id: String::new(),
            description: String::new(),
            failure_reason: String::new(),
            refunded_amount: Decimal::ZERO,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == PaymentStatus::Succeeded
    }

    pub fn is_refundable(&self) -> bool {
        self.status == PaymentStatus::Succeeded && self.refunded_amount < self.amount
    }

    pub fn succeed(&mut self, provider_payment_id: String) {
        self.status = PaymentStatus::Succeeded;
        self.provider_payment_id = provider_payment_id;
        self.modified_at = Some(Utc::now());
    }

    pub fn fail(&mut self, reason: String) {
        self.status = PaymentStatus::Failed;
        self.failure_reason = reason;
        self.modified_at = Some(Utc::now());
    }
}

/// Discount coupon, global across tenants; `code` is unique.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Coupon {
    pub id: Uuid,

    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub name: String,
    pub description: String,

    pub discount_type: DiscountType,
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

impl Coupon {
    pub fn is_valid(&self) -> bool {
        let now = Utc::now();
        if !self.is_active {
            return false;
        }
        if self.valid_from > now {
            return false;
        }
        if self.valid_until.is_some_and(|until| until < now) {
            return false;
        }
        if self.max_uses.is_some_and(|max| self.uses_count >= max) {
            return false;
        }
        true
    }

    /// `has_prior_subscription` feeds the first-time-customer restriction.
    pub fn can_be_used(&self, amount: Option<Decimal>, has_prior_subscription: bool) -> bool {
        if !self.is_valid() {
            return false;
        }
        if let (Some(min), Some(amount)) = (self.min_amount, amount) {
            if amount < min {
                return false;
            }
        }
        if self.first_time_customers_only && has_prior_subscription {
            return false;
        }
        true
    }

    /// Final amount after the discount; FREE_TRIAL coupons do not change
    /// the amount.
    pub fn apply_discount(&self, amount: Decimal) -> Decimal {
        let discount = match self.discount_type {
            DiscountType::Percentage => amount * (self.discount_value / Decimal::from(100)),
            DiscountType::FixedAmount => self.discount_value.min(amount),
            DiscountType::FreeTrial => Decimal::ZERO,
        };
        (amount - discount).max(Decimal::ZERO)
    }

    pub fn redeem(&mut self) {
        self.uses_count += 1;
        self.modified_at = Some(Utc::now());
    }
}

/// Record of a coupon applied to a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouponUsage {
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

impl CouponUsage {
    pub fn new(
        organization_id: Uuid,
        coupon_id: Uuid,
        subscription_id: Uuid,
        original_amount: Decimal,
        final_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            coupon_id,
            subscription_id,
            invoice_id: None,
            original_amount,
            discount_amount: original_amount - final_amount,
            final_amount,
            used_at: Utc::now(),
        }
    }
}

/// Raw webhook delivery from a payment provider; `provider_event_id` is
/// unique so replays land as IGNORED.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: Uuid,

    pub provider: PaymentProvider,
    pub event_type: String,
    pub provider_event_id: String,

    pub status: WebhookStatus,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: String,
    pub retry_count: i32,

    pub raw_data: Value,

    pub created_at: DateTime<Utc>,
    pub modified_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    pub fn new(
        provider: PaymentProvider,
        event_type: String,
        provider_event_id: String,
        raw_data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            event_type,
            provider_event_id,
            status: WebhookStatus::Pending,
            processed_at: None,
            error_message: String::new(),
            retry_count: 0,
            raw_data,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    pub fn mark_processed(&mut self) {
        self.status = WebhookStatus::Processed;
        self.processed_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: String) {
        self.status = WebhookStatus::Failed;
        self.error_message = error_message;
        self.retry_count += 1;
        self.modified_at = Some(Utc::now());
    }

    pub fn mark_ignored(&mut self) {
        self.status = WebhookStatus::Ignored;
        self.processed_at = Some(Utc::now());
        self.modified_at = Some(Utc::now());
    }
}

/// Outbound billing alert dispatched by the worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingNotification {
    pub id: Uuid,
    pub organization_id: Uuid,

    pub notification_type: NotificationType,
    pub recipient_email: String,
    pub subject: String,
    pub message: String,

    pub subscription_id: Option<Uuid>,
    pub invoice_id: Option<Uuid>,

    pub status: NotificationStatus,
    pub scheduled_for: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: String,

    pub created_at: DateTime<Utc>,
}

impl BillingNotification {
    pub fn new(
        organization_id: Uuid,
        notification_type: NotificationType,
        recipient_email: String,
        subject: String,
        message: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            notification_type,
            recipient_email,
            subject,
            message,
            subscription_id: None,
            invoice_id: None,
            status: NotificationStatus::Pending,
            scheduled_for: Utc::now(),
            sent_at: None,
            error_message: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn mark_sent(&mut self) {
        self.status = NotificationStatus::Sent;
        self.sent_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: String) {
        self.status = NotificationStatus::Failed;
        self.error_message = error_message;
    }
}

/// Monthly revenue bucket for dashboard charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyRevenueRow {
    pub year: i32,
    pub month: u32,
    pub total: Decimal,
}

/// Monthly usage bucket per usage type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageTrendRow {
    pub usage_type: UsageType,
    pub year: i32,
    pub month: u32,
    pub total_usage: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            name: "Professional".into(),
            description: String::new(),
            tier: PlanTier::Professional,
            price_monthly: Decimal::new(4900, 2),
            price_quarterly: Decimal::new(13900, 2),
            price_yearly: Decimal::new(49900, 2),
            currency: "USD".into(),
            max_assessments_per_month: 100,
            max_team_members: 25,
            max_storage_gb: 10,
            includes_pdi: true,
            includes_recruiting: true,
            includes_advanced_reports: false,
            includes_api_access: false,
            trial_days: 0,
            paypal_plan_id_monthly: "P-123".into(),
            paypal_plan_id_quarterly: String::new(),
            paypal_plan_id_yearly: String::new(),
            stripe_price_id_monthly: "price_123".into(),
            stripe_price_id_quarterly: String::new(),
            stripe_price_id_yearly: String::new(),
            is_active: true,
            is_public: true,
            sort_order: 1,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    fn meter(limit: i64, overage_allowed: bool) -> UsageMeter {
        let mut meter = UsageMeter::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UsageType::Assessments,
            limit,
            Utc::now(),
            Utc::now() + Duration::days(30),
        );
        meter.overage_allowed = overage_allowed;
        meter.overage_rate = Decimal::new(50, 2);
        meter
    }

    #[test]
    fn test_price_for_cycle() {
        let plan = plan();
        assert_eq!(plan.price_for_cycle(BillingCycle::Monthly), Decimal::new(4900, 2));
        assert_eq!(plan.price_for_cycle(BillingCycle::Yearly), Decimal::new(49900, 2));
    }

    #[test]
    fn test_provider_price_id() {
        let plan = plan();
        assert_eq!(
            plan.provider_price_id(PaymentProvider::Stripe, BillingCycle::Monthly),
            Some("price_123")
        );
        assert_eq!(
            plan.provider_price_id(PaymentProvider::Stripe, BillingCycle::Yearly),
            None
        );
        assert_eq!(
            plan.provider_price_id(PaymentProvider::Manual, BillingCycle::Monthly),
            None
        );
    }

    #[test]
    fn test_subscription_trial_status() {
        let mut plan = plan();
        plan.trial_days = 14;
        let sub = Subscription::new(
            Uuid::new_v4(),
            &plan,
            BillingCycle::Monthly,
            PaymentProvider::Stripe,
            plan.price_monthly,
        );
        assert_eq!(sub.status, SubscriptionStatus::Trialing);
        assert!(sub.is_active());
        assert!(sub.trial_end.is_some());
    }

    #[test]
    fn test_subscription_cancel_at_period_end() {
        let plan = plan();
        let mut sub = Subscription::new(
            Uuid::new_v4(),
            &plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            plan.price_monthly,
        );
        sub.cancel("too pricey".into(), true);
        assert_eq!(sub.status, SubscriptionStatus::Active);
        assert!(sub.cancel_at_period_end);

        sub.cancel("now".into(), false);
        assert_eq!(sub.status, SubscriptionStatus::Cancelled);
        assert!(sub.cancelled_at.is_some());
    }

    #[test]
    fn test_renew_rolls_period() {
        let plan = plan();
        let mut sub = Subscription::new(
            Uuid::new_v4(),
            &plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            plan.price_monthly,
        );
        sub.mark_past_due();
        let old_end = sub.current_period_end;
        let next_end = old_end + Duration::days(30);
        sub.renew(next_end);
        assert_eq!(sub.current_period_start, old_end);
        assert_eq!(sub.current_period_end, next_end);
        assert_eq!(sub.status, SubscriptionStatus::Active);
    }

    #[test]
    fn test_meter_blocks_without_overage() {
        let meter = meter(10, false);
        assert!(meter.can_increment(10));
        assert!(!meter.can_increment(11));
    }

    #[test]
    fn test_meter_overage_accrual() {
        let mut meter = meter(10, true);
        meter.increment(9);
        assert_eq!(meter.overage_usage, 0);
        assert_eq!(meter.overage_cost, Decimal::ZERO);

        // 9 -> 12 crosses the limit by 2
        meter.increment(3);
        assert_eq!(meter.current_usage, 12);
        assert_eq!(meter.overage_usage, 2);
        assert_eq!(meter.overage_cost, Decimal::new(100, 2));

        // Further increments only accrue the delta
        meter.increment(1);
        assert_eq!(meter.overage_usage, 3);
        assert_eq!(meter.overage_cost, Decimal::new(150, 2));
    }

    #[test]
    fn test_meter_percentage_and_remaining() {
        let mut meter = meter(0, false);
        assert_eq!(meter.usage_percentage(), 0.0);

        meter.limit = 20;
        meter.current_usage = 5;
        assert_eq!(meter.usage_percentage(), 25.0);
        assert_eq!(meter.remaining(), 15);

        meter.current_usage = 40;
        assert_eq!(meter.usage_percentage(), 100.0);
        assert_eq!(meter.remaining(), 0);
        assert!(meter.is_over_limit());
    }

    #[test]
    fn test_meter_reset() {
        let mut meter = meter(10, true);
        meter.increment(15);
        let start = Utc::now();
        let end = start + Duration::days(30);
        meter.reset_for_period(start, end);
        assert_eq!(meter.current_usage, 0);
        assert_eq!(meter.overage_usage, 0);
        assert_eq!(meter.overage_cost, Decimal::ZERO);
        assert_eq!(meter.period_start, start);
    }

    #[test]
    fn test_invoice_number_sequence() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let prefix = invoice_number_prefix(date);
        assert_eq!(prefix, "INV-202503");
        assert_eq!(next_invoice_number(&prefix, None), "INV-202503-0001");
        assert_eq!(
            next_invoice_number(&prefix, Some("INV-202503-0041")),
            "INV-202503-0042"
        );
        assert_eq!(
            next_invoice_number(&prefix, Some("INV-202503-garbled")),
            "INV-202503-0001"
        );
    }

    #[test]
    fn test_invoice_totals_from_items() {
        let mut invoice = Invoice::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "INV-202503-0001".into(),
            "USD".into(),
            Utc::now(),
            Utc::now() + Duration::days(30),
            Utc::now() + Duration::days(14),
        );
        let items = vec![
            InvoiceItem::new(
                invoice.id,
                InvoiceItemKind::Subscription,
                "Professional monthly".into(),
                Decimal::from(1),
                Decimal::new(4900, 2),
            ),
            InvoiceItem::new(
                invoice.id,
                InvoiceItemKind::Overage,
                "Assessments overage".into(),
                Decimal::from(4),
                Decimal::new(50, 2),
            ),
            InvoiceItem::new(
                invoice.id,
                InvoiceItemKind::Tax,
                "VAT".into(),
                Decimal::from(1),
                Decimal::new(200, 2),
            ),
        ];
        invoice.apply_items(&items);
        assert_eq!(invoice.subtotal, Decimal::new(5100, 2));
        assert_eq!(invoice.tax_amount, Decimal::new(200, 2));
        assert_eq!(invoice.total_amount, Decimal::new(5300, 2));
    }

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "WELCOME".into(),
            name: "Welcome".into(),
            description: String::new(),
            discount_type,
            discount_value: value,
            currency: "USD".into(),
            valid_from: Utc::now() - Duration::days(1),
            valid_until: Some(Utc::now() + Duration::days(30)),
            max_uses: Some(100),
            uses_count: 0,
            min_amount: None,
            first_time_customers_only: false,
            is_active: true,
            created_at: Utc::now(),
            created_by: None,
            modified_at: None,
        }
    }

    #[test]
    fn test_coupon_validity_window() {
        let mut coupon = coupon(DiscountType::Percentage, Decimal::from(10));
        assert!(coupon.is_valid());

        coupon.valid_from = Utc::now() + Duration::days(1);
        assert!(!coupon.is_valid());

        coupon.valid_from = Utc::now() - Duration::days(2);
        coupon.valid_until = Some(Utc::now() - Duration::days(1));
        assert!(!coupon.is_valid());

        coupon.valid_until = None;
        coupon.uses_count = 100;
        assert!(!coupon.is_valid());
    }

    #[test]
    fn test_coupon_discounts() {
        let pct = coupon(DiscountType::Percentage, Decimal::from(25));
        assert_eq!(pct.apply_discount(Decimal::from(200)), Decimal::from(150));

        let fixed = coupon(DiscountType::FixedAmount, Decimal::from(80));
        assert_eq!(fixed.apply_discount(Decimal::from(50)), Decimal::ZERO);
        assert_eq!(fixed.apply_discount(Decimal::from(100)), Decimal::from(20));

        let trial = coupon(DiscountType::FreeTrial, Decimal::from(30));
        assert_eq!(trial.apply_discount(Decimal::from(100)), Decimal::from(100));
    }

    #[test]
    fn test_coupon_restrictions() {
        let mut coupon = coupon(DiscountType::Percentage, Decimal::from(10));
        coupon.min_amount = Some(Decimal::from(50));
        assert!(!coupon.can_be_used(Some(Decimal::from(40)), false));
        assert!(coupon.can_be_used(Some(Decimal::from(60)), false));
        assert!(coupon.can_be_used(None, false));

        coupon.first_time_customers_only = true;
        assert!(!coupon.can_be_used(Some(Decimal::from(60)), true));
    }

    #[test]
    fn test_coupon_usage_records_discount() {
        let usage = CouponUsage::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Decimal::from(100),
            Decimal::from(75),
        );
        assert_eq!(usage.discount_amount, Decimal::from(25));
    }

    #[test]
    fn test_webhook_retry_counting() {
        let mut event = WebhookEvent::new(
            PaymentProvider::Stripe,
            "invoice.payment_succeeded".into(),
            "evt_1".into(),
            serde_json::json!({}),
        );
        assert_eq!(event.status, WebhookStatus::Pending);
        event.mark_failed("boom".into());
        assert_eq!(event.retry_count, 1);
        event.mark_failed("boom again".into());
        assert_eq!(event.retry_count, 2);
        event.mark_processed();
        assert_eq!(event.status, WebhookStatus::Processed);
        assert!(event.processed_at.is_some());
    }
}
