// ============================================================================
// Tala Core - Billing Service
// File: crates/tala-core/src/services/billing_service.rs
// ============================================================================
//! Subscriptions, usage metering, coupons, invoices and billing alerts

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

use tala_shared::constants::USAGE_ALERT_THRESHOLD;
use tala_shared::types::Pagination;

use crate::domain::{
    invoice_number_prefix, next_invoice_number, BillingCycle, BillingNotification, Coupon,
    CouponUsage, DiscountType, Invoice, InvoiceItem, InvoiceItemKind, InvoiceStatus,
    MonthlyRevenueRow, NotificationType, PaymentProvider, PaymentStatus, Plan, Subscription,
    SubscriptionStatus, UsageMeter, UsageTrendRow, UsageType, WebhookEvent, WebhookStatus,
};
use crate::error::DomainError;
use crate::repositories::{BillingRepository, OrganizationRepository};

/// Verdict returned by coupon validation, mirrored into JSON by the API.
#[derive(Debug, Clone, Serialize)]
pub struct CouponQuote {
    pub coupon_name: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub original_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
}

/// Meter state reported after an increment and in usage listings.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub usage_type: UsageType,
    pub current_usage: i64,
    pub limit: i64,
    pub remaining: i64,
    pub usage_percentage: f64,
    pub is_over_limit: bool,
    pub overage_cost: Decimal,
}

impl From<&UsageMeter> for UsageSnapshot {
    fn from(meter: &UsageMeter) -> Self {
        Self {
            usage_type: meter.usage_type,
            current_usage: meter.current_usage,
            limit: meter.limit,
            remaining: meter.remaining(),
            usage_percentage: meter.usage_percentage(),
            is_over_limit: meter.is_over_limit(),
            overage_cost: meter.overage_cost,
        }
    }
}

/// Counters reported by the renewal sweep.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenewalOutcome {
    pub renewed: u32,
    pub cancelled: u32,
    pub marked_past_due: u32,
}

pub struct BillingService<B, O>
where
    B: BillingRepository,
    O: OrganizationRepository,
{
    billing_repo: Arc<B>,
    org_repo: Arc<O>,
}

impl<B, O> BillingService<B, O>
where
    B: BillingRepository,
    O: OrganizationRepository,
{
    pub fn new(billing_repo: Arc<B>, org_repo: Arc<O>) -> Self {
        Self { billing_repo, org_repo }
    }

    // ------------------------------------------------------------------
    // Plans
    // ------------------------------------------------------------------

    pub async fn list_plans(&self) -> Result<Vec<Plan>, DomainError> {
        self.billing_repo.list_public_plans().await
    }

    pub async fn get_plan(&self, id: &Uuid) -> Result<Plan, DomainError> {
        self.billing_repo
            .find_plan(id)
            .await?
            .filter(|p| p.is_active)
            .ok_or(DomainError::PlanNotFound)
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Subscribes the organization to a plan. The amount is the cycle price
    /// with any coupon discount applied; a usage meter is seeded per plan
    /// limit for the opening period.
    pub async fn subscribe(
        &self,
        organization_id: &Uuid,
        plan_id: &Uuid,
        billing_cycle: BillingCycle,
        provider: PaymentProvider,
        coupon_code: Option<&str>,
    ) -> Result<Subscription, DomainError> {
        // 1. Plan must exist and be active
        let plan = self.get_plan(plan_id).await?;

        // 2. One live subscription per tenant
        if self
            .billing_repo
            .find_subscription_for_org(organization_id)
            .await?
            .is_some_and(|s| s.is_active())
        {
            return Err(DomainError::ActiveSubscriptionExists);
        }

        // 3. Price the cycle and apply the coupon
        let original_amount = plan.price_for_cycle(billing_cycle);
        let mut amount = original_amount;
        let mut coupon: Option<Coupon> = None;
        if let Some(code) = coupon_code {
            let found = self
                .billing_repo
                .find_coupon_by_code(&code.to_uppercase())
                .await?
                .ok_or(DomainError::CouponNotFound)?;
            let has_prior = self
                .billing_repo
                .has_any_subscription(organization_id)
                .await?;
            if !found.can_be_used(Some(original_amount), has_prior) {
                return Err(DomainError::CouponNotValid(
                    "coupon cannot be used for this order".to_string(),
                ));
            }
            amount = found.apply_discount(original_amount);
            coupon = Some(found);
        }

        // 4. Create the subscription with its seeded meters
        let subscription =
            Subscription::new(*organization_id, &plan, billing_cycle, provider, amount);
        let meters: Vec<UsageMeter> = plan
            .usage_limits()
            .into_iter()
            .map(|(usage_type, limit)| {
                UsageMeter::new(
                    *organization_id,
                    subscription.id,
                    usage_type,
                    limit,
                    subscription.current_period_start,
                    subscription.current_period_end,
                )
            })
            .collect();
        self.billing_repo
            .create_subscription_with_meters(&subscription, &meters)
            .await?;

        // 5. Redeem the coupon against the new subscription
        if let Some(mut coupon) = coupon {
            coupon.redeem();
            self.billing_repo.update_coupon(&coupon).await?;
            let usage = CouponUsage::new(
                *organization_id,
                coupon.id,
                subscription.id,
                original_amount,
                amount,
            );
            self.billing_repo.record_coupon_usage(&usage).await?;
        }

        info!(
            "Subscription created: org {} on plan {} ({})",
            organization_id,
            plan.name,
            subscription.status.as_str()
        );
        Ok(subscription)
    }

    pub async fn current_subscription(
        &self,
        organization_id: &Uuid,
    ) -> Result<Subscription, DomainError> {
        self.billing_repo
            .find_subscription_for_org(organization_id)
            .await?
            .ok_or(DomainError::SubscriptionNotFound)
    }

    pub async fn cancel_subscription(
        &self,
        organization_id: &Uuid,
        reason: String,
        at_period_end: bool,
    ) -> Result<Subscription, DomainError> {
        let mut subscription = self.current_subscription(organization_id).await?;
        if !subscription.is_active() {
            return Err(DomainError::SubscriptionNotFound);
        }
        subscription.cancel(reason, at_period_end);
        let subscription = self.billing_repo.update_subscription(&subscription).await?;
        self.notify(
            organization_id,
            Some(subscription.id),
            None,
            NotificationType::SubscriptionCancelled,
            "Subscription cancelled".to_string(),
            if at_period_end {
                format!(
                    "Your subscription will end on {}.",
                    subscription.current_period_end.format("%B %d, %Y")
                )
            } else {
                "Your subscription has been cancelled.".to_string()
            },
        )
        .await;
        Ok(subscription)
    }

    // ------------------------------------------------------------------
    // Usage metering
    // ------------------------------------------------------------------

    /// Adds usage to the current-period meter. Meters without an overage
    /// allowance refuse to cross their limit.
    pub async fn increment_usage(
        &self,
        organization_id: &Uuid,
        usage_type: UsageType,
        amount: i64,
    ) -> Result<UsageSnapshot, DomainError> {
        let subscription = self.current_subscription(organization_id).await?;
        if !subscription.is_active() {
            return Err(DomainError::SubscriptionNotFound);
        }
        let mut meter = self
            .billing_repo
            .find_current_meter(&subscription.id, usage_type, Utc::now())
            .await?
            .ok_or(DomainError::UsageMeterNotFound)?;

        if !meter.can_increment(amount) {
            return Err(DomainError::UsageLimitExceeded {
                usage_type: usage_type.as_str().to_string(),
                current: meter.current_usage,
                limit: meter.limit,
            });
        }

        meter.increment(amount);
        let meter = self.billing_repo.update_meter(&meter).await?;
        Ok(UsageSnapshot::from(&meter))
    }

    pub async fn usage_report(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<UsageSnapshot>, DomainError> {
        let subscription = self.current_subscription(organization_id).await?;
        let meters = self.billing_repo.list_meters(&subscription.id).await?;
        Ok(meters
            .iter()
            .filter(|m| m.period_start == subscription.current_period_start)
            .map(UsageSnapshot::from)
            .collect())
    }

    // ------------------------------------------------------------------
    // Coupons
    // ------------------------------------------------------------------

    pub async fn validate_coupon(
        &self,
        organization_id: &Uuid,
        code: &str,
        amount: Decimal,
    ) -> Result<CouponQuote, DomainError> {
        let coupon = self
            .billing_repo
            .find_coupon_by_code(&code.to_uppercase())
            .await?
            .ok_or(DomainError::CouponNotFound)?;
        let has_prior = self
            .billing_repo
            .has_any_subscription(organization_id)
            .await?;
        if !coupon.can_be_used(Some(amount), has_prior) {
            return Err(DomainError::CouponNotValid(
                "coupon cannot be used for this order".to_string(),
            ));
        }
        let final_amount = coupon.apply_discount(amount);
        Ok(CouponQuote {
            coupon_name: coupon.name,
            discount_type: coupon.discount_type,
            discount_value: coupon.discount_value,
            original_amount: amount,
            discount_amount: amount - final_amount,
            final_amount,
        })
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    pub async fn get_invoice(
        &self,
        organization_id: &Uuid,
        id: &Uuid,
    ) -> Result<Invoice, DomainError> {
        self.billing_repo
            .find_invoice(organization_id, id)
            .await?
            .ok_or(DomainError::InvoiceNotFound)
    }

    pub async fn list_invoices(
        &self,
        organization_id: &Uuid,
        pagination: Pagination,
    ) -> Result<Vec<Invoice>, DomainError> {
        self.billing_repo
            .list_invoices(organization_id, pagination.clamped())
            .await
    }

    pub async fn invoice_items(&self, invoice_id: &Uuid) -> Result<Vec<InvoiceItem>, DomainError> {
        self.billing_repo.list_invoice_items(invoice_id).await
    }

    /// Issues the invoice for the subscription's current period: the
    /// subscription line, one OVERAGE line per meter that accrued overage,
    /// and an optional DISCOUNT line. Numbering continues the month
    /// sequence.
    pub async fn generate_period_invoice(
        &self,
        subscription: &Subscription,
        discount: Option<(String, Decimal)>,
    ) -> Result<Invoice, DomainError> {
        let plan = self
            .billing_repo
            .find_plan(&subscription.plan_id)
            .await?
            .ok_or(DomainError::PlanNotFound)?;

        let now = Utc::now();
        let prefix = invoice_number_prefix(now.date_naive());
        let last = self.billing_repo.last_invoice_number(&prefix).await?;
        let number = next_invoice_number(&prefix, last.as_deref());

        let mut invoice = Invoice::new(
            subscription.organization_id,
            subscription.id,
            number,
            subscription.currency.clone(),
            subscription.current_period_start,
            subscription.current_period_end,
            now + Duration::days(7),
        );
        invoice.status = InvoiceStatus::Open;
        invoice.provider = Some(subscription.provider);

        let mut items = Vec::new();

        // Subscription line. With a discount line present the base price is
        // shown undiscounted so the totals still foot.
        let unit_price = if discount.is_some() {
            plan.price_for_cycle(subscription.billing_cycle)
        } else {
            subscription.amount
        };
        items.push(InvoiceItem::new(
            invoice.id,
            InvoiceItemKind::Subscription,
            format!("{} - {}", plan.name, subscription.billing_cycle.as_str()),
            Decimal::ONE,
            unit_price,
        ));

        // Overage lines for the period
        let meters = self.billing_repo.list_meters(&subscription.id).await?;
        for meter in meters
            .iter()
            .filter(|m| {
                m.period_start == subscription.current_period_start
                    && m.overage_cost > Decimal::ZERO
            })
        {
            let mut item = InvoiceItem::new(
                invoice.id,
                InvoiceItemKind::Overage,
                format!(
                    "{} overage ({} units)",
                    meter.usage_type.as_str(),
                    meter.overage_usage
                ),
                Decimal::from(meter.overage_usage),
                meter.overage_rate,
            );
            item.usage_meter_id = Some(meter.id);
            items.push(item);
        }

        if let Some((description, amount)) = discount {
            items.push(InvoiceItem::new(
                invoice.id,
                InvoiceItemKind::Discount,
                description,
                Decimal::ONE,
                -amount,
            ));
        }

        invoice.apply_items(&items);
        self.billing_repo
            .create_invoice_with_items(&invoice, &items)
            .await?;

        self.notify(
            &subscription.organization_id,
            Some(subscription.id),
            Some(invoice.id),
            NotificationType::InvoiceCreated,
            format!("New invoice {}", invoice.invoice_number),
            format!(
                "A new invoice for {} {} has been generated.",
                invoice.total_amount, invoice.currency
            ),
        )
        .await;

        info!(
            "Invoice {} issued for org {}",
            invoice.invoice_number, subscription.organization_id
        );
        Ok(invoice)
    }

    pub async fn mark_invoice_paid(
        &self,
        organization_id: &Uuid,
        invoice_id: &Uuid,
        payment_method: String,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = self.get_invoice(organization_id, invoice_id).await?;
        invoice.mark_paid(payment_method);
        self.billing_repo.update_invoice(&invoice).await
    }

    // ------------------------------------------------------------------
    // Periodic sweeps, driven by the worker
    // ------------------------------------------------------------------

    /// Rolls over subscriptions whose period has ended: pending
    /// cancellations become CANCELLED, card-provider trials that never saw
    /// a payment go PAST_DUE, the rest are invoiced and renewed.
    pub async fn process_due_renewals(&self) -> Result<RenewalOutcome, DomainError> {
        let due = self.billing_repo.list_due_for_renewal(Utc::now()).await?;
        let mut outcome = RenewalOutcome::default();

        for mut subscription in due {
            if subscription.cancel_at_period_end {
                subscription.cancel(subscription.cancellation_reason.clone(), false);
                self.billing_repo.update_subscription(&subscription).await?;
                self.notify(
                    &subscription.organization_id,
                    Some(subscription.id),
                    None,
                    NotificationType::SubscriptionCancelled,
                    "Subscription ended".to_string(),
                    "Your subscription has ended as requested.".to_string(),
                )
                .await;
                outcome.cancelled += 1;
                continue;
            }

            let trial_lapsed = subscription.status == SubscriptionStatus::Trialing
                && subscription.provider != PaymentProvider::Manual
                && subscription.trial_end.is_some_and(|end| end < Utc::now());
            if trial_lapsed {
                // The provider webhook activates the subscription on the
                // first successful charge; until then it is unpaid.
                subscription.mark_past_due();
                self.billing_repo.update_subscription(&subscription).await?;
                outcome.marked_past_due += 1;
                continue;
            }

            if let Err(e) = self.generate_period_invoice(&subscription, None).await {
                error!(
                    "Invoice generation failed for subscription {}: {}",
                    subscription.id, e
                );
                continue;
            }
            let next_end =
                subscription.current_period_end
                    + Duration::days(subscription.billing_cycle.period_days());
            subscription.renew(next_end);
            self.billing_repo.update_subscription(&subscription).await?;
            self.notify(
                &subscription.organization_id,
                Some(subscription.id),
                None,
                NotificationType::SubscriptionRenewed,
                "Subscription renewed".to_string(),
                format!(
                    "Your subscription renewed through {}.",
                    subscription.current_period_end.format("%B %d, %Y")
                ),
            )
            .await;
            outcome.renewed += 1;
        }

        Ok(outcome)
    }

    /// Re-aligns meters whose period lapsed with their subscription's
    /// current period, zeroing usage and overage.
    pub async fn reset_lapsed_meters(&self) -> Result<u32, DomainError> {
        let meters = self.billing_repo.list_meters_past_period(Utc::now()).await?;
        let mut reset = 0;
        for mut meter in meters {
            let Some(subscription) = self
                .billing_repo
                .find_subscription(&meter.subscription_id)
                .await?
            else {
                continue;
            };
            if !subscription.is_active()
                || meter.period_start == subscription.current_period_start
            {
                continue;
            }
            meter.reset_for_period(
                subscription.current_period_start,
                subscription.current_period_end,
            );
            self.billing_repo.update_meter(&meter).await?;
            reset += 1;
        }
        Ok(reset)
    }

    /// Queues at most one alert per meter period: USAGE_LIMIT_REACHED at
    /// the warning threshold, OVERAGE_ALERT once overage accrues.
    pub async fn queue_usage_alerts(&self) -> Result<u32, DomainError> {
        let meters = self
            .billing_repo
            .list_meters_over_threshold(USAGE_ALERT_THRESHOLD)
            .await?;
        let mut queued = 0;

        for meter in meters {
            let notification_type = if meter.overage_usage > 0 {
                NotificationType::OverageAlert
            } else {
                NotificationType::UsageLimitReached
            };
            let already_sent = self
                .billing_repo
                .exists_notification(
                    &meter.organization_id,
                    notification_type,
                    meter.period_start,
                    meter.usage_type.as_str(),
                )
                .await?;
            if already_sent {
                continue;
            }

            let message = if meter.overage_usage > 0 {
                format!(
                    "{} usage is over its limit ({}/{}); overage charges of {} have accrued.",
                    meter.usage_type.as_str(),
                    meter.current_usage,
                    meter.limit,
                    meter.overage_cost
                )
            } else {
                format!(
                    "You have used {:.0}% of your {} limit ({}/{}).",
                    meter.usage_percentage(),
                    meter.usage_type.as_str(),
                    meter.current_usage,
                    meter.limit
                )
            };
            self.notify(
                &meter.organization_id,
                Some(meter.subscription_id),
                None,
                notification_type,
                format!("Usage alert - {}", meter.usage_type.as_str()),
                message,
            )
            .await;
            queued += 1;
        }

        Ok(queued)
    }

    pub async fn due_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<BillingNotification>, DomainError> {
        self.billing_repo
            .list_due_notifications(Utc::now(), limit)
            .await
    }

    pub async fn update_notification(
        &self,
        notification: &BillingNotification,
    ) -> Result<BillingNotification, DomainError> {
        self.billing_repo.update_notification(notification).await
    }

    // ------------------------------------------------------------------
    // Webhooks
    // ------------------------------------------------------------------

    /// Stores a signature-verified provider event for the worker to pick
    /// up. Redeliveries of an event id already on file are recorded as
    /// IGNORED so the endpoint stays idempotent.
    pub async fn ingest_webhook(
        &self,
        provider: PaymentProvider,
        event_type: &str,
        provider_event_id: &str,
        raw_data: Value,
    ) -> Result<WebhookEvent, DomainError> {
        let mut event = WebhookEvent::new(
            provider,
            event_type.to_string(),
            provider_event_id.to_string(),
            raw_data,
        );
        if self
            .billing_repo
            .find_event_by_provider_id(provider, provider_event_id)
            .await?
            .is_some()
        {
            info!(
                "Duplicate {} webhook event {}: recording as ignored",
                provider.as_str(),
                provider_event_id
            );
            event.mark_ignored();
        }
        self.billing_repo.create_event(&event).await
    }

    pub async fn pending_webhook_events(
        &self,
        limit: i64,
    ) -> Result<Vec<WebhookEvent>, DomainError> {
        self.billing_repo.list_pending_events(limit).await
    }

    /// Applies one provider event. Subscription lifecycle and payment
    /// outcome events update the matching rows and mark the event
    /// PROCESSED; event types we do not act on are marked IGNORED;
    /// failures record the error and bump the retry counter.
    pub async fn process_webhook_event(
        &self,
        mut event: WebhookEvent,
    ) -> Result<WebhookEvent, DomainError> {
        match self.apply_webhook_event(&event).await {
            Ok(true) => event.mark_processed(),
            Ok(false) => event.mark_ignored(),
            Err(e) => {
                warn!(
                    "Webhook event {} ({}) failed: {}",
                    event.provider_event_id, event.event_type, e
                );
                event.mark_failed(e.to_string());
            }
        }
        self.billing_repo.update_event(&event).await
    }

    async fn apply_webhook_event(&self, event: &WebhookEvent) -> Result<bool, DomainError> {
        match (event.provider, event.event_type.as_str()) {
            (PaymentProvider::Paypal, "BILLING.SUBSCRIPTION.ACTIVATED") => {
                self.set_subscription_status(event, SubscriptionStatus::Active)
                    .await
            }
            (PaymentProvider::Paypal, "BILLING.SUBSCRIPTION.CANCELLED")
            | (PaymentProvider::Paypal, "BILLING.SUBSCRIPTION.EXPIRED") => {
                self.set_subscription_status(event, SubscriptionStatus::Cancelled)
                    .await
            }
            (PaymentProvider::Paypal, "BILLING.SUBSCRIPTION.SUSPENDED") => {
                self.set_subscription_status(event, SubscriptionStatus::Paused)
                    .await
            }
            (PaymentProvider::Paypal, "PAYMENT.SALE.COMPLETED") => {
                self.settle_payment(event, PaymentStatus::Succeeded).await
            }
            (PaymentProvider::Paypal, "PAYMENT.SALE.DENIED") => {
                self.settle_payment(event, PaymentStatus::Failed).await
            }
            (PaymentProvider::Stripe, "customer.subscription.updated") => {
                // Stripe carries the new status inside the payload.
                let Some(status) = Self::stripe_subscription_status(&event.raw_data) else {
                    return Ok(false);
                };
                self.set_subscription_status(event, status).await
            }
            (PaymentProvider::Stripe, "customer.subscription.deleted") => {
                self.set_subscription_status(event, SubscriptionStatus::Cancelled)
                    .await
            }
            (PaymentProvider::Stripe, "invoice.payment_succeeded") => {
                self.settle_payment(event, PaymentStatus::Succeeded).await
            }
            (PaymentProvider::Stripe, "invoice.payment_failed") => {
                self.settle_payment(event, PaymentStatus::Failed).await
            }
            _ => Ok(false),
        }
    }

    async fn set_subscription_status(
        &self,
        event: &WebhookEvent,
        status: SubscriptionStatus,
    ) -> Result<bool, DomainError> {
        let Some(provider_id) = Self::provider_object_id(event) else {
            return Ok(false);
        };
        // A missing subscription is an error, not an ignore: the provider
        // can deliver the event before our own row commits, and the retry
        // budget absorbs that race.
        let mut subscription = self
            .billing_repo
            .find_subscription_by_provider_id(event.provider, provider_id)
            .await?
            .ok_or(DomainError::SubscriptionNotFound)?;

        if status == SubscriptionStatus::Cancelled && subscription.cancelled_at.is_none() {
            subscription.cancelled_at = Some(Utc::now());
        }
        subscription.status = status;
        subscription.modified_at = Some(Utc::now());
        self.billing_repo.update_subscription(&subscription).await?;

        info!(
            "Subscription {} set to {} by {} webhook",
            subscription.id,
            status.as_str(),
            event.provider.as_str()
        );
        Ok(true)
    }

    async fn settle_payment(
        &self,
        event: &WebhookEvent,
        status: PaymentStatus,
    ) -> Result<bool, DomainError> {
        let Some(provider_id) = Self::provider_object_id(event) else {
            return Ok(false);
        };
        let mut payment = self
            .billing_repo
            .find_payment_by_provider_id(event.provider, provider_id)
            .await?
            .ok_or(DomainError::PaymentNotFound)?;

        payment.status = status;
        if status == PaymentStatus::Failed {
            payment.failure_reason = event.event_type.clone();
        }
        payment.modified_at = Some(Utc::now());
        self.billing_repo.update_payment(&payment).await?;

        info!(
            "Payment {} settled as {} by {} webhook",
            payment.id,
            status.as_str(),
            event.provider.as_str()
        );
        Ok(true)
    }

    /// Provider payload shapes differ: PayPal nests the object under
    /// `resource`, Stripe under `data.object`.
    fn provider_object_id(event: &WebhookEvent) -> Option<&str> {
        match event.provider {
            PaymentProvider::Paypal => event.raw_data["resource"]["id"].as_str(),
            PaymentProvider::Stripe => event.raw_data["data"]["object"]["id"].as_str(),
            PaymentProvider::Manual => None,
        }
    }

    fn stripe_subscription_status(raw: &Value) -> Option<SubscriptionStatus> {
        match raw["data"]["object"]["status"].as_str() {
            Some("active") => Some(SubscriptionStatus::Active),
            Some("trialing") => Some(SubscriptionStatus::Trialing),
            Some("past_due") => Some(SubscriptionStatus::PastDue),
            Some("canceled") | Some("cancelled") => Some(SubscriptionStatus::Cancelled),
            Some("unpaid") => Some(SubscriptionStatus::Unpaid),
            Some("paused") => Some(SubscriptionStatus::Paused),
            Some("incomplete") => Some(SubscriptionStatus::Incomplete),
            Some("incomplete_expired") => Some(SubscriptionStatus::IncompleteExpired),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------------

    pub async fn monthly_revenue(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<MonthlyRevenueRow>, DomainError> {
        self.billing_repo.monthly_revenue(organization_id, 12).await
    }

    pub async fn usage_trend(
        &self,
        organization_id: &Uuid,
    ) -> Result<Vec<UsageTrendRow>, DomainError> {
        self.billing_repo.usage_trend(organization_id, 6).await
    }

    /// Best-effort notification row; delivery happens in the worker.
    async fn notify(
        &self,
        organization_id: &Uuid,
        subscription_id: Option<Uuid>,
        invoice_id: Option<Uuid>,
        notification_type: NotificationType,
        subject: String,
        message: String,
    ) {
        let recipient = match self.org_repo.find_by_id(organization_id).await {
            Ok(Some(org)) => org.email,
            Ok(None) => None,
            Err(e) => {
                warn!("Organization lookup failed for notification: {}", e);
                None
            }
        };
        let Some(recipient) = recipient else {
            // Nothing to address the alert to.
            return;
        };

        let mut notification = BillingNotification::new(
            *organization_id,
            notification_type,
            recipient,
            subject,
            message,
        );
        notification.subscription_id = subscription_id;
        notification.invoice_id = invoice_id;
        if let Err(e) = self.billing_repo.create_notification(&notification).await {
            warn!("Failed to record billing notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::billing_repository::MockBillingRepository;
    use crate::repositories::organization_repository::MockOrganizationRepository;

    fn plan() -> Plan {
        Plan {
            id: Uuid::new_v4(),
            name: "Professional".into(),
            description: String::new(),
            tier: crate::domain::PlanTier::Professional,
            price_monthly: Decimal::new(9900, 2),
            price_quarterly: Decimal::new(26700, 2),
            price_yearly: Decimal::new(95000, 2),
            currency: "USD".into(),
            max_assessments_per_month: 100,
            max_team_members: 25,
            max_storage_gb: 10,
            includes_pdi: true,
            includes_recruiting: true,
            includes_advanced_reports: true,
            includes_api_access: false,
            trial_days: 0,
            paypal_plan_id_monthly: String::new(),
            paypal_plan_id_quarterly: String::new(),
            paypal_plan_id_yearly: String::new(),
            stripe_price_id_monthly: String::new(),
            stripe_price_id_quarterly: String::new(),
            stripe_price_id_yearly: String::new(),
            is_active: true,
            is_public: true,
            sort_order: 1,
            created_at: Utc::now(),
            modified_at: None,
        }
    }

    fn coupon(discount_type: DiscountType, value: Decimal) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "LAUNCH20".into(),
            name: "Launch".into(),
            description: String::new(),
            discount_type,
            discount_value: value,
            currency: "USD".into(),
            valid_from: Utc::now() - Duration::days(1),
            valid_until: None,
            max_uses: None,
            uses_count: 0,
            min_amount: None,
            first_time_customers_only: false,
            is_active: true,
            created_at: Utc::now(),
            created_by: None,
            modified_at: None,
        }
    }

    fn org_repo() -> MockOrganizationRepository {
        let mut repo = MockOrganizationRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo
    }

    #[tokio::test]
    async fn test_subscribe_seeds_one_meter_per_limit() {
        let the_plan = plan();
        let plan_id = the_plan.id;

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_plan()
            .returning(move |_| Ok(Some(the_plan.clone())));
        billing_repo
            .expect_find_subscription_for_org()
            .returning(|_| Ok(None));
        billing_repo
            .expect_create_subscription_with_meters()
            .withf(|sub, meters| {
                meters.len() == 3
                    && meters.iter().all(|m| m.subscription_id == sub.id)
                    && meters
                        .iter()
                        .any(|m| m.usage_type == UsageType::Assessments && m.limit == 100)
            })
            .returning(|_, _| Ok(()));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let subscription = service
            .subscribe(
                &Uuid::new_v4(),
                &plan_id,
                BillingCycle::Monthly,
                PaymentProvider::Stripe,
                None,
            )
            .await
            .unwrap();
        assert_eq!(subscription.status, SubscriptionStatus::Active);
        assert_eq!(subscription.amount, Decimal::new(9900, 2));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_second_active_subscription() {
        let the_plan = plan();
        let plan_id = the_plan.id;
        let existing = Subscription::new(
            Uuid::new_v4(),
            &the_plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            Decimal::new(9900, 2),
        );

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_plan()
            .returning(move |_| Ok(Some(the_plan.clone())));
        billing_repo
            .expect_find_subscription_for_org()
            .returning(move |_| Ok(Some(existing.clone())));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let err = service
            .subscribe(
                &Uuid::new_v4(),
                &plan_id,
                BillingCycle::Monthly,
                PaymentProvider::Stripe,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::ActiveSubscriptionExists));
    }

    #[tokio::test]
    async fn test_subscribe_applies_and_redeems_coupon() {
        let the_plan = plan();
        let plan_id = the_plan.id;

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_plan()
            .returning(move |_| Ok(Some(the_plan.clone())));
        billing_repo
            .expect_find_subscription_for_org()
            .returning(|_| Ok(None));
        billing_repo
            .expect_find_coupon_by_code()
            .withf(|code| code == "LAUNCH20")
            .returning(|_| Ok(Some(coupon(DiscountType::Percentage, Decimal::from(20)))));
        billing_repo
            .expect_has_any_subscription()
            .returning(|_| Ok(false));
        billing_repo
            .expect_create_subscription_with_meters()
            .returning(|_, _| Ok(()));
        billing_repo
            .expect_update_coupon()
            .withf(|c| c.uses_count == 1)
            .returning(|c| Ok(c.clone()));
        billing_repo
            .expect_record_coupon_usage()
            .withf(|u| u.discount_amount == Decimal::new(1980, 2) && u.final_amount == Decimal::new(7920, 2))
            .returning(|u| Ok(u.clone()));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let subscription = service
            .subscribe(
                &Uuid::new_v4(),
                &plan_id,
                BillingCycle::Monthly,
                PaymentProvider::Stripe,
                Some("launch20"),
            )
            .await
            .unwrap();
        assert_eq!(subscription.amount, Decimal::new(7920, 2));
    }

    #[tokio::test]
    async fn test_increment_usage_rejected_at_limit() {
        let the_plan = plan();
        let org_id = Uuid::new_v4();
        let subscription = Subscription::new(
            org_id,
            &the_plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            Decimal::new(9900, 2),
        );
        let sub_id = subscription.id;
        let mut meter = UsageMeter::new(
            org_id,
            sub_id,
            UsageType::Assessments,
            10,
            subscription.current_period_start,
            subscription.current_period_end,
        );
        meter.current_usage = 10;

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_subscription_for_org()
            .returning(move |_| Ok(Some(subscription.clone())));
        billing_repo
            .expect_find_current_meter()
            .returning(move |_, _, _| Ok(Some(meter.clone())));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let err = service
            .increment_usage(&org_id, UsageType::Assessments, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::UsageLimitExceeded { current: 10, limit: 10, .. }
        ));
    }

    #[tokio::test]
    async fn test_validate_coupon_quote() {
        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_coupon_by_code()
            .returning(|_| Ok(Some(coupon(DiscountType::FixedAmount, Decimal::from(30)))));
        billing_repo
            .expect_has_any_subscription()
            .returning(|_| Ok(false));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let quote = service
            .validate_coupon(&Uuid::new_v4(), "launch20", Decimal::new(9900, 2))
            .await
            .unwrap();
        assert_eq!(quote.discount_amount, Decimal::from(30));
        assert_eq!(quote.final_amount, Decimal::new(6900, 2));
    }

    #[tokio::test]
    async fn test_generate_period_invoice_with_overage() {
        let the_plan = plan();
        let org_id = Uuid::new_v4();
        let subscription = Subscription::new(
            org_id,
            &the_plan,
            BillingCycle::Monthly,
            PaymentProvider::Stripe,
            Decimal::new(9900, 2),
        );
        let mut meter = UsageMeter::new(
            org_id,
            subscription.id,
            UsageType::Assessments,
            10,
            subscription.current_period_start,
            subscription.current_period_end,
        );
        meter.overage_allowed = true;
        meter.overage_rate = Decimal::new(50, 2);
        meter.increment(14);
        assert_eq!(meter.overage_cost, Decimal::new(200, 2));

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_plan()
            .returning(move |_| Ok(Some(the_plan.clone())));
        billing_repo
            .expect_last_invoice_number()
            .returning(|prefix| Ok(Some(format!("{prefix}-0007"))));
        billing_repo
            .expect_list_meters()
            .returning(move |_| Ok(vec![meter.clone()]));
        billing_repo
            .expect_create_invoice_with_items()
            .withf(|invoice, items| {
                invoice.invoice_number.ends_with("-0008")
                    && invoice.total_amount == Decimal::new(10100, 2)
                    && items.len() == 2
                    && items.iter().any(|i| i.kind == InvoiceItemKind::Overage)
            })
            .returning(|_, _| Ok(()));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let invoice = service
            .generate_period_invoice(&subscription, None)
            .await
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Open);
        assert_eq!(invoice.subtotal, Decimal::new(10100, 2));
    }

    #[tokio::test]
    async fn test_renewal_sweep_honors_pending_cancellation() {
        let the_plan = plan();
        let org_id = Uuid::new_v4();
        let mut subscription = Subscription::new(
            org_id,
            &the_plan,
            BillingCycle::Monthly,
            PaymentProvider::Manual,
            Decimal::new(9900, 2),
        );
        subscription.cancel("no longer needed".into(), true);

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_list_due_for_renewal()
            .returning(move |_| Ok(vec![subscription.clone()]));
        billing_repo
            .expect_update_subscription()
            .withf(|s| s.status == SubscriptionStatus::Cancelled && s.cancelled_at.is_some())
            .returning(|s| Ok(s.clone()));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let outcome = service.process_due_renewals().await.unwrap();
        assert_eq!(outcome.cancelled, 1);
        assert_eq!(outcome.renewed, 0);
    }

    #[tokio::test]
    async fn test_usage_alert_skips_already_notified_meter() {
        let mut meter = UsageMeter::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            UsageType::TeamMembers,
            10,
            Utc::now() - Duration::days(10),
            Utc::now() + Duration::days(20),
        );
        meter.current_usage = 9;

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_list_meters_over_threshold()
            .returning(move |_| Ok(vec![meter.clone()]));
        billing_repo
            .expect_exists_notification()
            .returning(|_, _, _, _| Ok(true));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let queued = service.queue_usage_alerts().await.unwrap();
        assert_eq!(queued, 0);
    }

    #[tokio::test]
    async fn test_ingest_webhook_marks_duplicates_ignored() {
        let existing = WebhookEvent::new(
            PaymentProvider::Stripe,
            "invoice.payment_succeeded".into(),
            "evt_123".into(),
            serde_json::json!({}),
        );

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_event_by_provider_id()
            .returning(move |_, _| Ok(Some(existing.clone())));
        billing_repo
            .expect_create_event()
            .withf(|e| e.status == WebhookStatus::Ignored)
            .returning(|e| Ok(e.clone()));

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let event = service
            .ingest_webhook(
                PaymentProvider::Stripe,
                "invoice.payment_succeeded",
                "evt_123",
                serde_json::json!({}),
            )
            .await
            .unwrap();
        assert_eq!(event.status, WebhookStatus::Ignored);
    }

    #[tokio::test]
    async fn test_process_webhook_cancels_subscription() {
        let the_plan = plan();
        let mut subscription = Subscription::new(
            Uuid::new_v4(),
            &the_plan,
            BillingCycle::Monthly,
            PaymentProvider::Paypal,
            Decimal::new(9900, 2),
        );
        subscription.provider_subscription_id = "I-SUB99".into();

        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_subscription_by_provider_id()
            .withf(|provider, id| *provider == PaymentProvider::Paypal && id == "I-SUB99")
            .returning(move |_, _| Ok(Some(subscription.clone())));
        billing_repo
            .expect_update_subscription()
            .withf(|s| s.status == SubscriptionStatus::Cancelled && s.cancelled_at.is_some())
            .returning(|s| Ok(s.clone()));
        billing_repo
            .expect_update_event()
            .returning(|e| Ok(e.clone()));

        let event = WebhookEvent::new(
            PaymentProvider::Paypal,
            "BILLING.SUBSCRIPTION.CANCELLED".into(),
            "WH-1".into(),
            serde_json::json!({"resource": {"id": "I-SUB99"}}),
        );

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let processed = service.process_webhook_event(event).await.unwrap();
        assert_eq!(processed.status, WebhookStatus::Processed);
        assert!(processed.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_process_webhook_ignores_unknown_event_type() {
        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_update_event()
            .withf(|e| e.status == WebhookStatus::Ignored)
            .returning(|e| Ok(e.clone()));

        let event = WebhookEvent::new(
            PaymentProvider::Stripe,
            "customer.created".into(),
            "evt_900".into(),
            serde_json::json!({"data": {"object": {"id": "cus_1"}}}),
        );

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let processed = service.process_webhook_event(event).await.unwrap();
        assert_eq!(processed.status, WebhookStatus::Ignored);
    }

    #[tokio::test]
    async fn test_process_webhook_failure_bumps_retry_count() {
        let mut billing_repo = MockBillingRepository::new();
        billing_repo
            .expect_find_subscription_by_provider_id()
            .returning(|_, _| Ok(None));
        billing_repo
            .expect_update_event()
            .withf(|e| e.status == WebhookStatus::Failed && e.retry_count == 1)
            .returning(|e| Ok(e.clone()));

        let event = WebhookEvent::new(
            PaymentProvider::Paypal,
            "BILLING.SUBSCRIPTION.ACTIVATED".into(),
            "WH-404".into(),
            serde_json::json!({"resource": {"id": "I-UNKNOWN"}}),
        );

        let service = BillingService::new(Arc::new(billing_repo), Arc::new(org_repo()));
        let processed = service.process_webhook_event(event).await.unwrap();
        assert_eq!(processed.status, WebhookStatus::Failed);
        assert!(!processed.error_message.is_empty());
    }
}
