// ============================================================================
// Tala Worker - Periodic Scheduler
// File: crates/tala-worker/src/jobs/scheduler.rs
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tracing::{error, info, warn};

use tala_core::domain::EmailMessage;
use tala_core::repositories::EmailRepository;
use tala_infrastructure::PgEmailRepository;
use tala_shared::config::AppConfig;

use crate::worker::{Assessments, Billing, Organizations};

/// Runs the recurring sweeps: subscription renewals, usage alerts plus
/// billing notification dispatch, and stale-data cleanup.
pub struct Scheduler {
    billing: Arc<Billing>,
    organizations: Arc<Organizations>,
    assessments: Arc<Assessments>,
    email_repo: Arc<PgEmailRepository>,
    from_address: String,
    from_name: String,
    renewal_interval: u64,
    alerts_interval: u64,
    cleanup_interval: u64,
    batch_size: i64,
}

impl Scheduler {
    pub fn new(
        billing: Arc<Billing>,
        organizations: Arc<Organizations>,
        assessments: Arc<Assessments>,
        email_repo: Arc<PgEmailRepository>,
        config: &AppConfig,
    ) -> Self {
        Self {
            billing,
            organizations,
            assessments,
            email_repo,
            from_address: config.email.from_address.clone(),
            from_name: config.email.from_name.clone(),
            renewal_interval: config.worker.renewal_interval,
            alerts_interval: config.worker.alerts_interval,
            cleanup_interval: config.worker.cleanup_interval,
            batch_size: config.worker.batch_size,
        }
    }

    /// First tick of each interval fires at startup; every sweep is
    /// idempotent so the early run is harmless.
    pub async fn run(self) {
        info!(
            "⏰ Scheduler started (renewals {}s, alerts {}s, cleanup {}s)",
            self.renewal_interval, self.alerts_interval, self.cleanup_interval
        );

        let mut renewals = tokio::time::interval(Duration::from_secs(self.renewal_interval));
        let mut alerts = tokio::time::interval(Duration::from_secs(self.alerts_interval));
        let mut cleanup = tokio::time::interval(Duration::from_secs(self.cleanup_interval));

        loop {
            tokio::select! {
                _ = renewals.tick() => self.process_renewals().await,
                _ = alerts.tick() => self.process_alerts().await,
                _ = cleanup.tick() => self.process_cleanup().await,
            }
        }
    }

    async fn process_renewals(&self) {
        match self.billing.process_due_renewals().await {
            Ok(outcome) => {
                if outcome.renewed + outcome.cancelled + outcome.marked_past_due > 0 {
                    info!(
                        "✅ Renewal sweep: {} renewed, {} cancelled, {} past due",
                        outcome.renewed, outcome.cancelled, outcome.marked_past_due
                    );
                }
            }
            Err(e) => error!("❌ Renewal sweep failed: {}", e),
        }

        match self.billing.reset_lapsed_meters().await {
            Ok(0) => {}
            Ok(reset) => info!("✅ Reset {} lapsed usage meter(s)", reset),
            Err(e) => error!("❌ Usage meter reset failed: {}", e),
        }
    }

    async fn process_alerts(&self) {
        match self.billing.queue_usage_alerts().await {
            Ok(0) => {}
            Ok(queued) => info!("✅ Queued {} usage alert(s)", queued),
            Err(e) => error!("❌ Usage alert sweep failed: {}", e),
        }

        if let Err(e) = self.dispatch_notifications().await {
            error!("❌ Notification dispatch failed: {}", e);
        }
    }

    async fn process_cleanup(&self) {
        match self.organizations.purge_expired_invites().await {
            Ok(0) => {}
            Ok(purged) => info!("✅ Purged {} expired invite(s)", purged),
            Err(e) => error!("❌ Invite cleanup failed: {}", e),
        }

        match self.assessments.expire_overdue().await {
            Ok(0) => {}
            Ok(expired) => info!("✅ Expired {} overdue assessment instance(s)", expired),
            Err(e) => error!("❌ Assessment expiry sweep failed: {}", e),
        }
    }

    /// Turns due billing notifications into outbox rows. The subject and
    /// message arrive already rendered, so no template pass here.
    async fn dispatch_notifications(&self) -> Result<()> {
        let due = self.billing.due_notifications(self.batch_size).await?;

        let mut dispatched = 0;
        for mut notification in due {
            let outbox_row = EmailMessage::queued(
                Some(notification.organization_id),
                None,
                notification.recipient_email.clone(),
                self.from_address.clone(),
                self.from_name.clone(),
                notification.subject.clone(),
                notification.message.clone(),
                notification.message.clone(),
                json!({ "notification_type": notification.notification_type.as_str() }),
            );

            match self.email_repo.enqueue(&outbox_row).await {
                Ok(_) => {
                    notification.mark_sent();
                    dispatched += 1;
                }
                Err(e) => {
                    warn!("Queuing notification {} failed: {}", notification.id, e);
                    notification.mark_failed(e.to_string());
                }
            }

            if let Err(e) = self.billing.update_notification(&notification).await {
                warn!("Persisting notification {} failed: {}", notification.id, e);
            }
        }

        if dispatched > 0 {
            info!("✅ Dispatched {} billing notification(s)", dispatched);
        }
        Ok(())
    }
}
