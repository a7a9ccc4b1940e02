// ============================================================================
// Tala Worker - Webhook Event Processor
// File: crates/tala-worker/src/jobs/webhooks.rs
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use tala_core::domain::WebhookStatus;

use crate::worker::Billing;

/// Replays pending payment-provider events against the billing service.
pub struct WebhookProcessor {
    billing: Arc<Billing>,
    poll_interval: u64,
    batch_size: i64,
}

impl WebhookProcessor {
    pub fn new(billing: Arc<Billing>, poll_interval: u64, batch_size: i64) -> Self {
        Self {
            billing,
            poll_interval,
            batch_size,
        }
    }

    pub async fn run(self) {
        info!(
            "🔁 Webhook processor started (polling every {}s)",
            self.poll_interval
        );

        let mut ticker = tokio::time::interval(Duration::from_secs(self.poll_interval));
        loop {
            ticker.tick().await;

            match self.process_pending().await {
                Ok(0) => {}
                Ok(handled) => info!("✅ Processed {} webhook event(s)", handled),
                Err(e) => error!("❌ Webhook sweep failed: {}", e),
            }
        }
    }

    /// Each event is marked PROCESSED, IGNORED or FAILED by the billing
    /// service itself; FAILED events come back on later sweeps until the
    /// retry cap.
    async fn process_pending(&self) -> Result<usize> {
        let pending = self.billing.pending_webhook_events(self.batch_size).await?;

        let mut handled = 0;
        for event in pending {
            let event_id = event.id;
            let event_type = event.event_type.clone();

            match self.billing.process_webhook_event(event).await {
                Ok(processed) => {
                    handled += 1;
                    if processed.status == WebhookStatus::Failed {
                        warn!(
                            "Webhook event {} ({}) failed: {}",
                            event_id, event_type, processed.error_message
                        );
                    }
                }
                Err(e) => {
                    warn!("Webhook event {} ({}) errored: {}", event_id, event_type, e);
                }
            }
        }

        Ok(handled)
    }
}
