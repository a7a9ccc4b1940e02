// ============================================================================
// Tala Worker - Orchestrator
// File: crates/tala-worker/src/worker.rs
// ============================================================================
//! Wires the Postgres repositories into services and runs the job loops
//! until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use tala_core::services::{
    AssessmentService, BillingService, EmailService, OrganizationService, PdiService,
};
use tala_infrastructure::{
    PgAssessmentRepository, PgBillingRepository, PgEmailRepository, PgOrganizationRepository,
    PgPdiRepository, PgUserRepository,
};
use tala_security::FieldCipher;
use tala_shared::config::AppConfig;

use crate::jobs::{Mailer, Scheduler, WebhookProcessor};

pub type Billing = BillingService<PgBillingRepository, PgOrganizationRepository>;
pub type Organizations =
    OrganizationService<PgOrganizationRepository, PgUserRepository, PgEmailRepository>;
pub type Assessments = AssessmentService<
    PgAssessmentRepository,
    PgBillingRepository,
    PgOrganizationRepository,
    PgPdiRepository,
    PgUserRepository,
    PgEmailRepository,
>;

pub struct Worker {
    mailer: Mailer,
    webhooks: WebhookProcessor,
    scheduler: Scheduler,
}

impl Worker {
    pub fn new(config: AppConfig, pool: PgPool) -> Result<Self> {
        let cipher = Arc::new(FieldCipher::new(&config.security.field_key)?);

        let user_repo = Arc::new(PgUserRepository::new(pool.clone()));
        let org_repo = Arc::new(PgOrganizationRepository::new(pool.clone(), cipher));
        let assessment_repo = Arc::new(PgAssessmentRepository::new(pool.clone()));
        let pdi_repo = Arc::new(PgPdiRepository::new(pool.clone()));
        let billing_repo = Arc::new(PgBillingRepository::new(pool.clone()));
        let email_repo = Arc::new(PgEmailRepository::new(pool));

        let emails = Arc::new(EmailService::new(
            email_repo.clone(),
            config.email.from_address.clone(),
            config.email.from_name.clone(),
            config.app.public_url.clone(),
        ));
        let billing = Arc::new(BillingService::new(billing_repo, org_repo.clone()));
        let pdi = Arc::new(PdiService::new(
            pdi_repo,
            user_repo.clone(),
            emails.clone(),
        ));
        let organizations = Arc::new(OrganizationService::new(
            org_repo.clone(),
            user_repo.clone(),
            emails.clone(),
        ));
        let assessments = Arc::new(AssessmentService::new(
            assessment_repo,
            org_repo,
            user_repo,
            billing.clone(),
            pdi,
            emails,
        ));

        let mailer = Mailer::new(
            email_repo.clone(),
            &config.email,
            config.worker.mailer_poll_interval,
            config.worker.batch_size,
        )?;
        let webhooks = WebhookProcessor::new(
            billing.clone(),
            config.worker.webhook_poll_interval,
            config.worker.batch_size,
        );
        let scheduler = Scheduler::new(
            billing,
            organizations,
            assessments,
            email_repo,
            &config,
        );

        Ok(Self {
            mailer,
            webhooks,
            scheduler,
        })
    }

    /// Spawns the job loops and parks until ctrl-c. Loops run forever and
    /// absorb their own per-item failures.
    pub async fn run(self) -> Result<()> {
        info!("🎯 Worker started");

        tokio::spawn(self.mailer.run());
        tokio::spawn(self.webhooks.run());
        tokio::spawn(self.scheduler.run());

        tokio::signal::ctrl_c().await?;
        info!("👋 Shutdown signal received, stopping worker");
        Ok(())
    }
}
