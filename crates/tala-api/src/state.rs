// ============================================================================
// Tala API - Application State
// File: crates/tala-api/src/state.rs
// ============================================================================
//! Shared state handed to every handler: config, pool, caches and the
//! domain services bound to the Postgres repositories.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use tala_core::services::{
    AssessmentService, AuditService, AuthService, BillingService, EmailService,
    OrganizationService, PdiService, RecruitingService, ReportService, WorkforceService,
};
use tala_infrastructure::{
    PgAssessmentRepository, PgAuditRepository, PgBillingRepository, PgEmailRepository,
    PgOrganizationRepository, PgPdiRepository, PgRecruitingRepository, PgReportRepository,
    PgUserRepository, PgWorkforceRepository, SlugCache,
};
use tala_security::cipher::CipherError;
use tala_security::{FieldCipher, JwtService};
use tala_shared::config::AppConfig;

pub type Auth = AuthService<PgUserRepository, PgEmailRepository>;
pub type Organizations =
    OrganizationService<PgOrganizationRepository, PgUserRepository, PgEmailRepository>;
pub type Workforce = WorkforceService<PgWorkforceRepository, PgOrganizationRepository>;
pub type Assessments = AssessmentService<
    PgAssessmentRepository,
    PgBillingRepository,
    PgOrganizationRepository,
    PgPdiRepository,
    PgUserRepository,
    PgEmailRepository,
>;
pub type Pdi = PdiService<PgPdiRepository, PgUserRepository, PgEmailRepository>;
pub type Recruiting = RecruitingService<PgRecruitingRepository, PgAssessmentRepository>;
pub type Billing = BillingService<PgBillingRepository, PgOrganizationRepository>;
pub type Reports = ReportService<PgReportRepository>;
pub type Emails = EmailService<PgEmailRepository>;
pub type Audit = AuditService<PgAuditRepository>;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: PgPool,
    pub jwt: Arc<JwtService>,
    pub slug_cache: Arc<SlugCache>,
    /// Direct repository handle for tenant resolution, which runs before
    /// any service-level scoping exists.
    pub org_repo: Arc<PgOrganizationRepository>,
    pub auth: Arc<Auth>,
    pub organizations: Arc<Organizations>,
    pub workforce: Arc<Workforce>,
    pub assessments: Arc<Assessments>,
    pub pdi: Arc<Pdi>,
    pub recruiting: Arc<Recruiting>,
    pub billing: Arc<Billing>,
    pub reports: Arc<Reports>,
    pub emails: Arc<Emails>,
    pub audit: Arc<Audit>,
}

impl AppState {
    /// Wires repositories and services onto the pool. Fails only when the
    /// configured field-encryption key is unusable.
    pub fn build(config: AppConfig, db: PgPool) -> Result<Self, CipherError> {
        let cipher = Arc::new(FieldCipher::new(&config.security.field_key)?);
        let jwt = JwtService::new(
            config.jwt.secret.clone(),
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        );

        let user_repo = Arc::new(PgUserRepository::new(db.clone()));
        let org_repo = Arc::new(PgOrganizationRepository::new(db.clone(), cipher.clone()));
        let workforce_repo = Arc::new(PgWorkforceRepository::new(db.clone(), cipher.clone()));
        let assessment_repo = Arc::new(PgAssessmentRepository::new(db.clone()));
        let pdi_repo = Arc::new(PgPdiRepository::new(db.clone()));
        let recruiting_repo = Arc::new(PgRecruitingRepository::new(db.clone(), cipher));
        let billing_repo = Arc::new(PgBillingRepository::new(db.clone()));
        let report_repo = Arc::new(PgReportRepository::new(db.clone()));
        let email_repo = Arc::new(PgEmailRepository::new(db.clone()));
        let audit_repo = Arc::new(PgAuditRepository::new(db.clone()));

        let emails = Arc::new(EmailService::new(
            email_repo,
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

        let slug_cache = Arc::new(SlugCache::new(
            Duration::from_secs(config.tenancy.slug_cache_ttl),
            Duration::from_secs(config.tenancy.slug_negative_cache_ttl),
        ));

        Ok(Self {
            jwt: Arc::new(jwt.clone()),
            slug_cache,
            org_repo: org_repo.clone(),
            auth: Arc::new(AuthService::new(user_repo.clone(), emails.clone(), jwt)),
            organizations: Arc::new(OrganizationService::new(
                org_repo.clone(),
                user_repo.clone(),
                emails.clone(),
            )),
            workforce: Arc::new(WorkforceService::new(workforce_repo, org_repo.clone())),
            assessments: Arc::new(AssessmentService::new(
                assessment_repo.clone(),
                org_repo,
                user_repo,
                billing.clone(),
                pdi.clone(),
                emails.clone(),
            )),
            pdi,
            recruiting: Arc::new(RecruitingService::new(recruiting_repo, assessment_repo)),
            billing,
            reports: Arc::new(ReportService::new(report_repo)),
            emails,
            audit: Arc::new(AuditService::new(audit_repo)),
            config,
            db,
        })
    }
}
