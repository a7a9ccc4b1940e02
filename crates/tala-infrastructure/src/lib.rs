//! # Tala Infrastructure
//!
//! Database and cache implementations (adapters).

pub mod cache;
pub mod database;

pub use cache::SlugCache;
pub use database::{
    create_pool, run_migrations, tenant_tx, PgAssessmentRepository, PgAuditRepository,
    PgBillingRepository, PgEmailRepository, PgOrganizationRepository, PgPdiRepository,
    PgRecruitingRepository, PgReportRepository, PgUserRepository, PgWorkforceRepository,
};
