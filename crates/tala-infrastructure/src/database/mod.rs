//! Database module (PostgreSQL adapters)

pub mod connection;
pub mod postgres;

pub use connection::{create_pool, run_migrations, tenant_tx};
pub use postgres::{
    PgAssessmentRepository, PgAuditRepository, PgBillingRepository, PgEmailRepository,
    PgOrganizationRepository, PgPdiRepository, PgRecruitingRepository, PgReportRepository,
    PgUserRepository, PgWorkforceRepository,
};
