//! Background job loops

pub mod mailer;
pub mod scheduler;
pub mod webhooks;

pub use mailer::Mailer;
pub use scheduler::Scheduler;
pub use webhooks::WebhookProcessor;
