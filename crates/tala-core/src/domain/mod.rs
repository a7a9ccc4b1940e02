//! Domain entities

pub mod assessment;
pub mod audit;
pub mod billing;
pub mod email;
pub mod instance;
pub mod membership;
pub mod organization;
pub mod pdi;
pub mod recruiting;
pub mod report;
pub mod scoring;
pub mod tenant;
pub mod user;
pub mod workforce;

pub use assessment::*;
pub use audit::*;
pub use billing::*;
pub use email::*;
pub use instance::*;
pub use membership::*;
pub use organization::*;
pub use pdi::*;
pub use recruiting::*;
pub use report::*;
pub use scoring::*;
pub use tenant::*;
pub use user::*;
pub use workforce::*;
