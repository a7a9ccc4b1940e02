//! # Tala Security
//!
//! Security utilities: JWT, password hashing, PII field encryption,
//! random tokens and webhook signature checks.

pub mod cipher;
pub mod jwt;
pub mod password;
pub mod token;
pub mod webhook;

pub use cipher::FieldCipher;
pub use jwt::JwtService;
pub use password::PasswordService;
pub use token::generate_token;
