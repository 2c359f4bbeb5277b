//! Configuration types.
//!
//! - `ConnectionConfig`: pool settings for the sqlx adapters
//! - `DialectTemplates`: per-dialect catalog query templates
//!
//! # Security
//! Neither struct holds hosts, user names, or passwords.

mod connection;
mod dialect;

pub use connection::{ConnectionConfig, MAX_POOL_CONNECTIONS};
pub use dialect::{DialectTemplates, TemplateKey};
