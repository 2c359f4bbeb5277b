//! Core library for ViewSurveyor.
//!
//! ViewSurveyor reads a database's catalog and rebuilds a description of each
//! view: its columns, its SQL definition text, and the comments attached to
//! the view and its columns.
//!
//! # Architecture
//! - [`views::DefinitionResolver`] fetches definition text per view from a
//!   dialect template, accepting either a `view_definition` column or the
//!   deprecated `text` column, possibly split across rows.
//! - [`views::comments`] attaches view and column comments from bulk queries;
//!   its failures are logged, never propagated.
//! - [`models::DatabaseSnapshot`] owns the registry of processed views.
//! - [`scan::scan_views`] ties the steps together for a whole database.
//!
//! Query execution and column gathering sit behind the
//! [`query::StatementExecutor`] and [`views::ColumnGatherer`] traits; the
//! feature-gated [`adapters`] implement them with `sqlx`.
//!
//! # Security Guarantees
//! - No credentials stored or logged in any data structures
//! - Database sessions are opened read-only by default

pub mod adapters;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod scan;
pub mod views;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use adapters::{CatalogAdapter, create_adapter};
pub use config::{ConnectionConfig, DialectTemplates, TemplateKey};
pub use error::{Result, ViewSurveyorError};
pub use models::{CollectionMetadata, Column, DatabaseSnapshot, DatabaseType, View};
pub use query::{PreparedQuery, ResultSet, StatementExecutor};
pub use scan::{ScanSummary, scan_views};
pub use views::{ColumnGatherer, DefinitionResolver, ViewService};
