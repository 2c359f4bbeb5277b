//! Catalog adapters and the factory that selects one from a connection URL.
//!
//! An adapter is the concrete collaborator behind the core's trait seams: it
//! executes bound templates, gathers view columns, and lists the views a scan
//! should process. Drivers are feature-gated.
//!
//! # Module Structure
//! - `helpers`: Row decoding shared by the sqlx adapters
//! - `sqlite`: SQLite via `sqlite_master` and `PRAGMA table_info`
//! - `postgres`: PostgreSQL via `information_schema`

use crate::Result;
use crate::error::ViewSurveyorError;
use crate::models::{DatabaseSnapshot, DatabaseType, View};
use crate::query::StatementExecutor;
use crate::views::ColumnGatherer;
use async_trait::async_trait;

/// A database connection able to drive a full view scan.
///
/// # Object Safety
/// This trait is object-safe; [`create_adapter`] returns
/// `Box<dyn CatalogAdapter>`, which can be handed straight to
/// [`crate::scan::scan_views`].
#[async_trait]
pub trait CatalogAdapter: StatementExecutor + ColumnGatherer {
    /// Tests the database connection without collecting anything.
    ///
    /// # Errors
    /// Returns error if the connection fails or the catalog is not readable
    async fn test_connection(&self) -> Result<()>;

    /// Lists the views to scan, in catalog order.
    ///
    /// Listed views carry their name and schema; columns, definition, and
    /// comments are filled in by the scan.
    async fn list_views(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<View>>;

    /// Returns the database type this adapter handles.
    fn database_type(&self) -> DatabaseType;

    /// Name of the connected database.
    fn database_name(&self) -> String;

    /// Schema scanned when the caller does not choose one.
    fn default_schema(&self) -> Option<String>;

    /// Catalog bound to the `:catalog` placeholder.
    fn default_catalog(&self) -> Option<String> {
        None
    }

    /// Creates an empty snapshot for this database.
    fn new_snapshot(&self, schema: Option<&str>) -> DatabaseSnapshot {
        let mut snapshot = DatabaseSnapshot::new(self.database_name(), self.database_type());
        if let Some(schema) = schema.map(str::to_string).or_else(|| self.default_schema()) {
            snapshot = snapshot.with_schema(schema);
        }
        if let Some(catalog) = self.default_catalog() {
            snapshot = snapshot.with_catalog(catalog);
        }
        snapshot
    }
}

/// Factory function to create catalog adapters based on connection string.
///
/// # Security
/// - Sanitizes connection string in all error messages
/// - Opens connections read-only by default
///
/// # Errors
/// Returns error if:
/// - Connection string format is invalid
/// - Database type has no adapter in this build
/// - The connection cannot be opened
pub async fn create_adapter(connection_string: &str) -> Result<Box<dyn CatalogAdapter>> {
    let database_type = detect_database_type(connection_string)?;
    tracing::debug!(
        "Creating {} adapter for {}",
        database_type,
        crate::error::redact_database_url(connection_string)
    );

    match database_type {
        #[cfg(feature = "postgresql")]
        DatabaseType::PostgreSQL => {
            let adapter = postgres::PostgresAdapter::new(connection_string).await?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "postgresql"))]
        DatabaseType::PostgreSQL => Err(ViewSurveyorError::unsupported_feature(
            "PostgreSQL adapter",
            "this build (compile with --features postgresql)",
        )),
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => {
            let adapter = sqlite::SqliteAdapter::new(connection_string).await?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "sqlite"))]
        DatabaseType::SQLite => Err(ViewSurveyorError::unsupported_feature(
            "SQLite adapter",
            "this build (compile with --features sqlite)",
        )),
        DatabaseType::MySQL | DatabaseType::Oracle => Err(ViewSurveyorError::unsupported_feature(
            format!("{} adapter", database_type),
            "this build (supply a custom StatementExecutor to use its templates)",
        )),
    }
}

/// Detects database type from connection string.
///
/// # Errors
/// Returns error if connection string format is unrecognized
pub fn detect_database_type(connection_string: &str) -> Result<DatabaseType> {
    if connection_string.starts_with("postgres://")
        || connection_string.starts_with("postgresql://")
    {
        Ok(DatabaseType::PostgreSQL)
    } else if connection_string.starts_with("mysql://") {
        Ok(DatabaseType::MySQL)
    } else if connection_string.starts_with("oracle://") {
        Ok(DatabaseType::Oracle)
    } else if connection_string.starts_with("sqlite:")
        || connection_string == ":memory:"
        || connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
    {
        Ok(DatabaseType::SQLite)
    } else {
        Err(ViewSurveyorError::configuration(
            "Unrecognized database connection string format",
        ))
    }
}

#[cfg(any(feature = "sqlite", feature = "postgresql"))]
pub mod helpers;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;
