//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or `sqlite://./relative.db`
//! - Bare file path ending in `.db`, `.sqlite`, or `.sqlite3`
//! - In-memory: `sqlite::memory:` or `:memory:`
//!
//! File databases are opened read-only by default.

use super::SqliteAdapter;
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::ViewSurveyorError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

impl SqliteAdapter {
    /// Creates a new SQLite adapter from a connection string.
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Database cannot be opened
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = parse_sqlite_connection_config(connection_string)?;
        let pool = create_sqlite_connection(connection_string, &config).await?;
        Ok(Self { pool, config })
    }

    /// Creates a new SQLite adapter with custom configuration.
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        validate_sqlite_connection_string(connection_string)?;
        let pool = create_sqlite_connection(connection_string, &config).await?;
        Ok(Self { pool, config })
    }

    /// Wraps an already open pool, e.g. a shared in-memory database.
    pub fn from_pool(pool: SqlitePool, database_name: &str) -> Self {
        let config = ConnectionConfig::for_database(database_name).with_max_connections(1);
        Self { pool, config }
    }

    /// Closes the connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Parses SQLite connection string to extract configuration parameters.
pub fn parse_sqlite_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
    validate_sqlite_connection_string(connection_string)?;

    Ok(ConnectionConfig::for_database(extract_database_name(connection_string))
        .with_max_connections(1))
}

/// Validates SQLite connection string format.
///
/// # Errors
/// Returns error if connection string is invalid
pub fn validate_sqlite_connection_string(connection_string: &str) -> Result<()> {
    if connection_string == ":memory:"
        || connection_string.ends_with(".db")
        || connection_string.ends_with(".sqlite")
        || connection_string.ends_with(".sqlite3")
    {
        return Ok(());
    }

    if connection_string.starts_with("sqlite:") {
        if connection_string.contains(":memory:") || connection_string.contains("mode=memory") {
            return Ok(());
        }
        if let Ok(url) = url::Url::parse(connection_string) {
            if url.scheme() != "sqlite" {
                return Err(ViewSurveyorError::configuration(
                    "Connection string must use sqlite:// scheme",
                ));
            }
            return Ok(());
        }
        if connection_string.starts_with("sqlite://") {
            return Ok(());
        }
    }

    Err(ViewSurveyorError::configuration(
        "Invalid SQLite connection string format: expected sqlite:// URL, file path, or :memory:",
    ))
}

fn extract_database_name(connection_string: &str) -> String {
    if connection_string.contains(":memory:") {
        return ":memory:".to_string();
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    match path.rsplit('/').next() {
        Some(filename) if !filename.is_empty() => filename.to_string(),
        _ => "main".to_string(),
    }
}

async fn create_sqlite_connection(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<SqlitePool> {
    let normalized = normalize_connection_string(connection_string);

    let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
        ViewSurveyorError::configuration(format!("Invalid SQLite connection string: {}", e))
    })?;

    if config.read_only {
        options = options.read_only(true);
    }

    SqlitePoolOptions::new()
        .max_connections(config.max_connections.max(1))
        .acquire_timeout(config.connect_timeout)
        .connect_with(options)
        .await
        .map_err(|e| ViewSurveyorError::collection_failed("Failed to open SQLite database", e))
}

fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }
    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }
    format!("sqlite://{}", connection_string)
}
