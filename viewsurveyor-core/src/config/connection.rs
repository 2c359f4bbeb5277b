//! Pool settings for the sqlx adapters.
//!
//! Only what the adapters act on lives here. Host, user, and password stay in
//! the connection URL, which is handed to the driver untouched.

use crate::Result;
use crate::error::ViewSurveyorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on pool size accepted from a URL or a caller.
pub const MAX_POOL_CONNECTIONS: u32 = 100;

/// Settings applied when opening a catalog pool.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use viewsurveyor_core::config::ConnectionConfig;
///
/// let config = ConnectionConfig::for_database("inventory")
///     .with_max_connections(2)
///     .with_connect_timeout(Duration::from_secs(5));
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.database.as_deref(), Some("inventory"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database the snapshot is named after
    pub database: Option<String>,
    /// Pool acquire timeout
    pub connect_timeout: Duration,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Open sessions read-only
    pub read_only: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            database: None,
            connect_timeout: Duration::from_secs(30),
            max_connections: 5,
            read_only: true,
        }
    }
}

impl ConnectionConfig {
    /// Default settings for the named database.
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            ..Default::default()
        }
    }

    /// Sets the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Sets the pool acquire timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Checks the pool settings.
    ///
    /// # Errors
    /// Returns a configuration error for an empty or oversized pool, or a zero
    /// timeout.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(ViewSurveyorError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > MAX_POOL_CONNECTIONS {
            return Err(ViewSurveyorError::configuration(format!(
                "max_connections should not exceed {}",
                MAX_POOL_CONNECTIONS
            )));
        }

        if self.connect_timeout.is_zero() {
            return Err(ViewSurveyorError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
