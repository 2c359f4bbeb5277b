//! PostgreSQL connection pool management and validation.

use super::PostgresAdapter;
use crate::Result;
use crate::config::{ConnectionConfig, MAX_POOL_CONNECTIONS};
use crate::error::{ViewSurveyorError, redact_database_url};
use sqlx::PgPool;
use std::time::Duration;
use url::Url;

impl PostgresAdapter {
    /// Creates a new PostgreSQL adapter with connection pooling
    ///
    /// # Errors
    /// Returns error if:
    /// - Connection string format is invalid
    /// - Pool configuration is invalid
    pub async fn new(connection_string: &str) -> Result<Self> {
        let config = Self::parse_connection_config(connection_string)?;
        let pool = Self::create_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Creates a new PostgreSQL adapter with custom configuration
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        Self::validate_connection_string(connection_string)?;
        let pool = Self::create_connection_pool(connection_string, &config)?;
        Ok(Self { pool, config })
    }

    /// Closes the connection pool gracefully
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Parses connection string to extract configuration parameters
    ///
    /// The database name comes from the URL path. Recognized query
    /// parameters: `connect_timeout` (seconds, at most 300) and
    /// `pool_max_conns` (at most 100). Host, user, and password are left to
    /// the driver.
    ///
    /// # Errors
    /// Returns error if connection string is malformed
    pub fn parse_connection_config(connection_string: &str) -> Result<ConnectionConfig> {
        Self::validate_connection_string(connection_string)?;

        let url = Url::parse(connection_string).map_err(|e| {
            ViewSurveyorError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        let database = url.path().trim_start_matches('/');
        let mut config = if database.is_empty() {
            ConnectionConfig::default()
        } else {
            ConnectionConfig::for_database(database)
        };

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "connect_timeout" => {
                    if let Ok(timeout_secs) = value.parse::<u64>()
                        && timeout_secs > 0
                        && timeout_secs <= 300
                    {
                        config.connect_timeout = Duration::from_secs(timeout_secs);
                    }
                }
                "pool_max_conns" => {
                    if let Ok(max_conns) = value.parse::<u32>()
                        && max_conns > 0
                        && max_conns <= MAX_POOL_CONNECTIONS
                    {
                        config.max_connections = max_conns;
                    }
                }
                _ => {}
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates connection string format
    ///
    /// # Errors
    /// Returns error if connection string is invalid
    pub fn validate_connection_string(connection_string: &str) -> Result<()> {
        let url = Url::parse(connection_string).map_err(|e| {
            ViewSurveyorError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(ViewSurveyorError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        if url.host_str().is_none() {
            return Err(ViewSurveyorError::configuration(
                "Connection string must specify a host",
            ));
        }

        Ok(())
    }

    /// Creates a lazily connecting pool whose sessions are read-only.
    pub(crate) fn create_connection_pool(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<PgPool> {
        use sqlx::Executor;

        Self::validate_connection_string(connection_string)?;
        let read_only = config.read_only;

        sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections.min(MAX_POOL_CONNECTIONS))
            .acquire_timeout(config.connect_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    let app_name = format!("viewsurveyor-collect-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;

                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                ViewSurveyorError::collection_failed(
                    format!(
                        "Failed to create PostgreSQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })
    }
}
