//! SQLite catalog adapter.
//!
//! # Module Structure
//! - `connection`: Connection string handling and read-only pool creation
//!
//! # SQLite-Specific Features
//! - Uses `sqlite_master` to list views
//! - Uses `PRAGMA table_info` for view columns
//! - Values of every storage class are rendered as text; BLOBs as base64
//! - Supports both file-based and in-memory databases

pub mod connection;


use super::CatalogAdapter;
use super::helpers::{self, RowExt};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::ViewSurveyorError;
use crate::models::{Column, DatabaseSnapshot, DatabaseType, View};
use crate::query::{PlaceholderStyle, PreparedQuery, ResultSet, StatementExecutor};
use crate::views::ColumnGatherer;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, SqlitePool, Statement};

/// SQLite catalog adapter.
pub struct SqliteAdapter {
    /// Connection pool (typically single connection for SQLite)
    pub pool: SqlitePool,
    /// Connection configuration
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for SqliteAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteAdapter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl StatementExecutor for SqliteAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<ResultSet> {
        let sql = query.render(PlaceholderStyle::Question);
        let mut statement = sqlx::query(&sql);
        for param in query.params() {
            statement = statement.bind(param.clone());
        }

        let rows = statement
            .fetch_all(&self.pool)
            .await
            .map_err(|e| helpers::execution_failed(&sql, e))?;

        let labels = match rows.first() {
            Some(row) => helpers::column_labels(row.columns()),
            None => {
                let prepared = (&self.pool)
                    .prepare(sql.as_str())
                    .await
                    .map_err(|e| helpers::execution_failed(&sql, e))?;
                helpers::column_labels(prepared.columns())
            }
        };

        helpers::result_set_from_rows(labels, &rows, decode_value)
    }
}

#[async_trait]
impl ColumnGatherer for SqliteAdapter {
    async fn gather_columns(&self, _snapshot: &DatabaseSnapshot, view: &mut View) -> Result<()> {
        let pragma = format!("PRAGMA table_info('{}')", view.name.replace('\'', "''"));

        let rows = sqlx::query(&pragma)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                ViewSurveyorError::collection_failed(
                    format!("Failed to collect columns for view '{}'", view.name),
                    e,
                )
            })?;

        let object = Some(view.name.as_str());
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let cid: i64 = row.get_field("cid", object)?;
            let name: String = row.get_field("name", object)?;
            let data_type: String = row.get_field("type", object)?;
            let notnull: i64 = row.get_field("notnull", object)?;
            let default_value: Option<String> = row.get_field("dflt_value", object)?;
            let pk: i64 = row.get_field("pk", object)?;

            columns.push(Column {
                name,
                data_type,
                is_nullable: notnull == 0 && pk == 0,
                is_primary_key: pk > 0,
                default_value,
                comment: None,
                ordinal_position: u32::try_from(cid + 1).unwrap_or(0),
            });
        }

        view.columns = columns;
        Ok(())
    }
}

#[async_trait]
impl CatalogAdapter for SqliteAdapter {
    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(ViewSurveyorError::connection_failed)?;

        if connectivity_result != 1 {
            return Err(ViewSurveyorError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        // Views are listed from sqlite_master, so it must be readable
        let view_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'view'")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    ViewSurveyorError::collection_failed("Cannot access sqlite_master", e)
                })?;

        tracing::debug!("SQLite connection ok; {} views visible", view_count);
        Ok(())
    }

    async fn list_views(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<View>> {
        let rows = sqlx::query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'view' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ViewSurveyorError::collection_failed("Failed to list views", e))?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get_field("name", Some("sqlite_master"))?;
            let mut view = View::new(name);
            view.schema = snapshot.schema.clone();
            views.push(view);
        }
        Ok(views)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }

    fn database_name(&self) -> String {
        self.config
            .database
            .clone()
            .unwrap_or_else(|| "main".to_string())
    }

    fn default_schema(&self) -> Option<String> {
        Some("main".to_string())
    }
}

/// Renders one cell as text according to its runtime storage class.
fn decode_value(row: &SqliteRow, index: usize) -> Result<Option<String>> {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    match row.try_get::<Option<Vec<u8>>, _>(index) {
        Ok(v) => Ok(v.map(|bytes| {
            use base64::Engine;
            format!(
                "base64:{}",
                base64::engine::general_purpose::STANDARD.encode(&bytes)
            )
        })),
        Err(e) => {
            let label = row
                .columns()
                .get(index)
                .map(|c| sqlx::Column::name(c).to_string())
                .unwrap_or_else(|| index.to_string());
            Err(ViewSurveyorError::parse_field(&label, None, e))
        }
    }
}
