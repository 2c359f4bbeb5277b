//! PostgreSQL catalog adapter.
//!
//! # Module Structure
//! - `connection`: Connection string parsing and pool creation
//!
//! # Security Guarantees
//! - Sessions run with `default_transaction_read_only = on` by default
//! - Connection strings are sanitized in error messages

mod connection;

use super::CatalogAdapter;
use super::helpers::{self, RowExt};
use crate::Result;
use crate::config::ConnectionConfig;
use crate::error::ViewSurveyorError;
use crate::models::{Column, DatabaseSnapshot, DatabaseType, View};
use crate::query::{PlaceholderStyle, PreparedQuery, ResultSet, StatementExecutor};
use crate::views::ColumnGatherer;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Executor, PgPool, Row, Statement};

/// Schema scanned when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL catalog adapter with connection pooling
pub struct PostgresAdapter {
    pub pool: PgPool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

#[async_trait]
impl StatementExecutor for PostgresAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<ResultSet> {
        let sql = query.render(PlaceholderStyle::Numbered);
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
impl ColumnGatherer for PostgresAdapter {
    async fn gather_columns(&self, snapshot: &DatabaseSnapshot, view: &mut View) -> Result<()> {
        let schema = view
            .schema
            .clone()
            .or_else(|| snapshot.schema.clone())
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        let rows = sqlx::query(
            r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                is_nullable::text AS is_nullable,
                column_default::text AS column_default,
                ordinal_position::int4 AS ordinal_position
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(&schema)
        .bind(&view.name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            ViewSurveyorError::collection_failed(
                format!("Failed to collect columns for view '{}.{}'", schema, view.name),
                e,
            )
        })?;

        let object = Some(view.name.as_str());
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get_field("column_name", object)?;
            let data_type: String = row.get_field("data_type", object)?;
            let is_nullable: String = row.get_field("is_nullable", object)?;
            let default_value: Option<String> = row.get_field("column_default", object)?;
            let ordinal_position: i32 = row.get_field("ordinal_position", object)?;

            columns.push(Column {
                name,
                data_type,
                is_nullable: is_nullable == "YES",
                is_primary_key: false,
                default_value,
                comment: None,
                ordinal_position: u32::try_from(ordinal_position).unwrap_or(0),
            });
        }

        view.columns = columns;
        Ok(())
    }
}

#[async_trait]
impl CatalogAdapter for PostgresAdapter {
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

        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM information_schema.views")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                ViewSurveyorError::collection_failed("Cannot access information_schema.views", e)
            })?;

        Ok(())
    }

    async fn list_views(&self, snapshot: &DatabaseSnapshot) -> Result<Vec<View>> {
        let schema = snapshot.schema.as_deref().unwrap_or(DEFAULT_SCHEMA);

        let rows = sqlx::query(
            "SELECT table_name::text AS view_name \
             FROM information_schema.views \
             WHERE table_schema = $1 \
             ORDER BY table_name",
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to enumerate views: {}", e);
            ViewSurveyorError::collection_failed("Failed to enumerate database views", e)
        })?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.get_field("view_name", Some("information_schema.views"))?;
            views.push(View::new(name).with_schema(schema));
        }
        Ok(views)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }

    fn database_name(&self) -> String {
        self.config
            .database
            .clone()
            .unwrap_or_else(|| "postgres".to_string())
    }

    fn default_schema(&self) -> Option<String> {
        Some(DEFAULT_SCHEMA.to_string())
    }

    fn default_catalog(&self) -> Option<String> {
        Some(self.database_name())
    }
}

/// Renders one cell as text; non-text types are tried in turn.
fn decode_value(row: &PgRow, index: usize) -> Result<Option<String>> {
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return Ok(v.map(|n| n.to_string()));
    }
    match row.try_get::<Option<bool>, _>(index) {
        Ok(v) => Ok(v.map(|b| b.to_string())),
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
