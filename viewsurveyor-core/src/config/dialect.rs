//! Dialect-specific catalog query templates.
//!
//! Each database dialect supplies up to three templates, keyed by logical
//! operation name. A missing or blank template means the dialect does not
//! support that operation, and the corresponding step becomes a no-op.
//!
//! Built-in templates exist for every [`DatabaseType`]. An override file in
//! JSON uses the same camelCase keys:
//!
//! ```json
//! {
//!   "selectViewSql": "SELECT text FROM user_views WHERE view_name = :view",
//!   "selectViewCommentsSql": ""
//! }
//! ```
//!
//! Keys present in the file replace the built-in template; an empty string
//! disables the operation.

use crate::error::ViewSurveyorError;
use crate::models::DatabaseType;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logical catalog operations that are driven by a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Per-view definition lookup, parameterized by the view name
    ViewDefinition,
    /// Bulk lookup of view comments
    ViewComments,
    /// Bulk lookup of view column comments
    ViewColumnComments,
}

impl TemplateKey {
    /// All template keys, in scan order.
    pub const ALL: [TemplateKey; 3] = [
        TemplateKey::ViewDefinition,
        TemplateKey::ViewComments,
        TemplateKey::ViewColumnComments,
    ];

    /// Configuration key of the template.
    pub fn property_name(self) -> &'static str {
        match self {
            TemplateKey::ViewDefinition => "selectViewSql",
            TemplateKey::ViewComments => "selectViewCommentsSql",
            TemplateKey::ViewColumnComments => "selectViewColumnCommentsSql",
        }
    }
}

impl std::fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property_name())
    }
}

/// Catalog query templates for one dialect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DialectTemplates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_view_sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_view_comments_sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_view_column_comments_sql: Option<String>,
}

impl DialectTemplates {
    /// Built-in templates for a database type.
    ///
    /// Every built-in definition template exposes a `view_definition` column.
    pub fn builtin(database_type: DatabaseType) -> Self {
        match database_type {
            DatabaseType::PostgreSQL => Self {
                select_view_sql: Some(
                    "SELECT definition AS view_definition \
                     FROM pg_views \
                     WHERE schemaname = :schema AND viewname = :view"
                        .to_string(),
                ),
                select_view_comments_sql: Some(
                    "SELECT c.relname::text AS view_name, \
                            obj_description(c.oid, 'pg_class') AS comments \
                     FROM pg_class c \
                     JOIN pg_namespace n ON n.oid = c.relnamespace \
                     WHERE c.relkind = 'v' AND n.nspname = :schema"
                        .to_string(),
                ),
                select_view_column_comments_sql: Some(
                    "SELECT c.relname::text AS view_name, \
                            a.attname::text AS column_name, \
                            col_description(c.oid, a.attnum) AS comments \
                     FROM pg_class c \
                     JOIN pg_namespace n ON n.oid = c.relnamespace \
                     JOIN pg_attribute a ON a.attrelid = c.oid \
                     WHERE c.relkind = 'v' AND n.nspname = :schema \
                     AND a.attnum > 0 AND NOT a.attisdropped"
                        .to_string(),
                ),
            },
            DatabaseType::MySQL => Self {
                select_view_sql: Some(
                    "SELECT view_definition \
                     FROM information_schema.views \
                     WHERE table_schema = :schema AND table_name = :view"
                        .to_string(),
                ),
                // MySQL views carry no comment of their own
                select_view_comments_sql: None,
                select_view_column_comments_sql: Some(
                    "SELECT c.table_name, c.column_name, c.column_comment AS comments \
                     FROM information_schema.columns c \
                     JOIN information_schema.views v \
                       ON v.table_schema = c.table_schema AND v.table_name = c.table_name \
                     WHERE c.table_schema = :schema"
                        .to_string(),
                ),
            },
            DatabaseType::SQLite => Self {
                select_view_sql: Some(
                    "SELECT sql AS view_definition \
                     FROM sqlite_master \
                     WHERE type = 'view' AND name = :view"
                        .to_string(),
                ),
                select_view_comments_sql: None,
                select_view_column_comments_sql: None,
            },
            DatabaseType::Oracle => Self {
                select_view_sql: Some(
                    "SELECT text AS view_definition \
                     FROM all_views \
                     WHERE owner = :owner AND view_name = :view"
                        .to_string(),
                ),
                select_view_comments_sql: Some(
                    "SELECT table_name AS view_name, comments \
                     FROM all_tab_comments \
                     WHERE owner = :owner AND table_type = 'VIEW'"
                        .to_string(),
                ),
                select_view_column_comments_sql: Some(
                    "SELECT table_name, column_name, comments \
                     FROM all_col_comments \
                     WHERE owner = :owner"
                        .to_string(),
                ),
            },
        }
    }

    /// Returns the template for an operation, or `None` when unsupported.
    ///
    /// Blank templates count as unsupported.
    pub fn get(&self, key: TemplateKey) -> Option<&str> {
        let template = match key {
            TemplateKey::ViewDefinition => &self.select_view_sql,
            TemplateKey::ViewComments => &self.select_view_comments_sql,
            TemplateKey::ViewColumnComments => &self.select_view_column_comments_sql,
        };
        template.as_deref().filter(|sql| !sql.trim().is_empty())
    }

    /// Whether the dialect supports an operation.
    pub fn supports(&self, key: TemplateKey) -> bool {
        self.get(key).is_some()
    }

    /// Replaces every template that `overrides` sets, keeping the rest.
    pub fn merge(mut self, overrides: DialectTemplates) -> Self {
        if overrides.select_view_sql.is_some() {
            self.select_view_sql = overrides.select_view_sql;
        }
        if overrides.select_view_comments_sql.is_some() {
            self.select_view_comments_sql = overrides.select_view_comments_sql;
        }
        if overrides.select_view_column_comments_sql.is_some() {
            self.select_view_column_comments_sql = overrides.select_view_column_comments_sql;
        }
        self
    }

    /// Parses an override document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ViewSurveyorError::Serialization {
            context: "Failed to parse dialect template overrides".to_string(),
            source: e,
        })
    }

    /// Loads an override document from disk.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ViewSurveyorError::Io {
                context: format!("Failed to read templates from {}", path.display()),
                source: e,
            })?;
        tracing::debug!("Loaded dialect template overrides from {}", path.display());
        Self::from_json_str(&json)
    }
}
