//! Core data models for view catalog representation.
//!
//! A [`DatabaseSnapshot`] owns the registry of processed views for one scan.
//! Views and their columns are annotated in place by the definition resolver
//! and the comment harvester; both look entities up by name, ignoring case.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
    Oracle,
}

impl DatabaseType {
    /// All known database types, in display order.
    pub const ALL: [DatabaseType; 4] = [
        DatabaseType::PostgreSQL,
        DatabaseType::MySQL,
        DatabaseType::SQLite,
        DatabaseType::Oracle,
    ];
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
            DatabaseType::Oracle => write!(f, "Oracle"),
        }
    }
}

/// View column information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    pub ordinal_position: u32,
}

impl Column {
    /// Creates a nullable, non-key column with no comment.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            is_primary_key: false,
            default_value: None,
            comment: None,
            ordinal_position: 0,
        }
    }
}

/// Database view information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub schema: Option<String>,
    /// SQL text of the view as reported by the catalog.
    ///
    /// `None` until definition resolution produced text; `Some("")` when the
    /// lookup ran and returned nothing.
    pub definition: Option<String>,
    pub columns: Vec<Column>,
    pub comment: Option<String>,
}

impl View {
    /// Creates a view with no columns, definition, or comment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            definition: None,
            columns: Vec::new(),
            comment: None,
        }
    }

    /// Sets the owning schema.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Finds a column by name, ignoring case.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Finds a column by name for in-place annotation, ignoring case.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// Collection metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub collected_at: chrono::DateTime<chrono::Utc>,
    pub collection_duration_ms: u64,
    pub collector_version: String,
    pub warnings: Vec<String>,
}

/// One scan of a database's views.
///
/// The snapshot is the single owner of the view registry. Callers pass it by
/// `&mut` through each step of a scan, so only one writer exists at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub format_version: String,
    pub name: String,
    pub catalog: Option<String>,
    pub schema: Option<String>,
    pub database_type: DatabaseType,
    views: BTreeMap<String, View>,
    pub collection_metadata: CollectionMetadata,
}

fn registry_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl DatabaseSnapshot {
    /// Creates an empty snapshot for the named database.
    pub fn new(name: impl Into<String>, database_type: DatabaseType) -> Self {
        Self {
            format_version: "1.0".to_string(),
            name: name.into(),
            catalog: None,
            schema: None,
            database_type,
            views: BTreeMap::new(),
            collection_metadata: CollectionMetadata {
                collected_at: chrono::Utc::now(),
                collection_duration_ms: 0,
                collector_version: env!("CARGO_PKG_VERSION").to_string(),
                warnings: Vec::new(),
            },
        }
    }

    /// Sets the schema used for `:schema`/`:owner` placeholders.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the catalog used for the `:catalog` placeholder.
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Inserts or replaces a view under its name.
    pub fn register_view(&mut self, view: View) {
        self.views.insert(registry_key(&view.name), view);
    }

    /// Looks up a registered view by name, ignoring case.
    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.get(&registry_key(name))
    }

    /// Looks up a registered view for in-place annotation, ignoring case.
    pub fn view_mut(&mut self, name: &str) -> Option<&mut View> {
        self.views.get_mut(&registry_key(name))
    }

    /// Iterates registered views ordered by name.
    pub fn views(&self) -> impl Iterator<Item = &View> {
        self.views.values()
    }

    /// Number of registered views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Adds a warning to the collection metadata
    pub fn add_warning(&mut self, warning: String) {
        self.collection_metadata.warnings.push(warning);
    }
}
