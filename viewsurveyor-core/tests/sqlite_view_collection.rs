//! SQLite view collection integration tests.
//!
//! This test suite covers:
//! - Full scans driven by the built-in SQLite templates
//! - Definition lookups through the legacy `text` label and multi-row results
//! - Comment harvesting from custom comment tables
//! - Comment query failures downgraded to warnings
//!
//! Note: SQLite tests use in-memory databases, so no containers needed.

#![cfg(feature = "sqlite")]

use viewsurveyor_core::{
    CatalogAdapter, DatabaseType, DialectTemplates, Result, ViewSurveyorError,
    adapters::sqlite::SqliteAdapter, scan_views,
};
use sqlx::sqlite::SqlitePoolOptions;

/// Helper function to create an adapter over a populated in-memory database
async fn create_adapter(statements: &[&str]) -> SqliteAdapter {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }

    SqliteAdapter::from_pool(pool, ":memory:")
}

const BASE_SCHEMA: &[&str] = &[
    "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL, region TEXT)",
    "CREATE TABLE orders (id INTEGER PRIMARY KEY, customer_id INTEGER, total REAL)",
    "CREATE VIEW customer_totals AS \
     SELECT c.id, c.name, SUM(o.total) AS total FROM customers c \
     JOIN orders o ON o.customer_id = c.id GROUP BY c.id, c.name",
    "CREATE VIEW emea_customers AS SELECT id, name FROM customers WHERE region = 'EMEA'",
];

/// Comment storage the custom templates below read from
const COMMENT_TABLES: &[&str] = &[
    "CREATE TABLE view_notes (view_name TEXT, comments TEXT)",
    "CREATE TABLE column_notes (table_name TEXT, column_name TEXT, comments TEXT)",
    "INSERT INTO view_notes VALUES ('customer_totals', 'Revenue per customer')",
    "INSERT INTO view_notes VALUES ('dropped_view', 'Nobody home')",
    "INSERT INTO column_notes VALUES ('CUSTOMER_TOTALS', 'TOTAL', ' Sum of order totals ')",
    "INSERT INTO column_notes VALUES ('emea_customers', 'no_such_column', 'ignored')",
];

fn with_comment_tables() -> Vec<&'static str> {
    BASE_SCHEMA.iter().chain(COMMENT_TABLES).copied().collect()
}

// =============================================================================
// Built-in Templates
// =============================================================================

/// Test a scan with the built-in SQLite templates
#[tokio::test]
async fn test_sqlite_builtin_scan() -> Result<()> {
    let adapter = create_adapter(BASE_SCHEMA).await;
    let templates = DialectTemplates::builtin(DatabaseType::SQLite);
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    let summary = scan_views(&adapter, &templates, &mut snapshot, views).await?;

    assert_eq!(summary.views_registered, 2);
    assert_eq!(summary.view_comments, 0);
    assert_eq!(summary.column_comments, 0);
    assert_eq!(summary.deprecation_warnings, 0);

    let view = snapshot
        .view("emea_customers")
        .expect("view should be registered");
    assert_eq!(
        view.definition.as_deref(),
        Some("CREATE VIEW emea_customers AS SELECT id, name FROM customers WHERE region = 'EMEA'")
    );
    let columns: Vec<&str> = view.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["id", "name"]);

    let totals = snapshot.view("customer_totals").expect("registered");
    assert!(
        totals
            .definition
            .as_deref()
            .is_some_and(|sql| sql.starts_with("CREATE VIEW customer_totals"))
    );
    assert_eq!(totals.columns.len(), 3);
    Ok(())
}

// =============================================================================
// Definition Lookups
// =============================================================================

/// Test the legacy `text` label with a definition split across rows
#[tokio::test]
async fn test_sqlite_legacy_text_fragments() -> Result<()> {
    let adapter = create_adapter(BASE_SCHEMA).await;
    let templates = DialectTemplates {
        select_view_sql: Some(
            "SELECT 'SELECT id, ' AS text WHERE :view IS NOT NULL \
             UNION ALL SELECT 'name FROM customers' AS text"
                .to_string(),
        ),
        ..Default::default()
    };
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    let summary = scan_views(&adapter, &templates, &mut snapshot, views).await?;

    assert_eq!(summary.deprecation_warnings, 2);
    for view in snapshot.views() {
        assert_eq!(
            view.definition.as_deref(),
            Some("SELECT id, name FROM customers")
        );
    }
    Ok(())
}

/// Test that a definition lookup with no matching rows yields empty text
#[tokio::test]
async fn test_sqlite_definition_without_rows() -> Result<()> {
    let adapter = create_adapter(BASE_SCHEMA).await;
    let templates = DialectTemplates {
        select_view_sql: Some(
            "SELECT sql AS view_definition FROM sqlite_master \
             WHERE type = 'table' AND name = :view"
                .to_string(),
        ),
        ..Default::default()
    };
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    scan_views(&adapter, &templates, &mut snapshot, views).await?;

    assert!(
        snapshot
            .views()
            .all(|view| view.definition.as_deref() == Some(""))
    );
    Ok(())
}

/// Test that a broken definition template aborts the scan with its SQL
#[tokio::test]
async fn test_sqlite_definition_failure_aborts() -> Result<()> {
    let adapter = create_adapter(BASE_SCHEMA).await;
    let sql = "SELECT text FROM user_views WHERE view_name = :view";
    let templates = DialectTemplates {
        select_view_sql: Some(sql.to_string()),
        ..Default::default()
    };
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    let error = scan_views(&adapter, &templates, &mut snapshot, views)
        .await
        .expect_err("scan should fail");

    match error {
        ViewSurveyorError::Query { sql: failed, .. } => assert_eq!(failed, sql),
        other => panic!("expected query error, got {other:?}"),
    }
    assert_eq!(snapshot.view_count(), 0);
    Ok(())
}

// =============================================================================
// Comment Harvesting
// =============================================================================

/// Test comments attached from custom comment tables
#[tokio::test]
async fn test_sqlite_comment_harvesting() -> Result<()> {
    let adapter = create_adapter(&with_comment_tables()).await;
    let templates = DialectTemplates::builtin(DatabaseType::SQLite).merge(DialectTemplates {
        select_view_comments_sql: Some("SELECT view_name, comments FROM view_notes".to_string()),
        select_view_column_comments_sql: Some(
            "SELECT table_name, column_name, comments FROM column_notes".to_string(),
        ),
        ..Default::default()
    });
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    let summary = scan_views(&adapter, &templates, &mut snapshot, views).await?;

    assert_eq!(summary.view_comments, 1);
    assert_eq!(summary.column_comments, 1);
    assert_eq!(snapshot.view_count(), 2);
    assert!(snapshot.view("dropped_view").is_none());

    let totals = snapshot.view("customer_totals").expect("registered");
    assert_eq!(totals.comment.as_deref(), Some("Revenue per customer"));
    assert_eq!(
        totals.column("total").and_then(|c| c.comment.as_deref()),
        Some("Sum of order totals")
    );

    let emea = snapshot.view("emea_customers").expect("registered");
    assert_eq!(emea.comment, None);
    assert!(emea.columns.iter().all(|c| c.comment.is_none()));
    assert!(snapshot.collection_metadata.warnings.is_empty());
    Ok(())
}

/// Test that a failing comment query is recorded and the scan completes
#[tokio::test]
async fn test_sqlite_comment_failure_is_warning() -> Result<()> {
    let adapter = create_adapter(BASE_SCHEMA).await;
    let templates = DialectTemplates::builtin(DatabaseType::SQLite).merge(DialectTemplates {
        select_view_comments_sql: Some("SELECT view_name, comments FROM missing_notes".to_string()),
        ..Default::default()
    });
    let mut snapshot = adapter.new_snapshot(None);

    let views = adapter.list_views(&snapshot).await?;
    let summary = scan_views(&adapter, &templates, &mut snapshot, views).await?;

    assert_eq!(summary.views_registered, 2);
    assert_eq!(summary.view_comments, 0);

    let warnings = &snapshot.collection_metadata.warnings;
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("missing_notes"));
    Ok(())
}
