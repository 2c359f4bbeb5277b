//! View definition resolution.
//!
//! Catalogs report view SQL in one of two shapes: a `view_definition` column,
//! or the older `text` column. Either may split the definition across several
//! rows, which are joined back together in result order.

use crate::error::ViewSurveyorError;
use crate::models::{DatabaseSnapshot, View};
use crate::query::{PreparedQuery, ResultSet, StatementExecutor};
use crate::Result;

/// Number of times the legacy `text` column warning is logged per resolver.
pub const DEPRECATION_WARNING_LIMIT: u32 = 10;

/// Column a definition is read from, chosen once per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionSource {
    /// The `view_definition` column
    ViewDefinition,
    /// The deprecated `text` column
    LegacyText,
}

impl DefinitionSource {
    /// Picks `view_definition` when the result exposes it, `text` otherwise.
    pub fn select(result: &ResultSet) -> Self {
        if result.has_column("view_definition") {
            DefinitionSource::ViewDefinition
        } else {
            DefinitionSource::LegacyText
        }
    }

    /// Column label read by this source.
    pub fn label(self) -> &'static str {
        match self {
            DefinitionSource::ViewDefinition => "view_definition",
            DefinitionSource::LegacyText => "text",
        }
    }
}

/// Fetches and reassembles view definitions.
///
/// The resolver counts legacy-column warnings for its own lifetime; keep one
/// instance per run so the cap applies to the whole scan.
#[derive(Debug, Default)]
pub struct DefinitionResolver {
    deprecation_warnings: u32,
}

impl DefinitionResolver {
    /// Creates a resolver that has not warned yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of legacy-column warnings logged so far.
    pub fn deprecation_warnings(&self) -> u32 {
        self.deprecation_warnings
    }

    /// Resolves the definition of `view` using `template`.
    ///
    /// Without a template this is a no-op. Otherwise the view's definition is
    /// set to the concatenated fragments. That is the empty string when the
    /// query returns no rows, or when its result has neither a
    /// `view_definition` nor a `text` column.
    ///
    /// # Errors
    /// Returns [`ViewSurveyorError::Query`] carrying the template text if the
    /// template cannot be bound or the query fails. The view is left unchanged
    /// in that case.
    pub async fn resolve<E>(
        &mut self,
        executor: &E,
        snapshot: &DatabaseSnapshot,
        view: &mut View,
        template: Option<&str>,
    ) -> Result<()>
    where
        E: StatementExecutor + ?Sized,
    {
        let Some(template) = template else {
            tracing::trace!(
                "No definition template for {}; leaving '{}' as is",
                snapshot.database_type,
                view.name
            );
            return Ok(());
        };

        let definition = self
            .fetch(executor, snapshot, &view.name, template)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to resolve definition of view '{}' using SQL '{}'",
                    view.name,
                    template
                );
                e
            })?;

        tracing::debug!(
            "Resolved definition of view '{}' ({} bytes)",
            view.name,
            definition.len()
        );
        view.definition = Some(definition);
        Ok(())
    }

    async fn fetch<E>(
        &mut self,
        executor: &E,
        snapshot: &DatabaseSnapshot,
        view_name: &str,
        template: &str,
    ) -> Result<String>
    where
        E: StatementExecutor + ?Sized,
    {
        let tag = |e: ViewSurveyorError| ViewSurveyorError::query_failed(template, e);

        let query = PreparedQuery::bind(template, snapshot, Some(view_name)).map_err(tag)?;
        let result = executor.query(&query).await.map_err(tag)?;
        Ok(self.concatenate(&result))
    }

    /// Joins the fragments of the selected column. A result exposing neither
    /// label contributes nothing.
    fn concatenate(&mut self, result: &ResultSet) -> String {
        let source = DefinitionSource::select(result);
        if source == DefinitionSource::LegacyText {
            self.warn_legacy_column();
        }

        let mut definition = String::new();
        for fragment in result.rows().filter_map(|row| row.get_if_present(source.label())) {
            definition.push_str(fragment);
        }
        definition
    }

    fn warn_legacy_column(&mut self) {
        if self.deprecation_warnings < DEPRECATION_WARNING_LIMIT {
            tracing::warn!(
                "Column label 'text' is deprecated and will be removed; \
                 label the definition column 'view_definition' instead"
            );
            self.deprecation_warnings += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DatabaseType;
    use crate::testing::{MockExecutor, result_set};

    const VIEW_SQL: &str = "SELECT view_definition FROM catalog_views WHERE name = :view";
    const TEXT_SQL: &str = "SELECT text FROM user_views WHERE view_name = :view";

    fn snapshot() -> DatabaseSnapshot {
        DatabaseSnapshot::new("db", DatabaseType::Oracle).with_schema("APP")
    }

    #[tokio::test]
    async fn test_no_template_is_noop() {
        let executor = MockExecutor::new();
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, None)
            .await
            .unwrap();

        assert_eq!(view.definition, None);
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_concatenates_view_definition_rows() {
        let executor = MockExecutor::new().with_rows(
            VIEW_SQL,
            result_set(
                &["view_definition"],
                &[&[Some("CREATE VIEW v AS ")], &[Some("SELECT 1")]],
            ),
        );
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(VIEW_SQL))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some("CREATE VIEW v AS SELECT 1"));
        assert_eq!(resolver.deprecation_warnings(), 0);

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params(), ["v"]);
    }

    #[tokio::test]
    async fn test_zero_rows_yield_empty_definition() {
        let executor =
            MockExecutor::new().with_rows(VIEW_SQL, result_set(&["view_definition"], &[]));
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(VIEW_SQL))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_label_match_ignores_case() {
        let executor = MockExecutor::new().with_rows(
            VIEW_SQL,
            result_set(&["VIEW_DEFINITION"], &[&[Some("SELECT 2")]]),
        );
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(VIEW_SQL))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some("SELECT 2"));
        assert_eq!(resolver.deprecation_warnings(), 0);
    }

    #[tokio::test]
    async fn test_legacy_text_column_is_concatenated() {
        let executor = MockExecutor::new().with_rows(
            TEXT_SQL,
            result_set(
                &["TEXT"],
                &[&[Some("SELECT a, ")], &[None], &[Some("b FROM t")]],
            ),
        );
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(TEXT_SQL))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some("SELECT a, b FROM t"));
        assert_eq!(resolver.deprecation_warnings(), 1);
    }

    #[tokio::test]
    async fn test_view_definition_preferred_over_text() {
        let executor = MockExecutor::new().with_rows(
            VIEW_SQL,
            result_set(
                &["text", "view_definition"],
                &[&[Some("legacy"), Some("SELECT 1")]],
            ),
        );
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(VIEW_SQL))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some("SELECT 1"));
        assert_eq!(resolver.deprecation_warnings(), 0);
    }

    #[tokio::test]
    async fn test_legacy_warning_is_capped() {
        let executor =
            MockExecutor::new().with_rows(TEXT_SQL, result_set(&["text"], &[&[Some("SELECT 1")]]));
        let mut resolver = DefinitionResolver::new();

        for i in 0..25 {
            let mut view = View::new(format!("v{}", i));
            resolver
                .resolve(&executor, &snapshot(), &mut view, Some(TEXT_SQL))
                .await
                .unwrap();
            assert_eq!(view.definition.as_deref(), Some("SELECT 1"));
        }

        assert_eq!(resolver.deprecation_warnings(), DEPRECATION_WARNING_LIMIT);
        assert_eq!(executor.call_count(), 25);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_legacy_warning_lines_stop_at_limit() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let executor =
            MockExecutor::new().with_rows(TEXT_SQL, result_set(&["text"], &[&[Some("SELECT 1")]]));
        let mut resolver = DefinitionResolver::new();
        for i in 0..25 {
            let mut view = View::new(format!("v{}", i));
            resolver
                .resolve(&executor, &snapshot(), &mut view, Some(TEXT_SQL))
                .await
                .unwrap();
        }

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let warnings: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("'text' is deprecated"))
            .collect();
        assert_eq!(warnings.len(), DEPRECATION_WARNING_LIMIT as usize);
        assert!(warnings.iter().all(|line| line.contains("WARN")));
    }

    #[tokio::test]
    async fn test_execution_failure_carries_sql() {
        let executor = MockExecutor::new().with_failure(VIEW_SQL, "relation does not exist");
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        let error = resolver
            .resolve(&executor, &snapshot(), &mut view, Some(VIEW_SQL))
            .await
            .unwrap_err();

        match error {
            ViewSurveyorError::Query { sql, .. } => assert_eq!(sql, VIEW_SQL),
            other => panic!("expected query error, got {other:?}"),
        }
        assert_eq!(view.definition, None);
    }

    #[tokio::test]
    async fn test_malformed_template_is_query_error() {
        let template = "SELECT view_definition FROM v WHERE name = :nonsense";
        let executor = MockExecutor::new();
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        let error = resolver
            .resolve(&executor, &snapshot(), &mut view, Some(template))
            .await
            .unwrap_err();

        assert!(matches!(error, ViewSurveyorError::Query { ref sql, .. } if sql == template));
        assert_eq!(executor.call_count(), 0);
        assert_eq!(view.definition, None);
    }

    #[tokio::test]
    async fn test_unrecognized_shape_yields_empty_definition() {
        let template = "SELECT body FROM defs WHERE name = :view";
        let executor = MockExecutor::new()
            .with_rows(template, result_set(&["body"], &[&[Some("SELECT 1")]]));
        let mut resolver = DefinitionResolver::new();
        let mut view = View::new("v");

        resolver
            .resolve(&executor, &snapshot(), &mut view, Some(template))
            .await
            .unwrap();

        assert_eq!(view.definition.as_deref(), Some(""));
        assert_eq!(resolver.deprecation_warnings(), 1);
    }

    #[test]
    fn test_source_selection() {
        assert_eq!(
            DefinitionSource::select(&result_set(&["text", "view_definition"], &[])),
            DefinitionSource::ViewDefinition
        );
        assert_eq!(
            DefinitionSource::select(&result_set(&["text"], &[])),
            DefinitionSource::LegacyText
        );
        assert_eq!(DefinitionSource::LegacyText.label(), "text");
    }
}
