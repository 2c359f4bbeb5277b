//! Bulk harvesting of view and view-column comments.
//!
//! Comments are enrichment data: a failing comment query is logged and
//! recorded as a collection warning, never returned to the caller.

use crate::error::{ViewSurveyorError, error_chain};
use crate::models::DatabaseSnapshot;
use crate::query::{PreparedQuery, ResultSet, StatementExecutor};
use crate::Result;

/// Entity a comment query annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentTarget {
    /// The view itself
    View,
    /// A column of the view, named by `column_name`
    Column,
}

impl std::fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentTarget::View => write!(f, "view"),
            CommentTarget::Column => write!(f, "view column"),
        }
    }
}

#[derive(Debug)]
struct CommentRow {
    view_name: String,
    column_name: Option<String>,
    comment: Option<String>,
}

/// Attaches view comments from a bulk query.
///
/// Returns the number of views annotated. Without a template this is a no-op.
pub async fn harvest_view_comments<E>(
    executor: &E,
    snapshot: &mut DatabaseSnapshot,
    template: Option<&str>,
) -> usize
where
    E: StatementExecutor + ?Sized,
{
    harvest(executor, snapshot, template, CommentTarget::View).await
}

/// Attaches view column comments from a bulk query.
///
/// Returns the number of columns annotated. Without a template this is a no-op.
pub async fn harvest_view_column_comments<E>(
    executor: &E,
    snapshot: &mut DatabaseSnapshot,
    template: Option<&str>,
) -> usize
where
    E: StatementExecutor + ?Sized,
{
    harvest(executor, snapshot, template, CommentTarget::Column).await
}

async fn harvest<E>(
    executor: &E,
    snapshot: &mut DatabaseSnapshot,
    template: Option<&str>,
    target: CommentTarget,
) -> usize
where
    E: StatementExecutor + ?Sized,
{
    let Some(template) = template else {
        tracing::trace!("No {} comment template configured", target);
        return 0;
    };

    match fetch_rows(executor, snapshot, template, target).await {
        Ok(rows) => {
            let annotated = apply(snapshot, rows, target);
            tracing::debug!("Attached {} {} comments", annotated, target);
            annotated
        }
        Err(e) => {
            let warning = format!(
                "Failed to retrieve {} comments using SQL '{}': {}",
                target,
                template,
                error_chain(&e)
            );
            tracing::warn!("{}", warning);
            snapshot.add_warning(warning);
            0
        }
    }
}

async fn fetch_rows<E>(
    executor: &E,
    snapshot: &DatabaseSnapshot,
    template: &str,
    target: CommentTarget,
) -> Result<Vec<CommentRow>>
where
    E: StatementExecutor + ?Sized,
{
    let tag = |e: ViewSurveyorError| ViewSurveyorError::query_failed(template, e);

    let query = PreparedQuery::bind(template, snapshot, None).map_err(tag)?;
    let result = executor.query(&query).await.map_err(tag)?;
    read_rows(&result, target).map_err(tag)
}

fn read_rows(result: &ResultSet, target: CommentTarget) -> Result<Vec<CommentRow>> {
    let mut rows = Vec::with_capacity(result.len());
    for row in result.rows() {
        let view_name = match row.get_if_present("view_name") {
            Some(name) => Some(name),
            None if result.has_column("view_name") && !result.has_column("table_name") => None,
            None => row.get("table_name")?,
        };
        let comment = row.get("comments")?;
        let column_name = match target {
            CommentTarget::View => None,
            CommentTarget::Column => row.get("column_name")?,
        };

        // A row without a subject name cannot match anything
        let Some(view_name) = view_name else {
            continue;
        };
        rows.push(CommentRow {
            view_name: view_name.to_string(),
            column_name: column_name.map(str::to_string),
            comment: normalize(comment),
        });
    }
    Ok(rows)
}

fn apply(snapshot: &mut DatabaseSnapshot, rows: Vec<CommentRow>, target: CommentTarget) -> usize {
    let mut annotated = 0;
    for row in rows {
        let Some(view) = snapshot.view_mut(&row.view_name) else {
            tracing::trace!("Skipping comment for unknown view '{}'", row.view_name);
            continue;
        };

        match target {
            CommentTarget::View => {
                view.comment = row.comment;
                annotated += 1;
            }
            CommentTarget::Column => {
                let Some(column_name) = row.column_name.as_deref() else {
                    continue;
                };
                match view.column_mut(column_name) {
                    Some(column) => {
                        column.comment = row.comment;
                        annotated += 1;
                    }
                    None => tracing::trace!(
                        "Skipping comment for unknown column '{}.{}'",
                        row.view_name,
                        column_name
                    ),
                }
            }
        }
    }
    annotated
}

fn normalize(comment: Option<&str>) -> Option<String> {
    comment
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
