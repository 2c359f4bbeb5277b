//! Whole-database view scan.

use crate::config::DialectTemplates;
use crate::models::{DatabaseSnapshot, View};
use crate::query::StatementExecutor;
use crate::views::{ColumnGatherer, ViewService};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Counts reported at the end of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub views_registered: usize,
    pub view_comments: usize,
    pub column_comments: usize,
    pub deprecation_warnings: u32,
}

/// Processes `views` one at a time, then runs the two comment passes.
///
/// # Errors
/// Stops at the first view whose columns or definition cannot be collected.
/// Comment failures never abort the scan; they are recorded as snapshot
/// warnings instead.
pub async fn scan_views<A>(
    adapter: &A,
    templates: &DialectTemplates,
    snapshot: &mut DatabaseSnapshot,
    views: Vec<View>,
) -> Result<ScanSummary>
where
    A: StatementExecutor + ColumnGatherer + ?Sized,
{
    let started = Instant::now();
    let mut service = ViewService::new(adapter, templates);

    tracing::info!(
        "Scanning {} views in {} database '{}'",
        views.len(),
        snapshot.database_type,
        snapshot.name
    );

    let mut views_registered = 0;
    for view in views {
        service.gather_view_details(snapshot, view).await?;
        views_registered += 1;
    }

    let view_comments = service.gather_view_comments(snapshot).await;
    let column_comments = service.gather_view_column_comments(snapshot).await;

    let summary = ScanSummary {
        views_registered,
        view_comments,
        column_comments,
        deprecation_warnings: service.deprecation_warnings(),
    };

    snapshot.collection_metadata.collection_duration_ms =
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    tracing::info!(
        "Scan complete: {} views, {} view comments, {} column comments in {}ms",
        summary.views_registered,
        summary.view_comments,
        summary.column_comments,
        snapshot.collection_metadata.collection_duration_ms
    );
    Ok(summary)
}
