//! Helper utilities for the sqlx adapters.
//!
//! Catalog results are handed to the core as text, so every adapter funnels
//! its rows through [`result_set_from_rows`] with a driver-specific decoder.

use crate::Result;
use crate::error::ViewSurveyorError;
use crate::query::ResultSet;
use sqlx::{Column, ColumnIndex, Row};

/// Extension trait for extracting typed values from database rows
/// with consistent error handling.
///
/// # Example
/// ```rust,ignore
/// use viewsurveyor_core::adapters::helpers::RowExt;
///
/// let name: String = row.get_field("name", Some("active_users"))?;
/// ```
pub trait RowExt: Row {
    /// Extracts a typed field from the row with proper error context.
    fn get_field<'r, T>(&'r self, field_name: &str, object_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>;
}

impl<R> RowExt for R
where
    R: Row,
    for<'a> &'a str: ColumnIndex<R>,
{
    fn get_field<'r, T>(&'r self, field_name: &str, object_context: Option<&str>) -> Result<T>
    where
        T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>,
    {
        self.try_get(field_name)
            .map_err(|e| ViewSurveyorError::parse_field(field_name, object_context, e))
    }
}

/// Labels of a row or statement's columns, in result order.
pub fn column_labels<C: Column>(columns: &[C]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

/// Builds a [`ResultSet`] by decoding every cell with `decode`.
///
/// # Errors
/// Returns the first decoding error.
pub fn result_set_from_rows<R, F>(labels: Vec<String>, rows: &[R], decode: F) -> Result<ResultSet>
where
    R: Row,
    F: Fn(&R, usize) -> Result<Option<String>>,
{
    let mut set = ResultSet::new(labels);
    let width = set.labels().len();
    for row in rows {
        let values = (0..width)
            .map(|index| decode(row, index))
            .collect::<Result<Vec<_>>>()?;
        set.push_row(values)?;
    }
    Ok(set)
}

/// Wraps a driver failure raised while running a catalog query.
pub fn execution_failed(sql: &str, error: sqlx::Error) -> ViewSurveyorError {
    tracing::debug!("Catalog query failed: {}", sql);
    ViewSurveyorError::collection_failed("Failed to execute catalog query", error)
}
