//! Driver-agnostic catalog query execution.
//!
//! Templates are bound into a [`PreparedQuery`] and handed to a
//! [`StatementExecutor`], which runs the statement to completion and returns a
//! fully materialized [`ResultSet`]. No cursor outlives the call, so the
//! resolver and harvester never manage driver resources themselves.

use crate::error::ViewSurveyorError;
use crate::models::DatabaseSnapshot;
use crate::Result;
use async_trait::async_trait;

/// Executes bound catalog queries.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Runs the query, fetches every row, and releases the cursor.
    ///
    /// # Errors
    /// Returns an error if the statement cannot be prepared or executed, or
    /// if a value cannot be read as text.
    async fn query(&self, query: &PreparedQuery) -> Result<ResultSet>;
}

/// Parameter marker syntax expected by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` markers (SQLite, MySQL)
    Question,
    /// `$1`, `$2`, ... markers (PostgreSQL)
    Numbered,
}

/// A template with its named placeholders replaced by positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    template: String,
    fragments: Vec<String>,
    params: Vec<String>,
}

impl PreparedQuery {
    /// Binds the named placeholders of `template`.
    ///
    /// | Placeholder | Value |
    /// |---|---|
    /// | `:view`, `:table` | `object_name` |
    /// | `:schema`, `:owner` | snapshot schema |
    /// | `:catalog` | snapshot catalog |
    /// | `:dbname` | snapshot name |
    ///
    /// Quoted text, comments, and `::` casts are copied through untouched.
    ///
    /// # Errors
    /// Returns a configuration error for an unknown placeholder or one whose
    /// value is unavailable.
    pub fn bind(
        template: &str,
        snapshot: &DatabaseSnapshot,
        object_name: Option<&str>,
    ) -> Result<Self> {
        let bytes = template.as_bytes();
        let mut fragments = Vec::new();
        let mut params = Vec::new();
        let mut fragment_start = 0;
        let mut quote: Option<u8> = None;
        let mut i = 0;

        while i < bytes.len() {
            let byte = bytes[i];
            if let Some(open) = quote {
                if byte == open {
                    quote = None;
                }
                i += 1;
                continue;
            }

            match byte {
                b'\'' | b'"' => {
                    quote = Some(byte);
                    i += 1;
                }
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    i = bytes[i..]
                        .iter()
                        .position(|c| *c == b'\n')
                        .map_or(bytes.len(), |end| i + end + 1);
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = template[i + 2..]
                        .find("*/")
                        .map_or(bytes.len(), |end| i + 2 + end + 2);
                }
                b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
                b':' if bytes
                    .get(i + 1)
                    .is_some_and(|c| c.is_ascii_alphabetic() || *c == b'_') =>
                {
                    let name_start = i + 1;
                    let mut name_end = name_start;
                    while bytes
                        .get(name_end)
                        .is_some_and(|c| c.is_ascii_alphanumeric() || *c == b'_')
                    {
                        name_end += 1;
                    }

                    let name = &template[name_start..name_end];
                    params.push(placeholder_value(name, template, snapshot, object_name)?);
                    fragments.push(template[fragment_start..i].to_string());
                    fragment_start = name_end;
                    i = name_end;
                }
                _ => i += 1,
            }
        }
        fragments.push(template[fragment_start..].to_string());

        Ok(Self {
            template: template.to_string(),
            fragments,
            params,
        })
    }

    /// The template as configured, used to tag errors and log lines.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Positional parameter values, in placeholder order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// SQL text with driver-specific parameter markers.
    pub fn render(&self, style: PlaceholderStyle) -> String {
        let mut sql = String::with_capacity(self.template.len());
        for (position, fragment) in self.fragments.iter().enumerate() {
            if position > 0 {
                match style {
                    PlaceholderStyle::Question => sql.push('?'),
                    PlaceholderStyle::Numbered => {
                        sql.push('$');
                        sql.push_str(&position.to_string());
                    }
                }
            }
            sql.push_str(fragment);
        }
        sql
    }
}

fn placeholder_value(
    name: &str,
    template: &str,
    snapshot: &DatabaseSnapshot,
    object_name: Option<&str>,
) -> Result<String> {
    let value = match name.to_ascii_lowercase().as_str() {
        "view" | "table" => object_name.map(str::to_string),
        "schema" | "owner" => snapshot.schema.clone(),
        "catalog" => snapshot.catalog.clone(),
        "dbname" => Some(snapshot.name.clone()),
        _ => {
            return Err(ViewSurveyorError::configuration(format!(
                "Unexpected named parameter ':{}' found in SQL '{}'",
                name, template
            )));
        }
    };

    value.ok_or_else(|| {
        ViewSurveyorError::configuration(format!(
            "No value available for parameter ':{}' in SQL '{}'",
            name, template
        ))
    })
}

/// A fully fetched result: column labels plus rows of text values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    labels: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    /// Creates an empty result with the given column labels.
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    /// Returns a configuration error if the row width differs from the
    /// number of labels.
    pub fn push_row(&mut self, values: Vec<Option<String>>) -> Result<()> {
        if values.len() != self.labels.len() {
            return Err(ViewSurveyorError::configuration(format!(
                "Row has {} values but the result set has {} columns",
                values.len(),
                self.labels.len()
            )));
        }
        self.rows.push(values);
        Ok(())
    }

    /// Column labels in result order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the first column whose label matches, ignoring case.
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.labels
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(label))
    }

    /// Whether any column carries the label, ignoring case.
    pub fn has_column(&self, label: &str) -> bool {
        self.column_index(label).is_some()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates rows in result order.
    pub fn rows(&self) -> impl Iterator<Item = ResultRow<'_>> {
        self.rows.iter().map(move |values| ResultRow {
            set: self,
            values: values.as_slice(),
        })
    }
}

/// One row of a [`ResultSet`].
#[derive(Debug, Clone, Copy)]
pub struct ResultRow<'a> {
    set: &'a ResultSet,
    values: &'a [Option<String>],
}

impl<'a> ResultRow<'a> {
    /// Reads a value by label; `Ok(None)` means SQL `NULL`.
    ///
    /// # Errors
    /// Returns [`ViewSurveyorError::MissingColumn`] if no column has the label.
    pub fn get(&self, label: &str) -> Result<Option<&'a str>> {
        let index = self
            .set
            .column_index(label)
            .ok_or_else(|| ViewSurveyorError::missing_column(label))?;
        Ok(self.values.get(index).and_then(|v| v.as_deref()))
    }

    /// Reads a value by label, treating a missing column like `NULL`.
    pub fn get_if_present(&self, label: &str) -> Option<&'a str> {
        self.get(label).ok().flatten()
    }
}
