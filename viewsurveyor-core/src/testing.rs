//! In-memory collaborators for unit tests.

use crate::error::ViewSurveyorError;
use crate::models::{Column, DatabaseSnapshot, View};
use crate::query::{PreparedQuery, ResultSet, StatementExecutor};
use crate::views::ColumnGatherer;
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Builds a result set from string literals.
pub(crate) fn result_set(labels: &[&str], rows: &[&[Option<&str>]]) -> ResultSet {
    let mut set = ResultSet::new(labels.iter().map(|l| (*l).to_string()).collect());
    for row in rows {
        set.push_row(row.iter().map(|v| v.map(str::to_string)).collect())
            .unwrap();
    }
    set
}

enum Canned {
    Rows(ResultSet),
    Failure(String),
}

/// Executor answering by template text, recording every query it receives.
#[derive(Default)]
pub(crate) struct MockExecutor {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<PreparedQuery>>,
}

impl MockExecutor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rows(mut self, template: &str, rows: ResultSet) -> Self {
        self.responses
            .insert(template.to_string(), Canned::Rows(rows));
        self
    }

    pub(crate) fn with_failure(mut self, template: &str, message: &str) -> Self {
        self.responses
            .insert(template.to_string(), Canned::Failure(message.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<PreparedQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatementExecutor for MockExecutor {
    async fn query(&self, query: &PreparedQuery) -> Result<ResultSet> {
        self.calls.lock().unwrap().push(query.clone());
        match self.responses.get(query.template()) {
            Some(Canned::Rows(rows)) => Ok(rows.clone()),
            Some(Canned::Failure(message)) => Err(ViewSurveyorError::collection_failed(
                "Failed to execute catalog query",
                std::io::Error::other(message.clone()),
            )),
            None => Err(ViewSurveyorError::collection_failed(
                "Failed to execute catalog query",
                std::io::Error::other(format!("no response for '{}'", query.template())),
            )),
        }
    }
}

#[async_trait]
impl ColumnGatherer for MockExecutor {
    async fn gather_columns(&self, _snapshot: &DatabaseSnapshot, _view: &mut View) -> Result<()> {
        Ok(())
    }
}

/// Column gatherer serving fixed column lists, wrapping an executor.
pub(crate) struct MockAdapter {
    pub(crate) executor: MockExecutor,
    columns: HashMap<String, Vec<Column>>,
}

impl MockAdapter {
    pub(crate) fn new(executor: MockExecutor) -> Self {
        Self {
            executor,
            columns: HashMap::new(),
        }
    }

    pub(crate) fn with_columns(mut self, view: &str, columns: &[&str]) -> Self {
        let columns = columns
            .iter()
            .zip(1..)
            .map(|(name, position)| Column {
                ordinal_position: position,
                ..Column::new(*name, "TEXT")
            })
            .collect();
        self.columns.insert(view.to_string(), columns);
        self
    }
}

#[async_trait]
impl StatementExecutor for MockAdapter {
    async fn query(&self, query: &PreparedQuery) -> Result<ResultSet> {
        self.executor.query(query).await
    }
}

#[async_trait]
impl ColumnGatherer for MockAdapter {
    async fn gather_columns(&self, _snapshot: &DatabaseSnapshot, view: &mut View) -> Result<()> {
        view.columns = self.columns.get(&view.name).cloned().unwrap_or_default();
        Ok(())
    }
}
