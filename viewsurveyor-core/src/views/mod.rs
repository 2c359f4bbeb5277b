//! Per-view processing: columns, definition, registration, and comments.

pub mod comments;
pub mod definition;

pub use comments::{CommentTarget, harvest_view_column_comments, harvest_view_comments};
pub use definition::{DEPRECATION_WARNING_LIMIT, DefinitionResolver, DefinitionSource};

use crate::config::{DialectTemplates, TemplateKey};
use crate::models::{DatabaseSnapshot, View};
use crate::query::StatementExecutor;
use crate::Result;
use async_trait::async_trait;

/// Populates the columns of a view from the catalog.
#[async_trait]
pub trait ColumnGatherer: Send + Sync {
    /// Fills `view.columns`, replacing whatever was there.
    ///
    /// # Errors
    /// Returns an error if the column metadata cannot be collected.
    async fn gather_columns(&self, snapshot: &DatabaseSnapshot, view: &mut View) -> Result<()>;
}

/// Drives views through column gathering, definition resolution, and
/// registration, then attaches comments in bulk.
///
/// One service owns one [`DefinitionResolver`], so the legacy-column warning
/// cap spans every view it processes.
pub struct ViewService<'a, A: ?Sized> {
    adapter: &'a A,
    templates: &'a DialectTemplates,
    resolver: DefinitionResolver,
}

impl<'a, A> ViewService<'a, A>
where
    A: StatementExecutor + ColumnGatherer + ?Sized,
{
    pub fn new(adapter: &'a A, templates: &'a DialectTemplates) -> Self {
        Self {
            adapter,
            templates,
            resolver: DefinitionResolver::new(),
        }
    }

    /// Gathers columns, resolves the definition unless one is already known,
    /// and registers the view.
    ///
    /// # Errors
    /// Returns the column gatherer's error or the resolver's query error. The
    /// view is not registered in either case.
    pub async fn gather_view_details(
        &mut self,
        snapshot: &mut DatabaseSnapshot,
        mut view: View,
    ) -> Result<()> {
        self.adapter.gather_columns(snapshot, &mut view).await?;

        if view.definition.is_none() {
            self.resolver
                .resolve(
                    self.adapter,
                    snapshot,
                    &mut view,
                    self.templates.get(TemplateKey::ViewDefinition),
                )
                .await?;
        }

        tracing::debug!(
            "Registering view '{}' with {} columns",
            view.name,
            view.columns.len()
        );
        snapshot.register_view(view);
        Ok(())
    }

    /// Attaches view comments; returns the number of views annotated.
    pub async fn gather_view_comments(&self, snapshot: &mut DatabaseSnapshot) -> usize {
        harvest_view_comments(
            self.adapter,
            snapshot,
            self.templates.get(TemplateKey::ViewComments),
        )
        .await
    }

    /// Attaches view column comments; returns the number of columns annotated.
    pub async fn gather_view_column_comments(&self, snapshot: &mut DatabaseSnapshot) -> usize {
        harvest_view_column_comments(
            self.adapter,
            snapshot,
            self.templates.get(TemplateKey::ViewColumnComments),
        )
        .await
    }

    /// Legacy-column warnings logged by this service's resolver.
    pub fn deprecation_warnings(&self) -> u32 {
        self.resolver.deprecation_warnings()
    }
}
