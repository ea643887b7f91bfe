//! Query Builder
//!
//! Provides a fluent API for constructing task queries.

use tb_core::traits::Id;
use tb_models::{TaskPriority, TaskStatus};

use crate::filters::{FilterSpec, Selection};
use crate::query::TaskQuery;
use crate::sorts::SortKey;

/// Builder for constructing task queries fluently
#[derive(Debug, Default)]
pub struct TaskQueryBuilder {
    filter: FilterSpec,
    sort: SortKey,
}

impl TaskQueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Match tasks whose title or description contains `text`
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.filter.query = text.into();
        self
    }

    /// Filter by status
    pub fn status(mut self, status: TaskStatus) -> Self {
        self.filter.status = Selection::Only(status);
        self
    }

    /// Filter by priority
    pub fn priority(mut self, priority: TaskPriority) -> Self {
        self.filter.priority = Selection::Only(priority);
        self
    }

    /// Require one more tag (any of the added tags matches)
    pub fn tag(mut self, tag_id: Id) -> Self {
        self.filter.tag_ids.insert(tag_id);
        self
    }

    pub fn tags(mut self, tag_ids: impl IntoIterator<Item = Id>) -> Self {
        self.filter.tag_ids.extend(tag_ids);
        self
    }

    // Sort methods

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort = key;
        self
    }

    pub fn sort_by_date(self) -> Self {
        self.sort_by(SortKey::Date)
    }

    pub fn sort_by_priority(self) -> Self {
        self.sort_by(SortKey::Priority)
    }

    pub fn sort_by_title(self) -> Self {
        self.sort_by(SortKey::Title)
    }

    /// Build the query
    pub fn build(self) -> TaskQuery {
        TaskQuery::new(self.filter, self.sort)
    }
}
