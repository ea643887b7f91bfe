//! Task Query
//!
//! A task query is a filter specification plus a sort key. It is parsed from
//! the parameters a task view is requested with and applied to an in-memory
//! task list.

use serde::{Deserialize, Serialize};
use tb_core::error::ValidationErrors;
use tb_core::traits::Id;
use tb_models::{Task, TaskPriority, TaskStatus};

use crate::filters::{filter_tasks, FilterSpec, Selection, TagIndex};
use crate::sorts::{sort_tasks, SortKey};

/// Filter plus sort, applied in that order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub filter: FilterSpec,
    #[serde(default)]
    pub sort: SortKey,
}

impl TaskQuery {
    pub fn new(filter: FilterSpec, sort: SortKey) -> Self {
        Self { filter, sort }
    }

    /// Filter, then stably sort, returning a new list
    pub fn apply(&self, tasks: &[Task], tags: Option<&TagIndex>) -> Vec<Task> {
        let mut out = filter_tasks(tasks, &self.filter, tags);
        sort_tasks(&mut out, self.sort);
        out
    }

    /// Parse raw request parameters
    ///
    /// Missing parameters mean "no constraint" (and date order). `tags` is a
    /// comma separated list of tag ids.
    pub fn parse(
        query: Option<&str>,
        status: Option<&str>,
        priority: Option<&str>,
        sort: Option<&str>,
        tags: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let status = match status {
            Some(raw) => Selection::parse_status(raw).unwrap_or_else(|| {
                errors.add("status", format!("is not a known status: {}", raw));
                Selection::All
            }),
            None => Selection::All,
        };

        let priority = priority
            .map(Selection::parse_priority)
            .unwrap_or(Selection::All);

        let sort = match sort {
            Some(raw) if !raw.is_empty() => SortKey::from_str(raw).unwrap_or_else(|| {
                errors.add("sort", format!("is not a sortable attribute: {}", raw));
                SortKey::default()
            }),
            _ => SortKey::default(),
        };

        let mut tag_ids = std::collections::HashSet::new();
        for raw in tags.unwrap_or_default().split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<Id>() {
                Ok(id) => {
                    tag_ids.insert(id);
                }
                Err(_) => errors.add("tags", format!("is not a valid id: {}", raw)),
            }
        }

        errors.into_result()?;

        Ok(Self {
            filter: FilterSpec {
                query: query.unwrap_or_default().to_string(),
                status,
                priority,
                tag_ids,
            },
            sort,
        })
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.filter.status.as_option().copied()
    }

    pub fn priority(&self) -> Option<&TaskPriority> {
        self.filter.priority.as_option()
    }
}
