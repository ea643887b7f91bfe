//! Task Filters
//!
//! A filter specification is a set of criteria combined with AND semantics.
//! A criterion that is "all" (or empty) is inactive and constrains nothing.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_models::{Task, TaskPriority, TaskStatus};

/// Resolved task -> tag ids mapping
///
/// A task missing from the map is "unresolved", which is different from a
/// task present with an empty set.
pub type TagIndex = HashMap<Id, HashSet<Id>>;

/// Sentinel used by request parameters to mean "no constraint"
pub const ALL: &str = "all";

/// Either no constraint, or an exact value to match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// `All` accepts everything
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Selection::All => None,
            Selection::Only(v) => Some(v),
        }
    }
}

impl Selection<TaskStatus> {
    /// Parse a status parameter; `None` for an unknown status name
    pub fn parse_status(s: &str) -> Option<Self> {
        if s.is_empty() || s == ALL {
            return Some(Selection::All);
        }
        TaskStatus::parse(s).map(Selection::Only)
    }
}

impl Selection<TaskPriority> {
    /// Parse a priority parameter; any non-sentinel text is an exact match
    pub fn parse_priority(s: &str) -> Self {
        if s.is_empty() || s == ALL {
            Selection::All
        } else {
            Selection::Only(TaskPriority::parse(s))
        }
    }
}

/// Filter specification shared by every task view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Case-insensitive substring of title or description; empty matches all
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub status: Selection<TaskStatus>,
    #[serde(default)]
    pub priority: Selection<TaskPriority>,
    /// A task matches if it carries any of these tags; empty means no constraint
    #[serde(default)]
    pub tag_ids: HashSet<Id>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when every criterion is inactive
    pub fn is_unconstrained(&self) -> bool {
        self.query.is_empty()
            && self.status.is_all()
            && self.priority.is_all()
            && self.tag_ids.is_empty()
    }

    pub fn has_tag_filter(&self) -> bool {
        !self.tag_ids.is_empty()
    }

    /// Evaluate every active criterion against one task
    ///
    /// With an active tag filter, a task that has no entry in `tags` (or when
    /// `tags` is `None`) does not match.
    pub fn matches(&self, task: &Task, tags: Option<&TagIndex>) -> bool {
        self.matches_query(task)
            && self.status.accepts(&task.status)
            && self.priority.accepts(&task.priority)
            && self.matches_tags(task, tags)
    }

    fn matches_query(&self, task: &Task) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        task.title.to_lowercase().contains(&needle)
            || task.description.to_lowercase().contains(&needle)
    }

    fn matches_tags(&self, task: &Task, tags: Option<&TagIndex>) -> bool {
        if self.tag_ids.is_empty() {
            return true;
        }
        match tags.and_then(|index| index.get(&task.id)) {
            Some(task_tags) => !task_tags.is_disjoint(&self.tag_ids),
            None => false,
        }
    }
}

/// Apply a filter specification, preserving the input order
pub fn filter_tasks(tasks: &[Task], spec: &FilterSpec, tags: Option<&TagIndex>) -> Vec<Task> {
    if spec.is_unconstrained() {
        return tasks.to_vec();
    }
    if spec.has_tag_filter() && tags.is_none() {
        tracing::debug!("Tag filter active without a resolved tag index; no task can match");
    }
    tasks
        .iter()
        .filter(|task| spec.matches(task, tags))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn task(n: u128, title: &str, description: &str) -> Task {
        let mut task = Task::new(Uuid::from_u128(n), Uuid::from_u128(100), title);
        task.description = description.to_string();
        task
    }

    fn tag(n: u128) -> Id {
        Uuid::from_u128(1000 + n)
    }

    fn sample() -> Vec<Task> {
        let mut a = task(1, "Write release notes", "Summarise the sprint");
        a.status = TaskStatus::InProgress;
        a.priority = TaskPriority::High;

        let mut b = task(2, "Fix login bug", "Users cannot LOG IN on Safari");
        b.status = TaskStatus::NotStarted;
        b.priority = TaskPriority::High;

        let mut c = task(3, "Plan offsite", "");
        c.status = TaskStatus::Completed;
        c.priority = TaskPriority::Low;

        vec![a, b, c]
    }

    fn ids(tasks: &[Task]) -> Vec<u128> {
        tasks.iter().map(|t| t.id.as_u128()).collect()
    }

    #[test]
    fn test_unconstrained_is_identity() {
        let tasks = sample();
        let spec = FilterSpec::new();
        assert!(spec.is_unconstrained());
        assert_eq!(filter_tasks(&tasks, &spec, None), tasks);
    }

    #[test]
    fn test_query_matches_title_or_description_case_insensitively() {
        let tasks = sample();
        let spec = FilterSpec {
            query: "log in".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, None)), vec![2]);

        let spec = FilterSpec {
            query: "RELEASE".into(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, None)), vec![1]);
    }

    #[test]
    fn test_criteria_are_anded() {
        let tasks = sample();
        let spec = FilterSpec {
            status: Selection::Only(TaskStatus::NotStarted),
            priority: Selection::Only(TaskPriority::High),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, None)), vec![2]);

        let spec = FilterSpec {
            status: Selection::Only(TaskStatus::Completed),
            priority: Selection::Only(TaskPriority::High),
            ..Default::default()
        };
        assert!(filter_tasks(&tasks, &spec, None).is_empty());
    }

    #[test]
    fn test_tag_filter_uses_or_semantics() {
        let tasks = sample();
        let mut index = TagIndex::new();
        index.insert(Uuid::from_u128(1), [tag(1), tag(2)].into_iter().collect());
        index.insert(Uuid::from_u128(2), HashSet::new());
        index.insert(Uuid::from_u128(3), [tag(3)].into_iter().collect());

        let spec = FilterSpec {
            tag_ids: [tag(2), tag(3)].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, Some(&index))), vec![1, 3]);

        let spec = FilterSpec {
            tag_ids: [tag(3), tag(4)].into_iter().collect(),
            ..Default::default()
        };
        let task_a = &tasks[0];
        assert!(!spec.matches(task_a, Some(&index)));
    }

    #[test]
    fn test_unresolved_task_never_matches_tag_filter() {
        let tasks = sample();
        let mut index = TagIndex::new();
        index.insert(Uuid::from_u128(1), [tag(1)].into_iter().collect());

        let spec = FilterSpec {
            tag_ids: [tag(1)].into_iter().collect(),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, Some(&index))), vec![1]);
        assert!(filter_tasks(&tasks, &spec, None).is_empty());
    }

    #[test]
    fn test_missing_index_is_irrelevant_without_tag_filter() {
        let tasks = sample();
        let spec = FilterSpec {
            priority: Selection::Only(TaskPriority::Low),
            ..Default::default()
        };
        assert_eq!(ids(&filter_tasks(&tasks, &spec, None)), vec![3]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let tasks = sample();
        let mut index = TagIndex::new();
        index.insert(Uuid::from_u128(2), [tag(7)].into_iter().collect());
        let spec = FilterSpec {
            query: "bug".into(),
            tag_ids: [tag(7)].into_iter().collect(),
            ..Default::default()
        };

        let once = filter_tasks(&tasks, &spec, Some(&index));
        let twice = filter_tasks(&once, &spec, Some(&index));
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec![2]);
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!(Selection::parse_status("all"), Some(Selection::All));
        assert_eq!(Selection::parse_status(""), Some(Selection::All));
        assert_eq!(
            Selection::parse_status("in_progress"),
            Some(Selection::Only(TaskStatus::InProgress))
        );
        assert_eq!(Selection::parse_status("blocked"), None);

        assert_eq!(Selection::parse_priority("all"), Selection::All);
        assert_eq!(
            Selection::parse_priority("urgent"),
            Selection::Only(TaskPriority::Unknown("urgent".into()))
        );
    }
}
