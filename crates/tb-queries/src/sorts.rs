//! Task Sort Orders
//!
//! Every sort is ascending and stable: tasks with equal keys keep their
//! original relative order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tb_models::Task;

/// Attribute a task list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// End date, earliest first; missing or unparsable dates last
    #[default]
    Date,
    /// High, medium, low, then anything else
    Priority,
    /// Title, case-insensitive collation
    Title,
}

impl SortKey {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(Self::Date),
            "priority" => Some(Self::Priority),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Priority => "priority",
            Self::Title => "title",
        }
    }
}

/// Sort tasks in place by one key
pub fn sort_tasks(tasks: &mut [Task], key: SortKey) {
    match key {
        // Parsing is not free, so each date is parsed once.
        SortKey::Date => tasks.sort_by_cached_key(|task| {
            let end = task.end_date_parsed();
            (end.is_none(), end)
        }),
        SortKey::Priority => tasks.sort_by_key(|task| task.priority.rank()),
        SortKey::Title => tasks.sort_by_cached_key(|task| collation_key(&task.title)),
    }
}

/// Sorted copy of a task list
pub fn sorted(tasks: &[Task], key: SortKey) -> Vec<Task> {
    let mut out = tasks.to_vec();
    sort_tasks(&mut out, key);
    out
}

/// Compare two titles the way the title sort does
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a).cmp(&collation_key(b))
}

/// Case-folded text first, then a case tier where lowercase precedes uppercase
fn collation_key(title: &str) -> (String, String) {
    let folded = title.to_lowercase();
    let tier = title
        .chars()
        .map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().next().unwrap_or(c)
            } else if c.is_lowercase() {
                c.to_uppercase().next().unwrap_or(c)
            } else {
                c
            }
        })
        .collect();
    (folded, tier)
}
