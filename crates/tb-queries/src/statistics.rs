//! Task Statistics
//!
//! Dashboard counters derived from a company's task list.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tb_models::{Task, TaskPriority, TaskStatus};

/// Number of days covered by the activity series
pub const ACTIVITY_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub completed: usize,
}

/// Counts for the known priorities; other values are not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Tasks created on one calendar day (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    /// Rounded percentage of completed tasks; 0 when there are no tasks
    pub completion_rate: u8,
    pub tasks_by_status: StatusCounts,
    pub tasks_by_priority: PriorityCounts,
    /// Oldest day first, ending with the day of `now`
    pub recent_activity: Vec<DailyActivity>,
}

impl TaskStatistics {
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let mut stats = TaskStatistics {
            total_tasks: tasks.len(),
            ..Default::default()
        };

        for task in tasks {
            match task.status {
                TaskStatus::NotStarted => stats.tasks_by_status.not_started += 1,
                TaskStatus::InProgress => stats.tasks_by_status.in_progress += 1,
                TaskStatus::Completed => stats.tasks_by_status.completed += 1,
            }
            match task.priority {
                TaskPriority::Low => stats.tasks_by_priority.low += 1,
                TaskPriority::Medium => stats.tasks_by_priority.medium += 1,
                TaskPriority::High => stats.tasks_by_priority.high += 1,
                TaskPriority::Unknown(_) => {}
            }
            if task.is_overdue(now) {
                stats.overdue_tasks += 1;
            }
        }

        stats.completed_tasks = stats.tasks_by_status.completed;
        stats.completion_rate = completion_rate(stats.completed_tasks, stats.total_tasks);
        stats.recent_activity = recent_activity(tasks, now.date_naive());
        stats
    }
}

fn completion_rate(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // Half rounds up.
    ((completed * 200 + total) / (total * 2)) as u8
}

fn recent_activity(tasks: &[Task], today: NaiveDate) -> Vec<DailyActivity> {
    (0..ACTIVITY_DAYS)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let count = tasks
                .iter()
                .filter(|task| task.created_at.map(|at| at.date_naive()) == Some(date))
                .count();
            DailyActivity { date, count }
        })
        .collect()
}
