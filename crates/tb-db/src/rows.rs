//! Database rows
//!
//! Row structs mirror the table columns; conversion into domain models is
//! where loosely typed columns (status and priority text) get interpreted.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tb_core::traits::Id;
use tb_core::types::Color;
use tb_models::{
    Assignment, AssignmentStatus, Comment, Step, Tag, Task, TaskPriority, TaskStatus, TaskTag,
};

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub progress: Option<i32>,
    pub end_date: Option<String>,
    pub company_id: Id,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        let status = match row.status.as_deref() {
            None => TaskStatus::default(),
            Some(raw) => TaskStatus::parse(raw).unwrap_or_else(|| {
                tracing::warn!(task_id = %row.id, status = raw, "Unknown task status, treating as not started");
                TaskStatus::default()
            }),
        };

        Task {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            status,
            priority: TaskPriority::from(row.priority),
            progress: row.progress.map(|p| p.clamp(0, 100) as u8),
            end_date: row.end_date,
            company_id: row.company_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StepRow {
    pub id: Id,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: Option<bool>,
    pub task_id: Id,
}

impl From<StepRow> for Step {
    fn from(row: StepRow) -> Self {
        Step {
            id: row.id,
            title: row.title,
            description: row.description.unwrap_or_default(),
            is_completed: row.is_completed.unwrap_or(false),
            task_id: row.task_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TagRow {
    pub id: Id,
    pub name: String,
    pub color: Option<String>,
    pub company_id: Id,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            color: row.color.map(Color::new).unwrap_or_default(),
            company_id: row.company_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, FromRow)]
pub struct TaskTagRow {
    pub task_id: Id,
    pub tag_id: Id,
}

impl From<TaskTagRow> for TaskTag {
    fn from(row: TaskTagRow) -> Self {
        TaskTag::new(row.task_id, row.tag_id)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: Id,
    pub task_id: Id,
    pub user_id: Id,
    pub assigned_by: Id,
    pub assigned_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

pub(crate) fn parse_assignment_status(raw: Option<&str>) -> AssignmentStatus {
    match raw {
        Some("accepted") => AssignmentStatus::Accepted,
        Some("rejected") => AssignmentStatus::Rejected,
        _ => AssignmentStatus::Pending,
    }
}

impl From<AssignmentRow> for Assignment {
    fn from(row: AssignmentRow) -> Self {
        Assignment {
            id: row.id,
            task_id: row.task_id,
            user_id: row.user_id,
            assigned_by: row.assigned_by,
            assigned_at: row.assigned_at,
            status: parse_assignment_status(row.status.as_deref()),
        }
    }
}

/// Comment columns keep their historical names
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    pub id: Id,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub commentor: Id,
    pub task_id: Id,
    pub company: Id,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            text: row.comment,
            created_at: row.created_at,
            author_id: row.commentor,
            task_id: row.task_id,
            company_id: row.company,
        }
    }
}

pub(crate) fn assignment_status_str(status: AssignmentStatus) -> &'static str {
    match status {
        AssignmentStatus::Pending => "pending",
        AssignmentStatus::Accepted => "accepted",
        AssignmentStatus::Rejected => "rejected",
    }
}
