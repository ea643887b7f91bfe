//! Task assignment model
//!
//! Table: task_assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tb_core::traits::{Entity, Id, Identifiable};

/// Whether the assignee has taken the task on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

/// Links a task to a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Id,
    pub task_id: Id,
    pub user_id: Id,
    pub assigned_by: Id,
    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: AssignmentStatus,
}

impl Assignment {
    pub fn is_accepted(&self) -> bool {
        self.status == AssignmentStatus::Accepted
    }
}

impl Identifiable for Assignment {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Assignment {
    const TABLE_NAME: &'static str = "task_assignments";
    const TYPE_NAME: &'static str = "Assignment";
}
