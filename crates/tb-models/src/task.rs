//! Task model
//!
//! Table: tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tb_core::traits::{CompanyScoped, Entity, Id, Identifiable, Timestamped};

use crate::dates::parse_timestamp;

/// Task lifecycle state; each value is one kanban lane
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Lanes in board order
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_started" => Some(Self::NotStarted),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Position of this lane on the board
    pub fn lane_index(&self) -> usize {
        match self {
            Self::NotStarted => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
///
/// Values outside low/medium/high are kept verbatim in `Unknown` so that
/// they survive a round trip and sort after the known ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Unknown(String),
}

impl TaskPriority {
    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unknown(raw) => raw,
        }
    }

    /// Sort rank: high first, unknown values last
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
            Self::Unknown(_) => 3,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl From<Option<String>> for TaskPriority {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(s) => Self::parse(&s),
            None => Self::default(),
        }
    }
}

impl From<TaskPriority> for Option<String> {
    fn from(priority: TaskPriority) -> Self {
        match priority {
            TaskPriority::Unknown(raw) if raw.is_empty() => None,
            other => Some(other.as_str().to_string()),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,

    pub title: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    /// Percent complete (0-100), not always populated
    #[serde(default, deserialize_with = "percent")]
    pub progress: Option<u8>,

    /// Due/end date as received; may be missing or unparsable
    #[serde(default)]
    pub end_date: Option<String>,

    pub company_id: Id,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    match Option::<u8>::deserialize(deserializer)? {
        Some(value) if value > 100 => Err(serde::de::Error::custom(format!(
            "progress {} is out of range 0-100",
            value
        ))),
        other => Ok(other),
    }
}

impl Task {
    pub fn new(id: Id, company_id: Id, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            progress: None,
            end_date: None,
            company_id,
            created_at: None,
        }
    }

    /// Parsed end date; `None` when missing or unparsable
    pub fn end_date_parsed(&self) -> Option<DateTime<Utc>> {
        self.end_date.as_deref().and_then(parse_timestamp)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Past its end date and not completed
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed() && self.end_date_parsed().is_some_and(|end| end < now)
    }
}

impl Identifiable for Task {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for Task {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl CompanyScoped for Task {
    fn company_id(&self) -> Id {
        self.company_id
    }
}

impl Entity for Task {
    const TABLE_NAME: &'static str = "tasks";
    const TYPE_NAME: &'static str = "Task";
}
