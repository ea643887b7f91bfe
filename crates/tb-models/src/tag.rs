//! Tag model and the task/tag join row
//!
//! Tables: tags, task_tags

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tb_core::traits::{CompanyScoped, Entity, Id, Identifiable, Timestamped};
use tb_core::types::Color;
use validator::Validate;

/// Company-scoped label attachable to many tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Tag {
    pub id: Id,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[serde(default)]
    pub color: Color,

    pub company_id: Id,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identifiable for Tag {
    fn id(&self) -> Id {
        self.id
    }
}

impl Timestamped for Tag {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl CompanyScoped for Tag {
    fn company_id(&self) -> Id {
        self.company_id
    }
}

impl Entity for Tag {
    const TABLE_NAME: &'static str = "tags";
    const TYPE_NAME: &'static str = "Tag";
}

/// Link between a task and a tag; carries nothing else
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskTag {
    pub task_id: Id,
    pub tag_id: Id,
}

impl TaskTag {
    pub const TABLE_NAME: &'static str = "task_tags";

    pub fn new(task_id: Id, tag_id: Id) -> Self {
        Self { task_id, tag_id }
    }
}
