//! Write-side payloads
//!
//! Drafts are what a caller submits; the backend assigns ids and timestamps.

use serde::{Deserialize, Serialize};
use tb_core::traits::Id;
use tb_core::types::Color;
use validator::Validate;

use crate::step::{NO_DESCRIPTION, UNTITLED_STEP};

/// Update to a step that already exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StepUpdate {
    pub id: Id,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

/// Step to be inserted under a task
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewStep {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_completed: bool,
}

impl NewStep {
    /// Replace a blank title or description with its placeholder
    pub fn with_defaults(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = UNTITLED_STEP.to_string();
        }
        if self.description.trim().is_empty() {
            self.description = NO_DESCRIPTION.to_string();
        }
        self
    }
}

/// Task create/update request
///
/// With `id` set the task is updated in place, otherwise a new task is
/// created. An empty `tag_ids` leaves existing tag links untouched, while
/// `assignee_ids` always replaces the current assignments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub id: Option<Id>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub company_id: Id,
    #[serde(default)]
    pub existing_steps: Vec<StepUpdate>,
    #[serde(default)]
    pub new_steps: Vec<NewStep>,
    #[serde(default)]
    pub tag_ids: Vec<Id>,
    #[serde(default)]
    pub assignee_ids: Vec<Id>,
}

impl TaskDraft {
    pub fn new(company_id: Id, title: impl Into<String>) -> Self {
        Self {
            company_id,
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_update(&self) -> bool {
        self.id.is_some()
    }
}

/// Comment to be inserted on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    #[serde(rename = "comment")]
    pub text: String,
    pub task_id: Id,
    pub company_id: Id,
    #[serde(rename = "commentor")]
    pub author_id: Id,
}

/// Tag create/update request
///
/// With `id` set the tag is renamed or recolored in place. A missing color
/// falls back to the default tag color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagDraft {
    #[serde(default)]
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub color: Color,
    pub company_id: Id,
}

impl TagDraft {
    pub fn new(company_id: Id, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: Color::default(),
            company_id,
        }
    }
}
