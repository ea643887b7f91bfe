//! Step model (checklist item of a task)
//!
//! Table: steps

use serde::{Deserialize, Serialize};
use tb_core::traits::{Entity, Id, Identifiable};
use validator::Validate;

/// Title given to a new step submitted without one
pub const UNTITLED_STEP: &str = "Untitled Step";
/// Description given to a new step submitted without one
pub const NO_DESCRIPTION: &str = "No Description";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Step {
    pub id: Id,

    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub is_completed: bool,

    /// Owning task (older rows call this column `task_belong_to`)
    #[serde(alias = "task_belong_to")]
    pub task_id: Id,
}

impl Identifiable for Step {
    fn id(&self) -> Id {
        self.id
    }
}

impl Entity for Step {
    const TABLE_NAME: &'static str = "steps";
    const TYPE_NAME: &'static str = "Step";
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_legacy_column_alias() {
        let json = serde_json::json!({
            "id": Uuid::from_u128(5),
            "title": "Draft outline",
            "task_belong_to": Uuid::from_u128(1),
        });
        let step: Step = serde_json::from_value(json).unwrap();
        assert_eq!(step.task_id, Uuid::from_u128(1));
        assert!(!step.is_completed);
        assert!(step.validate().is_ok());
    }
}
