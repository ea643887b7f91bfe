//! Task save contract
//!
//! One contract covers create and update; a draft with an id is an update.

use std::collections::HashSet;

use tb_core::error::ValidationErrors;
use tb_models::TaskDraft;
use validator::Validate;

use crate::base::{
    merge_validator_errors, validate_max_length, validate_presence, Contract, ValidationResult,
    MAX_TITLE_LENGTH,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct SaveTaskContract;

impl SaveTaskContract {
    pub fn new() -> Self {
        Self
    }

    fn validate_title(&self, title: &str, errors: &mut ValidationErrors) {
        validate_presence("title", title, errors);
        validate_max_length("title", title, MAX_TITLE_LENGTH, errors);
    }

    fn validate_company(&self, draft: &TaskDraft, errors: &mut ValidationErrors) {
        if draft.company_id.is_nil() {
            errors.add("company", "can't be blank");
        }
    }

    fn validate_steps(&self, draft: &TaskDraft, errors: &mut ValidationErrors) {
        let mut seen = HashSet::new();
        for (index, step) in draft.existing_steps.iter().enumerate() {
            let prefix = format!("existing_steps[{}]", index);
            merge_validator_errors(&prefix, step.validate(), errors);
            if !seen.insert(step.id) {
                errors.add(format!("{}.id", prefix), "is listed twice");
            }
        }
        // Blank new steps are filled with placeholders later, only the length is checked.
        for (index, step) in draft.new_steps.iter().enumerate() {
            validate_max_length(
                &format!("new_steps[{}].title", index),
                &step.title,
                MAX_TITLE_LENGTH,
                errors,
            );
        }
    }

    fn validate_existing_steps_need_task(&self, draft: &TaskDraft, errors: &mut ValidationErrors) {
        if !draft.is_update() && !draft.existing_steps.is_empty() {
            errors.add_base("existing steps can only be updated on an existing task");
        }
    }
}

impl Contract<TaskDraft> for SaveTaskContract {
    fn validate(&self, draft: &TaskDraft) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        self.validate_title(&draft.title, &mut errors);
        self.validate_company(draft, &mut errors);
        self.validate_steps(draft, &mut errors);
        self.validate_existing_steps_need_task(draft, &mut errors);

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(
            attribute,
            "title" | "description" | "steps" | "tags" | "assignees"
        )
    }
}
