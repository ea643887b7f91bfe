//! Comment create contract

use tb_core::error::ValidationErrors;
use tb_models::NewComment;

use crate::base::{validate_presence, Contract, ValidationResult};

#[derive(Debug, Default, Clone, Copy)]
pub struct CreateCommentContract;

impl CreateCommentContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<NewComment> for CreateCommentContract {
    fn validate(&self, comment: &NewComment) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_presence("comment", &comment.text, &mut errors);
        if comment.task_id.is_nil() {
            errors.add("task", "can't be blank");
        }
        if comment.author_id.is_nil() {
            errors.add("commentor", "can't be blank");
        }

        errors.into_result()
    }
}
