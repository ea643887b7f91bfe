//! Tag save contract

use tb_core::error::ValidationErrors;
use tb_models::TagDraft;

use crate::base::{validate_max_length, validate_presence, Contract, ValidationResult};

/// Longest accepted tag name
pub const MAX_TAG_NAME_LENGTH: usize = 255;

#[derive(Debug, Default, Clone, Copy)]
pub struct SaveTagContract;

impl SaveTagContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<TagDraft> for SaveTagContract {
    fn validate(&self, tag: &TagDraft) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        validate_presence("name", &tag.name, &mut errors);
        validate_max_length("name", &tag.name, MAX_TAG_NAME_LENGTH, &mut errors);

        if !tag.color.is_valid_hex() {
            errors.add("color", "is not a hex color");
        }
        if tag.company_id.is_nil() {
            errors.add("company", "can't be blank");
        }

        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::types::Color;
    use uuid::Uuid;

    #[test]
    fn test_tag_accepted() {
        let mut tag = TagDraft::new(Uuid::from_u128(9), "backend");
        assert!(SaveTagContract::new().validate(&tag).is_ok());

        tag.color = Color::new("#0F0");
        assert!(SaveTagContract::new().validate(&tag).is_ok());
    }

    #[test]
    fn test_blank_name_and_bad_color() {
        let mut tag = TagDraft::new(Uuid::from_u128(9), "  ");
        tag.color = Color::new("red");

        let err = SaveTagContract::new().validate(&tag).unwrap_err();
        assert!(err.has_error("name"));
        assert!(err.has_error("color"));
        assert!(!err.has_error("company"));
    }

    #[test]
    fn test_long_name_and_missing_company() {
        let tag = TagDraft::new(Uuid::nil(), "x".repeat(MAX_TAG_NAME_LENGTH + 1));

        let err = SaveTagContract::new().validate(&tag).unwrap_err();
        assert!(err.has_error("name"));
        assert!(err.has_error("company"));
    }
}
