//! Base contract system

use tb_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Longest accepted title for tasks and steps
pub const MAX_TITLE_LENGTH: usize = 255;

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Blank (or whitespace-only) text is an error on `field`
pub fn validate_presence(field: &str, value: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(field, "can't be blank");
    }
}

pub fn validate_max_length(field: &str, value: &str, max: usize, errors: &mut ValidationErrors) {
    if value.chars().count() > max {
        errors.add(field, format!("is too long (maximum is {} characters)", max));
    }
}

/// Fold derive-based validation results into our error collection
///
/// Field names are prefixed with `prefix` so nested records stay apart,
/// e.g. `existing_steps[0].title`.
pub fn merge_validator_errors(
    prefix: &str,
    result: Result<(), validator::ValidationErrors>,
    errors: &mut ValidationErrors,
) {
    let Err(found) = result else {
        return;
    };
    for (field, field_errors) in found.field_errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        for error in field_errors {
            let message = match &error.message {
                Some(message) => message.to_string(),
                None => format!("is invalid ({})", error.code),
            };
            errors.add(key.clone(), message);
        }
    }
}
