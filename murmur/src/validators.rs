use email_address::EmailAddress;

use crate::errors::{ValidationError, ValidationIssue, ValidationResult};

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Check registration input. Usernames and passwords are taken as given.
pub fn validate_registration(email: &str) -> ValidationResult<()> {
    if is_valid_email(email) {
        return Ok(());
    }
    Err(ValidationError::new(vec![ValidationIssue::new(
        "email",
        "validation.email",
        "Email must be a valid email address",
    )]))
}
