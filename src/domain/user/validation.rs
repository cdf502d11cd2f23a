//! User field validation

use thiserror::Error;

/// Errors that can occur during user field validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Name is too short. Minimum length is {0} characters")]
    NameTooShort(usize),

    #[error("Name exceeds maximum length of {0} characters")]
    NameTooLong(usize),
}

const MAX_EMAIL_LENGTH: usize = 254;
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;

/// Validate an email address
///
/// Structural check only: one `@` with a non-empty local part and a domain
/// containing a dot. Request DTOs run the stricter `validator` check before
/// the workflow; this guards direct service callers.
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(UserValidationError::InvalidEmail);
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(UserValidationError::InvalidEmail);
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a display name
pub fn validate_name(name: &str) -> Result<(), UserValidationError> {
    let trimmed = name.trim();

    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return Err(UserValidationError::NameTooShort(MIN_NAME_LENGTH));
    }

    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(UserValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("u+tag@example.io").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(UserValidationError::InvalidEmail));
        assert_eq!(
            validate_email("no-at-sign"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_email("@example.com"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_email("user@"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_email("user@nodot"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_email("user@.example.com"),
            Err(UserValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_email_too_long() {
        let long_email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(
            validate_email(&long_email),
            Err(UserValidationError::EmailTooLong(254))
        );
    }

    #[test]
    fn test_valid_names() {
        assert!(validate_name("Jo").is_ok());
        assert!(validate_name("Ada Lovelace").is_ok());
    }

    #[test]
    fn test_name_too_short() {
        assert_eq!(
            validate_name("a"),
            Err(UserValidationError::NameTooShort(2))
        );
        assert_eq!(
            validate_name("  a  "),
            Err(UserValidationError::NameTooShort(2))
        );
    }

    #[test]
    fn test_name_too_long() {
        let long_name = "a".repeat(101);
        assert_eq!(
            validate_name(&long_name),
            Err(UserValidationError::NameTooLong(100))
        );
    }
}
