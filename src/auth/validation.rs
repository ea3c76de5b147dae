//! Input validation for account registration.
//!
//! Usernames are compared case-sensitively and never normalized, so the
//! only checks are the ones that keep them printable and bounded.

use thiserror::Error;

use super::password::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Maximum username length, in characters.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty or whitespace only.
    #[error("username cannot be empty")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username has surrounding whitespace or control characters.
    #[error("username contains invalid characters")]
    UsernameInvalidChars,

    /// Password is too short.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    /// Password is too long.
    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,
}

impl ValidationError {
    /// Name of the input field the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::UsernameEmpty
            | ValidationError::UsernameTooLong
            | ValidationError::UsernameInvalidChars => "username",
            ValidationError::PasswordTooShort | ValidationError::PasswordTooLong => "password",
        }
    }
}

/// Validate a username.
///
/// # Examples
///
/// ```
/// use arquivista::auth::validation::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("Alice Souza").is_ok());
/// assert!(validate_username("   ").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if username.trim() != username || username.chars().any(char::is_control) {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate a registration password (8-128 bytes).
pub fn validate_registration_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate all registration fields, returning the first error encountered.
pub fn validate_registration(username: &str, password: &str) -> Result<(), ValidationError> {
    validate_username(username)?;
    validate_registration_password(password)?;
    Ok(())
}
