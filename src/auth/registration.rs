//! Account registration for Arquivista.

use thiserror::Error;
use tracing::info;

use crate::auth::validation::{validate_registration, ValidationError};
use crate::auth::{hash_password, PasswordError};
use crate::db::{Account, AccountRepository, NewAccount};
use crate::ArquivistaError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Validation failed.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Username already exists (exact, case-sensitive match).
    #[error("username already exists")]
    UsernameExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

impl From<ArquivistaError> for RegistrationError {
    fn from(e: ArquivistaError) -> Self {
        match e {
            ArquivistaError::AlreadyExists(_) => RegistrationError::UsernameExists,
            other => RegistrationError::Database(other.to_string()),
        }
    }
}

/// Register a new account.
///
/// 1. Validates the username and password
/// 2. Rejects a username that is already taken
/// 3. Hashes the password
/// 4. Persists the account
///
/// The unique constraint on `accounts.username` still guards step 4 when two
/// registrations race past step 2.
pub async fn register(
    repo: &AccountRepository<'_>,
    username: &str,
    password: &str,
) -> Result<Account, RegistrationError> {
    validate_registration(username, password)?;

    if repo.username_exists(username).await? {
        return Err(RegistrationError::UsernameExists);
    }

    let owned = password.to_string();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&owned))
        .await
        .map_err(|e| RegistrationError::Database(format!("hashing task failed: {e}")))??;

    let account = repo
        .create(&NewAccount::new(username, password_hash))
        .await?;

    info!(
        username = %account.username,
        account_id = account.id,
        "New account registered"
    );

    Ok(account)
}
