//! Credential verification.
//!
//! An unknown username and a wrong password produce the same
//! [`CredentialError::InvalidCredentials`], and both paths run one Argon2
//! verification so their cost is comparable.

use std::sync::OnceLock;

use thiserror::Error;

use crate::auth::{hash_password, verify_password};
use crate::db::{Account, AccountRepository};

/// Credential verification errors.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Unknown username or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Database error while looking up the account.
    #[error("database error: {0}")]
    Database(String),

    /// The verification task did not complete.
    #[error("verification task failed: {0}")]
    Task(String),
}

/// Hash verified against when the username does not exist.
fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("arquivista-placeholder-credential").ok())
        .as_deref()
}

/// Check `password` against an optional account record.
pub fn verify_credentials(
    account: Option<Account>,
    password: &str,
) -> Result<Account, CredentialError> {
    match account {
        Some(account) => match verify_password(password, &account.password_hash) {
            Ok(()) => Ok(account),
            Err(_) => Err(CredentialError::InvalidCredentials),
        },
        None => {
            if let Some(hash) = dummy_hash() {
                let _ = verify_password(password, hash);
            }
            Err(CredentialError::InvalidCredentials)
        }
    }
}

/// Look up `username` and verify `password` against its stored hash.
///
/// The Argon2 verification runs on the blocking pool; callers must not hold
/// shared locks across this call.
pub async fn authenticate(
    repo: &AccountRepository<'_>,
    username: &str,
    password: &str,
) -> Result<Account, CredentialError> {
    let account = repo
        .get_by_username(username)
        .await
        .map_err(|e| CredentialError::Database(e.to_string()))?;

    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_credentials(account, &password))
        .await
        .map_err(|e| CredentialError::Task(e.to_string()))?
}
