//! Account model for Arquivista.

/// A registered account.
///
/// Accounts are created once and never renamed; the password is only ever
/// held as an Argon2 hash.
#[derive(Clone, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID. Also names the account's storage root.
    pub id: i64,
    /// Login username (unique, case-sensitive).
    pub username: String,
    /// Password hash (Argon2 PHC string).
    pub password_hash: String,
    /// Account creation timestamp.
    pub created_at: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Data for creating a new account.
#[derive(Clone)]
pub struct NewAccount {
    /// Login username.
    pub username: String,
    /// Password hash (must already be hashed).
    pub password_hash: String,
}

impl NewAccount {
    /// Create a new account record.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
        }
    }
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
