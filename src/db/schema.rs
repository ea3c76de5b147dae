//! Database schema and migrations for Arquivista.
//!
//! Migrations are applied in order when the database is opened; the
//! `schema_version` table records which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: accounts
    r#"
-- Accounts; usernames are unique and compared case-sensitively (BINARY collation)
CREATE TABLE accounts (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    username        TEXT NOT NULL UNIQUE,
    password_hash   TEXT NOT NULL,           -- Argon2 PHC string
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];
