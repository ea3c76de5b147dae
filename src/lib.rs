//! Arquivista - personal file organizer.
//!
//! Users register and log in; every file they upload is sorted into a
//! category folder by its extension (`imagens/png`, `documentos/pdf`, ...)
//! under a storage root that belongs to their account alone.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{
    authenticate, hash_password, register, validate_password, verify_password, AuthSession,
    CredentialError, LimitResult, LoginLimiter, PasswordError, RegistrationError, SessionError,
    SessionManager, ValidationError,
};
pub use config::Config;
pub use db::{Account, AccountRepository, Database, NewAccount};
pub use error::{ArquivistaError, Result};
pub use file::{
    resolve_strictly_within_root, resolve_within_root, secure_filename, AccountFiles, Classifier,
    DeleteOutcome, FileStore, StoredFileEntry, UploadEntry, UploadFailure, UploadReport,
};
pub use web::WebServer;
