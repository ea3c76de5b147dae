//! Authentication module for Arquivista.
//!
//! This module provides password hashing, account registration, credential
//! verification and in-memory session management.

mod credentials;
mod password;
mod registration;
mod session;
pub mod validation;

pub use credentials::{authenticate, verify_credentials, CredentialError};
pub use password::{hash_password, validate_password, verify_password, PasswordError};
pub use registration::{register, RegistrationError};
pub use session::{
    AuthSession, LimitResult, LoginLimiter, SessionError, SessionManager,
    DEFAULT_IDLE_TIMEOUT_SECS, DEFAULT_SESSION_DURATION_SECS, LOCKOUT_DURATION_SECS,
    MAX_LOGIN_ATTEMPTS,
};
pub use validation::ValidationError;
