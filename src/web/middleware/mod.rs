//! Middleware for the Web API.

pub mod auth;
pub mod cors;

pub use auth::{
    session_auth, session_token, AuthState, AuthUser, Identity, SharedSessions, LOCAL_ACCOUNT_ID,
    LOCAL_USERNAME,
};
pub use cors::create_cors_layer;
