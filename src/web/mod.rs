//! Web API module for Arquivista.
//!
//! JSON endpoints for registering, logging in, and listing, uploading and
//! deleting the caller's files.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
