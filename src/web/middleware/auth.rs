//! Session authentication middleware.
//!
//! The session token is read from the `Authorization: Bearer` header or the
//! session cookie. The resolved [`Identity`] is the only source of the
//! account whose files a handler may touch.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::SessionManager;
use crate::web::error::ApiError;

/// Account id used for every request when login is not required.
pub const LOCAL_ACCOUNT_ID: i64 = 0;

/// Username reported for [`LOCAL_ACCOUNT_ID`].
pub const LOCAL_USERNAME: &str = "local";

/// Session manager shared across requests.
pub type SharedSessions = Arc<Mutex<SessionManager>>;

/// State the auth extractor needs, injected into request extensions.
pub struct AuthState {
    /// Active sessions.
    pub sessions: SharedSessions,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// When false, anonymous requests act as the local account.
    pub require_login: bool,
}

impl AuthState {
    /// Create the auth state.
    pub fn new(sessions: SharedSessions, cookie_name: impl Into<String>, require_login: bool) -> Self {
        Self {
            sessions,
            cookie_name: cookie_name.into(),
            require_login,
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Account ID; selects the storage root.
    pub account_id: i64,
    /// Username.
    pub username: String,
}

impl Identity {
    /// The fixed identity used when login is not required.
    pub fn local() -> Self {
        Self {
            account_id: LOCAL_ACCOUNT_ID,
            username: LOCAL_USERNAME.to_string(),
        }
    }
}

/// Read the session token from a Bearer header or the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for authenticated users.
///
/// Rejects with 401 when no valid session is presented, unless login is
/// disabled, in which case the caller is the local account.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth_state = parts
                .extensions
                .get::<Arc<AuthState>>()
                .cloned()
                .ok_or_else(|| ApiError::internal("Session state not configured"))?;

            let token = session_token(&parts.headers, &auth_state.cookie_name);

            let identity = match token {
                Some(token) => {
                    let mut sessions = auth_state.sessions.lock().await;
                    match sessions.touch_session(&token) {
                        Ok(session) => Some(Identity {
                            account_id: session.account_id,
                            username: session.username.clone(),
                        }),
                        Err(e) => {
                            tracing::debug!("Session rejected: {}", e);
                            None
                        }
                    }
                }
                None => None,
            };

            match identity {
                Some(identity) => Ok(AuthUser(identity)),
                None if !auth_state.require_login => Ok(AuthUser(Identity::local())),
                None => Err(ApiError::unauthorized("Login required")),
            }
        })
    }
}

/// Middleware function to inject the auth state into request extensions.
pub async fn session_auth(
    auth_state: Arc<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(auth_state);
    next.run(request).await
}
