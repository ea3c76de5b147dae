//! Authentication handlers.

use axum::{extract::State, http::HeaderMap, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::{
    authenticate, register as register_account, AuthSession, CredentialError, SessionManager,
};
use crate::config::Config;
use crate::db::AccountRepository;
use crate::file::FileStore;
use crate::web::dto::{
    AccountInfo, ApiResponse, LoginRequest, RegisterRequest, SessionResponse, ValidatedForm,
};
use crate::web::error::ApiError;
use crate::web::middleware::{session_token, AuthState, AuthUser};
use crate::Database;

/// Application state shared across handlers.
pub struct AppState {
    /// Account database.
    pub db: Database,
    /// Per-account file storage.
    pub store: FileStore,
    /// Session state, shared with the auth extractor.
    pub auth: Arc<AuthState>,
    /// Upload batch limit.
    pub max_files_per_upload: usize,
    /// Whether the session cookie is marked `Secure`.
    pub cookie_secure: bool,
}

impl AppState {
    /// Create the application state from configuration.
    pub fn new(db: Database, store: FileStore, config: &Config) -> Self {
        let sessions = Arc::new(Mutex::new(SessionManager::from_config(config)));
        let auth = Arc::new(AuthState::new(
            sessions,
            &config.web.session_cookie_name,
            config.auth.require_login,
        ));

        Self {
            db,
            store,
            auth,
            max_files_per_upload: config.files.max_files_per_upload,
            cookie_secure: config.web.cookie_secure,
        }
    }

    fn session_cookie(&self, token: &str) -> Cookie<'static> {
        Cookie::build((self.auth.cookie_name.clone(), token.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build()
    }

    fn session_response(&self, jar: CookieJar, session: AuthSession) -> (CookieJar, Json<ApiResponse<SessionResponse>>) {
        let jar = jar.add(self.session_cookie(&session.token));
        let response = SessionResponse {
            token: session.token,
            account: AccountInfo {
                id: session.account_id,
                username: session.username,
            },
        };
        (jar, Json(ApiResponse::new(response)))
    }
}

/// POST /register - Create an account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedForm(req): ValidatedForm<RegisterRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    let repo = AccountRepository::new(state.db.pool());
    let account = register_account(&repo, &req.username, &req.password).await?;

    let session = state.auth.sessions.lock().await.start_session(&account);

    Ok(state.session_response(jar, session))
}

/// POST /login - Log in with username and password.
///
/// The session lock is held only for the limiter check and for recording
/// the outcome; password verification runs without it.
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidatedForm(req): ValidatedForm<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<SessionResponse>>), ApiError> {
    {
        let mut sessions = state.auth.sessions.lock().await;
        sessions.cleanup();
        sessions.check_login(&req.username)?;
    }

    let repo = AccountRepository::new(state.db.pool());
    let verified = match authenticate(&repo, &req.username, &req.password).await {
        Ok(account) => Some(account),
        Err(CredentialError::InvalidCredentials) => None,
        Err(e) => return Err(e.into()),
    };

    let session = state
        .auth
        .sessions
        .lock()
        .await
        .finish_login(&req.username, verified)?;

    Ok(state.session_response(jar, session))
}

/// POST /logout - End the current session.
///
/// Always succeeds; the cookie is cleared even when the session was
/// already gone.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<()>>) {
    if let Some(token) = session_token(&headers, &state.auth.cookie_name) {
        state.auth.sessions.lock().await.logout(&token);
    }

    let jar = jar.remove(Cookie::build(state.auth.cookie_name.clone()).path("/"));
    (jar, Json(ApiResponse::new(())))
}

/// GET /me - The current identity.
pub async fn me(AuthUser(identity): AuthUser) -> Json<ApiResponse<AccountInfo>> {
    Json(ApiResponse::new(AccountInfo {
        id: identity.account_id,
        username: identity.username,
    }))
}
