//! Authentication session management for Arquivista.
//!
//! Sessions live in memory only and are keyed by an opaque UUID token handed
//! to the client. A login limiter counts failures per username.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::Account;
use crate::logging::SECURITY_TARGET;
use crate::Config;

/// Session-related errors.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Invalid credentials (unknown username or wrong password).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Too many failed attempts for this username.
    #[error("account locked for {0} seconds")]
    AccountLocked(u64),

    /// Session has expired.
    #[error("session expired")]
    SessionExpired,

    /// Session not found.
    #[error("session not found")]
    SessionNotFound,
}

/// Default session duration (24 hours).
pub const DEFAULT_SESSION_DURATION_SECS: u64 = 24 * 60 * 60;

/// Default idle timeout (30 minutes).
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30 * 60;

/// Maximum login attempts before lockout.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

/// Lockout duration (5 minutes).
pub const LOCKOUT_DURATION_SECS: u64 = 5 * 60;

/// A logged-in session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Unique session token (UUID v4).
    pub token: String,
    /// Account this session belongs to.
    pub account_id: i64,
    /// Username at login time.
    pub username: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Absolute expiry.
    pub expires_at: DateTime<Utc>,
    last_activity: Instant,
}

impl AuthSession {
    /// Create a session for an account that expires after `duration`.
    pub fn new(account_id: i64, username: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(duration).unwrap_or_default();

        Self {
            token: Uuid::new_v4().to_string(),
            account_id,
            username: username.into(),
            created_at: now,
            expires_at,
            last_activity: Instant::now(),
        }
    }

    /// Check if the session has expired (absolute timeout).
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the session has been idle too long.
    pub fn is_idle(&self, idle_timeout: Duration) -> bool {
        self.last_activity.elapsed() >= idle_timeout
    }

    /// Not expired and not idle.
    pub fn is_valid(&self, idle_timeout: Duration) -> bool {
        !self.is_expired() && !self.is_idle(idle_timeout)
    }

    /// Update the last activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since last activity.
    pub fn idle_time(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Result of a login attempt rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitResult {
    /// Login attempt is allowed.
    Allowed,
    /// Locked for the remaining duration.
    Locked(Duration),
}

/// Login attempt rate limiter.
///
/// Tracks failed attempts per exact username, whether or not an account
/// with that name exists.
#[derive(Debug)]
pub struct LoginLimiter {
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: u32,
    window: Duration,
    lockout: Duration,
}

impl Default for LoginLimiter {
    fn default() -> Self {
        Self::with_config(MAX_LOGIN_ATTEMPTS, LOCKOUT_DURATION_SECS, LOCKOUT_DURATION_SECS)
    }
}

impl LoginLimiter {
    /// Create a limiter with custom settings.
    pub fn with_config(max_attempts: u32, window_secs: u64, lockout_secs: u64) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(window_secs),
            lockout: Duration::from_secs(lockout_secs),
        }
    }

    /// Check if a login attempt is allowed for the given username.
    pub fn check(&mut self, username: &str) -> LimitResult {
        let now = Instant::now();
        let Some(attempts) = self.attempts.get_mut(username) else {
            return LimitResult::Allowed;
        };

        attempts.retain(|t| now.duration_since(*t) < self.window);

        if attempts.len() >= self.max_attempts as usize {
            if let Some(oldest) = attempts.first() {
                let elapsed = now.duration_since(*oldest);
                if elapsed < self.lockout {
                    return LimitResult::Locked(self.lockout - elapsed);
                }
                attempts.clear();
            }
        }

        LimitResult::Allowed
    }

    /// Record a failed login attempt.
    pub fn record_failure(&mut self, username: &str) {
        let now = Instant::now();
        let attempts = self.attempts.entry(username.to_string()).or_default();

        attempts.retain(|t| now.duration_since(*t) < self.window);
        attempts.push(now);

        debug!(
            username = %username,
            attempt_count = attempts.len(),
            "Recorded failed login attempt"
        );
    }

    /// Forget all failures for a username (after a successful login).
    pub fn clear(&mut self, username: &str) {
        self.attempts.remove(username);
    }

    /// Number of failures still inside the window.
    pub fn attempt_count(&mut self, username: &str) -> usize {
        let now = Instant::now();
        match self.attempts.get_mut(username) {
            Some(attempts) => {
                attempts.retain(|t| now.duration_since(*t) < self.window);
                attempts.len()
            }
            None => 0,
        }
    }

    /// Drop usernames whose failures have all aged out.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < self.window);
            !attempts.is_empty()
        });
    }
}

/// Tracks active sessions and login attempts.
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<String, AuthSession>,
    limiter: LoginLimiter,
    session_ttl: Duration,
    idle_timeout: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    /// Create a session manager with default settings.
    pub fn new() -> Self {
        Self::with_config(
            Duration::from_secs(DEFAULT_SESSION_DURATION_SECS),
            Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            LoginLimiter::default(),
        )
    }

    /// Create a session manager with explicit timeouts and limiter.
    pub fn with_config(session_ttl: Duration, idle_timeout: Duration, limiter: LoginLimiter) -> Self {
        Self {
            sessions: HashMap::new(),
            limiter,
            session_ttl,
            idle_timeout,
        }
    }

    /// Build from the `[web]` and `[auth]` configuration sections.
    pub fn from_config(config: &Config) -> Self {
        Self::with_config(
            Duration::from_secs(config.web.session_ttl_secs),
            Duration::from_secs(config.web.session_idle_timeout_secs),
            LoginLimiter::with_config(
                config.auth.max_login_attempts,
                config.auth.lockout_secs,
                config.auth.lockout_secs,
            ),
        )
    }

    /// Refuse a login for `username` while it is locked out.
    ///
    /// Called before the password is verified, so a locked username costs
    /// no Argon2 work.
    pub fn check_login(&mut self, username: &str) -> Result<(), SessionError> {
        match self.limiter.check(username) {
            LimitResult::Allowed => Ok(()),
            LimitResult::Locked(remaining) => {
                warn!(
                    target: SECURITY_TARGET,
                    username = %username,
                    remaining_secs = remaining.as_secs(),
                    "Login attempt blocked: too many failures"
                );
                Err(SessionError::AccountLocked(remaining.as_secs().max(1)))
            }
        }
    }

    /// Record the outcome of a credential check done outside the manager.
    ///
    /// `verified` is the account whose password matched, or `None` for an
    /// unknown username or a wrong password; both count as one failure and
    /// return [`SessionError::InvalidCredentials`]. A username locked while
    /// the check ran stays locked even if its password matched.
    pub fn finish_login(
        &mut self,
        username: &str,
        verified: Option<Account>,
    ) -> Result<AuthSession, SessionError> {
        let Some(account) = verified else {
            self.limiter.record_failure(username);
            warn!(
                target: SECURITY_TARGET,
                username = %username,
                "Login failed: invalid credentials"
            );
            return Err(SessionError::InvalidCredentials);
        };

        self.check_login(username)?;
        self.limiter.clear(username);

        let session = AuthSession::new(account.id, &account.username, self.session_ttl);
        self.sessions.insert(session.token.clone(), session.clone());

        info!(
            username = %account.username,
            account_id = account.id,
            "Login successful"
        );

        Ok(session)
    }

    /// Open a session for an account that has just been verified elsewhere
    /// (right after registration).
    pub fn start_session(&mut self, account: &Account) -> AuthSession {
        let session = AuthSession::new(account.id, &account.username, self.session_ttl);
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    /// Log out a session by token, returning it if it existed.
    pub fn logout(&mut self, token: &str) -> Option<AuthSession> {
        let removed = self.sessions.remove(token);
        match &removed {
            Some(session) => info!(
                username = %session.username,
                account_id = session.account_id,
                "Logged out"
            ),
            None => debug!("Logout: session not found"),
        }
        removed
    }

    /// Validate a session without refreshing its activity.
    pub fn get_session(&mut self, token: &str) -> Result<&AuthSession, SessionError> {
        self.ensure_valid(token)?;
        self.sessions.get(token).ok_or(SessionError::SessionNotFound)
    }

    /// Validate a session and mark it active.
    pub fn touch_session(&mut self, token: &str) -> Result<&AuthSession, SessionError> {
        self.ensure_valid(token)?;
        let session = self
            .sessions
            .get_mut(token)
            .ok_or(SessionError::SessionNotFound)?;
        session.touch();
        Ok(&*session)
    }

    fn ensure_valid(&mut self, token: &str) -> Result<(), SessionError> {
        let valid = self
            .sessions
            .get(token)
            .map(|s| s.is_valid(self.idle_timeout))
            .ok_or(SessionError::SessionNotFound)?;

        if !valid {
            self.sessions.remove(token);
            return Err(SessionError::SessionExpired);
        }
        Ok(())
    }

    /// Drop expired sessions and stale limiter entries.
    pub fn cleanup(&mut self) -> usize {
        let before = self.sessions.len();
        let idle_timeout = self.idle_timeout;
        self.sessions.retain(|_, s| s.is_valid(idle_timeout));
        self.limiter.cleanup();

        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed = removed, "Cleaned up expired sessions");
        }
        removed
    }

    /// Number of active sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Access the login limiter.
    pub fn limiter(&mut self) -> &mut LoginLimiter {
        &mut self.limiter
    }
}
