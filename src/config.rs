//! Configuration module for Arquivista.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path};

use crate::{ArquivistaError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Name of the cookie carrying the session token.
    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,
    /// Absolute session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// Idle timeout in seconds.
    #[serde(default = "default_session_idle_timeout")]
    pub session_idle_timeout_secs: u64,
    /// Mark the session cookie `Secure` (HTTPS deployments).
    #[serde(default)]
    pub cookie_secure: bool,
    /// Maximum request body size in megabytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size_mb: u64,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

fn default_session_cookie_name() -> String {
    "arquivista_session".to_string()
}

fn default_session_ttl() -> u64 {
    24 * 60 * 60
}

fn default_session_idle_timeout() -> u64 {
    30 * 60
}

fn default_max_request_size() -> u64 {
    100
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            session_cookie_name: default_session_cookie_name(),
            session_ttl_secs: default_session_ttl(),
            session_idle_timeout_secs: default_session_idle_timeout(),
            cookie_secure: false,
            max_request_size_mb: default_max_request_size(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/arquivista.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// File organization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Directory under which every account gets its own root.
    #[serde(default = "default_upload_root")]
    pub upload_root: String,
    /// Maximum number of files accepted in one upload.
    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_upload: usize,
    /// Category for allowed extensions without a table entry.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,
    /// Extension (lower-case, no dot) to category path.
    ///
    /// The keys double as the upload allow-list.
    #[serde(default = "default_extensions")]
    pub extensions: BTreeMap<String, String>,
}

fn default_upload_root() -> String {
    "uploads".to_string()
}

fn default_max_files_per_upload() -> usize {
    40
}

fn default_fallback_category() -> String {
    "outros".to_string()
}

/// The built-in extension table.
pub fn default_extensions() -> BTreeMap<String, String> {
    [
        ("png", "imagens/png"),
        ("jpg", "imagens/jpg_jpeg"),
        ("jpeg", "imagens/jpg_jpeg"),
        ("gif", "imagens/gif"),
        ("webp", "imagens/webp"),
        ("svg", "imagens/vetoriais"),
        ("docx", "documentos/word"),
        ("doc", "documentos/word"),
        ("xlsx", "documentos/excel"),
        ("xls", "documentos/excel"),
        ("pptx", "documentos/powerpoint"),
        ("ppt", "documentos/powerpoint"),
        ("pdf", "documentos/pdf"),
        ("txt", "documentos/texto"),
        ("mp3", "multimedia/audio"),
        ("wav", "multimedia/audio"),
        ("mp4", "multimedia/video"),
        ("zip", "compactados"),
        ("rar", "compactados"),
    ]
    .into_iter()
    .map(|(ext, category)| (ext.to_string(), category.to_string()))
    .collect()
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            max_files_per_upload: default_max_files_per_upload(),
            fallback_category: default_fallback_category(),
            extensions: default_extensions(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Require a login for file operations.
    ///
    /// When false every anonymous request acts as the single local account.
    #[serde(default = "default_require_login")]
    pub require_login: bool,
    /// Failed logins tolerated per username before lockout.
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts: u32,
    /// Lockout window in seconds.
    #[serde(default = "default_lockout_secs")]
    pub lockout_secs: u64,
}

fn default_require_login() -> bool {
    true
}

fn default_max_login_attempts() -> u32 {
    5
}

fn default_lockout_secs() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            require_login: default_require_login(),
            max_login_attempts: default_max_login_attempts(),
            lockout_secs: default_lockout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
    /// Extra file receiving only security events (traversal attempts,
    /// failed and blocked logins). Disabled when unset.
    #[serde(default)]
    pub security_file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/arquivista.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            security_file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// File organization configuration.
    #[serde(default)]
    pub files: FilesConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ArquivistaError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ArquivistaError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `ARQUIVISTA_UPLOAD_ROOT`: Override the upload root directory
    /// - `ARQUIVISTA_DATABASE_PATH`: Override the SQLite database path
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("ARQUIVISTA_UPLOAD_ROOT") {
            if !root.is_empty() {
                self.files.upload_root = root;
            }
        }
        if let Ok(db_path) = std::env::var("ARQUIVISTA_DATABASE_PATH") {
            if !db_path.is_empty() {
                self.database.path = db_path;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Category paths become directories under each account root, so they
    /// must be relative and free of `.`/`..` segments.
    pub fn validate(&self) -> Result<()> {
        if self.files.max_files_per_upload == 0 {
            return Err(ArquivistaError::Config(
                "files.max_files_per_upload must be greater than zero".to_string(),
            ));
        }
        if self.files.upload_root.trim().is_empty() {
            return Err(ArquivistaError::Config(
                "files.upload_root must not be empty".to_string(),
            ));
        }
        if !is_safe_category(&self.files.fallback_category) {
            return Err(ArquivistaError::Config(format!(
                "invalid fallback category: {:?}",
                self.files.fallback_category
            )));
        }
        for (ext, category) in &self.files.extensions {
            if ext.is_empty() || ext.contains('.') || ext.to_lowercase() != *ext {
                return Err(ArquivistaError::Config(format!(
                    "invalid extension key: {ext:?} (use lower-case, without the dot)"
                )));
            }
            if !is_safe_category(category) {
                return Err(ArquivistaError::Config(format!(
                    "invalid category for extension {ext:?}: {category:?}"
                )));
            }
        }
        Ok(())
    }
}

/// A category path is one or more plain, slash-separated segments.
fn is_safe_category(category: &str) -> bool {
    if category.is_empty() || category.contains('\\') {
        return false;
    }
    let path = Path::new(category);
    !path.is_absolute()
        && category.split('/').all(|segment| !segment.is_empty())
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}
