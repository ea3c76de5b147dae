//! Logging setup for Arquivista.
//!
//! Every event goes to stdout and to the append-only main log file. Events
//! logged with the [`SECURITY_TARGET`] target (blocked path traversal,
//! failed and locked-out logins) are also copied to `logging.security_file`
//! when one is configured, so they can be watched apart from request noise.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::{Level, Metadata, Subscriber};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::Result;

/// Target for security-relevant events.
///
/// ```ignore
/// tracing::error!(target: SECURITY_TARGET, path = %raw, "Blocked delete outside the account root");
/// ```
pub const SECURITY_TARGET: &str = "arquivista::security";

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// `RUST_LOG` directives plus the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

fn is_security_event(metadata: &Metadata<'_>) -> bool {
    metadata.target() == SECURITY_TARGET
}

/// Open `path` for appending, creating missing parent directories.
fn open_append(path: &str) -> Result<Arc<File>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Arc::new(file))
}

/// Plain-text line format: timestamp, level, target, message and fields.
fn text_layer<S, W>(writer: W) -> fmt::Layer<S, DefaultFields, Format, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
}

/// Install the global subscriber described by `config`.
///
/// Fails when the main or the security log file cannot be opened; the
/// caller may then fall back to [`init_console_only`].
pub fn init(config: &LoggingConfig) -> Result<()> {
    let main_file = open_append(&config.file)?;
    let security_file = config
        .security_file
        .as_deref()
        .map(open_append)
        .transpose()?;

    tracing_subscriber::registry()
        .with(text_layer(std::io::stdout.and(main_file)).with_filter(env_filter(&config.level)))
        .with(security_file.map(|file| text_layer(file).with_filter(filter_fn(is_security_event))))
        .init();

    Ok(())
}

/// Console-only logging, used when the log files are unavailable.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_filter(env_filter(level)),
        )
        .init();
}
