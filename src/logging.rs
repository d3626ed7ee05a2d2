//! Logging setup.
//!
//! The TUI owns the terminal, so nothing is written to stdout or stderr: logs
//! go to systemd's journal when it is reachable and to a daily rolling file
//! under [`default_log_dir`] otherwise.

use anyhow::Result;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "ANIMALID_LOG";

/// ONNX Runtime and the HTTP stack log every session and request at info.
const DEFAULT_DIRECTIVE: &str = "info,ort=warn,ureq=warn,rustls=warn";

/// Filter for a user directive, falling back to the default on absence or
/// parse failure.
pub fn filter_from(directive: Option<&str>) -> EnvFilter {
    directive
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("animalid")
        .join("logs")
}

/// Initialize the global subscriber. Fails if one is already installed.
pub fn init(log_dir: Option<PathBuf>) -> Result<()> {
    let directive = std::env::var(LOG_ENV).ok();
    let env_filter = filter_from(directive.as_deref());

    #[cfg(target_os = "linux")]
    {
        if let Ok(journald_layer) = tracing_journald::layer() {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(journald_layer.with_syslog_identifier("animalid".to_string()))
                .try_init()?;

            tracing::info!(version = env!("CARGO_PKG_VERSION"), "Logging to journald");
            return Ok(());
        }
    }

    let log_dir = log_dir.unwrap_or_else(default_log_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "animalid.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer stops flushing once the guard drops.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), dir = ?log_dir, "Logging to file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_quiets_model_and_http_crates() {
        let filter = filter_from(None).to_string();
        assert!(filter.contains("ort=warn"));
        assert!(filter.contains("ureq=warn"));
    }

    #[test]
    fn test_user_directive_replaces_default() {
        let filter = filter_from(Some("animalid=debug")).to_string();
        assert!(filter.contains("animalid=debug"));
        assert!(!filter.contains("ort=warn"));
    }

    #[test]
    fn test_invalid_directive_falls_back() {
        let filter = filter_from(Some("animalid=loud")).to_string();
        assert!(filter.contains("ort=warn"));
    }

    #[test]
    fn test_default_log_dir_is_namespaced() {
        assert!(default_log_dir().ends_with("animalid/logs"));
    }
}
