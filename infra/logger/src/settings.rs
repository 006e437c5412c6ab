use crate::error::LoggerError;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Logging section of a keepsake configuration file.
///
/// ```toml
/// [log]
/// level = "debug"
/// filter = "keepsake_store=trace"
/// path = "/var/log/keepsake"
/// json = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Minimum level: `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
    /// Extra `EnvFilter` directives. When set, `RUST_LOG` is ignored.
    pub filter: Option<String>,
    /// Directory for rolling log files. No file output when absent.
    pub path: Option<PathBuf>,
    /// Write files as JSON lines.
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, path: None, json: false }
    }
}

impl LogSettings {
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LevelFilter::from_str(self.level.trim()).map_err(|_| LoggerError::InvalidConfiguration {
            message: format!("Unknown log level '{}'", self.level).into(),
            context: Some("log.level".into()),
        })
    }
}
