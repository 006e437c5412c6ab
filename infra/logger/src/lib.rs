//! # Keepsake Logger
//!
//! Process-wide `tracing` setup for keepsake binaries: a compact stderr layer, an optional
//! rolling file layer behind a non-blocking writer, and an `EnvFilter` driven either by
//! explicit directives or by `RUST_LOG`.
//!
//! Libraries in this workspace only emit events; binaries call [`Logger::builder`] once.
//!
//! ## Example
//!
//! ```rust
//! use keepsake_logger::{LevelFilter, LogSettings, Logger};
//!
//! # fn main() -> Result<(), keepsake_logger::LoggerError> {
//! let settings = LogSettings { level: "debug".to_owned(), ..LogSettings::default() };
//!
//! let _logger = Logger::builder()
//!     .name("keepsake")
//!     .settings(&settings)?
//!     .directives("keepsake_store=trace")
//!     .init()?;
//!
//! tracing::debug!("ready");
//! # let _ = LevelFilter::DEBUG;
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod settings;

pub use crate::builder::{LoggerBuilder, NoName, WithName};
pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::settings::LogSettings;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use tracing_appender::non_blocking::WorkerGuard;

/// Handle to the installed subscriber.
///
/// Dropping it flushes and stops the background file writer.
#[must_use = "Dropping the handle stops file logging"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// `true` when a rolling file writer is attached.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.writes_files() {
            tracing::debug!("Flushing log files");
        }
    }
}
