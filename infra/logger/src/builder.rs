use crate::error::{LoggerError, LoggerErrorExt};
use crate::settings::LogSettings;
use crate::Logger;
use private::Sealed;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const DEFAULT_KEEP_FILES: usize = 10;
const FILE_SUFFIX: &str = "log";

type BoxedLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync>;

/// How rolling files are cut and written.
#[derive(Debug, Clone)]
struct FileFormat {
    rotation: Rotation,
    keep: usize,
    json: bool,
}

#[derive(Debug)]
struct Plan {
    level: LevelFilter,
    directives: Option<String>,
    console: bool,
    directory: Option<PathBuf>,
    format: FileFormat,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            directives: None,
            console: true,
            directory: None,
            format: FileFormat { rotation: Rotation::DAILY, keep: DEFAULT_KEEP_FILES, json: false },
        }
    }
}

#[derive(Debug, Default)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// Configures and installs the global tracing subscriber.
///
/// A name is required before [`LoggerBuilder::init`] becomes available; it prefixes
/// rolling log files.
#[derive(Debug, Default)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    name: N,
    plan: Plan,
}

impl LoggerBuilder<NoName> {
    #[must_use]
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { name: WithName(name.into()), plan: self.plan }
    }
}

impl LoggerBuilder<WithName> {
    /// Overlays a `[log]` configuration section. Console output is left as configured.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] if `settings.level` is unknown.
    pub fn settings(mut self, settings: &LogSettings) -> Result<Self, LoggerError> {
        self.plan.level = settings.level_filter()?;
        self.plan.directives.clone_from(&settings.filter);
        self.plan.directory.clone_from(&settings.path);
        self.plan.format.json = settings.json;
        Ok(self)
    }

    #[must_use]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.plan.level = level;
        self
    }

    /// `EnvFilter` directives such as `keepsake_store=debug`. Replaces `RUST_LOG`.
    #[must_use]
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.plan.directives = Some(directives.into());
        self
    }

    /// Toggles the compact stderr layer (on by default).
    #[must_use]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.plan.console = enabled;
        self
    }

    /// Writes rolling log files into `directory`, creating it on init.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.plan.directory = Some(directory.into());
        self
    }

    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.plan.format.rotation = rotation;
        self
    }

    /// Number of rotated files kept on disk.
    #[must_use]
    pub const fn keep_files(mut self, keep: usize) -> Self {
        self.plan.format.keep = keep;
        self
    }

    /// Writes files as JSON lines instead of plain text.
    #[must_use]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.plan.format.json = enabled;
        self
    }

    /// Installs the subscriber for the whole process.
    ///
    /// Keep the returned [`Logger`] alive until shutdown: it owns the background file writer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] If the name is blank, no output is enabled,
    ///   zero files are kept, or the directives do not parse.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] If the log directory is unusable.
    /// * [`LoggerError::Subscriber`] If a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let name = self.name.0;
        let plan = self.plan;
        plan.check(&name)?;

        let filter = plan.env_filter()?;
        let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

        if plan.console {
            layers.push(fmt::layer().compact().with_ansi(true).with_writer(std::io::stderr).boxed());
        }

        let guard = match &plan.directory {
            Some(directory) => {
                let (layer, guard) = file_layer(&name, directory, &plan.format)?;
                layers.push(layer);
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }
}

impl Plan {
    fn check(&self, name: &str) -> Result<(), LoggerError> {
        let invalid = |message: &'static str| {
            Err(LoggerError::InvalidConfiguration { message: message.into(), context: None })
        };

        if name.trim().is_empty() {
            return invalid("Logger name cannot be empty");
        }
        if !self.console && self.directory.is_none() {
            return invalid("No logging output enabled; enable the console or set a directory");
        }
        if self.format.keep == 0 {
            return invalid("At least one log file must be kept");
        }
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.directives {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder.parse(directives).map_err(|e| {
                LoggerError::InvalidConfiguration {
                    message: format!("Invalid filter directives '{directives}'").into(),
                    context: Some(e.to_string().into()),
                }
            }),
        }
    }
}

fn file_layer(
    name: &str,
    directory: &Path,
    format: &FileFormat,
) -> Result<(BoxedLayer, WorkerGuard), LoggerError> {
    fs::create_dir_all(directory)
        .context(format!("Cannot create log directory {}", directory.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(format.rotation.clone())
        .filename_prefix(name)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(format.keep)
        .build(directory)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer().with_writer(writer).with_ansi(false);
    let layer = if format.json { layer.json().boxed() } else { layer.boxed() };

    Ok((layer, guard))
}
