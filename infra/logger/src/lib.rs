//! # Logger
//!
//! Installs the process-wide [`tracing`] subscriber from a
//! [`LoggingConfig`](keeper_domain::config::LoggingConfig): a compact console layer, an
//! optional daily-rolling file layer (plain or JSON), and an [`EnvFilter`] built from the
//! configured level, extra directives and `RUST_LOG`.
//!
//! ## Example
//!
//! ```rust
//! use keeper_domain::config::LoggingConfig;
//! use keeper_logger::Logger;
//!
//! let _logger = Logger::builder("keeper").config(&LoggingConfig::default()).init().unwrap();
//! tracing::info!("ready");
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;

use keeper_domain::config::LoggingConfig;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE_SUFFIX: &str = "log";

/// Configures and installs the global tracing subscriber.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug)]
pub struct LoggerBuilder {
    name: String,
    level: LevelFilter,
    filter: Option<String>,
    console: bool,
    directory: Option<PathBuf>,
    json: bool,
    max_files: usize,
}

impl LoggerBuilder {
    fn new(name: impl Into<String>) -> Self {
        let defaults = LoggingConfig::default();
        Self {
            name: name.into(),
            level: LevelFilter::INFO,
            filter: defaults.filter,
            console: defaults.console,
            directory: defaults.directory,
            json: defaults.json,
            max_files: defaults.max_files,
        }
    }

    /// Applies every field of a logging section.
    ///
    /// An unparsable `level` is kept aside and reported by [`LoggerBuilder::init`].
    pub fn config(mut self, config: &LoggingConfig) -> Self {
        self.filter = match (&config.filter, LevelFilter::from_str(&config.level)) {
            (filter, Ok(level)) => {
                self.level = level;
                filter.clone()
            }
            (Some(filter), Err(_)) => Some(format!("{},{filter}", config.level)),
            (None, Err(_)) => Some(config.level.clone()),
        };
        self.console = config.console;
        self.directory.clone_from(&config.directory);
        self.json = config.json;
        self.max_files = config.max_files;
        self
    }

    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Adds directives such as `keeper_session=debug,surrealdb=warn`.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Enables daily-rolling file output into `directory`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Writes file output as JSON lines.
    pub const fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    /// Installs the subscriber.
    ///
    /// The returned [`Logger`] owns the file writer's worker guard and must outlive all
    /// logging.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`, an invalid
    ///   filter, or when neither console nor file output is enabled.
    /// * [`LoggerError::Internal`] if the log directory cannot be created.
    /// * [`LoggerError::Appender`] if the rolling appender cannot be built.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        self.validate()?;
        let env_filter = self.env_filter()?;

        let mut layers = Vec::new();
        if self.console {
            layers.push(layer().compact().with_ansi(true).boxed());
        }

        let guard = match &self.directory {
            Some(directory) => {
                fs::create_dir_all(directory)
                    .context(format!("Creating log directory {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::DAILY)
                    .filename_prefix(&self.name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.max_files)
                    .build(directory)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if self.json { file_layer.json().boxed() } else { file_layer.boxed() });
                Some(guard)
            }
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled; enable console or set a directory".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(env_filter).with(layers).try_init()?;

        Ok(Logger { guard })
    }

    fn validate(&self) -> Result<(), LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "Logger name cannot be empty".into(),
                context: None,
            });
        }
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "max_files must be greater than zero".into(),
                context: None,
            });
        }
        Ok(())
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.filter {
            Some(filter) => builder.parse(filter).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("Invalid filter '{filter}': {e}").into(),
                context: None,
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

/// Handle to the installed subscriber.
///
/// Dropping it flushes and stops the background file writer.
#[must_use = "Dropping this handle stops background log writing."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a builder; `name` prefixes rolling file names (`keeper.2026-10-18.log`).
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    /// Returns `true` when file output is active.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}
