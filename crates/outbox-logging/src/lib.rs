//! Structured logging setup for the `outbox` binary
//!
//! Library crates only emit `tracing` events. The binary builds a
//! [`LogConfig`] from its flags and calls [`init`] once at startup.
//!
//! Console output always goes to stderr so the JSON printed on stdout stays
//! machine-readable. It is JSONL unless `pretty` is set. With a log
//! directory, the same events are also appended as JSONL to a daily-rolling
//! `outbox.<date>.log`. `RUST_LOG` overrides the configured level.
//!
//! ```ignore
//! let config = outbox_logging::LogConfig::new("debug").with_log_dir("./logs");
//! let _guard = outbox_logging::init(&config);
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of rolled log files
pub const LOG_FILE_PREFIX: &str = "outbox";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Errors raised while installing the subscriber
#[derive(Debug, Error)]
pub enum LogError {
    /// Log directory could not be created
    #[error("Cannot create log directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rolling appender could not be built
    #[error("Cannot create rolling log appender: {0}")]
    Appender(String),

    /// A global subscriber is already installed
    #[error("Global subscriber already set: {0}")]
    AlreadyInitialized(String),
}

/// Logging choices exposed on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Human-readable console lines instead of JSONL
    pub pretty: bool,
    /// Directory for rolling JSONL log files
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            pretty: false,
            log_dir: None,
        }
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("warn")
    }
}

/// Install the global subscriber, reporting failures on stderr
///
/// The returned guard flushes file output when dropped and must be held
/// until the program exits.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    match try_init(config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    }
}

/// Install the global subscriber
///
/// # Errors
///
/// Fails if the log directory cannot be prepared or a global subscriber is
/// already set.
pub fn try_init(config: &LogConfig) -> Result<Option<WorkerGuard>, LogError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.pretty)];
    let mut guard = None;

    if let Some(dir) = &config.log_dir {
        let (writer, file_guard) = file_writer(dir)?;
        layers.push(json_layer(writer));
        guard = Some(file_guard);
    }

    Registry::default()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

fn console_layer(pretty: bool) -> BoxedLayer {
    if pretty {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        json_layer(std::io::stderr)
    }
}

fn json_layer<W>(writer: W) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .flatten_event(true)
        .with_writer(writer)
        .boxed()
}

/// Daily-rolling non-blocking writer under `dir`, created if missing
fn file_writer(dir: &Path) -> Result<(NonBlocking, WorkerGuard), LogError> {
    std::fs::create_dir_all(dir).map_err(|source| LogError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(dir)
        .map_err(|e| LogError::Appender(e.to_string()))?;
    Ok(tracing_appender::non_blocking(appender))
}
