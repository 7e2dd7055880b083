//! Tracing setup.
//!
//! Diagnostics go to stderr by default, or to a file (`--log-file`) or a
//! per-run timestamped file inside a directory (`--log-dir`). The flags are
//! scanned before clap runs so that argument and configuration errors are
//! captured too.

use std::path::PathBuf;
use std::str::FromStr;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

impl LogLevel {
    /// Directive fragment for the `EnvFilter`.
    #[must_use]
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(()),
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// None disables logging entirely.
    pub level: Option<LogLevel>,
    /// Explicit output file; wins over `dir`.
    pub file: Option<PathBuf>,
    /// Directory receiving one `witkit_YYYYmmdd_HHMMSS.log` per run.
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
}

impl LogConfig {
    /// File to write to, if any; a `dir` target is created on demand.
    fn file_target(&self) -> Option<PathBuf> {
        if self.file.is_some() {
            return self.file.clone();
        }
        let dir = self.dir.as_ref()?;
        std::fs::create_dir_all(dir).ok()?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        Some(dir.join(format!("witkit_{stamp}.log")))
    }
}

/// Keeps the non-blocking writer alive; hold until process exit so
/// buffered log lines are flushed.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Initializes tracing per `config`.
///
/// Returns `None` when logging is disabled. File targets are opened in
/// append mode; if the file cannot be opened, logging falls back to stderr.
#[must_use = "dropping the guard stops log flushing"]
pub fn init_logging(config: LogConfig) -> Option<LogGuard> {
    let level = config.level?;
    // Only this crate's events; dependency noise stays out of the logs.
    let filter = EnvFilter::new(format!("witkit={}", level.as_filter_str()));

    let file = config
        .file_target()
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
    let to_file = file.is_some();

    let (writer, worker) = match file {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (config.format, to_file) {
        (LogFormat::Json, _) => fmt::layer()
            .with_writer(writer)
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (LogFormat::Text, true) => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        (LogFormat::Text, false) => fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_level(true)
            .compact()
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();

    Some(LogGuard { _worker: worker })
}

/// Scans argv and environment for logging settings, before clap runs.
///
/// CLI flags beat `WITKIT_LOG_*` environment variables; the fallback is
/// info-level text on stderr.
#[must_use]
pub fn parse_early_log_config(args: &[String]) -> LogConfig {
    let setting = |flag: &str, env: &str| -> Option<String> {
        extract_arg_value(args, flag).or_else(|| std::env::var(env).ok())
    };

    LogConfig {
        // Unrecognized level values fall back to the info default rather
        // than silencing logging altogether
        level: Some(
            setting("--log-level", "WITKIT_LOG_LEVEL")
                .and_then(|raw| raw.parse().ok())
                .unwrap_or_default(),
        ),
        file: setting("--log-file", "WITKIT_LOG_FILE").map(PathBuf::from),
        dir: setting("--log-dir", "WITKIT_LOG_DIR").map(PathBuf::from),
        format: setting("--log-format", "WITKIT_LOG_FORMAT")
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default(),
    }
}

fn extract_arg_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].clone())
}
