//! Installs the global `tracing` subscriber described by [`LoggingConfig`].
//!
//! Dispatches run inside `text_dispatch` and `interaction_dispatch` spans;
//! set `span_events.new` and `span_events.close` to see one line when each
//! command starts and one when it finishes.
//!
//! ```toml
//! [logging]
//! level = "info"
//! format = "compact"
//! output = "file"
//! file_path = "logs/herald.log"
//!
//! [logging.filters]
//! herald_framework = "debug"
//! ```
//!
//! `RUST_LOG` takes precedence over `level`; the per-target `filters` are
//! always applied on top.

use std::ffi::OsStr;
use std::path::Path;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};

const DEFAULT_LOG_FILE: &str = "herald.log";

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        LevelFilter::from_level(level.into())
    }
}

/// Initializes logging from `config`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = try_init(config);
}

/// Installs the global subscriber, failing if one already exists.
pub fn try_init(config: &LoggingConfig) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt_layer(config))
        .with(env_filter(config))
        .try_init()
}

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .from_env_lossy();

    target_directives(config)
        .into_iter()
        .fold(filter, EnvFilter::add_directive)
}

/// `target=level` directives from `config.filters`, sorted by target.
///
/// Entries that do not parse as a directive are skipped.
fn target_directives(config: &LoggingConfig) -> Vec<Directive> {
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort_by_key(|(target, _)| *target);

    filters
        .into_iter()
        .filter_map(|(target, level)| format!("{target}={level}").parse().ok())
        .collect()
}

fn fmt_span(events: &SpanEventConfig) -> FmtSpan {
    [
        (events.new, FmtSpan::NEW),
        (events.enter, FmtSpan::ENTER),
        (events.exit, FmtSpan::EXIT),
        (events.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |span, (_, event)| span | event)
}

fn make_writer(config: &LoggingConfig) -> BoxMakeWriter {
    match (config.output, &config.file_path) {
        (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
        (LogOutput::Stderr, _) => BoxMakeWriter::new(std::io::stderr),
        (LogOutput::File, Some(path)) => BoxMakeWriter::new(tracing_appender::rolling::never(
            path.parent().unwrap_or_else(|| Path::new(".")),
            path.file_name()
                .unwrap_or_else(|| OsStr::new(DEFAULT_LOG_FILE)),
        )),
        // Rejected by validation; nothing is installed yet to warn through.
        (LogOutput::File, None) => BoxMakeWriter::new(std::io::stdout),
    }
}

fn fmt_layer(config: &LoggingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = fmt::layer()
        .with_writer(make_writer(config))
        .with_ansi(config.output != LogOutput::File)
        .with_span_events(fmt_span(&config.span_events))
        .with_thread_ids(config.thread_ids)
        .with_file(config.file_location)
        .with_line_number(config.file_location);

    match config.format {
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        #[cfg(feature = "json-log")]
        LogFormat::Json => layer.json().boxed(),
        // Without `json-log`, JSON falls back to the full layout.
        #[cfg(not(feature = "json-log"))]
        LogFormat::Json => layer.boxed(),
        LogFormat::Full => layer.boxed(),
    }
}
