//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeraldConfig {
    /// How text and interaction events are dispatched.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Logging output.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event loop and error channel settings.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Static text command prefix.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Actor ids allowed to run owner-only commands.
    #[serde(default)]
    pub owners: Vec<String>,

    /// Lets the bot's own messages invoke commands.
    #[serde(default)]
    pub allow_self: bool,

    /// Lets other bots' messages invoke commands.
    #[serde(default)]
    pub allow_bots: bool,

    /// Registers the built-in `number` converter at startup.
    #[serde(default = "default_true")]
    pub builtin_converters: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            owners: Vec::new(),
            allow_self: false,
            allow_bots: false,
            builtin_converters: true,
        }
    }
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_true() -> bool {
    true
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Reports buffered per error subscriber before the slowest one lags.
    #[serde(default = "default_error_channel_capacity")]
    pub error_channel_capacity: usize,

    /// Gives every error subscriber its own unbounded queue instead, so
    /// reports are never dropped. `error_channel_capacity` is then unused.
    #[serde(default)]
    pub unbounded_error_channel: bool,

    /// Logs every error report from a built-in subscriber.
    #[serde(default = "default_true")]
    pub log_errors: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            error_channel_capacity: default_error_channel_capacity(),
            unbounded_error_channel: false,
            log_errors: true,
        }
    }
}

fn default_error_channel_capacity() -> usize {
    256
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line, abbreviated.
    Compact,
    /// Single-line with all fields.
    #[default]
    Full,
    /// Multi-line, for humans.
    Pretty,
    /// Newline-delimited JSON. Needs the `json-log` feature.
    Json,
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// The file named by [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in each line.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line number in each line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file path, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target level overrides, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            filters: HashMap::new(),
        }
    }
}
