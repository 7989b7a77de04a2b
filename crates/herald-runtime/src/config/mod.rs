//! Configuration for the Herald runtime.
//!
//! Settings are layered with figment from built-in defaults, configuration
//! files, `HERALD_*` environment variables and programmatic overrides, then
//! checked by [`validate_config`] before the runtime uses them.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    DispatchConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, RuntimeConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
