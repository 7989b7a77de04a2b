//! Herald Runtime - configuration, logging and the event loop.
//!
//! This crate provides:
//! - Layered configuration (`HeraldConfig`, `ConfigLoader`) on figment
//! - Logging setup (`logging::init_from_config`) on tracing-subscriber
//! - The event loop (`HeraldRuntime`) that seals the registry and dispatches
//!   each inbound event on its own task
//!
//! ```ignore
//! use std::sync::Arc;
//! use herald_runtime::HeraldRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let gateway = Gateway::connect().await?;
//!     let runtime = HeraldRuntime::builder(gateway.client()).build()?;
//!
//!     runtime.register_command(ping_command())?;
//!
//!     // Run until the gateway closes or Ctrl+C
//!     runtime.run_until_signal(gateway.events()).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig, Profile};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{HeraldRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
