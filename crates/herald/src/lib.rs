//! # Herald
//!
//! Command resolution and execution for chat bots.
//!
//! ## Overview
//!
//! Herald sits between a chat platform and your command handlers. The
//! platform delivers text messages and structured interactions; Herald
//! decides which command they invoke, whether the invoker may run it, turns
//! the raw text into typed arguments and calls the handler. Every failure
//! lands on one error channel instead of being returned to the platform.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  InboundEvent  ┌─────────┐   ┌────────────┐   ┌──────┐   ┌────────┐   ┌───────────┐   ┌─────────┐
//! │ Platform │───────────────▶│ Runtime │──▶│ Dispatcher │──▶│ Gate │──▶│ Checks │──▶│ Arguments │──▶│ Handler │
//! └──────────┘                └─────────┘   └────────────┘   └──────┘   └────────┘   └───────────┘   └─────────┘
//!                                                  │              │          │             │              │
//!                                                  └──────────────┴──────────┴─────────────┴──────────────┴─▶ ErrorChannel
//! ```
//!
//! - **Core**: events, locations, permissions and the [`Client`](core::Client) trait
//! - **Framework**: registry, capability gate, pipelines and dispatchers
//! - **Runtime**: configuration, logging and the event loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = HeraldRuntime::builder(gateway.client()).build()?;
//!
//!     runtime.register_command(
//!         Command::builder("add")
//!             .param(Parameter::required(TypeTag::NUMBER))
//!             .param(Parameter::required(TypeTag::NUMBER))
//!             .handler(|event, args| async move {
//!                 let sum = args.parse::<f64>(0)?.unwrap_or_default()
//!                     + args.parse::<f64>(1)?.unwrap_or_default();
//!                 gateway.reply(&event, sum.to_string()).await
//!             }),
//!     )?;
//!
//!     runtime.run_until_signal(gateway.events()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use herald_runtime::{HeraldConfig, HeraldRuntime, RuntimeError, RuntimeResult};

    // Declarations
    pub use herald_framework::prelude::*;
    pub use herald_framework::{HandlerResult, Requirements};

    // Error reporting
    pub use herald_framework::{DispatchError, ErrorSubscriber};
}
