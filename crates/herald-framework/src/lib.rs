//! # Herald Framework
//!
//! Command resolution and execution for chat bots.
//!
//! This layer provides:
//! - A [`Registry`] of text commands, slash commands, converters and checks,
//!   populated explicitly at startup (directly or through [`Module`]s)
//! - The [`CapabilityGate`] for ownership and permission requirements
//! - The argument pipeline turning raw tokens into typed [`Args`]
//! - [`TextDispatcher`] and [`InteractionDispatcher`], both usable as tower
//!   services
//! - The [`ErrorChannel`] every dispatch failure is published on
//!
//! ```text
//! event ─▶ dispatcher ─▶ registry lookup ─▶ gate ─▶ checks ─▶ arguments ─▶ handler
//!                                             │        │          │           │
//!                                             └────────┴──────────┴───────────┴─▶ ErrorChannel
//! ```
//!
//! Checks and arguments apply to text commands only.

pub mod args;
pub mod channel;
pub mod command;
pub mod context;
pub mod converter;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod handler;
pub mod module;
pub mod registry;
pub mod service;

#[cfg(test)]
mod testing;

pub use args::Args;
pub use channel::{CommandRef, ErrorChannel, ErrorReport, ErrorSubscriber};
pub use command::{
    Check, Command, CommandBuilder, Parameter, Requirements, SlashCommand, SlashCommandBuilder,
    TypeTag,
};
pub use context::ExecutionContext;
pub use converter::ArgumentConverter;
pub use dispatcher::{
    DispatchOutcome, Dispatcher, DispatcherBuilder, IgnoreReason, InteractionDispatcher,
    MessageFilter, Prefix, TextDispatcher,
};
pub use error::{DispatchError, DispatchResult, ErrorKind, RegistryError, RegistryResult};
pub use gate::{CapabilityGate, GateOrder, GateStage};
pub use handler::{CommandHandler, HandlerResult, IntoHandlerResult, SlashHandler};
pub use module::{Module, ModuleScope};
pub use registry::Registry;

/// Prelude for common imports.
pub mod prelude {
    pub use std::sync::Arc;

    pub use herald_core::prelude::*;

    pub use crate::{
        ArgumentConverter, Args, Check, Command, DispatchOutcome, Dispatcher, ErrorChannel,
        ErrorKind, ErrorReport, ExecutionContext, Module, ModuleScope, Parameter, Prefix,
        Registry, RegistryResult, SlashCommand, TypeTag,
    };
}
