//! Modules.
//!
//! A module groups related commands, slash commands, converters and checks
//! together with the state their handlers share. Modules register everything
//! explicitly from [`Module::init`]:
//!
//! ```rust,ignore
//! use herald_framework::prelude::*;
//!
//! struct Moderation { audit_channel: String }
//!
//! impl Module for Moderation {
//!     fn name(&self) -> &str {
//!         "moderation"
//!     }
//!
//!     fn init(self: Arc<Self>, scope: &mut ModuleScope<'_>) -> RegistryResult<()> {
//!         let this = Arc::clone(&self);
//!         scope.command(
//!             Command::builder("kick")
//!                 .param(Parameter::required(TypeTag::USER))
//!                 .permissions(["KICK_MEMBERS"])
//!                 .context_handler(move |ctx, args| {
//!                     let this = Arc::clone(&this);
//!                     async move { this.kick(ctx, args).await }
//!                 }),
//!         )?;
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::command::{Check, Command, SlashCommand};
use crate::converter::ArgumentConverter;
use crate::error::RegistryResult;
use crate::registry::Registry;

/// A unit of registration.
pub trait Module: Send + Sync + 'static {
    /// Returns the module's unique name.
    fn name(&self) -> &str;

    /// Registers the module's declarations.
    ///
    /// Called once. Handlers that need module state capture a clone of
    /// `self`.
    fn init(self: Arc<Self>, scope: &mut ModuleScope<'_>) -> RegistryResult<()>;
}

/// Registration surface handed to [`Module::init`].
///
/// Everything registered through a scope is tagged with the module's name.
pub struct ModuleScope<'a> {
    registry: &'a mut Registry,
    module: Arc<str>,
}

impl<'a> ModuleScope<'a> {
    pub(crate) fn new(registry: &'a mut Registry, module: Arc<str>) -> Self {
        Self { registry, module }
    }

    /// Returns the name of the module being initialised.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn command(&mut self, mut command: Command) -> RegistryResult<()> {
        command.module = Some(Arc::clone(&self.module));
        self.registry.register_command(command)
    }

    pub fn slash_command(&mut self, mut command: SlashCommand) -> RegistryResult<()> {
        command.module = Some(Arc::clone(&self.module));
        self.registry.register_slash_command(command)
    }

    pub fn converter(&mut self, mut converter: ArgumentConverter) -> RegistryResult<()> {
        converter.module = Some(Arc::clone(&self.module));
        self.registry.register_converter(converter)
    }

    /// Appends a check to an already registered command.
    pub fn check(&mut self, command: &str, check: Check) -> RegistryResult<()> {
        self.registry.register_check(command, check)
    }
}
