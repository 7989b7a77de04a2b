//! Command definitions.
//!
//! Commands are declared with builders instead of attributes. A text command
//! lists its aliases, positional parameters, checks and permission
//! requirements, then is finished by attaching a handler:
//!
//! ```rust,ignore
//! use herald_framework::prelude::*;
//!
//! let add = Command::builder("add")
//!     .alias("plus")
//!     .param(Parameter::required(TypeTag::NUMBER))
//!     .param(Parameter::required(TypeTag::NUMBER))
//!     .check(Check::sync(|event| event.guild_id.is_some()))
//!     .handler(|event: Arc<MessageEvent>, args: Args| async move {
//!         let a: f64 = args.parse(0)?.unwrap_or_default();
//!         let b: f64 = args.parse(1)?.unwrap_or_default();
//!         tracing::info!(author = %event.author_id, sum = a + b);
//!         Ok::<_, serde_json::Error>(())
//!     });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use herald_core::{MessageEvent, PermissionSet};

mod check;
mod parameter;
mod slash;

pub use check::Check;
pub use parameter::{Parameter, TypeTag};
pub use slash::{SlashCommand, SlashCommandBuilder};

pub(crate) use parameter::validate_parameters;

use crate::args::Args;
use crate::context::ExecutionContext;
use crate::handler::{CommandHandler, IntoHandlerResult};

/// Ownership and permission requirements evaluated by the capability gate.
///
/// Shared by text and slash commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements {
    /// Only configured owners may invoke the command.
    pub owner_only: bool,
    /// Permissions the bot must hold where the command is invoked.
    pub client_permissions: PermissionSet,
    /// Permissions the invoking user must hold.
    pub user_permissions: PermissionSet,
}

/// A text command resolved by name or alias after the prefix.
#[derive(Clone)]
pub struct Command {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: Option<String>,
    pub(crate) params: Vec<Parameter>,
    pub(crate) checks: Vec<Check>,
    pub(crate) requirements: Requirements,
    pub(crate) handler: CommandHandler,
    pub(crate) module: Option<Arc<str>>,
}

impl Command {
    /// Starts building a command with the given name.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder {
            name: name.into(),
            aliases: Vec::new(),
            description: None,
            params: Vec::new(),
            checks: Vec::new(),
            requirements: Requirements::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Returns the checks in evaluation order.
    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    /// Returns `true` if the handler receives an [`ExecutionContext`].
    pub fn wants_context(&self) -> bool {
        self.handler.wants_context()
    }

    /// Returns the module that registered this command, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub(crate) fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    /// Returns `true` if `token` names this command, ignoring case.
    pub fn answers_to(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.name.to_lowercase() == token
            || self.aliases.iter().any(|alias| alias.to_lowercase() == token)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("params", &self.params)
            .field("checks", &self.checks.len())
            .field("requirements", &self.requirements)
            .field("handler", &self.handler)
            .field("module", &self.module)
            .finish()
    }
}

/// Builder for [`Command`].
#[derive(Debug)]
#[must_use = "a command is only created by calling `handler` or `context_handler`"]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: Option<String>,
    params: Vec<Parameter>,
    checks: Vec<Check>,
    requirements: Requirements,
}

impl CommandBuilder {
    /// Adds an alternate name.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a positional parameter.
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Appends a check. Checks run in the order they are added.
    pub fn check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }

    /// Requires the invoking user to hold these permissions.
    pub fn permissions(mut self, permissions: impl Into<PermissionSet>) -> Self {
        self.requirements.user_permissions = permissions.into();
        self
    }

    /// Requires the bot to hold these permissions.
    pub fn client_permissions(mut self, permissions: impl Into<PermissionSet>) -> Self {
        self.requirements.client_permissions = permissions.into();
        self
    }

    /// Restricts the command to configured owners.
    pub fn owner_only(mut self) -> Self {
        self.requirements.owner_only = true;
        self
    }

    /// Finishes the command with a handler receiving the raw event.
    pub fn handler<F, Fut, R>(self, handler: F) -> Command
    where
        F: Fn(Arc<MessageEvent>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        self.finish(CommandHandler::event(handler))
    }

    /// Finishes the command with a handler receiving an [`ExecutionContext`].
    pub fn context_handler<F, Fut, R>(self, handler: F) -> Command
    where
        F: Fn(ExecutionContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        self.finish(CommandHandler::context(handler))
    }

    fn finish(self, handler: CommandHandler) -> Command {
        Command {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            params: self.params,
            checks: self.checks,
            requirements: self.requirements,
            handler,
            module: None,
        }
    }
}
