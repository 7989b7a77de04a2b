use std::future::Future;
use std::sync::Arc;

use herald_core::{InteractionEvent, Options, PermissionSet};

use super::Requirements;
use crate::handler::{IntoHandlerResult, SlashHandler};

/// A structured command invoked through platform interactions.
///
/// Options arrive typed from the platform, so slash commands declare no
/// parameters or checks.
#[derive(Debug, Clone)]
pub struct SlashCommand {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) requirements: Requirements,
    pub(crate) handler: SlashHandler,
    pub(crate) module: Option<Arc<str>>,
}

impl SlashCommand {
    /// Starts building a slash command with the given name.
    pub fn builder(name: impl Into<String>) -> SlashCommandBuilder {
        SlashCommandBuilder {
            name: name.into(),
            description: None,
            requirements: Requirements::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }

    /// Returns the module that registered this command, if any.
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    pub(crate) fn handler(&self) -> &SlashHandler {
        &self.handler
    }
}

/// Builder for [`SlashCommand`].
#[derive(Debug)]
#[must_use = "a slash command is only created by calling `handler`"]
pub struct SlashCommandBuilder {
    name: String,
    description: Option<String>,
    requirements: Requirements,
}

impl SlashCommandBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

    /// Finishes the command with its handler.
    pub fn handler<F, Fut, R>(self, handler: F) -> SlashCommand
    where
        F: Fn(Arc<InteractionEvent>, Options) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        SlashCommand {
            name: self.name,
            description: self.description,
            requirements: self.requirements,
            handler: SlashHandler::new(handler),
            module: None,
        }
    }
}
