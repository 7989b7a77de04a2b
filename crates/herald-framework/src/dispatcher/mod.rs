//! Event dispatchers.
//!
//! Two dispatchers turn platform events into handler invocations:
//!
//! - [`TextDispatcher`] for prefix-delimited text messages. It filters,
//!   resolves the prefix and command, runs the capability gate in
//!   [`GateOrder::Text`], the command's checks and the argument pipeline,
//!   then invokes the handler.
//! - [`InteractionDispatcher`] for structured interactions. It resolves the
//!   slash command by exact name, runs the gate in
//!   [`GateOrder::Interaction`] and invokes the handler with the
//!   platform-typed options.
//!
//! [`Dispatcher`] bundles both behind one entry point for an
//! [`InboundEvent`] stream. Every failure after resolution is published once
//! on the shared [`ErrorChannel`]; nothing is returned to the platform.
//!
//! [`GateOrder::Text`]: crate::gate::GateOrder::Text
//! [`GateOrder::Interaction`]: crate::gate::GateOrder::Interaction

use std::sync::Arc;

use herald_core::{BoxedClient, InboundEvent};

use crate::channel::ErrorChannel;
use crate::error::{DispatchError, ErrorKind};
use crate::gate::CapabilityGate;
use crate::registry::Registry;

mod interaction;
mod prefix;
mod text;

pub use interaction::InteractionDispatcher;
pub use prefix::Prefix;
pub use text::{MessageFilter, TextDispatcher};

/// How a single dispatch ended.
///
/// Failures have already been published on the error channel; the outcome
/// only mirrors them for callers and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler ran to completion.
    Executed {
        /// Canonical name of the executed command.
        command: String,
    },
    /// The event was not a command invocation, or was dropped silently.
    Ignored(IgnoreReason),
    /// The dispatch failed and was reported.
    Failed(ErrorKind),
}

impl DispatchOutcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed { .. })
    }
}

/// Why an event produced neither an execution nor a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sent by the bot itself.
    SelfMessage,
    /// Sent by another bot.
    BotMessage,
    /// The text does not start with the prefix.
    NoPrefix,
    /// No command answers to the invoked name.
    UnknownCommand,
    /// A check returned an error.
    CheckErrored,
}

/// Early termination of a resolved dispatch.
#[derive(Debug)]
pub(crate) enum Abort {
    /// Stop without reporting.
    Silent(IgnoreReason),
    /// Stop and report.
    Failed(DispatchError),
}

impl From<DispatchError> for Abort {
    fn from(error: DispatchError) -> Self {
        Self::Failed(error)
    }
}

/// Both dispatchers sharing one registry, gate and error channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    text: TextDispatcher,
    interaction: InteractionDispatcher,
}

impl Dispatcher {
    pub fn builder(registry: Arc<Registry>, client: BoxedClient) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            client,
            prefix: Prefix::default(),
            owners: Vec::new(),
            filter: MessageFilter::default(),
            errors: None,
        }
    }

    pub fn new(text: TextDispatcher, interaction: InteractionDispatcher) -> Self {
        Self { text, interaction }
    }

    pub fn text(&self) -> &TextDispatcher {
        &self.text
    }

    pub fn interaction(&self) -> &InteractionDispatcher {
        &self.interaction
    }

    /// Returns the channel of the text dispatcher.
    pub fn error_channel(&self) -> &ErrorChannel {
        self.text.error_channel()
    }

    /// Routes an inbound event to the matching dispatcher.
    pub async fn dispatch(&self, event: InboundEvent) -> DispatchOutcome {
        match event {
            InboundEvent::Message(event) => self.text.dispatch(Arc::new(event)).await,
            InboundEvent::Interaction(event) => self.interaction.dispatch(Arc::new(event)).await,
        }
    }
}

/// Builder for [`Dispatcher`].
#[must_use]
pub struct DispatcherBuilder {
    registry: Arc<Registry>,
    client: BoxedClient,
    prefix: Prefix,
    owners: Vec<String>,
    filter: MessageFilter,
    errors: Option<ErrorChannel>,
}

impl DispatcherBuilder {
    /// Sets the text command prefix. Defaults to `!`.
    pub fn prefix(mut self, prefix: impl Into<Prefix>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the actors allowed to run owner-only commands.
    pub fn owners<I, S>(mut self, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    /// Lets the bot's own messages invoke commands.
    pub fn allow_self(mut self, allow: bool) -> Self {
        self.filter.allow_self = allow;
        self
    }

    /// Lets other bots' messages invoke commands.
    pub fn allow_bots(mut self, allow: bool) -> Self {
        self.filter.allow_bots = allow;
        self
    }

    /// Publishes failures on an existing channel instead of a new one.
    pub fn error_channel(mut self, errors: ErrorChannel) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn build(self) -> Dispatcher {
        let errors = self.errors.unwrap_or_default();
        let gate = CapabilityGate::new(self.client, self.owners);

        Dispatcher {
            text: TextDispatcher::new(
                Arc::clone(&self.registry),
                gate.clone(),
                self.prefix,
                self.filter,
                errors.clone(),
            ),
            interaction: InteractionDispatcher::new(self.registry, gate, errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{InteractionEvent, MessageEvent};

    use crate::command::{Command, SlashCommand};
    use crate::testing::MockClient;

    #[tokio::test]
    async fn test_inbound_events_are_routed() {
        let mut registry = Registry::new();
        registry
            .register_command(Command::builder("ping").handler(|_e, _a| async {}))
            .unwrap();
        registry
            .register_slash_command(SlashCommand::builder("ping").handler(|_e, _o| async {}))
            .unwrap();

        let dispatcher = Dispatcher::builder(Arc::new(registry), MockClient::new("bot").boxed())
            .prefix("?")
            .build();

        let text = MessageEvent::new("user", "c", "?ping").into();
        let slash = InteractionEvent::new("user", "c", "ping").into();
        let unknown = InteractionEvent::new("user", "c", "pong").into();

        let executed = DispatchOutcome::Executed {
            command: "ping".into(),
        };
        assert_eq!(dispatcher.dispatch(text).await, executed);
        assert_eq!(dispatcher.dispatch(slash).await, executed);
        assert_eq!(
            dispatcher.dispatch(unknown).await,
            DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
        );
    }

    #[tokio::test]
    async fn test_dispatchers_share_one_channel() {
        let dispatcher =
            Dispatcher::builder(Arc::new(Registry::new()), MockClient::new("bot").boxed()).build();
        let _subscriber = dispatcher.error_channel().subscribe();
        assert_eq!(dispatcher.interaction().error_channel().subscriber_count(), 1);
    }
}
