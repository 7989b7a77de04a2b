//! Execution context.
//!
//! An [`ExecutionContext`] is built once per dispatch for handlers that ask
//! for one. It is immutable and cheap to clone; every clone refers to the
//! same dispatch.

use std::fmt;
use std::sync::Arc;

use herald_core::{BoxedClient, MessageEvent};

use crate::command::Command;

struct Inner {
    event: Arc<MessageEvent>,
    prefix: String,
    invoked_with: String,
    command: Arc<Command>,
    client: BoxedClient,
}

/// The per-dispatch view handed to context handlers.
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<Inner>,
}

impl ExecutionContext {
    pub(crate) fn new(
        event: Arc<MessageEvent>,
        prefix: String,
        invoked_with: String,
        command: Arc<Command>,
        client: BoxedClient,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                event,
                prefix,
                invoked_with,
                command,
                client,
            }),
        }
    }

    /// Returns the message that triggered the command.
    pub fn event(&self) -> &Arc<MessageEvent> {
        &self.inner.event
    }

    /// Returns the prefix resolved for this message.
    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Returns the name or alias the user typed, as typed.
    pub fn invoked_with(&self) -> &str {
        &self.inner.invoked_with
    }

    pub fn command(&self) -> &Arc<Command> {
        &self.inner.command
    }

    pub fn client(&self) -> &BoxedClient {
        &self.inner.client
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("event", &self.inner.event)
            .field("prefix", &self.inner.prefix)
            .field("invoked_with", &self.inner.invoked_with)
            .field("command", &self.inner.command.name())
            .finish_non_exhaustive()
    }
}
