use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, debug, debug_span, trace};

use herald_core::{Event, InteractionEvent};

use super::{DispatchOutcome, IgnoreReason};
use crate::channel::{ErrorChannel, ErrorReport};
use crate::command::SlashCommand;
use crate::error::{DispatchError, DispatchResult};
use crate::gate::{CapabilityGate, GateOrder};
use crate::handler::run_guarded;
use crate::registry::Registry;

/// Dispatches structured interactions to slash commands.
#[derive(Clone)]
pub struct InteractionDispatcher {
    registry: Arc<Registry>,
    gate: CapabilityGate,
    errors: ErrorChannel,
}

impl InteractionDispatcher {
    pub fn new(registry: Arc<Registry>, gate: CapabilityGate, errors: ErrorChannel) -> Self {
        Self {
            registry,
            gate,
            errors,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Dispatches one interaction to completion.
    pub async fn dispatch(&self, event: Arc<InteractionEvent>) -> DispatchOutcome {
        let span = debug_span!(
            "interaction_dispatch",
            interaction_id = %event.id,
            user = %event.user_id,
            command = %event.command_name,
        );
        self.dispatch_inner(event).instrument(span).await
    }

    async fn dispatch_inner(&self, event: Arc<InteractionEvent>) -> DispatchOutcome {
        let Some(command) = self.registry.slash_command(&event.command_name).cloned() else {
            trace!("no slash command registered under this name");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand);
        };

        match self.execute(&event, &command).await {
            Ok(()) => {
                debug!("Slash command executed");
                DispatchOutcome::Executed {
                    command: command.name().to_owned(),
                }
            }
            Err(error) => {
                let kind = error.kind();
                debug!(%kind, %error, "Slash command failed");
                self.errors
                    .emit(ErrorReport::new(error, event, Some(command.into())));
                DispatchOutcome::Failed(kind)
            }
        }
    }

    async fn execute(
        &self,
        event: &Arc<InteractionEvent>,
        command: &Arc<SlashCommand>,
    ) -> DispatchResult<()> {
        self.gate
            .run(
                GateOrder::Interaction,
                command.requirements(),
                &event.user_id,
                &event.location(),
            )
            .await?;

        run_guarded(command.handler().call(Arc::clone(event), event.options.clone()))
            .await
            .map_err(DispatchError::execution)
    }
}

impl fmt::Debug for InteractionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionDispatcher")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}
