use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, debug, debug_span, trace, warn};

use herald_core::{Event, MessageEvent};

use super::{Abort, DispatchOutcome, IgnoreReason, Prefix};
use crate::args::{convert_arguments, tokenize};
use crate::channel::{ErrorChannel, ErrorReport};
use crate::command::Command;
use crate::context::ExecutionContext;
use crate::error::DispatchError;
use crate::gate::{CapabilityGate, GateOrder};
use crate::handler::{CommandHandler, run_guarded};
use crate::registry::Registry;

/// Decides which authors may invoke text commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MessageFilter {
    /// Accept messages sent by the bot itself.
    pub allow_self: bool,
    /// Accept messages sent by other bots.
    pub allow_bots: bool,
}

impl MessageFilter {
    /// Returns why `event` must be dropped, if it must.
    pub fn reject(&self, event: &MessageEvent, self_id: &str) -> Option<IgnoreReason> {
        if event.author_id == self_id {
            return (!self.allow_self).then_some(IgnoreReason::SelfMessage);
        }
        if event.author_is_bot && !self.allow_bots {
            return Some(IgnoreReason::BotMessage);
        }
        None
    }
}

/// Dispatches prefix-delimited text messages.
///
/// Cloning is cheap; clones share the registry and the error channel.
#[derive(Clone)]
pub struct TextDispatcher {
    registry: Arc<Registry>,
    gate: CapabilityGate,
    prefix: Prefix,
    filter: MessageFilter,
    errors: ErrorChannel,
}

impl TextDispatcher {
    pub fn new(
        registry: Arc<Registry>,
        gate: CapabilityGate,
        prefix: Prefix,
        filter: MessageFilter,
        errors: ErrorChannel,
    ) -> Self {
        Self {
            registry,
            gate,
            prefix,
            filter,
            errors,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn error_channel(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Dispatches one message to completion.
    pub async fn dispatch(&self, event: Arc<MessageEvent>) -> DispatchOutcome {
        let span = debug_span!(
            "text_dispatch",
            message_id = %event.id,
            author = %event.author_id,
            location = %event.location(),
        );
        self.dispatch_inner(event).instrument(span).await
    }

    async fn dispatch_inner(&self, event: Arc<MessageEvent>) -> DispatchOutcome {
        if let Some(reason) = self.filter.reject(&event, self.gate.client().self_id()) {
            trace!(?reason, "message filtered");
            return DispatchOutcome::Ignored(reason);
        }

        let prefix = self.prefix.resolve(&event).await;
        let Some(body) = event.content.strip_prefix(prefix.as_str()) else {
            return DispatchOutcome::Ignored(IgnoreReason::NoPrefix);
        };

        let (name, tokens) = tokenize(body);
        let Some(command) = self.registry.lookup(name).cloned() else {
            trace!(name, "no command answers to name");
            return DispatchOutcome::Ignored(IgnoreReason::UnknownCommand);
        };
        debug!(command = %command.name(), invoked_with = name, "Resolved command");

        match self.execute(&event, &prefix, name, &tokens, &command).await {
            Ok(()) => {
                debug!(command = %command.name(), "Command executed");
                DispatchOutcome::Executed {
                    command: command.name().to_owned(),
                }
            }
            Err(Abort::Silent(reason)) => DispatchOutcome::Ignored(reason),
            Err(Abort::Failed(error)) => {
                let kind = error.kind();
                debug!(command = %command.name(), %kind, %error, "Command failed");
                self.errors
                    .emit(ErrorReport::new(error, Arc::clone(&event), Some(command.into())));
                DispatchOutcome::Failed(kind)
            }
        }
    }

    async fn execute(
        &self,
        event: &Arc<MessageEvent>,
        prefix: &str,
        invoked_with: &str,
        tokens: &[&str],
        command: &Arc<Command>,
    ) -> Result<(), Abort> {
        self.gate
            .run(
                GateOrder::Text,
                command.requirements(),
                &event.author_id,
                &event.location(),
            )
            .await?;

        for check in command.checks() {
            match check.evaluate(Arc::clone(event)).await {
                Ok(true) => {}
                Ok(false) => return Err(DispatchError::CheckFailed.into()),
                Err(error) => {
                    warn!(check = check.name(), %error, "Check errored, dropping invocation");
                    return Err(Abort::Silent(IgnoreReason::CheckErrored));
                }
            }
        }

        let args = convert_arguments(command.params(), tokens, event, &self.registry).await?;

        let invocation = match command.handler() {
            CommandHandler::Event(handler) => handler(Arc::clone(event), args),
            CommandHandler::Context(handler) => {
                let ctx = ExecutionContext::new(
                    Arc::clone(event),
                    prefix.to_owned(),
                    invoked_with.to_owned(),
                    Arc::clone(command),
                    Arc::clone(self.gate.client()),
                );
                handler(ctx, args)
            }
        };

        run_guarded(invocation)
            .await
            .map_err(|error| Abort::Failed(DispatchError::execution(error)))
    }
}

impl fmt::Debug for TextDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDispatcher")
            .field("registry", &self.registry)
            .field("gate", &self.gate)
            .field("prefix", &self.prefix)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    use crate::args::Args;
    use crate::channel::ErrorSubscriber;
    use crate::command::{Check, Parameter, TypeTag};
    use crate::converter::ArgumentConverter;
    use crate::error::ErrorKind;
    use crate::testing::{Calls, MockClient, message};

    struct Harness {
        dispatcher: TextDispatcher,
        errors: ErrorSubscriber,
        client: MockClient,
    }

    fn harness(registry: Registry, client: MockClient) -> Harness {
        let errors = ErrorChannel::default();
        let subscriber = errors.subscribe();
        let dispatcher = TextDispatcher::new(
            Arc::new(registry),
            CapabilityGate::new(client.boxed(), ["owner"]),
            Prefix::from("!"),
            MessageFilter::default(),
            errors,
        );
        Harness {
            dispatcher,
            errors: subscriber,
            client,
        }
    }

    fn record_args(
        calls: &Calls<Vec<Value>>,
    ) -> impl Fn(Arc<MessageEvent>, Args) -> futures::future::Ready<()> + Send + Sync + 'static {
        let calls = calls.clone();
        move |_event, args| {
            calls.record(args.into_inner());
            futures::future::ready(())
        }
    }

    #[tokio::test]
    async fn test_name_and_alias_resolution() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(Command::builder("ping").alias("p").handler(record_args(&calls)))
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert!(h.dispatcher.dispatch(message("!p")).await.is_executed());
        assert!(h.dispatcher.dispatch(message("!PING")).await.is_executed());
        assert_eq!(
            h.dispatcher.dispatch(message("!pong")).await,
            DispatchOutcome::Ignored(IgnoreReason::UnknownCommand)
        );
        assert_eq!(
            h.dispatcher.dispatch(message("ping")).await,
            DispatchOutcome::Ignored(IgnoreReason::NoPrefix)
        );

        assert_eq!(calls.take().len(), 2);
        assert!(h.errors.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_self_and_bot_messages_are_filtered() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(Command::builder("ping").handler(record_args(&calls)))
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        let own = Arc::new(MessageEvent::new("bot", "c", "!ping").from_bot(true));
        let other = Arc::new(MessageEvent::new("helper", "c", "!ping").from_bot(true));
        assert_eq!(
            h.dispatcher.dispatch(own).await,
            DispatchOutcome::Ignored(IgnoreReason::SelfMessage)
        );
        assert_eq!(
            h.dispatcher.dispatch(other).await,
            DispatchOutcome::Ignored(IgnoreReason::BotMessage)
        );
        assert!(calls.take().is_empty());
    }

    #[test]
    fn test_filter_allowances() {
        let own = MessageEvent::new("bot", "c", "!ping").from_bot(true);
        let other = MessageEvent::new("helper", "c", "!ping").from_bot(true);

        let permissive = MessageFilter {
            allow_self: true,
            allow_bots: false,
        };
        assert_eq!(permissive.reject(&own, "bot"), None);
        assert_eq!(permissive.reject(&other, "bot"), Some(IgnoreReason::BotMessage));

        let bots = MessageFilter {
            allow_self: false,
            allow_bots: true,
        };
        assert_eq!(bots.reject(&own, "bot"), Some(IgnoreReason::SelfMessage));
        assert_eq!(bots.reject(&other, "bot"), None);
    }

    #[tokio::test]
    async fn test_missing_required_argument_is_reported() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("greet")
                    .param(Parameter::required(TypeTag::STRING))
                    .param(Parameter::optional(TypeTag::STRING))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert_eq!(
            h.dispatcher.dispatch(message("!greet")).await,
            DispatchOutcome::Failed(ErrorKind::MissingArgument)
        );

        let report = h.errors.recv().await.unwrap();
        assert!(matches!(report.error, DispatchError::MissingArgument { index: 0 }));
        assert_eq!(report.command_name(), Some("greet"));
        assert_eq!(report.event.as_message().unwrap().content, "!greet");
        assert!(calls.take().is_empty());
    }

    #[tokio::test]
    async fn test_unset_optional_still_invokes_handler() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("greet")
                    .param(Parameter::optional(TypeTag::STRING))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        assert!(h.dispatcher.dispatch(message("!greet")).await.is_executed());
        assert_eq!(calls.take(), vec![Vec::<Value>::new()]);
    }

    #[tokio::test]
    async fn test_rest_parameter_joins_tokens() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("say")
                    .param(Parameter::rest())
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        assert!(h.dispatcher.dispatch(message("!say hello world")).await.is_executed());
        assert_eq!(calls.take(), vec![vec![json!("hello world")]]);
    }

    #[tokio::test]
    async fn test_rest_parameter_without_tokens_runs_handler() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("say")
                    .param(Parameter::rest())
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert!(h.dispatcher.dispatch(message("!say")).await.is_executed());
        assert_eq!(calls.take(), vec![vec![json!("")]]);
        assert!(h.errors.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_zero_from_number_converter_fails_conversion() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry.register_converter(ArgumentConverter::number()).unwrap();
        registry
            .register_command(
                Command::builder("add")
                    .param(Parameter::required(TypeTag::NUMBER))
                    .param(Parameter::required(TypeTag::NUMBER))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        // 0 is a valid number but counts as "no result"
        assert_eq!(
            h.dispatcher.dispatch(message("!add 0 3")).await,
            DispatchOutcome::Failed(ErrorKind::ConversionFailed)
        );
        let report = h.errors.recv().await.unwrap();
        assert!(matches!(report.error, DispatchError::ConversionFailed { index: 0 }));
        assert!(calls.take().is_empty());

        assert!(h.dispatcher.dispatch(message("!add 2 3")).await.is_executed());
        assert_eq!(calls.take(), vec![vec![json!(2), json!(3)]]);
    }

    #[tokio::test]
    async fn test_check_error_aborts_silently() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("secret")
                    .check(Check::new(|_event| async {
                        Err::<bool, _>(anyhow::anyhow!("lookup failed"))
                    }))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert_eq!(
            h.dispatcher.dispatch(message("!secret")).await,
            DispatchOutcome::Ignored(IgnoreReason::CheckErrored)
        );
        assert!(h.errors.try_recv().is_none());
        assert!(calls.take().is_empty());
    }

    #[tokio::test]
    async fn test_checks_run_in_order_and_stop_at_first_failure() {
        let calls = Calls::default();
        let evaluated: Calls<&'static str> = Calls::default();
        let (first, second) = (evaluated.clone(), evaluated.clone());

        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("guarded")
                    .check(Check::sync(move |_| {
                        first.record("first");
                        false
                    }))
                    .check(Check::sync(move |_| {
                        second.record("second");
                        true
                    }))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert_eq!(
            h.dispatcher.dispatch(message("!guarded")).await,
            DispatchOutcome::Failed(ErrorKind::CheckFailed)
        );
        assert_eq!(evaluated.take(), ["first"]);
        assert_eq!(h.errors.recv().await.unwrap().kind(), ErrorKind::CheckFailed);
        assert!(calls.take().is_empty());
    }

    #[tokio::test]
    async fn test_gate_runs_before_checks() {
        let calls = Calls::default();
        let evaluated: Calls<&'static str> = Calls::default();
        let seen = evaluated.clone();

        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("shutdown")
                    .owner_only()
                    .permissions(["ADMINISTRATOR"])
                    .check(Check::sync(move |_| {
                        seen.record("check");
                        true
                    }))
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert_eq!(
            h.dispatcher.dispatch(message("!shutdown")).await,
            DispatchOutcome::Failed(ErrorKind::OwnerOnly)
        );
        assert_eq!(h.errors.recv().await.unwrap().kind(), ErrorKind::OwnerOnly);
        assert!(evaluated.take().is_empty());
        assert!(h.client.queries().is_empty());
    }

    #[tokio::test]
    async fn test_handler_errors_and_panics_are_reported() {
        let mut registry = Registry::new();
        registry
            .register_command(Command::builder("fail").handler(|_e, _a| async {
                Err::<(), _>(anyhow::anyhow!("database unavailable"))
            }))
            .unwrap();
        registry
            .register_command(Command::builder("explode").handler::<_, _, ()>(|_e, _a| async {
                panic!("boom");
            }))
            .unwrap();
        registry
            .register_command(
                Command::builder("eager")
                    .handler(|_e, _a| -> std::future::Ready<()> { panic!("before the future") }),
            )
            .unwrap();
        let mut h = harness(registry, MockClient::new("bot"));

        assert_eq!(
            h.dispatcher.dispatch(message("!fail")).await,
            DispatchOutcome::Failed(ErrorKind::ExecutionError)
        );
        let report = h.errors.recv().await.unwrap();
        assert_eq!(report.error.to_string(), "command handler failed: database unavailable");

        assert_eq!(
            h.dispatcher.dispatch(message("!explode")).await,
            DispatchOutcome::Failed(ErrorKind::ExecutionError)
        );
        let report = h.errors.recv().await.unwrap();
        assert_eq!(report.error.to_string(), "command handler failed: handler panicked");

        assert_eq!(
            h.dispatcher.dispatch(message("!eager")).await,
            DispatchOutcome::Failed(ErrorKind::ExecutionError)
        );
        let report = h.errors.recv().await.unwrap();
        assert_eq!(report.error.to_string(), "command handler failed: handler panicked");
        assert!(h.errors.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_context_handler_receives_invocation() {
        let seen: Calls<(String, String, String)> = Calls::default();
        let recorder = seen.clone();

        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("echo")
                    .alias("e")
                    .param(Parameter::optional(TypeTag::STRING))
                    .context_handler(move |ctx: ExecutionContext, args: Args| {
                        recorder.record((
                            ctx.prefix().to_owned(),
                            ctx.invoked_with().to_owned(),
                            args.str(0).unwrap_or_default().to_owned(),
                        ));
                        async {}
                    }),
            )
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        assert!(h.dispatcher.dispatch(message("!E hi")).await.is_executed());
        assert_eq!(
            seen.take(),
            [("!".to_owned(), "E".to_owned(), "hi".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_repeated_dispatch_is_independent() {
        let calls = Calls::default();
        let mut registry = Registry::new();
        registry
            .register_command(
                Command::builder("say")
                    .param(Parameter::rest())
                    .handler(record_args(&calls)),
            )
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        let event = message("!say same thing");
        let first = h.dispatcher.dispatch(Arc::clone(&event)).await;
        let second = h.dispatcher.dispatch(event).await;

        assert_eq!(first, second);
        assert!(first.is_executed());
        assert_eq!(
            calls.take(),
            vec![vec![json!("same thing")], vec![json!("same thing")]]
        );
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_do_not_block_each_other() {
        let (release, gate) = tokio::sync::oneshot::channel::<()>();
        let gate = Arc::new(tokio::sync::Mutex::new(Some(gate)));
        let calls: Calls<&'static str> = Calls::default();
        let (slow_calls, fast_calls) = (calls.clone(), calls.clone());

        let mut registry = Registry::new();
        registry
            .register_command(Command::builder("slow").handler(move |_e, _a| {
                let gate = Arc::clone(&gate);
                let calls = slow_calls.clone();
                async move {
                    if let Some(rx) = gate.lock().await.take() {
                        let _ = rx.await;
                    }
                    calls.record("slow");
                }
            }))
            .unwrap();
        registry
            .register_command(Command::builder("fast").handler(move |_e, _a| {
                let calls = fast_calls.clone();
                async move { calls.record("fast") }
            }))
            .unwrap();
        let h = harness(registry, MockClient::new("bot"));

        let slow = tokio::spawn({
            let dispatcher = h.dispatcher.clone();
            async move { dispatcher.dispatch(message("!slow")).await }
        });
        tokio::task::yield_now().await;

        assert!(h.dispatcher.dispatch(message("!fast")).await.is_executed());
        release.send(()).unwrap();
        assert!(slow.await.unwrap().is_executed());
        assert_eq!(calls.take(), ["fast", "slow"]);
    }
}
