//! Handler system for the Herald framework.
//!
//! Handlers are plain async functions or closures. Text-command handlers take
//! either the raw event or an [`ExecutionContext`] followed by the converted
//! [`Args`]; slash-command handlers take the interaction and its options.
//!
//! ```rust,ignore
//! // Receives the raw event.
//! async fn ping(event: Arc<MessageEvent>, _args: Args) {
//!     tracing::info!(author = %event.author_id, "pong");
//! }
//!
//! // Receives a context and may fail.
//! async fn say(ctx: ExecutionContext, args: Args) -> anyhow::Result<()> {
//!     let text = args.str(0).unwrap_or_default();
//!     reply(ctx.event(), text).await?;
//!     Ok(())
//! }
//! ```
//!
//! Any return type implementing [`IntoHandlerResult`] is accepted; errors are
//! reported as `ExecutionError` on the error channel.

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use herald_core::{BoxError, InteractionEvent, MessageEvent, Options};

use crate::args::Args;
use crate::context::ExecutionContext;
use crate::error::HandlerPanicked;

/// The uniform result of a handler invocation.
pub type HandlerResult = Result<(), BoxError>;

// ============================================================================
// IntoHandlerResult
// ============================================================================

/// Types that can be returned from handlers.
pub trait IntoHandlerResult: Send + 'static {
    /// Converts the return value into a [`HandlerResult`].
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError> + Send + 'static,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

// ============================================================================
// Erased handler functions
// ============================================================================

/// A type-erased two-argument async handler.
pub type HandlerFn<A, B> = Arc<dyn Fn(A, B) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

// The user function is only called once the returned future is polled, so a
// handler that panics before producing its future is still caught by
// `run_guarded`.
fn erase<A, B, F, Fut, R>(f: F) -> HandlerFn<A, B>
where
    F: Fn(A, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult,
    A: Send + 'static,
    B: Send + 'static,
{
    let f = Arc::new(f);
    Arc::new(move |a, b| {
        let f = Arc::clone(&f);
        async move { f(a, b).await.into_handler_result() }.boxed()
    })
}

/// The handler of a text command.
///
/// The variant decides whether the dispatcher builds an [`ExecutionContext`]
/// or passes the raw event.
#[derive(Clone)]
pub enum CommandHandler {
    /// Called with the raw message event.
    Event(HandlerFn<Arc<MessageEvent>, Args>),
    /// Called with a freshly built execution context.
    Context(HandlerFn<ExecutionContext, Args>),
}

impl CommandHandler {
    /// Wraps a handler that takes the raw event.
    pub fn event<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Arc<MessageEvent>, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        Self::Event(erase(f))
    }

    /// Wraps a handler that takes an execution context.
    pub fn context<F, Fut, R>(f: F) -> Self
    where
        F: Fn(ExecutionContext, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        Self::Context(erase(f))
    }

    /// Returns `true` if the handler expects an execution context.
    pub fn wants_context(&self) -> bool {
        matches!(self, Self::Context(_))
    }
}

impl fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(_) => f.write_str("CommandHandler::Event"),
            Self::Context(_) => f.write_str("CommandHandler::Context"),
        }
    }
}

/// The handler of a slash command.
#[derive(Clone)]
pub struct SlashHandler(HandlerFn<Arc<InteractionEvent>, Options>);

impl SlashHandler {
    /// Wraps a handler that takes the interaction and its options.
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Arc<InteractionEvent>, Options) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoHandlerResult,
    {
        Self(erase(f))
    }

    pub(crate) fn call(
        &self,
        event: Arc<InteractionEvent>,
        options: Options,
    ) -> BoxFuture<'static, HandlerResult> {
        (self.0)(event, options)
    }
}

impl fmt::Debug for SlashHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SlashHandler")
    }
}

/// Awaits a handler future, turning a panic into a [`HandlerPanicked`] error.
pub(crate) async fn run_guarded(fut: BoxFuture<'static, HandlerResult>) -> HandlerResult {
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(Box::new(HandlerPanicked)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_context_follows_variant() {
        let by_event = CommandHandler::event(|_event, _args| async {});
        let by_context = CommandHandler::context(|_ctx, _args| async {});
        assert!(!by_event.wants_context());
        assert!(by_context.wants_context());
    }

    #[tokio::test]
    async fn test_result_handlers_keep_their_error() {
        let handler = SlashHandler::new(|_event, _options| async {
            Err::<(), _>(anyhow::anyhow!("no such member"))
        });
        let event = Arc::new(InteractionEvent::new("1", "c", "kick"));
        let err = handler.call(event, Options::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "no such member");
    }

    #[tokio::test]
    async fn test_run_guarded_catches_panics_before_the_future() {
        let handler = CommandHandler::event(|_event, _args| -> std::future::Ready<()> {
            panic!("bad input")
        });
        let CommandHandler::Event(call) = handler else {
            unreachable!("built from an event handler");
        };
        let event = Arc::new(MessageEvent::new("1", "c", "!boom"));
        let err = run_guarded(call(event, Args::new(Vec::new()))).await.unwrap_err();
        assert_eq!(err.to_string(), "handler panicked");
    }

    #[tokio::test]
    async fn test_run_guarded_catches_panics() {
        let fut: BoxFuture<'static, HandlerResult> = async { panic!("kaboom") }.boxed();
        let err = run_guarded(fut).await.unwrap_err();
        assert_eq!(err.to_string(), "handler panicked");
    }
}
