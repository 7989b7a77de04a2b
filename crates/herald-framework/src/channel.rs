//! Error channel.
//!
//! Dispatch failures are never returned to the platform's event loop. Each
//! one is classified into a [`DispatchError`] and published exactly once as
//! an [`ErrorReport`] on the [`ErrorChannel`], which any number of
//! subscribers may observe.
//!
//! Two delivery modes are available:
//!
//! - [`ErrorChannel::new`] is a bounded broadcast. A subscriber that falls
//!   more than `capacity` reports behind skips the oldest ones and logs how
//!   many it missed.
//! - [`ErrorChannel::unbounded`] gives every subscriber its own unbounded
//!   queue, so no report is lost however slow the subscriber is.
//!
//! In both modes, reports emitted while nobody is subscribed are dropped.
//!
//! ```rust,ignore
//! let mut errors = dispatcher.error_channel().subscribe();
//! tokio::spawn(async move {
//!     while let Some(report) = errors.recv().await {
//!         if report.kind().is_user_facing() {
//!             reply(&report.event, &report.error.to_string()).await;
//!         }
//!     }
//! });
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tracing::{trace, warn};

use herald_core::SourceEvent;

use crate::command::{Command, SlashCommand};
use crate::error::{DispatchError, ErrorKind};

/// Default number of reports buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// The command a failed dispatch had resolved to.
#[derive(Debug, Clone)]
pub enum CommandRef {
    Text(Arc<Command>),
    Slash(Arc<SlashCommand>),
}

impl CommandRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Text(command) => command.name(),
            Self::Slash(command) => command.name(),
        }
    }
}

impl From<Arc<Command>> for CommandRef {
    fn from(command: Arc<Command>) -> Self {
        Self::Text(command)
    }
}

impl From<Arc<SlashCommand>> for CommandRef {
    fn from(command: Arc<SlashCommand>) -> Self {
        Self::Slash(command)
    }
}

/// One classified failure.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    /// What went wrong, with its detail payload.
    pub error: DispatchError,
    /// The event being dispatched.
    pub event: SourceEvent,
    /// The resolved command.
    pub command: Option<CommandRef>,
}

impl ErrorReport {
    pub fn new(error: DispatchError, event: impl Into<SourceEvent>, command: Option<CommandRef>) -> Self {
        Self {
            error,
            event: event.into(),
            command,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn command_name(&self) -> Option<&str> {
        self.command.as_ref().map(CommandRef::name)
    }
}

/// Multi-producer, multi-subscriber sink for [`ErrorReport`]s.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct ErrorChannel {
    inner: ChannelInner,
}

#[derive(Debug, Clone)]
enum ChannelInner {
    Bounded(broadcast::Sender<ErrorReport>),
    Unbounded(Arc<Mutex<Vec<mpsc::UnboundedSender<ErrorReport>>>>),
}

impl ErrorChannel {
    /// Creates a channel buffering up to `capacity` reports per subscriber.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: ChannelInner::Bounded(sender),
        }
    }

    /// Creates a channel where every subscriber has an unbounded queue.
    pub fn unbounded() -> Self {
        Self {
            inner: ChannelInner::Unbounded(Arc::default()),
        }
    }

    /// Returns `true` if slow subscribers can never lose reports.
    pub fn is_unbounded(&self) -> bool {
        matches!(self.inner, ChannelInner::Unbounded(_))
    }

    /// Publishes a report. Returns the number of subscribers that will see it.
    pub fn emit(&self, report: ErrorReport) -> usize {
        let kind = report.kind();
        let receivers = match &self.inner {
            ChannelInner::Bounded(sender) => sender.send(report).unwrap_or(0),
            ChannelInner::Unbounded(senders) => {
                let mut senders = senders.lock();
                senders.retain(|sender| sender.send(report.clone()).is_ok());
                senders.len()
            }
        };
        if receivers == 0 {
            trace!(%kind, "no error subscribers, dropping report");
        }
        receivers
    }

    pub fn subscribe(&self) -> ErrorSubscriber {
        let inner = match &self.inner {
            ChannelInner::Bounded(sender) => SubscriberInner::Bounded(sender.subscribe()),
            ChannelInner::Unbounded(senders) => {
                let (sender, receiver) = mpsc::unbounded_channel();
                senders.lock().push(sender);
                SubscriberInner::Unbounded(receiver)
            }
        };
        ErrorSubscriber { inner }
    }

    pub fn subscriber_count(&self) -> usize {
        match &self.inner {
            ChannelInner::Bounded(sender) => sender.receiver_count(),
            ChannelInner::Unbounded(senders) => {
                let mut senders = senders.lock();
                senders.retain(|sender| !sender.is_closed());
                senders.len()
            }
        }
    }
}

impl Default for ErrorChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A subscription to an [`ErrorChannel`].
///
/// Sees only reports emitted after it was created.
#[derive(Debug)]
pub struct ErrorSubscriber {
    inner: SubscriberInner,
}

#[derive(Debug)]
enum SubscriberInner {
    Bounded(broadcast::Receiver<ErrorReport>),
    Unbounded(mpsc::UnboundedReceiver<ErrorReport>),
}

impl ErrorSubscriber {
    /// Waits for the next report.
    ///
    /// Returns `None` once every channel handle has been dropped.
    pub async fn recv(&mut self) -> Option<ErrorReport> {
        let receiver = match &mut self.inner {
            SubscriberInner::Bounded(receiver) => receiver,
            SubscriberInner::Unbounded(receiver) => return receiver.recv().await,
        };
        loop {
            match receiver.recv().await {
                Ok(report) => return Some(report),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Error subscriber lagged, reports were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next report if one is already buffered.
    pub fn try_recv(&mut self) -> Option<ErrorReport> {
        let receiver = match &mut self.inner {
            SubscriberInner::Bounded(receiver) => receiver,
            SubscriberInner::Unbounded(receiver) => return receiver.try_recv().ok(),
        };
        loop {
            match receiver.try_recv() {
                Ok(report) => return Some(report),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Error subscriber lagged, reports were dropped");
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::MessageEvent;

    fn report(index: usize) -> ErrorReport {
        let event = Arc::new(MessageEvent::new("1", "c", "!x"));
        ErrorReport::new(DispatchError::MissingArgument { index }, event, None)
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_reports() {
        let channel = ErrorChannel::default();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        assert_eq!(channel.emit(report(0)), 2);

        assert_eq!(first.recv().await.unwrap().kind(), ErrorKind::MissingArgument);
        assert_eq!(second.recv().await.unwrap().kind(), ErrorKind::MissingArgument);
        assert!(first.try_recv().is_none());
    }

    #[test]
    fn test_emit_without_subscribers_is_dropped() {
        let channel = ErrorChannel::new(4);
        assert_eq!(channel.emit(report(0)), 0);

        let mut late = channel.subscribe();
        assert!(late.try_recv().is_none());
    }

    #[test]
    fn test_lagging_subscriber_skips_oldest() {
        let channel = ErrorChannel::new(2);
        let mut subscriber = channel.subscribe();
        for index in 0..4 {
            channel.emit(report(index));
        }

        let indices: Vec<_> = std::iter::from_fn(|| subscriber.try_recv())
            .map(|r| match r.error {
                DispatchError::MissingArgument { index } => index,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(indices, [2, 3]);
    }

    #[tokio::test]
    async fn test_recv_ends_when_channel_dropped() {
        let channel = ErrorChannel::new(1);
        let mut subscriber = channel.subscribe();
        drop(channel);
        assert!(subscriber.recv().await.is_none());
    }

    #[test]
    fn test_unbounded_subscriber_never_lags() {
        let channel = ErrorChannel::unbounded();
        assert!(channel.is_unbounded());
        let mut subscriber = channel.subscribe();
        for index in 0..1000 {
            assert_eq!(channel.emit(report(index)), 1);
        }

        let received = std::iter::from_fn(|| subscriber.try_recv()).count();
        assert_eq!(received, 1000);
    }

    #[tokio::test]
    async fn test_unbounded_drops_closed_subscribers() {
        let channel = ErrorChannel::unbounded();
        assert_eq!(channel.emit(report(0)), 0);

        let mut kept = channel.subscribe();
        let gone = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);
        drop(gone);

        assert_eq!(channel.emit(report(1)), 1);
        assert_eq!(channel.subscriber_count(), 1);
        assert!(matches!(
            kept.recv().await.unwrap().error,
            DispatchError::MissingArgument { index: 1 }
        ));

        drop(channel);
        assert!(kept.recv().await.is_none());
    }
}
