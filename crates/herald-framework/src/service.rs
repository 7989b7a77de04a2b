//! Tower integration.
//!
//! Every dispatcher is a [`tower::Service`] that never fails and is always
//! ready, so host applications can layer timeouts, concurrency limits or
//! their own middleware around dispatch:
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use tower::ServiceBuilder;
//!
//! let service = ServiceBuilder::new()
//!     .concurrency_limit(64)
//!     .timeout(Duration::from_secs(30))
//!     .service(dispatcher.clone());
//! ```
//!
//! Failures inside a dispatch are published on the error channel; the
//! response only mirrors the [`DispatchOutcome`].

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::Service;

use herald_core::{InboundEvent, InteractionEvent, MessageEvent};

use crate::dispatcher::{DispatchOutcome, Dispatcher, InteractionDispatcher, TextDispatcher};

type ServiceFuture =
    Pin<Box<dyn std::future::Future<Output = Result<DispatchOutcome, Infallible>> + Send>>;

impl Service<Arc<MessageEvent>> for TextDispatcher {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: Arc<MessageEvent>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(event).await) })
    }
}

impl Service<Arc<InteractionEvent>> for InteractionDispatcher {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: Arc<InteractionEvent>) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(event).await) })
    }
}

impl Service<InboundEvent> for Dispatcher {
    type Response = DispatchOutcome;
    type Error = Infallible;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, event: InboundEvent) -> Self::Future {
        let dispatcher = self.clone();
        Box::pin(async move { Ok(dispatcher.dispatch(event).await) })
    }
}
