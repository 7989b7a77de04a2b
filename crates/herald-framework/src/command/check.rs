use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use herald_core::{BoxError, MessageEvent};

type CheckFn = Arc<dyn Fn(Arc<MessageEvent>) -> BoxFuture<'static, Result<bool, BoxError>> + Send + Sync>;

/// A predicate run after the capability gate and before argument conversion.
///
/// Returning `Ok(false)` reports `CheckFailed`. Returning an error aborts the
/// dispatch without any report.
#[derive(Clone)]
pub struct Check {
    name: Option<Arc<str>>,
    predicate: CheckFn,
}

impl Check {
    /// Creates a check from an async, fallible predicate.
    pub fn new<F, Fut, E>(predicate: F) -> Self
    where
        F: Fn(Arc<MessageEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, E>> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        Self {
            name: None,
            predicate: Arc::new(move |event| {
                predicate(event).map(|result| result.map_err(Into::into)).boxed()
            }),
        }
    }

    /// Creates a check from a synchronous predicate that cannot fail.
    pub fn sync<F>(predicate: F) -> Self
    where
        F: Fn(&MessageEvent) -> bool + Send + Sync + 'static,
    {
        Self::new(move |event: Arc<MessageEvent>| {
            let passed = predicate(&event);
            async move { Ok::<_, BoxError>(passed) }
        })
    }

    /// Names the check for logs.
    pub fn named(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Evaluates the predicate against an event.
    pub fn evaluate(&self, event: Arc<MessageEvent>) -> BoxFuture<'static, Result<bool, BoxError>> {
        (self.predicate)(event)
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name).finish()
    }
}
