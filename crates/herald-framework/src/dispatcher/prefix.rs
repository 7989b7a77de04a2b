use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use herald_core::MessageEvent;

type PrefixFn = Arc<dyn Fn(Arc<MessageEvent>) -> BoxFuture<'static, String> + Send + Sync>;

/// The text that marks a message as a command invocation.
#[derive(Clone)]
pub enum Prefix {
    /// The same prefix for every message.
    Static(String),
    /// A prefix computed per message, e.g. from per-guild settings.
    Dynamic(PrefixFn),
}

impl Prefix {
    /// Creates a prefix computed by an async function of the message.
    pub fn dynamic<F, Fut>(resolve: F) -> Self
    where
        F: Fn(Arc<MessageEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Self::Dynamic(Arc::new(move |event| resolve(event).boxed()))
    }

    /// Resolves the prefix for one message.
    pub async fn resolve(&self, event: &Arc<MessageEvent>) -> String {
        match self {
            Self::Static(prefix) => prefix.clone(),
            Self::Dynamic(resolve) => resolve(Arc::clone(event)).await,
        }
    }
}

impl Default for Prefix {
    fn default() -> Self {
        Self::Static("!".to_owned())
    }
}

impl From<&str> for Prefix {
    fn from(prefix: &str) -> Self {
        Self::Static(prefix.to_owned())
    }
}

impl From<String> for Prefix {
    fn from(prefix: String) -> Self {
        Self::Static(prefix)
    }
}

impl fmt::Debug for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(prefix) => f.debug_tuple("Static").field(prefix).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic"),
        }
    }
}
