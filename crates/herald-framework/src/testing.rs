//! Test doubles shared by the unit tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use herald_core::{BoxedClient, Client, Location, MessageEvent, PermissionSet};

/// A client whose grants are configured up front and which records every
/// actor it was queried for, in order.
#[derive(Clone)]
pub(crate) struct MockClient {
    inner: Arc<MockInner>,
}

struct MockInner {
    self_id: String,
    grants: Mutex<HashMap<String, PermissionSet>>,
    queries: Mutex<Vec<String>>,
}

impl MockClient {
    pub(crate) fn new(self_id: &str) -> Self {
        Self {
            inner: Arc::new(MockInner {
                self_id: self_id.to_owned(),
                grants: Mutex::new(HashMap::new()),
                queries: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn grant(self, actor_id: &str, permissions: impl Into<PermissionSet>) -> Self {
        self.inner
            .grants
            .lock()
            .insert(actor_id.to_owned(), permissions.into());
        self
    }

    pub(crate) fn boxed(&self) -> BoxedClient {
        Arc::new(self.clone())
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.inner.queries.lock().clone()
    }
}

#[async_trait]
impl Client for MockClient {
    fn self_id(&self) -> &str {
        &self.inner.self_id
    }

    async fn has_permissions(
        &self,
        _location: &Location,
        actor_id: &str,
        required: &PermissionSet,
    ) -> bool {
        self.inner.queries.lock().push(actor_id.to_owned());
        self.inner
            .grants
            .lock()
            .get(actor_id)
            .is_some_and(|granted| required.is_subset(granted))
    }
}

/// A guild message from the human actor `user`.
pub(crate) fn message(content: &str) -> Arc<MessageEvent> {
    Arc::new(MessageEvent::new("user", "c", content).in_guild("g"))
}

/// Records the values a handler was invoked with.
pub(crate) struct Calls<T> {
    calls: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for Calls<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for Calls<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T> Calls<T> {
    pub(crate) fn record(&self, value: T) {
        self.calls.lock().push(value);
    }

    pub(crate) fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.calls.lock())
    }
}
