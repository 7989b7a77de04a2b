//! Client trait.
//!
//! The `Client` is Herald's view of the bot account on the platform: who it
//! is, and whether an actor holds a set of permissions somewhere. The same
//! query answers both "can the bot do this here" and "can the invoking user
//! do this here".

use std::sync::Arc;

use async_trait::async_trait;

use crate::foundation::{Location, PermissionSet};

/// The capability surface supplied by the platform collaborator.
///
/// Implementations may perform network calls; every query is awaited inside
/// the task processing a single event and never blocks other dispatches.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    /// Returns the bot's own actor id.
    fn self_id(&self) -> &str;

    /// Returns `true` if `actor_id` holds every permission in `required` at
    /// `location`.
    async fn has_permissions(
        &self,
        location: &Location,
        actor_id: &str,
        required: &PermissionSet,
    ) -> bool;
}

/// A shared, type-erased client.
pub type BoxedClient = Arc<dyn Client>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Everyone;

    #[async_trait]
    impl Client for Everyone {
        fn self_id(&self) -> &str {
            "bot"
        }

        async fn has_permissions(&self, _: &Location, _: &str, _: &PermissionSet) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_client_is_object_safe() {
        let client: BoxedClient = Arc::new(Everyone);
        let location = Location::new(None, "c");
        assert_eq!(client.self_id(), "bot");
        assert!(
            client
                .has_permissions(&location, "1", &PermissionSet::from(["X"]))
                .await
        );
    }
}
