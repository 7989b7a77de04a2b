//! Capability gate.
//!
//! Evaluates a command's [`Requirements`] against the configured owners and
//! the platform's permission queries. The two dispatch paths run the same
//! three stages in different orders; see [`GateOrder`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use herald_core::{BoxedClient, Location, PermissionSet};

use crate::command::Requirements;
use crate::error::{DispatchError, DispatchResult};

/// One stage of the capability gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Owner,
    ClientPermissions,
    UserPermissions,
}

/// The order in which gate stages run.
///
/// Text dispatch checks ownership first; interaction dispatch checks it
/// last. Both orders are part of the observable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOrder {
    /// Owner, then bot permissions, then user permissions.
    Text,
    /// Bot permissions, then user permissions, then owner.
    Interaction,
}

impl GateOrder {
    pub fn stages(self) -> [GateStage; 3] {
        match self {
            Self::Text => [
                GateStage::Owner,
                GateStage::ClientPermissions,
                GateStage::UserPermissions,
            ],
            Self::Interaction => [
                GateStage::ClientPermissions,
                GateStage::UserPermissions,
                GateStage::Owner,
            ],
        }
    }
}

/// Ownership and permission checks shared by both dispatchers.
#[derive(Clone)]
pub struct CapabilityGate {
    client: BoxedClient,
    owners: Arc<HashSet<String>>,
}

impl CapabilityGate {
    pub fn new<I, S>(client: BoxedClient, owners: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            owners: Arc::new(owners.into_iter().map(Into::into).collect()),
        }
    }

    pub fn client(&self) -> &BoxedClient {
        &self.client
    }

    pub fn is_owner(&self, actor_id: &str) -> bool {
        self.owners.contains(actor_id)
    }

    /// Fails with `OwnerOnly` if the command is owner-restricted and the
    /// actor is not an owner.
    pub fn check_owner(&self, requirements: &Requirements, actor_id: &str) -> DispatchResult<()> {
        if requirements.owner_only && !self.is_owner(actor_id) {
            return Err(DispatchError::OwnerOnly);
        }
        Ok(())
    }

    /// Fails with `MissingClientPermissions` if the bot lacks `required` at
    /// `location`.
    pub async fn check_client_permissions(
        &self,
        required: &PermissionSet,
        location: &Location,
    ) -> DispatchResult<()> {
        if required.is_empty() {
            return Ok(());
        }
        if self
            .client
            .has_permissions(location, self.client.self_id(), required)
            .await
        {
            Ok(())
        } else {
            Err(DispatchError::MissingClientPermissions {
                required: required.clone(),
            })
        }
    }

    /// Fails with `MissingUserPermissions` if the actor lacks `required` at
    /// `location`.
    pub async fn check_user_permissions(
        &self,
        required: &PermissionSet,
        location: &Location,
        actor_id: &str,
    ) -> DispatchResult<()> {
        if required.is_empty() {
            return Ok(());
        }
        if self.client.has_permissions(location, actor_id, required).await {
            Ok(())
        } else {
            Err(DispatchError::MissingUserPermissions {
                required: required.clone(),
            })
        }
    }

    /// Runs every stage in `order`, stopping at the first failure.
    pub async fn run(
        &self,
        order: GateOrder,
        requirements: &Requirements,
        actor_id: &str,
        location: &Location,
    ) -> DispatchResult<()> {
        for stage in order.stages() {
            trace!(?stage, "running gate stage");
            match stage {
                GateStage::Owner => self.check_owner(requirements, actor_id)?,
                GateStage::ClientPermissions => {
                    self.check_client_permissions(&requirements.client_permissions, location)
                        .await?
                }
                GateStage::UserPermissions => {
                    self.check_user_permissions(&requirements.user_permissions, location, actor_id)
                        .await?
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CapabilityGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityGate")
            .field("self_id", &self.client.self_id())
            .field("owners", &self.owners)
            .finish()
    }
}
