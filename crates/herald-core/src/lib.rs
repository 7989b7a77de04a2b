//! # Herald Core
//!
//! The platform-facing model of the Herald command framework.
//!
//! Herald never talks to a chat platform directly. Everything it needs from
//! the platform is described here as plain data and one small trait:
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! Events and the values carried by them:
//! - **Events**: text messages ([`MessageEvent`]) and structured interactions
//!   ([`InteractionEvent`]), plus the [`InboundEvent`] and [`SourceEvent`] wrappers
//! - **Locations**: where an event happened ([`Location`])
//! - **Permissions**: named capability sets ([`PermissionSet`])
//!
//! ### Integration Layer
//!
//! The capability surface the platform collaborator implements:
//! - **Client**: the bot's identity and permission queries ([`Client`])
//!
//! ```text
//! ┌──────────────┐  InboundEvent   ┌─────────────┐
//! │   Platform   │────────────────▶│ Dispatchers │
//! │ (collaborator)│◀────────────────│ (framework) │
//! └──────────────┘ has_permissions └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use herald_core::{Client, Location, PermissionSet};
//!
//! struct Gateway { id: String }
//!
//! #[async_trait::async_trait]
//! impl Client for Gateway {
//!     fn self_id(&self) -> &str {
//!         &self.id
//!     }
//!
//!     async fn has_permissions(
//!         &self,
//!         location: &Location,
//!         actor_id: &str,
//!         required: &PermissionSet,
//!     ) -> bool {
//!         // ask the platform
//!         true
//!     }
//! }
//! ```

pub mod foundation;
pub mod integration;

pub use foundation::{
    BoxError, Event, EventError, EventResult, InboundEvent, InteractionEvent, Location,
    MessageEvent, Options, PermissionSet, SharedError, SourceEvent,
};
pub use integration::{BoxedClient, Client};

/// Prelude for common imports.
pub mod prelude {
    pub use super::foundation::*;
    pub use super::integration::*;
}
