//! Foundation layer - events and the values they carry.
//!
//! This module contains the plain data Herald exchanges with a platform:
//! - Event types for text messages and interactions
//! - Locations used for capability queries
//! - Permission sets

pub mod error;
pub mod event;
pub mod permission;

pub use error::{BoxError, EventError, EventResult, SharedError};
pub use event::{
    Event, InboundEvent, InteractionEvent, Location, MessageEvent, Options, SourceEvent,
};
pub use permission::PermissionSet;
