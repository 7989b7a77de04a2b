//! Event system for the Herald framework.
//!
//! Herald understands exactly two event shapes:
//!
//! - [`MessageEvent`] - a plain text message that may contain a prefixed
//!   command invocation
//! - [`InteractionEvent`] - a structured command invocation whose options
//!   were already parsed and typed by the platform
//!
//! The platform delivers them as [`InboundEvent`]s. Once a dispatcher has
//! taken ownership of an event it is shared as a [`SourceEvent`], which is
//! cheap to clone into contexts and error reports.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::EventResult;

/// Pre-typed interaction options, keyed by option name.
pub type Options = Map<String, Value>;

// ============================================================================
// Location
// ============================================================================

/// Where an event happened.
///
/// Passed verbatim to [`Client::has_permissions`](crate::Client::has_permissions);
/// Herald attaches no meaning to the identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// The guild (server) identifier, absent for direct messages.
    pub guild_id: Option<String>,
    /// The channel identifier.
    pub channel_id: String,
}

impl Location {
    /// Creates a location inside a channel, optionally scoped to a guild.
    pub fn new(guild_id: Option<String>, channel_id: impl Into<String>) -> Self {
        Self {
            guild_id,
            channel_id: channel_id.into(),
        }
    }

    /// Returns `true` if this location is a direct message channel.
    pub fn is_direct(&self) -> bool {
        self.guild_id.is_none()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.guild_id {
            Some(guild) => write!(f, "{guild}/{}", self.channel_id),
            None => write!(f, "dm/{}", self.channel_id),
        }
    }
}

// ============================================================================
// Event Trait
// ============================================================================

/// Common accessors shared by every event Herald handles.
pub trait Event: Send + Sync + 'static {
    /// Returns the human-readable name of this event type.
    fn event_name(&self) -> &'static str;

    /// Returns the id of the actor that caused the event.
    fn actor_id(&self) -> &str;

    /// Returns where the event happened.
    fn location(&self) -> Location;
}

// ============================================================================
// Message Event
// ============================================================================

/// A text message posted by a user or a bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Platform message identifier.
    #[serde(default)]
    pub id: String,
    /// The author's actor id.
    pub author_id: String,
    /// Whether the author is a bot account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// Raw message text.
    pub content: String,
    /// Guild identifier, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Channel identifier.
    pub channel_id: String,
}

impl MessageEvent {
    /// Creates a direct message from a human author.
    pub fn new(
        author_id: impl Into<String>,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            author_id: author_id.into(),
            author_is_bot: false,
            content: content.into(),
            guild_id: None,
            channel_id: channel_id.into(),
        }
    }

    /// Sets the platform message id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Places the message inside a guild.
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Marks the author as a bot account.
    pub fn from_bot(mut self, is_bot: bool) -> Self {
        self.author_is_bot = is_bot;
        self
    }
}

impl Event for MessageEvent {
    fn event_name(&self) -> &'static str {
        "message"
    }

    fn actor_id(&self) -> &str {
        &self.author_id
    }

    fn location(&self) -> Location {
        Location::new(self.guild_id.clone(), self.channel_id.clone())
    }
}

// ============================================================================
// Interaction Event
// ============================================================================

/// A structured command invocation delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Platform interaction identifier.
    #[serde(default)]
    pub id: String,
    /// The invoking user's actor id.
    pub user_id: String,
    /// The invoked command name, as registered with the platform.
    pub command_name: String,
    /// Options already typed by the platform.
    #[serde(default)]
    pub options: Options,
    /// Guild identifier, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Channel identifier.
    pub channel_id: String,
}

impl InteractionEvent {
    /// Creates an interaction with no options in a direct message channel.
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        command_name: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.into(),
            command_name: command_name.into(),
            options: Options::new(),
            guild_id: None,
            channel_id: channel_id.into(),
        }
    }

    /// Sets the platform interaction id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Places the interaction inside a guild.
    pub fn in_guild(mut self, guild_id: impl Into<String>) -> Self {
        self.guild_id = Some(guild_id.into());
        self
    }

    /// Adds a typed option.
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }
}

impl Event for InteractionEvent {
    fn event_name(&self) -> &'static str {
        "interaction"
    }

    fn actor_id(&self) -> &str {
        &self.user_id
    }

    fn location(&self) -> Location {
        Location::new(self.guild_id.clone(), self.channel_id.clone())
    }
}

// ============================================================================
// Inbound / Source Events
// ============================================================================

/// An event as delivered by the platform's event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// A text message.
    Message(MessageEvent),
    /// A structured interaction.
    Interaction(InteractionEvent),
}

impl InboundEvent {
    /// Decodes an inbound event from its JSON representation.
    pub fn from_json(raw: &str) -> EventResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl From<MessageEvent> for InboundEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

impl From<InteractionEvent> for InboundEvent {
    fn from(event: InteractionEvent) -> Self {
        Self::Interaction(event)
    }
}

/// The event a dispatch originated from, shared by reference count.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// Originated from a text message.
    Message(Arc<MessageEvent>),
    /// Originated from an interaction.
    Interaction(Arc<InteractionEvent>),
}

impl SourceEvent {
    /// Returns the message event, if this is one.
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            Self::Message(event) => Some(event),
            Self::Interaction(_) => None,
        }
    }

    /// Returns the interaction event, if this is one.
    pub fn as_interaction(&self) -> Option<&InteractionEvent> {
        match self {
            Self::Message(_) => None,
            Self::Interaction(event) => Some(event),
        }
    }
}

impl Event for SourceEvent {
    fn event_name(&self) -> &'static str {
        match self {
            Self::Message(event) => event.event_name(),
            Self::Interaction(event) => event.event_name(),
        }
    }

    fn actor_id(&self) -> &str {
        match self {
            Self::Message(event) => event.actor_id(),
            Self::Interaction(event) => event.actor_id(),
        }
    }

    fn location(&self) -> Location {
        match self {
            Self::Message(event) => event.location(),
            Self::Interaction(event) => event.location(),
        }
    }
}

impl From<Arc<MessageEvent>> for SourceEvent {
    fn from(event: Arc<MessageEvent>) -> Self {
        Self::Message(event)
    }
}

impl From<Arc<InteractionEvent>> for SourceEvent {
    fn from(event: Arc<InteractionEvent>) -> Self {
        Self::Interaction(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_from_json() {
        let raw = r#"{
            "type": "message",
            "author_id": "42",
            "content": "!ping",
            "guild_id": "7",
            "channel_id": "100"
        }"#;

        let InboundEvent::Message(msg) = InboundEvent::from_json(raw).unwrap() else {
            panic!("expected a message event");
        };
        assert_eq!(msg.author_id, "42");
        assert!(!msg.author_is_bot);
        assert_eq!(msg.location(), Location::new(Some("7".into()), "100"));
    }

    #[test]
    fn test_inbound_interaction_from_json() {
        let raw = r#"{
            "type": "interaction",
            "user_id": "42",
            "command_name": "ban",
            "options": { "user": "99", "days": 3 },
            "channel_id": "100"
        }"#;

        let InboundEvent::Interaction(it) = InboundEvent::from_json(raw).unwrap() else {
            panic!("expected an interaction event");
        };
        assert_eq!(it.command_name, "ban");
        assert_eq!(it.options.get("days"), Some(&Value::from(3)));
        assert!(it.location().is_direct());
    }

    #[test]
    fn test_inbound_rejects_unknown_type() {
        let err = InboundEvent::from_json(r#"{"type":"reaction"}"#).unwrap_err();
        assert!(err.to_string().starts_with("failed to parse event"));
    }

    #[test]
    fn test_source_event_accessors() {
        let source = SourceEvent::from(Arc::new(MessageEvent::new("1", "c", "hi")));
        assert_eq!(source.event_name(), "message");
        assert_eq!(source.actor_id(), "1");
        assert!(source.as_message().is_some());
        assert!(source.as_interaction().is_none());
    }

    #[test]
    fn test_location_display() {
        assert_eq!(Location::new(Some("g".into()), "c").to_string(), "g/c");
        assert_eq!(Location::new(None, "c").to_string(), "dm/c");
    }
}
