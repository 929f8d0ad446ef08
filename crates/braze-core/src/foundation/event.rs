//! Gateway event model for the Braze framework.
//!
//! The transport collaborator is expected to translate its platform payloads
//! into these types before handing them to the dispatcher. Braze itself never
//! parses wire formats; it only routes.

use serde::{Deserialize, Serialize};

// ============================================================================
// Channel Metadata
// ============================================================================

/// Classification of channel kinds.
///
/// Only text-capable channels are entered into the
/// [`ChannelDirectory`](super::directory::ChannelDirectory) during a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// Text channels that can receive messages.
    Text,
    /// Voice channels.
    Voice,
    /// Grouping/category channels.
    Category,
    /// Any other channel kind the platform exposes.
    Other,
}

impl ChannelKind {
    /// Returns `true` if the channel can receive text messages.
    pub fn is_text(self) -> bool {
        matches!(self, ChannelKind::Text)
    }
}

/// One entry of a live channel enumeration, as reported by the gateway client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Opaque channel identifier assigned by the platform.
    pub id: String,
    /// Human-readable channel name.
    pub name: String,
    /// Channel kind.
    pub kind: ChannelKind,
}

impl ChannelInfo {
    /// Creates a text channel entry. Convenience for tests and adapters.
    pub fn text(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: ChannelKind::Text,
        }
    }
}

// ============================================================================
// Message Events
// ============================================================================

/// The author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Platform user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the author is a bot account.
    ///
    /// This covers our own identity as well: the dispatcher never processes
    /// bot-authored messages, which prevents feedback loops.
    pub bot: bool,
}

/// An inbound chat message as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Platform message identifier.
    pub id: String,
    /// The message author.
    pub author: Author,
    /// Raw text content. May be empty for attachment-only messages.
    pub content: String,
    /// Identifier of the channel the message arrived in.
    pub channel_id: String,
    /// Display name of the channel the message arrived in.
    pub channel_name: String,
}

// ============================================================================
// Gateway Events
// ============================================================================

/// The kind of channel lifecycle change that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelChange {
    /// A channel was created.
    Created,
    /// A channel was renamed or otherwise updated.
    Updated,
    /// A channel was deleted.
    Deleted,
}

/// An event emitted by the connected gateway client.
///
/// Lifecycle events do not carry the channel enumeration themselves; the
/// dispatcher fetches the current enumeration through
/// [`ChatClient::list_channels`](crate::integration::ChatClient::list_channels)
/// whenever it needs to rebuild the directory.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// The transport finished its startup handshake.
    Ready,
    /// An inbound chat message.
    Message(MessageEvent),
    /// A channel was created, updated, or deleted.
    Channel(ChannelChange),
}
