//! Typed message envelopes exchanged with the game server.
//!
//! Every frame on the wire carries exactly one [`Envelope`]. Inbound
//! envelopes are produced by the framing layer and offered to the stage
//! pipeline in arrival order; outbound envelopes are constructed by the
//! session facade or by a stage and encoded by the same layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a logical chat room (lobby, table, game or tournament chat).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(Uuid);

impl RoomId {
    /// Create a new [`RoomId`] from an existing UUID.
    #[must_use]
    pub fn new(id: Uuid) -> Self { Self(id) }

    /// Create a [`RoomId`] with a freshly generated UUID.
    #[must_use]
    pub fn random() -> Self { Self(Uuid::new_v4()) }

    /// Return the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl From<Uuid> for RoomId {
    fn from(id: Uuid) -> Self { Self(id) }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Identifier of the chat channel backing a room.
///
/// Rooms and their chat channels are distinct namespaces on the server: a
/// table room and its table chat carry different ids. The mapping is
/// announced by the server when a join is confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(Uuid);

impl ChatId {
    /// Create a new [`ChatId`] from an existing UUID.
    #[must_use]
    pub fn new(id: Uuid) -> Self { Self(id) }

    /// Create a [`ChatId`] with a freshly generated UUID.
    #[must_use]
    pub fn random() -> Self { Self(Uuid::new_v4()) }

    /// Return the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl From<Uuid> for ChatId {
    fn from(id: Uuid) -> Self { Self(id) }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Client software version sent during registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl ClientVersion {
    /// Construct a version triple.
    #[must_use]
    pub fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Severity attached to server informs and error notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

/// A decoded, typed message unit.
///
/// The variant set is the envelope contract of this core; game-specific
/// payloads (tables, tournaments, game state) live outside it and are not
/// part of this crate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Envelope {
    /// Keep-alive probe. Sent by either side on write inactivity.
    Ping,
    /// Identity handshake, sent once immediately after the transport opens.
    Register {
        username: String,
        version: ClientVersion,
    },
    /// Server acknowledgment of a [`Envelope::Register`].
    RegisterAck,
    /// Server-to-client notice addressed to this session.
    Inform { text: String, severity: Severity },
    /// Request to join a chat room.
    ChatJoin { room_id: RoomId },
    /// Request to leave a chat room.
    ChatLeave { room_id: RoomId },
    /// Outbound chat line for a joined room.
    ChatSend { room_id: RoomId, text: String },
    /// Server confirmation of a join, announcing the room's chat channel.
    ChatJoined { room_id: RoomId, chat_id: ChatId },
    /// Inbound chat line for a room.
    ChatDeliver { room_id: RoomId, text: String },
    /// Server-wide announcement.
    ServerBroadcast { text: String },
}

impl Envelope {
    /// Short variant name used in log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Ping => "ping",
            Envelope::Register { .. } => "register",
            Envelope::RegisterAck => "register-ack",
            Envelope::Inform { .. } => "inform",
            Envelope::ChatJoin { .. } => "chat-join",
            Envelope::ChatLeave { .. } => "chat-leave",
            Envelope::ChatSend { .. } => "chat-send",
            Envelope::ChatJoined { .. } => "chat-joined",
            Envelope::ChatDeliver { .. } => "chat-deliver",
            Envelope::ServerBroadcast { .. } => "server-broadcast",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_displays_as_triple() {
        assert_eq!(ClientVersion::new(1, 4, 2).to_string(), "1.4.2");
    }

    #[test]
    fn room_id_round_trips_through_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(RoomId::new(id).as_uuid(), id);
    }

    #[test]
    fn kind_names_are_stable() {
        let envelope = Envelope::ChatDeliver {
            room_id: RoomId::random(),
            text: "hi".into(),
        };
        assert_eq!(envelope.kind(), "chat-deliver");
        assert_eq!(Envelope::Ping.kind(), "ping");
    }
}
