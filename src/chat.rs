//! Chat room membership shared between the facade and the I/O task.
//!
//! The application joins and leaves rooms on its own thread while the chat
//! stage filters inbound deliveries and learns chat-channel ids on the I/O
//! task. A concurrent map keeps both sides safe without a lock spanning the
//! pipeline.

use dashmap::DashMap;

use crate::message::{ChatId, RoomId};

/// Per-room membership record.
#[derive(Clone, Copy, Debug, Default)]
struct RoomMembership {
    /// Chat channel announced by the server's join confirmation, once known.
    chat_id: Option<ChatId>,
}

/// Set of rooms this session has joined, with their chat channels.
///
/// Only joined rooms have entries; a chat message for a room without an
/// entry is dropped before it reaches the application.
#[derive(Debug, Default)]
pub struct ChatRooms {
    rooms: DashMap<RoomId, RoomMembership>,
}

impl ChatRooms {
    /// Create an empty membership table.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Add `room` to the membership set.
    ///
    /// Returns `false` when the room was already a member; the existing
    /// entry (and any learned chat id) is kept.
    pub fn join(&self, room: RoomId) -> bool {
        let mut newly = false;
        self.rooms.entry(room).or_insert_with(|| {
            newly = true;
            RoomMembership::default()
        });
        newly
    }

    /// Remove `room` from the membership set.
    ///
    /// Returns `true` when the room was a member.
    pub fn leave(&self, room: RoomId) -> bool { self.rooms.remove(&room).is_some() }

    /// Whether `room` is currently a member.
    #[must_use]
    pub fn is_member(&self, room: RoomId) -> bool { self.rooms.contains_key(&room) }

    /// Record the chat channel announced for `room`.
    ///
    /// Returns `false` when the room is no longer a member (left before the
    /// confirmation arrived); the announcement is discarded.
    pub fn set_chat_id(&self, room: RoomId, chat_id: ChatId) -> bool {
        match self.rooms.get_mut(&room) {
            Some(mut membership) => {
                membership.chat_id = Some(chat_id);
                true
            }
            None => false,
        }
    }

    /// The chat channel for `room`, if joined and already announced.
    #[must_use]
    pub fn chat_id(&self, room: RoomId) -> Option<ChatId> {
        self.rooms.get(&room).and_then(|membership| membership.chat_id)
    }

    /// Snapshot of the currently joined rooms.
    #[must_use]
    pub fn joined(&self) -> Vec<RoomId> { self.rooms.iter().map(|entry| *entry.key()).collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_tracked_and_leave_removes() {
        let rooms = ChatRooms::new();
        let room = RoomId::random();
        assert!(!rooms.is_member(room));
        assert!(rooms.join(room));
        assert!(rooms.is_member(room));
        assert!(rooms.leave(room));
        assert!(!rooms.is_member(room));
    }

    #[test]
    fn leave_without_membership_reports_false() {
        let rooms = ChatRooms::new();
        assert!(!rooms.leave(RoomId::random()));
    }

    #[test]
    fn rejoin_keeps_learned_chat_id() {
        let rooms = ChatRooms::new();
        let room = RoomId::random();
        let chat = ChatId::random();
        assert!(rooms.join(room));
        assert!(rooms.set_chat_id(room, chat));
        assert!(!rooms.join(room));
        assert_eq!(rooms.chat_id(room), Some(chat));
    }

    #[test]
    fn chat_id_for_left_room_is_discarded() {
        let rooms = ChatRooms::new();
        let room = RoomId::random();
        rooms.join(room);
        rooms.leave(room);
        assert!(!rooms.set_chat_id(room, ChatId::random()));
        assert_eq!(rooms.chat_id(room), None);
    }
}
