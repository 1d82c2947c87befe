//! Chat dispatch stage.

use std::sync::Arc;

use log::debug;

use crate::{
    chat::ChatRooms,
    message::Envelope,
    stage::{Flow, Stage, StageContext, StageError},
};

/// Multiplexes inbound chat traffic by room membership.
///
/// Consumes [`Envelope::ChatJoined`] (learning the room's chat channel) and
/// [`Envelope::ChatDeliver`]. Deliveries are handed to the application only
/// for rooms currently in the membership table; anything else is dropped
/// here, never surfaced.
pub struct ChatStage {
    rooms: Arc<ChatRooms>,
}

impl ChatStage {
    /// Create the stage over the shared membership table.
    #[must_use]
    pub fn new(rooms: Arc<ChatRooms>) -> Self { Self { rooms } }
}

impl Stage for ChatStage {
    fn name(&self) -> &'static str { "chat" }

    fn handle(&mut self, envelope: Envelope, cx: &mut StageContext<'_>) -> Result<Flow, StageError> {
        match envelope {
            Envelope::ChatJoined { room_id, chat_id } => {
                if self.rooms.set_chat_id(room_id, chat_id) {
                    debug!("room {room_id} uses chat channel {chat_id}");
                } else {
                    debug!("join confirmation for room {room_id} arrived after leaving");
                }
                Ok(Flow::Consumed)
            }
            Envelope::ChatDeliver { room_id, text } => {
                if self.rooms.is_member(room_id) {
                    cx.events().on_chat_message(room_id, &text);
                } else {
                    debug!("dropping chat for non-member room {room_id}");
                }
                Ok(Flow::Consumed)
            }
            other => Ok(Flow::Forward(other)),
        }
    }
}
