//! Application callback surface.
//!
//! The session invokes these callbacks from its I/O task. Implementations
//! must not block; an application that needs to hop back to its own
//! execution context (for example a UI thread) is responsible for that hop.

use crate::message::{RoomId, Severity};

/// Notifications delivered from the session to the application.
///
/// All methods default to no-ops so implementations only override what they
/// observe.
pub trait SessionEvents: Send + Sync + 'static {
    /// The connection is established and registration has been initiated.
    ///
    /// `description` identifies the session in `user@host:port` form.
    fn on_connected(&self, _description: &str) {}

    /// A failure or server notice. Invoked for connect failures, idle
    /// timeouts, decode failures, registration failure and server informs.
    fn on_error(&self, _message: &str, _severity: Severity) {}

    /// A chat line arrived for a room this session is a member of.
    fn on_chat_message(&self, _room_id: RoomId, _text: &str) {}
}

/// Events sink that discards every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullEvents;

impl SessionEvents for NullEvents {}
