//! Error types for session operations.

use std::io;

use crate::{capability::Capability, codec::CodecError, config::ConfigError, message::RoomId};

/// Errors returned by [`crate::Session`] operations.
///
/// Local precondition failures ([`EmptyUsername`](SessionError::EmptyUsername),
/// [`NotJoined`](SessionError::NotJoined)) are reported synchronously and
/// never touch the network or tear down the connection. Transport-level
/// failures additionally reach the application through
/// [`crate::SessionEvents::on_error`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport error while connecting or writing.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    /// The configured connect bound elapsed before the transport opened.
    #[error("connecting to {addr} timed out")]
    ConnectTimeout { addr: String },
    /// The session configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Username must be non-empty before any I/O is attempted.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Failed to encode an outbound message.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// The connection is closed; the operation was not attempted.
    #[error("not connected")]
    NotConnected,
    /// The outbound queue is full; the message was not enqueued.
    #[error("outbound queue is full")]
    SendQueueFull,
    /// Chat messages can only be sent to rooms this session has joined.
    #[error("not a member of chat room {0}")]
    NotJoined(RoomId),
    /// The requested domain operation is not available on this client.
    #[error("{0} is not available on this client")]
    CapabilityUnavailable(Capability),
}
