//! Persistent client session for a multiplayer card-game server.
//!
//! This crate keeps one connection to the game server alive and routes its
//! traffic: a [`Session`] facade for the application, a framing layer turning
//! the byte stream into typed [`Envelope`]s, an idle/ping protocol that
//! detects silent network failures within a bounded time, and an ordered
//! stage pipeline dispatching every inbound message to the subsystem that
//! owns it (registration handshake, chat rooms, server announcements).
//!
//! All inbound handling runs sequentially on one I/O task; the application
//! issues commands from its own threads and receives notifications through
//! the [`SessionEvents`] callbacks.

pub mod broadcast;
pub mod capability;
pub mod chat;
pub mod codec;
pub mod config;
mod connection;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod message;
pub mod session;
pub mod stage;

pub use capability::Capability;
pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use events::{NullEvents, SessionEvents};
pub use message::{ChatId, ClientVersion, Envelope, RoomId, Severity};
pub use session::{Session, SessionBuilder};
