//! Session facade.
//!
//! [`Session`] is the one object the application holds. `connect` opens the
//! transport, initiates registration and spawns the I/O task; every other
//! operation either reads a local snapshot or enqueues a write for the I/O
//! task, so the caller never blocks on the network. `disconnect` is the only
//! other bounded wait.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::SinkExt;
use log::{debug, info, warn};
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time,
};
use tokio_util::{codec::Framed, sync::CancellationToken};
use uuid::Uuid;

use crate::{
    broadcast::BroadcastLog,
    capability::Capability,
    chat::ChatRooms,
    codec,
    config::SessionConfig,
    connection::ConnectionActor,
    error::SessionError,
    events::{NullEvents, SessionEvents},
    heartbeat::IdleMonitor,
    message::{ChatId, ClientVersion, Envelope, RoomId, Severity},
    stage::{BroadcastStage, ChatStage, InformStage, Pipeline, PingStage, RegistrationStage},
};

/// Writes queued by the facade but not yet picked up by the I/O task.
/// Filling up means the connection has stalled for a while; the caller gets
/// an explicit error instead of an unbounded buffer.
const OUTBOUND_QUEUE_CAPACITY: usize = 64;

/// Configures and connects a [`Session`].
///
/// # Examples
///
/// ```no_run
/// use gamewire::{ClientVersion, Session};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), gamewire::SessionError> {
/// let session = Session::builder()
///     .connect("alice", "play.example.net", 17171, ClientVersion::new(1, 4, 2))
///     .await?;
/// assert!(session.is_connected());
/// session.disconnect().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
    events: Arc<dyn SessionEvents>,
}

impl SessionBuilder {
    /// Create a builder with the default configuration and a no-op events
    /// sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            events: Arc::new(NullEvents),
        }
    }

    /// Replace the session configuration.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Install the application callback surface.
    ///
    /// Callbacks are invoked from the I/O task and must not block.
    #[must_use]
    pub fn events(mut self, events: Arc<dyn SessionEvents>) -> Self {
        self.events = events;
        self
    }

    /// Open the transport, initiate registration and spawn the I/O task.
    ///
    /// On return the `Register` message has been written (registration is
    /// pending, not acknowledged) and `on_connected` has fired. On failure
    /// nothing is left running: no task, no socket, and the application has
    /// received `on_error` with a human-readable reason for any transport
    /// failure.
    ///
    /// # Errors
    ///
    /// [`SessionError::EmptyUsername`] and [`SessionError::Config`] are
    /// rejected before any I/O. [`SessionError::ConnectTimeout`] and
    /// [`SessionError::Io`] report transport establishment failures.
    pub async fn connect(
        self,
        username: &str,
        host: &str,
        port: u16,
        version: ClientVersion,
    ) -> Result<Session, SessionError> {
        let Self { config, events } = self;
        config.validate()?;
        if username.trim().is_empty() {
            return Err(SessionError::EmptyUsername);
        }

        let addr = format!("{host}:{port}");
        let stream = match time::timeout(config.connect_timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                events.on_error(&format!("error connecting to {addr}: {err}"), Severity::Error);
                return Err(err.into());
            }
            Err(_) => {
                events.on_error(&format!("connecting to {addr} timed out"), Severity::Error);
                return Err(SessionError::ConnectTimeout { addr });
            }
        };
        let mut framed = Framed::new(stream, codec::frame_codec(config.max_frame_length));

        // Initiate the handshake before the I/O task starts so the transport
        // is never open without a registration in flight.
        let register = Envelope::Register {
            username: username.to_owned(),
            version,
        };
        let payload = codec::encode(&register)?;
        if let Err(err) = framed.send(payload).await {
            events.on_error(&format!("error connecting to {addr}: {err}"), Severity::Error);
            return Err(err.into());
        }
        debug!("registration initiated for {username}");

        let connected = Arc::new(AtomicBool::new(true));
        let rooms = Arc::new(ChatRooms::new());
        let broadcasts = Arc::new(BroadcastLog::new(config.broadcast_log_cap));
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        let shutdown = CancellationToken::new();

        let pipeline = Pipeline::new(vec![
            Box::new(PingStage::new()),
            Box::new(InformStage::new()),
            Box::new(RegistrationStage::new(username.to_owned(), version)),
            Box::new(ChatStage::new(Arc::clone(&rooms))),
            Box::new(BroadcastStage::new(Arc::clone(&broadcasts))),
        ]);
        let monitor = IdleMonitor::new(
            config.ping_interval,
            config.idle_timeout,
            time::Instant::now(),
        );
        let actor = ConnectionActor::new(
            framed,
            outbound_rx,
            pipeline,
            monitor,
            shutdown.clone(),
            Arc::clone(&connected),
            Arc::clone(&events),
        );
        let handle = tokio::spawn(actor.run());

        let description = format!("{username}@{addr}");
        info!("connected: {description}");
        events.on_connected(&description);

        Ok(Session {
            username: username.to_owned(),
            connected,
            rooms,
            broadcasts,
            outbound: outbound_tx,
            shutdown,
            actor: Mutex::new(Some(handle)),
            disconnect_timeout: config.disconnect_timeout,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self { Self::new() }
}

/// A live (or torn-down) client session.
///
/// The session owns the connection exclusively. Chat commands and snapshot
/// queries never block; inbound traffic reaches the application through the
/// [`SessionEvents`] callbacks installed at build time.
pub struct Session {
    username: String,
    connected: Arc<AtomicBool>,
    rooms: Arc<ChatRooms>,
    broadcasts: Arc<BroadcastLog>,
    outbound: mpsc::Sender<Envelope>,
    shutdown: CancellationToken,
    actor: Mutex<Option<JoinHandle<()>>>,
    disconnect_timeout: Duration,
}

impl Session {
    /// Start building a session.
    #[must_use]
    pub fn builder() -> SessionBuilder { SessionBuilder::new() }

    /// Whether the connection is currently usable for I/O.
    ///
    /// Reads a local flag; never blocks, never touches the network.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.connected.load(Ordering::SeqCst) }

    /// The username this session registered with.
    #[must_use]
    pub fn username(&self) -> &str { &self.username }

    /// Close the connection and wait for teardown, bounded by the configured
    /// disconnect timeout.
    ///
    /// If teardown does not finish in time the I/O task is aborted. Calling
    /// this on an already-closed session is a no-op.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for teardown
    /// diagnostics.
    pub async fn disconnect(&self) -> Result<(), SessionError> {
        let handle = self.actor.lock().await.take();
        let Some(mut handle) = handle else {
            debug!("disconnect called while not connected; nothing to do");
            return Ok(());
        };
        self.shutdown.cancel();
        match time::timeout(self.disconnect_timeout, &mut handle).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!("connection task ended abnormally: {err}"),
            Err(_) => {
                warn!(
                    "teardown did not finish within {:?}; aborting connection task",
                    self.disconnect_timeout
                );
                handle.abort();
            }
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Join a chat room.
    ///
    /// Membership is recorded immediately, so a subsequent
    /// [`send_chat_message`](Self::send_chat_message) for the same room
    /// succeeds; the join message is written by the I/O task in call order,
    /// ahead of any later sends.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotConnected`] or [`SessionError::SendQueueFull`] if
    /// the join cannot be enqueued.
    pub fn join_chat(&self, room: RoomId) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        let newly = self.rooms.join(room);
        if !newly {
            debug!("already a member of room {room}; re-sending join");
        }
        match self.enqueue(Envelope::ChatJoin { room_id: room }) {
            Ok(()) => Ok(()),
            Err(err) => {
                // Keep membership consistent with what reached the wire.
                if newly {
                    self.rooms.leave(room);
                }
                Err(err)
            }
        }
    }

    /// Leave a chat room.
    ///
    /// Idempotent: leaving a room that is not a member does nothing and
    /// sends nothing.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotConnected`] or [`SessionError::SendQueueFull`] if
    /// the room was a member but the leave cannot be enqueued.
    pub fn leave_chat(&self, room: RoomId) -> Result<(), SessionError> {
        if !self.rooms.leave(room) {
            return Ok(());
        }
        self.enqueue(Envelope::ChatLeave { room_id: room })
    }

    /// Send a chat line to a joined room.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotJoined`] if the room is not a member, checked
    /// locally, nothing touches the network. [`SessionError::NotConnected`]
    /// or [`SessionError::SendQueueFull`] if the message cannot be enqueued.
    pub fn send_chat_message(&self, room: RoomId, text: &str) -> Result<(), SessionError> {
        if !self.rooms.is_member(room) {
            return Err(SessionError::NotJoined(room));
        }
        self.enqueue(Envelope::ChatSend {
            room_id: room,
            text: text.to_owned(),
        })
    }

    /// The chat channel backing `room`, once the server has announced it.
    ///
    /// Returns `None` (with a logged cause) for unknown rooms or before the
    /// join confirmation arrives; resolution is best-effort and never fails
    /// the session.
    #[must_use]
    pub fn room_chat_id(&self, room: RoomId) -> Option<ChatId> {
        let chat_id = self.rooms.chat_id(room);
        if chat_id.is_none() {
            debug!("no chat channel known for room {room}");
        }
        chat_id
    }

    /// Rooms this session is currently a member of.
    #[must_use]
    pub fn joined_rooms(&self) -> Vec<RoomId> { self.rooms.joined() }

    /// Snapshot of server announcements received since connect (or since the
    /// last [`clear_server_messages`](Self::clear_server_messages)), in
    /// arrival order.
    #[must_use]
    pub fn server_messages(&self) -> Vec<String> { self.broadcasts.snapshot() }

    /// Drop all retained server announcements.
    pub fn clear_server_messages(&self) { self.broadcasts.clear(); }

    /// Request a domain capability.
    ///
    /// # Errors
    ///
    /// Always [`SessionError::CapabilityUnavailable`] until the subsystem is
    /// implemented; see [`Capability`].
    pub fn capability(&self, capability: Capability) -> Result<(), SessionError> {
        debug!("{capability} requested but not available on this client");
        Err(SessionError::CapabilityUnavailable(capability))
    }

    /// Join a table in a room. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with [`Capability::Tables`].
    pub fn join_table(&self, _room: RoomId, _table_id: Uuid) -> Result<(), SessionError> {
        self.capability(Capability::Tables)
    }

    /// Watch a table in a room. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with [`Capability::Tables`].
    pub fn watch_table(&self, _room: RoomId, _table_id: Uuid) -> Result<(), SessionError> {
        self.capability(Capability::Tables)
    }

    /// Join a tournament. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with
    /// [`Capability::Tournaments`].
    pub fn join_tournament(&self, _tournament_id: Uuid) -> Result<(), SessionError> {
        self.capability(Capability::Tournaments)
    }

    /// Pick a card in a draft. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with [`Capability::Drafts`].
    pub fn pick_card(&self, _draft_id: Uuid, _card_id: Uuid) -> Result<(), SessionError> {
        self.capability(Capability::Drafts)
    }

    /// Send an in-game player action. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with
    /// [`Capability::GameActions`].
    pub fn send_player_action(&self, _game_id: Uuid, _action: &str) -> Result<(), SessionError> {
        self.capability(Capability::GameActions)
    }

    /// Replay a finished game. Not yet available.
    ///
    /// # Errors
    ///
    /// [`SessionError::CapabilityUnavailable`] with [`Capability::Replays`].
    pub fn replay_game(&self, _game_id: Uuid) -> Result<(), SessionError> {
        self.capability(Capability::Replays)
    }

    fn enqueue(&self, envelope: Envelope) -> Result<(), SessionError> {
        if !self.is_connected() {
            return Err(SessionError::NotConnected);
        }
        self.outbound.try_send(envelope).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => SessionError::SendQueueFull,
            mpsc::error::TrySendError::Closed(_) => SessionError::NotConnected,
        })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Teardown completes in the background; the I/O task observes the
        // token on its next loop iteration.
        self.shutdown.cancel();
    }
}
