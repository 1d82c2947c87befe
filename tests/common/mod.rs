//! Shared utilities for integration tests.
//!
//! Provides a minimal in-process game server speaking the session's wire
//! format, an events sink that records every callback, and timing helpers.
//! These reduce duplication across test modules.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use gamewire::{
    ClientVersion,
    Envelope,
    RoomId,
    Session,
    SessionConfig,
    SessionEvents,
    Severity,
    codec,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Shared result type for test bodies.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Client version used across the suites.
pub fn version() -> ClientVersion { ClientVersion::new(1, 4, 2) }

/// Configuration with short keep-alive bounds so suites finish quickly.
///
/// The idle timeout is generous relative to the ping interval so ordinary
/// traffic tests never trip it; heartbeat tests build their own tighter
/// configs.
pub fn test_config() -> SessionConfig {
    SessionConfig::default()
        .with_ping_interval(Duration::from_millis(200))
        .with_idle_timeout(Duration::from_secs(5))
}

/// In-process server end of the wire protocol.
pub struct TestServer {
    listener: TcpListener,
}

impl TestServer {
    /// Bind to an ephemeral localhost port.
    pub async fn bind() -> TestResult<Self> {
        Ok(Self {
            listener: TcpListener::bind("127.0.0.1:0").await?,
        })
    }

    /// The bound port.
    pub fn port(&self) -> TestResult<u16> { Ok(self.listener.local_addr()?.port()) }

    /// Accept the next client connection.
    pub async fn accept(&self) -> TestResult<ServerConn> {
        let (stream, _) = self.listener.accept().await?;
        Ok(ServerConn {
            framed: Framed::new(stream, codec::frame_codec(1024 * 1024)),
        })
    }
}

/// One accepted connection, framed like the client frames its side.
pub struct ServerConn {
    framed: Framed<TcpStream, LengthDelimitedCodec>,
}

impl ServerConn {
    /// Receive the next envelope, failing if the client closed.
    pub async fn recv(&mut self) -> TestResult<Envelope> {
        let frame = self.framed.next().await.ok_or("client closed the connection")??;
        Ok(codec::decode(&frame)?)
    }

    /// Receive the next envelope if one arrives within `wait`.
    pub async fn try_recv(&mut self, wait: Duration) -> Option<Envelope> {
        match tokio::time::timeout(wait, self.framed.next()).await {
            Ok(Some(Ok(frame))) => codec::decode(&frame).ok(),
            _ => None,
        }
    }

    /// Send one envelope to the client.
    pub async fn send(&mut self, envelope: &Envelope) -> TestResult<()> {
        self.framed.send(codec::encode(envelope)?).await?;
        Ok(())
    }
}

/// Events sink recording every callback for later assertions.
#[derive(Default)]
pub struct RecordingEvents {
    connected: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, Severity)>>,
    chat: Mutex<Vec<(RoomId, String)>>,
}

impl RecordingEvents {
    pub fn connected(&self) -> Vec<String> { self.connected.lock().expect("lock").clone() }

    pub fn errors(&self) -> Vec<(String, Severity)> { self.errors.lock().expect("lock").clone() }

    pub fn chat(&self) -> Vec<(RoomId, String)> { self.chat.lock().expect("lock").clone() }

    /// Errors whose message contains `needle`.
    pub fn errors_containing(&self, needle: &str) -> Vec<String> {
        self.errors()
            .into_iter()
            .filter_map(|(message, _)| message.contains(needle).then_some(message))
            .collect()
    }
}

impl SessionEvents for RecordingEvents {
    fn on_connected(&self, description: &str) {
        self.connected.lock().expect("lock").push(description.to_owned());
    }

    fn on_error(&self, message: &str, severity: Severity) {
        self.errors.lock().expect("lock").push((message.to_owned(), severity));
    }

    fn on_chat_message(&self, room_id: RoomId, text: &str) {
        self.chat.lock().expect("lock").push((room_id, text.to_owned()));
    }
}

/// Connect a session to `server`, drain the initial `Register`, and return
/// the pieces a test needs.
pub async fn connect_session(
    server: &TestServer,
    config: SessionConfig,
) -> TestResult<(Session, ServerConn, Arc<RecordingEvents>)> {
    let events = Arc::new(RecordingEvents::default());
    let session = Session::builder()
        .config(config)
        .events(Arc::clone(&events) as Arc<dyn SessionEvents>)
        .connect("alice", "127.0.0.1", server.port()?, version())
        .await?;
    let mut conn = server.accept().await?;
    let register = conn.recv().await?;
    assert!(
        matches!(register, Envelope::Register { .. }),
        "first message must be the registration, got {register:?}"
    );
    Ok((session, conn, events))
}

/// Poll `probe` every 10 ms until it returns true or `deadline` elapses.
pub async fn wait_until(deadline: Duration, mut probe: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + deadline;
    while tokio::time::Instant::now() < deadline {
        if probe() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    probe()
}
