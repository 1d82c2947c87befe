//! Integration tests for the keep-alive protocol: ping emission on write
//! inactivity and death on read inactivity.

use std::time::Duration;

use gamewire::{Envelope, SessionConfig};

mod common;
use common::{TestResult, TestServer, connect_session, wait_until};

fn keepalive_config(ping_ms: u64, idle_ms: u64) -> SessionConfig {
    SessionConfig::default()
        .with_ping_interval(Duration::from_millis(ping_ms))
        .with_idle_timeout(Duration::from_millis(idle_ms))
}

#[tokio::test]
async fn ping_is_emitted_on_write_inactivity() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, keepalive_config(100, 3000)).await?;
    conn.send(&Envelope::RegisterAck).await?;

    // The client has nothing to say; a ping must arrive on its own.
    let next = tokio::time::timeout(Duration::from_secs(1), conn.recv()).await??;
    assert_eq!(next, Envelope::Ping);

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn silence_kills_the_connection_exactly_once() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, events) = connect_session(&server, keepalive_config(100, 400)).await?;
    conn.send(&Envelope::RegisterAck).await?;

    // The server goes silent; the client must declare the connection dead.
    assert!(
        wait_until(Duration::from_secs(3), || !session.is_connected()).await,
        "idle timeout must tear the session down"
    );

    // Death is reported once and stays reported once.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        events.errors_containing("no traffic").len(),
        1,
        "got {:?}",
        events.errors()
    );
    Ok(())
}

#[tokio::test]
async fn inbound_traffic_keeps_the_session_alive() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, keepalive_config(100, 400)).await?;
    conn.send(&Envelope::RegisterAck).await?;

    // Ping well inside the timeout for several multiples of it.
    for _ in 0..10 {
        conn.send(&Envelope::Ping).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(session.is_connected(), "regular traffic must hold the session open");

    // Once the server stops, death follows within the timeout.
    assert!(wait_until(Duration::from_secs(3), || !session.is_connected()).await);
    Ok(())
}
