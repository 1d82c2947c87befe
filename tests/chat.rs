//! Integration tests for chat room membership, local send preconditions and
//! inbound dispatch.

use std::time::Duration;

use gamewire::{ChatId, Envelope, RoomId, SessionError};

mod common;
use common::{TestResult, TestServer, connect_session, test_config, wait_until};

#[tokio::test]
async fn send_without_membership_fails_locally() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    let room = RoomId::random();
    let result = session.send_chat_message(room, "hello?");
    assert!(matches!(result, Err(SessionError::NotJoined(r)) if r == room));

    // Nothing reached the wire.
    assert_eq!(conn.try_recv(Duration::from_millis(150)).await, None);

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn join_precedes_send_on_the_wire() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    let room = RoomId::random();
    session.join_chat(room)?;
    session.send_chat_message(room, "made it")?;

    assert_eq!(conn.recv().await?, Envelope::ChatJoin { room_id: room });
    assert_eq!(
        conn.recv().await?,
        Envelope::ChatSend {
            room_id: room,
            text: "made it".into(),
        }
    );

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn leave_is_idempotent() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    let room = RoomId::random();
    // Leaving a room that was never joined does nothing, twice.
    session.leave_chat(room)?;
    session.leave_chat(room)?;
    assert_eq!(conn.try_recv(Duration::from_millis(150)).await, None);

    // After a real join, exactly one leave reaches the wire.
    session.join_chat(room)?;
    session.leave_chat(room)?;
    session.leave_chat(room)?;
    assert_eq!(conn.recv().await?, Envelope::ChatJoin { room_id: room });
    assert_eq!(conn.recv().await?, Envelope::ChatLeave { room_id: room });
    assert_eq!(conn.try_recv(Duration::from_millis(150)).await, None);

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn deliveries_reach_members_until_they_leave() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    let room = RoomId::random();
    session.join_chat(room)?;
    assert_eq!(conn.recv().await?, Envelope::ChatJoin { room_id: room });

    conn.send(&Envelope::ChatDeliver {
        room_id: room,
        text: "hi".into(),
    })
    .await?;
    assert!(wait_until(Duration::from_secs(2), || events.chat().len() == 1).await);
    assert_eq!(events.chat(), vec![(room, "hi".to_owned())]);

    session.leave_chat(room)?;
    assert_eq!(conn.recv().await?, Envelope::ChatLeave { room_id: room });

    // A delivery for the now-departed room produces no callback.
    conn.send(&Envelope::ChatDeliver {
        room_id: room,
        text: "hi2".into(),
    })
    .await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(events.chat().len(), 1);

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn deliveries_for_unjoined_rooms_are_dropped() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    conn.send(&Envelope::ChatDeliver {
        room_id: RoomId::random(),
        text: "who dis".into(),
    })
    .await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(events.chat().is_empty());
    assert!(session.is_connected(), "a stray delivery is not an error");

    session.disconnect().await?;
    Ok(())
}

#[tokio::test]
async fn chat_channel_is_learned_from_the_join_confirmation() -> TestResult {
    let server = TestServer::bind().await?;
    let (session, mut conn, _events) = connect_session(&server, test_config()).await?;
    conn.send(&Envelope::RegisterAck).await?;

    let room = RoomId::random();
    let chat = ChatId::random();
    session.join_chat(room)?;
    assert_eq!(conn.recv().await?, Envelope::ChatJoin { room_id: room });

    // Unknown until the server announces it.
    assert_eq!(session.room_chat_id(room), None);

    conn.send(&Envelope::ChatJoined {
        room_id: room,
        chat_id: chat,
    })
    .await?;
    assert!(
        wait_until(Duration::from_secs(2), || {
            session.room_chat_id(room) == Some(chat)
        })
        .await
    );

    // A room this session never joined resolves to nothing.
    assert_eq!(session.room_chat_id(RoomId::random()), None);

    session.disconnect().await?;
    Ok(())
}
