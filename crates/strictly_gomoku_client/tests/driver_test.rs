//! Session driver tests on a paused tokio clock.

use std::time::Duration;
use strictly_gomoku::{Coord, GameStatus, Symbol};
use strictly_gomoku_client::{
    ClientConfig, ConnectionState, GameClient, InboundFrame, MemoryTransport, MoveRejection,
    PlayerId, RoomId, SessionDriver, SubmitError,
};

const GAME: &str = "/topic/game/42";
const ROOM: &str = "/topic/room/42";
const STARTED: &str = r#"{"type": "GAME_STARTED", "players": [
    {"playerId": "alice", "symbol": "X"}, {"playerId": "bob", "symbol": "O"}]}"#;

fn driver(
    transport: &MemoryTransport,
) -> (
    SessionDriver<MemoryTransport>,
    strictly_gomoku_client::DriverHandle,
) {
    let client = GameClient::new(
        ClientConfig::default(),
        transport.clone(),
        RoomId::new("42"),
        PlayerId::new("alice"),
    );
    client.join().expect("connected");
    SessionDriver::new(client)
}

#[tokio::test(start_paused = true)]
async fn test_unacknowledged_move_rolls_back_after_timeout() {
    let transport = MemoryTransport::connected();
    let (driver, handle) = driver(&transport);
    let task = tokio::spawn(driver.run());

    handle
        .push_frame(InboundFrame::new(ROOM.to_string(), STARTED.to_string()))
        .expect("driver running");
    let mv = handle
        .submit(Coord::new(7, 7))
        .await
        .expect("driver running")
        .expect("accepted");
    assert_eq!(mv.player, Symbol::X);

    let err = handle
        .submit(Coord::new(0, 0))
        .await
        .expect("driver running")
        .expect_err("in flight");
    assert_eq!(err, SubmitError::Rejected(MoveRejection::MoveInFlight));

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(handle.snapshot().await.expect("running").pending().is_some());

    tokio::time::sleep(Duration::from_millis(600)).await;
    let state = handle.snapshot().await.expect("running");
    assert!(state.pending().is_none());
    assert!(state.board().is_clear());
    assert!(state.session().is_local_turn());

    drop(handle);
    let client = task.await.expect("driver exits");
    assert_eq!(client.state().session().status(), GameStatus::Playing);
}

#[tokio::test(start_paused = true)]
async fn test_echo_beats_timeout() {
    let transport = MemoryTransport::connected();
    let (driver, handle) = driver(&transport);
    let task = tokio::spawn(driver.run());

    handle
        .push_frame(InboundFrame::new(ROOM.to_string(), STARTED.to_string()))
        .expect("running");
    handle
        .submit(Coord::new(7, 7))
        .await
        .expect("running")
        .expect("accepted");
    handle
        .push_frame(InboundFrame::new(
            GAME.to_string(),
            r#"{"xposition": 7, "yposition": 7, "playerSymbol": "X", "playerId": "alice", "sequence": 1}"#
                .to_string(),
        ))
        .expect("running");

    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = handle.snapshot().await.expect("running");
    assert!(state.pending().is_none());
    assert_eq!(state.session().last_sequence(), 1);
    assert_eq!(state.session().current_turn(), Symbol::O);

    handle.leave().await.expect("running");
    let client = task.await.expect("driver exits");
    assert!(client.state().board().is_clear());
    assert!(transport.subscriptions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_connection_changes_reach_the_store() {
    let transport = MemoryTransport::new(ConnectionState::Connecting);
    let client = GameClient::new(
        ClientConfig::default(),
        transport.clone(),
        RoomId::new("42"),
        PlayerId::new("alice"),
    );
    let (driver, handle) = SessionDriver::new(client);
    let task = tokio::spawn(driver.run());

    assert_eq!(
        handle.snapshot().await.expect("running").connection(),
        ConnectionState::Connecting
    );
    transport.set_connection(ConnectionState::Connected);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        handle.snapshot().await.expect("running").connection(),
        ConnectionState::Connected
    );

    drop(handle);
    task.await.expect("driver exits");
}
