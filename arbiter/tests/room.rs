use std::time::Duration;

use arbiter::{
    spawn_room, ConnId, DisconnectChoice, MatchRuleChoice, OutboundFrame, RecordStore, RoomCommand,
    RoomHandle, ScorePolicyChoice, ServerConfig,
};
use tacta::{CardId, ClientMessage, Coord, ServerMessage};
use tokio::sync::mpsc;
use tokio::time::timeout;

fn test_config() -> ServerConfig {
    ServerConfig {
        capacity: 2,
        start_players: 2,
        hand_size: 1,
        draw_on_play: false,
        seed: Some(11),
        match_rule: MatchRuleChoice::AnyShape,
        score_policy: ScorePolicyChoice::PlacedDots,
        disconnect_policy: DisconnectChoice::Forfeit,
    }
}

fn open_room(config: ServerConfig) -> RoomHandle {
    spawn_room(String::from("test-room"), config, RecordStore::Noop, || {})
}

fn connect(handle: &RoomHandle, id: u64) -> mpsc::UnboundedReceiver<OutboundFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    handle
        .tx
        .send(RoomCommand::Connect { conn: ConnId(id), tx })
        .unwrap();
    rx
}

fn send(handle: &RoomHandle, id: u64, msg: ClientMessage) {
    handle
        .tx
        .send(RoomCommand::Inbound {
            conn: ConnId(id),
            msg,
        })
        .unwrap();
}

fn drop_conn(handle: &RoomHandle, id: u64) {
    handle
        .tx
        .send(RoomCommand::Disconnect { conn: ConnId(id) })
        .unwrap();
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<OutboundFrame>) -> ServerMessage {
    match timeout(Duration::from_secs(5), rx.recv()).await {
        Ok(Some(OutboundFrame::Text(text))) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {:?}", other),
    }
}

async fn recv_close(rx: &mut mpsc::UnboundedReceiver<OutboundFrame>) {
    loop {
        match timeout(Duration::from_secs(5), rx.recv()).await {
            Ok(Some(OutboundFrame::Close)) => return,
            Ok(Some(OutboundFrame::Text(_))) => continue,
            other => panic!("expected a close frame, got {:?}", other),
        }
    }
}

fn hand_card(msg: &ServerMessage) -> CardId {
    match msg {
        ServerMessage::State { game } => game.hand[0].id,
        other => panic!("expected STATE, got {:?}", other),
    }
}

/// Joins both participants and consumes their frames up to the dealt hands.
/// Returns the receivers plus each participant's single card.
async fn start_two_player_game(
    handle: &RoomHandle,
) -> (
    mpsc::UnboundedReceiver<OutboundFrame>,
    mpsc::UnboundedReceiver<OutboundFrame>,
    CardId,
    CardId,
) {
    let mut rx1 = connect(handle, 1);
    let mut rx2 = connect(handle, 2);

    send(handle, 1, ClientMessage::Join);
    assert!(matches!(recv(&mut rx1).await, ServerMessage::Welcome { .. }));
    // Pre-start snapshot: empty board, no hand yet.
    let lobby_state = recv(&mut rx1).await;
    match &lobby_state {
        ServerMessage::State { game } => assert!(game.board.is_empty() && game.hand.is_empty()),
        other => panic!("expected STATE, got {:?}", other),
    }

    send(handle, 2, ClientMessage::Join);
    assert!(matches!(recv(&mut rx2).await, ServerMessage::Welcome { .. }));
    // Joining the second participant starts the game and deals hands.
    let state1 = recv(&mut rx1).await;
    let state2 = recv(&mut rx2).await;
    let card1 = hand_card(&state1);
    let card2 = hand_card(&state2);
    (rx1, rx2, card1, card2)
}

#[tokio::test]
async fn join_assigns_identity_and_deals_at_quorum() {
    let handle = open_room(test_config());
    let mut rx1 = connect(&handle, 1);
    send(&handle, 1, ClientMessage::Join);
    match recv(&mut rx1).await {
        ServerMessage::Welcome { player_id, color } => {
            assert_eq!(player_id.0, 0);
            assert_eq!(color, "red");
        }
        other => panic!("expected WELCOME, got {:?}", other),
    }
    let _ = recv(&mut rx1).await; // lobby state

    let mut rx2 = connect(&handle, 2);
    send(&handle, 2, ClientMessage::Join);
    let _ = recv(&mut rx2).await; // welcome
    let state = recv(&mut rx2).await;
    match state {
        ServerMessage::State { game } => assert_eq!(game.hand.len(), 1),
        other => panic!("expected STATE, got {:?}", other),
    }
}

#[tokio::test]
async fn rejection_goes_only_to_the_offender() {
    let handle = open_room(test_config());
    let (mut rx1, mut rx2, _card1, card2) = start_two_player_game(&handle).await;

    // The second participant is not at turn.
    send(
        &handle,
        2,
        ClientMessage::play(card2, Coord::new(0, 0), 0),
    );
    match recv(&mut rx2).await {
        ServerMessage::Error { reason } => assert!(reason.contains("turn")),
        other => panic!("expected ERROR, got {:?}", other),
    }
    // The mover saw nothing: rejections are never broadcast.
    assert!(rx1.try_recv().is_err());
}

#[tokio::test]
async fn finished_game_broadcasts_end_and_rejects_further_moves() {
    let handle = open_room(test_config());
    let (mut rx1, mut rx2, card1, card2) = start_two_player_game(&handle).await;

    send(
        &handle,
        1,
        ClientMessage::play(card1, Coord::new(0, 0), 0),
    );
    assert!(matches!(recv(&mut rx1).await, ServerMessage::State { .. }));
    assert!(matches!(recv(&mut rx2).await, ServerMessage::State { .. }));

    send(
        &handle,
        2,
        ClientMessage::play(card2, Coord::new(1, 0), 0),
    );
    assert!(matches!(recv(&mut rx1).await, ServerMessage::State { .. }));
    assert!(matches!(recv(&mut rx2).await, ServerMessage::State { .. }));
    for rx in [&mut rx1, &mut rx2] {
        match recv(rx).await {
            ServerMessage::End { scores } => {
                assert_eq!(scores.len(), 2);
            }
            other => panic!("expected END, got {:?}", other),
        }
    }

    // The room is closed to further moves, but still answers.
    send(
        &handle,
        1,
        ClientMessage::play(card1, Coord::new(2, 0), 0),
    );
    match recv(&mut rx1).await {
        ServerMessage::Error { reason } => assert!(reason.contains("not active")),
        other => panic!("expected ERROR, got {:?}", other),
    }
}

#[tokio::test]
async fn play_before_join_closes_the_connection() {
    let handle = open_room(test_config());
    let mut rx = connect(&handle, 1);
    send(
        &handle,
        1,
        ClientMessage::play(CardId(0), Coord::new(0, 0), 0),
    );
    recv_close(&mut rx).await;
}

#[tokio::test]
async fn room_full_join_is_refused_and_closed() {
    let config = ServerConfig {
        capacity: 1,
        start_players: 99,
        ..test_config()
    };
    let handle = open_room(config);
    let mut rx1 = connect(&handle, 1);
    send(&handle, 1, ClientMessage::Join);
    assert!(matches!(recv(&mut rx1).await, ServerMessage::Welcome { .. }));

    let mut rx2 = connect(&handle, 2);
    send(&handle, 2, ClientMessage::Join);
    match recv(&mut rx2).await {
        ServerMessage::Error { reason } => assert!(reason.contains("full")),
        other => panic!("expected ERROR, got {:?}", other),
    }
    recv_close(&mut rx2).await;
}

#[tokio::test]
async fn lobby_leaver_frees_their_color() {
    let config = ServerConfig {
        capacity: 2,
        start_players: 99,
        ..test_config()
    };
    let handle = open_room(config);
    // A bystander connection keeps the room alive across the leave.
    let _bystander = connect(&handle, 9);

    let mut rx1 = connect(&handle, 1);
    send(&handle, 1, ClientMessage::Join);
    match recv(&mut rx1).await {
        ServerMessage::Welcome { color, .. } => assert_eq!(color, "red"),
        other => panic!("expected WELCOME, got {:?}", other),
    }
    drop_conn(&handle, 1);

    let mut rx2 = connect(&handle, 2);
    send(&handle, 2, ClientMessage::Join);
    match recv(&mut rx2).await {
        ServerMessage::Welcome { color, .. } => assert_eq!(color, "red"),
        other => panic!("expected WELCOME, got {:?}", other),
    }
}

#[tokio::test]
async fn room_exits_when_last_connection_leaves() {
    let (exit_tx, exit_rx) = tokio::sync::oneshot::channel();
    let handle = spawn_room(
        String::from("short-lived"),
        test_config(),
        RecordStore::Noop,
        move || {
            let _ = exit_tx.send(());
        },
    );
    let _rx = connect(&handle, 1);
    drop_conn(&handle, 1);
    timeout(Duration::from_secs(5), exit_rx)
        .await
        .expect("room should exit")
        .expect("exit callback should fire");
}
