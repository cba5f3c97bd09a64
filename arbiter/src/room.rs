use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tacta::{
    game_view, ClientMessage, Coord, DisconnectOutcome, ParticipantId, Phase, PlayOutcome,
    PlayProposal, ServerMessage, Session,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{RecordStore, ServerConfig};

/// Identity of one connection to a room, assigned by the socket layer.
/// Distinct from the participant id, which only exists after a `JOIN`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnId(pub u64);

/// A frame for one connection's outbound queue.
#[derive(Clone, Debug)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// A request for the room authority, delivered in arrival order.
#[derive(Debug)]
pub enum RoomCommand {
    Connect {
        conn: ConnId,
        tx: mpsc::UnboundedSender<OutboundFrame>,
    },
    Inbound {
        conn: ConnId,
        msg: ClientMessage,
    },
    Disconnect {
        conn: ConnId,
    },
}

#[derive(Clone)]
pub struct RoomHandle {
    pub tx: mpsc::UnboundedSender<RoomCommand>,
}

/// Spawns the authority task for one room.
///
/// The task exclusively owns the room's [`Session`] and processes commands
/// one at a time, so validation and commit are atomic with respect to every
/// other operation on the room. It exits (calling `on_exit`) once its last
/// connection is gone.
pub fn spawn_room(
    room_id: String,
    config: ServerConfig,
    records: RecordStore,
    on_exit: impl FnOnce() + Send + 'static,
) -> RoomHandle {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut room = Room {
        room_id,
        session: Session::new(config.session_config()),
        start_players: config.start_players,
        connections: HashMap::new(),
        rng,
        records,
        served_any: false,
    };
    tokio::spawn(async move {
        info!(room = room.room_id, "room opened");
        while let Some(command) = rx.recv().await {
            room.handle(command);
            if room.served_any && room.connections.is_empty() {
                break;
            }
        }
        info!(room = room.room_id, "room closed");
        on_exit();
    });
    RoomHandle { tx }
}

struct Connection {
    tx: mpsc::UnboundedSender<OutboundFrame>,
    participant: Option<ParticipantId>,
}

struct Room {
    room_id: String,
    session: Session,
    start_players: usize,
    connections: HashMap<ConnId, Connection>,
    rng: StdRng,
    records: RecordStore,
    served_any: bool,
}

impl Room {
    fn handle(&mut self, command: RoomCommand) {
        match command {
            RoomCommand::Connect { conn, tx } => {
                self.served_any = true;
                self.connections.insert(
                    conn,
                    Connection {
                        tx,
                        participant: None,
                    },
                );
            }
            RoomCommand::Inbound { conn, msg } => self.handle_message(conn, msg),
            RoomCommand::Disconnect { conn } => self.handle_disconnect(conn),
        }
    }

    fn handle_message(&mut self, conn: ConnId, msg: ClientMessage) {
        match msg {
            ClientMessage::Join => self.handle_join(conn),
            ClientMessage::Play {
                card_id,
                x,
                y,
                orientation,
            } => {
                let proposal = PlayProposal {
                    card_id,
                    coord: Coord::new(x, y),
                    orientation,
                };
                self.handle_play(conn, proposal);
            }
        }
    }

    fn handle_join(&mut self, conn: ConnId) {
        if self
            .connections
            .get(&conn)
            .map(|c| c.participant.is_some())
            .unwrap_or(true)
        {
            warn!(room = self.room_id, ?conn, "duplicate JOIN, closing");
            self.close(conn);
            return;
        }
        match self.session.join() {
            Ok((participant_id, color)) => {
                if let Some(connection) = self.connections.get_mut(&conn) {
                    connection.participant = Some(participant_id);
                }
                debug!(room = self.room_id, id = participant_id.0, color, "joined");
                self.send(
                    conn,
                    &ServerMessage::Welcome {
                        player_id: participant_id,
                        color,
                    },
                );
                if self.session.phase() == Phase::Lobby
                    && self.session.participants().len() >= self.start_players
                {
                    // The start trigger is ours, not the state machine's.
                    if self.session.start(&mut self.rng).is_ok() {
                        info!(room = self.room_id, "game started");
                    }
                }
                self.broadcast_state();
            }
            Err(rejection) => {
                // This connection can never become a participant.
                self.send(
                    conn,
                    &ServerMessage::Error {
                        reason: rejection.to_string(),
                    },
                );
                self.close(conn);
            }
        }
    }

    fn handle_play(&mut self, conn: ConnId, proposal: PlayProposal) {
        let Some(participant_id) = self.connections.get(&conn).and_then(|c| c.participant) else {
            warn!(room = self.room_id, ?conn, "PLAY before JOIN, closing");
            self.close(conn);
            return;
        };
        match self.session.play(participant_id, &proposal) {
            Ok(PlayOutcome::Placed) => self.broadcast_state(),
            Ok(PlayOutcome::Ended) => {
                self.broadcast_state();
                self.finish_game();
            }
            Err(rejection) => {
                debug!(
                    room = self.room_id,
                    id = participant_id.0,
                    %rejection,
                    "move rejected"
                );
                self.send(
                    conn,
                    &ServerMessage::Error {
                        reason: rejection.to_string(),
                    },
                );
            }
        }
    }

    fn handle_disconnect(&mut self, conn: ConnId) {
        let Some(connection) = self.connections.remove(&conn) else {
            return;
        };
        if let Some(participant_id) = connection.participant {
            match self.session.disconnect(participant_id) {
                DisconnectOutcome::Left | DisconnectOutcome::Dropped => self.broadcast_state(),
                DisconnectOutcome::Ended => {
                    self.broadcast_state();
                    self.finish_game();
                }
                DisconnectOutcome::Ignored => {}
            }
        }
    }

    /// Broadcasts the terminal scores and appends them to the leaderboard.
    fn finish_game(&mut self) {
        let scores = self.session.scores().to_vec();
        info!(room = self.room_id, ?scores, "game over");
        self.broadcast(&ServerMessage::End {
            scores: scores.clone(),
        });
        let records = self.records.clone();
        let room_id = self.room_id.clone();
        tokio::spawn(async move {
            for entry in scores {
                if let Err(err) = records.append(&entry.color, entry.score).await {
                    warn!(room = room_id, ?err, "failed to append score record");
                }
            }
        });
    }

    /// Sends each participant their own snapshot. Connections that have not
    /// joined yet see nothing.
    fn broadcast_state(&self) {
        for connection in self.connections.values() {
            if let Some(participant_id) = connection.participant {
                let msg = ServerMessage::State {
                    game: game_view(&self.session, participant_id),
                };
                send_frame(connection, &msg);
            }
        }
    }

    fn broadcast(&self, msg: &ServerMessage) {
        for connection in self.connections.values() {
            if connection.participant.is_some() {
                send_frame(connection, msg);
            }
        }
    }

    fn send(&self, conn: ConnId, msg: &ServerMessage) {
        if let Some(connection) = self.connections.get(&conn) {
            send_frame(connection, msg);
        }
    }

    fn close(&mut self, conn: ConnId) {
        if let Some(connection) = self.connections.get(&conn) {
            let _ = connection.tx.send(OutboundFrame::Close);
        }
    }
}

fn send_frame(connection: &Connection, msg: &ServerMessage) {
    match serde_json::to_string(msg) {
        Ok(text) => {
            let _ = connection.tx.send(OutboundFrame::Text(text));
        }
        Err(err) => warn!(?err, "failed to serialize outbound message"),
    }
}
