use std::collections::BTreeMap;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tacta::{
    Board, Card, CardId, ClientMessage, Coord, GameView, ParticipantId, Rejection, ScoreEntry,
    ServerMessage,
};
use tokio_tungstenite::tungstenite::Message;

/// A participant-local, read-only copy of server-declared state.
///
/// The mirror is never authoritative: every `STATE` message replaces it
/// wholesale. A proposed card can be marked pending for optimistic UI
/// feedback; the next authoritative message reconciles it either way.
pub struct Mirror {
    player_id: Option<ParticipantId>,
    color: Option<String>,
    view: GameView,
    pending: Option<CardId>,
    scores: Option<Vec<ScoreEntry>>,
}

/// What an applied server message means for the embedding client:
/// replace the local mirror, signal a re-render.
#[derive(Clone, Debug)]
pub enum MirrorEvent {
    Welcomed,
    StateReplaced,
    Rejected(String),
    Ended,
}

impl Default for Mirror {
    fn default() -> Self {
        Self::new()
    }
}

impl Mirror {
    pub fn new() -> Self {
        Self {
            player_id: None,
            color: None,
            view: GameView {
                board: BTreeMap::new(),
                hand: Vec::new(),
            },
            pending: None,
            scores: None,
        }
    }

    /// Replaces the mirrored state according to one server message.
    pub fn apply(&mut self, msg: ServerMessage) -> MirrorEvent {
        match msg {
            ServerMessage::Welcome { player_id, color } => {
                self.player_id = Some(player_id);
                self.color = Some(color);
                MirrorEvent::Welcomed
            }
            ServerMessage::State { game } => {
                self.view = game;
                self.pending = None;
                MirrorEvent::StateReplaced
            }
            ServerMessage::Error { reason } => {
                // Roll back the optimistic removal; the move was refused.
                self.pending = None;
                MirrorEvent::Rejected(reason)
            }
            ServerMessage::End { scores } => {
                self.scores = Some(scores);
                MirrorEvent::Ended
            }
        }
    }

    pub fn player_id(&self) -> Option<ParticipantId> {
        self.player_id
    }

    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    pub fn view(&self) -> &GameView {
        &self.view
    }

    /// The mirrored hand minus any optimistically played card.
    pub fn visible_hand(&self) -> impl Iterator<Item = &Card> {
        self.view
            .hand
            .iter()
            .filter(move |card| Some(card.id) != self.pending)
    }

    /// Marks a card as optimistically played, hiding it from
    /// [`visible_hand`](Self::visible_hand) until the server answers.
    pub fn mark_pending(&mut self, card_id: CardId) {
        self.pending = Some(card_id);
    }

    /// Rebuilds a [`Board`] from the mirrored view for local move analysis.
    pub fn board(&self) -> Result<Board, Rejection> {
        self.view.to_board()
    }

    pub fn scores(&self) -> Option<&[ScoreEntry]> {
        self.scores.as_deref()
    }
}

/// A move the client wants to propose.
#[derive(Clone, Debug)]
pub struct PlayIntent {
    pub card_id: CardId,
    pub coord: Coord,
    pub orientation: u8,
}

/// Callbacks for a connected client. The transport and mirror bookkeeping
/// are handled by [`run`]; implementors only decide what to play.
pub trait Client {
    fn welcomed(&mut self, _player_id: ParticipantId, _color: &str) {}

    /// Called on every authoritative snapshot. Returning an intent submits
    /// a `PLAY`; the server may still reject it.
    fn state(&mut self, mirror: &Mirror) -> Option<PlayIntent>;

    /// Called when the server refused this client's last proposal.
    fn rejected(&mut self, _reason: &str, _mirror: &Mirror) -> Option<PlayIntent> {
        None
    }

    fn ended(&mut self, _scores: &[ScoreEntry]) {}
}

/// Connects to a room, joins it, and drives the client until the game ends
/// or the connection drops.
pub async fn run(client: &mut impl Client, url: &str) -> anyhow::Result<()> {
    let (mut socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .context("failed to connect")?;
    socket
        .send(Message::Text(serde_json::to_string(&ClientMessage::Join)?))
        .await?;

    let mut mirror = Mirror::new();
    while let Some(frame) = socket.next().await {
        match frame? {
            Message::Text(text) => {
                let msg: ServerMessage =
                    serde_json::from_str(&text).context("undecodable server message")?;
                let intent = match mirror.apply(msg) {
                    MirrorEvent::Welcomed => {
                        if let (Some(id), Some(color)) = (mirror.player_id(), mirror.color()) {
                            client.welcomed(id, color);
                        }
                        None
                    }
                    MirrorEvent::StateReplaced => client.state(&mirror),
                    MirrorEvent::Rejected(reason) => client.rejected(&reason, &mirror),
                    MirrorEvent::Ended => {
                        client.ended(mirror.scores().unwrap_or(&[]));
                        break;
                    }
                };
                if let Some(intent) = intent {
                    mirror.mark_pending(intent.card_id);
                    let msg =
                        ClientMessage::play(intent.card_id, intent.coord, intent.orientation);
                    socket
                        .send(Message::Text(serde_json::to_string(&msg)?))
                        .await?;
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tacta::{Edge, EdgeShape, PlacedCardView};

    use super::*;

    fn card(id: u32) -> Card {
        Card {
            id: CardId(id),
            color: String::from("ivory"),
            edges: [Edge {
                shape: EdgeShape::Straight,
            }; 4],
            dots: 2,
        }
    }

    fn state_message(hand: Vec<Card>) -> ServerMessage {
        let mut board = BTreeMap::new();
        board.insert(
            Coord::new(0, 0),
            PlacedCardView {
                card: card(99),
                orientation: 0,
                owner: ParticipantId(1),
            },
        );
        ServerMessage::State {
            game: GameView { board, hand },
        }
    }

    #[test]
    fn welcome_assigns_identity() {
        let mut mirror = Mirror::new();
        let event = mirror.apply(ServerMessage::Welcome {
            player_id: ParticipantId(3),
            color: String::from("green"),
        });
        assert!(matches!(event, MirrorEvent::Welcomed));
        assert_eq!(mirror.player_id(), Some(ParticipantId(3)));
        assert_eq!(mirror.color(), Some("green"));
    }

    #[test]
    fn state_replaces_the_mirror_wholesale() {
        let mut mirror = Mirror::new();
        mirror.apply(state_message(vec![card(1), card(2)]));
        assert_eq!(mirror.visible_hand().count(), 2);
        assert_eq!(mirror.board().unwrap().len(), 1);
        // A later snapshot fully supersedes the earlier one.
        mirror.apply(state_message(vec![card(3)]));
        let ids: Vec<CardId> = mirror.visible_hand().map(|c| c.id).collect();
        assert_eq!(ids, vec![CardId(3)]);
    }

    #[test]
    fn pending_card_is_hidden_until_reconciled() {
        let mut mirror = Mirror::new();
        mirror.apply(state_message(vec![card(1), card(2)]));
        mirror.mark_pending(CardId(1));
        let ids: Vec<CardId> = mirror.visible_hand().map(|c| c.id).collect();
        assert_eq!(ids, vec![CardId(2)]);

        // A rejection rolls the optimistic removal back.
        let event = mirror.apply(ServerMessage::Error {
            reason: String::from("It is not your turn"),
        });
        assert!(matches!(event, MirrorEvent::Rejected(_)));
        assert_eq!(mirror.visible_hand().count(), 2);

        // An accepted move arrives as a fresh snapshot instead.
        mirror.mark_pending(CardId(1));
        mirror.apply(state_message(vec![card(2)]));
        assert_eq!(mirror.visible_hand().count(), 1);
    }

    #[test]
    fn end_records_the_scores() {
        let mut mirror = Mirror::new();
        let event = mirror.apply(ServerMessage::End {
            scores: vec![ScoreEntry {
                color: String::from("red"),
                score: 4,
            }],
        });
        assert!(matches!(event, MirrorEvent::Ended));
        assert_eq!(mirror.scores().unwrap().len(), 1);
    }
}
