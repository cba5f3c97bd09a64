use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Board, Card, CardId, Coord, Orientation, ParticipantId, Placement, Rejection, ScoreEntry,
    Session,
};

/// A message from a participant to the room authority.
///
/// JSON envelope with a `type` discriminator; unknown tags fail to decode
/// and are treated as a protocol error by the transport layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Request to join the addressed room.
    #[serde(rename = "JOIN")]
    Join,
    /// A move attempt. Coordinates and orientation are proposals; the
    /// authority validates them independently.
    #[serde(rename = "PLAY")]
    Play {
        #[serde(rename = "cardId")]
        card_id: CardId,
        x: i32,
        y: i32,
        orientation: u8,
    },
}

impl ClientMessage {
    pub fn play(card_id: CardId, coord: Coord, orientation: u8) -> Self {
        ClientMessage::Play {
            card_id,
            x: coord.x,
            y: coord.y,
            orientation,
        }
    }
}

/// A message from the room authority to one participant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Join accepted; assigns the participant's identity.
    #[serde(rename = "WELCOME")]
    Welcome {
        #[serde(rename = "playerId")]
        player_id: ParticipantId,
        color: String,
    },
    /// Authoritative snapshot for this recipient.
    #[serde(rename = "STATE")]
    State { game: GameView },
    /// Rejection of the most recent request from this participant only.
    #[serde(rename = "ERROR")]
    Error { reason: String },
    /// Terminal result; the room accepts no further moves.
    #[serde(rename = "END")]
    End { scores: Vec<ScoreEntry> },
}

/// The per-recipient snapshot carried by a `STATE` message. Board keys
/// serialize as `"x,y"` strings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameView {
    pub board: BTreeMap<Coord, PlacedCardView>,
    pub hand: Vec<Card>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacedCardView {
    pub card: Card,
    pub orientation: u8,
    pub owner: ParticipantId,
}

/// Builds the snapshot for one recipient: the shared board plus that
/// participant's private hand.
pub fn game_view(session: &Session, recipient: ParticipantId) -> GameView {
    let board = session
        .board()
        .iter()
        .map(|(&coord, placement)| {
            (
                coord,
                PlacedCardView {
                    card: placement.card.clone(),
                    orientation: placement.orientation.as_u8(),
                    owner: placement.owner,
                },
            )
        })
        .collect();
    let hand = session
        .participant(recipient)
        .map(|p| p.hand.clone())
        .unwrap_or_default();
    GameView { board, hand }
}

impl GameView {
    /// Reconstructs a [`Board`] from the snapshot, for local move analysis.
    pub fn to_board(&self) -> Result<Board, Rejection> {
        let mut board = Board::new();
        for (&coord, view) in &self.board {
            board.place(
                coord,
                Placement {
                    card: view.card.clone(),
                    orientation: Orientation::new(view.orientation)?,
                    owner: view.owner,
                },
            )?;
        }
        Ok(board)
    }
}
