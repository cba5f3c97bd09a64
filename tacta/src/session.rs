use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{
    deck, validate, Board, Card, CardId, Coord, DisconnectPolicy, MatchRule, PlacedDots, Placement,
    Rejection, SameShape, ScoreEntry, ScorePolicy,
};

/// Colors assigned to participants in join order, unique within a room.
pub const PARTICIPANT_COLORS: [&str; 6] = ["red", "blue", "green", "yellow", "purple", "orange"];

/// Session-scoped participant identity. Assigned by the authority, never
/// client-chosen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

#[derive(Clone, Debug)]
pub struct Participant {
    pub id: ParticipantId,
    pub color: String,
    pub hand: Vec<Card>,
    pub connected: bool,
    forfeited: bool,
}

impl Participant {
    /// Whether this participant still takes turns.
    pub fn in_rotation(&self) -> bool {
        self.connected && !self.forfeited
    }
}

/// Lifecycle phase of a session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Active,
    Ended,
}

pub struct SessionConfig {
    pub capacity: usize,
    pub hand_size: usize,
    /// Extension point: when set, the mover draws one card from the pile
    /// after each accepted placement.
    pub draw_on_play: bool,
    pub disconnect_policy: DisconnectPolicy,
    pub match_rule: Box<dyn MatchRule>,
    pub score_policy: Box<dyn ScorePolicy>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capacity: 4,
            hand_size: 5,
            draw_on_play: false,
            disconnect_policy: DisconnectPolicy::default(),
            match_rule: Box::new(SameShape),
            score_policy: Box::new(PlacedDots),
        }
    }
}

/// A move attempt, exactly as the client proposed it. The orientation is
/// untrusted and re-derived during validation.
#[derive(Clone, Debug)]
pub struct PlayProposal {
    pub card_id: CardId,
    pub coord: Coord,
    pub orientation: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The placement was committed and the turn advanced.
    Placed,
    /// The placement was committed and it ended the game; scores are final.
    Ended,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// Lobby: the participant was removed and their color freed.
    Left,
    /// Active: the participant stays out of rotation, game continues.
    Dropped,
    /// Active: losing the participant ended the game; scores are final.
    Ended,
    /// The id is unknown or the game was already over.
    Ignored,
}

/// Authoritative per-room state: roster, hands, turn order, board, phase.
///
/// Exclusively owned and mutated by the room authority; participants only
/// ever see read-only views of it. A rejected operation has no observable
/// effect.
pub struct Session {
    config: SessionConfig,
    participants: Vec<Participant>,
    current_turn: usize,
    board: Board,
    draw_pile: Vec<Card>,
    phase: Phase,
    scores: Vec<ScoreEntry>,
    next_id: u32,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            participants: Vec::new(),
            current_turn: 0,
            board: Board::new(),
            draw_pile: Vec::new(),
            phase: Phase::Lobby,
            scores: Vec::new(),
            next_id: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// The participant whose turn it is, if the game is running.
    pub fn current_participant(&self) -> Option<&Participant> {
        if self.phase != Phase::Active {
            return None;
        }
        self.participants.get(self.current_turn)
    }

    pub fn current_turn_index(&self) -> usize {
        self.current_turn
    }

    pub fn match_rule(&self) -> &dyn MatchRule {
        &*self.config.match_rule
    }

    /// Terminal scores; empty until the session ends.
    pub fn scores(&self) -> &[ScoreEntry] {
        &self.scores
    }

    pub fn draw_pile_len(&self) -> usize {
        self.draw_pile.len()
    }

    /// Adds a participant, assigning an id and the first unused color.
    ///
    /// Fails with `RoomFull` past the configured capacity (or the color
    /// palette, whichever is smaller) and with `AlreadyStarted` once the
    /// session has left the lobby.
    pub fn join(&mut self) -> Result<(ParticipantId, String), Rejection> {
        if self.phase != Phase::Lobby {
            return Err(Rejection::AlreadyStarted);
        }
        if self.participants.len() >= self.config.capacity {
            return Err(Rejection::RoomFull);
        }
        let color = PARTICIPANT_COLORS
            .iter()
            .find(|color| !self.participants.iter().any(|p| p.color == **color))
            .ok_or(Rejection::RoomFull)?
            .to_string();
        let id = ParticipantId(self.next_id);
        self.next_id += 1;
        self.participants.push(Participant {
            id,
            color: color.clone(),
            hand: Vec::new(),
            connected: true,
            forfeited: false,
        });
        Ok((id, color))
    }

    /// Transitions `Lobby -> Active` exactly once, dealing every participant
    /// a hand from a freshly shuffled deck. The remainder becomes the draw
    /// pile. When the deck runs short, late participants get smaller hands.
    ///
    /// The start trigger itself is a policy of the surrounding system.
    pub fn start(&mut self, rng: &mut StdRng) -> Result<(), Rejection> {
        if self.phase != Phase::Lobby {
            return Err(Rejection::AlreadyStarted);
        }
        let mut deck = deck::shuffled_deck(rng);
        for participant in &mut self.participants {
            let cut = deck.len().saturating_sub(self.config.hand_size);
            participant.hand = deck.split_off(cut);
        }
        self.draw_pile = deck;
        self.current_turn = 0;
        self.phase = Phase::Active;
        Ok(())
    }

    /// Validates and, on success, commits a move: the placement lands on the
    /// board, the card leaves the mover's hand, the turn advances, and the
    /// end condition is checked.
    ///
    /// Any rejection leaves board, hands and turn index untouched.
    pub fn play(
        &mut self,
        participant_id: ParticipantId,
        proposal: &PlayProposal,
    ) -> Result<PlayOutcome, Rejection> {
        if self.phase != Phase::Active {
            return Err(Rejection::GameNotActive);
        }
        let orientation = validate(self, participant_id, proposal)?;

        // Committing: place first, then remove from the hand, so that no
        // failure path can leave the session half-mutated.
        let mover = self.current_turn;
        let card_pos = self.participants[mover]
            .hand
            .iter()
            .position(|card| card.id == proposal.card_id)
            .ok_or(Rejection::CardNotInHand)?;
        let card = self.participants[mover].hand[card_pos].clone();
        self.board.place(
            proposal.coord,
            Placement {
                card,
                orientation,
                owner: participant_id,
            },
        )?;
        self.participants[mover].hand.remove(card_pos);

        if self.config.draw_on_play {
            if let Some(card) = self.draw_pile.pop() {
                self.participants[mover].hand.push(card);
            }
        }

        self.advance_turn();

        if self.end_condition_met() {
            self.finish();
            Ok(PlayOutcome::Ended)
        } else {
            Ok(PlayOutcome::Placed)
        }
    }

    /// Handles a dropped connection in any phase.
    ///
    /// In the lobby the participant is removed outright and their color
    /// freed. During a game the configured [`DisconnectPolicy`] applies, the
    /// turn moves on if it was theirs, and the game ends if fewer than two
    /// participants remain in rotation.
    pub fn disconnect(&mut self, participant_id: ParticipantId) -> DisconnectOutcome {
        let Some(idx) = self
            .participants
            .iter()
            .position(|p| p.id == participant_id)
        else {
            return DisconnectOutcome::Ignored;
        };
        match self.phase {
            Phase::Lobby => {
                self.participants.remove(idx);
                DisconnectOutcome::Left
            }
            Phase::Active => {
                self.participants[idx].connected = false;
                if self.config.disconnect_policy == DisconnectPolicy::Forfeit {
                    self.participants[idx].forfeited = true;
                }
                if self.current_turn == idx {
                    self.advance_turn();
                }
                if self.end_condition_met() {
                    self.finish();
                    DisconnectOutcome::Ended
                } else {
                    DisconnectOutcome::Dropped
                }
            }
            Phase::Ended => {
                self.participants[idx].connected = false;
                DisconnectOutcome::Ignored
            }
        }
    }

    /// Moves `current_turn` to the next participant in rotation, wrapping
    /// around. A no-op when nobody is left in rotation.
    fn advance_turn(&mut self) {
        let n = self.participants.len();
        if n == 0 {
            return;
        }
        for step in 1..=n {
            let idx = (self.current_turn + step) % n;
            if self.participants[idx].in_rotation() {
                self.current_turn = idx;
                return;
            }
        }
    }

    fn end_condition_met(&self) -> bool {
        let in_rotation: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| p.in_rotation())
            .collect();
        if in_rotation.len() < 2 {
            return true;
        }
        if in_rotation.iter().all(|p| p.hand.is_empty()) {
            return true;
        }
        // Nobody in rotation holds a card that fits anywhere.
        in_rotation.iter().all(|p| {
            p.hand.iter().all(|card| {
                !crate::can_place_anywhere(&self.board, card, &*self.config.match_rule)
            })
        })
    }

    fn finish(&mut self) {
        self.phase = Phase::Ended;
        let scores = self.config.score_policy.score(&*self);
        self.scores = scores;
    }
}
