use serde::{Deserialize, Serialize};

use crate::Rejection;

/// A card in the shared deck.
///
/// Cards are immutable once defined. The `color` is display-only; matching
/// happens on the edge shapes, scoring on the dot count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: String,
    /// One edge per side, in [`Side`] index order (north, east, south, west)
    /// for the unrotated card.
    pub edges: [Edge; 4],
    pub dots: u8,
}

/// Identity of a [card](Card), unique within a deck.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

/// A single edge descriptor, carrying its shape tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub shape: EdgeShape,
}

/// The shape tag of an [edge](Edge).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeShape {
    Straight,
    Curve,
}

/// One of the four sides of a card or grid cell, in the fixed order that
/// matches the card edge index order.
///
/// `y` grows southward, so `North` is `(0, -1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The coordinate offset of the adjacent cell on this side.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Side::North => (0, -1),
            Side::East => (1, 0),
            Side::South => (0, 1),
            Side::West => (-1, 0),
        }
    }

    /// The side a neighbor on this side presents back to us.
    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Side::North => "north",
            Side::East => "east",
            Side::South => "south",
            Side::West => "west",
        };
        write!(f, "{}", name)
    }
}

/// A rotation applied to a card's edge sequence, in clockwise quarter turns.
///
/// Only the values 0 through 3 are valid; construction from anything else
/// fails with [`Rejection::InvalidOrientation`]. Orientations are closed
/// under [composition](Orientation::compose) modulo 4.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Orientation(u8);

impl Orientation {
    pub const COUNT: u8 = 4;
    pub const ALL: [Orientation; 4] = [
        Orientation(0),
        Orientation(1),
        Orientation(2),
        Orientation(3),
    ];

    pub fn new(raw: u8) -> Result<Self, Rejection> {
        if raw < Self::COUNT {
            Ok(Orientation(raw))
        } else {
            Err(Rejection::InvalidOrientation { orientation: raw })
        }
    }

    pub fn as_u8(self) -> u8 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }

    pub fn compose(self, other: Orientation) -> Orientation {
        Orientation((self.0 + other.0) % Self::COUNT)
    }
}

impl Card {
    /// The edge shape facing `side` once the card is rotated by `orientation`.
    ///
    /// Rotating clockwise by one quarter turn makes the edge that faced north
    /// face east, so the edge facing side `s` is the unrotated edge at index
    /// `(s - orientation) mod 4`. Pure function, no side effects.
    pub fn edge_toward(&self, orientation: Orientation, side: Side) -> EdgeShape {
        self.edges[(side.index() + 4 - orientation.index()) % 4].shape
    }

    /// The full rotated edge sequence, in [`Side`] index order.
    pub fn rotated_edges(&self, orientation: Orientation) -> [EdgeShape; 4] {
        Side::ALL.map(|side| self.edge_toward(orientation, side))
    }
}
