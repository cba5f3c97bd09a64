use std::collections::BTreeMap;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Card, CoordFromStrErr, Orientation, ParticipantId, Rejection, Side};

/// An integer grid coordinate.
///
/// The grid is unbounded in both axes; any fixed visual window is a client
/// rendering concern. Serializes as the string `"x,y"`, which is also the
/// board key form on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

/// The reserved starting reference point of every game.
pub const ORIGIN: Coord = Coord { x: 0, y: 0 };

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The adjacent coordinate on the given side.
    pub fn neighbor(self, side: Side) -> Coord {
        let (dx, dy) = side.offset();
        Coord {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for Coord {
    type Err = CoordFromStrErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s.split_once(',').ok_or(CoordFromStrErr::MissingComma)?;
        Ok(Coord {
            x: x.parse().map_err(|_| CoordFromStrErr::InvalidNumber)?,
            y: y.parse().map_err(|_| CoordFromStrErr::InvalidNumber)?,
        })
    }
}

impl Serialize for Coord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CoordVisitor;

        impl<'de> Visitor<'de> for CoordVisitor {
            type Value = Coord;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a coordinate string of the form \"x,y\"")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Coord, E> {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(CoordVisitor)
    }
}

/// A committed (card, orientation, owner) triple on the board.
///
/// Immutable once committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub card: Card,
    pub orientation: Orientation,
    pub owner: ParticipantId,
}

/// Sparse mapping from grid coordinates to placed cards.
///
/// At most one placement per coordinate; iteration order is deterministic.
#[derive(Clone, Debug, Default)]
pub struct Board {
    cells: BTreeMap<Coord, Placement>,
}

impl Board {
    pub fn new() -> Self {
        Board::default()
    }

    /// True only before the first placement.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, coord: Coord) -> Option<&Placement> {
        self.cells.get(&coord)
    }

    /// Commits a placement, failing with [`Rejection::CellOccupied`] if the
    /// coordinate already holds one. On error the board is unmodified.
    pub fn place(&mut self, coord: Coord, placement: Placement) -> Result<(), Rejection> {
        if self.cells.contains_key(&coord) {
            return Err(Rejection::CellOccupied);
        }
        self.cells.insert(coord, placement);
        Ok(())
    }

    /// The four adjacent coordinates and their occupants, in [`Side`] index
    /// order so callers can zip a card's rotated edges against neighbor
    /// edges positionally.
    pub fn neighbors(&self, coord: Coord) -> [(Coord, Option<&Placement>); 4] {
        Side::ALL.map(|side| {
            let neighbor = coord.neighbor(side);
            (neighbor, self.cells.get(&neighbor))
        })
    }

    /// All empty coordinates adjacent to at least one placement, sorted.
    ///
    /// Every legal non-first placement targets one of these.
    pub fn open_cells(&self) -> Vec<Coord> {
        let mut open: Vec<Coord> = Vec::new();
        for &coord in self.cells.keys() {
            for side in Side::ALL {
                let neighbor = coord.neighbor(side);
                if !self.cells.contains_key(&neighbor) {
                    open.push(neighbor);
                }
            }
        }
        open.sort();
        open.dedup();
        open
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Coord, &Placement)> {
        self.cells.iter()
    }
}
