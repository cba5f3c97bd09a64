use quickcheck::{Arbitrary, Gen};

use crate::{Board, Card, CardId, Coord, Edge, EdgeShape, Orientation, ParticipantId, Placement};

impl Arbitrary for EdgeShape {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&[EdgeShape::Straight, EdgeShape::Curve]).unwrap()
    }
}

impl Arbitrary for Edge {
    fn arbitrary(g: &mut Gen) -> Self {
        Edge {
            shape: EdgeShape::arbitrary(g),
        }
    }
}

impl Arbitrary for Card {
    fn arbitrary(g: &mut Gen) -> Self {
        Card {
            id: CardId(u32::arbitrary(g)),
            color: g
                .choose(&["ivory", "salmon", "skyblue", "palegreen"])
                .unwrap()
                .to_string(),
            edges: [
                Edge::arbitrary(g),
                Edge::arbitrary(g),
                Edge::arbitrary(g),
                Edge::arbitrary(g),
            ],
            dots: u8::arbitrary(g) % 6 + 1,
        }
    }
}

impl Arbitrary for Orientation {
    fn arbitrary(g: &mut Gen) -> Self {
        *g.choose(&Orientation::ALL).unwrap()
    }
}

impl Arbitrary for Coord {
    fn arbitrary(g: &mut Gen) -> Self {
        // Small coordinates, so that boards actually collide and abut.
        Coord {
            x: (u8::arbitrary(g) % 7) as i32 - 3,
            y: (u8::arbitrary(g) % 7) as i32 - 3,
        }
    }
}

/// A populated board plus a coordinate that is guaranteed to be free.
#[derive(Clone, Debug)]
pub struct BoardInput {
    pub board: Board,
    pub free_coord: Coord,
}

impl Arbitrary for BoardInput {
    fn arbitrary(g: &mut Gen) -> Self {
        let free_coord = Coord::arbitrary(g);
        let mut board = Board::new();
        for _ in 0..(u8::arbitrary(g) % 8) {
            let coord = Coord::arbitrary(g);
            if coord == free_coord {
                continue;
            }
            let placement = Placement {
                card: Card::arbitrary(g),
                orientation: Orientation::arbitrary(g),
                owner: ParticipantId(u32::arbitrary(g) % 4),
            };
            // Duplicate coordinates are simply skipped.
            let _ = board.place(coord, placement);
        }
        BoardInput { board, free_coord }
    }
}
