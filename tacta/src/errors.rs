use crate::Side;

/// Why a request was turned away without touching session state.
///
/// Every variant is reported to the submitting participant only; a rejected
/// request has zero observable effect on the board, hands, or turn order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    NotYourTurn,
    CardNotInHand,
    CellOccupied,
    NotAdjacent,
    MustStartAtOrigin,
    EdgeMismatch { side: Side },
    GameNotActive,
    RoomFull,
    AlreadyStarted,
    InvalidOrientation { orientation: u8 },
}

impl std::error::Error for Rejection {}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::NotYourTurn => write!(f, "It is not your turn"),
            Rejection::CardNotInHand => write!(f, "That card is not in your hand"),
            Rejection::CellOccupied => write!(f, "That cell is already occupied"),
            Rejection::NotAdjacent => {
                write!(f, "A card must be placed adjacent to one on the board")
            }
            Rejection::MustStartAtOrigin => {
                write!(f, "The first card must be placed at the origin")
            }
            Rejection::EdgeMismatch { side } => {
                write!(f, "The {} edge does not match its neighbor", side)
            }
            Rejection::GameNotActive => write!(f, "The game is not active"),
            Rejection::RoomFull => write!(f, "The room is full"),
            Rejection::AlreadyStarted => write!(f, "The game has already started"),
            Rejection::InvalidOrientation { orientation } => {
                write!(f, "{} is not a valid orientation", orientation)
            }
        }
    }
}

/// The error type for the [`FromStr`](std::str::FromStr) instance of
/// [`Coord`](crate::Coord).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordFromStrErr {
    MissingComma,
    InvalidNumber,
}

impl std::error::Error for CoordFromStrErr {}

impl std::fmt::Display for CoordFromStrErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordFromStrErr::MissingComma => {
                write!(f, "Coordinate keys must have the form \"x,y\"")
            }
            CoordFromStrErr::InvalidNumber => {
                write!(f, "Coordinate components must be integers")
            }
        }
    }
}
