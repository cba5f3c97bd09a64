use crate::{
    Board, Card, Coord, MatchRule, Orientation, ParticipantId, PlayProposal, Rejection, Session,
    ORIGIN,
};

/// Decides whether a proposed placement is legal given the current session
/// state. Never mutates anything; the caller commits on success.
///
/// Checks short-circuit in a fixed order: turn, possession, orientation,
/// placement site, edge matching. Returns the validated orientation so the
/// caller does not re-derive it from the untrusted raw value.
pub fn validate(
    session: &Session,
    participant_id: ParticipantId,
    proposal: &PlayProposal,
) -> Result<Orientation, Rejection> {
    let mover = session
        .current_participant()
        .ok_or(Rejection::GameNotActive)?;
    if mover.id != participant_id {
        return Err(Rejection::NotYourTurn);
    }

    let card = mover
        .hand
        .iter()
        .find(|card| card.id == proposal.card_id)
        .ok_or(Rejection::CardNotInHand)?;

    let orientation = Orientation::new(proposal.orientation)?;

    placement_fits(
        session.board(),
        card,
        proposal.coord,
        orientation,
        session.match_rule(),
    )?;

    Ok(orientation)
}

/// The placement-site and edge-matching checks, independent of whose turn it
/// is or whose hand the card is in.
///
/// On an empty board only the reserved origin is legal. Otherwise the target
/// must be empty, adjacent to at least one placement, and every rotated edge
/// facing an occupied neighbor must satisfy the match rule against that
/// neighbor's facing edge.
pub fn placement_fits(
    board: &Board,
    card: &Card,
    coord: Coord,
    orientation: Orientation,
    rule: &dyn MatchRule,
) -> Result<(), Rejection> {
    if board.is_empty() {
        return if coord == ORIGIN {
            Ok(())
        } else {
            Err(Rejection::MustStartAtOrigin)
        };
    }

    if board.get(coord).is_some() {
        return Err(Rejection::CellOccupied);
    }

    let neighbors = board.neighbors(coord);
    if neighbors.iter().all(|(_, occupant)| occupant.is_none()) {
        return Err(Rejection::NotAdjacent);
    }

    for (side, (_, occupant)) in crate::Side::ALL.into_iter().zip(neighbors) {
        if let Some(neighbor) = occupant {
            let ours = card.edge_toward(orientation, side);
            let theirs = neighbor
                .card
                .edge_toward(neighbor.orientation, side.opposite());
            if !rule.edges_match(ours, theirs) {
                return Err(Rejection::EdgeMismatch { side });
            }
        }
    }
    Ok(())
}

/// All legal (coordinate, orientation) pairs for a card, in deterministic
/// order.
pub fn legal_placements(
    board: &Board,
    card: &Card,
    rule: &dyn MatchRule,
) -> Vec<(Coord, Orientation)> {
    let candidates = if board.is_empty() {
        vec![ORIGIN]
    } else {
        board.open_cells()
    };
    let mut placements = Vec::new();
    for coord in candidates {
        for orientation in Orientation::ALL {
            if placement_fits(board, card, coord, orientation, rule).is_ok() {
                placements.push((coord, orientation));
            }
        }
    }
    placements
}

/// Is there any coordinate and orientation at which this card could go?
pub fn can_place_anywhere(board: &Board, card: &Card, rule: &dyn MatchRule) -> bool {
    if board.is_empty() {
        return true;
    }
    board.open_cells().into_iter().any(|coord| {
        Orientation::ALL
            .into_iter()
            .any(|orientation| placement_fits(board, card, coord, orientation, rule).is_ok())
    })
}
