use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{Card, CardId, Edge, EdgeShape};

/// Display colors cycled over the deck, distinct from the participant
/// palette.
const CARD_COLORS: [&str; 6] = ["ivory", "salmon", "skyblue", "palegreen", "plum", "khaki"];

/// Number of cards in the standard deck: every edge-shape pattern three
/// times over.
pub const DECK_SIZE: usize = 48;

/// The fixed card catalog, in id order.
///
/// Each of the sixteen possible edge-shape patterns appears three times with
/// varying dot counts, so every card can abut some other card under a
/// same-shape rule.
pub fn standard_deck() -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for id in 0..DECK_SIZE as u32 {
        let pattern = id % 16;
        let edges = [0u32, 1, 2, 3].map(|bit| Edge {
            shape: if pattern & (1u32 << bit) == 0 {
                EdgeShape::Straight
            } else {
                EdgeShape::Curve
            },
        });
        cards.push(Card {
            id: CardId(id),
            color: String::from(CARD_COLORS[id as usize % CARD_COLORS.len()]),
            edges,
            dots: (id % 6) as u8 + 1,
        });
    }
    cards
}

/// A shuffled copy of the standard deck.
pub fn shuffled_deck(rng: &mut StdRng) -> Vec<Card> {
    let mut cards = standard_deck();
    cards.shuffle(rng);
    cards
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn deck_ids_are_unique() {
        let deck = standard_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let mut ids: Vec<CardId> = deck.iter().map(|card| card.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DECK_SIZE);
    }

    #[test]
    fn shuffle_permutes_but_preserves_cards() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut shuffled = shuffled_deck(&mut rng);
        shuffled.sort_by_key(|card| card.id);
        assert_eq!(shuffled, standard_deck());
    }

    #[test]
    fn dots_are_between_one_and_six() {
        assert!(standard_deck()
            .iter()
            .all(|card| (1..=6).contains(&card.dots)));
    }
}
