//! Card-level legality predicates.
//!
//! These mirror the server's rules closely enough to decide which actions the
//! UI offers. They are cheap and stateless; callers evaluate them against the
//! current model every time instead of caching results.

use crate::models::{CardKind, Location};

/// Cards a hand may hold at the end of a turn.
pub const HAND_LIMIT: usize = 7;

/// Superwilds are eligible for more than this many sets.
const MAX_FLIPPABLE_SETS: usize = 2;

/// Anything except a bird can go into the store as energy.
pub fn is_storable(kind: CardKind) -> bool {
    !is_member(kind)
}

/// Birds: plain members and wilds.
pub fn is_member(kind: CardKind) -> bool {
    matches!(kind, CardKind::Member | CardKind::Wild)
}

/// Primary or secondary enhancers.
pub fn is_enhancer(kind: CardKind) -> bool {
    matches!(kind, CardKind::EnhancePrimary | CardKind::EnhanceSecondary)
}

/// Cards that go into sets.
pub fn is_placeable(kind: CardKind) -> bool {
    is_member(kind) || is_enhancer(kind)
}

/// A bird may start a new set unless it already is the only member of one.
pub fn is_placeable_in_new_set(kind: CardKind, num_members: usize) -> bool {
    is_member(kind) && num_members != 1
}

/// Action cards played for their effect.
pub fn is_playable(kind: CardKind) -> bool {
    kind != CardKind::Energy && !is_placeable(kind)
}

/// A wild alone in its set can flip to its other set, unless it is a superwild.
pub fn is_flippable(kind: CardKind, num_members: usize, sets: &[String]) -> bool {
    kind == CardKind::Wild && num_members == 1 && sets.len() <= MAX_FLIPPABLE_SETS
}

/// Only hand cards can be discarded, and only while the hand is over the limit.
pub fn is_discardable(location: Location, hand_overfull: bool) -> bool {
    location == Location::Hand && hand_overfull
}

/// Cards already on a board may be given away.
pub fn is_givable(location: Location) -> bool {
    location != Location::Hand
}

/// Sets are given through any card on the board.
pub fn is_set_givable(location: Location) -> bool {
    location != Location::Hand
}

/// Hand size exceeds [`HAND_LIMIT`].
pub fn is_hand_overfull(hand_len: usize) -> bool {
    hand_len > HAND_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_KINDS: [CardKind; 14] = [
        CardKind::Member,
        CardKind::Wild,
        CardKind::EnhancePrimary,
        CardKind::EnhanceSecondary,
        CardKind::Energy,
        CardKind::Charge,
        CardKind::StealMember,
        CardKind::StealSet,
        CardKind::Swap,
        CardKind::ChargeAll,
        CardKind::ChargeSingle,
        CardKind::Negate,
        CardKind::DoubleCharge,
        CardKind::Draw,
    ];

    fn sets(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn birds_are_placed_not_stored() {
        for kind in [CardKind::Member, CardKind::Wild] {
            assert!(!is_storable(kind));
            assert!(is_placeable(kind));
            assert!(!is_playable(kind));
        }
    }

    #[test]
    fn energy_is_stored_not_played() {
        assert!(is_storable(CardKind::Energy));
        assert!(!is_playable(CardKind::Energy));
        assert!(!is_placeable(CardKind::Energy));
    }

    #[test]
    fn placeable_cards_are_never_playable() {
        for kind in ALL_KINDS {
            if is_placeable(kind) {
                assert!(!is_playable(kind), "{kind} is both placeable and playable");
            }
        }
        assert!(is_playable(CardKind::StealSet));
        assert!(is_playable(CardKind::Draw));
        assert!(!is_playable(CardKind::EnhancePrimary));
    }

    #[test]
    fn singleton_cannot_start_new_set() {
        assert!(is_placeable_in_new_set(CardKind::Member, 0));
        assert!(!is_placeable_in_new_set(CardKind::Member, 1));
        assert!(is_placeable_in_new_set(CardKind::Wild, 3));
        assert!(!is_placeable_in_new_set(CardKind::EnhancePrimary, 0));
    }

    #[test]
    fn superwild_never_flips() {
        assert!(is_flippable(CardKind::Wild, 1, &sets(&["red", "green"])));
        assert!(!is_flippable(CardKind::Wild, 1, &sets(&["red", "green", "blue"])));
        assert!(!is_flippable(CardKind::Wild, 2, &sets(&["red", "green"])));
        assert!(!is_flippable(CardKind::Member, 1, &sets(&["red"])));
    }

    #[test]
    fn discard_only_from_overfull_hand() {
        assert!(is_hand_overfull(8));
        assert!(!is_hand_overfull(7));
        assert!(is_discardable(Location::Hand, is_hand_overfull(8)));
        assert!(!is_discardable(Location::Hand, is_hand_overfull(7)));
        assert!(!is_discardable(Location::Set, true));
    }

    #[test]
    fn board_cards_are_givable() {
        assert!(!is_givable(Location::Hand));
        assert!(is_givable(Location::Set));
        assert!(is_givable(Location::Store));
        assert!(!is_set_givable(Location::Hand));
        assert!(is_set_givable(Location::Set));
    }
}
