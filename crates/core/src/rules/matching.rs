//! Placement targets and board ordering.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{Board, Card, CardKind, CardSet};

/// Sets on the local player's board that `card` could legally join, in board order.
pub fn find_matching_sets<'a>(card: &Card, own_board: Option<&'a Board>) -> Vec<&'a CardSet> {
    let Some(board) = own_board else {
        return Vec::new();
    };

    board
        .sets
        .iter()
        .filter(|set| match card.kind {
            CardKind::Member | CardKind::Wild => {
                card.sets.iter().any(|group| group == set.group_key()) && !set.contains(&card.id)
            }
            CardKind::EnhancePrimary => set.is_complete() && set.enhancers.is_empty(),
            CardKind::EnhanceSecondary => set.is_complete() && set.enhancers.len() == 1,
            _ => false,
        })
        .collect()
}

/// Ranking used for board display: fuller sets first, then the richer final charge.
pub fn compare_sets(a: &CardSet, b: &CardSet) -> Ordering {
    b.card_count()
        .cmp(&a.card_count())
        .then_with(|| b.last_charge().cmp(&a.last_charge()))
}

/// How sets are ordered on screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOrdering {
    /// Sorted with [`compare_sets`].
    #[default]
    Ranked,
    /// As received from the server.
    Server,
}

impl SetOrdering {
    /// The other ordering.
    pub fn toggled(self) -> Self {
        match self {
            SetOrdering::Ranked => SetOrdering::Server,
            SetOrdering::Server => SetOrdering::Ranked,
        }
    }

    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            SetOrdering::Ranked => "ranked",
            SetOrdering::Server => "server order",
        }
    }
}

/// Sets of a board in display order. Sorting is stable.
pub fn display_order(sets: &[CardSet], ordering: SetOrdering) -> Vec<&CardSet> {
    let mut ordered: Vec<&CardSet> = sets.iter().collect();
    if ordering == SetOrdering::Ranked {
        ordered.sort_by(|a, b| compare_sets(a, b));
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(id: &str, kind: CardKind, sets: &[&str]) -> Card {
        Card {
            id: id.to_string(),
            kind,
            name: None,
            sets: sets.iter().map(|s| s.to_string()).collect(),
            energy: 1,
            charges: Vec::new(),
            alt_charges: Vec::new(),
            light_text: None,
        }
    }

    fn set(id: &str, group: &str, members: usize, capacity: usize, enhancers: usize) -> CardSet {
        CardSet {
            id: id.to_string(),
            group: Some(group.to_string()),
            members: (0..members)
                .map(|n| card(&format!("{id}_m{n}"), CardKind::Member, &[group]))
                .collect(),
            charges: (1..=capacity as u32).collect(),
            enhancers: (0..enhancers)
                .map(|n| card(&format!("{id}_e{n}"), CardKind::EnhancePrimary, &[]))
                .collect(),
        }
    }

    fn board() -> Board {
        Board {
            sets: vec![
                set("red_a", "red", 2, 3, 0),
                set("green_a", "green", 3, 3, 0),
                set("red_b", "red", 1, 3, 0),
                set("blue_a", "blue", 2, 2, 1),
                set("yellow_a", "yellow", 2, 2, 2),
            ],
            store: Vec::new(),
        }
    }

    fn ids(sets: &[&CardSet]) -> Vec<String> {
        sets.iter().map(|set| set.id.clone()).collect()
    }

    #[test]
    fn members_match_their_groups_in_board_order() {
        let board = board();
        let wild = card("w0", CardKind::Wild, &["green", "red"]);
        assert_eq!(
            ids(&find_matching_sets(&wild, Some(&board))),
            vec!["red_a", "green_a", "red_b"]
        );
    }

    #[test]
    fn sets_without_group_key_match_on_id() {
        let board: Board = serde_json::from_value(serde_json::json!({
            "sets": [{
                "id": "red",
                "members": [{"id": "r0", "type": "member", "sets": ["red"]}],
                "charges": [1, 2, 3],
                "enhancers": []
            }]
        }))
        .expect("board without set keys");
        let member = card("r1", CardKind::Member, &["red"]);

        assert_eq!(ids(&find_matching_sets(&member, Some(&board))), vec!["red"]);
        assert!(find_matching_sets(&card("g1", CardKind::Member, &["green"]), Some(&board)).is_empty());
    }

    #[test]
    fn never_suggests_the_current_set() {
        let board = board();
        let placed = board.sets[0].members[0].clone();
        let first = find_matching_sets(&placed, Some(&board));
        let second = find_matching_sets(&placed, Some(&board));
        assert_eq!(ids(&first), vec!["red_b"]);
        assert_eq!(ids(&first), ids(&second));
        assert!(first.iter().all(|set| !set.contains(&placed.id)));
    }

    #[test]
    fn primary_enhancer_needs_complete_bare_set() {
        let board = board();
        let primary = card("ep", CardKind::EnhancePrimary, &[]);
        assert_eq!(ids(&find_matching_sets(&primary, Some(&board))), vec!["green_a"]);
        assert!(find_matching_sets(&primary, None).is_empty());
    }

    #[test]
    fn secondary_enhancer_needs_one_enhancer() {
        let board = board();
        let secondary = card("es", CardKind::EnhanceSecondary, &[]);
        assert_eq!(ids(&find_matching_sets(&secondary, Some(&board))), vec!["blue_a"]);
    }

    #[test]
    fn other_kinds_match_nothing() {
        let board = board();
        for kind in [CardKind::Energy, CardKind::Swap, CardKind::Charge] {
            assert!(find_matching_sets(&card("x", kind, &["red"]), Some(&board)).is_empty());
        }
    }

    #[test]
    fn ranking_prefers_fuller_then_richer_sets() {
        let mut sets = vec![
            set("small", "red", 1, 2, 0),
            set("big_cheap", "green", 3, 3, 0),
            set("big_rich", "blue", 3, 4, 0),
            set("enhanced", "yellow", 2, 2, 2),
        ];
        sets[1].charges = vec![1, 2, 3];
        sets[2].charges = vec![2, 4, 8, 9];

        assert_eq!(
            ids(&display_order(&sets, SetOrdering::Ranked)),
            vec!["enhanced", "big_rich", "big_cheap", "small"]
        );
        assert_eq!(
            ids(&display_order(&sets, SetOrdering::Server)),
            vec!["small", "big_cheap", "big_rich", "enhanced"]
        );
        assert_eq!(compare_sets(&sets[0], &sets[0]), Ordering::Equal);
    }
}
