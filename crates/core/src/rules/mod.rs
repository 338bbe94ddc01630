//! Action eligibility and placement matching.
//!
//! Everything here is a pure function of the current model, so the results
//! are recomputed on demand rather than stored.

mod actions;
pub mod eligibility;
pub mod matching;

pub use actions::{available_actions, board_cards, hand_cards, CardAction, CardContext};
pub use eligibility::{
    is_discardable, is_enhancer, is_flippable, is_givable, is_hand_overfull, is_member,
    is_placeable, is_placeable_in_new_set, is_playable, is_set_givable, is_storable, HAND_LIMIT,
};
pub use matching::{compare_sets, display_order, find_matching_sets, SetOrdering};
