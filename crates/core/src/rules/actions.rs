use crate::models::{Board, Card, CardSet, Location};
use crate::sync::Intent;

use super::eligibility::{
    is_discardable, is_flippable, is_givable, is_placeable, is_placeable_in_new_set,
    is_playable, is_set_givable, is_storable,
};
use super::matching::{display_order, find_matching_sets, SetOrdering};

/// Position of a card as seen by the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardContext {
    /// Container holding the card.
    pub location: Location,
    /// Members of the card's current set; zero outside sets.
    pub num_members: usize,
    /// Whether the local hand is over the limit.
    pub hand_overfull: bool,
}

impl CardContext {
    /// Context for a card in an over- or under-full hand.
    pub fn hand(hand_overfull: bool) -> Self {
        Self {
            location: Location::Hand,
            num_members: 0,
            hand_overfull,
        }
    }
}

/// An action the UI may offer for a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
    /// Play for effect.
    Play,
    /// Put into the store as energy.
    Store,
    /// Start a new set.
    PlaceNew,
    /// Join an existing set on the local board.
    PlaceInto {
        /// Target set.
        set_id: String,
        /// Menu label for the target.
        label: String,
    },
    /// Flip a lone wild to its other set.
    Flip,
    /// Give the card to another player.
    GiveCard,
    /// Give the card's whole set to another player.
    GiveSet,
    /// Discard from an overfull hand.
    Discard,
}

impl CardAction {
    /// Menu label.
    pub fn label(&self) -> String {
        match self {
            CardAction::Play => "Play".to_string(),
            CardAction::Store => "Store".to_string(),
            CardAction::PlaceNew => "Place in new set".to_string(),
            CardAction::PlaceInto { label, .. } => format!("Place in {label}"),
            CardAction::Flip => "Flip".to_string(),
            CardAction::GiveCard => "Give card".to_string(),
            CardAction::GiveSet => "Give set".to_string(),
            CardAction::Discard => "Discard".to_string(),
        }
    }

    /// Whether the action needs a recipient before it can be sent.
    pub fn needs_recipient(&self) -> bool {
        matches!(self, CardAction::GiveCard | CardAction::GiveSet)
    }

    /// Outbound intent for this action on `card_id`. Give actions return
    /// `None` until a recipient is supplied.
    pub fn to_intent(&self, card_id: &str, recipient: Option<usize>) -> Option<Intent> {
        let card_id = card_id.to_string();
        let intent = match self {
            CardAction::Play => Intent::Play { card_id },
            CardAction::Store => Intent::Store { card_id },
            CardAction::PlaceNew => Intent::Place {
                card_id,
                set_id: None,
            },
            CardAction::PlaceInto { set_id, .. } => Intent::Place {
                card_id,
                set_id: Some(set_id.clone()),
            },
            CardAction::Flip => Intent::Flip { card_id },
            CardAction::GiveCard => Intent::GiveCard {
                card_id,
                to: recipient?,
            },
            CardAction::GiveSet => Intent::GiveSet {
                card_id,
                to: recipient?,
            },
            CardAction::Discard => Intent::Discard { card_id },
        };
        Some(intent)
    }
}

/// Every action currently legal for `card`, in menu order.
///
/// Hand cards can be played, stored, placed or discarded; board cards can be
/// re-placed, flipped or given away.
pub fn available_actions(
    card: &Card,
    context: CardContext,
    own_board: Option<&Board>,
) -> Vec<CardAction> {
    let mut actions = Vec::new();
    let in_hand = context.location == Location::Hand;

    if in_hand && is_playable(card.kind) {
        actions.push(CardAction::Play);
    }
    if context.location != Location::Store && is_placeable(card.kind) {
        for set in find_matching_sets(card, own_board) {
            actions.push(CardAction::PlaceInto {
                set_id: set.id.clone(),
                label: set_label(set),
            });
        }
        if is_placeable_in_new_set(card.kind, context.num_members) {
            actions.push(CardAction::PlaceNew);
        }
    }
    if in_hand && is_storable(card.kind) {
        actions.push(CardAction::Store);
    }
    if context.location == Location::Set
        && is_flippable(card.kind, context.num_members, &card.sets)
    {
        actions.push(CardAction::Flip);
    }
    if is_givable(context.location) {
        actions.push(CardAction::GiveCard);
    }
    if context.location == Location::Set && is_set_givable(context.location) {
        actions.push(CardAction::GiveSet);
    }
    if is_discardable(context.location, context.hand_overfull) {
        actions.push(CardAction::Discard);
    }
    actions
}

fn set_label(set: &CardSet) -> String {
    format!("{} ({})", set.group_key(), set.members.len())
}

/// Hand cards with their rule context.
pub fn hand_cards(hand: &[Card]) -> Vec<(&Card, CardContext)> {
    let context = CardContext::hand(super::is_hand_overfull(hand.len()));
    hand.iter().map(|card| (card, context)).collect()
}

/// Board cards in display order (set members, then enhancers, then the store)
/// with their rule context.
pub fn board_cards(board: &Board, ordering: SetOrdering) -> Vec<(&Card, CardContext)> {
    let mut cards = Vec::new();
    for set in display_order(&board.sets, ordering) {
        let context = CardContext {
            location: Location::Set,
            num_members: set.members.len(),
            hand_overfull: false,
        };
        cards.extend(
            set.members
                .iter()
                .chain(set.enhancers.iter())
                .map(|card| (card, context)),
        );
    }
    let store = CardContext {
        location: Location::Store,
        num_members: 0,
        hand_overfull: false,
    };
    cards.extend(board.store.iter().map(|card| (card, store)));
    cards
}
