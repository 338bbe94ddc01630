use std::fmt;

use serde::{Deserialize, Serialize};

/// Every card type the server deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// A bird belonging to exactly one set.
    Member,
    /// A bird that may join one of several sets.
    Wild,
    /// Enhancer for the first slot of a complete set.
    EnhancePrimary,
    /// Enhancer for the second slot of a complete set.
    EnhanceSecondary,
    /// Plain energy, only useful in the store.
    Energy,
    /// Charge card.
    Charge,
    /// Take a member from another player's set.
    StealMember,
    /// Take a whole set from another player.
    StealSet,
    /// Swap members between boards.
    Swap,
    /// Charge every player.
    ChargeAll,
    /// Charge a single player.
    ChargeSingle,
    /// Cancel another action.
    Negate,
    /// Double the next charge.
    DoubleCharge,
    /// Draw extra cards.
    Draw,
}

impl CardKind {
    /// Wire name of the kind, also used as the display fallback.
    pub fn as_str(self) -> &'static str {
        match self {
            CardKind::Member => "member",
            CardKind::Wild => "wild",
            CardKind::EnhancePrimary => "enhance_primary",
            CardKind::EnhanceSecondary => "enhance_secondary",
            CardKind::Energy => "energy",
            CardKind::Charge => "charge",
            CardKind::StealMember => "steal_member",
            CardKind::StealSet => "steal_set",
            CardKind::Swap => "swap",
            CardKind::ChargeAll => "charge_all",
            CardKind::ChargeSingle => "charge_single",
            CardKind::Negate => "negate",
            CardKind::DoubleCharge => "double_charge",
            CardKind::Draw => "draw",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a card currently sits. Supplied by the container, never stored on the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// The local player's hand.
    Hand,
    /// Inside a set on a board, as member or enhancer.
    Set,
    /// In a board's energy store.
    Store,
}

/// A single card as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Server-assigned identifier, unique per deal.
    pub id: String,
    /// Card type.
    #[serde(rename = "type")]
    pub kind: CardKind,
    /// Display name; falls back to the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Set identifiers this card can belong to, in preference order.
    #[serde(default, alias = "colours")]
    pub sets: Vec<String>,
    /// Energy value.
    #[serde(default)]
    pub energy: u32,
    /// Charge thresholds of the set this card sits in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub charges: Vec<u32>,
    /// Charge ladder of a wild card's second set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_charges: Vec<u32>,
    /// Presentation hint, not gameplay relevant.
    #[serde(
        default,
        rename = "lightText",
        skip_serializing_if = "Option::is_none"
    )]
    pub light_text: Option<String>,
}

impl Card {
    /// Name shown to players.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.kind.as_str(),
        }
    }

    /// Compact reference used in history lines and menus, e.g. `robin_0 [3]`.
    pub fn compact_label(&self) -> String {
        format!("{} [{}]", self.display_name(), self.energy)
    }

    /// Wild cards eligible for more than two sets.
    pub fn is_superwild(&self) -> bool {
        self.kind == CardKind::Wild && self.sets.len() > 2
    }
}
