use serde::{Deserialize, Serialize};

use super::card::Card;

/// A themed group of member cards placed on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSet {
    /// Server identifier used as the placement target.
    pub id: String,
    /// Set identifier matched against a card's `sets` list. Servers that
    /// omit it use `id` for the same purpose, see [`CardSet::group_key`].
    #[serde(default, rename = "set", skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Birds forming the set, in placement order.
    #[serde(default)]
    pub members: Vec<Card>,
    /// Charge thresholds; the length is the set's capacity.
    #[serde(default)]
    pub charges: Vec<u32>,
    /// Attached enhancers (primary first).
    #[serde(default)]
    pub enhancers: Vec<Card>,
}

impl CardSet {
    /// Identifier compared with a card's `sets`: the `set` key, else `id`.
    pub fn group_key(&self) -> &str {
        self.group
            .as_deref()
            .filter(|group| !group.is_empty())
            .unwrap_or(&self.id)
    }

    /// A set is complete once every charge slot holds a member.
    pub fn is_complete(&self) -> bool {
        self.members.len() == self.charges.len()
    }

    /// Whether the card is already a member or enhancer of this set.
    pub fn contains(&self, card_id: &str) -> bool {
        self.members
            .iter()
            .chain(self.enhancers.iter())
            .any(|card| card.id == card_id)
    }

    /// Members plus enhancers.
    pub fn card_count(&self) -> usize {
        self.members.len() + self.enhancers.len()
    }

    /// Highest charge tier of the set, zero when the ladder is empty.
    pub fn last_charge(&self) -> u32 {
        self.charges.last().copied().unwrap_or(0)
    }

    /// Index of the charge tier reached by the current members.
    pub fn active_charge_index(&self) -> Option<usize> {
        self.members
            .len()
            .checked_sub(1)
            .filter(|index| *index < self.charges.len())
    }
}

/// One player's public board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Placed sets in server order.
    #[serde(default)]
    pub sets: Vec<CardSet>,
    /// Stored energy cards.
    #[serde(default)]
    pub store: Vec<Card>,
}

impl Board {
    /// Set holding the given card as member or enhancer.
    pub fn set_containing(&self, card_id: &str) -> Option<&CardSet> {
        self.sets.iter().find(|set| set.contains(card_id))
    }

    /// Set with the given identifier.
    pub fn set(&self, set_id: &str) -> Option<&CardSet> {
        self.sets.iter().find(|set| set.id == set_id)
    }

    /// Sum of energy in the store.
    pub fn stored_energy(&self) -> u32 {
        self.store.iter().map(|card| card.energy).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn group_key_prefers_set_then_id() {
        let keyed: CardSet =
            serde_json::from_value(json!({"id": "s_3", "set": "red", "charges": [1, 2]}))
                .expect("set with group");
        assert_eq!(keyed.group_key(), "red");

        let bare: CardSet = serde_json::from_value(json!({"id": "green", "charges": [1]}))
            .expect("set without group");
        assert_eq!(bare.group, None);
        assert_eq!(bare.group_key(), "green");

        let blank: CardSet = serde_json::from_value(json!({"id": "blue", "set": ""}))
            .expect("set with blank group");
        assert_eq!(blank.group_key(), "blue");
    }
}
