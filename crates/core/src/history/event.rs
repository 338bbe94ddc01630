use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::Card;

/// Raw log tuple `[player, action, ...args]` exactly as the server sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEvent(pub Vec<Value>);

/// Kinds of logged actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// The deck ran out and was reshuffled.
    Redeal,
    /// Cards drawn.
    Draw,
    /// Turn passed on.
    EndTurn,
    /// Action card played.
    Play,
    /// Card placed in a set.
    Place,
    /// Card stored as energy.
    Store,
    /// Card given to another player.
    GiveCard,
    /// Set given to another player.
    GiveSet,
    /// Card discarded.
    Discard,
}

impl ActionKind {
    /// Parse the wire name.
    pub fn parse(name: &str) -> Option<Self> {
        let kind = match name {
            "redeal" => ActionKind::Redeal,
            "draw" => ActionKind::Draw,
            "end_turn" => ActionKind::EndTurn,
            "play" => ActionKind::Play,
            "place" => ActionKind::Place,
            "store" => ActionKind::Store,
            "give_card" => ActionKind::GiveCard,
            "give_set" => ActionKind::GiveSet,
            "discard" => ActionKind::Discard,
            _ => return None,
        };
        Some(kind)
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Redeal => "redeal",
            ActionKind::Draw => "draw",
            ActionKind::EndTurn => "end_turn",
            ActionKind::Play => "play",
            ActionKind::Place => "place",
            ActionKind::Store => "store",
            ActionKind::GiveCard => "give_card",
            ActionKind::GiveSet => "give_set",
            ActionKind::Discard => "discard",
        }
    }

    /// Number of arguments after the action name, the acting player included.
    pub fn arity(self) -> usize {
        match self {
            ActionKind::Redeal => 1,
            ActionKind::Draw
            | ActionKind::EndTurn
            | ActionKind::Play
            | ActionKind::Place
            | ActionKind::Store
            | ActionKind::Discard => 2,
            ActionKind::GiveCard | ActionKind::GiveSet => 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-card actions sharing the `(player, card)` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardMove {
    /// Action card played.
    Play,
    /// Card placed in a set.
    Place,
    /// Card stored as energy.
    Store,
    /// Card discarded.
    Discard,
}

impl CardMove {
    /// Past-tense verb used in history lines.
    pub fn verb(self) -> &'static str {
        match self {
            CardMove::Play => "played",
            CardMove::Place => "placed",
            CardMove::Store => "stored",
            CardMove::Discard => "discarded",
        }
    }
}

/// A decoded log entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    /// `player` reshuffled the deck.
    Redeal {
        /// Acting player.
        player: usize,
    },
    /// `player` drew `count` cards.
    Draw {
        /// Acting player.
        player: usize,
        /// Cards drawn.
        count: u64,
    },
    /// `player` ended their turn, `next` is up.
    EndTurn {
        /// Acting player.
        player: usize,
        /// Player whose turn starts.
        next: usize,
    },
    /// Single-card action: play, place, store or discard.
    Card {
        /// Acting player.
        player: usize,
        /// Which of the single-card actions.
        kind: CardMove,
        /// Card snapshot at the time of the action.
        card: Card,
    },
    /// `player` gave `card` (or its whole set) to `to`.
    Give {
        /// Acting player.
        player: usize,
        /// Whether the whole set changed hands.
        whole_set: bool,
        /// Card snapshot at the time of the action.
        card: Card,
        /// Receiving player.
        to: usize,
    },
}

/// Failure to decode a log entry. These indicate a protocol mismatch with the
/// server and are never skipped.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The entry is not a `[player, action, ...]` array.
    #[error("log entry {index} is not a [player, action, ...] tuple")]
    Malformed {
        /// Position in the log.
        index: usize,
    },
    /// Action name outside the known set.
    #[error("log entry {index} has unknown action `{action}`")]
    UnknownAction {
        /// Position in the log.
        index: usize,
        /// Name as received.
        action: String,
    },
    /// Wrong number of arguments for the action.
    #[error("log entry {index} ({action}) expects {expected} arguments, got {found}")]
    Arity {
        /// Position in the log.
        index: usize,
        /// Decoded action.
        action: ActionKind,
        /// Arguments the action takes.
        expected: usize,
        /// Arguments received.
        found: usize,
    },
    /// An argument has the wrong shape.
    #[error("log entry {index} ({action}) argument {position}: {reason}")]
    InvalidArgument {
        /// Position in the log.
        index: usize,
        /// Decoded action.
        action: ActionKind,
        /// Argument position, the acting player being 0.
        position: usize,
        /// What was wrong.
        reason: String,
    },
}

impl LogEvent {
    /// Build an event from its parts.
    pub fn new(player: usize, action: &str, args: Vec<Value>) -> Self {
        let mut values = vec![Value::from(player), Value::from(action)];
        values.extend(args);
        Self(values)
    }

    /// Decode the tuple found at `index` of the log.
    pub fn decode(&self, index: usize) -> Result<LogEntry, HistoryError> {
        let values = &self.0;
        let name = values
            .get(1)
            .and_then(Value::as_str)
            .ok_or(HistoryError::Malformed { index })?;
        let action = ActionKind::parse(name).ok_or_else(|| HistoryError::UnknownAction {
            index,
            action: name.to_string(),
        })?;

        // values[0] is the player, values[1] the action name.
        let args: Vec<&Value> = std::iter::once(&values[0])
            .chain(values.iter().skip(2))
            .collect();
        if args.len() != action.arity() {
            return Err(HistoryError::Arity {
                index,
                action,
                expected: action.arity(),
                found: args.len(),
            });
        }

        let arg = ArgReader {
            index,
            action,
            args: &args,
        };
        let player = arg.player(0)?;
        let entry = match action {
            ActionKind::Redeal => LogEntry::Redeal { player },
            ActionKind::Draw => LogEntry::Draw {
                player,
                count: arg.count(1)?,
            },
            ActionKind::EndTurn => LogEntry::EndTurn {
                player,
                next: arg.player(1)?,
            },
            ActionKind::Play => arg.card_entry(player, CardMove::Play)?,
            ActionKind::Place => arg.card_entry(player, CardMove::Place)?,
            ActionKind::Store => arg.card_entry(player, CardMove::Store)?,
            ActionKind::Discard => arg.card_entry(player, CardMove::Discard)?,
            ActionKind::GiveCard | ActionKind::GiveSet => LogEntry::Give {
                player,
                whole_set: action == ActionKind::GiveSet,
                card: arg.card(1)?,
                to: arg.player(2)?,
            },
        };
        Ok(entry)
    }
}

struct ArgReader<'a> {
    index: usize,
    action: ActionKind,
    args: &'a [&'a Value],
}

impl ArgReader<'_> {
    fn card_entry(&self, player: usize, kind: CardMove) -> Result<LogEntry, HistoryError> {
        Ok(LogEntry::Card {
            player,
            kind,
            card: self.card(1)?,
        })
    }

    fn invalid(&self, position: usize, reason: impl Into<String>) -> HistoryError {
        HistoryError::InvalidArgument {
            index: self.index,
            action: self.action,
            position,
            reason: reason.into(),
        }
    }

    fn player(&self, position: usize) -> Result<usize, HistoryError> {
        self.args[position]
            .as_u64()
            .and_then(|value| usize::try_from(value).ok())
            .ok_or_else(|| self.invalid(position, "expected a player index"))
    }

    fn count(&self, position: usize) -> Result<u64, HistoryError> {
        self.args[position]
            .as_u64()
            .ok_or_else(|| self.invalid(position, "expected a card count"))
    }

    fn card(&self, position: usize) -> Result<Card, HistoryError> {
        Card::deserialize(self.args[position])
            .map_err(|err| self.invalid(position, format!("expected a card: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_card_actions_keep_their_kind() {
        let card = json!({"id": "c_robin_0", "type": "member", "name": "Robin", "energy": 3});
        for (name, kind, verb) in [
            ("play", CardMove::Play, "played"),
            ("place", CardMove::Place, "placed"),
            ("store", CardMove::Store, "stored"),
            ("discard", CardMove::Discard, "discarded"),
        ] {
            let entry = LogEvent::new(1, name, vec![card.clone()])
                .decode(0)
                .expect("valid entry");
            assert!(
                matches!(&entry, LogEntry::Card { player: 1, kind: decoded, .. } if *decoded == kind),
                "{name} decoded as {entry:?}"
            );
            assert_eq!(kind.verb(), verb);
        }
    }
}
