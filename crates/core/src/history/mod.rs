//! Human-readable game history.
//!
//! The server ships the log as compact tuples. [`interpret`] turns the whole
//! log into display lines, newest first. It borrows the log and can be rerun
//! against every snapshot since the log is replaced wholesale each time.

mod event;

use std::fmt;

pub use event::{ActionKind, CardMove, HistoryError, LogEntry, LogEvent};

use crate::models::Card;

/// Compact card reference shown in history lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRef {
    /// Card identifier.
    pub id: String,
    /// Name, or type when unnamed.
    pub label: String,
    /// Energy value.
    pub energy: u32,
}

impl From<&Card> for CardRef {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            label: card.display_name().to_string(),
            energy: card.energy,
        }
    }
}

impl fmt::Display for CardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.label, self.energy)
    }
}

/// Fragment of a history line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Literal text.
    Text(String),
    /// Resolved player name.
    Player(String),
    /// Card reference.
    Card(CardRef),
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Text(text) | Part::Player(text) => f.write_str(text),
            Part::Card(card) => card.fmt(f),
        }
    }
}

/// One rendered history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    /// Player who acted.
    pub actor: usize,
    /// Fragments in reading order.
    pub parts: Vec<Part>,
}

impl fmt::Display for DisplayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            part.fmt(f)?;
        }
        Ok(())
    }
}

/// Render the log newest first. Fails on the first entry that does not decode.
pub fn interpret(log: &[LogEvent], players: &[String]) -> Result<Vec<DisplayLine>, HistoryError> {
    log.iter()
        .enumerate()
        .rev()
        .map(|(index, event)| event.decode(index).map(|entry| render(&entry, players)))
        .collect()
}

fn render(entry: &LogEntry, players: &[String]) -> DisplayLine {
    let name = |player: usize| {
        Part::Player(
            players
                .get(player)
                .cloned()
                .unwrap_or_else(|| format!("Player {player}")),
        )
    };
    let text = |value: &str| Part::Text(value.to_string());
    let card = |card: &Card| Part::Card(CardRef::from(card));

    let (actor, parts) = match entry {
        LogEntry::Redeal { player } => (
            *player,
            vec![name(*player), text(" ran out the deck and had to reshuffle")],
        ),
        LogEntry::Draw { player, count } => (
            *player,
            vec![
                name(*player),
                Part::Text(format!(" drew {count} cards")),
            ],
        ),
        LogEntry::EndTurn { player, next } => (
            *player,
            vec![
                name(*player),
                text(" ended their turn. Now for "),
                name(*next),
            ],
        ),
        LogEntry::Card {
            player,
            kind,
            card: played,
        } => {
            (
                *player,
                vec![
                    name(*player),
                    Part::Text(format!(" {} ", kind.verb())),
                    card(played),
                ],
            )
        }
        LogEntry::Give {
            player,
            whole_set,
            card: given,
            to,
        } => {
            let verb = if *whole_set {
                " gave Flock containing "
            } else {
                " gave "
            };
            (
                *player,
                vec![name(*player), text(verb), card(given), text(" to "), name(*to)],
            )
        }
    };
    DisplayLine { actor, parts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn players() -> Vec<String> {
        vec!["A".to_string(), "B".to_string()]
    }

    fn robin() -> serde_json::Value {
        json!({"id": "c_robin_0", "type": "member", "name": "Robin", "sets": ["red"], "energy": 3})
    }

    fn strings(lines: &[DisplayLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn newest_first_and_repeatable() {
        let log = vec![
            LogEvent::new(0, "draw", vec![json!(2)]),
            LogEvent::new(1, "end_turn", vec![json!(0)]),
        ];
        let before = log.clone();

        let first = interpret(&log, &players()).expect("valid log");
        let second = interpret(&log, &players()).expect("valid log");

        assert_eq!(
            strings(&first),
            vec!["B ended their turn. Now for A", "A drew 2 cards"]
        );
        assert_eq!(first, second);
        assert_eq!(log, before);
    }

    #[test]
    fn renders_every_template() {
        let log: Vec<LogEvent> = serde_json::from_value(json!([
            [0, "redeal"],
            [0, "play", robin()],
            [0, "place", robin()],
            [1, "store", robin()],
            [1, "give_card", robin(), 0],
            [1, "give_set", robin(), 0],
            [0, "discard", {"id": "c_e_0", "type": "energy", "energy": 1}]
        ]))
        .expect("valid log");

        let lines = interpret(&log, &players()).expect("valid log");
        assert_eq!(
            strings(&lines),
            vec![
                "A discarded energy [1]",
                "B gave Flock containing Robin [3] to A",
                "B gave Robin [3] to A",
                "B stored Robin [3]",
                "A placed Robin [3]",
                "A played Robin [3]",
                "A ran out the deck and had to reshuffle",
            ]
        );
        assert_eq!(lines[1].actor, 1);
        assert!(matches!(&lines[1].parts[2], Part::Card(card) if card.id == "c_robin_0"));
    }

    #[test]
    fn unknown_player_gets_positional_name() {
        let log = vec![LogEvent::new(3, "redeal", Vec::new())];
        let lines = interpret(&log, &players()).expect("valid log");
        assert_eq!(
            lines[0].to_string(),
            "Player 3 ran out the deck and had to reshuffle"
        );
    }

    #[test]
    fn unknown_action_is_an_error() {
        let log = vec![
            LogEvent::new(0, "draw", vec![json!(2)]),
            LogEvent::new(0, "teleport", Vec::new()),
        ];
        let err = interpret(&log, &players()).expect_err("unknown action");
        assert!(matches!(
            err,
            HistoryError::UnknownAction { index: 1, ref action } if action == "teleport"
        ));
    }

    #[test]
    fn wrong_arity_is_an_error() {
        let log = vec![LogEvent::new(0, "give_card", vec![robin()])];
        let err = interpret(&log, &players()).expect_err("missing recipient");
        assert!(matches!(
            err,
            HistoryError::Arity {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn bad_arguments_are_errors() {
        let log = vec![LogEvent::new(0, "play", vec![json!("not a card")])];
        assert!(matches!(
            interpret(&log, &players()),
            Err(HistoryError::InvalidArgument { position: 1, .. })
        ));

        let log = vec![LogEvent(vec![json!("A"), json!("redeal")])];
        assert!(matches!(
            interpret(&log, &players()),
            Err(HistoryError::InvalidArgument { position: 0, .. })
        ));

        let log = vec![LogEvent(vec![json!(0)])];
        assert!(matches!(
            interpret(&log, &players()),
            Err(HistoryError::Malformed { index: 0 })
        ));
    }
}
