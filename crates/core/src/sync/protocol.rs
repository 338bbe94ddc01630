//! Socket.IO message shapes exchanged with the game server.

use serde_json::Value;
use thiserror::Error;

use crate::models::StateSnapshot;

/// Inbound event carrying a full state snapshot.
pub const STATE_UPDATE_EVENT: &str = "server_state_update";
/// Inbound event carrying a server notice.
pub const ALERT_EVENT: &str = "alert";

/// Player-initiated request. Never validated locally beyond UI gating; the
/// server decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Draw cards.
    Draw,
    /// End the turn.
    EndTurn,
    /// Give a board card to another player.
    GiveCard {
        /// Card to give.
        card_id: String,
        /// Receiving player.
        to: usize,
    },
    /// Give the set holding a card to another player.
    GiveSet {
        /// Any card of the set.
        card_id: String,
        /// Receiving player.
        to: usize,
    },
    /// Flip a wild to its other set.
    Flip {
        /// Wild card.
        card_id: String,
    },
    /// Play an action card.
    Play {
        /// Card to play.
        card_id: String,
    },
    /// Place a card, into `set_id` or a new set.
    Place {
        /// Card to place.
        card_id: String,
        /// Target set; `None` starts a new one.
        set_id: Option<String>,
    },
    /// Store a card as energy.
    Store {
        /// Card to store.
        card_id: String,
    },
    /// Discard from an overfull hand.
    Discard {
        /// Card to discard.
        card_id: String,
    },
    /// Start a new game.
    Restart,
}

impl Intent {
    /// Short description for status lines.
    pub fn describe(&self) -> String {
        match self {
            Intent::Draw => "draw".to_string(),
            Intent::EndTurn => "end turn".to_string(),
            Intent::GiveCard { card_id, to } => format!("give {card_id} to player {to}"),
            Intent::GiveSet { card_id, to } => format!("give set of {card_id} to player {to}"),
            Intent::Flip { card_id } => format!("flip {card_id}"),
            Intent::Play { card_id } => format!("play {card_id}"),
            Intent::Place {
                card_id,
                set_id: Some(set_id),
            } => format!("place {card_id} in {set_id}"),
            Intent::Place {
                card_id,
                set_id: None,
            } => format!("place {card_id} in a new set"),
            Intent::Store { card_id } => format!("store {card_id}"),
            Intent::Discard { card_id } => format!("discard {card_id}"),
            Intent::Restart => "restart".to_string(),
        }
    }
}

/// Message sent to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Claim a player seat for this connection.
    Register(usize),
    /// A player intent.
    Intent(Intent),
}

impl Outbound {
    /// Socket.IO event name.
    pub fn event(&self) -> &'static str {
        match self {
            Outbound::Register(_) => "register",
            Outbound::Intent(intent) => match intent {
                Intent::Draw => "draw",
                Intent::EndTurn => "end",
                Intent::GiveCard { .. } => "give_card",
                Intent::GiveSet { .. } => "give_set",
                Intent::Flip { .. } => "flip",
                Intent::Play { .. } => "play",
                Intent::Place { .. } => "place",
                Intent::Store { .. } => "store",
                Intent::Discard { .. } => "discard",
                Intent::Restart => "restart",
            },
        }
    }

    /// Positional event arguments. Order matters to the server.
    pub fn args(&self) -> Vec<Value> {
        match self {
            Outbound::Register(player) => vec![Value::from(*player)],
            Outbound::Intent(intent) => match intent {
                Intent::Draw | Intent::EndTurn | Intent::Restart => Vec::new(),
                Intent::GiveCard { card_id, to } | Intent::GiveSet { card_id, to } => {
                    vec![Value::from(card_id.as_str()), Value::from(*to)]
                }
                Intent::Place { card_id, set_id } => vec![
                    Value::from(card_id.as_str()),
                    set_id.as_deref().map_or(Value::Null, Value::from),
                ],
                Intent::Flip { card_id }
                | Intent::Play { card_id }
                | Intent::Store { card_id }
                | Intent::Discard { card_id } => vec![Value::from(card_id.as_str())],
            },
        }
    }
}

/// Message received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Full state replacing everything received before.
    StateUpdate(Box<StateSnapshot>),
    /// Notice replacing the current alert.
    Alert(String),
}

/// Inbound payload that does not match the expected shape.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The event arrived without arguments.
    #[error("`{event}` arrived without a payload")]
    MissingPayload {
        /// Event name.
        event: String,
    },
    /// The payload did not deserialize.
    #[error("`{event}` payload is invalid: {source}")]
    InvalidPayload {
        /// Event name.
        event: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },
}

impl Inbound {
    /// Decode an inbound event. Events this client does not consume yield `Ok(None)`.
    pub fn decode(event: &str, args: Vec<Value>) -> Result<Option<Self>, ProtocolError> {
        if event != STATE_UPDATE_EVENT && event != ALERT_EVENT {
            return Ok(None);
        }
        let payload = args
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::MissingPayload {
                event: event.to_string(),
            })?;

        let message = if event == STATE_UPDATE_EVENT {
            let snapshot = serde_json::from_value(payload).map_err(|source| {
                ProtocolError::InvalidPayload {
                    event: event.to_string(),
                    source,
                }
            })?;
            Inbound::StateUpdate(Box::new(snapshot))
        } else {
            let text = match payload {
                Value::String(text) => text,
                other => other.to_string(),
            };
            Inbound::Alert(text)
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn card_id() -> String {
        "c_robin_0".to_string()
    }

    #[test]
    fn outbound_names_and_arguments() {
        let cases = vec![
            (Outbound::Register(1), "register", vec![json!(1)]),
            (Outbound::Intent(Intent::Draw), "draw", vec![]),
            (Outbound::Intent(Intent::EndTurn), "end", vec![]),
            (
                Outbound::Intent(Intent::GiveCard {
                    card_id: card_id(),
                    to: 1,
                }),
                "give_card",
                vec![json!("c_robin_0"), json!(1)],
            ),
            (
                Outbound::Intent(Intent::GiveSet {
                    card_id: card_id(),
                    to: 0,
                }),
                "give_set",
                vec![json!("c_robin_0"), json!(0)],
            ),
            (
                Outbound::Intent(Intent::Place {
                    card_id: card_id(),
                    set_id: None,
                }),
                "place",
                vec![json!("c_robin_0"), json!(null)],
            ),
            (
                Outbound::Intent(Intent::Place {
                    card_id: card_id(),
                    set_id: Some("c_red_0".to_string()),
                }),
                "place",
                vec![json!("c_robin_0"), json!("c_red_0")],
            ),
            (
                Outbound::Intent(Intent::Discard { card_id: card_id() }),
                "discard",
                vec![json!("c_robin_0")],
            ),
            (Outbound::Intent(Intent::Restart), "restart", vec![]),
        ];

        for (message, event, args) in cases {
            assert_eq!(message.event(), event);
            assert_eq!(message.args(), args, "arguments for {event}");
        }
    }

    #[test]
    fn decodes_state_update() -> anyhow::Result<()> {
        let decoded = Inbound::decode(
            STATE_UPDATE_EVENT,
            vec![json!({
                "boards": {"0": {"sets": [], "store": []}},
                "hand": [],
                "players": ["Christy", "Abbie"],
                "log": []
            })],
        )?;
        match decoded {
            Some(Inbound::StateUpdate(snapshot)) => {
                assert_eq!(snapshot.players, vec!["Christy", "Abbie"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn decodes_alert_and_ignores_other_events() -> anyhow::Result<()> {
        assert_eq!(
            Inbound::decode(ALERT_EVENT, vec![json!("Card not in hand")])?,
            Some(Inbound::Alert("Card not in hand".to_string()))
        );
        assert_eq!(Inbound::decode("deregister", vec![json!("sid")])?, None);
        Ok(())
    }

    #[test]
    fn rejects_bad_payloads() {
        assert!(matches!(
            Inbound::decode(STATE_UPDATE_EVENT, Vec::new()),
            Err(ProtocolError::MissingPayload { .. })
        ));
        assert!(matches!(
            Inbound::decode(STATE_UPDATE_EVENT, vec![json!({"hand": [{"id": "x", "type": "laser"}]})]),
            Err(ProtocolError::InvalidPayload { .. })
        ));
    }
}
