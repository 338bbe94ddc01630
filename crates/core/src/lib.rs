#![warn(clippy::all, missing_docs)]

//! Core client logic for the Flock card game.
//!
//! This crate hosts the game models mirrored from the server, the
//! action-eligibility rules, log interpretation, configuration handling
//! and the synchronisation controller used by the terminal UI and any
//! future frontends.

pub mod config;
pub mod history;
pub mod launch;
pub mod models;
pub mod rules;
pub mod sync;

pub use config::AppConfig;
pub use history::{interpret, DisplayLine, HistoryError, LogEvent};
pub use models::{Board, Card, CardKind, CardSet, GameModel, Location, StateSnapshot};
pub use rules::{available_actions, find_matching_sets, CardAction, CardContext, SetOrdering};
pub use sync::{ConnectionState, Intent, SyncController, TransportEvent};
