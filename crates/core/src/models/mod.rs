//! Shared domain models mirrored from the server.

mod board;
mod card;

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::{Deserialize, Serialize};

use crate::history::LogEvent;
use crate::rules::is_hand_overfull;

pub use board::{Board, CardSet};
pub use card::{Card, CardKind, Location};

/// Full authoritative state payload of a `server_state_update` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Boards keyed by player index.
    #[serde(default)]
    pub boards: BTreeMap<usize, Board>,
    /// The receiving player's hand.
    #[serde(default)]
    pub hand: Vec<Card>,
    /// Player display names, index = player id.
    #[serde(default)]
    pub players: Vec<String>,
    /// Action log, oldest first.
    #[serde(default)]
    pub log: Vec<LogEvent>,
    /// Shared discard pile.
    #[serde(default)]
    pub discard: Vec<Card>,
}

/// Server notice shown until dismissed or superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Message text, verbatim from the server.
    pub message: String,
    /// When the client received it.
    pub received_at: DateTime<Utc>,
}

/// Everything the client knows about the running game.
#[derive(Debug, Clone, Default)]
pub struct GameModel {
    /// Player display names.
    pub players: Vec<String>,
    /// Local player's index, set once registration completes.
    pub player_id: Option<usize>,
    /// Board currently displayed, independent of turn order.
    pub active_player_tab: usize,
    /// Current alert, if any.
    pub alert: Option<Alert>,
    /// Action log, oldest first.
    pub log: Vec<LogEvent>,
    /// Boards keyed by player index.
    pub boards: BTreeMap<usize, Board>,
    /// The local player's hand.
    pub hand: Vec<Card>,
    /// Shared discard pile.
    pub discard: Vec<Card>,
    /// When the last snapshot was applied.
    pub synced_at: Option<DateTime<Utc>>,
}

impl GameModel {
    /// Replace all server-owned state with the snapshot. Nothing from the
    /// previous snapshot survives.
    pub fn apply_snapshot(&mut self, snapshot: StateSnapshot) {
        let StateSnapshot {
            boards,
            hand,
            players,
            log,
            discard,
        } = snapshot;
        self.boards = boards;
        self.hand = hand;
        self.players = players;
        self.log = log;
        self.discard = discard;
        self.synced_at = Some(Utc::now());
        if !self.players.is_empty() && self.active_player_tab >= self.players.len() {
            self.active_player_tab = self.player_id.unwrap_or(0).min(self.players.len() - 1);
        }
    }

    /// Server-owned state as a snapshot value.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            boards: self.boards.clone(),
            hand: self.hand.clone(),
            players: self.players.clone(),
            log: self.log.clone(),
            discard: self.discard.clone(),
        }
    }

    /// Replace the current alert.
    pub fn set_alert(&mut self, message: impl Into<String>) {
        self.alert = Some(Alert {
            message: message.into(),
            received_at: Utc::now(),
        });
    }

    /// Clear the alert locally; the server is not told.
    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Board for the given player.
    pub fn board(&self, player: usize) -> Option<&Board> {
        self.boards.get(&player)
    }

    /// The local player's board, the only valid placement target.
    pub fn own_board(&self) -> Option<&Board> {
        self.player_id.and_then(|player| self.board(player))
    }

    /// Board shown in the active tab.
    pub fn active_board(&self) -> Option<&Board> {
        self.board(self.active_player_tab)
    }

    /// Whether the active tab shows the local player's board.
    pub fn viewing_own_board(&self) -> bool {
        self.player_id == Some(self.active_player_tab)
    }

    /// Display name of a player, with a positional fallback.
    pub fn player_name(&self, player: usize) -> String {
        self.players
            .get(player)
            .cloned()
            .unwrap_or_else(|| format!("Player {player}"))
    }

    /// Hand holds more cards than the limit and must be trimmed.
    pub fn hand_overfull(&self) -> bool {
        is_hand_overfull(self.hand.len())
    }

    /// Move the active tab by `delta`, wrapping around the player list.
    pub fn cycle_tab(&mut self, delta: isize) {
        let total = self.players.len().max(self.boards.len());
        if total == 0 {
            return;
        }
        let current = self.active_player_tab.min(total - 1) as isize;
        self.active_player_tab = (current + delta).rem_euclid(total as isize) as usize;
    }
}

/// Thread-safe handle to the game model. The synchronisation controller is
/// the only writer; any number of readers may hold it.
#[derive(Debug, Clone, Default)]
pub struct GameStore {
    inner: Arc<RwLock<GameModel>>,
}

impl GameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the model for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, GameModel> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, GameModel> {
        self.inner.write()
    }
}
