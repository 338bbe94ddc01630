use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::RwLockReadGuard;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::{
    config::AppConfig,
    models::{GameModel, GameStore},
};

use super::{
    protocol::{Inbound, Intent, Outbound, ProtocolError},
    socket::SocketClient,
};

/// Connection lifecycle as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection.
    Disconnected,
    /// Connection requested, not yet acknowledged.
    Connecting,
    /// Transport is up; registration pending.
    Connected,
    /// Seat registered with the server.
    Registered,
}

impl ConnectionState {
    /// Short label for status lines.
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Registered => "registered",
        }
    }
}

/// Events delivered by the transport, applied in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// Low-level connect acknowledgement (also fired after reconnects).
    Connected,
    /// Transport lost.
    Disconnected,
    /// Transport-level error report.
    Error(String),
    /// Decoded server message.
    Message(Inbound),
    /// Server message that failed to decode.
    Malformed(ProtocolError),
}

/// Intent waiting for the server's next snapshot or alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingIntent {
    /// What was sent.
    pub intent: Intent,
    /// When it was sent.
    pub sent_at: Instant,
}

/// Progress of the most recent intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState<'a> {
    /// Nothing outstanding.
    Idle,
    /// Sent, within the timeout.
    Waiting(&'a Intent),
    /// Sent, and the server has been silent past the timeout.
    Overdue(&'a Intent),
}

type SnapshotHandler = Box<dyn Fn(&GameModel) + Send + Sync>;

/// Owns the server connection and is the single writer of the game model.
pub struct SyncController {
    state: ConnectionState,
    player_index: usize,
    intent_timeout: Duration,
    store: GameStore,
    outbound: mpsc::UnboundedSender<Outbound>,
    pending: Option<PendingIntent>,
    snapshot_handlers: Vec<SnapshotHandler>,
    connection: Option<JoinHandle<Option<SocketClient>>>,
}

impl SyncController {
    /// Create a disconnected controller that writes outbound messages to `outbound`.
    pub fn new(
        player_index: usize,
        intent_timeout: Duration,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            player_index,
            intent_timeout,
            store: GameStore::new(),
            outbound,
            pending: None,
            snapshot_handlers: Vec::new(),
            connection: None,
        }
    }

    /// Start connecting to the configured server in the background and return
    /// at once in [`ConnectionState::Connecting`]. An unreachable server is
    /// retried, not fatal. Transport events arrive on the returned receiver
    /// and must be fed to [`Self::handle`].
    pub fn connect(
        config: &AppConfig,
        player_index: usize,
    ) -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let mut controller =
            Self::new(player_index, config.server.intent_timeout(), outbound_tx);

        controller.begin_connect();
        info!(url = %config.server.url, player = player_index, "Connecting to game server");
        let url = config.server.url.clone();
        controller.connection = Some(tokio::spawn(SocketClient::connect_with_retry(
            url,
            event_tx,
            outbound_rx,
        )));
        (controller, event_rx)
    }

    /// Close the connection, or stop connecting if no attempt has succeeded yet.
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(connection) = self.connection.take() {
            if connection.is_finished() {
                if let Ok(Some(client)) = connection.await {
                    client.disconnect().await?;
                }
            } else {
                connection.abort();
            }
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    /// Mark a connection attempt as started.
    pub fn begin_connect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            self.state = ConnectionState::Connecting;
        }
    }

    /// Apply one transport event.
    pub fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.state = ConnectionState::Connected;
                info!(player = self.player_index, "Connected; registering");
                self.register();
            }
            TransportEvent::Disconnected => {
                warn!(previous = self.state.label(), "Connection to game server lost");
                self.state = ConnectionState::Disconnected;
            }
            TransportEvent::Error(message) => {
                warn!(%message, "Transport error");
            }
            TransportEvent::Message(Inbound::StateUpdate(snapshot)) => {
                let mut model = self.store.write();
                model.apply_snapshot(*snapshot);
                info!(
                    players = model.players.len(),
                    hand = model.hand.len(),
                    log = model.log.len(),
                    "Snapshot applied"
                );
                drop(model);
                self.pending = None;

                let model = self.store.read();
                for handler in &self.snapshot_handlers {
                    handler(&model);
                }
            }
            TransportEvent::Message(Inbound::Alert(message)) => {
                info!(%message, "Server alert");
                self.store.write().set_alert(message);
                self.pending = None;
            }
            TransportEvent::Malformed(err) => {
                error!(?err, "Malformed server message");
                self.store
                    .write()
                    .set_alert(format!("Malformed server message: {err}"));
            }
        }
    }

    fn register(&mut self) {
        match self.emit(Outbound::Register(self.player_index)) {
            Ok(()) => {
                let mut model = self.store.write();
                // Only the first registration picks the tab; later ones keep the user's choice.
                if model.player_id.is_none() {
                    model.active_player_tab = self.player_index;
                }
                model.player_id = Some(self.player_index);
                drop(model);
                self.state = ConnectionState::Registered;
                info!(player = self.player_index, "Registered");
            }
            Err(err) => error!(?err, "Registration failed"),
        }
    }

    /// Fire an intent at the server. The reply, if any, is the next snapshot or alert.
    pub fn send(&mut self, intent: Intent) -> Result<()> {
        if self.state != ConnectionState::Registered {
            debug!(state = self.state.label(), intent = %intent.describe(), "Sending while unregistered");
        }
        self.emit(Outbound::Intent(intent.clone()))?;
        self.pending = Some(PendingIntent {
            intent,
            sent_at: Instant::now(),
        });
        Ok(())
    }

    fn emit(&self, message: Outbound) -> Result<()> {
        debug!(event = message.event(), "Queueing outbound message");
        self.outbound
            .send(message)
            .context("outbound channel closed")
    }

    /// Call `handler` with the model after every applied snapshot.
    pub fn on_snapshot(&mut self, handler: impl Fn(&GameModel) + Send + Sync + 'static) {
        self.snapshot_handlers.push(Box::new(handler));
    }

    /// Clear the alert locally.
    pub fn dismiss_alert(&self) {
        self.store.write().dismiss_alert();
    }

    /// Move the displayed board tab.
    pub fn cycle_tab(&self, delta: isize) {
        self.store.write().cycle_tab(delta);
    }

    /// Read access to the model.
    pub fn model(&self) -> RwLockReadGuard<'_, GameModel> {
        self.store.read()
    }

    /// Shareable read handle to the model.
    pub fn store(&self) -> GameStore {
        self.store.clone()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Player index this client registers as.
    pub fn player_index(&self) -> usize {
        self.player_index
    }

    /// How the most recent intent is doing at `now`.
    pub fn pending(&self, now: Instant) -> PendingState<'_> {
        match &self.pending {
            None => PendingState::Idle,
            Some(pending) if now.duration_since(pending.sent_at) >= self.intent_timeout => {
                PendingState::Overdue(&pending.intent)
            }
            Some(pending) => PendingState::Waiting(&pending.intent),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::{models::StateSnapshot, sync::protocol::STATE_UPDATE_EVENT};
    use serde_json::json;

    fn controller(player: usize) -> (SyncController, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SyncController::new(player, Duration::from_secs(10), tx), rx)
    }

    fn snapshot(players: &[&str]) -> Box<StateSnapshot> {
        Box::new(
            serde_json::from_value(json!({
                "boards": {"0": {"sets": [], "store": []}},
                "hand": [{"id": "c_draw_0", "type": "draw"}],
                "players": players,
                "log": [[0, "draw", 2]]
            }))
            .expect("valid snapshot"),
        )
    }

    #[tokio::test]
    async fn registers_on_connect() {
        let (mut controller, mut outbound) = controller(1);
        assert_eq!(controller.state(), ConnectionState::Disconnected);

        controller.begin_connect();
        assert_eq!(controller.state(), ConnectionState::Connecting);

        controller.handle(TransportEvent::Connected);
        assert_eq!(controller.state(), ConnectionState::Registered);
        assert_eq!(outbound.recv().await, Some(Outbound::Register(1)));
        assert_eq!(controller.model().player_id, Some(1));
        assert_eq!(controller.model().active_player_tab, 1);
    }

    #[tokio::test]
    async fn reconnect_registers_again_without_rollback() {
        let (mut controller, mut outbound) = controller(0);
        controller.handle(TransportEvent::Connected);
        controller.handle(TransportEvent::Message(Inbound::StateUpdate(snapshot(&["A", "B"]))));

        controller.handle(TransportEvent::Disconnected);
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.model().players, vec!["A", "B"]);

        controller.handle(TransportEvent::Connected);
        assert_eq!(controller.state(), ConnectionState::Registered);
        assert_eq!(outbound.recv().await, Some(Outbound::Register(0)));
        assert_eq!(outbound.recv().await, Some(Outbound::Register(0)));
    }

    #[tokio::test]
    async fn reconnect_keeps_selected_tab() {
        let (mut controller, _outbound) = controller(0);
        controller.handle(TransportEvent::Connected);
        controller.handle(TransportEvent::Message(Inbound::StateUpdate(snapshot(&["A", "B", "C"]))));
        controller.cycle_tab(2);
        assert_eq!(controller.model().active_player_tab, 2);

        controller.handle(TransportEvent::Disconnected);
        controller.handle(TransportEvent::Connected);
        assert_eq!(controller.state(), ConnectionState::Registered);
        assert_eq!(controller.model().active_player_tab, 2);
    }

    #[tokio::test]
    async fn unreachable_server_leaves_controller_connecting() -> Result<()> {
        let mut config = AppConfig::default();
        config.server.url = "http://127.0.0.1:1".to_string();

        let (mut controller, mut events) = SyncController::connect(&config, 0);
        assert_eq!(controller.state(), ConnectionState::Connecting);

        let event = tokio::time::timeout(Duration::from_secs(10), events.recv())
            .await
            .expect("connection attempt reported");
        assert!(matches!(event, Some(TransportEvent::Error(_))), "got {event:?}");
        controller.handle(event.expect("event"));
        assert_eq!(controller.state(), ConnectionState::Connecting);

        controller.disconnect().await?;
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        Ok(())
    }

    #[tokio::test]
    async fn snapshots_replace_state_and_notify() {
        let (mut controller, _outbound) = controller(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        controller.on_snapshot(move |model| {
            assert!(!model.players.is_empty());
            seen.fetch_add(1, Ordering::SeqCst);
        });

        controller.handle(TransportEvent::Message(Inbound::StateUpdate(snapshot(&["A", "B", "C"]))));
        let second = snapshot(&["A", "B"]);
        controller.handle(TransportEvent::Message(Inbound::StateUpdate(second.clone())));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(controller.model().snapshot(), *second);
    }

    #[tokio::test]
    async fn intents_are_sent_and_tracked_until_reply() -> Result<()> {
        let (mut controller, mut outbound) = controller(0);
        controller.handle(TransportEvent::Connected);
        outbound.recv().await;

        controller.send(Intent::Play {
            card_id: "c_swap_0".to_string(),
        })?;
        assert_eq!(
            outbound.recv().await,
            Some(Outbound::Intent(Intent::Play {
                card_id: "c_swap_0".to_string()
            }))
        );

        let now = Instant::now();
        assert!(matches!(controller.pending(now), PendingState::Waiting(_)));
        assert!(matches!(
            controller.pending(now + Duration::from_secs(11)),
            PendingState::Overdue(Intent::Play { .. })
        ));

        controller.handle(TransportEvent::Message(Inbound::Alert("Card not in hand".into())));
        assert_eq!(controller.pending(now), PendingState::Idle);
        assert_eq!(
            controller.model().alert.as_ref().map(|alert| alert.message.as_str()),
            Some("Card not in hand")
        );
        Ok(())
    }

    #[tokio::test]
    async fn send_works_before_registration() -> Result<()> {
        let (mut controller, mut outbound) = controller(0);
        controller.send(Intent::Draw)?;
        assert_eq!(outbound.recv().await, Some(Outbound::Intent(Intent::Draw)));
        Ok(())
    }

    #[test]
    fn newer_alert_supersedes_and_dismiss_clears() {
        let (mut controller, _outbound) = controller(0);
        controller.handle(TransportEvent::Message(Inbound::Alert("first".into())));
        controller.handle(TransportEvent::Message(Inbound::Alert("second".into())));
        assert_eq!(
            controller.model().alert.as_ref().map(|alert| alert.message.clone()),
            Some("second".to_string())
        );

        controller.dismiss_alert();
        assert!(controller.model().alert.is_none());
    }

    #[test]
    fn malformed_message_keeps_previous_state() {
        let (mut controller, _outbound) = controller(0);
        controller.handle(TransportEvent::Message(Inbound::StateUpdate(snapshot(&["A"]))));

        let err = Inbound::decode(STATE_UPDATE_EVENT, Vec::new())
            .expect_err("missing payload");
        controller.handle(TransportEvent::Malformed(err));

        assert_eq!(controller.model().players, vec!["A"]);
        assert!(controller.model().alert.is_some());
    }

    #[test]
    fn send_fails_once_transport_is_gone() {
        let (mut controller, outbound) = controller(0);
        drop(outbound);
        assert!(controller.send(Intent::EndTurn).is_err());
        assert_eq!(controller.pending(Instant::now()), PendingState::Idle);
    }
}
