//! Socket.IO connection to the game server.

use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::FutureExt;
use rust_socketio::{
    asynchronous::{Client, ClientBuilder},
    Event, Payload,
};
use serde_json::Value;
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

use super::{
    controller::TransportEvent,
    protocol::{Inbound, Outbound, ALERT_EVENT, STATE_UPDATE_EVENT},
};

/// First delay between failed connection attempts.
pub const RETRY_INITIAL: Duration = Duration::from_millis(500);
/// Ceiling for the doubling retry delay.
pub const RETRY_MAX: Duration = Duration::from_secs(30);

/// Live connection: the socket client plus the task draining outbound messages.
pub struct SocketClient {
    client: Client,
    writer: JoinHandle<()>,
}

impl SocketClient {
    /// Connect to `url`, forwarding transport events to `events` and sending
    /// everything received on `outbound`.
    ///
    /// Keeps trying, doubling the delay up to [`RETRY_MAX`]. Each
    /// failure is reported on `events` as [`TransportEvent::Error`]. Gives up
    /// only once nobody listens on `events`.
    pub async fn connect_with_retry(
        url: String,
        events: mpsc::UnboundedSender<TransportEvent>,
        outbound: mpsc::UnboundedReceiver<Outbound>,
    ) -> Option<Self> {
        let mut delay = RETRY_INITIAL;
        let mut attempt = 1u32;
        loop {
            match open(&url, events.clone()).await {
                Ok(client) => {
                    info!(%url, attempt, "Connected to game server");
                    return Some(Self::attach(client, outbound));
                }
                Err(err) => {
                    warn!(%url, attempt, retry_in = ?delay, "Connection attempt failed: {err:#}");
                    if events.send(TransportEvent::Error(format!("{err:#}"))).is_err() {
                        return None;
                    }
                }
            }
            sleep(delay).await;
            delay = (delay * 2).min(RETRY_MAX);
            attempt += 1;
        }
    }

    fn attach(client: Client, mut outbound: mpsc::UnboundedReceiver<Outbound>) -> Self {
        let sender = client.clone();
        let writer = tokio::spawn(async move {
            while let Some(message) = outbound.recv().await {
                let event = message.event();
                debug!(event, "emitting");
                if let Err(err) = sender.emit(event, Payload::Text(message.args())).await {
                    warn!(event, ?err, "emit failed");
                }
            }
        });
        Self { client, writer }
    }

    /// Close the connection and stop the writer.
    pub async fn disconnect(self) -> Result<()> {
        self.writer.abort();
        self.client
            .disconnect()
            .await
            .context("failed to disconnect from game server")
    }
}

async fn open(url: &str, events: mpsc::UnboundedSender<TransportEvent>) -> Result<Client> {
    let on_open = events.clone();
    let on_close = events.clone();
    let on_error = events.clone();
    let on_state = events.clone();
    let on_alert = events;

    let client = ClientBuilder::new(url)
        .reconnect_on_disconnect(true)
        .on(Event::Connect, move |_payload, _socket| {
            let events = on_open.clone();
            async move {
                let _ = events.send(TransportEvent::Connected);
            }
            .boxed()
        })
        .on(Event::Close, move |_payload, _socket| {
            let events = on_close.clone();
            async move {
                let _ = events.send(TransportEvent::Disconnected);
            }
            .boxed()
        })
        .on(Event::Error, move |payload, _socket| {
            let events = on_error.clone();
            async move {
                let message = payload_values(payload)
                    .into_iter()
                    .map(|value| match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = events.send(TransportEvent::Error(message));
            }
            .boxed()
        })
        .on(STATE_UPDATE_EVENT, move |payload, _socket| {
            let events = on_state.clone();
            async move { forward(&events, STATE_UPDATE_EVENT, payload) }.boxed()
        })
        .on(ALERT_EVENT, move |payload, _socket| {
            let events = on_alert.clone();
            async move { forward(&events, ALERT_EVENT, payload) }.boxed()
        })
        .connect()
        .await
        .with_context(|| format!("failed to connect to game server at {url}"))?;

    Ok(client)
}

fn forward(events: &mpsc::UnboundedSender<TransportEvent>, event: &str, payload: Payload) {
    let transport_event = match Inbound::decode(event, payload_values(payload)) {
        Ok(Some(message)) => TransportEvent::Message(message),
        Ok(None) => return,
        Err(err) => TransportEvent::Malformed(err),
    };
    let _ = events.send(transport_event);
}

#[allow(deprecated)]
fn payload_values(payload: Payload) -> Vec<Value> {
    match payload {
        Payload::Text(values) => values,
        Payload::String(raw) => match serde_json::from_str(&raw) {
            Ok(value) => vec![value],
            Err(_) => vec![Value::String(raw)],
        },
        Payload::Binary(_) => Vec::new(),
    }
}
