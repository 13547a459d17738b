//! The gateway connection.
//!
//! One realtime channel is shared by every component. It is constructed
//! once at the composition root and its two ends are handed out explicitly:
//! a broadcast subscription for inbound [`Notification`]s and a cloneable
//! [`IntentSender`] for outbound [`Intent`]s. Dropping the connection
//! aborts the reader and writer tasks, so no callback fires after teardown.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};
use updraft_types::{Intent, Notification};

use crate::{Error, Result};

const NOTIFICATION_CHANNEL_CAPACITY: usize = 1024;

/// Cloneable handle for submitting fire-and-forget intents.
#[derive(Clone, Debug)]
pub struct IntentSender {
    tx: mpsc::UnboundedSender<Intent>,
}

impl IntentSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Intent>) -> Self {
        Self { tx }
    }

    /// Queue an intent for delivery. Intents sent after the connection
    /// closed are dropped; the next round of notifications (or their
    /// absence) tells the caller what actually happened.
    pub fn send(&self, intent: Intent) {
        if self.tx.send(intent).is_err() {
            debug!("intent dropped: connection closed");
        }
    }
}

/// A live WebSocket connection to the game gateway.
pub struct GatewayConnection {
    notifications: broadcast::Sender<Notification>,
    intents: mpsc::UnboundedSender<Intent>,
    reader: tokio::task::JoinHandle<()>,
    writer: tokio::task::JoinHandle<()>,
}

impl Drop for GatewayConnection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl GatewayConnection {
    /// Connect to the gateway at a `ws://` or `wss://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let parsed = url::Url::parse(url)?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => return Err(Error::InvalidScheme(other.to_string())),
        }

        let (ws, _) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();
        let (notify_tx, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        let (intent_tx, mut intent_rx) = mpsc::unbounded_channel::<Intent>();

        let fanout = notify_tx.clone();
        let reader = tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<Notification>(&text) {
                            // A send error only means nobody is subscribed
                            // right now, which is fine.
                            Ok(notification) => {
                                let _ = fanout.send(notification);
                            }
                            Err(err) => {
                                warn!(%err, raw = %text, "failed to decode notification");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("gateway closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "websocket read error");
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(intent) = intent_rx.recv().await {
                let payload = match serde_json::to_string(&intent) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(%err, "failed to encode intent");
                        continue;
                    }
                };
                if let Err(err) = sink.send(Message::Text(payload)).await {
                    warn!(%err, "websocket send failed");
                    break;
                }
            }
        });

        Ok(Self {
            notifications: notify_tx,
            intents: intent_tx,
            reader,
            writer,
        })
    }

    /// Subscribe to inbound notifications. Each subscriber sees every
    /// notification from the point of subscription onward.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Handle for submitting outbound intents.
    pub fn intent_sender(&self) -> IntentSender {
        IntentSender::new(self.intents.clone())
    }
}
