//! Test doubles for the gateway connection.
//!
//! [`FakeGateway`] stands in for a live [`crate::GatewayConnection`] using
//! the same channel ends, so every component can be driven without a
//! network. Enabled for this crate's own tests and for dependents through
//! the `mocks` feature.

use tokio::sync::{broadcast, mpsc};
use updraft_types::{Intent, Notification};

use crate::connection::IntentSender;

pub struct FakeGateway {
    notifications: broadcast::Sender<Notification>,
    intents_tx: mpsc::UnboundedSender<Intent>,
    intents_rx: mpsc::UnboundedReceiver<Intent>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        let (notifications, _) = broadcast::channel(64);
        let (intents_tx, intents_rx) = mpsc::unbounded_channel();
        Self {
            notifications,
            intents_tx,
            intents_rx,
        }
    }

    /// Subscribe, mirroring [`crate::GatewayConnection::subscribe`].
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Intent handle, mirroring [`crate::GatewayConnection::intent_sender`].
    pub fn intent_sender(&self) -> IntentSender {
        IntentSender::new(self.intents_tx.clone())
    }

    /// Push a server notification to all subscribers.
    pub fn push(&self, notification: Notification) {
        let _ = self.notifications.send(notification);
    }

    /// Drain every intent the client has sent so far.
    pub fn sent_intents(&mut self) -> Vec<Intent> {
        let mut intents = Vec::new();
        while let Ok(intent) = self.intents_rx.try_recv() {
            intents.push(intent);
        }
        intents
    }
}
