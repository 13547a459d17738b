//! WebSocket + REST surface over the engine.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State as AxumState};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::warn;
use updraft_types::{Intent, Notification, Session, SettledBet};

use crate::engine::{Engine, EngineConfig, Outbound};

const BROADCAST_CAPACITY: usize = 1024;

/// The engine plus its fan-out channels.
pub struct Simulator {
    config: EngineConfig,
    engine: Mutex<Engine>,
    broadcaster: broadcast::Sender<Notification>,
    direct: Mutex<HashMap<u64, mpsc::UnboundedSender<Message>>>,
}

impl Simulator {
    pub fn new(config: EngineConfig) -> Self {
        let (broadcaster, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            config,
            engine: Mutex::new(Engine::new(config)),
            broadcaster,
            direct: Mutex::new(HashMap::new()),
        }
    }

    /// Spawn the driver task that advances the engine in real time.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let simulator = Arc::clone(self);
        let tick_ms = self.config.driver_tick_ms();
        tokio::spawn(async move {
            let mut interval = time::interval(Duration::from_millis(tick_ms));
            loop {
                interval.tick().await;
                let events = {
                    let mut engine = simulator.engine.lock().unwrap();
                    engine.tick(tick_ms)
                };
                simulator.dispatch(events);
            }
        })
    }

    pub fn login(&self, username: &str) -> Session {
        self.engine.lock().unwrap().login(username)
    }

    pub fn history(&self, user_id: u64) -> Vec<SettledBet> {
        self.engine.lock().unwrap().history_for(user_id)
    }

    fn apply_intent(&self, intent: Intent) {
        let events = {
            let mut engine = self.engine.lock().unwrap();
            match intent {
                Intent::PlaceBet {
                    user_id,
                    username,
                    amount,
                } => engine.place_bet(user_id, &username, amount),
                Intent::CashOut { user_id, .. } => engine.cash_out(user_id),
            }
        };
        self.dispatch(events);
    }

    fn dispatch(&self, events: Vec<Outbound>) {
        for event in events {
            match event {
                Outbound::Broadcast(notification) => {
                    let _ = self.broadcaster.send(notification);
                }
                Outbound::Direct {
                    user_id,
                    notification,
                } => {
                    let Ok(payload) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    let mut direct = self.direct.lock().unwrap();
                    if let Some(tx) = direct.get(&user_id) {
                        if tx.send(Message::Text(payload)).is_err() {
                            direct.remove(&user_id);
                        }
                    }
                }
            }
        }
    }
}

/// HTTP surface; `Api::new(simulator).router()` plugs into axum tests and
/// the standalone binary alike.
pub struct Api {
    simulator: Arc<Simulator>,
}

impl Api {
    pub fn new(simulator: Arc<Simulator>) -> Self {
        Self { simulator }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_handler))
            .route("/healthz", get(healthz))
            .route("/api/login", post(login))
            .route("/api/user/history", get(history))
            .with_state(self.simulator.clone())
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
}

async fn login(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Json(request): Json<LoginRequest>,
) -> Json<Session> {
    Json(simulator.login(&request.username))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    #[serde(rename = "userId")]
    user_id: u64,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    bets: Vec<SettledBet>,
}

async fn history(
    AxumState(simulator): AxumState<Arc<Simulator>>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        bets: simulator.history(query.user_id),
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    AxumState(simulator): AxumState<Arc<Simulator>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, simulator))
}

async fn handle_socket(socket: WebSocket, simulator: Arc<Simulator>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    let mut broadcast_rx = simulator.broadcaster.subscribe();

    let write_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let broadcast_task = {
        let tx = tx.clone();
        tokio::spawn(async move {
            while let Ok(notification) = broadcast_rx.recv().await {
                if let Ok(payload) = serde_json::to_string(&notification) {
                    let _ = tx.send(Message::Text(payload));
                }
            }
        })
    };

    let mut registered: Option<u64> = None;
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(text) => match serde_json::from_str::<Intent>(&text) {
                Ok(intent) => {
                    let user_id = match &intent {
                        Intent::PlaceBet { user_id, .. } => *user_id,
                        Intent::CashOut { user_id, .. } => *user_id,
                    };
                    // Direct notifications route to the connection that
                    // last spoke for this player.
                    if registered != Some(user_id) {
                        simulator
                            .direct
                            .lock()
                            .unwrap()
                            .insert(user_id, tx.clone());
                        registered = Some(user_id);
                    }
                    simulator.apply_intent(intent);
                }
                Err(err) => {
                    warn!(%err, "invalid inbound intent");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    if let Some(user_id) = registered {
        simulator.direct.lock().unwrap().remove(&user_id);
    }
    write_task.abort();
    broadcast_task.abort();
}
