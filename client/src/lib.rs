//! Client-side core of the updraft crash game.
//!
//! The pipeline: a [`connection::GatewayConnection`] decodes the realtime
//! notification stream, a [`tracker::RoundStateTracker`] reconciles the
//! local round mirror and fans out [`tracker::RoundEvent`]s, the
//! [`clock::AnimationClock`] interpolates smooth motion between coarse
//! server ticks, and the [`autobet::AutobetController`] places strategy
//! bets through the [`gateway::BetActionGateway`] — the single choke point
//! for outbound intents.

pub mod autobet;
pub mod clock;
pub mod connection;
pub mod gateway;
pub mod history;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod tracker;

pub use autobet::{AutobetController, AutobetError, AutobetPhase};
pub use clock::AnimationClock;
pub use connection::{GatewayConnection, IntentSender};
pub use gateway::BetActionGateway;
pub use history::{ApiClient, RetryPolicy};
pub use tracker::{RoundEvent, RoundStateHandle, RoundStateTracker};

use thiserror::Error;

/// Error type for client operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("failed: {status}: {body}")]
    FailedWithBody {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
