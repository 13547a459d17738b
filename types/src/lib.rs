//! Shared types for the updraft crash game: the round model mirrored by the
//! client, the autobet configuration, and the JSON wire messages exchanged
//! with the game gateway.

pub mod autobet;
pub mod player;
pub mod round;
pub mod wire;

pub use autobet::{
    AutobetConfig, AutobetConfigError, AutobetRunState, BetIntent, StakeStrategy,
    AUTOBET_WINDOW_MAX_INCLUSIVE, AUTOBET_WINDOW_MIN_EXCLUSIVE, MIN_AUTO_CASHOUT,
};
pub use player::{BetOutcome, LiveBet, PlayerIdentity, Session, SettledBet};
pub use round::{RoundPhase, RoundState, MULTIPLIER_EPSILON};
pub use wire::{Intent, Notification};
