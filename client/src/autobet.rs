//! Autobet automation.
//!
//! [`AutobetController`] is a per-player automaton layered on the tracker's
//! event stream: `Idle` (automation off) to `Armed` (waiting for a biddable
//! countdown window) and back to `Idle` when the user stops it, the stake
//! ceiling is reached, or the round stream goes away. While armed it places
//! at most one bet per countdown cycle through the bet gateway and adjusts
//! the stake from settlement outcomes.

use thiserror::Error;
use tracing::{debug, info};
use updraft_types::{
    AutobetConfig, AutobetConfigError, AutobetRunState, BetIntent, StakeStrategy,
    AUTOBET_WINDOW_MAX_INCLUSIVE, AUTOBET_WINDOW_MIN_EXCLUSIVE,
};

use crate::gateway::BetActionGateway;
use crate::tracker::RoundEvent;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AutobetPhase {
    Idle,
    Armed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutobetError {
    #[error(transparent)]
    Config(#[from] AutobetConfigError),
    #[error("automation is already active")]
    AlreadyActive,
}

struct ActiveRun {
    config: AutobetConfig,
    state: AutobetRunState,
    bet_this_cycle: bool,
}

pub struct AutobetController {
    gateway: BetActionGateway,
    run: Option<ActiveRun>,
}

impl AutobetController {
    pub fn new(gateway: BetActionGateway) -> Self {
        Self { gateway, run: None }
    }

    pub fn phase(&self) -> AutobetPhase {
        if self.run.is_some() {
            AutobetPhase::Armed
        } else {
            AutobetPhase::Idle
        }
    }

    /// Current run bookkeeping, for display. `None` while idle.
    pub fn run_state(&self) -> Option<AutobetRunState> {
        self.run.as_ref().map(|run| run.state)
    }

    /// Start automation. An invalid configuration is rejected with no state
    /// change; the configuration is only replaceable while idle.
    pub fn start(&mut self, config: AutobetConfig) -> Result<(), AutobetError> {
        if self.run.is_some() {
            return Err(AutobetError::AlreadyActive);
        }
        config.validate()?;
        info!(
            base_stake = config.base_stake,
            stake_ceiling = config.stake_ceiling,
            auto_cashout = config.auto_cashout,
            "autobet armed"
        );
        self.run = Some(ActiveRun {
            state: AutobetRunState::start(&config),
            config,
            bet_this_cycle: false,
        });
        Ok(())
    }

    /// Stop automation and discard the run state. Idempotent.
    pub fn stop(&mut self) {
        if self.run.take().is_some() {
            info!("autobet stopped");
        }
    }

    /// React to one round event. Returns `true` when a bet was placed.
    pub fn handle_event(&mut self, event: &RoundEvent) -> bool {
        match event {
            RoundEvent::CountdownStarted { seconds_remaining } => {
                if let Some(run) = self.run.as_mut() {
                    run.bet_this_cycle = false;
                }
                self.maybe_bet(*seconds_remaining)
            }
            RoundEvent::CountdownTick { seconds_remaining } => self.maybe_bet(*seconds_remaining),
            RoundEvent::BetSettled { win, amount } => {
                self.apply_settlement(*win, *amount);
                false
            }
            RoundEvent::ChannelClosed => {
                self.stop();
                false
            }
            _ => false,
        }
    }

    fn maybe_bet(&mut self, seconds_remaining: u32) -> bool {
        if seconds_remaining <= AUTOBET_WINDOW_MIN_EXCLUSIVE
            || seconds_remaining > AUTOBET_WINDOW_MAX_INCLUSIVE
        {
            return false;
        }
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        if run.state.bets_placed >= run.config.stake_ceiling {
            info!(
                bets_placed = run.state.bets_placed,
                "stake ceiling reached; autobet disarming"
            );
            self.run = None;
            return false;
        }
        if run.bet_this_cycle {
            return false;
        }
        run.bet_this_cycle = true;
        run.state.bets_placed += 1;
        let intent = BetIntent {
            stake: run.state.current_stake,
            auto_cashout: Some(run.config.auto_cashout),
        };
        debug!(
            stake = intent.stake,
            seconds_remaining, "autobet placing bet"
        );
        self.gateway.submit(intent);
        true
    }

    fn apply_settlement(&mut self, win: bool, amount: f64) {
        let Some(run) = self.run.as_mut() else {
            return;
        };
        let strategy = if win {
            run.config.on_win
        } else {
            run.config.on_lose
        };
        run.state.current_stake = match strategy {
            StakeStrategy::DoubleLastStake => amount * 2.0,
            StakeStrategy::ResetToBase => run.config.base_stake,
        };
    }
}
