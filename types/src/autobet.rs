//! Autobet configuration and run-state bookkeeping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest auto-cashout multiplier the server will honor.
pub const MIN_AUTO_CASHOUT: f64 = 1.01;

/// Lower bound (exclusive) of the countdown window in which automation may
/// place its bet for the upcoming round.
pub const AUTOBET_WINDOW_MIN_EXCLUSIVE: u32 = 1;

/// Upper bound (inclusive) of the countdown betting window.
pub const AUTOBET_WINDOW_MAX_INCLUSIVE: u32 = 8;

/// How the next stake is chosen after a settled bet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeStrategy {
    /// Return to the configured base stake.
    #[serde(rename = "base")]
    ResetToBase,
    /// Double the settled amount.
    #[serde(rename = "double")]
    DoubleLastStake,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AutobetConfigError {
    #[error("base stake must be greater than zero")]
    NonPositiveBaseStake,
    #[error("stake ceiling must be greater than zero")]
    NonPositiveStakeCeiling,
    #[error("auto cashout multiplier must be at least 1.01")]
    AutoCashoutTooLow,
}

/// User-owned automation settings. Mutable only while automation is idle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutobetConfig {
    pub base_stake: f64,
    /// Maximum number of automated bets before automation self-stops.
    pub stake_ceiling: u32,
    pub auto_cashout: f64,
    pub on_win: StakeStrategy,
    pub on_lose: StakeStrategy,
}

impl AutobetConfig {
    pub fn validate(&self) -> Result<(), AutobetConfigError> {
        if !(self.base_stake > 0.0) {
            return Err(AutobetConfigError::NonPositiveBaseStake);
        }
        if self.stake_ceiling == 0 {
            return Err(AutobetConfigError::NonPositiveStakeCeiling);
        }
        if !(self.auto_cashout >= MIN_AUTO_CASHOUT) {
            return Err(AutobetConfigError::AutoCashoutTooLow);
        }
        Ok(())
    }
}

/// Live automation bookkeeping. Exists only while automation is active.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutobetRunState {
    pub bets_placed: u32,
    pub current_stake: f64,
    pub active: bool,
}

impl AutobetRunState {
    pub fn start(config: &AutobetConfig) -> Self {
        Self {
            bets_placed: 0,
            current_stake: config.base_stake,
            active: true,
        }
    }
}

/// A single bet decision, created by a human action or by the autobet
/// controller and consumed immediately by the bet gateway.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BetIntent {
    pub stake: f64,
    pub auto_cashout: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AutobetConfig {
        AutobetConfig {
            base_stake: 50.0,
            stake_ceiling: 3,
            auto_cashout: 2.0,
            on_win: StakeStrategy::ResetToBase,
            on_lose: StakeStrategy::ResetToBase,
        }
    }

    #[test]
    fn test_validate_accepts_sane_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_positive_base_stake() {
        let bad = AutobetConfig {
            base_stake: 0.0,
            ..config()
        };
        assert_eq!(
            bad.validate(),
            Err(AutobetConfigError::NonPositiveBaseStake)
        );
        let negative = AutobetConfig {
            base_stake: -1.0,
            ..config()
        };
        assert_eq!(
            negative.validate(),
            Err(AutobetConfigError::NonPositiveBaseStake)
        );
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let bad = AutobetConfig {
            stake_ceiling: 0,
            ..config()
        };
        assert_eq!(
            bad.validate(),
            Err(AutobetConfigError::NonPositiveStakeCeiling)
        );
    }

    #[test]
    fn test_validate_auto_cashout_boundary() {
        // 1.0 is rejected, the 1.01 minimum is accepted.
        let too_low = AutobetConfig {
            auto_cashout: 1.0,
            ..config()
        };
        assert_eq!(too_low.validate(), Err(AutobetConfigError::AutoCashoutTooLow));

        let minimum = AutobetConfig {
            auto_cashout: MIN_AUTO_CASHOUT,
            ..config()
        };
        assert!(minimum.validate().is_ok());
    }

    #[test]
    fn test_run_state_starts_at_base_stake() {
        let run = AutobetRunState::start(&config());
        assert_eq!(run.bets_placed, 0);
        assert_eq!(run.current_stake, 50.0);
        assert!(run.active);
    }

    #[test]
    fn test_strategy_wire_names() {
        assert_eq!(
            serde_json::to_string(&StakeStrategy::ResetToBase).unwrap(),
            "\"base\""
        );
        assert_eq!(
            serde_json::to_string(&StakeStrategy::DoubleLastStake).unwrap(),
            "\"double\""
        );
    }
}
