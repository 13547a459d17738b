//! The single choke point for outbound bet actions.
//!
//! Every place-bet and cash-out intent — manual or automated — goes through
//! [`BetActionGateway`]. The gateway derives the two UI affordance booleans
//! from the tracker-owned round state and silently drops actions whose
//! guard is false; the server remains the final authority either way.

use std::sync::{Arc, Mutex};

use tracing::debug;
use updraft_types::{BetIntent, Intent, PlayerIdentity};

use crate::connection::IntentSender;
use crate::tracker::RoundStateHandle;

/// Fire-and-forget dispatch of bet actions. Cloneable; clones share the
/// armed auto-cashout target.
#[derive(Clone)]
pub struct BetActionGateway {
    identity: PlayerIdentity,
    intents: IntentSender,
    state: RoundStateHandle,
    auto_cashout: Arc<Mutex<Option<f64>>>,
}

impl BetActionGateway {
    pub fn new(identity: PlayerIdentity, intents: IntentSender, state: RoundStateHandle) -> Self {
        Self {
            identity,
            intents,
            state,
            auto_cashout: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a place-bet action is currently permitted.
    pub fn can_place_bet(&self) -> bool {
        self.state.bet_acceptance_open()
    }

    /// Whether a cash-out action is currently permitted.
    pub fn can_cash_out(&self) -> bool {
        self.state.cashout_allowed()
    }

    /// Submit a bet intent. A no-op while bet acceptance is closed or the
    /// stake is not positive. An `auto_cashout` target arms client-side
    /// cash-out for this bet.
    pub fn submit(&self, intent: BetIntent) {
        self.place_bet(intent.stake, intent.auto_cashout)
    }

    /// See [`BetActionGateway::submit`].
    pub fn place_bet(&self, stake: f64, auto_cashout: Option<f64>) {
        if !self.can_place_bet() {
            debug!(stake, "bet dropped: bet acceptance closed");
            return;
        }
        if !(stake > 0.0) {
            debug!(stake, "bet dropped: non-positive stake");
            return;
        }
        *self.auto_cashout.lock().unwrap() = auto_cashout;
        self.intents.send(Intent::PlaceBet {
            user_id: self.identity.user_id,
            username: self.identity.username.clone(),
            amount: stake,
        });
    }

    /// Submit a cash-out intent at the current multiplier. A no-op while
    /// cash-out is disallowed or no round is running.
    pub fn cash_out(&self) {
        if !self.can_cash_out() {
            debug!("cash-out dropped: not allowed");
            return;
        }
        let Some(multiplier) = self.state.multiplier() else {
            debug!("cash-out dropped: no running multiplier");
            return;
        };
        self.send_cash_out(multiplier);
    }

    /// Drive the armed auto-cashout target; call on every multiplier
    /// change. Fires at most one cash-out per armed bet, and only once
    /// cash-out is actually allowed.
    pub fn observe_multiplier(&self, multiplier: f64) {
        let armed = *self.auto_cashout.lock().unwrap();
        let Some(target) = armed else { return };
        if multiplier < target || !self.can_cash_out() {
            return;
        }
        self.send_cash_out(multiplier);
    }

    /// Clear any armed auto-cashout target at a round boundary.
    pub fn reset_round(&self) {
        *self.auto_cashout.lock().unwrap() = None;
    }

    fn send_cash_out(&self, multiplier: f64) {
        *self.auto_cashout.lock().unwrap() = None;
        self.intents.send(Intent::CashOut {
            user_id: self.identity.user_id,
            multiplier,
        });
    }
}
