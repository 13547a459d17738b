//! Round-state tracking.
//!
//! [`RoundStateTracker`] maintains the single local mirror of the current
//! round — phase, countdown, multiplier, and the two server-controlled
//! action flags — driven exclusively by inbound gateway notifications. It
//! is the only component that mutates [`RoundState`]; everything else reads
//! through a [`RoundStateHandle`] or reacts to the [`RoundEvent`] stream.
//!
//! Stale or redundant input is suppressed here so downstream consumers
//! never see it: a multiplier below the current value, a tick within
//! epsilon of it, or a countdown repeating the current value.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;
use tracing::{debug, warn};
use updraft_types::{LiveBet, Notification, RoundPhase, RoundState, MULTIPLIER_EPSILON};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change events fanned out to the animation clock, the autobet controller,
/// and the UI. One event per accepted mutation (plus the relayed
/// notifications that never touch state: settlements, live bets, warnings).
#[derive(Clone, Debug, PartialEq)]
pub enum RoundEvent {
    /// A fresh countdown sequence began: the tracker entered `Countdown`,
    /// or the reported value jumped upward mid-sequence.
    CountdownStarted { seconds_remaining: u32 },
    /// The running countdown decreased.
    CountdownTick { seconds_remaining: u32 },
    RoundStarted,
    MultiplierChanged { multiplier: f64 },
    RoundEnded,
    BetAcceptanceChanged { open: bool },
    CashoutAllowanceChanged { allowed: bool },
    /// The player's own bet settled.
    BetSettled { win: bool, amount: f64 },
    /// The public bet list for the current round changed.
    LiveBetsChanged { users: Vec<LiveBet> },
    /// Server-reported error, surfaced as a transient notice.
    Warning { message: String },
    /// The notification stream ended; the game is no longer active.
    ChannelClosed,
}

/// Read-only view of the tracker-owned round state.
#[derive(Clone)]
pub struct RoundStateHandle {
    inner: Arc<Mutex<RoundState>>,
}

impl RoundStateHandle {
    pub fn snapshot(&self) -> RoundState {
        self.inner.lock().unwrap().clone()
    }

    pub fn bet_acceptance_open(&self) -> bool {
        self.inner.lock().unwrap().bet_acceptance_open
    }

    pub fn cashout_allowed(&self) -> bool {
        self.inner.lock().unwrap().cashout_allowed
    }

    /// The current multiplier, if a round is running.
    pub fn multiplier(&self) -> Option<f64> {
        self.inner.lock().unwrap().phase.multiplier()
    }
}

/// Sole owner and mutator of [`RoundState`].
pub struct RoundStateTracker {
    state: Arc<Mutex<RoundState>>,
    events: broadcast::Sender<RoundEvent>,
}

impl Default for RoundStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundStateTracker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(RoundState::default())),
            events,
        }
    }

    /// Read-only handle to the round state.
    pub fn handle(&self) -> RoundStateHandle {
        RoundStateHandle {
            inner: self.state.clone(),
        }
    }

    /// Subscribe to the change-event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundEvent> {
        self.events.subscribe()
    }

    /// Apply one inbound notification. Returns the event that was emitted,
    /// or `None` when the notification was redundant or stale.
    pub fn apply(&self, notification: &Notification) -> Option<RoundEvent> {
        let event = {
            let mut state = self.state.lock().unwrap();
            Self::transition(&mut state, notification)
        };
        if let Some(event) = &event {
            let _ = self.events.send(event.clone());
        }
        event
    }

    /// Signal that the notification stream ended. State is left as-is; the
    /// event tells automation and the UI that the game is no longer active.
    pub fn close(&self) -> RoundEvent {
        let event = RoundEvent::ChannelClosed;
        let _ = self.events.send(event.clone());
        event
    }

    fn transition(state: &mut RoundState, notification: &Notification) -> Option<RoundEvent> {
        match notification {
            Notification::Countdown { time } => match state.phase {
                RoundPhase::Countdown { seconds_remaining } if seconds_remaining == *time => {
                    debug!(time, "redundant countdown tick suppressed");
                    None
                }
                RoundPhase::Countdown { seconds_remaining } if *time < seconds_remaining => {
                    state.phase = RoundPhase::Countdown {
                        seconds_remaining: *time,
                    };
                    Some(RoundEvent::CountdownTick {
                        seconds_remaining: *time,
                    })
                }
                _ => {
                    // Entering `Countdown` from another phase, or the value
                    // jumped upward: a new round cycle begins and all
                    // round-scoped state is reset.
                    state.phase = RoundPhase::Countdown {
                        seconds_remaining: *time,
                    };
                    state.cashout_allowed = false;
                    Some(RoundEvent::CountdownStarted {
                        seconds_remaining: *time,
                    })
                }
            },
            Notification::RoundStart { betting_open } => {
                state.phase = RoundPhase::Running { multiplier: 1.0 };
                state.bet_acceptance_open = *betting_open;
                Some(RoundEvent::RoundStarted)
            }
            Notification::MultiplierTick { multiplier } => {
                let current = match state.phase {
                    RoundPhase::Running { multiplier } => multiplier,
                    _ => {
                        debug!(multiplier, "multiplier tick outside running phase ignored");
                        return None;
                    }
                };
                if *multiplier < current {
                    warn!(multiplier, current, "stale multiplier tick ignored");
                    return None;
                }
                if (*multiplier - current).abs() <= MULTIPLIER_EPSILON {
                    return None;
                }
                state.phase = RoundPhase::Running {
                    multiplier: *multiplier,
                };
                Some(RoundEvent::MultiplierChanged {
                    multiplier: *multiplier,
                })
            }
            Notification::RoundEnd => {
                // Cash-out closes unconditionally, even on a duplicate end.
                state.cashout_allowed = false;
                if state.phase == RoundPhase::Ended {
                    debug!("duplicate round end suppressed");
                    return None;
                }
                state.phase = RoundPhase::Ended;
                Some(RoundEvent::RoundEnded)
            }
            Notification::BetAcceptance { open } => {
                if state.bet_acceptance_open == *open {
                    return None;
                }
                state.bet_acceptance_open = *open;
                Some(RoundEvent::BetAcceptanceChanged { open: *open })
            }
            Notification::CashoutAllowance { allowed } => {
                if state.cashout_allowed == *allowed {
                    return None;
                }
                state.cashout_allowed = *allowed;
                Some(RoundEvent::CashoutAllowanceChanged { allowed: *allowed })
            }
            Notification::BetResult { win, amount } => Some(RoundEvent::BetSettled {
                win: *win,
                amount: *amount,
            }),
            Notification::UserList { users } => Some(RoundEvent::LiveBetsChanged {
                users: users.clone(),
            }),
            Notification::Error { message } => {
                warn!(%message, "server reported an error");
                Some(RoundEvent::Warning {
                    message: message.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn countdown(time: u32) -> Notification {
        Notification::Countdown { time }
    }

    fn tick(multiplier: f64) -> Notification {
        Notification::MultiplierTick { multiplier }
    }

    #[test]
    fn test_countdown_sequence_ticks_down() {
        let tracker = RoundStateTracker::new();
        assert_eq!(
            tracker.apply(&countdown(10)),
            Some(RoundEvent::CountdownStarted {
                seconds_remaining: 10
            })
        );
        assert_eq!(
            tracker.apply(&countdown(9)),
            Some(RoundEvent::CountdownTick {
                seconds_remaining: 9
            })
        );
        assert_eq!(
            tracker.handle().snapshot().phase,
            RoundPhase::Countdown {
                seconds_remaining: 9
            }
        );
    }

    #[test]
    fn test_repeated_countdown_value_is_suppressed() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&countdown(5));
        assert_eq!(tracker.apply(&countdown(5)), None);
    }

    #[test]
    fn test_countdown_jump_up_starts_new_cycle() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&countdown(3));
        assert_eq!(
            tracker.apply(&countdown(10)),
            Some(RoundEvent::CountdownStarted {
                seconds_remaining: 10
            })
        );
    }

    #[test]
    fn test_countdown_during_running_resets_round_scoped_state() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&Notification::RoundStart { betting_open: false });
        tracker.apply(&Notification::CashoutAllowance { allowed: true });
        assert!(tracker.handle().cashout_allowed());

        // A countdown while running is the start of the next round cycle.
        let event = tracker.apply(&countdown(10));
        assert_eq!(
            event,
            Some(RoundEvent::CountdownStarted {
                seconds_remaining: 10
            })
        );
        let state = tracker.handle().snapshot();
        assert_eq!(
            state.phase,
            RoundPhase::Countdown {
                seconds_remaining: 10
            }
        );
        assert!(!state.cashout_allowed);
    }

    #[test]
    fn test_multiplier_is_non_decreasing_within_a_round() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&Notification::RoundStart { betting_open: false });

        assert_eq!(
            tracker.apply(&tick(1.10)),
            Some(RoundEvent::MultiplierChanged { multiplier: 1.10 })
        );
        // A late-arriving lower tick leaves the multiplier untouched.
        assert_eq!(tracker.apply(&tick(1.05)), None);
        assert_eq!(tracker.handle().multiplier(), Some(1.10));

        assert_eq!(
            tracker.apply(&tick(1.23)),
            Some(RoundEvent::MultiplierChanged { multiplier: 1.23 })
        );
    }

    #[test]
    fn test_near_identical_multiplier_tick_is_suppressed() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&Notification::RoundStart { betting_open: false });
        tracker.apply(&tick(1.50));
        assert_eq!(tracker.apply(&tick(1.505)), None);
        assert_eq!(tracker.handle().multiplier(), Some(1.50));
    }

    #[test]
    fn test_multiplier_tick_outside_running_is_ignored() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&countdown(5));
        assert_eq!(tracker.apply(&tick(1.40)), None);
        assert_eq!(
            tracker.handle().snapshot().phase,
            RoundPhase::Countdown {
                seconds_remaining: 5
            }
        );
    }

    #[test]
    fn test_round_end_closes_cashout_unconditionally() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&Notification::RoundStart { betting_open: false });
        tracker.apply(&Notification::CashoutAllowance { allowed: true });

        assert_eq!(
            tracker.apply(&Notification::RoundEnd),
            Some(RoundEvent::RoundEnded)
        );
        let state = tracker.handle().snapshot();
        assert_eq!(state.phase, RoundPhase::Ended);
        assert!(!state.cashout_allowed);

        // Duplicate end is suppressed.
        assert_eq!(tracker.apply(&Notification::RoundEnd), None);
    }

    #[test]
    fn test_action_flags_are_independent_of_phase() {
        let tracker = RoundStateTracker::new();
        assert_eq!(
            tracker.apply(&Notification::BetAcceptance { open: true }),
            Some(RoundEvent::BetAcceptanceChanged { open: true })
        );
        // Unchanged flag emits nothing.
        assert_eq!(tracker.apply(&Notification::BetAcceptance { open: true }), None);

        tracker.apply(&Notification::RoundStart { betting_open: false });
        assert_eq!(
            tracker.apply(&Notification::CashoutAllowance { allowed: true }),
            Some(RoundEvent::CashoutAllowanceChanged { allowed: true })
        );
        assert!(tracker.handle().cashout_allowed());
    }

    #[test]
    fn test_server_error_is_relayed_without_state_change() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&countdown(4));
        let before = tracker.handle().snapshot();
        let event = tracker.apply(&Notification::Error {
            message: "busy".to_string(),
        });
        assert_eq!(
            event,
            Some(RoundEvent::Warning {
                message: "busy".to_string()
            })
        );
        assert_eq!(tracker.handle().snapshot(), before);
    }

    #[test]
    fn test_full_round_scenario_phases_in_order() {
        let tracker = RoundStateTracker::new();
        let mut subscription = tracker.subscribe();

        for time in (0..=10).rev() {
            tracker.apply(&countdown(time));
        }
        tracker.apply(&Notification::RoundStart { betting_open: false });
        for multiplier in [1.00, 1.05, 1.23, 1.48, 1.90] {
            tracker.apply(&tick(multiplier));
        }
        tracker.apply(&Notification::RoundEnd);

        let mut starts = 0;
        let mut running = 0;
        let mut ends = 0;
        let mut order = Vec::new();
        while let Ok(event) = subscription.try_recv() {
            match event {
                RoundEvent::CountdownStarted { .. } => {
                    starts += 1;
                    order.push("countdown");
                }
                RoundEvent::RoundStarted => {
                    running += 1;
                    order.push("running");
                }
                RoundEvent::RoundEnded => {
                    ends += 1;
                    order.push("ended");
                }
                _ => {}
            }
        }
        assert_eq!((starts, running, ends), (1, 1, 1));
        assert_eq!(order, vec!["countdown", "running", "ended"]);
        assert_eq!(tracker.handle().snapshot().phase, RoundPhase::Ended);
    }

    #[test]
    fn test_round_start_resets_multiplier_after_ended_round() {
        let tracker = RoundStateTracker::new();
        tracker.apply(&Notification::RoundStart { betting_open: false });
        tracker.apply(&tick(3.5));
        tracker.apply(&Notification::RoundEnd);

        tracker.apply(&Notification::RoundStart { betting_open: true });
        let state = tracker.handle().snapshot();
        assert_eq!(state.phase, RoundPhase::Running { multiplier: 1.0 });
        assert!(state.bet_acceptance_open);
    }
}
