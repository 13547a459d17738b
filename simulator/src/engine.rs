//! The crash-round engine.
//!
//! Deterministic given a seed and a sequence of `tick` deltas: the driver
//! task owns wall-clock time, the engine only counts milliseconds. One
//! round cycle: countdown `N..0` at the countdown cadence with bets open,
//! then a running phase where the multiplier grows exponentially until it
//! reaches the hidden crash point, then a cooldown before the next
//! countdown.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use updraft_types::{
    BetOutcome, LiveBet, Notification, PlayerIdentity, Session, SettledBet,
};

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// First countdown value of each round.
    pub countdown_from: u32,
    /// Cadence of countdown ticks in milliseconds.
    pub countdown_tick_ms: u64,
    /// Cadence of multiplier ticks in milliseconds.
    pub multiplier_tick_ms: u64,
    /// Pause between a crash and the next countdown.
    pub cooldown_ms: u64,
    /// Exponential growth rate: `multiplier = exp(rate * seconds)`.
    pub growth_rate: f64,
    /// Chance that a round crashes at 1.00 before anyone can cash out.
    pub instant_crash_chance: f64,
    pub max_crash: f64,
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            countdown_from: 10,
            countdown_tick_ms: 1_000,
            multiplier_tick_ms: 100,
            cooldown_ms: 2_000,
            growth_rate: 0.08,
            instant_crash_chance: 0.03,
            max_crash: 100.0,
            seed: 42,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            countdown_from: read_u64("UPDRAFT_COUNTDOWN_FROM", defaults.countdown_from as u64)
                as u32,
            countdown_tick_ms: read_u64("UPDRAFT_COUNTDOWN_TICK_MS", defaults.countdown_tick_ms),
            multiplier_tick_ms: read_u64(
                "UPDRAFT_MULTIPLIER_TICK_MS",
                defaults.multiplier_tick_ms,
            ),
            cooldown_ms: read_u64("UPDRAFT_COOLDOWN_MS", defaults.cooldown_ms),
            growth_rate: read_f64("UPDRAFT_GROWTH_RATE", defaults.growth_rate),
            instant_crash_chance: read_f64(
                "UPDRAFT_INSTANT_CRASH_CHANCE",
                defaults.instant_crash_chance,
            ),
            max_crash: read_f64("UPDRAFT_MAX_CRASH", defaults.max_crash),
            seed: read_u64("UPDRAFT_SEED", defaults.seed),
        }
    }

    /// Granularity at which the driver should call [`Engine::tick`].
    pub fn driver_tick_ms(&self) -> u64 {
        self.multiplier_tick_ms
            .min(self.countdown_tick_ms)
            .max(10)
    }
}

fn read_u64(key: &str, fallback: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(fallback)
}

fn read_f64(key: &str, fallback: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.parse::<f64>().ok())
        .unwrap_or(fallback)
}

/// An engine-produced notification plus its routing.
#[derive(Clone, Debug, PartialEq)]
pub enum Outbound {
    Broadcast(Notification),
    Direct {
        user_id: u64,
        notification: Notification,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Countdown,
    Running,
    Cooldown,
}

#[derive(Clone, Debug)]
struct PlacedBet {
    bet_id: u64,
    username: String,
    amount: f64,
    cashed_out: Option<f64>,
}

pub struct Engine {
    config: EngineConfig,
    phase: Phase,
    round_id: u64,
    seconds_remaining: u32,
    countdown_timer_ms: u64,
    multiplier: f64,
    crash_point: f64,
    run_clock_ms: u64,
    multiplier_timer_ms: u64,
    cooldown_timer_ms: u64,
    accepting_bets: bool,
    bets: BTreeMap<u64, PlacedBet>,
    history: HashMap<u64, Vec<SettledBet>>,
    users: HashMap<String, u64>,
    next_user_id: u64,
    bet_seq: u64,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            // Start in an expired cooldown so the first tick opens betting.
            phase: Phase::Cooldown,
            round_id: 1,
            seconds_remaining: 0,
            countdown_timer_ms: 0,
            multiplier: 1.0,
            crash_point: 1.0,
            run_clock_ms: 0,
            multiplier_timer_ms: 0,
            cooldown_timer_ms: 0,
            accepting_bets: false,
            bets: BTreeMap::new(),
            history: HashMap::new(),
            users: HashMap::new(),
            next_user_id: 0,
            bet_seq: 0,
            rng: StdRng::seed_from_u64(config.seed),
        }
    }

    /// Register or look up a player and mint a session token.
    pub fn login(&mut self, username: &str) -> Session {
        let user_id = match self.users.get(username) {
            Some(id) => *id,
            None => {
                self.next_user_id += 1;
                self.users.insert(username.to_string(), self.next_user_id);
                self.next_user_id
            }
        };
        let token = format!("tok-{user_id}-{:08x}", self.rng.gen::<u32>());
        Session {
            identity: PlayerIdentity {
                user_id,
                username: username.to_string(),
            },
            token,
        }
    }

    pub fn history_for(&self, user_id: u64) -> Vec<SettledBet> {
        self.history.get(&user_id).cloned().unwrap_or_default()
    }

    /// Advance the engine by `delta_ms` of wall-clock time.
    pub fn tick(&mut self, delta_ms: u64) -> Vec<Outbound> {
        let mut out = Vec::new();
        match self.phase {
            Phase::Cooldown => {
                if self.cooldown_timer_ms > delta_ms {
                    self.cooldown_timer_ms -= delta_ms;
                } else {
                    self.begin_countdown(&mut out);
                }
            }
            Phase::Countdown => {
                self.countdown_timer_ms += delta_ms;
                while self.phase == Phase::Countdown
                    && self.countdown_timer_ms >= self.config.countdown_tick_ms
                {
                    self.countdown_timer_ms -= self.config.countdown_tick_ms;
                    if self.seconds_remaining == 0 {
                        self.begin_round(&mut out);
                    } else {
                        self.seconds_remaining -= 1;
                        out.push(Outbound::Broadcast(Notification::Countdown {
                            time: self.seconds_remaining,
                        }));
                    }
                }
            }
            Phase::Running => {
                self.multiplier_timer_ms += delta_ms;
                while self.phase == Phase::Running
                    && self.multiplier_timer_ms >= self.config.multiplier_tick_ms
                {
                    self.multiplier_timer_ms -= self.config.multiplier_tick_ms;
                    self.run_clock_ms += self.config.multiplier_tick_ms;
                    let seconds = self.run_clock_ms as f64 / 1_000.0;
                    let next = round2((self.config.growth_rate * seconds).exp());
                    if next >= self.crash_point {
                        self.crash(&mut out);
                    } else if next > self.multiplier {
                        self.multiplier = next;
                        out.push(Outbound::Broadcast(Notification::MultiplierTick {
                            multiplier: next,
                        }));
                    }
                }
            }
        }
        out
    }

    /// Accept a bet for the upcoming round.
    pub fn place_bet(&mut self, user_id: u64, username: &str, amount: f64) -> Vec<Outbound> {
        let mut out = Vec::new();
        if !self.accepting_bets {
            out.push(direct_error(user_id, "betting is closed"));
            return out;
        }
        if !(amount > 0.0) {
            out.push(direct_error(user_id, "invalid bet amount"));
            return out;
        }
        if self.bets.contains_key(&user_id) {
            out.push(direct_error(user_id, "bet already placed for this round"));
            return out;
        }
        self.bet_seq += 1;
        self.bets.insert(
            user_id,
            PlacedBet {
                bet_id: self.bet_seq,
                username: username.to_string(),
                amount,
                cashed_out: None,
            },
        );
        out.push(self.live_bets());
        out
    }

    /// Lock in the current multiplier for the player's active bet.
    pub fn cash_out(&mut self, user_id: u64) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.phase != Phase::Running {
            out.push(direct_error(user_id, "no round in progress"));
            return out;
        }
        let multiplier = self.multiplier;
        let Some(bet) = self.bets.get_mut(&user_id) else {
            out.push(direct_error(user_id, "no active bet"));
            return out;
        };
        if bet.cashed_out.is_some() {
            out.push(direct_error(user_id, "already cashed out"));
            return out;
        }
        bet.cashed_out = Some(multiplier);
        let win_amount = round2(bet.amount * multiplier);
        out.push(Outbound::Direct {
            user_id,
            notification: Notification::BetResult {
                win: true,
                amount: win_amount,
            },
        });
        out.push(Outbound::Direct {
            user_id,
            notification: Notification::CashoutAllowance { allowed: false },
        });
        out.push(self.live_bets());
        out
    }

    fn begin_countdown(&mut self, out: &mut Vec<Outbound>) {
        self.phase = Phase::Countdown;
        self.seconds_remaining = self.config.countdown_from;
        self.countdown_timer_ms = 0;
        self.accepting_bets = true;
        out.push(Outbound::Broadcast(Notification::BetAcceptance {
            open: true,
        }));
        out.push(Outbound::Broadcast(Notification::Countdown {
            time: self.seconds_remaining,
        }));
        out.push(self.live_bets());
    }

    fn begin_round(&mut self, out: &mut Vec<Outbound>) {
        self.phase = Phase::Running;
        self.accepting_bets = false;
        self.multiplier = 1.0;
        self.run_clock_ms = 0;
        self.multiplier_timer_ms = 0;
        self.crash_point = self.sample_crash_point();
        info!(
            round_id = self.round_id,
            crash_point = self.crash_point,
            bets = self.bets.len(),
            "round started"
        );
        out.push(Outbound::Broadcast(Notification::BetAcceptance {
            open: false,
        }));
        out.push(Outbound::Broadcast(Notification::RoundStart {
            betting_open: false,
        }));
        for user_id in self.bets.keys().copied().collect::<Vec<_>>() {
            out.push(Outbound::Direct {
                user_id,
                notification: Notification::CashoutAllowance { allowed: true },
            });
        }
    }

    fn crash(&mut self, out: &mut Vec<Outbound>) {
        info!(
            round_id = self.round_id,
            crash_point = self.crash_point,
            "round crashed"
        );
        self.phase = Phase::Cooldown;
        self.cooldown_timer_ms = self.config.cooldown_ms;
        out.push(Outbound::Broadcast(Notification::RoundEnd));

        let created_at = Utc::now();
        let round_label = format!("round-{}", self.round_id);
        for (user_id, bet) in std::mem::take(&mut self.bets) {
            let (outcome, odds, win_amount) = match bet.cashed_out {
                Some(multiplier) => (BetOutcome::Win, multiplier, round2(bet.amount * multiplier)),
                None => (BetOutcome::Lose, 0.0, 0.0),
            };
            if outcome == BetOutcome::Lose {
                out.push(Outbound::Direct {
                    user_id,
                    notification: Notification::BetResult {
                        win: false,
                        amount: bet.amount,
                    },
                });
                out.push(Outbound::Direct {
                    user_id,
                    notification: Notification::CashoutAllowance { allowed: false },
                });
            }
            self.history.entry(user_id).or_default().push(SettledBet {
                id: format!("bet-{}", bet.bet_id),
                created_at,
                round_id: round_label.clone(),
                amount: bet.amount,
                odds,
                win_amount,
                crash_point: self.crash_point,
                result: outcome,
            });
        }
        self.round_id += 1;
    }

    fn live_bets(&self) -> Outbound {
        let users = self
            .bets
            .values()
            .map(|bet| LiveBet {
                id: bet.bet_id,
                username: bet.username.clone(),
                amount: bet.amount,
                cashout_at: bet.cashed_out,
            })
            .collect();
        Outbound::Broadcast(Notification::UserList { users })
    }

    fn sample_crash_point(&mut self) -> f64 {
        if self.rng.gen_bool(self.config.instant_crash_chance) {
            return 1.0;
        }
        // Heavy-tailed, floored at 1.05 so non-instant rounds show a climb.
        let u: f64 = self.rng.gen_range(0.05..1.0);
        round2((1.0 / (1.0 - u * 0.99)).min(self.config.max_crash))
    }
}

fn direct_error(user_id: u64, message: &str) -> Outbound {
    Outbound::Direct {
        user_id,
        notification: Notification::Error {
            message: message.to_string(),
        },
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> EngineConfig {
        EngineConfig {
            countdown_from: 3,
            countdown_tick_ms: 10,
            multiplier_tick_ms: 10,
            cooldown_ms: 20,
            growth_rate: 2.0,
            instant_crash_chance: 0.0,
            max_crash: 3.0,
            seed: 7,
        }
    }

    fn broadcasts(events: &[Outbound]) -> Vec<&Notification> {
        events
            .iter()
            .filter_map(|event| match event {
                Outbound::Broadcast(notification) => Some(notification),
                Outbound::Direct { .. } => None,
            })
            .collect()
    }

    /// Tick until the predicate matches a produced notification, with a
    /// step budget so a broken engine fails instead of spinning.
    fn tick_until(
        engine: &mut Engine,
        step_ms: u64,
        mut pred: impl FnMut(&Notification) -> bool,
    ) -> Vec<Outbound> {
        let mut seen = Vec::new();
        for _ in 0..10_000 {
            let events = engine.tick(step_ms);
            let done = events.iter().any(|event| match event {
                Outbound::Broadcast(notification) => pred(notification),
                Outbound::Direct { notification, .. } => pred(notification),
            });
            seen.extend(events);
            if done {
                return seen;
            }
        }
        panic!("engine never produced the expected notification");
    }

    #[test]
    fn test_first_tick_opens_betting_and_counts_down() {
        let mut engine = Engine::new(fast_config());
        let events = engine.tick(10);
        let notes = broadcasts(&events);
        assert!(notes.contains(&&Notification::BetAcceptance { open: true }));
        assert!(notes.contains(&&Notification::Countdown { time: 3 }));
    }

    #[test]
    fn test_countdown_reaches_zero_then_round_starts() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        let seen = tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundStart { .. })
        });
        let notes = broadcasts(&seen);
        let times: Vec<u32> = notes
            .iter()
            .filter_map(|note| match note {
                Notification::Countdown { time } => Some(*time),
                _ => None,
            })
            .collect();
        assert_eq!(times, vec![2, 1, 0]);
        assert!(notes.contains(&&Notification::BetAcceptance { open: false }));
    }

    #[test]
    fn test_multiplier_grows_monotonically_until_crash() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundStart { .. })
        });
        let seen = tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundEnd)
        });
        let ticks: Vec<f64> = broadcasts(&seen)
            .iter()
            .filter_map(|note| match note {
                Notification::MultiplierTick { multiplier } => Some(*multiplier),
                _ => None,
            })
            .collect();
        assert!(!ticks.is_empty());
        for pair in ticks.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        assert!(*ticks.last().unwrap() <= fast_config().max_crash);
    }

    #[test]
    fn test_bet_rejected_outside_betting_window() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundStart { .. })
        });
        let events = engine.place_bet(1, "Player1", 50.0);
        assert_eq!(
            events,
            vec![Outbound::Direct {
                user_id: 1,
                notification: Notification::Error {
                    message: "betting is closed".to_string()
                },
            }]
        );
    }

    #[test]
    fn test_duplicate_bet_rejected() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        engine.place_bet(1, "Player1", 50.0);
        let events = engine.place_bet(1, "Player1", 25.0);
        assert!(matches!(
            &events[0],
            Outbound::Direct {
                user_id: 1,
                notification: Notification::Error { .. }
            }
        ));
    }

    #[test]
    fn test_cash_out_wins_and_ride_through_loses() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        engine.place_bet(1, "Player1", 50.0);
        engine.place_bet(2, "Player2", 30.0);

        let start = tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundStart { .. })
        });
        // Both bettors are told cash-out is now allowed.
        let allowed: Vec<u64> = start
            .iter()
            .filter_map(|event| match event {
                Outbound::Direct {
                    user_id,
                    notification: Notification::CashoutAllowance { allowed: true },
                } => Some(*user_id),
                _ => None,
            })
            .collect();
        assert_eq!(allowed, vec![1, 2]);

        tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::MultiplierTick { .. })
        });
        let events = engine.cash_out(1);
        let multiplier = engine.multiplier;
        assert!(events.iter().any(|event| matches!(
            event,
            Outbound::Direct {
                user_id: 1,
                notification: Notification::BetResult { win: true, amount },
            } if (*amount - 50.0 * multiplier).abs() < 0.01
        )));

        let seen = tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundEnd)
        });
        // The rider loses their stake.
        assert!(seen.iter().any(|event| matches!(
            event,
            Outbound::Direct {
                user_id: 2,
                notification: Notification::BetResult {
                    win: false,
                    amount,
                },
            } if *amount == 30.0
        )));

        let winner_history = engine.history_for(1);
        assert_eq!(winner_history.len(), 1);
        assert_eq!(winner_history[0].result, BetOutcome::Win);
        assert!(winner_history[0].crash_point > 0.0);

        let loser_history = engine.history_for(2);
        assert_eq!(loser_history.len(), 1);
        assert_eq!(loser_history[0].result, BetOutcome::Lose);
        assert_eq!(loser_history[0].win_amount, 0.0);
    }

    #[test]
    fn test_login_is_stable_per_username() {
        let mut engine = Engine::new(fast_config());
        let first = engine.login("Player1");
        let again = engine.login("Player1");
        let other = engine.login("Player2");
        assert_eq!(first.identity.user_id, again.identity.user_id);
        assert_ne!(first.identity.user_id, other.identity.user_id);
    }

    #[test]
    fn test_next_round_follows_cooldown() {
        let mut engine = Engine::new(fast_config());
        engine.tick(10);
        tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::RoundEnd)
        });
        let seen = tick_until(&mut engine, 10, |note| {
            matches!(note, Notification::Countdown { time: 3 })
        });
        assert!(broadcasts(&seen).contains(&&Notification::BetAcceptance { open: true }));
    }
}
