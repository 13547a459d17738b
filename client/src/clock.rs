//! Animation timing.
//!
//! [`AnimationClock`] turns wall-clock time into the continuous progress
//! ratio that drives the trajectory rendering between coarse server
//! multiplier ticks. It is a pure state machine: every method takes `now`
//! explicitly, so behavior is deterministic under test, and the caller owns
//! the sampling cadence (the terminal front end samples on its
//! [`SAMPLE_INTERVAL`] tick). None of this delays betting logic; the decay
//! choreography is cosmetic only.

use std::time::{Duration, Instant};

/// Nominal duration of a full rise, round start to the top of the arc.
pub const NOMINAL_RISE: Duration = Duration::from_secs(12);

/// Cadence at which the renderer samples [`AnimationClock::progress`].
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// How long a frozen trajectory lingers after the round stops before it
/// decays to the rest position, and how long the explosion sprite shows.
pub const REST_DECAY_GRACE: Duration = Duration::from_millis(800);

#[derive(Clone, Copy, Debug)]
enum Basis {
    Idle,
    Running { started_at: Instant },
    Stopped { frozen: f64, stopped_at: Instant },
}

/// Derives a continuously increasing progress ratio in `[0, 1]` from a
/// timing basis that restarts on every round start (and on forced restarts
/// from layout changes), plus the once-per-round explosion latch.
#[derive(Clone, Debug)]
pub struct AnimationClock {
    basis: Basis,
    explosion_threshold: f64,
    exploded_at: Option<Instant>,
}

impl AnimationClock {
    /// `explosion_threshold` is the multiplier at which the one-shot
    /// terminal sequence fires.
    pub fn new(explosion_threshold: f64) -> Self {
        Self {
            basis: Basis::Idle,
            explosion_threshold,
            exploded_at: None,
        }
    }

    /// Begin a fresh timing basis; the previous basis is discarded and the
    /// explosion latch clears. Call on every round start.
    pub fn start(&mut self, now: Instant) {
        self.basis = Basis::Running { started_at: now };
        self.exploded_at = None;
    }

    /// Forced restart after a layout change. Identical semantics to a fresh
    /// start, but only while running; round semantics are untouched.
    pub fn restart(&mut self, now: Instant) {
        if self.is_running() {
            self.start(now);
        }
    }

    /// Stop sampling on leaving the running phase. Progress freezes where
    /// it is, then decays to rest once [`REST_DECAY_GRACE`] elapses.
    pub fn stop(&mut self, now: Instant) {
        if self.is_running() {
            self.basis = Basis::Stopped {
                frozen: self.progress(now),
                stopped_at: now,
            };
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.basis, Basis::Running { .. })
    }

    /// Progress ratio in `[0, 1]`: elapsed time over [`NOMINAL_RISE`],
    /// clamped at 1. Never resets except by a (re)start or the post-stop
    /// decay.
    pub fn progress(&self, now: Instant) -> f64 {
        match self.basis {
            Basis::Idle => 0.0,
            Basis::Running { started_at } => {
                let elapsed = now.saturating_duration_since(started_at);
                (elapsed.as_secs_f64() / NOMINAL_RISE.as_secs_f64()).min(1.0)
            }
            Basis::Stopped { frozen, stopped_at } => {
                if now.saturating_duration_since(stopped_at) < REST_DECAY_GRACE {
                    frozen
                } else {
                    0.0
                }
            }
        }
    }

    /// Feed the latest local multiplier. Returns `true` exactly once per
    /// round: when the multiplier first crosses the explosion threshold
    /// while running. The latch resets only on the next start.
    pub fn observe_multiplier(&mut self, multiplier: f64, now: Instant) -> bool {
        if !self.is_running() || self.exploded_at.is_some() {
            return false;
        }
        if multiplier < self.explosion_threshold {
            return false;
        }
        self.exploded_at = Some(now);
        true
    }

    /// Force the terminal sequence (the crash itself is the terminal
    /// condition when the threshold was never crossed).
    pub fn detonate(&mut self, now: Instant) -> bool {
        if self.exploded_at.is_some() {
            return false;
        }
        self.exploded_at = Some(now);
        true
    }

    pub fn has_exploded(&self) -> bool {
        self.exploded_at.is_some()
    }

    /// Whether the trajectory marker should be drawn.
    pub fn plane_visible(&self) -> bool {
        self.is_running() && !self.has_exploded()
    }

    /// Whether the explosion sprite should be drawn: the grace window right
    /// after the latch fires.
    pub fn explosion_visible(&self, now: Instant) -> bool {
        matches!(self.exploded_at, Some(at) if now.saturating_duration_since(at) < REST_DECAY_GRACE)
    }
}
