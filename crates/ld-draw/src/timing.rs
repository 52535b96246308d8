//! Timing profiles for the reveal animations

use serde::{Deserialize, Serialize};

use ld_core::LotteryConfig;

/// Playback speed preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingProfile {
    /// Configured timing
    Normal,
    /// Everything at a third of normal length
    Turbo,
    /// Zero delays; callbacks still run in order
    Instant,
    /// Arbitrary multiplier applied through [`DrawTiming::scaled`]
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Delays driving the grid and slot reveals (all in ms)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawTiming {
    pub profile: TimingProfile,

    /// Delay after the first grid highlight
    pub step_delay_start_ms: f64,

    /// How much faster each subsequent grid step gets
    pub step_delay_decrement_ms: f64,

    /// Grid steps never get faster than this
    pub step_delay_floor_ms: f64,

    /// Time before the first reel locks
    pub reel_spin_duration_ms: f64,

    /// Gap between consecutive reel locks
    pub reel_stop_stagger_ms: f64,

    /// Period of the repeating spin cue while reels turn
    pub spin_cue_interval_ms: f64,

    /// Slot result shows this long after `reel_spin_duration_ms`
    pub settle_grace_ms: f64,
}

impl DrawTiming {
    /// Normal timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            step_delay_start_ms: 200.0,
            step_delay_decrement_ms: 10.0,
            step_delay_floor_ms: 50.0,
            reel_spin_duration_ms: 3000.0,
            reel_stop_stagger_ms: 500.0,
            spin_cue_interval_ms: 100.0,
            settle_grace_ms: 1000.0,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            ..Self::normal().scaled(1.0 / 3.0)
        }
    }

    /// No waiting at all, for headless runs
    pub fn instant() -> Self {
        Self {
            profile: TimingProfile::Instant,
            ..Self::normal().scaled(0.0)
        }
    }

    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal | TimingProfile::Custom => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Instant => Self::instant(),
        }
    }

    /// Normal timing with the slot spin length taken from config
    pub fn from_config(config: &LotteryConfig) -> Self {
        Self {
            reel_spin_duration_ms: config.slot.spin_duration_ms,
            ..Self::normal()
        }
    }

    /// Scale every delay by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 1.0 };
        Self {
            profile: TimingProfile::Custom,
            step_delay_start_ms: self.step_delay_start_ms * factor,
            step_delay_decrement_ms: self.step_delay_decrement_ms * factor,
            step_delay_floor_ms: self.step_delay_floor_ms * factor,
            reel_spin_duration_ms: self.reel_spin_duration_ms * factor,
            reel_stop_stagger_ms: self.reel_stop_stagger_ms * factor,
            spin_cue_interval_ms: self.spin_cue_interval_ms * factor,
            settle_grace_ms: self.settle_grace_ms * factor,
        }
    }

    /// Delay after grid step `step` (0-based): max(floor, start − decrement·step)
    pub fn step_delay(&self, step: usize) -> f64 {
        (self.step_delay_start_ms - self.step_delay_decrement_ms * step as f64)
            .max(self.step_delay_floor_ms)
    }

    /// Offset of every highlight from the first one, plus the settle offset
    ///
    /// Returns `path_len + 1` values; the last is when the result shows.
    pub fn grid_timeline(&self, path_len: usize) -> Vec<f64> {
        let mut at = 0.0;
        let mut out = Vec::with_capacity(path_len + 1);
        out.push(at);
        for step in 0..path_len {
            at += self.step_delay(step);
            out.push(at);
        }
        out
    }

    /// Offset at which reel `reel` locks
    pub fn reel_stop_at(&self, reel: usize) -> f64 {
        self.reel_spin_duration_ms + reel as f64 * self.reel_stop_stagger_ms
    }

    /// Offset at which a slot draw settles
    ///
    /// Never before the last reel has locked.
    pub fn slot_settle_at(&self, reel_count: usize) -> f64 {
        let grace = self.reel_spin_duration_ms + self.settle_grace_ms;
        if reel_count == 0 {
            return grace;
        }
        grace.max(self.reel_stop_at(reel_count - 1))
    }
}

impl Default for DrawTiming {
    fn default() -> Self {
        Self::normal()
    }
}
