//! Presentation collaborators
//!
//! A draw session decides *what* happens and *when*; an [`Animator`] and a
//! [`SoundPlayer`] make it visible and audible. Both are fire-and-forget.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use ld_core::SoundConfig;
use ld_state::UserIdentity;

use crate::effects::ConfettiBurst;
use crate::event::DrawResult;

/// Short sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// Grid step or reel tick
    Spin,
    /// Result revealed
    Win,
    /// Button press or reel lock
    Click,
    /// Settle fanfare
    Celebration,
}

impl Cue {
    pub const ALL: [Cue; 4] = [Cue::Spin, Cue::Win, Cue::Click, Cue::Celebration];

    pub fn name(&self) -> &'static str {
        match self {
            Cue::Spin => "spin",
            Cue::Win => "win",
            Cue::Click => "click",
            Cue::Celebration => "celebration",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cue| cue.name() == name)
    }
}

/// Plays cues
pub trait SoundPlayer {
    fn play_cue(&self, cue: Cue);
}

impl<P: SoundPlayer + ?Sized> SoundPlayer for Rc<P> {
    fn play_cue(&self, cue: Cue) {
        (**self).play_cue(cue)
    }
}

/// Drives the visible reveal
pub trait Animator {
    /// Move the grid highlight to `index`
    fn highlight_cell(&self, index: usize);

    /// Reel `reel` should come to rest on `target_row` after `at_delay_ms`
    fn schedule_reel_stop(&self, reel: usize, target_row: usize, at_delay_ms: f64);

    /// Disable or re-enable the draw trigger
    fn set_busy(&self, _busy: bool) {}

    fn show_result(&self, _result: &DrawResult, _user: Option<&UserIdentity>) {}

    fn celebrate(&self, _burst: &ConfettiBurst) {}
}

impl<A: Animator + ?Sized> Animator for Rc<A> {
    fn highlight_cell(&self, index: usize) {
        (**self).highlight_cell(index)
    }

    fn schedule_reel_stop(&self, reel: usize, target_row: usize, at_delay_ms: f64) {
        (**self).schedule_reel_stop(reel, target_row, at_delay_ms)
    }

    fn set_busy(&self, busy: bool) {
        (**self).set_busy(busy)
    }

    fn show_result(&self, result: &DrawResult, user: Option<&UserIdentity>) {
        (**self).show_result(result, user)
    }

    fn celebrate(&self, burst: &ConfettiBurst) {
        (**self).celebrate(burst)
    }
}

// ============ Headless implementations ============

/// Draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimator;

impl Animator for NullAnimator {
    fn highlight_cell(&self, _index: usize) {}
    fn schedule_reel_stop(&self, _reel: usize, _target_row: usize, _at_delay_ms: f64) {}
}

/// Plays nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSoundPlayer;

impl SoundPlayer for SilentSoundPlayer {
    fn play_cue(&self, _cue: Cue) {}
}

/// Narrates the reveal through `log`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAnimator;

impl Animator for LogAnimator {
    fn highlight_cell(&self, index: usize) {
        log::info!("highlight cell {}", index);
    }

    fn schedule_reel_stop(&self, reel: usize, target_row: usize, at_delay_ms: f64) {
        log::info!("reel {} will stop on row {} in {:.0}ms", reel, target_row, at_delay_ms);
    }

    fn set_busy(&self, busy: bool) {
        log::debug!("trigger busy = {}", busy);
    }

    fn show_result(&self, result: &DrawResult, user: Option<&UserIdentity>) {
        match user {
            Some(user) => log::info!(
                "result: {} {} for {} ({})",
                result.prize.name,
                result.prize.amount,
                user.name,
                user.masked_phone()
            ),
            None => log::info!("result: {} {}", result.prize.name, result.prize.amount),
        }
    }

    fn celebrate(&self, burst: &ConfettiBurst) {
        log::info!("confetti: {} pieces over {:.0}ms", burst.len(), burst.duration_ms());
    }
}

/// Logs cues instead of playing them
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSoundPlayer;

impl SoundPlayer for LogSoundPlayer {
    fn play_cue(&self, cue: Cue) {
        log::debug!("cue: {}", cue.name());
    }
}

// ============ Gated Sound ============

/// Mutes an inner player per config and the user's toggle
pub struct GatedSoundPlayer {
    inner: Box<dyn SoundPlayer>,
    enabled_by_config: bool,
    volume: f32,
    user_enabled: Cell<bool>,
}

impl GatedSoundPlayer {
    pub fn new(inner: Box<dyn SoundPlayer>, config: &SoundConfig) -> Self {
        Self {
            inner,
            enabled_by_config: config.enabled,
            volume: config.volume.clamp(0.0, 1.0),
            user_enabled: Cell::new(true),
        }
    }

    /// Flip the user toggle; returns whether sound is now on
    pub fn toggle(&self) -> bool {
        let on = !self.user_enabled.get();
        self.user_enabled.set(on);
        log::info!("Sound {}", if on { "on" } else { "off" });
        self.is_enabled()
    }

    pub fn set_user_enabled(&self, on: bool) {
        self.user_enabled.set(on);
    }

    /// Whether cues currently reach the inner player
    pub fn is_enabled(&self) -> bool {
        self.enabled_by_config && self.user_enabled.get()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl SoundPlayer for GatedSoundPlayer {
    fn play_cue(&self, cue: Cue) {
        if self.is_enabled() {
            self.inner.play_cue(cue);
        }
    }
}
