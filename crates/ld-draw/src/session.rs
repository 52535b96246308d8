//! Draw session state machine
//!
//! ```text
//! Idle ──request──► Selecting ──► Animating{0} ─delay(0)─► … Animating{n-1}
//!   ▲                    │                                        │ delay(n-1)
//!   │                    └──► Spinning{0} ─reel locks─► Spinning{reels}
//!   │                                                             │
//!   └────────────────────────── Settled ◄─────────────────────────┘
//! ```
//!
//! Every timed transition is a callback handed to the [`Scheduler`]. The
//! session holds its state behind `Rc<RefCell<_>>` and never keeps a borrow
//! while calling out, so animators, sound players and event listeners may
//! call back into the session freely.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use chrono::Utc;

use ld_core::{ConfettiConfig, DrawVariant, LotteryConfig, PrizeTable};
use ld_state::{HistoryRecord, HistoryStore, UserIdentity};

use crate::collab::{Animator, Cue, SoundPlayer};
use crate::effects::ConfettiBurst;
use crate::event::{DrawEvent, DrawRequest, DrawResult, DrawState};
use crate::layout::{slot_reel_labels, GridBoard};
use crate::path::RevealPathPlanner;
use crate::random::RandomSource;
use crate::scheduler::{Scheduler, TaskHandle};
use crate::selector::PrizeSelector;
use crate::timing::DrawTiming;

/// Collaborators a session drives
#[derive(Clone)]
pub struct SessionDeps {
    pub animator: Rc<dyn Animator>,
    pub sound: Rc<dyn SoundPlayer>,
    pub scheduler: Rc<dyn Scheduler>,
    pub history: Rc<dyn HistoryStore>,
}

type Listener = Rc<dyn Fn(&DrawEvent)>;

/// The draw currently being revealed
struct InFlight {
    prize_index: usize,
    /// Grid cell or reel row the reveal lands on
    target: usize,
    variant: DrawVariant,
    user: Option<UserIdentity>,
    path: Vec<usize>,
    spin_cue: Option<TaskHandle>,
    reels_stopped: usize,
}

struct SessionInner {
    table: PrizeTable,
    board: GridBoard,
    variant: DrawVariant,
    timing: DrawTiming,
    reel_count: usize,
    confetti: ConfettiConfig,
    planner: RevealPathPlanner,
    rng: Box<dyn RandomSource>,
    deps: SessionDeps,
    state: DrawState,
    in_flight: Option<InFlight>,
    listeners: Vec<Listener>,
    draws_completed: u64,
}

impl Drop for SessionInner {
    fn drop(&mut self) {
        // One-shot callbacks hold a Weak handle; the repeating spin cue does not
        if let Some(handle) = self.in_flight.take().and_then(|flight| flight.spin_cue) {
            log::debug!("Session dropped mid-spin; stopping spin cue");
            self.deps.scheduler.cancel(handle);
        }
    }
}

/// One draw widget: selects, reveals and records prizes
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct DrawSession {
    inner: Rc<RefCell<SessionInner>>,
}

impl DrawSession {
    pub fn new(config: &LotteryConfig, deps: SessionDeps, rng: Box<dyn RandomSource>) -> Self {
        let variant = config.system.default_variant;
        let limits = config.variants.for_variant(variant);
        if !limits.contains(config.prizes.len()) {
            log::warn!(
                "{} prizes configured; the {} works best with {}-{}",
                config.prizes.len(),
                variant.display_name(),
                limits.min_prizes,
                limits.max_prizes
            );
        }

        let inner = SessionInner {
            table: config.prizes.clone(),
            board: GridBoard::from_table(&config.prizes),
            variant,
            timing: DrawTiming::from_config(config),
            reel_count: config.slot.reel_count,
            confetti: config.animations.confetti.clone(),
            planner: RevealPathPlanner::new(),
            rng,
            deps,
            state: DrawState::Idle,
            in_flight: None,
            listeners: Vec::new(),
            draws_completed: 0,
        };

        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn with_timing(self, timing: DrawTiming) -> Self {
        self.inner.borrow_mut().timing = timing;
        self
    }

    pub fn with_planner(self, planner: RevealPathPlanner) -> Self {
        self.inner.borrow_mut().planner = planner;
        self
    }

    fn upgrade(weak: &Weak<RefCell<SessionInner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    pub fn state(&self) -> DrawState {
        self.inner.borrow().state
    }

    /// True while a draw is in flight
    pub fn is_busy(&self) -> bool {
        !self.state().is_idle()
    }

    pub fn variant(&self) -> DrawVariant {
        self.inner.borrow().variant
    }

    pub fn prizes(&self) -> PrizeTable {
        self.inner.borrow().table.clone()
    }

    pub fn board(&self) -> GridBoard {
        self.inner.borrow().board.clone()
    }

    pub fn reel_labels(&self) -> Vec<Vec<String>> {
        let inner = self.inner.borrow();
        slot_reel_labels(&inner.table, inner.reel_count)
    }

    pub fn timing(&self) -> DrawTiming {
        self.inner.borrow().timing.clone()
    }

    pub fn set_timing(&self, timing: DrawTiming) {
        self.inner.borrow_mut().timing = timing;
    }

    pub fn draws_completed(&self) -> u64 {
        self.inner.borrow().draws_completed
    }

    /// Switch reveal style; refused while a draw is in flight
    pub fn set_variant(&self, variant: DrawVariant) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.state.is_idle() {
            log::debug!("Variant change refused during {:?}", inner.state);
            return false;
        }
        if inner.variant != variant {
            log::info!("Switched to {}", variant.display_name());
            inner.variant = variant;
        }
        true
    }

    // ═══════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════

    pub fn subscribe(&self, listener: impl Fn(&DrawEvent) + 'static) {
        self.inner.borrow_mut().listeners.push(Rc::new(listener));
    }

    pub fn on_state_change(&self, listener: impl Fn(DrawState) + 'static) {
        self.subscribe(move |event| {
            if let DrawEvent::StateChanged(state) = event {
                listener(*state);
            }
        });
    }

    pub fn on_result(&self, listener: impl Fn(&DrawResult) + 'static) {
        self.subscribe(move |event| {
            if let DrawEvent::Result(result) = event {
                listener(result);
            }
        });
    }

    fn emit(&self, event: DrawEvent) {
        let listeners = self.inner.borrow().listeners.clone();
        for listener in listeners {
            listener(&event);
        }
    }

    fn enter(&self, state: DrawState) {
        self.inner.borrow_mut().state = state;
        self.emit(DrawEvent::StateChanged(state));
    }

    fn deps(&self) -> SessionDeps {
        self.inner.borrow().deps.clone()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Draw
    // ═══════════════════════════════════════════════════════════════════

    /// Start an anonymous draw
    pub fn request_draw(&self) -> DrawRequest {
        self.request_draw_as(None)
    }

    /// Start a draw credited to `user`
    ///
    /// The prize is fixed before anything animates. Returns
    /// [`DrawRequest::Ignored`] when a draw is already in flight.
    pub fn request_draw_as(&self, user: Option<UserIdentity>) -> DrawRequest {
        {
            let inner = self.inner.borrow();
            if !inner.state.is_idle() {
                log::debug!("Draw request ignored during {:?}", inner.state);
                return DrawRequest::Ignored;
            }
        }
        self.enter(DrawState::Selecting);

        let deps = self.deps();
        deps.sound.play_cue(Cue::Click);
        deps.animator.set_busy(true);

        let (variant, target) = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;

            let prize_index = PrizeSelector::select_index(&inner.table, inner.rng.as_mut());
            let prize = &inner.table.prizes()[prize_index];
            let variant = inner.variant;
            let (target, path) = match variant {
                DrawVariant::Grid => {
                    let target = inner.board.target_for(&prize.name).unwrap_or(prize_index);
                    let path = inner
                        .planner
                        .plan(inner.board.cell_count(), target, inner.rng.as_mut());
                    (target, path)
                }
                DrawVariant::Slot => (
                    inner.table.position_of(&prize.name).unwrap_or(prize_index),
                    Vec::new(),
                ),
            };

            log::info!(
                "Draw started ({}): {}{}",
                variant.display_name(),
                prize.name,
                user.as_ref().map(|u| format!(" for {}", u.name)).unwrap_or_default()
            );

            inner.in_flight = Some(InFlight {
                prize_index,
                target,
                variant,
                user,
                path,
                spin_cue: None,
                reels_stopped: 0,
            });
            (variant, target)
        };

        match variant {
            DrawVariant::Grid => self.grid_step(0),
            DrawVariant::Slot => self.start_reels(target),
        }
        DrawRequest::Started
    }

    // ───────────────────────────────────────────────────────────────────
    // Grid
    // ───────────────────────────────────────────────────────────────────

    fn grid_step(&self, step: usize) {
        let (cell, is_last, delay) = {
            let inner = self.inner.borrow();
            let Some(flight) = inner.in_flight.as_ref() else {
                return;
            };
            let Some(&cell) = flight.path.get(step) else {
                return;
            };
            (cell, step + 1 == flight.path.len(), inner.timing.step_delay(step))
        };

        self.enter(DrawState::Animating { step });
        let deps = self.deps();
        deps.animator.highlight_cell(cell);
        deps.sound.play_cue(Cue::Spin);
        self.emit(DrawEvent::CellHighlighted { step, cell });
        log::debug!("Grid step {} → cell {} (next in {:.0}ms)", step, cell, delay);

        let weak = Rc::downgrade(&self.inner);
        deps.scheduler.schedule_after(
            delay,
            Box::new(move || {
                if let Some(session) = Self::upgrade(&weak) {
                    if is_last {
                        session.settle();
                    } else {
                        session.grid_step(step + 1);
                    }
                }
            }),
        );
    }

    // ───────────────────────────────────────────────────────────────────
    // Slot
    // ───────────────────────────────────────────────────────────────────

    fn start_reels(&self, row: usize) {
        self.enter(DrawState::Spinning { reels_stopped: 0 });

        let deps = self.deps();
        let (timing, reel_count) = {
            let inner = self.inner.borrow();
            (inner.timing.clone(), inner.reel_count)
        };

        let sound = Rc::clone(&deps.sound);
        let spin_cue = deps.scheduler.schedule_repeating(
            timing.spin_cue_interval_ms,
            Box::new(move || sound.play_cue(Cue::Spin)),
        );
        if let Some(flight) = self.inner.borrow_mut().in_flight.as_mut() {
            flight.spin_cue = Some(spin_cue);
        }

        for reel in 0..reel_count {
            let at = timing.reel_stop_at(reel);
            deps.animator.schedule_reel_stop(reel, row, at);

            let weak = Rc::downgrade(&self.inner);
            deps.scheduler.schedule_after(
                at,
                Box::new(move || {
                    if let Some(session) = Self::upgrade(&weak) {
                        session.reel_locked(reel, row);
                    }
                }),
            );
        }

        let weak = Rc::downgrade(&self.inner);
        deps.scheduler.schedule_after(
            timing.slot_settle_at(reel_count),
            Box::new(move || {
                if let Some(session) = Self::upgrade(&weak) {
                    session.settle();
                }
            }),
        );
    }

    fn reel_locked(&self, reel: usize, row: usize) {
        let reels_stopped = {
            let mut inner = self.inner.borrow_mut();
            let Some(flight) = inner.in_flight.as_mut() else {
                return;
            };
            flight.reels_stopped += 1;
            flight.reels_stopped
        };

        self.deps().sound.play_cue(Cue::Click);
        log::debug!("Reel {} locked on row {}", reel, row);
        self.emit(DrawEvent::ReelStopped { reel, row });
        self.enter(DrawState::Spinning { reels_stopped });
    }

    // ───────────────────────────────────────────────────────────────────
    // Settle
    // ───────────────────────────────────────────────────────────────────

    fn settle(&self) {
        let (flight, prize) = {
            let mut inner = self.inner.borrow_mut();
            let Some(flight) = inner.in_flight.take() else {
                return;
            };
            let prize = inner.table.prizes()[flight.prize_index].clone();
            (flight, prize)
        };

        let deps = self.deps();
        if let Some(handle) = flight.spin_cue {
            deps.scheduler.cancel(handle);
        }
        self.enter(DrawState::Settled);

        let result = DrawResult {
            prize,
            prize_index: flight.prize_index,
            variant: flight.variant,
            timestamp: Utc::now(),
        };
        let user = flight.user.as_ref();

        deps.sound.play_cue(Cue::Celebration);
        deps.animator.show_result(&result, user);
        deps.sound.play_cue(Cue::Win);

        let record = HistoryRecord::for_prize(&result.prize, result.timestamp, user);
        if let Err(e) = deps.history.append(record) {
            log::warn!("Draw result not saved to history: {}", e);
        }

        let burst = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            ConfettiBurst::generate(&inner.confetti, inner.rng.as_mut())
        };
        if !burst.is_empty() {
            deps.animator.celebrate(&burst);
        }

        deps.animator.set_busy(false);
        self.inner.borrow_mut().draws_completed += 1;
        log::info!(
            "Draw settled on {} (target {}): {}",
            flight.variant.display_name(),
            flight.target,
            result.prize.name
        );

        self.enter(DrawState::Idle);
        self.emit(DrawEvent::Result(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{NullAnimator, SilentSoundPlayer};
    use crate::random::{ScriptedRandom, SystemRandom};
    use crate::scheduler::{VirtualClock, MAX_IDLE_RUNS};
    use ld_core::Prize;
    use ld_state::{MemoryStore, StoredHistory};
    use std::cell::Cell;

    fn two_prize_config() -> LotteryConfig {
        LotteryConfig {
            prizes: PrizeTable::new(vec![Prize::new("A", "¥1", 0.3), Prize::new("B", "¥2", 0.7)])
                .unwrap(),
            ..LotteryConfig::default()
        }
    }

    fn session(config: &LotteryConfig, rng: Box<dyn RandomSource>) -> (DrawSession, VirtualClock) {
        let clock = VirtualClock::new();
        let deps = SessionDeps {
            animator: Rc::new(NullAnimator),
            sound: Rc::new(SilentSoundPlayer),
            scheduler: Rc::new(clock.clone()),
            history: Rc::new(StoredHistory::open(MemoryStore::new())),
        };
        (DrawSession::new(config, deps, rng), clock)
    }

    #[test]
    fn test_half_picks_second_prize() {
        let (session, clock) = session(&two_prize_config(), Box::new(ScriptedRandom::constant(0.5)));
        let won = Rc::new(RefCell::new(None));
        let w = Rc::clone(&won);
        session.on_result(move |result| *w.borrow_mut() = Some(result.prize.name.clone()));

        assert_eq!(session.request_draw(), DrawRequest::Started);
        clock.run_until_idle();
        assert_eq!(won.borrow().as_deref(), Some("B"));
    }

    #[test]
    fn test_busy_until_settled() {
        let (session, clock) = session(&LotteryConfig::default(), Box::new(SystemRandom::seeded(1)));
        assert!(!session.is_busy());

        session.request_draw();
        assert!(matches!(session.state(), DrawState::Animating { step: 0 }));
        assert_eq!(session.request_draw(), DrawRequest::Ignored);

        clock.run_until_idle();
        assert_eq!(session.state(), DrawState::Idle);
        assert_eq!(session.draws_completed(), 1);
    }

    #[test]
    fn test_variant_locked_during_draw() {
        let (session, clock) = session(&LotteryConfig::default(), Box::new(SystemRandom::seeded(2)));
        session.request_draw();
        assert!(!session.set_variant(DrawVariant::Slot));
        clock.run_until_idle();
        assert!(session.set_variant(DrawVariant::Slot));
        assert_eq!(session.variant(), DrawVariant::Slot);
    }

    #[test]
    fn test_result_listener_may_draw_again() {
        let (session, clock) = session(&LotteryConfig::default(), Box::new(SystemRandom::seeded(3)));
        let again = session.clone();
        let restarted = Rc::new(Cell::new(false));
        let r = Rc::clone(&restarted);
        session.on_result(move |_| {
            if !r.get() {
                r.set(again.request_draw().is_started());
            }
        });

        session.request_draw();
        clock.run_until_idle();
        assert!(restarted.get());
        assert_eq!(session.draws_completed(), 2);
    }

    #[test]
    fn test_dropped_session_stops_quietly() {
        let (session, clock) = session(&LotteryConfig::default(), Box::new(SystemRandom::seeded(4)));
        session.request_draw();
        drop(session);
        clock.run_until_idle();
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_dropped_slot_session_stops_spin_cue() {
        let (session, clock) = session(&LotteryConfig::default(), Box::new(SystemRandom::seeded(5)));
        assert!(session.set_variant(DrawVariant::Slot));
        session.request_draw();
        clock.advance(1000.0);
        drop(session);

        let ran = clock.run_until_idle();
        assert!(ran < MAX_IDLE_RUNS);
        assert_eq!(clock.pending(), 0);
    }
}
