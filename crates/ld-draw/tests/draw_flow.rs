//! End-to-end draws on a virtual clock

use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;

use ld_core::{DrawVariant, LotteryConfig, Prize, PrizeTable};
use ld_draw::{
    Animator, AppDeps, ConfettiBurst, Cue, DrawEvent, DrawRequest, DrawResult, DrawSession,
    DrawState, DrawTiming, LotteryApp, NoticeKind, Scheduler, ScriptedRandom, SessionDeps,
    SoundPlayer, SystemRandom, VirtualClock, ALREADY_DRAWN_MESSAGE, LOGIN_REQUIRED_MESSAGE,
};
use ld_state::{HistoryStore, MemoryStore, StoredHistory, StoredSession, UserIdentity};

// ═══════════════════════════════════════════════════════════════════════════
// Recording collaborators
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Highlight(usize, f64),
    ReelStop { reel: usize, row: usize, at: f64 },
    Busy(bool, f64),
    Result(String, Option<String>, f64),
    Celebrate(usize),
}

struct Recorder {
    clock: VirtualClock,
    calls: RefCell<Vec<Call>>,
    cues: RefCell<Vec<(Cue, f64)>>,
}

impl Recorder {
    fn new(clock: &VirtualClock) -> Rc<Self> {
        Rc::new(Self {
            clock: clock.clone(),
            calls: RefCell::new(Vec::new()),
            cues: RefCell::new(Vec::new()),
        })
    }

    fn highlights(&self) -> Vec<(usize, f64)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Highlight(cell, at) => Some((*cell, *at)),
                _ => None,
            })
            .collect()
    }

    fn results(&self) -> Vec<(String, Option<String>, f64)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Result(name, user, at) => Some((name.clone(), user.clone(), *at)),
                _ => None,
            })
            .collect()
    }

    fn cue_times(&self, cue: Cue) -> Vec<f64> {
        self.cues
            .borrow()
            .iter()
            .filter(|(c, _)| *c == cue)
            .map(|(_, at)| *at)
            .collect()
    }
}

impl Animator for Recorder {
    fn highlight_cell(&self, index: usize) {
        self.calls.borrow_mut().push(Call::Highlight(index, self.clock.now_ms()));
    }

    fn schedule_reel_stop(&self, reel: usize, target_row: usize, at_delay_ms: f64) {
        self.calls.borrow_mut().push(Call::ReelStop {
            reel,
            row: target_row,
            at: at_delay_ms,
        });
    }

    fn set_busy(&self, busy: bool) {
        self.calls.borrow_mut().push(Call::Busy(busy, self.clock.now_ms()));
    }

    fn show_result(&self, result: &DrawResult, user: Option<&UserIdentity>) {
        self.calls.borrow_mut().push(Call::Result(
            result.prize.name.clone(),
            user.map(|u| u.name.clone()),
            self.clock.now_ms(),
        ));
    }

    fn celebrate(&self, burst: &ConfettiBurst) {
        self.calls.borrow_mut().push(Call::Celebrate(burst.len()));
    }
}

impl SoundPlayer for Recorder {
    fn play_cue(&self, cue: Cue) {
        self.cues.borrow_mut().push((cue, self.clock.now_ms()));
    }
}

struct Harness {
    clock: VirtualClock,
    recorder: Rc<Recorder>,
    history: Rc<StoredHistory<MemoryStore>>,
    session: DrawSession,
}

fn harness(config: &LotteryConfig, rng: Box<dyn ld_draw::RandomSource>) -> Harness {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let history = Rc::new(StoredHistory::open(MemoryStore::new()));
    let session = DrawSession::new(
        config,
        SessionDeps {
            animator: recorder.clone(),
            sound: recorder.clone(),
            scheduler: Rc::new(clock.clone()),
            history: history.clone(),
        },
        rng,
    );
    Harness {
        clock,
        recorder,
        history,
        session,
    }
}

fn slot_config() -> LotteryConfig {
    let mut config = LotteryConfig::default();
    config.system.default_variant = DrawVariant::Slot;
    config
}

// ═══════════════════════════════════════════════════════════════════════════
// Grid
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_grid_reveal_timeline() {
    let config = LotteryConfig::default();
    let h = harness(&config, Box::new(SystemRandom::seeded(7)));
    let events = Rc::new(RefCell::new(Vec::new()));
    let e = Rc::clone(&events);
    h.session.subscribe(move |event| e.borrow_mut().push(event.clone()));

    assert_eq!(h.session.request_draw(), DrawRequest::Started);

    // Step 0 runs synchronously with the request
    let first = h.recorder.highlights();
    assert_eq!(first.len(), 1);
    assert_relative_eq!(first[0].1, 0.0);

    h.clock.run_until_idle();

    let highlights = h.recorder.highlights();
    assert!(!highlights.is_empty() && highlights.len() <= 16);

    // Every highlight lands exactly on the accumulated step delays
    let timing = DrawTiming::from_config(&config);
    let timeline = timing.grid_timeline(highlights.len());
    for (i, (cell, at)) in highlights.iter().enumerate() {
        assert!(*cell < 9);
        assert_relative_eq!(*at, timeline[i]);
    }

    // The last highlight is the winning prize's cell
    let results = h.recorder.results();
    assert_eq!(results.len(), 1);
    let (won, user, shown_at) = &results[0];
    assert!(user.is_none());
    let (last_cell, _) = *highlights.last().unwrap();
    assert_eq!(h.session.board().cells[last_cell].label(), won.as_str());
    assert_relative_eq!(*shown_at, timeline[highlights.len()]);

    // One spin cue per highlight, celebration then win at settle
    assert_eq!(h.recorder.cue_times(Cue::Spin).len(), highlights.len());
    assert_eq!(h.recorder.cue_times(Cue::Click), vec![0.0]);
    let cues: Vec<Cue> = h.recorder.cues.borrow().iter().map(|(c, _)| *c).collect();
    assert_eq!(&cues[cues.len() - 2..], &[Cue::Celebration, Cue::Win]);

    // Event stream brackets the draw
    let events = events.borrow();
    assert_eq!(events.first(), Some(&DrawEvent::StateChanged(DrawState::Selecting)));
    assert!(matches!(events.last(), Some(DrawEvent::Result(r)) if r.prize.name == *won));
    let highlighted = events
        .iter()
        .filter(|e| matches!(e, DrawEvent::CellHighlighted { .. }))
        .count();
    assert_eq!(highlighted, highlights.len());

    assert_eq!(h.history.len(), 1);
    assert_eq!(h.history.list()[0].prize_name, *won);
    assert_eq!(h.session.state(), DrawState::Idle);
}

#[test]
fn test_grid_busy_flag_and_confetti() {
    let h = harness(&LotteryConfig::default(), Box::new(SystemRandom::seeded(8)));
    h.session.request_draw();
    h.clock.run_until_idle();

    let calls = h.recorder.calls.borrow();
    assert!(matches!(calls.first(), Some(Call::Busy(true, _))));
    assert!(matches!(calls.last(), Some(Call::Busy(false, _))));
    assert!(calls.contains(&Call::Celebrate(20)));
}

#[test]
fn test_grid_reentrant_request_ignored() {
    let h = harness(&LotteryConfig::default(), Box::new(SystemRandom::seeded(9)));
    assert!(h.session.request_draw().is_started());

    h.clock.advance(150.0);
    assert_eq!(h.session.state(), DrawState::Animating { step: 0 });
    assert_eq!(h.session.request_draw(), DrawRequest::Ignored);

    h.clock.run_until_idle();
    assert_eq!(h.recorder.results().len(), 1);
    assert_eq!(h.history.len(), 1);
    assert_eq!(h.recorder.cue_times(Cue::Click).len(), 1);
}

#[test]
fn test_weighted_example_end_to_end() {
    let config = LotteryConfig {
        prizes: PrizeTable::new(vec![Prize::new("A", "1", 0.3), Prize::new("B", "2", 0.7)]).unwrap(),
        ..LotteryConfig::default()
    };
    let h = harness(&config, Box::new(ScriptedRandom::constant(0.5)));
    h.session.request_draw();
    h.clock.run_until_idle();
    assert_eq!(h.recorder.results()[0].0, "B");
}

#[test]
fn test_zero_weight_table_lands_on_last() {
    let config = LotteryConfig {
        prizes: PrizeTable::new(vec![
            Prize::new("A", "1", 0.0),
            Prize::new("B", "2", 0.0),
            Prize::new("Thanks for playing", "", 0.0),
        ])
        .unwrap(),
        ..LotteryConfig::default()
    };
    let h = harness(&config, Box::new(SystemRandom::seeded(10)));
    for _ in 0..5 {
        h.session.request_draw();
        h.clock.run_until_idle();
    }
    assert!(h.recorder.results().iter().all(|(name, _, _)| name == "Thanks for playing"));
    assert_eq!(h.history.len(), 5);
}

// ═══════════════════════════════════════════════════════════════════════════
// Slot
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_slot_reel_schedule() {
    // r = 0.2 lands on the third prize of the default table
    let h = harness(&slot_config(), Box::new(ScriptedRandom::constant(0.2)));
    let stops = Rc::new(RefCell::new(Vec::new()));
    let (s, clock) = (Rc::clone(&stops), h.clock.clone());
    h.session.subscribe(move |event| {
        if let DrawEvent::ReelStopped { reel, row } = event {
            s.borrow_mut().push((*reel, *row, clock.now_ms()));
        }
    });

    h.session.request_draw();
    assert!(matches!(h.session.state(), DrawState::Spinning { reels_stopped: 0 }));

    let announced: Vec<Call> = h
        .recorder
        .calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::ReelStop { .. }))
        .cloned()
        .collect();
    assert_eq!(
        announced,
        vec![
            Call::ReelStop { reel: 0, row: 2, at: 3000.0 },
            Call::ReelStop { reel: 1, row: 2, at: 3500.0 },
            Call::ReelStop { reel: 2, row: 2, at: 4000.0 },
        ]
    );

    h.clock.advance(3999.0);
    assert!(h.recorder.results().is_empty());
    assert_eq!(stops.borrow().len(), 2);

    h.clock.advance(1.0);
    assert_eq!(*stops.borrow(), vec![(0, 2, 3000.0), (1, 2, 3500.0), (2, 2, 4000.0)]);
    let results = h.recorder.results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, "3rd Prize");
    assert_relative_eq!(results[0].2, 4000.0);

    // Spin cue repeated every 100ms; the settle at 4000ms was queued first
    // and cancels the tick due at the same instant
    let spins = h.recorder.cue_times(Cue::Spin);
    assert_eq!(spins.len(), 39);
    assert_relative_eq!(spins[0], 100.0);
    assert_relative_eq!(*spins.last().unwrap(), 3900.0);

    h.clock.advance(2000.0);
    assert_eq!(h.recorder.cue_times(Cue::Spin).len(), 39);
    assert_eq!(h.clock.pending(), 0);

    // Request click plus one click per reel lock
    assert_eq!(h.recorder.cue_times(Cue::Click), vec![0.0, 3000.0, 3500.0, 4000.0]);
    assert_eq!(h.history.len(), 1);
    assert_eq!(h.session.state(), DrawState::Idle);
}

#[test]
fn test_slot_turbo_timing() {
    let h = harness(&slot_config(), Box::new(SystemRandom::seeded(11)));
    h.session.set_timing(DrawTiming::normal().scaled(0.5));
    h.session.request_draw();
    h.clock.advance(2000.0);
    assert_eq!(h.recorder.results().len(), 1);
    assert_relative_eq!(h.recorder.results()[0].2, 2000.0);
}

#[test]
fn test_history_once_per_draw() {
    let h = harness(&slot_config(), Box::new(SystemRandom::seeded(12)));
    for n in 1..=3 {
        h.session.request_draw();
        h.session.request_draw();
        h.clock.run_until_idle();
        assert_eq!(h.history.len(), n);
    }
    assert_eq!(h.session.draws_completed(), 3);
}

// ═══════════════════════════════════════════════════════════════════════════
// App gating
// ═══════════════════════════════════════════════════════════════════════════

fn app(clock: &VirtualClock, recorder: &Rc<Recorder>) -> (LotteryApp, Rc<RefCell<Vec<(NoticeKind, String)>>>) {
    app_on(clock, recorder, Rc::new(MemoryStore::new()))
}

/// Page over an existing storage backend, as after a reload
fn app_on(
    clock: &VirtualClock,
    recorder: &Rc<Recorder>,
    storage: Rc<MemoryStore>,
) -> (LotteryApp, Rc<RefCell<Vec<(NoticeKind, String)>>>) {
    let session_store = Rc::new(StoredSession::open(storage));
    let mut app = LotteryApp::new(
        &LotteryConfig::default(),
        AppDeps {
            animator: recorder.clone(),
            sound: Box::new(Rc::clone(recorder)),
            scheduler: Rc::new(clock.clone()),
            history: Rc::new(StoredHistory::open(MemoryStore::new())),
            session_store,
            rng: Box::new(SystemRandom::seeded(13)),
        },
    );
    let notices = Rc::new(RefCell::new(Vec::new()));
    let n = Rc::clone(&notices);
    app.on_notice(move |notice| n.borrow_mut().push((notice.kind, notice.message.clone())));
    (app, notices)
}

#[test]
fn test_app_requires_login() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let (mut app, notices) = app(&clock, &recorder);

    assert_eq!(app.request_draw(), DrawRequest::NotLoggedIn);
    assert_eq!(
        notices.borrow().last(),
        Some(&(NoticeKind::Error, LOGIN_REQUIRED_MESSAGE.to_string()))
    );
    assert!(recorder.cues.borrow().is_empty());
}

#[test]
fn test_app_one_draw_per_identity() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let (mut app, notices) = app(&clock, &recorder);

    assert!(app.submit_login("123", "Li").is_err());
    assert_eq!(notices.borrow()[0].0, NoticeKind::Error);

    app.submit_login("13812345678", "Li").unwrap();
    assert_eq!(
        notices.borrow().last(),
        Some(&(NoticeKind::Success, "Welcome Li! Login successful".to_string()))
    );

    assert!(app.request_draw().is_started());
    clock.run_until_idle();
    assert_eq!(recorder.results()[0].1.as_deref(), Some("Li"));

    let history = app.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].user.as_ref().unwrap().phone, "138****5678");

    assert_eq!(app.request_draw(), DrawRequest::AlreadyDrawn);
    assert_eq!(
        notices.borrow().last(),
        Some(&(NoticeKind::Error, ALREADY_DRAWN_MESSAGE.to_string()))
    );

    app.logout().unwrap();
    assert!(!app.is_logged_in());
    assert!(app.submit_login("13812345678", "Li").is_err());
}

#[test]
fn test_app_draw_survives_reload() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let storage = Rc::new(MemoryStore::new());

    let (mut first, _) = app_on(&clock, &recorder, Rc::clone(&storage));
    first.submit_login("13612345678", "Zhao").unwrap();
    assert!(first.request_draw().is_started());
    clock.run_until_idle();
    drop(first);

    let (mut reloaded, notices) = app_on(&clock, &recorder, storage);
    assert_eq!(reloaded.current_user().map(|u| u.phone.as_str()), Some("13612345678"));
    assert_eq!(reloaded.request_draw(), DrawRequest::AlreadyDrawn);
    assert_eq!(
        notices.borrow().last(),
        Some(&(NoticeKind::Error, ALREADY_DRAWN_MESSAGE.to_string()))
    );
    assert_eq!(recorder.results().len(), 1);
}

#[test]
fn test_app_sound_toggle() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let (mut app, _) = app(&clock, &recorder);

    assert!(app.sound_enabled());
    assert!(!app.toggle_sound());

    app.submit_login("13912345678", "").unwrap();
    app.request_draw();
    clock.run_until_idle();
    assert!(recorder.cues.borrow().is_empty());
    assert_eq!(recorder.results()[0].1.as_deref(), Some("Anonymous"));
}

#[test]
fn test_app_variant_switch() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let (mut app, _) = app(&clock, &recorder);

    assert!(app.set_variant(DrawVariant::Slot));
    app.submit_login("13712345678", "Wang").unwrap();
    app.request_draw();
    assert!(!app.set_variant(DrawVariant::Grid));
    clock.run_until_idle();
    assert!(app.set_variant(DrawVariant::Grid));
    assert_eq!(app.session().variant(), DrawVariant::Grid);
}

#[test]
fn test_app_clear_history() {
    let clock = VirtualClock::new();
    let recorder = Recorder::new(&clock);
    let (mut app, notices) = app(&clock, &recorder);

    app.submit_login("15912345678", "Sun").unwrap();
    app.request_draw();
    clock.run_until_idle();
    assert_eq!(app.history().len(), 1);

    app.clear_history().unwrap();
    assert!(app.history().is_empty());
    assert_eq!(notices.borrow().last().map(|n| n.0), Some(NoticeKind::Info));
}
