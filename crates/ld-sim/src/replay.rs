//! Draw timeline replay on a virtual clock

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use ld_core::{DrawVariant, LotteryConfig};
use ld_draw::{
    DrawEvent, DrawSession, DrawTiming, LogAnimator, LogSoundPlayer, RngSource, Scheduler,
    SessionDeps, VirtualClock,
};
use ld_state::{MemoryStore, StoredHistory};

/// One event and when it fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub at_ms: f64,
    pub event: DrawEvent,
}

#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub variant: DrawVariant,
    pub seed: u64,
    /// Multiplier on every delay; 1.0 keeps the configured pacing
    pub time_scale: f64,
    pub draws: usize,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            variant: DrawVariant::Grid,
            seed: 0,
            time_scale: 1.0,
            draws: 1,
        }
    }
}

/// Run `options.draws` back-to-back draws and collect every event
pub fn replay(config: &LotteryConfig, options: &ReplayOptions) -> Vec<TimelineEntry> {
    let clock = VirtualClock::new();
    let scheduler: Rc<dyn Scheduler> = Rc::new(clock.clone());
    let session = DrawSession::new(
        config,
        SessionDeps {
            animator: Rc::new(LogAnimator),
            sound: Rc::new(LogSoundPlayer),
            scheduler: Rc::clone(&scheduler),
            history: Rc::new(StoredHistory::open(MemoryStore::new())),
        },
        Box::new(RngSource::seeded(options.seed)),
    )
    .with_timing(DrawTiming::from_config(config).scaled(options.time_scale));
    session.set_variant(options.variant);

    let timeline = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&timeline);
    session.subscribe(move |event| {
        sink.borrow_mut().push(TimelineEntry {
            at_ms: scheduler.now_ms(),
            event: event.clone(),
        });
    });

    for n in 0..options.draws {
        if !session.request_draw().is_started() {
            log::warn!("Draw {} was not started", n + 1);
            break;
        }
        clock.run_until_idle();
    }

    timeline.take()
}
