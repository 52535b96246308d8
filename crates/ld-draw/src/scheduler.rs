//! Deferred callbacks
//!
//! Draw sessions never sleep; they hand callbacks to a [`Scheduler`]. The
//! browser host backs it with `setTimeout`/`setInterval`, tests and the
//! simulator with [`VirtualClock`], which only moves when told to.

use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;

/// Identifies a scheduled callback for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(pub u64);

/// Single-threaded timer service
pub trait Scheduler {
    /// Milliseconds since the scheduler's epoch
    fn now_ms(&self) -> f64;

    /// Run `task` once, `delay_ms` from now
    fn schedule_after(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> TaskHandle;

    /// Run `task` every `interval_ms` until cancelled
    fn schedule_repeating(&self, interval_ms: f64, task: Box<dyn FnMut()>) -> TaskHandle;

    /// Drop a pending callback; unknown or finished handles are ignored
    fn cancel(&self, handle: TaskHandle);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }

    fn schedule_after(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> TaskHandle {
        (**self).schedule_after(delay_ms, task)
    }

    fn schedule_repeating(&self, interval_ms: f64, task: Box<dyn FnMut()>) -> TaskHandle {
        (**self).schedule_repeating(interval_ms, task)
    }

    fn cancel(&self, handle: TaskHandle) {
        (**self).cancel(handle)
    }
}

// ============ Virtual Clock ============

/// Guard against repeating tasks keeping `run_until_idle` busy forever
pub const MAX_IDLE_RUNS: usize = 100_000;

enum Task {
    Once(Box<dyn FnOnce()>),
    Repeating {
        interval_us: u64,
        run: Box<dyn FnMut()>,
    },
}

#[derive(Default)]
struct ClockState {
    now_us: u64,
    next_seq: u64,
    /// (due, enqueue order, task id)
    queue: BinaryHeap<Reverse<(u64, u64, u64)>>,
    tasks: HashMap<u64, Task>,
    /// Repeating task whose callback is executing right now
    running: Option<u64>,
    running_cancelled: bool,
}

impl ClockState {
    fn push(&mut self, due_us: u64, id: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due_us, seq, id)));
    }

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_seq;
        self.next_seq += 1;
        id
    }
}

fn to_us(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        (ms * 1000.0).round() as u64
    } else {
        0
    }
}

/// Deterministic scheduler driven by explicit `advance` calls
///
/// Time is kept in whole microseconds. Callbacks due at the same instant run
/// in the order they were scheduled. Cloning shares the same clock.
#[derive(Clone, Default)]
pub struct VirtualClock {
    state: Rc<RefCell<ClockState>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live callbacks
    pub fn pending(&self) -> usize {
        self.state.borrow().tasks.len()
    }

    /// Due time of the next live callback, in ms
    pub fn next_due_ms(&self) -> Option<f64> {
        let mut state = self.state.borrow_mut();
        loop {
            let Reverse((due, _, id)) = *state.queue.peek()?;
            if state.tasks.contains_key(&id) {
                return Some(due as f64 / 1000.0);
            }
            state.queue.pop();
        }
    }

    /// Move time forward by `ms`, running everything that falls due
    ///
    /// Returns how many callbacks ran.
    pub fn advance(&self, ms: f64) -> usize {
        let target = self.state.borrow().now_us + to_us(ms);
        let mut ran = 0;
        while self.run_next(Some(target)) {
            ran += 1;
        }
        self.state.borrow_mut().now_us = target;
        ran
    }

    /// Run callbacks until none are left, jumping time forward as needed
    ///
    /// Stops after [`MAX_IDLE_RUNS`] callbacks so a forgotten repeating task
    /// cannot hang the caller.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while ran < MAX_IDLE_RUNS && self.run_next(None) {
            ran += 1;
        }
        if ran == MAX_IDLE_RUNS {
            log::warn!("VirtualClock still busy after {} callbacks", ran);
        }
        ran
    }

    /// Pop and run the earliest live callback due at or before `limit`
    fn run_next(&self, limit: Option<u64>) -> bool {
        let (id, task) = {
            let mut state = self.state.borrow_mut();
            loop {
                let Some(&Reverse((due, _, id))) = state.queue.peek() else {
                    return false;
                };
                if limit.is_some_and(|limit| due > limit) {
                    return false;
                }
                state.queue.pop();
                if let Some(task) = state.tasks.remove(&id) {
                    state.now_us = state.now_us.max(due);
                    break (id, task);
                }
            }
        };

        // The state borrow is released: callbacks may schedule or cancel
        match task {
            Task::Once(run) => run(),
            Task::Repeating { interval_us, mut run } => {
                {
                    let mut state = self.state.borrow_mut();
                    state.running = Some(id);
                    state.running_cancelled = false;
                }
                run();
                let mut state = self.state.borrow_mut();
                state.running = None;
                if !state.running_cancelled {
                    let due = state.now_us + interval_us;
                    state.tasks.insert(id, Task::Repeating { interval_us, run });
                    state.push(due, id);
                }
            }
        }
        true
    }
}

impl Scheduler for VirtualClock {
    fn now_ms(&self) -> f64 {
        self.state.borrow().now_us as f64 / 1000.0
    }

    fn schedule_after(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        let due = state.now_us + to_us(delay_ms);
        state.tasks.insert(id, Task::Once(task));
        state.push(due, id);
        TaskHandle(id)
    }

    fn schedule_repeating(&self, interval_ms: f64, task: Box<dyn FnMut()>) -> TaskHandle {
        let mut state = self.state.borrow_mut();
        let id = state.alloc_id();
        let interval_us = to_us(interval_ms).max(1);
        let due = state.now_us + interval_us;
        state.tasks.insert(
            id,
            Task::Repeating {
                interval_us,
                run: task,
            },
        );
        state.push(due, id);
        TaskHandle(id)
    }

    fn cancel(&self, handle: TaskHandle) {
        let mut state = self.state.borrow_mut();
        if state.tasks.remove(&handle.0).is_none() && state.running == Some(handle.0) {
            state.running_cancelled = true;
        }
    }
}
