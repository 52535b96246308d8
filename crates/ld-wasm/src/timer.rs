//! `setTimeout`/`setInterval` scheduler

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

use ld_draw::{Scheduler, TaskHandle};

struct LiveTimer {
    js_handle: i32,
    repeating: bool,
    _closure: Closure<dyn FnMut()>,
}

#[derive(Default)]
struct TimerState {
    next_id: u64,
    live: HashMap<u64, LiveTimer>,
    /// Finished or cancelled timers whose closures may still be on the stack
    retired: Vec<LiveTimer>,
}

impl TimerState {
    fn retire(&mut self, id: u64) {
        if let Some(timer) = self.live.remove(&id) {
            self.retired.push(timer);
        }
    }
}

/// Scheduler backed by the window's timers
pub struct TimeoutScheduler {
    window: Window,
    epoch_ms: f64,
    state: Rc<RefCell<TimerState>>,
}

impl TimeoutScheduler {
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        Ok(Self {
            window,
            epoch_ms: js_sys::Date::now(),
            state: Rc::new(RefCell::new(TimerState::default())),
        })
    }

    fn allocate(&self) -> u64 {
        let mut state = self.state.borrow_mut();
        // Closures of timers that ended on an earlier turn are safe to drop now
        state.retired.clear();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    fn register(
        &self,
        id: u64,
        result: Result<i32, JsValue>,
        repeating: bool,
        closure: Closure<dyn FnMut()>,
    ) -> TaskHandle {
        match result {
            Ok(js_handle) => {
                self.state.borrow_mut().live.insert(
                    id,
                    LiveTimer {
                        js_handle,
                        repeating,
                        _closure: closure,
                    },
                );
            }
            Err(e) => log::error!("[LuckyDraw] Failed to arm timer: {:?}", e),
        }
        TaskHandle(id)
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.state.borrow().live.len()
    }
}

fn delay_arg(delay_ms: f64) -> i32 {
    if delay_ms.is_finite() {
        delay_ms.clamp(0.0, i32::MAX as f64).round() as i32
    } else {
        0
    }
}

fn finish(state: &Weak<RefCell<TimerState>>, id: u64) {
    if let Some(state) = state.upgrade() {
        state.borrow_mut().retire(id);
    }
}

impl Scheduler for TimeoutScheduler {
    fn now_ms(&self) -> f64 {
        js_sys::Date::now() - self.epoch_ms
    }

    fn schedule_after(&self, delay_ms: f64, task: Box<dyn FnOnce()>) -> TaskHandle {
        let id = self.allocate();
        let weak = Rc::downgrade(&self.state);
        let mut task = Some(task);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(task) = task.take() {
                task();
            }
            finish(&weak, id);
        }) as Box<dyn FnMut()>);

        let result = self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_arg(delay_ms),
        );
        self.register(id, result, false, closure)
    }

    fn schedule_repeating(&self, interval_ms: f64, mut task: Box<dyn FnMut()>) -> TaskHandle {
        let id = self.allocate();
        let closure = Closure::wrap(Box::new(move || task()) as Box<dyn FnMut()>);

        let result = self.window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_arg(interval_ms).max(1),
        );
        self.register(id, result, true, closure)
    }

    fn cancel(&self, handle: TaskHandle) {
        let mut state = self.state.borrow_mut();
        let Some((js_handle, repeating)) =
            state.live.get(&handle.0).map(|t| (t.js_handle, t.repeating))
        else {
            return;
        };
        if repeating {
            self.window.clear_interval_with_handle(js_handle);
        } else {
            self.window.clear_timeout_with_handle(js_handle);
        }
        state.retire(handle.0);
    }
}
