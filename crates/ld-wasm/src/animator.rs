//! Animator that forwards to page callbacks

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use js_sys::{Function, Reflect};

use ld_draw::{Animator, ConfettiBurst, DrawResult};
use ld_state::UserIdentity;

/// Page callbacks, looked up by name on a plain JS object:
///
/// | key              | arguments                          |
/// |------------------|------------------------------------|
/// | `highlightCell`  | `(index)`                          |
/// | `scheduleReelStop` | `(reel, targetRow, atDelayMs)`   |
/// | `setBusy`        | `(busy)`                           |
/// | `showResult`     | `(result, user \| null)`           |
/// | `celebrate`      | `(burst)`                          |
///
/// Missing keys are treated as no-ops.
#[derive(Default)]
pub struct JsAnimator {
    highlight_cell: Option<Function>,
    schedule_reel_stop: Option<Function>,
    set_busy: Option<Function>,
    show_result: Option<Function>,
    celebrate: Option<Function>,
}

fn callback(object: &JsValue, key: &str) -> Result<Option<Function>, JsValue> {
    if object.is_undefined() || object.is_null() {
        return Ok(None);
    }
    let value = Reflect::get(object, &JsValue::from_str(key))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .dyn_into::<Function>()
        .map(Some)
        .map_err(|_| JsValue::from_str(&format!("callback `{key}` is not a function")))
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        log::warn!("[LuckyDraw] Failed to convert value for JS: {}", e);
        JsValue::NULL
    })
}

fn report(key: &str, outcome: Result<JsValue, JsValue>) {
    if let Err(e) = outcome {
        log::error!("[LuckyDraw] `{}` callback threw: {:?}", key, e);
    }
}

impl JsAnimator {
    pub fn from_object(object: &JsValue) -> Result<Self, JsValue> {
        Ok(Self {
            highlight_cell: callback(object, "highlightCell")?,
            schedule_reel_stop: callback(object, "scheduleReelStop")?,
            set_busy: callback(object, "setBusy")?,
            show_result: callback(object, "showResult")?,
            celebrate: callback(object, "celebrate")?,
        })
    }
}

impl Animator for JsAnimator {
    fn highlight_cell(&self, index: usize) {
        if let Some(f) = &self.highlight_cell {
            report("highlightCell", f.call1(&JsValue::NULL, &JsValue::from(index as u32)));
        }
    }

    fn schedule_reel_stop(&self, reel: usize, target_row: usize, at_delay_ms: f64) {
        if let Some(f) = &self.schedule_reel_stop {
            report(
                "scheduleReelStop",
                f.call3(
                    &JsValue::NULL,
                    &JsValue::from(reel as u32),
                    &JsValue::from(target_row as u32),
                    &JsValue::from_f64(at_delay_ms),
                ),
            );
        }
    }

    fn set_busy(&self, busy: bool) {
        if let Some(f) = &self.set_busy {
            report("setBusy", f.call1(&JsValue::NULL, &JsValue::from_bool(busy)));
        }
    }

    fn show_result(&self, result: &DrawResult, user: Option<&UserIdentity>) {
        if let Some(f) = &self.show_result {
            let user = user.map(to_js).unwrap_or(JsValue::NULL);
            report("showResult", f.call2(&JsValue::NULL, &to_js(result), &user));
        }
    }

    fn celebrate(&self, burst: &ConfettiBurst) {
        if let Some(f) = &self.celebrate {
            report("celebrate", f.call1(&JsValue::NULL, &to_js(burst)));
        }
    }
}
