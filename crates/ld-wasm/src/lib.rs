// ============================================================================
// LUCKYDRAW — WASM Port
// Browser bindings: localStorage persistence, window timers, Web Audio cues
// and page callbacks driving the draw core
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;

use ld_core::{DrawVariant, LotteryConfig};
use ld_draw::{
    AppDeps, AppNotice, DrawRequest, DrawResult, DrawTiming, LotteryApp, ParticleField,
};
use ld_state::{HistoryStore, SessionStore, StoredHistory, StoredSession};

pub mod animator;
pub mod audio;
pub mod random;
pub mod storage;
pub mod timer;

pub use animator::JsAnimator;
pub use audio::WebAudioSoundPlayer;
pub use random::MathRandom;
pub use storage::LocalStorageStore;
pub use timer::TimeoutScheduler;

// ============================================================================
// INITIALIZATION
// ============================================================================

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    set_panic_hook();

    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("[LuckyDraw WASM] Initialized");
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn to_js<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// `"grid"` or `"slot"`
pub fn parse_variant(name: &str) -> Option<DrawVariant> {
    match name.trim().to_ascii_lowercase().as_str() {
        "grid" => Some(DrawVariant::Grid),
        "slot" => Some(DrawVariant::Slot),
        _ => None,
    }
}

fn request_name(request: DrawRequest) -> &'static str {
    match request {
        DrawRequest::Started => "started",
        DrawRequest::Ignored => "ignored",
        DrawRequest::NotLoggedIn => "not_logged_in",
        DrawRequest::AlreadyDrawn => "already_drawn",
    }
}

// ============================================================================
// APP
// ============================================================================

/// Draw page bound to the browser
#[wasm_bindgen]
pub struct LuckyDrawApp {
    app: LotteryApp,
    config: LotteryConfig,
    last_result: Rc<RefCell<Option<DrawResult>>>,
}

#[wasm_bindgen]
impl LuckyDrawApp {
    /// `config_json` may be omitted for the built-in prize table;
    /// `callbacks` is the object described on [`JsAnimator`].
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, callbacks: JsValue) -> Result<LuckyDrawApp, JsValue> {
        let config = match config_json {
            Some(json) => LotteryConfig::from_json_str(&json).map_err(js_error)?,
            None => LotteryConfig::default(),
        };

        let storage = Rc::new(LocalStorageStore::open().map_err(js_error)?);
        let history: Rc<dyn HistoryStore> = Rc::new(StoredHistory::open(Rc::clone(&storage)));
        let session_store: Rc<dyn SessionStore> = Rc::new(StoredSession::open(storage));

        let app = LotteryApp::new(
            &config,
            AppDeps {
                animator: Rc::new(JsAnimator::from_object(&callbacks)?),
                sound: Box::new(WebAudioSoundPlayer::new(config.animations.sound.volume)),
                scheduler: Rc::new(TimeoutScheduler::new()?),
                history,
                session_store,
                rng: Box::new(MathRandom),
            },
        );

        let last_result = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&last_result);
        app.session().on_result(move |result| {
            *slot.borrow_mut() = Some(result.clone());
        });

        log::info!(
            "[LuckyDraw] Ready: {} prizes, {}",
            config.prizes.len(),
            config.system.default_variant.display_name()
        );
        Ok(Self {
            app,
            config,
            last_result,
        })
    }

    #[wasm_bindgen(js_name = submitLogin)]
    pub fn submit_login(&mut self, phone: &str, name: &str) -> Result<JsValue, JsValue> {
        let user = self.app.submit_login(phone, name).map_err(js_error)?;
        to_js(&user)
    }

    pub fn logout(&mut self) -> Result<(), JsValue> {
        self.app.logout().map_err(js_error)
    }

    /// One of `started`, `ignored`, `not_logged_in`, `already_drawn`
    #[wasm_bindgen(js_name = requestDraw)]
    pub fn request_draw(&mut self) -> String {
        request_name(self.app.request_draw()).to_string()
    }

    #[wasm_bindgen(js_name = setVariant)]
    pub fn set_variant(&self, name: &str) -> Result<bool, JsValue> {
        let variant =
            parse_variant(name).ok_or_else(|| JsValue::from_str(&format!("unknown variant `{name}`")))?;
        Ok(self.app.set_variant(variant))
    }

    pub fn variant(&self) -> String {
        match self.app.session().variant() {
            DrawVariant::Grid => "grid".into(),
            DrawVariant::Slot => "slot".into(),
        }
    }

    /// Scale all draw timings; 1.0 is normal speed
    #[wasm_bindgen(js_name = setSpeed)]
    pub fn set_speed(&self, factor: f64) {
        let timing = DrawTiming::from_config(&self.config).scaled(1.0 / factor.max(f64::EPSILON));
        self.app.session().set_timing(timing);
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.app.session().is_busy()
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.session().state())
    }

    /// Newest first
    pub fn history(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.history())
    }

    #[wasm_bindgen(js_name = clearHistory)]
    pub fn clear_history(&self) -> Result<(), JsValue> {
        self.app.clear_history().map_err(js_error)
    }

    #[wasm_bindgen(js_name = toggleSound)]
    pub fn toggle_sound(&self) -> bool {
        self.app.toggle_sound()
    }

    #[wasm_bindgen(js_name = soundEnabled)]
    pub fn sound_enabled(&self) -> bool {
        self.app.sound_enabled()
    }

    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Result<JsValue, JsValue> {
        match self.app.current_user() {
            Some(user) => to_js(user),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = gridBoard)]
    pub fn grid_board(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.session().board())
    }

    #[wasm_bindgen(js_name = reelLabels)]
    pub fn reel_labels(&self) -> Result<JsValue, JsValue> {
        to_js(&self.app.session().reel_labels())
    }

    /// Fresh background particle layout
    pub fn particles(&self) -> Result<JsValue, JsValue> {
        let field = ParticleField::generate(&self.config.animations.particles, &mut MathRandom);
        to_js(&field)
    }

    pub fn config(&self) -> Result<JsValue, JsValue> {
        to_js(&self.config)
    }

    /// Share text for the latest result, if any
    #[wasm_bindgen(js_name = shareText)]
    pub fn share_text(&self, page_url: &str) -> Option<String> {
        self.last_result
            .borrow()
            .as_ref()
            .map(|result| result.share_text(page_url))
    }

    /// `listener(notice)` for every user-facing message
    #[wasm_bindgen(js_name = onNotice)]
    pub fn on_notice(&mut self, listener: Function) {
        self.app.on_notice(move |notice: &AppNotice| {
            let Ok(value) = serde_wasm_bindgen::to_value(notice) else {
                return;
            };
            if let Err(e) = listener.call1(&JsValue::NULL, &value) {
                log::error!("[LuckyDraw] notice listener threw: {:?}", e);
            }
        });
    }

    /// `listener(event)` for every draw event
    #[wasm_bindgen(js_name = onEvent)]
    pub fn on_event(&self, listener: Function) {
        self.app.session().subscribe(move |event| {
            let Ok(value) = serde_wasm_bindgen::to_value(event) else {
                return;
            };
            if let Err(e) = listener.call1(&JsValue::NULL, &value) {
                log::error!("[LuckyDraw] event listener threw: {:?}", e);
            }
        });
    }
}

// ============================================================================
// UTILITY EXPORTS
// ============================================================================

/// Get version string
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Built-in configuration as JSON
#[wasm_bindgen]
pub fn default_config_json() -> Result<String, JsValue> {
    LotteryConfig::default().to_json().map_err(js_error)
}

/// Check a configuration; returns lint warnings, throws when invalid
#[wasm_bindgen]
pub fn validate_config(config_json: &str) -> Result<JsValue, JsValue> {
    let config = LotteryConfig::from_json_str(config_json).map_err(js_error)?;
    to_js(&config.lint())
}
