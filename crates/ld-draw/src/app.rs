//! Command facade for a draw page
//!
//! Joins the login gate to a draw session and turns every user-visible
//! outcome into an [`AppNotice`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use ld_core::{DrawVariant, LdResult, LotteryConfig};
use ld_state::{
    mask_phone, HistoryRecord, HistoryStore, LoginError, LoginGate, SessionStore, UserIdentity,
};

use crate::collab::{Animator, GatedSoundPlayer, SoundPlayer};
use crate::event::DrawRequest;
use crate::random::RandomSource;
use crate::scheduler::Scheduler;
use crate::session::{DrawSession, SessionDeps};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Short message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppNotice {
    pub kind: NoticeKind,
    pub message: String,
}

impl AppNotice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

pub const LOGGED_OUT_MESSAGE: &str = "Logged out";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to take part in the draw";
pub const ALREADY_DRAWN_MESSAGE: &str = "You have already drawn with this number";

/// Everything a [`LotteryApp`] needs from its host
pub struct AppDeps {
    pub animator: Rc<dyn Animator>,
    /// Raw cue output; the app wraps it in a [`GatedSoundPlayer`]
    pub sound: Box<dyn SoundPlayer>,
    pub scheduler: Rc<dyn Scheduler>,
    pub history: Rc<dyn HistoryStore>,
    pub session_store: Rc<dyn SessionStore>,
    pub rng: Box<dyn RandomSource>,
}

/// Login-gated draw page
pub struct LotteryApp {
    gate: LoginGate,
    session: DrawSession,
    history: Rc<dyn HistoryStore>,
    sound: Rc<GatedSoundPlayer>,
    /// Also records which phones have used their draw
    session_store: Rc<dyn SessionStore>,
    notice_listeners: Vec<Box<dyn Fn(&AppNotice)>>,
}

impl LotteryApp {
    /// Build the page and restore any persisted login
    pub fn new(config: &LotteryConfig, deps: AppDeps) -> Self {
        let sound = Rc::new(GatedSoundPlayer::new(deps.sound, &config.animations.sound));
        let session = DrawSession::new(
            config,
            SessionDeps {
                animator: deps.animator,
                sound: sound.clone(),
                scheduler: deps.scheduler,
                history: Rc::clone(&deps.history),
            },
            deps.rng,
        );

        let mut gate = LoginGate::new(Rc::clone(&deps.session_store));
        gate.restore();

        Self {
            gate,
            session,
            history: deps.history,
            sound,
            session_store: deps.session_store,
            notice_listeners: Vec::new(),
        }
    }

    pub fn session(&self) -> &DrawSession {
        &self.session
    }

    pub fn on_notice(&mut self, listener: impl Fn(&AppNotice) + 'static) {
        self.notice_listeners.push(Box::new(listener));
    }

    fn notify(&self, notice: AppNotice) {
        log::debug!("Notice ({:?}): {}", notice.kind, notice.message);
        for listener in &self.notice_listeners {
            listener(&notice);
        }
    }

    pub fn submit_login(&mut self, phone: &str, name: &str) -> Result<UserIdentity, LoginError> {
        match self.gate.submit_login(phone, name) {
            Ok(user) => {
                self.notify(AppNotice::success(format!("Welcome {}! Login successful", user.name)));
                Ok(user)
            }
            Err(e) => {
                self.notify(AppNotice::error(e.to_string()));
                Err(e)
            }
        }
    }

    pub fn logout(&mut self) -> LdResult<()> {
        self.gate.logout()?;
        self.notify(AppNotice::info(LOGGED_OUT_MESSAGE));
        Ok(())
    }

    /// Start a draw for the logged-in identity
    ///
    /// Each phone gets one draw, even across logout and reload. Further
    /// requests are refused with a notice, as are requests while logged out.
    pub fn request_draw(&mut self) -> DrawRequest {
        let Some(user) = self.gate.current_user().cloned() else {
            self.notify(AppNotice::error(LOGIN_REQUIRED_MESSAGE));
            return DrawRequest::NotLoggedIn;
        };
        if self.session_store.has_drawn(&user.phone) {
            self.notify(AppNotice::error(ALREADY_DRAWN_MESSAGE));
            return DrawRequest::AlreadyDrawn;
        }

        let phone = user.phone.clone();
        let outcome = self.session.request_draw_as(Some(user));
        if outcome.is_started() {
            if let Err(e) = self.session_store.mark_drawn(&phone) {
                log::warn!("Failed to record draw for {}: {}", mask_phone(&phone), e);
            }
        }
        outcome
    }

    /// Switch reveal style; refused while a draw is in flight
    pub fn set_variant(&self, variant: DrawVariant) -> bool {
        self.session.set_variant(variant)
    }

    /// Newest first
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.history.list()
    }

    pub fn clear_history(&self) -> LdResult<()> {
        self.history.clear()?;
        self.notify(AppNotice::info("History cleared"));
        Ok(())
    }

    /// Flip the audio toggle; returns whether sound is now on
    pub fn toggle_sound(&self) -> bool {
        self.sound.toggle()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound.is_enabled()
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.gate.current_user()
    }

    pub fn is_logged_in(&self) -> bool {
        self.gate.is_logged_in()
    }
}
