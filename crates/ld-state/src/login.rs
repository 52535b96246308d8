//! One-entry-per-phone login gate

use std::rc::Rc;

use thiserror::Error;

use ld_core::{LdError, LdResult};

use crate::identity::UserIdentity;
use crate::phone::is_valid_phone;
use crate::session::SessionStore;

/// Login rejection; `Display` is the message shown to the user
#[derive(Error, Debug)]
pub enum LoginError {
    #[error("Please enter a valid mobile number")]
    InvalidPhone,

    #[error("This number has already taken part; each number may draw only once")]
    AlreadyParticipated,

    #[error("Login could not be saved: {0}")]
    Storage(#[from] LdError),
}

/// Validates logins and consumes eligibility
///
/// A phone is marked used the moment its login succeeds, before any draw
/// happens, so abandoning the page after login still spends the entry.
pub struct LoginGate {
    session: Rc<dyn SessionStore>,
    current: Option<UserIdentity>,
}

impl LoginGate {
    pub fn new(session: Rc<dyn SessionStore>) -> Self {
        Self {
            session,
            current: None,
        }
    }

    /// Pick up an identity persisted by an earlier page load
    pub fn restore(&mut self) -> Option<&UserIdentity> {
        self.current = self.session.load();
        if let Some(user) = &self.current {
            log::info!("Restored login for {}", user.name);
        }
        self.current.as_ref()
    }

    pub fn submit_login(&mut self, phone: &str, name: &str) -> Result<UserIdentity, LoginError> {
        let phone = phone.trim();

        if !is_valid_phone(phone) {
            log::debug!("Rejected malformed phone number");
            return Err(LoginError::InvalidPhone);
        }
        if self.session.is_phone_used(phone) {
            log::debug!("Rejected phone that already took part");
            return Err(LoginError::AlreadyParticipated);
        }

        let identity = UserIdentity::new(phone, name);
        self.session.mark_phone_used(phone)?;
        self.session.save(&identity)?;

        log::info!("Login: {} ({})", identity.name, identity.masked_phone());
        self.current = Some(identity.clone());
        Ok(identity)
    }

    /// Forget the active identity; its phone stays used
    pub fn logout(&mut self) -> LdResult<()> {
        if let Some(user) = self.current.take() {
            log::info!("Logout: {}", user.name);
        }
        self.session.clear()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StoredSession;
    use crate::store::MemoryStore;

    fn gate() -> LoginGate {
        LoginGate::new(Rc::new(StoredSession::open(MemoryStore::new())))
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let mut gate = gate();
        assert!(matches!(gate.submit_login("123", "Li"), Err(LoginError::InvalidPhone)));
        assert!(!gate.is_logged_in());
    }

    #[test]
    fn test_phone_usable_once() {
        let mut gate = gate();
        let user = gate.submit_login(" 13812345678 ", "Li").unwrap();
        assert_eq!(user.phone, "13812345678");
        assert!(gate.is_logged_in());

        gate.logout().unwrap();
        assert!(!gate.is_logged_in());

        assert!(matches!(
            gate.submit_login("13812345678", "Li"),
            Err(LoginError::AlreadyParticipated)
        ));
    }

    #[test]
    fn test_restore_after_reload() {
        let session: Rc<dyn SessionStore> = Rc::new(StoredSession::open(MemoryStore::new()));
        let mut first = LoginGate::new(Rc::clone(&session));
        first.submit_login("13912345678", "").unwrap();

        let mut second = LoginGate::new(session);
        let restored = second.restore().cloned().unwrap();
        assert_eq!(restored.name, crate::identity::ANONYMOUS_NAME);
        assert!(second.is_logged_in());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            LoginError::InvalidPhone.to_string(),
            "Please enter a valid mobile number"
        );
    }
}
