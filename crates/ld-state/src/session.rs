//! Login identity and used-phone persistence

use parking_lot::RwLock;

use ld_core::LdResult;

use crate::identity::UserIdentity;
use crate::store::KeyValueStore;

/// Storage key for the active identity
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Storage key for the used-phone set
pub const USED_PHONES_KEY: &str = "usedPhones";

/// Storage key for phones that have completed their draw
pub const DRAWN_PHONES_KEY: &str = "drawnPhones";

/// Persisted login state
pub trait SessionStore {
    fn load(&self) -> Option<UserIdentity>;
    fn save(&self, identity: &UserIdentity) -> LdResult<()>;
    /// Forget the active identity; the used-phone set is untouched
    fn clear(&self) -> LdResult<()>;
    fn is_phone_used(&self, phone: &str) -> bool;
    /// Add to the used-phone set; the set never shrinks
    fn mark_phone_used(&self, phone: &str) -> LdResult<()>;
    fn has_drawn(&self, phone: &str) -> bool;
    /// Record that `phone` started its draw; survives logout and reload
    fn mark_drawn(&self, phone: &str) -> LdResult<()>;
}

/// Session state mirrored to a [`KeyValueStore`]
pub struct StoredSession<S: KeyValueStore> {
    store: S,
    used_phones: RwLock<Vec<String>>,
    drawn_phones: RwLock<Vec<String>>,
}

fn load_phone_list(store: &impl KeyValueStore, key: &str) -> Vec<String> {
    match store.get(key) {
        Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable phone list {}: {}", key, e);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!("Phone list {} unavailable: {}", key, e);
            Vec::new()
        }
    }
}

/// Append `phone` once and mirror the whole list to `key`
fn add_phone(
    store: &impl KeyValueStore,
    key: &str,
    list: &RwLock<Vec<String>>,
    phone: &str,
) -> LdResult<()> {
    let mut phones = list.write();
    if phones.iter().any(|p| p == phone) {
        return Ok(());
    }
    phones.push(phone.to_string());
    let json = serde_json::to_string(&*phones)?;
    store.set(key, &json)
}

impl<S: KeyValueStore> StoredSession<S> {
    pub fn open(store: S) -> Self {
        let used_phones = load_phone_list(&store, USED_PHONES_KEY);
        let drawn_phones = load_phone_list(&store, DRAWN_PHONES_KEY);

        Self {
            store,
            used_phones: RwLock::new(used_phones),
            drawn_phones: RwLock::new(drawn_phones),
        }
    }

    pub fn used_phone_count(&self) -> usize {
        self.used_phones.read().len()
    }
}

impl<S: KeyValueStore> SessionStore for StoredSession<S> {
    fn load(&self) -> Option<UserIdentity> {
        match self.store.get(CURRENT_USER_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    log::warn!("Ignoring unreadable saved login: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                log::warn!("Saved login unavailable: {}", e);
                None
            }
        }
    }

    fn save(&self, identity: &UserIdentity) -> LdResult<()> {
        let json = serde_json::to_string(identity)?;
        self.store.set(CURRENT_USER_KEY, &json)
    }

    fn clear(&self) -> LdResult<()> {
        self.store.remove(CURRENT_USER_KEY)
    }

    fn is_phone_used(&self, phone: &str) -> bool {
        self.used_phones.read().iter().any(|p| p == phone)
    }

    fn mark_phone_used(&self, phone: &str) -> LdResult<()> {
        add_phone(&self.store, USED_PHONES_KEY, &self.used_phones, phone)
    }

    fn has_drawn(&self, phone: &str) -> bool {
        self.drawn_phones.read().iter().any(|p| p == phone)
    }

    fn mark_drawn(&self, phone: &str) -> LdResult<()> {
        add_phone(&self.store, DRAWN_PHONES_KEY, &self.drawn_phones, phone)
    }
}
