//! Login identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name used when the login form leaves the name blank
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// The one active participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    /// Raw 11-digit phone; only ever persisted masked in history
    pub phone: String,
    pub name: String,
    pub login_time: DateTime<Utc>,
}

impl UserIdentity {
    pub fn new(phone: impl Into<String>, name: &str) -> Self {
        let name = name.trim();
        Self {
            phone: phone.into(),
            name: if name.is_empty() {
                ANONYMOUS_NAME.to_string()
            } else {
                name.to_string()
            },
            login_time: Utc::now(),
        }
    }

    pub fn masked_phone(&self) -> String {
        crate::phone::mask_phone(&self.phone)
    }
}
