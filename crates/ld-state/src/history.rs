//! Draw history
//!
//! Append-only log of completed draws, newest first, capped at
//! [`MAX_HISTORY_ENTRIES`]. Eviction is by insertion order: the entry
//! appended longest ago goes first, whatever its display time says.

use std::collections::VecDeque;

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use ld_core::{LdResult, Prize};

use crate::identity::UserIdentity;
use crate::phone::mask_phone;
use crate::store::KeyValueStore;

/// Storage key for the persisted log
pub const HISTORY_KEY: &str = "lotteryHistory";

/// Maximum number of records kept
pub const MAX_HISTORY_ENTRIES: usize = 20;

/// Display format for record times
const TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Who drew a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordUser {
    pub name: String,
    /// Always masked once the record is stored
    pub phone: String,
}

/// One completed draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "prize")]
    pub prize_name: String,
    pub amount: String,
    #[serde(rename = "time")]
    pub time_display: String,
    #[serde(default)]
    pub user: Option<RecordUser>,
}

impl HistoryRecord {
    /// Build a record for a prize won at `timestamp`
    pub fn for_prize(prize: &Prize, timestamp: DateTime<Utc>, user: Option<&UserIdentity>) -> Self {
        Self {
            prize_name: prize.name.clone(),
            amount: prize.amount.clone(),
            time_display: timestamp.with_timezone(&Local).format(TIME_FORMAT).to_string(),
            user: user.map(|u| RecordUser {
                name: u.name.clone(),
                phone: u.masked_phone(),
            }),
        }
    }

    /// Copy with the user's phone masked
    pub fn masked(mut self) -> Self {
        if let Some(user) = self.user.as_mut() {
            user.phone = mask_phone(&user.phone);
        }
        self
    }

    /// "1st Prize - ¥500"
    pub fn headline(&self) -> String {
        if self.amount.is_empty() {
            self.prize_name.clone()
        } else {
            format!("{} - {}", self.prize_name, self.amount)
        }
    }
}

/// Persisted draw log
pub trait HistoryStore {
    /// Add a record at the front, evicting the oldest beyond the cap
    fn append(&self, record: HistoryRecord) -> LdResult<()>;
    /// All records, newest first
    fn list(&self) -> Vec<HistoryRecord>;
    fn clear(&self) -> LdResult<()>;
}

/// History kept in memory and mirrored to a [`KeyValueStore`]
pub struct StoredHistory<S: KeyValueStore> {
    store: S,
    records: RwLock<VecDeque<HistoryRecord>>,
    capacity: usize,
}

impl<S: KeyValueStore> StoredHistory<S> {
    /// Load whatever the store holds; unreadable data starts an empty log
    pub fn open(store: S) -> Self {
        Self::with_capacity(store, MAX_HISTORY_ENTRIES)
    }

    pub fn with_capacity(store: S, capacity: usize) -> Self {
        let mut records: VecDeque<HistoryRecord> = match store.get(HISTORY_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(records) => records,
                Err(e) => {
                    log::warn!("Discarding unreadable draw history: {}", e);
                    VecDeque::new()
                }
            },
            Ok(None) => VecDeque::new(),
            Err(e) => {
                log::warn!("Draw history unavailable: {}", e);
                VecDeque::new()
            }
        };
        records.truncate(capacity);

        Self {
            store,
            records: RwLock::new(records),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn persist(&self, records: &VecDeque<HistoryRecord>) -> LdResult<()> {
        let json = serde_json::to_string(records)?;
        self.store.set(HISTORY_KEY, &json)
    }
}

impl<S: KeyValueStore> HistoryStore for StoredHistory<S> {
    fn append(&self, record: HistoryRecord) -> LdResult<()> {
        let mut records = self.records.write();
        records.push_front(record.masked());
        records.truncate(self.capacity);
        self.persist(&records)
    }

    fn list(&self) -> Vec<HistoryRecord> {
        self.records.read().iter().cloned().collect()
    }

    fn clear(&self) -> LdResult<()> {
        self.records.write().clear();
        self.store.remove(HISTORY_KEY)
    }
}
