//! ld-state: Persistence for LuckyDraw
//!
//! Local single-device state behind small traits:
//! - `KeyValueStore` backends (in-memory, JSON files; the browser host adds
//!   `localStorage`)
//! - `HistoryStore`: capped, newest-first draw log with masked phones
//! - `SessionStore`: the active login identity and the used-phone set
//! - `LoginGate`: phone validation and one-entry-per-phone eligibility

mod history;
mod identity;
mod login;
mod phone;
mod session;
mod store;

pub use history::*;
pub use identity::*;
pub use login::*;
pub use phone::*;
pub use session::*;
pub use store::*;
