//! # ld-draw — Prize draw core for LuckyDraw
//!
//! Picks a weighted-random prize, plans the cosmetic reveal, and sequences
//! the grid or slot animation through injected collaborators.
//!
//! ## Architecture
//!
//! ```text
//! LotteryApp (commands: submit_login / request_draw / logout)
//!     │
//!     ├── LoginGate (ld-state)
//!     └── DrawSession
//!           ├── PrizeSelector ──── PrizeTable (ld-core)
//!           ├── RevealPathPlanner (grid only)
//!           ├── DrawTiming
//!           └── Scheduler → Animator / SoundPlayer
//!                 │
//!                 v
//!           DrawEvent … DrawResult → HistoryStore (ld-state)
//! ```
//!
//! Everything is single-threaded: sessions share state through `Rc`, so the
//! compiler keeps all transitions on the thread that owns the session.

pub mod app;
pub mod collab;
pub mod effects;
pub mod event;
pub mod layout;
pub mod path;
pub mod random;
pub mod scheduler;
pub mod selector;
pub mod session;
pub mod timing;

pub use app::*;
pub use collab::*;
pub use effects::*;
pub use event::*;
pub use layout::*;
pub use path::*;
pub use random::*;
pub use scheduler::*;
pub use selector::*;
pub use session::*;
pub use timing::*;
