//! ld-sim: Offline tools for LuckyDraw
//!
//! - `batch`: parallel selection runs checked against the expected shares
//! - `replay`: full draws on a virtual clock, collected as an event timeline

pub mod batch;
pub mod replay;

pub use batch::*;
pub use replay::*;
