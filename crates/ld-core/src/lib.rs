//! ld-core: Shared types for LuckyDraw
//!
//! Prize definitions, the weighted prize table, the lottery configuration
//! and the error type used across all LuckyDraw crates.

mod config;
mod error;
mod prize;

pub use config::*;
pub use error::*;
pub use prize::*;
