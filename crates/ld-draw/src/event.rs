//! Draw lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ld_core::{DrawVariant, Prize};

/// Where a [`crate::DrawSession`] is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DrawState {
    /// Ready for a request
    Idle,
    /// Request accepted, prize being chosen
    Selecting,
    /// Grid highlight on path step `step`
    Animating { step: usize },
    /// Slot reels turning; `reels_stopped` have locked so far
    Spinning { reels_stopped: usize },
    /// Result being revealed
    Settled,
}

impl DrawState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl Default for DrawState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Outcome of one completed draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub prize: Prize,
    /// Position of `prize` in the table
    pub prize_index: usize,
    pub variant: DrawVariant,
    pub timestamp: DateTime<Utc>,
}

impl DrawResult {
    pub fn is_win(&self) -> bool {
        !self.prize.is_consolation()
    }

    /// Text offered for sharing a result
    pub fn share_text(&self, page_url: &str) -> String {
        let mut text = if self.prize.amount.is_empty() {
            format!("I drew {}!", self.prize.name)
        } else {
            format!("I won {} and got {}!", self.prize.name, self.prize.amount)
        };
        text.push_str(" Come and try your luck!");
        if !page_url.is_empty() {
            text.push(' ');
            text.push_str(page_url);
        }
        text
    }
}

/// Observable progress of a draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawEvent {
    StateChanged(DrawState),
    CellHighlighted { step: usize, cell: usize },
    ReelStopped { reel: usize, row: usize },
    Result(DrawResult),
}

/// Answer to a draw request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawRequest {
    /// The reveal has begun
    Started,
    /// A draw is already in flight
    Ignored,
    /// Nobody is logged in
    NotLoggedIn,
    /// The current identity has used its draw
    AlreadyDrawn,
}

impl DrawRequest {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(amount: &str) -> DrawResult {
        DrawResult {
            prize: Prize::new("1st Prize", amount, 0.1),
            prize_index: 0,
            variant: DrawVariant::Grid,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_share_text() {
        assert_eq!(
            result("¥500").share_text("https://example.org/draw"),
            "I won 1st Prize and got ¥500! Come and try your luck! https://example.org/draw"
        );
        assert_eq!(result("").share_text(""), "I drew 1st Prize! Come and try your luck!");
        assert!(!result("").is_win());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(DrawEvent::CellHighlighted { step: 2, cell: 5 }).unwrap();
        assert_eq!(json["type"], "cell_highlighted");
        assert_eq!(json["cell"], 5);

        let json = serde_json::to_value(DrawEvent::StateChanged(DrawState::Animating { step: 3 })).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["state"], "animating");
        assert_eq!(json["step"], 3);
    }
}
