//! Board layouts for the two reveal variants

use serde::{Deserialize, Serialize};

use ld_core::{GridLayout, Prize, PrizeTable};

use crate::path::grid_side;

/// Text shown on grid cells that hold no prize
pub const FILLER_LABEL: &str = "Thanks for playing";

/// Background of filler cells
pub const FILLER_BACKGROUND: &str = "rgba(255, 255, 255, 0.1)";

/// One grid square
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub index: usize,
    /// `None` for filler cells past the end of the table
    pub prize: Option<Prize>,
}

impl GridCell {
    pub fn label(&self) -> &str {
        self.prize.as_ref().map_or(FILLER_LABEL, |p| p.name.as_str())
    }

    /// CSS background: a gradient from the prize colour to a darker shade
    pub fn background(&self) -> String {
        match &self.prize {
            Some(prize) => {
                let dark = darken_hex(&prize.color, 20).unwrap_or_else(|| prize.color.clone());
                format!("linear-gradient(135deg, {}, {})", prize.color, dark)
            }
            None => FILLER_BACKGROUND.to_string(),
        }
    }
}

/// Square grid holding every prize in table order, padded with filler cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridBoard {
    pub side: usize,
    pub cells: Vec<GridCell>,
}

impl GridBoard {
    pub fn from_table(table: &PrizeTable) -> Self {
        let side = grid_side(table.len());
        let cells = (0..side * side)
            .map(|index| GridCell {
                index,
                prize: table.get(index).cloned(),
            })
            .collect();
        Self { side, cells }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// First cell whose prize carries `name`
    pub fn target_for(&self, name: &str) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| cell.prize.as_ref().is_some_and(|p| p.name == name))
    }

    /// Width and height of the grid container in px
    pub fn container_px(&self, layout: &GridLayout) -> u32 {
        layout.container_px(self.side)
    }
}

/// Text on every row of every reel
///
/// Reels cycle through prize names, amounts and rounded percentages, so row
/// `i` of each reel always describes prize `i`.
pub fn slot_reel_labels(table: &PrizeTable, reel_count: usize) -> Vec<Vec<String>> {
    (0..reel_count)
        .map(|reel| {
            table
                .iter()
                .map(|prize| match reel % 3 {
                    0 => prize.name.clone(),
                    1 => prize.amount.clone(),
                    _ => format!("{}%", (prize.probability * 100.0).round()),
                })
                .collect()
        })
        .collect()
}

/// Darken a `#rrggbb` colour by `percent` of full scale
///
/// Returns `None` for anything that is not a six-digit hex colour.
pub fn darken_hex(color: &str, percent: u8) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let amount = (2.55 * percent as f64).round() as i32;
    let channel = |shift: u32| ((value >> shift & 0xff) as i32 - amount).clamp(0, 255);
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channel(16),
        channel(8),
        channel(0)
    ))
}
