//! Prize definitions and the weighted prize table

use serde::{Deserialize, Serialize};

use crate::error::{LdError, LdResult};

/// Tolerance used when checking that a table's probabilities sum to 1.0
pub const PROBABILITY_EPSILON: f64 = 1e-6;

/// A weighted outcome of a draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prize {
    /// Display name (e.g. "1st Prize")
    pub name: String,
    /// Display amount, may be empty for "no win" entries
    #[serde(default)]
    pub amount: String,
    /// Selection probability, expected in (0, 1]
    pub probability: f64,
    /// CSS colour used for the prize cell
    #[serde(default)]
    pub color: String,
    /// Icon class for the prize cell
    #[serde(default)]
    pub icon: String,
}

impl Prize {
    pub fn new(name: impl Into<String>, amount: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
            probability,
            color: String::new(),
            icon: String::new(),
        }
    }

    /// Builder: set colour and icon
    pub fn with_style(mut self, color: impl Into<String>, icon: impl Into<String>) -> Self {
        self.color = color.into();
        self.icon = icon.into();
        self
    }

    /// "Thanks for playing" style entries carry no amount
    pub fn is_consolation(&self) -> bool {
        self.amount.trim().is_empty()
    }
}

/// Advisory problems found in a prize table
///
/// None of these stop a draw: selection falls back to the last entry when
/// the cumulative walk runs out.
#[derive(Debug, Clone, PartialEq)]
pub enum PrizeLint {
    /// Probability is NaN or infinite
    NonFinite { index: usize, name: String },
    /// Probability is outside (0, 1]
    OutOfRange { index: usize, name: String, probability: f64 },
    /// Probabilities do not sum to 1.0
    SumMismatch { sum: f64 },
    /// Two prizes share a name; the grid target lookup picks the first
    DuplicateName { name: String },
}

impl std::fmt::Display for PrizeLint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite { index, name } => {
                write!(f, "prize #{index} '{name}' has a non-finite probability")
            }
            Self::OutOfRange { index, name, probability } => write!(
                f,
                "prize #{index} '{name}' probability {probability} is outside (0, 1]"
            ),
            Self::SumMismatch { sum } => write!(
                f,
                "probabilities sum to {sum:.6}; the last prize absorbs any shortfall"
            ),
            Self::DuplicateName { name } => write!(f, "prize name '{name}' is used more than once"),
        }
    }
}

/// Ordered, non-empty list of prizes
///
/// Order matters: selection walks the table front to back and the last entry
/// doubles as the catch-all, so put the low-value or "no win" prize last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Prize>", into = "Vec<Prize>")]
pub struct PrizeTable {
    prizes: Vec<Prize>,
}

impl PrizeTable {
    /// Create a table; fails only when `prizes` is empty
    pub fn new(prizes: Vec<Prize>) -> LdResult<Self> {
        if prizes.is_empty() {
            return Err(LdError::EmptyPrizeTable);
        }
        Ok(Self { prizes })
    }

    /// Built-in tables that are known to be non-empty
    pub(crate) fn from_builtin(prizes: Vec<Prize>) -> Self {
        debug_assert!(!prizes.is_empty());
        Self { prizes }
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Prize> {
        self.prizes.get(index)
    }

    /// The catch-all entry
    pub fn last(&self) -> &Prize {
        // Non-empty by construction
        &self.prizes[self.prizes.len() - 1]
    }

    /// Index of the first prize with the given name
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.prizes.iter().position(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prize> {
        self.prizes.iter()
    }

    /// Sum of all configured probabilities
    pub fn total_probability(&self) -> f64 {
        self.prizes.iter().map(|p| p.probability).sum()
    }

    /// Collect advisory problems with this table
    pub fn lint(&self) -> Vec<PrizeLint> {
        let mut lints = Vec::new();

        for (index, prize) in self.prizes.iter().enumerate() {
            if !prize.probability.is_finite() {
                lints.push(PrizeLint::NonFinite {
                    index,
                    name: prize.name.clone(),
                });
            } else if prize.probability <= 0.0 || prize.probability > 1.0 {
                lints.push(PrizeLint::OutOfRange {
                    index,
                    name: prize.name.clone(),
                    probability: prize.probability,
                });
            }

            if self.prizes[..index].iter().any(|p| p.name == prize.name) {
                lints.push(PrizeLint::DuplicateName {
                    name: prize.name.clone(),
                });
            }
        }

        let sum = self.total_probability();
        if sum.is_finite() && (sum - 1.0).abs() > PROBABILITY_EPSILON {
            lints.push(PrizeLint::SumMismatch { sum });
        }

        lints
    }
}

impl TryFrom<Vec<Prize>> for PrizeTable {
    type Error = LdError;

    fn try_from(prizes: Vec<Prize>) -> Result<Self, Self::Error> {
        Self::new(prizes)
    }
}

impl From<PrizeTable> for Vec<Prize> {
    fn from(table: PrizeTable) -> Self {
        table.prizes
    }
}

impl<'a> IntoIterator for &'a PrizeTable {
    type Item = &'a Prize;
    type IntoIter = std::slice::Iter<'a, Prize>;

    fn into_iter(self) -> Self::IntoIter {
        self.prizes.iter()
    }
}
