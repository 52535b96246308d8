//! Decorative effects: the settle confetti burst and the background field
//!
//! Both are plain data; the host decides how to draw them.

use serde::{Deserialize, Serialize};

use ld_core::{ConfettiConfig, ParticleConfig};

use crate::random::RandomSource;

/// Gap between consecutive confetti releases
pub const CONFETTI_RELEASE_INTERVAL_MS: f64 = 100.0;

/// How long one piece takes to fall
pub const CONFETTI_FALL_MS: f64 = 3000.0;

/// One falling confetti piece
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfettiPiece {
    /// Release time after the burst starts
    pub delay_ms: f64,
    /// Horizontal position, percent of viewport width
    pub left_vw: f64,
    pub color: String,
    pub fall_ms: f64,
}

/// A settle celebration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfettiBurst {
    pub pieces: Vec<ConfettiPiece>,
}

impl ConfettiBurst {
    /// Empty when confetti is disabled or has no colours
    pub fn generate(config: &ConfettiConfig, rng: &mut dyn RandomSource) -> Self {
        if !config.enabled || config.colors.is_empty() {
            return Self::default();
        }

        let pieces = (0..config.count)
            .map(|i| ConfettiPiece {
                delay_ms: i as f64 * CONFETTI_RELEASE_INTERVAL_MS,
                left_vw: rng.next_f64() * 100.0,
                color: config.colors[rng.next_index(config.colors.len())].clone(),
                fall_ms: CONFETTI_FALL_MS,
            })
            .collect();
        Self { pieces }
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// When the last piece lands
    pub fn duration_ms(&self) -> f64 {
        self.pieces
            .iter()
            .map(|p| p.delay_ms + p.fall_ms)
            .fold(0.0, f64::max)
    }
}

/// One floating background particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Particle {
    pub left_pct: f64,
    pub top_pct: f64,
    pub delay_s: f64,
    pub duration_s: f64,
}

/// Page background decoration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleField {
    pub particles: Vec<Particle>,
}

impl ParticleField {
    pub fn generate(config: &ParticleConfig, rng: &mut dyn RandomSource) -> Self {
        if !config.enabled {
            return Self::default();
        }

        let particles = (0..config.count)
            .map(|_| Particle {
                left_pct: rng.next_f64() * 100.0,
                top_pct: rng.next_f64() * 100.0,
                delay_s: rng.next_f64() * 6.0,
                duration_s: 3.0 + rng.next_f64() * 3.0,
            })
            .collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
