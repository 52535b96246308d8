//! Lottery configuration
//!
//! Everything the widget reads at start-up: the prize table, activity text,
//! per-variant layout, effect toggles and system defaults. All sections use
//! `#[serde(default)]` so partial YAML/JSON files fill in from the defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LdError, LdResult};
use crate::prize::{Prize, PrizeTable};

/// Which reveal is used for a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawVariant {
    /// Nine-square grid with a hopping highlight
    #[default]
    Grid,
    /// Three-reel slot machine
    Slot,
}

impl DrawVariant {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Grid => "Grid Draw",
            Self::Slot => "Slot Machine",
        }
    }
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    /// Activity text shown around the widget
    pub activity: ActivityInfo,
    /// Prize table, in selection order
    pub prizes: PrizeTable,
    /// Prize-count limits per variant
    pub variants: VariantLimits,
    /// System toggles
    pub system: SystemSettings,
    /// Effect toggles
    pub animations: AnimationSettings,
    /// Grid layout
    pub grid: GridLayout,
    /// Slot layout
    pub slot: SlotLayout,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            activity: ActivityInfo::default(),
            prizes: default_prizes(),
            variants: VariantLimits::default(),
            system: SystemSettings::default(),
            animations: AnimationSettings::default(),
            grid: GridLayout::default(),
            slot: SlotLayout::default(),
        }
    }
}

fn default_prizes() -> PrizeTable {
    let prizes = vec![
        Prize::new("1st Prize", "¥500", 0.05).with_style("#ffd700", "fas fa-crown"),
        Prize::new("2nd Prize", "¥200", 0.10).with_style("#ff6b6b", "fas fa-medal"),
        Prize::new("3rd Prize", "¥100", 0.15).with_style("#ff8c42", "fas fa-award"),
        Prize::new("4th Prize", "¥50", 0.20).with_style("#ff4757", "fas fa-star"),
        Prize::new("5th Prize", "¥20", 0.15).with_style("#ff3838", "fas fa-gift"),
        Prize::new("6th Prize", "¥10", 0.15).with_style("#ff2d55", "fas fa-coins"),
        Prize::new("7th Prize", "¥5", 0.10).with_style("#ff1744", "fas fa-gem"),
        Prize::new("Thanks for playing", "", 0.10).with_style("#8e8e93", "fas fa-heart"),
    ];
    PrizeTable::from_builtin(prizes)
}

/// Activity title and rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityInfo {
    pub title: String,
    pub subtitle: String,
    pub rules: Vec<String>,
}

impl Default for ActivityInfo {
    fn default() -> Self {
        Self {
            title: "Lucky Draw".to_string(),
            subtitle: "A ¥500 cash prize is waiting for you!".to_string(),
            rules: vec![
                "Each phone number may take part once".to_string(),
                "Prizes are issued within 3 working days".to_string(),
            ],
        }
    }
}

/// Prize-count bounds for one variant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PrizeCountRange {
    pub min_prizes: usize,
    pub max_prizes: usize,
}

impl PrizeCountRange {
    pub fn contains(&self, count: usize) -> bool {
        (self.min_prizes..=self.max_prizes).contains(&count)
    }
}

/// Prize-count limits per variant (advisory)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantLimits {
    pub grid: PrizeCountRange,
    pub slot: PrizeCountRange,
}

impl Default for VariantLimits {
    fn default() -> Self {
        Self {
            grid: PrizeCountRange {
                min_prizes: 4,
                max_prizes: 9,
            },
            slot: PrizeCountRange {
                min_prizes: 3,
                max_prizes: 5,
            },
        }
    }
}

impl VariantLimits {
    pub fn for_variant(&self, variant: DrawVariant) -> PrizeCountRange {
        match variant {
            DrawVariant::Grid => self.grid,
            DrawVariant::Slot => self.slot,
        }
    }
}

/// System toggles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSettings {
    /// Variant shown after login
    pub default_variant: DrawVariant,
    /// Show the mute button
    pub show_audio_control: bool,
    /// Show the draw history panel
    pub show_history: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            default_variant: DrawVariant::Grid,
            show_audio_control: true,
            show_history: true,
        }
    }
}

/// Effect toggles
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub particles: ParticleConfig,
    pub confetti: ConfettiConfig,
    pub sound: SoundConfig,
}

/// Background particle field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub enabled: bool,
    pub count: usize,
    pub speed: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 50,
            speed: 3.0,
        }
    }
}

/// Confetti burst on settle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfettiConfig {
    pub enabled: bool,
    pub count: usize,
    pub colors: Vec<String>,
}

impl Default for ConfettiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 20,
            colors: ["#ff6b6b", "#4ecdc4", "#45b7d1", "#96ceb4", "#feca57", "#ff9ff3"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// Cue playback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    pub enabled: bool,
    /// Master volume, 0.0 to 1.0
    pub volume: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 0.6,
        }
    }
}

/// Grid layout (pixels / milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLayout {
    pub size: u32,
    pub item_size: u32,
    pub gap: u32,
    pub animation_duration_ms: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            size: 400,
            item_size: 120,
            gap: 10,
            animation_duration_ms: 2000.0,
        }
    }
}

impl GridLayout {
    /// Container edge length for a grid of `side` cells
    pub fn container_px(&self, side: usize) -> u32 {
        let side = side as u32;
        side * self.item_size + side.saturating_sub(1) * self.gap
    }
}

/// Slot layout (pixels / milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotLayout {
    pub width: u32,
    pub height: u32,
    pub item_height: u32,
    /// Time before the first reel locks
    pub spin_duration_ms: f64,
    pub reel_count: usize,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            width: 300,
            height: 200,
            item_height: 40,
            spin_duration_ms: 3000.0,
            reel_count: 3,
        }
    }
}

impl LotteryConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn load(path: impl AsRef<Path>) -> LdResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            _ => Self::from_json_str(&text)?,
        };

        log::info!(
            "Loaded lottery config from {} ({} prizes)",
            path.display(),
            config.prizes.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> LdResult<Self> {
        let config: Self = serde_yml::from_str(text)?;
        config.validate()?;
        config.log_lints();
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> LdResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        config.log_lints();
        Ok(config)
    }

    pub fn to_json(&self) -> LdResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hard errors that make a draw impossible to present
    pub fn validate(&self) -> LdResult<()> {
        if self.slot.reel_count == 0 {
            return Err(LdError::InvalidConfig("slot.reel_count must be at least 1".into()));
        }
        if !self.slot.spin_duration_ms.is_finite() || self.slot.spin_duration_ms < 0.0 {
            return Err(LdError::InvalidConfig(format!(
                "slot.spin_duration_ms must be a non-negative number, got {}",
                self.slot.spin_duration_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.animations.sound.volume) {
            return Err(LdError::InvalidConfig(format!(
                "animations.sound.volume must be within 0..=1, got {}",
                self.animations.sound.volume
            )));
        }
        if self.animations.confetti.enabled && self.animations.confetti.colors.is_empty() {
            return Err(LdError::InvalidConfig(
                "animations.confetti.colors must not be empty when confetti is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Advisory problems: prize table lints and variant prize-count limits
    pub fn lint(&self) -> Vec<String> {
        let mut lints: Vec<String> = self.prizes.lint().iter().map(|l| l.to_string()).collect();

        for variant in [DrawVariant::Grid, DrawVariant::Slot] {
            let range = self.variants.for_variant(variant);
            if !range.contains(self.prizes.len()) {
                lints.push(format!(
                    "{} expects {}..={} prizes, table has {}",
                    variant.display_name(),
                    range.min_prizes,
                    range.max_prizes,
                    self.prizes.len()
                ));
            }
        }

        lints
    }

    fn log_lints(&self) {
        for lint in self.lint() {
            log::warn!("Lottery config: {}", lint);
        }
    }
}
