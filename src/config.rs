//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The player/gear profile is an explicit immutable value with named,
//! validated fields and defaults — constructed once per run and never
//! mutated afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::types::{ForgeError, PriceMode};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub player: PlayerConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub market: MarketConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PricingConfig {
    #[serde(default = "default_mode")]
    pub mode: PriceMode,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
        }
    }
}

fn default_mode() -> PriceMode {
    PriceMode::Pessimistic
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// Path to the item/recipe catalog JSON.
    pub catalog_file: String,
    /// Local marketplace snapshot to use instead of the live endpoint.
    #[serde(default)]
    pub snapshot_file: Option<String>,
    /// Live marketplace endpoint, used when no snapshot file is given.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "https://www.milkywayidle.com/game_data/marketplace.json".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    /// Target tiers evaluated for every enhanceable item.
    #[serde(default = "default_targets")]
    pub target_tiers: Vec<u32>,
    /// Items whose hrid contains any of these fragments are skipped.
    #[serde(default)]
    pub exclude_prefixes: Vec<String>,
    /// Number of top results printed to the console.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            target_tiers: default_targets(),
            exclude_prefixes: Vec::new(),
            top_n: default_top_n(),
        }
    }
}

fn default_targets() -> Vec<u32> {
    vec![8, 10, 12, 14]
}

fn default_top_n() -> usize {
    25
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            report_file: default_report_file(),
        }
    }
}

fn default_report_file() -> String {
    "forge_report.json".to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Player profile
// ---------------------------------------------------------------------------

/// Enhancing tea tier. Exactly one tier can be active, so the three tea
/// flags of older revisions are collapsed into one enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeaTier {
    #[default]
    None,
    Basic,
    Super,
    Ultra,
}

impl TeaTier {
    /// Effective enhancing levels granted (before concentration scaling).
    pub fn level_bonus(self) -> f64 {
        match self {
            TeaTier::None => 0.0,
            TeaTier::Basic => 3.0,
            TeaTier::Super => 6.0,
            TeaTier::Ultra => 8.0,
        }
    }

    /// Action speed percent granted (before concentration scaling).
    pub fn speed_bonus(self) -> f64 {
        match self {
            TeaTier::None => 0.0,
            TeaTier::Basic => 2.0,
            TeaTier::Super => 4.0,
            TeaTier::Ultra => 6.0,
        }
    }
}

/// The player's gear, buff, and consumable loadout.
///
/// All solver inputs derive from this snapshot plus the item catalog.
/// Gear slots at level 0 are treated as unequipped.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub enhancing_level: u32,
    pub observatory_level: u32,

    pub enchanted_gloves_level: u32,
    pub guzzling_pouch_level: u32,
    pub enhancer_top_level: u32,
    pub enhancer_bottom_level: u32,
    pub philosophers_necklace_level: u32,

    /// Enhancer tool hrid suffix, e.g. "celestial_enhancer".
    pub enhancer: String,
    pub enhancer_level: u32,

    pub enhancing_buff_level: u32,
    pub experience_buff_level: u32,

    pub enhancing_tea: TeaTier,
    pub blessed_tea: bool,
    pub wisdom_tea: bool,
    pub artisan_tea: bool,

    /// Flat success-rate bonus from achievements, in percent points.
    pub achievement_success_bonus: f64,
    /// Flat enhancement-material reduction from achievements, in percent.
    pub achievement_material_reduction: f64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            enhancing_level: 125,
            observatory_level: 8,
            enchanted_gloves_level: 10,
            guzzling_pouch_level: 8,
            enhancer_top_level: 8,
            enhancer_bottom_level: 8,
            philosophers_necklace_level: 7,
            enhancer: "celestial_enhancer".to_string(),
            enhancer_level: 14,
            enhancing_buff_level: 20,
            experience_buff_level: 20,
            enhancing_tea: TeaTier::Ultra,
            blessed_tea: true,
            wisdom_tea: true,
            artisan_tea: true,
            achievement_success_bonus: 0.2,
            achievement_material_reduction: 0.0,
        }
    }
}

/// Highest enhancement tier any gear slot can carry.
const MAX_GEAR_TIER: u32 = 20;

impl PlayerConfig {
    /// Check field ranges once at startup. The bonus model assumes these
    /// hold and does no further validation.
    pub fn validate(&self) -> Result<(), ForgeError> {
        let gear = [
            ("enchanted_gloves_level", self.enchanted_gloves_level),
            ("guzzling_pouch_level", self.guzzling_pouch_level),
            ("enhancer_top_level", self.enhancer_top_level),
            ("enhancer_bottom_level", self.enhancer_bottom_level),
            ("philosophers_necklace_level", self.philosophers_necklace_level),
            ("enhancer_level", self.enhancer_level),
        ];
        for (name, level) in gear {
            if level > MAX_GEAR_TIER {
                return Err(ForgeError::Config(format!(
                    "{name} is {level}, above the +{MAX_GEAR_TIER} cap"
                )));
            }
        }
        if self.enhancer.is_empty() {
            return Err(ForgeError::Config("enhancer tool must be named".to_string()));
        }
        if self.achievement_success_bonus < 0.0 || self.achievement_material_reduction < 0.0 {
            return Err(ForgeError::Config(
                "achievement bonuses cannot be negative".to_string(),
            ));
        }
        if self.achievement_material_reduction >= 100.0 {
            return Err(ForgeError::Config(
                "achievement material reduction must stay below 100%".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
