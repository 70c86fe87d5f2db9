//! Player bonus model.
//!
//! Derives the scalar multipliers the solver and optimizer consume —
//! success-rate multiplier, attempt time, material-cost multipliers,
//! experience per action, blessed proc chance — from the player's gear,
//! buff, and tea loadout plus catalog stats. Everything here is a pure
//! function of the configuration and an item level; no I/O, no mutation.

use crate::config::PlayerConfig;
use crate::data::catalog::Catalog;

// ---------------------------------------------------------------------------
// Static tables (tiers 0–20)
// ---------------------------------------------------------------------------

/// Stat multiplier granted to a piece of gear by its own enhancement tier.
pub const ENHANCE_BONUS: [f64; 21] = [
    1.000, 1.020, 1.042, 1.066, 1.092, // +0 to +4
    1.120, 1.150, 1.182, 1.216, 1.252, // +5 to +9
    1.290, 1.334, 1.384, 1.440, 1.502, // +10 to +14
    1.570, 1.644, 1.724, 1.810, 1.902, // +15 to +19
    2.000, // +20
];

/// Base success percent for the attempt made at each tier (tier i -> i+1).
pub const SUCCESS_RATE_PCT: [f64; 20] = [
    50.0, 45.0, 45.0, 40.0, 40.0, 40.0, 35.0, 35.0, 35.0, 35.0, // +0 to +9
    30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, 30.0, // +10 to +19
];

/// Gear-tier multiplier, clamped to the table's last entry past +20.
pub fn enhance_bonus(level: u32) -> f64 {
    ENHANCE_BONUS
        .get(level as usize)
        .copied()
        .unwrap_or(ENHANCE_BONUS[ENHANCE_BONUS.len() - 1])
}

/// Base success rate as a fraction for the attempt made at `tier`,
/// clamped to the table's last entry past the end.
pub fn base_success_rate(tier: u32) -> f64 {
    SUCCESS_RATE_PCT
        .get(tier as usize)
        .copied()
        .unwrap_or(SUCCESS_RATE_PCT[SUCCESS_RATE_PCT.len() - 1])
        / 100.0
}

/// Unmodified duration of one enhancement attempt.
pub const BASE_ATTEMPT_SECS: f64 = 12.0;

/// Blessed tea proc chance per successful attempt, before concentration.
pub const BLESSED_BASE_CHANCE: f64 = 0.01;

/// Artisan tea crafting-material reduction, before concentration.
pub const ARTISAN_REDUCTION: f64 = 0.10;

// Gear slots read from the catalog when deriving a profile.
const GUZZLING_POUCH: &str = "/items/guzzling_pouch";
const ENCHANTED_GLOVES: &str = "/items/enchanted_gloves";
const ENHANCERS_TOP: &str = "/items/enhancers_top";
const ENHANCERS_BOTTOMS: &str = "/items/enhancers_bottoms";
const PHILOSOPHERS_NECKLACE: &str = "/items/philosophers_necklace";

/// The necklace's skilling stats scale five times faster than its own
/// tier bonus.
fn philosopher_scale(level: u32) -> f64 {
    (enhance_bonus(level) - 1.0) * 5.0 + 1.0
}

// ---------------------------------------------------------------------------
// Bonus profile
// ---------------------------------------------------------------------------

/// Which material list a multiplier applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// Per-attempt enhancement materials.
    Enhancement,
    /// Recipe inputs when crafting the base item.
    Craft,
}

/// Stateless snapshot of every derived bonus, computed once per run from
/// the player configuration and catalog stats. Never mutated.
#[derive(Debug, Clone)]
pub struct BonusProfile {
    /// Enhancing level including tea bonus (fractional once teas apply).
    pub effective_level: f64,
    pub observatory_level: f64,
    /// Enhancer tool + achievement success bonus, in percent points.
    pub tool_bonus: f64,
    /// Drink concentration multiplier from the guzzling pouch.
    pub concentration: f64,
    /// Summed gear and buff speed contributions, in percent points.
    pub gear_speed_bonus: f64,
    /// Tea speed contribution, in percent points.
    pub tea_speed_bonus: f64,
    /// Fractional experience bonus.
    pub xp_bonus: f64,
    /// Chance for a successful attempt to advance two tiers.
    pub blessed_proc_chance: f64,
    pub enhancement_material_multiplier: f64,
    pub craft_material_multiplier: f64,
}

impl BonusProfile {
    /// Derive the full profile from configuration plus catalog stats.
    pub fn derive(config: &PlayerConfig, catalog: &Catalog) -> Self {
        let concentration =
            1.0 + catalog.stat(GUZZLING_POUCH, "drinkConcentration")
                * enhance_bonus(config.guzzling_pouch_level);

        let enhancer_hrid = format!("/items/{}", config.enhancer);
        let enhancer_bonus = catalog.stat(&enhancer_hrid, "enhancingSuccess")
            * 100.0
            * enhance_bonus(config.enhancer_level);
        let tool_bonus = enhancer_bonus + config.achievement_success_bonus;

        let effective_level =
            config.enhancing_level as f64 + config.enhancing_tea.level_bonus() * concentration;
        let tea_speed_bonus = config.enhancing_tea.speed_bonus() * concentration;

        let mut gear_speed_bonus = 0.0;
        if config.enchanted_gloves_level > 0 {
            gear_speed_bonus += catalog.stat(ENCHANTED_GLOVES, "enhancingSpeed")
                * 100.0
                * enhance_bonus(config.enchanted_gloves_level);
        }
        if config.enhancer_top_level > 0 {
            gear_speed_bonus += catalog.stat(ENHANCERS_TOP, "enhancingSpeed")
                * 100.0
                * enhance_bonus(config.enhancer_top_level);
        }
        if config.enhancer_bottom_level > 0 {
            gear_speed_bonus += catalog.stat(ENHANCERS_BOTTOMS, "enhancingSpeed")
                * 100.0
                * enhance_bonus(config.enhancer_bottom_level);
        }
        if config.philosophers_necklace_level > 0 {
            gear_speed_bonus += catalog.stat(PHILOSOPHERS_NECKLACE, "skillingSpeed")
                * 100.0
                * philosopher_scale(config.philosophers_necklace_level);
        }
        if config.enhancing_buff_level > 0 {
            gear_speed_bonus += 19.5 + 0.5 * config.enhancing_buff_level as f64;
        }

        let mut xp_bonus = 0.0;
        if config.wisdom_tea {
            xp_bonus += 0.12 * concentration;
        }
        if config.enhancer_bottom_level > 0 {
            xp_bonus += catalog.stat(ENHANCERS_BOTTOMS, "enhancingExperience")
                * enhance_bonus(config.enhancer_bottom_level);
        }
        if config.philosophers_necklace_level > 0 {
            xp_bonus += catalog.stat(PHILOSOPHERS_NECKLACE, "skillingExperience")
                * philosopher_scale(config.philosophers_necklace_level);
        }
        if config.experience_buff_level > 0 {
            xp_bonus += 0.195 + 0.005 * config.experience_buff_level as f64;
        }

        let blessed_proc_chance = if config.blessed_tea {
            BLESSED_BASE_CHANCE * concentration
        } else {
            0.0
        };

        let enhancement_material_multiplier = 1.0 - config.achievement_material_reduction / 100.0;
        let craft_material_multiplier = if config.artisan_tea {
            1.0 - ARTISAN_REDUCTION * concentration
        } else {
            1.0
        };

        BonusProfile {
            effective_level,
            observatory_level: config.observatory_level as f64,
            tool_bonus,
            concentration,
            gear_speed_bonus,
            tea_speed_bonus,
            xp_bonus,
            blessed_proc_chance,
            enhancement_material_multiplier,
            craft_material_multiplier,
        }
    }

    /// Success-rate multiplier applied to the base per-tier rates.
    ///
    /// Below the item's level the 0.5-scaled penalty term applies and the
    /// observatory no longer contributes through the level surplus.
    pub fn success_multiplier(&self, item_level: u32) -> f64 {
        let item_level = item_level as f64;
        if self.effective_level >= item_level {
            1.0 + (0.05 * (self.effective_level + self.observatory_level - item_level)
                + self.tool_bonus)
                / 100.0
        } else {
            (1.0 - 0.5 * (1.0 - self.effective_level / item_level))
                + (0.05 * self.observatory_level + self.tool_bonus) / 100.0
        }
    }

    /// Duration of one attempt in seconds.
    ///
    /// The level surplus (with the observatory folded in) only speeds up
    /// attempts above the item's level; at or below, the observatory
    /// contributes alone.
    pub fn attempt_time_secs(&self, item_level: u32) -> f64 {
        let item_level = item_level as f64;
        let speed = if self.effective_level > item_level {
            (self.effective_level + self.observatory_level - item_level)
                + self.gear_speed_bonus
                + self.tea_speed_bonus
        } else {
            self.observatory_level + self.gear_speed_bonus + self.tea_speed_bonus
        };
        BASE_ATTEMPT_SECS / (1.0 + speed / 100.0)
    }

    /// Count multiplier for the given material list.
    pub fn material_multiplier(&self, kind: MaterialKind) -> f64 {
        match kind {
            MaterialKind::Enhancement => self.enhancement_material_multiplier,
            MaterialKind::Craft => self.craft_material_multiplier,
        }
    }

    /// Experience credited for one attempt made at `tier`.
    pub fn xp_per_action(&self, item_level: u32, tier: u32) -> f64 {
        let base = 1.4 * (1.0 + tier as f64) * (10.0 + item_level as f64);
        base * (1.0 + self.xp_bonus)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TeaTier;
    use crate::data::catalog::ItemRecord;
    use std::collections::HashMap;

    fn bare_profile() -> BonusProfile {
        BonusProfile {
            effective_level: 100.0,
            observatory_level: 0.0,
            tool_bonus: 0.0,
            concentration: 1.0,
            gear_speed_bonus: 0.0,
            tea_speed_bonus: 0.0,
            xp_bonus: 0.0,
            blessed_proc_chance: 0.0,
            enhancement_material_multiplier: 1.0,
            craft_material_multiplier: 1.0,
        }
    }

    fn gear_item(hrid: &str, stats: &[(&str, f64)]) -> ItemRecord {
        ItemRecord {
            hrid: hrid.to_string(),
            stats: stats
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
            ..Default::default()
        }
    }

    fn gear_catalog() -> Catalog {
        Catalog::new(
            vec![
                gear_item(GUZZLING_POUCH, &[("drinkConcentration", 0.1)]),
                gear_item("/items/celestial_enhancer", &[("enhancingSuccess", 0.05)]),
                gear_item(ENCHANTED_GLOVES, &[("enhancingSpeed", 0.1)]),
                gear_item(ENHANCERS_TOP, &[("enhancingSpeed", 0.05)]),
                gear_item(
                    ENHANCERS_BOTTOMS,
                    &[("enhancingSpeed", 0.05), ("enhancingExperience", 0.02)],
                ),
                gear_item(
                    PHILOSOPHERS_NECKLACE,
                    &[("skillingSpeed", 0.02), ("skillingExperience", 0.01)],
                ),
            ],
            HashMap::new(),
        )
    }

    // -- Table tests --

    #[test]
    fn test_enhance_bonus_bounds() {
        assert_eq!(enhance_bonus(0), 1.0);
        assert_eq!(enhance_bonus(8), 1.216);
        assert_eq!(enhance_bonus(20), 2.0);
        // Past the table end, clamp to the last entry instead of wrapping.
        assert_eq!(enhance_bonus(25), 2.0);
    }

    #[test]
    fn test_base_success_rate_schedule() {
        assert_eq!(base_success_rate(0), 0.50);
        assert_eq!(base_success_rate(1), 0.45);
        assert_eq!(base_success_rate(6), 0.35);
        assert_eq!(base_success_rate(10), 0.30);
        assert_eq!(base_success_rate(19), 0.30);
        assert_eq!(base_success_rate(40), 0.30);
    }

    #[test]
    fn test_success_rates_non_increasing() {
        for i in 1..SUCCESS_RATE_PCT.len() {
            assert!(SUCCESS_RATE_PCT[i] <= SUCCESS_RATE_PCT[i - 1]);
        }
    }

    // -- Success multiplier branches --

    #[test]
    fn test_success_multiplier_at_level() {
        let mut p = bare_profile();
        p.effective_level = 50.0;
        // eff == item level, no observatory, no tool: exactly 1.0
        assert!((p.success_multiplier(50) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_success_multiplier_above_level() {
        let mut p = bare_profile();
        p.effective_level = 133.9728;
        p.observatory_level = 8.0;
        p.tool_bonus = 7.71;
        // 1 + (0.05 * (133.9728 + 8 - 50) + 7.71) / 100
        let expected = 1.0 + (0.05 * 91.9728 + 7.71) / 100.0;
        assert!((p.success_multiplier(50) - expected).abs() < 1e-12);
        assert!((p.success_multiplier(50) - 1.1230864).abs() < 1e-7);
    }

    #[test]
    fn test_success_multiplier_below_level_penalty() {
        let mut p = bare_profile();
        p.effective_level = 50.0;
        // Half a level short scales the penalty by 0.5: 1 - 0.5*(1 - 0.5)
        assert!((p.success_multiplier(100) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_success_multiplier_below_level_observatory() {
        let mut p = bare_profile();
        p.effective_level = 50.0;
        p.observatory_level = 10.0;
        p.tool_bonus = 2.0;
        // Below level the observatory only enters through the flat term.
        let expected = 0.75 + (0.05 * 10.0 + 2.0) / 100.0;
        assert!((p.success_multiplier(100) - expected).abs() < 1e-12);
    }

    // -- Attempt time branches --

    #[test]
    fn test_attempt_time_above_level() {
        let mut p = bare_profile();
        p.effective_level = 100.0;
        p.observatory_level = 8.0;
        let expected = BASE_ATTEMPT_SECS / (1.0 + (100.0 + 8.0 - 50.0) / 100.0);
        assert!((p.attempt_time_secs(50) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_attempt_time_at_level_drops_surplus() {
        let mut p = bare_profile();
        p.effective_level = 50.0;
        p.observatory_level = 8.0;
        p.gear_speed_bonus = 20.0;
        // eff == item level takes the no-surplus branch.
        let expected = BASE_ATTEMPT_SECS / (1.0 + 28.0 / 100.0);
        assert!((p.attempt_time_secs(50) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_attempt_time_unbuffed_is_base() {
        let mut p = bare_profile();
        p.effective_level = 10.0;
        assert!((p.attempt_time_secs(50) - BASE_ATTEMPT_SECS).abs() < 1e-12);
    }

    // -- Material multipliers --

    #[test]
    fn test_material_multiplier_enhancement_flat() {
        let mut p = bare_profile();
        p.enhancement_material_multiplier = 0.985;
        assert_eq!(p.material_multiplier(MaterialKind::Enhancement), 0.985);
        assert_eq!(p.material_multiplier(MaterialKind::Craft), 1.0);
    }

    // -- XP --

    #[test]
    fn test_xp_per_action_base() {
        let p = bare_profile();
        // 1.4 * (1 + 0) * (10 + 50)
        assert!((p.xp_per_action(50, 0) - 84.0).abs() < 1e-12);
        // Scales linearly with the tier being attempted.
        assert!((p.xp_per_action(50, 4) - 420.0).abs() < 1e-12);
    }

    #[test]
    fn test_xp_per_action_with_bonus() {
        let mut p = bare_profile();
        p.xp_bonus = 0.5;
        assert!((p.xp_per_action(50, 0) - 126.0).abs() < 1e-12);
    }

    // -- Profile derivation --

    #[test]
    fn test_derive_concentration_and_tool() {
        let profile = BonusProfile::derive(&PlayerConfig::default(), &gear_catalog());
        // 1 + 0.1 * ENHANCE_BONUS[8]
        assert!((profile.concentration - 1.1216).abs() < 1e-9);
        // 0.05 * 100 * ENHANCE_BONUS[14] + 0.2 achievement
        assert!((profile.tool_bonus - (7.51 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn test_derive_effective_level_with_tea() {
        let profile = BonusProfile::derive(&PlayerConfig::default(), &gear_catalog());
        // 125 + 8 * concentration (ultra tea)
        assert!((profile.effective_level - (125.0 + 8.0 * 1.1216)).abs() < 1e-9);
        assert!((profile.tea_speed_bonus - 6.0 * 1.1216).abs() < 1e-9);
    }

    #[test]
    fn test_derive_gear_speed() {
        let profile = BonusProfile::derive(&PlayerConfig::default(), &gear_catalog());
        let expected = 0.1 * 100.0 * enhance_bonus(10)       // gloves
            + 0.05 * 100.0 * enhance_bonus(8)                // top
            + 0.05 * 100.0 * enhance_bonus(8)                // bottoms
            + 0.02 * 100.0 * ((enhance_bonus(7) - 1.0) * 5.0 + 1.0) // necklace
            + 19.5 + 0.5 * 20.0; // buff
        assert!((profile.gear_speed_bonus - expected).abs() < 1e-9);
    }

    #[test]
    fn test_derive_xp_bonus() {
        let profile = BonusProfile::derive(&PlayerConfig::default(), &gear_catalog());
        let expected = 0.12 * 1.1216
            + 0.02 * enhance_bonus(8)
            + 0.01 * ((enhance_bonus(7) - 1.0) * 5.0 + 1.0)
            + 0.195 + 0.005 * 20.0;
        assert!((profile.xp_bonus - expected).abs() < 1e-9);
    }

    #[test]
    fn test_derive_blessed_and_materials() {
        let profile = BonusProfile::derive(&PlayerConfig::default(), &gear_catalog());
        assert!((profile.blessed_proc_chance - 0.01 * 1.1216).abs() < 1e-9);
        // Artisan reduction compounds with concentration.
        assert!((profile.craft_material_multiplier - (1.0 - 0.10 * 1.1216)).abs() < 1e-9);
        assert_eq!(profile.enhancement_material_multiplier, 1.0);
    }

    #[test]
    fn test_derive_without_teas() {
        let config = PlayerConfig {
            enhancing_tea: TeaTier::None,
            blessed_tea: false,
            wisdom_tea: false,
            artisan_tea: false,
            ..Default::default()
        };
        let profile = BonusProfile::derive(&config, &gear_catalog());
        assert_eq!(profile.effective_level, 125.0);
        assert_eq!(profile.tea_speed_bonus, 0.0);
        assert_eq!(profile.blessed_proc_chance, 0.0);
        assert_eq!(profile.craft_material_multiplier, 1.0);
    }

    #[test]
    fn test_derive_level_zero_gear_unequipped() {
        let config = PlayerConfig {
            enchanted_gloves_level: 0,
            enhancer_top_level: 0,
            enhancer_bottom_level: 0,
            philosophers_necklace_level: 0,
            enhancing_buff_level: 0,
            ..Default::default()
        };
        let profile = BonusProfile::derive(&config, &gear_catalog());
        assert_eq!(profile.gear_speed_bonus, 0.0);
    }

    #[test]
    fn test_derive_achievement_material_reduction() {
        let config = PlayerConfig {
            achievement_material_reduction: 1.5,
            ..Default::default()
        };
        let profile = BonusProfile::derive(&config, &gear_catalog());
        assert!((profile.enhancement_material_multiplier - 0.985).abs() < 1e-12);
    }
}
