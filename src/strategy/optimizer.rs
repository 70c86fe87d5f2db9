//! Protection policy search.
//!
//! For every candidate protect tier in `[2, target]` the chain solver
//! yields expected attempts and protection uses; folding in resolved
//! prices gives a total cost per candidate. The minimum-cost candidate
//! becomes the plan, ties going to the earliest tier.

use tracing::debug;

use crate::bonus::{BonusProfile, MaterialKind};
use crate::data::catalog::Catalog;
use crate::data::market::QuoteTable;
use crate::pricing::PriceResolver;
use crate::solver::EnhanceChain;
use crate::types::{EnhancementPlan, MaterialLine, PriceMode, COIN};

/// Universal protection item, always considered as a candidate.
pub const MIRROR_OF_PROTECTION: &str = "/items/mirror_of_protection";

/// Refined variants are excluded from the protection candidate list.
pub const REFINED_MARKER: &str = "_refined";

/// Searches protection-tier candidates for the cost minimum.
pub struct ProtectionOptimizer<'a> {
    catalog: &'a Catalog,
    quotes: &'a QuoteTable,
    profile: &'a BonusProfile,
}

impl<'a> ProtectionOptimizer<'a> {
    pub fn new(catalog: &'a Catalog, quotes: &'a QuoteTable, profile: &'a BonusProfile) -> Self {
        Self {
            catalog,
            quotes,
            profile,
        }
    }

    /// Build the cost-minimizing plan for (item, target tier, stance).
    ///
    /// Returns None when the item is unknown, has no enhancement-cost
    /// record, or no protection candidate carries a positive price —
    /// batch ranking skips such items silently.
    pub fn plan(&self, item_hrid: &str, target_tier: u32, mode: PriceMode) -> Option<EnhancementPlan> {
        let item = self.catalog.item(item_hrid)?;
        let costs = item.enhancement_costs.as_ref()?;

        let resolver = PriceResolver::new(
            self.catalog,
            self.quotes,
            self.profile.material_multiplier(MaterialKind::Craft),
        );

        // Per-attempt materials: counts carry the enhancement-material
        // multiplier, the flat coin cost does not.
        let enhancement_multiplier = self.profile.material_multiplier(MaterialKind::Enhancement);
        let mut materials = Vec::new();
        let mut coin_cost = 0.0;
        for cost in costs {
            if cost.item == COIN {
                coin_cost += cost.count;
                continue;
            }
            let quote = resolver.acquisition_price(&cost.item, 0, mode);
            materials.push(MaterialLine {
                item: cost.item.clone(),
                count: cost.count * enhancement_multiplier,
                unit_price: quote.amount,
                source: quote.source,
            });
        }
        let material_cost_per_attempt =
            materials.iter().map(MaterialLine::cost).sum::<f64>() + coin_cost;

        let base = resolver.acquisition_price(item_hrid, 0, mode);

        // Protection selection happens once per evaluation, not per
        // candidate: cheapest positive-priced option wins, first on ties.
        let mut options: Vec<(String, f64)> = vec![
            (
                MIRROR_OF_PROTECTION.to_string(),
                resolver.acquisition_price(MIRROR_OF_PROTECTION, 0, mode).amount,
            ),
            (item_hrid.to_string(), base.amount),
        ];
        for candidate in &item.protection_items {
            if candidate.contains(REFINED_MARKER) {
                continue;
            }
            let price = resolver.acquisition_price(candidate, 0, mode).amount;
            options.push((candidate.clone(), price));
        }

        let mut protection: Option<(&str, f64)> = None;
        for (hrid, price) in &options {
            if *price <= 0.0 {
                continue;
            }
            if protection.map_or(true, |(_, best)| *price < best) {
                protection = Some((hrid.as_str(), *price));
            }
        }
        let Some((protect_item, protect_price)) = protection else {
            debug!(item = item_hrid, "No positively priced protection candidate");
            return None;
        };
        let protect_item = protect_item.to_string();

        let chain = EnhanceChain::for_item(self.profile, item.level, target_tier);
        let attempt_secs = self.profile.attempt_time_secs(item.level);

        let mut best: Option<EnhancementPlan> = None;
        for protect_tier in 2..=target_tier {
            let markov = chain.solve(protect_tier);
            let total_cost = base.amount
                + markov.expected_attempts * material_cost_per_attempt
                + markov.expected_protect_uses * protect_price;

            debug!(
                item = item_hrid,
                protect_tier,
                total_cost,
                attempts = markov.expected_attempts,
                "Protection candidate evaluated"
            );

            if best.as_ref().map_or(true, |plan| total_cost < plan.total_cost) {
                best = Some(EnhancementPlan {
                    item: item_hrid.to_string(),
                    item_name: item.name.clone(),
                    item_level: item.level,
                    target_tier,
                    protect_tier,
                    markov,
                    base_price: base.amount,
                    base_source: base.source,
                    materials: materials.clone(),
                    coin_cost,
                    material_cost_per_attempt,
                    protect_item: protect_item.clone(),
                    protect_price,
                    attempt_secs,
                    total_cost,
                });
            }
        }

        best
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::catalog::{ItemRecord, MaterialCost, EQUIPMENT_CATEGORY};
    use crate::types::PriceSource;
    use std::collections::HashMap;

    fn profile() -> BonusProfile {
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

    fn spear() -> ItemRecord {
        ItemRecord {
            hrid: "/items/azure_spear".to_string(),
            name: "Azure Spear".to_string(),
            level: 50,
            category: EQUIPMENT_CATEGORY.to_string(),
            enhancement_costs: Some(vec![
                MaterialCost {
                    item: "/items/azure_plate".to_string(),
                    count: 2.0,
                },
                MaterialCost {
                    item: COIN.to_string(),
                    count: 500.0,
                },
            ]),
            protection_items: vec![
                "/items/protective_sigil".to_string(),
                "/items/azure_spear_refined".to_string(),
            ],
            ..Default::default()
        }
    }

    fn fixture() -> (Catalog, QuoteTable) {
        let catalog = Catalog::new(
            vec![
                spear(),
                ItemRecord {
                    hrid: "/items/azure_plate".to_string(),
                    ..Default::default()
                },
                ItemRecord {
                    hrid: MIRROR_OF_PROTECTION.to_string(),
                    ..Default::default()
                },
                ItemRecord {
                    hrid: "/items/protective_sigil".to_string(),
                    ..Default::default()
                },
                ItemRecord {
                    hrid: "/items/azure_spear_refined".to_string(),
                    ..Default::default()
                },
            ],
            HashMap::new(),
        );

        let mut quotes = QuoteTable::new();
        quotes.insert("/items/azure_spear", 0, Some(100_000.0), Some(90_000.0));
        quotes.insert("/items/azure_plate", 0, Some(1_000.0), Some(900.0));
        quotes.insert(MIRROR_OF_PROTECTION, 0, Some(800_000.0), Some(750_000.0));
        quotes.insert("/items/protective_sigil", 0, Some(50_000.0), Some(45_000.0));
        // The refined variant is cheap on purpose: it must stay excluded.
        quotes.insert("/items/azure_spear_refined", 0, Some(10.0), Some(5.0));
        (catalog, quotes)
    }

    #[test]
    fn test_plan_basic_breakdown() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);

        let plan = optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .unwrap();

        assert_eq!(plan.item, "/items/azure_spear");
        assert_eq!(plan.item_level, 50);
        assert_eq!(plan.target_tier, 5);
        assert_eq!(plan.base_price, 100_000.0);
        assert_eq!(plan.base_source, PriceSource::Market);
        assert_eq!(plan.coin_cost, 500.0);
        // 2 plates at 1000 plus the flat coin cost.
        assert!((plan.material_cost_per_attempt - 2_500.0).abs() < 1e-9);
        assert!((2..=5).contains(&plan.protect_tier));
        assert!(plan.markov.expected_attempts >= 1.0);
    }

    #[test]
    fn test_protection_picks_cheapest_excluding_refined() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);

        let plan = optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .unwrap();
        // Sigil (50k) beats the item itself (100k) and the mirror (800k);
        // the 10-coin refined variant is out of consideration.
        assert_eq!(plan.protect_item, "/items/protective_sigil");
        assert_eq!(plan.protect_price, 50_000.0);
    }

    #[test]
    fn test_plan_is_minimum_over_all_candidates() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        let plan = optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .unwrap();

        // Re-derive every candidate total independently.
        let chain = EnhanceChain::for_item(&profile, 50, 5);
        let mut candidates = Vec::new();
        for protect_tier in 2..=5u32 {
            let markov = chain.solve(protect_tier);
            let total = plan.base_price
                + markov.expected_attempts * plan.material_cost_per_attempt
                + markov.expected_protect_uses * plan.protect_price;
            candidates.push((protect_tier, total));
        }
        assert_eq!(candidates.len(), 4); // exactly {2, 3, 4, 5}

        for (protect_tier, total) in &candidates {
            assert!(
                plan.total_cost <= *total + 1e-6,
                "candidate +{protect_tier} beats the plan"
            );
        }
        let min = candidates
            .iter()
            .map(|(_, total)| *total)
            .fold(f64::INFINITY, f64::min);
        assert!((plan.total_cost - min).abs() < 1e-6);
    }

    #[test]
    fn test_reconstruction_law() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        let plan = optimizer
            .plan("/items/azure_spear", 6, PriceMode::Midpoint)
            .unwrap();

        let rebuilt = plan.base_price
            + plan.markov.expected_attempts * plan.material_cost_per_attempt
            + plan.markov.expected_protect_uses * plan.protect_price;
        assert!((rebuilt - plan.total_cost).abs() < 1e-6);
    }

    #[test]
    fn test_tie_breaks_to_earliest_candidate() {
        let (catalog, quotes) = fixture();
        // A huge multiplier clamps every success chance to 1: no failures,
        // identical totals for every protect tier.
        let mut profile = profile();
        profile.effective_level = 10_000.0;
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);

        let plan = optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .unwrap();
        assert_eq!(plan.protect_tier, 2);
        assert!(plan.markov.expected_protect_uses.abs() < 1e-9);
    }

    #[test]
    fn test_unknown_item_yields_none() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        assert!(optimizer.plan("/items/unknown", 5, PriceMode::Midpoint).is_none());
    }

    #[test]
    fn test_item_without_cost_record_yields_none() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        assert!(optimizer
            .plan("/items/azure_plate", 5, PriceMode::Midpoint)
            .is_none());
    }

    #[test]
    fn test_no_priced_protection_yields_none() {
        let catalog = Catalog::new(vec![spear()], HashMap::new());
        // No quotes at all: base, mirror, and sigil all resolve to none.
        let quotes = QuoteTable::new();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        assert!(optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .is_none());
    }

    #[test]
    fn test_target_one_has_no_candidates() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        // The candidate interval [2, 1] is empty.
        assert!(optimizer
            .plan("/items/azure_spear", 1, PriceMode::Pessimistic)
            .is_none());
    }

    #[test]
    fn test_enhancement_material_multiplier_applies() {
        let (catalog, quotes) = fixture();
        let mut profile = profile();
        profile.enhancement_material_multiplier = 0.9;
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        let plan = optimizer
            .plan("/items/azure_spear", 5, PriceMode::Pessimistic)
            .unwrap();
        // Plates discounted to 1.8, the flat coin cost untouched.
        assert!((plan.materials[0].count - 1.8).abs() < 1e-12);
        assert!((plan.material_cost_per_attempt - (1.8 * 1000.0 + 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_plan_is_pure() {
        let (catalog, quotes) = fixture();
        let profile = profile();
        let optimizer = ProtectionOptimizer::new(&catalog, &quotes, &profile);
        let a = optimizer.plan("/items/azure_spear", 5, PriceMode::Pessimistic).unwrap();
        let b = optimizer.plan("/items/azure_spear", 5, PriceMode::Pessimistic).unwrap();
        assert_eq!(a.total_cost, b.total_cost);
        assert_eq!(a.protect_tier, b.protect_tier);
    }
}
