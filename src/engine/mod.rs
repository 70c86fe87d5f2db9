//! Evaluation engine.
//!
//! Wires the bonus profile, catalog, and quote snapshot into single-item
//! evaluations, and fans the batch "rank everything" sweep out across
//! worker threads. Every evaluation is independent and side-effect-free
//! over read-only data, so the sweep needs no locking.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::bonus::BonusProfile;
use crate::config::RankingConfig;
use crate::data::catalog::Catalog;
use crate::data::market::QuoteTable;
use crate::strategy::optimizer::ProtectionOptimizer;
use crate::strategy::profit::ProfitEvaluator;
use crate::types::{EnhancementPlan, PriceMode, ProfitReport};

/// One-stop evaluation surface over an immutable snapshot.
pub struct Evaluator<'a> {
    catalog: &'a Catalog,
    quotes: &'a QuoteTable,
    profile: &'a BonusProfile,
}

impl<'a> Evaluator<'a> {
    pub fn new(catalog: &'a Catalog, quotes: &'a QuoteTable, profile: &'a BonusProfile) -> Self {
        Self {
            catalog,
            quotes,
            profile,
        }
    }

    /// The cost-minimizing plan for one (item, target tier, stance).
    pub fn plan(&self, item_hrid: &str, target_tier: u32, mode: PriceMode) -> Option<EnhancementPlan> {
        ProtectionOptimizer::new(self.catalog, self.quotes, self.profile)
            .plan(item_hrid, target_tier, mode)
    }

    /// Full profit evaluation for one (item, target tier, stance).
    pub fn evaluate_profit(
        &self,
        item_hrid: &str,
        target_tier: u32,
        mode: PriceMode,
    ) -> Option<ProfitReport> {
        ProfitEvaluator::new(self.catalog, self.quotes, self.profile)
            .evaluate(item_hrid, target_tier, mode)
    }

    /// Evaluate every enhanceable item at every configured target tier and
    /// return the results sorted by profit, best first.
    ///
    /// Items whose hrid matches an exclusion fragment are skipped, as are
    /// evaluations that produce no result (no cost record, no liquidity,
    /// no priced protection).
    pub fn rank_all(&self, options: &RankingConfig, mode: PriceMode) -> Vec<ProfitReport> {
        let items = self.catalog.enhanceable_items();

        let pairs: Vec<(&str, u32)> = items
            .iter()
            .filter(|item| {
                let excluded = options
                    .exclude_prefixes
                    .iter()
                    .any(|fragment| item.hrid.contains(fragment.as_str()));
                if excluded {
                    debug!(item = %item.hrid, "Excluded from ranking");
                }
                !excluded
            })
            .flat_map(|item| {
                options
                    .target_tiers
                    .iter()
                    .map(move |tier| (item.hrid.as_str(), *tier))
            })
            .collect();

        let mut results: Vec<ProfitReport> = pairs
            .par_iter()
            .filter_map(|(hrid, target_tier)| self.evaluate_profit(hrid, *target_tier, mode))
            .collect();

        results.sort_by(|a, b| {
            b.profit
                .partial_cmp(&a.profit)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            evaluated = pairs.len(),
            ranked = results.len(),
            %mode,
            "Ranking complete"
        );

        results
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
