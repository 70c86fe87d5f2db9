//! Profit evaluation.
//!
//! Folds the optimizer's plan together with the sale price at the target
//! tier into profit, fee-adjusted profit, ROI, and per-day throughput.

use tracing::debug;

use crate::bonus::BonusProfile;
use crate::data::catalog::Catalog;
use crate::data::market::QuoteTable;
use crate::pricing::PriceResolver;
use crate::strategy::optimizer::ProtectionOptimizer;
use crate::types::{Direction, PriceMode, ProfitReport};

/// Flat marketplace fee charged on the sale.
pub const MARKET_FEE_RATE: f64 = 0.02;

/// Terminal consumer of the pipeline: plan + sale price -> profit metrics.
pub struct ProfitEvaluator<'a> {
    catalog: &'a Catalog,
    quotes: &'a QuoteTable,
    profile: &'a BonusProfile,
}

impl<'a> ProfitEvaluator<'a> {
    pub fn new(catalog: &'a Catalog, quotes: &'a QuoteTable, profile: &'a BonusProfile) -> Self {
        Self {
            catalog,
            quotes,
            profile,
        }
    }

    /// Evaluate one (item, target tier, stance). Returns None when no plan
    /// exists or the enhanced item has no sale price.
    pub fn evaluate(&self, item_hrid: &str, target_tier: u32, mode: PriceMode) -> Option<ProfitReport> {
        let optimizer = ProtectionOptimizer::new(self.catalog, self.quotes, self.profile);
        let plan = optimizer.plan(item_hrid, target_tier, mode)?;

        let resolver = PriceResolver::new(self.catalog, self.quotes, self.profile.craft_material_multiplier);
        let sell = resolver.quote(item_hrid, target_tier, mode, Direction::Sell);
        if sell.amount <= 0.0 {
            debug!(item = item_hrid, target_tier, "No sale price at target tier");
            return None;
        }
        let sell_price = sell.amount;

        let market_fee = sell_price * MARKET_FEE_RATE;
        let profit = sell_price - plan.total_cost;
        let profit_after_fee = profit - market_fee;
        let roi = if plan.total_cost > 0.0 {
            profit / plan.total_cost * 100.0
        } else {
            0.0
        };
        let roi_after_fee = if plan.total_cost > 0.0 {
            profit_after_fee / plan.total_cost * 100.0
        } else {
            0.0
        };

        let time_secs = plan.markov.expected_attempts * plan.attempt_secs;
        let time_hours = time_secs / 3600.0;
        let time_days = time_hours / 24.0;
        let per_day = |value: f64| if time_days > 0.0 { value / time_days } else { 0.0 };

        let profit_per_day = per_day(profit);
        let profit_per_day_after_fee = per_day(profit_after_fee);
        let xp_per_day = per_day(plan.markov.expected_xp);

        Some(ProfitReport {
            plan,
            sell_price,
            market_fee,
            profit,
            profit_after_fee,
            roi,
            roi_after_fee,
            time_hours,
            time_days,
            profit_per_day,
            profit_per_day_after_fee,
            xp_per_day,
            mode,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
