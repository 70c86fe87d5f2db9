//! Price resolution.
//!
//! Turns two-sided market quotes into single prices under a pricing stance,
//! prices craftable items recursively through the recipe graph, and picks
//! the rational acquisition price (never above the cheaper of market and
//! craft). Missing data resolves to a zero/"none" quote, never an error.

use tracing::debug;

use crate::data::catalog::Catalog;
use crate::data::market::QuoteTable;
use crate::types::{Direction, PriceMode, PriceQuote, PriceSource, COIN};

/// Recursion bound for the recipe graph. Exceeding it yields 0 ("unknown",
/// not "free") so malformed or cyclic graphs terminate.
pub const MAX_CRAFT_DEPTH: u32 = 10;

/// Trainee charms are sold by the vendor at a fixed price regardless of
/// market state.
const TRAINEE_CHARM_VENDOR_PRICE: f64 = 250_000.0;

fn is_trainee_charm(hrid: &str) -> bool {
    hrid.contains("trainee") && hrid.contains("charm")
}

/// Resolves prices against an immutable catalog + quote snapshot.
///
/// Stateless: identical inputs always produce identical outputs.
pub struct PriceResolver<'a> {
    catalog: &'a Catalog,
    quotes: &'a QuoteTable,
    /// Count multiplier applied to recipe inputs (upgrade inputs exempt).
    craft_multiplier: f64,
}

impl<'a> PriceResolver<'a> {
    pub fn new(catalog: &'a Catalog, quotes: &'a QuoteTable, craft_multiplier: f64) -> Self {
        Self {
            catalog,
            quotes,
            craft_multiplier,
        }
    }

    /// Resolve the two-sided quote for (item, tier) into a single price
    /// under the given stance and direction.
    ///
    /// Buy stances read ask-first (pessimistic) or bid-first (optimistic),
    /// falling back to the other side when the preferred one is absent;
    /// sell stances swap the roles. Midpoint averages both sides when both
    /// are present. No liquidity on either side yields `{0, none}`.
    pub fn quote(&self, hrid: &str, tier: u32, mode: PriceMode, direction: Direction) -> PriceQuote {
        if hrid == COIN {
            return PriceQuote {
                amount: 1.0,
                source: PriceSource::Fixed,
            };
        }

        let Some(market) = self.quotes.quote(hrid, tier) else {
            return PriceQuote::none();
        };

        // The worse execution for a buyer is the ask; for a seller, the bid.
        let (worst, best) = match direction {
            Direction::Buy => (market.ask, market.bid),
            Direction::Sell => (market.bid, market.ask),
        };

        let amount = match mode {
            PriceMode::Pessimistic => worst.or(best),
            PriceMode::Optimistic => best.or(worst),
            PriceMode::Midpoint => match (market.ask, market.bid) {
                (Some(a), Some(b)) => Some((a + b) / 2.0),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            },
        };

        match amount {
            Some(amount) => PriceQuote {
                amount,
                source: PriceSource::Market,
            },
            None => PriceQuote::none(),
        }
    }

    /// Cost of producing one unit of `hrid` from its recipe, pricing each
    /// input recursively. Returns 0 when the item has no recipe, is not of
    /// a craftable category, or the depth cap is exceeded.
    pub fn crafting_cost(&self, hrid: &str, mode: PriceMode, depth: u32) -> f64 {
        if depth > MAX_CRAFT_DEPTH {
            debug!(item = hrid, depth, "Crafting recursion cap hit");
            return 0.0;
        }
        let Some(item) = self.catalog.item(hrid) else {
            return 0.0;
        };
        if !item.is_craftable() {
            return 0.0;
        }
        let Some(recipe) = self.catalog.recipe_for(hrid) else {
            return 0.0;
        };

        let mut cost = 0.0;
        for input in &recipe.inputs {
            let price = self.acquisition_price_at(&input.item, 0, mode, depth + 1);
            cost += input.count * self.craft_multiplier * price.amount;
        }
        // The upgrade input is a required base component: full count, no
        // crafting reduction.
        if let Some(upgrade) = &recipe.upgrade {
            cost += self.acquisition_price_at(upgrade, 0, mode, depth + 1).amount;
        }
        cost
    }

    /// The rational acquisition price for (item, tier): the cheaper of
    /// market and craft at tier 0, market alone above tier 0, then the
    /// vendor table, then `{0, none}`.
    pub fn acquisition_price(&self, hrid: &str, tier: u32, mode: PriceMode) -> PriceQuote {
        self.acquisition_price_at(hrid, tier, mode, 0)
    }

    fn acquisition_price_at(&self, hrid: &str, tier: u32, mode: PriceMode, depth: u32) -> PriceQuote {
        if hrid == COIN {
            return PriceQuote {
                amount: 1.0,
                source: PriceSource::Fixed,
            };
        }
        if is_trainee_charm(hrid) {
            return PriceQuote {
                amount: TRAINEE_CHARM_VENDOR_PRICE,
                source: PriceSource::Vendor,
            };
        }

        let market = self.quote(hrid, tier, mode, Direction::Buy);

        if tier == 0 {
            let craft = self.crafting_cost(hrid, mode, depth);
            if market.amount > 0.0 && craft > 0.0 {
                // Rational actor: never pay above the cheaper alternative.
                return if craft < market.amount {
                    debug!(item = hrid, craft, market = market.amount, "Crafting beats market");
                    PriceQuote {
                        amount: craft,
                        source: PriceSource::Craft,
                    }
                } else {
                    market
                };
            }
            if market.amount > 0.0 {
                return market;
            }
            if craft > 0.0 {
                return PriceQuote {
                    amount: craft,
                    source: PriceSource::Craft,
                };
            }
        } else if market.amount > 0.0 {
            return market;
        }

        let vendor = self
            .catalog
            .item(hrid)
            .map(|item| item.sell_price)
            .unwrap_or(0.0);
        if vendor > 0.0 {
            return PriceQuote {
                amount: vendor,
                source: PriceSource::Vendor,
            };
        }

        PriceQuote::none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
