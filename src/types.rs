//! Shared types for the FORGE analyzer.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that pricing, solver, and
//! strategy modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The currency item. The only legitimately free-to-price item in the
/// catalog — always quoted at a fixed 1 coin.
pub const COIN: &str = "/items/coin";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Pricing stance used when turning a two-sided quote into a single number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceMode {
    /// Assume the worst execution: buy at ask, sell at bid.
    Pessimistic,
    /// Assume the best execution: buy at bid, sell at ask.
    Optimistic,
    /// Average both sides when available.
    Midpoint,
}

impl PriceMode {
    /// All stances (useful for iteration in tests and exports).
    pub const ALL: &'static [PriceMode] = &[
        PriceMode::Pessimistic,
        PriceMode::Optimistic,
        PriceMode::Midpoint,
    ];
}

impl fmt::Display for PriceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceMode::Pessimistic => write!(f, "pessimistic"),
            PriceMode::Optimistic => write!(f, "optimistic"),
            PriceMode::Midpoint => write!(f, "midpoint"),
        }
    }
}

/// Attempt to parse a string into a PriceMode (case-insensitive).
impl std::str::FromStr for PriceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pessimistic" | "pess" => Ok(PriceMode::Pessimistic),
            "optimistic" | "opt" => Ok(PriceMode::Optimistic),
            "midpoint" | "mid" => Ok(PriceMode::Midpoint),
            _ => Err(anyhow::anyhow!("Unknown price mode: {s}")),
        }
    }
}

/// Which side of the market a quote is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    /// The opposite direction.
    pub fn opposite(&self) -> Self {
        match self {
            Direction::Buy => Direction::Sell,
            Direction::Sell => Direction::Buy,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "BUY"),
            Direction::Sell => write!(f, "SELL"),
        }
    }
}

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// A live two-sided market quote.
    Market,
    /// Recursively priced from the item's production recipe.
    Craft,
    /// The NPC vendor price table.
    Vendor,
    /// A fixed price that never changes (currency, hardcoded overrides).
    Fixed,
    /// No price could be resolved. An amount of 0 with this source means
    /// "unavailable", never "free".
    None,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::Market => write!(f, "market"),
            PriceSource::Craft => write!(f, "craft"),
            PriceSource::Vendor => write!(f, "vendor"),
            PriceSource::Fixed => write!(f, "fixed"),
            PriceSource::None => write!(f, "none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Price quote
// ---------------------------------------------------------------------------

/// A resolved price with its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub amount: f64,
    pub source: PriceSource,
}

impl PriceQuote {
    /// The "unavailable" quote.
    pub fn none() -> Self {
        PriceQuote {
            amount: 0.0,
            source: PriceSource::None,
        }
    }

    /// Whether this quote carries a usable positive price.
    pub fn is_priced(&self) -> bool {
        self.amount > 0.0 && self.source != PriceSource::None
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} ({})", self.amount, self.source)
    }
}

// ---------------------------------------------------------------------------
// Solver output
// ---------------------------------------------------------------------------

/// Expected-value summary of one absorbing-chain solve for a
/// (target tier, protect tier) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkovResult {
    /// Expected number of enhancement attempts from tier 0 to absorption.
    pub expected_attempts: f64,
    /// Expected number of protection items consumed.
    pub expected_protect_uses: f64,
    /// Expected experience earned over the whole run.
    pub expected_xp: f64,
}

impl MarkovResult {
    pub fn zero() -> Self {
        MarkovResult {
            expected_attempts: 0.0,
            expected_protect_uses: 0.0,
            expected_xp: 0.0,
        }
    }
}

impl fmt::Display for MarkovResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "attempts={:.1} protects={:.2} xp={:.0}",
            self.expected_attempts, self.expected_protect_uses, self.expected_xp,
        )
    }
}

// ---------------------------------------------------------------------------
// Enhancement plan
// ---------------------------------------------------------------------------

/// One enhancement material with its resolved price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialLine {
    pub item: String,
    /// Per-attempt count after the enhancement-material multiplier.
    pub count: f64,
    pub unit_price: f64,
    pub source: PriceSource,
}

impl MaterialLine {
    /// Cost contribution of this line per attempt.
    pub fn cost(&self) -> f64 {
        self.count * self.unit_price
    }
}

/// The optimizer's chosen plan: the cost-minimizing protection policy for
/// one (item, target tier, stance) evaluation, with its full breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementPlan {
    pub item: String,
    pub item_name: String,
    pub item_level: u32,
    pub target_tier: u32,
    /// The minimum tier at which failures consume protection instead of
    /// resetting to 0.
    pub protect_tier: u32,
    pub markov: MarkovResult,
    pub base_price: f64,
    pub base_source: PriceSource,
    pub materials: Vec<MaterialLine>,
    /// Flat coin cost per attempt (not subject to material reductions).
    pub coin_cost: f64,
    pub material_cost_per_attempt: f64,
    pub protect_item: String,
    pub protect_price: f64,
    pub attempt_secs: f64,
    pub total_cost: f64,
}

impl fmt::Display for EnhancementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} +0 -> +{} | protect at +{} | {} | cost={:.0}",
            self.item_name, self.target_tier, self.protect_tier, self.markov, self.total_cost,
        )
    }
}

// ---------------------------------------------------------------------------
// Profit report
// ---------------------------------------------------------------------------

/// Terminal output of one evaluation: the plan plus profit, ROI, and
/// throughput metrics against the current sale price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfitReport {
    pub plan: EnhancementPlan,
    pub sell_price: f64,
    pub market_fee: f64,
    pub profit: f64,
    pub profit_after_fee: f64,
    /// Return on investment in percent.
    pub roi: f64,
    pub roi_after_fee: f64,
    pub time_hours: f64,
    pub time_days: f64,
    pub profit_per_day: f64,
    pub profit_per_day_after_fee: f64,
    pub xp_per_day: f64,
    pub mode: PriceMode,
}

impl fmt::Display for ProfitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} +{} | cost={:.0} sell={:.0} profit={:.0} roi={:.1}% | {:.1}h {:.0}/day",
            self.plan.item_name,
            self.plan.target_tier,
            self.plan.total_cost,
            self.sell_price,
            self.profit,
            self.roi,
            self.time_hours,
            self.profit_per_day,
        )
    }
}

// ---------------------------------------------------------------------------
// Ranking report
// ---------------------------------------------------------------------------

/// The exported batch-ranking record. This is the sole hand-off contract to
/// presentation and export collaborators, which consume it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub mode: PriceMode,
    pub results: Vec<ProfitReport>,
}

impl RankingReport {
    pub fn new(mode: PriceMode, results: Vec<ProfitReport>) -> Self {
        RankingReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode,
            results,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for FORGE's collaborator layers.
///
/// The evaluation core never raises: missing data yields empty results or
/// zero/"none" quotes. These errors cover the I/O boundaries only.
#[derive(Debug, thiserror::Error)]
pub enum ForgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Market data error ({source_name}): {message}")]
    Market {
        source_name: String,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
