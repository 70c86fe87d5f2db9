//! Market quote table and snapshot sources.
//!
//! The marketplace publishes a two-sided order summary per (item, tier):
//! best ask `a` and best bid `b`, with `-1` marking a side with no orders.
//! A parsed `MarketSnapshot` is immutable; sources only produce fresh ones.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::types::ForgeError;

// ---------------------------------------------------------------------------
// Quote table
// ---------------------------------------------------------------------------

/// Best ask/bid for one (item, tier). An absent side means no liquidity
/// there, not a zero price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuote {
    pub ask: Option<f64>,
    pub bid: Option<f64>,
}

/// All current quotes, keyed by item hrid and enhancement tier.
#[derive(Debug, Clone, Default)]
pub struct QuoteTable {
    quotes: HashMap<String, HashMap<u32, MarketQuote>>,
}

impl QuoteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quote; non-positive side values are treated as absent.
    pub fn insert(&mut self, hrid: &str, tier: u32, ask: Option<f64>, bid: Option<f64>) {
        let quote = MarketQuote {
            ask: ask.filter(|v| *v > 0.0),
            bid: bid.filter(|v| *v > 0.0),
        };
        self.quotes
            .entry(hrid.to_string())
            .or_default()
            .insert(tier, quote);
    }

    pub fn quote(&self, hrid: &str, tier: u32) -> Option<&MarketQuote> {
        self.quotes.get(hrid).and_then(|tiers| tiers.get(&tier))
    }

    /// Number of (item, tier) entries.
    pub fn len(&self) -> usize {
        self.quotes.values().map(|tiers| tiers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An immutable marketplace snapshot handed to the engine.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub quotes: QuoteTable,
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(default)]
    timestamp: i64,
    #[serde(rename = "marketData", default)]
    market_data: HashMap<String, HashMap<String, RawLevel>>,
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    #[serde(default = "no_orders")]
    a: f64,
    #[serde(default = "no_orders")]
    b: f64,
}

fn no_orders() -> f64 {
    -1.0
}

impl MarketSnapshot {
    /// Parse a snapshot from the marketplace JSON format.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawMarket = serde_json::from_str(json).context("Malformed marketplace JSON")?;

        let mut quotes = QuoteTable::new();
        for (hrid, tiers) in raw.market_data {
            for (tier_key, level) in tiers {
                // Tier keys arrive as strings; skip anything non-numeric.
                let Ok(tier) = tier_key.parse::<u32>() else {
                    debug!(item = %hrid, key = %tier_key, "Skipping non-numeric tier key");
                    continue;
                };
                quotes.insert(&hrid, tier, Some(level.a), Some(level.b));
            }
        }

        let fetched_at = DateTime::from_timestamp(raw.timestamp, 0).unwrap_or_else(Utc::now);
        Ok(MarketSnapshot { fetched_at, quotes })
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Abstraction over marketplace snapshot providers.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Produce a fresh snapshot.
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}

/// Live HTTP feed for the published marketplace summary.
pub struct LiveMarketFeed {
    http: Client,
    endpoint: String,
}

impl LiveMarketFeed {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("FORGE/0.1.0")
            .build()
            .context("Failed to build market HTTP client")?;
        Ok(Self {
            http,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl MarketSource for LiveMarketFeed {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let response = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .with_context(|| format!("Marketplace request failed: {}", self.endpoint))?;

        if !response.status().is_success() {
            return Err(ForgeError::Market {
                source_name: self.name().to_string(),
                message: format!("HTTP {}", response.status()),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .context("Failed to read marketplace response body")?;
        let snapshot = MarketSnapshot::from_json(&body)?;
        info!(
            quotes = snapshot.quotes.len(),
            fetched_at = %snapshot.fetched_at,
            "Live marketplace snapshot fetched"
        );
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "live"
    }
}

/// Local snapshot file, for offline runs and deterministic replays.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }
}

#[async_trait]
impl MarketSource for SnapshotFile {
    async fn fetch_snapshot(&self) -> Result<MarketSnapshot> {
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot file: {}", self.path.display()))?;
        MarketSnapshot::from_json(&json)
    }

    fn name(&self) -> &str {
        "snapshot-file"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "timestamp": 1754400000,
        "marketData": {
            "/items/azure_spear": {
                "0": {"a": 100000, "b": 90000},
                "10": {"a": -1, "b": 2500000}
            },
            "/items/azure_plate": {
                "0": {"a": 1200, "b": -1}
            },
            "/items/dead_item": {
                "0": {"a": -1, "b": -1}
            }
        }
    }"#;

    #[test]
    fn test_parse_snapshot() {
        let snapshot = MarketSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.quotes.len(), 4);

        let q = snapshot.quotes.quote("/items/azure_spear", 0).unwrap();
        assert_eq!(q.ask, Some(100000.0));
        assert_eq!(q.bid, Some(90000.0));
    }

    #[test]
    fn test_sentinel_sides_become_absent() {
        let snapshot = MarketSnapshot::from_json(SAMPLE).unwrap();

        let q = snapshot.quotes.quote("/items/azure_spear", 10).unwrap();
        assert_eq!(q.ask, None);
        assert_eq!(q.bid, Some(2500000.0));

        let q = snapshot.quotes.quote("/items/azure_plate", 0).unwrap();
        assert_eq!(q.ask, Some(1200.0));
        assert_eq!(q.bid, None);

        // Both sides -1: the entry exists but carries no liquidity.
        let q = snapshot.quotes.quote("/items/dead_item", 0).unwrap();
        assert_eq!(q.ask, None);
        assert_eq!(q.bid, None);
    }

    #[test]
    fn test_missing_entry_is_none() {
        let snapshot = MarketSnapshot::from_json(SAMPLE).unwrap();
        assert!(snapshot.quotes.quote("/items/azure_spear", 5).is_none());
        assert!(snapshot.quotes.quote("/items/unknown", 0).is_none());
    }

    #[test]
    fn test_timestamp_parsed() {
        let snapshot = MarketSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.fetched_at.timestamp(), 1754400000);
    }

    #[test]
    fn test_insert_filters_non_positive() {
        let mut table = QuoteTable::new();
        table.insert("/items/x", 0, Some(-1.0), Some(0.0));
        let q = table.quote("/items/x", 0).unwrap();
        assert_eq!(q.ask, None);
        assert_eq!(q.bid, None);
    }

    #[test]
    fn test_malformed_json_errors() {
        assert!(MarketSnapshot::from_json("{").is_err());
    }

    #[tokio::test]
    async fn test_snapshot_file_source() {
        let mut path = std::env::temp_dir();
        path.push(format!("forge_test_snapshot_{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, SAMPLE).unwrap();

        let source = SnapshotFile::new(path.to_str().unwrap());
        assert_eq!(source.name(), "snapshot-file");
        let snapshot = source.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.quotes.len(), 4);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_file_missing_errors() {
        let source = SnapshotFile::new("/nonexistent/forge_snapshot.json");
        assert!(source.fetch_snapshot().await.is_err());
    }
}
