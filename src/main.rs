//! FORGE — Enhancement Profit Analyzer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! loads the item catalog and a marketplace snapshot (live or from file),
//! ranks every enhanceable item by expected profit, and exports the
//! report for downstream consumers.

use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};

use forge::bonus::BonusProfile;
use forge::config::AppConfig;
use forge::data::catalog::Catalog;
use forge::data::market::{LiveMarketFeed, MarketSource, SnapshotFile};
use forge::engine::Evaluator;
use forge::storage;
use forge::types::RankingReport;

const BANNER: &str = r#"
 _____ ___  ____   ____ _____
|  ___/ _ \|  _ \ / ___| ____|
| |_ | | | | |_) | |  _|  _|
|  _|| |_| |  _ <| |_| | |___
|_|   \___/|_| \_\____|_____|

  Fundamental-matrix Optimizer for Return on Gear Enhancement
  v0.1.0 — Market Snapshot Analyzer
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        mode = %cfg.pricing.mode,
        targets = ?cfg.ranking.target_tiers,
        "FORGE starting up"
    );

    // -- Load the immutable snapshot --------------------------------------

    cfg.player.validate()?;

    let catalog = Catalog::load(Path::new(&cfg.market.catalog_file))?;
    info!(items = catalog.len(), "Catalog loaded");

    let source: Box<dyn MarketSource> = match cfg.market.snapshot_file.as_deref() {
        Some(path) => {
            info!(path, "Using local marketplace snapshot");
            Box::new(SnapshotFile::new(path))
        }
        None => {
            info!(endpoint = %cfg.market.endpoint, "Using live marketplace feed");
            Box::new(LiveMarketFeed::new(&cfg.market.endpoint)?)
        }
    };
    let snapshot = source.fetch_snapshot().await?;
    info!(
        source = source.name(),
        quotes = snapshot.quotes.len(),
        fetched_at = %snapshot.fetched_at,
        "Market snapshot ready"
    );

    // -- Derive the bonus profile -----------------------------------------

    let profile = BonusProfile::derive(&cfg.player, &catalog);
    info!(
        effective_level = format!("{:.1}", profile.effective_level),
        tool_bonus = format!("{:.2}%", profile.tool_bonus),
        concentration = format!("{:.4}x", profile.concentration),
        blessed = format!("{:.4}", profile.blessed_proc_chance),
        "Bonus profile derived"
    );

    // -- Rank and report ---------------------------------------------------

    let evaluator = Evaluator::new(&catalog, &snapshot.quotes, &profile);
    let results = evaluator.rank_all(&cfg.ranking, cfg.pricing.mode);

    if results.is_empty() {
        warn!("No evaluations produced a result — check catalog and market data");
    }

    for result in results.iter().take(cfg.ranking.top_n) {
        println!("{result}");
    }

    let result_count = results.len();
    let report = RankingReport::new(cfg.pricing.mode, results);
    storage::save_report(&report, &cfg.export.report_file)?;
    info!(
        report = %cfg.export.report_file,
        results = result_count,
        run_id = %report.run_id,
        "Report exported. FORGE done."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("forge=info"));

    let json_logging = std::env::var("FORGE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
