//! Report persistence.
//!
//! Saves the ranking report to a pretty-printed JSON file — the hand-off
//! consumed read-only by dashboard and export collaborators. Loading is
//! provided for replays and tests.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::types::RankingReport;

/// Save a ranking report to a JSON file.
pub fn save_report(report: &RankingReport, path: &str) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialise report")?;

    std::fs::write(path, &json).context(format!("Failed to write report to {path}"))?;

    debug!(path, results = report.results.len(), "Report saved");
    Ok(())
}

/// Load a previously saved report.
/// Returns None if the file doesn't exist.
pub fn load_report(path: &str) -> Result<Option<RankingReport>> {
    if !Path::new(path).exists() {
        info!(path, "No saved report found");
        return Ok(None);
    }

    let json =
        std::fs::read_to_string(path).context(format!("Failed to read report from {path}"))?;

    let report: RankingReport =
        serde_json::from_str(&json).context(format!("Failed to parse report from {path}"))?;

    info!(
        path,
        results = report.results.len(),
        generated_at = %report.generated_at,
        "Report loaded from disk"
    );

    Ok(Some(report))
}

/// Delete a report file (for testing or reset).
pub fn delete_report(path: &str) -> Result<()> {
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete report file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
