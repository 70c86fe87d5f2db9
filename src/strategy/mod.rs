//! Strategy layer.
//!
//! The protection optimizer sweeps protect-tier candidates through the
//! chain solver and keeps the cost minimum; the profit evaluator folds the
//! chosen plan together with the sale price into profit, ROI, and
//! throughput metrics.

pub mod optimizer;
pub mod profit;
