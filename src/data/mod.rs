//! External data collaborators.
//!
//! The engine computes over an immutable, pre-fetched snapshot: the item
//! and recipe catalog (loaded once from JSON) and the two-sided market
//! quote table (fetched live or read from a local snapshot file). All
//! blocking I/O lives here; the evaluation core only sees finished data.

pub mod catalog;
pub mod market;
