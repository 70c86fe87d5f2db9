//! Absorbing Markov chain solver.
//!
//! Models an enhancement run as an absorbing chain over tiers
//! `0..targetTier`, with the target tier absorbing. Solving the chain's
//! fundamental matrix gives expected attempts, expected protection
//! consumption, and expected experience for one (target, protect) pair.

use tracing::trace;

use crate::bonus::{base_success_rate, BonusProfile};
use crate::types::MarkovResult;

/// Fraction of an attempt's experience still earned on failure.
pub const FAIL_XP_FRACTION: f64 = 0.1;

/// Pivots below this are treated as singular and skipped.
const SINGULAR_EPS: f64 = 1e-10;

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// One enhancement chain: everything that determines the transition
/// structure except the protect tier, which varies per candidate.
#[derive(Debug, Clone)]
pub struct EnhanceChain {
    pub target_tier: u32,
    /// Base success fraction for the attempt made at each transient tier.
    pub base_rates: Vec<f64>,
    pub success_multiplier: f64,
    /// Chance for a successful attempt to advance two tiers instead of one.
    pub blessed_chance: f64,
    /// Experience credited per attempt at each transient tier.
    pub xp_per_action: Vec<f64>,
}

impl EnhanceChain {
    /// A chain over the standard per-tier rate schedule, without XP.
    pub fn new(target_tier: u32, success_multiplier: f64, blessed_chance: f64) -> Self {
        EnhanceChain {
            target_tier,
            base_rates: (0..target_tier).map(base_success_rate).collect(),
            success_multiplier,
            blessed_chance,
            xp_per_action: vec![0.0; target_tier as usize],
        }
    }

    /// The chain for enhancing a specific item under a bonus profile.
    pub fn for_item(profile: &BonusProfile, item_level: u32, target_tier: u32) -> Self {
        EnhanceChain {
            target_tier,
            base_rates: (0..target_tier).map(base_success_rate).collect(),
            success_multiplier: profile.success_multiplier(item_level),
            blessed_chance: profile.blessed_proc_chance,
            xp_per_action: (0..target_tier)
                .map(|tier| profile.xp_per_action(item_level, tier))
                .collect(),
        }
    }

    /// Success probability of the attempt made at `tier`, clamped to [0, 1].
    fn success_chance(&self, tier: usize) -> f64 {
        let base = self.base_rates.get(tier).copied().unwrap_or(0.0);
        (base * self.success_multiplier).min(1.0)
    }

    /// Build the transient sub-stochastic matrix Q for a protect tier.
    ///
    /// Each row's transient mass plus its absorbed mass sums to exactly 1:
    /// both the ordinary and blessed success masses are carved from the
    /// same `success_chance` value.
    ///
    /// Blessed policy: the +2 branch is active iff `i + 2 <= target` and
    /// `i + 1 < target`. When `i + 2 == target` the blessed mass absorbs
    /// directly (no transient entry); when `i + 1 == target` the ordinary
    /// step already absorbs and the blessed mass stays folded into it.
    fn transition_matrix(&self, protect_tier: u32) -> Vec<Vec<f64>> {
        let n = self.target_tier as usize;
        let protect = protect_tier as usize;
        let mut q = vec![vec![0.0; n]; n];

        for i in 0..n {
            let success = self.success_chance(i);
            let mut advance = success;

            if self.blessed_chance > 0.0 && i + 2 <= n && i + 1 < n {
                let blessed = success * self.blessed_chance;
                if i + 2 < n {
                    q[i][i + 2] = blessed;
                }
                advance -= blessed;
            }

            if i + 1 < n {
                q[i][i + 1] = advance;
            }

            // Failure drops one tier inside the protected zone, resets to
            // 0 below it.
            let fail = 1.0 - success;
            let destination = if i >= protect && i > 0 { i - 1 } else { 0 };
            q[i][destination] += fail;
        }

        q
    }

    /// Solve the chain for one protect tier.
    pub fn solve(&self, protect_tier: u32) -> MarkovResult {
        let n = self.target_tier as usize;
        if n == 0 {
            return MarkovResult::zero();
        }

        let q = self.transition_matrix(protect_tier);

        // Fundamental matrix N = (I - Q)^-1; row 0 holds expected visits
        // to every transient tier starting from +0.
        let mut i_minus_q = q;
        for (i, row) in i_minus_q.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = if i == j { 1.0 - *value } else { -*value };
            }
        }
        let fundamental = invert_or_pseudo(i_minus_q);
        let visits = &fundamental[0];

        let expected_attempts: f64 = visits.iter().sum();

        let protect = protect_tier as usize;
        let mut expected_protect_uses = 0.0;
        for i in protect.min(n)..n {
            expected_protect_uses += visits[i] * (1.0 - self.success_chance(i));
        }

        let mut expected_xp = 0.0;
        for (i, &visit) in visits.iter().enumerate() {
            let success = self.success_chance(i);
            let xp = self.xp_per_action.get(i).copied().unwrap_or(0.0);
            expected_xp += visit * xp * (success + FAIL_XP_FRACTION * (1.0 - success));
        }

        trace!(
            target = self.target_tier,
            protect = protect_tier,
            attempts = expected_attempts,
            "Chain solved"
        );

        MarkovResult {
            expected_attempts,
            expected_protect_uses,
            expected_xp,
        }
    }
}

// ---------------------------------------------------------------------------
// Matrix inversion
// ---------------------------------------------------------------------------

/// Gauss–Jordan inversion with partial pivoting.
///
/// A pivot below `SINGULAR_EPS` marks a singular column and is skipped
/// rather than failing, substituting a pseudo-inverse-like result. The
/// optimizer only needs a consistent total ordering over candidates, so a
/// degenerate chain must still produce finite numbers.
fn invert_or_pseudo(matrix: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let n = matrix.len();
    let mut aug: Vec<Vec<f64>> = matrix
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            row.extend((0..n).map(|j| if i == j { 1.0 } else { 0.0 }));
            row
        })
        .collect();

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if aug[row][col].abs() > aug[pivot_row][col].abs() {
                pivot_row = row;
            }
        }
        aug.swap(col, pivot_row);

        let pivot = aug[col][col];
        if pivot.abs() < SINGULAR_EPS {
            continue;
        }

        for value in aug[col].iter_mut() {
            *value /= pivot;
        }

        let pivot_values = aug[col].clone();
        for (row, row_values) in aug.iter_mut().enumerate() {
            if row == col {
                continue;
            }
            let factor = row_values[col];
            if factor == 0.0 {
                continue;
            }
            for (value, pivot_value) in row_values.iter_mut().zip(&pivot_values) {
                *value -= factor * pivot_value;
            }
        }
    }

    aug.into_iter().map(|row| row[n..].to_vec()).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
