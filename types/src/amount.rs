//! Lamport amounts.
//!
//! The ledger's native unit is the lamport; one whole token is 10^9 lamports.
//! Amounts are kept as integers to avoid floating-point rounding.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lamports per whole token.
pub const LAMPORTS_PER_TOKEN: u64 = 1_000_000_000;

/// An amount of the ledger's native token in lamports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lamports(u64);

impl Lamports {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Amount expressed in whole tokens, for display only.
    pub fn as_tokens(&self) -> f64 {
        self.0 as f64 / LAMPORTS_PER_TOKEN as f64
    }

    /// The inclusive `[low, high]` band within `percent` of this amount.
    ///
    /// Used to recognise historical faucet transfers whose amount drifted from
    /// the configured value (fee adjustments, config changes).
    pub fn tolerance_band(&self, percent: u64) -> (u64, u64) {
        let delta = self.0 / 100 * percent + (self.0 % 100) * percent / 100;
        (self.0.saturating_sub(delta), self.0.saturating_add(delta))
    }

    /// Whether `value` lies within `percent` of this amount.
    pub fn within_tolerance(&self, value: u64, percent: u64) -> bool {
        let (low, high) = self.tolerance_band(percent);
        value >= low && value <= high
    }
}

impl From<u64> for Lamports {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Lamports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lamports", self.0)
    }
}
