//! Outcome classification: mapping a resolved roll to a tier.
//!
//! The single most easily-misimplemented rule in the engine lives
//! here: **fumble precedence**. A roll that fumbled classifies as
//! [`OutcomeTier::Fumble`] even when it coincidentally met the DC.
//! A character can succeed numerically and still botch; that is a
//! content design choice, not a bug.

use serde::{Deserialize, Serialize};

/// Outcome tiers, ordered worst to best.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTier {
    /// Catastrophic failure: zero successes plus at least one botch.
    Fumble,
    /// Insufficient successes.
    Failure,
    /// Met the DC with nothing to spare.
    MarginalSuccess,
    /// Met the DC with room to spare.
    Success,
    /// Margin at or beyond the critical threshold.
    CriticalSuccess,
}

impl OutcomeTier {
    /// True for any success tier (marginal or better).
    pub fn is_success(self) -> bool {
        self >= Self::MarginalSuccess
    }
}

impl std::fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Fumble => "Fumble",
            Self::Failure => "Failure",
            Self::MarginalSuccess => "Marginal Success",
            Self::Success => "Success",
            Self::CriticalSuccess => "Critical Success",
        };
        write!(f, "{s}")
    }
}

/// A classified check outcome with its audit numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// The classified tier.
    pub tier: OutcomeTier,
    /// Successes rolled (or synthesized, for auto-successes).
    pub successes: u32,
    /// The effective DC the roll was made against.
    pub dc: u32,
    /// `successes - dc`, independent of tier.
    pub margin: i32,
}

impl Outcome {
    /// Synthetic outcome for a mastery auto-success: the roll is
    /// skipped and the result reports `successes = dc`.
    pub fn auto_success(dc: u32) -> Self {
        Self {
            tier: OutcomeTier::Success,
            successes: dc,
            dc,
            margin: 0,
        }
    }

    /// Outcome for an attempt blocked before any dice were drawn.
    pub fn blocked(dc: u32) -> Self {
        Self {
            tier: OutcomeTier::Failure,
            successes: 0,
            dc,
            margin: -(dc as i32),
        }
    }

    /// True for any success tier (marginal or better).
    pub fn is_success(&self) -> bool {
        self.tier.is_success()
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (margin {:+})", self.tier, self.margin)
    }
}

/// Configuration-supplied tier boundaries.
///
/// Invariant: `marginal_below <= critical_at`, so tiers stay
/// monotonic in margin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeBands {
    /// Margins below this value (and at least 0) are marginal.
    pub marginal_below: u32,
    /// Margins at or above this value are critical.
    pub critical_at: u32,
}

impl Default for OutcomeBands {
    fn default() -> Self {
        // Margin 0 is marginal, 1-4 a plain success, 5+ critical.
        Self {
            marginal_below: 1,
            critical_at: 5,
        }
    }
}

impl OutcomeBands {
    /// Classify a resolved roll. Pure: no side effects, no randomness.
    ///
    /// Fumble takes precedence over all numeric classification, even
    /// when `successes >= dc`.
    pub fn classify(&self, successes: u32, dc: u32, is_fumble: bool) -> Outcome {
        let margin = successes as i32 - dc as i32;
        let tier = if is_fumble {
            OutcomeTier::Fumble
        } else if margin < 0 {
            OutcomeTier::Failure
        } else if (margin as u32) < self.marginal_below {
            OutcomeTier::MarginalSuccess
        } else if margin as u32 >= self.critical_at {
            OutcomeTier::CriticalSuccess
        } else {
            OutcomeTier::Success
        };
        Outcome {
            tier,
            successes,
            dc,
            margin,
        }
    }
}
