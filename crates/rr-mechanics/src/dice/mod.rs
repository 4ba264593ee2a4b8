//! Die types and the success-counting rules configuration.
//!
//! Rune & Rust rolls pools of a single configured die type (d10 by
//! default). Each die at or above the success threshold counts one
//! success; each die on the botch face counts one botch. The DC is
//! expressed in required successes, not a target number.

pub mod roll;

pub use roll::{DiceResolution, RollModifiers, resolve_pool};

use serde::{Deserialize, Serialize};

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// A die with a custom number of sides (at least 2).
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::Custom(n) => n,
        }
    }

    /// Parse a die from a tag like `"d10"` or `"d37"`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "d6" => Some(Self::D6),
            "d8" => Some(Self::D8),
            "d10" => Some(Self::D10),
            "d12" => Some(Self::D12),
            "d20" => Some(Self::D20),
            other => {
                let n = other.strip_prefix('d')?.parse::<u32>().ok()?;
                (n >= 2).then_some(Self::Custom(n))
            }
        }
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// Configuration-supplied die type and per-die thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiceRules {
    /// The die rolled for every check.
    pub die: Die,
    /// A face at or above this value scores one success.
    pub success_min: u32,
    /// A face at this value scores one botch (the minimum face).
    pub botch_face: u32,
}

impl Default for DiceRules {
    fn default() -> Self {
        Self {
            die: Die::D10,
            success_min: 8,
            botch_face: 1,
        }
    }
}

impl DiceRules {
    /// True if the rolled face counts as a success.
    pub fn is_success(&self, face: u32) -> bool {
        face >= self.success_min
    }

    /// True if the rolled face counts as a botch.
    pub fn is_botch(&self, face: u32) -> bool {
        face == self.botch_face
    }
}
