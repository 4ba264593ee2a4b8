//! Pool resolution: the success-counting roll itself.
//!
//! [`resolve_pool`] is a pure function over its random source. It
//! draws every die in a fixed sequence, so two calls with
//! identically-seeded sources produce identical resolutions.

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::DiceRules;
use crate::context::SkillContext;

/// Roll-time adjustments folded in by the check service.
///
/// `auto_succeed`, `bonus_dice`, and `reroll_limit` come from mastery
/// ability hooks; `dice_adjust` and `dc_adjust` carry specialization
/// bonuses and active consequence penalties that live outside the
/// caller's immutable context.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RollModifiers {
    /// Skip the roll entirely and report a synthetic success.
    pub auto_succeed: bool,
    /// Flat bonus dice granted prior to rolling.
    pub bonus_dice: u32,
    /// How many individual failed dice may be re-rolled, once each.
    pub reroll_limit: u32,
    /// Pool delta from sources outside the skill context.
    pub dice_adjust: i32,
    /// DC delta from sources outside the skill context.
    pub dc_adjust: i32,
}

/// The audit record of one resolved pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceResolution {
    /// Final face of every die rolled, in draw order.
    pub faces: Vec<u32>,
    /// Indices into `faces` that were re-rolled.
    pub rerolled: Vec<usize>,
    /// Dice at or above the success threshold.
    pub successes: u32,
    /// Dice on the botch face.
    pub botches: u32,
    /// The effective DC the roll was made against.
    pub dc: u32,
    /// True if a mastery ability bypassed the roll entirely.
    pub auto_succeeded: bool,
}

impl DiceResolution {
    /// Build a resolution from known faces, counting successes and
    /// botches under the given rules. Used for deterministic replay.
    pub fn from_faces(faces: Vec<u32>, dc: u32, rules: &DiceRules) -> Self {
        let successes = faces.iter().filter(|&&f| rules.is_success(f)).count() as u32;
        let botches = faces.iter().filter(|&&f| rules.is_botch(f)).count() as u32;
        Self {
            faces,
            rerolled: Vec::new(),
            successes,
            botches,
            dc,
            auto_succeeded: false,
        }
    }

    /// Fumble condition: zero successes and at least one botch.
    /// Distinct from ordinary failure (insufficient successes).
    pub fn is_fumble(&self) -> bool {
        !self.auto_succeeded && self.successes == 0 && self.botches >= 1
    }
}

impl std::fmt::Display for DiceResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.auto_succeeded {
            return write!(f, "auto-success vs DC {}", self.dc);
        }
        let faces: Vec<String> = self.faces.iter().map(u32::to_string).collect();
        write!(
            f,
            "[{}] = {}S/{}B vs DC {}",
            faces.join(", "),
            self.successes,
            self.botches,
            self.dc
        )
    }
}

/// Roll a check's dice pool.
///
/// The effective pool is `max(0, base + context dice deltas + adjusts
/// + bonus dice)`; the effective DC is `max(0, dc + context DC deltas
/// + adjust)`. When `auto_succeed` is set the roll is skipped and the
/// resolution reports synthetic `successes = dc`. Re-rolls only
/// trigger when the initial draw falls short of the DC; failed dice
/// are re-rolled in draw order, each at most once.
pub fn resolve_pool(
    base_pool: u32,
    context: &SkillContext,
    dc: u32,
    rules: &DiceRules,
    mods: &RollModifiers,
    rng: &mut StdRng,
) -> DiceResolution {
    let effective_dc =
        (i64::from(dc) + i64::from(context.total_dc_delta()) + i64::from(mods.dc_adjust)).max(0)
            as u32;

    if mods.auto_succeed {
        return DiceResolution {
            faces: Vec::new(),
            rerolled: Vec::new(),
            successes: effective_dc,
            botches: 0,
            dc: effective_dc,
            auto_succeeded: true,
        };
    }

    let pool = (i64::from(base_pool)
        + i64::from(context.total_dice_delta())
        + i64::from(mods.dice_adjust)
        + i64::from(mods.bonus_dice))
    .max(0) as u32;

    let sides = rules.die.sides();
    let mut faces: Vec<u32> = (0..pool).map(|_| rng.random_range(1..=sides)).collect();
    let mut rerolled = Vec::new();

    if mods.reroll_limit > 0 {
        let initial_successes = faces.iter().filter(|&&f| rules.is_success(f)).count() as u32;
        if initial_successes < effective_dc {
            let mut budget = mods.reroll_limit;
            for (i, face) in faces.iter_mut().enumerate() {
                if budget == 0 {
                    break;
                }
                if !rules.is_success(*face) {
                    *face = rng.random_range(1..=sides);
                    rerolled.push(i);
                    budget -= 1;
                }
            }
        }
    }

    let successes = faces.iter().filter(|&&f| rules.is_success(f)).count() as u32;
    let botches = faces.iter().filter(|&&f| rules.is_botch(f)).count() as u32;

    DiceResolution {
        faces,
        rerolled,
        successes,
        botches,
        dc: effective_dc,
        auto_succeeded: false,
    }
}
