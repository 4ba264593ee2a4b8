//! Provider seams for content the engine does not own.
//!
//! Mastery abilities, specialization bonuses, and corruption tables
//! live in static content far outside this crate. The engine queries
//! them through these narrow synchronous traits; [`NoContent`] stands
//! in wherever no content wiring exists (tests, the CLI, early
//! integrations).

use serde::{Deserialize, Serialize};

use crate::context::SkillContext;
use crate::modifier::{CorruptionTier, DurationKind, EnvironmentModifier};

/// What a mastery ability grants for one specific check.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MasteryGrant {
    /// Bypass the roll entirely and report a synthetic success.
    pub auto_succeed: bool,
    /// Flat bonus dice added to the pool before rolling.
    pub bonus_dice: u32,
    /// How many individual failed dice may be re-rolled, once each.
    pub reroll_limit: u32,
}

/// Query seam for mastery abilities.
pub trait MasterAbilityProvider {
    /// Evaluate what, if anything, the actor's mastery abilities grant
    /// for a check of this skill, sub-type, and DC.
    fn evaluate_for_check(
        &self,
        actor_id: &str,
        skill_id: &str,
        sub_type: Option<&str>,
        dc: u32,
    ) -> MasteryGrant;
}

/// Dice and DC deltas granted by a specialization.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SkillBonus {
    /// Dice added to the pool.
    pub dice_delta: i32,
    /// Successes added to the DC (usually negative or zero).
    pub dc_delta: i32,
}

/// Query seam for specialization bonuses.
pub trait SpecializationBonusProvider {
    /// The bonus the actor's specializations grant for this skill in
    /// this context.
    fn skill_bonus(&self, actor_id: &str, skill_id: &str, context: &SkillContext) -> SkillBonus;
}

/// Query seam mapping a corruption tier to its standard environment
/// modifier.
pub trait CorruptionModifierProvider {
    /// The environment modifier contributed by ambient corruption at
    /// the given tier.
    fn modifier_for(&self, tier: CorruptionTier) -> EnvironmentModifier;
}

/// Provider that grants nothing: no mastery, no specialization bonus,
/// and zero-delta corruption modifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl MasterAbilityProvider for NoContent {
    fn evaluate_for_check(&self, _: &str, _: &str, _: Option<&str>, _: u32) -> MasteryGrant {
        MasteryGrant::default()
    }
}

impl SpecializationBonusProvider for NoContent {
    fn skill_bonus(&self, _: &str, _: &str, _: &SkillContext) -> SkillBonus {
        SkillBonus::default()
    }
}

impl CorruptionModifierProvider for NoContent {
    fn modifier_for(&self, tier: CorruptionTier) -> EnvironmentModifier {
        corruption_modifier(tier, 0, 0)
    }
}

/// The baseline corruption table: each tier past Clear costs one die,
/// and saturated ground also raises the DC.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCorruption;

impl CorruptionModifierProvider for StandardCorruption {
    fn modifier_for(&self, tier: CorruptionTier) -> EnvironmentModifier {
        match tier {
            CorruptionTier::Clear => corruption_modifier(tier, 0, 0),
            CorruptionTier::Tainted => corruption_modifier(tier, -1, 0),
            CorruptionTier::Blighted => corruption_modifier(tier, -2, 0),
            CorruptionTier::Consumed => corruption_modifier(tier, -3, 1),
        }
    }
}

fn corruption_modifier(tier: CorruptionTier, dice_delta: i32, dc_delta: i32) -> EnvironmentModifier {
    EnvironmentModifier {
        id: format!("corruption-{tier:?}").to_lowercase(),
        name: "Corruption exposure".to_string(),
        dice_delta,
        dc_delta,
        source: Some("corruption".to_string()),
        duration: DurationKind::Scene,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_grants_nothing() {
        let p = NoContent;
        let grant = p.evaluate_for_check("mira", "lockpicking", None, 3);
        assert!(!grant.auto_succeed);
        assert_eq!(grant.bonus_dice, 0);
        assert_eq!(grant.reroll_limit, 0);

        let bonus = p.skill_bonus("mira", "lockpicking", &SkillContext::empty());
        assert_eq!(bonus.dice_delta, 0);
        assert_eq!(bonus.dc_delta, 0);

        let env = p.modifier_for(CorruptionTier::Consumed);
        assert_eq!(env.dice_delta, 0);
        assert_eq!(env.dc_delta, 0);
    }

    #[test]
    fn standard_corruption_scales_with_tier() {
        let p = StandardCorruption;
        assert_eq!(p.modifier_for(CorruptionTier::Clear).dice_delta, 0);
        assert_eq!(p.modifier_for(CorruptionTier::Tainted).dice_delta, -1);
        assert_eq!(p.modifier_for(CorruptionTier::Blighted).dice_delta, -2);
        let consumed = p.modifier_for(CorruptionTier::Consumed);
        assert_eq!(consumed.dice_delta, -3);
        assert_eq!(consumed.dc_delta, 1);
    }

    #[test]
    fn corruption_modifier_ids_are_tiered() {
        let p = StandardCorruption;
        assert_eq!(p.modifier_for(CorruptionTier::Tainted).id, "corruption-tainted");
    }
}
