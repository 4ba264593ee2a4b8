//! The single check service: one actor, one skill, one roll.
//!
//! Orchestration order matters and is fixed: consequence gate,
//! specialization bonus, mastery grant, dice resolution, outcome
//! classification, fumble pipeline. The service holds no per-check
//! state; everything flows through the request and the random source.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::context::SkillContext;
use crate::dice::{DiceResolution, DiceRules, RollModifiers, resolve_pool};
use crate::fumble::{ConsequencePenalty, ConsequenceStore, FumblePipeline};
use crate::outcome::{Outcome, OutcomeBands, OutcomeTier};
use crate::providers::{MasterAbilityProvider, SpecializationBonusProvider};

/// Everything a single check needs from the caller.
///
/// `base_pool` is derived fresh by the caller from proficiency and
/// attributes; the engine never persists it.
#[derive(Debug, Clone, Copy)]
pub struct CheckRequest<'a> {
    /// The acting character.
    pub actor_id: &'a str,
    /// The skill being tested.
    pub skill_id: &'a str,
    /// Optional skill sub-type for mastery ability lookup.
    pub sub_type: Option<&'a str>,
    /// The target of the check, if it is directed at one.
    pub target_id: Option<&'a str>,
    /// The composed modifier context for this check.
    pub context: &'a SkillContext,
    /// Base dice pool before modifiers.
    pub base_pool: u32,
    /// Base DC before modifiers, in required successes.
    pub dc: u32,
}

/// Why an attempt was blocked before any dice were drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// A required piece of equipment is not held.
    MissingEquipment {
        /// Id of the missing equipment modifier.
        modifier_id: String,
    },
    /// An active hard-block consequence covers this check.
    Consequence {
        /// Id of the blocking consequence.
        consequence_id: String,
    },
}

/// The complete result of one resolved (or blocked) check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// The classified outcome.
    pub outcome: Outcome,
    /// The dice audit record (empty faces when blocked or auto).
    pub resolution: DiceResolution,
    /// Set when the attempt was blocked with zero dice drawn.
    pub blocked: Option<BlockReason>,
    /// Ids of active consequences whose penalties were folded in.
    pub applied_consequences: Vec<String>,
    /// Ids of consequences this check created (fumbles).
    pub triggered_consequence_ids: Vec<String>,
}

impl CheckResult {
    fn blocked(reason: BlockReason, dc: u32, applied: Vec<String>) -> Self {
        Self {
            outcome: Outcome::blocked(dc),
            resolution: DiceResolution {
                faces: Vec::new(),
                rerolled: Vec::new(),
                successes: 0,
                botches: 0,
                dc,
                auto_succeeded: false,
            },
            blocked: Some(reason),
            applied_consequences: applied,
            triggered_consequence_ids: Vec::new(),
        }
    }
}

/// Which side of a contested check prevailed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestedOutcome {
    /// Both sides fumbled.
    BothFumble,
    /// The initiator fumbled; the defender auto-wins.
    InitiatorFumble,
    /// The defender fumbled; the initiator auto-wins.
    DefenderFumble,
    /// The initiator rolled more successes.
    InitiatorWins,
    /// The defender rolled more successes.
    DefenderWins,
    /// Equal successes, no fumble on either side.
    Tie,
}

/// The result of an opposed roll between two actors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestedCheckResult {
    /// The initiating actor.
    pub initiator_id: String,
    /// The defending actor.
    pub defender_id: String,
    /// The initiator's roll.
    pub initiator_roll: DiceResolution,
    /// The defender's roll.
    pub defender_roll: DiceResolution,
    /// Who prevailed.
    pub outcome: ContestedOutcome,
    /// Initiator successes minus defender successes.
    pub margin: i32,
}

/// Resolves single and contested checks.
pub struct SkillCheckService<'p> {
    rules: DiceRules,
    bands: OutcomeBands,
    abilities: &'p dyn MasterAbilityProvider,
    specializations: &'p dyn SpecializationBonusProvider,
    pipeline: FumblePipeline,
}

impl<'p> SkillCheckService<'p> {
    /// Build a service over explicit rules, bands, and providers.
    pub fn new(
        rules: DiceRules,
        bands: OutcomeBands,
        abilities: &'p dyn MasterAbilityProvider,
        specializations: &'p dyn SpecializationBonusProvider,
        pipeline: FumblePipeline,
    ) -> Self {
        Self {
            rules,
            bands,
            abilities,
            specializations,
            pipeline,
        }
    }

    /// Build a service with default rules, bands, and fumble catalog.
    pub fn standard(
        abilities: &'p dyn MasterAbilityProvider,
        specializations: &'p dyn SpecializationBonusProvider,
    ) -> Self {
        Self::new(
            DiceRules::default(),
            OutcomeBands::default(),
            abilities,
            specializations,
            FumblePipeline::default(),
        )
    }

    /// The dice rules this service resolves under.
    pub fn rules(&self) -> &DiceRules {
        &self.rules
    }

    /// The outcome bands this service classifies under.
    pub fn bands(&self) -> &OutcomeBands {
        &self.bands
    }

    /// The fumble pipeline this service feeds.
    pub fn pipeline(&self) -> &FumblePipeline {
        &self.pipeline
    }

    /// Resolve one check.
    ///
    /// Failed checks, fumbles, and blocked attempts are all ordinary
    /// results, never errors. The random source is consumed exactly
    /// once, in a fixed sequence, so identically-seeded sources give
    /// identical results.
    pub fn resolve(
        &self,
        req: &CheckRequest<'_>,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> CheckResult {
        tracing::debug!(
            actor = req.actor_id,
            skill = req.skill_id,
            base_pool = req.base_pool,
            dc = req.dc,
            "resolving skill check"
        );

        if let Some(missing) = req.context.missing_required_equipment() {
            tracing::info!(
                actor = req.actor_id,
                skill = req.skill_id,
                equipment = %missing.id,
                "check blocked: required equipment missing"
            );
            return CheckResult::blocked(
                BlockReason::MissingEquipment {
                    modifier_id: missing.id.clone(),
                },
                req.dc,
                Vec::new(),
            );
        }

        let active = self.pipeline.consequences_affecting_check(
            store,
            req.actor_id,
            req.skill_id,
            req.target_id,
        );
        let applied: Vec<String> = active.iter().map(|c| c.consequence_id.clone()).collect();

        let mut dice_adjust = 0i32;
        let mut dc_adjust = 0i32;
        for consequence in &active {
            match consequence.penalty {
                ConsequencePenalty::HardBlock => {
                    tracing::info!(
                        actor = req.actor_id,
                        skill = req.skill_id,
                        consequence = %consequence.consequence_id,
                        "check blocked by active consequence"
                    );
                    return CheckResult::blocked(
                        BlockReason::Consequence {
                            consequence_id: consequence.consequence_id.clone(),
                        },
                        req.dc,
                        applied,
                    );
                }
                ConsequencePenalty::DicePenalty(n) => dice_adjust -= n as i32,
                ConsequencePenalty::DcPenalty(n) => dc_adjust += n as i32,
            }
        }

        let bonus = self
            .specializations
            .skill_bonus(req.actor_id, req.skill_id, req.context);
        dice_adjust += bonus.dice_delta;
        dc_adjust += bonus.dc_delta;

        let grant =
            self.abilities
                .evaluate_for_check(req.actor_id, req.skill_id, req.sub_type, req.dc);

        let mods = RollModifiers {
            auto_succeed: grant.auto_succeed,
            bonus_dice: grant.bonus_dice,
            reroll_limit: grant.reroll_limit,
            dice_adjust,
            dc_adjust,
        };

        let resolution = resolve_pool(req.base_pool, req.context, req.dc, &self.rules, &mods, rng);

        let outcome = if resolution.auto_succeeded {
            Outcome::auto_success(resolution.dc)
        } else {
            self.bands
                .classify(resolution.successes, resolution.dc, resolution.is_fumble())
        };

        let mut triggered = Vec::new();
        if outcome.tier == OutcomeTier::Fumble {
            tracing::info!(actor = req.actor_id, skill = req.skill_id, "FUMBLE");
            if let Some(consequence) = self.pipeline.create_consequence(
                store,
                req.actor_id,
                req.skill_id,
                None,
                req.target_id,
            ) {
                triggered.push(consequence.consequence_id);
            }
        }

        tracing::debug!(
            actor = req.actor_id,
            skill = req.skill_id,
            %outcome,
            roll = %resolution,
            "skill check complete"
        );

        CheckResult {
            outcome,
            resolution,
            blocked: None,
            applied_consequences: applied,
            triggered_consequence_ids: triggered,
        }
    }

    /// Resolve an opposed roll between two actors.
    ///
    /// Each side rolls against its own request (conventionally with
    /// `dc = 0`); successes are compared directly. Fumbles outrank
    /// the numeric comparison: a fumbling side loses outright, and
    /// both sides fumbling is its own outcome.
    pub fn resolve_contested(
        &self,
        initiator: &CheckRequest<'_>,
        defender: &CheckRequest<'_>,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> ContestedCheckResult {
        let initiator_result = self.resolve(initiator, store, rng);
        let defender_result = self.resolve(defender, store, rng);

        let i_fumble = initiator_result.outcome.tier == OutcomeTier::Fumble;
        let d_fumble = defender_result.outcome.tier == OutcomeTier::Fumble;
        let i_successes = initiator_result.resolution.successes;
        let d_successes = defender_result.resolution.successes;

        let outcome = match (i_fumble, d_fumble) {
            (true, true) => ContestedOutcome::BothFumble,
            (true, false) => ContestedOutcome::InitiatorFumble,
            (false, true) => ContestedOutcome::DefenderFumble,
            (false, false) => {
                if i_successes > d_successes {
                    ContestedOutcome::InitiatorWins
                } else if d_successes > i_successes {
                    ContestedOutcome::DefenderWins
                } else {
                    ContestedOutcome::Tie
                }
            }
        };

        let margin = i_successes as i32 - d_successes as i32;
        tracing::info!(
            initiator = initiator.actor_id,
            defender = defender.actor_id,
            ?outcome,
            margin,
            "contested check resolved"
        );

        ContestedCheckResult {
            initiator_id: initiator.actor_id.to_string(),
            defender_id: defender.actor_id.to_string(),
            initiator_roll: initiator_result.resolution,
            defender_roll: defender_result.resolution,
            outcome,
            margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::context::SkillContextBuilder;
    use crate::fumble::MemoryConsequenceStore;
    use crate::modifier::{EquipmentCategory, EquipmentModifier};
    use crate::providers::{MasteryGrant, NoContent, SkillBonus};

    struct FixedGrant(MasteryGrant);

    impl MasterAbilityProvider for FixedGrant {
        fn evaluate_for_check(&self, _: &str, _: &str, _: Option<&str>, _: u32) -> MasteryGrant {
            self.0
        }
    }

    struct FixedBonus(SkillBonus);

    impl SpecializationBonusProvider for FixedBonus {
        fn skill_bonus(&self, _: &str, _: &str, _: &SkillContext) -> SkillBonus {
            self.0
        }
    }

    fn request<'a>(context: &'a SkillContext, base_pool: u32, dc: u32) -> CheckRequest<'a> {
        CheckRequest {
            actor_id: "mira",
            skill_id: "lockpicking",
            sub_type: None,
            target_id: None,
            context,
            base_pool,
            dc,
        }
    }

    /// Find a seed whose plain roll lands on the wanted tier.
    fn seed_for_tier(
        service: &SkillCheckService<'_>,
        req: &CheckRequest<'_>,
        tier: OutcomeTier,
    ) -> u64 {
        for seed in 0..5000 {
            let mut probe = MemoryConsequenceStore::new();
            let mut rng = StdRng::seed_from_u64(seed);
            if service.resolve(req, &mut probe, &mut rng).outcome.tier == tier {
                return seed;
            }
        }
        panic!("no seed produced {tier}");
    }

    #[test]
    fn resolve_is_deterministic_per_seed() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 5, 3);

        let mut store_a = MemoryConsequenceStore::new();
        let mut store_b = MemoryConsequenceStore::new();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = service.resolve(&req, &mut store_a, &mut rng_a);
        let b = service.resolve(&req, &mut store_b, &mut rng_b);
        assert_eq!(a.resolution, b.resolution);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn missing_required_equipment_blocks_with_zero_dice() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContextBuilder::new()
            .with_equipment(EquipmentModifier {
                id: "lockpicks".to_string(),
                name: "Lockpicks".to_string(),
                dice_delta: 2,
                dc_delta: 0,
                source: None,
                required: true,
                present: false,
                category: EquipmentCategory::Tool,
            })
            .build();
        let req = request(&ctx, 5, 3);

        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert!(matches!(
            result.blocked,
            Some(BlockReason::MissingEquipment { ref modifier_id }) if modifier_id == "lockpicks"
        ));
        assert!(result.resolution.faces.is_empty());
        assert_eq!(result.outcome.tier, OutcomeTier::Failure);
    }

    #[test]
    fn hard_block_consequence_short_circuits() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 5, 3);

        // A fumbled lockpicking check leaves a hard block behind.
        let mut store = MemoryConsequenceStore::new();
        let created = service
            .pipeline()
            .create_consequence(&mut store, "mira", "lockpicking", None, None)
            .unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert!(matches!(
            result.blocked,
            Some(BlockReason::Consequence { ref consequence_id })
                if *consequence_id == created.consequence_id
        ));
        assert_eq!(result.resolution.successes, 0);
        assert!(result.resolution.faces.is_empty());
        assert_eq!(result.applied_consequences, vec![created.consequence_id]);
    }

    #[test]
    fn dice_penalty_consequences_shrink_the_pool() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 5, 3);

        // Athletics fumbles cost dice; scope the check to athletics.
        let mut store = MemoryConsequenceStore::new();
        service
            .pipeline()
            .create_consequence(&mut store, "mira", "athletics", None, None)
            .unwrap();
        let athletics_req = CheckRequest {
            skill_id: "athletics",
            ..req
        };

        let mut rng = StdRng::seed_from_u64(9);
        let result = service.resolve(&athletics_req, &mut store, &mut rng);
        // Strained limb: 2 dice gone from a pool of 5.
        assert_eq!(result.resolution.faces.len(), 3);
        assert_eq!(result.applied_consequences.len(), 1);
    }

    #[test]
    fn fumble_creates_a_consequence() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 2, 3);
        let seed = seed_for_tier(&service, &req, OutcomeTier::Fumble);

        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert_eq!(result.outcome.tier, OutcomeTier::Fumble);
        assert_eq!(result.triggered_consequence_ids.len(), 1);
        let created = store.get(&result.triggered_consequence_ids[0]).unwrap();
        assert_eq!(created.fumble_type, "mechanism-jammed");
    }

    #[test]
    fn auto_succeed_bypasses_the_roll() {
        let abilities = FixedGrant(MasteryGrant {
            auto_succeed: true,
            bonus_dice: 0,
            reroll_limit: 0,
        });
        let content = NoContent;
        let service = SkillCheckService::standard(&abilities, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 0, 4);

        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert!(result.resolution.auto_succeeded);
        assert_eq!(result.outcome.tier, OutcomeTier::Success);
        assert_eq!(result.outcome.successes, 4);
    }

    #[test]
    fn mastery_bonus_dice_reach_the_pool() {
        let abilities = FixedGrant(MasteryGrant {
            auto_succeed: false,
            bonus_dice: 3,
            reroll_limit: 0,
        });
        let content = NoContent;
        let service = SkillCheckService::standard(&abilities, &content);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 2, 3);

        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert_eq!(result.resolution.faces.len(), 5);
    }

    #[test]
    fn specialization_bonus_is_folded_in() {
        let specializations = FixedBonus(SkillBonus {
            dice_delta: 2,
            dc_delta: -1,
        });
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &specializations);
        let ctx = SkillContext::empty();
        let req = request(&ctx, 3, 3);

        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(3);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert_eq!(result.resolution.faces.len(), 5);
        assert_eq!(result.resolution.dc, 2);
    }

    #[test]
    fn contested_fumble_loses_outright() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();

        // Hunt a seed where the initiator's roll fumbles and the
        // defender's does not.
        for seed in 0..5000 {
            let mut store = MemoryConsequenceStore::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let init = CheckRequest {
                actor_id: "mira",
                dc: 0,
                ..request(&ctx, 2, 0)
            };
            let def = CheckRequest {
                actor_id: "guard",
                skill_id: "perception",
                dc: 0,
                ..request(&ctx, 4, 0)
            };
            let result = service.resolve_contested(&init, &def, &mut store, &mut rng);
            if result.initiator_roll.is_fumble() && !result.defender_roll.is_fumble() {
                assert_eq!(result.outcome, ContestedOutcome::InitiatorFumble);
                return;
            }
        }
        panic!("no qualifying seed found");
    }

    #[test]
    fn contested_tie_on_equal_successes() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();

        for seed in 0..5000 {
            let mut store = MemoryConsequenceStore::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let init = CheckRequest {
                actor_id: "mira",
                ..request(&ctx, 3, 0)
            };
            let def = CheckRequest {
                actor_id: "guard",
                ..request(&ctx, 3, 0)
            };
            let result = service.resolve_contested(&init, &def, &mut store, &mut rng);
            if result.outcome == ContestedOutcome::Tie {
                assert_eq!(result.margin, 0);
                assert_eq!(
                    result.initiator_roll.successes,
                    result.defender_roll.successes
                );
                return;
            }
        }
        panic!("no qualifying seed found");
    }

    #[test]
    fn check_result_survives_a_serde_round_trip() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);

        // A fumble carries the most state: faces, botches, and a
        // triggered consequence id.
        let ctx = SkillContext::empty();
        let req = request(&ctx, 1, 10);
        let seed = seed_for_tier(&service, &req, OutcomeTier::Fumble);
        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(seed);
        let result = service.resolve(&req, &mut store, &mut rng);
        assert!(!result.triggered_consequence_ids.is_empty());

        let encoded = serde_json::to_string(&result).unwrap();
        let decoded: CheckResult = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, result);
    }
}
