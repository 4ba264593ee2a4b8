//! Cooperative checks: several actors, one combined outcome.
//!
//! The combination policy is a required input, never inferred. Group
//! stealth wants WeakestLink; "someone just needs to recall the
//! ritual" wants BestEffort; hauling a gate open together wants
//! SumSuccesses; a surgeon with steady-handed helpers wants Assisted.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::check::{CheckRequest, CheckResult, SkillCheckService};
use crate::context::SkillContext;
use crate::error::{EngineError, EngineResult};
use crate::fumble::ConsequenceStore;
use crate::modifier::SituationalModifier;
use crate::outcome::{Outcome, OutcomeTier};

/// How individual rolls combine into one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinationPolicy {
    /// The worst outcome among all participants stands.
    WeakestLink,
    /// The best outcome among all participants stands.
    BestEffort,
    /// Successes are pooled and reclassified against the shared DC.
    SumSuccesses,
    /// Helpers roll first; each helper with two or more successes
    /// grants the primary participant one bonus die.
    Assisted,
}

impl std::fmt::Display for CombinationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::WeakestLink => "weakest-link",
            Self::BestEffort => "best-effort",
            Self::SumSuccesses => "sum-successes",
            Self::Assisted => "assisted",
        };
        write!(f, "{s}")
    }
}

/// One actor taking part in a cooperative check.
#[derive(Debug, Clone, Copy)]
pub struct Participant<'a> {
    /// The acting character.
    pub actor_id: &'a str,
    /// Per-participant context; falls back to the shared context.
    pub context: Option<&'a SkillContext>,
    /// This participant's base dice pool.
    pub base_pool: u32,
}

/// The computed aggregate of a cooperative check. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooperativeCheckResult {
    /// The policy that combined the rolls.
    pub policy: CombinationPolicy,
    /// The skill everyone rolled.
    pub skill_id: String,
    /// The shared DC.
    pub dc: u32,
    /// The combined outcome.
    pub outcome: Outcome,
    /// Every individual result, in participant order.
    pub individual: Vec<(String, CheckResult)>,
    /// Actors credited with the combined result.
    pub contributors: Vec<String>,
}

impl SkillCheckService<'_> {
    /// Resolve a cooperative check under the given policy.
    ///
    /// `participants` must be non-empty. Each participant rolls with
    /// their own context (or `shared_context` if they have none);
    /// helpers under [`CombinationPolicy::Assisted`] roll against
    /// DC 0 before the primary rolls.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_cooperative(
        &self,
        participants: &[Participant<'_>],
        skill_id: &str,
        dc: u32,
        policy: CombinationPolicy,
        shared_context: &SkillContext,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> EngineResult<CooperativeCheckResult> {
        if participants.is_empty() {
            return Err(EngineError::NoParticipants);
        }

        tracing::debug!(
            %policy,
            skill = skill_id,
            dc,
            count = participants.len(),
            "resolving cooperative check"
        );

        let result = match policy {
            CombinationPolicy::Assisted => {
                self.resolve_assisted(participants, skill_id, dc, shared_context, store, rng)
            }
            _ => {
                let individual: Vec<(String, CheckResult)> = participants
                    .iter()
                    .map(|p| {
                        let req = CheckRequest {
                            actor_id: p.actor_id,
                            skill_id,
                            sub_type: None,
                            target_id: None,
                            context: p.context.unwrap_or(shared_context),
                            base_pool: p.base_pool,
                            dc,
                        };
                        (p.actor_id.to_string(), self.resolve(&req, store, rng))
                    })
                    .collect();
                self.combine(policy, skill_id, dc, individual)
            }
        };

        tracing::info!(
            %policy,
            skill = skill_id,
            outcome = %result.outcome,
            "cooperative check resolved"
        );
        Ok(result)
    }

    fn combine(
        &self,
        policy: CombinationPolicy,
        skill_id: &str,
        dc: u32,
        individual: Vec<(String, CheckResult)>,
    ) -> CooperativeCheckResult {
        let (outcome, contributors) = match policy {
            CombinationPolicy::WeakestLink => {
                let worst = individual
                    .iter()
                    .min_by_key(|(_, r)| (r.outcome.tier, r.outcome.margin))
                    .expect("participants are non-empty");
                let all = individual.iter().map(|(id, _)| id.clone()).collect();
                (worst.1.outcome, all)
            }
            CombinationPolicy::BestEffort => {
                let best = individual
                    .iter()
                    .max_by_key(|(_, r)| (r.outcome.tier, r.outcome.margin))
                    .expect("participants are non-empty");
                (best.1.outcome, vec![best.0.clone()])
            }
            CombinationPolicy::SumSuccesses => {
                let total: u32 = individual.iter().map(|(_, r)| r.resolution.successes).sum();
                // Pooled effort only fumbles when every contributor
                // fumbled; one botched roll does not poison the sum.
                let all_fumbled = individual
                    .iter()
                    .all(|(_, r)| r.outcome.tier == OutcomeTier::Fumble);
                let outcome = self.bands().classify(total, dc, all_fumbled);
                let contributors = individual
                    .iter()
                    .filter(|(_, r)| r.resolution.successes > 0)
                    .map(|(id, _)| id.clone())
                    .collect();
                (outcome, contributors)
            }
            CombinationPolicy::Assisted => unreachable!("assisted is resolved separately"),
        };

        CooperativeCheckResult {
            policy,
            skill_id: skill_id.to_string(),
            dc,
            outcome,
            individual,
            contributors,
        }
    }

    fn resolve_assisted(
        &self,
        participants: &[Participant<'_>],
        skill_id: &str,
        dc: u32,
        shared_context: &SkillContext,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> CooperativeCheckResult {
        let primary = &participants[0];
        let helpers = &participants[1..];

        let mut individual = Vec::new();
        let mut contributors = vec![primary.actor_id.to_string()];
        let mut bonus_dice = 0u32;

        for helper in helpers {
            let req = CheckRequest {
                actor_id: helper.actor_id,
                skill_id,
                sub_type: None,
                target_id: None,
                context: helper.context.unwrap_or(shared_context),
                base_pool: helper.base_pool,
                dc: 0,
            };
            let result = self.resolve(&req, store, rng);
            let grants = result.resolution.successes >= 2;
            tracing::debug!(
                helper = helper.actor_id,
                successes = result.resolution.successes,
                grants,
                "assist roll"
            );
            if grants {
                bonus_dice += 1;
                contributors.push(helper.actor_id.to_string());
            }
            individual.push((helper.actor_id.to_string(), result));
        }

        // Fold the helper dice into the primary's context as an
        // assisted situational modifier, preserving the audit trail.
        let base = primary.context.unwrap_or(shared_context).clone();
        let assisted_context = if bonus_dice > 0 {
            let mut builder = crate::context::SkillContextBuilder::new();
            for m in base.equipment() {
                builder = builder.with_equipment(m.clone());
            }
            for m in base.situational() {
                builder = builder.with_situation(m.clone());
            }
            for m in base.environment() {
                builder = builder.with_environment(m.clone());
            }
            for m in base.target() {
                builder = builder.with_target(m.clone());
            }
            for s in base.applied_statuses() {
                builder = builder.with_applied_status(s.clone());
            }
            builder
                .with_situation(SituationalModifier::assisted(bonus_dice, "helpers"))
                .build()
        } else {
            base
        };

        let req = CheckRequest {
            actor_id: primary.actor_id,
            skill_id,
            sub_type: None,
            target_id: None,
            context: &assisted_context,
            base_pool: primary.base_pool,
            dc,
        };
        let primary_result = self.resolve(&req, store, rng);
        let outcome = primary_result.outcome;
        individual.insert(0, (primary.actor_id.to_string(), primary_result));

        CooperativeCheckResult {
            policy: CombinationPolicy::Assisted,
            skill_id: skill_id.to_string(),
            dc,
            outcome,
            individual,
            contributors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    use crate::fumble::MemoryConsequenceStore;
    use crate::providers::NoContent;

    fn participant(actor_id: &str, base_pool: u32) -> Participant<'_> {
        Participant {
            actor_id,
            context: None,
            base_pool,
        }
    }

    #[test]
    fn empty_participants_is_an_error() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(1);
        let err = service
            .resolve_cooperative(
                &[],
                "stealth",
                2,
                CombinationPolicy::WeakestLink,
                &ctx,
                &mut store,
                &mut rng,
            )
            .unwrap_err();
        assert!(matches!(err, EngineError::NoParticipants));
    }

    #[test]
    fn weakest_link_takes_the_worst_outcome() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let individual = vec![
            (
                "a".to_string(),
                fake_result(&service, OutcomeTier::Success, 4, 2),
            ),
            (
                "b".to_string(),
                fake_result(&service, OutcomeTier::Fumble, 0, 2),
            ),
            (
                "c".to_string(),
                fake_result(&service, OutcomeTier::CriticalSuccess, 8, 2),
            ),
        ];
        let combined = service.combine(CombinationPolicy::WeakestLink, "stealth", 2, individual);
        assert_eq!(combined.outcome.tier, OutcomeTier::Fumble);
        assert_eq!(combined.contributors.len(), 3);
    }

    #[test]
    fn best_effort_takes_the_best_outcome() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let individual = vec![
            (
                "a".to_string(),
                fake_result(&service, OutcomeTier::Failure, 1, 2),
            ),
            (
                "b".to_string(),
                fake_result(&service, OutcomeTier::CriticalSuccess, 8, 2),
            ),
        ];
        let combined = service.combine(CombinationPolicy::BestEffort, "lore", 2, individual);
        assert_eq!(combined.outcome.tier, OutcomeTier::CriticalSuccess);
        assert_eq!(combined.contributors, vec!["b".to_string()]);
    }

    #[test]
    fn sum_successes_pools_and_reclassifies() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let individual = vec![
            (
                "a".to_string(),
                fake_result(&service, OutcomeTier::Failure, 2, 5),
            ),
            (
                "b".to_string(),
                fake_result(&service, OutcomeTier::Failure, 2, 5),
            ),
            (
                "c".to_string(),
                fake_result(&service, OutcomeTier::Failure, 1, 5),
            ),
        ];
        // 2 + 2 + 1 = 5 successes vs DC 5: pooled effort makes it.
        let combined = service.combine(CombinationPolicy::SumSuccesses, "labor", 5, individual);
        assert_eq!(combined.outcome.successes, 5);
        assert!(combined.outcome.is_success());
        assert_eq!(combined.contributors.len(), 3);
    }

    #[test]
    fn sum_successes_single_fumble_does_not_poison_the_pool() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let individual = vec![
            (
                "a".to_string(),
                fake_result(&service, OutcomeTier::Fumble, 0, 3),
            ),
            (
                "b".to_string(),
                fake_result(&service, OutcomeTier::Success, 4, 3),
            ),
        ];
        let combined = service.combine(CombinationPolicy::SumSuccesses, "labor", 3, individual);
        assert_ne!(combined.outcome.tier, OutcomeTier::Fumble);
    }

    #[test]
    fn cooperative_rolls_end_to_end() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();
        let mut store = MemoryConsequenceStore::new();
        let mut rng = StdRng::seed_from_u64(21);
        let result = service
            .resolve_cooperative(
                &[participant("a", 4), participant("b", 6)],
                "stealth",
                2,
                CombinationPolicy::WeakestLink,
                &ctx,
                &mut store,
                &mut rng,
            )
            .unwrap();
        assert_eq!(result.individual.len(), 2);
        let worst = result
            .individual
            .iter()
            .map(|(_, r)| r.outcome.tier)
            .min()
            .unwrap();
        assert_eq!(result.outcome.tier, worst);
    }

    #[test]
    fn assisted_helpers_grant_bonus_dice() {
        let content = NoContent;
        let service = SkillCheckService::standard(&content, &content);
        let ctx = SkillContext::empty();

        // Hunt a seed where at least one helper grants a bonus, then
        // confirm the primary's pool grew accordingly.
        for seed in 0..2000 {
            let mut store = MemoryConsequenceStore::new();
            let mut rng = StdRng::seed_from_u64(seed);
            let result = service
                .resolve_cooperative(
                    &[
                        participant("surgeon", 4),
                        participant("helper-1", 5),
                        participant("helper-2", 5),
                    ],
                    "medicine",
                    3,
                    CombinationPolicy::Assisted,
                    &ctx,
                    &mut store,
                    &mut rng,
                )
                .unwrap();
            let granting = result.contributors.len() - 1;
            if granting > 0 {
                let (primary_id, primary_result) = &result.individual[0];
                assert_eq!(primary_id, "surgeon");
                assert_eq!(primary_result.resolution.faces.len(), 4 + granting);
                return;
            }
        }
        panic!("no qualifying seed found");
    }

    /// Construct a CheckResult with a chosen tier for combine() tests.
    fn fake_result(
        service: &SkillCheckService<'_>,
        tier: OutcomeTier,
        successes: u32,
        dc: u32,
    ) -> CheckResult {
        let is_fumble = tier == OutcomeTier::Fumble;
        let outcome = service.bands().classify(successes, dc, is_fumble);
        assert_eq!(outcome.tier, tier, "test fixture tier mismatch");
        CheckResult {
            outcome,
            resolution: crate::dice::DiceResolution {
                faces: Vec::new(),
                rerolled: Vec::new(),
                successes,
                botches: u32::from(is_fumble),
                dc,
                auto_succeeded: false,
            },
            blocked: None,
            applied_consequences: Vec::new(),
            triggered_consequence_ids: Vec::new(),
        }
    }
}
