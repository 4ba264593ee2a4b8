//! Extended checks: accumulate successes across rounds toward a goal.
//!
//! Where a chain is a sequence of distinct steps, an extended check is
//! one long task rolled round by round against a single success
//! target. Each round banks its successes; a fumbled round forfeits
//! banked progress instead, and a run of consecutive fumbles ends the
//! attempt catastrophically. The round limit bounds how long the task
//! may drag on.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::chain::ChainStatus;
use crate::check::{CheckRequest, CheckResult, SkillCheckService};
use crate::context::SkillContext;
use crate::error::{EngineError, EngineResult};
use crate::fumble::ConsequenceStore;
use crate::outcome::OutcomeTier;

/// Round limit when the caller does not give one.
pub const DEFAULT_MAX_ROUNDS: u32 = 10;

/// Banked successes forfeited by a fumbled round.
pub const FUMBLE_SETBACK: u32 = 2;

/// Consecutive fumbles that end the check catastrophically.
pub const CATASTROPHE_FUMBLES: u32 = 3;

/// One recorded round of an extended check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedRound {
    /// One-based round number.
    pub round: u32,
    /// The tier the round's roll classified as.
    pub tier: OutcomeTier,
    /// Successes rolled this round.
    pub successes: u32,
    /// Whether the round fumbled.
    pub fumbled: bool,
    /// Banked successes after this round settled.
    pub accumulated_after: u32,
}

/// Persistent state of one extended check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedCheckState {
    /// Unique identifier for this check.
    pub check_id: String,
    /// The acting character.
    pub actor_id: String,
    /// The skill rolled every round.
    pub skill_id: String,
    /// Banked successes needed to complete the task.
    pub target_successes: u32,
    /// Rounds allowed before the task fails on time.
    pub max_rounds: u32,
    /// Base dice pool rolled each round.
    pub base_pool: u32,
    /// Successes banked so far.
    pub accumulated: u32,
    /// Fumbles in the current unbroken run.
    pub consecutive_fumbles: u32,
    /// Fumbles over the whole check.
    pub total_fumbles: u32,
    /// Every round rolled, in order.
    pub rounds: Vec<ExtendedRound>,
    /// Current lifecycle status.
    pub status: ChainStatus,
}

impl ExtendedCheckState {
    /// Rounds rolled so far.
    pub fn rounds_completed(&self) -> u32 {
        self.rounds.len() as u32
    }

    /// Rounds left before the check fails on time.
    pub fn rounds_remaining(&self) -> u32 {
        self.max_rounds.saturating_sub(self.rounds_completed())
    }

    /// Successes still needed.
    pub fn remaining_successes(&self) -> u32 {
        self.target_successes.saturating_sub(self.accumulated)
    }

    /// Whether one more fumble would end the check catastrophically.
    pub fn at_risk(&self) -> bool {
        self.status.is_active() && self.consecutive_fumbles + 1 == CATASTROPHE_FUMBLES
    }
}

/// Drives extended checks over a [`SkillCheckService`].
pub struct ExtendedCheckService<'s, 'p> {
    checks: &'s SkillCheckService<'p>,
}

impl<'s, 'p> ExtendedCheckService<'s, 'p> {
    /// Create an extended check service over the given check service.
    pub fn new(checks: &'s SkillCheckService<'p>) -> Self {
        Self { checks }
    }

    /// Start a new extended check.
    pub fn start(
        &self,
        actor_id: &str,
        skill_id: &str,
        target_successes: u32,
        max_rounds: u32,
        base_pool: u32,
    ) -> EngineResult<ExtendedCheckState> {
        if target_successes == 0 || max_rounds == 0 {
            return Err(EngineError::InvalidExtendedCheck(skill_id.to_string()));
        }
        let check_id = format!("ext-{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            check = %check_id,
            actor = actor_id,
            skill = skill_id,
            target = target_successes,
            max_rounds,
            "extended check started"
        );
        Ok(ExtendedCheckState {
            check_id,
            actor_id: actor_id.to_string(),
            skill_id: skill_id.to_string(),
            target_successes,
            max_rounds,
            base_pool,
            accumulated: 0,
            consecutive_fumbles: 0,
            total_fumbles: 0,
            rounds: Vec::new(),
            status: ChainStatus::InProgress,
        })
    }

    /// Roll one round of an in-progress extended check.
    ///
    /// Successes bank toward the target; a fumble forfeits
    /// [`FUMBLE_SETBACK`] banked successes instead. The round's DC is
    /// the successes still needed, so a round classified as a success
    /// is one that finished the task.
    pub fn perform_round(
        &self,
        state: &mut ExtendedCheckState,
        context: Option<&SkillContext>,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> EngineResult<CheckResult> {
        if !state.status.is_active() {
            return Err(EngineError::ExtendedCheckInactive {
                check_id: state.check_id.clone(),
                status: state.status,
            });
        }

        let empty = SkillContext::empty();
        let context = context.unwrap_or(&empty);
        let req = CheckRequest {
            actor_id: &state.actor_id,
            skill_id: &state.skill_id,
            sub_type: None,
            target_id: None,
            context,
            base_pool: state.base_pool,
            dc: state.remaining_successes(),
        };
        let check = self.checks.resolve(&req, store, rng);

        let fumbled = check.resolution.is_fumble();
        if fumbled {
            state.consecutive_fumbles += 1;
            state.total_fumbles += 1;
            state.accumulated = state.accumulated.saturating_sub(FUMBLE_SETBACK);
        } else {
            state.consecutive_fumbles = 0;
            state.accumulated += check.resolution.successes;
        }
        state.rounds.push(ExtendedRound {
            round: state.rounds_completed() + 1,
            tier: check.outcome.tier,
            successes: check.resolution.successes,
            fumbled,
            accumulated_after: state.accumulated,
        });

        if state.consecutive_fumbles >= CATASTROPHE_FUMBLES {
            state.status = ChainStatus::Failed;
        } else if state.accumulated >= state.target_successes {
            state.status = ChainStatus::Succeeded;
        } else if state.rounds_remaining() == 0 {
            state.status = ChainStatus::Failed;
        }

        if fumbled {
            tracing::warn!(
                check = %state.check_id,
                round = state.rounds_completed(),
                accumulated = state.accumulated,
                consecutive = state.consecutive_fumbles,
                at_risk = state.at_risk(),
                "extended check round fumbled"
            );
        } else {
            tracing::debug!(
                check = %state.check_id,
                round = state.rounds_completed(),
                successes = check.resolution.successes,
                accumulated = state.accumulated,
                target = state.target_successes,
                remaining_rounds = state.rounds_remaining(),
                "extended check round resolved"
            );
        }
        if !state.status.is_active() {
            tracing::info!(
                check = %state.check_id,
                status = %state.status,
                accumulated = state.accumulated,
                rounds = state.rounds_completed(),
                fumbles = state.total_fumbles,
                "extended check finished"
            );
        }

        Ok(check)
    }

    /// Abandon an in-progress extended check.
    pub fn abandon(&self, state: &mut ExtendedCheckState) -> EngineResult<()> {
        if !state.status.is_active() {
            return Err(EngineError::ExtendedCheckInactive {
                check_id: state.check_id.clone(),
                status: state.status,
            });
        }
        state.status = ChainStatus::Abandoned;
        tracing::info!(
            check = %state.check_id,
            accumulated = state.accumulated,
            target = state.target_successes,
            rounds = state.rounds_completed(),
            "extended check abandoned"
        );
        Ok(())
    }
}
