//! Chained checks: multi-step tasks that persist between rolls.
//!
//! A chain holds an ordered list of steps, each its own skill check.
//! Steps advance on marginal success or better. A plain failure
//! pauses the chain until the caller retries (if the step has budget
//! left) or abandons; a fumble fails the whole chain on the spot.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::check::{CheckRequest, CheckResult, SkillCheckService};
use crate::context::SkillContext;
use crate::error::{EngineError, EngineResult};
use crate::fumble::ConsequenceStore;
use crate::outcome::OutcomeTier;

/// Lifecycle of a persisted multi-roll check (chained or extended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    /// The check still accepts rolls.
    InProgress,
    /// The goal was reached.
    Succeeded,
    /// A fumble, an exhausted retry budget, or a spent round limit
    /// ended the check.
    Failed,
    /// The caller walked away mid-check.
    Abandoned,
}

impl ChainStatus {
    /// Whether the chain still accepts rolls.
    pub fn is_active(self) -> bool {
        matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InProgress => "in progress",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{s}")
    }
}

/// One step of a chained check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStep {
    /// Stable identifier for this step.
    pub id: String,
    /// Human-readable step name.
    pub name: String,
    /// The skill rolled for this step.
    pub skill_id: String,
    /// Required successes for this step.
    pub dc: u32,
    /// Base dice pool for this step.
    pub base_pool: u32,
    /// How many retries a plain failure permits before the chain
    /// fails. Zero means a single failure ends the chain.
    pub max_retries: u32,
    /// Modifier context baked into this step when the chain was
    /// built. A per-roll context passed to `process_step` or
    /// `retry_step` takes precedence over it.
    pub context: Option<SkillContext>,
}

/// A recorded roll against one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainAttempt {
    /// Index of the step attempted.
    pub step_index: usize,
    /// The tier the attempt classified as.
    pub tier: OutcomeTier,
    /// Net successes rolled.
    pub successes: u32,
    /// Whether this attempt spent retry budget.
    pub was_retry: bool,
    /// When the attempt was made.
    pub at: DateTime<Utc>,
}

/// Persistent state of one chained check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainedCheckState {
    /// Unique identifier for this chain.
    pub check_id: String,
    /// The acting character.
    pub actor_id: String,
    /// Human-readable chain name.
    pub name: String,
    /// The ordered steps.
    pub steps: Vec<ChainStep>,
    /// Index of the step currently awaiting resolution.
    pub current_step: usize,
    /// Every attempt made so far, in order.
    pub attempts: Vec<ChainAttempt>,
    /// Current lifecycle status.
    pub status: ChainStatus,
}

impl ChainedCheckState {
    /// Attempts made against the current step.
    pub fn current_step_attempts(&self) -> impl Iterator<Item = &ChainAttempt> {
        self.attempts
            .iter()
            .filter(|a| a.step_index == self.current_step)
    }

    /// Retries still available on the current step.
    pub fn retries_remaining(&self) -> u32 {
        let budget = self.steps[self.current_step].max_retries;
        let used = self
            .current_step_attempts()
            .filter(|a| a.was_retry)
            .count() as u32;
        budget.saturating_sub(used)
    }

    /// Whether the current step sits on an unresolved soft failure,
    /// waiting for a retry or abandon decision.
    pub fn awaiting_retry(&self) -> bool {
        self.status.is_active()
            && self
                .current_step_attempts()
                .last()
                .is_some_and(|a| a.tier == OutcomeTier::Failure)
    }
}

/// Persistence seam for chained checks.
pub trait ChainRepository {
    /// Store a new chain.
    fn insert(&mut self, state: ChainedCheckState);
    /// Fetch a chain by id.
    fn get(&self, check_id: &str) -> Option<ChainedCheckState>;
    /// Replace a stored chain.
    fn update(&mut self, state: ChainedCheckState) -> EngineResult<()>;
    /// All in-progress chains for one actor.
    fn active_for(&self, actor_id: &str) -> Vec<ChainedCheckState>;
}

/// In-memory [`ChainRepository`] for tests and single-session play.
#[derive(Debug, Default)]
pub struct MemoryChainRepository {
    chains: HashMap<String, ChainedCheckState>,
}

impl MemoryChainRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChainRepository for MemoryChainRepository {
    fn insert(&mut self, state: ChainedCheckState) {
        self.chains.insert(state.check_id.clone(), state);
    }

    fn get(&self, check_id: &str) -> Option<ChainedCheckState> {
        self.chains.get(check_id).cloned()
    }

    fn update(&mut self, state: ChainedCheckState) -> EngineResult<()> {
        if !self.chains.contains_key(&state.check_id) {
            return Err(EngineError::ChainNotFound(state.check_id));
        }
        self.chains.insert(state.check_id.clone(), state);
        Ok(())
    }

    fn active_for(&self, actor_id: &str) -> Vec<ChainedCheckState> {
        self.chains
            .values()
            .filter(|c| c.actor_id == actor_id && c.status.is_active())
            .cloned()
            .collect()
    }
}

/// What one `process_step` or `retry_step` call produced.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The resolved check for this attempt.
    pub check: CheckResult,
    /// Index of the step that was rolled.
    pub step_index: usize,
    /// Chain status after the attempt.
    pub chain_status: ChainStatus,
    /// Retries still available on the attempted step after this
    /// attempt. Zero once the chain is terminal.
    pub retries_remaining: u32,
}

/// Drives chained checks over a [`SkillCheckService`].
pub struct ChainService<'s, 'p> {
    checks: &'s SkillCheckService<'p>,
}

impl<'s, 'p> ChainService<'s, 'p> {
    /// Create a chain service over the given check service.
    pub fn new(checks: &'s SkillCheckService<'p>) -> Self {
        Self { checks }
    }

    /// Start a new chain and persist it. Returns the chain id.
    pub fn start_chain(
        &self,
        actor_id: &str,
        name: &str,
        steps: Vec<ChainStep>,
        repo: &mut dyn ChainRepository,
    ) -> EngineResult<String> {
        if steps.is_empty() {
            return Err(EngineError::EmptyChain(name.to_string()));
        }
        let check_id = format!("chain-{}", uuid::Uuid::new_v4().simple());
        tracing::info!(
            chain = %check_id,
            actor = actor_id,
            name,
            steps = steps.len(),
            "chain started"
        );
        repo.insert(ChainedCheckState {
            check_id: check_id.clone(),
            actor_id: actor_id.to_string(),
            name: name.to_string(),
            steps,
            current_step: 0,
            attempts: Vec::new(),
            status: ChainStatus::InProgress,
        });
        Ok(check_id)
    }

    /// Roll the current step of an in-progress chain.
    ///
    /// Errors if the chain is terminal or its current step sits on an
    /// unresolved soft failure. `step_context` overrides the chain's
    /// modifier context for this roll only.
    pub fn process_step(
        &self,
        check_id: &str,
        step_context: Option<&SkillContext>,
        repo: &mut dyn ChainRepository,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> EngineResult<StepOutcome> {
        let state = self.load_active(check_id, repo)?;
        if state.awaiting_retry() {
            return Err(EngineError::AwaitingRetry(check_id.to_string()));
        }
        self.roll_current(state, false, step_context, repo, store, rng)
    }

    /// Spend retry budget to reroll the current step after a soft
    /// failure.
    pub fn retry_step(
        &self,
        check_id: &str,
        step_context: Option<&SkillContext>,
        repo: &mut dyn ChainRepository,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> EngineResult<StepOutcome> {
        let state = self.load_active(check_id, repo)?;
        if !state.awaiting_retry() {
            return Err(EngineError::RetryNotAllowed {
                check_id: check_id.to_string(),
                step: state.current_step,
                reason: "current step has no failed attempt to retry".to_string(),
            });
        }
        if state.retries_remaining() == 0 {
            return Err(EngineError::RetryNotAllowed {
                check_id: check_id.to_string(),
                step: state.current_step,
                reason: "retry budget exhausted".to_string(),
            });
        }
        self.roll_current(state, true, step_context, repo, store, rng)
    }

    /// Abandon an in-progress chain.
    pub fn abandon(&self, check_id: &str, repo: &mut dyn ChainRepository) -> EngineResult<()> {
        let mut state = self.load_active(check_id, repo)?;
        state.status = ChainStatus::Abandoned;
        tracing::info!(chain = check_id, step = state.current_step, "chain abandoned");
        repo.update(state)
    }

    /// Current state of a chain, terminal or not.
    pub fn chain_state(
        &self,
        check_id: &str,
        repo: &dyn ChainRepository,
    ) -> EngineResult<ChainedCheckState> {
        repo.get(check_id)
            .ok_or_else(|| EngineError::ChainNotFound(check_id.to_string()))
    }

    /// All in-progress chains for one actor.
    pub fn active_chains_for(
        &self,
        actor_id: &str,
        repo: &dyn ChainRepository,
    ) -> Vec<ChainedCheckState> {
        repo.active_for(actor_id)
    }

    fn load_active(
        &self,
        check_id: &str,
        repo: &dyn ChainRepository,
    ) -> EngineResult<ChainedCheckState> {
        let state = repo
            .get(check_id)
            .ok_or_else(|| EngineError::ChainNotFound(check_id.to_string()))?;
        if !state.status.is_active() {
            return Err(EngineError::ChainNotActive {
                check_id: check_id.to_string(),
                status: state.status,
            });
        }
        Ok(state)
    }

    fn roll_current(
        &self,
        mut state: ChainedCheckState,
        was_retry: bool,
        step_context: Option<&SkillContext>,
        repo: &mut dyn ChainRepository,
        store: &mut dyn ConsequenceStore,
        rng: &mut StdRng,
    ) -> EngineResult<StepOutcome> {
        let step_index = state.current_step;
        let step = state.steps[step_index].clone();

        let empty = SkillContext::empty();
        let context = step_context.or(step.context.as_ref()).unwrap_or(&empty);
        let req = CheckRequest {
            actor_id: &state.actor_id,
            skill_id: &step.skill_id,
            sub_type: None,
            target_id: None,
            context,
            base_pool: step.base_pool,
            dc: step.dc,
        };
        let check = self.checks.resolve(&req, store, rng);

        state.attempts.push(ChainAttempt {
            step_index,
            tier: check.outcome.tier,
            successes: check.outcome.successes,
            was_retry,
            at: Utc::now(),
        });

        match check.outcome.tier {
            OutcomeTier::Fumble => {
                // Fumbles end the chain regardless of retry budget.
                state.status = ChainStatus::Failed;
            }
            OutcomeTier::Failure => {
                if state.retries_remaining() == 0 {
                    state.status = ChainStatus::Failed;
                }
            }
            _ => {
                if step_index + 1 == state.steps.len() {
                    state.status = ChainStatus::Succeeded;
                } else {
                    state.current_step += 1;
                }
            }
        }

        tracing::info!(
            chain = %state.check_id,
            step = step_index,
            tier = %check.outcome.tier,
            status = %state.status,
            "chain step resolved"
        );

        // Budget of the step that was rolled, not whichever step the
        // chain moved on to.
        let retries_used = state
            .attempts
            .iter()
            .filter(|a| a.step_index == step_index && a.was_retry)
            .count() as u32;
        let outcome = StepOutcome {
            check,
            step_index,
            chain_status: state.status,
            retries_remaining: if state.status.is_active() {
                step.max_retries.saturating_sub(retries_used)
            } else {
                0
            },
        };
        repo.update(state)?;
        Ok(outcome)
    }
}
