//! Skill check resolution engine for Rune & Rust.
//!
//! Provides success-counting dice pools, composable modifier contexts,
//! single and contested checks, cooperative checks under four
//! combination policies, multi-step chained checks, round-accumulating
//! extended checks, and a fumble consequence pipeline. All randomness
//! flows through caller-supplied seeded generators, so sessions replay
//! deterministically.

pub mod chain;
pub mod check;
pub mod context;
pub mod cooperative;
pub mod dice;
pub mod error;
pub mod extended;
pub mod fumble;
pub mod modifier;
pub mod outcome;
pub mod providers;
pub mod seed;

pub use chain::{
    ChainAttempt, ChainRepository, ChainService, ChainStatus, ChainStep, ChainedCheckState,
    MemoryChainRepository, StepOutcome,
};
pub use check::{
    BlockReason, CheckRequest, CheckResult, ContestedCheckResult, ContestedOutcome,
    SkillCheckService,
};
pub use context::{SkillContext, SkillContextBuilder};
pub use cooperative::{CombinationPolicy, CooperativeCheckResult, Participant};
pub use dice::{DiceResolution, DiceRules, Die, RollModifiers, resolve_pool};
pub use error::{EngineError, EngineResult};
pub use extended::{ExtendedCheckService, ExtendedCheckState, ExtendedRound};
pub use fumble::{
    ConsequencePenalty, ConsequenceStore, FumbleCatalog, FumbleConsequence, FumblePipeline,
    MemoryConsequenceStore,
};
pub use modifier::{
    CorruptionTier, DurationKind, EnvironmentModifier, EquipmentCategory, EquipmentModifier,
    Modifier, SituationalModifier, TargetModifier,
};
pub use outcome::{Outcome, OutcomeBands, OutcomeTier};
pub use providers::{
    CorruptionModifierProvider, MasterAbilityProvider, MasteryGrant, NoContent, SkillBonus,
    SpecializationBonusProvider, StandardCorruption,
};
pub use seed::rng_for;
