//! Fumble consequences: structured fallout from botched rolls.
//!
//! A fumble does not just fail the check, it leaves a consequence
//! behind — a jammed mechanism, a suspicious guard, a sprained wrist —
//! that taxes future checks matching its scope until it is recovered,
//! its conditions complete, or its time runs out.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

/// How an active consequence taxes a matching check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsequencePenalty {
    /// Remove dice from the pool.
    DicePenalty(u32),
    /// Raise the DC.
    DcPenalty(u32),
    /// Block the attempt outright; no dice are drawn.
    HardBlock,
}

/// A persisted consequence created by a fumbled check.
///
/// Scope: a consequence with a `skill_id` matches only that skill; one
/// with a `target_id` matches only checks against that target; one
/// with neither matches every check the character makes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FumbleConsequence {
    /// Stable identifier of this consequence.
    pub consequence_id: String,
    /// The character the consequence is attached to.
    pub character_id: String,
    /// Skill scope, if skill-specific.
    pub skill_id: Option<String>,
    /// Content-defined type tag (e.g. `"mechanism-jammed"`).
    pub fumble_type: String,
    /// Target scope, if target-specific.
    pub target_id: Option<String>,
    /// How the consequence taxes matching checks.
    pub penalty: ConsequencePenalty,
    /// False once recovered or expired.
    pub is_active: bool,
    /// When the consequence was created.
    pub created_at: DateTime<Utc>,
    /// Time-bound expiry, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Conditions that must all be completed to recover.
    pub recovery_conditions: Vec<String>,
}

impl FumbleConsequence {
    /// True if this consequence is active and its scope matches the
    /// given check.
    pub fn affects(&self, character_id: &str, skill_id: &str, target_id: Option<&str>) -> bool {
        if !self.is_active || self.character_id != character_id {
            return false;
        }
        if let Some(scope) = &self.skill_id {
            if scope != skill_id {
                return false;
            }
        }
        if let Some(scope) = &self.target_id {
            if target_id != Some(scope.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Content-defined fumble behavior for one skill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FumbleSpec {
    /// The type tag stamped onto created consequences.
    pub fumble_type: String,
    /// The penalty created consequences carry.
    pub penalty: ConsequencePenalty,
    /// Time-bound lifetime, if the consequence expires on its own.
    pub lifetime: Option<Duration>,
    /// Conditions that recover the consequence.
    pub recovery_conditions: Vec<String>,
    /// True if fumbles of this skill create no consequence at all.
    pub exempt: bool,
}

/// Maps skill ids to their fumble behavior, with a fallback for
/// unmapped skills. Normally loaded from content; [`standard`]
/// ships a small built-in table.
///
/// [`standard`]: FumbleCatalog::standard
#[derive(Debug, Clone)]
pub struct FumbleCatalog {
    by_skill: HashMap<String, FumbleSpec>,
    fallback: FumbleSpec,
}

impl FumbleCatalog {
    /// A catalog with only the given fallback spec.
    pub fn with_fallback(fallback: FumbleSpec) -> Self {
        Self {
            by_skill: HashMap::new(),
            fallback,
        }
    }

    /// The built-in table: lockpicking jams the mechanism, stealth
    /// raises suspicion against the target, athletics strains a limb
    /// for an hour of game time.
    pub fn standard() -> Self {
        let mut catalog = Self::with_fallback(FumbleSpec {
            fumble_type: "setback".to_string(),
            penalty: ConsequencePenalty::DicePenalty(1),
            lifetime: Some(Duration::minutes(30)),
            recovery_conditions: Vec::new(),
            exempt: false,
        });
        catalog.insert("lockpicking", FumbleSpec {
            fumble_type: "mechanism-jammed".to_string(),
            penalty: ConsequencePenalty::HardBlock,
            lifetime: None,
            recovery_conditions: vec!["clear-jam".to_string()],
            exempt: false,
        });
        catalog.insert("stealth", FumbleSpec {
            fumble_type: "suspicion-raised".to_string(),
            penalty: ConsequencePenalty::DcPenalty(2),
            lifetime: Some(Duration::hours(1)),
            recovery_conditions: vec!["break-line-of-sight".to_string()],
            exempt: false,
        });
        catalog.insert("athletics", FumbleSpec {
            fumble_type: "strained-limb".to_string(),
            penalty: ConsequencePenalty::DicePenalty(2),
            lifetime: Some(Duration::hours(1)),
            recovery_conditions: vec!["rest".to_string()],
            exempt: false,
        });
        catalog
    }

    /// Register (or replace) the spec for a skill.
    pub fn insert(&mut self, skill_id: impl Into<String>, spec: FumbleSpec) {
        self.by_skill.insert(skill_id.into(), spec);
    }

    /// The spec governing fumbles of the given skill.
    pub fn spec_for(&self, skill_id: &str) -> &FumbleSpec {
        self.by_skill.get(skill_id).unwrap_or(&self.fallback)
    }
}

impl Default for FumbleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Persistence seam for consequences. Externally owned; queried fresh
/// on every check. Mutation is assumed externally serialized per
/// consequence id.
pub trait ConsequenceStore {
    /// Persist a new consequence.
    fn insert(&mut self, consequence: FumbleConsequence);

    /// Fetch a consequence by id, active or not.
    fn get(&self, consequence_id: &str) -> Option<FumbleConsequence>;

    /// All active consequences whose scope matches the given check.
    fn affecting(
        &self,
        character_id: &str,
        skill_id: &str,
        target_id: Option<&str>,
    ) -> Vec<FumbleConsequence>;

    /// Deactivate a consequence. Errors if the id is unknown.
    fn deactivate(&mut self, consequence_id: &str) -> EngineResult<()>;

    /// Every active consequence in the store.
    fn active(&self) -> Vec<FumbleConsequence>;
}

/// In-memory store for tests and single-session play.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsequenceStore {
    items: Vec<FumbleConsequence>,
}

impl MemoryConsequenceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConsequenceStore for MemoryConsequenceStore {
    fn insert(&mut self, consequence: FumbleConsequence) {
        self.items.push(consequence);
    }

    fn get(&self, consequence_id: &str) -> Option<FumbleConsequence> {
        self.items
            .iter()
            .find(|c| c.consequence_id == consequence_id)
            .cloned()
    }

    fn affecting(
        &self,
        character_id: &str,
        skill_id: &str,
        target_id: Option<&str>,
    ) -> Vec<FumbleConsequence> {
        self.items
            .iter()
            .filter(|c| c.affects(character_id, skill_id, target_id))
            .cloned()
            .collect()
    }

    fn deactivate(&mut self, consequence_id: &str) -> EngineResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|c| c.consequence_id == consequence_id)
            .ok_or_else(|| EngineError::ConsequenceNotFound(consequence_id.to_string()))?;
        item.is_active = false;
        Ok(())
    }

    fn active(&self) -> Vec<FumbleConsequence> {
        self.items.iter().filter(|c| c.is_active).cloned().collect()
    }
}

/// Creates consequences from fumbles and manages their lifecycle.
#[derive(Debug, Clone, Default)]
pub struct FumblePipeline {
    catalog: FumbleCatalog,
}

impl FumblePipeline {
    /// Pipeline over the given catalog.
    pub fn new(catalog: FumbleCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog this pipeline draws specs from.
    pub fn catalog(&self) -> &FumbleCatalog {
        &self.catalog
    }

    /// Create and persist a consequence for a fumbled check.
    ///
    /// When no explicit `fumble_type` is given it is derived from the
    /// skill via the catalog. Returns `None` when the skill's fumble
    /// type is exempt from consequence creation.
    pub fn create_consequence(
        &self,
        store: &mut dyn ConsequenceStore,
        character_id: &str,
        skill_id: &str,
        fumble_type: Option<&str>,
        target_id: Option<&str>,
    ) -> Option<FumbleConsequence> {
        let spec = self.catalog.spec_for(skill_id);
        if spec.exempt {
            tracing::debug!(skill_id, "fumble type is exempt, no consequence created");
            return None;
        }
        let now = Utc::now();
        let consequence = FumbleConsequence {
            consequence_id: format!("cons-{}", Uuid::new_v4().simple()),
            character_id: character_id.to_string(),
            skill_id: Some(skill_id.to_string()),
            fumble_type: fumble_type.unwrap_or(&spec.fumble_type).to_string(),
            target_id: target_id.map(str::to_string),
            penalty: spec.penalty,
            is_active: true,
            created_at: now,
            expires_at: spec.lifetime.map(|d| now + d),
            recovery_conditions: spec.recovery_conditions.clone(),
        };
        tracing::info!(
            consequence_id = %consequence.consequence_id,
            character_id,
            skill_id,
            fumble_type = %consequence.fumble_type,
            "fumble consequence created"
        );
        store.insert(consequence.clone());
        Some(consequence)
    }

    /// All active consequences whose scope matches the given check.
    pub fn consequences_affecting_check(
        &self,
        store: &dyn ConsequenceStore,
        character_id: &str,
        skill_id: &str,
        target_id: Option<&str>,
    ) -> Vec<FumbleConsequence> {
        store.affecting(character_id, skill_id, target_id)
    }

    /// Attempt recovery: deactivates the consequence only if its
    /// configured conditions are a subset of `completed_conditions`.
    /// Returns whether the consequence was deactivated.
    pub fn try_recover(
        &self,
        store: &mut dyn ConsequenceStore,
        consequence_id: &str,
        completed_conditions: &[String],
    ) -> EngineResult<bool> {
        let consequence = store
            .get(consequence_id)
            .ok_or_else(|| EngineError::ConsequenceNotFound(consequence_id.to_string()))?;
        let satisfied = consequence
            .recovery_conditions
            .iter()
            .all(|c| completed_conditions.contains(c));
        if !satisfied {
            tracing::debug!(consequence_id, "recovery conditions not yet met");
            return Ok(false);
        }
        store.deactivate(consequence_id)?;
        tracing::info!(consequence_id, "consequence recovered");
        Ok(true)
    }

    /// Deactivate and return every time-bound consequence past its
    /// expiry. Intended to be driven once per game-time tick by an
    /// external scheduler.
    pub fn process_expirations(
        &self,
        store: &mut dyn ConsequenceStore,
        now: DateTime<Utc>,
    ) -> Vec<FumbleConsequence> {
        let mut expired = Vec::new();
        for consequence in store.active() {
            if let Some(expires_at) = consequence.expires_at {
                if expires_at <= now {
                    // Unknown ids cannot occur here; `active` just
                    // returned them.
                    let _ = store.deactivate(&consequence.consequence_id);
                    expired.push(consequence);
                }
            }
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "expired consequences deactivated");
        }
        expired
    }
}
