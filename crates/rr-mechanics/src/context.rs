//! Skill context: the composed set of modifiers for one check.
//!
//! A [`SkillContextBuilder`] accumulates modifiers from equipment,
//! situation, environment, target, and corruption sources, then
//! snapshots them into an immutable [`SkillContext`]. The engine
//! never retains a context beyond a single check invocation.

use serde::{Deserialize, Serialize};

use crate::modifier::{
    CorruptionTier, EnvironmentModifier, EquipmentModifier, Modifier, SituationalModifier,
    TargetModifier,
};
use crate::providers::CorruptionModifierProvider;

/// Immutable aggregate of every modifier affecting one check.
///
/// Insertion order within each kind is preserved for audit output;
/// it has no effect on the summed deltas.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillContext {
    equipment: Vec<EquipmentModifier>,
    situational: Vec<SituationalModifier>,
    environment: Vec<EnvironmentModifier>,
    target: Vec<TargetModifier>,
    applied_statuses: Vec<String>,
}

impl SkillContext {
    /// A context with no modifiers at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Equipment modifiers in insertion order.
    pub fn equipment(&self) -> &[EquipmentModifier] {
        &self.equipment
    }

    /// Situational modifiers in insertion order.
    pub fn situational(&self) -> &[SituationalModifier] {
        &self.situational
    }

    /// Environment modifiers in insertion order.
    pub fn environment(&self) -> &[EnvironmentModifier] {
        &self.environment
    }

    /// Target modifiers in insertion order.
    pub fn target(&self) -> &[TargetModifier] {
        &self.target
    }

    /// Status identifiers to apply conditionally after the outcome.
    pub fn applied_statuses(&self) -> &[String] {
        &self.applied_statuses
    }

    /// All modifiers across every kind, in kind-then-insertion order.
    pub fn modifiers(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.equipment
            .iter()
            .cloned()
            .map(Modifier::Equipment)
            .chain(self.situational.iter().cloned().map(Modifier::Situational))
            .chain(self.environment.iter().cloned().map(Modifier::Environment))
            .chain(self.target.iter().cloned().map(Modifier::Target))
    }

    /// Algebraic sum of all dice deltas.
    pub fn total_dice_delta(&self) -> i32 {
        self.modifiers().map(|m| m.dice_delta()).sum()
    }

    /// Algebraic sum of all DC deltas.
    pub fn total_dc_delta(&self) -> i32 {
        self.modifiers().map(|m| m.dc_delta()).sum()
    }

    /// True if any modifier of any kind is present.
    pub fn has_modifiers(&self) -> bool {
        !(self.equipment.is_empty()
            && self.situational.is_empty()
            && self.environment.is_empty()
            && self.target.is_empty())
    }

    /// The first required piece of equipment the actor does not hold,
    /// if any. The check service blocks the attempt on it.
    pub fn missing_required_equipment(&self) -> Option<&EquipmentModifier> {
        self.equipment.iter().find(|m| m.required && !m.present)
    }
}

/// Mutable accumulator that snapshots into a [`SkillContext`].
///
/// Adding a modifier never fails; inputs are pre-validated by the
/// caller. The builder performs no dice math, it only stores.
#[derive(Debug, Clone, Default)]
pub struct SkillContextBuilder {
    inner: SkillContext,
}

impl SkillContextBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equipment modifier.
    pub fn with_equipment(mut self, modifier: EquipmentModifier) -> Self {
        self.inner.equipment.push(modifier);
        self
    }

    /// Add a situational modifier.
    pub fn with_situation(mut self, modifier: SituationalModifier) -> Self {
        self.inner.situational.push(modifier);
        self
    }

    /// Add an environment modifier.
    pub fn with_environment(mut self, modifier: EnvironmentModifier) -> Self {
        self.inner.environment.push(modifier);
        self
    }

    /// Add a target modifier.
    pub fn with_target(mut self, modifier: TargetModifier) -> Self {
        self.inner.target.push(modifier);
        self
    }

    /// Resolve a corruption tier to its standard environment modifier
    /// and add it. Resolution happens now, at call time, not at
    /// `build`.
    pub fn with_corruption(
        self,
        tier: CorruptionTier,
        provider: &dyn CorruptionModifierProvider,
    ) -> Self {
        self.with_environment(provider.modifier_for(tier))
    }

    /// Record a status identifier to apply conditionally post-outcome.
    pub fn with_applied_status(mut self, status_id: impl Into<String>) -> Self {
        self.inner.applied_statuses.push(status_id.into());
        self
    }

    /// Snapshot the accumulated state into an immutable context.
    /// The builder keeps its contents and can build again.
    pub fn build(&self) -> SkillContext {
        self.inner.clone()
    }

    /// Clear all accumulated state for reuse.
    pub fn reset(&mut self) {
        self.inner = SkillContext::default();
    }
}
