//! Modifier value objects: named effects on a skill check.
//!
//! Every modifier contributes a dice delta (pool dice added or
//! removed) and a DC delta (successes required). The four variants
//! differ only in provenance and the extra fields that provenance
//! needs, so they form a closed enum rather than a trait hierarchy.

use serde::{Deserialize, Serialize};

/// How long a situational or environment modifier stays in context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    /// Applies to this check only.
    #[default]
    Instant,
    /// Dropped after the next check resolves.
    UntilNextCheck,
    /// Lasts for the current scene.
    Scene,
    /// Lasts for the current combat encounter.
    Combat,
}

/// Broad category of a piece of equipment contributing to a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    /// A tool (lockpicks, climbing kit, medical supplies).
    #[default]
    Tool,
    /// A weapon used as part of the attempt.
    Weapon,
    /// Anything else (clothing, trinkets, consumables).
    Other,
}

/// Ambient exposure level that feeds a standard environment modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionTier {
    /// No measurable corruption.
    Clear,
    /// Trace exposure; checks are lightly taxed.
    Tainted,
    /// Heavy exposure; checks are noticeably taxed.
    Blighted,
    /// Saturated ground; checks are severely taxed.
    Consumed,
}

/// A bonus or penalty granted by a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentModifier {
    /// Stable identifier (e.g. `"masterwork-lockpicks"`).
    pub id: String,
    /// Display name for audit output.
    pub name: String,
    /// Dice added to (or removed from) the pool.
    pub dice_delta: i32,
    /// Successes added to (or removed from) the DC.
    pub dc_delta: i32,
    /// Where the modifier came from, if known.
    pub source: Option<String>,
    /// Whether the attempt requires this item at all.
    pub required: bool,
    /// Whether the actor actually holds the item. A required item
    /// that is not present blocks the attempt outright instead of
    /// contributing to the pool.
    pub present: bool,
    /// What kind of equipment this is.
    pub category: EquipmentCategory,
}

/// A bonus or penalty arising from the immediate situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalModifier {
    /// Stable identifier (e.g. `"rushed"`).
    pub id: String,
    /// Display name for audit output.
    pub name: String,
    /// Dice added to (or removed from) the pool.
    pub dice_delta: i32,
    /// Successes added to (or removed from) the DC.
    pub dc_delta: i32,
    /// Where the modifier came from, if known.
    pub source: Option<String>,
    /// When the modifier is dropped from context.
    pub duration: DurationKind,
}

impl SituationalModifier {
    /// Bonus dice granted by helpers in an assisted cooperative check.
    pub fn assisted(bonus_dice: u32, source: impl Into<String>) -> Self {
        Self {
            id: "assisted".to_string(),
            name: "Assisted".to_string(),
            dice_delta: bonus_dice as i32,
            dc_delta: 0,
            source: Some(source.into()),
            duration: DurationKind::Instant,
        }
    }
}

/// A modifier derived from ambient state (lighting, surface,
/// corruption) rather than authored per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentModifier {
    /// Stable identifier (e.g. `"dim-light"`).
    pub id: String,
    /// Display name for audit output.
    pub name: String,
    /// Dice added to (or removed from) the pool.
    pub dice_delta: i32,
    /// Successes added to (or removed from) the DC.
    pub dc_delta: i32,
    /// Where the modifier came from, if known.
    pub source: Option<String>,
    /// When the modifier is dropped from context.
    pub duration: DurationKind,
}

/// Opposed-roll context keyed by the target of the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetModifier {
    /// Stable identifier (e.g. `"hostile-guard"`).
    pub id: String,
    /// Display name for audit output.
    pub name: String,
    /// Dice added to (or removed from) the pool.
    pub dice_delta: i32,
    /// Successes added to (or removed from) the DC.
    pub dc_delta: i32,
    /// Where the modifier came from, if known.
    pub source: Option<String>,
    /// The entity this modifier is keyed to, if any.
    pub target_id: Option<String>,
    /// Target disposition toward the actor (negative is hostile).
    pub disposition: i32,
    /// How suspicious the target currently is (0 = unaware).
    pub suspicion: u32,
}

/// A single named effect on a check, in one of four variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    /// Granted (or demanded) by equipment.
    Equipment(EquipmentModifier),
    /// Authored per call from the immediate situation.
    Situational(SituationalModifier),
    /// Derived automatically from ambient state.
    Environment(EnvironmentModifier),
    /// Keyed to the target of an opposed check.
    Target(TargetModifier),
}

impl Modifier {
    /// Stable identifier of the underlying modifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Equipment(m) => &m.id,
            Self::Situational(m) => &m.id,
            Self::Environment(m) => &m.id,
            Self::Target(m) => &m.id,
        }
    }

    /// Display name of the underlying modifier.
    pub fn name(&self) -> &str {
        match self {
            Self::Equipment(m) => &m.name,
            Self::Situational(m) => &m.name,
            Self::Environment(m) => &m.name,
            Self::Target(m) => &m.name,
        }
    }

    /// Dice contributed to the pool. A required-but-missing piece of
    /// equipment contributes nothing; it blocks at the service layer.
    pub fn dice_delta(&self) -> i32 {
        match self {
            Self::Equipment(m) => {
                if m.required && !m.present {
                    0
                } else {
                    m.dice_delta
                }
            }
            Self::Situational(m) => m.dice_delta,
            Self::Environment(m) => m.dice_delta,
            Self::Target(m) => m.dice_delta,
        }
    }

    /// Successes contributed to the DC.
    pub fn dc_delta(&self) -> i32 {
        match self {
            Self::Equipment(m) => {
                if m.required && !m.present {
                    0
                } else {
                    m.dc_delta
                }
            }
            Self::Situational(m) => m.dc_delta,
            Self::Environment(m) => m.dc_delta,
            Self::Target(m) => m.dc_delta,
        }
    }

    /// Where the modifier came from, if known.
    pub fn source(&self) -> Option<&str> {
        match self {
            Self::Equipment(m) => m.source.as_deref(),
            Self::Situational(m) => m.source.as_deref(),
            Self::Environment(m) => m.source.as_deref(),
            Self::Target(m) => m.source.as_deref(),
        }
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            Self::Equipment(_) => "equipment",
            Self::Situational(_) => "situational",
            Self::Environment(_) => "environment",
            Self::Target(_) => "target",
        };
        write!(
            f,
            "{} [{kind}] {:+}d / {:+} DC",
            self.name(),
            self.dice_delta(),
            self.dc_delta()
        )
    }
}
