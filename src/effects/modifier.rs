//! Modifiers: single typed value changes aimed at a dotted target key
//!
//! A modifier never knows which record owns it. Records bundle modifiers,
//! the resolver folds them.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RulesError};

/// Well-known target keys consumed by the engine
pub mod keys {
    pub const EXERTION_MULTIPLIER: &str = "exertion.multiplier";
    pub const MOVEMENT_MULTIPLIER: &str = "exertion.movementMultiplier";
    pub const MOVEMENT_RESTRICTED: &str = "movement.restricted";
    pub const DIFFICULTY_MODIFIER: &str = "combat.difficultyModifier";
    pub const DICE_POOL: &str = "dice.pool";
    pub const INITIATIVE_BONUS: &str = "initiative.bonus";

    pub const TOTALS_PHYSICAL: &str = "totals.physical";
    pub const TOTALS_MENTAL: &str = "totals.mental";
    pub const TOTALS_SOCIAL: &str = "totals.social";
}

/// How a modifier combines with the running value.
///
/// `Custom` has no numeric meaning. It passes the value through untouched
/// and the resolver counts it so the skip is observable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    #[default]
    Add,
    Multiply,
    Override,
    /// Keep the larger of running value and modifier value
    Upgrade,
    /// Keep the smaller of running value and modifier value
    Downgrade,
    Custom,
}

impl ModifierMode {
    /// Map a host mode code onto a mode.
    ///
    /// Codes follow the host document store: 0 custom, 1 multiply, 2 add,
    /// 3 downgrade, 4 upgrade, 5 override.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(ModifierMode::Custom),
            1 => Ok(ModifierMode::Multiply),
            2 => Ok(ModifierMode::Add),
            3 => Ok(ModifierMode::Downgrade),
            4 => Ok(ModifierMode::Upgrade),
            5 => Ok(ModifierMode::Override),
            other => Err(RulesError::InvalidModifierMode(other)),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ModifierMode::Custom => 0,
            ModifierMode::Multiply => 1,
            ModifierMode::Add => 2,
            ModifierMode::Downgrade => 3,
            ModifierMode::Upgrade => 4,
            ModifierMode::Override => 5,
        }
    }
}

/// Rounding applied after a multiplication during a fold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounding {
    /// Integral targets: floor after every multiply
    Floor,
    /// Fractional targets such as multipliers
    Exact,
}

impl Rounding {
    pub fn for_key(key: &str) -> Self {
        match key {
            keys::EXERTION_MULTIPLIER | keys::MOVEMENT_MULTIPLIER => Rounding::Exact,
            _ => Rounding::Floor,
        }
    }
}

/// A single value change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub target_key: String,
    pub mode: ModifierMode,
    pub value: f64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Modifier {
    pub fn new(target_key: impl Into<String>, mode: ModifierMode, value: f64, priority: i32) -> Self {
        Self {
            target_key: target_key.into(),
            mode,
            value,
            priority,
            source_id: String::new(),
            disabled: false,
        }
    }

    pub fn add(target_key: impl Into<String>, value: f64, priority: i32) -> Self {
        Self::new(target_key, ModifierMode::Add, value, priority)
    }

    pub fn multiply(target_key: impl Into<String>, value: f64, priority: i32) -> Self {
        Self::new(target_key, ModifierMode::Multiply, value, priority)
    }

    pub fn set(target_key: impl Into<String>, value: f64, priority: i32) -> Self {
        Self::new(target_key, ModifierMode::Override, value, priority)
    }

    /// Build a modifier from raw host data.
    ///
    /// An unrecognized mode code is not fatal: the modifier becomes a
    /// `Custom` pass-through and a warning is logged.
    pub fn from_host(
        target_key: impl Into<String>,
        mode_code: i64,
        value: f64,
        priority: i32,
        source_id: impl Into<String>,
    ) -> Self {
        let target_key = target_key.into();
        let mode = ModifierMode::from_code(mode_code).unwrap_or_else(|err| {
            tracing::warn!(key = %target_key, "{}; treating as custom", err);
            ModifierMode::Custom
        });
        Self {
            target_key,
            mode,
            value,
            priority,
            source_id: source_id.into(),
            disabled: false,
        }
    }

    pub fn with_source(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn targets(&self, key: &str) -> bool {
        self.target_key == key
    }
}
