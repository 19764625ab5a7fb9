//! Difficulty of a ranged attack
//!
//! total = base + range + stance + cover. The stance term is the first
//! `combat.difficultyModifier` on the target, never a sum.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::combat::constants::BASE_DIFFICULTY;
use crate::combat::stance::Stance;
use crate::effects::modifier::keys;
use crate::effects::{find_first, EffectSet, Modifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display)]
pub enum RangeBand {
    #[display(fmt = "Hip Fire")]
    HipFire,
    #[default]
    Short,
    Medium,
    Long,
}

impl RangeBand {
    pub fn contribution(&self) -> i32 {
        match self {
            RangeBand::HipFire => 0,
            RangeBand::Short => 0,
            RangeBand::Medium => 1,
            RangeBand::Long => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, Display)]
pub enum CoverBand {
    #[default]
    None,
    Light,
    Hard,
}

impl CoverBand {
    pub fn contribution(&self) -> i32 {
        match self {
            CoverBand::None => 0,
            CoverBand::Light => 1,
            CoverBand::Hard => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DifficultyContext {
    pub range: RangeBand,
    pub cover: CoverBand,
}

impl DifficultyContext {
    pub fn new(range: RangeBand, cover: CoverBand) -> Self {
        Self { range, cover }
    }
}

/// Stance term: first matching modifier, truncated, or 0
pub fn stance_contribution<'a>(stance_modifiers: impl IntoIterator<Item = &'a Modifier>) -> i32 {
    find_first(stance_modifiers, keys::DIFFICULTY_MODIFIER)
        .map(|v| v as i32)
        .unwrap_or(0)
}

pub fn total_difficulty<'a>(
    range: RangeBand,
    stance_modifiers: impl IntoIterator<Item = &'a Modifier>,
    cover: CoverBand,
) -> i32 {
    BASE_DIFFICULTY + range.contribution() + stance_contribution(stance_modifiers) + cover.contribution()
}

/// Every term of a difficulty, for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub base: i32,
    pub range: i32,
    pub stance: i32,
    pub cover: i32,
    pub total: i32,
    /// Target stance when it is not Standing. Informational only.
    pub stance_label: Option<String>,
}

impl DifficultyBreakdown {
    pub fn for_target(ctx: DifficultyContext, target_effects: &EffectSet) -> Self {
        let stance = stance_contribution(target_effects.modifiers());
        let range = ctx.range.contribution();
        let cover = ctx.cover.contribution();
        let stance_label = match Stance::of(target_effects) {
            Stance::Standing => None,
            other => Some(other.to_string()),
        };
        let breakdown = Self {
            base: BASE_DIFFICULTY,
            range,
            stance,
            cover,
            total: BASE_DIFFICULTY + range + stance + cover,
            stance_label,
        };
        tracing::debug!(
            range = %ctx.range,
            cover = %ctx.cover,
            stance,
            total = breakdown.total,
            "difficulty"
        );
        breakdown
    }

    /// Total as a dice target; a negative total means no target
    pub fn target(&self) -> u32 {
        self.total.max(0) as u32
    }
}
