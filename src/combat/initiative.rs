//! Initiative: coordination + guile + bonuses + 1d10

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::constants::INITIATIVE_DIE_SIDES;
use crate::effects::modifier::keys;
use crate::effects::{resolve_key, Modifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeBreakdown {
    /// Coordination + guile totals
    pub base: i32,
    /// `initiative.bonus` effects folded from 0
    pub effects_bonus: i32,
    /// Flat bonus stored on the character
    pub system_bonus: i32,
    pub die: u32,
    pub total: i32,
}

impl InitiativeBreakdown {
    pub fn modifier(&self) -> i32 {
        self.effects_bonus + self.system_bonus
    }
}

/// Effect contribution to initiative
pub fn effects_bonus<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>) -> i32 {
    resolve_key(0.0, modifiers, keys::INITIATIVE_BONUS).as_i32()
}

pub fn roll_initiative<R: Rng + ?Sized>(
    rng: &mut R,
    coordination: i32,
    guile: i32,
    effects_bonus: i32,
    system_bonus: i32,
) -> InitiativeBreakdown {
    let die = rng.gen_range(1..=INITIATIVE_DIE_SIDES);
    let base = coordination + guile;
    let total = base + effects_bonus + system_bonus + die as i32;
    tracing::debug!(base, effects_bonus, system_bonus, die, total, "initiative rolled");
    InitiativeBreakdown {
        base,
        effects_bonus,
        system_bonus,
        die,
        total,
    }
}
