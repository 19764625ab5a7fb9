//! Body stance of a combatant
//!
//! A stance is an effect record like any other. Its difficulty contribution
//! reaches attackers through `combat.difficultyModifier`.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::character::attributes::Attribute;
use crate::combat::constants::STANCE_PRIORITY;
use crate::effects::modifier::keys;
use crate::effects::{EffectOrigin, EffectSet, EffectTemplate, Modifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default, Display)]
pub enum Stance {
    #[default]
    Standing,
    Crouched,
    Prone,
}

impl Stance {
    /// Stance recorded on a character. Standing if no stance record exists.
    pub fn of(effects: &EffectSet) -> Stance {
        effects
            .iter()
            .find_map(|r| match r.origin {
                EffectOrigin::Stance(stance) if !r.disabled => Some(stance),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Built-in template. Standing carries no record.
    pub fn default_template(&self) -> Option<EffectTemplate> {
        match self {
            Stance::Standing => None,
            Stance::Crouched => Some(EffectTemplate::new(
                "Crouched",
                vec![
                    Modifier::add(keys::DIFFICULTY_MODIFIER, 1.0, STANCE_PRIORITY),
                    Modifier::set(keys::MOVEMENT_MULTIPLIER, 2.0, STANCE_PRIORITY),
                ],
            )),
            Stance::Prone => Some(EffectTemplate::new(
                "Prone",
                vec![
                    Modifier::add(Attribute::Coordination.key(), -1.0, STANCE_PRIORITY),
                    Modifier::add(keys::DIFFICULTY_MODIFIER, 2.0, STANCE_PRIORITY),
                    Modifier::set(keys::MOVEMENT_MULTIPLIER, 2.0, STANCE_PRIORITY),
                ],
            )),
        }
    }
}
