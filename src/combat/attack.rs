//! Weapons, shot types and attack reports
//!
//! The character sheet runs the attack; this module holds the weapon data
//! and the rules that do not need the character.

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::character::attributes::Attribute;
use crate::character::skills::CombatSkill;
use crate::combat::difficulty::DifficultyBreakdown;
use crate::dice::PoolRoll;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum ShotType {
    #[display(fmt = "Hip Shot")]
    HipShot,
    #[display(fmt = "Deliberate Fire")]
    DeliberateFire,
    #[display(fmt = "Short Burst")]
    ShortBurst,
    #[display(fmt = "Full Auto")]
    FullAuto,
    #[display(fmt = "Covering Fire")]
    CoveringFire,
    Overwatch,
}

impl ShotType {
    pub fn all() -> &'static [ShotType] {
        &[
            ShotType::HipShot,
            ShotType::DeliberateFire,
            ShotType::ShortBurst,
            ShotType::FullAuto,
            ShotType::CoveringFire,
            ShotType::Overwatch,
        ]
    }

    /// Exertion cost when a weapon does not say otherwise
    pub fn default_cost(&self) -> u32 {
        match self {
            ShotType::HipShot => 2,
            ShotType::DeliberateFire => 4,
            ShotType::ShortBurst => 5,
            ShotType::FullAuto => 8,
            ShotType::CoveringFire => 6,
            ShotType::Overwatch => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShotProfile {
    pub cost: u32,
    pub available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ammunition {
    pub current: u32,
    pub max: u32,
}

impl Ammunition {
    pub fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_empty(&self) -> bool {
        self.current == 0
    }

    pub fn consume(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn reload(&mut self) {
        self.current = self.max;
    }
}

/// Attribute added to the weapon skill for an attack pool
pub fn governing_attribute(proficiency: CombatSkill) -> Attribute {
    match proficiency {
        CombatSkill::HeavyWeapons | CombatSkill::ExplosiveOrdnance | CombatSkill::MachineGunner => {
            Attribute::Might
        }
        _ => Attribute::Coordination,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub proficiency: CombatSkill,
    /// Number of d6 rolled for damage
    pub damage_dice: u32,
    pub ammunition: Ammunition,
    pub shot_types: BTreeMap<ShotType, ShotProfile>,
}

impl Weapon {
    /// A weapon offering only the listed shot types, at default costs
    pub fn new(
        name: impl Into<String>,
        proficiency: CombatSkill,
        damage_dice: u32,
        magazine: u32,
        shots: &[ShotType],
    ) -> Self {
        let shot_types = ShotType::all()
            .iter()
            .map(|s| {
                (
                    *s,
                    ShotProfile {
                        cost: s.default_cost(),
                        available: shots.contains(s),
                    },
                )
            })
            .collect();
        Self {
            name: name.into(),
            proficiency,
            damage_dice,
            ammunition: Ammunition::full(magazine),
            shot_types,
        }
    }

    pub fn governing_attribute(&self) -> Attribute {
        governing_attribute(self.proficiency)
    }

    /// Profile of an available shot type
    pub fn shot(&self, shot: ShotType) -> Option<ShotProfile> {
        self.shot_types.get(&shot).copied().filter(|p| p.available)
    }

    pub fn with_cost(mut self, shot: ShotType, cost: u32) -> Self {
        if let Some(profile) = self.shot_types.get_mut(&shot) {
            profile.cost = cost;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackReport {
    pub weapon: String,
    pub shot: ShotType,
    pub pool: u32,
    pub difficulty: DifficultyBreakdown,
    pub roll: PoolRoll,
    /// Successes reached the difficulty
    pub hit: bool,
    pub exertion_spent: u32,
    pub exertion_remaining: u32,
    pub ammunition_remaining: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governing_attribute() {
        assert_eq!(governing_attribute(CombatSkill::Rifles), Attribute::Coordination);
        assert_eq!(governing_attribute(CombatSkill::Pistols), Attribute::Coordination);
        assert_eq!(governing_attribute(CombatSkill::SubmachineGuns), Attribute::Coordination);
        assert_eq!(governing_attribute(CombatSkill::HeavyWeapons), Attribute::Might);
        assert_eq!(governing_attribute(CombatSkill::ExplosiveOrdnance), Attribute::Might);
        assert_eq!(governing_attribute(CombatSkill::MachineGunner), Attribute::Might);
        assert_eq!(governing_attribute(CombatSkill::MeleeCombat), Attribute::Coordination);
    }

    #[test]
    fn test_unavailable_shot_has_no_profile() {
        let rifle = Weapon::new(
            "Lee-Enfield",
            CombatSkill::Rifles,
            3,
            10,
            &[ShotType::HipShot, ShotType::DeliberateFire],
        );
        assert!(rifle.shot(ShotType::DeliberateFire).is_some());
        assert!(rifle.shot(ShotType::FullAuto).is_none());
    }

    #[test]
    fn test_ammunition_never_negative() {
        let mut ammo = Ammunition::full(1);
        ammo.consume();
        ammo.consume();
        assert!(ammo.is_empty());
        ammo.reload();
        assert_eq!(ammo.current, 1);
    }

    #[test]
    fn test_custom_cost() {
        let smg = Weapon::new("Sten", CombatSkill::SubmachineGuns, 2, 32, &[ShotType::ShortBurst])
            .with_cost(ShotType::ShortBurst, 3);
        assert_eq!(smg.shot(ShotType::ShortBurst).map(|p| p.cost), Some(3));
    }
}
