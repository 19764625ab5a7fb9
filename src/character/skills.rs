//! Skill ranks from their six sources

use std::collections::BTreeMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum CombatSkill {
    HeavyWeapons,
    ExplosiveOrdnance,
    GrenadeThrowing,
    MachineGunner,
    MeleeCombat,
    Pistols,
    Rifles,
    SubmachineGuns,
    UnarmedCombat,
}

impl CombatSkill {
    pub fn all() -> &'static [CombatSkill] {
        &[
            CombatSkill::HeavyWeapons,
            CombatSkill::ExplosiveOrdnance,
            CombatSkill::GrenadeThrowing,
            CombatSkill::MachineGunner,
            CombatSkill::MeleeCombat,
            CombatSkill::Pistols,
            CombatSkill::Rifles,
            CombatSkill::SubmachineGuns,
            CombatSkill::UnarmedCombat,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum GeneralSkill {
    Athletics,
    Climb,
    ConcealmentCamouflage,
    Cryptography,
    Endurance,
    FirstAid,
    Linguistics,
    Navigation,
    Parachuting,
    RadioOperations,
    Stalking,
    Survival,
    Swimming,
}

/// Any skill a character can roll
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Combat(CombatSkill),
    General(GeneralSkill),
    Custom(String),
}

impl From<CombatSkill> for Skill {
    fn from(skill: CombatSkill) -> Self {
        Skill::Combat(skill)
    }
}

impl From<GeneralSkill> for Skill {
    fn from(skill: GeneralSkill) -> Self {
        Skill::General(skill)
    }
}

impl std::fmt::Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Skill::Combat(s) => write!(f, "{}", s),
            Skill::General(s) => write!(f, "{}", s),
            Skill::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Points per source. The total is their plain sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SkillRanks {
    pub breeding: i32,
    pub commando: i32,
    pub primary: i32,
    pub secondary: i32,
    pub tertiary: i32,
    pub modifier: i32,
}

impl SkillRanks {
    pub fn primary(points: i32) -> Self {
        Self {
            primary: points,
            ..Self::default()
        }
    }

    pub fn total(&self) -> i32 {
        self.breeding + self.commando + self.primary + self.secondary + self.tertiary + self.modifier
    }
}

/// Ranks for every skill the character has points in.
///
/// Kept as three maps so the host document shape (plain string keys) round
/// trips through serde.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Skills {
    pub combat: BTreeMap<CombatSkill, SkillRanks>,
    pub general: BTreeMap<GeneralSkill, SkillRanks>,
    pub custom: BTreeMap<String, SkillRanks>,
}

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, skill: impl Into<Skill>, ranks: SkillRanks) -> Self {
        self.set(skill, ranks);
        self
    }

    pub fn set(&mut self, skill: impl Into<Skill>, ranks: SkillRanks) {
        match skill.into() {
            Skill::Combat(s) => {
                self.combat.insert(s, ranks);
            }
            Skill::General(s) => {
                self.general.insert(s, ranks);
            }
            Skill::Custom(name) => {
                self.custom.insert(name, ranks);
            }
        }
    }

    pub fn ranks(&self, skill: &Skill) -> SkillRanks {
        let found = match skill {
            Skill::Combat(s) => self.combat.get(s),
            Skill::General(s) => self.general.get(s),
            Skill::Custom(name) => self.custom.get(name),
        };
        found.copied().unwrap_or_default()
    }

    /// Zero for skills the character has no points in
    pub fn total(&self, skill: &Skill) -> i32 {
        self.ranks(skill).total()
    }
}
