pub mod attributes;
pub mod exertion;
pub mod morale;
pub mod sheet;
pub mod skills;
pub mod wounds;

pub use attributes::{Attribute, AttributeScore, Attributes, Category};
pub use exertion::{ExertionBasis, ExertionPool, Restore};
pub use morale::{ActionKind, MoraleRefusal, MoraleState, MoraleTrack};
pub use sheet::{ActionRefusal, Character, MoveReport};
pub use skills::{CombatSkill, GeneralSkill, Skill, SkillRanks, Skills};
pub use wounds::{HealTarget, WoundBox, WoundLadder, WoundRefusal, WoundTarget, WoundTier};
