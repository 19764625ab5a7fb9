pub mod attack;
pub mod constants;
pub mod difficulty;
pub mod initiative;
pub mod stance;

pub use attack::{governing_attribute, Ammunition, AttackReport, ShotProfile, ShotType, Weapon};
pub use difficulty::{
    total_difficulty, CoverBand, DifficultyBreakdown, DifficultyContext, RangeBand,
};
pub use initiative::{roll_initiative, InitiativeBreakdown};
pub use stance::Stance;
