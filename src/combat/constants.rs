//! Combat constants that are part of the rules, not tuning
//!
//! Tunable costs and priorities live in `RulesConfig`.

// Difficulty
pub const BASE_DIFFICULTY: i32 = 1;

// Dice
/// Smallest pool an attribute or skill roll may use
pub const MIN_ROLL_POOL: i32 = 1;
pub const INITIATIVE_DIE_SIDES: u32 = 10;

// Multipliers resolve from these bases
pub const BASE_EXERTION_MULTIPLIER: f64 = 1.0;
pub const BASE_MOVEMENT_MULTIPLIER: f64 = 1.0;

// Stance records resolve before wounds and morale
pub const STANCE_PRIORITY: i32 = 10;
