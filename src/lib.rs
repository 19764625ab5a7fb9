//! Fireteam - Squad Combat Rules Engine
//!
//! Modifier resolution, dice pools, difficulty, exertion, wounds and morale
//! for a tabletop commando game. The host application owns persistence and
//! presentation; this crate owns the rules.

pub mod character;
pub mod combat;
pub mod core;
pub mod dice;
pub mod effects;
pub mod roster;

pub use crate::character::Character;
pub use crate::core::config::RulesConfig;
pub use crate::core::error::{Result, RulesError};
