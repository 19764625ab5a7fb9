//! Dice pool resolution
//!
//! Pools of d6. A skilled die succeeds on 5 or 6, an unskilled die only
//! on 6. Outcomes are classified either openly or against a difficulty.

pub mod outcome;
pub mod pool;

pub use outcome::{classify, classify_vs, RollOutcome, Tier};
pub use pool::{roll_sum, DicePool, PoolRoll};
