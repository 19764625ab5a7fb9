//! Dice pools of d6

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dice::outcome::RollOutcome;

/// Face a skilled die must reach to count as a success
pub const SKILLED_SUCCESS_FACE: u8 = 5;
/// Face an unskilled die must show
pub const UNSKILLED_SUCCESS_FACE: u8 = 6;

/// A pool constructed for one roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePool {
    pub size: u32,
    pub skilled: bool,
}

impl DicePool {
    pub fn new(size: u32, skilled: bool) -> Self {
        Self { size, skilled }
    }

    pub fn skilled(size: u32) -> Self {
        Self::new(size, true)
    }

    pub fn unskilled(size: u32) -> Self {
        Self::new(size, false)
    }

    pub fn is_success(&self, face: u8) -> bool {
        if self.skilled {
            face >= SKILLED_SUCCESS_FACE
        } else {
            face == UNSKILLED_SUCCESS_FACE
        }
    }

    /// Classify a set of faces that were rolled elsewhere.
    ///
    /// Only the first `size` faces are counted.
    pub fn tally(&self, faces: &[u8], difficulty: Option<u32>) -> RollOutcome {
        let counted = &faces[..faces.len().min(self.size as usize)];
        let successes = counted.iter().filter(|f| self.is_success(**f)).count() as u32;
        RollOutcome::from_tally(successes, counted.len() as u32, difficulty)
    }

    /// Roll every die once. No rerolls.
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R, difficulty: Option<u32>) -> PoolRoll {
        let faces: Vec<u8> = (0..self.size).map(|_| rng.gen_range(1..=6u8)).collect();
        let outcome = self.tally(&faces, difficulty);
        tracing::debug!(
            size = self.size,
            skilled = self.skilled,
            successes = outcome.successes,
            tier = %outcome.classification,
            "pool rolled"
        );
        PoolRoll { faces, outcome }
    }

    /// Build a roll from known faces (host-supplied or scripted)
    pub fn with_faces(&self, faces: Vec<u8>, difficulty: Option<u32>) -> PoolRoll {
        let outcome = self.tally(&faces, difficulty);
        PoolRoll { faces, outcome }
    }
}

/// Faces plus their classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRoll {
    pub faces: Vec<u8>,
    pub outcome: RollOutcome,
}

impl PoolRoll {
    /// The roll of a pool with no dice
    pub fn empty(difficulty: Option<u32>) -> Self {
        Self {
            faces: Vec::new(),
            outcome: RollOutcome::from_tally(0, 0, difficulty),
        }
    }
}

/// Sum of `count` d6, used for damage
pub fn roll_sum<R: Rng + ?Sized>(rng: &mut R, count: u32) -> u32 {
    (0..count).map(|_| rng.gen_range(1..=6u32)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::outcome::Tier;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_success_predicates() {
        let skilled = DicePool::skilled(1);
        assert!(skilled.is_success(5));
        assert!(skilled.is_success(6));
        assert!(!skilled.is_success(4));

        let unskilled = DicePool::unskilled(1);
        assert!(unskilled.is_success(6));
        assert!(!unskilled.is_success(5));
    }

    #[test]
    fn test_all_sixes_is_critical_success() {
        let roll = DicePool::skilled(3).with_faces(vec![6, 6, 6], None);
        assert_eq!(roll.outcome.classification, Tier::CriticalSuccess);
    }

    #[test]
    fn test_low_faces_is_critical_failure() {
        let roll = DicePool::skilled(3).with_faces(vec![1, 2, 3], None);
        assert_eq!(roll.outcome.classification, Tier::CriticalFailure);
        assert_eq!(roll.outcome.failures, 3);
    }

    #[test]
    fn test_unskilled_fives_fail() {
        let roll = DicePool::unskilled(3).with_faces(vec![5, 5, 6], None);
        assert_eq!(roll.outcome.successes, 1);
        assert_eq!(roll.outcome.classification, Tier::Failure);
    }

    #[test]
    fn test_empty_pool_rolls_nothing() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let roll = DicePool::skilled(0).roll(&mut rng, None);
        assert!(roll.faces.is_empty());
        assert_eq!(roll.outcome.successes, 0);
        assert_eq!(roll.outcome.failures, 0);
        assert_eq!(roll.outcome.classification, Tier::CriticalFailure);
    }

    #[test]
    fn test_seeded_rolls_repeat() {
        let pool = DicePool::skilled(8);
        let a = pool.roll(&mut ChaCha8Rng::seed_from_u64(42), Some(2));
        let b = pool.roll(&mut ChaCha8Rng::seed_from_u64(42), Some(2));
        assert_eq!(a, b);
    }

    #[test]
    fn test_roll_sum_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let total = roll_sum(&mut rng, 3);
            assert!((3..=18).contains(&total));
        }
        assert_eq!(roll_sum(&mut rng, 0), 0);
    }

    proptest! {
        #[test]
        fn prop_successes_bounded_by_size(size in 0u32..40, skilled: bool, seed: u64) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let roll = DicePool::new(size, skilled).roll(&mut rng, None);
            prop_assert_eq!(roll.faces.len() as u32, size);
            prop_assert!(roll.outcome.successes <= size);
            prop_assert_eq!(roll.outcome.failures, size - roll.outcome.successes);
            prop_assert!(roll.faces.iter().all(|f| (1..=6).contains(f)));
        }
    }
}
