//! Outcome tiers for dice pools
//!
//! Two classifiers exist and they are not refinements of each other:
//! an open roll compares successes to failures, a roll against a
//! difficulty compares successes to the target.

use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum Tier {
    #[display(fmt = "Critical Failure")]
    CriticalFailure,
    Failure,
    Success,
    #[display(fmt = "Critical Success")]
    CriticalSuccess,
    /// Exactly met the difficulty. Only reachable against a difficulty.
    #[display(fmt = "Barely Success")]
    BarelySuccess,
}

impl Tier {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Tier::Success | Tier::CriticalSuccess | Tier::BarelySuccess
        )
    }
}

/// Classify an open roll (no difficulty)
pub fn classify(successes: u32, size: u32) -> Tier {
    let failures = size.saturating_sub(successes);
    if successes == 0 {
        Tier::CriticalFailure
    } else if successes == size {
        Tier::CriticalSuccess
    } else if successes > failures {
        Tier::Success
    } else {
        Tier::Failure
    }
}

/// Classify against a difficulty target
pub fn classify_vs(successes: u32, difficulty: u32) -> Tier {
    let margin = successes as i64 - difficulty as i64;
    if successes == 0 {
        Tier::CriticalFailure
    } else if margin >= difficulty as i64 && difficulty > 0 {
        Tier::CriticalSuccess
    } else if margin > 0 {
        Tier::Success
    } else if margin == 0 {
        Tier::BarelySuccess
    } else {
        Tier::Failure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub successes: u32,
    pub failures: u32,
    pub classification: Tier,
    /// Target the roll was classified against, if any
    pub difficulty: Option<u32>,
}

impl RollOutcome {
    /// Build an outcome from a tally.
    ///
    /// A difficulty of zero is treated as no difficulty.
    pub fn from_tally(successes: u32, size: u32, difficulty: Option<u32>) -> Self {
        let difficulty = difficulty.filter(|d| *d > 0);
        let classification = match difficulty {
            Some(d) => classify_vs(successes, d),
            None => classify(successes, size),
        };
        Self {
            successes,
            failures: size.saturating_sub(successes),
            classification,
            difficulty,
        }
    }

    pub fn margin(&self) -> Option<i64> {
        self.difficulty
            .map(|d| self.successes as i64 - d as i64)
    }

    /// At least `threshold` successes, regardless of tier
    pub fn meets(&self, threshold: u32) -> bool {
        self.successes >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_classification() {
        assert_eq!(classify(0, 3), Tier::CriticalFailure);
        assert_eq!(classify(3, 3), Tier::CriticalSuccess);
        assert_eq!(classify(2, 3), Tier::Success);
        assert_eq!(classify(1, 3), Tier::Failure);
        // Even split is a failure
        assert_eq!(classify(2, 4), Tier::Failure);
    }

    #[test]
    fn test_empty_pool_is_critical_failure() {
        assert_eq!(classify(0, 0), Tier::CriticalFailure);
        let outcome = RollOutcome::from_tally(0, 0, None);
        assert_eq!(outcome.failures, 0);
    }

    #[test]
    fn test_classification_against_difficulty() {
        assert_eq!(classify_vs(3, 3), Tier::BarelySuccess);
        assert_eq!(classify_vs(6, 3), Tier::CriticalSuccess);
        assert_eq!(classify_vs(4, 3), Tier::Success);
        assert_eq!(classify_vs(2, 3), Tier::Failure);
        assert_eq!(classify_vs(0, 3), Tier::CriticalFailure);
    }

    #[test]
    fn test_zero_difficulty_uses_open_classifier() {
        let outcome = RollOutcome::from_tally(1, 4, Some(0));
        assert_eq!(outcome.difficulty, None);
        assert_eq!(outcome.classification, Tier::Failure);
    }

    #[test]
    fn test_margin() {
        let outcome = RollOutcome::from_tally(2, 5, Some(3));
        assert_eq!(outcome.margin(), Some(-1));
        assert_eq!(outcome.classification, Tier::Failure);
        assert!(!outcome.classification.is_success());
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::CriticalSuccess.to_string(), "Critical Success");
        assert_eq!(Tier::Failure.to_string(), "Failure");
    }

    #[test]
    fn test_tally_above_size_has_no_failures() {
        let outcome = RollOutcome::from_tally(5, 3, None);
        assert_eq!(outcome.successes, 5);
        assert_eq!(outcome.failures, 0);
    }
}
