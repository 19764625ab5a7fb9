//! Exertion: the per-turn resource that pays for costly actions
//!
//! Invariant: `0 <= value <= max`. Recomputing `max` clamps `value` down
//! but never raises it.

use serde::{Deserialize, Serialize};

/// Inputs to the capacity formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExertionBasis {
    pub base: i32,
    pub guile: i32,
    pub coordination: i32,
    /// Resolved `exertion.multiplier`
    pub multiplier: f64,
}

impl ExertionBasis {
    /// floor((base + guile + coordination) * multiplier), never negative
    pub fn capacity(&self) -> u32 {
        let raw = ((self.base + self.guile + self.coordination) as f64 * self.multiplier).floor();
        raw.max(0.0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Restore {
    Amount(u32),
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "ExertionParts")]
pub struct ExertionPool {
    value: u32,
    max: u32,
}

/// Stored form; loading clamps through `from_parts`
#[derive(Deserialize)]
struct ExertionParts {
    value: u32,
    max: u32,
}

impl From<ExertionParts> for ExertionPool {
    fn from(parts: ExertionParts) -> Self {
        Self::from_parts(parts.value, parts.max)
    }
}

impl ExertionPool {
    /// A full pool
    pub fn full(max: u32) -> Self {
        Self { value: max, max }
    }

    /// Host-supplied values. `value` is clamped into range.
    pub fn from_parts(value: u32, max: u32) -> Self {
        Self {
            value: value.min(max),
            max,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Apply a new capacity. Returns the new max.
    pub fn recompute(&mut self, basis: &ExertionBasis) -> u32 {
        let max = basis.capacity();
        if max != self.max {
            tracing::debug!(old = self.max, new = max, "exertion capacity changed");
        }
        self.max = max;
        self.value = self.value.min(max);
        max
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.value >= cost
    }

    /// Spend, flooring at zero. Overspending is not an error.
    pub fn spend(&mut self, amount: u32) -> u32 {
        self.value = self.value.saturating_sub(amount);
        self.value
    }

    pub fn restore(&mut self, amount: Restore) -> u32 {
        self.value = match amount {
            Restore::Amount(n) => self.value.saturating_add(n).min(self.max),
            Restore::Full => self.max,
        };
        self.value
    }
}
