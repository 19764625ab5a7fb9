//! Modifier resolution
//!
//! Disabled modifiers are dropped, the rest are ordered by priority
//! (stable, so equal priorities keep insertion order) and folded left from
//! the base value. Override does not end the fold.

use crate::effects::modifier::{Modifier, ModifierMode, Rounding};

/// Result of a fold, with counters for the diagnostics callers care about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveReport {
    pub value: f64,
    /// Modifiers that changed (or could have changed) the running value
    pub applied: usize,
    /// `Custom` modifiers passed through without effect
    pub skipped_custom: usize,
}

impl ResolveReport {
    /// Resolved value as an integer, truncated toward zero
    pub fn as_i32(&self) -> i32 {
        self.value as i32
    }
}

/// Enabled modifiers in application order
fn ordered<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>) -> Vec<&'a Modifier> {
    let mut active: Vec<&Modifier> = modifiers.into_iter().filter(|m| !m.disabled).collect();
    // sort_by_key is stable
    active.sort_by_key(|m| m.priority);
    active
}

/// Fold `modifiers` onto `base`, flooring after multiplication.
///
/// The caller passes the modifiers for a single target; `target_key` is not
/// consulted here.
pub fn resolve(base: f64, modifiers: &[Modifier]) -> f64 {
    resolve_with(base, modifiers, Rounding::Floor).value
}

/// Fold with an explicit rounding policy
pub fn resolve_with<'a>(
    base: f64,
    modifiers: impl IntoIterator<Item = &'a Modifier>,
    rounding: Rounding,
) -> ResolveReport {
    let mut report = ResolveReport {
        value: base,
        applied: 0,
        skipped_custom: 0,
    };

    for m in ordered(modifiers) {
        let acc = report.value;
        report.value = match m.mode {
            ModifierMode::Add => acc + m.value,
            ModifierMode::Multiply => match rounding {
                Rounding::Floor => (acc * m.value).floor(),
                Rounding::Exact => acc * m.value,
            },
            ModifierMode::Override => m.value,
            ModifierMode::Upgrade => acc.max(m.value),
            ModifierMode::Downgrade => acc.min(m.value),
            ModifierMode::Custom => {
                report.skipped_custom += 1;
                tracing::warn!(
                    key = %m.target_key,
                    source = %m.source_id,
                    "custom modifier has no numeric semantics; passing value through"
                );
                continue;
            }
        };
        report.applied += 1;
    }

    report
}

/// Pick out the modifiers aimed at `key` and fold them, using the key's
/// rounding policy
pub fn resolve_key<'a>(
    base: f64,
    modifiers: impl IntoIterator<Item = &'a Modifier>,
    key: &str,
) -> ResolveReport {
    let report = resolve_with(
        base,
        modifiers.into_iter().filter(|m| m.targets(key)),
        Rounding::for_key(key),
    );
    tracing::trace!(key, base, value = report.value, "resolved");
    report
}

/// Value of the first enabled modifier aimed at `key`, in priority then
/// insertion order.
///
/// Deliberately not a sum: only one source contributes.
pub fn find_first<'a>(modifiers: impl IntoIterator<Item = &'a Modifier>, key: &str) -> Option<f64> {
    ordered(modifiers.into_iter().filter(|m| m.targets(key)))
        .first()
        .map(|m| m.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::modifier::keys;

    #[test]
    fn test_priority_orders_the_fold() {
        let add_first = vec![
            Modifier::add("x", 2.0, 10),
            Modifier::multiply("x", 2.0, 20),
        ];
        assert_eq!(resolve(10.0, &add_first), 24.0);

        let multiply_first = vec![
            Modifier::add("x", 2.0, 20),
            Modifier::multiply("x", 2.0, 10),
        ];
        assert_eq!(resolve(10.0, &multiply_first), 22.0);
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let mods = vec![Modifier::set("x", 5.0, 10), Modifier::add("x", 1.0, 10)];
        assert_eq!(resolve(100.0, &mods), 6.0);

        let mods = vec![Modifier::add("x", 1.0, 10), Modifier::set("x", 5.0, 10)];
        assert_eq!(resolve(100.0, &mods), 5.0);
    }

    #[test]
    fn test_override_does_not_short_circuit() {
        let mods = vec![
            Modifier::set("x", 3.0, 10),
            Modifier::multiply("x", 3.0, 20),
        ];
        assert_eq!(resolve(50.0, &mods), 9.0);
    }

    #[test]
    fn test_upgrade_and_downgrade() {
        let up = vec![Modifier::new("x", ModifierMode::Upgrade, 7.0, 0)];
        assert_eq!(resolve(4.0, &up), 7.0);
        assert_eq!(resolve(9.0, &up), 9.0);

        let down = vec![Modifier::new("x", ModifierMode::Downgrade, 7.0, 0)];
        assert_eq!(resolve(4.0, &down), 4.0);
        assert_eq!(resolve(9.0, &down), 7.0);
    }

    #[test]
    fn test_multiply_floors_for_integral_targets() {
        let mods = vec![Modifier::multiply("x", 0.5, 0)];
        assert_eq!(resolve(11.0, &mods), 5.0);
        let exact = resolve_with(11.0, &mods, Rounding::Exact);
        assert_eq!(exact.value, 5.5);
    }

    #[test]
    fn test_disabled_modifiers_are_ignored() {
        let mods = vec![Modifier::add("x", 5.0, 0).disabled(), Modifier::add("x", 1.0, 0)];
        assert_eq!(resolve(0.0, &mods), 1.0);
    }

    #[test]
    fn test_custom_is_counted_pass_through() {
        let mods = vec![
            Modifier::new("x", ModifierMode::Custom, 0.0, 0),
            Modifier::add("x", 1.0, 5),
        ];
        let report = resolve_with(3.0, &mods, Rounding::Floor);
        assert_eq!(report.value, 4.0);
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped_custom, 1);
    }

    #[test]
    fn test_resolve_key_filters_by_target() {
        let mods = vec![
            Modifier::add(keys::DICE_POOL, -2.0, 20),
            Modifier::add(keys::INITIATIVE_BONUS, 3.0, 20),
        ];
        assert_eq!(resolve_key(0.0, &mods, keys::DICE_POOL).value, -2.0);
        assert_eq!(resolve_key(0.0, &mods, keys::INITIATIVE_BONUS).value, 3.0);
    }

    #[test]
    fn test_multiplier_key_is_not_floored() {
        let mods = vec![Modifier::multiply(keys::EXERTION_MULTIPLIER, 0.5, 30)];
        assert_eq!(resolve_key(1.0, &mods, keys::EXERTION_MULTIPLIER).value, 0.5);
    }

    #[test]
    fn test_find_first_does_not_sum() {
        let mods = vec![
            Modifier::add(keys::DIFFICULTY_MODIFIER, 2.0, 20),
            Modifier::add(keys::DIFFICULTY_MODIFIER, 1.0, 20),
        ];
        assert_eq!(find_first(&mods, keys::DIFFICULTY_MODIFIER), Some(2.0));
    }

    #[test]
    fn test_find_first_respects_priority_and_enabled() {
        let mods = vec![
            Modifier::add(keys::DIFFICULTY_MODIFIER, 2.0, 20),
            Modifier::add(keys::DIFFICULTY_MODIFIER, 1.0, 10),
            Modifier::add(keys::DIFFICULTY_MODIFIER, 5.0, 0).disabled(),
        ];
        assert_eq!(find_first(&mods, keys::DIFFICULTY_MODIFIER), Some(1.0));
        assert_eq!(find_first(&mods, "other"), None);
    }
}
