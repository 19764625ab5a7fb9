//! Wound severity ladder
//!
//! Eleven boxes in five tiers plus `dead`. Second boxes of a tier are gated
//! by the capacity attribute (guts). Only the single most severe marked box
//! counts: penalties never sum.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::RulesConfig;
use crate::core::error::{Result, RulesError};
use crate::effects::modifier::keys;
use crate::effects::{EffectDelta, EffectOrigin, EffectSet, EffectTemplate, Modifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum WoundTier {
    Bruised,
    Grazed,
    Hurt,
    Injured,
    Critical,
    Dead,
}

impl WoundTier {
    pub fn all() -> &'static [WoundTier] {
        &[
            WoundTier::Bruised,
            WoundTier::Grazed,
            WoundTier::Hurt,
            WoundTier::Injured,
            WoundTier::Critical,
            WoundTier::Dead,
        ]
    }

    pub fn penalty(&self) -> i32 {
        match self {
            WoundTier::Bruised | WoundTier::Grazed => -1,
            WoundTier::Hurt => -2,
            WoundTier::Injured => -3,
            WoundTier::Critical => -4,
            WoundTier::Dead => -10,
        }
    }

    /// Built-in template: the tier penalty applied to every dice pool
    pub fn default_template(&self, priority: i32) -> EffectTemplate {
        EffectTemplate::new(
            self.to_string(),
            vec![Modifier::add(keys::DICE_POOL, self.penalty() as f64, priority)],
        )
    }
}

/// One box on the ladder. Ordered in fill order, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum WoundBox {
    #[display(fmt = "Bruised 1")]
    Bruised1,
    #[display(fmt = "Bruised 2")]
    Bruised2,
    #[display(fmt = "Grazed 1")]
    Grazed1,
    #[display(fmt = "Grazed 2")]
    Grazed2,
    #[display(fmt = "Hurt 1")]
    Hurt1,
    #[display(fmt = "Hurt 2")]
    Hurt2,
    #[display(fmt = "Injured 1")]
    Injured1,
    #[display(fmt = "Injured 2")]
    Injured2,
    #[display(fmt = "Critical 1")]
    Critical1,
    #[display(fmt = "Critical 2")]
    Critical2,
    Dead,
}

/// Static data for one box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WoundLevel {
    pub wound_box: WoundBox,
    pub name: &'static str,
    pub penalty: i32,
    /// Capacity needed to mark this box. None for boxes always available.
    pub required_capacity: Option<i32>,
}

const fn wound_level(wound_box: WoundBox, name: &'static str, penalty: i32, required: Option<i32>) -> WoundLevel {
    WoundLevel {
        wound_box,
        name,
        penalty,
        required_capacity: required,
    }
}

/// Every box, most severe first. Severity scans walk this table in order.
pub const WOUND_LEVELS: [WoundLevel; 11] = [
    wound_level(WoundBox::Dead, "dead", -10, None),
    wound_level(WoundBox::Critical2, "critical2", -4, Some(2)),
    wound_level(WoundBox::Critical1, "critical1", -4, None),
    wound_level(WoundBox::Injured2, "injured2", -3, Some(3)),
    wound_level(WoundBox::Injured1, "injured1", -3, None),
    wound_level(WoundBox::Hurt2, "hurt2", -2, Some(4)),
    wound_level(WoundBox::Hurt1, "hurt1", -2, None),
    wound_level(WoundBox::Grazed2, "grazed2", -1, Some(5)),
    wound_level(WoundBox::Grazed1, "grazed1", -1, None),
    wound_level(WoundBox::Bruised2, "bruised2", -1, Some(5)),
    wound_level(WoundBox::Bruised1, "bruised1", -1, None),
];

impl WoundBox {
    pub fn level(&self) -> &'static WoundLevel {
        // Table is indexed most severe first; fill order is the reverse
        &WOUND_LEVELS[WOUND_LEVELS.len() - 1 - *self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.level().name
    }

    pub fn penalty(&self) -> i32 {
        self.level().penalty
    }

    pub fn required_capacity(&self) -> Option<i32> {
        self.level().required_capacity
    }

    pub fn is_tier_two(&self) -> bool {
        self.required_capacity().is_some()
    }

    pub fn is_available(&self, capacity: i32) -> bool {
        self.required_capacity().map_or(true, |req| capacity >= req)
    }

    pub fn tier(&self) -> WoundTier {
        match self {
            WoundBox::Bruised1 | WoundBox::Bruised2 => WoundTier::Bruised,
            WoundBox::Grazed1 | WoundBox::Grazed2 => WoundTier::Grazed,
            WoundBox::Hurt1 | WoundBox::Hurt2 => WoundTier::Hurt,
            WoundBox::Injured1 | WoundBox::Injured2 => WoundTier::Injured,
            WoundBox::Critical1 | WoundBox::Critical2 => WoundTier::Critical,
            WoundBox::Dead => WoundTier::Dead,
        }
    }

    /// Fill order, least severe first
    pub fn fill_order() -> impl Iterator<Item = WoundBox> {
        WOUND_LEVELS.iter().rev().map(|l| l.wound_box)
    }
}

/// What a damage or heal request is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WoundTarget {
    Tier(WoundTier),
    Box(WoundBox),
}

impl WoundTarget {
    pub fn matches(&self, wound_box: WoundBox) -> bool {
        match self {
            WoundTarget::Tier(tier) => wound_box.tier() == *tier,
            WoundTarget::Box(b) => wound_box == *b,
        }
    }
}

impl From<WoundTier> for WoundTarget {
    fn from(tier: WoundTier) -> Self {
        WoundTarget::Tier(tier)
    }
}

impl From<WoundBox> for WoundTarget {
    fn from(wound_box: WoundBox) -> Self {
        WoundTarget::Box(wound_box)
    }
}

impl std::fmt::Display for WoundTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WoundTarget::Tier(tier) => write!(f, "{}", tier),
            WoundTarget::Box(b) => write!(f, "{}", b),
        }
    }
}

impl FromStr for WoundTarget {
    type Err = RulesError;

    /// Accepts a tier name (`hurt`) or a box name (`hurt2`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(tier) = WoundTier::all()
            .iter()
            .find(|t| t.to_string().eq_ignore_ascii_case(&s))
        {
            return Ok(WoundTarget::Tier(*tier));
        }
        WOUND_LEVELS
            .iter()
            .find(|l| l.name == s)
            .map(|l| WoundTarget::Box(l.wound_box))
            .ok_or(RulesError::UnknownWoundTarget(s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealTarget {
    All,
    Only(WoundTarget),
}

impl From<WoundTarget> for HealTarget {
    fn from(target: WoundTarget) -> Self {
        HealTarget::Only(target)
    }
}

impl From<WoundTier> for HealTarget {
    fn from(tier: WoundTier) -> Self {
        HealTarget::Only(WoundTarget::Tier(tier))
    }
}

impl From<WoundBox> for HealTarget {
    fn from(wound_box: WoundBox) -> Self {
        HealTarget::Only(WoundTarget::Box(wound_box))
    }
}

impl FromStr for HealTarget {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(HealTarget::All)
        } else {
            s.parse::<WoundTarget>().map(HealTarget::Only)
        }
    }
}

/// Damage that could not be recorded. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WoundRefusal {
    #[error("no available {target} box")]
    NoAvailableBox { target: String },
}

impl WoundRefusal {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoundMark {
    pub marked: WoundBox,
    pub severity: Option<WoundBox>,
    pub delta: EffectDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealReport {
    pub cleared: Vec<WoundBox>,
    pub severity: Option<WoundBox>,
    pub delta: EffectDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoundStatistics {
    /// "Healthy" or the label of the most severe box
    pub current: String,
    pub penalty: i32,
    pub total_marked: usize,
    pub by_tier: BTreeMap<WoundTier, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoundBoxView {
    pub wound_box: WoundBox,
    pub marked: bool,
    pub available: bool,
    pub required_capacity: Option<i32>,
    pub penalty: i32,
}

/// Marked boxes of one character
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct WoundLadder {
    marked: BTreeSet<WoundBox>,
}

impl WoundLadder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load host-supplied marks. Tier-2 boxes the capacity cannot hold are
    /// cleared on the way in.
    pub fn from_marks(marks: impl IntoIterator<Item = WoundBox>, capacity: i32) -> Self {
        let mut ladder = Self {
            marked: marks.into_iter().collect(),
        };
        ladder.enforce_capacity(capacity);
        ladder
    }

    pub fn is_marked(&self, wound_box: WoundBox) -> bool {
        self.marked.contains(&wound_box)
    }

    pub fn marked(&self) -> impl Iterator<Item = WoundBox> + '_ {
        self.marked.iter().copied()
    }

    pub fn is_healthy(&self) -> bool {
        self.marked.is_empty()
    }

    pub fn is_dead(&self) -> bool {
        self.is_marked(WoundBox::Dead)
    }

    /// Clear every tier-2 box the capacity no longer supports.
    ///
    /// Must run after every change to the capacity attribute.
    pub fn enforce_capacity(&mut self, capacity: i32) -> Vec<WoundBox> {
        let cleared: Vec<WoundBox> = self
            .marked
            .iter()
            .copied()
            .filter(|b| !b.is_available(capacity))
            .collect();
        for b in &cleared {
            self.marked.remove(b);
            tracing::info!(wound = %b, capacity, "wound box cleared by capacity drop");
        }
        cleared
    }

    /// Most severe marked box, or None when healthy
    pub fn current_severity(&self) -> Option<WoundBox> {
        WOUND_LEVELS
            .iter()
            .map(|l| l.wound_box)
            .find(|b| self.marked.contains(b))
    }

    /// Replace the wound record so it matches the current severity.
    ///
    /// Idempotent: a record that already matches is left alone.
    pub fn sync_effects(&self, effects: &mut EffectSet, config: &RulesConfig) -> EffectDelta {
        let severity = self.current_severity();
        let existing = effects.count(|o| o.is_wound());
        if let Some(b) = severity {
            let matching = effects.count(|o| *o == EffectOrigin::Wound(b));
            if existing == 1 && matching == 1 {
                return EffectDelta::default();
            }
        } else if existing == 0 {
            return EffectDelta::default();
        }

        let mut delta = effects.remove_where(|o| o.is_wound());
        if let Some(b) = severity {
            let template = config.wound_template(b.tier());
            let record = template.instantiate(
                format!("{} ({})", template.name, b.name()),
                EffectOrigin::Wound(b),
            );
            delta.merge(effects.add(record));
        }
        delta
    }

    /// Mark the first unmarked, available box matching `target`
    pub fn apply_damage(
        &mut self,
        target: WoundTarget,
        capacity: i32,
        effects: &mut EffectSet,
        config: &RulesConfig,
    ) -> std::result::Result<WoundMark, WoundRefusal> {
        let found = WoundBox::fill_order()
            .find(|b| target.matches(*b) && !self.is_marked(*b) && b.is_available(capacity));

        let Some(wound_box) = found else {
            tracing::debug!(%target, capacity, "no wound box available");
            return Err(WoundRefusal::NoAvailableBox {
                target: target.to_string(),
            });
        };

        self.marked.insert(wound_box);
        tracing::info!(wound = %wound_box, "wound marked");
        let delta = self.sync_effects(effects, config);
        Ok(WoundMark {
            marked: wound_box,
            severity: self.current_severity(),
            delta,
        })
    }

    /// Clear matching boxes. `dead` is never cleared.
    pub fn heal(
        &mut self,
        target: HealTarget,
        effects: &mut EffectSet,
        config: &RulesConfig,
    ) -> HealReport {
        let cleared: Vec<WoundBox> = self
            .marked
            .iter()
            .copied()
            .filter(|b| *b != WoundBox::Dead)
            .filter(|b| match target {
                HealTarget::All => true,
                HealTarget::Only(t) => t.matches(*b),
            })
            .collect();
        for b in &cleared {
            self.marked.remove(b);
        }
        if !cleared.is_empty() {
            tracing::info!(count = cleared.len(), "wounds healed");
        }
        let delta = self.sync_effects(effects, config);
        HealReport {
            cleared,
            severity: self.current_severity(),
            delta,
        }
    }

    pub fn statistics(&self) -> WoundStatistics {
        let severity = self.current_severity();
        let mut by_tier: BTreeMap<WoundTier, usize> =
            WoundTier::all().iter().map(|t| (*t, 0)).collect();
        for b in &self.marked {
            *by_tier.entry(b.tier()).or_default() += 1;
        }
        WoundStatistics {
            current: severity.map_or_else(|| "Healthy".to_string(), |b| b.to_string()),
            penalty: severity.map_or(0, |b| b.penalty()),
            total_marked: self.marked.len(),
            by_tier,
        }
    }

    /// Every box, most severe first, with its availability at `capacity`
    pub fn box_view(&self, capacity: i32) -> Vec<WoundBoxView> {
        WOUND_LEVELS
            .iter()
            .map(|l| WoundBoxView {
                wound_box: l.wound_box,
                marked: self.is_marked(l.wound_box),
                available: l.wound_box.is_available(capacity),
                required_capacity: l.required_capacity,
                penalty: l.penalty,
            })
            .collect()
    }

    /// Fails if a tier-2 box is marked beyond what `capacity` allows
    pub fn check_invariants(&self, capacity: i32) -> Result<()> {
        match self.marked.iter().find(|b| !b.is_available(capacity)) {
            Some(b) => Err(RulesError::InvariantViolation(format!(
                "{} marked with capacity {} (requires {})",
                b.name(),
                capacity,
                b.required_capacity().unwrap_or_default()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (WoundLadder, EffectSet, RulesConfig) {
        (WoundLadder::new(), EffectSet::new(), RulesConfig::default())
    }

    #[test]
    fn test_table_matches_box_order() {
        for b in WoundBox::fill_order() {
            assert_eq!(b.level().wound_box, b);
        }
        assert_eq!(WoundBox::Hurt2.required_capacity(), Some(4));
        assert_eq!(WoundBox::Bruised2.required_capacity(), Some(5));
        assert_eq!(WoundBox::Critical2.required_capacity(), Some(2));
        assert_eq!(WoundBox::Dead.penalty(), -10);
    }

    #[test]
    fn test_parse_targets() {
        assert_eq!(
            "hurt".parse::<WoundTarget>().unwrap(),
            WoundTarget::Tier(WoundTier::Hurt)
        );
        assert_eq!(
            "Critical2".parse::<WoundTarget>().unwrap(),
            WoundTarget::Box(WoundBox::Critical2)
        );
        assert_eq!("all".parse::<HealTarget>().unwrap(), HealTarget::All);
        assert!(matches!(
            "maimed".parse::<WoundTarget>(),
            Err(RulesError::UnknownWoundTarget(_))
        ));
    }

    #[test]
    fn test_tier_damage_fills_first_box_first() {
        let (mut ladder, mut effects, config) = setup();
        let first = ladder
            .apply_damage(WoundTier::Hurt.into(), 5, &mut effects, &config)
            .unwrap();
        assert_eq!(first.marked, WoundBox::Hurt1);
        let second = ladder
            .apply_damage(WoundTier::Hurt.into(), 5, &mut effects, &config)
            .unwrap();
        assert_eq!(second.marked, WoundBox::Hurt2);
        assert!(ladder
            .apply_damage(WoundTier::Hurt.into(), 5, &mut effects, &config)
            .is_err());
    }

    #[test]
    fn test_capacity_gates_tier_two() {
        let (mut ladder, mut effects, config) = setup();
        let refused = ladder.apply_damage(WoundBox::Critical2.into(), 1, &mut effects, &config);
        assert!(refused.is_err());
        assert!(ladder.is_healthy());
        assert!(effects.is_empty());

        ladder
            .apply_damage(WoundBox::Critical2.into(), 2, &mut effects, &config)
            .unwrap();
        assert_eq!(ladder.current_severity(), Some(WoundBox::Critical2));

        let cleared = ladder.enforce_capacity(1);
        assert_eq!(cleared, vec![WoundBox::Critical2]);
        assert_eq!(ladder.current_severity(), None);
    }

    #[test]
    fn test_worst_wins() {
        let ladder = WoundLadder::from_marks(
            [WoundBox::Bruised1, WoundBox::Hurt1, WoundBox::Grazed1],
            0,
        );
        assert_eq!(ladder.current_severity(), Some(WoundBox::Hurt1));
        let stats = ladder.statistics();
        assert_eq!(stats.penalty, -2);
        assert_eq!(stats.current, "Hurt 1");
        assert_eq!(stats.total_marked, 3);
        assert_eq!(stats.by_tier[&WoundTier::Grazed], 1);
    }

    #[test]
    fn test_sync_is_idempotent() {
        let (mut ladder, mut effects, config) = setup();
        ladder
            .apply_damage(WoundTier::Injured.into(), 3, &mut effects, &config)
            .unwrap();
        assert_eq!(effects.count(|o| o.is_wound()), 1);

        let delta = ladder.sync_effects(&mut effects, &config);
        assert!(delta.is_empty());
        assert_eq!(effects.count(|o| o.is_wound()), 1);
    }

    #[test]
    fn test_worse_wound_replaces_record() {
        let (mut ladder, mut effects, config) = setup();
        ladder
            .apply_damage(WoundTier::Bruised.into(), 3, &mut effects, &config)
            .unwrap();
        let mark = ladder
            .apply_damage(WoundTier::Critical.into(), 3, &mut effects, &config)
            .unwrap();
        assert_eq!(mark.delta.removed.len(), 1);
        assert_eq!(mark.delta.added.len(), 1);
        let record = effects.find(|o| o.is_wound()).unwrap();
        assert_eq!(record.origin, EffectOrigin::Wound(WoundBox::Critical1));
        assert_eq!(record.name, "Critical (critical1)");
    }

    #[test]
    fn test_heal_never_clears_dead() {
        let (_, mut effects, config) = setup();
        let mut ladder = WoundLadder::from_marks([WoundBox::Dead, WoundBox::Hurt1], 3);
        ladder.sync_effects(&mut effects, &config);

        let report = ladder.heal(HealTarget::All, &mut effects, &config);
        assert_eq!(report.cleared, vec![WoundBox::Hurt1]);
        assert!(ladder.is_dead());
        assert_eq!(effects.count(|o| o.is_wound()), 1);
    }

    #[test]
    fn test_heal_tier_removes_record() {
        let (mut ladder, mut effects, config) = setup();
        ladder
            .apply_damage(WoundTier::Grazed.into(), 5, &mut effects, &config)
            .unwrap();
        let report = ladder.heal(WoundTier::Grazed.into(), &mut effects, &config);
        assert_eq!(report.severity, None);
        assert!(effects.is_empty());
        assert_eq!(report.delta.removed.len(), 1);
    }

    #[test]
    fn test_box_view_and_invariants() {
        let ladder = WoundLadder::from_marks([WoundBox::Hurt2], 4);
        let view = ladder.box_view(4);
        assert_eq!(view.len(), 11);
        assert_eq!(view[0].wound_box, WoundBox::Dead);
        let hurt2 = view.iter().find(|v| v.wound_box == WoundBox::Hurt2).unwrap();
        assert!(hurt2.marked && hurt2.available);

        assert!(ladder.check_invariants(4).is_ok());
        assert!(matches!(
            ladder.check_invariants(3),
            Err(RulesError::InvariantViolation(_))
        ));
    }
}
