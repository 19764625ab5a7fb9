//! Effect records: named bundles of modifiers attached to one character

use serde::{Deserialize, Serialize};

use crate::character::morale::MoraleState;
use crate::character::wounds::WoundBox;
use crate::combat::stance::Stance;
use crate::core::types::EffectId;
use crate::effects::modifier::Modifier;

/// What created a record. The engine owns wound, morale and stance
/// records; templates come from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectOrigin {
    Wound(WoundBox),
    Morale(MoraleState),
    Stance(Stance),
    Template(String),
}

impl EffectOrigin {
    pub fn is_wound(&self) -> bool {
        matches!(self, EffectOrigin::Wound(_))
    }

    pub fn is_morale(&self) -> bool {
        matches!(self, EffectOrigin::Morale(_))
    }

    pub fn is_stance(&self) -> bool {
        matches!(self, EffectOrigin::Stance(_))
    }
}

/// Optional expiry, counted in combat rounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EffectDuration {
    /// None means indefinite
    pub rounds: Option<u32>,
}

impl EffectDuration {
    pub fn indefinite() -> Self {
        Self { rounds: None }
    }

    pub fn rounds(rounds: u32) -> Self {
        Self {
            rounds: Some(rounds),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectRecord {
    pub id: EffectId,
    pub name: String,
    pub origin: EffectOrigin,
    pub modifiers: Vec<Modifier>,
    pub disabled: bool,
    pub duration: EffectDuration,
}

impl EffectRecord {
    pub fn new(name: impl Into<String>, origin: EffectOrigin, modifiers: Vec<Modifier>) -> Self {
        let id = EffectId::new();
        let source = id.0.to_string();
        let modifiers = modifiers
            .into_iter()
            .map(|m| {
                if m.source_id.is_empty() {
                    m.with_source(source.clone())
                } else {
                    m
                }
            })
            .collect();
        Self {
            id,
            name: name.into(),
            origin,
            modifiers,
            disabled: false,
            duration: EffectDuration::indefinite(),
        }
    }

    pub fn with_duration(mut self, duration: EffectDuration) -> Self {
        self.duration = duration;
        self
    }
}

/// Blueprint a record is stamped from (wound tiers, stances, host templates)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTemplate {
    pub name: String,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default)]
    pub rounds: Option<u32>,
}

impl EffectTemplate {
    pub fn new(name: impl Into<String>, modifiers: Vec<Modifier>) -> Self {
        Self {
            name: name.into(),
            modifiers,
            rounds: None,
        }
    }

    pub fn instantiate(&self, name: impl Into<String>, origin: EffectOrigin) -> EffectRecord {
        EffectRecord::new(name, origin, self.modifiers.clone()).with_duration(EffectDuration {
            rounds: self.rounds,
        })
    }
}

/// Records added, removed and changed in place by an operation; what the
/// host must persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectDelta {
    pub added: Vec<EffectRecord>,
    pub removed: Vec<EffectId>,
    /// Records that kept their id but changed (disabled flag, rounds left).
    /// Each entry is the record's new state.
    #[serde(default)]
    pub modified: Vec<EffectRecord>,
}

impl EffectDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Fold a later delta into this one. A record added here and removed
    /// later cancels out; a later change to a record added here rewrites
    /// the addition.
    pub fn merge(&mut self, later: EffectDelta) {
        for id in later.removed {
            self.modified.retain(|r| r.id != id);
            if let Some(pos) = self.added.iter().position(|r| r.id == id) {
                self.added.remove(pos);
            } else {
                self.removed.push(id);
            }
        }
        for record in later.modified {
            if let Some(slot) = self.added.iter_mut().find(|r| r.id == record.id) {
                *slot = record;
            } else if let Some(slot) = self.modified.iter_mut().find(|r| r.id == record.id) {
                *slot = record;
            } else {
                self.modified.push(record);
            }
        }
        self.added.extend(later.added);
    }

    /// Difference between two snapshots of the same character's effects
    pub fn between(before: &EffectSet, after: &EffectSet) -> Self {
        let removed = before
            .iter()
            .filter(|r| after.get(r.id).is_none())
            .map(|r| r.id)
            .collect();
        let added = after
            .iter()
            .filter(|r| before.get(r.id).is_none())
            .cloned()
            .collect();
        let modified = after
            .iter()
            .filter(|r| before.get(r.id).is_some_and(|old| old != *r))
            .cloned()
            .collect();
        Self {
            added,
            removed,
            modified,
        }
    }
}

/// A character's records in insertion order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectSet {
    records: Vec<EffectRecord>,
}

impl EffectSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: EffectId) -> Option<&EffectRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn find(&self, pred: impl Fn(&EffectOrigin) -> bool) -> Option<&EffectRecord> {
        self.records.iter().find(|r| pred(&r.origin))
    }

    pub fn count(&self, pred: impl Fn(&EffectOrigin) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.origin)).count()
    }

    /// Modifiers of every enabled record, in record insertion order
    pub fn modifiers(&self) -> impl Iterator<Item = &Modifier> {
        self.records
            .iter()
            .filter(|r| !r.disabled)
            .flat_map(|r| r.modifiers.iter())
    }

    pub fn modifiers_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Modifier> + 'a {
        self.modifiers().filter(move |m| m.targets(key))
    }

    pub fn add(&mut self, record: EffectRecord) -> EffectDelta {
        tracing::debug!(name = %record.name, "effect added");
        self.records.push(record.clone());
        EffectDelta {
            added: vec![record],
            ..EffectDelta::default()
        }
    }

    pub fn remove(&mut self, id: EffectId) -> EffectDelta {
        self.remove_matching(|r| r.id == id)
    }

    /// Remove every record whose origin matches
    pub fn remove_where(&mut self, pred: impl Fn(&EffectOrigin) -> bool) -> EffectDelta {
        self.remove_matching(|r| pred(&r.origin))
    }

    fn remove_matching(&mut self, pred: impl Fn(&EffectRecord) -> bool) -> EffectDelta {
        let mut removed = Vec::new();
        self.records.retain(|r| {
            if pred(r) {
                tracing::debug!(name = %r.name, "effect removed");
                removed.push(r.id);
                false
            } else {
                true
            }
        });
        EffectDelta {
            removed,
            ..EffectDelta::default()
        }
    }

    /// Enable or disable a record. None if no such record exists; a record
    /// already in the requested state yields an empty delta.
    pub fn set_disabled(&mut self, id: EffectId, disabled: bool) -> Option<EffectDelta> {
        let record = self.records.iter_mut().find(|r| r.id == id)?;
        if record.disabled == disabled {
            return Some(EffectDelta::default());
        }
        record.disabled = disabled;
        tracing::debug!(name = %record.name, disabled, "effect toggled");
        Some(EffectDelta {
            modified: vec![record.clone()],
            ..EffectDelta::default()
        })
    }

    /// Count one round off every timed record and drop the expired ones.
    /// Survivors whose countdown moved are reported as modified.
    pub fn tick_round(&mut self) -> EffectDelta {
        let before = self.clone();
        for record in &mut self.records {
            if let Some(rounds) = record.duration.rounds.as_mut() {
                *rounds = rounds.saturating_sub(1);
            }
        }
        self.remove_matching(|r| r.duration.rounds == Some(0));
        EffectDelta::between(&before, self)
    }
}
