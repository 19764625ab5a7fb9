//! The nine attributes, grouped in three categories
//!
//! Totals are derived: base value folded through the modifiers aimed at the
//! attribute key, plus the breeding bonus.

use std::collections::BTreeMap;
use std::str::FromStr;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, RulesError};
use crate::effects::modifier::keys;
use crate::effects::{resolve_key, EffectSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[display(fmt = "physical")]
    Physical,
    #[display(fmt = "mental")]
    Mental,
    #[display(fmt = "social")]
    Social,
}

impl Category {
    pub fn all() -> &'static [Category] {
        &[Category::Physical, Category::Mental, Category::Social]
    }

    /// Key that category-wide modifiers target
    pub fn totals_key(&self) -> &'static str {
        match self {
            Category::Physical => keys::TOTALS_PHYSICAL,
            Category::Mental => keys::TOTALS_MENTAL,
            Category::Social => keys::TOTALS_SOCIAL,
        }
    }

    pub fn attributes(&self) -> &'static [Attribute] {
        match self {
            Category::Physical => &[Attribute::Might, Attribute::Coordination, Attribute::Endurance],
            Category::Mental => &[Attribute::Intellect, Attribute::Guile, Attribute::Guts],
            Category::Social => &[Attribute::Bearing, Attribute::Charm, Attribute::Composure],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    // Physical
    #[display(fmt = "might")]
    Might,
    #[display(fmt = "coordination")]
    Coordination,
    #[display(fmt = "endurance")]
    Endurance,

    // Mental
    #[display(fmt = "intellect")]
    Intellect,
    #[display(fmt = "guile")]
    Guile,
    #[display(fmt = "guts")]
    Guts,

    // Social
    #[display(fmt = "bearing")]
    Bearing,
    #[display(fmt = "charm")]
    Charm,
    #[display(fmt = "composure")]
    Composure,
}

impl Attribute {
    pub fn all() -> &'static [Attribute] {
        &[
            Attribute::Might,
            Attribute::Coordination,
            Attribute::Endurance,
            Attribute::Intellect,
            Attribute::Guile,
            Attribute::Guts,
            Attribute::Bearing,
            Attribute::Charm,
            Attribute::Composure,
        ]
    }

    pub fn category(&self) -> Category {
        match self {
            Attribute::Might | Attribute::Coordination | Attribute::Endurance => Category::Physical,
            Attribute::Intellect | Attribute::Guile | Attribute::Guts => Category::Mental,
            Attribute::Bearing | Attribute::Charm | Attribute::Composure => Category::Social,
        }
    }

    /// Modifier key, e.g. `attributes.mental.guts`
    pub fn key(&self) -> String {
        format!("attributes.{}.{}", self.category(), self)
    }
}

impl FromStr for Attribute {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self> {
        Attribute::all()
            .iter()
            .copied()
            .find(|a| a.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RulesError::UnknownAttribute(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AttributeScore {
    pub value: i32,
    /// Added after modifiers are folded
    #[serde(default)]
    pub breeding_bonus: i32,
}

impl AttributeScore {
    pub fn new(value: i32) -> Self {
        Self {
            value,
            breeding_bonus: 0,
        }
    }
}

/// Base scores. Missing attributes read as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attributes {
    scores: BTreeMap<Attribute, AttributeScore>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: Attribute, value: i32) -> Self {
        self.set(attribute, value);
        self
    }

    pub fn score(&self, attribute: Attribute) -> AttributeScore {
        self.scores.get(&attribute).copied().unwrap_or_default()
    }

    pub fn set(&mut self, attribute: Attribute, value: i32) {
        self.scores.entry(attribute).or_default().value = value;
    }

    pub fn set_breeding_bonus(&mut self, attribute: Attribute, bonus: i32) {
        self.scores.entry(attribute).or_default().breeding_bonus = bonus;
    }

    /// Effect-adjusted total of one attribute
    pub fn total(&self, attribute: Attribute, effects: &EffectSet) -> i32 {
        let score = self.score(attribute);
        let key = attribute.key();
        let resolved = resolve_key(score.value as f64, effects.modifiers(), &key);
        resolved.as_i32() + score.breeding_bonus
    }

    /// Sum of a category's totals, then category-wide modifiers
    pub fn category_total(&self, category: Category, effects: &EffectSet) -> i32 {
        let sum: i32 = category
            .attributes()
            .iter()
            .map(|a| self.total(*a, effects))
            .sum();
        resolve_key(sum as f64, effects.modifiers(), category.totals_key()).as_i32()
    }
}
