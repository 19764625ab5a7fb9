//! Rules configuration with documented constants
//!
//! Every tunable number the engine consults is collected here. There is no
//! global instance: callers hand a `&RulesConfig` to each operation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::character::wounds::WoundTier;
use crate::combat::stance::Stance;
use crate::core::error::{Result, RulesError};
use crate::effects::EffectTemplate;

/// Configuration for the rules engine
///
/// Missing keys in a TOML file fall back to the values below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    // === EXERTION ===
    /// Constant term of the exertion capacity formula
    ///
    /// capacity = floor((exertion_base + guile + coordination) * multiplier)
    pub exertion_base: i32,

    // === MORALE ===
    /// Exertion spent by a recovery attempt, paid before the roll
    ///
    /// A character needs at least this much exertion to attempt recovery.
    pub recovery_cost: u32,

    /// Successes needed to resist morale damage or to recover
    pub morale_threshold: u32,

    /// Priority of the modifiers on the morale record
    ///
    /// Higher than wounds so the morale multiplier applies last.
    pub morale_priority: i32,

    // === WOUNDS ===
    /// Priority of the built-in wound penalty modifiers
    pub wound_priority: i32,

    /// Record stamped for the current wound severity, one per tier
    ///
    /// Both boxes of a tier share a template.
    pub wound_templates: BTreeMap<WoundTier, EffectTemplate>,

    // === STANCE ===
    /// Record stamped when a character changes stance
    ///
    /// Standing normally has no entry and carries no record.
    pub stance_templates: BTreeMap<Stance, EffectTemplate>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        let wound_priority = 20;
        Self {
            exertion_base: 6,

            recovery_cost: 2,
            morale_threshold: 1,
            morale_priority: 30,

            wound_priority,
            wound_templates: WoundTier::all()
                .iter()
                .map(|t| (*t, t.default_template(wound_priority)))
                .collect(),

            stance_templates: [Stance::Crouched, Stance::Prone]
                .iter()
                .filter_map(|s| s.default_template().map(|t| (*s, t)))
                .collect(),
        }
    }
}

impl RulesConfig {
    /// Parse TOML, fill tiers the file leaves out, then validate
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let mut config: RulesConfig = toml::from_str(source)?;
        let priority = config.wound_priority;
        for tier in WoundTier::all() {
            config
                .wound_templates
                .entry(*tier)
                .or_insert_with(|| tier.default_template(priority));
        }
        config.validate()?;
        tracing::debug!(
            wound_templates = config.wound_templates.len(),
            stance_templates = config.stance_templates.len(),
            "rules config loaded"
        );
        Ok(config)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.exertion_base < 0 {
            return Err(RulesError::Config(format!(
                "exertion_base must not be negative, got {}",
                self.exertion_base
            )));
        }
        if self.morale_threshold == 0 {
            return Err(RulesError::Config(
                "morale_threshold must require at least one success".into(),
            ));
        }
        if let Some(tier) = WoundTier::all()
            .iter()
            .find(|t| !self.wound_templates.contains_key(*t))
        {
            return Err(RulesError::Config(format!("no wound template for tier {}", tier)));
        }
        let templates = self
            .wound_templates
            .values()
            .chain(self.stance_templates.values());
        for template in templates {
            if template.modifiers.iter().any(|m| m.target_key.is_empty()) {
                return Err(RulesError::Config(format!(
                    "template {} has a modifier without a target key",
                    template.name
                )));
            }
        }
        Ok(())
    }

    /// Template for a wound tier, falling back to the built-in one
    pub fn wound_template(&self, tier: WoundTier) -> EffectTemplate {
        self.wound_templates
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| tier.default_template(self.wound_priority))
    }

    pub fn stance_template(&self, stance: Stance) -> Option<&EffectTemplate> {
        self.stance_templates.get(&stance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::modifier::keys;

    #[test]
    fn test_default_is_valid() {
        let config = RulesConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.exertion_base, 6);
        assert_eq!(config.recovery_cost, 2);
        assert_eq!(config.wound_templates.len(), 6);
        assert!(config.stance_template(Stance::Standing).is_none());
        assert!(config.stance_template(Stance::Prone).is_some());
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = RulesConfig::from_toml_str("").unwrap();
        assert_eq!(config, RulesConfig::default());
    }

    #[test]
    fn test_partial_templates_are_filled() {
        let toml = r#"
            recovery_cost = 3

            [wound_templates.hurt]
            name = "Bleeding"
            modifiers = [
                { target_key = "dice.pool", mode = "add", value = -3.0, priority = 20 },
            ]
        "#;
        let config = RulesConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.recovery_cost, 3);
        assert_eq!(config.wound_template(WoundTier::Hurt).name, "Bleeding");
        assert_eq!(config.wound_template(WoundTier::Bruised).name, "Bruised");
        assert_eq!(
            config.wound_template(WoundTier::Dead).modifiers[0].target_key,
            keys::DICE_POOL
        );
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let result = RulesConfig::from_toml_str("morale_threshold = 0");
        assert!(matches!(result, Err(RulesError::Config(_))));
    }

    #[test]
    fn test_missing_tier_fails_validation() {
        let mut config = RulesConfig::default();
        config.wound_templates.remove(&WoundTier::Critical);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_error() {
        let result = RulesConfig::from_toml_str("recovery_cost = \"two\"");
        assert!(matches!(result, Err(RulesError::TomlError(_))));
    }
}
