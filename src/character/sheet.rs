//! A character and every operation the engine runs on one
//!
//! Resolved values are never stored. They are folded from base values and
//! the effect set each time they are read; only the exertion pool keeps a
//! cached max, refreshed after every effect change.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::attributes::{Attribute, Attributes, Category};
use crate::character::exertion::{ExertionBasis, ExertionPool, Restore};
use crate::character::morale::{
    ActionKind, MoraleDamage, MoraleInputs, MoraleRecovery, MoraleRefusal, MoraleState, MoraleTrack,
};
use crate::character::skills::{Skill, Skills};
use crate::character::wounds::{HealReport, HealTarget, WoundLadder, WoundMark, WoundRefusal, WoundTarget};
use crate::combat::attack::{AttackReport, ShotType, Weapon};
use crate::combat::constants::{BASE_EXERTION_MULTIPLIER, BASE_MOVEMENT_MULTIPLIER, MIN_ROLL_POOL};
use crate::combat::difficulty::{DifficultyBreakdown, DifficultyContext};
use crate::combat::initiative::{self, InitiativeBreakdown};
use crate::combat::stance::Stance;
use crate::core::config::RulesConfig;
use crate::core::types::{ActorKind, CharacterId, EffectId};
use crate::dice::{roll_sum, DicePool, PoolRoll};
use crate::effects::modifier::keys;
use crate::effects::{resolve_key, EffectDelta, EffectOrigin, EffectRecord, EffectSet, EffectTemplate};

/// An action the character cannot take right now. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionRefusal {
    #[error("{action} not allowed while {state}")]
    MoraleForbids { state: MoraleState, action: ActionKind },
    #[error("movement is restricted")]
    MovementRestricted,
    #[error("needs {need} exertion, have {have}")]
    InsufficientExertion { have: u32, need: u32 },
    #[error("no weapon named {0}")]
    UnknownWeapon(String),
    #[error("{weapon} cannot fire {shot}")]
    ShotUnavailable { weapon: String, shot: ShotType },
    #[error("{0} is out of ammunition")]
    OutOfAmmunition(String),
}

impl ActionRefusal {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveReport {
    pub cost: u32,
    pub exertion_remaining: u32,
}

/// A character sheet.
///
/// Deserializing clears wound boxes the loaded capacity cannot hold, but
/// records and exertion capacity depend on the rules configuration: hosts
/// load through [`Character::from_json`] or call [`Character::refresh`]
/// before the first operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CharacterSnapshot")]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub actor: ActorKind,
    pub attributes: Attributes,
    pub skills: Skills,
    pub effects: EffectSet,
    pub wounds: WoundLadder,
    pub morale: MoraleTrack,
    pub exertion: ExertionPool,
    /// Flat initiative bonus stored on the sheet
    pub initiative_bonus: i32,
    pub weapons: Vec<Weapon>,
}

/// Stored form of a character, before capacity is enforced
#[derive(Deserialize)]
struct CharacterSnapshot {
    id: CharacterId,
    name: String,
    actor: ActorKind,
    attributes: Attributes,
    #[serde(default)]
    skills: Skills,
    #[serde(default)]
    effects: EffectSet,
    #[serde(default)]
    wounds: WoundLadder,
    #[serde(default)]
    morale: MoraleTrack,
    #[serde(default)]
    exertion: ExertionPool,
    #[serde(default)]
    initiative_bonus: i32,
    #[serde(default)]
    weapons: Vec<Weapon>,
}

impl From<CharacterSnapshot> for Character {
    fn from(snapshot: CharacterSnapshot) -> Self {
        let mut character = Self {
            id: snapshot.id,
            name: snapshot.name,
            actor: snapshot.actor,
            attributes: snapshot.attributes,
            skills: snapshot.skills,
            effects: snapshot.effects,
            wounds: snapshot.wounds,
            morale: snapshot.morale,
            exertion: snapshot.exertion,
            initiative_bonus: snapshot.initiative_bonus,
            weapons: snapshot.weapons,
        };
        let capacity = character.capacity();
        character.wounds.enforce_capacity(capacity);
        character
    }
}

impl Character {
    /// A fresh character with a full exertion pool
    pub fn new(name: impl Into<String>, actor: ActorKind, attributes: Attributes, config: &RulesConfig) -> Self {
        let mut character = Self {
            id: CharacterId::new(),
            name: name.into(),
            actor,
            attributes,
            skills: Skills::new(),
            effects: EffectSet::new(),
            wounds: WoundLadder::new(),
            morale: MoraleTrack::default(),
            exertion: ExertionPool::default(),
            initiative_bonus: 0,
            weapons: Vec::new(),
        };
        character.refresh(config);
        character.exertion.restore(Restore::Full);
        character
    }

    /// Load a host-saved character and re-establish every derived
    /// invariant. The delta holds the records loading had to change.
    pub fn from_json(source: &str, config: &RulesConfig) -> crate::core::error::Result<(Self, EffectDelta)> {
        let mut character: Self = serde_json::from_str(source)?;
        let delta = character.refresh(config);
        if !delta.is_empty() {
            tracing::info!(
                character = %character.name,
                added = delta.added.len(),
                removed = delta.removed.len(),
                "loaded character normalized"
            );
        }
        Ok((character, delta))
    }

    pub fn with_skills(mut self, skills: Skills) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.push(weapon);
        self
    }

    // === DERIVED VALUES ===

    pub fn total(&self, attribute: Attribute) -> i32 {
        self.attributes.total(attribute, &self.effects)
    }

    pub fn category_total(&self, category: Category) -> i32 {
        self.attributes.category_total(category, &self.effects)
    }

    pub fn skill_total(&self, skill: &Skill) -> i32 {
        self.skills.total(skill)
    }

    /// Capacity attribute for the wound ladder
    pub fn capacity(&self) -> i32 {
        self.total(Attribute::Guts)
    }

    pub fn exertion_multiplier(&self) -> f64 {
        resolve_key(BASE_EXERTION_MULTIPLIER, self.effects.modifiers(), keys::EXERTION_MULTIPLIER).value
    }

    pub fn movement_multiplier(&self) -> f64 {
        resolve_key(BASE_MOVEMENT_MULTIPLIER, self.effects.modifiers(), keys::MOVEMENT_MULTIPLIER).value
    }

    /// Net `dice.pool` adjustment (wound penalties and the like)
    pub fn pool_modifier(&self) -> i32 {
        resolve_key(0.0, self.effects.modifiers(), keys::DICE_POOL).as_i32()
    }

    pub fn exertion_basis(&self, config: &RulesConfig) -> ExertionBasis {
        ExertionBasis {
            base: config.exertion_base,
            guile: self.total(Attribute::Guile),
            coordination: self.total(Attribute::Coordination),
            multiplier: self.exertion_multiplier(),
        }
    }

    pub fn stance(&self) -> Stance {
        Stance::of(&self.effects)
    }

    fn morale_inputs(&self) -> MoraleInputs {
        MoraleInputs {
            actor: self.actor,
            guts: self.total(Attribute::Guts),
            composure: self.total(Attribute::Composure),
        }
    }

    // === EFFECTS ===

    /// Re-establish every derived invariant after an input changed.
    ///
    /// Clears wound boxes the capacity no longer holds, brings the wound and
    /// morale records in line with their states, then recomputes exertion.
    pub fn refresh(&mut self, config: &RulesConfig) -> EffectDelta {
        let capacity = self.capacity();
        self.wounds.enforce_capacity(capacity);
        let mut delta = self.wounds.sync_effects(&mut self.effects, config);
        delta.merge(self.morale.sync_effects(&mut self.effects, config));
        let basis = self.exertion_basis(config);
        self.exertion.recompute(&basis);
        delta
    }

    pub fn set_attribute(&mut self, attribute: Attribute, value: i32, config: &RulesConfig) -> EffectDelta {
        self.attributes.set(attribute, value);
        self.refresh(config)
    }

    pub fn add_effect(&mut self, record: EffectRecord, config: &RulesConfig) -> EffectDelta {
        let mut delta = self.effects.add(record);
        delta.merge(self.refresh(config));
        delta
    }

    /// Stamp a host template onto the character
    pub fn apply_template(&mut self, template: &EffectTemplate, config: &RulesConfig) -> EffectDelta {
        let record = template.instantiate(template.name.clone(), EffectOrigin::Template(template.name.clone()));
        self.add_effect(record, config)
    }

    pub fn remove_effect(&mut self, id: EffectId, config: &RulesConfig) -> EffectDelta {
        let mut delta = self.effects.remove(id);
        delta.merge(self.refresh(config));
        delta
    }

    /// Toggle a record. None if the character has no such record.
    pub fn set_effect_disabled(
        &mut self,
        id: EffectId,
        disabled: bool,
        config: &RulesConfig,
    ) -> Option<EffectDelta> {
        let mut delta = self.effects.set_disabled(id, disabled)?;
        delta.merge(self.refresh(config));
        Some(delta)
    }

    /// Replace any stance record with one for `stance`
    pub fn set_stance(&mut self, stance: Stance, config: &RulesConfig) -> EffectDelta {
        let mut delta = self.effects.remove_where(|o| o.is_stance());
        if let Some(template) = config.stance_template(stance) {
            let record = template.instantiate(template.name.clone(), EffectOrigin::Stance(stance));
            delta.merge(self.effects.add(record));
        }
        delta.merge(self.refresh(config));
        tracing::debug!(character = %self.name, %stance, "stance set");
        delta
    }

    /// Expire timed effects at the end of a round
    pub fn end_round(&mut self, config: &RulesConfig) -> EffectDelta {
        let mut delta = self.effects.tick_round();
        delta.merge(self.refresh(config));
        delta
    }

    // === WOUNDS ===

    pub fn apply_wound(
        &mut self,
        target: impl Into<WoundTarget>,
        config: &RulesConfig,
    ) -> Result<WoundMark, WoundRefusal> {
        let capacity = self.capacity();
        let mut mark = self
            .wounds
            .apply_damage(target.into(), capacity, &mut self.effects, config)?;
        mark.delta.merge(self.refresh(config));
        mark.severity = self.wounds.current_severity();
        Ok(mark)
    }

    pub fn heal(&mut self, target: impl Into<HealTarget>, config: &RulesConfig) -> HealReport {
        let mut report = self.wounds.heal(target.into(), &mut self.effects, config);
        report.delta.merge(self.refresh(config));
        report.severity = self.wounds.current_severity();
        report
    }

    // === MORALE ===

    pub fn apply_morale_damage_with_roll(
        &mut self,
        source: &str,
        resistible: bool,
        config: &RulesConfig,
        roller: impl FnOnce(&DicePool) -> PoolRoll,
    ) -> Result<MoraleDamage, MoraleRefusal> {
        let inputs = self.morale_inputs();
        let mut result =
            self.morale
                .apply_damage_with_roll(source, resistible, inputs, &mut self.effects, config, roller)?;
        if result.from != result.to {
            result.delta.merge(self.refresh(config));
        }
        Ok(result)
    }

    pub fn apply_morale_damage<R: Rng + ?Sized>(
        &mut self,
        source: &str,
        resistible: bool,
        config: &RulesConfig,
        rng: &mut R,
    ) -> Result<MoraleDamage, MoraleRefusal> {
        self.apply_morale_damage_with_roll(source, resistible, config, |pool| pool.roll(rng, None))
    }

    pub fn attempt_recovery_with_roll(
        &mut self,
        config: &RulesConfig,
        roller: impl FnOnce(&DicePool) -> PoolRoll,
    ) -> Result<MoraleRecovery, MoraleRefusal> {
        let inputs = self.morale_inputs();
        let mut result = self.morale.attempt_recovery_with_roll(
            inputs,
            &mut self.exertion,
            &mut self.effects,
            config,
            roller,
        )?;
        if result.recovered {
            result.delta.merge(self.refresh(config));
        }
        result.exertion_remaining = self.exertion.value();
        Ok(result)
    }

    pub fn attempt_recovery<R: Rng + ?Sized>(
        &mut self,
        config: &RulesConfig,
        rng: &mut R,
    ) -> Result<MoraleRecovery, MoraleRefusal> {
        self.attempt_recovery_with_roll(config, |pool| pool.roll(rng, None))
    }

    /// Start of this character's turn
    pub fn begin_turn(&mut self) {
        self.morale.reset_turn_flags();
    }

    /// Morale gate, plus the `movement.restricted` flag for movement
    pub fn check_action(&self, action: ActionKind) -> Result<(), ActionRefusal> {
        let state = self.morale.state;
        if !state.permits(action) {
            return Err(ActionRefusal::MoraleForbids { state, action });
        }
        if action == ActionKind::Move {
            let restricted = resolve_key(0.0, self.effects.modifiers(), keys::MOVEMENT_RESTRICTED);
            if restricted.value != 0.0 {
                return Err(ActionRefusal::MovementRestricted);
            }
        }
        Ok(())
    }

    // === EXERTION ===

    pub fn spend_exertion(&mut self, amount: u32) -> u32 {
        self.exertion.spend(amount)
    }

    pub fn restore_exertion(&mut self, amount: Restore) -> u32 {
        self.exertion.restore(amount)
    }

    /// Exertion cost of moving `meters`: whole meters, times the stance
    /// multiplier, rounded up
    pub fn movement_cost(&self, meters: f64) -> u32 {
        let meters = meters.max(0.0).ceil();
        (meters * self.movement_multiplier()).ceil().max(0.0) as u32
    }

    pub fn move_meters(&mut self, meters: f64) -> Result<MoveReport, ActionRefusal> {
        self.check_action(ActionKind::Move)?;
        let cost = self.movement_cost(meters);
        if !self.exertion.can_afford(cost) {
            return Err(ActionRefusal::InsufficientExertion {
                have: self.exertion.value(),
                need: cost,
            });
        }
        let remaining = self.exertion.spend(cost);
        tracing::debug!(character = %self.name, meters, cost, remaining, "moved");
        Ok(MoveReport {
            cost,
            exertion_remaining: remaining,
        })
    }

    // === ROLLS ===

    pub fn attribute_pool(&self, attribute: Attribute, skilled: bool) -> DicePool {
        let size = (self.total(attribute) + self.pool_modifier()).max(MIN_ROLL_POOL);
        DicePool::new(size as u32, skilled)
    }

    /// Skill rolls are always skilled
    pub fn skill_pool(&self, skill: &Skill, attribute: Attribute) -> DicePool {
        let size = (self.total(attribute) + self.skill_total(skill) + self.pool_modifier()).max(MIN_ROLL_POOL);
        DicePool::skilled(size as u32)
    }

    pub fn roll_attribute<R: Rng + ?Sized>(
        &self,
        attribute: Attribute,
        skilled: bool,
        difficulty: Option<u32>,
        rng: &mut R,
    ) -> PoolRoll {
        self.attribute_pool(attribute, skilled).roll(rng, difficulty)
    }

    pub fn roll_skill<R: Rng + ?Sized>(
        &self,
        skill: &Skill,
        attribute: Attribute,
        difficulty: Option<u32>,
        rng: &mut R,
    ) -> PoolRoll {
        self.skill_pool(skill, attribute).roll(rng, difficulty)
    }

    pub fn roll_initiative<R: Rng + ?Sized>(&self, rng: &mut R) -> InitiativeBreakdown {
        initiative::roll_initiative(
            rng,
            self.total(Attribute::Coordination),
            self.total(Attribute::Guile),
            initiative::effects_bonus(self.effects.modifiers()),
            self.initiative_bonus,
        )
    }

    // === COMBAT ===

    pub fn weapon(&self, name: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.name == name)
    }

    /// Attack pool for a weapon: skill + governing attribute + pool modifiers
    pub fn weapon_pool(&self, weapon: &Weapon) -> DicePool {
        let skill = Skill::Combat(weapon.proficiency);
        let size = self.skill_total(&skill) + self.total(weapon.governing_attribute()) + self.pool_modifier();
        DicePool::skilled(size.max(0) as u32)
    }

    /// Fire a weapon at a target.
    ///
    /// The exertion cost and the round are spent before the roll.
    pub fn attack_with_roll(
        &mut self,
        weapon_name: &str,
        shot: ShotType,
        ctx: DifficultyContext,
        target_effects: &EffectSet,
        roller: impl FnOnce(&DicePool, u32) -> PoolRoll,
    ) -> Result<AttackReport, ActionRefusal> {
        self.check_action(ActionKind::Attack)?;
        let weapon = self
            .weapon(weapon_name)
            .ok_or_else(|| ActionRefusal::UnknownWeapon(weapon_name.to_string()))?;
        let profile = weapon.shot(shot).ok_or_else(|| ActionRefusal::ShotUnavailable {
            weapon: weapon.name.clone(),
            shot,
        })?;
        if !self.exertion.can_afford(profile.cost) {
            return Err(ActionRefusal::InsufficientExertion {
                have: self.exertion.value(),
                need: profile.cost,
            });
        }
        if weapon.ammunition.is_empty() {
            return Err(ActionRefusal::OutOfAmmunition(weapon.name.clone()));
        }
        let pool = self.weapon_pool(weapon);
        let difficulty = DifficultyBreakdown::for_target(ctx, target_effects);

        let remaining = self.exertion.spend(profile.cost);
        let mut ammunition_remaining = 0;
        if let Some(w) = self.weapons.iter_mut().find(|w| w.name == weapon_name) {
            w.ammunition.consume();
            ammunition_remaining = w.ammunition.current;
        }

        let roll = roller(&pool, difficulty.target());
        let hit = roll.outcome.successes as i32 >= difficulty.total;
        tracing::info!(
            attacker = %self.name,
            weapon = weapon_name,
            %shot,
            successes = roll.outcome.successes,
            difficulty = difficulty.total,
            hit,
            "attack resolved"
        );
        Ok(AttackReport {
            weapon: weapon_name.to_string(),
            shot,
            pool: pool.size,
            difficulty,
            roll,
            hit,
            exertion_spent: profile.cost,
            exertion_remaining: remaining,
            ammunition_remaining,
        })
    }

    pub fn attack<R: Rng + ?Sized>(
        &mut self,
        weapon_name: &str,
        shot: ShotType,
        ctx: DifficultyContext,
        target_effects: &EffectSet,
        rng: &mut R,
    ) -> Result<AttackReport, ActionRefusal> {
        self.attack_with_roll(weapon_name, shot, ctx, target_effects, |pool, difficulty| {
            pool.roll(rng, Some(difficulty))
        })
    }

    /// Damage of one hit: `damage_dice` d6
    pub fn roll_damage<R: Rng + ?Sized>(&self, weapon_name: &str, rng: &mut R) -> Option<u32> {
        self.weapon(weapon_name).map(|w| roll_sum(rng, w.damage_dice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::skills::{CombatSkill, SkillRanks};
    use crate::character::wounds::{WoundBox, WoundTier};
    use crate::combat::difficulty::{CoverBand, RangeBand};
    use crate::effects::Modifier;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rifleman(config: &RulesConfig) -> Character {
        let attrs = Attributes::new()
            .with(Attribute::Coordination, 3)
            .with(Attribute::Guile, 2)
            .with(Attribute::Guts, 3)
            .with(Attribute::Composure, 2);
        Character::new("Baker", ActorKind::PlayerCharacter, attrs, config)
            .with_skills(Skills::new().with(CombatSkill::Rifles, SkillRanks::primary(2)))
            .with_weapon(Weapon::new(
                "Rifle",
                CombatSkill::Rifles,
                3,
                2,
                &[ShotType::HipShot, ShotType::DeliberateFire],
            ))
    }

    #[test]
    fn test_new_character_has_full_exertion() {
        let config = RulesConfig::default();
        let c = rifleman(&config);
        assert_eq!(c.exertion.max(), 11);
        assert_eq!(c.exertion.value(), 11);
    }

    #[test]
    fn test_wound_penalty_reaches_pools() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        assert_eq!(c.attribute_pool(Attribute::Coordination, true).size, 3);

        c.apply_wound(WoundTier::Hurt, &config).unwrap();
        assert_eq!(c.pool_modifier(), -2);
        assert_eq!(c.attribute_pool(Attribute::Coordination, true).size, 1);
        // Never below one die
        assert_eq!(c.attribute_pool(Attribute::Might, true).size, 1);
    }

    #[test]
    fn test_morale_damage_halves_exertion() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.apply_morale_damage_with_roll("mortar", false, &config, |_| unreachable!())
            .unwrap();
        assert_eq!(c.morale.state, MoraleState::Suppressed);
        assert_eq!(c.exertion_multiplier(), 0.5);
        assert_eq!(c.exertion.max(), 5);
        assert_eq!(c.exertion.value(), 5);
    }

    #[test]
    fn test_recovery_restores_capacity_not_value() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.apply_morale_damage_with_roll("mortar", false, &config, |_| unreachable!())
            .unwrap();
        let result = c
            .attempt_recovery_with_roll(&config, |pool| pool.with_faces(vec![6; pool.size as usize], None))
            .unwrap();
        assert!(result.recovered);
        assert_eq!(c.exertion.max(), 11);
        assert_eq!(c.exertion.value(), 3);
        assert_eq!(result.exertion_remaining, 3);
    }

    #[test]
    fn test_pinned_cannot_move() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        for _ in 0..2 {
            c.apply_morale_damage_with_roll("mg", false, &config, |_| unreachable!())
                .unwrap();
        }
        assert_eq!(c.morale.state, MoraleState::Pinned);
        assert!(matches!(
            c.move_meters(1.0),
            Err(ActionRefusal::MoraleForbids { .. })
        ));
    }

    #[test]
    fn test_restricted_flag_blocks_movement() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.add_effect(
            EffectRecord::new(
                "Entangled",
                EffectOrigin::Template("Entangled".into()),
                vec![Modifier::set(keys::MOVEMENT_RESTRICTED, 1.0, 0)],
            ),
            &config,
        );
        assert_eq!(c.move_meters(1.0), Err(ActionRefusal::MovementRestricted));
    }

    #[test]
    fn test_prone_movement_costs_double() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        assert_eq!(c.movement_cost(2.5), 3);
        c.set_stance(Stance::Prone, &config);
        assert_eq!(c.stance(), Stance::Prone);
        assert_eq!(c.movement_cost(2.5), 6);
        assert_eq!(c.total(Attribute::Coordination), 2);

        let report = c.move_meters(2.0).unwrap();
        assert_eq!(report.cost, 4);

        c.set_stance(Stance::Standing, &config);
        assert_eq!(c.effects.count(|o| o.is_stance()), 0);
    }

    #[test]
    fn test_attack_spends_before_reporting() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        let target = EffectSet::new();
        let ctx = DifficultyContext::new(RangeBand::Medium, CoverBand::Light);

        let report = c
            .attack_with_roll("Rifle", ShotType::DeliberateFire, ctx, &target, |pool, d| {
                assert_eq!(d, 3);
                pool.with_faces(vec![1; pool.size as usize], Some(d))
            })
            .unwrap();
        assert!(!report.hit);
        assert_eq!(report.pool, 5);
        assert_eq!(report.exertion_remaining, 7);
        assert_eq!(c.exertion.value(), 7);
        assert_eq!(report.ammunition_remaining, 1);
    }

    #[test]
    fn test_attack_refusals() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        let target = EffectSet::new();
        let ctx = DifficultyContext::default();

        assert!(matches!(
            c.attack_with_roll("Rifle", ShotType::FullAuto, ctx, &target, |_, _| unreachable!()),
            Err(ActionRefusal::ShotUnavailable { .. })
        ));
        assert!(matches!(
            c.attack_with_roll("Bren", ShotType::HipShot, ctx, &target, |_, _| unreachable!()),
            Err(ActionRefusal::UnknownWeapon(_))
        ));

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        c.attack("Rifle", ShotType::HipShot, ctx, &target, &mut rng).unwrap();
        c.attack("Rifle", ShotType::HipShot, ctx, &target, &mut rng).unwrap();
        assert!(matches!(
            c.attack_with_roll("Rifle", ShotType::HipShot, ctx, &target, |_, _| unreachable!()),
            Err(ActionRefusal::OutOfAmmunition(_))
        ));
        assert_eq!(c.exertion.value(), 7);
    }

    #[test]
    fn test_shattered_cannot_attack() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.morale = MoraleTrack::new(MoraleState::Shattered);
        c.refresh(&config);
        let result = c.attack_with_roll(
            "Rifle",
            ShotType::HipShot,
            DifficultyContext::default(),
            &EffectSet::new(),
            |_, _| unreachable!(),
        );
        assert!(matches!(result, Err(ActionRefusal::MoraleForbids { .. })));
    }

    #[test]
    fn test_guts_loss_clears_gated_box() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.set_attribute(Attribute::Guts, 4, &config);
        c.apply_wound(WoundTier::Hurt, &config).unwrap();
        let mark = c.apply_wound(WoundTier::Hurt, &config).unwrap();
        assert_eq!(mark.marked, WoundBox::Hurt2);

        c.set_attribute(Attribute::Guts, 3, &config);
        assert!(!c.wounds.is_marked(WoundBox::Hurt2));
        assert_eq!(c.wounds.current_severity(), Some(WoundBox::Hurt1));
        assert!(c.wounds.check_invariants(c.capacity()).is_ok());
    }

    #[test]
    fn test_disabling_capacity_template_reports_every_change() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        let mut persisted = c.effects.clone();

        let grit = EffectRecord::new(
            "Grit",
            EffectOrigin::Template("Grit".into()),
            vec![Modifier::add(Attribute::Guts.key(), 2.0, 0)],
        );
        let grit_id = grit.id;
        let mut deltas = vec![c.add_effect(grit, &config)];
        deltas.push(c.apply_wound(WoundTier::Hurt, &config).unwrap().delta);
        let mark = c.apply_wound(WoundTier::Hurt, &config).unwrap();
        assert_eq!(mark.marked, WoundBox::Hurt2);
        deltas.push(mark.delta);

        let delta = c.set_effect_disabled(grit_id, true, &config).unwrap();
        assert!(!c.wounds.is_marked(WoundBox::Hurt2));
        assert_eq!(c.wounds.current_severity(), Some(WoundBox::Hurt1));
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.added.len(), 1);
        assert_eq!(delta.added[0].origin, EffectOrigin::Wound(WoundBox::Hurt1));
        assert_eq!(delta.modified.len(), 1);
        assert_eq!(delta.modified[0].id, grit_id);
        assert!(delta.modified[0].disabled);
        deltas.push(delta);

        // Replaying the deltas reproduces the live records
        for delta in deltas {
            for id in delta.removed {
                persisted.remove(id);
            }
            for record in delta.modified.into_iter().chain(delta.added) {
                persisted.remove(record.id);
                persisted.add(record);
            }
        }
        assert_eq!(persisted.len(), c.effects.len());
        for record in c.effects.iter() {
            assert_eq!(persisted.get(record.id), Some(record));
        }

        assert!(c.set_effect_disabled(EffectId::new(), true, &config).is_none());
    }

    #[test]
    fn test_loading_enforces_capacity() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.apply_wound(WoundTier::Critical, &config).unwrap();
        c.apply_wound(WoundTier::Critical, &config).unwrap();
        assert!(c.wounds.is_marked(WoundBox::Critical2));

        // Host edited guts down without refreshing
        c.attributes.set(Attribute::Guts, 1);
        let json = serde_json::to_string(&c).unwrap();

        let plain: Character = serde_json::from_str(&json).unwrap();
        assert!(!plain.wounds.is_marked(WoundBox::Critical2));
        assert!(plain.wounds.check_invariants(plain.capacity()).is_ok());

        let (loaded, delta) = Character::from_json(&json, &config).unwrap();
        assert_eq!(loaded.wounds.current_severity(), Some(WoundBox::Critical1));
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(delta.added[0].origin, EffectOrigin::Wound(WoundBox::Critical1));
        assert_eq!(loaded.effects.count(|o| o.is_wound()), 1);
        assert!(loaded.exertion.value() <= loaded.exertion.max());
    }

    #[test]
    fn test_timed_effect_expires() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        let mut flash = EffectTemplate::new(
            "Flashbang",
            vec![Modifier::add(keys::DICE_POOL, -2.0, 10)],
        );
        flash.rounds = Some(1);
        c.apply_template(&flash, &config);
        assert_eq!(c.pool_modifier(), -2);
        let delta = c.end_round(&config);
        assert_eq!(delta.removed.len(), 1);
        assert_eq!(c.pool_modifier(), 0);
    }

    #[test]
    fn test_initiative_uses_totals() {
        let config = RulesConfig::default();
        let mut c = rifleman(&config);
        c.initiative_bonus = 2;
        let init = c.roll_initiative(&mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(init.base, 5);
        assert_eq!(init.system_bonus, 2);
        assert_eq!(init.total, 7 + init.die as i32);
    }
}
