//! Morale state machine
//!
//! Four states ordered by severity. Damage and recovery each move at most
//! one step. Player characters may resist damage and attempt recovery with a
//! skilled pool of guts + composure; everyone else takes damage in full.
//!
//! Rolls are injected as a closure so callers (and tests) decide where the
//! faces come from.

use derive_more::Display;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::exertion::ExertionPool;
use crate::core::config::RulesConfig;
use crate::core::types::ActorKind;
use crate::dice::{DicePool, PoolRoll};
use crate::effects::modifier::keys;
use crate::effects::{EffectDelta, EffectOrigin, EffectRecord, EffectSet, Modifier};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default, Display,
)]
pub enum MoraleState {
    #[default]
    Undaunted,
    Suppressed,
    Pinned,
    Shattered,
}

/// What a morale state means at the table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoraleProfile {
    pub exertion_multiplier: f64,
    pub can_move: bool,
    /// False means self-preservation actions only
    pub can_act: bool,
    pub effects: &'static [&'static str],
}

/// Broad kinds of action, for morale gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum ActionKind {
    Move,
    Attack,
    Recovery,
    #[display(fmt = "Self-preservation")]
    SelfPreservation,
    Other,
}

impl MoraleState {
    pub fn profile(&self) -> MoraleProfile {
        match self {
            MoraleState::Undaunted => MoraleProfile {
                exertion_multiplier: 1.0,
                can_move: true,
                can_act: true,
                effects: &[],
            },
            MoraleState::Suppressed => MoraleProfile {
                exertion_multiplier: 0.5,
                can_move: true,
                can_act: true,
                effects: &["Halved Exertion"],
            },
            MoraleState::Pinned => MoraleProfile {
                exertion_multiplier: 0.5,
                can_move: false,
                can_act: true,
                effects: &["Halved Exertion", "Cannot Move"],
            },
            MoraleState::Shattered => MoraleProfile {
                exertion_multiplier: 0.25,
                can_move: true,
                can_act: false,
                effects: &["Self-preservation only"],
            },
        }
    }

    /// One step toward Shattered
    pub fn worse(&self) -> Option<MoraleState> {
        match self {
            MoraleState::Undaunted => Some(MoraleState::Suppressed),
            MoraleState::Suppressed => Some(MoraleState::Pinned),
            MoraleState::Pinned => Some(MoraleState::Shattered),
            MoraleState::Shattered => None,
        }
    }

    /// One step toward Undaunted
    pub fn better(&self) -> Option<MoraleState> {
        match self {
            MoraleState::Undaunted => None,
            MoraleState::Suppressed => Some(MoraleState::Undaunted),
            MoraleState::Pinned => Some(MoraleState::Suppressed),
            MoraleState::Shattered => Some(MoraleState::Pinned),
        }
    }

    pub fn permits(&self, action: ActionKind) -> bool {
        let profile = self.profile();
        match action {
            ActionKind::Move => profile.can_move,
            ActionKind::Attack | ActionKind::Other => profile.can_act,
            ActionKind::Recovery | ActionKind::SelfPreservation => true,
        }
    }

    /// Modifiers carried by this state's record. Empty for Undaunted.
    pub fn modifiers(&self, priority: i32) -> Vec<Modifier> {
        let mut mods = Vec::new();
        if *self == MoraleState::Undaunted {
            return mods;
        }
        mods.push(Modifier::multiply(
            keys::EXERTION_MULTIPLIER,
            self.profile().exertion_multiplier,
            priority,
        ));
        if *self == MoraleState::Pinned {
            mods.push(Modifier::set(keys::MOVEMENT_RESTRICTED, 1.0, priority));
        }
        mods
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResistFlags {
    pub attempted: bool,
    pub succeeded: bool,
}

/// Per-character morale bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MoraleTrack {
    pub state: MoraleState,
    pub turn_recovery_used: bool,
    pub resist: ResistFlags,
    pub last_source: Option<String>,
}

/// What the rolls are made from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleInputs {
    pub actor: ActorKind,
    pub guts: i32,
    pub composure: i32,
}

impl MoraleInputs {
    pub fn pool(&self) -> DicePool {
        DicePool::skilled((self.guts + self.composure).max(0) as u32)
    }
}

/// A morale operation that was not attempted. Nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoraleRefusal {
    #[error("already at maximum morale damage")]
    AlreadyShattered,
    #[error("already undaunted")]
    AlreadyUndaunted,
    #[error("{0:?} characters cannot attempt morale recovery")]
    IneligibleActor(ActorKind),
    #[error("recovery needs {need} exertion, have {have}")]
    InsufficientExertion { have: u32, need: u32 },
    #[error("recovery already attempted this turn")]
    RecoveryUsed,
}

impl MoraleRefusal {
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleDamage {
    pub resisted: bool,
    pub from: MoraleState,
    pub to: MoraleState,
    /// None when no resistance roll was made
    pub roll: Option<PoolRoll>,
    pub delta: EffectDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoraleRecovery {
    pub recovered: bool,
    pub from: MoraleState,
    pub to: MoraleState,
    pub roll: Option<PoolRoll>,
    pub exertion_spent: u32,
    pub exertion_remaining: u32,
    pub delta: EffectDelta,
}

/// Roll `pool` through `roller` unless it has no dice.
///
/// Returns the roll (if any) and whether it reached the threshold.
fn roll_morale(
    pool: DicePool,
    threshold: u32,
    roller: impl FnOnce(&DicePool) -> PoolRoll,
) -> (Option<PoolRoll>, bool) {
    if pool.size == 0 {
        return (None, false);
    }
    let roll = roller(&pool);
    let passed = roll.outcome.meets(threshold);
    (Some(roll), passed)
}

impl MoraleTrack {
    pub fn new(state: MoraleState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Make the morale record match the state.
    ///
    /// Leaves a record that already matches untouched.
    pub fn sync_effects(&self, effects: &mut EffectSet, config: &RulesConfig) -> EffectDelta {
        let existing = effects.count(|o| o.is_morale());
        let matching = effects.count(|o| *o == EffectOrigin::Morale(self.state));
        let wanted = usize::from(self.state != MoraleState::Undaunted);
        if existing == wanted && matching == wanted {
            return EffectDelta::default();
        }

        let mut delta = effects.remove_where(|o| o.is_morale());
        if self.state != MoraleState::Undaunted {
            let record = EffectRecord::new(
                format!("Morale: {}", self.state),
                EffectOrigin::Morale(self.state),
                self.state.modifiers(config.morale_priority),
            );
            delta.merge(effects.add(record));
        }
        delta
    }

    fn transition(&mut self, to: MoraleState, effects: &mut EffectSet, config: &RulesConfig) -> EffectDelta {
        tracing::info!(from = %self.state, to = %to, "morale changed");
        self.state = to;
        self.sync_effects(effects, config)
    }

    /// Take one step of morale damage, resisting if allowed.
    ///
    /// The caller must recompute exertion afterwards when the state changed.
    pub fn apply_damage_with_roll(
        &mut self,
        source: &str,
        resistible: bool,
        inputs: MoraleInputs,
        effects: &mut EffectSet,
        config: &RulesConfig,
        roller: impl FnOnce(&DicePool) -> PoolRoll,
    ) -> Result<MoraleDamage, MoraleRefusal> {
        let from = self.state;
        let Some(next) = from.worse() else {
            return Err(MoraleRefusal::AlreadyShattered);
        };
        self.last_source = Some(source.to_string());

        let mut roll = None;
        if resistible && inputs.actor.can_resist_morale() {
            let (made, passed) = roll_morale(inputs.pool(), config.morale_threshold, roller);
            roll = made;
            self.resist = ResistFlags {
                attempted: true,
                succeeded: passed,
            };
            if passed {
                tracing::info!(source, state = %from, "morale damage resisted");
                return Ok(MoraleDamage {
                    resisted: true,
                    from,
                    to: from,
                    roll,
                    delta: EffectDelta::default(),
                });
            }
        }

        let delta = self.transition(next, effects, config);
        Ok(MoraleDamage {
            resisted: false,
            from,
            to: next,
            roll,
            delta,
        })
    }

    pub fn apply_damage<R: Rng + ?Sized>(
        &mut self,
        source: &str,
        resistible: bool,
        inputs: MoraleInputs,
        effects: &mut EffectSet,
        config: &RulesConfig,
        rng: &mut R,
    ) -> Result<MoraleDamage, MoraleRefusal> {
        self.apply_damage_with_roll(source, resistible, inputs, effects, config, |pool| {
            pool.roll(rng, None)
        })
    }

    /// Spend the recovery cost, then roll to improve one step.
    ///
    /// The cost is paid before the roll and is not refunded on failure.
    /// The caller must recompute exertion afterwards when the state changed.
    pub fn attempt_recovery_with_roll(
        &mut self,
        inputs: MoraleInputs,
        exertion: &mut ExertionPool,
        effects: &mut EffectSet,
        config: &RulesConfig,
        roller: impl FnOnce(&DicePool) -> PoolRoll,
    ) -> Result<MoraleRecovery, MoraleRefusal> {
        if !inputs.actor.can_resist_morale() {
            return Err(MoraleRefusal::IneligibleActor(inputs.actor));
        }
        let from = self.state;
        let Some(better) = from.better() else {
            return Err(MoraleRefusal::AlreadyUndaunted);
        };
        if !exertion.can_afford(config.recovery_cost) {
            return Err(MoraleRefusal::InsufficientExertion {
                have: exertion.value(),
                need: config.recovery_cost,
            });
        }
        if self.turn_recovery_used {
            return Err(MoraleRefusal::RecoveryUsed);
        }

        let remaining = exertion.spend(config.recovery_cost);
        self.turn_recovery_used = true;

        let (roll, passed) = roll_morale(inputs.pool(), config.morale_threshold, roller);
        let (to, delta) = if passed {
            (better, self.transition(better, effects, config))
        } else {
            tracing::info!(state = %from, "morale recovery failed");
            (from, EffectDelta::default())
        };

        Ok(MoraleRecovery {
            recovered: passed,
            from,
            to,
            roll,
            exertion_spent: config.recovery_cost,
            exertion_remaining: remaining,
            delta,
        })
    }

    pub fn attempt_recovery<R: Rng + ?Sized>(
        &mut self,
        inputs: MoraleInputs,
        exertion: &mut ExertionPool,
        effects: &mut EffectSet,
        config: &RulesConfig,
        rng: &mut R,
    ) -> Result<MoraleRecovery, MoraleRefusal> {
        self.attempt_recovery_with_roll(inputs, exertion, effects, config, |pool| {
            pool.roll(rng, None)
        })
    }

    /// Start of the owner's turn
    pub fn reset_turn_flags(&mut self) {
        self.turn_recovery_used = false;
        self.resist = ResistFlags::default();
    }
}
