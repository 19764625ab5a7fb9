//! Scripted Engagement
//!
//! Runs a short firefight between two characters through the roster and
//! prints every step. A host-side harness: it adds no rules of its own.

use std::path::PathBuf;

use clap::Parser;
use fireteam::character::{
    ActionKind, Attribute, Attributes, CombatSkill, HealTarget, MoraleState, Restore, SkillRanks, Skills,
    WoundTier,
};
use fireteam::combat::{CoverBand, DifficultyContext, RangeBand, ShotType, Stance, Weapon};
use fireteam::core::types::{ActorKind, CharacterId};
use fireteam::roster::{MemoryStore, Roster};
use fireteam::{Character, Result, RulesConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Scripted engagement between two characters
#[derive(Parser, Debug)]
#[command(name = "engagement")]
#[command(about = "Run a scripted firefight through the rules engine")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of rounds to play
    #[arg(long, default_value_t = 4)]
    rounds: u32,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Rules configuration (TOML). Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Event {
    Initiative { character: String, total: i32 },
    Attack { attacker: String, target: String, shot: ShotType, successes: u32, difficulty: i32, hit: bool },
    Refused { character: String, reason: String },
    Wound { character: String, damage: u32, wound: String },
    Morale { character: String, resisted: bool, state: String },
    Recovery { character: String, recovered: bool, state: String },
    Stance { character: String, stance: Stance },
}

#[derive(Serialize)]
struct RoundLog {
    round: u32,
    events: Vec<Event>,
}

#[derive(Serialize)]
struct Summary {
    seed: u64,
    rounds: Vec<RoundLog>,
    survivors: Vec<String>,
}

/// Damage total to wound tier
fn wound_for(damage: u32) -> WoundTier {
    match damage {
        0..=4 => WoundTier::Bruised,
        5..=7 => WoundTier::Grazed,
        8..=10 => WoundTier::Hurt,
        11..=13 => WoundTier::Injured,
        _ => WoundTier::Critical,
    }
}

fn squad(config: &RulesConfig) -> (Character, Character) {
    let baker = Character::new(
        "Baker",
        ActorKind::PlayerCharacter,
        Attributes::new()
            .with(Attribute::Coordination, 3)
            .with(Attribute::Guile, 2)
            .with(Attribute::Guts, 4)
            .with(Attribute::Composure, 2),
        config,
    )
    .with_skills(Skills::new().with(CombatSkill::Rifles, SkillRanks::primary(2)))
    .with_weapon(Weapon::new(
        "Rifle",
        CombatSkill::Rifles,
        3,
        10,
        &[ShotType::HipShot, ShotType::DeliberateFire],
    ));

    let kruger = Character::new(
        "Kruger",
        ActorKind::NonPlayer,
        Attributes::new()
            .with(Attribute::Might, 3)
            .with(Attribute::Coordination, 2)
            .with(Attribute::Guile, 1)
            .with(Attribute::Guts, 3),
        config,
    )
    .with_skills(Skills::new().with(CombatSkill::MachineGunner, SkillRanks::primary(2)))
    .with_weapon(Weapon::new(
        "MG",
        CombatSkill::MachineGunner,
        4,
        50,
        &[ShotType::ShortBurst, ShotType::FullAuto],
    ));

    (baker, kruger)
}

fn name_of(roster: &Roster, id: CharacterId) -> String {
    roster.get(id).map(|c| c.name.clone()).unwrap_or_default()
}

/// One character's turn: recover if shaken, then fire the best shot it can afford
fn take_turn(
    roster: &mut Roster,
    store: &mut MemoryStore,
    config: &RulesConfig,
    rng: &mut StdRng,
    shooter: CharacterId,
    target: CharacterId,
    events: &mut Vec<Event>,
) -> Result<()> {
    let shooter_name = name_of(roster, shooter);
    let target_name = name_of(roster, target);
    roster.update(shooter, store, |c| c.begin_turn())?;

    let state = roster.get(shooter)?.morale.state;
    if state >= MoraleState::Pinned {
        match roster.apply(shooter, store, |c| c.attempt_recovery(config, &mut *rng))? {
            Ok(result) => events.push(Event::Recovery {
                character: shooter_name.clone(),
                recovered: result.recovered,
                state: result.to.to_string(),
            }),
            Err(refusal) => events.push(Event::Refused {
                character: shooter_name.clone(),
                reason: refusal.reason(),
            }),
        }
    }

    if let Err(refusal) = roster.get(shooter)?.check_action(ActionKind::Attack) {
        events.push(Event::Refused {
            character: shooter_name,
            reason: refusal.reason(),
        });
        return Ok(());
    }

    let (weapon, shot) = {
        let c = roster.get(shooter)?;
        let Some(weapon) = c.weapons.first() else {
            return Ok(());
        };
        let mut shots: Vec<_> = ShotType::all()
            .iter()
            .filter_map(|s| weapon.shot(*s).map(|p| (*s, p.cost)))
            .filter(|(_, cost)| c.exertion.can_afford(*cost))
            .collect();
        shots.sort_by_key(|(_, cost)| *cost);
        match shots.last() {
            Some((shot, _)) => (weapon.name.clone(), *shot),
            None => {
                events.push(Event::Refused {
                    character: shooter_name,
                    reason: "not enough exertion to fire".into(),
                });
                return Ok(());
            }
        }
    };

    let target_effects = roster.get(target)?.effects.clone();
    let ctx = DifficultyContext::new(RangeBand::Medium, CoverBand::Light);
    let report = match roster.apply(shooter, store, |c| c.attack(&weapon, shot, ctx, &target_effects, &mut *rng))? {
        Ok(report) => report,
        Err(refusal) => {
            events.push(Event::Refused {
                character: shooter_name,
                reason: refusal.reason(),
            });
            return Ok(());
        }
    };
    events.push(Event::Attack {
        attacker: shooter_name.clone(),
        target: target_name.clone(),
        shot,
        successes: report.roll.outcome.successes,
        difficulty: report.difficulty.total,
        hit: report.hit,
    });

    // Every shot is suppressive, hit or not
    let morale = roster.apply(target, store, |c| c.apply_morale_damage(&shooter_name, true, config, &mut *rng))?;
    match morale {
        Ok(result) => events.push(Event::Morale {
            character: target_name.clone(),
            resisted: result.resisted,
            state: result.to.to_string(),
        }),
        Err(refusal) => events.push(Event::Refused {
            character: target_name.clone(),
            reason: refusal.reason(),
        }),
    }

    if report.hit {
        let damage = roster.get(shooter)?.roll_damage(&weapon, &mut *rng).unwrap_or(0);
        let tier = wound_for(damage);
        match roster.apply(target, store, |c| c.apply_wound(tier, config))? {
            Ok(mark) => events.push(Event::Wound {
                character: target_name.clone(),
                damage,
                wound: mark.marked.to_string(),
            }),
            Err(refusal) => events.push(Event::Refused {
                character: target_name.clone(),
                reason: refusal.reason(),
            }),
        }
        // Hit characters go to ground
        roster.update(target, store, |c| c.set_stance(Stance::Prone, config))?;
        events.push(Event::Stance {
            character: target_name,
            stance: Stance::Prone,
        });
    }
    Ok(())
}

fn print_text(summary: &Summary) {
    println!("=== Engagement (seed {}) ===", summary.seed);
    for round in &summary.rounds {
        println!("--- Round {} ---", round.round);
        for event in &round.events {
            match event {
                Event::Initiative { character, total } => println!("{} initiative {}", character, total),
                Event::Attack {
                    attacker,
                    target,
                    shot,
                    successes,
                    difficulty,
                    hit,
                } => println!(
                    "{} fires {} at {}: {} vs {} -> {}",
                    attacker,
                    shot,
                    target,
                    successes,
                    difficulty,
                    if *hit { "HIT" } else { "miss" }
                ),
                Event::Refused { character, reason } => println!("{} cannot act: {}", character, reason),
                Event::Wound { character, damage, wound } => {
                    println!("{} takes {} damage ({})", character, damage, wound)
                }
                Event::Morale {
                    character,
                    resisted,
                    state,
                } => println!(
                    "{} {} ({})",
                    character,
                    if *resisted { "holds firm" } else { "is rattled" },
                    state
                ),
                Event::Recovery {
                    character,
                    recovered,
                    state,
                } => println!(
                    "{} {} ({})",
                    character,
                    if *recovered { "steadies" } else { "fails to steady" },
                    state
                ),
                Event::Stance { character, stance } => println!("{} goes {}", character, stance),
            }
        }
    }
    println!("Survivors: {}", summary.survivors.join(", "));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fireteam=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .map_err(|e| fireteam::RulesError::Config(format!("{}: {}", path.display(), e)))?;
            RulesConfig::from_toml_str(&source)?
        }
        None => RulesConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let (baker, kruger) = squad(&config);
    let mut roster = Roster::new();
    let mut store = MemoryStore::new();
    let baker = roster.insert(baker);
    let kruger = roster.insert(kruger);

    let mut rounds = Vec::new();
    for round in 1..=args.rounds {
        let mut events = Vec::new();

        let mut order = Vec::new();
        for id in [baker, kruger] {
            let init = roster.get(id)?.roll_initiative(&mut rng);
            events.push(Event::Initiative {
                character: name_of(&roster, id),
                total: init.total,
            });
            order.push((init.total, id));
        }
        order.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, shooter) in &order {
            let target = if *shooter == baker { kruger } else { baker };
            if roster.get(*shooter)?.wounds.is_dead() || roster.get(target)?.wounds.is_dead() {
                continue;
            }
            take_turn(&mut roster, &mut store, &config, &mut rng, *shooter, target, &mut events)?;
        }

        for id in [baker, kruger] {
            roster.update(id, &mut store, |c| {
                c.end_round(&config);
                c.restore_exertion(Restore::Full);
            })?;
        }
        rounds.push(RoundLog { round, events });
    }

    // Medics reach the survivors
    for id in [baker, kruger] {
        roster.update(id, &mut store, |c| c.heal(HealTarget::All, &config))?;
    }

    let survivors = [baker, kruger]
        .iter()
        .filter_map(|id| roster.get(*id).ok())
        .filter(|c| !c.wounds.is_dead())
        .map(|c| c.name.clone())
        .collect();
    let summary = Summary { seed, rounds, survivors };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_text(&summary);
    }
    tracing::info!(commits = store.history().len(), "engagement finished");
    Ok(())
}
