use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;

use battle_engine::combatant::Combatant;
use battle_engine::data::{ItemsDb, MovesDb, SpeciesDb, TypeChart};
use battle_engine::engine::{BattleEngine, StartOptions};
use battle_engine::state::Phase;

use crate::models::{BattleScript, SideScript};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the battle script JSON
    pub script: PathBuf,

    /// Use the degraded flat-damage subsystems instead of the standard ones
    #[arg(long)]
    pub flat: bool,

    /// Print the cumulative battle log at the end
    #[arg(long)]
    pub full_log: bool,
}

fn build_party(
    side: &SideScript,
    species: &SpeciesDb,
    moves: &MovesDb,
) -> Result<Vec<Combatant>, Box<dyn Error>> {
    let mut party = Vec::with_capacity(side.party.len());
    for config in &side.party {
        party.push(config.build(species, moves)?);
    }
    Ok(party)
}

pub fn execute(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let text = fs::read_to_string(&args.script)?;
    let script: BattleScript = serde_json::from_str(&text)?;

    let moves = MovesDb::new(script.moves.clone());
    let chart = TypeChart::new(script.type_chart.clone());
    let species = SpeciesDb::new(script.species.clone());
    let items = ItemsDb::new(script.items.clone());

    let trainer_party = build_party(&script.trainer, &species, &moves)?;
    let opponent_party = build_party(&script.opponent, &species, &moves)?;

    let mut engine = if args.flat {
        BattleEngine::new(moves, chart, species, items)
    } else {
        BattleEngine::standard(moves, chart, species, items)
    };

    let mut opts = StartOptions::new(
        script.trainer.id,
        script.trainer.name.clone(),
        trainer_party,
        opponent_party,
        script.mode,
    )
    .format(script.format);
    opts.opponent_id = Some(script.opponent.id);
    opts.opponent_name = Some(script.opponent.name.clone());
    opts.opponent_is_ai = script.opponent.ai;
    opts.seed = script.seed;

    let id = engine.start_battle(opts)?;
    {
        let battle = engine.get(id).expect("battle was just started");
        println!("=== {} vs {} ===", battle.trainer.name, battle.opponent.name);
        for msg in &battle.entry_messages {
            println!("  {msg}");
        }
    }

    for (turn_index, entries) in script.turns.iter().enumerate() {
        if engine.get(id).map(|b| b.is_over).unwrap_or(true) {
            break;
        }

        for entry in entries {
            // A scripted switch doubles as the answer to a forced-switch
            // prompt.
            let forced = engine
                .get(id)
                .map(|b| {
                    b.phase == Phase::ForcedSwitch
                        && b.forced_switch_battler_id == Some(entry.battler)
                })
                .unwrap_or(false);
            if forced {
                if let battle_engine::BattleAction::Switch { slot } = &entry.action {
                    match engine.force_switch(id, entry.battler, *slot) {
                        Ok(messages) => {
                            for msg in messages {
                                println!("  {msg}");
                            }
                        }
                        Err(err) => eprintln!("turn {}: {err}", turn_index + 1),
                    }
                    continue;
                }
            }
            if let Err(err) = engine.register_action(id, entry.battler, entry.action.clone()) {
                eprintln!("turn {}: {err}", turn_index + 1);
            }
        }

        let report = engine.process_turn(id)?;
        println!("--- Turn {} ---", report.turn_number);
        for msg in &report.switch_messages {
            println!("  {msg}");
        }
        for msg in &report.messages {
            println!("  {msg}");
        }
        if report.is_over {
            break;
        }
    }

    let battle = engine.end_battle(id).expect("battle still registered");
    println!("=== Result ===");
    match (battle.is_over, battle.fled, battle.winner) {
        (_, true, _) => println!("Fled from battle."),
        (true, _, Some(winner)) => println!("Winner: {winner:?}"),
        _ => println!("Battle unresolved after scripted turns (phase {:?}).", battle.phase),
    }
    for side in [&battle.trainer, &battle.opponent] {
        for combatant in &side.party {
            println!(
                "  {} {}: {}/{} HP",
                side.name,
                combatant.species_name,
                combatant.current_hp,
                combatant.max_hp()
            );
        }
    }
    if args.full_log {
        println!("=== Full log ===");
        for msg in &battle.log {
            println!("  {msg}");
        }
    }

    Ok(())
}
