//! Turn resolution throughput: one full start/register/resolve cycle.

use criterion::{criterion_group, criterion_main, Criterion};

use battle_engine::combatant::{Combatant, Stats};
use battle_engine::data::{ItemsDb, MoveCategory, MoveData, MovesDb, SpeciesDb, TypeChart};
use battle_engine::engine::BattleEngine;
use battle_engine::BattleAction;

fn moves_db() -> MovesDb {
    MovesDb::new([MoveData {
        id: "tackle".to_string(),
        name: "Tackle".to_string(),
        move_type: "normal".to_string(),
        category: MoveCategory::Physical,
        power: 40,
        accuracy: None,
        pp: 35,
        priority: 0,
        ailment: None,
        ailment_chance: 0,
    }])
}

fn fighter(name: &str, speed: u16) -> Combatant {
    Combatant::new(
        name,
        50,
        Stats {
            hp: 5000,
            attack: 80,
            defense: 80,
            sp_attack: 80,
            sp_defense: 80,
            speed,
        },
    )
    .with_types(&["normal"])
    .with_move("tackle", 35)
}

fn tackle() -> BattleAction {
    BattleAction::Move {
        move_id: "tackle".to_string(),
        target: 0,
        mega_evolve: false,
    }
}

fn bench_turn_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("turn_resolution");

    group.bench_function("flat_singles_turn", |b| {
        let mut engine = BattleEngine::new(
            moves_db(),
            TypeChart::default(),
            SpeciesDb::default(),
            ItemsDb::default(),
        );
        b.iter(|| {
            let id = engine
                .start_pvp_battle(
                    1,
                    "Mira",
                    vec![fighter("Alpha", 100)],
                    2,
                    "Orin",
                    vec![fighter("Beta", 90)],
                    Default::default(),
                )
                .unwrap();
            engine.register_action(id, 1, tackle()).unwrap();
            engine.register_action(id, 2, tackle()).unwrap();
            let report = engine.process_turn(id).unwrap();
            engine.end_battle(id);
            report.messages.len()
        });
    });

    group.bench_function("standard_singles_turn", |b| {
        let mut engine = BattleEngine::standard(
            moves_db(),
            TypeChart::default(),
            SpeciesDb::default(),
            ItemsDb::default(),
        );
        b.iter(|| {
            let id = engine
                .start_pvp_battle(
                    1,
                    "Mira",
                    vec![fighter("Alpha", 100)],
                    2,
                    "Orin",
                    vec![fighter("Beta", 90)],
                    Default::default(),
                )
                .unwrap();
            engine.register_action(id, 1, tackle()).unwrap();
            engine.register_action(id, 2, tackle()).unwrap();
            let report = engine.process_turn(id).unwrap();
            engine.end_battle(id);
            report.messages.len()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_turn_cycle);
criterion_main!(benches);
