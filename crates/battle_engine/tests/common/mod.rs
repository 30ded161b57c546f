//! Shared fixtures for the integration tests: small descriptor tables and
//! party builders.

use battle_engine::combatant::{Combatant, Stats};
use battle_engine::data::{
    ItemData, ItemEffect, ItemsDb, MoveCategory, MoveData, MovesDb, SpeciesDb, TypeChart,
};
use battle_engine::engine::BattleEngine;

pub fn move_data(
    id: &str,
    name: &str,
    move_type: &str,
    category: MoveCategory,
    power: u16,
    priority: i8,
) -> MoveData {
    MoveData {
        id: id.to_string(),
        name: name.to_string(),
        move_type: move_type.to_string(),
        category,
        power,
        // None = never misses; keeps scripted turns deterministic.
        accuracy: None,
        pp: 20,
        priority,
        ailment: None,
        ailment_chance: 0,
    }
}

pub fn moves_db() -> MovesDb {
    MovesDb::new([
        move_data("tackle", "Tackle", "normal", MoveCategory::Physical, 40, 0),
        move_data("quick_jab", "Quick Jab", "normal", MoveCategory::Physical, 40, 1),
        move_data("ember", "Ember", "fire", MoveCategory::Special, 40, 0),
        move_data("howl", "Howl", "normal", MoveCategory::Status, 0, 0),
        MoveData {
            ailment: Some("tox".to_string()),
            ..move_data("toxin", "Toxin", "poison", MoveCategory::Status, 0, 0)
        },
    ])
}

pub fn type_chart() -> TypeChart {
    TypeChart::from_json(
        r#"{
            "rock": {"fire": 2.0, "flying": 2.0, "steel": 0.5, "ground": 0.5},
            "fire": {"grass": 2.0, "water": 0.5, "fire": 0.5},
            "water": {"fire": 2.0, "grass": 0.5},
            "normal": {"ghost": 0.0, "rock": 0.5}
        }"#,
    )
    .unwrap()
}

pub fn items_db() -> ItemsDb {
    ItemsDb::new([
        ItemData {
            id: "power_band".to_string(),
            name: "Power Band".to_string(),
            category: Some("held".to_string()),
            trigger: None,
            effect_data: ItemEffect {
                locks_move: true,
                stat: Some("attack".to_string()),
                multiplier: Some(1.5),
                ..Default::default()
            },
        },
        ItemData {
            id: "focus_ribbon".to_string(),
            name: "Focus Ribbon".to_string(),
            category: Some("held".to_string()),
            trigger: Some("before_damage".to_string()),
            effect_data: ItemEffect {
                requires_full_hp: true,
                one_time_use: true,
                ..Default::default()
            },
        },
        ItemData {
            id: "vigor_orb".to_string(),
            name: "Vigor Orb".to_string(),
            category: Some("held".to_string()),
            trigger: None,
            effect_data: ItemEffect {
                power_multiplier: Some(1.0),
                recoil_percent: Some(10.0),
                ..Default::default()
            },
        },
        ItemData {
            id: "herb_band".to_string(),
            name: "Herb Band".to_string(),
            category: Some("held".to_string()),
            trigger: None,
            effect_data: ItemEffect {
                heal_percent: Some(6.25),
                ..Default::default()
            },
        },
        ItemData {
            id: "swift_scarf".to_string(),
            name: "Swift Scarf".to_string(),
            category: Some("held".to_string()),
            trigger: None,
            effect_data: ItemEffect {
                stat: Some("speed".to_string()),
                multiplier: Some(1.5),
                ..Default::default()
            },
        },
    ])
}

/// Engine with the degraded subsystems: flat 10 damage keeps HP math in
/// tests trivial.
pub fn flat_engine() -> BattleEngine {
    BattleEngine::new(moves_db(), type_chart(), SpeciesDb::default(), items_db())
}

/// Engine with the built-in full-fidelity subsystems.
pub fn standard_engine() -> BattleEngine {
    BattleEngine::standard(moves_db(), type_chart(), SpeciesDb::default(), items_db())
}

/// Normal-type combatant knowing Tackle and Quick Jab.
pub fn fighter(name: &str, hp: u16, speed: u16) -> Combatant {
    Combatant::new(
        name,
        50,
        Stats {
            hp,
            attack: 60,
            defense: 60,
            sp_attack: 60,
            sp_defense: 60,
            speed,
        },
    )
    .with_types(&["normal"])
    .with_move("tackle", 20)
    .with_move("quick_jab", 20)
}

pub fn move_action(move_id: &str) -> battle_engine::BattleAction {
    battle_engine::BattleAction::Move {
        move_id: move_id.to_string(),
        target: 0,
        mega_evolve: false,
    }
}
