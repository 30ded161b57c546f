//! Battle script schema.

use std::collections::HashMap;

use serde::Deserialize;

use battle_engine::actions::BattleAction;
use battle_engine::combatant::CombatantConfig;
use battle_engine::data::{ItemData, MoveData, SpeciesData};
use battle_engine::state::{BattleFormat, BattleMode};

/// One self-contained battle: data tables, sides and scripted turns.
#[derive(Deserialize)]
pub struct BattleScript {
    /// Fixes the session RNG so replays are reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
    pub mode: BattleMode,
    #[serde(default)]
    pub format: BattleFormat,
    #[serde(default)]
    pub moves: Vec<MoveData>,
    #[serde(default)]
    pub items: Vec<ItemData>,
    pub species: Vec<SpeciesData>,
    #[serde(default)]
    pub type_chart: HashMap<String, HashMap<String, f32>>,
    pub trainer: SideScript,
    pub opponent: SideScript,
    /// Actions per turn. AI sides may be omitted from any turn.
    #[serde(default)]
    pub turns: Vec<Vec<TurnEntry>>,
}

#[derive(Deserialize)]
pub struct SideScript {
    pub id: i64,
    pub name: String,
    pub party: Vec<CombatantConfig>,
    #[serde(default)]
    pub ai: bool,
}

#[derive(Deserialize)]
pub struct TurnEntry {
    pub battler: i64,
    pub action: BattleAction,
}
