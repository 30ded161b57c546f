//! Injected descriptor tables: moves, type chart, items, species.
//!
//! The engine never ships game data of its own. Callers deserialize these
//! tables from JSON (or build them in code) and hand them to
//! [`crate::engine::BattleEngine`]. All tables are read-only once injected
//! and safe to share.

use std::collections::HashMap;

use serde::Deserialize;

/// Damage category of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

/// One move descriptor, looked up by id.
#[derive(Debug, Clone, Deserialize)]
pub struct MoveData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub move_type: String,
    pub category: MoveCategory,
    #[serde(default)]
    pub power: u16,
    /// `None` means the move never misses.
    #[serde(default)]
    pub accuracy: Option<u8>,
    pub pp: u8,
    #[serde(default)]
    pub priority: i8,
    /// Major status inflicted on the target ("psn", "tox", "brn", "par",
    /// "slp", "frz"), if any.
    #[serde(default)]
    pub ailment: Option<String>,
    /// Percent chance of inflicting `ailment`. Status-category moves with
    /// an ailment treat 0 as always.
    #[serde(default)]
    pub ailment_chance: u8,
}

/// Reserved move id submitted by the AI when every slot is out of PP.
pub const STRUGGLE: &str = "struggle";

fn struggle_descriptor() -> MoveData {
    MoveData {
        id: STRUGGLE.to_string(),
        name: "Struggle".to_string(),
        move_type: "normal".to_string(),
        category: MoveCategory::Physical,
        power: 50,
        accuracy: None,
        pp: 1,
        priority: 0,
        ailment: None,
        ailment_chance: 0,
    }
}

/// Move lookup table.
///
/// `struggle` is always resolvable, so the out-of-PP path can never dead-end
/// on a data gap.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct MovesDb {
    moves: HashMap<String, MoveData>,
}

impl MovesDb {
    pub fn new(moves: impl IntoIterator<Item = MoveData>) -> Self {
        let mut db = Self {
            moves: moves.into_iter().map(|m| (m.id.clone(), m)).collect(),
        };
        db.moves
            .entry(STRUGGLE.to_string())
            .or_insert_with(struggle_descriptor);
        db
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let moves: Vec<MoveData> = serde_json::from_str(json)?;
        Ok(Self::new(moves))
    }

    pub fn get_move(&self, move_id: &str) -> Option<&MoveData> {
        self.moves.get(move_id)
    }
}

/// Attacker-type x defender-type effectiveness chart.
///
/// Multipliers are typically 0, 0.5, 1 or 2; pairs missing from the chart
/// count as neutral.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct TypeChart {
    chart: HashMap<String, HashMap<String, f32>>,
}

impl TypeChart {
    pub fn new(chart: HashMap<String, HashMap<String, f32>>) -> Self {
        Self { chart }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Single-type multiplier, neutral when the pair is unknown.
    pub fn multiplier(&self, attacker_type: &str, defender_type: &str) -> f32 {
        self.chart
            .get(attacker_type)
            .and_then(|row| row.get(defender_type))
            .copied()
            .unwrap_or(1.0)
    }

    /// Product of multipliers over every type the defender has.
    pub fn effectiveness(&self, attacker_type: &str, defender_types: &[String]) -> f32 {
        defender_types
            .iter()
            .map(|t| self.multiplier(attacker_type, t))
            .product()
    }
}

/// Free-form effect record carried by an item descriptor. Every field is
/// optional; the held-item manager only reacts to the ones it knows.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemEffect {
    #[serde(default)]
    pub blocks_status_moves: bool,
    #[serde(default)]
    pub locks_move: bool,
    /// Move type required for `power_multiplier` to apply.
    #[serde(rename = "type", default)]
    pub boost_type: Option<String>,
    #[serde(default)]
    pub power_multiplier: Option<f64>,
    /// Stat a flat multiplier applies to: "attack", "sp_attack",
    /// "sp_defense" or "speed".
    #[serde(default)]
    pub stat: Option<String>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub prevents_ko: bool,
    #[serde(default)]
    pub requires_full_hp: bool,
    #[serde(default)]
    pub activation_chance: Option<f64>,
    #[serde(default)]
    pub one_time_use: bool,
    #[serde(default)]
    pub recoil_percent: Option<f64>,
    #[serde(default)]
    pub heal_percent: Option<f64>,
}

/// One held-item descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    /// When present, restricts focus-style survival to a specific window.
    /// The engine only honors `"before_damage"`.
    #[serde(default)]
    pub trigger: Option<String>,
    #[serde(default)]
    pub effect_data: ItemEffect,
}

/// Item lookup table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ItemsDb {
    items: HashMap<String, ItemData>,
}

impl ItemsDb {
    pub fn new(items: impl IntoIterator<Item = ItemData>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.id.clone(), i)).collect(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let items: Vec<ItemData> = serde_json::from_str(json)?;
        Ok(Self::new(items))
    }

    pub fn get_item(&self, item_id: &str) -> Option<&ItemData> {
        self.items.get(item_id)
    }
}

/// Base stat spread of a species.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BaseStats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

/// One species descriptor, looked up by dex number.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesData {
    pub dex: u32,
    pub name: String,
    pub types: Vec<String>,
    pub base_stats: BaseStats,
    #[serde(default)]
    pub abilities: Vec<String>,
}

/// Species lookup table.
#[derive(Debug, Clone, Default)]
pub struct SpeciesDb {
    by_dex: HashMap<u32, SpeciesData>,
}

impl SpeciesDb {
    pub fn new(species: impl IntoIterator<Item = SpeciesData>) -> Self {
        Self {
            by_dex: species.into_iter().map(|s| (s.dex, s)).collect(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let species: Vec<SpeciesData> = serde_json::from_str(json)?;
        Ok(Self::new(species))
    }

    pub fn get_species(&self, dex: u32) -> Option<&SpeciesData> {
        self.by_dex.get(&dex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struggle_is_always_present() {
        let db = MovesDb::new([]);
        let struggle = db.get_move(STRUGGLE).expect("struggle must resolve");
        assert_eq!(struggle.category, MoveCategory::Physical);
        assert_eq!(struggle.power, 50);
    }

    #[test]
    fn struggle_from_data_wins_over_builtin() {
        let custom = MoveData {
            power: 40,
            ..struggle_descriptor()
        };
        let db = MovesDb::new([custom]);
        assert_eq!(db.get_move(STRUGGLE).unwrap().power, 40);
    }

    #[test]
    fn chart_defaults_to_neutral() {
        let chart = TypeChart::default();
        assert_eq!(chart.multiplier("fire", "water"), 1.0);
    }

    #[test]
    fn effectiveness_is_a_product_over_defender_types() {
        let json = r#"{"rock": {"fire": 2.0, "flying": 2.0, "ground": 0.5}}"#;
        let chart = TypeChart::from_json(json).unwrap();
        let fire_flying = vec!["fire".to_string(), "flying".to_string()];
        assert_eq!(chart.effectiveness("rock", &fire_flying), 4.0);
        let ground = vec!["ground".to_string()];
        assert_eq!(chart.effectiveness("rock", &ground), 0.5);
    }

    #[test]
    fn item_effect_fields_all_default() {
        let json = r#"[{"id": "plain_charm", "name": "Plain Charm"}]"#;
        let db = ItemsDb::from_json(json).unwrap();
        let item = db.get_item("plain_charm").unwrap();
        assert!(!item.effect_data.locks_move);
        assert!(item.effect_data.power_multiplier.is_none());
    }

    #[test]
    fn move_deserializes_with_sparse_fields() {
        let json = r#"[{"id": "tackle", "name": "Tackle", "type": "normal",
                        "category": "physical", "power": 40, "pp": 35}]"#;
        let db = MovesDb::from_json(json).unwrap();
        let tackle = db.get_move("tackle").unwrap();
        assert_eq!(tackle.priority, 0);
        assert!(tackle.accuracy.is_none());
        assert!(tackle.ailment.is_none());
    }
}
