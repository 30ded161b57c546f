//! In-battle combatant model.
//!
//! A [`Combatant`] carries both identity (species, level, stats, typing)
//! and runtime battle state (HP, PP, status, stat stages, held-item
//! bookkeeping). The engine mutates combatants in place; whoever started
//! the battle reclaims them from the returned state when it ends.

use std::collections::HashSet;

use serde::Deserialize;

use crate::data::{MovesDb, SpeciesDb};
use crate::error::BattleError;
use crate::natures;

/// Boostable stat identifiers. `Attack`..`Speed` index [`Stats`];
/// `Accuracy`/`Evasion` only exist as stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
    Accuracy,
    Evasion,
}

/// Final calculated stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Stats {
    pub hp: u16,
    pub attack: u16,
    pub defense: u16,
    pub sp_attack: u16,
    pub sp_defense: u16,
    pub speed: u16,
}

/// Stat stages, each clamped to [-6, +6].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatStages([i8; 7]);

impl StatStages {
    pub fn get(&self, stat: Stat) -> i8 {
        self.0[stat as usize]
    }

    pub fn set(&mut self, stat: Stat, stage: i8) {
        self.0[stat as usize] = stage.clamp(-6, 6);
    }

    /// Shift a stage by `delta`, clamping. Returns the stage actually applied.
    pub fn shift(&mut self, stat: Stat, delta: i8) -> i8 {
        let next = (self.get(stat) + delta).clamp(-6, 6);
        self.0[stat as usize] = next;
        next
    }
}

bitflags::bitflags! {
    /// Volatile conditions. Cleared when the holder leaves the field.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Volatiles: u8 {
        const CONFUSION = 1 << 0;
        const FLINCH    = 1 << 1;
        const ENDURE    = 1 << 2;
        const PROTECT   = 1 << 3;
    }
}

/// Major status conditions. Only one can be active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StatusCondition {
    #[serde(rename = "psn")]
    Poisoned,
    #[serde(rename = "tox")]
    BadlyPoisoned,
    #[serde(rename = "brn")]
    Burned,
    #[serde(rename = "par")]
    Paralyzed,
    #[serde(rename = "slp")]
    Asleep,
    #[serde(rename = "frz")]
    Frozen,
}

impl StatusCondition {
    /// Parse the short wire code used by move and hazard data.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "psn" => Some(Self::Poisoned),
            "tox" => Some(Self::BadlyPoisoned),
            "brn" => Some(Self::Burned),
            "par" => Some(Self::Paralyzed),
            "slp" => Some(Self::Asleep),
            "frz" => Some(Self::Frozen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Genderless,
}

/// One learned move with its PP pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSlot {
    pub move_id: String,
    pub pp: u8,
    pub max_pp: u8,
}

#[derive(Debug, Clone)]
pub struct Combatant {
    // Identity
    pub species_name: String,
    pub level: u8,
    pub stats: Stats,
    /// Ordered type list, one or two entries, lowercase.
    pub types: Vec<String>,
    pub ability: Option<String>,
    pub nature: String,
    pub gender: Gender,
    pub shiny: bool,
    pub moves: Vec<MoveSlot>,

    // Runtime state
    pub current_hp: u16,
    pub status: Option<StatusCondition>,
    /// Sleep turns remaining, or the badly-poisoned turn counter.
    pub status_turns: u8,
    pub volatiles: Volatiles,
    pub stat_stages: StatStages,
    pub consumed_items: HashSet<String>,
    pub choice_locked_move: Option<String>,
    pub held_item: Option<String>,
}

impl Combatant {
    /// Build a battle-ready combatant at full HP with no moves.
    pub fn new(species_name: impl Into<String>, level: u8, stats: Stats) -> Self {
        Self {
            species_name: species_name.into(),
            level,
            stats,
            types: Vec::new(),
            ability: None,
            nature: "hardy".to_string(),
            gender: Gender::Genderless,
            shiny: false,
            moves: Vec::new(),
            current_hp: stats.hp,
            status: None,
            status_turns: 0,
            volatiles: Volatiles::empty(),
            stat_stages: StatStages::default(),
            consumed_items: HashSet::new(),
            choice_locked_move: None,
            held_item: None,
        }
    }

    pub fn with_types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|t| t.to_ascii_lowercase()).collect();
        self
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    pub fn with_item(mut self, item_id: impl Into<String>) -> Self {
        self.held_item = Some(item_id.into());
        self
    }

    pub fn with_move(mut self, move_id: impl Into<String>, pp: u8) -> Self {
        if self.moves.len() < 4 {
            self.moves.push(MoveSlot {
                move_id: move_id.into(),
                pp,
                max_pp: pp,
            });
        }
        self
    }

    pub fn max_hp(&self) -> u16 {
        self.stats.hp
    }

    /// A combatant can fight while it has HP left.
    pub fn is_usable(&self) -> bool {
        self.current_hp > 0
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }

    pub fn apply_damage(&mut self, damage: u16) {
        self.current_hp = self.current_hp.saturating_sub(damage);
    }

    pub fn heal(&mut self, amount: u16) {
        self.current_hp = (self.current_hp + amount).min(self.max_hp());
    }

    /// Raw (unstaged) value of a boostable stat.
    pub fn stat(&self, stat: Stat) -> u16 {
        match stat {
            Stat::Attack => self.stats.attack,
            Stat::Defense => self.stats.defense,
            Stat::SpAttack => self.stats.sp_attack,
            Stat::SpDefense => self.stats.sp_defense,
            Stat::Speed => self.stats.speed,
            Stat::Accuracy | Stat::Evasion => 0,
        }
    }

    /// Spend one PP on the matching slot, flooring at zero.
    pub fn deduct_pp(&mut self, move_id: &str) {
        if let Some(slot) = self.moves.iter_mut().find(|m| m.move_id == move_id) {
            slot.pp = slot.pp.saturating_sub(1);
        }
    }

    /// Field-exit cleanup: volatiles, stages and the choice lock all reset.
    pub fn reset_on_switch_out(&mut self) {
        self.volatiles = Volatiles::empty();
        self.stat_stages = StatStages::default();
        self.choice_locked_move = None;
    }
}

/// Blueprint for building a [`Combatant`] from species data.
///
/// Stats use the standard growth formula with a fixed perfect-IV, zero-EV
/// spread; PP pools come from the moves table.
#[derive(Debug, Clone, Deserialize)]
pub struct CombatantConfig {
    pub dex: u32,
    #[serde(default = "default_level")]
    pub level: u8,
    #[serde(default = "default_nature")]
    pub nature: String,
    #[serde(default)]
    pub ability: Option<String>,
    #[serde(default)]
    pub held_item: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub shiny: bool,
    #[serde(default)]
    pub moves: Vec<String>,
}

fn default_level() -> u8 {
    50
}

fn default_nature() -> String {
    "hardy".to_string()
}

impl CombatantConfig {
    pub fn new(dex: u32, level: u8) -> Self {
        Self {
            dex,
            level: level.clamp(1, 100),
            nature: default_nature(),
            ability: None,
            held_item: None,
            gender: Gender::Genderless,
            shiny: false,
            moves: Vec::new(),
        }
    }

    pub fn nature(mut self, nature: impl Into<String>) -> Self {
        self.nature = nature.into();
        self
    }

    pub fn ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = Some(ability.into());
        self
    }

    pub fn held_item(mut self, item_id: impl Into<String>) -> Self {
        self.held_item = Some(item_id.into());
        self
    }

    pub fn moves(mut self, move_ids: &[&str]) -> Self {
        self.moves = move_ids.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn build(&self, species_db: &SpeciesDb, moves_db: &MovesDb) -> Result<Combatant, BattleError> {
        let species = species_db
            .get_species(self.dex)
            .ok_or_else(|| BattleError::MissingData(format!("species #{}", self.dex)))?;

        let nature = natures::lookup(&self.nature);
        let level = self.level.clamp(1, 100) as u32;
        let base = species.base_stats;
        let stats = Stats {
            hp: hp_stat(base.hp, level),
            attack: other_stat(base.attack, level, nature.stat_modifier(Stat::Attack)),
            defense: other_stat(base.defense, level, nature.stat_modifier(Stat::Defense)),
            sp_attack: other_stat(base.sp_attack, level, nature.stat_modifier(Stat::SpAttack)),
            sp_defense: other_stat(base.sp_defense, level, nature.stat_modifier(Stat::SpDefense)),
            speed: other_stat(base.speed, level, nature.stat_modifier(Stat::Speed)),
        };

        let mut moves = Vec::with_capacity(self.moves.len().min(4));
        for move_id in self.moves.iter().take(4) {
            let data = moves_db
                .get_move(move_id)
                .ok_or_else(|| BattleError::MissingData(format!("move '{move_id}'")))?;
            moves.push(MoveSlot {
                move_id: move_id.clone(),
                pp: data.pp,
                max_pp: data.pp,
            });
        }

        let ability = self
            .ability
            .clone()
            .or_else(|| species.abilities.first().cloned());

        Ok(Combatant {
            species_name: species.name.clone(),
            level: self.level,
            stats,
            types: species.types.iter().map(|t| t.to_ascii_lowercase()).collect(),
            ability,
            nature: self.nature.to_ascii_lowercase(),
            gender: self.gender,
            shiny: self.shiny,
            moves,
            current_hp: stats.hp,
            status: None,
            status_turns: 0,
            volatiles: Volatiles::empty(),
            stat_stages: StatStages::default(),
            consumed_items: HashSet::new(),
            choice_locked_move: None,
            held_item: self.held_item.clone(),
        })
    }
}

// HP: floor((2 * base + 31) * level / 100) + level + 10
fn hp_stat(base: u16, level: u32) -> u16 {
    ((2 * base as u32 + 31) * level / 100 + level + 10) as u16
}

// Others: (floor((2 * base + 31) * level / 100) + 5) * nature / 10
fn other_stat(base: u16, level: u32, nature_mod: u16) -> u16 {
    let raw = (2 * base as u32 + 31) * level / 100 + 5;
    (raw * nature_mod as u32 / 10) as u16
}
