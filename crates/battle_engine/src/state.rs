//! Battle session state.
//!
//! A [`BattleState`] is owned by the registry for its whole lifetime and
//! mutated only through [`crate::engine::BattleEngine`]. Hazard and screen
//! maps live on the [`Battler`] they affect, regardless of who placed them.

use std::collections::HashMap;
use std::fmt;

use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use uuid::Uuid;

use crate::actions::BattleAction;
use crate::combatant::Combatant;

/// Match mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    /// One untrained opponent, capturable, fleeable.
    Wild,
    /// Trainer versus NPC.
    Trainer,
    /// Trainer versus trainer.
    Pvp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleFormat {
    #[default]
    Singles,
    Doubles,
}

impl BattleFormat {
    /// Active slots per side.
    pub fn slots(&self) -> usize {
        match self {
            BattleFormat::Singles => 1,
            BattleFormat::Doubles => 2,
        }
    }
}

/// Lifecycle phase of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    WaitingActions,
    Resolving,
    /// A side's active slot was vacated mid-turn and must be refilled
    /// before normal resolution continues.
    ForcedSwitch,
    /// Wild-mode pause: the wild combatant is at 1 HP awaiting the
    /// caller's capture flow.
    Dazed,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    Trainer,
    Opponent,
    Draw,
}

/// Which side of the field a battler occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Trainer,
    Opponent,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Trainer => Side::Opponent,
            Side::Opponent => Side::Trainer,
        }
    }
}

/// Opaque battle session id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BattleId(Uuid);

impl BattleId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One side of a battle: a party plus the slots currently on the field.
#[derive(Debug, Clone)]
pub struct Battler {
    /// Stable id; negative ids are reserved for NPCs and wild opponents.
    pub id: i64,
    pub name: String,
    pub party: Vec<Combatant>,
    /// Party indices currently fielded. Length matches the format's slots
    /// (fewer when the party is smaller).
    pub active_positions: Vec<usize>,
    pub is_ai: bool,
    pub can_switch: bool,
    pub can_use_items: bool,
    pub can_flee: bool,
    pub trainer_class: Option<String>,
    pub prize_money: u32,
    /// Entry hazards targeting this side, name -> layer count.
    pub hazards: HashMap<String, u8>,
    /// Screens protecting this side, name -> turns remaining.
    pub screens: HashMap<String, u8>,
}

impl Battler {
    /// Party indices of fielded combatants (valid positions only).
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active_positions
            .iter()
            .copied()
            .filter(|&i| i < self.party.len())
    }

    pub fn active_combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.active_indices().map(|i| &self.party[i])
    }

    /// True while any party member can still fight.
    pub fn has_usable(&self) -> bool {
        self.party.iter().any(Combatant::is_usable)
    }

    /// True while at least one *fielded* combatant can act.
    pub fn has_usable_active(&self) -> bool {
        self.active_combatants().any(Combatant::is_usable)
    }

    /// Party index of the first fielded combatant that can act, falling
    /// back to the first active slot.
    pub fn lead_index(&self) -> Option<usize> {
        self.active_indices()
            .find(|&i| self.party[i].is_usable())
            .or_else(|| self.active_indices().next())
    }
}

/// Complete state of one live battle session.
#[derive(Debug)]
pub struct BattleState {
    // Fixed at creation
    pub id: BattleId,
    pub mode: BattleMode,
    pub format: BattleFormat,
    pub trainer: Battler,
    pub opponent: Battler,
    pub is_ranked: bool,
    /// Caller-owned ranked metadata, passed through untouched.
    pub ranked_context: serde_json::Value,

    // Turn machinery
    pub turn_number: u32,
    pub phase: Phase,
    pub forced_switch_battler_id: Option<i64>,
    pub is_over: bool,
    pub winner: Option<Winner>,
    pub fled: bool,
    /// Registered actions in arrival order. Arrival order is the
    /// scheduler's tie-break, so this stays a vec rather than a map.
    pub pending_actions: Vec<(i64, BattleAction)>,
    /// AI replacement queued by the resolver, consumed after end-of-turn.
    pub pending_ai_switch_index: Option<usize>,
    pub wild_dazed: bool,

    // Field conditions
    pub weather: Option<String>,
    pub weather_turns: u8,
    pub terrain: Option<String>,
    pub terrain_turns: u8,

    // Narration
    /// Messages from battle-start entry hooks.
    pub entry_messages: Vec<String>,
    /// Cumulative battle log.
    pub log: Vec<String>,

    pub ruleset: String,

    /// Session RNG, seeded at start so tests can fix outcomes.
    pub(crate) rng: ChaCha8Rng,
}

impl BattleState {
    pub fn side_of(&self, battler_id: i64) -> Option<Side> {
        if battler_id == self.trainer.id {
            Some(Side::Trainer)
        } else if battler_id == self.opponent.id {
            Some(Side::Opponent)
        } else {
            None
        }
    }

    pub fn side(&self, side: Side) -> &Battler {
        match side {
            Side::Trainer => &self.trainer,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut Battler {
        match side {
            Side::Trainer => &mut self.trainer,
            Side::Opponent => &mut self.opponent,
        }
    }

    pub fn battler(&self, battler_id: i64) -> Option<&Battler> {
        self.side_of(battler_id).map(|s| self.side(s))
    }

    pub fn has_pending_action(&self, battler_id: i64) -> bool {
        self.pending_actions.iter().any(|(id, _)| *id == battler_id)
    }

    /// Store an action, overwriting in place so the original arrival slot
    /// (and with it the scheduler tie-break) is kept.
    pub fn set_pending_action(&mut self, battler_id: i64, action: BattleAction) {
        if let Some(entry) = self
            .pending_actions
            .iter_mut()
            .find(|(id, _)| *id == battler_id)
        {
            entry.1 = action;
        } else {
            self.pending_actions.push((battler_id, action));
        }
    }

    pub fn remove_pending_action(&mut self, battler_id: i64) {
        self.pending_actions.retain(|(id, _)| *id != battler_id);
    }

    /// Ids of human sides that have not submitted an action yet.
    pub fn waiting_for(&self) -> Vec<i64> {
        [&self.trainer, &self.opponent]
            .into_iter()
            .filter(|b| !b.is_ai && !self.has_pending_action(b.id))
            .map(|b| b.id)
            .collect()
    }
}
