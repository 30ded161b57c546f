//! Optional subsystem seams: damage calculation, status conditions and
//! abilities.
//!
//! The engine always calls through these traits and never branches on
//! whether a "real" implementation is present. The degraded defaults keep
//! narration coherent with reduced fidelity: flat 10 damage, no status
//! gates, no ability or weather effects.

mod ability;
mod calculator;
mod status;

pub use ability::{NoopAbilityHandler, StandardAbilityHandler};
pub use calculator::{FlatCalculator, StandardCalculator};
pub use status::{NoopStatusHandler, StandardStatusHandler};

use rand_chacha::ChaCha8Rng;

use crate::combatant::{Combatant, StatusCondition};
use crate::data::{MoveData, TypeChart};
use crate::state::{BattleState, Side};

/// Read-only inputs to one damage calculation.
pub struct DamageInput<'a> {
    pub move_data: &'a MoveData,
    pub weather: Option<&'a str>,
    pub terrain: Option<&'a str>,
    pub chart: &'a TypeChart,
}

/// Result of one damage calculation plus any side-effect narration.
#[derive(Debug, Clone)]
pub struct DamageOutcome {
    pub damage: u16,
    pub is_crit: bool,
    /// Type effectiveness multiplier; 1.0 is neutral, 0.0 is immune.
    pub effectiveness: f32,
    pub messages: Vec<String>,
}

impl DamageOutcome {
    pub fn none() -> Self {
        Self {
            damage: 0,
            is_crit: false,
            effectiveness: 1.0,
            messages: Vec::new(),
        }
    }
}

/// Damage calculation seam.
pub trait DamageCalculator {
    /// Compute damage and apply the move's secondary effects to the
    /// defender. Never subtracts the returned damage itself.
    fn calculate(
        &self,
        attacker: &Combatant,
        defender: &mut Combatant,
        input: &DamageInput<'_>,
        status: &dyn StatusHandler,
        rng: &mut ChaCha8Rng,
    ) -> DamageOutcome;

    /// Effective speed before held-item multipliers.
    fn speed(&self, combatant: &Combatant) -> u16;
}

/// Status condition seam, consulted before moves, when inflicting a status
/// and at end of turn.
pub trait StatusHandler {
    /// `Some(message)` when the combatant cannot act this turn.
    fn can_move(&self, combatant: &mut Combatant, rng: &mut ChaCha8Rng) -> Option<String>;

    /// Gate for inflicting a major status; `Err(reason)` blocks it.
    fn can_apply(&self, combatant: &Combatant, status: StatusCondition) -> Result<(), String>;

    /// Inflict a status; returns the narration fragment ("was poisoned!").
    fn apply(&self, combatant: &mut Combatant, status: StatusCondition) -> Option<String>;

    /// End-of-turn residual damage messages.
    fn end_of_turn(&self, combatant: &mut Combatant) -> Vec<String>;
}

/// Ability seam: field-entry triggers and weather residuals.
pub trait AbilityHandler {
    /// Fired when the combatant at `party_index` on `side` enters the
    /// field, before entry hazards.
    fn on_entry(&self, battle: &mut BattleState, side: Side, party_index: usize) -> Vec<String>;

    fn weather_damage(&self, combatant: &mut Combatant, weather: &str) -> Option<String>;

    fn weather_healing(&self, combatant: &mut Combatant, weather: &str) -> Option<String>;
}
