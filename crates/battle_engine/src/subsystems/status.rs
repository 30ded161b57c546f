//! Status condition handling.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combatant::{Combatant, StatusCondition, Volatiles};

use super::StatusHandler;

/// Absent subsystem: nothing prevents moves, nothing can be inflicted,
/// nothing ticks at end of turn.
pub struct NoopStatusHandler;

impl StatusHandler for NoopStatusHandler {
    fn can_move(&self, _combatant: &mut Combatant, _rng: &mut ChaCha8Rng) -> Option<String> {
        None
    }

    fn can_apply(&self, _combatant: &Combatant, _status: StatusCondition) -> Result<(), String> {
        Err("status handling unavailable".to_string())
    }

    fn apply(&self, _combatant: &mut Combatant, _status: StatusCondition) -> Option<String> {
        None
    }

    fn end_of_turn(&self, _combatant: &mut Combatant) -> Vec<String> {
        Vec::new()
    }
}

/// Full-fidelity status conditions: act-prevention rolls, type-based
/// immunities and residual damage.
pub struct StandardStatusHandler;

const SLEEP_TURNS: u8 = 2;

impl StatusHandler for StandardStatusHandler {
    fn can_move(&self, combatant: &mut Combatant, rng: &mut ChaCha8Rng) -> Option<String> {
        // Flinch is consumed by the check whether or not it fires first.
        if combatant.volatiles.contains(Volatiles::FLINCH) {
            combatant.volatiles.remove(Volatiles::FLINCH);
            return Some(format!("{} flinched and couldn't move!", combatant.species_name));
        }

        match combatant.status {
            Some(StatusCondition::Asleep) => {
                if combatant.status_turns > 0 {
                    combatant.status_turns -= 1;
                    return Some(format!("{} is fast asleep.", combatant.species_name));
                }
                // Wakes up and acts normally this turn.
                combatant.status = None;
                None
            }
            Some(StatusCondition::Frozen) => {
                if rng.random::<f64>() < 0.2 {
                    combatant.status = None;
                    None
                } else {
                    Some(format!("{} is frozen solid!", combatant.species_name))
                }
            }
            Some(StatusCondition::Paralyzed) => {
                if rng.random::<f64>() < 0.25 {
                    Some(format!(
                        "{} is paralyzed! It can't move!",
                        combatant.species_name
                    ))
                } else {
                    None
                }
            }
            _ => {
                if combatant.volatiles.contains(Volatiles::CONFUSION)
                    && rng.random::<f64>() < 1.0 / 3.0
                {
                    let self_hit = (combatant.max_hp() / 8).max(1);
                    combatant.apply_damage(self_hit);
                    return Some(format!(
                        "{} hurt itself in its confusion! (-{} HP)",
                        combatant.species_name, self_hit
                    ));
                }
                None
            }
        }
    }

    fn can_apply(&self, combatant: &Combatant, status: StatusCondition) -> Result<(), String> {
        if combatant.status.is_some() {
            return Err("already has a status condition".to_string());
        }
        let immune = match status {
            StatusCondition::Poisoned | StatusCondition::BadlyPoisoned => {
                combatant.has_type("poison") || combatant.has_type("steel")
            }
            StatusCondition::Burned => combatant.has_type("fire"),
            StatusCondition::Paralyzed => combatant.has_type("electric"),
            StatusCondition::Frozen => combatant.has_type("ice"),
            StatusCondition::Asleep => false,
        };
        if immune {
            return Err("is immune".to_string());
        }
        Ok(())
    }

    fn apply(&self, combatant: &mut Combatant, status: StatusCondition) -> Option<String> {
        if self.can_apply(combatant, status).is_err() {
            return None;
        }
        combatant.status = Some(status);
        combatant.status_turns = match status {
            StatusCondition::Asleep => SLEEP_TURNS,
            _ => 0,
        };
        let fragment = match status {
            StatusCondition::Poisoned => "was poisoned!",
            StatusCondition::BadlyPoisoned => "was badly poisoned!",
            StatusCondition::Burned => "was burned!",
            StatusCondition::Paralyzed => "was paralyzed! It may be unable to move!",
            StatusCondition::Asleep => "fell asleep!",
            StatusCondition::Frozen => "was frozen solid!",
        };
        Some(fragment.to_string())
    }

    fn end_of_turn(&self, combatant: &mut Combatant) -> Vec<String> {
        if !combatant.is_usable() {
            return Vec::new();
        }
        let max_hp = combatant.max_hp();
        match combatant.status {
            Some(StatusCondition::Poisoned) => {
                let damage = (max_hp / 8).max(1);
                combatant.apply_damage(damage);
                vec![format!(
                    "{} is hurt by poison! (-{} HP)",
                    combatant.species_name, damage
                )]
            }
            Some(StatusCondition::BadlyPoisoned) => {
                combatant.status_turns = combatant.status_turns.saturating_add(1);
                let damage = ((max_hp as u32 * combatant.status_turns as u32 / 16) as u16).max(1);
                combatant.apply_damage(damage);
                vec![format!(
                    "{} is hurt by poison! (-{} HP)",
                    combatant.species_name, damage
                )]
            }
            Some(StatusCondition::Burned) => {
                let damage = (max_hp / 16).max(1);
                combatant.apply_damage(damage);
                vec![format!(
                    "{} is hurt by its burn! (-{} HP)",
                    combatant.species_name, damage
                )]
            }
            _ => Vec::new(),
        }
    }
}
