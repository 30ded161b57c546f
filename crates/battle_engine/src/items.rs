//! Held-item effects.
//!
//! Covers move restrictions and choice locking, offensive/defensive damage
//! modifiers, focus-style KO survival, recoil, end-of-turn healing and
//! speed multipliers. An item consumed during battle stays consumed for the
//! session; every lookup ignores it afterwards.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combatant::Combatant;
use crate::data::{ItemData, ItemsDb, MoveCategory, MoveData, MovesDb};

pub struct HeldItemManager {
    items: ItemsDb,
}

impl HeldItemManager {
    pub fn new(items: ItemsDb) -> Self {
        Self { items }
    }

    pub fn db(&self) -> &ItemsDb {
        &self.items
    }

    /// The holder's item descriptor, unless it has been consumed.
    fn active_item<'a>(&'a self, holder: &Combatant) -> Option<&'a ItemData> {
        let item_id = holder.held_item.as_deref()?;
        if holder.consumed_items.contains(item_id) {
            return None;
        }
        self.items.get_item(item_id)
    }

    /// Pre-move gate. Returns a refusal message when the move may not be
    /// used; the caller must not consume PP in that case.
    pub fn check_move_restriction(
        &self,
        user: &Combatant,
        move_data: &MoveData,
        moves: &MovesDb,
    ) -> Option<String> {
        let item = self.active_item(user)?;
        let effect = &item.effect_data;

        if effect.blocks_status_moves && move_data.category == MoveCategory::Status {
            return Some(format!(
                "{} can't use status moves while holding {}!",
                user.species_name, item.name
            ));
        }

        if effect.locks_move {
            if let Some(locked) = user.choice_locked_move.as_deref() {
                if locked != move_data.id {
                    let locked_name = moves
                        .get_move(locked)
                        .map(|m| m.name.clone())
                        .unwrap_or_else(|| locked.to_string());
                    return Some(format!(
                        "{} is locked into {} because of its {}!",
                        user.species_name, locked_name, item.name
                    ));
                }
            }
        }

        None
    }

    /// Record a move attempt for choice locking. Runs even on misses.
    pub fn register_move_use(&self, user: &mut Combatant, move_data: &MoveData) {
        if let Some(item) = self.active_item(user) {
            if item.effect_data.locks_move {
                user.choice_locked_move = Some(move_data.id.clone());
            }
        }
    }

    /// Switching out releases the lock.
    pub fn clear_choice_lock(&self, user: &mut Combatant) {
        user.choice_locked_move = None;
    }

    fn power_multiplier(&self, attacker: &Combatant, move_data: &MoveData) -> f64 {
        let Some(item) = self.active_item(attacker) else {
            return 1.0;
        };
        let effect = &item.effect_data;
        let mut multiplier = 1.0;

        match &effect.boost_type {
            Some(required) => {
                if move_data.move_type.eq_ignore_ascii_case(required) {
                    multiplier *= effect.power_multiplier.unwrap_or(1.0);
                }
            }
            None => {
                if let Some(m) = effect.power_multiplier {
                    multiplier *= m;
                }
            }
        }

        let stat_mult = effect.multiplier.unwrap_or(1.0);
        match (effect.stat.as_deref(), move_data.category) {
            (Some("attack"), MoveCategory::Physical) => multiplier *= stat_mult,
            (Some("sp_attack"), MoveCategory::Special) => multiplier *= stat_mult,
            _ => {}
        }

        multiplier
    }

    fn defense_multiplier(&self, defender: &Combatant, move_data: &MoveData) -> f64 {
        let Some(item) = self.active_item(defender) else {
            return 1.0;
        };
        let effect = &item.effect_data;
        if effect.stat.as_deref() == Some("sp_defense") && move_data.category == MoveCategory::Special
        {
            return effect.multiplier.unwrap_or(1.0);
        }
        1.0
    }

    /// Apply pre-hit item modifiers to an already-computed damage value:
    /// attacker's power items, defender's defensive items, then focus-style
    /// survival.
    pub fn modify_damage(
        &self,
        attacker: &Combatant,
        defender: &mut Combatant,
        move_data: &MoveData,
        damage: u16,
        rng: &mut ChaCha8Rng,
    ) -> (u16, Vec<String>) {
        if damage == 0 {
            return (0, Vec::new());
        }

        let mut messages = Vec::new();
        let mut damage =
            (damage as f64 * self.power_multiplier(attacker, move_data)).round() as u16;

        let defense_mult = self.defense_multiplier(defender, move_data);
        if defense_mult > 1.0 {
            damage = ((damage as f64 / defense_mult).ceil() as u16).max(1);
        }

        let (damage, survival) = self.try_focus_items(defender, damage, rng);
        if let Some(msg) = survival {
            messages.push(msg);
        }

        (damage, messages)
    }

    /// Before-damage survival items: cap a lethal hit to leave exactly 1 HP.
    fn try_focus_items(
        &self,
        defender: &mut Combatant,
        damage: u16,
        rng: &mut ChaCha8Rng,
    ) -> (u16, Option<String>) {
        if damage < defender.current_hp || defender.current_hp == 0 {
            return (damage, None);
        }
        let Some(item) = self.active_item(defender) else {
            return (damage, None);
        };
        if item.trigger.as_deref().is_some_and(|t| t != "before_damage") {
            return (damage, None);
        }

        let effect = &item.effect_data;
        let prevents_ko =
            effect.prevents_ko || effect.requires_full_hp || effect.activation_chance.is_some();
        if !prevents_ko {
            return (damage, None);
        }
        if effect.requires_full_hp && defender.current_hp < defender.max_hp() {
            return (damage, None);
        }
        if let Some(chance) = effect.activation_chance {
            if rng.random::<f64>() > chance {
                return (damage, None);
            }
        }
        if defender.current_hp <= 1 {
            return (damage, None);
        }

        let capped = defender.current_hp - 1;
        let message = format!(
            "{} hung on using its {}!",
            defender.species_name, item.name
        );
        let item_id = item.id.clone();
        if effect.one_time_use {
            defender.consumed_items.insert(item_id);
        }
        (capped, Some(message))
    }

    /// Post-hit effects on the attacker: choice-lock registration (always,
    /// consistent with choice-item semantics on a miss) and recoil.
    pub fn apply_after_damage(
        &self,
        attacker: &mut Combatant,
        move_data: &MoveData,
        dealt_damage: u16,
    ) -> Vec<String> {
        if self.active_item(attacker).is_none() {
            return Vec::new();
        }

        self.register_move_use(attacker, move_data);

        if dealt_damage == 0 {
            return Vec::new();
        }

        let Some(item) = self.active_item(attacker) else {
            return Vec::new();
        };
        let mut messages = Vec::new();
        if let Some(percent) = item.effect_data.recoil_percent {
            let recoil = ((attacker.max_hp() as f64 * percent / 100.0).round() as u16).max(1);
            let message = format!(
                "{} was hurt by its {}! (-{} HP)",
                attacker.species_name, item.name, recoil
            );
            attacker.apply_damage(recoil);
            messages.push(message);
        }
        messages
    }

    /// Passive end-of-turn healing, only while hurt.
    pub fn end_of_turn(&self, holder: &mut Combatant) -> Vec<String> {
        let Some(item) = self.active_item(holder) else {
            return Vec::new();
        };
        let Some(percent) = item.effect_data.heal_percent else {
            return Vec::new();
        };
        if holder.current_hp == 0 || holder.current_hp >= holder.max_hp() {
            return Vec::new();
        }
        let heal = ((holder.max_hp() as f64 * percent / 100.0).round() as u16).max(1);
        let message = format!(
            "{} restored health with its {}! (+{} HP)",
            holder.species_name, item.name, heal
        );
        holder.heal(heal);
        vec![message]
    }

    pub fn speed_multiplier(&self, holder: &Combatant) -> f64 {
        let Some(item) = self.active_item(holder) else {
            return 1.0;
        };
        let effect = &item.effect_data;
        if effect.stat.as_deref() == Some("speed") {
            return effect.multiplier.unwrap_or(1.0);
        }
        1.0
    }
}
