//! Entry hazards.
//!
//! Hazard maps belong to the side they hurt: a hazard placed by side A is
//! stored on side B's map and fires whenever one of B's combatants takes
//! the field. Each hazard kind applies at most once per entry.

use std::collections::HashMap;

use crate::combatant::{Combatant, Stat, StatusCondition};
use crate::data::TypeChart;
use crate::subsystems::StatusHandler;

pub const STEALTH_ROCK: &str = "stealth_rock";
pub const SPIKES: &str = "spikes";
pub const TOXIC_SPIKES: &str = "toxic_spikes";
pub const STICKY_WEB: &str = "sticky_web";

/// Ground-touching check: flying types and levitators float over spikes,
/// toxic spikes and sticky web. Missing type or ability data counts as
/// grounded.
pub fn is_grounded(combatant: &Combatant) -> bool {
    if combatant.has_type("flying") {
        return false;
    }
    !combatant
        .ability
        .as_deref()
        .is_some_and(|a| a.eq_ignore_ascii_case("levitate"))
}

/// Apply every hazard on `hazards` to a combatant that just entered the
/// field. Mutates the entrant (and the map, for toxic-spike absorption) and
/// returns the entry narration.
pub fn apply_entry_hazards(
    hazards: &mut HashMap<String, u8>,
    entrant: &mut Combatant,
    chart: &TypeChart,
    status: &dyn StatusHandler,
) -> Vec<String> {
    let mut messages = Vec::new();
    if hazards.is_empty() {
        return messages;
    }

    let grounded = is_grounded(entrant);

    if hazards.contains_key(STEALTH_ROCK) {
        let eff = chart.effectiveness("rock", &entrant.types);
        let base = (entrant.max_hp() / 8).max(1);
        let damage = if eff > 0.0 {
            ((base as f32 * eff) as u16).max(1)
        } else {
            0
        };
        if damage > 0 {
            entrant.apply_damage(damage);
            messages.push(format!(
                "{} is hurt by Stealth Rock! (-{} HP)",
                entrant.species_name, damage
            ));
        }
    }

    if grounded {
        if let Some(&layers) = hazards.get(SPIKES) {
            let divisor = match layers.min(3) {
                0 | 1 => 8,
                2 => 6,
                _ => 4,
            };
            let damage = (entrant.max_hp() / divisor).max(1);
            entrant.apply_damage(damage);
            messages.push(format!(
                "{} is hurt by Spikes! (-{} HP)",
                entrant.species_name, damage
            ));
        }
    }

    if grounded {
        if let Some(&layers) = hazards.get(TOXIC_SPIKES) {
            if entrant.has_type("poison") {
                hazards.remove(TOXIC_SPIKES);
                messages.push(format!(
                    "{} absorbed the Toxic Spikes!",
                    entrant.species_name
                ));
            } else if !entrant.has_type("steel") {
                let condition = if layers.min(2) >= 2 {
                    StatusCondition::BadlyPoisoned
                } else {
                    StatusCondition::Poisoned
                };
                if status.can_apply(entrant, condition).is_ok() {
                    if let Some(msg) = status.apply(entrant, condition) {
                        messages.push(format!("{} {}", entrant.species_name, msg));
                    }
                }
            }
        }
    }

    if grounded && hazards.contains_key(STICKY_WEB) {
        entrant.stat_stages.shift(Stat::Speed, -1);
        messages.push(format!("{}'s Speed fell! (-1)", entrant.species_name));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Stats;
    use crate::subsystems::StandardStatusHandler;

    fn stats(hp: u16) -> Stats {
        Stats {
            hp,
            attack: 50,
            defense: 50,
            sp_attack: 50,
            sp_defense: 50,
            speed: 50,
        }
    }

    fn rock_chart() -> TypeChart {
        TypeChart::from_json(
            r#"{"rock": {"fire": 2.0, "flying": 2.0, "ground": 0.5, "steel": 0.5}}"#,
        )
        .unwrap()
    }

    fn hazard_map(entries: &[(&str, u8)]) -> HashMap<String, u8> {
        entries
            .iter()
            .map(|&(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn grounded_check_covers_flying_and_levitate() {
        let normal = Combatant::new("Walker", 50, stats(100)).with_types(&["normal"]);
        assert!(is_grounded(&normal));

        let bird = Combatant::new("Bird", 50, stats(100)).with_types(&["normal", "flying"]);
        assert!(!is_grounded(&bird));

        let floaty = Combatant::new("Floaty", 50, stats(100))
            .with_types(&["ghost"])
            .with_ability("Levitate");
        assert!(!is_grounded(&floaty));

        // Missing data means grounded-capable.
        let unknown = Combatant::new("Mystery", 50, stats(100));
        assert!(is_grounded(&unknown));
    }

    #[test]
    fn stealth_rock_scales_with_rock_effectiveness() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(STEALTH_ROCK, 1)]);

        // 4x weak: fire/flying takes half max HP.
        let mut entrant = Combatant::new("Emberwing", 50, stats(104))
            .with_types(&["fire", "flying"]);
        let msgs = apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        assert_eq!(entrant.current_hp, 104 - 52);
        assert!(msgs[0].contains("Stealth Rock"));
    }

    #[test]
    fn stealth_rock_and_spikes_stack_on_grounded_entrant() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(STEALTH_ROCK, 1), (SPIKES, 2)]);
        let mut entrant = Combatant::new("Walker", 50, stats(100)).with_types(&["normal"]);

        let msgs = apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        // Neutral rock: 12, spikes layer 2: 100/6 = 16.
        assert_eq!(entrant.current_hp, 100 - 12 - 16);
        assert_eq!(msgs.len(), 2);
    }

    #[test]
    fn spikes_miss_airborne_entrants() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(SPIKES, 3)]);
        let mut entrant =
            Combatant::new("Bird", 50, stats(100)).with_types(&["normal", "flying"]);
        let msgs = apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        assert_eq!(entrant.current_hp, 100);
        assert!(msgs.is_empty());
    }

    #[test]
    fn poison_entrant_absorbs_toxic_spikes() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(TOXIC_SPIKES, 2)]);
        let mut entrant = Combatant::new("Sludge", 50, stats(100)).with_types(&["poison"]);

        let msgs = apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        assert!(!hazards.contains_key(TOXIC_SPIKES));
        assert!(entrant.status.is_none());
        assert!(msgs[0].contains("absorbed"));
    }

    #[test]
    fn steel_entrant_ignores_toxic_spikes_without_absorbing() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(TOXIC_SPIKES, 1)]);
        let mut entrant = Combatant::new("Ingot", 50, stats(100)).with_types(&["steel"]);

        let msgs = apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        assert!(hazards.contains_key(TOXIC_SPIKES));
        assert!(entrant.status.is_none());
        assert!(msgs.is_empty());
    }

    #[test]
    fn toxic_spikes_layer_count_picks_the_poison() {
        let status = StandardStatusHandler;

        let mut one_layer = hazard_map(&[(TOXIC_SPIKES, 1)]);
        let mut entrant = Combatant::new("Walker", 50, stats(100)).with_types(&["normal"]);
        apply_entry_hazards(&mut one_layer, &mut entrant, &rock_chart(), &status);
        assert_eq!(entrant.status, Some(StatusCondition::Poisoned));

        let mut two_layers = hazard_map(&[(TOXIC_SPIKES, 2)]);
        let mut entrant = Combatant::new("Walker", 50, stats(100)).with_types(&["normal"]);
        apply_entry_hazards(&mut two_layers, &mut entrant, &rock_chart(), &status);
        assert_eq!(entrant.status, Some(StatusCondition::BadlyPoisoned));
    }

    #[test]
    fn sticky_web_lowers_speed_one_stage() {
        let status = StandardStatusHandler;
        let mut hazards = hazard_map(&[(STICKY_WEB, 1)]);
        let mut entrant = Combatant::new("Walker", 50, stats(100)).with_types(&["normal"]);

        apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        assert_eq!(entrant.stat_stages.get(Stat::Speed), -1);

        // Floor at -6 across repeated entries.
        for _ in 0..10 {
            apply_entry_hazards(&mut hazards, &mut entrant, &rock_chart(), &status);
        }
        assert_eq!(entrant.stat_stages.get(Stat::Speed), -6);
    }
}
