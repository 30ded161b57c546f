//! Ability handling: entry triggers and weather residuals.

use crate::combatant::{Combatant, Stat};
use crate::state::{BattleState, Side};

use super::AbilityHandler;

/// Absent subsystem: no entry triggers, no weather effects.
pub struct NoopAbilityHandler;

impl AbilityHandler for NoopAbilityHandler {
    fn on_entry(&self, _battle: &mut BattleState, _side: Side, _party_index: usize) -> Vec<String> {
        Vec::new()
    }

    fn weather_damage(&self, _combatant: &mut Combatant, _weather: &str) -> Option<String> {
        None
    }

    fn weather_healing(&self, _combatant: &mut Combatant, _weather: &str) -> Option<String> {
        None
    }
}

/// Built-in ability table: weather setters and intimidation on entry,
/// weather chip damage and weather-fed healing at end of turn.
pub struct StandardAbilityHandler;

const WEATHER_TURNS: u8 = 5;

/// Ability names arrive as free text ("Sand Stream", "sand_stream");
/// comparisons ignore case and separators.
fn normalize(ability: &str) -> String {
    ability
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .to_ascii_lowercase()
}

fn set_weather(battle: &mut BattleState, weather: &str, message: String, out: &mut Vec<String>) {
    if battle.weather.as_deref() == Some(weather) {
        return;
    }
    battle.weather = Some(weather.to_string());
    battle.weather_turns = WEATHER_TURNS;
    out.push(message);
}

impl AbilityHandler for StandardAbilityHandler {
    fn on_entry(&self, battle: &mut BattleState, side: Side, party_index: usize) -> Vec<String> {
        let battler = battle.side(side);
        let Some(entrant) = battler.party.get(party_index) else {
            return Vec::new();
        };
        let Some(ability) = entrant.ability.clone() else {
            return Vec::new();
        };
        let entrant_name = entrant.species_name.clone();

        let mut messages = Vec::new();
        match normalize(&ability).as_str() {
            "drizzle" => set_weather(
                battle,
                "rain",
                format!("{entrant_name}'s Drizzle made it rain!"),
                &mut messages,
            ),
            "drought" => set_weather(
                battle,
                "sun",
                format!("{entrant_name}'s Drought intensified the sunlight!"),
                &mut messages,
            ),
            "sandstream" => set_weather(
                battle,
                "sandstorm",
                format!("{entrant_name}'s Sand Stream whipped up a sandstorm!"),
                &mut messages,
            ),
            "snowwarning" => set_weather(
                battle,
                "snow",
                format!("{entrant_name}'s Snow Warning summoned a snowstorm!"),
                &mut messages,
            ),
            "intimidate" => {
                let foes = battle.side_mut(side.opposite());
                let indices: Vec<usize> = foes.active_indices().collect();
                for idx in indices {
                    let foe = &mut foes.party[idx];
                    if !foe.is_usable() {
                        continue;
                    }
                    foe.stat_stages.shift(Stat::Attack, -1);
                    messages.push(format!(
                        "{}'s Intimidate cut {}'s Attack!",
                        entrant_name, foe.species_name
                    ));
                }
            }
            _ => {}
        }
        messages
    }

    fn weather_damage(&self, combatant: &mut Combatant, weather: &str) -> Option<String> {
        if !combatant.is_usable() {
            return None;
        }
        let exempt = match weather {
            "sandstorm" => {
                combatant.has_type("rock")
                    || combatant.has_type("ground")
                    || combatant.has_type("steel")
            }
            "hail" => combatant.has_type("ice"),
            _ => return None,
        };
        if exempt {
            return None;
        }
        let damage = (combatant.max_hp() / 16).max(1);
        combatant.apply_damage(damage);
        let verb = match weather {
            "sandstorm" => "buffeted by the sandstorm",
            _ => "pelted by hail",
        };
        Some(format!(
            "{} is {}! (-{} HP)",
            combatant.species_name, verb, damage
        ))
    }

    fn weather_healing(&self, combatant: &mut Combatant, weather: &str) -> Option<String> {
        if !combatant.is_usable() || combatant.current_hp >= combatant.max_hp() {
            return None;
        }
        let ability = normalize(combatant.ability.as_deref()?);
        let (triggers, label) = match ability.as_str() {
            "raindish" => (weather == "rain", "Rain Dish"),
            "icebody" => (weather == "hail" || weather == "snow", "Ice Body"),
            _ => return None,
        };
        if !triggers {
            return None;
        }
        let heal = (combatant.max_hp() / 16).max(1);
        combatant.heal(heal);
        Some(format!(
            "{}'s {} restored a little HP! (+{} HP)",
            combatant.species_name, label, heal
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Stats;

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

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize("Sand Stream"), "sandstream");
        assert_eq!(normalize("sand_stream"), "sandstream");
        assert_eq!(normalize("LEVITATE"), "levitate");
    }

    #[test]
    fn sandstorm_spares_rock_types() {
        let handler = StandardAbilityHandler;
        let mut rocky = Combatant::new("Rocky", 50, stats(100)).with_types(&["rock"]);
        assert!(handler.weather_damage(&mut rocky, "sandstorm").is_none());
        assert_eq!(rocky.current_hp, 100);

        let mut soft = Combatant::new("Soft", 50, stats(100)).with_types(&["normal"]);
        let msg = handler.weather_damage(&mut soft, "sandstorm").unwrap();
        assert_eq!(soft.current_hp, 94);
        assert!(msg.contains("sandstorm"));
    }

    #[test]
    fn rain_dish_heals_only_in_rain() {
        let handler = StandardAbilityHandler;
        let mut c = Combatant::new("Paddler", 50, stats(160))
            .with_types(&["water"])
            .with_ability("Rain Dish");
        c.current_hp = 100;

        assert!(handler.weather_healing(&mut c, "sun").is_none());
        let msg = handler.weather_healing(&mut c, "rain").unwrap();
        assert_eq!(c.current_hp, 110);
        assert!(msg.contains("Rain Dish"));

        // Full HP: nothing to restore.
        c.current_hp = 160;
        assert!(handler.weather_healing(&mut c, "rain").is_none());
    }
}
