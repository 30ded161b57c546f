//! Damage calculation.
//!
//! [`StandardCalculator`] implements the classic formula:
//! `floor(floor(2L/5 + 2) * power * A / D / 50) + 2`, then the modifier
//! chain (burn, screens-free here, STAB, type chart, weather, terrain,
//! crit, random 85-100 roll). [`FlatCalculator`] is the degraded fallback:
//! a flat 10 damage, neutral everything.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::combatant::{Combatant, Stat, StatusCondition};
use crate::data::MoveCategory;
use crate::hazards::is_grounded;

use super::{DamageCalculator, DamageInput, DamageOutcome, StatusHandler};

/// Stage multiplier table, -6..=+6 as (numerator, denominator).
const STAGE_TABLE: [(u32, u32); 13] = [
    (2, 8),
    (2, 7),
    (2, 6),
    (2, 5),
    (2, 4),
    (2, 3),
    (2, 2),
    (3, 2),
    (4, 2),
    (5, 2),
    (6, 2),
    (7, 2),
    (8, 2),
];

/// Apply a stat stage to a base stat.
pub fn apply_stage(base: u16, stage: i8) -> u16 {
    let (num, den) = STAGE_TABLE[(stage.clamp(-6, 6) + 6) as usize];
    ((base as u32 * num) / den) as u16
}

/// Degraded fallback when no real calculator is injected: fixed 10 damage,
/// no crits, neutral effectiveness, raw speed.
pub struct FlatCalculator;

impl DamageCalculator for FlatCalculator {
    fn calculate(
        &self,
        _attacker: &Combatant,
        _defender: &mut Combatant,
        input: &DamageInput<'_>,
        _status: &dyn StatusHandler,
        _rng: &mut ChaCha8Rng,
    ) -> DamageOutcome {
        let damage = match input.move_data.category {
            MoveCategory::Status => 0,
            _ => 10,
        };
        DamageOutcome {
            damage,
            ..DamageOutcome::none()
        }
    }

    fn speed(&self, combatant: &Combatant) -> u16 {
        combatant.stats.speed
    }
}

/// Full-fidelity damage pipeline.
pub struct StandardCalculator;

const CRIT_DENOMINATOR: u32 = 24;

impl StandardCalculator {
    fn secondary_ailment(
        &self,
        defender: &mut Combatant,
        input: &DamageInput<'_>,
        status: &dyn StatusHandler,
        rng: &mut ChaCha8Rng,
        messages: &mut Vec<String>,
    ) {
        let Some(code) = input.move_data.ailment.as_deref() else {
            return;
        };
        let Some(condition) = StatusCondition::from_code(code) else {
            return;
        };
        let chance = match input.move_data.category {
            // Status moves with an ailment always try to inflict it.
            MoveCategory::Status => 100,
            _ => input.move_data.ailment_chance as u32,
        };
        if chance == 0 || rng.random_range(0..100) >= chance {
            return;
        }
        if status.can_apply(defender, condition).is_ok() {
            if let Some(fragment) = status.apply(defender, condition) {
                messages.push(format!("{} {}", defender.species_name, fragment));
            }
        }
    }
}

impl DamageCalculator for StandardCalculator {
    fn calculate(
        &self,
        attacker: &Combatant,
        defender: &mut Combatant,
        input: &DamageInput<'_>,
        status: &dyn StatusHandler,
        rng: &mut ChaCha8Rng,
    ) -> DamageOutcome {
        let move_data = input.move_data;
        let mut messages = Vec::new();

        if move_data.category == MoveCategory::Status {
            self.secondary_ailment(defender, input, status, rng, &mut messages);
            return DamageOutcome {
                messages,
                ..DamageOutcome::none()
            };
        }

        if let Some(accuracy) = move_data.accuracy {
            if rng.random_range(0..100) >= accuracy as u32 {
                return DamageOutcome {
                    messages: vec!["But it missed!".to_string()],
                    ..DamageOutcome::none()
                };
            }
        }

        let effectiveness = input
            .chart
            .effectiveness(&move_data.move_type, &defender.types);
        if effectiveness == 0.0 {
            return DamageOutcome {
                damage: 0,
                is_crit: false,
                effectiveness,
                messages,
            };
        }
        if move_data.power == 0 {
            return DamageOutcome {
                messages,
                ..DamageOutcome::none()
            };
        }

        let (attack_stat, defense_stat) = match move_data.category {
            MoveCategory::Physical => (Stat::Attack, Stat::Defense),
            _ => (Stat::SpAttack, Stat::SpDefense),
        };
        let attack = apply_stage(attacker.stat(attack_stat), attacker.stat_stages.get(attack_stat))
            .max(1) as u32;
        let defense = apply_stage(defender.stat(defense_stat), defender.stat_stages.get(defense_stat))
            .max(1) as u32;

        let level_factor = 2 * attacker.level as u32 / 5 + 2;
        let base = level_factor * move_data.power as u32 * attack / defense / 50 + 2;
        let mut damage = base as f64;

        if attacker.status == Some(StatusCondition::Burned)
            && move_data.category == MoveCategory::Physical
        {
            damage *= 0.5;
        }

        if attacker.has_type(&move_data.move_type) {
            damage *= 1.5;
        }

        damage *= effectiveness as f64;

        match (input.weather, move_data.move_type.as_str()) {
            (Some("rain"), "water") | (Some("sun"), "fire") => damage *= 1.5,
            (Some("rain"), "fire") | (Some("sun"), "water") => damage *= 0.5,
            _ => {}
        }

        match (input.terrain, move_data.move_type.as_str()) {
            (Some("electric"), "electric") | (Some("grassy"), "grass")
            | (Some("psychic"), "psychic")
                if is_grounded(attacker) =>
            {
                damage *= 1.3;
            }
            (Some("misty"), "dragon") if is_grounded(defender) => damage *= 0.5,
            _ => {}
        }

        let is_crit = rng.random_range(0..CRIT_DENOMINATOR) == 0;
        if is_crit {
            damage *= 1.5;
        }

        let roll = 85 + rng.random_range(0..16u32);
        damage = damage * roll as f64 / 100.0;

        let damage = (damage as u16).max(1);

        self.secondary_ailment(defender, input, status, rng, &mut messages);

        DamageOutcome {
            damage,
            is_crit,
            effectiveness,
            messages,
        }
    }

    fn speed(&self, combatant: &Combatant) -> u16 {
        let staged = apply_stage(
            combatant.stats.speed,
            combatant.stat_stages.get(Stat::Speed),
        );
        if combatant.status == Some(StatusCondition::Paralyzed) {
            staged / 2
        } else {
            staged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Stats;
    use crate::data::{MoveData, TypeChart};
    use crate::subsystems::{NoopStatusHandler, StandardStatusHandler};
    use rand::SeedableRng;

    fn stats(attack: u16, defense: u16, speed: u16) -> Stats {
        Stats {
            hp: 150,
            attack,
            defense,
            sp_attack: attack,
            sp_defense: defense,
            speed,
        }
    }

    fn physical(id: &str, move_type: &str, power: u16) -> MoveData {
        MoveData {
            id: id.to_string(),
            name: id.to_string(),
            move_type: move_type.to_string(),
            category: MoveCategory::Physical,
            power,
            accuracy: None,
            pp: 10,
            priority: 0,
            ailment: None,
            ailment_chance: 0,
        }
    }

    fn chart() -> TypeChart {
        TypeChart::from_json(
            r#"{"water": {"fire": 2.0, "grass": 0.5},
                "normal": {"ghost": 0.0}}"#,
        )
        .unwrap()
    }

    fn input<'a>(move_data: &'a MoveData, chart: &'a TypeChart) -> DamageInput<'a> {
        DamageInput {
            move_data,
            weather: None,
            terrain: None,
            chart,
        }
    }

    #[test]
    fn stage_table_matches_classic_values() {
        assert_eq!(apply_stage(100, 0), 100);
        assert_eq!(apply_stage(100, 1), 150);
        assert_eq!(apply_stage(100, 6), 400);
        assert_eq!(apply_stage(100, -1), 66);
        assert_eq!(apply_stage(100, -6), 25);
    }

    #[test]
    fn immunity_returns_zero_damage() {
        let calc = StandardCalculator;
        let chart = chart();
        let tackle = physical("tackle", "normal", 40);
        let attacker = Combatant::new("A", 50, stats(100, 100, 100)).with_types(&["normal"]);
        let mut defender = Combatant::new("B", 50, stats(100, 100, 100)).with_types(&["ghost"]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = calc.calculate(
            &attacker,
            &mut defender,
            &input(&tackle, &chart),
            &NoopStatusHandler,
            &mut rng,
        );
        assert_eq!(outcome.damage, 0);
        assert_eq!(outcome.effectiveness, 0.0);
    }

    #[test]
    fn super_effective_stab_beats_neutral_no_stab() {
        let calc = StandardCalculator;
        let chart = chart();
        let surf = physical("surf", "water", 90);
        let attacker = Combatant::new("A", 50, stats(100, 100, 100)).with_types(&["water"]);
        let mut fire_target =
            Combatant::new("B", 50, stats(100, 100, 100)).with_types(&["fire"]);
        let mut neutral_target =
            Combatant::new("C", 50, stats(100, 100, 100)).with_types(&["normal"]);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let strong = calc.calculate(
            &attacker,
            &mut fire_target,
            &input(&surf, &chart),
            &NoopStatusHandler,
            &mut rng,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let neutral = calc.calculate(
            &attacker,
            &mut neutral_target,
            &input(&surf, &chart),
            &NoopStatusHandler,
            &mut rng,
        );

        assert_eq!(strong.effectiveness, 2.0);
        assert_eq!(neutral.effectiveness, 1.0);
        assert!(strong.damage > neutral.damage);
    }

    #[test]
    fn burn_halves_physical_damage() {
        let calc = StandardCalculator;
        let chart = chart();
        let tackle = physical("tackle", "normal", 80);
        let healthy = Combatant::new("A", 50, stats(120, 80, 100)).with_types(&["fighting"]);
        let mut burned = healthy.clone();
        burned.status = Some(StatusCondition::Burned);
        let mut defender = Combatant::new("B", 50, stats(100, 100, 100)).with_types(&["normal"]);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let full = calc.calculate(
            &healthy,
            &mut defender,
            &input(&tackle, &chart),
            &NoopStatusHandler,
            &mut rng,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let halved = calc.calculate(
            &burned,
            &mut defender,
            &input(&tackle, &chart),
            &NoopStatusHandler,
            &mut rng,
        );
        assert!(halved.damage < full.damage);
    }

    #[test]
    fn rain_boosts_water_and_dampens_fire() {
        let calc = StandardCalculator;
        let chart = TypeChart::default();
        let surf = physical("surf", "water", 90);
        let attacker = Combatant::new("A", 50, stats(100, 100, 100)).with_types(&["normal"]);
        let mut defender = Combatant::new("B", 50, stats(100, 100, 100)).with_types(&["normal"]);

        let mut dry_input = input(&surf, &chart);
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let dry = calc.calculate(
            &attacker,
            &mut defender,
            &dry_input,
            &NoopStatusHandler,
            &mut rng,
        );

        dry_input.weather = Some("rain");
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let wet = calc.calculate(
            &attacker,
            &mut defender,
            &dry_input,
            &NoopStatusHandler,
            &mut rng,
        );
        assert!(wet.damage > dry.damage);
    }

    #[test]
    fn status_move_applies_ailment_through_the_gate() {
        let calc = StandardCalculator;
        let chart = TypeChart::default();
        let toxin = MoveData {
            ailment: Some("tox".to_string()),
            category: MoveCategory::Status,
            power: 0,
            ..physical("toxin", "poison", 0)
        };
        let attacker = Combatant::new("A", 50, stats(100, 100, 100)).with_types(&["poison"]);
        let mut defender = Combatant::new("B", 50, stats(100, 100, 100)).with_types(&["normal"]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let outcome = calc.calculate(
            &attacker,
            &mut defender,
            &input(&toxin, &chart),
            &StandardStatusHandler,
            &mut rng,
        );
        assert_eq!(outcome.damage, 0);
        assert_eq!(defender.status, Some(StatusCondition::BadlyPoisoned));
        assert!(outcome.messages[0].contains("badly poisoned"));

        // Steel target shrugs it off.
        let mut steel = Combatant::new("C", 50, stats(100, 100, 100)).with_types(&["steel"]);
        let outcome = calc.calculate(
            &attacker,
            &mut steel,
            &input(&toxin, &chart),
            &StandardStatusHandler,
            &mut rng,
        );
        assert!(steel.status.is_none());
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn paralysis_halves_speed() {
        let calc = StandardCalculator;
        let mut c = Combatant::new("A", 50, stats(100, 100, 100));
        assert_eq!(calc.speed(&c), 100);
        c.status = Some(StatusCondition::Paralyzed);
        assert_eq!(calc.speed(&c), 50);
        c.stat_stages.shift(Stat::Speed, 2);
        assert_eq!(calc.speed(&c), 100);
    }
}
