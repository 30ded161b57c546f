//! Built-in nature table.
//!
//! Natures are the one piece of game data the engine carries itself: the
//! set is closed and the stat math depends on it. Modifiers are expressed
//! in tenths (9 = -10%, 10 = neutral, 11 = +10%).

use crate::combatant::Stat;

#[derive(Debug, Clone, Copy)]
pub struct Nature {
    pub plus: Option<Stat>,
    pub minus: Option<Stat>,
}

impl Nature {
    pub const NEUTRAL: Nature = Nature {
        plus: None,
        minus: None,
    };

    /// Modifier for a stat in tenths.
    pub fn stat_modifier(&self, stat: Stat) -> u16 {
        if self.plus == Some(stat) {
            11
        } else if self.minus == Some(stat) {
            9
        } else {
            10
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.plus.is_none()
    }
}

static NATURES: phf::Map<&'static str, Nature> = phf::phf_map! {
    "hardy" => Nature::NEUTRAL,
    "docile" => Nature::NEUTRAL,
    "serious" => Nature::NEUTRAL,
    "bashful" => Nature::NEUTRAL,
    "quirky" => Nature::NEUTRAL,
    "lonely" => Nature { plus: Some(Stat::Attack), minus: Some(Stat::Defense) },
    "brave" => Nature { plus: Some(Stat::Attack), minus: Some(Stat::Speed) },
    "adamant" => Nature { plus: Some(Stat::Attack), minus: Some(Stat::SpAttack) },
    "naughty" => Nature { plus: Some(Stat::Attack), minus: Some(Stat::SpDefense) },
    "bold" => Nature { plus: Some(Stat::Defense), minus: Some(Stat::Attack) },
    "relaxed" => Nature { plus: Some(Stat::Defense), minus: Some(Stat::Speed) },
    "impish" => Nature { plus: Some(Stat::Defense), minus: Some(Stat::SpAttack) },
    "lax" => Nature { plus: Some(Stat::Defense), minus: Some(Stat::SpDefense) },
    "timid" => Nature { plus: Some(Stat::Speed), minus: Some(Stat::Attack) },
    "hasty" => Nature { plus: Some(Stat::Speed), minus: Some(Stat::Defense) },
    "jolly" => Nature { plus: Some(Stat::Speed), minus: Some(Stat::SpAttack) },
    "naive" => Nature { plus: Some(Stat::Speed), minus: Some(Stat::SpDefense) },
    "modest" => Nature { plus: Some(Stat::SpAttack), minus: Some(Stat::Attack) },
    "mild" => Nature { plus: Some(Stat::SpAttack), minus: Some(Stat::Defense) },
    "quiet" => Nature { plus: Some(Stat::SpAttack), minus: Some(Stat::Speed) },
    "rash" => Nature { plus: Some(Stat::SpAttack), minus: Some(Stat::SpDefense) },
    "calm" => Nature { plus: Some(Stat::SpDefense), minus: Some(Stat::Attack) },
    "gentle" => Nature { plus: Some(Stat::SpDefense), minus: Some(Stat::Defense) },
    "sassy" => Nature { plus: Some(Stat::SpDefense), minus: Some(Stat::Speed) },
    "careful" => Nature { plus: Some(Stat::SpDefense), minus: Some(Stat::SpAttack) },
};

/// Look up a nature by name (case-insensitive). Unknown names are neutral.
pub fn lookup(name: &str) -> Nature {
    NATURES
        .get(name.to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(Nature::NEUTRAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adamant_boosts_attack_cuts_sp_attack() {
        let adamant = lookup("adamant");
        assert_eq!(adamant.stat_modifier(Stat::Attack), 11);
        assert_eq!(adamant.stat_modifier(Stat::SpAttack), 9);
        assert_eq!(adamant.stat_modifier(Stat::Speed), 10);
        assert!(!adamant.is_neutral());
    }

    #[test]
    fn hardy_is_neutral() {
        let hardy = lookup("Hardy");
        assert!(hardy.is_neutral());
        assert_eq!(hardy.stat_modifier(Stat::Attack), 10);
    }

    #[test]
    fn unknown_nature_falls_back_to_neutral() {
        assert!(lookup("mysterious").is_neutral());
    }
}
