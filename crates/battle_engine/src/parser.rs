//! Free-text command parsing.
//!
//! Maps chat-style input onto an action intent using the active
//! combatant's move list. The caller resolves switch targets itself; the
//! parser only signals the intent.

use crate::combatant::Combatant;
use crate::data::MovesDb;

/// Parsed intent from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandIntent {
    /// The text asks for a switch; the caller picks the target slot.
    Switch,
    /// The text names one of the active combatant's moves.
    UseMove { move_id: String },
}

const SWITCH_KEYWORDS: [&str; 3] = ["switch", "swap", "go "];

/// Parse free text against a combatant's move list. Matching is
/// case-insensitive substring on either the move's display name or its id.
pub fn parse_command(text: &str, combatant: &Combatant, moves: &MovesDb) -> Option<CommandIntent> {
    let text = text.to_lowercase();

    if SWITCH_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return Some(CommandIntent::Switch);
    }

    for slot in &combatant.moves {
        let name_matches = moves
            .get_move(&slot.move_id)
            .is_some_and(|m| text.contains(&m.name.to_lowercase()));
        if name_matches || text.contains(&slot.move_id.to_lowercase()) {
            return Some(CommandIntent::UseMove {
                move_id: slot.move_id.clone(),
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::Stats;
    use crate::data::{MoveCategory, MoveData};

    fn moves_db() -> MovesDb {
        MovesDb::new([
            MoveData {
                id: "flame_burst".to_string(),
                name: "Flame Burst".to_string(),
                move_type: "fire".to_string(),
                category: MoveCategory::Special,
                power: 70,
                accuracy: Some(100),
                pp: 15,
                priority: 0,
                ailment: None,
                ailment_chance: 0,
            },
            MoveData {
                id: "tackle".to_string(),
                name: "Tackle".to_string(),
                move_type: "normal".to_string(),
                category: MoveCategory::Physical,
                power: 40,
                accuracy: Some(100),
                pp: 35,
                priority: 0,
                ailment: None,
                ailment_chance: 0,
            },
        ])
    }

    fn fighter() -> Combatant {
        Combatant::new(
            "Testling",
            50,
            Stats {
                hp: 100,
                attack: 50,
                defense: 50,
                sp_attack: 50,
                sp_defense: 50,
                speed: 50,
            },
        )
        .with_move("flame_burst", 15)
        .with_move("tackle", 35)
    }

    #[test]
    fn switch_keywords_win_over_move_names() {
        let moves = moves_db();
        let c = fighter();
        assert_eq!(
            parse_command("switch to tackle", &c, &moves),
            Some(CommandIntent::Switch)
        );
        assert_eq!(parse_command("SWAP now", &c, &moves), Some(CommandIntent::Switch));
        assert_eq!(parse_command("go get them", &c, &moves), Some(CommandIntent::Switch));
    }

    #[test]
    fn move_matches_by_name_or_id() {
        let moves = moves_db();
        let c = fighter();
        assert_eq!(
            parse_command("use Flame Burst!", &c, &moves),
            Some(CommandIntent::UseMove {
                move_id: "flame_burst".to_string()
            })
        );
        assert_eq!(
            parse_command("flame_burst", &c, &moves),
            Some(CommandIntent::UseMove {
                move_id: "flame_burst".to_string()
            })
        );
    }

    #[test]
    fn first_listed_move_wins_ties() {
        let moves = moves_db();
        let c = fighter();
        assert_eq!(
            parse_command("flame burst then tackle", &c, &moves),
            Some(CommandIntent::UseMove {
                move_id: "flame_burst".to_string()
            })
        );
    }

    #[test]
    fn unmatched_text_returns_none() {
        let moves = moves_db();
        let c = fighter();
        assert_eq!(parse_command("dance around", &c, &moves), None);
    }
}
