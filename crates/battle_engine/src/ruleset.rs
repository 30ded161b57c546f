//! Move-legality rulesets.
//!
//! A ruleset is a named set of constraints; the engine only queries move
//! legality. Definitions can be injected from JSON; two permissive
//! defaults always exist.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

pub const STANDARD: &str = "standard";
pub const STANDARD_NATDEX: &str = "standardnatdex";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ruleset {
    pub name: String,
    #[serde(default)]
    pub banned_moves: HashSet<String>,
}

#[derive(Debug, Clone)]
pub struct RulesetHandler {
    rulesets: HashMap<String, Ruleset>,
}

impl Default for RulesetHandler {
    fn default() -> Self {
        let mut handler = Self {
            rulesets: HashMap::new(),
        };
        handler.insert(Ruleset {
            name: STANDARD.to_string(),
            banned_moves: HashSet::new(),
        });
        handler.insert(Ruleset {
            name: STANDARD_NATDEX.to_string(),
            banned_moves: HashSet::new(),
        });
        handler
    }
}

impl RulesetHandler {
    pub fn insert(&mut self, ruleset: Ruleset) {
        self.rulesets.insert(ruleset.name.clone(), ruleset);
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut handler = Self::default();
        let rulesets: Vec<Ruleset> = serde_json::from_str(json)?;
        for ruleset in rulesets {
            handler.insert(ruleset);
        }
        Ok(handler)
    }

    /// Map a short tag to a full ruleset name, falling back to `standard`.
    pub fn resolve_default_ruleset(&self, tag: &str) -> String {
        let name = match tag {
            "nat" => STANDARD_NATDEX,
            other if self.rulesets.contains_key(other) => other,
            _ => STANDARD,
        };
        name.to_string()
    }

    /// Move legality under a ruleset. Unknown rulesets allow everything.
    pub fn is_move_allowed(&self, move_id: &str, ruleset: &str) -> Result<(), String> {
        if let Some(def) = self.rulesets.get(ruleset) {
            if def.banned_moves.contains(move_id) {
                return Err(format!("banned in {}", def.name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nat_tag_resolves_to_natdex() {
        let handler = RulesetHandler::default();
        assert_eq!(handler.resolve_default_ruleset("nat"), STANDARD_NATDEX);
        assert_eq!(handler.resolve_default_ruleset("unknown"), STANDARD);
    }

    #[test]
    fn banned_move_is_rejected_with_reason() {
        let mut handler = RulesetHandler::default();
        handler.insert(Ruleset {
            name: "league_cup".to_string(),
            banned_moves: ["hyper_drill".to_string()].into_iter().collect(),
        });

        assert!(handler.is_move_allowed("hyper_drill", "league_cup").is_err());
        assert!(handler.is_move_allowed("tackle", "league_cup").is_ok());
        // Default rulesets ban nothing.
        assert!(handler.is_move_allowed("hyper_drill", STANDARD).is_ok());
    }

    #[test]
    fn rulesets_load_from_json() {
        let handler = RulesetHandler::from_json(
            r#"[{"name": "no_quake", "banned_moves": ["quake"]}]"#,
        )
        .unwrap();
        assert!(handler.is_move_allowed("quake", "no_quake").is_err());
        assert_eq!(handler.resolve_default_ruleset("no_quake"), "no_quake");
    }
}
