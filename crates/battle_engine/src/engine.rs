//! Battle registry and turn resolver.
//!
//! [`BattleEngine`] owns every live session, keyed by [`BattleId`]. Clients
//! register one action per side; once the human sides are in,
//! [`BattleEngine::process_turn`] synthesizes AI actions, orders everything
//! by priority class and speed, resolves the turn against the shared field
//! and reports the narration. A forced-switch phase interrupts normal
//! resolution whenever an active slot is vacated mid-turn.

use std::collections::HashMap;

use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::actions::{order_actions, BattleAction, OrderKey, CLASS_FLEE, CLASS_ITEM, CLASS_SWITCH};
use crate::combatant::{Combatant, Volatiles};
use crate::data::{ItemsDb, MovesDb, SpeciesDb, TypeChart, STRUGGLE};
use crate::error::BattleError;
use crate::hazards;
use crate::items::HeldItemManager;
use crate::ruleset::RulesetHandler;
use crate::state::{
    BattleFormat, BattleId, BattleMode, BattleState, Battler, Phase, Side, Winner,
};
use crate::subsystems::{
    AbilityHandler, DamageCalculator, DamageInput, FlatCalculator, NoopAbilityHandler,
    NoopStatusHandler, StandardAbilityHandler, StandardCalculator, StandardStatusHandler,
    StatusHandler,
};

/// Everything needed to open a session. Convenience starters fill most of
/// this in; [`StartOptions::new`] gives sensible defaults for the rest.
pub struct StartOptions {
    pub trainer_id: i64,
    pub trainer_name: String,
    pub trainer_party: Vec<Combatant>,
    pub opponent_party: Vec<Combatant>,
    pub mode: BattleMode,
    pub format: BattleFormat,
    /// Synthesized when absent: -1 for wild, a random negative id for NPCs.
    pub opponent_id: Option<i64>,
    pub opponent_name: Option<String>,
    pub opponent_is_ai: bool,
    pub trainer_class: Option<String>,
    pub prize_money: u32,
    pub is_ranked: bool,
    pub ranked_context: serde_json::Value,
    pub ruleset_tag: String,
    /// Fixes every roll in the session when set.
    pub seed: Option<u64>,
}

impl StartOptions {
    pub fn new(
        trainer_id: i64,
        trainer_name: impl Into<String>,
        trainer_party: Vec<Combatant>,
        opponent_party: Vec<Combatant>,
        mode: BattleMode,
    ) -> Self {
        Self {
            trainer_id,
            trainer_name: trainer_name.into(),
            trainer_party,
            opponent_party,
            mode,
            format: BattleFormat::Singles,
            opponent_id: None,
            opponent_name: None,
            opponent_is_ai: true,
            trainer_class: None,
            prize_money: 0,
            is_ranked: false,
            ranked_context: serde_json::Value::Null,
            ruleset_tag: "nat".to_string(),
            seed: None,
        }
    }

    pub fn format(mut self, format: BattleFormat) -> Self {
        self.format = format;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn ranked(mut self, context: serde_json::Value) -> Self {
        self.is_ranked = true;
        self.ranked_context = context;
        self
    }
}

/// Outcome of registering one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReceipt {
    /// Human side ids still owing an action. AI sides never appear here.
    pub waiting_for: Vec<i64>,
    pub ready_to_resolve: bool,
}

/// Everything a caller needs to render one resolved turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    /// Number of the turn just resolved.
    pub turn_number: u32,
    /// Move and end-of-turn narration, in resolution order.
    pub messages: Vec<String>,
    /// Manual and automatic switch narration, rendered separately.
    pub switch_messages: Vec<String>,
    pub is_over: bool,
    pub winner: Option<Winner>,
}

pub struct BattleEngine {
    moves: MovesDb,
    type_chart: TypeChart,
    species: SpeciesDb,
    held_items: HeldItemManager,
    rulesets: RulesetHandler,
    calculator: Box<dyn DamageCalculator>,
    status: Box<dyn StatusHandler>,
    abilities: Box<dyn AbilityHandler>,
    battles: HashMap<BattleId, BattleState>,
}

impl BattleEngine {
    /// Engine with degraded subsystems: flat damage, no status gates, no
    /// ability effects. Narration stays coherent, fidelity is reduced.
    pub fn new(moves: MovesDb, type_chart: TypeChart, species: SpeciesDb, items: ItemsDb) -> Self {
        Self::with_subsystems(
            moves,
            type_chart,
            species,
            items,
            Box::new(FlatCalculator),
            Box::new(NoopStatusHandler),
            Box::new(NoopAbilityHandler),
        )
    }

    /// Engine with the full-fidelity built-in subsystems.
    pub fn standard(
        moves: MovesDb,
        type_chart: TypeChart,
        species: SpeciesDb,
        items: ItemsDb,
    ) -> Self {
        Self::with_subsystems(
            moves,
            type_chart,
            species,
            items,
            Box::new(StandardCalculator),
            Box::new(StandardStatusHandler),
            Box::new(StandardAbilityHandler),
        )
    }

    pub fn with_subsystems(
        moves: MovesDb,
        type_chart: TypeChart,
        species: SpeciesDb,
        items: ItemsDb,
        calculator: Box<dyn DamageCalculator>,
        status: Box<dyn StatusHandler>,
        abilities: Box<dyn AbilityHandler>,
    ) -> Self {
        Self {
            moves,
            type_chart,
            species,
            held_items: HeldItemManager::new(items),
            rulesets: RulesetHandler::default(),
            calculator,
            status,
            abilities,
            battles: HashMap::new(),
        }
    }

    pub fn moves(&self) -> &MovesDb {
        &self.moves
    }

    pub fn species(&self) -> &SpeciesDb {
        &self.species
    }

    pub fn rulesets_mut(&mut self) -> &mut RulesetHandler {
        &mut self.rulesets
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    pub fn start_battle(&mut self, opts: StartOptions) -> Result<BattleId, BattleError> {
        if opts.trainer_party.is_empty() {
            return Err(BattleError::InvalidParty { side: "trainer" });
        }
        if opts.opponent_party.is_empty() {
            return Err(BattleError::InvalidParty { side: "opponent" });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(
            opts.seed.unwrap_or_else(|| rand::rng().random::<u64>()),
        );

        let slots = opts.format.slots();
        let trainer_actives: Vec<usize> = (0..opts.trainer_party.len().min(slots)).collect();
        let opponent_actives: Vec<usize> = (0..opts.opponent_party.len().min(slots)).collect();

        let wild = opts.mode == BattleMode::Wild;
        let opponent_id = opts.opponent_id.unwrap_or_else(|| {
            if wild {
                -1
            } else {
                -(rng.random_range(1000..10000i64))
            }
        });
        let opponent_name = opts.opponent_name.unwrap_or_else(|| {
            if wild {
                format!("Wild {}", opts.opponent_party[0].species_name)
            } else {
                "Opponent".to_string()
            }
        });

        let trainer = Battler {
            id: opts.trainer_id,
            name: opts.trainer_name,
            party: opts.trainer_party,
            active_positions: trainer_actives,
            is_ai: false,
            can_switch: true,
            can_use_items: true,
            can_flee: wild,
            trainer_class: None,
            prize_money: 0,
            hazards: HashMap::new(),
            screens: HashMap::new(),
        };
        let opponent = Battler {
            id: opponent_id,
            name: opponent_name,
            party: opts.opponent_party,
            active_positions: opponent_actives,
            is_ai: opts.opponent_is_ai,
            can_switch: !wild,
            can_use_items: opts.mode == BattleMode::Trainer,
            can_flee: false,
            trainer_class: opts.trainer_class,
            prize_money: opts.prize_money,
            hazards: HashMap::new(),
            screens: HashMap::new(),
        };

        let id = BattleId::generate();
        let mut battle = BattleState {
            id,
            mode: opts.mode,
            format: opts.format,
            trainer,
            opponent,
            is_ranked: opts.is_ranked,
            ranked_context: opts.ranked_context,
            turn_number: 1,
            phase: Phase::WaitingActions,
            forced_switch_battler_id: None,
            is_over: false,
            winner: None,
            fled: false,
            pending_actions: Vec::new(),
            pending_ai_switch_index: None,
            wild_dazed: false,
            weather: None,
            weather_turns: 0,
            terrain: None,
            terrain_turns: 0,
            entry_messages: Vec::new(),
            log: Vec::new(),
            ruleset: self.rulesets.resolve_default_ruleset(&opts.ruleset_tag),
            rng,
        };

        // Entry hooks for both sides' leads. Hazard maps start empty, but
        // the hook order (abilities, then hazards) is the same as mid-battle.
        let mut entry_messages = Vec::new();
        for side in [Side::Trainer, Side::Opponent] {
            let positions: Vec<usize> = battle.side(side).active_indices().collect();
            for idx in positions {
                entry_messages.extend(self.trigger_entry(&mut battle, side, idx));
            }
        }
        battle.log.extend(entry_messages.iter().cloned());
        battle.entry_messages = entry_messages;

        debug!(
            "battle {} started: {:?} {:?}, {} vs {}",
            id, battle.mode, battle.format, battle.trainer.name, battle.opponent.name
        );
        self.battles.insert(id, battle);
        Ok(id)
    }

    /// Wild encounter against a single untrained opponent.
    pub fn start_wild_battle(
        &mut self,
        trainer_id: i64,
        trainer_name: impl Into<String>,
        trainer_party: Vec<Combatant>,
        wild: Combatant,
    ) -> Result<BattleId, BattleError> {
        let name = format!("Wild {}", wild.species_name);
        let mut opts = StartOptions::new(
            trainer_id,
            trainer_name,
            trainer_party,
            vec![wild],
            BattleMode::Wild,
        );
        opts.opponent_name = Some(name);
        self.start_battle(opts)
    }

    /// Trainer-vs-NPC battle with class and prize metadata.
    #[allow(clippy::too_many_arguments)]
    pub fn start_trainer_battle(
        &mut self,
        trainer_id: i64,
        trainer_name: impl Into<String>,
        trainer_party: Vec<Combatant>,
        npc_party: Vec<Combatant>,
        npc_name: impl Into<String>,
        npc_class: impl Into<String>,
        prize_money: u32,
    ) -> Result<BattleId, BattleError> {
        let mut opts = StartOptions::new(
            trainer_id,
            trainer_name,
            trainer_party,
            npc_party,
            BattleMode::Trainer,
        );
        opts.opponent_name = Some(npc_name.into());
        opts.trainer_class = Some(npc_class.into());
        opts.prize_money = prize_money;
        self.start_battle(opts)
    }

    /// Trainer-vs-trainer battle; both sides are human.
    #[allow(clippy::too_many_arguments)]
    pub fn start_pvp_battle(
        &mut self,
        trainer_id: i64,
        trainer_name: impl Into<String>,
        trainer_party: Vec<Combatant>,
        opponent_id: i64,
        opponent_name: impl Into<String>,
        opponent_party: Vec<Combatant>,
        format: BattleFormat,
    ) -> Result<BattleId, BattleError> {
        let mut opts = StartOptions::new(
            trainer_id,
            trainer_name,
            trainer_party,
            opponent_party,
            BattleMode::Pvp,
        )
        .format(format);
        opts.opponent_id = Some(opponent_id);
        opts.opponent_name = Some(opponent_name.into());
        opts.opponent_is_ai = false;
        self.start_battle(opts)
    }

    pub fn get(&self, battle_id: BattleId) -> Option<&BattleState> {
        self.battles.get(&battle_id)
    }

    pub fn get_mut(&mut self, battle_id: BattleId) -> Option<&mut BattleState> {
        self.battles.get_mut(&battle_id)
    }

    /// Discard a session, returning its final state so the caller can
    /// persist combatant HP/PP/status.
    pub fn end_battle(&mut self, battle_id: BattleId) -> Option<BattleState> {
        debug!("battle {battle_id} discarded");
        self.battles.remove(&battle_id)
    }

    // ========================================================================
    // Action registration
    // ========================================================================

    pub fn register_action(
        &mut self,
        battle_id: BattleId,
        battler_id: i64,
        action: BattleAction,
    ) -> Result<ActionReceipt, BattleError> {
        let battle = self
            .battles
            .get_mut(&battle_id)
            .ok_or(BattleError::NotFound)?;

        battle
            .side_of(battler_id)
            .ok_or(BattleError::InvalidBattler { id: battler_id })?;

        if battle.is_over {
            return Err(BattleError::BattleOver);
        }

        if battle.phase == Phase::ForcedSwitch {
            if battle.forced_switch_battler_id == Some(battler_id) {
                if !matches!(action, BattleAction::Switch { .. }) {
                    return Err(BattleError::wrong_phase(
                        "You must switch to another creature!",
                    ));
                }
                battle.phase = Phase::WaitingActions;
                battle.forced_switch_battler_id = None;
            } else {
                return Err(BattleError::wrong_phase(
                    "Waiting for the opponent to switch...",
                ));
            }
        }

        trace!("battle {battle_id}: action registered for {battler_id}: {action:?}");
        battle.set_pending_action(battler_id, action);

        let waiting_for = battle.waiting_for();
        Ok(ActionReceipt {
            ready_to_resolve: waiting_for.is_empty(),
            waiting_for,
        })
    }

    /// Uniform random move with PP left, or the reserved struggle action.
    fn generate_ai_action(battle: &mut BattleState, side: Side) -> BattleAction {
        let battler = battle.side(side);
        let Some(lead) = battler.lead_index() else {
            return BattleAction::Move {
                move_id: STRUGGLE.to_string(),
                target: 0,
                mega_evolve: false,
            };
        };
        let usable: Vec<String> = battler.party[lead]
            .moves
            .iter()
            .filter(|slot| slot.pp > 0)
            .map(|slot| slot.move_id.clone())
            .collect();
        let move_id = if usable.is_empty() {
            STRUGGLE.to_string()
        } else {
            let pick = battle.rng.random_range(0..usable.len());
            usable[pick].clone()
        };
        BattleAction::Move {
            move_id,
            target: 0,
            mega_evolve: false,
        }
    }

    // ========================================================================
    // Turn resolution
    // ========================================================================

    /// Resolve one full turn with every registered action.
    pub fn process_turn(&mut self, battle_id: BattleId) -> Result<TurnReport, BattleError> {
        let mut battle = self
            .battles
            .remove(&battle_id)
            .ok_or(BattleError::NotFound)?;
        let report = self.run_turn(&mut battle);
        self.battles.insert(battle_id, battle);
        Ok(report)
    }

    fn run_turn(&self, battle: &mut BattleState) -> TurnReport {
        // Synthesize AI actions for any side that has not stored one.
        for side in [Side::Trainer, Side::Opponent] {
            let battler_id = battle.side(side).id;
            if battle.side(side).is_ai && !battle.has_pending_action(battler_id) {
                let action = Self::generate_ai_action(battle, side);
                battle.set_pending_action(battler_id, action);
            }
        }

        // A pending forced switch or daze survives into resolution; the
        // action loop honors it.
        if !matches!(battle.phase, Phase::ForcedSwitch | Phase::Dazed) {
            battle.phase = Phase::Resolving;
        }
        let mut turn_log: Vec<String> = Vec::new();
        let mut manual_switch_messages: Vec<String> = Vec::new();

        let pending = battle.pending_actions.clone();
        let ordered = order_actions(pending, |battler_id, action| {
            self.order_key(battle, battler_id, action)
        });
        trace!(
            "battle {}: turn {} order: {:?}",
            battle.id,
            battle.turn_number,
            ordered.iter().map(|(id, _)| *id).collect::<Vec<_>>()
        );

        for (battler_id, action) in ordered {
            // A daze or a finished battle stops the rest of the turn cold.
            if battle.is_over || battle.wild_dazed {
                break;
            }
            let Some(side) = battle.side_of(battler_id) else {
                continue;
            };
            // A side with no conscious fielded combatant forfeits its
            // action; it is either switching in or already beaten.
            if !battle.side(side).has_usable_active() {
                continue;
            }
            if battle.phase == Phase::ForcedSwitch
                && battle.forced_switch_battler_id == Some(battler_id)
                && !matches!(action, BattleAction::Switch { .. })
            {
                continue;
            }

            match action {
                BattleAction::Switch { slot } => {
                    manual_switch_messages.extend(self.execute_switch(battle, side, slot, false));
                }
                BattleAction::Move {
                    move_id, target, ..
                } => {
                    turn_log.extend(self.execute_move(battle, side, &move_id, target));
                }
                BattleAction::Item { item_id, .. } => {
                    turn_log.push(format!("Used {item_id}!"));
                }
                BattleAction::Flee => {
                    turn_log.extend(self.execute_flee(battle, side));
                }
            }
        }

        // End-of-turn effects and queued AI replacements are both skipped
        // while a wild daze is waiting on the capture flow.
        let auto_switch_messages = if battle.wild_dazed {
            Vec::new()
        } else {
            turn_log.extend(self.end_of_turn(battle));
            self.auto_switch_forced_ai(battle)
        };
        let switch_messages: Vec<String> = manual_switch_messages
            .into_iter()
            .chain(auto_switch_messages)
            .collect();

        Self::check_battle_end(battle);

        battle.pending_actions.clear();
        battle.turn_number += 1;

        if battle.is_over {
            battle.phase = Phase::End;
        } else if battle.wild_dazed {
            battle.phase = Phase::Dazed;
        } else if battle.phase != Phase::ForcedSwitch {
            battle.phase = Phase::WaitingActions;
        }

        battle.log.extend(turn_log.iter().cloned());
        battle.log.extend(switch_messages.iter().cloned());

        debug!(
            "battle {}: turn {} resolved, phase {:?}, over={}",
            battle.id,
            battle.turn_number - 1,
            battle.phase,
            battle.is_over
        );

        TurnReport {
            turn_number: battle.turn_number - 1,
            messages: turn_log,
            switch_messages,
            is_over: battle.is_over,
            winner: battle.winner,
        }
    }

    fn order_key(&self, battle: &BattleState, battler_id: i64, action: &BattleAction) -> OrderKey {
        match action {
            BattleAction::Switch { .. } => OrderKey::fixed(CLASS_SWITCH),
            BattleAction::Item { .. } => OrderKey::fixed(CLASS_ITEM),
            BattleAction::Flee => OrderKey::fixed(CLASS_FLEE),
            BattleAction::Move { move_id, .. } => {
                let priority = self
                    .moves
                    .get_move(move_id)
                    .map(|m| m.priority)
                    .unwrap_or(0);
                let speed = battle
                    .side_of(battler_id)
                    .map(|side| battle.side(side))
                    .and_then(|battler| battler.lead_index().map(|i| &battler.party[i]))
                    .map(|lead| self.effective_speed(lead))
                    .unwrap_or(0);
                OrderKey::for_move(priority, speed)
            }
        }
    }

    /// Calculator speed (stages, paralysis) times any held-item multiplier.
    fn effective_speed(&self, combatant: &Combatant) -> i32 {
        let base = self.calculator.speed(combatant) as f64;
        (base * self.held_items.speed_multiplier(combatant)).round() as i32
    }

    // ========================================================================
    // Individual actions
    // ========================================================================

    fn execute_move(
        &self,
        battle: &mut BattleState,
        attacker_side: Side,
        move_id: &str,
        target: usize,
    ) -> Vec<String> {
        let defender_side = attacker_side.opposite();
        let Some(attacker_idx) = battle.side(attacker_side).lead_index() else {
            return Vec::new();
        };
        let Some(defender_idx) = Self::resolve_target(battle.side(defender_side), target) else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        let (defender_downed, attacker_downed) = {
            let BattleState {
                trainer,
                opponent,
                rng,
                weather,
                terrain,
                ruleset,
                ..
            } = battle;
            let (att_battler, def_battler) = match attacker_side {
                Side::Trainer => (trainer, opponent),
                Side::Opponent => (opponent, trainer),
            };
            let attacker = &mut att_battler.party[attacker_idx];

            if let Some(prevention) = self.status.can_move(attacker, rng) {
                return vec![prevention];
            }

            let Some(move_data) = self.moves.get_move(move_id).cloned() else {
                return vec![format!(
                    "{} tried to use an unknown move!",
                    attacker.species_name
                )];
            };

            if let Some(refusal) =
                self.held_items
                    .check_move_restriction(attacker, &move_data, &self.moves)
            {
                return vec![refusal];
            }

            if let Err(reason) = self.rulesets.is_move_allowed(&move_data.id, ruleset) {
                return vec![format!(
                    "{} tried to use {} but it's banned by rules ({}).",
                    attacker.species_name, move_data.name, reason
                )];
            }

            attacker.deduct_pp(&move_data.id);

            let defender = &mut def_battler.party[defender_idx];
            let input = DamageInput {
                move_data: &move_data,
                weather: weather.as_deref(),
                terrain: terrain.as_deref(),
                chart: &self.type_chart,
            };
            let outcome =
                self.calculator
                    .calculate(attacker, defender, &input, self.status.as_ref(), rng);
            let mut effect_msgs = outcome.messages;

            let (mut damage, held_msgs) =
                self.held_items
                    .modify_damage(attacker, defender, &move_data, outcome.damage, rng);
            effect_msgs.extend(held_msgs);

            if damage >= defender.current_hp
                && defender.volatiles.contains(Volatiles::ENDURE)
                && defender.current_hp > 1
            {
                damage = defender.current_hp - 1;
                effect_msgs.push(format!("{} endured the hit!", defender.species_name));
            }

            if damage > 0 {
                defender.apply_damage(damage);
            }

            let mut move_msg = format!("{} used {}!", attacker.species_name, move_data.name);
            if damage > 0 {
                let crit_text = if outcome.is_crit {
                    " It's a critical hit!"
                } else {
                    ""
                };
                let eff_text = if outcome.effectiveness > 1.0 {
                    " It's super effective!"
                } else if outcome.effectiveness > 0.0 && outcome.effectiveness < 1.0 {
                    " It's not very effective..."
                } else {
                    ""
                };
                move_msg.push_str(&format!(" ({damage} damage){crit_text}{eff_text}"));
            } else if outcome.effectiveness == 0.0 {
                move_msg.push_str(" It doesn't affect the target...");
            }
            messages.push(move_msg);
            messages.extend(effect_msgs);

            messages.extend(
                self.held_items
                    .apply_after_damage(attacker, &move_data, damage),
            );

            (
                def_battler.party[defender_idx].current_hp == 0,
                att_battler.party[attacker_idx].current_hp == 0,
            )
        };

        if defender_downed {
            self.handle_knockout(battle, defender_side, defender_idx, &mut messages);
        }
        // Held-item recoil can drop the attacker too; it goes through the
        // same faint handling so forced switches and draws fall out.
        if attacker_downed && !battle.is_over && !battle.wild_dazed {
            self.handle_knockout(battle, attacker_side, attacker_idx, &mut messages);
        }

        messages
    }

    /// Pick the defender's party index for a move aimed at `target` (a slot
    /// in the defender's active list), preferring a conscious target.
    fn resolve_target(defender: &Battler, target: usize) -> Option<usize> {
        let actives: Vec<usize> = defender.active_indices().collect();
        if actives.is_empty() {
            return None;
        }
        let requested = actives.get(target).copied().unwrap_or(actives[0]);
        if defender.party[requested].is_usable() {
            return Some(requested);
        }
        actives
            .into_iter()
            .find(|&i| defender.party[i].is_usable())
    }

    /// Faint / daze handling for any combatant that just hit 0 HP.
    fn handle_knockout(
        &self,
        battle: &mut BattleState,
        side: Side,
        fallen_idx: usize,
        messages: &mut Vec<String>,
    ) {
        if battle.side(side).party[fallen_idx].is_usable() {
            return;
        }

        // Wild opponents never truly faint: they are clamped to 1 HP and
        // the battle pauses for the caller's capture prompt.
        if battle.mode == BattleMode::Wild && side == Side::Opponent {
            let fallen = &mut battle.side_mut(side).party[fallen_idx];
            fallen.current_hp = 1;
            let name = fallen.species_name.clone();
            battle.wild_dazed = true;
            battle.phase = Phase::Dazed;
            messages.push(format!("The wild {name} is dazed!"));
            return;
        }

        let (battler_id, battler_name, is_ai, replacement) = {
            let battler = battle.side(side);
            let replacement = battler
                .party
                .iter()
                .enumerate()
                .find(|(i, c)| *i != fallen_idx && c.is_usable())
                .map(|(i, _)| i);
            (battler.id, battler.name.clone(), battler.is_ai, replacement)
        };
        messages.push(format!(
            "{} fainted!",
            battle.side(side).party[fallen_idx].species_name
        ));

        match replacement {
            Some(slot) if is_ai => {
                // Queue the replacement; the resolver performs it after
                // end-of-turn.
                battle.phase = Phase::ForcedSwitch;
                battle.forced_switch_battler_id = Some(battler_id);
                battle.pending_ai_switch_index = Some(slot);
            }
            Some(_) => {
                messages.push(format!("{battler_name} must send out another creature!"));
                battle.phase = Phase::ForcedSwitch;
                battle.forced_switch_battler_id = Some(battler_id);
            }
            None => Self::check_battle_end(battle),
        }
    }

    fn execute_switch(
        &self,
        battle: &mut BattleState,
        side: Side,
        slot: usize,
        forced: bool,
    ) -> Vec<String> {
        {
            let battler = battle.side(side);
            let valid = slot < battler.party.len()
                && battler.party[slot].is_usable()
                && !battler.active_positions.contains(&slot);
            if !valid {
                return vec![format!(
                    "{} can't switch to that creature!",
                    battler.name
                )];
            }
        }

        let (old_name, new_name, battler_name) = {
            let battler = battle.side_mut(side);
            // Refill a vacated (fainted) slot when there is one, otherwise
            // rotate the lead slot.
            let pos = battler
                .active_positions
                .iter()
                .position(|&i| i < battler.party.len() && !battler.party[i].is_usable())
                .unwrap_or(0);
            let old_idx = battler.active_positions[pos];
            if let Some(old) = battler.party.get_mut(old_idx) {
                old.reset_on_switch_out();
            }
            battler.active_positions[pos] = slot;
            (
                battler.party[old_idx].species_name.clone(),
                battler.party[slot].species_name.clone(),
                battler.name.clone(),
            )
        };

        let mut messages = if forced {
            vec![format!("{battler_name} sent out {new_name}!")]
        } else {
            vec![
                format!("{battler_name} withdrew {old_name}!"),
                format!("Go, {new_name}!"),
            ]
        };
        messages.extend(self.trigger_entry(battle, side, slot));
        messages
    }

    fn execute_flee(&self, battle: &mut BattleState, _side: Side) -> Vec<String> {
        if battle.mode != BattleMode::Wild {
            return vec!["Can't flee from a trainer battle!".to_string()];
        }
        if battle.rng.random_bool(0.5) {
            battle.is_over = true;
            battle.fled = true;
            battle.winner = None;
            vec!["Got away safely!".to_string()]
        } else {
            vec!["Can't escape!".to_string()]
        }
    }

    // ========================================================================
    // Entry hooks
    // ========================================================================

    /// On-entry abilities first, then entry hazards.
    fn trigger_entry(&self, battle: &mut BattleState, side: Side, party_idx: usize) -> Vec<String> {
        let mut messages = self.abilities.on_entry(battle, side, party_idx);

        let Battler { hazards, party, .. } = battle.side_mut(side);
        if let Some(entrant) = party.get_mut(party_idx) {
            messages.extend(hazards::apply_entry_hazards(
                hazards,
                entrant,
                &self.type_chart,
                self.status.as_ref(),
            ));
        }
        messages
    }

    // ========================================================================
    // End of turn
    // ========================================================================

    fn end_of_turn(&self, battle: &mut BattleState) -> Vec<String> {
        let mut messages = Vec::new();

        // Status residuals and held-item healing per active combatant.
        for side in [Side::Trainer, Side::Opponent] {
            let indices: Vec<usize> = battle.side(side).active_indices().collect();
            for idx in indices {
                let combatant = &mut battle.side_mut(side).party[idx];
                messages.extend(self.status.end_of_turn(combatant));
                messages.extend(self.held_items.end_of_turn(combatant));
            }
        }

        // Weather chip damage / healing, then the timer.
        if let Some(weather) = battle.weather.clone() {
            for side in [Side::Trainer, Side::Opponent] {
                let indices: Vec<usize> = battle.side(side).active_indices().collect();
                for idx in indices {
                    let combatant = &mut battle.side_mut(side).party[idx];
                    if let Some(msg) = self.abilities.weather_damage(combatant, &weather) {
                        messages.push(msg);
                    }
                    if let Some(msg) = self.abilities.weather_healing(combatant, &weather) {
                        messages.push(msg);
                    }
                }
            }
            battle.weather_turns = battle.weather_turns.saturating_sub(1);
            if battle.weather_turns == 0 {
                messages.push(format!("The {weather} subsided!"));
                battle.weather = None;
            }
        }

        if let Some(terrain) = battle.terrain.clone() {
            battle.terrain_turns = battle.terrain_turns.saturating_sub(1);
            if battle.terrain_turns == 0 {
                messages.push(format!("The {terrain} terrain faded!"));
                battle.terrain = None;
            }
        }

        // Screens wear off on a per-side timer.
        for side in [Side::Trainer, Side::Opponent] {
            let battler = battle.side_mut(side);
            let mut expired = Vec::new();
            for (name, turns) in battler.screens.iter_mut() {
                *turns = turns.saturating_sub(1);
                if *turns == 0 {
                    expired.push(name.clone());
                }
            }
            for name in expired {
                battler.screens.remove(&name);
                messages.push(format!("{}'s {} wore off!", battler.name, name));
            }
        }

        // Residual damage can finish a combatant off.
        for side in [Side::Trainer, Side::Opponent] {
            if battle.is_over || battle.wild_dazed {
                break;
            }
            if battle.forced_switch_battler_id == Some(battle.side(side).id) {
                continue;
            }
            let downed: Vec<usize> = {
                let battler = battle.side(side);
                battler
                    .active_indices()
                    .filter(|&i| !battler.party[i].is_usable())
                    .collect()
            };
            for idx in downed {
                if battle.is_over || battle.wild_dazed {
                    break;
                }
                self.handle_knockout(battle, side, idx, &mut messages);
            }
        }

        messages
    }

    /// Perform a queued AI forced switch after end-of-turn.
    fn auto_switch_forced_ai(&self, battle: &mut BattleState) -> Vec<String> {
        if battle.phase != Phase::ForcedSwitch {
            return Vec::new();
        }
        let Some(forced_id) = battle.forced_switch_battler_id else {
            return Vec::new();
        };
        let Some(side) = battle.side_of(forced_id) else {
            return Vec::new();
        };
        if !battle.side(side).is_ai {
            return Vec::new();
        }

        let slot = battle.pending_ai_switch_index.or_else(|| {
            // Fallback: first conscious reserve.
            let battler = battle.side(side);
            let current = battler.active_positions.first().copied();
            battler
                .party
                .iter()
                .enumerate()
                .find(|(i, c)| Some(*i) != current && c.is_usable())
                .map(|(i, _)| i)
        });
        let Some(slot) = slot else {
            return Vec::new();
        };

        self.perform_forced_switch(battle, forced_id, slot)
            .unwrap_or_default()
    }

    // ========================================================================
    // Forced switches
    // ========================================================================

    /// Resolve a mandatory switch outside normal turn order.
    pub fn force_switch(
        &mut self,
        battle_id: BattleId,
        battler_id: i64,
        slot: usize,
    ) -> Result<Vec<String>, BattleError> {
        let mut battle = self
            .battles
            .remove(&battle_id)
            .ok_or(BattleError::NotFound)?;
        let result = self.perform_forced_switch(&mut battle, battler_id, slot);
        if let Ok(messages) = &result {
            battle.log.extend(messages.iter().cloned());
        }
        self.battles.insert(battle_id, battle);
        result
    }

    fn perform_forced_switch(
        &self,
        battle: &mut BattleState,
        battler_id: i64,
        slot: usize,
    ) -> Result<Vec<String>, BattleError> {
        if battle.phase != Phase::ForcedSwitch
            || battle.forced_switch_battler_id != Some(battler_id)
        {
            return Err(BattleError::wrong_phase("No forced switch is pending"));
        }
        let side = battle
            .side_of(battler_id)
            .ok_or(BattleError::InvalidBattler { id: battler_id })?;
        {
            let battler = battle.side(side);
            if slot >= battler.party.len() {
                return Err(BattleError::invalid_target("Invalid party slot"));
            }
            if !battler.party[slot].is_usable() {
                return Err(BattleError::invalid_target("That creature can't battle"));
            }
            if battler.active_positions.contains(&slot) {
                return Err(BattleError::invalid_target(
                    "That creature is already in battle",
                ));
            }
        }

        let messages = self.execute_switch(battle, side, slot, true);

        battle.phase = Phase::WaitingActions;
        battle.forced_switch_battler_id = None;
        battle.pending_ai_switch_index = None;
        battle.remove_pending_action(battler_id);

        Ok(messages)
    }

    // ========================================================================
    // Terminal detection
    // ========================================================================

    fn check_battle_end(battle: &mut BattleState) {
        let trainer_usable = battle.trainer.has_usable();
        let opponent_usable = battle.opponent.has_usable();

        if !trainer_usable && !opponent_usable {
            battle.is_over = true;
            battle.winner = Some(Winner::Draw);
        } else if !trainer_usable {
            battle.is_over = true;
            battle.winner = Some(Winner::Opponent);
        } else if !opponent_usable {
            battle.is_over = true;
            battle.winner = Some(Winner::Trainer);
        }

        if battle.is_over {
            battle.phase = Phase::End;
        }
    }
}
