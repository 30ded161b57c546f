//! Action model and turn-order scheduling.
//!
//! Ordering is by `(priority class, effective speed)` descending. Classes:
//! switch 100, item 90, moves use their intrinsic priority, flee 0. Equal
//! keys keep submission order, which the registry guarantees by inserting
//! actions in arrival order.

use serde::Deserialize;

/// A single submitted action. The owning battler id is tracked by the
/// registry's pending map, not the action itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BattleAction {
    Move {
        move_id: String,
        /// 0-based slot into the opposing side's active list.
        #[serde(default)]
        target: usize,
        #[serde(default)]
        mega_evolve: bool,
    },
    Switch {
        /// Index into the acting side's own party.
        slot: usize,
    },
    Item {
        item_id: String,
        /// Party slot receiving the item.
        #[serde(default)]
        target: usize,
    },
    Flee,
}

/// Sort key for one action: `(class, speed)`, compared descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OrderKey {
    pub class: i32,
    pub speed: i32,
}

pub const CLASS_SWITCH: i32 = 100;
pub const CLASS_ITEM: i32 = 90;
pub const CLASS_FLEE: i32 = 0;

impl OrderKey {
    /// Key for a non-move action. Switches and items outrun every move and
    /// tie-break among themselves by submission order.
    pub fn fixed(class: i32) -> Self {
        let speed = if class == CLASS_FLEE { 0 } else { 999 };
        OrderKey { class, speed }
    }

    pub fn for_move(priority: i8, speed: i32) -> Self {
        OrderKey {
            class: priority as i32,
            speed,
        }
    }
}

/// Order a turn's actions. Pure: the key function sees each action once and
/// the sort is stable, so equal keys retain registration order.
pub fn order_actions<F>(
    mut actions: Vec<(i64, BattleAction)>,
    mut key_fn: F,
) -> Vec<(i64, BattleAction)>
where
    F: FnMut(i64, &BattleAction) -> OrderKey,
{
    actions.sort_by_key(|(id, action)| std::cmp::Reverse(key_fn(*id, action)));
    actions
}
