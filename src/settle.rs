//! The reward ledger: what a settled duel does to the two accounts.
//!
//! One call computes the xp transfer, the loser's stability penalty,
//! and the two probabilistic spoils (item drop, ability transfer), all
//! from a single threaded rng so one seed fixes every draw. The result
//! is a [`Settlement`] carrying the full delta sets; nothing is applied
//! here.
//!
//! Draw order within a settlement is fixed: item-drop gate, item
//! selection, ability gate, ability selection.

use crate::account::{Account, AccountId, AttributeDelta};
use crate::config::DuelConfig;
use crate::outcome::percent_roll;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Outcome of the item-drop roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemDrop {
    /// One unit of this item moves from loser to winner.
    Dropped { item: String },
    /// The chance passed but the loser holds nothing with quantity > 0.
    NothingToDrop,
    /// The chance did not pass.
    Missed,
}

/// Outcome of the ability-transfer roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityTransfer {
    /// The winner learned this ability from the loser.
    Learned { ability: String },
    /// The chosen ability was already known; no duplicate is granted.
    AlreadyKnown { ability: String },
    /// The chance passed but the loser knows nothing.
    NothingToLearn,
    /// The chance did not pass.
    Missed,
}

/// The full set of attribute mutations from one resolved duel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub winner: AccountId,
    pub loser: AccountId,
    pub xp_delta: i64,
    pub stability_before: i64,
    pub stability_after: i64,
    pub item_drop: ItemDrop,
    pub ability: AbilityTransfer,
}

impl Settlement {
    /// The item that changed hands, if any.
    pub fn item_dropped(&self) -> Option<&str> {
        match &self.item_drop {
            ItemDrop::Dropped { item } => Some(item),
            _ => None,
        }
    }

    /// The ability the winner learned, if any.
    pub fn ability_learned(&self) -> Option<&str> {
        match &self.ability {
            AbilityTransfer::Learned { ability } => Some(ability),
            _ => None,
        }
    }

    /// Deltas to apply to the winner.
    pub fn winner_deltas(&self) -> Vec<AttributeDelta> {
        let mut deltas = vec![AttributeDelta::Xp { amount: self.xp_delta }];
        if let ItemDrop::Dropped { item } = &self.item_drop {
            deltas.push(AttributeDelta::AddItem {
                item: item.clone(),
                quantity: 1,
            });
        }
        if let AbilityTransfer::Learned { ability } = &self.ability {
            deltas.push(AttributeDelta::GrantAbility {
                ability: ability.clone(),
            });
        }
        deltas
    }

    /// Deltas to apply to the loser.
    pub fn loser_deltas(&self) -> Vec<AttributeDelta> {
        let mut deltas = vec![
            AttributeDelta::Xp { amount: -self.xp_delta },
            AttributeDelta::SetStability { value: self.stability_after },
        ];
        if let ItemDrop::Dropped { item } = &self.item_drop {
            deltas.push(AttributeDelta::RemoveItem {
                item: item.clone(),
                quantity: 1,
            });
        }
        deltas
    }
}

/// Xp taken from the loser.
///
/// `gap_ratio = |winner_xp - loser_xp| / max(winner_xp, loser_xp, 1)`,
/// clamped to [0, 1]; the transfer percentage is
/// `min(max, base + scale * gap_ratio * 100)`; the delta is
/// `floor(loser_xp * percent / 100)`, never more than the loser holds.
pub fn xp_transfer_delta(winner_xp: i64, loser_xp: i64, config: &DuelConfig) -> i64 {
    let w = winner_xp.max(0);
    let l = loser_xp.max(0);
    let denom = w.max(l).max(1) as f64;
    let gap_ratio = ((w - l).abs() as f64 / denom).clamp(0.0, 1.0);
    let percent = (config.xp_transfer_base_percent as f64
        + config.xp_transfer_scale * gap_ratio * 100.0)
        .min(config.xp_transfer_max_percent as f64);
    let delta = (l as f64 * percent / 100.0).floor() as i64;
    delta.clamp(0, l)
}

/// Loser's stability after the fixed 30% penalty: `floor(current * 0.70)`.
pub fn stability_after(stability: i64) -> i64 {
    (stability.max(0) * 7) / 10
}

/// Compute the complete settlement for a resolved duel.
pub fn settle<R: Rng + ?Sized>(
    winner: &Account,
    loser: &Account,
    config: &DuelConfig,
    rng: &mut R,
) -> Settlement {
    let xp_delta = xp_transfer_delta(winner.xp, loser.xp, config);

    let item_drop = if percent_roll(config.item_drop_chance_percent, rng) {
        // Sorted keys so a fixed seed fixes the choice.
        let mut stocked: Vec<&String> = loser
            .items
            .iter()
            .filter(|(_, quantity)| **quantity > 0)
            .map(|(item, _)| item)
            .collect();
        stocked.sort();
        if stocked.is_empty() {
            ItemDrop::NothingToDrop
        } else {
            let item = stocked[rng.gen_range(0..stocked.len())].clone();
            ItemDrop::Dropped { item }
        }
    } else {
        ItemDrop::Missed
    };

    let ability = if percent_roll(config.learn_ability_chance_percent, rng) {
        let mut known: Vec<&String> = loser.abilities.iter().collect();
        known.sort();
        if known.is_empty() {
            AbilityTransfer::NothingToLearn
        } else {
            let ability = known[rng.gen_range(0..known.len())].clone();
            if winner.abilities.contains(&ability) {
                AbilityTransfer::AlreadyKnown { ability }
            } else {
                AbilityTransfer::Learned { ability }
            }
        }
    } else {
        AbilityTransfer::Missed
    };

    Settlement {
        winner: winner.id,
        loser: loser.id,
        xp_delta,
        stability_before: loser.stability,
        stability_after: stability_after(loser.stability),
        item_drop,
        ability,
    }
}
