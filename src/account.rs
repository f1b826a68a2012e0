//! Account state types.
//!
//! Contains the account snapshot the engine reads and the attribute
//! deltas it issues back to the host account store. The engine never
//! owns account state; it only computes and applies deltas.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant account as seen by the duel engine.
///
/// `xp` and `stability` never go below zero; the clamps live in
/// [`Account::apply`] so every delta application preserves them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Numeric attribute that biases or determines duel outcome.
    pub power: i64,
    /// Transferable progress resource.
    pub xp: i64,
    /// Resilience attribute reduced as a duel penalty.
    pub stability: i64,
    /// Accounts with the peace flag set cannot be challenged.
    pub peace_mode: bool,
    /// Learned ability tags.
    pub abilities: HashSet<String>,
    /// Inventory: item id to quantity (quantities stay >= 0).
    pub items: HashMap<String, i64>,
}

impl Account {
    /// Create an account with the given name and power, everything else zeroed.
    pub fn new(name: impl Into<String>, power: i64) -> Self {
        Self {
            id: AccountId::new(),
            name: name.into(),
            power,
            xp: 0,
            stability: 0,
            peace_mode: false,
            abilities: HashSet::new(),
            items: HashMap::new(),
        }
    }

    pub fn with_xp(mut self, xp: i64) -> Self {
        self.xp = xp;
        self
    }

    pub fn with_stability(mut self, stability: i64) -> Self {
        self.stability = stability;
        self
    }

    pub fn with_peace_mode(mut self, enabled: bool) -> Self {
        self.peace_mode = enabled;
        self
    }

    pub fn with_ability(mut self, tag: impl Into<String>) -> Self {
        self.abilities.insert(tag.into());
        self
    }

    pub fn with_item(mut self, item: impl Into<String>, quantity: i64) -> Self {
        self.items.insert(item.into(), quantity);
        self
    }

    /// Quantity held of an item (0 if absent).
    pub fn item_quantity(&self, item: &str) -> i64 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Apply a single delta, enforcing the non-negativity invariants.
    pub fn apply(&mut self, delta: &AttributeDelta) {
        match delta {
            AttributeDelta::Xp { amount } => {
                self.xp = (self.xp + amount).max(0);
            }
            AttributeDelta::SetStability { value } => {
                self.stability = (*value).max(0);
            }
            AttributeDelta::AddItem { item, quantity } => {
                *self.items.entry(item.clone()).or_insert(0) += (*quantity).max(0);
            }
            AttributeDelta::RemoveItem { item, quantity } => {
                if let Some(held) = self.items.get_mut(item) {
                    *held = (*held - (*quantity).max(0)).max(0);
                    if *held == 0 {
                        self.items.remove(item);
                    }
                }
            }
            AttributeDelta::GrantAbility { ability } => {
                self.abilities.insert(ability.clone());
            }
        }
    }

    /// Apply a sequence of deltas in order.
    pub fn apply_all(&mut self, deltas: &[AttributeDelta]) {
        for delta in deltas {
            self.apply(delta);
        }
    }
}

/// A concrete state change the engine issues against an account.
///
/// The full delta set of a settlement is persisted in the duel record,
/// so replaying a record against reset accounts reproduces the same
/// resulting attribute values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AttributeDelta {
    /// Signed xp adjustment; the result is clamped at zero.
    Xp { amount: i64 },
    /// Absolute stability value (already floored by the ledger).
    SetStability { value: i64 },
    /// Add quantity of an item.
    AddItem { item: String, quantity: i64 },
    /// Remove up to quantity of an item; quantity held never goes negative.
    RemoveItem { item: String, quantity: i64 },
    /// Grant an ability tag. Idempotent: granting a known ability is a no-op.
    GrantAbility { ability: String },
}
