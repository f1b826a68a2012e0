//! Duel configuration snapshots.
//!
//! All tunables travel as an immutable [`DuelConfig`] handed to each
//! resolution call. The engine never reads ambient global state, which
//! is what keeps resolution a pure function of its explicit inputs.

use crate::events::RandomEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a winner is chosen from two power values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMode {
    /// Higher power wins; ties fall to a fair coin flip.
    #[default]
    HigherWins,
    /// Win probability proportional to own share of the combined power.
    Ratio,
}

/// Errors from configuration validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be within [0, 100], got {value}")]
    PercentOutOfRange { field: &'static str, value: u8 },
    #[error("cooldown_hours_between_pair must be >= 0, got {hours}")]
    NegativeCooldown { hours: i64 },
    #[error("xp_transfer_scale must be a finite value >= 0, got {scale}")]
    InvalidScale { scale: f64 },
}

/// Immutable snapshot of every duel tunable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Self-initiated duels an account may start per calendar date.
    pub daily_active_limit: u32,
    /// Shared cooldown between one unordered pair of accounts.
    pub cooldown_hours_between_pair: i64,
    /// When set, accounts with the peace flag cannot be challenged.
    pub respect_peace_mode: bool,
    pub power_resolution_mode: ResolutionMode,
    /// Ceiling on the xp transfer percentage.
    pub xp_transfer_max_percent: u8,
    /// Base xp transfer percentage before the gap bonus.
    pub xp_transfer_base_percent: u8,
    /// Multiplier on the xp-gap ratio contribution to the percentage.
    pub xp_transfer_scale: f64,
    pub learn_ability_chance_percent: u8,
    pub item_drop_chance_percent: u8,
    pub special_event_chance_percent: u8,
    /// Ordered bonus/penalty event list evaluated after settlement.
    pub random_events: Vec<RandomEvent>,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            daily_active_limit: 3,
            cooldown_hours_between_pair: 6,
            respect_peace_mode: true,
            power_resolution_mode: ResolutionMode::HigherWins,
            xp_transfer_max_percent: 10,
            xp_transfer_base_percent: 2,
            xp_transfer_scale: 0.5,
            learn_ability_chance_percent: 3,
            item_drop_chance_percent: 5,
            special_event_chance_percent: 10,
            random_events: Vec::new(),
        }
    }
}

impl DuelConfig {
    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_active_limit = limit;
        self
    }

    pub fn with_cooldown_hours(mut self, hours: i64) -> Self {
        self.cooldown_hours_between_pair = hours;
        self
    }

    pub fn with_respect_peace_mode(mut self, respect: bool) -> Self {
        self.respect_peace_mode = respect;
        self
    }

    pub fn with_resolution_mode(mut self, mode: ResolutionMode) -> Self {
        self.power_resolution_mode = mode;
        self
    }

    pub fn with_transfer_percents(mut self, base: u8, max: u8, scale: f64) -> Self {
        self.xp_transfer_base_percent = base;
        self.xp_transfer_max_percent = max;
        self.xp_transfer_scale = scale;
        self
    }

    pub fn with_ability_chance(mut self, percent: u8) -> Self {
        self.learn_ability_chance_percent = percent;
        self
    }

    pub fn with_item_drop_chance(mut self, percent: u8) -> Self {
        self.item_drop_chance_percent = percent;
        self
    }

    pub fn with_event_chance(mut self, percent: u8) -> Self {
        self.special_event_chance_percent = percent;
        self
    }

    pub fn with_random_events(mut self, events: Vec<RandomEvent>) -> Self {
        self.random_events = events;
        self
    }

    /// Check every tunable is within its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let percents = [
            ("xp_transfer_max_percent", self.xp_transfer_max_percent),
            ("xp_transfer_base_percent", self.xp_transfer_base_percent),
            (
                "learn_ability_chance_percent",
                self.learn_ability_chance_percent,
            ),
            ("item_drop_chance_percent", self.item_drop_chance_percent),
            (
                "special_event_chance_percent",
                self.special_event_chance_percent,
            ),
        ];
        for (field, value) in percents {
            if value > 100 {
                return Err(ConfigError::PercentOutOfRange { field, value });
            }
        }
        if self.cooldown_hours_between_pair < 0 {
            return Err(ConfigError::NegativeCooldown {
                hours: self.cooldown_hours_between_pair,
            });
        }
        if !self.xp_transfer_scale.is_finite() || self.xp_transfer_scale < 0.0 {
            return Err(ConfigError::InvalidScale {
                scale: self.xp_transfer_scale,
            });
        }
        Ok(())
    }
}

/// Supplies the configuration snapshot for each resolution call.
pub trait ConfigProvider: Send + Sync {
    fn snapshot(&self) -> DuelConfig;
}

/// A provider that always returns the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfig(pub DuelConfig);

impl ConfigProvider for StaticConfig {
    fn snapshot(&self) -> DuelConfig {
        self.0.clone()
    }
}
