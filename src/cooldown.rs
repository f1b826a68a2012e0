//! Pairwise duel cooldowns.
//!
//! The cooldown is mutual: the key canonicalizes the two account ids by
//! ordering them, so either side querying the pair lands on the same
//! row. At most one live expiry exists per unordered pair; re-arming
//! overwrites (last-arm-wins).

use crate::account::AccountId;
use crate::clock::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Canonical, order-independent key for an unordered account pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String);

impl PairKey {
    /// Build the key by ordering the two ids under their total order,
    /// so `of(a, b) == of(b, a)`.
    pub fn of(a: AccountId, b: AccountId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{lo}:{hi}"))
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expiry store for pair cooldowns.
pub struct CooldownRegistry {
    rows: Mutex<HashMap<PairKey, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl CooldownRegistry {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Remaining cooldown for the pair, or `None` once expired.
    ///
    /// Expired rows are pruned on the way out.
    pub fn check(&self, key: &PairKey) -> Option<Duration> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let expiry = rows.get(key)?;
        let remaining = *expiry - self.clock.now();
        if remaining > Duration::zero() {
            Some(remaining)
        } else {
            rows.remove(key);
            None
        }
    }

    /// Arm the cooldown: expiry = now + duration, overwriting any prior value.
    pub fn arm(&self, key: PairKey, duration: Duration) {
        let expiry = self.clock.now() + duration;
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.insert(key, expiry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_pair_key_symmetric() {
        let a = AccountId::new();
        let b = AccountId::new();
        assert_eq!(PairKey::of(a, b), PairKey::of(b, a));
        assert_ne!(PairKey::of(a, b), PairKey::of(a, AccountId::new()));
    }

    #[test]
    fn test_arm_then_check() {
        let clock = Arc::new(ManualClock::default());
        let registry = CooldownRegistry::new(clock.clone());
        let key = PairKey::of(AccountId::new(), AccountId::new());

        registry.arm(key.clone(), Duration::hours(6));
        let remaining = registry.check(&key).unwrap();
        assert!(remaining > Duration::zero());
        assert!(remaining <= Duration::hours(6));

        clock.advance(Duration::hours(6));
        assert!(registry.check(&key).is_none());
    }

    #[test]
    fn test_unarmed_pair_has_no_cooldown() {
        let registry = CooldownRegistry::new(Arc::new(ManualClock::default()));
        let key = PairKey::of(AccountId::new(), AccountId::new());
        assert!(registry.check(&key).is_none());
    }

    #[test]
    fn test_rearm_overwrites() {
        let clock = Arc::new(ManualClock::default());
        let registry = CooldownRegistry::new(clock.clone());
        let key = PairKey::of(AccountId::new(), AccountId::new());

        registry.arm(key.clone(), Duration::hours(1));
        registry.arm(key.clone(), Duration::hours(8));
        clock.advance(Duration::hours(2));
        // The later, longer arm wins.
        assert!(registry.check(&key).is_some());
    }

    #[test]
    fn test_zero_duration_expires_immediately() {
        let registry = CooldownRegistry::new(Arc::new(ManualClock::default()));
        let key = PairKey::of(AccountId::new(), AccountId::new());
        registry.arm(key.clone(), Duration::zero());
        assert!(registry.check(&key).is_none());
    }
}
