//! Testing utilities for the duel engine.
//!
//! Provides a deterministic harness: in-memory account store, recording
//! effect executor, manual clock, and seeded rngs, plus assertion
//! helpers for verifying account state after settlements.

use crate::account::{Account, AccountId};
use crate::clock::ManualClock;
use crate::config::{DuelConfig, StaticConfig};
use crate::effects::{EffectDescriptor, EffectError, EffectExecutor};
use crate::engine::{DuelEngine, DuelError, DuelRequest, DuelSummary};
use crate::store::{AccountStore, MemoryAccountStore, StoreError};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An executor that records every descriptor instead of executing it.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    executed: Mutex<Vec<EffectDescriptor>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything dispatched so far, in order.
    pub fn executed(&self) -> Vec<EffectDescriptor> {
        let executed = self.executed.lock().unwrap_or_else(PoisonError::into_inner);
        executed.clone()
    }
}

#[async_trait]
impl EffectExecutor for RecordingExecutor {
    async fn execute(&self, effect: &EffectDescriptor) -> Result<(), EffectError> {
        let mut executed = self.executed.lock().unwrap_or_else(PoisonError::into_inner);
        executed.push(effect.clone());
        Ok(())
    }
}

/// Store wrapper that fails scripted update calls with a transient
/// error, for exercising mid-settlement failure paths.
pub struct FlakyAccountStore {
    inner: Arc<MemoryAccountStore>,
    passes_left: AtomicU32,
    failures_left: AtomicU32,
}

impl FlakyAccountStore {
    pub fn new(inner: Arc<MemoryAccountStore>) -> Self {
        Self {
            inner,
            passes_left: AtomicU32::new(0),
            failures_left: AtomicU32::new(0),
        }
    }

    /// The next `count` update calls fail with a transient error.
    pub fn fail_next_updates(&self, count: u32) {
        self.passes_left.store(0, Ordering::SeqCst);
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Let `passes` update calls through, then fail the next `count`.
    pub fn fail_after_updates(&self, passes: u32, count: u32) {
        self.passes_left.store(passes, Ordering::SeqCst);
        self.failures_left.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStore for FlakyAccountStore {
    async fn get(&self, id: AccountId) -> Result<Account, StoreError> {
        self.inner.get(id).await
    }

    async fn update(
        &self,
        id: AccountId,
        deltas: &[crate::account::AttributeDelta],
    ) -> Result<Account, StoreError> {
        let passes = self.passes_left.load(Ordering::SeqCst);
        if passes > 0 {
            self.passes_left.store(passes - 1, Ordering::SeqCst);
            return self.inner.update(id, deltas).await;
        }
        let failures = self.failures_left.load(Ordering::SeqCst);
        if failures > 0 {
            self.failures_left.store(failures - 1, Ordering::SeqCst);
            return Err(StoreError::Transient("injected update failure".to_string()));
        }
        self.inner.update(id, deltas).await
    }
}

/// Deterministic harness wiring an engine to in-memory collaborators.
pub struct DuelHarness {
    pub store: Arc<MemoryAccountStore>,
    pub flaky: Arc<FlakyAccountStore>,
    pub executor: Arc<RecordingExecutor>,
    pub clock: Arc<ManualClock>,
    pub engine: DuelEngine,
}

impl DuelHarness {
    /// Build a harness around the given configuration. The engine talks
    /// to the store through the flaky wrapper, which passes everything
    /// through until told to fail.
    pub fn new(config: DuelConfig) -> Self {
        let store = Arc::new(MemoryAccountStore::new());
        let flaky = Arc::new(FlakyAccountStore::new(store.clone()));
        let executor = Arc::new(RecordingExecutor::new());
        let clock = Arc::new(ManualClock::default());
        let engine = DuelEngine::new(
            flaky.clone(),
            executor.clone(),
            Arc::new(StaticConfig(config)),
            clock.clone(),
        );
        Self {
            store,
            flaky,
            executor,
            clock,
            engine,
        }
    }

    /// Insert an account, returning its id.
    pub async fn add_account(&self, account: Account) -> AccountId {
        self.store.insert(account).await
    }

    /// Run a duel with a seeded rng.
    pub async fn duel_seeded(
        &self,
        challenger: AccountId,
        target: AccountId,
        seed: u64,
    ) -> Result<DuelSummary, DuelError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.engine
            .duel_with_rng(DuelRequest::new(challenger, target), &mut rng)
            .await
    }

    /// Re-run a specific request with a seeded rng (for retry tests).
    pub async fn duel_request_seeded(
        &self,
        request: DuelRequest,
        seed: u64,
    ) -> Result<DuelSummary, DuelError> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.engine.duel_with_rng(request, &mut rng).await
    }

    /// Current snapshot of an account. Panics if it does not exist.
    pub async fn account(&self, id: AccountId) -> Account {
        self.store
            .snapshot(id)
            .await
            .expect("account missing from harness store")
    }
}

/// A sample account with the usual duel-relevant attributes set.
pub fn sample_account(name: &str, power: i64, xp: i64) -> Account {
    Account::new(name, power).with_xp(xp).with_stability(50)
}

/// Assert an account's xp.
#[track_caller]
pub fn assert_xp(account: &Account, expected: i64) {
    assert_eq!(
        account.xp, expected,
        "expected {} to have xp {expected}, got {}",
        account.name, account.xp
    );
}

/// Assert an account's stability.
#[track_caller]
pub fn assert_stability(account: &Account, expected: i64) {
    assert_eq!(
        account.stability, expected,
        "expected {} to have stability {expected}, got {}",
        account.name, account.stability
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_harness_runs_a_duel() {
        let harness = DuelHarness::new(
            DuelConfig::default()
                .with_item_drop_chance(0)
                .with_ability_chance(0)
                .with_event_chance(0),
        );
        let challenger = harness
            .add_account(sample_account("challenger", 120, 500))
            .await;
        let target = harness.add_account(sample_account("target", 80, 300)).await;

        let summary = harness.duel_seeded(challenger, target, 1).await.unwrap();
        assert_eq!(summary.winner, challenger);
        assert_eq!(summary.xp_delta, 30);
        assert_eq!(harness.engine.log().len(), 1);
    }

    #[tokio::test]
    async fn test_flaky_store_scripted_failures() {
        let store = Arc::new(MemoryAccountStore::new());
        let flaky = FlakyAccountStore::new(store.clone());
        let id = store.insert(Account::new("Rook", 10)).await;

        flaky.fail_next_updates(1);
        assert!(flaky.update(id, &[]).await.is_err());
        assert!(flaky.update(id, &[]).await.is_ok());
    }
}
