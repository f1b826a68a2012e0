//! The account store boundary.
//!
//! The host service owns account state; the engine reads snapshots and
//! issues deltas through this port. An in-memory implementation is
//! provided for tests and single-process hosts.

use crate::account::{Account, AccountId, AttributeDelta};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors from account store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account not found: {0}")]
    NotFound(AccountId),

    #[error("store failure: {0}")]
    Transient(String),
}

/// Host-owned account state, seen through reads and delta updates.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch a snapshot of the account.
    async fn get(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Apply deltas in order and return the updated snapshot.
    async fn update(&self, id: AccountId, deltas: &[AttributeDelta])
        -> Result<Account, StoreError>;
}

/// In-memory reference implementation.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) an account, returning its id.
    pub async fn insert(&self, account: Account) -> AccountId {
        let id = account.id;
        let mut accounts = self.accounts.write().await;
        accounts.insert(id, account);
        id
    }

    /// Current snapshot, if the account exists.
    pub async fn snapshot(&self, id: AccountId) -> Option<Account> {
        let accounts = self.accounts.read().await;
        accounts.get(&id).cloned()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get(&self, id: AccountId) -> Result<Account, StoreError> {
        let accounts = self.accounts.read().await;
        accounts.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn update(
        &self,
        id: AccountId,
        deltas: &[AttributeDelta],
    ) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.apply_all(deltas);
        Ok(account.clone())
    }
}
