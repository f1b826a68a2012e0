//! Per-account daily duel quota.
//!
//! Rows are keyed by (account, calendar date); a missing row is a count
//! of zero, so a new date starts fresh with no reset job. The consumed
//! count never exceeds the limit passed to [`QuotaTracker::try_consume`].

use crate::account::AccountId;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Result of an attempted quota consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaDecision {
    Accepted { count_after: u32 },
    Exceeded { limit: u32 },
}

/// Date-keyed quota store with atomic check-and-increment.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    rows: Mutex<HashMap<(AccountId, NaiveDate), u32>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically consume one duel from the account's quota for `date`.
    ///
    /// The check and increment happen under one lock, so concurrent
    /// calls for the same (account, date) can never push the count past
    /// `limit`.
    pub fn try_consume(&self, account: AccountId, date: NaiveDate, limit: u32) -> QuotaDecision {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let count = rows.entry((account, date)).or_insert(0);
        if *count >= limit {
            QuotaDecision::Exceeded { limit }
        } else {
            *count += 1;
            QuotaDecision::Accepted { count_after: *count }
        }
    }

    /// Consumed count for the account on `date` (0 if no row).
    pub fn consumed(&self, account: AccountId, date: NaiveDate) -> u32 {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.get(&(account, date)).copied().unwrap_or(0)
    }

    /// Duels the account may still start on `date`. Read-only.
    pub fn remaining(&self, account: AccountId, date: NaiveDate, limit: u32) -> u32 {
        limit.saturating_sub(self.consumed(account, date))
    }
}
