//! DuelEngine - the primary public API for duel resolution.
//!
//! One request/response cycle: validate preconditions, consume quota,
//! resolve the outcome, apply the settlement, run the event overlay,
//! log the record, arm the pair cooldown. Validation failures
//! short-circuit before any mutation; once quota is consumed the
//! remaining transitions run as one logical unit, and a failure partway
//! surfaces as a phase-tagged transient error the caller can retry
//! under the same request id.

use crate::account::AccountId;
use crate::clock::Clock;
use crate::config::{ConfigError, ConfigProvider, DuelConfig};
use crate::cooldown::{CooldownRegistry, PairKey};
use crate::effects::EffectExecutor;
use crate::events::{self, EventContext};
use crate::outcome::{self, DuelSide};
use crate::quota::{QuotaDecision, QuotaTracker};
use crate::record::{DuelLog, DuelRecord, RecordId};
use crate::settle::{self, Settlement};
use crate::store::{AccountStore, StoreError};
use chrono::Duration;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// States of one duel resolution, in order. `Rejected` is implicit in
/// the error return and is reachable only from `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DuelPhase {
    Validating,
    QuotaConsumed,
    Resolved,
    Settled,
    Overlaid,
    Logged,
    CooldownArmed,
    Complete,
}

impl fmt::Display for DuelPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuelPhase::Validating => "validating",
            DuelPhase::QuotaConsumed => "quota-consumed",
            DuelPhase::Resolved => "resolved",
            DuelPhase::Settled => "settled",
            DuelPhase::Overlaid => "overlaid",
            DuelPhase::Logged => "logged",
            DuelPhase::CooldownArmed => "cooldown-armed",
            DuelPhase::Complete => "complete",
        };
        write!(f, "{name}")
    }
}

/// Errors from duel resolution.
///
/// Every variant except `TransientStoreFailure` is a clean rejection:
/// it is raised before any mutation and the caller just reports it.
/// `TransientStoreFailure` carries the last phase the settlement
/// reached; when that is `QuotaConsumed` or later the caller should
/// retry the request as a unit, under the same request id.
#[derive(Debug, Error)]
pub enum DuelError {
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("target has peace mode enabled")]
    PeaceModeBlocked,

    #[error("daily duel limit of {limit} reached")]
    QuotaExceeded { limit: u32 },

    #[error("pair is cooling down, {} minute(s) remaining", remaining.num_minutes().max(1))]
    CooldownActive { remaining: Duration },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("store failure after reaching {phase}: {reason}")]
    TransientStoreFailure { phase: DuelPhase, reason: String },
}

impl DuelError {
    /// Whether quota was consumed (and possibly more) before this error.
    pub fn settlement_begun(&self) -> bool {
        matches!(
            self,
            DuelError::TransientStoreFailure { phase, .. } if *phase >= DuelPhase::QuotaConsumed
        )
    }
}

/// One duel request. The request id keys idempotent retry: replaying a
/// completed request returns the original summary, and retrying a
/// failed one resumes instead of double-applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelRequest {
    pub request_id: Uuid,
    pub challenger: AccountId,
    pub target: AccountId,
}

impl DuelRequest {
    /// New request with a fresh request id.
    pub fn new(challenger: AccountId, target: AccountId) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            challenger,
            target,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

/// Structured settlement summary returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelSummary {
    pub record_id: RecordId,
    pub winner: AccountId,
    pub loser: AccountId,
    pub xp_delta: i64,
    pub stability_after: i64,
    pub item_dropped: Option<String>,
    pub ability_learned: Option<String>,
    pub events_triggered: Vec<String>,
}

/// Everything computed for a settlement that has consumed quota but not
/// yet completed. Kept per request id so a retry resumes exactly where
/// the failure left off.
#[derive(Debug, Clone)]
struct PendingSettlement {
    settlement: Settlement,
    context: EventContext,
    winner_applied: bool,
    loser_applied: bool,
    events: Option<Vec<String>>,
}

/// The duel resolution engine.
///
/// Holds the collaborator ports plus the engine-owned quota tracker,
/// cooldown registry, and append-only log. Invoked per-request from
/// concurrent handlers; settlement for an unordered pair is serialized
/// by a per-pair async mutex.
pub struct DuelEngine {
    accounts: Arc<dyn AccountStore>,
    effects: Arc<dyn EffectExecutor>,
    config: Arc<dyn ConfigProvider>,
    clock: Arc<dyn Clock>,
    quota: QuotaTracker,
    cooldowns: CooldownRegistry,
    log: DuelLog,
    pair_locks: Mutex<HashMap<PairKey, Arc<tokio::sync::Mutex<()>>>>,
    pending: Mutex<HashMap<Uuid, PendingSettlement>>,
    completed: Mutex<HashMap<Uuid, DuelSummary>>,
}

impl DuelEngine {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        effects: Arc<dyn EffectExecutor>,
        config: Arc<dyn ConfigProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            accounts,
            effects,
            config,
            cooldowns: CooldownRegistry::new(clock.clone()),
            clock,
            quota: QuotaTracker::new(),
            log: DuelLog::new(),
            pair_locks: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            completed: Mutex::new(HashMap::new()),
        }
    }

    /// The append-only duel log.
    pub fn log(&self) -> &DuelLog {
        &self.log
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    /// Resolve a duel with an entropy-seeded rng.
    pub async fn duel(&self, request: DuelRequest) -> Result<DuelSummary, DuelError> {
        let mut rng = StdRng::from_entropy();
        self.duel_with_rng(request, &mut rng).await
    }

    /// Resolve a duel drawing all randomness from the given rng, so a
    /// seeded rng makes the whole settlement reproducible.
    pub async fn duel_with_rng<R>(
        &self,
        request: DuelRequest,
        rng: &mut R,
    ) -> Result<DuelSummary, DuelError>
    where
        R: Rng + Send + ?Sized,
    {
        let config = self.config.snapshot();
        config.validate()?;

        if let Some(summary) = self.completed_summary(&request.request_id) {
            debug!(request_id = %request.request_id, "replaying completed settlement");
            return Ok(summary);
        }

        let key = PairKey::of(request.challenger, request.target);
        let pair_lock = self.pair_lock(&key);
        let _guard = pair_lock.lock().await;

        // Authoritative re-check under the pair lock.
        if let Some(summary) = self.completed_summary(&request.request_id) {
            return Ok(summary);
        }

        let mut pending = match self.pending_settlement(&request.request_id) {
            Some(pending) => {
                info!(request_id = %request.request_id, "resuming interrupted settlement");
                pending
            }
            None => self.validate_and_open(&request, &config, &key, rng).await?,
        };

        // Settled: apply each side's deltas exactly once across retries.
        if !pending.winner_applied {
            self.accounts
                .update(pending.settlement.winner, &pending.settlement.winner_deltas())
                .await
                .map_err(|e| self.interrupt(&request, DuelPhase::Resolved, e))?;
            pending.winner_applied = true;
            self.save_pending(&request, &pending);
        }
        if !pending.loser_applied {
            self.accounts
                .update(pending.settlement.loser, &pending.settlement.loser_deltas())
                .await
                .map_err(|e| self.interrupt(&request, DuelPhase::Resolved, e))?;
            pending.loser_applied = true;
            self.save_pending(&request, &pending);
        }
        debug!(
            winner = %pending.settlement.winner,
            xp_delta = pending.settlement.xp_delta,
            "settlement applied"
        );

        // Overlaid
        if pending.events.is_none() {
            let fired = events::evaluate_overlay(
                &config.random_events,
                &pending.context,
                config.special_event_chance_percent,
                self.effects.as_ref(),
                rng,
            )
            .await
            .map_err(|e| DuelError::TransientStoreFailure {
                phase: DuelPhase::Settled,
                reason: e.to_string(),
            })?;
            if !fired.is_empty() {
                debug!(events = ?fired, "overlay events fired");
            }
            pending.events = Some(fired);
            self.save_pending(&request, &pending);
        }
        let events_triggered = pending.events.clone().unwrap_or_default();

        // Logged
        let record = DuelRecord {
            id: RecordId::new(),
            challenger: request.challenger,
            target: request.target,
            winner: pending.settlement.winner,
            loser: pending.settlement.loser,
            xp_transferred: pending.settlement.xp_delta,
            item_dropped: pending.settlement.item_dropped().map(str::to_string),
            ability_learned: pending.settlement.ability_learned().map(str::to_string),
            events_triggered: events_triggered.clone(),
            winner_deltas: pending.settlement.winner_deltas(),
            loser_deltas: pending.settlement.loser_deltas(),
            timestamp: self.clock.now(),
        };
        let record_id = record.id;
        self.log.append(record);

        // CooldownArmed
        self.cooldowns
            .arm(key, Duration::hours(config.cooldown_hours_between_pair));

        // Complete
        let summary = DuelSummary {
            record_id,
            winner: pending.settlement.winner,
            loser: pending.settlement.loser,
            xp_delta: pending.settlement.xp_delta,
            stability_after: pending.settlement.stability_after,
            item_dropped: pending.settlement.item_dropped().map(str::to_string),
            ability_learned: pending.settlement.ability_learned().map(str::to_string),
            events_triggered,
        };
        {
            let mut completed = self
                .completed
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            completed.insert(request.request_id, summary.clone());
        }
        self.clear_pending(&request.request_id);
        info!(
            winner = %summary.winner,
            loser = %summary.loser,
            xp_delta = summary.xp_delta,
            "duel settled"
        );
        Ok(summary)
    }

    /// Run `Validating` and, if every precondition holds, consume quota
    /// and compute the settlement. The returned pending entry is already
    /// saved, so a failure in any later step can resume from it.
    ///
    /// Precondition order: accounts exist, peace mode, quota, cooldown.
    /// The atomic quota consumption is the first mutation; everything
    /// before it is read-only, so a rejection leaves no trace.
    async fn validate_and_open<R>(
        &self,
        request: &DuelRequest,
        config: &DuelConfig,
        key: &PairKey,
        rng: &mut R,
    ) -> Result<PendingSettlement, DuelError>
    where
        R: Rng + Send + ?Sized,
    {
        let challenger = self
            .accounts
            .get(request.challenger)
            .await
            .map_err(validation_store_error)?;
        let target = self
            .accounts
            .get(request.target)
            .await
            .map_err(validation_store_error)?;

        if config.respect_peace_mode && target.peace_mode {
            return Err(DuelError::PeaceModeBlocked);
        }

        let today = self.clock.today();
        if self
            .quota
            .remaining(request.challenger, today, config.daily_active_limit)
            == 0
        {
            return Err(DuelError::QuotaExceeded {
                limit: config.daily_active_limit,
            });
        }

        if let Some(remaining) = self.cooldowns.check(key) {
            return Err(DuelError::CooldownActive { remaining });
        }

        // QuotaConsumed. A lost consume race is still a clean rejection.
        if let QuotaDecision::Exceeded { limit } =
            self.quota
                .try_consume(request.challenger, today, config.daily_active_limit)
        {
            return Err(DuelError::QuotaExceeded { limit });
        }
        debug!(challenger = %request.challenger, date = %today, "quota consumed");

        // Resolved
        let side = outcome::resolve(
            config.power_resolution_mode,
            challenger.power,
            target.power,
            rng,
        );
        let (winner, loser) = match side {
            DuelSide::Challenger => (&challenger, &target),
            DuelSide::Target => (&target, &challenger),
        };
        debug!(winner = %winner.id, loser = %loser.id, "outcome resolved");

        let settlement = settle::settle(winner, loser, config, rng);
        let pending = PendingSettlement {
            context: EventContext {
                winner_power: winner.power,
                loser_power: loser.power,
                xp_delta: settlement.xp_delta,
            },
            settlement,
            winner_applied: false,
            loser_applied: false,
            events: None,
        };
        self.save_pending(request, &pending);
        Ok(pending)
    }

    fn pair_lock(&self, key: &PairKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .pair_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    fn completed_summary(&self, request_id: &Uuid) -> Option<DuelSummary> {
        let completed = self
            .completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        completed.get(request_id).cloned()
    }

    fn pending_settlement(&self, request_id: &Uuid) -> Option<PendingSettlement> {
        let pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.get(request_id).cloned()
    }

    fn save_pending(&self, request: &DuelRequest, settlement: &PendingSettlement) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.insert(request.request_id, settlement.clone());
    }

    fn clear_pending(&self, request_id: &Uuid) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        pending.remove(request_id);
    }

    fn interrupt(&self, request: &DuelRequest, phase: DuelPhase, err: StoreError) -> DuelError {
        info!(
            request_id = %request.request_id,
            %phase,
            "settlement interrupted, retryable under the same request id"
        );
        DuelError::TransientStoreFailure {
            phase,
            reason: err.to_string(),
        }
    }
}

/// During `Validating` a missing account is a clean rejection; anything
/// else is a transient failure with no mutation behind it.
fn validation_store_error(err: StoreError) -> DuelError {
    match err {
        StoreError::NotFound(id) => DuelError::AccountNotFound(id),
        StoreError::Transient(reason) => DuelError::TransientStoreFailure {
            phase: DuelPhase::Validating,
            reason,
        },
    }
}
