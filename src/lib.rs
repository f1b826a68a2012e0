//! Duel resolution engine for persistent role-playing services.
//!
//! This crate provides:
//! - Quota and cooldown gating for player-vs-player duels
//! - Deterministic outcome resolution from power attributes
//! - The settlement ledger: xp transfer, stability penalty, item drop,
//!   ability transfer
//! - A configurable random-event overlay dispatching opaque effects
//! - An append-only audit log of settled duels
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use duel_core::{
//!     Account, DuelConfig, DuelEngine, DuelRequest, MemoryAccountStore,
//!     StaticConfig, SystemClock,
//! };
//! use duel_core::effects::EffectRegistry;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryAccountStore::new());
//!     let challenger = store.insert(Account::new("Rook", 120).with_xp(500)).await;
//!     let target = store.insert(Account::new("Wren", 80).with_xp(300)).await;
//!
//!     let engine = DuelEngine::new(
//!         store,
//!         Arc::new(EffectRegistry::new()),
//!         Arc::new(StaticConfig(DuelConfig::default())),
//!         Arc::new(SystemClock),
//!     );
//!
//!     let summary = engine.duel(DuelRequest::new(challenger, target)).await?;
//!     println!("{} took {} xp", summary.winner, summary.xp_delta);
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod effects;
pub mod engine;
pub mod events;
pub mod outcome;
pub mod quota;
pub mod record;
pub mod settle;
pub mod store;
pub mod testing;

// Primary public API
pub use account::{Account, AccountId, AttributeDelta};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigProvider, DuelConfig, ResolutionMode, StaticConfig};
pub use cooldown::{CooldownRegistry, PairKey};
pub use effects::{EffectDescriptor, EffectExecutor, EffectRegistry};
pub use engine::{DuelEngine, DuelError, DuelPhase, DuelRequest, DuelSummary};
pub use events::{EventCondition, EventContext, RandomEvent};
pub use outcome::DuelSide;
pub use quota::{QuotaDecision, QuotaTracker};
pub use record::{DuelLog, DuelRecord, DuelStats, RecordId};
pub use settle::{AbilityTransfer, ItemDrop, Settlement};
pub use store::{AccountStore, MemoryAccountStore, StoreError};
