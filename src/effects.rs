//! Effect descriptors and their execution boundary.
//!
//! Events carry opaque effect descriptors: an open `kind` tag plus json
//! parameters. The engine never interprets them; it hands each one to
//! an [`EffectExecutor`]. The default executor is a registry mapping
//! tag to handler, so hosts extend the effect vocabulary without
//! touching the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// An opaque effect: open kind tag plus free-form parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDescriptor {
    pub kind: String,
    #[serde(default)]
    pub params: Value,
}

impl EffectDescriptor {
    pub fn new(kind: impl Into<String>, params: Value) -> Self {
        Self {
            kind: kind.into(),
            params,
        }
    }
}

/// Errors from effect execution.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("no handler registered for effect kind `{0}`")]
    UnknownKind(String),
    #[error("effect `{kind}` failed: {reason}")]
    Failed { kind: String, reason: String },
}

/// Executes effect descriptors on behalf of the engine.
#[async_trait]
pub trait EffectExecutor: Send + Sync {
    async fn execute(&self, effect: &EffectDescriptor) -> Result<(), EffectError>;
}

/// Handles one effect kind's parameters.
#[async_trait]
pub trait EffectHandler: Send + Sync {
    async fn apply(&self, params: &Value) -> Result<(), EffectError>;
}

/// Registry-backed executor: kind tag to handler.
#[derive(Default)]
pub struct EffectRegistry {
    handlers: HashMap<String, Box<dyn EffectHandler>>,
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a kind, replacing any prior one.
    pub fn register(&mut self, kind: impl Into<String>, handler: Box<dyn EffectHandler>) {
        self.handlers.insert(kind.into(), handler);
    }

    pub fn handles(&self, kind: &str) -> bool {
        self.handlers.contains_key(kind)
    }
}

#[async_trait]
impl EffectExecutor for EffectRegistry {
    async fn execute(&self, effect: &EffectDescriptor) -> Result<(), EffectError> {
        match self.handlers.get(&effect.kind) {
            Some(handler) => handler.apply(&effect.params).await,
            None => Err(EffectError::UnknownKind(effect.kind.clone())),
        }
    }
}
