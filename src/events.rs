//! The random-event overlay.
//!
//! After settlement, one gate draw decides whether the configured event
//! list is evaluated at all. When it is, the list is walked in declared
//! order and every entry whose conditions all pass fires, not only the
//! first match. The overlay dispatches each fired entry's effects to
//! the executor and records the event names; effect semantics stay
//! opaque to the engine.

use crate::effects::{EffectDescriptor, EffectError, EffectExecutor};
use crate::outcome::percent_roll;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A configured bonus/penalty event.
///
/// An entry with no conditions always passes the walk (the gate draw
/// still applies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<EventCondition>,
    #[serde(default)]
    pub effects: Vec<EffectDescriptor>,
}

/// A condition an event entry evaluates against the settled duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventCondition {
    /// Independent probability gate.
    Chance { percent: u8 },
    /// The winner had strictly less power than the loser.
    UnderdogWon,
    /// Absolute power gap between the sides is at least this much.
    PowerGapAtLeast { gap: i64 },
}

/// Snapshot of the settled duel that conditions evaluate against.
#[derive(Debug, Clone, Copy)]
pub struct EventContext {
    pub winner_power: i64,
    pub loser_power: i64,
    pub xp_delta: i64,
}

impl EventCondition {
    pub fn passes<R: Rng + ?Sized>(&self, context: &EventContext, rng: &mut R) -> bool {
        match self {
            EventCondition::Chance { percent } => percent_roll(*percent, rng),
            EventCondition::UnderdogWon => context.winner_power < context.loser_power,
            EventCondition::PowerGapAtLeast { gap } => {
                (context.winner_power - context.loser_power).abs() >= *gap
            }
        }
    }
}

/// Run the overlay: gate draw, then walk the list firing every entry
/// whose conditions all pass. Returns the fired event names in order.
pub async fn evaluate_overlay<R: Rng + Send + ?Sized>(
    events: &[RandomEvent],
    context: &EventContext,
    gate_percent: u8,
    executor: &dyn EffectExecutor,
    rng: &mut R,
) -> Result<Vec<String>, EffectError> {
    if !percent_roll(gate_percent, rng) {
        return Ok(Vec::new());
    }

    let mut fired = Vec::new();
    for event in events {
        if !event
            .conditions
            .iter()
            .all(|condition| condition.passes(context, rng))
        {
            continue;
        }
        for effect in &event.effects {
            executor.execute(effect).await?;
        }
        fired.push(event.name.clone());
    }
    Ok(fired)
}

lazy_static::lazy_static! {
    /// Stock event catalog for hosts that want sensible defaults.
    pub static ref DEFAULT_EVENTS: Vec<RandomEvent> = vec![
        RandomEvent {
            name: "adrenaline_surge".to_string(),
            conditions: vec![EventCondition::Chance { percent: 50 }],
            effects: vec![EffectDescriptor::new(
                "adjust_attribute",
                serde_json::json!({"target": "winner", "attribute": "stability", "amount": 5}),
            )],
        },
        RandomEvent {
            name: "underdog_triumph".to_string(),
            conditions: vec![EventCondition::UnderdogWon],
            effects: vec![EffectDescriptor::new(
                "notify",
                serde_json::json!({"target": "winner", "message": "Against all odds!"}),
            )],
        },
        RandomEvent {
            name: "decisive_blow".to_string(),
            conditions: vec![
                EventCondition::PowerGapAtLeast { gap: 50 },
                EventCondition::Chance { percent: 25 },
            ],
            effects: vec![EffectDescriptor::new(
                "grant_item",
                serde_json::json!({"target": "winner", "item": "trophy", "quantity": 1}),
            )],
        },
    ];
}
