use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule_set::RuleSet;
use crate::error::Result;
use crate::models::EntityId;
use crate::selector;
use crate::store::EntityStore;

/// Care advice for one plant, computed on demand and never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub plant_id: EntityId,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<String>,
}

/// Combines latest-reading selection with a rule set
#[derive(Debug, Default)]
pub struct Recommender {
    rules: RuleSet,
}

impl Recommender {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Fails with `PlantNotFound` for an unknown plant. Otherwise always
    /// returns at least one message.
    pub fn recommend(&self, store: &dyn EntityStore, plant_id: EntityId) -> Result<Recommendation> {
        let plant = store.get_plant(plant_id)?;
        let reading = selector::latest(store, plant_id)?;
        let messages = self.rules.evaluate(&plant, reading.as_ref());

        tracing::debug!(
            "Recommendation for plant {}: reading {:?}, {} rule(s), {} message(s)",
            plant_id,
            reading.as_ref().map(|r| r.id),
            self.rules.len(),
            messages.len()
        );

        Ok(Recommendation {
            plant_id,
            created_at: Utc::now(),
            messages,
        })
    }
}
