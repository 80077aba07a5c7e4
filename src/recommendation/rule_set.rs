//! Ordered rule evaluation
//!
//! Evaluation order:
//! 1. No data: without a reading, emit `NO_DATA_MESSAGE` and stop.
//! 2. Measurement rules, in the order they were added (standard: moisture, soil pH).
//! 3. Fallback: if no measurement rule said anything, emit `FALLBACK_MESSAGE`.

use super::rules::{CareRule, MoistureRule, SoilPhRule};
use crate::models::{Plant, Reading};

pub const NO_DATA_MESSAGE: &str = "No readings yet; add a reading to receive recommendations.";
pub const FALLBACK_MESSAGE: &str = "No specific issues detected in the latest reading.";

pub struct RuleSet {
    rules: Vec<Box<dyn CareRule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleSet {
    /// No measurement rules; every reading falls through to the fallback
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn standard() -> Self {
        Self::empty().with_rule(MoistureRule).with_rule(SoilPhRule)
    }

    /// Append a rule after the existing ones
    pub fn with_rule<R: CareRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the whole set. Never returns an empty list.
    pub fn evaluate(&self, plant: &Plant, reading: Option<&Reading>) -> Vec<String> {
        let Some(reading) = reading else {
            return vec![NO_DATA_MESSAGE.to_string()];
        };

        let mut messages: Vec<String> = self
            .rules
            .iter()
            .flat_map(|rule| rule.evaluate(plant, reading))
            .collect();

        if messages.is_empty() {
            messages.push(FALLBACK_MESSAGE.to_string());
        }
        messages
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet").field("rules", &self.rule_names()).finish()
    }
}
