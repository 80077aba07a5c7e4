//! Measurement rules
//!
//! Each rule looks at one aspect of the latest reading and is independent of
//! every other rule. New rules go in their own module and are appended to the
//! rule set; existing rules never need to change.

pub mod moisture;
pub mod soil_ph;

pub use moisture::{moisture_band, MoistureRule};
pub use soil_ph::{ph_band, SoilPhRule, ACID_LOVING_PH, GENERAL_PH};

use crate::models::{Plant, Reading};

/// A pure, stateless care rule
pub trait CareRule: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Messages for this plant given its latest reading. Empty when the rule
    /// has nothing to say (usually because its measurement is absent).
    fn evaluate(&self, plant: &Plant, reading: &Reading) -> Vec<String>;
}
