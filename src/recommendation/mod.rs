//! Recommendation engine
//!
//! Maps a plant's care preferences and its latest reading to human-readable
//! advice. Rules are pure functions of `(Plant, Reading)`, evaluated in a fixed
//! order by `RuleSet`; `Recommender` looks up the plant and its latest reading
//! and wraps the messages with a timestamp.
//!
//! ## Architecture
//! - `band.rs` - Inclusive acceptable-range classification
//! - `rules/` - One module per measurement rule (moisture, soil pH)
//! - `rule_set.rs` - Ordered evaluation with the no-data and fallback messages
//! - `recommender.rs` - Store lookup + rule evaluation -> `Recommendation`

pub mod band;
pub mod rules;
pub mod rule_set;
pub mod recommender;

pub use band::{Band, BandFit};
pub use rules::{moisture_band, ph_band, CareRule, MoistureRule, SoilPhRule};
pub use rule_set::{RuleSet, FALLBACK_MESSAGE, NO_DATA_MESSAGE};
pub use recommender::{Recommendation, Recommender};
