//! Plant Care Rust Implementation
//!
//! Tracks plants, their growing locations and periodic sensor readings, and
//! turns each plant's latest reading into care recommendations.
//!
//! - `models`: Location / Plant / Reading entities
//! - `store/`: Entity store trait with in-memory and DuckDB backends
//! - `selector`: Latest-reading selection
//! - `recommendation/`: Rule set and recommender
//! - `config`: Environment configuration for the server binary
//! - `api_server`: Axum REST boundary (feature `api`)

pub mod config;
pub mod error;
pub mod models;
pub mod recommendation;
pub mod selector;
pub mod store;

#[cfg(feature = "api")]
pub mod api_server;

// Re-export commonly used types
pub use error::{CareError, Result};
pub use models::{EntityId, Location, NewLocation, NewPlant, NewReading, Plant, Reading};
pub use recommendation::{CareRule, Recommendation, Recommender, RuleSet};
pub use store::{EntityStore, MemoryStore};

#[cfg(feature = "durable")]
pub use store::DuckDbStore;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
