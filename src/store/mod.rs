//! Entity Store
//!
//! Storage-agnostic interface over locations, plants and readings. The rule
//! set and recommender only see `&dyn EntityStore`, so the in-memory and the
//! DuckDB backends are interchangeable.
//!
//! ## Contract
//! - Identifiers come from a per-type sequence starting at 1 and are never reused.
//! - Creates validate their parent reference before writing anything.
//! - Deleting a plant also deletes its readings.
//! - Deleting a location that plants still reference fails with `LocationInUse`.
//! - Lists are ordered by identifier.

pub mod memory;
#[cfg(feature = "durable")]
pub mod durable;

pub use memory::MemoryStore;
#[cfg(feature = "durable")]
pub use durable::DuckDbStore;

use crate::error::Result;
use crate::models::{EntityId, Location, NewLocation, NewPlant, NewReading, Plant, Reading};
use crate::selector::select_latest;

pub trait EntityStore: Send + Sync {
    // === Locations ===
    fn create_location(&self, new: NewLocation) -> Result<Location>;
    fn get_location(&self, id: EntityId) -> Result<Location>;
    fn list_locations(&self) -> Result<Vec<Location>>;
    fn delete_location(&self, id: EntityId) -> Result<()>;

    // === Plants ===
    fn create_plant(&self, new: NewPlant) -> Result<Plant>;
    fn get_plant(&self, id: EntityId) -> Result<Plant>;
    fn list_plants(&self) -> Result<Vec<Plant>>;
    /// Plants at one location (LocationNotFound if the location is missing)
    fn list_plants_at(&self, location_id: EntityId) -> Result<Vec<Plant>>;
    /// Removes the plant and returns how many readings went with it
    fn delete_plant(&self, id: EntityId) -> Result<usize>;

    // === Readings ===
    fn create_reading(&self, plant_id: EntityId, new: NewReading) -> Result<Reading>;
    fn get_reading(&self, id: EntityId) -> Result<Reading>;
    /// Readings of one plant (PlantNotFound if the plant is missing)
    fn list_readings(&self, plant_id: EntityId) -> Result<Vec<Reading>>;

    /// Most recent reading for a plant, None when it has none yet
    fn latest_reading(&self, plant_id: EntityId) -> Result<Option<Reading>> {
        let readings = self.list_readings(plant_id)?;
        Ok(select_latest(&readings).cloned())
    }
}
