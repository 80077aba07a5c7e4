//! Latest-reading selection
//!
//! The most recent reading is the one with the greatest `taken_at`. Timestamps
//! can collide when readings arrive faster than the clock resolution, so ties
//! go to the highest identifier (the one created last).

use crate::error::Result;
use crate::models::{EntityId, Reading};
use crate::store::EntityStore;

/// Pick the most recent reading, or None for an empty input
pub fn select_latest<'a, I>(readings: I) -> Option<&'a Reading>
where
    I: IntoIterator<Item = &'a Reading>,
{
    readings
        .into_iter()
        .max_by(|a, b| a.taken_at.cmp(&b.taken_at).then(a.id.cmp(&b.id)))
}

/// Latest reading for a plant. A plant with no readings yields `Ok(None)`.
pub fn latest(store: &dyn EntityStore, plant_id: EntityId) -> Result<Option<Reading>> {
    store.latest_reading(plant_id)
}
