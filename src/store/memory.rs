//! In-memory entity store
//!
//! All tables and id counters live behind one mutex, so id assignment and the
//! insert that uses it happen atomically with respect to other creates.

use chrono::Utc;
use rustc_hash::FxHashMap;
use std::sync::{Mutex, MutexGuard};

use super::EntityStore;
use crate::error::{CareError, Result};
use crate::models::{EntityId, Location, NewLocation, NewPlant, NewReading, Plant, Reading};

/// Monotonic id source; never hands out the same value twice
#[derive(Debug)]
struct Sequence {
    next: EntityId,
}

impl Sequence {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }
}

#[derive(Debug)]
struct Tables {
    locations: FxHashMap<EntityId, Location>,
    plants: FxHashMap<EntityId, Plant>,
    readings: FxHashMap<EntityId, Reading>,
    /// plant id -> reading ids, in creation order
    readings_by_plant: FxHashMap<EntityId, Vec<EntityId>>,
    location_ids: Sequence,
    plant_ids: Sequence,
    reading_ids: Sequence,
}

#[derive(Debug)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables {
                locations: FxHashMap::default(),
                plants: FxHashMap::default(),
                readings: FxHashMap::default(),
                readings_by_plant: FxHashMap::default(),
                location_ids: Sequence::new(),
                plant_ids: Sequence::new(),
                reading_ids: Sequence::new(),
            }),
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| CareError::Storage("memory store lock poisoned".to_string()))
    }
}

fn sorted_by_id<T: Clone>(map: &FxHashMap<EntityId, T>, id_of: impl Fn(&T) -> EntityId) -> Vec<T> {
    let mut items: Vec<T> = map.values().cloned().collect();
    items.sort_by_key(|item| id_of(item));
    items
}

impl EntityStore for MemoryStore {
    fn create_location(&self, new: NewLocation) -> Result<Location> {
        let mut tables = self.tables()?;
        let id = tables.location_ids.next_id();
        let location = new.into_location(id);
        tables.locations.insert(id, location.clone());
        tracing::debug!("Created location {} ({})", id, location.name);
        Ok(location)
    }

    fn get_location(&self, id: EntityId) -> Result<Location> {
        self.tables()?
            .locations
            .get(&id)
            .cloned()
            .ok_or(CareError::LocationNotFound(id))
    }

    fn list_locations(&self) -> Result<Vec<Location>> {
        Ok(sorted_by_id(&self.tables()?.locations, |l| l.id))
    }

    fn delete_location(&self, id: EntityId) -> Result<()> {
        let mut tables = self.tables()?;
        if !tables.locations.contains_key(&id) {
            return Err(CareError::LocationNotFound(id));
        }
        let plants = tables.plants.values().filter(|p| p.location_id == id).count();
        if plants > 0 {
            return Err(CareError::LocationInUse { id, plants });
        }
        tables.locations.remove(&id);
        tracing::debug!("Deleted location {}", id);
        Ok(())
    }

    fn create_plant(&self, new: NewPlant) -> Result<Plant> {
        let mut tables = self.tables()?;
        if !tables.locations.contains_key(&new.location_id) {
            return Err(CareError::InvalidReference {
                entity: "Location",
                id: new.location_id,
            });
        }
        let id = tables.plant_ids.next_id();
        let plant = new.into_plant(id, Utc::now());
        tables.plants.insert(id, plant.clone());
        tracing::debug!("Created plant {} ({}) at location {}", id, plant.name, plant.location_id);
        Ok(plant)
    }

    fn get_plant(&self, id: EntityId) -> Result<Plant> {
        self.tables()?
            .plants
            .get(&id)
            .cloned()
            .ok_or(CareError::PlantNotFound(id))
    }

    fn list_plants(&self) -> Result<Vec<Plant>> {
        Ok(sorted_by_id(&self.tables()?.plants, |p| p.id))
    }

    fn list_plants_at(&self, location_id: EntityId) -> Result<Vec<Plant>> {
        let tables = self.tables()?;
        if !tables.locations.contains_key(&location_id) {
            return Err(CareError::LocationNotFound(location_id));
        }
        let mut plants: Vec<Plant> = tables
            .plants
            .values()
            .filter(|p| p.location_id == location_id)
            .cloned()
            .collect();
        plants.sort_by_key(|p| p.id);
        Ok(plants)
    }

    fn delete_plant(&self, id: EntityId) -> Result<usize> {
        let mut tables = self.tables()?;
        if tables.plants.remove(&id).is_none() {
            return Err(CareError::PlantNotFound(id));
        }
        let reading_ids = tables.readings_by_plant.remove(&id).unwrap_or_default();
        for reading_id in &reading_ids {
            tables.readings.remove(reading_id);
        }
        tracing::debug!("Deleted plant {} and {} reading(s)", id, reading_ids.len());
        Ok(reading_ids.len())
    }

    fn create_reading(&self, plant_id: EntityId, new: NewReading) -> Result<Reading> {
        let mut tables = self.tables()?;
        if !tables.plants.contains_key(&plant_id) {
            return Err(CareError::InvalidReference {
                entity: "Plant",
                id: plant_id,
            });
        }
        let id = tables.reading_ids.next_id();
        let reading = new.into_reading(id, plant_id, Utc::now());
        tables.readings.insert(id, reading.clone());
        tables.readings_by_plant.entry(plant_id).or_default().push(id);
        tracing::debug!("Recorded reading {} for plant {}", id, plant_id);
        Ok(reading)
    }

    fn get_reading(&self, id: EntityId) -> Result<Reading> {
        self.tables()?
            .readings
            .get(&id)
            .cloned()
            .ok_or(CareError::ReadingNotFound(id))
    }

    fn list_readings(&self, plant_id: EntityId) -> Result<Vec<Reading>> {
        let tables = self.tables()?;
        if !tables.plants.contains_key(&plant_id) {
            return Err(CareError::PlantNotFound(plant_id));
        }
        let readings = tables
            .readings_by_plant
            .get(&plant_id)
            .map(|ids| ids.iter().filter_map(|id| tables.readings.get(id).cloned()).collect())
            .unwrap_or_default();
        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn front_yard() -> NewLocation {
        NewLocation {
            name: "Front yard".to_string(),
            soil_type: Some("sandy".to_string()),
            drainage: Some("fast".to_string()),
            sun_exposure: Some("full_sun".to_string()),
        }
    }

    #[test]
    fn test_ids_start_at_one_per_type() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();
        let plant = store.create_plant(NewPlant::new("Hibiscus", location.id)).unwrap();
        let reading = store.create_reading(plant.id, NewReading::default()).unwrap();

        assert_eq!((location.id, plant.id, reading.id), (1, 1, 1));
    }

    #[test]
    fn test_plant_round_trip() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();

        let new = NewPlant {
            name: "Hibiscus".to_string(),
            species: Some("Hibiscus rosa-sinensis".to_string()),
            location_id: location.id,
            sun_exposure: Some("full_sun".to_string()),
            watering_preference: Some("low".to_string()),
            soil_preference: Some("well-drained".to_string()),
            notes: Some("Front hedge".to_string()),
        };
        let created = store.create_plant(new.clone()).unwrap();
        let fetched = store.get_plant(created.id).unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched, new.into_plant(created.id, created.planted_at));
    }

    #[test]
    fn test_plant_requires_existing_location() {
        let store = MemoryStore::new();
        let err = store.create_plant(NewPlant::new("Orphan", 42)).unwrap_err();

        assert!(matches!(err, CareError::InvalidReference { entity: "Location", id: 42 }));
        assert!(store.list_plants().unwrap().is_empty());
    }

    #[test]
    fn test_reading_requires_existing_plant() {
        let store = MemoryStore::new();
        let err = store.create_reading(3, NewReading::default()).unwrap_err();

        assert!(matches!(err, CareError::InvalidReference { entity: "Plant", id: 3 }));
        // The rejected create must not burn an id
        let location = store.create_location(front_yard()).unwrap();
        let plant = store.create_plant(NewPlant::new("Ixora", location.id)).unwrap();
        assert_eq!(store.create_reading(plant.id, NewReading::default()).unwrap().id, 1);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();
        let first = store.create_plant(NewPlant::new("Croton", location.id)).unwrap();
        store.delete_plant(first.id).unwrap();
        let second = store.create_plant(NewPlant::new("Ti plant", location.id)).unwrap();

        assert_eq!(second.id, first.id + 1);
    }

    #[test]
    fn test_delete_plant_cascades_readings() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();
        let plant = store.create_plant(NewPlant::new("Pentas", location.id)).unwrap();
        let keep = store.create_plant(NewPlant::new("Lantana", location.id)).unwrap();
        let r1 = store.create_reading(plant.id, NewReading::default()).unwrap();
        store.create_reading(plant.id, NewReading::default()).unwrap();
        let other = store.create_reading(keep.id, NewReading::default()).unwrap();

        assert_eq!(store.delete_plant(plant.id).unwrap(), 2);
        assert!(matches!(store.get_reading(r1.id), Err(CareError::ReadingNotFound(_))));
        assert!(matches!(store.list_readings(plant.id), Err(CareError::PlantNotFound(_))));
        assert_eq!(store.get_reading(other.id).unwrap(), other);
        assert!(matches!(store.delete_plant(plant.id), Err(CareError::PlantNotFound(_))));
    }

    #[test]
    fn test_delete_location_in_use() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();
        let plant = store.create_plant(NewPlant::new("Clusia", location.id)).unwrap();

        let err = store.delete_location(location.id).unwrap_err();
        assert!(matches!(err, CareError::LocationInUse { plants: 1, .. }));

        store.delete_plant(plant.id).unwrap();
        store.delete_location(location.id).unwrap();
        assert!(matches!(store.get_location(location.id), Err(CareError::LocationNotFound(_))));
    }

    #[test]
    fn test_list_plants_at_location() {
        let store = MemoryStore::new();
        let yard = store.create_location(front_yard()).unwrap();
        let patio = store
            .create_location(NewLocation {
                name: "Patio".to_string(),
                soil_type: None,
                drainage: None,
                sun_exposure: None,
            })
            .unwrap();
        store.create_plant(NewPlant::new("Areca palm", yard.id)).unwrap();
        store.create_plant(NewPlant::new("Bird of paradise", patio.id)).unwrap();
        store.create_plant(NewPlant::new("Royal poinciana", yard.id)).unwrap();

        let names: Vec<String> = store
            .list_plants_at(yard.id)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Areca palm", "Royal poinciana"]);
        assert!(matches!(store.list_plants_at(99), Err(CareError::LocationNotFound(99))));
    }

    #[test]
    fn test_concurrent_plant_creation_yields_distinct_ids() {
        let store = MemoryStore::new();
        let location = store.create_location(front_yard()).unwrap();

        let ids: Vec<EntityId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|t| {
                    let store = &store;
                    s.spawn(move || {
                        (0..50)
                            .map(|i| {
                                let name = format!("plant-{}-{}", t, i);
                                store.create_plant(NewPlant::new(name, location.id)).unwrap().id
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let unique: HashSet<EntityId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), 400);
        assert_eq!(unique.len(), 400);
        assert_eq!(unique.iter().max(), Some(&400));
    }
}
