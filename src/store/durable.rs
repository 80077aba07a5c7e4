//! DuckDB entity store
//!
//! One connection behind a mutex. Ids come from per-table sequences read under
//! the same lock as the insert. Timestamps are stored as UTC microseconds and
//! entities are handed back already truncated to that precision, so a create
//! followed by a get returns identical values.

use chrono::{DateTime, Utc};
use duckdb::types::Type;
use duckdb::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::EntityStore;
use crate::error::{CareError, Result};
use crate::models::{EntityId, Location, NewLocation, NewPlant, NewReading, Plant, Reading};

const SCHEMA: &str = r#"
    CREATE SEQUENCE IF NOT EXISTS location_ids START 1;
    CREATE SEQUENCE IF NOT EXISTS plant_ids START 1;
    CREATE SEQUENCE IF NOT EXISTS reading_ids START 1;

    CREATE TABLE IF NOT EXISTS locations (
        id BIGINT PRIMARY KEY,
        name VARCHAR NOT NULL,
        soil_type VARCHAR,
        drainage VARCHAR,
        sun_exposure VARCHAR
    );

    CREATE TABLE IF NOT EXISTS plants (
        id BIGINT PRIMARY KEY,
        name VARCHAR NOT NULL,
        species VARCHAR,
        location_id BIGINT NOT NULL,
        sun_exposure VARCHAR,
        watering_preference VARCHAR,
        soil_preference VARCHAR,
        notes VARCHAR,
        planted_at BIGINT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS readings (
        id BIGINT PRIMARY KEY,
        plant_id BIGINT NOT NULL,
        taken_at BIGINT NOT NULL,
        soil_moisture DOUBLE,
        soil_ph DOUBLE,
        temperature DOUBLE,
        humidity DOUBLE,
        light DOUBLE
    );
"#;

const LOCATION_COLUMNS: &str = "id, name, soil_type, drainage, sun_exposure";
const PLANT_COLUMNS: &str =
    "id, name, species, location_id, sun_exposure, watering_preference, soil_preference, notes, planted_at";
const READING_COLUMNS: &str =
    "id, plant_id, taken_at, soil_moisture, soil_ph, temperature, humidity, light";

pub struct DuckDbStore {
    conn: Mutex<Connection>,
}

impl DuckDbStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        tracing::info!("Opened DuckDB store at {}", path.as_ref().display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CareError::Storage("duckdb connection lock poisoned".to_string()))
    }
}

// ============================================================================
// Row mapping
// ============================================================================

fn now_micros() -> Result<(i64, DateTime<Utc>)> {
    let micros = Utc::now().timestamp_micros();
    let at = from_micros(micros)
        .ok_or_else(|| CareError::Storage(format!("timestamp out of range: {}", micros)))?;
    Ok((micros, at))
}

fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros)
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> duckdb::Result<DateTime<Utc>> {
    let micros: i64 = row.get(idx)?;
    from_micros(micros).ok_or_else(|| {
        duckdb::Error::FromSqlConversionFailure(
            idx,
            Type::BigInt,
            format!("timestamp out of range: {}", micros).into(),
        )
    })
}

fn id_at(row: &Row<'_>, idx: usize) -> duckdb::Result<EntityId> {
    Ok(row.get::<_, i64>(idx)? as EntityId)
}

fn location_from_row(row: &Row<'_>) -> duckdb::Result<Location> {
    Ok(Location {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        soil_type: row.get(2)?,
        drainage: row.get(3)?,
        sun_exposure: row.get(4)?,
    })
}

fn plant_from_row(row: &Row<'_>) -> duckdb::Result<Plant> {
    Ok(Plant {
        id: id_at(row, 0)?,
        name: row.get(1)?,
        species: row.get(2)?,
        location_id: id_at(row, 3)?,
        sun_exposure: row.get(4)?,
        watering_preference: row.get(5)?,
        soil_preference: row.get(6)?,
        notes: row.get(7)?,
        planted_at: timestamp_at(row, 8)?,
    })
}

fn reading_from_row(row: &Row<'_>) -> duckdb::Result<Reading> {
    Ok(Reading {
        id: id_at(row, 0)?,
        plant_id: id_at(row, 1)?,
        taken_at: timestamp_at(row, 2)?,
        soil_moisture: row.get(3)?,
        soil_ph: row.get(4)?,
        temperature: row.get(5)?,
        humidity: row.get(6)?,
        light: row.get(7)?,
    })
}

fn exists(conn: &Connection, table: &str, id: EntityId) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?", table),
        params![id as i64],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn next_id(conn: &Connection, sequence: &str) -> Result<EntityId> {
    let sql = format!("SELECT nextval('{}')", sequence);
    let id: i64 = conn.query_row(&sql, params![], |row| row.get(0))?;
    Ok(id as EntityId)
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    args: &[&dyn duckdb::ToSql],
    map: fn(&Row<'_>) -> duckdb::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(args, map)?;
    Ok(rows.collect::<duckdb::Result<Vec<T>>>()?)
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    args: &[&dyn duckdb::ToSql],
    map: fn(&Row<'_>) -> duckdb::Result<T>,
) -> Result<Option<T>> {
    Ok(query_all(conn, sql, args, map)?.into_iter().next())
}

// ============================================================================
// EntityStore
// ============================================================================

impl EntityStore for DuckDbStore {
    fn create_location(&self, new: NewLocation) -> Result<Location> {
        let conn = self.conn()?;
        let id = next_id(&conn, "location_ids")?;
        conn.execute(
            "INSERT INTO locations (id, name, soil_type, drainage, sun_exposure) VALUES (?, ?, ?, ?, ?)",
            params![id as i64, new.name, new.soil_type, new.drainage, new.sun_exposure],
        )?;
        tracing::debug!("Created location {} ({})", id, new.name);
        Ok(new.into_location(id))
    }

    fn get_location(&self, id: EntityId) -> Result<Location> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM locations WHERE id = ?", LOCATION_COLUMNS);
        query_one(&conn, &sql, params![id as i64], location_from_row)?
            .ok_or(CareError::LocationNotFound(id))
    }

    fn list_locations(&self) -> Result<Vec<Location>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM locations ORDER BY id", LOCATION_COLUMNS);
        query_all(&conn, &sql, params![], location_from_row)
    }

    fn delete_location(&self, id: EntityId) -> Result<()> {
        let conn = self.conn()?;
        if !exists(&conn, "locations", id)? {
            return Err(CareError::LocationNotFound(id));
        }
        let plants: i64 = conn.query_row(
            "SELECT COUNT(*) FROM plants WHERE location_id = ?",
            params![id as i64],
            |row| row.get(0),
        )?;
        if plants > 0 {
            return Err(CareError::LocationInUse { id, plants: plants as usize });
        }
        conn.execute("DELETE FROM locations WHERE id = ?", params![id as i64])?;
        tracing::debug!("Deleted location {}", id);
        Ok(())
    }

    fn create_plant(&self, new: NewPlant) -> Result<Plant> {
        let conn = self.conn()?;
        if !exists(&conn, "locations", new.location_id)? {
            return Err(CareError::InvalidReference {
                entity: "Location",
                id: new.location_id,
            });
        }
        let id = next_id(&conn, "plant_ids")?;
        let (micros, planted_at) = now_micros()?;
        conn.execute(
            &format!("INSERT INTO plants ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)", PLANT_COLUMNS),
            params![
                id as i64,
                new.name,
                new.species,
                new.location_id as i64,
                new.sun_exposure,
                new.watering_preference,
                new.soil_preference,
                new.notes,
                micros,
            ],
        )?;
        tracing::debug!("Created plant {} ({}) at location {}", id, new.name, new.location_id);
        Ok(new.into_plant(id, planted_at))
    }

    fn get_plant(&self, id: EntityId) -> Result<Plant> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM plants WHERE id = ?", PLANT_COLUMNS);
        query_one(&conn, &sql, params![id as i64], plant_from_row)?
            .ok_or(CareError::PlantNotFound(id))
    }

    fn list_plants(&self) -> Result<Vec<Plant>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM plants ORDER BY id", PLANT_COLUMNS);
        query_all(&conn, &sql, params![], plant_from_row)
    }

    fn list_plants_at(&self, location_id: EntityId) -> Result<Vec<Plant>> {
        let conn = self.conn()?;
        if !exists(&conn, "locations", location_id)? {
            return Err(CareError::LocationNotFound(location_id));
        }
        let sql = format!("SELECT {} FROM plants WHERE location_id = ? ORDER BY id", PLANT_COLUMNS);
        query_all(&conn, &sql, params![location_id as i64], plant_from_row)
    }

    fn delete_plant(&self, id: EntityId) -> Result<usize> {
        let mut conn = self.conn()?;
        if !exists(&conn, "plants", id)? {
            return Err(CareError::PlantNotFound(id));
        }
        let tx = conn.transaction()?;
        let removed = tx.execute("DELETE FROM readings WHERE plant_id = ?", params![id as i64])?;
        tx.execute("DELETE FROM plants WHERE id = ?", params![id as i64])?;
        tx.commit()?;
        tracing::debug!("Deleted plant {} and {} reading(s)", id, removed);
        Ok(removed)
    }

    fn create_reading(&self, plant_id: EntityId, new: NewReading) -> Result<Reading> {
        let conn = self.conn()?;
        if !exists(&conn, "plants", plant_id)? {
            return Err(CareError::InvalidReference {
                entity: "Plant",
                id: plant_id,
            });
        }
        let id = next_id(&conn, "reading_ids")?;
        let (micros, taken_at) = now_micros()?;
        conn.execute(
            &format!("INSERT INTO readings ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)", READING_COLUMNS),
            params![
                id as i64,
                plant_id as i64,
                micros,
                new.soil_moisture,
                new.soil_ph,
                new.temperature,
                new.humidity,
                new.light,
            ],
        )?;
        tracing::debug!("Recorded reading {} for plant {}", id, plant_id);
        Ok(new.into_reading(id, plant_id, taken_at))
    }

    fn get_reading(&self, id: EntityId) -> Result<Reading> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM readings WHERE id = ?", READING_COLUMNS);
        query_one(&conn, &sql, params![id as i64], reading_from_row)?
            .ok_or(CareError::ReadingNotFound(id))
    }

    fn list_readings(&self, plant_id: EntityId) -> Result<Vec<Reading>> {
        let conn = self.conn()?;
        if !exists(&conn, "plants", plant_id)? {
            return Err(CareError::PlantNotFound(plant_id));
        }
        let sql = format!(
            "SELECT {} FROM readings WHERE plant_id = ? ORDER BY id",
            READING_COLUMNS
        );
        query_all(&conn, &sql, params![plant_id as i64], reading_from_row)
    }

    fn latest_reading(&self, plant_id: EntityId) -> Result<Option<Reading>> {
        let conn = self.conn()?;
        if !exists(&conn, "plants", plant_id)? {
            return Err(CareError::PlantNotFound(plant_id));
        }
        let sql = format!(
            "SELECT {} FROM readings WHERE plant_id = ? ORDER BY taken_at DESC, id DESC LIMIT 1",
            READING_COLUMNS
        );
        query_one(&conn, &sql, params![plant_id as i64], reading_from_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn seeded() -> (DuckDbStore, Plant) {
        let store = DuckDbStore::open_in_memory().unwrap();
        let location = store
            .create_location(NewLocation {
                name: "Back fence".to_string(),
                soil_type: Some("clay".to_string()),
                drainage: None,
                sun_exposure: Some("partial_shade".to_string()),
            })
            .unwrap();
        let mut new = NewPlant::new("Azalea", location.id);
        new.soil_preference = Some("acidic".to_string());
        let plant = store.create_plant(new).unwrap();
        (store, plant)
    }

    #[test]
    fn test_round_trips() {
        let (store, plant) = seeded();
        assert_eq!(store.get_plant(plant.id).unwrap(), plant);
        assert_eq!(
            store.get_location(plant.location_id).unwrap().soil_type.as_deref(),
            Some("clay")
        );

        let reading = store
            .create_reading(
                plant.id,
                NewReading {
                    soil_ph: Some(5.8),
                    ..Default::default()
                },
            )
            .unwrap();
        let fetched = store.get_reading(reading.id).unwrap();
        assert_eq!(fetched, reading);
        assert_relative_eq!(fetched.soil_ph.unwrap(), 5.8);
        assert_eq!(fetched.soil_moisture, None);
    }

    #[test]
    fn test_latest_reading_and_cascade() {
        let (store, plant) = seeded();
        assert_eq!(store.latest_reading(plant.id).unwrap(), None);

        let moisture = |value: f64| NewReading {
            soil_moisture: Some(value),
            ..Default::default()
        };
        store.create_reading(plant.id, moisture(20.0)).unwrap();
        let last = store.create_reading(plant.id, moisture(45.0)).unwrap();
        assert_eq!(store.latest_reading(plant.id).unwrap().map(|r| r.id), Some(last.id));

        assert_eq!(store.delete_plant(plant.id).unwrap(), 2);
        assert!(matches!(store.get_reading(last.id), Err(CareError::ReadingNotFound(_))));
        assert!(matches!(store.latest_reading(plant.id), Err(CareError::PlantNotFound(_))));
    }

    #[test]
    fn test_invalid_references_write_nothing() {
        let (store, plant) = seeded();
        assert!(matches!(
            store.create_plant(NewPlant::new("Ghost", 77)),
            Err(CareError::InvalidReference { entity: "Location", id: 77 })
        ));
        assert!(matches!(
            store.create_reading(99, NewReading::default()),
            Err(CareError::InvalidReference { entity: "Plant", id: 99 })
        ));
        assert_eq!(store.list_plants().unwrap(), vec![plant]);
    }

    #[test]
    fn test_location_in_use() {
        let (store, plant) = seeded();
        assert!(matches!(
            store.delete_location(plant.location_id),
            Err(CareError::LocationInUse { plants: 1, .. })
        ));
    }

    #[test]
    fn test_latest_reading_tie_goes_to_highest_id() {
        let (store, plant) = seeded();
        {
            let conn = store.conn().unwrap();
            let taken_at = 1_700_000_000_000_000_i64;
            for (id, moisture) in [(11_i64, 33.0), (10_i64, 55.0)] {
                conn.execute(
                    "INSERT INTO readings (id, plant_id, taken_at, soil_moisture) VALUES (?, ?, ?, ?)",
                    params![id, plant.id as i64, taken_at, moisture],
                )
                .unwrap();
            }
        }

        let latest = store.latest_reading(plant.id).unwrap().unwrap();
        assert_eq!(latest.id, 11);
        assert_relative_eq!(latest.soil_moisture.unwrap(), 33.0);
    }

    #[test]
    fn test_concurrent_plant_creation_yields_distinct_ids() {
        let (store, plant) = seeded();
        let location_id = plant.location_id;

        let ids: Vec<EntityId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|worker| {
                    let store = &store;
                    scope.spawn(move || {
                        (0..25)
                            .map(|i| {
                                let name = format!("Fern {}-{}", worker, i);
                                store.create_plant(NewPlant::new(name, location_id)).unwrap().id
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 100);
        assert_eq!(store.list_plants().unwrap().len(), 101);
        assert_eq!(unique.iter().max().copied(), Some(101));
    }
}
