//! Entity types for locations, plants and sensor readings
//!
//! Preference fields keep the caller's original text so that a stored plant
//! reads back exactly as it was submitted. The moisture rule derives
//! `WateringPreference` from the stored text when it evaluates a plant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CareError, Result};

/// Identifier assigned by the entity store (starts at 1 per entity type)
pub type EntityId = u64;

// ============================================================================
// Location
// ============================================================================

/// A named physical growing site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub drainage: Option<String>,
    /// Default sun exposure for plants placed here
    #[serde(default)]
    pub sun_exposure: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    pub name: String,
    #[serde(default)]
    pub soil_type: Option<String>,
    #[serde(default)]
    pub drainage: Option<String>,
    #[serde(default)]
    pub sun_exposure: Option<String>,
}

impl NewLocation {
    pub fn validate(&self) -> Result<()> {
        require_name("location", &self.name)
    }

    pub(crate) fn into_location(self, id: EntityId) -> Location {
        Location {
            id,
            name: self.name,
            soil_type: self.soil_type,
            drainage: self.drainage,
            sun_exposure: self.sun_exposure,
        }
    }
}

// ============================================================================
// Plant
// ============================================================================

/// A tracked individual plant and its care preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    pub location_id: EntityId,
    /// full_sun | partial_shade | shade
    #[serde(default)]
    pub sun_exposure: Option<String>,
    /// low | medium | high
    #[serde(default)]
    pub watering_preference: Option<String>,
    /// Free text; "acid" anywhere in it marks an acid-loving plant
    #[serde(default)]
    pub soil_preference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Set once at creation
    pub planted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPlant {
    pub name: String,
    #[serde(default)]
    pub species: Option<String>,
    pub location_id: EntityId,
    #[serde(default)]
    pub sun_exposure: Option<String>,
    #[serde(default)]
    pub watering_preference: Option<String>,
    #[serde(default)]
    pub soil_preference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewPlant {
    /// Minimal plant at a location, all preferences unset
    pub fn new(name: impl Into<String>, location_id: EntityId) -> Self {
        Self {
            name: name.into(),
            species: None,
            location_id,
            sun_exposure: None,
            watering_preference: None,
            soil_preference: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        require_name("plant", &self.name)
    }

    pub(crate) fn into_plant(self, id: EntityId, planted_at: DateTime<Utc>) -> Plant {
        Plant {
            id,
            name: self.name,
            species: self.species,
            location_id: self.location_id,
            sun_exposure: self.sun_exposure,
            watering_preference: self.watering_preference,
            soil_preference: self.soil_preference,
            notes: self.notes,
            planted_at,
        }
    }
}

impl Plant {
    pub fn watering(&self) -> Option<WateringPreference> {
        self.watering_preference.as_deref().and_then(WateringPreference::parse)
    }

    /// True when the soil preference mentions "acid" in any case
    pub fn prefers_acid_soil(&self) -> bool {
        self.soil_preference
            .as_deref()
            .map(|s| s.to_lowercase().contains("acid"))
            .unwrap_or(false)
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Immutable sensor snapshot for one plant. Every measurement is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: EntityId,
    pub plant_id: EntityId,
    pub taken_at: DateTime<Utc>,
    /// Percent, 0-100
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    /// 0-14
    #[serde(default)]
    pub soil_ph: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub light: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    #[serde(default)]
    pub soil_moisture: Option<f64>,
    #[serde(default)]
    pub soil_ph: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    #[serde(default)]
    pub light: Option<f64>,
}

impl NewReading {
    pub fn validate(&self) -> Result<()> {
        check_range("soil_moisture", self.soil_moisture, 0.0, 100.0)?;
        check_range("soil_ph", self.soil_ph, 0.0, 14.0)?;
        for (field, value) in [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("light", self.light),
        ] {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(CareError::InvalidInput(format!("{} must be a finite number", field)));
            }
        }
        Ok(())
    }

    pub(crate) fn into_reading(
        self,
        id: EntityId,
        plant_id: EntityId,
        taken_at: DateTime<Utc>,
    ) -> Reading {
        Reading {
            id,
            plant_id,
            taken_at,
            soil_moisture: self.soil_moisture,
            soil_ph: self.soil_ph,
            temperature: self.temperature,
            humidity: self.humidity,
            light: self.light,
        }
    }
}

// ============================================================================
// Preference vocabularies
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WateringPreference {
    Low,
    Medium,
    High,
}

impl WateringPreference {
    /// Case-insensitive; None for anything outside low/medium/high
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" => Some(WateringPreference::Low),
            "medium" => Some(WateringPreference::Medium),
            "high" => Some(WateringPreference::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WateringPreference::Low => "low",
            WateringPreference::Medium => "medium",
            WateringPreference::High => "high",
        }
    }
}

// ============================================================================
// Validation helpers
// ============================================================================

fn require_name(entity: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CareError::InvalidInput(format!("{} name must not be empty", entity)));
    }
    Ok(())
}

fn check_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<()> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(CareError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, v
        ))),
        _ => Ok(()),
    }
}
