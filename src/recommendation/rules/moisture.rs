use super::CareRule;
use crate::models::{Plant, Reading, WateringPreference};
use crate::recommendation::band::{Band, BandFit};

/// Acceptable soil moisture (%) for a watering preference.
/// Absent or unrecognized preferences use the medium band.
pub fn moisture_band(preference: Option<WateringPreference>) -> Band {
    match preference {
        Some(WateringPreference::Low) => Band::new(10.0, 40.0),
        Some(WateringPreference::High) => Band::new(50.0, 80.0),
        Some(WateringPreference::Medium) | None => Band::new(30.0, 60.0),
    }
}

/// Soil moisture against the plant's watering preference
///
/// One message whenever the reading carries a moisture value, none otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoistureRule;

impl CareRule for MoistureRule {
    fn name(&self) -> &'static str {
        "moisture"
    }

    fn evaluate(&self, plant: &Plant, reading: &Reading) -> Vec<String> {
        let Some(moisture) = reading.soil_moisture else {
            return Vec::new();
        };

        let preference = plant.watering();
        let band = moisture_band(preference);
        let label = preference.unwrap_or(WateringPreference::Medium).as_str();

        let message = match band.classify(moisture) {
            BandFit::Below => format!(
                "Soil moisture is {:.1}%, below the {:.0}-{:.0}% range for {} watering: too dry, water soon.",
                moisture, band.low, band.high, label
            ),
            BandFit::Above => format!(
                "Soil moisture is {:.1}%, above the {:.0}-{:.0}% range for {} watering: overwatering risk, check drainage.",
                moisture, band.low, band.high, label
            ),
            BandFit::Within => format!(
                "Soil moisture is {:.1}%, within the healthy range of {:.0}-{:.0}% for {} watering.",
                moisture, band.low, band.high, label
            ),
        };

        vec![message]
    }
}
