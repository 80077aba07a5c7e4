use super::CareRule;
use crate::models::{Plant, Reading};
use crate::recommendation::band::{Band, BandFit};

pub const ACID_LOVING_PH: Band = Band::new(5.5, 6.5);
pub const GENERAL_PH: Band = Band::new(6.0, 7.5);

/// Ideal pH band given the plant's soil preference text
pub fn ph_band(plant: &Plant) -> Band {
    if plant.prefers_acid_soil() {
        ACID_LOVING_PH
    } else {
        GENERAL_PH
    }
}

/// Soil pH against the plant's soil preference
#[derive(Debug, Clone, Copy, Default)]
pub struct SoilPhRule;

impl CareRule for SoilPhRule {
    fn name(&self) -> &'static str {
        "soil_ph"
    }

    fn evaluate(&self, plant: &Plant, reading: &Reading) -> Vec<String> {
        let Some(ph) = reading.soil_ph else {
            return Vec::new();
        };

        let band = ph_band(plant);
        let message = match band.classify(ph) {
            BandFit::Below => format!(
                "Soil pH is {:.1}, low (acidic) for this plant's ideal {:.1}-{:.1}: consider adding lime.",
                ph, band.low, band.high
            ),
            BandFit::Above => format!(
                "Soil pH is {:.1}, high (alkaline) for this plant's ideal {:.1}-{:.1}: consider acidifying amendments such as sulfur.",
                ph, band.low, band.high
            ),
            BandFit::Within => format!(
                "Soil pH is {:.1}, within the ideal range of {:.1}-{:.1}.",
                ph, band.low, band.high
            ),
        };

        vec![message]
    }
}
