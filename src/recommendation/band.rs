//! Acceptable-range comparison
//!
//! A value exactly on either bound counts as within the band.

/// Where a measured value falls relative to a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandFit {
    /// value < low
    Below,
    /// low <= value <= high
    Within,
    /// value > high
    Above,
}

/// Closed acceptable range `[low, high]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn classify(&self, value: f64) -> BandFit {
        if value < self.low {
            BandFit::Below
        } else if value > self.high {
            BandFit::Above
        } else {
            BandFit::Within
        }
    }
}
