//! Clamp bands for each adjustment factor.
//!
//! Bands are fixed policy rather than configuration: a factor file can move
//! the raw curves around, but never widen the range a single factor may swing.

use crate::domain::FactorKind;

/// Closed interval `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClampBand {
    pub lower: f64,
    pub upper: f64,
}

impl ClampBand {
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Clamp `raw` into the band. Values on a bound are returned unchanged.
    ///
    /// A NaN input lands on `lower`: `f64::max` ignores the NaN operand.
    pub fn apply(self, raw: f64) -> f64 {
        raw.max(self.lower).min(self.upper)
    }

    pub fn contains(self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Band per clamped factor. Property type is not clamped.
pub const CLAMP_BANDS: [(FactorKind, ClampBand); 6] = [
    (FactorKind::Age, ClampBand::new(0.5, 1.0)),
    (FactorKind::Condition, ClampBand::new(0.6, 1.2)),
    (FactorKind::Floor, ClampBand::new(0.7, 1.15)),
    (FactorKind::Amenities, ClampBand::new(1.0, 1.3)),
    (FactorKind::Demand, ClampBand::new(0.85, 1.25)),
    (FactorKind::Crime, ClampBand::new(0.6, 1.0)),
];

pub fn band_for(kind: FactorKind) -> Option<ClampBand> {
    CLAMP_BANDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, band)| *band)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_values() -> Vec<f64> {
        let mut values: Vec<f64> = (-40..=40).map(|i| i as f64 * 0.05).collect();
        values.extend([f64::MIN, -1e9, 1e9, f64::MAX, f64::INFINITY, f64::NEG_INFINITY, f64::NAN]);
        values
    }

    #[test]
    fn clamp_is_total_and_idempotent() {
        for (kind, band) in CLAMP_BANDS {
            for raw in probe_values() {
                let once = band.apply(raw);
                assert!(band.contains(once), "{kind:?}: {raw} -> {once} escaped band");
                assert_eq!(band.apply(once), once, "{kind:?}: clamp not idempotent at {raw}");
            }
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let band = ClampBand::new(0.6, 1.2);
        assert_eq!(band.apply(0.6), 0.6);
        assert_eq!(band.apply(1.2), 1.2);
        assert_eq!(band.apply(0.9), 0.9);
    }

    #[test]
    fn property_type_is_unclamped_and_crime_floor_is_point_six() {
        assert!(band_for(FactorKind::PropertyType).is_none());
        assert_eq!(band_for(FactorKind::Crime).map(|b| b.lower), Some(0.6));
        for kind in FactorKind::CHAIN {
            if kind != FactorKind::PropertyType {
                assert!(band_for(kind).is_some(), "{kind:?} has no band");
            }
        }
    }
}
