//! Deterministic synthetic stand-in for a trained price model.
//!
//! Used when no model artifact is configured, so the blending path can be
//! exercised end to end. The price is the location rate times area and the
//! property type factor, perturbed by a seeded draw. The seed is taken from a
//! SHA-256 digest of the input fields, so identical inputs produce identical
//! estimates on every build and platform.

use std::collections::{BTreeMap, HashMap};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use sha2::{Digest, Sha256};

use crate::domain::{MlEstimate, PropertyInput, PropertyType, UnavailableReason};
use crate::factors::{FactorTable, normalize_location};

/// Largest relative deviation from the reference price.
const MAX_DEVIATION: f64 = 0.15;
/// Spread of the deviation before truncation.
const DEVIATION_SIGMA: f64 = 0.06;
const CONFIDENCE_MIN: f64 = 0.65;
const CONFIDENCE_MAX: f64 = 0.90;

#[derive(Debug, Clone)]
pub struct SyntheticModel {
    rates: BTreeMap<String, f64>,
    type_factors: HashMap<PropertyType, f64>,
}

impl SyntheticModel {
    /// Snapshot the categories the stand-in "knows" from a factor table.
    pub fn from_table(table: &FactorTable) -> Self {
        Self {
            rates: table
                .locations()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            type_factors: table.property_types().collect(),
        }
    }

    pub fn predict(&self, input: &PropertyInput) -> MlEstimate {
        let Some(rate) = self.rates.get(&normalize_location(&input.location)) else {
            return MlEstimate::unavailable(UnavailableReason::UnknownCategory);
        };
        let Some(type_factor) = self.type_factors.get(&input.property_type) else {
            return MlEstimate::unavailable(UnavailableReason::UnknownCategory);
        };

        let mut rng = StdRng::seed_from_u64(input_seed(input));
        let Ok(normal) = Normal::new(0.0, DEVIATION_SIGMA) else {
            return MlEstimate::unavailable(UnavailableReason::NumericFault);
        };
        let deviation = normal.sample(&mut rng).clamp(-MAX_DEVIATION, MAX_DEVIATION);
        let confidence = rng.gen_range(CONFIDENCE_MIN..=CONFIDENCE_MAX);

        let price = rate * type_factor * input.area * (1.0 + deviation);
        if !(price.is_finite() && price > 0.0) {
            return MlEstimate::unavailable(UnavailableReason::NumericFault);
        }

        MlEstimate::Available { price, confidence }
    }
}

/// First 8 bytes (little endian) of SHA-256 over the canonical input encoding:
/// text fields NUL-terminated, numbers as little-endian bytes, in field order.
fn input_seed(input: &PropertyInput) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(normalize_location(&input.location).as_bytes());
    hasher.update([0u8]);
    hasher.update(input.property_type.key().as_bytes());
    hasher.update([0u8]);
    hasher.update(input.area.to_le_bytes());
    hasher.update(input.age.to_le_bytes());
    hasher.update(input.condition.key().as_bytes());
    hasher.update([0u8]);
    hasher.update(input.floor.to_le_bytes());
    hasher.update(input.total_floors.to_le_bytes());
    hasher.update(input.amenity_count.to_le_bytes());
    hasher.update(input.demand_index.to_le_bytes());
    hasher.update(input.crime_index.to_le_bytes());

    let digest = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}
