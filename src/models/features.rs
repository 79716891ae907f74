//! Numeric feature encoding shared by the price models.

use crate::domain::{Condition, PropertyInput, PropertyType};

pub const FEATURE_NAMES: [&str; 8] = [
    "area",
    "property_type",
    "condition",
    "age",
    "floor",
    "amenity_count",
    "demand_index",
    "crime_index",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Ranges a model is considered competent in, when the artifact does not
/// ship its own training ranges.
pub const DEFAULT_FEATURE_RANGES: [(f64, f64); FEATURE_COUNT] = [
    (5.0, 50_000.0),
    (0.0, 3.0),
    (0.0, 3.0),
    (0.0, 200.0),
    (-5.0, 100.0),
    (0.0, 15.0),
    (0.0, 1.0),
    (0.0, 1.0),
];

pub fn encode_property_type(property_type: PropertyType) -> f64 {
    match property_type {
        PropertyType::House => 0.0,
        PropertyType::Apartment => 1.0,
        PropertyType::Land => 2.0,
        PropertyType::Commercial => 3.0,
    }
}

pub fn encode_condition(condition: Condition) -> f64 {
    match condition {
        Condition::Poor => 0.0,
        Condition::Fair => 1.0,
        Condition::Good => 2.0,
        Condition::Excellent => 3.0,
    }
}

/// Encode an input in `FEATURE_NAMES` order.
pub fn feature_vector(input: &PropertyInput) -> [f64; FEATURE_COUNT] {
    [
        input.area,
        encode_property_type(input.property_type),
        encode_condition(input.condition),
        f64::from(input.age),
        f64::from(input.floor),
        f64::from(input.amenity_count),
        input.demand_index,
        input.crime_index,
    ]
}

/// Pseudo-confidence from how many features fall inside `ranges`.
///
/// `0.1 + 0.85 * share_in_range`, clamped to `[0.1, 0.95]`.
pub fn range_confidence(features: &[f64], ranges: &[(f64, f64)]) -> f64 {
    if ranges.is_empty() {
        return 0.1;
    }
    let in_range = features
        .iter()
        .zip(ranges)
        .filter(|(v, (lo, hi))| **v >= *lo && **v <= *hi)
        .count();
    let share = in_range as f64 / ranges.len() as f64;
    (0.1 + 0.85 * share).clamp(0.1, 0.95)
}
