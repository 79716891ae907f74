//! Rule-based valuation.
//!
//! The price per m² is the location base rate multiplied by a fixed chain of
//! adjustment factors. Each factor is a small pure function of the input and
//! the factor table; clamping is applied centrally by `TraceBuilder` using
//! the band table in `factors::bands`.

use crate::domain::{FactorKind, PropertyInput, RuleEstimate};
use crate::engine::trace::TraceBuilder;
use crate::error::ValuationError;
use crate::factors::{AgeParams, DemandParams, FactorTable, FloorParams};

/// Evaluate a property with the rule chain.
///
/// Fails with `InvalidInput` for a non-positive area and with `Lookup` for a
/// location or property type missing from the table.
pub fn evaluate(input: &PropertyInput, table: &FactorTable) -> Result<RuleEstimate, ValuationError> {
    if !(input.area.is_finite() && input.area > 0.0) {
        return Err(ValuationError::invalid(format!(
            "built area must be positive (got {})",
            input.area
        )));
    }

    let base_rate = table.base_rate(&input.location)?;
    let type_factor = table.type_factor(input.property_type)?;

    let mut trace = TraceBuilder::new(base_rate, input.area);

    trace.apply(
        FactorKind::PropertyType,
        type_factor,
        format!("property type {}", input.property_type.key()),
    );
    trace.apply(
        FactorKind::Age,
        age_factor(input.age, &table.age),
        format!("age {} years", input.age),
    );
    trace.apply(
        FactorKind::Condition,
        table.condition_factor(input.condition),
        format!("condition {}", input.condition.key()),
    );
    trace.apply(
        FactorKind::Floor,
        floor_factor(input.floor, input.total_floors, &table.floor),
        format!("floor {} of {}", input.floor, input.total_floors),
    );
    trace.apply(
        FactorKind::Amenities,
        amenities_factor(input.amenity_count, table.per_amenity),
        format!("{} amenities", input.amenity_count),
    );
    trace.apply(
        FactorKind::Demand,
        demand_factor(input.demand_index, &table.demand),
        format!("demand index {:.2}", input.demand_index),
    );
    trace.apply(
        FactorKind::Crime,
        crime_factor(input.crime_index, table.crime_weight),
        format!("crime index {:.2}", input.crime_index),
    );

    let estimate = trace.finish();
    if !(estimate.total_price().is_finite() && estimate.total_price() > 0.0) {
        return Err(ValuationError::invalid(format!(
            "rule chain produced a non-positive price ({})",
            estimate.total_price()
        )));
    }
    Ok(estimate)
}

/// Linear depreciation; non-increasing in age for any non-negative rate.
pub fn age_factor(age: u32, params: &AgeParams) -> f64 {
    1.0 - params.rate_per_year * f64::from(age)
}

/// Floor adjustment. The sign of `floor` picks the branch:
///
/// - above ground: `1 + min(per_floor_bonus * floor, max_floor_bonus)`
/// - ground or below: `1 - (ground_penalty + per_level_penalty * |floor|)`
///
/// Floors above `total_floors` are counted as the top floor.
pub fn floor_factor(floor: i32, total_floors: u32, params: &FloorParams) -> f64 {
    if floor > 0 {
        let top = i32::try_from(total_floors).unwrap_or(i32::MAX).max(1);
        let counted = f64::from(floor.min(top));
        1.0 + (params.per_floor_bonus * counted).min(params.max_floor_bonus)
    } else {
        let depth = f64::from(floor).abs();
        1.0 - (params.ground_penalty + params.per_level_penalty * depth)
    }
}

pub fn amenities_factor(amenity_count: u32, per_amenity: f64) -> f64 {
    1.0 + per_amenity * f64::from(amenity_count)
}

/// Centred on 1.0 at the neutral demand index.
pub fn demand_factor(demand_index: f64, params: &DemandParams) -> f64 {
    1.0 + (demand_index - params.neutral) * params.sensitivity
}

/// Decreasing in crime; `1.0` at zero crime.
pub fn crime_factor(crime_index: f64, weight: f64) -> f64 {
    1.0 - crime_index * weight
}
