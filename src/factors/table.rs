//! Factor table: base rates and multiplier parameters.
//!
//! The table is parsed from TOML once, validated, and then only read. Every
//! schema problem is reported here as a `ConfigError` so valuation never
//! discovers a bad parameter mid-computation.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Condition, PropertyType};
use crate::error::{ConfigError, LookupKind, ValuationError};

/// Factor configuration shipped with the crate.
pub const DEFAULT_FACTORS: &str = include_str!("../../config/factors.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct AgeParams {
    pub rate_per_year: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloorParams {
    pub per_floor_bonus: f64,
    pub max_floor_bonus: f64,
    pub ground_penalty: f64,
    pub per_level_penalty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemandParams {
    pub neutral: f64,
    pub sensitivity: f64,
}

/// Gross rental yields by demand tier.
#[derive(Debug, Clone, PartialEq)]
pub struct RentYields {
    pub high_demand: f64,
    pub medium_demand: f64,
    pub low_demand: f64,
}

impl Default for RentYields {
    fn default() -> Self {
        Self {
            high_demand: 0.08,
            medium_demand: 0.05,
            low_demand: 0.03,
        }
    }
}

/// Annual market appreciation and volatility for price forecasts.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastParams {
    pub appreciation: f64,
    pub volatility: f64,
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            appreciation: 0.03,
            volatility: 0.1,
        }
    }
}

/// Validated, immutable factor registry.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    location_rates: BTreeMap<String, f64>,
    type_factors: HashMap<PropertyType, f64>,
    condition_factors: HashMap<Condition, f64>,
    pub age: AgeParams,
    pub floor: FloorParams,
    pub per_amenity: f64,
    pub demand: DemandParams,
    pub crime_weight: f64,
    pub rent_yields: RentYields,
    pub forecast: ForecastParams,
}

impl FactorTable {
    /// Load the embedded default factors.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_FACTORS)
    }

    /// Load factors from a user TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_owned(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawFactors = toml::from_str(content)?;
        raw.validate()
    }

    /// Base rate per m² for a location.
    pub fn base_rate(&self, location: &str) -> Result<f64, ValuationError> {
        let key = normalize_location(location);
        self.location_rates
            .get(&key)
            .copied()
            .ok_or_else(|| ValuationError::lookup(LookupKind::Location, location))
    }

    pub fn type_factor(&self, property_type: PropertyType) -> Result<f64, ValuationError> {
        self.type_factors
            .get(&property_type)
            .copied()
            .ok_or_else(|| ValuationError::lookup(LookupKind::PropertyType, property_type.key()))
    }

    pub fn condition_factor(&self, condition: Condition) -> f64 {
        // Every condition is required at load time.
        self.condition_factors.get(&condition).copied().unwrap_or(1.0)
    }

    /// Locations and rates in key order.
    pub fn locations(&self) -> impl Iterator<Item = (&str, f64)> {
        self.location_rates.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Configured property types in declaration order.
    pub fn property_types(&self) -> impl Iterator<Item = (PropertyType, f64)> + '_ {
        PropertyType::ALL
            .into_iter()
            .filter_map(|t| self.type_factors.get(&t).map(|f| (t, *f)))
    }
}

/// Normalise a location identifier to its table key.
///
/// `" Urban Center "`, `"urban-center"` and `"urban_center"` all map to `urban_center`.
pub fn normalize_location(location: &str) -> String {
    location
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

// Raw TOML shape. Everything is optional so that missing entries are reported
// by name rather than as a generic deserialization error.

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFactors {
    location_base_rates: Option<BTreeMap<String, f64>>,
    property_type_factors: Option<BTreeMap<String, f64>>,
    condition_factors: Option<BTreeMap<String, f64>>,
    age: Option<RawAge>,
    floor: Option<RawFloor>,
    amenities: Option<RawAmenities>,
    demand: Option<RawDemand>,
    crime: Option<RawCrime>,
    rent_yields: Option<RawRentYields>,
    forecast: Option<RawForecast>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAge {
    rate_per_year: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFloor {
    per_floor_bonus: Option<f64>,
    max_floor_bonus: Option<f64>,
    ground_penalty: Option<f64>,
    per_level_penalty: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAmenities {
    per_amenity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDemand {
    neutral: Option<f64>,
    sensitivity: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCrime {
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRentYields {
    high_demand: Option<f64>,
    medium_demand: Option<f64>,
    low_demand: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawForecast {
    appreciation: Option<f64>,
    volatility: Option<f64>,
}

fn require(value: Option<f64>, key: &str) -> Result<f64, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    if !value.is_finite() {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(value)
}

fn require_positive(value: Option<f64>, key: &str) -> Result<f64, ConfigError> {
    let value = require(value, key)?;
    if value <= 0.0 {
        return Err(ConfigError::NonPositive {
            key: key.to_string(),
            value,
        });
    }
    Ok(value)
}

fn require_non_negative(value: Option<f64>, key: &str) -> Result<f64, ConfigError> {
    let value = require(value, key)?;
    if value < 0.0 {
        return Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("must be >= 0 (got {value})"),
        });
    }
    Ok(value)
}

impl RawFactors {
    fn validate(self) -> Result<FactorTable, ConfigError> {
        let raw_rates = self
            .location_base_rates
            .ok_or_else(|| ConfigError::MissingKey("location_base_rates".to_string()))?;
        if raw_rates.is_empty() {
            return Err(ConfigError::Invalid {
                key: "location_base_rates".to_string(),
                reason: "at least one location is required".to_string(),
            });
        }
        let mut location_rates = BTreeMap::new();
        for (name, rate) in raw_rates {
            let key = normalize_location(&name);
            let rate = require_positive(Some(rate), &format!("location_base_rates.{name}"))?;
            if location_rates.insert(key.clone(), rate).is_some() {
                return Err(ConfigError::Invalid {
                    key: format!("location_base_rates.{name}"),
                    reason: format!("duplicates location '{key}' after normalisation"),
                });
            }
        }

        let raw_types = self
            .property_type_factors
            .ok_or_else(|| ConfigError::MissingKey("property_type_factors".to_string()))?;
        let mut type_factors = HashMap::new();
        for (name, factor) in raw_types {
            let key = format!("property_type_factors.{name}");
            let property_type = PropertyType::ALL
                .into_iter()
                .find(|t| t.key() == name.trim().to_lowercase())
                .ok_or_else(|| ConfigError::Invalid {
                    key: key.clone(),
                    reason: "unknown property type".to_string(),
                })?;
            type_factors.insert(property_type, require_positive(Some(factor), &key)?);
        }

        let raw_conditions = self
            .condition_factors
            .ok_or_else(|| ConfigError::MissingKey("condition_factors".to_string()))?;
        let mut condition_factors = HashMap::new();
        for condition in Condition::ALL {
            let key = format!("condition_factors.{}", condition.key());
            let value = require_positive(raw_conditions.get(condition.key()).copied(), &key)?;
            condition_factors.insert(condition, value);
        }

        let age = self.age.ok_or_else(|| ConfigError::MissingKey("age".to_string()))?;
        let age = AgeParams {
            rate_per_year: require_non_negative(age.rate_per_year, "age.rate_per_year")?,
        };

        let floor = self.floor.ok_or_else(|| ConfigError::MissingKey("floor".to_string()))?;
        let floor = FloorParams {
            per_floor_bonus: require_non_negative(floor.per_floor_bonus, "floor.per_floor_bonus")?,
            max_floor_bonus: require_non_negative(floor.max_floor_bonus, "floor.max_floor_bonus")?,
            // Ground level must always land on the penalty side.
            ground_penalty: require_positive(floor.ground_penalty, "floor.ground_penalty")?,
            per_level_penalty: require_non_negative(
                floor.per_level_penalty,
                "floor.per_level_penalty",
            )?,
        };

        let amenities = self
            .amenities
            .ok_or_else(|| ConfigError::MissingKey("amenities".to_string()))?;
        let per_amenity = require_non_negative(amenities.per_amenity, "amenities.per_amenity")?;

        let demand = self.demand.ok_or_else(|| ConfigError::MissingKey("demand".to_string()))?;
        let neutral = require(demand.neutral, "demand.neutral")?;
        if !(0.0..=1.0).contains(&neutral) {
            return Err(ConfigError::Invalid {
                key: "demand.neutral".to_string(),
                reason: format!("must be within [0, 1] (got {neutral})"),
            });
        }
        let demand = DemandParams {
            neutral,
            sensitivity: require_non_negative(demand.sensitivity, "demand.sensitivity")?,
        };

        let crime = self.crime.ok_or_else(|| ConfigError::MissingKey("crime".to_string()))?;
        let crime_weight = require_positive(crime.weight, "crime.weight")?;

        let rent_yields = match self.rent_yields {
            None => RentYields::default(),
            Some(raw) => {
                let defaults = RentYields::default();
                let tier = |value: Option<f64>, fallback: f64, key: &str| -> Result<f64, ConfigError> {
                    let value = require_positive(Some(value.unwrap_or(fallback)), key)?;
                    if value > 1.0 {
                        return Err(ConfigError::Invalid {
                            key: key.to_string(),
                            reason: format!("yield must be a fraction <= 1 (got {value})"),
                        });
                    }
                    Ok(value)
                };
                RentYields {
                    high_demand: tier(raw.high_demand, defaults.high_demand, "rent_yields.high_demand")?,
                    medium_demand: tier(
                        raw.medium_demand,
                        defaults.medium_demand,
                        "rent_yields.medium_demand",
                    )?,
                    low_demand: tier(raw.low_demand, defaults.low_demand, "rent_yields.low_demand")?,
                }
            }
        };

        let forecast = match self.forecast {
            None => ForecastParams::default(),
            Some(raw) => {
                let defaults = ForecastParams::default();
                let appreciation = require(
                    Some(raw.appreciation.unwrap_or(defaults.appreciation)),
                    "forecast.appreciation",
                )?;
                if !(-0.5..=0.5).contains(&appreciation) {
                    return Err(ConfigError::Invalid {
                        key: "forecast.appreciation".to_string(),
                        reason: format!("must be within [-0.5, 0.5] (got {appreciation})"),
                    });
                }
                let volatility = require_non_negative(
                    Some(raw.volatility.unwrap_or(defaults.volatility)),
                    "forecast.volatility",
                )?;
                if volatility > 1.0 {
                    return Err(ConfigError::Invalid {
                        key: "forecast.volatility".to_string(),
                        reason: format!("must be within [0, 1] (got {volatility})"),
                    });
                }
                ForecastParams {
                    appreciation,
                    volatility,
                }
            }
        };

        Ok(FactorTable {
            location_rates,
            type_factors,
            condition_factors,
            age,
            floor,
            per_amenity,
            demand,
            crime_weight,
            rent_yields,
            forecast,
        })
    }
}
