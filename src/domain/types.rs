//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during valuation
//! - exported to JSON/CSV
//! - reloaded later for reporting or comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Kind of property being valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Land,
    Commercial,
}

impl PropertyType {
    pub const ALL: [PropertyType; 4] = [
        PropertyType::House,
        PropertyType::Apartment,
        PropertyType::Land,
        PropertyType::Commercial,
    ];

    /// Key used in the factor table.
    pub fn key(self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
        }
    }
}

/// Physical condition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Condition {
    pub const ALL: [Condition; 4] = [
        Condition::Poor,
        Condition::Fair,
        Condition::Good,
        Condition::Excellent,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Condition::Poor => "poor",
            Condition::Fair => "fair",
            Condition::Good => "good",
            Condition::Excellent => "excellent",
        }
    }
}

/// A property description, already range-checked upstream.
///
/// Indices (`demand_index`, `crime_index`) are on a `[0, 1]` scale.
/// `floor` is negative for basement levels; `0` is ground level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyInput {
    pub location: String,
    pub property_type: PropertyType,
    /// Built area in m².
    pub area: f64,
    /// Age in years.
    pub age: u32,
    pub condition: Condition,
    pub floor: i32,
    pub total_floors: u32,
    #[serde(default)]
    pub amenity_count: u32,
    pub demand_index: f64,
    pub crime_index: f64,
}

impl PropertyInput {
    /// Range checks applied to inputs that did not come through the CLI parser.
    pub fn check_ranges(&self) -> Result<(), String> {
        if !(self.area.is_finite() && self.area > 0.0) {
            return Err(format!("area must be a positive number (got {})", self.area));
        }
        for (name, value) in [("demand_index", self.demand_index), ("crime_index", self.crime_index)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1] (got {value})"));
            }
        }
        Ok(())
    }
}

/// One multiplicative adjustment in the rule chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    PropertyType,
    Age,
    Condition,
    Floor,
    Amenities,
    Demand,
    Crime,
}

impl FactorKind {
    /// Application order of the rule chain.
    pub const CHAIN: [FactorKind; 7] = [
        FactorKind::PropertyType,
        FactorKind::Age,
        FactorKind::Condition,
        FactorKind::Floor,
        FactorKind::Amenities,
        FactorKind::Demand,
        FactorKind::Crime,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FactorKind::PropertyType => "property_type",
            FactorKind::Age => "age",
            FactorKind::Condition => "condition",
            FactorKind::Floor => "floor",
            FactorKind::Amenities => "amenities",
            FactorKind::Demand => "demand",
            FactorKind::Crime => "crime",
        }
    }
}

/// A single entry of the valuation trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentStep {
    pub factor: FactorKind,
    /// Multiplier as computed from the input, before clamping.
    pub raw: f64,
    /// Multiplier actually applied.
    pub applied: f64,
    /// True if clamping changed the raw multiplier.
    pub clamped: bool,
    /// Price per m² after this step.
    pub running_rate: f64,
    /// Total price after this step.
    pub running_price: f64,
    pub note: String,
}

/// Output of the rule engine.
///
/// The trace is frozen once the estimate is built; callers only get a slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEstimate {
    base_rate: f64,
    area: f64,
    price_per_area: f64,
    total_price: f64,
    trace: Vec<AdjustmentStep>,
}

impl RuleEstimate {
    pub(crate) fn new(
        base_rate: f64,
        area: f64,
        price_per_area: f64,
        total_price: f64,
        trace: Vec<AdjustmentStep>,
    ) -> Self {
        Self {
            base_rate,
            area,
            price_per_area,
            total_price,
            trace,
        }
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    pub fn price_per_area(&self) -> f64 {
        self.price_per_area
    }

    pub fn total_price(&self) -> f64 {
        self.total_price
    }

    pub fn trace(&self) -> &[AdjustmentStep] {
        &self.trace
    }

    pub fn step(&self, factor: FactorKind) -> Option<&AdjustmentStep> {
        self.trace.iter().find(|s| s.factor == factor)
    }
}

/// Why the predictor declined to produce a price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No usable model artifact was loaded.
    ArtifactMissing,
    /// The input names a category the model never saw (e.g. a new location).
    UnknownCategory,
    /// A derived feature or the prediction itself was not finite.
    NumericFault,
}

impl UnavailableReason {
    pub fn describe(self) -> &'static str {
        match self {
            UnavailableReason::ArtifactMissing => "model artifact not loaded",
            UnavailableReason::UnknownCategory => "input outside the model's trained categories",
            UnavailableReason::NumericFault => "numeric fault while predicting",
        }
    }
}

/// Output of the ML predictor.
///
/// A low confidence is still reported as `Available`; it is the blender that
/// decides to ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MlEstimate {
    Available { price: f64, confidence: f64 },
    Unavailable { reason: UnavailableReason },
}

impl MlEstimate {
    pub fn unavailable(reason: UnavailableReason) -> Self {
        MlEstimate::Unavailable { reason }
    }

    pub fn price(&self) -> Option<f64> {
        match self {
            MlEstimate::Available { price, .. } => Some(*price),
            MlEstimate::Unavailable { .. } => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            MlEstimate::Available { confidence, .. } => Some(*confidence),
            MlEstimate::Unavailable { .. } => None,
        }
    }
}

/// Which source(s) produced the final price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    RuleOnly,
    Weighted,
    MlOnly,
}

impl BlendMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BlendMode::RuleOnly => "rule_only",
            BlendMode::Weighted => "weighted",
            BlendMode::MlOnly => "ml_only",
        }
    }
}

/// Why the blender picked its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendReason {
    MlUnavailable,
    LowConfidence,
    ConfidenceWeighted,
    FullConfidence,
}

impl BlendReason {
    pub fn describe(self) -> &'static str {
        match self {
            BlendReason::MlUnavailable => "ML prediction unavailable",
            BlendReason::LowConfidence => "ML confidence below threshold",
            BlendReason::ConfidenceWeighted => "blended by ML confidence",
            BlendReason::FullConfidence => "ML prediction at full confidence",
        }
    }
}

/// Final reconciled estimate plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendedEstimate {
    pub final_price: f64,
    pub final_price_per_area: f64,
    pub mode: BlendMode,
    pub reason: BlendReason,
    /// Weight given to the ML price (rule weight is `1 - ml_weight`).
    pub ml_weight: f64,
    pub rule: RuleEstimate,
    pub ml: MlEstimate,
}

impl BlendedEstimate {
    pub fn rule_weight(&self) -> f64 {
        1.0 - self.ml_weight
    }
}

/// Rental and risk figures derived from a finished valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub rent_yield: f64,
    pub annual_rent: f64,
    /// `0` (low) to `1` (high).
    pub risk_score: f64,
    /// Net annual return on the final price, as a fraction.
    pub roi: f64,
    pub future_price_1yr: f64,
    pub future_price_3yr: f64,
}

/// A run's configuration as understood by the pipeline.
///
/// Derived from CLI flags, then environment, then defaults.
#[derive(Debug, Clone)]
pub struct ValuationConfig {
    /// User factor file; the embedded defaults are used when absent.
    pub factors_path: Option<PathBuf>,
    /// Model artifact; the synthetic stand-in is used when absent.
    pub model_path: Option<PathBuf>,
    pub min_confidence: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            factors_path: None,
            model_path: None,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.3;
