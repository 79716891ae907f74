//! Pre-trained linear price model loaded from a JSON artifact.
//!
//! The artifact is produced offline; this module only reads and evaluates it:
//!
//! ```text
//! price = intercept + location_effect[location] + Σ coefficient_i * feature_i
//! ```
//!
//! With `log_target = true` the right-hand side is a log-price and is
//! exponentiated.

use std::collections::BTreeMap;
use std::path::Path;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MlEstimate, PropertyInput, UnavailableReason};
use crate::factors::normalize_location;
use crate::models::features::{
    DEFAULT_FEATURE_RANGES, FEATURE_COUNT, FEATURE_NAMES, feature_vector, range_confidence,
};

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("Failed to read model artifact '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model artifact JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model artifact is inconsistent: {0}")]
    Shape(String),
}

/// On-disk artifact schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    pub name: String,
    #[serde(default)]
    pub log_target: bool,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    /// Additive effect per location seen during training.
    pub location_effects: BTreeMap<String, f64>,
    /// Training range per feature, used for confidence.
    #[serde(default)]
    pub feature_ranges: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone)]
pub struct LinearModel {
    name: String,
    log_target: bool,
    intercept: f64,
    coefficients: DVector<f64>,
    location_effects: BTreeMap<String, f64>,
    feature_ranges: Vec<(f64, f64)>,
}

impl LinearModel {
    pub fn from_path(path: &Path) -> Result<(Self, Vec<u8>), ModelLoadError> {
        let bytes = std::fs::read(path).map_err(|e| ModelLoadError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let artifact: LinearArtifact = serde_json::from_slice(&bytes)?;
        Ok((Self::from_artifact(artifact)?, bytes))
    }

    pub fn from_artifact(artifact: LinearArtifact) -> Result<Self, ModelLoadError> {
        if artifact.coefficients.len() != FEATURE_COUNT {
            return Err(ModelLoadError::Shape(format!(
                "expected {FEATURE_COUNT} coefficients, found {}",
                artifact.coefficients.len()
            )));
        }
        if !artifact.intercept.is_finite() || artifact.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelLoadError::Shape("non-finite parameter".to_string()));
        }
        if artifact.location_effects.is_empty() {
            return Err(ModelLoadError::Shape("no training locations".to_string()));
        }
        let feature_ranges = match artifact.feature_ranges {
            Some(ranges) if ranges.len() != FEATURE_COUNT => {
                return Err(ModelLoadError::Shape(format!(
                    "expected {FEATURE_COUNT} feature ranges, found {}",
                    ranges.len()
                )));
            }
            Some(ranges) => ranges,
            None => DEFAULT_FEATURE_RANGES.to_vec(),
        };
        if let Some(idx) = feature_ranges
            .iter()
            .position(|(lo, hi)| !(lo.is_finite() && hi.is_finite() && lo <= hi))
        {
            return Err(ModelLoadError::Shape(format!(
                "feature range for '{}' must be finite with lo <= hi",
                FEATURE_NAMES[idx]
            )));
        }

        let mut location_effects = BTreeMap::new();
        for (name, effect) in artifact.location_effects {
            let key = normalize_location(&name);
            if location_effects.insert(key.clone(), effect).is_some() {
                return Err(ModelLoadError::Shape(format!(
                    "location '{name}' duplicates '{key}' after normalisation"
                )));
            }
        }

        Ok(Self {
            name: artifact.name,
            log_target: artifact.log_target,
            intercept: artifact.intercept,
            coefficients: DVector::from_vec(artifact.coefficients),
            location_effects,
            feature_ranges,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predict(&self, input: &PropertyInput) -> MlEstimate {
        let Some(effect) = self.location_effects.get(&normalize_location(&input.location)) else {
            return MlEstimate::unavailable(UnavailableReason::UnknownCategory);
        };

        let features = feature_vector(input);
        if features.iter().any(|v| !v.is_finite()) {
            return MlEstimate::unavailable(UnavailableReason::NumericFault);
        }

        let x = DVector::from_row_slice(&features);
        let linear = self.intercept + effect + self.coefficients.dot(&x);
        let price = if self.log_target { linear.exp() } else { linear };
        if !(price.is_finite() && price > 0.0) {
            return MlEstimate::unavailable(UnavailableReason::NumericFault);
        }

        MlEstimate::Available {
            price,
            confidence: range_confidence(&features, &self.feature_ranges),
        }
    }
}
