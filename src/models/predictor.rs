//! The ML side of a valuation.
//!
//! `MlPredictor` never fails: a missing or broken artifact is recorded in its
//! `ModelStatus` and every prediction then reports `Unavailable`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{MlEstimate, PropertyInput, UnavailableReason};
use crate::factors::FactorTable;
use crate::models::linear::LinearModel;
use crate::models::synthetic::SyntheticModel;

/// Where the predictor's answers come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSource {
    Artifact { path: PathBuf },
    Synthetic,
}

/// Load-time provenance of the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelStatus {
    pub source: ModelSource,
    pub available: bool,
    pub name: Option<String>,
    /// First 8 hex digits of the SHA-256 of the artifact bytes.
    pub fingerprint: Option<String>,
    pub loaded_at: DateTime<Local>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
enum Backend {
    Linear(LinearModel),
    Synthetic(SyntheticModel),
    Missing,
}

#[derive(Debug, Clone)]
pub struct MlPredictor {
    backend: Backend,
    status: ModelStatus,
}

impl MlPredictor {
    /// Load the configured artifact, or the synthetic stand-in when none is configured.
    pub fn load(model_path: Option<&Path>, table: &FactorTable) -> Self {
        match model_path {
            Some(path) => Self::from_artifact(path),
            None => Self::synthetic(table),
        }
    }

    pub fn from_artifact(path: &Path) -> Self {
        let source = ModelSource::Artifact {
            path: path.to_owned(),
        };
        match LinearModel::from_path(path) {
            Ok((model, bytes)) => {
                let fingerprint = fingerprint(&bytes);
                tracing::info!(
                    model = model.name(),
                    fingerprint = %fingerprint,
                    path = %path.display(),
                    "loaded price model"
                );
                Self {
                    status: ModelStatus {
                        source,
                        available: true,
                        name: Some(model.name().to_string()),
                        fingerprint: Some(fingerprint),
                        loaded_at: Local::now(),
                        error: None,
                    },
                    backend: Backend::Linear(model),
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "price model unavailable, using rules only");
                Self {
                    status: ModelStatus {
                        source,
                        available: false,
                        name: None,
                        fingerprint: None,
                        loaded_at: Local::now(),
                        error: Some(err.to_string()),
                    },
                    backend: Backend::Missing,
                }
            }
        }
    }

    pub fn synthetic(table: &FactorTable) -> Self {
        Self {
            backend: Backend::Synthetic(SyntheticModel::from_table(table)),
            status: ModelStatus {
                source: ModelSource::Synthetic,
                available: true,
                name: Some("synthetic".to_string()),
                fingerprint: None,
                loaded_at: Local::now(),
                error: None,
            },
        }
    }

    pub fn predict(&self, input: &PropertyInput) -> MlEstimate {
        match &self.backend {
            Backend::Linear(model) => model.predict(input),
            Backend::Synthetic(model) => model.predict(input),
            Backend::Missing => MlEstimate::unavailable(UnavailableReason::ArtifactMissing),
        }
    }

    pub fn status(&self) -> &ModelStatus {
        &self.status
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(bytes));
    digest[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Condition, PropertyType};

    fn input() -> PropertyInput {
        PropertyInput {
            location: "suburban".to_string(),
            property_type: PropertyType::Apartment,
            area: 65.0,
            age: 3,
            condition: Condition::Excellent,
            floor: 2,
            total_floors: 6,
            amenity_count: 3,
            demand_index: 0.7,
            crime_index: 0.1,
        }
    }

    #[test]
    fn failed_artifact_load_reports_unavailable() {
        let table = FactorTable::load().unwrap();
        let predictor = MlPredictor::load(Some(Path::new("/nonexistent/model.json")), &table);

        assert!(!predictor.status().available);
        assert!(predictor.status().error.is_some());
        assert_eq!(
            predictor.predict(&input()),
            MlEstimate::unavailable(UnavailableReason::ArtifactMissing)
        );
    }

    #[test]
    fn no_artifact_uses_synthetic_stand_in() {
        let table = FactorTable::load().unwrap();
        let predictor = MlPredictor::load(None, &table);

        assert_eq!(predictor.status().source, ModelSource::Synthetic);
        assert!(predictor.predict(&input()).price().is_some());
    }

    #[test]
    fn fingerprint_is_stable_and_short() {
        assert_eq!(fingerprint(b"abc"), "ba7816bf");
        assert_eq!(fingerprint(b""), "e3b0c442");
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert_eq!(fingerprint(b"abc").len(), 8);
    }
}
