//! Read/write full valuation reports as JSON.
//!
//! The JSON report is the "complete" representation of one valuation:
//! input, both component estimates with the full trace, the blend decision,
//! derived insights and the model status at the time of the run.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{BlendedEstimate, Insights, PropertyInput};
use crate::error::AppError;
use crate::models::ModelStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub input: PropertyInput,
    pub estimate: BlendedEstimate,
    pub insights: Insights,
    pub model: ModelStatus,
}

impl ValuationReport {
    pub fn new(output: &RunOutput, model: &ModelStatus) -> Self {
        Self {
            tool: "estate".to_string(),
            generated_at: Local::now(),
            input: output.input.clone(),
            estimate: output.estimate.clone(),
            insights: output.insights,
            model: model.clone(),
        }
    }
}

pub fn write_report<W: Write>(writer: W, report: &ValuationReport) -> Result<(), AppError> {
    serde_json::to_writer_pretty(writer, report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))
}

pub fn read_report<R: Read>(reader: R) -> Result<ValuationReport, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))
}

pub fn write_report_json(path: &Path, report: &ValuationReport) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    write_report(file, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{ValuationContext, run_valuation};
    use crate::domain::{Condition, PropertyType};
    use crate::factors::FactorTable;
    use crate::models::MlPredictor;

    #[test]
    fn report_round_trip_preserves_estimate_and_trace() {
        let table = FactorTable::load().unwrap();
        let ctx = ValuationContext {
            predictor: MlPredictor::synthetic(&table),
            table,
            min_confidence: 0.3,
        };
        let input = PropertyInput {
            location: "premium".to_string(),
            property_type: PropertyType::House,
            area: 210.0,
            age: 35,
            condition: Condition::Excellent,
            floor: 0,
            total_floors: 3,
            amenity_count: 6,
            demand_index: 0.9,
            crime_index: 0.05,
        };
        let output = run_valuation(&ctx, &input).unwrap();
        let report = ValuationReport::new(&output, ctx.predictor.status());

        let mut buf = Vec::new();
        write_report(&mut buf, &report).unwrap();
        let back = read_report(buf.as_slice()).unwrap();

        assert_eq!(back.input, input);
        assert_eq!(back.estimate.mode, output.estimate.mode);
        assert!((back.estimate.final_price - output.estimate.final_price).abs() < 1e-6);
        assert_eq!(back.estimate.rule.trace().len(), output.estimate.rule.trace().len());
        assert_eq!(back.model.source, ctx.predictor.status().source);
        assert_eq!(back.insights, output.insights);
    }
}
