//! Export valuation results to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts, and to be read back (`read_estimates`) for comparisons.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::app::pipeline::RunOutput;
use crate::domain::{BlendMode, BlendReason, FactorKind, PropertyType, RuleEstimate};
use crate::error::AppError;

/// One flat line per valued property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub id: String,
    pub location: String,
    pub property_type: PropertyType,
    pub area: f64,
    pub rule_price_per_area: f64,
    pub rule_total_price: f64,
    pub ml_price: Option<f64>,
    pub ml_confidence: Option<f64>,
    pub mode: BlendMode,
    pub reason: BlendReason,
    pub ml_weight: f64,
    pub final_price: f64,
    pub final_price_per_area: f64,
    pub annual_rent: f64,
    pub roi: f64,
    pub future_price_1yr: f64,
    pub future_price_3yr: f64,
    pub risk_score: f64,
}

impl EstimateRecord {
    pub fn from_output(id: impl Into<String>, output: &RunOutput) -> Self {
        let estimate = &output.estimate;
        Self {
            id: id.into(),
            location: output.input.location.clone(),
            property_type: output.input.property_type,
            area: estimate.rule.area(),
            rule_price_per_area: estimate.rule.price_per_area(),
            rule_total_price: estimate.rule.total_price(),
            ml_price: estimate.ml.price(),
            ml_confidence: estimate.ml.confidence(),
            mode: estimate.mode,
            reason: estimate.reason,
            ml_weight: estimate.ml_weight,
            final_price: estimate.final_price,
            final_price_per_area: estimate.final_price_per_area,
            annual_rent: output.insights.annual_rent,
            roi: output.insights.roi,
            future_price_1yr: output.insights.future_price_1yr,
            future_price_3yr: output.insights.future_price_3yr,
            risk_score: output.insights.risk_score,
        }
    }
}

/// One line per adjustment step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub step: usize,
    pub factor: FactorKind,
    pub raw: f64,
    pub applied: f64,
    pub clamped: bool,
    pub running_rate: f64,
    pub running_price: f64,
    pub note: String,
}

pub fn write_estimates<W: Write>(writer: W, records: &[EstimateRecord]) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

pub fn read_estimates<R: Read>(reader: R) -> Result<Vec<EstimateRecord>, AppError> {
    let mut input = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    input
        .deserialize()
        .enumerate()
        .map(|(idx, row)| {
            row.map_err(|e| AppError::new(2, format!("Invalid export CSV at line {}: {e}", idx + 2)))
        })
        .collect()
}

pub fn write_trace<W: Write>(writer: W, rule: &RuleEstimate) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    for (idx, step) in rule.trace().iter().enumerate() {
        out.serialize(TraceRecord {
            step: idx + 1,
            factor: step.factor,
            raw: step.raw,
            applied: step.applied,
            clamped: step.clamped,
            running_rate: step.running_rate,
            running_price: step.running_price,
            note: step.note.clone(),
        })
        .map_err(|e| AppError::new(2, format!("Failed to write trace CSV row: {e}")))?;
    }
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush trace CSV: {e}")))?;
    Ok(())
}

pub fn write_estimates_csv(path: &Path, records: &[EstimateRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_estimates(file, records)
}

pub fn write_trace_csv(path: &Path, rule: &RuleEstimate) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create trace CSV '{}': {e}", path.display())))?;
    write_trace(file, rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{ValuationContext, run_valuation};
    use crate::domain::{Condition, PropertyInput};
    use crate::factors::FactorTable;
    use crate::models::MlPredictor;

    fn output(min_confidence: f64) -> RunOutput {
        let table = FactorTable::load().unwrap();
        let ctx = ValuationContext {
            predictor: MlPredictor::synthetic(&table),
            table,
            min_confidence,
        };
        let input = PropertyInput {
            location: "urban_center".to_string(),
            property_type: PropertyType::Apartment,
            area: 72.5,
            age: 18,
            condition: Condition::Fair,
            floor: -1,
            total_floors: 8,
            amenity_count: 2,
            demand_index: 0.8,
            crime_index: 0.25,
        };
        run_valuation(&ctx, &input).unwrap()
    }

    #[test]
    fn estimate_csv_round_trip_keeps_price_and_mode() {
        let weighted = output(0.3);
        let rule_only = output(0.99);
        let records = vec![
            EstimateRecord::from_output("W", &weighted),
            EstimateRecord::from_output("R", &rule_only),
        ];

        let mut buf = Vec::new();
        write_estimates(&mut buf, &records).unwrap();
        let back = read_estimates(buf.as_slice()).unwrap();

        assert_eq!(back.len(), 2);
        for (orig, read) in records.iter().zip(&back) {
            assert_eq!(read.mode, orig.mode);
            assert_eq!(read.reason, orig.reason);
            assert!((read.final_price - orig.final_price).abs() <= 1e-6 * orig.final_price);
            assert_eq!(read.ml_price.is_some(), orig.ml_price.is_some());
            assert!((read.roi - orig.roi).abs() < 1e-12);
            assert!((read.future_price_3yr - orig.future_price_3yr).abs() <= 1e-6 * orig.future_price_3yr);
        }
        assert_eq!(back[0].mode, BlendMode::Weighted);
        assert_eq!(back[1].mode, BlendMode::RuleOnly);
    }

    #[test]
    fn unavailable_ml_exports_empty_fields() {
        let mut out = output(0.3);
        out.estimate = crate::blend::blend(
            out.estimate.rule.clone(),
            crate::domain::MlEstimate::unavailable(crate::domain::UnavailableReason::ArtifactMissing),
            0.3,
        )
        .unwrap();
        let mut buf = Vec::new();
        write_estimates(&mut buf, &[EstimateRecord::from_output("X", &out)]).unwrap();
        let back = read_estimates(buf.as_slice()).unwrap();
        assert_eq!(back[0].ml_price, None);
        assert_eq!(back[0].ml_confidence, None);
        assert_eq!(back[0].mode, BlendMode::RuleOnly);
    }

    #[test]
    fn trace_csv_has_one_line_per_step() {
        let out = output(0.3);
        let mut buf = Vec::new();
        write_trace(&mut buf, &out.estimate.rule).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1 + FactorKind::CHAIN.len());
        assert!(lines[0].starts_with("step,factor,raw,applied,clamped"));
        assert!(lines[4].contains(",floor,"));
    }

    #[test]
    fn malformed_export_reports_line() {
        let err = read_estimates("id,mode\nx,sideways\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
