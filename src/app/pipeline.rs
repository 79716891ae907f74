//! Shared valuation pipeline used by the single-property and batch commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! factor table + predictor -> {rule chain, ML prediction} -> blend -> insights
//!
//! The commands can then focus on presentation (printing vs CSV output).

use rayon::prelude::*;

use crate::blend::blend;
use crate::domain::{BlendedEstimate, Insights, PropertyInput, ValuationConfig};
use crate::engine::evaluate;
use crate::error::{AppError, ValuationError};
use crate::factors::FactorTable;
use crate::io::ingest::{PropertyBatch, RowError};
use crate::models::MlPredictor;

/// Process-wide, read-only state shared by every valuation.
#[derive(Debug, Clone)]
pub struct ValuationContext {
    pub table: FactorTable,
    pub predictor: MlPredictor,
    pub min_confidence: f64,
}

impl ValuationContext {
    /// Load the factor table and the predictor once.
    pub fn from_config(config: &ValuationConfig) -> Result<Self, AppError> {
        let table = match &config.factors_path {
            Some(path) => FactorTable::from_path(path)?,
            None => FactorTable::load()?,
        };
        let source = config
            .factors_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded defaults".to_string());
        tracing::info!(
            source = %source,
            locations = table.locations().count(),
            "loaded factor table"
        );

        let predictor = MlPredictor::load(config.model_path.as_deref(), &table);

        Ok(Self {
            table,
            predictor,
            min_confidence: config.min_confidence,
        })
    }
}

/// All computed outputs for one property.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub input: PropertyInput,
    pub estimate: BlendedEstimate,
    pub insights: Insights,
}

/// Value one property. Either every stage succeeds or an error is returned.
pub fn run_valuation(ctx: &ValuationContext, input: &PropertyInput) -> Result<RunOutput, ValuationError> {
    // The rule chain and the model share nothing mutable, so run them side by side.
    let (rule, ml) = rayon::join(
        || evaluate(input, &ctx.table),
        || ctx.predictor.predict(input),
    );
    let rule = rule?;
    tracing::debug!(
        rule_price = rule.total_price(),
        ml_price = ?ml.price(),
        ml_confidence = ?ml.confidence(),
        "components ready"
    );

    let estimate = blend(rule, ml, ctx.min_confidence)?;
    let insights = crate::insights::derive(input, &estimate, &ctx.table);
    tracing::debug!(
        final_price = estimate.final_price,
        mode = estimate.mode.as_str(),
        "blended"
    );

    Ok(RunOutput {
        input: input.clone(),
        estimate,
        insights,
    })
}

/// Result of valuing a batch: successes in input order, plus per-row failures.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub outputs: Vec<(String, RunOutput)>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Value every parsed row in parallel.
pub fn run_batch(ctx: &ValuationContext, batch: PropertyBatch) -> BatchOutput {
    let results: Vec<_> = batch
        .rows
        .par_iter()
        .map(|row| (row, run_valuation(ctx, &row.input)))
        .collect();

    let mut outputs = Vec::with_capacity(results.len());
    let mut row_errors = batch.row_errors;
    for (row, result) in results {
        match result {
            Ok(output) => outputs.push((row.id.clone(), output)),
            Err(err) => {
                tracing::warn!(line = row.line, id = %row.id, error = %err, "row failed");
                row_errors.push(RowError {
                    line: row.line,
                    id: Some(row.id.clone()),
                    message: err.to_string(),
                });
            }
        }
    }
    row_errors.sort_by_key(|e| e.line);

    BatchOutput {
        outputs,
        row_errors,
        rows_read: batch.rows_read,
    }
}
