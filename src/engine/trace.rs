//! Append-only trace of the rule chain.

use crate::domain::{AdjustmentStep, FactorKind, RuleEstimate};
use crate::factors::band_for;

/// Accumulates adjustment steps while the running rate is built up.
///
/// The builder is consumed by `finish`, so a trace can only be appended to
/// during one evaluation and is frozen inside the returned `RuleEstimate`.
#[derive(Debug)]
pub struct TraceBuilder {
    base_rate: f64,
    area: f64,
    rate: f64,
    steps: Vec<AdjustmentStep>,
}

impl TraceBuilder {
    pub fn new(base_rate: f64, area: f64) -> Self {
        Self {
            base_rate,
            area,
            rate: base_rate,
            steps: Vec::with_capacity(FactorKind::CHAIN.len()),
        }
    }

    /// Clamp `raw` to the factor's band (if it has one), apply it to the
    /// running rate and record the step. Returns the applied multiplier.
    pub fn apply(&mut self, factor: FactorKind, raw: f64, note: impl Into<String>) -> f64 {
        let applied = match band_for(factor) {
            Some(band) => band.apply(raw),
            None => raw,
        };
        self.rate *= applied;
        self.steps.push(AdjustmentStep {
            factor,
            raw,
            applied,
            clamped: applied != raw,
            running_rate: self.rate,
            running_price: self.rate * self.area,
            note: note.into(),
        });
        applied
    }

    pub fn finish(self) -> RuleEstimate {
        let total = self.rate * self.area;
        RuleEstimate::new(self.base_rate, self.area, self.rate, total, self.steps)
    }
}
