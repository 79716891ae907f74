//! Reconcile the rule estimate with the ML estimate.
//!
//! Policy, in order:
//!
//! 1. no ML price, or confidence below `min_confidence` → rule only
//! 2. otherwise weight the ML price by its confidence (clamped to `[0, 1]`)
//! 3. a weight of exactly 1.0 is reported as ML only
//!
//! The threshold is inclusive: `confidence == min_confidence` blends.

use crate::domain::{BlendMode, BlendReason, BlendedEstimate, MlEstimate, RuleEstimate};
use crate::error::ValuationError;

pub fn blend(
    rule: RuleEstimate,
    ml: MlEstimate,
    min_confidence: f64,
) -> Result<BlendedEstimate, ValuationError> {
    let rule_price = rule.total_price();
    if !(rule_price.is_finite() && rule_price > 0.0) {
        return Err(ValuationError::invalid(format!(
            "rule price must be positive (got {rule_price})"
        )));
    }

    let (ml_price, confidence) = match ml {
        MlEstimate::Unavailable { .. } => {
            return Ok(rule_only(rule, ml, BlendReason::MlUnavailable));
        }
        // A model handing back garbage is treated like no model at all.
        MlEstimate::Available { price, confidence }
            if !(price.is_finite() && price > 0.0) || confidence.is_nan() =>
        {
            return Ok(rule_only(rule, ml, BlendReason::MlUnavailable));
        }
        MlEstimate::Available { price, confidence } => (price, confidence),
    };

    if confidence < min_confidence {
        return Ok(rule_only(rule, ml, BlendReason::LowConfidence));
    }

    let weight = confidence.clamp(0.0, 1.0);
    let (mode, reason, final_price) = if weight == 1.0 {
        (BlendMode::MlOnly, BlendReason::FullConfidence, ml_price)
    } else {
        (
            BlendMode::Weighted,
            BlendReason::ConfidenceWeighted,
            weight * ml_price + (1.0 - weight) * rule_price,
        )
    };

    Ok(BlendedEstimate {
        final_price,
        final_price_per_area: final_price / rule.area(),
        mode,
        reason,
        ml_weight: weight,
        rule,
        ml,
    })
}

fn rule_only(rule: RuleEstimate, ml: MlEstimate, reason: BlendReason) -> BlendedEstimate {
    BlendedEstimate {
        final_price: rule.total_price(),
        final_price_per_area: rule.price_per_area(),
        mode: BlendMode::RuleOnly,
        reason,
        ml_weight: 0.0,
        rule,
        ml,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UnavailableReason;

    fn rule(total: f64) -> RuleEstimate {
        RuleEstimate::new(total / 100.0, 100.0, total / 100.0, total, Vec::new())
    }

    fn available(price: f64, confidence: f64) -> MlEstimate {
        MlEstimate::Available { price, confidence }
    }

    #[test]
    fn unavailable_ml_returns_rule_price_bit_for_bit() {
        let r = rule(84_800.123_456_789);
        let out = blend(
            r.clone(),
            MlEstimate::unavailable(UnavailableReason::ArtifactMissing),
            0.3,
        )
        .unwrap();

        assert_eq!(out.mode, BlendMode::RuleOnly);
        assert_eq!(out.reason, BlendReason::MlUnavailable);
        assert_eq!(out.ml_weight, 0.0);
        assert_eq!(out.final_price.to_bits(), r.total_price().to_bits());
        assert_eq!(out.final_price_per_area.to_bits(), r.price_per_area().to_bits());
    }

    #[test]
    fn low_confidence_falls_back_to_rules() {
        let r = rule(84_800.0);
        let out = blend(r.clone(), available(120_000.0, 0.2), 0.3).unwrap();
        assert_eq!(out.mode, BlendMode::RuleOnly);
        assert_eq!(out.reason, BlendReason::LowConfidence);
        assert_eq!(out.final_price.to_bits(), r.total_price().to_bits());
        // Low confidence is still carried for provenance.
        assert_eq!(out.ml.confidence(), Some(0.2));
    }

    #[test]
    fn threshold_is_inclusive_and_continuous() {
        let r = rule(100_000.0);
        let below = blend(r.clone(), available(100_000.0, 0.299_999_999), 0.3).unwrap();
        let at = blend(r.clone(), available(100_000.0, 0.3), 0.3).unwrap();
        assert_eq!(below.mode, BlendMode::RuleOnly);
        assert_eq!(at.mode, BlendMode::Weighted);
        assert_eq!(at.ml_weight, 0.3);

        // With equal component prices there is no jump across the threshold.
        assert!((below.final_price - at.final_price).abs() < 1e-6);
    }

    #[test]
    fn weighted_price_follows_confidence() {
        let out = blend(rule(100_000.0), available(200_000.0, 0.75), 0.3).unwrap();
        assert_eq!(out.mode, BlendMode::Weighted);
        assert!((out.final_price - 175_000.0).abs() < 1e-6);
        assert!((out.final_price_per_area - 1750.0).abs() < 1e-9);
        assert!((out.rule_weight() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn full_confidence_is_ml_only_and_exact() {
        let out = blend(rule(100_000.0), available(123_456.789, 1.0), 0.3).unwrap();
        assert_eq!(out.mode, BlendMode::MlOnly);
        assert_eq!(out.reason, BlendReason::FullConfidence);
        assert_eq!(out.final_price.to_bits(), 123_456.789f64.to_bits());
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let over = blend(rule(100_000.0), available(150_000.0, 1.7), 0.3).unwrap();
        assert_eq!(over.ml_weight, 1.0);
        assert_eq!(over.mode, BlendMode::MlOnly);
        assert_eq!(over.final_price, 150_000.0);

        // Negative confidence with a negative threshold still cannot go below 0.
        let under = blend(rule(100_000.0), available(150_000.0, -0.5), -1.0).unwrap();
        assert_eq!(under.ml_weight, 0.0);
        assert_eq!(under.final_price, 100_000.0);
    }

    #[test]
    fn garbage_ml_output_is_treated_as_unavailable() {
        for ml in [
            available(f64::NAN, 0.9),
            available(-5.0, 0.9),
            available(150_000.0, f64::NAN),
        ] {
            let out = blend(rule(100_000.0), ml, 0.3).unwrap();
            assert_eq!(out.mode, BlendMode::RuleOnly);
            assert_eq!(out.reason, BlendReason::MlUnavailable);
        }
    }

    #[test]
    fn non_positive_rule_price_is_rejected() {
        for total in [0.0, -1.0, f64::NAN] {
            assert!(matches!(
                blend(rule(total), available(1.0, 0.9), 0.3),
                Err(ValuationError::InvalidInput(_))
            ));
        }
    }
}
