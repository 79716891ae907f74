//! Formatted terminal output.
//!
//! Formatting lives in one place so the valuation code stays free of
//! presentation concerns and output changes are localized.

use crate::app::pipeline::{BatchOutput, RunOutput};
use crate::domain::{BlendMode, FactorKind, MlEstimate};
use crate::factors::FactorTable;
use crate::models::{ModelSource, ModelStatus};

/// Full single-property report: inputs, trace, components, blend and insights.
pub fn format_valuation(output: &RunOutput, model: &ModelStatus) -> String {
    let input = &output.input;
    let estimate = &output.estimate;
    let rule = &estimate.rule;
    let mut out = String::new();

    out.push_str("=== estate - Property Valuation ===\n");
    out.push_str(&format!(
        "Property: {} | {} | {:.1} m² | {} years | {}\n",
        input.location,
        input.property_type.key(),
        input.area,
        input.age,
        input.condition.key()
    ));
    out.push_str(&format!(
        "Floor: {} of {} | amenities={} | demand={:.2} | crime={:.2}\n",
        input.floor, input.total_floors, input.amenity_count, input.demand_index, input.crime_index
    ));

    out.push_str("\nRule chain:\n");
    out.push_str(&format!("  {:<14} {:>10}\n", "base rate", fmt_money(rule.base_rate())));
    out.push_str(&format_trace_table(output));

    out.push_str("\nComponents:\n");
    out.push_str(&format!(
        "- rule: {} ({} / m²)\n",
        fmt_money(rule.total_price()),
        fmt_money(rule.price_per_area())
    ));
    match estimate.ml {
        MlEstimate::Available { price, confidence } => out.push_str(&format!(
            "- ml  : {} (confidence {:.2}, model {})\n",
            fmt_money(price),
            confidence,
            model.name.as_deref().unwrap_or("?")
        )),
        MlEstimate::Unavailable { reason } => {
            out.push_str(&format!("- ml  : unavailable ({})\n", reason.describe()));
        }
    }

    out.push_str("\nEstimate:\n");
    out.push_str(&format!(
        "- final: {} ({} / m²)\n",
        fmt_money(estimate.final_price),
        fmt_money(estimate.final_price_per_area)
    ));
    out.push_str(&format!(
        "- mode : {} ({})\n",
        estimate.mode.as_str(),
        estimate.reason.describe()
    ));
    if estimate.mode == BlendMode::Weighted {
        out.push_str(&format!(
            "- weights: rule {:.2} / ml {:.2}\n",
            estimate.rule_weight(),
            estimate.ml_weight
        ));
    }

    let insights = &output.insights;
    out.push_str("\nInsights:\n");
    out.push_str(&format!(
        "- rent: {} / year (yield {:.1}%)\n",
        fmt_money(insights.annual_rent),
        insights.rent_yield * 100.0
    ));
    out.push_str(&format!("- roi : {:.2}%\n", insights.roi * 100.0));
    out.push_str(&format!(
        "- forecast: {} in 1 year, {} in 3 years\n",
        fmt_money(insights.future_price_1yr),
        fmt_money(insights.future_price_3yr)
    ));
    out.push_str(&format!("- risk: {:.2} ({})\n", insights.risk_score, risk_label(insights.risk_score)));

    out
}

fn format_trace_table(output: &RunOutput) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "  {:<14} {:>8} {:>8} {:>10} {:>14}  {}\n",
            "factor", "raw", "applied", "rate", "price", "note"
        )
        .trim_end(),
    );
    out.push('\n');
    for step in output.estimate.rule.trace() {
        let marker = if step.clamped { "*" } else { " " };
        out.push_str(
            format!(
                "  {:<14} {:>8.4} {:>7.4}{marker} {:>10} {:>14}  {}\n",
                step.factor.label(),
                step.raw,
                step.applied,
                fmt_money(step.running_rate),
                fmt_money(step.running_price),
                truncate(&step.note, 32),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if output.estimate.rule.trace().iter().any(|s| s.clamped) {
        out.push_str("  (* clamped to band)\n");
    }
    out
}

/// Tabulate the loaded factor table.
pub fn format_factor_table(table: &FactorTable) -> String {
    let mut out = String::new();

    out.push_str("Base rates (per m²):\n");
    for (location, rate) in table.locations() {
        out.push_str(&format!("  {:<20} {:>10}\n", location, fmt_money(rate)));
    }

    out.push_str("\nProperty type factors:\n");
    for (kind, factor) in table.property_types() {
        out.push_str(&format!("  {:<20} {:>10.3}\n", kind.key(), factor));
    }

    out.push_str("\nCondition factors:\n");
    for condition in crate::domain::Condition::ALL {
        out.push_str(&format!(
            "  {:<20} {:>10.3}\n",
            condition.key(),
            table.condition_factor(condition)
        ));
    }

    out.push_str("\nAdjustments:\n");
    out.push_str(&format!("  age: -{:.3} per year\n", table.age.rate_per_year));
    out.push_str(&format!(
        "  floor: +{:.3} per floor (max +{:.2}), basement -{:.3} - {:.3} per level\n",
        table.floor.per_floor_bonus,
        table.floor.max_floor_bonus,
        table.floor.ground_penalty,
        table.floor.per_level_penalty
    ));
    out.push_str(&format!("  amenities: +{:.3} each\n", table.per_amenity));
    out.push_str(&format!(
        "  demand: neutral {:.2}, sensitivity {:.2}\n",
        table.demand.neutral, table.demand.sensitivity
    ));
    out.push_str(&format!("  crime: weight {:.2}\n", table.crime_weight));
    out.push_str(&format!(
        "  forecast: appreciation {:.1}%, volatility {:.1}%\n",
        table.forecast.appreciation * 100.0,
        table.forecast.volatility * 100.0
    ));

    out.push_str("\nClamp bands:\n");
    for kind in FactorKind::CHAIN {
        match crate::factors::band_for(kind) {
            Some(band) => out.push_str(&format!(
                "  {:<14} [{:.2}, {:.2}]\n",
                kind.label(),
                band.lower,
                band.upper
            )),
            None => out.push_str(&format!("  {:<14} (unclamped)\n", kind.label())),
        }
    }

    out
}

pub fn format_model_status(status: &ModelStatus) -> String {
    let mut out = String::new();
    let source = match &status.source {
        ModelSource::Artifact { path } => format!("artifact {}", path.display()),
        ModelSource::Synthetic => "synthetic stand-in".to_string(),
    };
    out.push_str(&format!("Model source: {source}\n"));
    out.push_str(&format!("Available: {}\n", if status.available { "yes" } else { "no" }));
    if let Some(name) = &status.name {
        out.push_str(&format!("Name: {name}\n"));
    }
    if let Some(fingerprint) = &status.fingerprint {
        out.push_str(&format!("Fingerprint: {fingerprint}\n"));
    }
    out.push_str(&format!("Loaded at: {}\n", status.loaded_at.format("%Y-%m-%d %H:%M:%S")));
    if let Some(error) = &status.error {
        out.push_str(&format!("Error: {error}\n"));
    }
    out
}

/// One line per valued row, followed by failures and totals.
pub fn format_batch_summary(batch: &BatchOutput) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<16} {:<16} {:<11} {:>14} {:>14} {:<9}\n",
            "id", "location", "type", "rule", "final", "mode"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<16} {:-<16} {:-<11} {:-<14} {:-<14} {:-<9}\n",
            "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for (id, output) in &batch.outputs {
        out.push_str(
            format!(
                "{:<16} {:<16} {:<11} {:>14} {:>14} {:<9}\n",
                truncate(id, 16),
                truncate(&output.input.location, 16),
                output.input.property_type.key(),
                fmt_money(output.estimate.rule.total_price()),
                fmt_money(output.estimate.final_price),
                output.estimate.mode.as_str(),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    if !batch.row_errors.is_empty() {
        out.push_str("\nFailed rows:\n");
        for err in &batch.row_errors {
            out.push_str(&format!(
                "  line {} ({}): {}\n",
                err.line,
                err.id.as_deref().unwrap_or("-"),
                err.message
            ));
        }
    }

    out.push_str(&format!(
        "\nRows: read={} valued={} failed={}\n",
        batch.rows_read,
        batch.outputs.len(),
        batch.row_errors.len()
    ));
    out
}

/// Money with thousands separators and two decimals: `1234567.891` -> `1,234,567.89`.
pub fn fmt_money(v: f64) -> String {
    if !v.is_finite() {
        return format!("{v}");
    }
    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if v < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

fn risk_label(score: f64) -> &'static str {
    if score < 0.3 {
        "low"
    } else if score < 0.6 {
        "moderate"
    } else {
        "high"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{ValuationContext, run_valuation};
    use crate::domain::{Condition, PropertyInput, PropertyType};
    use crate::io::ingest::RowError;
    use crate::models::MlPredictor;

    fn context() -> ValuationContext {
        let table = FactorTable::load().unwrap();
        ValuationContext {
            predictor: MlPredictor::synthetic(&table),
            table,
            min_confidence: 0.3,
        }
    }

    fn output(ctx: &ValuationContext) -> RunOutput {
        let input = PropertyInput {
            location: "suburban".to_string(),
            property_type: PropertyType::Apartment,
            area: 80.0,
            age: 5,
            condition: Condition::Good,
            floor: -2,
            total_floors: 4,
            amenity_count: 0,
            demand_index: 0.5,
            crime_index: 0.0,
        };
        run_valuation(ctx, &input).unwrap()
    }

    #[test]
    fn money_is_grouped() {
        assert_eq!(fmt_money(0.0), "0.00");
        assert_eq!(fmt_money(999.999), "1,000.00");
        assert_eq!(fmt_money(84_800.0), "84,800.00");
        assert_eq!(fmt_money(1_234_567.891), "1,234,567.89");
        assert_eq!(fmt_money(-1500.5), "-1,500.50");
    }

    #[test]
    fn risk_labels_split_at_three_and_six_tenths() {
        assert_eq!(risk_label(0.0), "low");
        assert_eq!(risk_label(0.29), "low");
        assert_eq!(risk_label(0.3), "moderate");
        assert_eq!(risk_label(0.59), "moderate");
        assert_eq!(risk_label(0.6), "high");
    }

    #[test]
    fn valuation_report_lists_every_step() {
        let ctx = context();
        let out = output(&ctx);
        let text = format_valuation(&out, ctx.predictor.status());
        for kind in FactorKind::CHAIN {
            assert!(text.contains(kind.label()), "missing {}", kind.label());
        }
        assert!(text.contains("mode : weighted"));
        assert!(text.contains("- roi : 4.00%"));
        assert!(text.contains("in 3 years"));
        // floor -2 raw 0.87 stays inside the band, so no clamp marker.
        assert!(!text.contains("clamped to band"));
    }

    #[test]
    fn factor_table_shows_bands_and_rates() {
        let text = format_factor_table(&FactorTable::load().unwrap());
        assert!(text.contains("premium"));
        assert!(text.contains("5,000.00"));
        assert!(text.contains("property_type  (unclamped)"));
        assert!(text.contains("crime          [0.60, 1.00]"));
    }

    #[test]
    fn batch_summary_counts_rows() {
        let ctx = context();
        let batch = BatchOutput {
            outputs: vec![("P1".to_string(), output(&ctx))],
            row_errors: vec![RowError {
                line: 3,
                id: Some("P2".to_string()),
                message: "unknown location 'atlantis'".to_string(),
            }],
            rows_read: 2,
        };
        let text = format_batch_summary(&batch);
        assert!(text.contains("line 3 (P2)"));
        assert!(text.contains("Rows: read=2 valued=1 failed=1"));
    }

    #[test]
    fn model_status_reports_failures() {
        let status = MlPredictor::load(
            Some(std::path::Path::new("/nonexistent/model.json")),
            &FactorTable::load().unwrap(),
        )
        .status()
        .clone();
        let text = format_model_status(&status);
        assert!(text.contains("Available: no"));
        assert!(text.contains("Error: "));
    }
}
