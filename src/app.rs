//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the runtime configuration (flags, then environment)
//! - loads the factor table and price model once
//! - runs single or batch valuations and prints reports
//! - writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{BatchArgs, Command, EngineArgs, FactorsArgs, ValueArgs};
use crate::domain::{DEFAULT_MIN_CONFIDENCE, ValuationConfig};
use crate::error::AppError;
use crate::factors::FactorTable;

pub mod pipeline;

pub const ENV_FACTORS: &str = "ESTATE_FACTORS";
pub const ENV_MODEL: &str = "ESTATE_MODEL";
pub const ENV_MIN_CONFIDENCE: &str = "ESTATE_MIN_CONFIDENCE";

/// Entry point for the `estate` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Value(args) => handle_value(args),
        Command::Batch(args) => handle_batch(args),
        Command::Factors(args) => handle_factors(args),
        Command::Model(args) => handle_model(args),
    }
}

/// Logs go to stderr so report output on stdout stays pipeable.
fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("estate_value={default_level}")));

    // A second init (e.g. from tests) is harmless.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_value(args: ValueArgs) -> Result<(), AppError> {
    let config = valuation_config_from_args(&args.engine)?;
    let ctx = pipeline::ValuationContext::from_config(&config)?;
    let input = args.property_input();

    let output = pipeline::run_valuation(&ctx, &input)?;
    tracing::info!(
        location = %input.location,
        final_price = output.estimate.final_price,
        mode = output.estimate.mode.as_str(),
        "valuation complete"
    );

    println!("{}", crate::report::format_valuation(&output, ctx.predictor.status()));

    if let Some(path) = &args.export {
        let record = crate::io::EstimateRecord::from_output(input.location.clone(), &output);
        crate::io::write_estimates_csv(path, &[record])?;
        tracing::info!(path = %path.display(), "wrote estimate CSV");
    }
    if let Some(path) = &args.export_trace {
        crate::io::write_trace_csv(path, &output.estimate.rule)?;
        tracing::info!(path = %path.display(), "wrote trace CSV");
    }
    if let Some(path) = &args.export_json {
        let report = crate::io::ValuationReport::new(&output, ctx.predictor.status());
        crate::io::write_report_json(path, &report)?;
        tracing::info!(path = %path.display(), "wrote report JSON");
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = valuation_config_from_args(&args.engine)?;
    let ctx = pipeline::ValuationContext::from_config(&config)?;

    let batch = crate::io::load_properties_csv(&args.input)?;
    tracing::info!(
        path = %args.input.display(),
        rows = batch.rows_read,
        parse_errors = batch.row_errors.len(),
        "loaded property CSV"
    );

    let out = pipeline::run_batch(&ctx, batch);
    let records: Vec<_> = out
        .outputs
        .iter()
        .map(|(id, output)| crate::io::EstimateRecord::from_output(id.clone(), output))
        .collect();
    crate::io::write_estimates_csv(&args.output, &records)?;
    tracing::info!(
        path = %args.output.display(),
        valued = records.len(),
        failed = out.row_errors.len(),
        "wrote estimate CSV"
    );

    if args.quiet {
        eprintln!(
            "Rows: read={} valued={} failed={}",
            out.rows_read,
            out.outputs.len(),
            out.row_errors.len()
        );
    } else {
        println!("{}", crate::report::format_batch_summary(&out));
    }
    Ok(())
}

fn handle_factors(args: FactorsArgs) -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let path = args.path.or_else(|| env_path(ENV_FACTORS, &|key: &str| std::env::var(key).ok()));
    let table = match &path {
        Some(path) => FactorTable::from_path(path)?,
        None => FactorTable::load()?,
    };
    match &path {
        Some(path) => println!("Factor file: {} (valid)\n", path.display()),
        None => println!("Factor file: embedded defaults\n"),
    }
    println!("{}", crate::report::format_factor_table(&table));
    Ok(())
}

fn handle_model(args: EngineArgs) -> Result<(), AppError> {
    let config = valuation_config_from_args(&args)?;
    let ctx = pipeline::ValuationContext::from_config(&config)?;
    println!("{}", crate::report::format_model_status(ctx.predictor.status()));
    Ok(())
}

/// Resolve flags against the process environment (and `.env`, if present).
pub fn valuation_config_from_args(args: &EngineArgs) -> Result<ValuationConfig, AppError> {
    dotenvy::dotenv().ok();
    resolve_config(args, &|key: &str| std::env::var(key).ok())
}

/// Flags win, then environment values, then defaults.
pub fn resolve_config(args: &EngineArgs, env: &dyn Fn(&str) -> Option<String>) -> Result<ValuationConfig, AppError> {
    let min_confidence = match args.min_confidence {
        Some(v) => v,
        None => match env(ENV_MIN_CONFIDENCE) {
            Some(raw) => crate::cli::parse_unit_interval(&raw)
                .map_err(|e| AppError::new(2, format!("Invalid {ENV_MIN_CONFIDENCE}: {e}")))?,
            None => DEFAULT_MIN_CONFIDENCE,
        },
    };

    Ok(ValuationConfig {
        factors_path: args.factors.clone().or_else(|| env_path(ENV_FACTORS, env)),
        model_path: args.model.clone().or_else(|| env_path(ENV_MODEL, env)),
        min_confidence,
    })
}

fn env_path(key: &str, env: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_flags_or_env() {
        let config = resolve_config(&EngineArgs::default(), &env_of(&[])).unwrap();
        assert_eq!(config.factors_path, None);
        assert_eq!(config.model_path, None);
        assert_eq!(config.min_confidence, DEFAULT_MIN_CONFIDENCE);
    }

    #[test]
    fn environment_fills_unset_flags() {
        let env = env_of(&[
            (ENV_FACTORS, "/etc/estate/factors.toml"),
            (ENV_MODEL, "  "),
            (ENV_MIN_CONFIDENCE, "0.55"),
        ]);
        let config = resolve_config(&EngineArgs::default(), &env).unwrap();
        assert_eq!(config.factors_path.as_deref(), Some(Path::new("/etc/estate/factors.toml")));
        assert_eq!(config.model_path, None);
        assert_eq!(config.min_confidence, 0.55);
    }

    #[test]
    fn flags_win_over_environment() {
        let args = EngineArgs {
            factors: None,
            model: Some(PathBuf::from("model.json")),
            min_confidence: Some(0.8),
        };
        let env = env_of(&[(ENV_MODEL, "other.json"), (ENV_MIN_CONFIDENCE, "0.1")]);
        let config = resolve_config(&args, &env).unwrap();
        assert_eq!(config.model_path.as_deref(), Some(Path::new("model.json")));
        assert_eq!(config.min_confidence, 0.8);
    }

    #[test]
    fn bad_env_confidence_is_a_usage_error() {
        let err = resolve_config(&EngineArgs::default(), &env_of(&[(ENV_MIN_CONFIDENCE, "2")])).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
