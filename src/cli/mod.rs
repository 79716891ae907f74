//! Command-line parsing for the `estate` valuation tool.
//!
//! Argument parsing stays separate from the valuation code; handlers in
//! `crate::app` turn these structs into a `ValuationConfig` and a `PropertyInput`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Condition, PropertyInput, PropertyType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "estate", version, about = "Property valuation: rule chain blended with a price model")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Value one property described by flags and print the full report.
    Value(ValueArgs),
    /// Value every property in a CSV file and write an estimate CSV.
    Batch(BatchArgs),
    /// Validate a factor file and print the resulting table.
    Factors(FactorsArgs),
    /// Load the configured price model and print its status.
    Model(EngineArgs),
}

/// Where the factor table and model come from, and the blend threshold.
///
/// Unset flags fall back to `ESTATE_FACTORS`, `ESTATE_MODEL` and
/// `ESTATE_MIN_CONFIDENCE` (a `.env` file is honoured).
#[derive(Debug, Args, Clone, Default)]
pub struct EngineArgs {
    /// Factor table TOML (embedded defaults when absent).
    #[arg(long, value_name = "TOML")]
    pub factors: Option<PathBuf>,

    /// Linear model artifact JSON (synthetic stand-in when absent).
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// ML confidence below which the rule estimate is used alone.
    #[arg(long, value_parser = parse_unit_interval)]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct ValueArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Location identifier (e.g. premium, urban_center, suburban, rural).
    #[arg(short, long)]
    pub location: String,

    /// Property type.
    #[arg(short = 't', long = "type", value_enum)]
    pub property_type: PropertyType,

    /// Built area in m².
    #[arg(short, long)]
    pub area: f64,

    /// Age in years.
    #[arg(long, default_value_t = 0)]
    pub age: u32,

    #[arg(short, long, value_enum, default_value_t = Condition::Good)]
    pub condition: Condition,

    /// Floor number; 0 is ground level, negative for basements.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub floor: i32,

    #[arg(long, default_value_t = 1)]
    pub total_floors: u32,

    /// Number of amenities (parking, pool, elevator, ...).
    #[arg(long, default_value_t = 0)]
    pub amenities: u32,

    /// Local demand index in [0, 1].
    #[arg(long, default_value_t = 0.5, value_parser = parse_unit_interval)]
    pub demand: f64,

    /// Crime index in [0, 1].
    #[arg(long, default_value_t = 0.0, value_parser = parse_unit_interval)]
    pub crime: f64,

    /// Export the estimate as a one-line CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the adjustment trace as CSV.
    #[arg(long = "export-trace", value_name = "CSV")]
    pub export_trace: Option<PathBuf>,

    /// Export the full valuation report as JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

impl ValueArgs {
    pub fn property_input(&self) -> PropertyInput {
        PropertyInput {
            location: self.location.clone(),
            property_type: self.property_type,
            area: self.area,
            age: self.age,
            condition: self.condition,
            floor: self.floor,
            total_floors: self.total_floors,
            amenity_count: self.amenities,
            demand_index: self.demand,
            crime_index: self.crime,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Property CSV to value.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Where to write the estimate CSV.
    #[arg(short, long, value_name = "CSV")]
    pub output: PathBuf,

    /// Do not print the per-row summary table.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct FactorsArgs {
    /// Factor table TOML to validate (embedded defaults when absent).
    #[arg(value_name = "TOML")]
    pub path: Option<PathBuf>,
}

/// Parse a number in `[0, 1]`.
pub fn parse_unit_interval(s: &str) -> Result<f64, String> {
    let v: f64 = s.trim().parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("{v} is outside [0, 1]"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_command_with_basement_floor() {
        let cli = Cli::try_parse_from([
            "estate", "value", "-l", "suburban", "-t", "apartment", "-a", "80", "--floor", "-1",
            "--demand", "0.7", "--min-confidence", "0.4",
        ])
        .unwrap();
        let Command::Value(args) = cli.command else {
            panic!("expected value command");
        };
        let input = args.property_input();
        assert_eq!(input.floor, -1);
        assert_eq!(input.property_type, PropertyType::Apartment);
        assert_eq!(input.condition, Condition::Good);
        assert_eq!(args.engine.min_confidence, Some(0.4));
    }

    #[test]
    fn rejects_indices_outside_unit_interval() {
        assert!(parse_unit_interval("1.5").is_err());
        assert!(parse_unit_interval("abc").is_err());
        assert_eq!(parse_unit_interval(" 0.25 "), Ok(0.25));

        let res = Cli::try_parse_from([
            "estate", "value", "-l", "rural", "-t", "land", "-a", "500", "--crime", "-0.2",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["estate", "model", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
