//! CSV ingest of property descriptions for batch valuation.
//!
//! Expected columns (header names, any order):
//!
//! `id, location, property_type, area, age, condition, floor, total_floors,
//! amenity_count, demand_index, crime_index`
//!
//! `id` and `amenity_count` are optional. Rows that fail to parse, or whose
//! area or indices are out of range, are reported with their line number and
//! skipped; they never reach valuation.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Condition, PropertyInput, PropertyType};
use crate::error::AppError;

/// One CSV line as written by the caller.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default)]
    id: Option<String>,
    location: String,
    property_type: PropertyType,
    area: f64,
    age: u32,
    condition: Condition,
    floor: i32,
    total_floors: u32,
    #[serde(default)]
    amenity_count: Option<u32>,
    demand_index: f64,
    crime_index: f64,
}

/// A parsed row ready for valuation.
#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub line: usize,
    pub id: String,
    pub input: PropertyInput,
}

/// A row-level problem (parse failure or valuation failure).
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub id: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct PropertyBatch {
    pub rows: Vec<PropertyRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

pub fn load_properties_csv(path: &Path) -> Result<PropertyBatch, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_properties(file)
}

pub fn read_properties<R: Read>(reader: R) -> Result<PropertyBatch, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    for required in [
        "location",
        "property_type",
        "area",
        "age",
        "condition",
        "floor",
        "total_floors",
        "demand_index",
        "crime_index",
    ] {
        if !headers.iter().any(|h| h == required) {
            return Err(AppError::new(2, format!("CSV is missing required column '{required}'.")));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.deserialize::<RawRow>().enumerate() {
        // +2: the header is line 1 and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        match result {
            Ok(raw) => {
                let id = raw
                    .id
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| format!("row-{line}"));
                let input = PropertyInput {
                    location: raw.location,
                    property_type: raw.property_type,
                    area: raw.area,
                    age: raw.age,
                    condition: raw.condition,
                    floor: raw.floor,
                    total_floors: raw.total_floors,
                    amenity_count: raw.amenity_count.unwrap_or(0),
                    demand_index: raw.demand_index,
                    crime_index: raw.crime_index,
                };
                match input.check_ranges() {
                    Ok(()) => rows.push(PropertyRow { line, id, input }),
                    Err(message) => row_errors.push(RowError {
                        line,
                        id: Some(id),
                        message,
                    }),
                }
            }
            Err(e) => row_errors.push(RowError {
                line,
                id: None,
                message: format!("CSV parse error: {e}"),
            }),
        }
    }

    Ok(PropertyBatch {
        rows,
        row_errors,
        rows_read,
    })
}
