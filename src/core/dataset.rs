use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::features::{FEATURE_NAMES, FeatureVector, NUM_FEATURES};
use crate::error::{CosechaError, Result};

pub const LABEL_COLUMN: &str = "label";

/// One labeled historical observation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub features: FeatureVector,
    pub label: String,
}

/// The historical dataset, loaded eagerly and discarded after training.
#[derive(Debug, Default)]
pub struct Dataset {
    pub records: Vec<TrainingRecord>,
}

impl Dataset {
    /// Reads a comma-delimited file whose header must contain exactly the
    /// seven feature columns plus `label`, in any order. Missing or extra
    /// columns abort the load, as does any malformed data row: training data
    /// is curated, so a bad line means a broken file, not noise to skip.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut header_line = String::new();
        if reader.read_line(&mut header_line)? == 0 {
            return Err(CosechaError::Schema("file is empty".into()));
        }
        let columns = parse_header(&header_line)?;

        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // line 1 is the header
            let record = parse_record(&columns, &line, line_no + 2)?;
            records.push(record);
        }

        if records.is_empty() {
            return Err(CosechaError::Schema("file contains no data rows".into()));
        }

        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Column positions resolved from the header, so data rows can be read by
/// name regardless of the order the file uses.
#[derive(Debug)]
struct ColumnMap {
    /// `feature_positions[i]` is the cell index of `FEATURE_NAMES[i]`.
    feature_positions: [usize; NUM_FEATURES],
    label_position: usize,
    arity: usize,
}

fn parse_header(line: &str) -> Result<ColumnMap> {
    let names: Vec<&str> = line.trim().split(',').map(str::trim).collect();

    let mut missing = Vec::new();
    let mut feature_positions = [0usize; NUM_FEATURES];
    for (i, required) in FEATURE_NAMES.iter().enumerate() {
        match names.iter().position(|n| n == required) {
            Some(pos) => feature_positions[i] = pos,
            None => missing.push(*required),
        }
    }
    let label_position = names.iter().position(|n| *n == LABEL_COLUMN);
    if label_position.is_none() {
        missing.push(LABEL_COLUMN);
    }
    if !missing.is_empty() {
        return Err(CosechaError::Schema(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let extra: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| *n != LABEL_COLUMN && !FEATURE_NAMES.contains(n))
        .collect();
    if !extra.is_empty() {
        return Err(CosechaError::Schema(format!(
            "unexpected columns: {}",
            extra.join(", ")
        )));
    }
    if names.len() != NUM_FEATURES + 1 {
        return Err(CosechaError::Schema(format!(
            "expected {} columns, found {}",
            NUM_FEATURES + 1,
            names.len()
        )));
    }

    Ok(ColumnMap {
        feature_positions,
        label_position: label_position.expect("checked above"),
        arity: names.len(),
    })
}

fn parse_record(columns: &ColumnMap, line: &str, line_no: usize) -> Result<TrainingRecord> {
    let cells: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if cells.len() != columns.arity {
        return Err(CosechaError::Schema(format!(
            "line {line_no}: expected {} values, found {}",
            columns.arity,
            cells.len()
        )));
    }

    let mut values = [0.0; NUM_FEATURES];
    for (i, &pos) in columns.feature_positions.iter().enumerate() {
        values[i] = cells[pos].parse().map_err(|_| {
            CosechaError::Schema(format!(
                "line {line_no}: column '{}' is not numeric: '{}'",
                FEATURE_NAMES[i], cells[pos]
            ))
        })?;
    }

    let label = cells[columns.label_position];
    if label.is_empty() {
        return Err(CosechaError::Schema(format!("line {line_no}: empty label")));
    }

    Ok(TrainingRecord {
        features: FeatureVector::from_values(values),
        label: label.to_string(),
    })
}
