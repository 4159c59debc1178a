//! CSV ingest and normalization.
//!
//! Turns a wide OD table into per-replicate sample series:
//!
//! ```text
//! time,Replicate1,Replicate2,Replicate3
//! 0,0.1,0.11,0.09
//! 1,0.2,0.21,0.19
//! ```
//!
//! The first column is time; every other column is one replicate's OD series.
//!
//! Design goals:
//! - **Strict schema** for the header (clear errors + exit code 2)
//! - **Cell-level validation** (skip bad cells, but report what happened)
//! - **No fitting logic here**: non-positive ODs are kept and judged later

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Replicate, Sample};
use crate::error::AppError;

/// A row- or cell-level problem encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    /// Replicate column the error belongs to (`None` = the whole row).
    pub column: Option<String>,
    pub message: String,
}

/// Ingest output: per-replicate samples plus what was skipped.
#[derive(Debug, Clone)]
pub struct GrowthTable {
    pub time_label: String,
    pub replicates: Vec<Replicate>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl GrowthTable {
    /// Keep only the named replicates (in the requested order). Empty `names` keeps all.
    pub fn select(self, names: &[String]) -> Result<GrowthTable, AppError> {
        if names.is_empty() {
            return Ok(self);
        }

        let mut picked = Vec::with_capacity(names.len());
        for name in names {
            let Some(rep) = self.replicates.iter().find(|r| r.name.eq_ignore_ascii_case(name)) else {
                let available: Vec<&str> = self.replicates.iter().map(|r| r.name.as_str()).collect();
                return Err(AppError::new(
                    2,
                    format!("Unknown replicate `{name}` (available: {}).", available.join(", ")),
                ));
            };
            picked.push(rep.clone());
        }

        Ok(GrowthTable {
            replicates: picked,
            ..self
        })
    }
}

/// Load a growth table from a CSV file.
pub fn load_growth_table(path: &Path) -> Result<GrowthTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    let table = parse_growth_table(file)?;

    for err in &table.row_errors {
        match &err.column {
            Some(col) => log::warn!("line {} [{col}]: {}", err.line, err.message),
            None => log::warn!("line {}: {}", err.line, err.message),
        }
    }
    log::info!(
        "read {} row(s), {} replicate(s) from {}",
        table.rows_read,
        table.replicates.len(),
        path.display()
    );

    Ok(table)
}

/// Parse a growth table from any reader.
pub fn parse_growth_table<R: Read>(reader: R) -> Result<GrowthTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let names = column_names(&headers)?;
    let time_label = names[0].clone();

    let mut replicates: Vec<Replicate> = names[1..]
        .iter()
        .map(|name| Replicate {
            name: name.clone(),
            samples: Vec::new(),
        })
        .collect();

    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and CSV lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    column: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let time = match parse_f64(record.get(0)) {
            Ok(t) => t,
            Err(msg) => {
                row_errors.push(RowError {
                    line,
                    column: None,
                    message: format!("invalid `{time_label}` value: {msg}"),
                });
                continue;
            }
        };

        for (col, rep) in replicates.iter_mut().enumerate() {
            match parse_f64(record.get(col + 1)) {
                Ok(od) => rep.samples.push(Sample::new(time, od)),
                Err(msg) => row_errors.push(RowError {
                    line,
                    column: Some(rep.name.clone()),
                    message: format!("invalid OD value: {msg}"),
                }),
            }
        }
    }

    if rows_read == 0 {
        return Err(AppError::new(2, "CSV contains a header but no data rows."));
    }

    for rep in &mut replicates {
        rep.samples.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    Ok(GrowthTable {
        time_label,
        replicates,
        row_errors,
        rows_read,
    })
}

/// Read only the header of a growth table: the time label followed by replicate names.
pub fn read_column_names<R: Read>(reader: R) -> Result<Vec<String>, AppError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?;
    column_names(headers)
}

fn column_names(headers: &StringRecord) -> Result<Vec<String>, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    if names.len() < 2 {
        return Err(AppError::new(
            2,
            "CSV needs a time column followed by at least one OD column.",
        ));
    }
    if names[0].is_empty() {
        return Err(AppError::new(2, "The first (time) column has no header."));
    }

    // Unnamed replicate columns get positional names so they stay addressable.
    let mut out = Vec::with_capacity(names.len());
    for (i, name) in names.into_iter().enumerate() {
        let name = if name.is_empty() { format!("column{}", i + 1) } else { name };
        // `--replicate` matches names case-insensitively, so headers must be unique that way too.
        if let Some(prev) = out.iter().find(|o: &&String| o.eq_ignore_ascii_case(&name)) {
            return Err(AppError::new(
                2,
                format!("Duplicate column header: `{name}` (clashes with `{prev}`)"),
            ));
        }
        out.push(name);
    }
    Ok(out)
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the time label carries it around.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn parse_f64(cell: Option<&str>) -> Result<f64, String> {
    let s = cell.unwrap_or("").trim();
    if s.is_empty() {
        return Err("missing".to_string());
    }
    let v: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if !v.is_finite() {
        return Err(format!("`{s}` is not finite"));
    }
    Ok(v)
}
