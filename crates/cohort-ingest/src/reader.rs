//! Raw table readers.
//!
//! Input tables are delimited text, plain or gzip-compressed (detected by
//! the `.gz` extension). The patient table is read with case-insensitive
//! headers normalized to lower case; the four linkage tables deserialize
//! into typed records against their upper-case source headers. Either way,
//! a missing expected column is fatal, while cell-level problems are left
//! for the cleaning stages to degrade per-row.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use tracing::debug;

use cohort_model::RawPatient;

use crate::error::{IngestError, Result};

/// Resolve a table stem (`patients`, `conditions`, ...) to a concrete file,
/// preferring the uncompressed variant.
pub fn resolve_table_path(data_dir: &Path, stem: &str) -> Result<PathBuf> {
    let plain = data_dir.join(format!("{stem}.csv"));
    if plain.is_file() {
        return Ok(plain);
    }
    let gzipped = data_dir.join(format!("{stem}.csv.gz"));
    if gzipped.is_file() {
        return Ok(gzipped);
    }
    Err(IngestError::MissingTable {
        dir: data_dir.to_path_buf(),
        stem: stem.to_string(),
    })
}

fn open_table(path: &Path) -> Result<Box<dyn Read>> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path).map_err(|source| IngestError::io(path, source))?;
    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);
    if is_gzip {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim().trim_matches('\u{feff}').to_string()
}

/// Read a whole table into typed records.
///
/// Headers are trimmed and BOM-stripped before field matching, so the serde
/// renames on the record types see clean column names. A column required by
/// the record type but absent from the file surfaces as a CSV error, which
/// is fatal by design.
pub fn read_typed<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let input = open_table(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);
    let headers: StringRecord = reader
        .headers()
        .map_err(|source| IngestError::csv(path, source))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::csv(path, source))?;
        let row: T = record
            .deserialize(Some(&headers))
            .map_err(|source| IngestError::csv(path, source))?;
        rows.push(row);
    }
    debug!(path = %path.display(), rows = rows.len(), "read table");
    Ok(rows)
}

/// Read the raw patient table.
///
/// Patient headers vary in case across exports, so they are matched
/// case-insensitively and normalized to lower case on load. The four
/// expected columns (`id`, `birthdate`, `gender`, `race`) must all be
/// present; empty cells become `None`.
pub fn read_patients(path: &Path) -> Result<Vec<RawPatient>> {
    let input = open_table(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .map_err(|source| IngestError::csv(path, source))?
        .iter()
        .map(|header| normalize_header(header).to_lowercase())
        .collect();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| IngestError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let id_idx = column("id")?;
    let birthdate_idx = column("birthdate")?;
    let gender_idx = column("gender")?;
    let race_idx = column("race")?;

    let cell = |record: &StringRecord, idx: usize| -> Option<String> {
        record
            .get(idx)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::csv(path, source))?;
        rows.push(RawPatient {
            id: cell(&record, id_idx).unwrap_or_default(),
            birthdate: cell(&record, birthdate_idx),
            gender: cell(&record, gender_idx),
            race: cell(&record, race_idx),
        });
    }
    debug!(path = %path.display(), rows = rows.len(), "read patient table");
    Ok(rows)
}

/// Read one named column from a table, skipping empty cells.
///
/// Used to reload the valid-cohort `id` column from the cleaned patient
/// file; the column match is case-sensitive because the cleaned output
/// contract fixes its header names.
pub fn read_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let input = open_table(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(input);
    let headers = reader
        .headers()
        .map_err(|source| IngestError::csv(path, source))?
        .clone();
    let index = headers
        .iter()
        .map(normalize_header)
        .position(|header| header == column)
        .ok_or_else(|| IngestError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| IngestError::csv(path, source))?;
        if let Some(value) = record.get(index) {
            let value = value.trim();
            if !value.is_empty() {
                values.push(value.to_string());
            }
        }
    }
    Ok(values)
}
