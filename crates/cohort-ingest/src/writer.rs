//! Cleaned table output.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Write a cleaned table, replacing any output from a prior run.
///
/// Each stage owns exactly one output table, so a single full rewrite is
/// the whole persistence contract; nothing is appended or merged.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| IngestError::io(parent, source))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|source| IngestError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    for record in records {
        writer.serialize(record).map_err(|source| IngestError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    writer
        .flush()
        .map_err(|source| IngestError::io(path, source))?;
    debug!(path = %path.display(), rows = records.len(), "wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{read_column, read_typed};
    use chrono::NaiveDate;
    use cohort_model::{Condition, Gender, Patient, QualityFlag, Race};
    use tempfile::TempDir;

    #[test]
    fn patient_output_uses_the_lowercase_column_contract() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("clean_patients.csv");
        let patients = vec![Patient {
            id: "P1".to_string(),
            birthdate: NaiveDate::from_ymd_opt(1990, 1, 1),
            age: Some(34.0),
            gender: Some(Gender::M),
            race: Race::Other,
            data_quality_flag: QualityFlag::Valid,
        }];
        write_records(&path, &patients).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let header = contents.lines().next().unwrap();
        assert_eq!(header, "id,birthdate,age,gender,race,data_quality_flag");
        assert!(contents.lines().nth(1).unwrap().starts_with("P1,1990-01-01,34"));

        let ids = read_column(&path, "id").unwrap();
        assert_eq!(ids, vec!["P1".to_string()]);
    }

    #[test]
    fn linkage_output_keeps_uppercase_columns_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean_conditions.csv");
        let conditions = vec![Condition {
            start: NaiveDate::from_ymd_opt(2020, 3, 14),
            stop: None,
            patient: "P1".to_string(),
            code: "59621000".to_string(),
            description: Some("Essential hypertension".to_string()),
        }];
        write_records(&path, &conditions).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("START,STOP,PATIENT,CODE,DESCRIPTION"));

        let round: Vec<Condition> = read_typed(&path).unwrap();
        assert_eq!(round.len(), 1);
        assert_eq!(round[0].start, NaiveDate::from_ymd_opt(2020, 3, 14));
        assert_eq!(round[0].code, "59621000");
    }

    #[test]
    fn rewriting_replaces_previous_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clean_conditions.csv");
        let first = vec![Condition {
            start: None,
            stop: None,
            patient: "P1".to_string(),
            code: "1".to_string(),
            description: None,
        }];
        write_records(&path, &first).unwrap();
        let second: Vec<Condition> = Vec::new();
        write_records(&path, &second).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 0);
    }
}
