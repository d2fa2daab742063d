//! Patient cleaning: the root of the pipeline.
//!
//! Produces the two disjoint, exhaustive partitions (valid / excluded) and
//! the diagnostics the run summary renders. Age is derived against the
//! configured as-of date, so callers control whether a re-run reproduces
//! the previous output.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use cohort_model::{
    Gender, NumericSummary, Patient, PatientCleaningReport, QualityFlag, Race, RaceMappingEntry,
    RawPatient,
};

use crate::parse::parse_date;

/// Ages outside this range are treated as data errors and degraded to
/// undefined rather than dropped.
pub const VALID_AGE_RANGE: (f64, f64) = (0.0, 120.0);

/// How many distinct original race spellings the diagnostic breakdown keeps
/// per normalized bucket.
const RACE_EXAMPLE_CAP: usize = 5;

/// Result of the patient cleaning stage: the two output partitions plus the
/// aggregate report. Together `valid` and `excluded` hold every input row
/// exactly once.
#[derive(Debug)]
pub struct PatientCleaning {
    pub valid: Vec<Patient>,
    pub excluded: Vec<Patient>,
    pub report: PatientCleaningReport,
}

/// Clean the raw patient table.
///
/// Per-cell failures (unparseable birthdate, unrecognized gender) degrade to
/// undefined; the quality flag then marks any row with an undefined
/// birthdate, gender, or age as `Invalid`. No row is ever discarded here:
/// partitioning is the only exclusion mechanism.
pub fn clean_patients(rows: &[RawPatient], as_of: NaiveDate) -> PatientCleaning {
    let mut valid = Vec::new();
    let mut excluded = Vec::new();
    let mut race_originals: BTreeMap<Race, BTreeSet<String>> = BTreeMap::new();

    for row in rows {
        let birthdate = row.birthdate.as_deref().and_then(parse_date);
        let age = birthdate
            .map(|birth| derive_age(birth, as_of))
            .filter(|age| (VALID_AGE_RANGE.0..=VALID_AGE_RANGE.1).contains(age));
        let gender = row.gender.as_deref().and_then(Gender::parse);
        let race = Race::coerce(row.race.as_deref());

        if let Some(original) = row.race.as_deref() {
            let original = original.trim();
            if !original.is_empty() {
                race_originals
                    .entry(race)
                    .or_default()
                    .insert(original.to_string());
            }
        }

        let flag = if birthdate.is_none() || gender.is_none() || age.is_none() {
            QualityFlag::Invalid
        } else {
            QualityFlag::Valid
        };
        let patient = Patient {
            id: row.id.clone(),
            birthdate,
            age,
            gender,
            race,
            data_quality_flag: flag,
        };
        if flag.is_valid() {
            valid.push(patient);
        } else {
            excluded.push(patient);
        }
    }

    let ages: Vec<f64> = valid.iter().filter_map(|patient| patient.age).collect();
    let report = PatientCleaningReport {
        initial: rows.len(),
        valid: valid.len(),
        excluded: excluded.len(),
        age_summary: NumericSummary::from_values(&ages),
        race_mapping: race_mapping(&valid, race_originals),
    };
    debug!(
        initial = report.initial,
        valid = report.valid,
        excluded = report.excluded,
        "patient cleaning complete"
    );

    PatientCleaning {
        valid,
        excluded,
        report,
    }
}

/// Age in fractional years at the as-of date.
fn derive_age(birthdate: NaiveDate, as_of: NaiveDate) -> f64 {
    (as_of - birthdate).num_days() as f64 / 365.25
}

/// Build the original-to-normalized race breakdown over the valid
/// partition, keeping a few original spellings per bucket as examples.
fn race_mapping(
    valid: &[Patient],
    originals: BTreeMap<Race, BTreeSet<String>>,
) -> Vec<RaceMappingEntry> {
    let mut counts: BTreeMap<Race, usize> = BTreeMap::new();
    for patient in valid {
        *counts.entry(patient.race).or_default() += 1;
    }
    Race::VOCABULARY
        .iter()
        .filter_map(|race| {
            let count = counts.get(race).copied()?;
            let examples = originals
                .get(race)
                .map(|values| {
                    values
                        .iter()
                        .take(RACE_EXAMPLE_CAP)
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            Some(RaceMappingEntry {
                race: *race,
                count,
                originals: examples,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(id: &str, birthdate: Option<&str>, gender: Option<&str>, race: Option<&str>) -> RawPatient {
        RawPatient {
            id: id.to_string(),
            birthdate: birthdate.map(ToString::to_string),
            gender: gender.map(ToString::to_string),
            race: race.map(ToString::to_string),
        }
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn well_formed_row_is_valid_with_derived_age() {
        let cleaning = clean_patients(
            &[raw("P1", Some("1990-01-01"), Some("M"), Some("Caucasian"))],
            as_of(),
        );
        assert_eq!(cleaning.valid.len(), 1);
        assert!(cleaning.excluded.is_empty());
        let patient = &cleaning.valid[0];
        let age = patient.age.unwrap();
        assert!((age - 34.0).abs() < 0.05, "age was {age}");
        // Outside the fixed vocabulary, so coerced.
        assert_eq!(patient.race, Race::Other);
        assert_eq!(patient.data_quality_flag, QualityFlag::Valid);
    }

    #[test]
    fn unparseable_birthdate_invalidates_regardless_of_other_fields() {
        let cleaning = clean_patients(
            &[raw("P1", Some("not-a-date"), Some("F"), Some("white"))],
            as_of(),
        );
        assert!(cleaning.valid.is_empty());
        let patient = &cleaning.excluded[0];
        assert_eq!(patient.birthdate, None);
        assert_eq!(patient.age, None);
        assert_eq!(patient.data_quality_flag, QualityFlag::Invalid);
    }

    #[test]
    fn malformed_gender_sentinel_invalidates() {
        let cleaning = clean_patients(
            &[raw("P1", Some("1990-01-01"), Some("8293.3"), Some("white"))],
            as_of(),
        );
        assert_eq!(cleaning.excluded.len(), 1);
        assert_eq!(cleaning.excluded[0].gender, None);
    }

    #[test]
    fn out_of_range_age_degrades_to_undefined_and_invalidates() {
        // Born well over 120 years before the as-of date.
        let cleaning = clean_patients(
            &[raw("P1", Some("1880-01-01"), Some("M"), Some("white"))],
            as_of(),
        );
        let patient = &cleaning.excluded[0];
        assert!(patient.birthdate.is_some());
        assert_eq!(patient.age, None);

        // Birthdate in the future gives a negative age: same treatment.
        let future = clean_patients(
            &[raw("P2", Some("2030-01-01"), Some("F"), Some("white"))],
            as_of(),
        );
        assert_eq!(future.excluded[0].age, None);
    }

    #[test]
    fn partitions_are_disjoint_and_exhaustive() {
        let rows = vec![
            raw("P1", Some("1990-01-01"), Some("M"), Some("white")),
            raw("P2", None, Some("F"), Some("black")),
            raw("P3", Some("1955-06-15"), None, None),
            raw("P4", Some("2000-02-29"), Some("F"), Some("asian")),
        ];
        let cleaning = clean_patients(&rows, as_of());
        assert_eq!(cleaning.valid.len() + cleaning.excluded.len(), rows.len());
        assert_eq!(cleaning.report.initial, rows.len());
        assert_eq!(cleaning.report.valid, cleaning.valid.len());
        assert_eq!(cleaning.report.excluded, cleaning.excluded.len());
        let valid_ids: Vec<&str> = cleaning.valid.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(valid_ids, vec!["P1", "P4"]);
    }

    #[test]
    fn race_mapping_reports_valid_counts_with_original_spellings() {
        let rows = vec![
            raw("P1", Some("1990-01-01"), Some("M"), Some("WHITE")),
            raw("P2", Some("1985-03-02"), Some("F"), Some("white")),
            raw("P3", Some("1970-11-20"), Some("M"), Some("Caucasian")),
        ];
        let cleaning = clean_patients(&rows, as_of());
        let report = &cleaning.report;
        let white = report
            .race_mapping
            .iter()
            .find(|entry| entry.race == Race::White)
            .unwrap();
        assert_eq!(white.count, 2);
        assert!(white.originals.contains(&"WHITE".to_string()));
        let other = report
            .race_mapping
            .iter()
            .find(|entry| entry.race == Race::Other)
            .unwrap();
        assert_eq!(other.count, 1);
        assert!(other.originals.contains(&"Caucasian".to_string()));
    }

    #[test]
    fn age_summary_covers_only_the_valid_partition() {
        let rows = vec![
            raw("P1", Some("1990-01-01"), Some("M"), Some("white")),
            raw("P2", Some("not-a-date"), Some("F"), Some("white")),
        ];
        let cleaning = clean_patients(&rows, as_of());
        assert_eq!(cleaning.report.age_summary.count, 1);
    }
}
