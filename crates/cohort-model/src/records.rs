//! Typed record schemas for the five pipeline tables.
//!
//! Raw structs mirror the source column contract (upper-case linkage columns
//! `PATIENT`, `CODE`, `START`, `STOP`, `VALUE`, `UNITS`); cleaned structs
//! mirror the output contract. The patient table is the one asymmetry: its
//! raw headers are case-insensitive and its cleaned file uses lower-case
//! column names (`id`, `birthdate`, ...), so the rename happens exactly once,
//! at this boundary.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Gender, QualityFlag, Race};

/// A raw patient row after header normalization. Empty cells arrive as
/// `None`; parsing and validation happen in the cleaning stage.
#[derive(Debug, Clone, Default)]
pub struct RawPatient {
    pub id: String,
    pub birthdate: Option<String>,
    pub gender: Option<String>,
    pub race: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    #[serde(rename = "START", default)]
    pub start: Option<String>,
    #[serde(rename = "STOP", default)]
    pub stop: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawObservation {
    #[serde(rename = "DATE", default)]
    pub date: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
    #[serde(rename = "VALUE")]
    pub value: String,
    #[serde(rename = "UNITS", default)]
    pub units: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMedication {
    #[serde(rename = "START", default)]
    pub start: Option<String>,
    #[serde(rename = "STOP", default)]
    pub stop: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEncounter {
    #[serde(rename = "START")]
    pub start: String,
    #[serde(rename = "STOP", default)]
    pub stop: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE", default)]
    pub code: Option<String>,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}

/// A cleaned patient record.
///
/// `age` is derived from the configured as-of date, not stored in the
/// source; it is undefined when the birthdate is undefined or the derived
/// value falls outside [0, 120]. The quality flag is computed once at
/// cleaning time and never revised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub birthdate: Option<NaiveDate>,
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    pub race: Race,
    pub data_quality_flag: QualityFlag,
}

impl Patient {
    /// Cohort membership is exactly the quality flag.
    pub fn is_cohort_member(&self) -> bool {
        self.data_quality_flag.is_valid()
    }
}

/// A condition linked to a cohort patient with a SNOMED-validated code.
/// `START` is parsed with undefined-on-failure; `STOP` passes through raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "START")]
    pub start: Option<NaiveDate>,
    #[serde(rename = "STOP", default)]
    pub stop: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}

/// An observation linked to a cohort patient with a LOINC-validated code.
///
/// The raw `VALUE` string is preserved next to the derived `VALUE_NUM` so
/// downstream aggregation can see which rows failed numeric coercion; such
/// rows are kept, not dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    #[serde(rename = "DATE", default)]
    pub date: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
    #[serde(rename = "VALUE")]
    pub value: String,
    #[serde(rename = "VALUE_NUM")]
    pub value_num: Option<f64>,
    #[serde(rename = "UNITS", default)]
    pub units: Option<String>,
}

/// A medication linked to a cohort patient. `CODE` holds the normalized
/// (integer round-tripped) RXNORM code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    #[serde(rename = "START", default)]
    pub start: Option<String>,
    #[serde(rename = "STOP", default)]
    pub stop: Option<String>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE")]
    pub code: String,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}

/// An encounter linked to a cohort patient. A parseable `START` is required
/// for retention; `STOP` may remain undefined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    #[serde(rename = "START")]
    pub start: DateTime<Utc>,
    #[serde(rename = "STOP")]
    pub stop: Option<DateTime<Utc>>,
    #[serde(rename = "PATIENT")]
    pub patient: String,
    #[serde(rename = "CODE", default)]
    pub code: Option<String>,
    #[serde(rename = "DESCRIPTION", default)]
    pub description: Option<String>,
}
