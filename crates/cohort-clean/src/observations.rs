//! Observation linkage: valid patients, LOINC-validated codes, numeric
//! value coercion, unit standardization.

use std::collections::HashSet;

use tracing::debug;

use cohort_model::{LinkReport, LinkStage, Observation, RawObservation};
use cohort_terminology::CodeSet;

use crate::cohort::CohortIds;
use crate::parse::{normalize_unit, parse_f64};

/// Link observation rows to the valid cohort.
///
/// Codes match the LOINC set exactly. The raw value string is preserved and
/// coerced to `VALUE_NUM` with undefined-on-failure; rows with non-numeric
/// values (qualitative results) are kept so downstream aggregation can see
/// them. Units are lower-cased and trimmed only.
pub fn link_observations(
    rows: &[RawObservation],
    cohort: &CohortIds,
    loinc: &CodeSet,
) -> (Vec<Observation>, LinkReport) {
    let mut report = LinkReport::new(LinkStage::Observations, rows.len());
    let mut kept = Vec::new();
    let mut patients = HashSet::new();
    let mut codes = HashSet::new();

    for row in rows {
        if !cohort.contains(&row.patient) {
            report.dropped_unknown_patient += 1;
            continue;
        }
        if !loinc.contains(&row.code) {
            report.dropped_unknown_code += 1;
            continue;
        }
        patients.insert(row.patient.clone());
        codes.insert(row.code.clone());
        kept.push(Observation {
            date: row.date.clone(),
            patient: row.patient.clone(),
            code: row.code.clone(),
            description: row.description.clone(),
            value: row.value.clone(),
            value_num: parse_f64(&row.value),
            units: normalize_unit(row.units.as_deref()),
        });
    }

    report.output_rows = kept.len();
    report.unique_patients = patients.len();
    report.unique_codes = codes.len();
    debug!(
        input = report.input_rows,
        output = report.output_rows,
        "observation linkage complete"
    );
    (kept, report)
}
