//! Medication linkage: valid patients, RXNORM-validated codes after
//! numeric round-trip normalization.

use std::collections::HashSet;

use tracing::debug;

use cohort_model::{LinkReport, LinkStage, Medication, RawMedication};
use cohort_terminology::CodeSet;

use crate::cohort::CohortIds;
use crate::parse::normalize_medication_code;

/// Link medication rows to the valid cohort.
///
/// Codes are normalized before the dictionary test (parse as number, drop
/// the fractional part, re-stringify), so a `"313782.0"` export artifact
/// matches the dictionary's `"313782"`. Rows whose code fails the numeric
/// parse are dropped before the dictionary is consulted.
pub fn link_medications(
    rows: &[RawMedication],
    cohort: &CohortIds,
    rxnorm: &CodeSet,
) -> (Vec<Medication>, LinkReport) {
    let mut report = LinkReport::new(LinkStage::Medications, rows.len());
    let mut kept = Vec::new();
    let mut patients = HashSet::new();
    let mut codes = HashSet::new();

    for row in rows {
        if !cohort.contains(&row.patient) {
            report.dropped_unknown_patient += 1;
            continue;
        }
        let Some(code) = normalize_medication_code(&row.code) else {
            report.dropped_unparseable_code += 1;
            continue;
        };
        if !rxnorm.contains(&code) {
            report.dropped_unknown_code += 1;
            continue;
        }
        patients.insert(row.patient.clone());
        codes.insert(code.clone());
        kept.push(Medication {
            start: row.start.clone(),
            stop: row.stop.clone(),
            patient: row.patient.clone(),
            code,
            description: row.description.clone(),
        });
    }

    report.output_rows = kept.len();
    report.unique_patients = patients.len();
    report.unique_codes = codes.len();
    debug!(
        input = report.input_rows,
        output = report.output_rows,
        "medication linkage complete"
    );
    (kept, report)
}
