//! Condition linkage: valid patients, SNOMED-validated codes.

use std::collections::HashSet;

use tracing::debug;

use cohort_model::{Condition, LinkReport, LinkStage, RawCondition};
use cohort_terminology::CodeSet;

use crate::cohort::CohortIds;
use crate::parse::parse_date;

/// Link condition rows to the valid cohort.
///
/// A row survives iff its patient reference is a cohort member and its code
/// is a SNOMED member (exact match, no normalization). Onset dates parse
/// with undefined-on-failure; a bad date never excludes a row.
pub fn link_conditions(
    rows: &[RawCondition],
    cohort: &CohortIds,
    snomed: &CodeSet,
) -> (Vec<Condition>, LinkReport) {
    let mut report = LinkReport::new(LinkStage::Conditions, rows.len());
    let mut kept = Vec::new();
    let mut patients = HashSet::new();
    let mut codes = HashSet::new();

    for row in rows {
        if !cohort.contains(&row.patient) {
            report.dropped_unknown_patient += 1;
            continue;
        }
        if !snomed.contains(&row.code) {
            report.dropped_unknown_code += 1;
            continue;
        }
        patients.insert(row.patient.clone());
        codes.insert(row.code.clone());
        kept.push(Condition {
            start: row.start.as_deref().and_then(parse_date),
            stop: row.stop.clone(),
            patient: row.patient.clone(),
            code: row.code.clone(),
            description: row.description.clone(),
        });
    }

    report.output_rows = kept.len();
    report.unique_patients = patients.len();
    report.unique_codes = codes.len();
    debug!(
        input = report.input_rows,
        output = report.output_rows,
        "condition linkage complete"
    );
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cohort_terminology::CodeSystem;

    fn raw(patient: &str, code: &str, start: Option<&str>) -> RawCondition {
        RawCondition {
            start: start.map(ToString::to_string),
            stop: None,
            patient: patient.to_string(),
            code: code.to_string(),
            description: None,
        }
    }

    fn snomed() -> CodeSet {
        CodeSet::new(
            CodeSystem::Snomed,
            ["59621000".to_string(), "44054006".to_string()],
        )
    }

    #[test]
    fn keeps_only_cohort_members_with_known_codes() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        let rows = vec![
            raw("P1", "59621000", Some("2020-01-01")),
            raw("P1", "999", Some("2020-01-01")),
            raw("P9", "59621000", Some("2020-01-01")),
        ];
        let (kept, report) = link_conditions(&rows, &cohort, &snomed());
        assert_eq!(kept.len(), 1);
        assert_eq!(report.dropped_unknown_patient, 1);
        assert_eq!(report.dropped_unknown_code, 1);
        assert_eq!(report.output_rows, 1);
        assert_eq!(report.unique_patients, 1);
        assert_eq!(report.unique_codes, 1);
        assert_eq!(kept[0].start, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn unparseable_onset_is_kept_as_undefined() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        let rows = vec![raw("P1", "44054006", Some("whenever"))];
        let (kept, report) = link_conditions(&rows, &cohort, &snomed());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].start, None);
        assert_eq!(report.dropped_total(), 0);
    }

    #[test]
    fn code_match_is_exact() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        // The float-formatted variant must not match: conditions get no
        // normalization.
        let rows = vec![raw("P1", "59621000.0", None)];
        let (kept, report) = link_conditions(&rows, &cohort, &snomed());
        assert!(kept.is_empty());
        assert_eq!(report.dropped_unknown_code, 1);
    }
}
