//! Encounter linkage: valid patients with a parseable start timestamp.

use std::collections::HashSet;

use tracing::debug;

use cohort_model::{Encounter, LinkReport, LinkStage, RawEncounter};

use crate::cohort::CohortIds;
use crate::parse::parse_datetime_utc;

/// Link encounter rows to the valid cohort.
///
/// No dictionary applies here. Both timestamps parse with
/// undefined-on-failure; a row is then dropped when its patient reference
/// is outside the cohort or its start timestamp stayed undefined. An
/// undefined stop timestamp (open encounter) is retained.
pub fn link_encounters(rows: &[RawEncounter], cohort: &CohortIds) -> (Vec<Encounter>, LinkReport) {
    let mut report = LinkReport::new(LinkStage::Encounters, rows.len());
    let mut kept = Vec::new();
    let mut patients = HashSet::new();

    for row in rows {
        if !cohort.contains(&row.patient) {
            report.dropped_unknown_patient += 1;
            continue;
        }
        let Some(start) = parse_datetime_utc(&row.start) else {
            report.dropped_missing_start += 1;
            continue;
        };
        patients.insert(row.patient.clone());
        kept.push(Encounter {
            start,
            stop: row.stop.as_deref().and_then(parse_datetime_utc),
            patient: row.patient.clone(),
            code: row.code.clone(),
            description: row.description.clone(),
        });
    }

    report.output_rows = kept.len();
    report.unique_patients = patients.len();
    debug!(
        input = report.input_rows,
        output = report.output_rows,
        "encounter linkage complete"
    );
    (kept, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(patient: &str, start: &str, stop: Option<&str>) -> RawEncounter {
        RawEncounter {
            start: start.to_string(),
            stop: stop.map(ToString::to_string),
            patient: patient.to_string(),
            code: None,
            description: None,
        }
    }

    #[test]
    fn requires_cohort_membership_and_a_start_timestamp() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        let rows = vec![
            raw("P1", "2015-04-01T09:00:00Z", Some("2015-04-01T09:30:00Z")),
            raw("P1", "", None),
            raw("P1", "later", None),
            raw("P9", "2015-04-01T09:00:00Z", None),
        ];
        let (kept, report) = link_encounters(&rows, &cohort);
        assert_eq!(kept.len(), 1);
        assert_eq!(report.dropped_missing_start, 2);
        assert_eq!(report.dropped_unknown_patient, 1);
        assert_eq!(report.unique_patients, 1);
    }

    #[test]
    fn open_encounters_keep_an_undefined_stop() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        let rows = vec![raw("P1", "2015-04-01T09:00:00Z", None)];
        let (kept, report) = link_encounters(&rows, &cohort);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].stop, None);
        assert_eq!(report.dropped_total(), 0);
    }

    #[test]
    fn unparseable_stop_degrades_without_exclusion() {
        let cohort = CohortIds::from_ids(["P1".to_string()]);
        let rows = vec![raw("P1", "2015-04-01T09:00:00Z", Some("unknown"))];
        let (kept, _) = link_encounters(&rows, &cohort);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].stop, None);
    }
}
