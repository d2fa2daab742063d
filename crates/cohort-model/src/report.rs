//! Aggregate per-stage diagnostics.
//!
//! Per-row failures are never surfaced individually (see the error-handling
//! policy); these types carry the before/after counts and distributional
//! summaries each stage reports instead.

use serde::Serialize;

use crate::enums::Race;

/// Describe-style summary of a numeric column. Quartiles use linear
/// interpolation; the standard deviation is the sample deviation and is
/// undefined for fewer than two values.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl NumericSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        let count = sorted.len();
        if count == 0 {
            return Self::default();
        }
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std_dev = if count > 1 {
            let variance = sorted
                .iter()
                .map(|value| (value - mean).powi(2))
                .sum::<f64>()
                / (count - 1) as f64;
            Some(variance.sqrt())
        } else {
            None
        };
        Self {
            count,
            mean: Some(mean),
            std_dev,
            min: Some(sorted[0]),
            q1: Some(percentile(&sorted, 0.25)),
            median: Some(percentile(&sorted, 0.5)),
            q3: Some(percentile(&sorted, 0.75)),
            max: Some(sorted[count - 1]),
        }
    }
}

fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = fraction * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

/// One normalized race bucket with the original spellings that mapped into
/// it. Diagnostic only; the original spellings are not retained on records.
#[derive(Debug, Clone, Serialize)]
pub struct RaceMappingEntry {
    pub race: Race,
    pub count: usize,
    /// Distinct original values, capped by the cleaner.
    pub originals: Vec<String>,
}

/// Outcome of the patient cleaning stage.
#[derive(Debug, Clone, Serialize)]
pub struct PatientCleaningReport {
    pub initial: usize,
    pub valid: usize,
    pub excluded: usize,
    /// Age distribution of the valid partition.
    pub age_summary: NumericSummary,
    pub race_mapping: Vec<RaceMappingEntry>,
}

impl PatientCleaningReport {
    pub fn valid_fraction(&self) -> f64 {
        if self.initial == 0 {
            0.0
        } else {
            self.valid as f64 / self.initial as f64
        }
    }
}

/// The four cohort-linkage stages downstream of the patient cleaner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LinkStage {
    Conditions,
    Observations,
    Medications,
    Encounters,
}

impl LinkStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStage::Conditions => "conditions",
            LinkStage::Observations => "observations",
            LinkStage::Medications => "medications",
            LinkStage::Encounters => "encounters",
        }
    }
}

/// Aggregate counts for one linkage stage. Only the drop reasons a stage
/// actually applies are ever non-zero.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub stage: LinkStage,
    pub input_rows: usize,
    pub dropped_unknown_patient: usize,
    pub dropped_unparseable_code: usize,
    pub dropped_unknown_code: usize,
    pub dropped_missing_start: usize,
    pub output_rows: usize,
    pub unique_patients: usize,
    pub unique_codes: usize,
}

impl LinkReport {
    pub fn new(stage: LinkStage, input_rows: usize) -> Self {
        Self {
            stage,
            input_rows,
            dropped_unknown_patient: 0,
            dropped_unparseable_code: 0,
            dropped_unknown_code: 0,
            dropped_missing_start: 0,
            output_rows: 0,
            unique_patients: 0,
            unique_codes: 0,
        }
    }

    pub fn dropped_total(&self) -> usize {
        self.dropped_unknown_patient
            + self.dropped_unparseable_code
            + self.dropped_unknown_code
            + self.dropped_missing_start
    }
}
