use std::path::PathBuf;

use cohort_model::{HypertensionDefinition, LinkReport, PatientCleaningReport};

/// Everything a pipeline invocation reports back for the run summary.
#[derive(Debug)]
pub struct RunResult {
    pub output_dir: PathBuf,
    /// Present when the patient cleaning stage ran in this invocation.
    pub patients: Option<PatientCleaningReport>,
    pub links: Vec<LinkReport>,
    pub hypertension: HypertensionDefinition,
}

impl RunResult {
    pub fn new(output_dir: PathBuf, hypertension: HypertensionDefinition) -> Self {
        Self {
            output_dir,
            patients: None,
            links: Vec::new(),
            hypertension,
        }
    }
}
