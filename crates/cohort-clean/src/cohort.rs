//! The valid-patient cohort shared by every linker stage.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use cohort_model::Patient;

/// The set of patient identifiers that passed quality validation.
///
/// Produced by the patient cleaner and consumed read-only by all four
/// linkers; it is the referential-integrity anchor for every other table.
/// When stages run as separate processes the set is reloaded from the
/// cleaned patient file's `id` column.
#[derive(Debug, Clone)]
pub struct CohortIds {
    ids: HashSet<String>,
}

impl CohortIds {
    /// Collect the cohort from cleaned patient records, keeping only rows
    /// flagged valid.
    pub fn from_patients(patients: &[Patient]) -> Self {
        let ids = patients
            .iter()
            .filter(|patient| patient.is_cohort_member())
            .map(|patient| patient.id.clone())
            .collect();
        Self { ids }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    /// Reload the cohort from a cleaned patient file. The file holds only
    /// the valid partition, so every `id` in it is a cohort member. A
    /// missing file means the patient cleaner has not run: fatal.
    pub fn load(clean_patients_path: &Path) -> Result<Self> {
        let ids = cohort_ingest::read_column(clean_patients_path, "id").with_context(|| {
            format!(
                "load valid cohort from {}",
                clean_patients_path.display()
            )
        })?;
        Ok(Self::from_ids(ids))
    }

    pub fn contains(&self, patient_id: &str) -> bool {
        self.ids.contains(patient_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
