//! Explicit pipeline configuration.
//!
//! Every stage entry point receives a [`PipelineConfig`] value instead of
//! reading ambient state: directory locations, reference dictionary paths,
//! the as-of date used for age derivation, and the versioned hypertension
//! cohort definition are all explicit inputs. Injecting the as-of date is
//! what makes re-runs reproducible.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Stems of the five raw input tables under the data directory. Each may be
/// present as `<stem>.csv` or `<stem>.csv.gz`.
pub const RAW_TABLE_STEMS: [&str; 5] = [
    "patients",
    "conditions",
    "observations",
    "medications",
    "encounters",
];

/// Locations of the three reference code dictionaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryPaths {
    pub snomed: PathBuf,
    pub loinc: PathBuf,
    pub rxnorm: PathBuf,
}

impl DictionaryPaths {
    /// Conventional dictionary locations inside a data directory.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            snomed: data_dir.join("dictionary_snomed.csv"),
            loinc: data_dir.join("dictionary_loinc.csv"),
            rxnorm: data_dir.join("dictionary_rxnorm.csv"),
        }
    }
}

/// Versioned hypertension cohort definition.
///
/// The exploratory scripts this pipeline descends from never reconciled on a
/// single SNOMED set, so the definition is carried as explicit, versioned
/// configuration rather than a hardcoded constant. The pipeline validates
/// and reports the definition; cohort analytics consume it downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HypertensionDefinition {
    pub version: String,
    pub codes: BTreeSet<String>,
}

impl HypertensionDefinition {
    /// Essential hypertension only.
    pub fn v1_essential() -> Self {
        Self::preset("v1-essential", &["59621000"])
    }

    /// The screening set used by the comparative BP/BMI analysis.
    pub fn v2_screening() -> Self {
        Self::preset("v2-screening", &["10509002", "283371005", "444814009"])
    }

    /// The extended set used by the prevalence analysis.
    pub fn v3_extended() -> Self {
        Self::preset(
            "v3-extended",
            &["10509002", "283371005", "444814009", "16114001"],
        )
    }

    fn preset(version: &str, codes: &[&str]) -> Self {
        Self {
            version: version.to_string(),
            codes: codes.iter().map(|code| (*code).to_string()).collect(),
        }
    }

    /// Build a custom definition from an explicit code list.
    pub fn custom(version: impl Into<String>, codes: impl IntoIterator<Item = String>) -> Result<Self> {
        let version = version.into();
        let codes: BTreeSet<String> = codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if codes.is_empty() {
            return Err(ModelError::EmptyCohortDefinition { version });
        }
        Ok(Self { version, codes })
    }

    /// Resolve a preset by version name (`v1-essential`, `v2-screening`,
    /// `v3-extended`; the bare `v1`/`v2`/`v3` shorthands are accepted).
    pub fn from_version(version: &str) -> Result<Self> {
        match version.trim().to_lowercase().as_str() {
            "v1" | "v1-essential" => Ok(Self::v1_essential()),
            "v2" | "v2-screening" => Ok(Self::v2_screening()),
            "v3" | "v3-extended" => Ok(Self::v3_extended()),
            other => Err(ModelError::UnknownCohortVersion(other.to_string())),
        }
    }

    pub fn matches(&self, code: &str) -> bool {
        self.codes.contains(code.trim())
    }
}

impl Default for HypertensionDefinition {
    fn default() -> Self {
        Self::v3_extended()
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the raw tables and reference dictionaries.
    pub data_dir: PathBuf,
    /// Directory the cleaned tables are written to, overwriting prior runs.
    pub output_dir: PathBuf,
    /// The "current date" for age derivation. An explicit input so that
    /// re-running a stage on the same data is reproducible.
    pub as_of: NaiveDate,
    pub dictionaries: DictionaryPaths,
    pub hypertension: HypertensionDefinition,
}

impl PipelineConfig {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        as_of: NaiveDate,
    ) -> Self {
        let data_dir = data_dir.into();
        let dictionaries = DictionaryPaths::under(&data_dir);
        Self {
            data_dir,
            output_dir: output_dir.into(),
            as_of,
            dictionaries,
            hypertension: HypertensionDefinition::default(),
        }
    }

    pub fn with_dictionaries(mut self, dictionaries: DictionaryPaths) -> Self {
        self.dictionaries = dictionaries;
        self
    }

    pub fn with_hypertension(mut self, definition: HypertensionDefinition) -> Self {
        self.hypertension = definition;
        self
    }

    pub fn clean_patients_path(&self) -> PathBuf {
        self.output_dir.join("clean_patients.csv")
    }

    pub fn excluded_patients_path(&self) -> PathBuf {
        self.output_dir.join("excluded_patients.csv")
    }

    pub fn clean_conditions_path(&self) -> PathBuf {
        self.output_dir.join("clean_conditions.csv")
    }

    pub fn clean_observations_path(&self) -> PathBuf {
        self.output_dir.join("clean_observations.csv")
    }

    pub fn clean_medications_path(&self) -> PathBuf {
        self.output_dir.join("clean_medications.csv")
    }

    pub fn clean_encounters_path(&self) -> PathBuf {
        self.output_dir.join("clean_encounters.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_the_source_scripts() {
        assert_eq!(HypertensionDefinition::v1_essential().codes.len(), 1);
        assert!(HypertensionDefinition::v1_essential().matches("59621000"));
        assert_eq!(HypertensionDefinition::v2_screening().codes.len(), 3);
        assert_eq!(HypertensionDefinition::v3_extended().codes.len(), 4);
        assert!(HypertensionDefinition::v3_extended().matches("16114001"));
        assert!(!HypertensionDefinition::v2_screening().matches("16114001"));
    }

    #[test]
    fn version_shorthands_resolve() {
        assert_eq!(
            HypertensionDefinition::from_version("v2").unwrap(),
            HypertensionDefinition::v2_screening()
        );
        assert_eq!(
            HypertensionDefinition::from_version("V3-EXTENDED").unwrap(),
            HypertensionDefinition::v3_extended()
        );
        assert!(HypertensionDefinition::from_version("v9").is_err());
    }

    #[test]
    fn custom_definitions_reject_empty_code_lists() {
        let custom = HypertensionDefinition::custom(
            "site-a",
            vec!["59621000".to_string(), " 38341003 ".to_string()],
        )
        .unwrap();
        assert!(custom.matches("38341003"));
        assert!(HypertensionDefinition::custom("empty", Vec::new()).is_err());
    }

    #[test]
    fn output_paths_live_under_the_output_dir() {
        let config = PipelineConfig::new(
            "data/original",
            "data/processed",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        );
        assert!(
            config
                .clean_patients_path()
                .ends_with("data/processed/clean_patients.csv")
        );
        assert!(
            config
                .dictionaries
                .snomed
                .ends_with("data/original/dictionary_snomed.csv")
        );
    }
}
