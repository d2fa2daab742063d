//! Reference code sets loaded from dictionary CSV files.
//!
//! Each dictionary file needs at least a `CODE` column (header match is
//! case-insensitive and BOM-tolerant). Codes are deduplicated into a set
//! with their original casing and formatting preserved; any normalization
//! happens in the stage that consumes the set, never here.

use std::collections::HashSet;
use std::path::Path;

use cohort_model::DictionaryPaths;
use csv::ReaderBuilder;

use crate::error::{Result, TerminologyError};

/// The clinical coding vocabularies the pipeline validates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeSystem {
    Snomed,
    Loinc,
    Rxnorm,
}

impl CodeSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSystem::Snomed => "SNOMED",
            CodeSystem::Loinc => "LOINC",
            CodeSystem::Rxnorm => "RXNORM",
        }
    }
}

impl std::fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable membership set of valid codes for one vocabulary.
#[derive(Debug, Clone)]
pub struct CodeSet {
    system: CodeSystem,
    codes: HashSet<String>,
}

impl CodeSet {
    pub fn new(system: CodeSystem, codes: impl IntoIterator<Item = String>) -> Self {
        let codes = codes
            .into_iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        Self { system, codes }
    }

    pub fn system(&self) -> CodeSystem {
        self.system
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.contains(code.trim())
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// Load one dictionary file into a [`CodeSet`].
///
/// A missing or malformed file, or a file without a `CODE` column, is a
/// fatal configuration error.
pub fn load_code_set(path: &Path, system: CodeSystem) -> Result<CodeSet> {
    if !path.is_file() {
        return Err(TerminologyError::MissingDictionary {
            path: path.to_path_buf(),
        });
    }
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|source| TerminologyError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| TerminologyError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let code_index = headers
        .iter()
        .position(|header| header.trim().trim_matches('\u{feff}').eq_ignore_ascii_case("CODE"))
        .ok_or_else(|| TerminologyError::MissingCodeColumn {
            path: path.to_path_buf(),
        })?;

    let mut codes = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(|source| TerminologyError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(value) = record.get(code_index) else {
            continue;
        };
        let code = value.trim();
        if !code.is_empty() {
            codes.insert(code.to_string());
        }
    }
    if codes.is_empty() {
        return Err(TerminologyError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(CodeSet {
        system,
        codes,
    })
}

/// All three reference dictionaries for one pipeline run, loaded once and
/// shared read-only by the linker stages.
#[derive(Debug, Clone)]
pub struct Dictionaries {
    pub snomed: CodeSet,
    pub loinc: CodeSet,
    pub rxnorm: CodeSet,
}

impl Dictionaries {
    pub fn load(paths: &DictionaryPaths) -> Result<Self> {
        Ok(Self {
            snomed: load_code_set(&paths.snomed, CodeSystem::Snomed)?,
            loinc: load_code_set(&paths.loinc, CodeSystem::Loinc)?,
            rxnorm: load_code_set(&paths.rxnorm, CodeSystem::Rxnorm)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_dictionary(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_and_deduplicates_codes() {
        let dir = TempDir::new().unwrap();
        let path = write_dictionary(
            &dir,
            "dictionary_snomed.csv",
            "CODE,DESCRIPTION\n59621000,Essential hypertension\n59621000,Essential hypertension\n44054006,Diabetes\n",
        );
        let set = load_code_set(&path, CodeSystem::Snomed).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("59621000"));
        assert!(set.contains(" 44054006 "));
        assert!(!set.contains("0"));
    }

    #[test]
    fn code_header_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = write_dictionary(&dir, "dict.csv", "code\n8480-6\n8462-4\n");
        let set = load_code_set(&path, CodeSystem::Loinc).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("8480-6"));
    }

    #[test]
    fn original_code_formatting_is_preserved() {
        let dir = TempDir::new().unwrap();
        let path = write_dictionary(&dir, "dict.csv", "CODE\n8480-6\n");
        let set = load_code_set(&path, CodeSystem::Loinc).unwrap();
        // No normalization at load time: the hyphenated form is the member.
        assert!(set.contains("8480-6"));
        assert!(!set.contains("84806"));
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.csv");
        let error = load_code_set(&missing, CodeSystem::Rxnorm).unwrap_err();
        assert!(matches!(error, TerminologyError::MissingDictionary { .. }));
    }

    #[test]
    fn missing_code_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = write_dictionary(&dir, "dict.csv", "ID,NAME\n1,foo\n");
        let error = load_code_set(&path, CodeSystem::Rxnorm).unwrap_err();
        assert!(matches!(error, TerminologyError::MissingCodeColumn { .. }));
    }

    #[test]
    fn loads_all_three_dictionaries() {
        let dir = TempDir::new().unwrap();
        write_dictionary(&dir, "dictionary_snomed.csv", "CODE\n59621000\n");
        write_dictionary(&dir, "dictionary_loinc.csv", "CODE\n8480-6\n");
        write_dictionary(&dir, "dictionary_rxnorm.csv", "CODE\n313782\n");
        let paths = DictionaryPaths::under(dir.path());
        let dictionaries = Dictionaries::load(&paths).unwrap();
        assert_eq!(dictionaries.snomed.system(), CodeSystem::Snomed);
        assert!(dictionaries.rxnorm.contains("313782"));
    }
}
