//! Categorical values used by the cleaned patient table.
//!
//! All three categoricals serialize to the exact strings the cleaned
//! output files carry (`M`/`F`, lower-case race names, `Valid`/`Invalid`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Administrative gender after normalization. Raw values outside `M`/`F`
/// (including the malformed numeric sentinel present in the source data)
/// do not parse and degrade to `None` on the patient record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    M,
    F,
}

impl Gender {
    /// Parse a raw gender cell. Only exact `M` or `F` (after trimming) are
    /// recognized; anything else is undefined.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "M" => Some(Gender::M),
            "F" => Some(Gender::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::M => "M",
            Gender::F => "F",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Race after coercion into the fixed reporting vocabulary.
///
/// The coercion is total and lossy: values outside the vocabulary (and
/// missing values) collapse to `Other`. The original spelling is only kept
/// in the diagnostic race-mapping breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    White,
    Black,
    Asian,
    Hawaiian,
    Other,
    Native,
}

impl Race {
    /// The fixed vocabulary, in reporting order.
    pub const VOCABULARY: [Race; 6] = [
        Race::White,
        Race::Black,
        Race::Asian,
        Race::Hawaiian,
        Race::Other,
        Race::Native,
    ];

    /// Coerce a raw race cell into the vocabulary. Matching is
    /// case-insensitive; unmatched and missing values become `Other`.
    pub fn coerce(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Race::Other;
        };
        match raw.trim().to_lowercase().as_str() {
            "white" => Race::White,
            "black" => Race::Black,
            "asian" => Race::Asian,
            "hawaiian" => Race::Hawaiian,
            "native" => Race::Native,
            "other" => Race::Other,
            _ => Race::Other,
        }
    }

    /// Returns true when the raw value is already a vocabulary member
    /// (case-insensitive). Used by the diagnostic breakdown to tell apart
    /// genuine `other` values from coerced ones.
    pub fn is_vocabulary_term(raw: &str) -> bool {
        matches!(
            raw.trim().to_lowercase().as_str(),
            "white" | "black" | "asian" | "hawaiian" | "native" | "other"
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Race::White => "white",
            Race::Black => "black",
            Race::Asian => "asian",
            Race::Hawaiian => "hawaiian",
            Race::Other => "other",
            Race::Native => "native",
        }
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-patient quality classification gating cohort membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityFlag {
    Valid,
    Invalid,
}

impl QualityFlag {
    pub fn is_valid(&self) -> bool {
        matches!(self, QualityFlag::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::Valid => "Valid",
            QualityFlag::Invalid => "Invalid",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_parses_only_m_and_f() {
        assert_eq!(Gender::parse("M"), Some(Gender::M));
        assert_eq!(Gender::parse(" F "), Some(Gender::F));
        assert_eq!(Gender::parse("m"), None);
        assert_eq!(Gender::parse("8293.3"), None);
        assert_eq!(Gender::parse(""), None);
    }

    #[test]
    fn race_coercion_is_total() {
        assert_eq!(Race::coerce(Some("WHITE")), Race::White);
        assert_eq!(Race::coerce(Some("  native ")), Race::Native);
        assert_eq!(Race::coerce(Some("Caucasian")), Race::Other);
        assert_eq!(Race::coerce(Some("")), Race::Other);
        assert_eq!(Race::coerce(None), Race::Other);
    }

    #[test]
    fn race_serializes_lowercase() {
        let json = serde_json::to_string(&Race::Hawaiian).unwrap();
        assert_eq!(json, "\"hawaiian\"");
    }

    #[test]
    fn quality_flag_strings() {
        assert_eq!(QualityFlag::Valid.as_str(), "Valid");
        assert_eq!(QualityFlag::Invalid.as_str(), "Invalid");
        assert!(QualityFlag::Valid.is_valid());
        assert!(!QualityFlag::Invalid.is_valid());
    }
}
