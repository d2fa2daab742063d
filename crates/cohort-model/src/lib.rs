pub mod config;
pub mod enums;
pub mod error;
pub mod records;
pub mod report;

pub use config::{DictionaryPaths, HypertensionDefinition, PipelineConfig};
pub use enums::{Gender, QualityFlag, Race};
pub use error::{ModelError, Result};
pub use records::{
    Condition, Encounter, Medication, Observation, Patient, RawCondition, RawEncounter,
    RawMedication, RawObservation, RawPatient,
};
pub use report::{LinkReport, LinkStage, NumericSummary, PatientCleaningReport, RaceMappingEntry};
