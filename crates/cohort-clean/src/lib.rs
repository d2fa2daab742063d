//! Cleaning and cohort-linkage stages.
//!
//! The patient cleaner runs first and produces the authoritative valid
//! cohort; the four linker stages are mutually independent once that
//! cohort exists. Each stage is a pure function over its input rows and
//! the run configuration, so callers own all file handling and the stages
//! stay trivially testable (and parallelizable behind the patient-cleaner
//! barrier, should that ever be wanted).

pub mod cohort;
pub mod conditions;
pub mod encounters;
pub mod medications;
pub mod observations;
pub mod parse;
pub mod patients;

pub use cohort::CohortIds;
pub use conditions::link_conditions;
pub use encounters::link_encounters;
pub use medications::link_medications;
pub use observations::link_observations;
pub use patients::{PatientCleaning, clean_patients};
