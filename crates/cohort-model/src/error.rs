use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown hypertension cohort version: {0}")]
    UnknownCohortVersion(String),
    #[error("hypertension cohort definition {version} has no codes")]
    EmptyCohortDefinition { version: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
