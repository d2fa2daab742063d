use std::path::PathBuf;

/// Errors raised by table ingestion and output.
///
/// These are all fatal to the stage that hits them: a missing file or a
/// missing expected column means the run cannot proceed, per the pipeline's
/// error taxonomy. Per-cell parse failures are not errors and never appear
/// here.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("missing input table `{stem}` under {dir} (tried {stem}.csv and {stem}.csv.gz)")]
    MissingTable { dir: PathBuf, stem: String },

    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing expected column `{column}`")]
    MissingColumn { path: PathBuf, column: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
