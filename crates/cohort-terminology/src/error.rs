use std::path::PathBuf;

/// Dictionary loading failures are configuration errors: without a complete
/// reference set no downstream validation is possible, so none of these are
/// recoverable mid-run.
#[derive(Debug, thiserror::Error)]
pub enum TerminologyError {
    #[error("missing reference dictionary: {path}")]
    MissingDictionary { path: PathBuf },

    #[error("failed to read dictionary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse dictionary CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dictionary {path} has no CODE column")]
    MissingCodeColumn { path: PathBuf },

    #[error("dictionary {path} contains no codes")]
    Empty { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, TerminologyError>;
