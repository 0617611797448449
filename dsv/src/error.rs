use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DsvError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed file: {0}")]
    Format(String),

    #[error("truncated file: {declared} samples declared but only {found} present")]
    Truncated { declared: usize, found: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DsvResult<T> = Result<T, DsvError>;

pub(crate) fn format_err<T>(msg: impl Into<String>) -> DsvResult<T> {
    Err(DsvError::Format(msg.into()))
}
