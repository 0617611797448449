use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HeadfileError {
    #[error("cannot read metadata file {path:?}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type HeadfileResult<T> = Result<T, HeadfileError>;
