use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrDataError {
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data: {0}")]
    Format(String),

    #[error("truncated data file: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
}

pub type MrDataResult<T> = Result<T, MrDataError>;

pub(crate) fn io_err(path: &std::path::Path) -> impl FnOnce(io::Error) -> MrDataError + '_ {
    move |source| MrDataError::Io {
        path: path.to_owned(),
        source,
    }
}
