use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrajectoryError {
    #[error("inputs do not match: {0}")]
    Mismatch(String),

    #[error("invalid value: {0}")]
    Value(String),

    #[error("malformed input: {0}")]
    Format(String),

    #[error("cannot access config {path:?}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse config {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Output(#[from] mr_data::MrDataError),
}

pub type TrajectoryResult<T> = Result<T, TrajectoryError>;
