//! Error types.

use std::io;
use std::num::{ParseFloatError, ParseIntError};

pub type Result<T> = core::result::Result<T, Error>;

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::IoError(e.to_string())
    }
}

/// Crate-wide error type.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(String),

    #[error("toml deserialization error: {0}")]
    TomlDeserError(#[from] toml::de::Error),

    #[error("parsing error: {0}")]
    ParsingError(String),
    #[error("failed parsing int: {0}")]
    ParseIntError(#[from] ParseIntError),
    #[error("failed parsing float: {0}")]
    ParseFloatError(#[from] ParseFloatError),

    #[error("parameter names collide after flattening: {0} and {1}")]
    ParamCollision(String, String),
    #[error("unsupported parameter value for: {0}")]
    UnsupportedParamValue(String),

    #[error("no candidate values given for: {0}")]
    EmptyValueSequence(String),
    #[error("no models given for the experiment sweep")]
    NoModels,

    #[error("script writer is closed")]
    WriterClosed,

    #[error("parameter {0} does not exist or is not formatted as expected in {1}")]
    ParamNotInFile(String, String),

    #[error("engine error: {0}")]
    EngineError(String),

    #[error("other error: {0}")]
    Other(String),
}
