use serde_xml_rs::Error;
use std::fmt;
use tokio::task::JoinError;

#[derive(Debug, PartialEq)]
pub enum FerrumReduceError {
    ConfigError(String),
    /// The output file could not be created. Always fatal.
    OutputOpenError(String),
    MissingIntermediate(String),
    MalformedRecord(String),
    ReadError(String),
    WriteError(String),
    TaskError(String),
}

impl fmt::Display for FerrumReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FerrumReduceError::ConfigError(msg) => write!(f, "config error: {}", msg),
            FerrumReduceError::OutputOpenError(msg) => write!(f, "cannot open output: {}", msg),
            FerrumReduceError::MissingIntermediate(msg) => {
                write!(f, "missing intermediate file: {}", msg)
            }
            FerrumReduceError::MalformedRecord(msg) => write!(f, "malformed record: {}", msg),
            FerrumReduceError::ReadError(msg) => write!(f, "read error: {}", msg),
            FerrumReduceError::WriteError(msg) => write!(f, "write error: {}", msg),
            FerrumReduceError::TaskError(msg) => write!(f, "task error: {}", msg),
        }
    }
}

impl std::error::Error for FerrumReduceError {}

impl From<Error> for FerrumReduceError {
    fn from(value: Error) -> Self {
        FerrumReduceError::ConfigError(value.to_string())
    }
}

impl From<JoinError> for FerrumReduceError {
    fn from(value: JoinError) -> Self {
        FerrumReduceError::TaskError(value.to_string())
    }
}

impl FerrumReduceError {
    /// The only error that aborts a task in every strictness mode.
    pub fn is_fatal_open(&self) -> bool {
        matches!(self, FerrumReduceError::OutputOpenError(_))
    }
}

pub type Result<T> = std::result::Result<T, FerrumReduceError>;
