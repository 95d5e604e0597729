use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Failed to read task source {path}: {source}")]
    TaskSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid exponent at {path}:{line}: {value:?}")]
    InvalidExponent {
        path: PathBuf,
        line: usize,
        value: String,
    },

    #[error("Task source {path} contains no tasks")]
    EmptySource { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write result log {path}: {source}")]
    ResultSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode result: {0}")]
    ResultEncode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BrokerError>;
