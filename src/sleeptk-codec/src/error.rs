use thiserror::Error;

use crate::LogVersion;

#[derive(Debug, Error)]
pub enum SleepLogError {
    #[error("invalid log file name: `{0}`")]
    InvalidFileName(String),
    #[error("unsupported log format version: {0}")]
    UnsupportedVersion(u32),
    #[error("{0} logs can only be read")]
    ReadOnlyFormat(LogVersion),
    #[error("sampling frequency must be positive")]
    ZeroFrequency,
    #[error("invalid header: {0:?}")]
    InvalidHeader(String),
    #[error("line {line}: {reason}")]
    InvalidRow { line: usize, reason: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
