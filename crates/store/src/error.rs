// In crates/store/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode record: {0}")]
    Encode(serde_json::Error),

    #[error("Risk-event log is corrupt at line {line}: {source}")]
    CorruptEventLog {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Risk-state snapshot is corrupt: {0}")]
    CorruptSnapshot(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
