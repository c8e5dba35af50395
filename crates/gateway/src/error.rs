// In crates/gateway/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Broker unavailable: {detail}")]
    Unavailable { detail: String },

    #[error("Broker rejected the order: {reason}")]
    Rejected { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
