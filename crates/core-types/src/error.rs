// In crates/core-types/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid order request: {0}")]
    InvalidOrder(String),

    #[error("Invalid symbol: {0:?}")]
    InvalidSymbol(String),
}

pub type Result<T> = std::result::Result<T, Error>;
