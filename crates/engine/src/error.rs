// In crates/engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or timeout before the broker answered. The whole
    /// submission may be retried later; no risk state was mutated.
    #[error("Broker unavailable: {detail}")]
    BrokerUnavailable { detail: String },

    /// The broker answered and refused the order. Not retried without
    /// caller intervention.
    #[error("Broker rejected the order: {reason}")]
    BrokerRejected { reason: String },

    /// The state store is unreachable. Fatal for the triggering operation:
    /// nothing proceeds past a point that requires durable state.
    #[error("State store failure: {0}")]
    Storage(#[from] store::Error),

    #[error("Malformed order request: {0}")]
    InvalidRequest(#[from] core_types::Error),

    #[error(transparent)]
    InvalidPolicy(#[from] risk::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
