// In crates/core-types/src/lib.rs

pub mod error;
pub mod signal;
pub mod types;

// Re-export the most important types for easy access from other crates.
pub use error::{Error, Result};
pub use signal::{Signal, SignalAction, SignalSource};
pub use types::{
    AccountContext, DenialReason, OrderIntent, OrderRequest, Side, Sizing, Symbol, Verdict,
};
