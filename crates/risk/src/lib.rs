// In crates/risk/src/lib.rs

pub mod error;
pub mod evaluate;
pub mod policy;
pub mod state;

// Re-export public types
pub use error::{Error, Result};
pub use evaluate::evaluate;
pub use policy::RiskPolicy;
pub use state::{trading_day_for, RiskState, TrackedPosition};
