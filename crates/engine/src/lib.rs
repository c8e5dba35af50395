// In crates/engine/src/lib.rs

pub mod coordinator;
pub mod error;
pub mod monitor;
pub mod report;

#[cfg(test)]
mod testutil;

// Re-export public types
pub use coordinator::{Coordinator, OrderResult};
pub use error::{Error, Result};
pub use monitor::{ExecutedStop, StopMonitor, StopOutcome};
pub use report::{PositionReport, RiskReport};
