// In crates/core-types/src/signal.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Symbol;

/// What a signal source wants the engine to do with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Hold,
}

/// A candidate order intent produced by an external strategy. The engine
/// only consumes symbol, price and action; confidence and reason are passed
/// through for the audit trail without validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    pub action: SignalAction,
    pub price: Decimal,
    pub confidence: f64,
    pub reason: String,
}

/// The capability interface for anything that produces trading signals
/// (indicator strategies, scanners, manual input). Implementations live
/// entirely outside the risk core.
pub trait SignalSource: Send + Sync {
    /// The name of the signal source, for logging.
    fn name(&self) -> &'static str;

    /// Produces a signal for a symbol from a historical price series
    /// (oldest first).
    fn generate_signal(&self, symbol: &Symbol, series: &[Decimal]) -> Signal;
}
