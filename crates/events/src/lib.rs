// --- Audit Event Structures (risk-event log and trade log) ---

use chrono::{DateTime, Utc};
use core_types::{Side, Symbol};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which stop level fired during a monitor sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopTrigger {
    StopLoss,
    TakeProfit,
}

impl std::fmt::Display for StopTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopTrigger::StopLoss => f.write_str("stop-loss"),
            StopTrigger::TakeProfit => f.write_str("take-profit"),
        }
    }
}

/// The payload of a risk event.
///
/// `event` and `data` are used by serde so each JSONL line reads as
/// `{"seq":..,"timestamp":..,"event":"order_allowed","data":{..}}`.
///
/// Replay rule: only `OrderAllowed`, `EmergencyStop` and `Resume` mutate
/// state when the log is replayed. `StopTriggered` is audit-only because the
/// closing fill it leads to is recorded as its own `OrderAllowed` event;
/// applying both would double-count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RiskEventKind {
    OrderAllowed {
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        /// P&L realized by this fill against the tracked entry price.
        /// `None` for opening buys.
        realized_pnl: Option<Decimal>,
    },
    OrderDenied {
        symbol: Symbol,
        reason_code: String,
        detail: String,
    },
    StopTriggered {
        symbol: Symbol,
        trigger: StopTrigger,
        quantity: Decimal,
        price: Decimal,
    },
    BrokerFailure {
        symbol: Symbol,
        detail: String,
    },
    EmergencyStop {
        reason: String,
    },
    Resume,
}

/// One immutable record in the append-only risk-event log. `seq` is assigned
/// by the store and strictly increasing, which lets the snapshot mark how far
/// into the log it has been compacted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: RiskEventKind,
}

/// The fate of an attempted submission, as written to the trade log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeVerdict {
    Submitted,
    DryRun,
    Denied,
    Failed,
}

/// One line of the append-only trade log: every attempted submission gets a
/// record, whether it was allowed, denied, dry-run or failed at the broker.
/// Kept separate from the risk-event log because it serves accounting rather
/// than risk audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub price: Decimal,
    pub notional: Decimal,
    pub order_id: Option<String>,
    pub verdict: TradeVerdict,
    /// Denial or failure detail; empty for clean submissions.
    #[serde(default)]
    pub reason: String,
}
