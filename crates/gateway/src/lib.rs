// In crates/gateway/src/lib.rs

use async_trait::async_trait;
use core_types::{AccountContext, Side, Symbol};
use rust_decimal::Decimal;

pub mod error;
pub mod paper;

// Re-export public types
pub use error::{Error, Result};
pub use paper::PaperGateway;

/// The broker's identifier for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderId(pub String);

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The order as handed to the broker, after risk evaluation and sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokerOrder {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    /// Limit price; `None` submits at market.
    pub price: Option<Decimal>,
}

/// The narrow interface the engine needs from a brokerage. Implementations
/// own the wire protocol; the engine only sees account context, order
/// acceptance and price lookups. Callers bound every method with a timeout,
/// so implementations are free to block on the network.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    /// The name of the gateway (e.g., "PaperGateway"), for logging.
    fn name(&self) -> &'static str;

    /// A point-in-time view of equity, cash and open position values.
    async fn account_context(&self) -> Result<AccountContext>;

    /// Submits an order. `Ok` means the broker accepted it;
    /// [`Error::Rejected`] carries the broker's reason when it did not.
    async fn place_order(&self, order: &BrokerOrder) -> Result<OrderId>;

    /// Cancels a previously accepted order.
    async fn cancel_order(&self, order_id: &OrderId) -> Result<()>;

    /// The latest price for a symbol, or `None` when no quote is available.
    /// A missing quote is not an error; the stop monitor skips and retries.
    async fn price(&self, symbol: &Symbol) -> Result<Option<Decimal>>;
}
