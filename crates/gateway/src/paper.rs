// In crates/gateway/src/paper.rs

use crate::{BrokerGateway, BrokerOrder, Error, OrderId, Result};
use async_trait::async_trait;
use core_types::{AccountContext, Side, Symbol};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct PaperPosition {
    quantity: Decimal,
    avg_price: Decimal,
}

#[derive(Debug, Default)]
struct Book {
    cash: Decimal,
    positions: HashMap<Symbol, PaperPosition>,
    prices: HashMap<Symbol, Decimal>,
    next_order_id: u64,
}

/// An in-memory brokerage book for paper trading and tests. Orders fill
/// immediately at their limit price; there is no slippage or fee model, the
/// engine's own accounting is what is under test.
#[derive(Debug)]
pub struct PaperGateway {
    book: Mutex<Book>,
}

impl PaperGateway {
    pub fn new(starting_cash: Decimal) -> Self {
        Self {
            book: Mutex::new(Book { cash: starting_cash, ..Book::default() }),
        }
    }

    /// Publishes a quote for `symbol`, overriding any previous one.
    pub async fn set_price(&self, symbol: Symbol, price: Decimal) {
        self.book.lock().await.prices.insert(symbol, price);
    }

    /// Installs an already-held position, replacing any existing entry. The
    /// book only lives as long as the process, so callers that persist
    /// positions elsewhere rebuild it from there on startup.
    pub async fn seed_position(&self, symbol: Symbol, quantity: Decimal, avg_price: Decimal) {
        let mut book = self.book.lock().await;
        book.prices.entry(symbol.clone()).or_insert(avg_price);
        book.positions.insert(symbol, PaperPosition { quantity, avg_price });
    }
}

impl Book {
    fn mark(&self, symbol: &Symbol, position: &PaperPosition) -> Decimal {
        self.prices.get(symbol).copied().unwrap_or(position.avg_price)
    }
}

#[async_trait]
impl BrokerGateway for PaperGateway {
    fn name(&self) -> &'static str {
        "PaperGateway"
    }

    async fn account_context(&self) -> Result<AccountContext> {
        let book = self.book.lock().await;
        let positions: HashMap<Symbol, Decimal> = book
            .positions
            .iter()
            .map(|(symbol, position)| {
                (symbol.clone(), position.quantity * book.mark(symbol, position))
            })
            .collect();
        let total_equity = book.cash + positions.values().copied().sum::<Decimal>();
        Ok(AccountContext {
            total_equity,
            available_cash: book.cash,
            positions,
        })
    }

    async fn place_order(&self, order: &BrokerOrder) -> Result<OrderId> {
        let Some(price) = order.price else {
            return Err(Error::Rejected {
                reason: "paper gateway only supports limit orders".to_string(),
            });
        };
        let notional = order.quantity * price;
        let mut book = self.book.lock().await;

        match order.side {
            Side::Buy => {
                if notional > book.cash {
                    return Err(Error::Rejected {
                        reason: format!("insufficient cash: need {notional}, have {}", book.cash),
                    });
                }
                book.cash -= notional;
                match book.positions.get_mut(&order.symbol) {
                    Some(position) => {
                        let new_quantity = position.quantity + order.quantity;
                        position.avg_price = (position.avg_price * position.quantity + notional)
                            / new_quantity;
                        position.quantity = new_quantity;
                    }
                    None => {
                        book.positions.insert(
                            order.symbol.clone(),
                            PaperPosition { quantity: order.quantity, avg_price: price },
                        );
                    }
                }
            }
            Side::Sell => {
                let held = book
                    .positions
                    .get(&order.symbol)
                    .map(|position| position.quantity)
                    .unwrap_or(Decimal::ZERO);
                if order.quantity > held {
                    return Err(Error::Rejected {
                        reason: format!(
                            "insufficient position: selling {}, hold {held}",
                            order.quantity
                        ),
                    });
                }
                book.cash += notional;
                let remaining = held - order.quantity;
                if remaining <= Decimal::ZERO {
                    book.positions.remove(&order.symbol);
                } else if let Some(position) = book.positions.get_mut(&order.symbol) {
                    position.quantity = remaining;
                }
            }
        }

        // The fill is the freshest quote we have.
        book.prices.insert(order.symbol.clone(), price);
        book.next_order_id += 1;
        let order_id = OrderId(format!("paper-{}", book.next_order_id));
        tracing::debug!(%order_id, symbol = %order.symbol, side = %order.side, "Paper order filled.");
        Ok(order_id)
    }

    async fn cancel_order(&self, order_id: &OrderId) -> Result<()> {
        // Paper orders fill immediately, so there is never anything to cancel.
        tracing::debug!(%order_id, "Cancel ignored, paper orders fill on placement.");
        Ok(())
    }

    async fn price(&self, symbol: &Symbol) -> Result<Option<Decimal>> {
        Ok(self.book.lock().await.prices.get(symbol).copied())
    }
}
