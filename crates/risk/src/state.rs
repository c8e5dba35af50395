// In crates/risk/src/state.rs

use chrono::{DateTime, Duration, NaiveDate, Utc};
use core_types::{Side, Symbol};
use events::{RiskEvent, RiskEventKind};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The trading day a timestamp falls in, under the configured broker
/// rollover offset from UTC.
pub fn trading_day_for(at: DateTime<Utc>, day_offset_hours: i32) -> NaiveDate {
    (at + Duration::hours(i64::from(day_offset_hours))).date_naive()
}

/// A locally recorded open position with its stop levels, independent of
/// the broker's own position record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPosition {
    pub entry_price: Decimal,
    pub quantity: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// The engine's mutable risk state. This is the single source of truth for
/// risk decisions; broker state is consulted only for account context,
/// because broker round-trips are slow and may lag locally pending actions.
///
/// All mutation goes through the coordinator under its lock; the evaluator
/// only ever reads. Every mutation is persisted before it is considered
/// committed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskState {
    #[serde(default)]
    pub emergency_stopped: bool,
    /// The trading day the daily counters belong to.
    #[serde(default)]
    pub trading_day: NaiveDate,
    #[serde(default)]
    pub daily_trade_count: u32,
    #[serde(default)]
    pub daily_realized_pnl: Decimal,
    /// Entries never expire; they are only ever compared against "now".
    #[serde(default)]
    pub last_order_time: HashMap<Symbol, DateTime<Utc>>,
    #[serde(default)]
    pub tracked_positions: HashMap<Symbol, TrackedPosition>,
}

impl RiskState {
    /// Resets the daily counters when `day` differs from the stored trading
    /// day. Idempotent within a day.
    pub fn roll_to_day(&mut self, day: NaiveDate) {
        if day != self.trading_day {
            self.trading_day = day;
            self.daily_trade_count = 0;
            self.daily_realized_pnl = Decimal::ZERO;
        }
    }

    /// Updates `tracked_positions` for a confirmed fill and returns the P&L
    /// realized by it (sells against a tracked entry only). Does not touch
    /// the daily counters; that is the caller's decision to make and record.
    ///
    /// Buys create or extend the entry with a weighted-average entry price;
    /// sells reduce it and remove it once fully closed, keeping the
    /// invariant that a tracked symbol always has positive quantity.
    pub fn record_fill(
        &mut self,
        symbol: &Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        at: DateTime<Utc>,
    ) -> Option<Decimal> {
        match side {
            Side::Buy => {
                match self.tracked_positions.get_mut(symbol) {
                    Some(position) => {
                        let new_quantity = position.quantity + quantity;
                        position.entry_price = (position.entry_price * position.quantity
                            + price * quantity)
                            / new_quantity;
                        position.quantity = new_quantity;
                        if let Some(stop) = stop_loss {
                            position.stop_loss_price = stop;
                        }
                        if let Some(target) = take_profit {
                            position.take_profit_price = target;
                        }
                    }
                    None => {
                        // An opening buy always carries evaluator-attached
                        // stop levels; fall back to the entry price itself
                        // rather than invent a level here.
                        self.tracked_positions.insert(
                            symbol.clone(),
                            TrackedPosition {
                                entry_price: price,
                                quantity,
                                stop_loss_price: stop_loss.unwrap_or(price),
                                take_profit_price: take_profit.unwrap_or(price),
                                opened_at: at,
                            },
                        );
                    }
                }
                None
            }
            Side::Sell => {
                let Some(position) = self.tracked_positions.get_mut(symbol) else {
                    // Selling an untracked position realizes nothing we can
                    // attribute; the trade log still records the fill.
                    return None;
                };
                let closed = quantity.min(position.quantity);
                let realized = (price - position.entry_price) * closed;
                position.quantity -= closed;
                let remaining = position.quantity;
                if remaining <= Decimal::ZERO {
                    self.tracked_positions.remove(symbol);
                }
                Some(realized)
            }
        }
    }

    /// Replays one event from the risk-event log onto this state. Only the
    /// lifecycle-bearing kinds mutate; denial, stop-trigger and broker
    /// failure events are audit-only (the fill behind a stop close arrives
    /// as its own `OrderAllowed` event).
    pub fn apply_event(&mut self, event: &RiskEvent, day_offset_hours: i32) {
        match &event.kind {
            RiskEventKind::OrderAllowed {
                symbol,
                side,
                quantity,
                price,
                stop_loss,
                take_profit,
                realized_pnl,
            } => {
                self.roll_to_day(trading_day_for(event.timestamp, day_offset_hours));
                self.daily_trade_count += 1;
                self.last_order_time.insert(symbol.clone(), event.timestamp);
                self.record_fill(
                    symbol,
                    *side,
                    *quantity,
                    *price,
                    *stop_loss,
                    *take_profit,
                    event.timestamp,
                );
                if let Some(pnl) = realized_pnl {
                    self.daily_realized_pnl += *pnl;
                }
            }
            RiskEventKind::EmergencyStop { .. } => self.emergency_stopped = true,
            RiskEventKind::Resume => self.emergency_stopped = false,
            RiskEventKind::OrderDenied { .. }
            | RiskEventKind::StopTriggered { .. }
            | RiskEventKind::BrokerFailure { .. } => {}
        }
    }
}
