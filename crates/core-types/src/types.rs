// In crates/core-types/src/types.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A trading symbol in the broker's own notation (e.g., "NVDA.US").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    /// Creates a symbol, rejecting empty or whitespace-only input.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::InvalidSymbol(raw));
        }
        Ok(Self(raw))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The direction of an order. The engine tracks long positions only, so a
/// `Sell` always reduces (or closes) an existing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("buy"),
            Side::Sell => f.write_str("sell"),
        }
    }
}

/// Whether an order opens/extends exposure or closes an existing tracked
/// position. Closing orders (produced by the stop monitor) bypass the
/// exposure and daily-cap checks; they remain subject to the emergency stop
/// and the per-symbol cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderIntent {
    #[default]
    Open,
    Close,
}

/// How the caller wants the order sized: an explicit quantity, or a fraction
/// of account equity to be resolved by the risk evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sizing {
    Quantity(Decimal),
    RiskPct(Decimal),
}

/// A candidate order, before any risk evaluation has taken place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub sizing: Sizing,
    /// The limit price the order would be submitted at.
    pub price: Decimal,
    #[serde(default)]
    pub intent: OrderIntent,
    /// Explicit stop-loss level; when absent the evaluator attaches the
    /// policy default for opening buys.
    pub stop_loss: Option<Decimal>,
    /// Explicit take-profit level; same defaulting rule as `stop_loss`.
    pub take_profit: Option<Decimal>,
}

impl OrderRequest {
    /// A plain limit order with an explicit quantity.
    pub fn limit(symbol: Symbol, side: Side, quantity: Decimal, price: Decimal) -> Result<Self> {
        if price <= Decimal::ZERO {
            return Err(Error::InvalidOrder(format!("price must be positive, got {price}")));
        }
        if quantity <= Decimal::ZERO {
            return Err(Error::InvalidOrder(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        Ok(Self {
            symbol,
            side,
            sizing: Sizing::Quantity(quantity),
            price,
            intent: OrderIntent::Open,
            stop_loss: None,
            take_profit: None,
        })
    }

    /// An order sized as a fraction of account equity; the risk evaluator
    /// resolves the actual quantity.
    pub fn by_risk_pct(symbol: Symbol, side: Side, price: Decimal, risk_pct: Decimal) -> Result<Self> {
        if price <= Decimal::ZERO {
            return Err(Error::InvalidOrder(format!("price must be positive, got {price}")));
        }
        if risk_pct <= Decimal::ZERO || risk_pct > Decimal::ONE {
            return Err(Error::InvalidOrder(format!(
                "risk_pct must be in (0, 1], got {risk_pct}"
            )));
        }
        Ok(Self {
            symbol,
            side,
            sizing: Sizing::RiskPct(risk_pct),
            price,
            intent: OrderIntent::Open,
            stop_loss: None,
            take_profit: None,
        })
    }

    /// A closing sell for the full quantity of a tracked position.
    pub fn closing(symbol: Symbol, quantity: Decimal, price: Decimal) -> Result<Self> {
        let mut request = Self::limit(symbol, Side::Sell, quantity, price)?;
        request.intent = OrderIntent::Close;
        Ok(request)
    }

    pub fn is_close(&self) -> bool {
        self.intent == OrderIntent::Close
    }
}

/// A point-in-time view of the brokerage account, fetched from the broker
/// gateway immediately before evaluation. Position values are market values
/// in account currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountContext {
    pub total_equity: Decimal,
    pub available_cash: Decimal,
    pub positions: HashMap<Symbol, Decimal>,
}

impl AccountContext {
    /// The combined market value of all open positions.
    pub fn total_position_value(&self) -> Decimal {
        self.positions.values().copied().sum()
    }

    /// The market value held in one symbol, zero when flat.
    pub fn position_value(&self, symbol: &Symbol) -> Decimal {
        self.positions.get(symbol).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Why the risk evaluator refused an order. Every variant maps to a stable
/// machine code via [`DenialReason::code`] so callers can branch without
/// parsing display text.
#[derive(Debug, Clone, PartialEq)]
pub enum DenialReason {
    EmergencyStopActive,
    DailyTradeLimitReached { limit: u32 },
    DailyLossLimitReached { limit: Decimal, realized: Decimal },
    CooldownActive { remaining_secs: u64 },
    BelowMinOrderValue { notional: Decimal, min: Decimal },
    OrderValueExceedsLimit { notional: Decimal, limit: Decimal },
    SinglePositionLimitExceeded { would_be: Decimal, limit: Decimal },
    TotalPositionLimitExceeded { would_be: Decimal, limit: Decimal },
    CashReserveBreached { would_remain: Decimal, required: Decimal },
    SizeBelowMinimum,
}

impl DenialReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::EmergencyStopActive => "emergency_stop",
            DenialReason::DailyTradeLimitReached { .. } => "daily_trade_limit",
            DenialReason::DailyLossLimitReached { .. } => "daily_loss_limit",
            DenialReason::CooldownActive { .. } => "cooldown",
            DenialReason::BelowMinOrderValue { .. } => "below_min_order_value",
            DenialReason::OrderValueExceedsLimit { .. } => "max_order_value",
            DenialReason::SinglePositionLimitExceeded { .. } => "single_position_limit",
            DenialReason::TotalPositionLimitExceeded { .. } => "total_position_limit",
            DenialReason::CashReserveBreached { .. } => "cash_reserve",
            DenialReason::SizeBelowMinimum => "size_below_minimum",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::EmergencyStopActive => {
                write!(f, "trading is emergency-stopped; call resume_trading first")
            }
            DenialReason::DailyTradeLimitReached { limit } => {
                write!(f, "daily trade limit of {limit} reached")
            }
            DenialReason::DailyLossLimitReached { limit, realized } => {
                write!(f, "daily realized P&L {realized} breaches the loss limit of -{limit}")
            }
            DenialReason::CooldownActive { remaining_secs } => {
                write!(f, "symbol is cooling down, {remaining_secs}s remaining")
            }
            DenialReason::BelowMinOrderValue { notional, min } => {
                write!(f, "order value {notional} is below the minimum of {min}")
            }
            DenialReason::OrderValueExceedsLimit { notional, limit } => {
                write!(f, "order value {notional} exceeds the maximum of {limit}")
            }
            DenialReason::SinglePositionLimitExceeded { would_be, limit } => {
                write!(f, "position would reach {would_be}, above the single-position limit {limit}")
            }
            DenialReason::TotalPositionLimitExceeded { would_be, limit } => {
                write!(f, "total exposure would reach {would_be}, above the limit {limit}")
            }
            DenialReason::CashReserveBreached { would_remain, required } => {
                write!(f, "cash would fall to {would_remain}, below the reserve of {required}")
            }
            DenialReason::SizeBelowMinimum => {
                write!(f, "computed size is below the minimum tradable unit")
            }
        }
    }
}

/// The outcome of risk evaluation. A denial is ordinary data the caller can
/// match on, never an error used for control flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allowed {
        /// The final quantity, after `RiskPct` sizing has been resolved.
        quantity: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
    },
    Denied { reason: DenialReason },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn symbol_rejects_blank_input() {
        assert!(Symbol::new("").is_err());
        assert!(Symbol::new("   ").is_err());
        assert!(Symbol::new("AAPL.US").is_ok());
    }

    #[test]
    fn limit_order_validates_price_and_quantity() {
        let sym = Symbol::new("AAPL.US").unwrap();
        assert!(OrderRequest::limit(sym.clone(), Side::Buy, dec!(10), dec!(0)).is_err());
        assert!(OrderRequest::limit(sym.clone(), Side::Buy, dec!(0), dec!(150)).is_err());
        let order = OrderRequest::limit(sym, Side::Buy, dec!(10), dec!(150)).unwrap();
        assert_eq!(order.intent, OrderIntent::Open);
    }

    #[test]
    fn risk_pct_must_be_a_fraction() {
        let sym = Symbol::new("AAPL.US").unwrap();
        assert!(OrderRequest::by_risk_pct(sym.clone(), Side::Buy, dec!(150), dec!(1.5)).is_err());
        assert!(OrderRequest::by_risk_pct(sym, Side::Buy, dec!(150), dec!(0.05)).is_ok());
    }

    #[test]
    fn closing_order_carries_close_intent() {
        let sym = Symbol::new("AAPL.US").unwrap();
        let order = OrderRequest::closing(sym, dec!(10), dec!(140)).unwrap();
        assert!(order.is_close());
        assert_eq!(order.side, Side::Sell);
    }
}
