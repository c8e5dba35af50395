// In crates/risk/src/policy.rs

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The immutable risk policy, loaded once at process start. All `*_pct`
/// fields are fractions of account equity and must satisfy `0 < pct <= 1`;
/// a policy that fails [`RiskPolicy::validate`] never reaches the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Cap on the equity figure used for every percentage computation.
    /// `None` means the full account equity is in play.
    #[serde(default)]
    pub max_trading_capital: Option<Decimal>,

    /// Largest single position as a fraction of equity.
    pub max_single_position_pct: Decimal,
    /// Ceiling on total invested value as a fraction of equity.
    pub max_total_position_pct: Decimal,
    /// Cash that must remain untouched, as a fraction of equity.
    pub min_cash_reserve_pct: Decimal,

    /// Default stop-loss distance below the entry price.
    pub default_stop_loss_pct: Decimal,
    /// Default take-profit distance above the entry price.
    pub default_take_profit_pct: Decimal,

    /// Daily realized-loss cap as a fraction of equity; trading halts for
    /// the rest of the day once breached.
    pub daily_loss_limit_pct: Decimal,
    /// Maximum number of successful submissions per trading day.
    pub daily_trade_limit: u32,

    /// Smallest acceptable order notional.
    pub min_order_value: Decimal,
    /// Largest acceptable order notional.
    pub max_order_value: Decimal,

    /// Minimum seconds between successive orders for the same symbol.
    pub order_cooldown_seconds: u64,
}

impl RiskPolicy {
    /// Checks the policy invariants. Called once at configuration load.
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("max_single_position_pct", self.max_single_position_pct),
            ("max_total_position_pct", self.max_total_position_pct),
            ("min_cash_reserve_pct", self.min_cash_reserve_pct),
            ("default_stop_loss_pct", self.default_stop_loss_pct),
            ("default_take_profit_pct", self.default_take_profit_pct),
            ("daily_loss_limit_pct", self.daily_loss_limit_pct),
        ];
        for (name, value) in fractions {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(Error::InvalidParameters(format!(
                    "{name} must be in (0, 1], got {value}"
                )));
            }
        }
        if self.daily_trade_limit == 0 {
            return Err(Error::InvalidParameters(
                "daily_trade_limit must be at least 1".to_string(),
            ));
        }
        if self.max_order_value <= Decimal::ZERO {
            return Err(Error::InvalidParameters(format!(
                "max_order_value must be positive, got {}",
                self.max_order_value
            )));
        }
        if self.min_order_value < Decimal::ZERO || self.min_order_value >= self.max_order_value {
            return Err(Error::InvalidParameters(format!(
                "min_order_value must be in [0, max_order_value), got {}",
                self.min_order_value
            )));
        }
        if let Some(cap) = self.max_trading_capital {
            if cap <= Decimal::ZERO {
                return Err(Error::InvalidParameters(format!(
                    "max_trading_capital must be positive when set, got {cap}"
                )));
            }
        }
        Ok(())
    }

    /// The equity figure every percentage limit is computed against:
    /// account equity, capped by `max_trading_capital` when configured.
    pub fn effective_equity(&self, total_equity: Decimal) -> Decimal {
        match self.max_trading_capital {
            Some(cap) => total_equity.min(cap),
            None => total_equity,
        }
    }
}
