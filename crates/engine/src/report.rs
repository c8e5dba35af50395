// In crates/engine/src/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use core_types::Symbol;
use risk::RiskPolicy;
use rust_decimal::Decimal;
use serde::Serialize;

/// One tracked position as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub opened_at: DateTime<Utc>,
}

/// A point-in-time summary of risk state and policy, for operators. The
/// `Display` rendering is what the CLI prints; serialization covers anything
/// that wants it as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct RiskReport {
    pub generated_at: DateTime<Utc>,
    pub emergency_stopped: bool,
    pub trading_day: NaiveDate,
    pub daily_trade_count: u32,
    pub daily_trade_limit: u32,
    pub daily_realized_pnl: Decimal,
    pub daily_loss_limit_pct: Decimal,
    pub positions: Vec<PositionReport>,
    pub policy: RiskPolicy,
}

impl std::fmt::Display for RiskReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Risk report at {}", self.generated_at.to_rfc3339())?;
        writeln!(
            f,
            "  status:          {}",
            if self.emergency_stopped { "EMERGENCY STOP" } else { "active" }
        )?;
        writeln!(f, "  trading day:     {}", self.trading_day)?;
        writeln!(
            f,
            "  trades today:    {} / {}",
            self.daily_trade_count, self.daily_trade_limit
        )?;
        writeln!(
            f,
            "  realized P&L:    {} (halt at -{}% of equity)",
            self.daily_realized_pnl,
            self.daily_loss_limit_pct * Decimal::from(100u32)
        )?;
        writeln!(f, "  open positions:  {}", self.positions.len())?;
        for position in &self.positions {
            writeln!(
                f,
                "    {} {} @ {} (stop {}, target {}, opened {})",
                position.symbol,
                position.quantity,
                position.entry_price,
                position.stop_loss_price,
                position.take_profit_price,
                position.opened_at.to_rfc3339(),
            )?;
        }
        Ok(())
    }
}
