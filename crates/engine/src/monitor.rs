// In crates/engine/src/monitor.rs

use crate::{Coordinator, Error, OrderResult, Result};
use core_types::{DenialReason, OrderRequest, Symbol};
use events::{RiskEventKind, StopTrigger};
use rust_decimal::Decimal;
use std::sync::Arc;

/// One stop execution attempt from a sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStop {
    pub symbol: Symbol,
    pub trigger: StopTrigger,
    pub quantity: Decimal,
    /// The quote that breached the level, used as the close's limit price.
    pub price: Decimal,
    pub outcome: StopOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    Closed { order_id: String, dry_run: bool },
    /// The close was blocked by the risk pipeline (emergency stop or an
    /// active cooldown); the position stays tracked for the next sweep.
    Denied { reason: DenialReason },
    /// The broker refused or could not be reached; retried next sweep.
    Failed { detail: String },
}

/// Sweeps tracked positions against live quotes and closes any whose
/// stop-loss or take-profit level has been breached. Driven externally
/// (a scheduler or the CLI); one call is one sweep.
pub struct StopMonitor {
    coordinator: Arc<Coordinator>,
}

impl StopMonitor {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    /// Checks every tracked position once. Positions without a usable quote
    /// are skipped. A broker failure on one close does not abort the sweep;
    /// only storage trouble does, because an unrecorded trigger must never
    /// look like a checked one.
    pub async fn check_and_execute_stops(&self) -> Result<Vec<ExecutedStop>> {
        let positions = self.coordinator.tracked_positions().await;
        let mut executed = Vec::new();

        for (symbol, position) in positions {
            let Some(price) = self.coordinator.quote(&symbol).await else {
                continue;
            };

            let trigger = if price <= position.stop_loss_price {
                StopTrigger::StopLoss
            } else if price >= position.take_profit_price {
                StopTrigger::TakeProfit
            } else {
                continue;
            };

            tracing::warn!(
                %symbol,
                %price,
                %trigger,
                stop_loss = %position.stop_loss_price,
                take_profit = %position.take_profit_price,
                "Stop level breached, closing position."
            );
            self.coordinator.store().append_event(RiskEventKind::StopTriggered {
                symbol: symbol.clone(),
                trigger,
                quantity: position.quantity,
                price,
            })?;

            let request = OrderRequest::closing(symbol.clone(), position.quantity, price)?;
            let outcome = match self.coordinator.submit(request).await {
                Ok(OrderResult::Submitted { order_id, dry_run, .. }) => {
                    StopOutcome::Closed { order_id, dry_run }
                }
                Ok(OrderResult::Denied { reason }) => {
                    tracing::warn!(%symbol, %reason, "Stop close denied; will retry next sweep.");
                    StopOutcome::Denied { reason }
                }
                Err(err @ Error::Storage(_)) => return Err(err),
                Err(err) => {
                    tracing::error!(%symbol, error = %err, "Stop close failed at the broker.");
                    StopOutcome::Failed { detail: err.to_string() }
                }
            };

            executed.push(ExecutedStop {
                symbol,
                trigger,
                quantity: position.quantity,
                price,
                outcome,
            });
        }

        Ok(executed)
    }
}
