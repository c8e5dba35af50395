// In crates/engine/src/coordinator.rs

use crate::report::{PositionReport, RiskReport};
use crate::{Error, Result};
use app_config::EngineSettings;
use chrono::Utc;
use core_types::{DenialReason, OrderRequest, Side, Signal, SignalAction, Sizing, Symbol};
use events::{RiskEventKind, TradeRecord, TradeVerdict};
use gateway::{BrokerGateway, BrokerOrder};
use risk::{trading_day_for, RiskPolicy, RiskState, TrackedPosition};
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use store::RiskStore;
use tokio::sync::Mutex;

/// The outcome of one submission attempt. A denial is a normal, expected
/// outcome the caller matches on; only broker and storage trouble surface
/// as errors.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderResult {
    Submitted {
        order_id: String,
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        dry_run: bool,
    },
    Denied {
        reason: DenialReason,
    },
}

/// Orchestrates every order submission: fetches account context, asks the
/// risk evaluator for a verdict, submits (or not), and commits the outcome
/// to the state store.
///
/// The whole load-evaluate-submit-persist sequence runs under one
/// whole-state lock, so two concurrent submissions can never both pass the
/// cooldown or exposure checks against stale state. Coarser than per-symbol
/// locking, but order throughput is low and the simplicity is worth it.
pub struct Coordinator {
    policy: RiskPolicy,
    settings: EngineSettings,
    store: Arc<RiskStore>,
    gateway: Arc<dyn BrokerGateway>,
    state: Mutex<RiskState>,
}

impl Coordinator {
    /// Builds a coordinator over an opened store, reloading the persisted
    /// risk state (snapshot plus trailing events).
    pub fn new(
        policy: RiskPolicy,
        settings: EngineSettings,
        store: Arc<RiskStore>,
        gateway: Arc<dyn BrokerGateway>,
    ) -> Result<Self> {
        policy.validate()?;
        let state = store.load_state()?;
        tracing::info!(
            gateway = gateway.name(),
            dry_run = settings.dry_run,
            positions = state.tracked_positions.len(),
            "Risk engine initialized."
        );
        Ok(Self {
            policy,
            settings,
            store,
            gateway,
            state: Mutex::new(state),
        })
    }

    /// Submits a candidate order through the full risk pipeline.
    pub async fn submit(&self, request: OrderRequest) -> Result<OrderResult> {
        let mut state = self.state.lock().await;

        let now = Utc::now();
        state.roll_to_day(trading_day_for(now, self.settings.day_boundary_offset_hours));

        // Account context is fetched under the lock: the evaluation must not
        // race another submission's pending mutation.
        let account = self
            .broker_call(self.gateway.account_context(), "account_context")
            .await?;

        let verdict = risk::evaluate(&request, &account, &state, &self.policy, now);

        let (quantity, stop_loss, take_profit) = match verdict {
            core_types::Verdict::Denied { reason } => {
                tracing::warn!(symbol = %request.symbol, %reason, "Order denied by risk policy.");
                let quantity = match request.sizing {
                    Sizing::Quantity(quantity) => quantity,
                    Sizing::RiskPct(_) => Decimal::ZERO,
                };
                self.store.record_trade(&TradeRecord {
                    timestamp: now,
                    symbol: request.symbol.clone(),
                    side: request.side,
                    quantity,
                    price: request.price,
                    notional: quantity * request.price,
                    order_id: None,
                    verdict: TradeVerdict::Denied,
                    reason: reason.to_string(),
                })?;
                self.store.append_event(RiskEventKind::OrderDenied {
                    symbol: request.symbol.clone(),
                    reason_code: reason.code().to_string(),
                    detail: reason.to_string(),
                })?;
                return Ok(OrderResult::Denied { reason });
            }
            core_types::Verdict::Allowed { quantity, stop_loss, take_profit } => {
                (quantity, stop_loss, take_profit)
            }
        };

        let order_id = if self.settings.dry_run {
            let order_id = format!("dry-{}", now.timestamp_millis());
            tracing::info!(
                symbol = %request.symbol,
                side = %request.side,
                %quantity,
                price = %request.price,
                %order_id,
                "Dry run: order evaluated and logged, not sent to the broker."
            );
            order_id
        } else {
            let broker_order = BrokerOrder {
                symbol: request.symbol.clone(),
                side: request.side,
                quantity,
                price: Some(request.price),
            };
            match self
                .broker_call(self.gateway.place_order(&broker_order), "place_order")
                .await
            {
                Ok(order_id) => order_id.0,
                Err(err) => {
                    // The attempt never executed: counters and cooldowns
                    // stay untouched, but the failure itself is audited.
                    tracing::error!(symbol = %request.symbol, error = %err, "Broker submission failed.");
                    self.store.append_event(RiskEventKind::BrokerFailure {
                        symbol: request.symbol.clone(),
                        detail: err.to_string(),
                    })?;
                    self.store.record_trade(&TradeRecord {
                        timestamp: now,
                        symbol: request.symbol.clone(),
                        side: request.side,
                        quantity,
                        price: request.price,
                        notional: quantity * request.price,
                        order_id: None,
                        verdict: TradeVerdict::Failed,
                        reason: err.to_string(),
                    })?;
                    return Err(err);
                }
            }
        };

        // Commit: mutate state, then persist before reporting success.
        let committed_at = Utc::now();
        state.roll_to_day(trading_day_for(committed_at, self.settings.day_boundary_offset_hours));
        state.daily_trade_count += 1;
        state.last_order_time.insert(request.symbol.clone(), committed_at);
        let realized_pnl = state.record_fill(
            &request.symbol,
            request.side,
            quantity,
            request.price,
            stop_loss,
            take_profit,
            committed_at,
        );
        if let Some(pnl) = realized_pnl {
            state.daily_realized_pnl += pnl;
        }

        self.store.append_event(RiskEventKind::OrderAllowed {
            symbol: request.symbol.clone(),
            side: request.side,
            quantity,
            price: request.price,
            stop_loss,
            take_profit,
            realized_pnl,
        })?;
        self.store.save_snapshot(&state)?;
        self.store.record_trade(&TradeRecord {
            timestamp: committed_at,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity,
            price: request.price,
            notional: quantity * request.price,
            order_id: Some(order_id.clone()),
            verdict: if self.settings.dry_run { TradeVerdict::DryRun } else { TradeVerdict::Submitted },
            reason: String::new(),
        })?;

        tracing::info!(
            symbol = %request.symbol,
            side = %request.side,
            %quantity,
            price = %request.price,
            %order_id,
            "Order submitted and committed."
        );

        Ok(OrderResult::Submitted {
            order_id,
            symbol: request.symbol,
            side: request.side,
            quantity,
            price: request.price,
            dry_run: self.settings.dry_run,
        })
    }

    /// Convenience wrapper: sizes the order as a fraction of equity and
    /// submits it.
    pub async fn submit_by_risk_pct(
        &self,
        symbol: Symbol,
        side: Side,
        price: Decimal,
        risk_pct: Decimal,
    ) -> Result<OrderResult> {
        let request = OrderRequest::by_risk_pct(symbol, side, price, risk_pct)?;
        self.submit(request).await
    }

    /// Turns a signal from an external source into an order and submits it.
    /// Buys are sized as `risk_pct` of equity; sells close the tracked
    /// position at the signal price; holds do nothing. Returns `None` when
    /// there was nothing to submit.
    pub async fn submit_signal(
        &self,
        signal: &Signal,
        risk_pct: Decimal,
    ) -> Result<Option<OrderResult>> {
        match signal.action {
            SignalAction::Hold => {
                tracing::debug!(symbol = %signal.symbol, reason = %signal.reason, "Hold signal.");
                Ok(None)
            }
            SignalAction::Buy => {
                let request = OrderRequest::by_risk_pct(
                    signal.symbol.clone(),
                    Side::Buy,
                    signal.price,
                    risk_pct,
                )?;
                Ok(Some(self.submit(request).await?))
            }
            SignalAction::Sell => {
                let quantity = {
                    let state = self.state.lock().await;
                    state
                        .tracked_positions
                        .get(&signal.symbol)
                        .map(|position| position.quantity)
                };
                let Some(quantity) = quantity else {
                    tracing::debug!(symbol = %signal.symbol, "Sell signal for an untracked symbol, ignored.");
                    return Ok(None);
                };
                let request =
                    OrderRequest::closing(signal.symbol.clone(), quantity, signal.price)?;
                Ok(Some(self.submit(request).await?))
            }
        }
    }

    /// Halts all new submissions until [`Coordinator::resume_trading`].
    /// Idempotent beyond re-logging the event.
    pub async fn emergency_stop(&self, reason: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.emergency_stopped = true;
        self.store
            .append_event(RiskEventKind::EmergencyStop { reason: reason.to_string() })?;
        self.store.save_snapshot(&state)?;
        tracing::warn!(reason, "Emergency stop activated.");
        Ok(())
    }

    /// Clears the emergency stop and restores normal evaluation.
    pub async fn resume_trading(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.emergency_stopped = false;
        self.store.append_event(RiskEventKind::Resume)?;
        self.store.save_snapshot(&state)?;
        tracing::info!("Trading resumed.");
        Ok(())
    }

    /// A point-in-time summary of the risk state and the active policy.
    pub async fn risk_report(&self) -> RiskReport {
        let state = self.state.lock().await;
        let mut positions: Vec<PositionReport> = state
            .tracked_positions
            .iter()
            .map(|(symbol, position)| PositionReport {
                symbol: symbol.clone(),
                quantity: position.quantity,
                entry_price: position.entry_price,
                stop_loss_price: position.stop_loss_price,
                take_profit_price: position.take_profit_price,
                opened_at: position.opened_at,
            })
            .collect();
        positions.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        RiskReport {
            generated_at: Utc::now(),
            emergency_stopped: state.emergency_stopped,
            trading_day: state.trading_day,
            daily_trade_count: state.daily_trade_count,
            daily_trade_limit: self.policy.daily_trade_limit,
            daily_realized_pnl: state.daily_realized_pnl,
            daily_loss_limit_pct: self.policy.daily_loss_limit_pct,
            positions,
            policy: self.policy.clone(),
        }
    }

    /// A copy of the currently tracked positions, for the stop monitor.
    pub async fn tracked_positions(&self) -> Vec<(Symbol, TrackedPosition)> {
        let state = self.state.lock().await;
        let mut positions: Vec<_> = state
            .tracked_positions
            .iter()
            .map(|(symbol, position)| (symbol.clone(), position.clone()))
            .collect();
        positions.sort_by(|a, b| a.0.cmp(&b.0));
        positions
    }

    /// The freshest quote for a symbol, or `None` when the broker has no
    /// quote or cannot be reached. Never an error: the stop monitor skips
    /// and re-checks on the next sweep.
    pub(crate) async fn quote(&self, symbol: &Symbol) -> Option<Decimal> {
        match self.broker_call(self.gateway.price(symbol), "price").await {
            Ok(price) => price,
            Err(err) => {
                tracing::debug!(%symbol, error = %err, "Quote unavailable, skipping symbol.");
                None
            }
        }
    }

    pub(crate) fn store(&self) -> &RiskStore {
        &self.store
    }

    /// Runs one gateway call under the configured timeout. A timed-out call
    /// is a broker failure, never a silent success.
    async fn broker_call<T>(
        &self,
        call: impl Future<Output = gateway::Result<T>>,
        what: &str,
    ) -> Result<T> {
        let limit = Duration::from_secs(self.settings.broker_timeout_secs);
        match tokio::time::timeout(limit, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(gateway::Error::Rejected { reason })) => Err(Error::BrokerRejected { reason }),
            Ok(Err(gateway::Error::Unavailable { detail })) => {
                Err(Error::BrokerUnavailable { detail })
            }
            Err(_) => Err(Error::BrokerUnavailable {
                detail: format!("{what} timed out after {}s", limit.as_secs()),
            }),
        }
    }
}
