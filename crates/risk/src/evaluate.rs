// In crates/risk/src/evaluate.rs

use crate::{RiskPolicy, RiskState};
use chrono::{DateTime, Utc};
use core_types::{AccountContext, DenialReason, OrderRequest, Side, Sizing, Verdict};
use rust_decimal::Decimal;

/// Evaluates a candidate order against the policy and the current risk
/// state. Pure: identical inputs always yield the identical verdict, and no
/// state mutation happens here — committing the outcome is the caller's job.
///
/// Checks run in a fixed order and short-circuit on the first failure, each
/// with its own [`DenialReason`] so callers can distinguish causes:
///
/// 1. emergency stop, 2. daily trade count, 3. daily realized loss,
/// 4. per-symbol cooldown, 5. order notional bounds, 6. single-position
/// limit, 7. total-exposure limit, 8. cash reserve.
///
/// Closing orders apply only checks 1 and 4: a close never adds exposure and
/// the daily-loss halt must not trap open risk, but the emergency stop still
/// blocks everything and the cooldown still deduplicates close attempts.
pub fn evaluate(
    request: &OrderRequest,
    account: &AccountContext,
    state: &RiskState,
    policy: &RiskPolicy,
    now: DateTime<Utc>,
) -> Verdict {
    let equity = policy.effective_equity(account.total_equity);

    // Sizing resolves first so every later check sees the real notional.
    let quantity = match request.sizing {
        Sizing::Quantity(quantity) => quantity,
        Sizing::RiskPct(risk_pct) => (risk_pct * equity / request.price).floor(),
    };
    if quantity <= Decimal::ZERO {
        return Verdict::Denied { reason: DenialReason::SizeBelowMinimum };
    }
    let notional = quantity * request.price;

    // Check 1: emergency stop overrides everything else.
    if state.emergency_stopped {
        return Verdict::Denied { reason: DenialReason::EmergencyStopActive };
    }

    // Check 4 runs for closes too; checks 2-3 and 5-8 are open-order only.
    if !request.is_close() {
        // Check 2: daily trade count.
        if state.daily_trade_count >= policy.daily_trade_limit {
            return Verdict::Denied {
                reason: DenialReason::DailyTradeLimitReached { limit: policy.daily_trade_limit },
            };
        }

        // Check 3: daily realized-loss cap halts trading for the day.
        let loss_limit = policy.daily_loss_limit_pct * equity;
        if state.daily_realized_pnl <= -loss_limit {
            return Verdict::Denied {
                reason: DenialReason::DailyLossLimitReached {
                    limit: loss_limit,
                    realized: state.daily_realized_pnl,
                },
            };
        }
    }

    // Check 4: per-symbol cooldown.
    if let Some(last) = state.last_order_time.get(&request.symbol) {
        let elapsed = (now - *last).num_seconds().max(0) as u64;
        if elapsed < policy.order_cooldown_seconds {
            return Verdict::Denied {
                reason: DenialReason::CooldownActive {
                    remaining_secs: policy.order_cooldown_seconds - elapsed,
                },
            };
        }
    }

    if !request.is_close() {
        // Check 5: order notional bounds.
        if notional < policy.min_order_value {
            return Verdict::Denied {
                reason: DenialReason::BelowMinOrderValue {
                    notional,
                    min: policy.min_order_value,
                },
            };
        }
        if notional > policy.max_order_value {
            return Verdict::Denied {
                reason: DenialReason::OrderValueExceedsLimit {
                    notional,
                    limit: policy.max_order_value,
                },
            };
        }

        // Checks 6-8 guard against growing exposure; a sell shrinks it and
        // passes them by construction, so they only run for buys.
        if request.side == Side::Buy {
            // Check 6: single-position limit.
            let single_limit = policy.max_single_position_pct * equity;
            let would_be_single = account.position_value(&request.symbol) + notional;
            if would_be_single > single_limit {
                return Verdict::Denied {
                    reason: DenialReason::SinglePositionLimitExceeded {
                        would_be: would_be_single,
                        limit: single_limit,
                    },
                };
            }

            // Check 7: total-exposure limit.
            let total_limit = policy.max_total_position_pct * equity;
            let would_be_total = account.total_position_value() + notional;
            if would_be_total > total_limit {
                return Verdict::Denied {
                    reason: DenialReason::TotalPositionLimitExceeded {
                        would_be: would_be_total,
                        limit: total_limit,
                    },
                };
            }

            // Check 8: cash reserve.
            let required_reserve = policy.min_cash_reserve_pct * equity;
            let would_remain = account.available_cash - notional;
            if would_remain < required_reserve {
                return Verdict::Denied {
                    reason: DenialReason::CashReserveBreached {
                        would_remain,
                        required: required_reserve,
                    },
                };
            }
        }
    }

    // Opening buys leave with stop levels attached: caller-supplied ones
    // win, otherwise the policy defaults around the order price.
    let (stop_loss, take_profit) = if request.side == Side::Buy && !request.is_close() {
        (
            Some(
                request
                    .stop_loss
                    .unwrap_or(request.price * (Decimal::ONE - policy.default_stop_loss_pct)),
            ),
            Some(
                request
                    .take_profit
                    .unwrap_or(request.price * (Decimal::ONE + policy.default_take_profit_pct)),
            ),
        )
    } else {
        (None, None)
    };

    Verdict::Allowed { quantity, stop_loss, take_profit }
}
