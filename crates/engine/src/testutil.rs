// In crates/engine/src/testutil.rs

use app_config::EngineSettings;
use async_trait::async_trait;
use core_types::{AccountContext, Symbol};
use gateway::{BrokerGateway, BrokerOrder, OrderId};
use risk::RiskPolicy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// How the stub answers `place_order`.
#[derive(Debug, Clone)]
pub(crate) enum PlaceMode {
    Accept,
    Reject(String),
    /// Never answers; exercises the caller's timeout.
    Hang,
}

/// A scriptable in-memory gateway for engine tests. Unlike the paper
/// gateway it never checks balances and can be told to reject or hang.
pub(crate) struct StubGateway {
    account: Mutex<AccountContext>,
    prices: Mutex<HashMap<Symbol, Decimal>>,
    mode: Mutex<PlaceMode>,
    placed: Mutex<Vec<BrokerOrder>>,
    quotes_fail: Mutex<bool>,
}

impl StubGateway {
    pub(crate) fn new(account: AccountContext) -> Self {
        Self {
            account: Mutex::new(account),
            prices: Mutex::new(HashMap::new()),
            mode: Mutex::new(PlaceMode::Accept),
            placed: Mutex::new(Vec::new()),
            quotes_fail: Mutex::new(false),
        }
    }

    pub(crate) fn set_mode(&self, mode: PlaceMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub(crate) fn set_price(&self, symbol: Symbol, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol, price);
    }

    pub(crate) fn fail_quotes(&self) {
        *self.quotes_fail.lock().unwrap() = true;
    }

    pub(crate) fn placed_orders(&self) -> Vec<BrokerOrder> {
        self.placed.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrokerGateway for StubGateway {
    fn name(&self) -> &'static str {
        "StubGateway"
    }

    async fn account_context(&self) -> gateway::Result<AccountContext> {
        Ok(self.account.lock().unwrap().clone())
    }

    async fn place_order(&self, order: &BrokerOrder) -> gateway::Result<OrderId> {
        let mode = self.mode.lock().unwrap().clone();
        match mode {
            PlaceMode::Accept => {
                let mut placed = self.placed.lock().unwrap();
                placed.push(order.clone());
                Ok(OrderId(format!("ord-{}", placed.len())))
            }
            PlaceMode::Reject(reason) => Err(gateway::Error::Rejected { reason }),
            PlaceMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(gateway::Error::Unavailable { detail: "hung".into() })
            }
        }
    }

    async fn cancel_order(&self, _order_id: &OrderId) -> gateway::Result<()> {
        Ok(())
    }

    async fn price(&self, symbol: &Symbol) -> gateway::Result<Option<Decimal>> {
        if *self.quotes_fail.lock().unwrap() {
            return Err(gateway::Error::Unavailable { detail: "quote feed down".into() });
        }
        Ok(self.prices.lock().unwrap().get(symbol).copied())
    }
}

/// 800k equity, 700k cash, no open positions.
pub(crate) fn stub_account() -> AccountContext {
    AccountContext {
        total_equity: dec!(800000),
        available_cash: dec!(700000),
        positions: HashMap::new(),
    }
}

pub(crate) fn test_policy(cooldown_seconds: u64) -> RiskPolicy {
    RiskPolicy {
        max_trading_capital: None,
        max_single_position_pct: dec!(0.10),
        max_total_position_pct: dec!(0.80),
        min_cash_reserve_pct: dec!(0.10),
        default_stop_loss_pct: dec!(0.05),
        default_take_profit_pct: dec!(0.15),
        daily_loss_limit_pct: dec!(0.03),
        daily_trade_limit: 20,
        min_order_value: dec!(100),
        max_order_value: dec!(50000),
        order_cooldown_seconds: cooldown_seconds,
    }
}

pub(crate) fn settings() -> EngineSettings {
    EngineSettings::default()
}
