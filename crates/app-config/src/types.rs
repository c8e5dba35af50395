// In crates/app-config/src/types.rs

use risk::RiskPolicy;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// How the coordinator talks to the broker and rolls the trading day.
    pub engine: EngineSettings,
    /// Where the risk state store keeps its files.
    pub store: StoreSettings,
    /// Paper-broker settings for runs without a live brokerage.
    pub broker: BrokerSettings,
    /// The risk policy itself; validated at load, immutable afterwards.
    pub risk: RiskPolicy,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The log level for the application (e.g., "info", "debug").
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct EngineSettings {
    /// When true, orders are evaluated and logged but never sent to the
    /// broker; a synthetic order id is returned instead.
    #[serde(default)]
    pub dry_run: bool,
    /// Upper bound on any single broker call; a timeout is treated as a
    /// broker failure, never as a silent success.
    #[serde(default = "default_broker_timeout_secs")]
    pub broker_timeout_secs: u64,
    /// The broker's trading-day rollover, as a fixed offset from UTC. Daily
    /// counters reset when the day computed under this offset changes.
    #[serde(default)]
    pub day_boundary_offset_hours: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            broker_timeout_secs: default_broker_timeout_secs(),
            day_boundary_offset_hours: 0,
        }
    }
}

fn default_broker_timeout_secs() -> u64 {
    10
}

#[derive(Deserialize, Debug, Clone)]
pub struct StoreSettings {
    /// Directory holding `events.jsonl`, `trades.jsonl` and
    /// `risk_state.json`.
    pub data_dir: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrokerSettings {
    /// Opening cash balance for the paper gateway.
    pub starting_cash: rust_decimal::Decimal,
}
