// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{AppSettings, BrokerSettings, EngineSettings, Settings, StoreSettings};

/// Loads the application settings from various sources.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
///
/// The risk policy is validated here, so a policy that violates its own
/// invariants never reaches the engine.
pub fn load_settings() -> Result<Settings> {
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        // 1. Load the base configuration file.
        .add_source(File::with_name("config/base"))
        // 2. Load the environment-specific configuration file.
        .add_source(File::with_name(&format!("config/{}", environment)).required(false))
        // 3. Load settings from environment variables (e.g., `APP_ENGINE__DRY_RUN=true`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Deserialize the configuration into our `Settings` struct.
    let settings: Settings = settings.try_deserialize()?;

    settings.risk.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_settings_file_parses_and_validates() {
        let text = r#"
            [app]
            log_level = "info"

            [engine]
            dry_run = true
            broker_timeout_secs = 5
            day_boundary_offset_hours = -5

            [store]
            data_dir = "data"

            [broker]
            starting_cash = "100000"

            [risk]
            max_single_position_pct = "0.10"
            max_total_position_pct = "0.80"
            min_cash_reserve_pct = "0.20"
            default_stop_loss_pct = "0.05"
            default_take_profit_pct = "0.15"
            daily_loss_limit_pct = "0.03"
            daily_trade_limit = 20
            min_order_value = "100"
            max_order_value = "50000"
            order_cooldown_seconds = 60
        "#;
        let settings: Settings = toml::from_str(text).unwrap();
        assert!(settings.risk.validate().is_ok());
        assert!(settings.engine.dry_run);
        assert_eq!(settings.engine.day_boundary_offset_hours, -5);
        assert_eq!(settings.risk.daily_trade_limit, 20);
        assert_eq!(settings.risk.max_trading_capital, None);
    }

    #[test]
    fn engine_section_defaults_are_safe() {
        let text = r#"
            dry_run = false
        "#;
        let engine: EngineSettings = toml::from_str(text).unwrap();
        assert_eq!(engine.broker_timeout_secs, 10);
        assert_eq!(engine.day_boundary_offset_hours, 0);
    }

    #[test]
    fn invalid_policy_is_caught_at_load() {
        let text = r#"
            max_single_position_pct = "1.50"
            max_total_position_pct = "0.80"
            min_cash_reserve_pct = "0.20"
            default_stop_loss_pct = "0.05"
            default_take_profit_pct = "0.15"
            daily_loss_limit_pct = "0.03"
            daily_trade_limit = 20
            min_order_value = "100"
            max_order_value = "50000"
            order_cooldown_seconds = 60
        "#;
        let policy: risk::RiskPolicy = toml::from_str(text).unwrap();
        assert!(policy.validate().is_err());
    }
}
