// In app/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_types::{OrderRequest, Side, Symbol};
use engine::{Coordinator, OrderResult, StopMonitor, StopOutcome};
use gateway::PaperGateway;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use store::RiskStore;
use tracing_subscriber::prelude::*;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A risk-gated order execution engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Submits an explicitly sized limit order through the risk pipeline.
    Submit {
        /// The trading symbol (e.g., "AAPL.US").
        #[arg(short, long)]
        symbol: String,

        /// "buy" or "sell".
        #[arg(long, value_parser = parse_side)]
        side: Side,

        #[arg(short, long)]
        quantity: Decimal,

        /// The limit price.
        #[arg(short, long)]
        price: Decimal,
    },

    /// Submits a buy sized as a fraction of account equity.
    SubmitPct {
        /// The trading symbol (e.g., "AAPL.US").
        #[arg(short, long)]
        symbol: String,

        /// The limit price.
        #[arg(short, long)]
        price: Decimal,

        /// Fraction of equity to commit, in (0, 1].
        #[arg(long)]
        risk_pct: Decimal,
    },

    /// Sweeps tracked positions and closes any whose stop level is breached.
    CheckStops {
        /// Quotes to feed the paper broker, as SYMBOL=PRICE. Repeatable.
        #[arg(long = "quote", value_parser = parse_quote)]
        quotes: Vec<(Symbol, Decimal)>,
    },

    /// Activates the emergency stop: all new orders are denied until resume.
    Halt {
        #[arg(long, default_value = "manual halt")]
        reason: String,
    },

    /// Clears the emergency stop.
    Resume,

    /// Prints the current risk state and policy.
    Report {
        /// Emit JSON instead of the text rendering.
        #[arg(long)]
        json: bool,
    },
}

fn parse_side(value: &str) -> std::result::Result<Side, String> {
    match value.to_ascii_lowercase().as_str() {
        "buy" => Ok(Side::Buy),
        "sell" => Ok(Side::Sell),
        other => Err(format!("invalid side '{other}', expected buy or sell")),
    }
}

fn parse_quote(value: &str) -> std::result::Result<(Symbol, Decimal), String> {
    let (symbol, price) = value
        .split_once('=')
        .ok_or_else(|| format!("invalid quote '{value}', expected SYMBOL=PRICE"))?;
    let symbol = Symbol::new(symbol).map_err(|e| e.to_string())?;
    let price = Decimal::from_str(price).map_err(|e| format!("invalid price: {e}"))?;
    Ok((symbol, price))
}

// --- Main Application Entry Point ---

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = app_config::load_settings().context("failed to load settings")?;

    let level = tracing::Level::from_str(&settings.app.log_level)
        .with_context(|| format!("invalid log level '{}'", settings.app.log_level))?;
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!("Application settings loaded successfully.");

    // --- Component Instantiation ---

    let store = Arc::new(RiskStore::open(
        &settings.store.data_dir,
        settings.engine.day_boundary_offset_hours,
    )?);

    let gateway = Arc::new(PaperGateway::new(settings.broker.starting_cash));

    if settings.engine.dry_run {
        tracing::warn!("Dry run is enabled. Orders will be evaluated and logged, never placed.");
    }

    let coordinator = Arc::new(Coordinator::new(
        settings.risk.clone(),
        settings.engine.clone(),
        store,
        gateway.clone(),
    )?);

    // The paper book lives only as long as this process; rebuild its
    // holdings from the persisted risk state so sells and stop closes work
    // across invocations.
    for (symbol, position) in coordinator.tracked_positions().await {
        gateway
            .seed_position(symbol, position.quantity, position.entry_price)
            .await;
    }

    match cli.command {
        Commands::Submit { symbol, side, quantity, price } => {
            let request =
                OrderRequest::limit(Symbol::new(&symbol)?, side, quantity, price)?;
            let result = coordinator.submit(request).await?;
            print_order_result(&result);
        }
        Commands::SubmitPct { symbol, price, risk_pct } => {
            let result = coordinator
                .submit_by_risk_pct(Symbol::new(&symbol)?, Side::Buy, price, risk_pct)
                .await?;
            print_order_result(&result);
        }
        Commands::CheckStops { quotes } => {
            for (symbol, price) in quotes {
                gateway.set_price(symbol, price).await;
            }
            let monitor = StopMonitor::new(coordinator.clone());
            let executed = monitor.check_and_execute_stops().await?;
            if executed.is_empty() {
                println!("No stop levels breached.");
            }
            for stop in executed {
                match stop.outcome {
                    StopOutcome::Closed { order_id, dry_run } => println!(
                        "{} {} triggered at {}: closed {} ({}{})",
                        stop.symbol,
                        stop.trigger,
                        stop.price,
                        stop.quantity,
                        order_id,
                        if dry_run { ", dry run" } else { "" },
                    ),
                    StopOutcome::Denied { reason } => println!(
                        "{} {} triggered at {}: close denied ({reason})",
                        stop.symbol, stop.trigger, stop.price,
                    ),
                    StopOutcome::Failed { detail } => println!(
                        "{} {} triggered at {}: close failed ({detail})",
                        stop.symbol, stop.trigger, stop.price,
                    ),
                }
            }
        }
        Commands::Halt { reason } => {
            coordinator.emergency_stop(&reason).await?;
            println!("Emergency stop active: {reason}");
        }
        Commands::Resume => {
            coordinator.resume_trading().await?;
            println!("Trading resumed.");
        }
        Commands::Report { json } => {
            let report = coordinator.risk_report().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{report}");
            }
        }
    }

    Ok(())
}

fn print_order_result(result: &OrderResult) {
    match result {
        OrderResult::Submitted { order_id, symbol, side, quantity, price, dry_run } => {
            println!(
                "Submitted: {side} {quantity} {symbol} @ {price} ({order_id}{})",
                if *dry_run { ", dry run" } else { "" },
            );
        }
        OrderResult::Denied { reason } => {
            println!("Denied: {reason}");
        }
    }
}
