//! Yield Allocator CLI
//!
//! Builds risk-aware allocations across yield protocols and backtests
//! strategies against historical snapshots.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use yield_allocator::models::{MarketSnapshot, Opportunity};
use yield_allocator::runner::run_strategies;
use yield_allocator::{Allocator, Backtester, StrategyRegistry};

/// Yield allocation and backtesting CLI.
#[derive(Parser)]
#[command(name = "yield-allocator")]
#[command(about = "Allocate capital across yield protocols and backtest strategies", long_about = None)]
struct Cli {
    /// Extra strategy profiles (JSON array)
    #[arg(short, long, env = "YIELD_ALLOCATOR_PROFILES")]
    profiles: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "YIELD_ALLOCATOR_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered strategy profiles
    Strategies,

    /// Split an amount across opportunities
    Allocate {
        /// Strategy profile name
        #[arg(short, long, default_value = "moderate")]
        strategy: String,

        /// Amount to allocate
        #[arg(short, long)]
        amount: f64,

        /// Opportunities file (JSON array)
        #[arg(short, long)]
        opportunities: PathBuf,
    },

    /// Replay historical snapshots under one or all strategies
    Backtest {
        /// Strategy profile name
        #[arg(short, long, default_value = "moderate")]
        strategy: String,

        /// Initial capital for simulation
        #[arg(short, long, default_value = "10000")]
        capital: f64,

        /// Snapshots file (JSON array, oldest first)
        #[arg(long)]
        snapshots: PathBuf,

        /// Benchmark value series (JSON array, one value per snapshot)
        #[arg(long)]
        benchmark: Option<PathBuf>,

        /// Backtest every registered strategy
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut registry = StrategyRegistry::with_builtin();
    if let Some(path) = &cli.profiles {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read profiles from {}", path.display()))?;
        registry.load_json(&json)?;
    }
    let registry = Arc::new(registry);

    match cli.command {
        Commands::Strategies => {
            println!(
                "\n{:<16} {:>6} {:>8} {:>8} {:>8}  {}",
                "NAME", "RISK", "MIN APY", "MAX %", "REBAL", "FAMILIES"
            );
            println!("{}", "-".repeat(80));

            for profile in registry.iter() {
                let families: Vec<_> = profile.allowed_protocol_families.iter().cloned().collect();
                println!(
                    "{:<16} {:>6.2} {:>7.1}% {:>7}% {:>8}  {}",
                    profile.name,
                    profile.risk_tolerance,
                    profile.min_annual_yield * 100.0,
                    profile.max_single_allocation_share * Decimal::from(100),
                    profile.rebalance_frequency.as_str(),
                    families.join(", ")
                );
            }
        }

        Commands::Allocate {
            strategy,
            amount,
            opportunities,
        } => {
            let opportunities: Vec<Opportunity> = read_json(&opportunities)?;
            info!(
                strategy = %strategy,
                amount = amount,
                candidates = opportunities.len(),
                "Building allocation"
            );

            let allocator = Allocator::new(Arc::clone(&registry));
            let result = allocator.optimize(&strategy, &opportunities, Decimal::try_from(amount)?)?;
            println!("{}", result);
        }

        Commands::Backtest {
            strategy,
            capital,
            snapshots,
            benchmark,
            all,
        } => {
            let snapshots: Vec<MarketSnapshot> = read_json(&snapshots)?;
            let benchmark: Option<Vec<f64>> = benchmark
                .as_deref()
                .map(read_json::<Vec<f64>>)
                .transpose()?;
            let capital = Decimal::try_from(capital)?;

            let strategies: Vec<String> = if all {
                registry.names().into_iter().map(String::from).collect()
            } else {
                vec![strategy]
            };

            info!(
                strategies = strategies.len(),
                steps = snapshots.len(),
                capital = %capital,
                "Starting backtest"
            );

            let backtester = Arc::new(Backtester::new(Arc::clone(&registry)));
            let outcomes = run_strategies(backtester, strategies, Arc::new(snapshots), capital).await?;

            for (name, outcome) in outcomes {
                match outcome {
                    Ok(result) => {
                        println!("{}", result);
                        if let Some(series) = &benchmark {
                            let report = result.report_against(series)?;
                            println!("Beta vs benchmark: {:.2}", report.beta);
                        }
                    }
                    Err(e) => println!("{}: backtest failed: {}", name, e),
                }
            }
        }
    }

    Ok(())
}

/// Read and parse a JSON input file.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
