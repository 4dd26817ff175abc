//! Parallel backtests: one independent run per strategy on the blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::backtest::{Backtester, SimulationResult};
use crate::error::AllocatorError;
use crate::models::MarketSnapshot;

/// Outcome of one strategy's run.
pub type StrategyOutcome = (String, std::result::Result<SimulationResult, AllocatorError>);

/// Run every strategy over the same snapshots concurrently.
///
/// Each run owns its own state. Outcomes come back in the order of
/// `strategies`, whatever order the runs finish in.
pub async fn run_strategies(
    backtester: Arc<Backtester>,
    strategies: Vec<String>,
    snapshots: Arc<Vec<MarketSnapshot>>,
    initial_capital: Decimal,
) -> Result<Vec<StrategyOutcome>> {
    info!(count = strategies.len(), "Launching parallel backtests");

    let handles = strategies.into_iter().map(|strategy| {
        let backtester = Arc::clone(&backtester);
        let snapshots = Arc::clone(&snapshots);
        tokio::task::spawn_blocking(move || {
            let outcome = backtester.run(&strategy, &snapshots, initial_capital);
            if let Err(e) = &outcome {
                warn!(strategy = %strategy, error = %e, "Backtest failed");
            }
            (strategy, outcome)
        })
    });

    join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.context("Backtest task panicked"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::models::Opportunity;
    use crate::trading::StrategyRegistry;

    fn snapshots() -> Vec<MarketSnapshot> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        (0..5)
            .map(|i| {
                MarketSnapshot::new(start + Duration::days(i))
                    .with_momentum(if i % 2 == 0 { 0.1 } else { 0.0 })
                    .with_protocol(
                        Opportunity::new("curve-3pool", "curve", 0.12)
                            .with_tvl(dec!(800000000))
                            .with_audit(true)
                            .with_age(700),
                    )
                    .with_price("curve-3pool", Decimal::from(10 + i))
            })
            .collect()
    }

    #[test]
    fn test_outcomes_keep_input_order() {
        let backtester = Arc::new(Backtester::new(Arc::new(StrategyRegistry::with_builtin())));
        let strategies = vec![
            "aggressive".to_string(),
            "unknown".to_string(),
            "conservative".to_string(),
        ];

        let outcomes = tokio_test::block_on(run_strategies(
            backtester,
            strategies,
            Arc::new(snapshots()),
            dec!(10000),
        ))
        .unwrap();

        let names: Vec<_> = outcomes.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["aggressive", "unknown", "conservative"]);
        assert!(outcomes[0].1.is_ok());
        assert!(matches!(outcomes[1].1, Err(AllocatorError::Configuration(_))));

        // Conservative does not allow curve: nothing traded
        let conservative = outcomes[2].1.as_ref().unwrap();
        assert!(conservative.trade_log.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let registry = Arc::new(StrategyRegistry::with_builtin());
        let backtester = Arc::new(Backtester::new(Arc::clone(&registry)));
        let data = snapshots();

        let sequential = backtester.run("moderate", &data, dec!(5000)).unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let outcomes = runtime
            .block_on(run_strategies(
                Arc::clone(&backtester),
                vec!["moderate".to_string()],
                Arc::new(data),
                dec!(5000),
            ))
            .unwrap();

        let parallel = outcomes[0].1.as_ref().unwrap();
        assert_eq!(parallel.trade_log, sequential.trade_log);
        assert_eq!(parallel.value_timeline, sequential.value_timeline);
    }
}
