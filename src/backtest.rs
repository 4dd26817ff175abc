//! Backtesting engine for validating allocation strategies against historical snapshots.
//!
//! Each snapshot goes through three phases, strictly in order:
//! - Decide: buy on positive momentum, otherwise trim the first holding whose
//!   risk exceeds the strategy's tolerance, otherwise hold
//! - Execute: move cash and holdings at the snapshot's prices
//! - Value: mark holdings to market and append to the value timeline
//!
//! Runs never read the wall clock, so identical inputs replay identically.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AllocatorError, Result};
use crate::metrics::PerformanceCalculator;
use crate::models::{MarketSnapshot, PerformanceReport, SimulatedTrade, TradeSide};
use crate::trading::{Allocator, RiskScorer, StrategyProfile, StrategyRegistry};

/// Decision policy constants.
#[derive(Debug, Clone)]
pub struct BacktestPolicy {
    /// Momentum must exceed this for a buy
    pub momentum_threshold: f64,

    /// Largest quantity bought in one step
    pub max_buy_quantity: Decimal,

    /// Fraction of available cash committed per buy
    pub buy_cash_fraction: Decimal,

    /// Fraction of a holding sold when its risk is too high
    pub sell_fraction: Decimal,
}

impl Default for BacktestPolicy {
    fn default() -> Self {
        Self {
            momentum_threshold: 0.05,
            max_buy_quantity: dec!(1000),
            buy_cash_fraction: dec!(0.1),
            sell_fraction: dec!(0.5),
        }
    }
}

/// Units held in one protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub protocol: String,
    pub quantity: Decimal,
}

/// Portfolio value recorded after each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub timestamp: DateTime<Utc>,
    pub cash_capital: Decimal,
    pub holdings_value: Decimal,
    pub total_value: Decimal,
}

/// Mutable state of one run. Never shared between runs.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub cash_capital: Decimal,

    /// Holdings in first-acquired order
    pub holdings: Vec<Holding>,

    pub value_timeline: Vec<ValuePoint>,

    /// Append-only
    pub trade_log: Vec<SimulatedTrade>,

    /// Decisions that could not execute (no price, not enough cash)
    pub skipped_trades: usize,
}

impl SimulationState {
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            cash_capital: initial_capital,
            holdings: Vec::new(),
            value_timeline: Vec::new(),
            trade_log: Vec::new(),
            skipped_trades: 0,
        }
    }

    /// Mark holdings to the snapshot's prices; unpriced holdings count as zero.
    pub fn holdings_value(&self, snapshot: &MarketSnapshot) -> Result<Decimal> {
        self.holdings.iter().try_fold(Decimal::ZERO, |total, h| {
            let value = match snapshot.price_for(&h.protocol) {
                Some(price) => notional(snapshot, &h.protocol, h.quantity, price)?,
                None => Decimal::ZERO,
            };
            total
                .checked_add(value)
                .ok_or_else(|| overflow(snapshot, "holdings value"))
        })
    }

    fn buy(&mut self, snapshot: &MarketSnapshot, protocol: &str, quantity: Decimal) -> Result<()> {
        let Some(price) = snapshot.price_for(protocol) else {
            debug!(protocol = %protocol, "No price, buy skipped");
            self.skipped_trades += 1;
            return Ok(());
        };

        let cost = notional(snapshot, protocol, quantity, price)?;
        if cost > self.cash_capital {
            debug!(
                protocol = %protocol,
                cost = %cost,
                cash = %self.cash_capital,
                "Insufficient cash, buy skipped"
            );
            self.skipped_trades += 1;
            return Ok(());
        }

        self.cash_capital -= cost;
        match self.holdings.iter_mut().find(|h| h.protocol == protocol) {
            Some(holding) => holding.quantity += quantity,
            None => self.holdings.push(Holding {
                protocol: protocol.to_string(),
                quantity,
            }),
        }

        self.record(snapshot, TradeSide::Buy, protocol, quantity, price, cost);
        Ok(())
    }

    fn sell(&mut self, snapshot: &MarketSnapshot, protocol: &str, quantity: Decimal) -> Result<()> {
        let Some(price) = snapshot.price_for(protocol) else {
            debug!(protocol = %protocol, "No price, sell skipped");
            self.skipped_trades += 1;
            return Ok(());
        };
        let Some(held) = self
            .holdings
            .iter()
            .find(|h| h.protocol == protocol)
            .map(|h| h.quantity)
        else {
            return Ok(());
        };

        let quantity = quantity.min(held);
        let proceeds = notional(snapshot, protocol, quantity, price)?;
        self.cash_capital = self
            .cash_capital
            .checked_add(proceeds)
            .ok_or_else(|| overflow(snapshot, "cash after sell"))?;
        if let Some(holding) = self.holdings.iter_mut().find(|h| h.protocol == protocol) {
            holding.quantity -= quantity;
        }

        self.record(snapshot, TradeSide::Sell, protocol, quantity, price, proceeds);
        Ok(())
    }

    fn record(
        &mut self,
        snapshot: &MarketSnapshot,
        side: TradeSide,
        protocol: &str,
        quantity: Decimal,
        price: Decimal,
        notional: Decimal,
    ) {
        debug!(
            side = %side,
            protocol = %protocol,
            quantity = %quantity,
            price = %price,
            "Executed simulated trade"
        );

        self.trade_log.push(SimulatedTrade {
            timestamp: snapshot.timestamp,
            side,
            protocol: protocol.to_string(),
            quantity,
            price,
            notional,
            cash_after: self.cash_capital,
        });
    }

    fn mark(&mut self, snapshot: &MarketSnapshot) -> Result<()> {
        let holdings_value = self.holdings_value(snapshot)?;
        let total_value = self
            .cash_capital
            .checked_add(holdings_value)
            .ok_or_else(|| overflow(snapshot, "portfolio value"))?;

        self.value_timeline.push(ValuePoint {
            timestamp: snapshot.timestamp,
            cash_capital: self.cash_capital,
            holdings_value,
            total_value,
        });
        Ok(())
    }
}

/// `quantity * price`, rejecting values outside the decimal range.
fn notional(
    snapshot: &MarketSnapshot,
    protocol: &str,
    quantity: Decimal,
    price: Decimal,
) -> Result<Decimal> {
    quantity.checked_mul(price).ok_or_else(|| {
        AllocatorError::invalid_argument(format!(
            "Value of {} {} at price {} overflows at {}",
            quantity, protocol, price, snapshot.timestamp
        ))
    })
}

fn overflow(snapshot: &MarketSnapshot, what: &str) -> AllocatorError {
    AllocatorError::invalid_argument(format!("{} overflows at {}", what, snapshot.timestamp))
}

/// What the policy chose for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Buy { protocol: String, quantity: Decimal },
    Sell { protocol: String, quantity: Decimal },
    Hold,
}

/// Backtest results summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub strategy_name: String,

    /// Starting cash
    pub initial_capital: Decimal,

    /// Total value after the last snapshot
    pub final_capital: Decimal,

    /// (final - initial) / initial
    pub total_return: f64,

    /// Maximum drawdown over the value timeline
    pub max_drawdown: f64,

    /// Annualized Sharpe ratio over the value timeline
    pub sharpe_ratio: f64,

    pub buy_count: usize,
    pub sell_count: usize,

    /// Decisions that could not execute
    pub skipped_trades: usize,

    /// Every executed trade, in order
    pub trade_log: Vec<SimulatedTrade>,

    /// One point per snapshot
    pub value_timeline: Vec<ValuePoint>,

    /// Full statistics for the timeline
    pub performance: PerformanceReport,

    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl SimulationResult {
    /// Total values of the timeline as floats.
    pub fn values(&self) -> Vec<f64> {
        self.value_timeline
            .iter()
            .map(|p| p.total_value.to_f64().unwrap_or(0.0))
            .collect()
    }

    /// Recompute statistics against a benchmark series of equal length.
    pub fn report_against(&self, benchmark: &[f64]) -> Result<PerformanceReport> {
        PerformanceCalculator::report(&self.values(), Some(benchmark))
    }
}

impl std::fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^60}", format!(" BACKTEST: {} ", self.strategy_name.to_uppercase()))?;
        writeln!(f)?;
        writeln!(f, "Period: {} to {} ({} steps)",
            self.start_time.format("%Y-%m-%d"),
            self.end_time.format("%Y-%m-%d"),
            self.value_timeline.len())?;
        writeln!(f)?;
        writeln!(f, "--- Capital ---")?;
        writeln!(f, "Initial:     ${:.2}", self.initial_capital)?;
        writeln!(f, "Final:       ${:.2}", self.final_capital)?;
        writeln!(f, "Return:      {:.2}%", self.total_return * 100.0)?;
        writeln!(f)?;
        writeln!(f, "--- Trades ---")?;
        writeln!(f, "Total:       {} ({} skipped)", self.trade_log.len(), self.skipped_trades)?;
        writeln!(f, "Buys:        {}", self.buy_count)?;
        writeln!(f, "Sells:       {}", self.sell_count)?;
        writeln!(f)?;
        write!(f, "{}", self.performance)?;
        writeln!(f, "{:=^60}", "")?;
        Ok(())
    }
}

/// Backtesting engine.
pub struct Backtester {
    registry: Arc<StrategyRegistry>,
    policy: BacktestPolicy,
    scorer: RiskScorer,
}

impl Backtester {
    /// Create a backtester with the default policy and the simulation risk model.
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self::with_policy(registry, BacktestPolicy::default())
    }

    pub fn with_policy(registry: Arc<StrategyRegistry>, policy: BacktestPolicy) -> Self {
        Self {
            registry,
            policy,
            scorer: RiskScorer::simulation(),
        }
    }

    /// Replay `snapshots` under a strategy starting from `initial_capital`.
    pub fn run(
        &self,
        strategy_name: &str,
        snapshots: &[MarketSnapshot],
        initial_capital: Decimal,
    ) -> Result<SimulationResult> {
        let profile = self.registry.get(strategy_name)?;
        Self::validate_inputs(snapshots, initial_capital)?;

        info!(
            strategy = %profile.name,
            steps = snapshots.len(),
            capital = %initial_capital,
            "Starting backtest"
        );

        let mut state = SimulationState::new(initial_capital);

        for snapshot in snapshots {
            match self.decide(profile, &state, snapshot) {
                Decision::Buy { protocol, quantity } => state.buy(snapshot, &protocol, quantity)?,
                Decision::Sell { protocol, quantity } => state.sell(snapshot, &protocol, quantity)?,
                Decision::Hold => {}
            }
            state.mark(snapshot)?;
        }

        let result = self.summarize(profile, initial_capital, state)?;

        info!(
            strategy = %result.strategy_name,
            final_capital = %result.final_capital,
            trades = result.trade_log.len(),
            sharpe = result.sharpe_ratio,
            "Backtest complete"
        );

        Ok(result)
    }

    /// Apply the decision policy to one snapshot.
    pub fn decide(
        &self,
        profile: &StrategyProfile,
        state: &SimulationState,
        snapshot: &MarketSnapshot,
    ) -> Decision {
        if let Some(momentum) = snapshot.momentum() {
            if momentum > self.policy.momentum_threshold {
                let ranked = Allocator::rank(profile, &snapshot.protocols, &self.scorer);
                if let Some(best) = ranked.first() {
                    let quantity = self
                        .policy
                        .max_buy_quantity
                        .min(state.cash_capital * self.policy.buy_cash_fraction);

                    if best.opportunity.annual_yield >= profile.min_annual_yield
                        && quantity > Decimal::ZERO
                    {
                        debug!(
                            protocol = %best.opportunity.name,
                            momentum,
                            quantity = %quantity,
                            "Buy signal"
                        );
                        return Decision::Buy {
                            protocol: best.opportunity.name.clone(),
                            quantity,
                        };
                    }
                }
            }
        }

        for holding in &state.holdings {
            if holding.quantity <= Decimal::ZERO || snapshot.price_for(&holding.protocol).is_none() {
                continue;
            }
            let Some(record) = snapshot.protocol(&holding.protocol) else {
                continue;
            };

            let risk = self.scorer.score(record);
            if risk > profile.risk_tolerance {
                debug!(
                    protocol = %holding.protocol,
                    risk,
                    tolerance = profile.risk_tolerance,
                    "Risk above tolerance, sell signal"
                );
                return Decision::Sell {
                    protocol: holding.protocol.clone(),
                    quantity: holding.quantity * self.policy.sell_fraction,
                };
            }
        }

        Decision::Hold
    }

    fn validate_inputs(snapshots: &[MarketSnapshot], initial_capital: Decimal) -> Result<()> {
        if initial_capital <= Decimal::ZERO {
            return Err(AllocatorError::invalid_argument(format!(
                "Initial capital must be positive, got {}",
                initial_capital
            )));
        }
        if snapshots.is_empty() {
            return Err(AllocatorError::invalid_argument("No snapshots to replay"));
        }

        if let Some(idx) = snapshots
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(AllocatorError::invalid_argument(format!(
                "Snapshots out of order: {} follows {}",
                snapshots[idx + 1].timestamp, snapshots[idx].timestamp
            )));
        }

        for snapshot in snapshots {
            if let Some((name, price)) = snapshot.prices.iter().find(|(_, p)| **p < Decimal::ZERO) {
                return Err(AllocatorError::invalid_argument(format!(
                    "Negative price {} for {} at {}",
                    price, name, snapshot.timestamp
                )));
            }
        }

        Ok(())
    }

    fn summarize(
        &self,
        profile: &StrategyProfile,
        initial_capital: Decimal,
        state: SimulationState,
    ) -> Result<SimulationResult> {
        let values: Vec<f64> = state
            .value_timeline
            .iter()
            .map(|p| p.total_value.to_f64().unwrap_or(0.0))
            .collect();
        let performance = PerformanceCalculator::report(&values, None)?;

        let final_capital = state
            .value_timeline
            .last()
            .map(|p| p.total_value)
            .unwrap_or(initial_capital);
        let total_return = (final_capital - initial_capital)
            .checked_div(initial_capital)
            .and_then(|r| r.to_f64())
            .ok_or_else(|| {
                AllocatorError::invalid_argument(format!(
                    "Total return of {} from {} overflows",
                    final_capital, initial_capital
                ))
            })?;

        let buy_count = state.trade_log.iter().filter(|t| t.side == TradeSide::Buy).count();
        let sell_count = state.trade_log.len() - buy_count;

        let start_time = state.value_timeline.first().map(|p| p.timestamp).unwrap_or_default();
        let end_time = state.value_timeline.last().map(|p| p.timestamp).unwrap_or_default();

        Ok(SimulationResult {
            strategy_name: profile.name.clone(),
            initial_capital,
            final_capital,
            total_return,
            max_drawdown: performance.max_drawdown,
            sharpe_ratio: performance.sharpe_ratio,
            buy_count,
            sell_count,
            skipped_trades: state.skipped_trades,
            trade_log: state.trade_log,
            value_timeline: state.value_timeline,
            performance,
            start_time,
            end_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::models::Opportunity;

    fn backtester() -> Backtester {
        Backtester::new(Arc::new(StrategyRegistry::with_builtin()))
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn safe(name: &str, family: &str) -> Opportunity {
        Opportunity::new(name, family, 0.04)
            .with_tvl(dec!(2000000000))
            .with_audit(true)
            .with_age(1000)
    }

    fn scenario() -> Vec<MarketSnapshot> {
        vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "compound"))
                .with_price("A", dec!(2)),
            MarketSnapshot::new(day(1))
                .with_protocol(safe("A", "compound"))
                .with_price("A", dec!(2.5)),
            MarketSnapshot::new(day(2))
                .with_protocol(safe("A", "compound").with_audit(false))
                .with_price("A", dec!(2)),
        ]
    }

    #[test]
    fn test_buy_hold_sell_cycle() {
        let result = backtester().run("conservative", &scenario(), dec!(10000)).unwrap();

        assert_eq!(result.trade_log.len(), 2);

        let buy = &result.trade_log[0];
        assert_eq!(buy.side, TradeSide::Buy);
        assert_eq!(buy.quantity, dec!(1000));
        assert_eq!(buy.notional, dec!(2000));
        assert_eq!(buy.cash_after, dec!(8000));

        // Risk 0.3 is not above the conservative tolerance of 0.3: hold on day 1
        let sell = &result.trade_log[1];
        assert_eq!(sell.side, TradeSide::Sell);
        assert_eq!(sell.timestamp, day(2));
        assert_eq!(sell.quantity, dec!(500));
        assert_eq!(sell.notional, dec!(1000));

        let totals: Vec<_> = result.value_timeline.iter().map(|p| p.total_value).collect();
        assert_eq!(totals, vec![dec!(10000), dec!(10500), dec!(10000)]);
        assert_eq!(result.final_capital, dec!(10000));
        assert_eq!(result.total_return, 0.0);
        assert!((result.max_drawdown - 500.0 / 10500.0).abs() < 1e-12);
        assert_eq!(result.buy_count, 1);
        assert_eq!(result.sell_count, 1);
    }

    #[test]
    fn test_timeline_invariant() {
        let result = backtester().run("conservative", &scenario(), dec!(10000)).unwrap();
        for point in &result.value_timeline {
            assert_eq!(point.total_value, point.cash_capital + point.holdings_value);
        }
    }

    #[test]
    fn test_buy_quantity_uses_cash_fraction() {
        let result = backtester().run("conservative", &scenario(), dec!(5000)).unwrap();
        assert_eq!(result.trade_log[0].quantity, dec!(500));
    }

    #[test]
    fn test_insufficient_cash_is_skipped() {
        let snapshots = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.2)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(50)),
            MarketSnapshot::new(day(1)).with_price("A", dec!(50)),
        ];

        // 1000 units * 50 = 50000 > 10000 cash
        let result = backtester().run("conservative", &snapshots, dec!(10000)).unwrap();
        assert!(result.trade_log.is_empty());
        assert_eq!(result.skipped_trades, 1);
        assert_eq!(result.final_capital, dec!(10000));
    }

    #[test]
    fn test_no_momentum_holds() {
        let mut snapshots = scenario();
        snapshots[0].signals = None;

        let result = backtester().run("conservative", &snapshots, dec!(10000)).unwrap();
        assert!(result.trade_log.is_empty());
        assert_eq!(result.sharpe_ratio, 0.0);
        assert_eq!(result.max_drawdown, 0.0);
    }

    #[test]
    fn test_momentum_at_threshold_does_not_buy() {
        let mut snapshots = scenario();
        snapshots[0] = snapshots[0].clone().with_momentum(0.05);

        let result = backtester().run("conservative", &snapshots, dec!(10000)).unwrap();
        assert!(result.trade_log.is_empty());
    }

    #[test]
    fn test_sell_follows_acquisition_order() {
        let snapshots = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(1)),
            MarketSnapshot::new(day(1))
                .with_momentum(0.1)
                .with_protocol(safe("B", "compound"))
                .with_price("A", dec!(1))
                .with_price("B", dec!(1)),
            MarketSnapshot::new(day(2))
                .with_protocol(safe("B", "compound").with_age(10))
                .with_protocol(safe("A", "aave").with_age(10))
                .with_price("A", dec!(1))
                .with_price("B", dec!(1)),
        ];

        let result = backtester().run("conservative", &snapshots, dec!(100000)).unwrap();

        assert_eq!(result.trade_log.len(), 3);
        assert_eq!(result.trade_log[2].side, TradeSide::Sell);
        assert_eq!(result.trade_log[2].protocol, "A");
    }

    #[test]
    fn test_sell_skips_unpriced_and_unrecorded_holdings() {
        let snapshots = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(1)),
            MarketSnapshot::new(day(1))
                .with_momentum(0.1)
                .with_protocol(safe("B", "compound"))
                .with_price("A", dec!(1))
                .with_price("B", dec!(1)),
            // A is over tolerance but has no price
            MarketSnapshot::new(day(2))
                .with_protocol(safe("A", "aave").with_age(10))
                .with_protocol(safe("B", "compound").with_age(10))
                .with_price("B", dec!(1)),
            // A is priced but has no record
            MarketSnapshot::new(day(3))
                .with_protocol(safe("B", "compound").with_age(10))
                .with_price("A", dec!(1))
                .with_price("B", dec!(1)),
        ];

        let result = backtester().run("conservative", &snapshots, dec!(100000)).unwrap();

        assert_eq!(result.trade_log.len(), 4);
        assert_eq!(result.skipped_trades, 0);
        for trade in &result.trade_log[2..] {
            assert_eq!(trade.side, TradeSide::Sell);
            assert_eq!(trade.protocol, "B");
        }
        assert_eq!(result.trade_log[2].quantity, dec!(500));
        assert_eq!(result.trade_log[3].quantity, dec!(250));
    }

    #[test]
    fn test_failed_buy_does_not_fall_through_to_sell() {
        let snapshots = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(1)),
            MarketSnapshot::new(day(1))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave").with_age(10))
                .with_protocol(safe("C", "compound"))
                .with_price("A", dec!(1))
                .with_price("C", dec!(1000000)),
        ];

        let bt = backtester();
        let profile = StrategyProfile::conservative();
        let mut state = SimulationState::new(dec!(9000));
        state.holdings.push(Holding {
            protocol: "A".to_string(),
            quantity: dec!(1000),
        });
        assert_eq!(
            bt.decide(&profile, &state, &snapshots[1]),
            Decision::Buy {
                protocol: "C".to_string(),
                quantity: dec!(900),
            }
        );

        // 900 units of C cost 900M: the buy is skipped and A is kept whole
        let result = bt.run("conservative", &snapshots, dec!(10000)).unwrap();
        assert_eq!(result.trade_log.len(), 1);
        assert_eq!(result.sell_count, 0);
        assert_eq!(result.skipped_trades, 1);
        assert_eq!(result.final_capital, dec!(10000));
    }

    #[test]
    fn test_price_overflow_is_an_error() {
        let huge = Decimal::from_i128_with_scale(10i128.pow(26), 0);

        let revalued = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(1)),
            MarketSnapshot::new(day(1)).with_price("A", huge),
        ];
        let err = backtester().run("conservative", &revalued, dec!(10000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));

        let bought = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", huge),
            MarketSnapshot::new(day(1)),
        ];
        let err = backtester().run("conservative", &bought, dec!(10000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_price_values_holding_at_zero() {
        let snapshots = vec![
            MarketSnapshot::new(day(0))
                .with_momentum(0.1)
                .with_protocol(safe("A", "aave"))
                .with_price("A", dec!(1)),
            MarketSnapshot::new(day(1)),
        ];

        let result = backtester().run("conservative", &snapshots, dec!(10000)).unwrap();

        let last = result.value_timeline.last().unwrap();
        assert_eq!(last.holdings_value, Decimal::ZERO);
        assert_eq!(last.total_value, dec!(9000));
        assert!((result.max_drawdown - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_input_errors() {
        let bt = backtester();

        let err = bt.run("ultraggressive", &scenario(), dec!(1000)).unwrap_err();
        assert!(matches!(err, AllocatorError::Configuration(_)));

        let err = bt.run("moderate", &scenario(), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));

        let err = bt.run("moderate", &[], dec!(1000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));

        let mut reversed = scenario();
        reversed.reverse();
        let err = bt.run("moderate", &reversed, dec!(1000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));

        let negative = vec![
            MarketSnapshot::new(day(0)).with_price("A", dec!(-1)),
            MarketSnapshot::new(day(1)),
        ];
        let err = bt.run("moderate", &negative, dec!(1000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InvalidArgument(_)));
    }

    #[test]
    fn test_single_snapshot_is_insufficient() {
        let snapshots = vec![scenario().remove(0)];
        let err = backtester().run("conservative", &snapshots, dec!(1000)).unwrap_err();
        assert!(matches!(err, AllocatorError::InsufficientData { .. }));
    }

    #[test]
    fn test_equal_timestamps_are_allowed() {
        let snapshots = vec![MarketSnapshot::new(day(0)), MarketSnapshot::new(day(0))];
        assert!(backtester().run("moderate", &snapshots, dec!(1000)).is_ok());
    }

    #[test]
    fn test_deterministic_replay() {
        let snapshots = scenario();
        let bt = backtester();

        let first = bt.run("conservative", &snapshots, dec!(10000)).unwrap();
        let second = bt.run("conservative", &snapshots, dec!(10000)).unwrap();

        assert_eq!(first.trade_log, second.trade_log);
        assert_eq!(first.value_timeline, second.value_timeline);
        assert_eq!(
            serde_json::to_string(&first.trade_log).unwrap(),
            serde_json::to_string(&second.trade_log).unwrap()
        );
    }

    #[test]
    fn test_report_against_benchmark_short_series() {
        let result = backtester().run("conservative", &scenario(), dec!(10000)).unwrap();
        let report = result.report_against(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(report.beta, 1.0);
        assert_eq!(report.max_drawdown, result.max_drawdown);
    }
}
