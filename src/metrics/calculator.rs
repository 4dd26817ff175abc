//! Calculator for portfolio performance statistics: Sharpe ratio, MDD, VaR, beta, etc.
//!
//! Every statistic is derived from the full value timeline on each call; nothing
//! is cached between calls.

use statrs::statistics::Statistics;

use crate::error::{AllocatorError, Result};
use crate::models::{PerformanceReport, RiskRating};

/// Annual risk-free rate subtracted in the Sharpe and Sortino ratios.
pub const RISK_FREE_RATE: f64 = 0.02;

/// Steps are assumed to be daily.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Default tail probability for historical Value-at-Risk.
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.05;

/// Beta falls back to 1.0 below this many points.
pub const MIN_BETA_OBSERVATIONS: usize = 10;

/// Calculator for computing performance statistics over a value timeline.
pub struct PerformanceCalculator;

impl PerformanceCalculator {
    /// Calculate the full report for a timeline, optionally against a benchmark
    /// series of the same length.
    pub fn report(values: &[f64], benchmark: Option<&[f64]>) -> Result<PerformanceReport> {
        Self::require(values, 2, "performance report")?;

        let volatility = Self::volatility(values)?;
        let peak_value = values.iter().copied().fold(f64::MIN, f64::max);

        Ok(PerformanceReport {
            observations: values.len(),
            peak_value,
            total_return: Self::total_return(values)?,
            win_rate: Self::win_rate(values)?,
            volatility,
            sharpe_ratio: Self::sharpe_ratio(values)?,
            sortino_ratio: Self::sortino_ratio(values)?,
            max_drawdown: Self::max_drawdown(values)?,
            value_at_risk: Self::value_at_risk(values, DEFAULT_VAR_CONFIDENCE)?,
            beta: benchmark.map_or(1.0, |b| Self::beta(values, b)),
            risk_rating: RiskRating::from_volatility(volatility),
        })
    }

    /// Step returns `r_i = (v_i - v_{i-1}) / v_{i-1}` for `i >= 1`.
    ///
    /// Steps whose previous value is not positive have no defined return and
    /// are skipped.
    pub fn step_returns(values: &[f64]) -> Vec<f64> {
        values
            .windows(2)
            .filter_map(|w| {
                let (prev, curr) = (w[0], w[1]);
                if prev > 0.0 {
                    Some((curr - prev) / prev)
                } else {
                    None
                }
            })
            .collect()
    }

    /// `(v_n - v_0) / v_0`.
    pub fn total_return(values: &[f64]) -> Result<f64> {
        Self::require(values, 1, "total return")?;

        let first = values[0];
        let last = values[values.len() - 1];
        if first <= 0.0 {
            return Err(AllocatorError::invalid_argument(format!(
                "Total return needs a positive starting value, got {}",
                first
            )));
        }
        Ok((last - first) / first)
    }

    /// Annualized population standard deviation of step returns.
    pub fn volatility(values: &[f64]) -> Result<f64> {
        Self::require(values, 2, "volatility")?;

        let returns = Self::step_returns(values);
        if returns.is_empty() {
            return Ok(0.0);
        }
        Ok(returns.iter().population_std_dev() * PERIODS_PER_YEAR.sqrt())
    }

    /// `(mean(r) * 365 - rf) / volatility`, or 0 when volatility is 0.
    pub fn sharpe_ratio(values: &[f64]) -> Result<f64> {
        let volatility = Self::volatility(values)?;
        if volatility == 0.0 {
            return Ok(0.0);
        }

        let returns = Self::step_returns(values);
        let annual_return = returns.iter().mean() * PERIODS_PER_YEAR;
        Ok((annual_return - RISK_FREE_RATE) / volatility)
    }

    /// Sharpe variant that only penalizes negative returns.
    pub fn sortino_ratio(values: &[f64]) -> Result<f64> {
        Self::require(values, 2, "sortino ratio")?;

        let returns = Self::step_returns(values);
        let negative: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
        if negative.is_empty() {
            return Ok(0.0);
        }

        let downside_variance = negative.iter().map(|r| r.powi(2)).sum::<f64>() / negative.len() as f64;
        let downside_dev = downside_variance.sqrt() * PERIODS_PER_YEAR.sqrt();
        if downside_dev == 0.0 {
            return Ok(0.0);
        }

        let annual_return = returns.iter().mean() * PERIODS_PER_YEAR;
        Ok((annual_return - RISK_FREE_RATE) / downside_dev)
    }

    /// Largest `(peak_i - v_i) / peak_i` where `peak_i` is the running maximum.
    pub fn max_drawdown(values: &[f64]) -> Result<f64> {
        Self::require(values, 1, "max drawdown")?;

        let mut peak = values[0];
        let mut max_dd = 0.0f64;

        for &value in values {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (peak - value) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }

        Ok(max_dd)
    }

    /// Fraction of step returns above zero.
    pub fn win_rate(values: &[f64]) -> Result<f64> {
        Self::require(values, 2, "win rate")?;

        let returns = Self::step_returns(values);
        if returns.is_empty() {
            return Ok(0.0);
        }
        let wins = returns.iter().filter(|&&r| r > 0.0).count();
        Ok(wins as f64 / returns.len() as f64)
    }

    /// Historical VaR: `|sorted(r)[floor(n * confidence)]|`, 0 for an empty series.
    pub fn value_at_risk(values: &[f64], confidence: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AllocatorError::invalid_argument(format!(
                "VaR confidence must be within [0, 1], got {}",
                confidence
            )));
        }

        let mut returns = Self::step_returns(values);
        if returns.is_empty() {
            return Ok(0.0);
        }
        returns.sort_by(|a, b| a.total_cmp(b));

        let n = returns.len();
        let idx = ((n as f64 * confidence).floor() as usize).min(n - 1);
        Ok(returns[idx].abs())
    }

    /// Covariance of portfolio and benchmark returns over benchmark variance.
    ///
    /// Falls back to 1.0 with fewer than 10 points, mismatched lengths or a flat
    /// benchmark.
    pub fn beta(values: &[f64], benchmark: &[f64]) -> f64 {
        if values.len() < MIN_BETA_OBSERVATIONS || values.len() != benchmark.len() {
            return 1.0;
        }

        let portfolio_returns = Self::step_returns(values);
        let benchmark_returns = Self::step_returns(benchmark);
        if portfolio_returns.len() != benchmark_returns.len() || benchmark_returns.is_empty() {
            return 1.0;
        }

        let variance = benchmark_returns.iter().population_variance();
        if !variance.is_finite() || variance == 0.0 {
            return 1.0;
        }

        let covariance = portfolio_returns
            .iter()
            .population_covariance(benchmark_returns.iter());
        covariance / variance
    }

    fn require(values: &[f64], required: usize, statistic: &'static str) -> Result<()> {
        if values.len() < required {
            return Err(AllocatorError::insufficient_data(statistic, required, values.len()));
        }
        Ok(())
    }
}
