//! Portfolio performance statistics: return, volatility, Sharpe, drawdown, VaR, beta.

use serde::{Deserialize, Serialize};

/// Qualitative risk bucket derived from annualized volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskRating {
    Low,
    Medium,
    High,
}

impl RiskRating {
    /// Bucket an annualized volatility: < 0.1 Low, < 0.3 Medium, else High.
    pub fn from_volatility(volatility: f64) -> Self {
        if volatility < 0.1 {
            Self::Low
        } else if volatility < 0.3 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for RiskRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Performance statistics recomputed from a full value timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Number of points in the timeline
    pub observations: usize,

    /// Highest value reached
    pub peak_value: f64,

    // === Return ===
    /// (last - first) / first
    pub total_return: f64,

    /// Fraction of steps with a positive return (0.0 to 1.0)
    pub win_rate: f64,

    // === Risk ===
    /// Annualized population standard deviation of step returns
    pub volatility: f64,

    /// Annualized Sharpe ratio net of the risk-free rate
    pub sharpe_ratio: f64,

    /// Sortino ratio (downside deviation only)
    pub sortino_ratio: f64,

    /// Maximum peak-to-trough decline (0.0 to 1.0)
    pub max_drawdown: f64,

    /// Historical Value-at-Risk at 5%
    pub value_at_risk: f64,

    /// Sensitivity to the benchmark (1.0 when not measurable)
    pub beta: f64,

    pub risk_rating: RiskRating,
}

impl std::fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "--- Performance ---")?;
        writeln!(f, "Total Return:  {:.2}%", self.total_return * 100.0)?;
        writeln!(f, "Win Rate:      {:.1}%", self.win_rate * 100.0)?;
        writeln!(f, "Volatility:    {:.2}% ({})", self.volatility * 100.0, self.risk_rating)?;
        writeln!(f, "Sharpe Ratio:  {:.2}", self.sharpe_ratio)?;
        writeln!(f, "Sortino Ratio: {:.2}", self.sortino_ratio)?;
        writeln!(f, "Max Drawdown:  {:.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "VaR (95%):     {:.2}%", self.value_at_risk * 100.0)?;
        writeln!(f, "Beta:          {:.2}", self.beta)?;
        Ok(())
    }
}
