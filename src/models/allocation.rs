//! Allocation output: how capital is split across protocols.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Capital assigned to a single protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub protocol_name: String,

    /// Capital assigned
    pub amount: Decimal,

    /// Share of the requested total (0.0 to 1.0)
    pub percentage_of_total: f64,

    /// Fractional APY of the protocol
    pub expected_yield: f64,

    /// Composite risk score (0.0 to 1.0)
    pub risk_score: f64,
}

/// Result of an allocation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Strategy profile that produced this allocation
    pub strategy_name: String,

    /// Entries ordered by risk-adjusted score, best first
    pub entries: Vec<AllocationEntry>,

    /// Capital requested
    pub total_amount: Decimal,

    /// Capital actually placed
    pub allocated_amount: Decimal,

    /// Capital left over after the caps were applied
    pub unallocated_amount: Decimal,

    /// Capital-weighted average yield of the placed capital
    pub expected_portfolio_yield: f64,

    /// Capital-weighted average risk of the placed capital
    pub average_risk: f64,

    pub protocol_count: usize,
}

impl AllocationResult {
    /// The "no suitable opportunity" outcome.
    pub fn empty(strategy_name: impl Into<String>, total_amount: Decimal) -> Self {
        Self {
            strategy_name: strategy_name.into(),
            entries: Vec::new(),
            total_amount,
            allocated_amount: Decimal::ZERO,
            unallocated_amount: total_amount,
            expected_portfolio_yield: 0.0,
            average_risk: 0.0,
            protocol_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expected annual income on the placed capital.
    pub fn expected_annual_income(&self) -> Decimal {
        Decimal::try_from(self.expected_portfolio_yield).unwrap_or(Decimal::ZERO)
            * self.allocated_amount
    }
}

impl std::fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^64}", format!(" ALLOCATION: {} ", self.strategy_name.to_uppercase()))?;
        writeln!(f)?;
        if self.entries.is_empty() {
            writeln!(f, "No suitable opportunity for this strategy.")?;
        } else {
            writeln!(
                f,
                "{:<24} {:>12} {:>8} {:>8} {:>8}",
                "PROTOCOL", "AMOUNT", "SHARE", "APY", "RISK"
            )?;
            writeln!(f, "{}", "-".repeat(64))?;
            for entry in &self.entries {
                writeln!(
                    f,
                    "{:<24} {:>12.2} {:>7.1}% {:>7.2}% {:>8.2}",
                    entry.protocol_name,
                    entry.amount,
                    entry.percentage_of_total * 100.0,
                    entry.expected_yield * 100.0,
                    entry.risk_score
                )?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Requested:    ${:.2}", self.total_amount)?;
        writeln!(f, "Allocated:    ${:.2}", self.allocated_amount)?;
        writeln!(f, "Unallocated:  ${:.2}", self.unallocated_amount)?;
        writeln!(f, "Portfolio APY: {:.2}%", self.expected_portfolio_yield * 100.0)?;
        writeln!(f, "Average Risk:  {:.2}", self.average_risk)?;
        writeln!(f, "{:=^64}", "")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_result() {
        let result = AllocationResult::empty("moderate", dec!(500));

        assert!(result.is_empty());
        assert_eq!(result.protocol_count, 0);
        assert_eq!(result.unallocated_amount, dec!(500));
        assert_eq!(result.expected_annual_income(), Decimal::ZERO);
        assert!(result.to_string().contains("No suitable opportunity"));
    }
}
