//! Composite risk scoring for opportunities.

use rust_decimal::Decimal;

use crate::models::Opportunity;

/// Protocols younger than this are penalized.
pub const YOUNG_PROTOCOL_DAYS: u32 = 90;

/// Pools with less TVL than this are penalized.
pub const LOW_TVL_THRESHOLD: i64 = 10_000_000;

/// Additive risk model: a base score plus penalties, clamped to [0, 1].
///
/// The allocation and simulation paths use different priors; both are kept so
/// their numeric outputs stay stable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskScorer {
    pub base: f64,
    pub unaudited_penalty: f64,
    pub young_penalty: f64,
    pub low_tvl_penalty: f64,
}

impl RiskScorer {
    /// Model used when building static allocations.
    pub const fn allocation() -> Self {
        Self {
            base: 0.5,
            unaudited_penalty: 0.2,
            young_penalty: 0.2,
            low_tvl_penalty: 0.2,
        }
    }

    /// Model used by the backtest decision policy.
    pub const fn simulation() -> Self {
        Self {
            base: 0.3,
            unaudited_penalty: 0.2,
            young_penalty: 0.3,
            low_tvl_penalty: 0.2,
        }
    }

    /// Score an opportunity (0.0 = safest, 1.0 = riskiest).
    pub fn score(&self, opportunity: &Opportunity) -> f64 {
        let mut risk = self.base;

        if !opportunity.audited {
            risk += self.unaudited_penalty;
        }
        if opportunity.age_in_days < YOUNG_PROTOCOL_DAYS {
            risk += self.young_penalty;
        }
        if opportunity.total_value_locked < Decimal::from(LOW_TVL_THRESHOLD) {
            risk += self.low_tvl_penalty;
        }

        risk.clamp(0.0, 1.0)
    }

    /// `annual_yield * (1 - risk)` for an already computed risk score.
    pub fn risk_adjusted(annual_yield: f64, risk: f64) -> f64 {
        annual_yield * (1.0 - risk)
    }
}
