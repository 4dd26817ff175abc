//! Allocation engine: greedy, risk-adjusted split of capital across protocols.
//!
//! Opportunities are filtered by the profile's yield floor and allow-list,
//! ranked by `yield * (1 - risk)`, then filled greedily up to the per-protocol
//! cap. This is a heuristic, not an optimizer.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info};

use crate::error::{AllocatorError, Result};
use crate::models::{AllocationEntry, AllocationResult, Opportunity};

use super::{RiskScorer, StrategyProfile, StrategyRegistry};

/// Maximum number of protocols in one allocation.
pub const MAX_PROTOCOLS: usize = 5;

/// An eligible opportunity with its scores.
#[derive(Debug, Clone, Copy)]
pub struct RankedOpportunity<'a> {
    pub opportunity: &'a Opportunity,
    pub risk_score: f64,
    pub risk_adjusted_score: f64,
}

/// Builds static allocations for registered strategies.
pub struct Allocator {
    registry: Arc<StrategyRegistry>,
    scorer: RiskScorer,
}

impl Allocator {
    /// Create an allocator over a registry, using the allocation risk model.
    pub fn new(registry: Arc<StrategyRegistry>) -> Self {
        Self {
            registry,
            scorer: RiskScorer::allocation(),
        }
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Split `total_amount` across the best opportunities for a strategy.
    ///
    /// An empty eligible set is a valid outcome and yields an empty result.
    pub fn optimize(
        &self,
        strategy_name: &str,
        opportunities: &[Opportunity],
        total_amount: Decimal,
    ) -> Result<AllocationResult> {
        let profile = self.registry.get(strategy_name)?;

        if total_amount <= Decimal::ZERO {
            return Err(AllocatorError::invalid_argument(format!(
                "Allocation amount must be positive, got {}",
                total_amount
            )));
        }
        for opportunity in opportunities {
            opportunity.validate()?;
        }

        let ranked = Self::rank(profile, opportunities, &self.scorer);
        if ranked.is_empty() {
            info!(strategy = %profile.name, "No eligible opportunities");
            return Ok(AllocationResult::empty(&profile.name, total_amount));
        }

        let cap = total_amount * profile.max_single_allocation_share;
        let mut remaining = total_amount;
        let mut entries = Vec::with_capacity(MAX_PROTOCOLS);

        for candidate in ranked.iter().take(MAX_PROTOCOLS) {
            if remaining <= Decimal::ZERO {
                break;
            }

            let amount = remaining.min(cap);
            remaining -= amount;

            debug!(
                protocol = %candidate.opportunity.name,
                amount = %amount,
                score = candidate.risk_adjusted_score,
                "Allocated"
            );

            entries.push(AllocationEntry {
                protocol_name: candidate.opportunity.name.clone(),
                amount,
                percentage_of_total: (amount / total_amount).to_f64().unwrap_or(0.0),
                expected_yield: candidate.opportunity.annual_yield,
                risk_score: candidate.risk_score,
            });
        }

        let allocated = total_amount - remaining;
        let (expected_portfolio_yield, average_risk) = Self::weighted_averages(&entries);

        info!(
            strategy = %profile.name,
            protocols = entries.len(),
            allocated = %allocated,
            apy = expected_portfolio_yield,
            "Allocation complete"
        );

        Ok(AllocationResult {
            strategy_name: profile.name.clone(),
            protocol_count: entries.len(),
            entries,
            total_amount,
            allocated_amount: allocated,
            unallocated_amount: remaining,
            expected_portfolio_yield,
            average_risk,
        })
    }

    /// Filter to eligible opportunities and rank them best first.
    ///
    /// Eligible means `annual_yield >= min_annual_yield` and an allowed family.
    /// The sort is stable, so equal scores keep their input order.
    pub fn rank<'a>(
        profile: &StrategyProfile,
        opportunities: &'a [Opportunity],
        scorer: &RiskScorer,
    ) -> Vec<RankedOpportunity<'a>> {
        let mut ranked: Vec<RankedOpportunity<'a>> = opportunities
            .iter()
            .filter(|o| o.annual_yield >= profile.min_annual_yield)
            .filter(|o| profile.allows(&o.protocol_family))
            .map(|o| {
                let risk_score = scorer.score(o);
                RankedOpportunity {
                    opportunity: o,
                    risk_score,
                    risk_adjusted_score: RiskScorer::risk_adjusted(o.annual_yield, risk_score),
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.risk_adjusted_score.total_cmp(&a.risk_adjusted_score));
        ranked
    }

    /// Capital-weighted average yield and risk over the placed entries.
    fn weighted_averages(entries: &[AllocationEntry]) -> (f64, f64) {
        let weights: Vec<f64> = entries
            .iter()
            .map(|e| e.amount.to_f64().unwrap_or(0.0))
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return (0.0, 0.0);
        }

        let yield_sum: f64 = entries.iter().zip(&weights).map(|(e, w)| e.expected_yield * w).sum();
        let risk_sum: f64 = entries.iter().zip(&weights).map(|(e, w)| e.risk_score * w).sum();

        (yield_sum / total, risk_sum / total)
    }
}
