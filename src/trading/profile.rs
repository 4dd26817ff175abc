//! Strategy profile: the risk and allocation policy a run is evaluated under.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AllocatorError, Result};

/// How often a live deployment would rebalance. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceFrequency {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl RebalanceFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

/// Named risk/allocation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StrategyProfile {
    /// Registry key
    pub name: String,

    /// Maximum acceptable risk score (0.0 to 1.0)
    pub risk_tolerance: f64,

    /// Minimum fractional APY to consider an opportunity
    pub min_annual_yield: f64,

    /// Maximum share of the total placed in one protocol (0.0 exclusive to 1.0)
    pub max_single_allocation_share: Decimal,

    /// Protocol families eligible under this profile (lowercase)
    pub allowed_protocol_families: BTreeSet<String>,

    #[serde(default)]
    pub rebalance_frequency: RebalanceFrequency,
}

impl StrategyProfile {
    pub fn conservative() -> Self {
        Self {
            name: "conservative".to_string(),
            risk_tolerance: 0.3,
            min_annual_yield: 0.02,
            max_single_allocation_share: dec!(0.25),
            allowed_protocol_families: families(&["compound", "aave"]),
            rebalance_frequency: RebalanceFrequency::Weekly,
        }
    }

    pub fn moderate() -> Self {
        Self {
            name: "moderate".to_string(),
            risk_tolerance: 0.6,
            min_annual_yield: 0.05,
            max_single_allocation_share: dec!(0.40),
            allowed_protocol_families: families(&["compound", "aave", "curve", "yearn"]),
            rebalance_frequency: RebalanceFrequency::Daily,
        }
    }

    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            risk_tolerance: 0.9,
            min_annual_yield: 0.10,
            max_single_allocation_share: dec!(0.60),
            allowed_protocol_families: families(&["yearn", "curve", "uniswap-v2"]),
            rebalance_frequency: RebalanceFrequency::Hourly,
        }
    }

    /// Case-insensitive allow-list check.
    pub fn allows(&self, protocol_family: &str) -> bool {
        self.allowed_protocol_families
            .contains(&protocol_family.to_lowercase())
    }

    /// Lowercase the allow-list so lookups are case-insensitive.
    pub fn normalized(mut self) -> Self {
        self.allowed_protocol_families = self
            .allowed_protocol_families
            .iter()
            .map(|f| f.to_lowercase())
            .collect();
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AllocatorError::configuration("Strategy name must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.risk_tolerance) {
            return Err(AllocatorError::configuration(format!(
                "Strategy {}: risk tolerance {} outside [0, 1]",
                self.name, self.risk_tolerance
            )));
        }
        if !self.min_annual_yield.is_finite() || self.min_annual_yield < 0.0 {
            return Err(AllocatorError::configuration(format!(
                "Strategy {}: minimum yield {} must be non-negative",
                self.name, self.min_annual_yield
            )));
        }
        if self.max_single_allocation_share <= Decimal::ZERO
            || self.max_single_allocation_share > Decimal::ONE
        {
            return Err(AllocatorError::configuration(format!(
                "Strategy {}: max single allocation share {} outside (0, 1]",
                self.name, self.max_single_allocation_share
            )));
        }
        if self.allowed_protocol_families.is_empty() {
            return Err(AllocatorError::configuration(format!(
                "Strategy {}: no allowed protocol families",
                self.name
            )));
        }
        Ok(())
    }
}

fn families(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}
