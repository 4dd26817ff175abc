//! Opportunity model representing one yield-bearing position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AllocatorError, Result};

/// A yield-bearing position available at a point in time.
///
/// Records are produced by the data-fetch layer once per refresh cycle and
/// never mutated afterwards; the next refresh supersedes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Unique protocol/pool name (also the price key in snapshots)
    pub name: String,

    /// Protocol family, e.g. "compound" or "curve"
    pub protocol_family: String,

    /// Fractional APY (0.05 = 5%)
    pub annual_yield: f64,

    /// Total value locked in currency units
    #[serde(default)]
    pub total_value_locked: Decimal,

    /// Whether the protocol has been audited
    #[serde(default)]
    pub audited: bool,

    /// Days since deployment
    #[serde(default)]
    pub age_in_days: u32,

    /// Deposit token symbol
    #[serde(default)]
    pub token: String,
}

impl Opportunity {
    /// Create a record with the risk-increasing defaults (unaudited, new, no TVL).
    pub fn new(name: impl Into<String>, protocol_family: impl Into<String>, annual_yield: f64) -> Self {
        Self {
            name: name.into(),
            protocol_family: protocol_family.into(),
            annual_yield,
            total_value_locked: Decimal::ZERO,
            audited: false,
            age_in_days: 0,
            token: String::new(),
        }
    }

    pub fn with_tvl(mut self, tvl: Decimal) -> Self {
        self.total_value_locked = tvl;
        self
    }

    pub fn with_audit(mut self, audited: bool) -> Self {
        self.audited = audited;
        self
    }

    pub fn with_age(mut self, days: u32) -> Self {
        self.age_in_days = days;
        self
    }

    /// Check the non-negativity invariants.
    pub fn validate(&self) -> Result<()> {
        if !self.annual_yield.is_finite() || self.annual_yield < 0.0 {
            return Err(AllocatorError::invalid_argument(format!(
                "Opportunity {} has invalid annual yield {}",
                self.name, self.annual_yield
            )));
        }
        if self.total_value_locked < Decimal::ZERO {
            return Err(AllocatorError::invalid_argument(format!(
                "Opportunity {} has negative TVL {}",
                self.name, self.total_value_locked
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_fields_default_to_risky() {
        let json = r#"{"name":"pool","protocol_family":"curve","annual_yield":0.08}"#;
        let opp: Opportunity = serde_json::from_str(json).unwrap();

        assert!(!opp.audited);
        assert_eq!(opp.age_in_days, 0);
        assert_eq!(opp.total_value_locked, Decimal::ZERO);
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        let negative_yield = Opportunity::new("x", "aave", -0.01);
        assert!(matches!(
            negative_yield.validate(),
            Err(AllocatorError::InvalidArgument(_))
        ));

        let negative_tvl = Opportunity::new("y", "aave", 0.03).with_tvl(dec!(-5));
        assert!(negative_tvl.validate().is_err());

        let ok = Opportunity::new("z", "aave", 0.03).with_tvl(dec!(5000000));
        assert!(ok.validate().is_ok());
    }
}
