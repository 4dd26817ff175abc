//! Market snapshot model: one time step of historical state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::opportunity::Opportunity;

/// Optional signals attached to a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSignals {
    /// Momentum indicator; buys fire above 0.05
    #[serde(default)]
    pub momentum: f64,
}

/// Full market state at one instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// When this state was observed
    pub timestamp: DateTime<Utc>,

    /// Price per unit keyed by protocol name
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,

    /// Opportunities visible at this instant
    #[serde(default)]
    pub protocols: Vec<Opportunity>,

    /// Signals, when the feed provides them
    #[serde(default)]
    pub signals: Option<MarketSignals>,
}

impl MarketSnapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            prices: HashMap::new(),
            protocols: Vec::new(),
            signals: None,
        }
    }

    pub fn with_price(mut self, protocol: impl Into<String>, price: Decimal) -> Self {
        self.prices.insert(protocol.into(), price);
        self
    }

    pub fn with_protocol(mut self, opportunity: Opportunity) -> Self {
        self.protocols.push(opportunity);
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.signals = Some(MarketSignals { momentum });
        self
    }

    /// Get the price for a protocol, if it traded at this step.
    pub fn price_for(&self, protocol: &str) -> Option<Decimal> {
        self.prices.get(protocol).copied()
    }

    /// Find the opportunity record for a protocol.
    pub fn protocol(&self, name: &str) -> Option<&Opportunity> {
        self.protocols.iter().find(|p| p.name == name)
    }

    /// Momentum signal, if present.
    pub fn momentum(&self) -> Option<f64> {
        self.signals.map(|s| s.momentum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_snapshot() {
        let json = r#"{
            "timestamp": "2024-01-01T00:00:00Z",
            "prices": {"aave-usdc": 1.02},
            "protocols": [{"name": "aave-usdc", "protocol_family": "aave", "annual_yield": 0.04}],
            "signals": {"momentum": 0.1}
        }"#;
        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.price_for("aave-usdc"), Some(dec!(1.02)));
        assert!(snapshot.protocol("aave-usdc").is_some());
        assert_eq!(snapshot.momentum(), Some(0.1));
    }

    #[test]
    fn test_signals_are_optional() {
        let json = r#"{"timestamp": "2024-01-01T00:00:00Z"}"#;
        let snapshot: MarketSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(snapshot.momentum(), None);
        assert!(snapshot.protocols.is_empty());
        assert_eq!(snapshot.price_for("anything"), None);
    }
}
