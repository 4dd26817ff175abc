//! Simulated trade record appended to a backtest's trade log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed simulated trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    /// Snapshot timestamp at which the trade executed
    pub timestamp: DateTime<Utc>,

    /// Trade direction
    pub side: TradeSide,

    /// Protocol bought or sold
    pub protocol: String,

    /// Units traded
    pub quantity: Decimal,

    /// Price per unit at the snapshot
    pub price: Decimal,

    /// Cash moved by the trade (cost for buys, proceeds for sells)
    pub notional: Decimal,

    /// Cash remaining after the trade settled
    pub cash_after: Decimal,
}

impl SimulatedTrade {
    /// Signed cash flow: negative for buys, positive for sells.
    pub fn cash_flow(&self) -> Decimal {
        match self.side {
            TradeSide::Buy => -self.notional,
            TradeSide::Sell => self.notional,
        }
    }
}
