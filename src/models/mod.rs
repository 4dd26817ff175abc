//! Data models for opportunities, snapshots, allocations, trades and metrics.

mod allocation;
mod metrics;
mod opportunity;
mod snapshot;
mod trade;

pub use allocation::{AllocationEntry, AllocationResult};
pub use metrics::{PerformanceReport, RiskRating};
pub use opportunity::Opportunity;
pub use snapshot::{MarketSignals, MarketSnapshot};
pub use trade::{SimulatedTrade, TradeSide};
