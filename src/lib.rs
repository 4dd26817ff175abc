//! Yield Allocator
//!
//! Splits capital across yield-bearing protocols under a named risk strategy
//! and validates the strategy by replaying historical market snapshots.

pub mod backtest;
pub mod error;
pub mod metrics;
pub mod models;
pub mod runner;
pub mod trading;

pub use backtest::{Backtester, SimulationResult};
pub use error::{AllocatorError, Result};
pub use trading::{Allocator, StrategyRegistry};
