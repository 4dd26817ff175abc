//! Strategy profiles, risk scoring and the allocation engine.

mod allocator;
mod profile;
mod registry;
mod risk_scorer;

pub use allocator::{Allocator, RankedOpportunity, MAX_PROTOCOLS};
pub use profile::{RebalanceFrequency, StrategyProfile};
pub use registry::StrategyRegistry;
pub use risk_scorer::{RiskScorer, LOW_TVL_THRESHOLD, YOUNG_PROTOCOL_DAYS};
