//! Performance statistics over value timelines.

mod calculator;

pub use calculator::{
    PerformanceCalculator, DEFAULT_VAR_CONFIDENCE, MIN_BETA_OBSERVATIONS, PERIODS_PER_YEAR,
    RISK_FREE_RATE,
};
