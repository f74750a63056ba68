//! Ranking analytics: descriptive statistics, trend classification, anomaly
//! detection, linear-trend extrapolation, and portfolio health scoring.
//!
//! Every function here is a pure, synchronous transformation over in-memory
//! sequences. No I/O, no shared state, no retries. Callers feed pre-fetched,
//! date-ascending ranking data from the storage layer.
//!
//! Note that two independent trend heuristics coexist deliberately:
//! half-mean comparison for [`trend::classify_trend`] and regression-slope
//! sign for [`prediction::predict_ranking`]. Downstream consumers rely on
//! each one's specific thresholds, so they are never unified.

pub mod anomaly;
pub mod health;
pub mod prediction;
pub mod trend;

use thiserror::Error;

pub use anomaly::{detect_anomaly, AnomalyEvent, AnomalyType, Severity};
pub use health::{
    competition_score, health_score, market_share, opportunity_reasoning, opportunity_score,
    recommendations, CompetitiveIntensity, HealthStatus, MarketShare,
};
pub use prediction::{linear_fit, predict_ranking, Forecast, LinearFit, Prediction};
pub use trend::{classify_trend, summarize_series, volatility, TrendDirection, TrendSummary};

/// Errors raised by analytics preconditions
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Insufficient data points: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Ranking series is empty")]
    EmptySeries,
}

/// Result type for analytics operations
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Round to one decimal place, the reporting precision for averages and
/// volatility.
pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
