//! Trend classification and descriptive statistics for ranking series
//!
//! Classification splits a series into two contiguous halves and compares
//! their means: an improvement means the later ranks are numerically lower
//! (lower rank = better position). The ±2 margin absorbs rank-measurement
//! noise so single-position jitter never flags as a trend.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

use super::{round_to_tenth, AnalyticsError, AnalyticsResult};
use crate::config::Period;
use crate::models::{RankingSeries, Store};

/// Margin (in rank positions) the half means must diverge by before a series
/// counts as improving or declining.
const TREND_MARGIN: f64 = 2.0;

/// Trend direction label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the trend of a rank series by comparing half means.
///
/// The first `floor(n/2)` observations form the first half, the remainder the
/// second. A series shorter than two observations has no comparable halves
/// and is always `Stable`.
///
/// Position matters: unlike [`volatility`], this is NOT invariant under
/// reordering of the input.
#[must_use]
pub fn classify_trend(ranks: &[u32]) -> TrendDirection {
    if ranks.len() < 2 {
        return TrendDirection::Stable;
    }

    let mid = ranks.len() / 2;
    let first_avg = ranks[..mid].iter().map(|&r| f64::from(r)).mean();
    let second_avg = ranks[mid..].iter().map(|&r| f64::from(r)).mean();

    if second_avg < first_avg - TREND_MARGIN {
        TrendDirection::Improving
    } else if second_avg > first_avg + TREND_MARGIN {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

/// Standard deviation of the ranks (population form), rounded to one decimal.
///
/// A symmetric statistic: reordering the input does not change the result.
#[must_use]
pub fn volatility(ranks: &[u32]) -> f64 {
    if ranks.is_empty() {
        return 0.0;
    }
    let std_dev = ranks
        .iter()
        .map(|&r| f64::from(r))
        .population_std_dev();
    round_to_tenth(std_dev)
}

/// Descriptive trend summary for one ranking series
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub keyword: String,
    pub app: String,
    pub store: Store,
    pub period: Period,
    pub data_points: usize,
    pub avg_ranking: f64,
    pub min_ranking: u32,
    pub max_ranking: u32,
    pub volatility: f64,
    pub trend: TrendDirection,
}

/// Summarize a ranking series for a reporting period.
///
/// # Errors
/// Returns [`AnalyticsError::EmptySeries`] when the series holds no ranked
/// observations.
pub fn summarize_series(series: &RankingSeries, period: Period) -> AnalyticsResult<TrendSummary> {
    if series.is_empty() {
        return Err(AnalyticsError::EmptySeries);
    }

    let ranks = series.ranks();
    let avg = ranks.iter().map(|&r| f64::from(r)).mean();
    let min = ranks.iter().copied().min().unwrap_or(0);
    let max = ranks.iter().copied().max().unwrap_or(0);

    Ok(TrendSummary {
        keyword: series.key.keyword.clone(),
        app: series.key.app.clone(),
        store: series.key.store,
        period,
        data_points: ranks.len(),
        avg_ranking: round_to_tenth(avg),
        min_ranking: min,
        max_ranking: max,
        volatility: volatility(&ranks),
        trend: classify_trend(&ranks),
    })
}
