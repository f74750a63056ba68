//! Linear-trend extrapolation for ranking series
//!
//! Fits ordinary least squares over `(index, rank)` points using the
//! closed-form sums and forecasts `days_forward` past the last observation.
//! Predicted ranks clamp to the plausible store range [1, 200]. Confidence
//! degrades with series variance, bounded to a 30-90% band.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use super::{AnalyticsError, AnalyticsResult, TrendDirection};

/// Minimum observations required for a regression
pub const MIN_PREDICTION_POINTS: usize = 3;

/// Inclusive bounds for a plausible store ranking
pub const RANK_FLOOR: u32 = 1;
pub const RANK_CEILING: u32 = 200;

/// Slope magnitude below which a fitted trend counts as stable
const SLOPE_MARGIN: f64 = 0.5;

/// Ordinary least-squares fit over `(index, rank)` points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fitted value at position `x`
    #[must_use]
    pub fn value_at(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Trend label from the slope sign. Independent of the half-mean
    /// heuristic in [`super::trend::classify_trend`]; the two must not be
    /// conflated.
    #[must_use]
    pub fn trend(&self) -> TrendDirection {
        if self.slope < -SLOPE_MARGIN {
            TrendDirection::Improving
        } else if self.slope > SLOPE_MARGIN {
            TrendDirection::Declining
        } else {
            TrendDirection::Stable
        }
    }
}

/// Fit a least-squares line through ranks at indices `0..n-1`.
///
/// # Errors
/// Returns [`AnalyticsError::InsufficientData`] for fewer than
/// [`MIN_PREDICTION_POINTS`] observations.
pub fn linear_fit(ranks: &[u32]) -> AnalyticsResult<LinearFit> {
    let n = ranks.len();
    if n < MIN_PREDICTION_POINTS {
        return Err(AnalyticsError::InsufficientData {
            needed: MIN_PREDICTION_POINTS,
            got: n,
        });
    }

    let n_f = n as f64;
    // Closed-form index sums: sum(x) and sum(x^2) for x = 0..n-1
    let x_sum = n_f * (n_f - 1.0) / 2.0;
    let xx_sum = n_f * (n_f - 1.0) * (2.0 * n_f - 1.0) / 6.0;
    let y_sum: f64 = ranks.iter().map(|&r| f64::from(r)).sum();
    let xy_sum: f64 = ranks
        .iter()
        .enumerate()
        .map(|(x, &y)| x as f64 * f64::from(y))
        .sum();

    let slope = (n_f * xy_sum - x_sum * y_sum) / (n_f * xx_sum - x_sum * x_sum);
    let intercept = (y_sum - slope * x_sum) / n_f;

    Ok(LinearFit { slope, intercept })
}

/// A completed ranking forecast
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub current_ranking: u32,

    /// Forecast rank, clamped to [`RANK_FLOOR`]..=[`RANK_CEILING`]
    pub predicted_ranking: u32,

    /// Confidence as a whole percentage, 30-90
    pub confidence: u32,

    pub trend: TrendDirection,

    /// `current - predicted`; positive means an expected improvement
    pub predicted_change: i64,

    pub data_points: usize,
}

/// Outcome of a prediction request.
///
/// Too few observations is an expected, common condition, reported as a
/// structured result rather than an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Prediction {
    Forecast(Forecast),
    InsufficientData { data_points: usize },
}

/// Forecast a rank `days_forward` days past the final observation.
#[must_use]
pub fn predict_ranking(ranks: &[u32], days_forward: u32) -> Prediction {
    let fit = match linear_fit(ranks) {
        Ok(fit) => fit,
        Err(_) => {
            return Prediction::InsufficientData {
                data_points: ranks.len(),
            }
        }
    };

    let n = ranks.len();
    let horizon = (n - 1) as f64 + f64::from(days_forward);
    let raw = fit.value_at(horizon).round();
    let predicted = (raw as i64).clamp(i64::from(RANK_FLOOR), i64::from(RANK_CEILING)) as u32;

    let std_dev = ranks.iter().map(|&r| f64::from(r)).population_std_dev();
    let confidence = (1.0 - std_dev / 50.0).clamp(0.3, 0.9);

    let current = ranks[n - 1];

    Prediction::Forecast(Forecast {
        current_ranking: current,
        predicted_ranking: predicted,
        confidence: (confidence * 100.0).round() as u32,
        trend: fit.trend(),
        predicted_change: i64::from(current) - i64::from(predicted),
        data_points: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forecast(ranks: &[u32], days: u32) -> Forecast {
        match predict_ranking(ranks, days) {
            Prediction::Forecast(f) => f,
            Prediction::InsufficientData { data_points } => {
                panic!("expected a forecast, got insufficient data ({data_points} points)")
            }
        }
    }

    #[test]
    fn test_too_few_points() {
        assert!(matches!(
            predict_ranking(&[10, 5], 7),
            Prediction::InsufficientData { data_points: 2 }
        ));
        assert_eq!(
            linear_fit(&[10]).unwrap_err(),
            AnalyticsError::InsufficientData { needed: 3, got: 1 }
        );
    }

    #[test]
    fn test_exact_fit_slope() {
        // Ranks 50, 40, 30: slope -10, intercept 50
        let fit = linear_fit(&[50, 40, 30]).unwrap();
        assert!((fit.slope - (-10.0)).abs() < 1e-9);
        assert!((fit.intercept - 50.0).abs() < 1e-9);
        assert_eq!(fit.trend(), TrendDirection::Improving);
    }

    #[test]
    fn test_improving_series_clamps_at_floor() {
        // 50 - 10 * (2 + 7) = -40, clamped to rank 1
        let f = forecast(&[50, 40, 30], 7);
        assert_eq!(f.predicted_ranking, 1);
        assert_eq!(f.trend, TrendDirection::Improving);
        assert!(f.predicted_ranking < f.current_ranking);
        assert_eq!(f.predicted_change, 29);
    }

    #[test]
    fn test_declining_series_clamps_at_ceiling() {
        let f = forecast(&[100, 150, 190], 30);
        assert_eq!(f.predicted_ranking, RANK_CEILING);
        assert_eq!(f.trend, TrendDirection::Declining);
    }

    #[test]
    fn test_flat_series_is_stable() {
        let f = forecast(&[25, 25, 25, 25], 7);
        assert_eq!(f.trend, TrendDirection::Stable);
        assert_eq!(f.predicted_ranking, 25);
        // Zero variance: maximum bounded confidence
        assert_eq!(f.confidence, 90);
    }

    #[test]
    fn test_confidence_degrades_with_variance() {
        let noisy = forecast(&[1, 120, 3, 150, 2], 7);
        assert_eq!(noisy.confidence, 30);

        // Population std dev of [10, 20, 30]: sqrt(200/3) = 8.165
        // confidence = 1 - 8.165/50 = 0.8367 -> 84%
        let mild = forecast(&[10, 20, 30], 7);
        assert_eq!(mild.confidence, 84);
    }

    #[test]
    fn test_forecast_horizon_counts_from_last_observation() {
        // Slope 1 from rank 10: last index 2 holds 12, 5 days out is 17
        let f = forecast(&[10, 11, 12], 5);
        assert_eq!(f.predicted_ranking, 17);
        assert_eq!(f.predicted_change, -5);
    }
}
