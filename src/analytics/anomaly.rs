//! Anomaly detection for sudden ranking movements
//!
//! A (previous, current) rank pair is anomalous when its absolute delta
//! meets the caller's threshold. Change is computed as `previous - current`,
//! so a positive change is an improvement (lower rank numbers are better).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an anomalous ranking movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    SuddenRise,
    SuddenDrop,
}

impl AnomalyType {
    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuddenRise => "sudden_rise",
            Self::SuddenDrop => "sudden_drop",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier of an anomaly, by absolute rank change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Tier an absolute rank change: >=50 critical, >=25 high, >=15 medium,
    /// else low.
    #[must_use]
    pub fn from_change(abs_change: u64) -> Self {
        if abs_change >= 50 {
            Self::Critical
        } else if abs_change >= 25 {
            Self::High
        } else if abs_change >= 15 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// A classified anomalous ranking movement
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyEvent {
    /// `previous - current`; positive means the rank improved
    pub change: i64,

    /// Change relative to the previous rank, rounded to whole percent.
    /// `None` when the previous rank is zero (division would not be finite).
    pub percent_change: Option<i64>,

    #[serde(rename = "type")]
    pub anomaly_type: AnomalyType,
    pub severity: Severity,
    pub interpretation: String,
}

/// Detect an anomalous movement between two observed ranks.
///
/// Returns `None` when the absolute change stays under `threshold`.
#[must_use]
pub fn detect_anomaly(current: u32, previous: u32, threshold: u32) -> Option<AnomalyEvent> {
    let change = i64::from(previous) - i64::from(current);
    let abs_change = change.unsigned_abs();

    if abs_change < u64::from(threshold) {
        return None;
    }

    // Halves round toward positive infinity: -55.5% reports as -55
    let percent_change = if previous == 0 {
        None
    } else {
        let percent = (change as f64 / f64::from(previous)) * 100.0;
        Some((percent + 0.5).floor() as i64)
    };

    let (anomaly_type, interpretation) = if change > 0 {
        (
            AnomalyType::SuddenRise,
            format!("Ranking improved by {change} positions"),
        )
    } else {
        (
            AnomalyType::SuddenDrop,
            format!("Ranking dropped by {abs_change} positions"),
        )
    };

    Some(AnomalyEvent {
        change,
        percent_change,
        anomaly_type,
        severity: Severity::from_change(abs_change),
        interpretation,
    })
}
