//! Portfolio health scoring and keyword opportunity heuristics
//!
//! The health score starts from a base of 50 and applies additive
//! adjustments from market share, trend counts, and portfolio averages,
//! clamped to [0, 100]. Recommendations come from a fixed, ordered rule
//! list and always yield at least one entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Percentage of ranked keywords inside each rank band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketShare {
    pub top10: u32,
    pub top25: u32,
    pub top50: u32,
}

/// Compute market share over the ranked positions of a portfolio.
///
/// Returns `None` when no keyword carries a rank (shares would be undefined).
#[must_use]
pub fn market_share(ranks: &[u32]) -> Option<MarketShare> {
    if ranks.is_empty() {
        return None;
    }

    let total = ranks.len() as f64;
    let share = |band: u32| {
        let hits = ranks.iter().filter(|&&r| r <= band).count() as f64;
        (hits / total * 100.0).round() as u32
    };

    Some(MarketShare {
        top10: share(10),
        top25: share(25),
        top50: share(50),
    })
}

/// How contested the portfolio's keyword set is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitiveIntensity {
    Low,
    Medium,
    High,
}

impl CompetitiveIntensity {
    /// Derive intensity from the top-10 share: under 20% is high, under 40%
    /// medium, otherwise low.
    #[must_use]
    pub fn from_market_share(share: &MarketShare) -> Self {
        if share.top10 < 20 {
            Self::High
        } else if share.top10 < 40 {
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
        }
    }
}

impl fmt::Display for CompetitiveIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health status band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    NeedsAttention,
    Fair,
    Good,
    Excellent,
}

impl HealthStatus {
    /// Band a 0-100 health score
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        if score < 40 {
            Self::NeedsAttention
        } else if score < 60 {
            Self::Fair
        } else if score < 80 {
            Self::Good
        } else {
            Self::Excellent
        }
    }

    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NeedsAttention => "needs_attention",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

/// Compute the 0-100 portfolio health score.
///
/// Base 50, `+0.3 * top10%`, `+0.1 * top25%`, `+10`/`-10` when improving or
/// declining keywords dominate, `+5` for average difficulty under 40, `+5`
/// for average popularity over 40.
#[must_use]
pub fn health_score(
    share: Option<&MarketShare>,
    improving: usize,
    declining: usize,
    avg_difficulty: Option<f64>,
    avg_popularity: Option<f64>,
) -> u32 {
    let mut score = 50.0;

    if let Some(share) = share {
        score += f64::from(share.top10) * 0.3;
        score += f64::from(share.top25) * 0.1;
    }

    if improving > declining {
        score += 10.0;
    }
    if declining > improving {
        score -= 10.0;
    }

    if avg_difficulty.is_some_and(|d| d < 40.0) {
        score += 5.0;
    }
    if avg_popularity.is_some_and(|p| p > 40.0) {
        score += 5.0;
    }

    score.clamp(0.0, 100.0).round() as u32
}

/// Generate recommendation texts from a fixed, ordered rule list.
///
/// Every matching rule appends its text; when none fires, the generic
/// all-clear message is returned so the list is never empty.
#[must_use]
pub fn recommendations(
    score: u32,
    share: Option<&MarketShare>,
    improving: usize,
    declining: usize,
    avg_ranking: Option<u32>,
) -> Vec<String> {
    let mut recs = Vec::new();

    if score < 60 {
        recs.push(
            "Focus on improving rankings for existing keywords before adding new ones".to_string(),
        );
    }

    if share.is_some_and(|s| s.top10 < 20) {
        recs.push("Target more achievable keywords - current portfolio is too competitive".to_string());
    }

    if declining > improving {
        recs.push(
            "Investigate recent ranking drops - may indicate algorithm changes or competitor activity"
                .to_string(),
        );
    }

    if avg_ranking.is_some_and(|r| r > 50) {
        recs.push(
            "Average ranking is low - consider refreshing app metadata and screenshots".to_string(),
        );
    }

    if recs.is_empty() {
        recs.push("ASO health is good - continue monitoring and optimizing".to_string());
    }

    recs
}

/// Opportunity score for targeting a keyword: popularity high and difficulty
/// low both raise it. Missing metrics count as zero.
#[must_use]
pub fn opportunity_score(popularity: Option<f64>, difficulty: Option<f64>) -> i64 {
    let pop = popularity.unwrap_or(0.0);
    let diff = difficulty.unwrap_or(0.0);
    ((pop - diff + 100.0) / 2.0).round() as i64
}

/// Targeting advice for a keyword given the app's current position
#[must_use]
pub fn opportunity_reasoning(current_ranking: Option<u32>) -> String {
    match current_ranking {
        None => "Not currently ranking - potential new opportunity".to_string(),
        Some(rank) if rank > 50 => format!("Currently ranking {rank} - room for improvement"),
        Some(rank) if rank > 10 => format!("Ranking {rank} - push to top 10"),
        Some(rank) => format!("Top 10 at position {rank} - maintain position"),
    }
}

/// Competition score for the low-competition keyword scan
#[must_use]
pub fn competition_score(difficulty: f64, popularity: f64) -> i64 {
    (100.0 - difficulty + popularity / 2.0).round() as i64
}
