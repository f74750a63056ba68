use serde::Serialize;
use serde_json::{json, Value};
use statrs::statistics::Statistics;

use crate::analytics::{
    health_score, market_share, recommendations, CompetitiveIntensity, HealthStatus, MarketShare,
};
use crate::config::QueryFilter;
use crate::error::Result;
use crate::storage::AstroDatabase;

/// Portfolio-wide averages
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthMetrics {
    total_keywords: usize,
    ranked_keywords: usize,
    avg_ranking: Option<i64>,
    avg_difficulty: Option<i64>,
    avg_popularity: Option<i64>,
}

/// Keyword movement counts since the previous update
#[derive(Debug, Serialize)]
struct TrendCounts {
    improving: usize,
    declining: usize,
    stable: usize,
}

/// Full ASO health report for an app
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    app: String,
    store: String,
    health_score: u32,
    health_status: HealthStatus,
    metrics: HealthMetrics,
    trends: TrendCounts,
    market_share: Option<MarketShare>,
    competitive_intensity: Option<CompetitiveIntensity>,
    recommendations: Vec<String>,
}

/// Analyze the overall ASO health of an app's keyword portfolio
pub fn health(db: &AstroDatabase, filter: &QueryFilter) -> Result<Value> {
    filter.require_app()?;
    let entries = db.app_keywords(filter)?;

    if entries.is_empty() {
        return Ok(json!({ "message": "No keywords found for this app" }));
    }

    let ranked: Vec<_> = entries
        .iter()
        .filter(|k| k.current_ranking.is_some())
        .collect();
    let ranks: Vec<u32> = ranked.iter().filter_map(|k| k.current_ranking).collect();

    let avg_ranking = rounded_avg(ranks.iter().map(|&r| f64::from(r)));
    let avg_difficulty = rounded_avg(entries.iter().filter_map(|k| k.difficulty));
    let avg_popularity = rounded_avg(entries.iter().filter_map(|k| k.popularity));

    let improving = ranked
        .iter()
        .filter(|k| matches!((k.current_ranking, k.previous_ranking), (Some(c), Some(p)) if c < p))
        .count();
    let declining = ranked
        .iter()
        .filter(|k| matches!((k.current_ranking, k.previous_ranking), (Some(c), Some(p)) if c > p))
        .count();

    let share = market_share(&ranks);
    let score = health_score(
        share.as_ref(),
        improving,
        declining,
        avg_difficulty.map(|v| v as f64),
        avg_popularity.map(|v| v as f64),
    );

    let report = HealthReport {
        app: filter.app_label(),
        store: filter.store_label(),
        health_score: score,
        health_status: HealthStatus::from_score(score),
        metrics: HealthMetrics {
            total_keywords: entries.len(),
            ranked_keywords: ranked.len(),
            avg_ranking,
            avg_difficulty,
            avg_popularity,
        },
        trends: TrendCounts {
            improving,
            declining,
            stable: ranked.len() - improving - declining,
        },
        competitive_intensity: share
            .as_ref()
            .map(CompetitiveIntensity::from_market_share),
        recommendations: recommendations(
            score,
            share.as_ref(),
            improving,
            declining,
            avg_ranking.and_then(|v| u32::try_from(v).ok()),
        ),
        market_share: share,
    };

    tracing::info!(
        score = report.health_score,
        status = report.health_status.as_str(),
        "analyzed ASO health"
    );
    Ok(serde_json::to_value(report)?)
}

/// Mean rounded to the nearest integer, `None` over an empty iterator
fn rounded_avg(values: impl Iterator<Item = f64>) -> Option<i64> {
    let values: Vec<f64> = values.collect();
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean().round() as i64)
}
