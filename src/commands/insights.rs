use serde::Serialize;
use serde_json::{json, Value};
use statrs::statistics::Statistics;

use crate::analytics::{
    competition_score, market_share, opportunity_reasoning, opportunity_score,
    CompetitiveIntensity, MarketShare,
};
use crate::config::QueryFilter;
use crate::error::Result;
use crate::models::Store;
use crate::storage::AstroDatabase;

/// Apps competing for a keyword, best rank first
pub fn competitors(db: &AstroDatabase, filter: &QueryFilter, limit: u32) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let rows = db.keyword_competitors(keyword, filter.store, limit)?;
    tracing::info!(count = rows.len(), keyword, "fetched keyword competitors");

    Ok(json!({
        "keyword": keyword,
        "store": filter.store_label(),
        "competitors": rows,
    }))
}

/// Keywords similar to a seed keyword, ranked by popularity
pub fn similar(db: &AstroDatabase, filter: &QueryFilter, limit: u32) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let rows = db.similar_keywords(keyword, filter.store, limit)?;
    tracing::info!(count = rows.len(), keyword, "fetched similar keywords");

    Ok(json!({
        "keyword": keyword,
        "store": filter.store_label(),
        "recommendedKeywords": rows,
    }))
}

/// Ranking-distribution overview for an app's keyword portfolio
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LandscapeReport {
    app: String,
    store: String,
    total_keywords: usize,
    ranked_keywords: usize,
    market_share: Option<MarketShare>,
    competitive_intensity: Option<CompetitiveIntensity>,
    avg_ranking: Option<u32>,
}

/// Competitive landscape for an app's keyword portfolio
pub fn landscape(db: &AstroDatabase, filter: &QueryFilter) -> Result<Value> {
    filter.require_app()?;
    let entries = db.app_keywords(filter)?;

    if entries.is_empty() {
        return Ok(json!({ "message": "No keywords found for this app" }));
    }

    let ranks: Vec<u32> = entries.iter().filter_map(|k| k.current_ranking).collect();
    let share = market_share(&ranks);
    let report = LandscapeReport {
        app: filter.app_label(),
        store: filter.store_label(),
        total_keywords: entries.len(),
        ranked_keywords: ranks.len(),
        competitive_intensity: share
            .as_ref()
            .map(CompetitiveIntensity::from_market_share),
        market_share: share,
        avg_ranking: avg_rank(&ranks),
    };

    tracing::info!(
        total = report.total_keywords,
        ranked = report.ranked_keywords,
        "analyzed competitive landscape"
    );
    Ok(serde_json::to_value(report)?)
}

/// A keyword worth targeting, with its score and reasoning
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OpportunityReport {
    keyword: String,
    store: Store,
    opportunity_score: i64,
    current_ranking: Option<u32>,
    difficulty: Option<f64>,
    popularity: Option<f64>,
    competition: Option<i64>,
    reasoning: String,
}

/// Keyword opportunities for an app (popular yet not too difficult)
pub fn opportunities(
    db: &AstroDatabase,
    filter: &QueryFilter,
    min_popularity: f64,
    max_difficulty: f64,
) -> Result<Value> {
    filter.require_app()?;
    let rows = db.opportunity_rows(filter, min_popularity, max_difficulty)?;

    let reports: Vec<OpportunityReport> = rows
        .into_iter()
        .map(|row| OpportunityReport {
            opportunity_score: opportunity_score(row.popularity, row.difficulty),
            reasoning: opportunity_reasoning(row.current_ranking),
            keyword: row.keyword,
            store: row.store,
            current_ranking: row.current_ranking,
            difficulty: row.difficulty,
            popularity: row.popularity,
            competition: row.competition,
        })
        .collect();

    tracing::info!(count = reports.len(), "scored keyword opportunities");
    Ok(serde_json::to_value(reports)?)
}

/// A low-competition keyword candidate
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LowCompetitionReport {
    keyword: String,
    difficulty: f64,
    popularity: f64,
    competition_score: i64,
    apps_count: Option<i64>,
    store: Store,
}

/// Keywords with low difficulty and decent popularity across tracked apps
pub fn low_competition(
    db: &AstroDatabase,
    store: Option<Store>,
    max_difficulty: f64,
    min_popularity: f64,
    limit: u32,
) -> Result<Value> {
    let rows = db.low_competition_rows(store, max_difficulty, min_popularity, limit)?;

    let reports: Vec<LowCompetitionReport> = rows
        .into_iter()
        .map(|row| LowCompetitionReport {
            competition_score: competition_score(row.difficulty, row.popularity),
            keyword: row.keyword,
            difficulty: row.difficulty,
            popularity: row.popularity,
            apps_count: row.apps_count,
            store: row.store,
        })
        .collect();

    tracing::info!(count = reports.len(), "found low-competition keywords");
    Ok(serde_json::to_value(reports)?)
}

/// Rounded mean rank, `None` for an unranked portfolio
fn avg_rank(ranks: &[u32]) -> Option<u32> {
    if ranks.is_empty() {
        return None;
    }
    let mean = ranks.iter().map(|&r| f64::from(r)).mean();
    Some(mean.round() as u32)
}
