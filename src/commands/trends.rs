use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::analytics::{
    detect_anomaly, predict_ranking, summarize_series, AnomalyEvent, Forecast, Prediction,
    TrendSummary,
};
use crate::config::{history_cutoff, Period, QueryFilter, PREDICTION_HISTORY_DAYS};
use crate::error::Result;
use crate::models::{group_records, Store};
use crate::storage::AstroDatabase;

/// Trend summaries for a keyword over a reporting period
pub fn trends(db: &AstroDatabase, filter: &QueryFilter, period: Period) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let records = db.historical_rankings(keyword, filter, history_cutoff(period.days()))?;

    if records.is_empty() {
        return Ok(json!({ "message": "No ranking data found for this keyword" }));
    }

    let summaries = group_records(records)
        .values()
        .map(|series| summarize_series(series, period))
        .collect::<std::result::Result<Vec<TrendSummary>, _>>()?;

    tracing::info!(count = summaries.len(), keyword, period = period.as_str(), "summarized trends");
    Ok(serde_json::to_value(summaries)?)
}

/// A keyword whose rank moved anomalously between updates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnomalyReport {
    keyword: String,
    app: String,
    store: Store,
    previous_ranking: u32,
    current_ranking: u32,
    #[serde(flatten)]
    event: AnomalyEvent,
    detected_date: Option<DateTime<Utc>>,
}

/// Scan an app's keywords for sudden ranking movements
pub fn anomalies(db: &AstroDatabase, filter: &QueryFilter, threshold: u32) -> Result<Value> {
    filter.require_app()?;
    let rows = db.anomaly_rows(filter, threshold)?;

    let reports: Vec<AnomalyReport> = rows
        .into_iter()
        .filter_map(|row| {
            let current = row.current_ranking?;
            let previous = row.previous_ranking?;
            let event = detect_anomaly(current, previous, threshold)?;
            Some(AnomalyReport {
                keyword: row.keyword,
                app: row.app,
                store: row.store,
                previous_ranking: previous,
                current_ranking: current,
                event,
                detected_date: row.last_update,
            })
        })
        .collect();

    tracing::info!(count = reports.len(), threshold, "scanned for ranking anomalies");
    Ok(serde_json::to_value(reports)?)
}

const METHODOLOGY: &str = "Linear regression on 30-day historical data";

/// Per-series forecast output
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastReport {
    keyword: String,
    app: String,
    store: Store,
    #[serde(flatten)]
    forecast: Forecast,
    prediction_date: NaiveDate,
    methodology: &'static str,
}

/// Per-series output when too few observations exist for a regression
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsufficientReport {
    keyword: String,
    app: String,
    store: Store,
    message: &'static str,
}

/// Forecast rankings for a keyword via linear regression over recent history
pub fn predict(db: &AstroDatabase, filter: &QueryFilter, days_forward: u32) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let records =
        db.historical_rankings(keyword, filter, history_cutoff(PREDICTION_HISTORY_DAYS))?;

    if records.is_empty() {
        return Ok(json!({ "message": "Insufficient historical data for prediction" }));
    }

    let prediction_date = Utc::now().date_naive() + Duration::days(i64::from(days_forward));

    let reports: Vec<Value> = group_records(records)
        .into_iter()
        .map(|(key, series)| {
            let report = match predict_ranking(&series.ranks(), days_forward) {
                Prediction::Forecast(forecast) => serde_json::to_value(ForecastReport {
                    keyword: key.keyword,
                    app: key.app,
                    store: key.store,
                    forecast,
                    prediction_date,
                    methodology: METHODOLOGY,
                }),
                Prediction::InsufficientData { .. } => serde_json::to_value(InsufficientReport {
                    keyword: key.keyword,
                    app: key.app,
                    store: key.store,
                    message: "Insufficient data points for prediction",
                }),
            };
            Ok(report?)
        })
        .collect::<Result<_>>()?;

    tracing::info!(count = reports.len(), keyword, days_forward, "predicted rankings");
    Ok(Value::Array(reports))
}
