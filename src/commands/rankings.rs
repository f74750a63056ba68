use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::config::{history_cutoff, QueryFilter};
use crate::error::Result;
use crate::models::{group_records, to_core_data_ts, DatedRank, SeriesKey, Store};
use crate::storage::AstroDatabase;

/// Search current keyword rankings by keyword substring
pub fn search(db: &AstroDatabase, filter: &QueryFilter) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let rows = db.keyword_search(keyword, filter)?;
    tracing::info!(count = rows.len(), keyword, "searched rankings");
    Ok(serde_json::to_value(rows)?)
}

/// One grouped ranking history entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryGroup {
    keyword: String,
    app: String,
    store: Store,
    rankings: Vec<DatedRank>,
}

/// Historical ranking series for a keyword, grouped per (app, keyword, store)
pub fn history(db: &AstroDatabase, filter: &QueryFilter, days_back: u32) -> Result<Value> {
    let keyword = filter.require_keyword()?;
    let records = db.historical_rankings(keyword, filter, history_cutoff(days_back))?;
    tracing::info!(count = records.len(), keyword, days_back, "fetched ranking history");

    let groups: Vec<HistoryGroup> = group_records(records)
        .into_iter()
        .map(|(key, series)| HistoryGroup {
            keyword: key.keyword,
            app: key.app,
            store: key.store,
            rankings: series.points,
        })
        .collect();

    Ok(serde_json::to_value(groups)?)
}

/// One keyword/app/store pair compared across two dates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Comparison {
    keyword: String,
    app: String,
    store: Store,
    ranking_date1: Option<u32>,
    ranking_date2: Option<u32>,
    /// `rank(date1) - rank(date2)`; positive means improvement by date2
    change: Option<i64>,
    date1: NaiveDate,
    date2: NaiveDate,
}

/// Compare rankings observed near two calendar dates
pub fn compare(
    db: &AstroDatabase,
    filter: &QueryFilter,
    date1: NaiveDate,
    date2: NaiveDate,
) -> Result<Value> {
    let keyword = filter.require_keyword()?;

    let ts = |date: NaiveDate| to_core_data_ts(date.and_time(NaiveTime::MIN).and_utc());
    let first = db.rankings_near_date(keyword, filter, ts(date1))?;
    let second = db.rankings_near_date(keyword, filter, ts(date2))?;

    let first_by_key: HashMap<SeriesKey, Option<u32>> = first
        .into_iter()
        .map(|r| {
            (
                SeriesKey {
                    app: r.app,
                    keyword: r.keyword,
                    store: r.store,
                },
                r.rank,
            )
        })
        .collect();

    let comparisons: Vec<Comparison> = second
        .into_iter()
        .map(|r| {
            let key = SeriesKey {
                app: r.app.clone(),
                keyword: r.keyword.clone(),
                store: r.store,
            };
            let earlier = first_by_key.get(&key).copied().flatten();
            Comparison {
                keyword: r.keyword,
                app: r.app,
                store: r.store,
                ranking_date1: earlier,
                ranking_date2: r.rank,
                change: earlier
                    .zip(r.rank)
                    .map(|(a, b)| i64::from(a) - i64::from(b)),
                date1,
                date2,
            }
        })
        .collect();

    tracing::info!(count = comparisons.len(), %date1, %date2, "compared rankings");
    Ok(serde_json::to_value(comparisons)?)
}
