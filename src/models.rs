//! Core data structures: marketplace tags, keyword and ranking records, and
//! Core Data timestamp conversion.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Seconds between the Unix epoch and the Core Data reference date
/// (2001-01-01T00:00:00Z). Astro stores all timestamps relative to the latter.
pub const CORE_DATA_UNIX_OFFSET: i64 = 978_307_200;

/// Convert a Core Data timestamp (seconds since 2001-01-01 UTC) to UTC time.
#[must_use]
pub fn from_core_data_ts(secs: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(CORE_DATA_UNIX_OFFSET + secs as i64, 0).single()
}

/// Convert a UTC time to a Core Data timestamp.
#[must_use]
pub fn to_core_data_ts(ts: DateTime<Utc>) -> f64 {
    (ts.timestamp() - CORE_DATA_UNIX_OFFSET) as f64
}

/// App Store marketplace tag
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Ios,
    Mac,
}

impl Store {
    /// Parse a store tag case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Some(Self::Ios),
            "mac" => Some(Self::Mac),
            _ => None,
        }
    }

    /// Map the `ZAPP.ZPLATFORM` integer column (0 = iOS, anything else = Mac)
    #[must_use]
    pub fn from_platform(platform: i64) -> Self {
        if platform == 0 {
            Self::Ios
        } else {
            Self::Mac
        }
    }

    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Mac => "mac",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a `ZSTORE` column holds an unrecognized tag
#[derive(Debug, thiserror::Error)]
#[error("unrecognized store tag: {0}")]
pub struct StoreParseError(pub String);

impl FromSql for Store {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Store::parse(text)
            .ok_or_else(|| FromSqlError::Other(Box::new(StoreParseError(text.to_string()))))
    }
}

impl ToSql for Store {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// A tracked app as stored in `ZAPP`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub id: i64,
    pub name: String,
    pub app_id: Option<String>,
    pub developer: Option<String>,
    pub platform: Store,
}

/// A tracked keyword with its latest rankings and metrics (`ZKEYWORD` row)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordEntry {
    pub app: String,
    pub keyword: String,
    pub current_ranking: Option<u32>,
    pub previous_ranking: Option<u32>,
    pub difficulty: Option<f64>,
    pub popularity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apps_count: Option<i64>,
    pub store: Store,
    pub last_update: Option<DateTime<Utc>>,
}

/// One observed rank for a keyword/app/store on a date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRecord {
    pub app: String,
    pub keyword: String,
    pub store: Store,
    pub date: NaiveDate,
    pub rank: Option<u32>,
}

/// Grouping key for a ranking series: one (app, keyword, store) combination
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub app: String,
    pub keyword: String,
    pub store: Store,
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.app, self.keyword, self.store)
    }
}

/// A dated rank observation within a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatedRank {
    pub date: NaiveDate,
    pub ranking: u32,
}

/// Time-ordered rank observations for one (app, keyword, store) combination.
///
/// Built transiently by [`group_records`]; observation order is preserved as
/// fed by the caller (the data-access layer queries date ascending), the
/// series itself never re-sorts.
#[derive(Debug, Clone)]
pub struct RankingSeries {
    pub key: SeriesKey,
    pub points: Vec<DatedRank>,
}

impl RankingSeries {
    /// Create an empty series for a key
    #[must_use]
    pub fn new(key: SeriesKey) -> Self {
        Self {
            key,
            points: Vec::new(),
        }
    }

    /// Get the number of observations
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if there are no observations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rank values in observation order
    #[must_use]
    pub fn ranks(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.ranking).collect()
    }

    /// Most recent observed rank
    #[must_use]
    pub fn latest(&self) -> Option<u32> {
        self.points.last().map(|p| p.ranking)
    }
}

/// Group raw ranking records into per-key series.
///
/// Records sharing an (app, keyword, store) key merge into one series in the
/// order provided. Unranked observations carry no position and are excluded.
pub fn group_records<I>(records: I) -> BTreeMap<SeriesKey, RankingSeries>
where
    I: IntoIterator<Item = RankingRecord>,
{
    let mut grouped: BTreeMap<SeriesKey, RankingSeries> = BTreeMap::new();

    for record in records {
        let Some(rank) = record.rank else { continue };
        let key = SeriesKey {
            app: record.app,
            keyword: record.keyword,
            store: record.store,
        };
        grouped
            .entry(key.clone())
            .or_insert_with(|| RankingSeries::new(key))
            .points
            .push(DatedRank {
                date: record.date,
                ranking: rank,
            });
    }

    grouped
}

/// A rating snapshot for an app (`ZRATING` row)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingEntry {
    pub app: String,
    pub avg_rating: Option<f64>,
    pub rating_count: Option<i64>,
    pub country: Option<String>,
    pub store: Store,
    pub date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(app: &str, keyword: &str, date: NaiveDate, rank: Option<u32>) -> RankingRecord {
        RankingRecord {
            app: app.to_string(),
            keyword: keyword.to_string(),
            store: Store::Ios,
            date,
            rank,
        }
    }

    #[test]
    fn test_store_parse() {
        assert_eq!(Store::parse("ios"), Some(Store::Ios));
        assert_eq!(Store::parse("MAC"), Some(Store::Mac));
        assert_eq!(Store::parse("android"), None);
    }

    #[test]
    fn test_store_from_platform() {
        assert_eq!(Store::from_platform(0), Store::Ios);
        assert_eq!(Store::from_platform(1), Store::Mac);
    }

    #[test]
    fn test_core_data_epoch_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let cd = to_core_data_ts(ts);
        assert_eq!(from_core_data_ts(cd), Some(ts));
    }

    #[test]
    fn test_core_data_epoch_zero() {
        let reference = from_core_data_ts(0.0).unwrap();
        assert_eq!(
            reference,
            Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_group_records_merges_by_key() {
        let d1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();

        let grouped = group_records(vec![
            record("Bear", "notes", d1, Some(20)),
            record("Bear", "notes", d2, Some(15)),
            record("Bear", "markdown", d1, Some(3)),
        ]);

        assert_eq!(grouped.len(), 2);
        let key = SeriesKey {
            app: "Bear".to_string(),
            keyword: "notes".to_string(),
            store: Store::Ios,
        };
        assert_eq!(grouped[&key].ranks(), vec![20, 15]);
    }

    #[test]
    fn test_group_records_skips_unranked() {
        let d1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let grouped = group_records(vec![record("Bear", "notes", d1, None)]);
        assert!(grouped.is_empty());
    }

    #[test]
    fn test_series_key_display() {
        let key = SeriesKey {
            app: "Bear".to_string(),
            keyword: "notes".to_string(),
            store: Store::Mac,
        };
        assert_eq!(key.to_string(), "Bear|notes|mac");
    }
}
