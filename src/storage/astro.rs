//! Read-only repository over Astro's Core Data SQLite file
//!
//! The schema is externally imposed by the Astro Mac app: Core Data tables
//! (`ZAPP`, `ZKEYWORD`, `ZRANKINGDATAPOINT`, `ZRATING`) with timestamps in
//! seconds since 2001-01-01 UTC. All queries are parameterized and filters
//! match case-insensitively, the way the app's own search behaves.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::config::QueryFilter;
use crate::error::{Error, Result};
use crate::models::{
    from_core_data_ts, AppInfo, KeywordEntry, RankingRecord, RatingEntry, Store,
};

/// Seconds in a day, the tolerance window for date-pinned ranking lookups
const DAY_SECONDS: f64 = 86_400.0;

/// An app ranking alongside others for the same keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRow {
    pub app_name: String,
    pub app_id: Option<String>,
    pub ranking: u32,
}

/// A keyword sharing words with a seed keyword
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarKeyword {
    pub keyword: String,
    pub difficulty: Option<f64>,
    pub popularity: Option<f64>,
    pub store: Store,
}

/// A keyword matching the opportunity filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityRow {
    pub keyword: String,
    pub current_ranking: Option<u32>,
    pub difficulty: Option<f64>,
    pub popularity: Option<f64>,
    pub competition: Option<i64>,
    pub store: Store,
}

/// A keyword matching the low-competition filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowCompetitionRow {
    pub keyword: String,
    pub difficulty: f64,
    pub popularity: f64,
    pub apps_count: Option<i64>,
    pub store: Store,
}

/// Read-only handle to the Astro database
#[derive(Debug)]
pub struct AstroDatabase {
    conn: Connection,
}

impl AstroDatabase {
    /// Open the database file read-only.
    ///
    /// # Errors
    /// [`Error::DatabaseNotFound`] when no file exists at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DatabaseNotFound {
                path: PathBuf::from(path),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.display(), "opened Astro database");
        Ok(Self { conn })
    }

    /// Wrap an existing connection. Used by tests with an in-memory fixture
    /// database carrying the same schema.
    #[must_use]
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// All tracked apps, alphabetically
    pub fn list_apps(&self) -> Result<Vec<AppInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT ZAPP.Z_PK, ZAPP.ZNAME, ZAPP.ZAPPID, ZAPP.ZDEVELOPER, ZAPP.ZPLATFORM
             FROM ZAPP
             ORDER BY ZAPP.ZNAME",
        )?;

        let apps = stmt
            .query_map([], |row| {
                Ok(AppInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    app_id: row.get(2)?,
                    developer: row.get(3)?,
                    platform: Store::from_platform(row.get(4)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(apps)
    }

    /// Keyword entries matching a keyword substring (search operation).
    /// Ranked entries come first, best rank leading.
    pub fn keyword_search(&self, keyword: &str, filter: &QueryFilter) -> Result<Vec<KeywordEntry>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZKEYWORD.ZTEXT, ZKEYWORD.ZCURRENTRANKING,
                    ZKEYWORD.ZPREVIOUSRANKING, ZKEYWORD.ZDIFFICULTY, ZKEYWORD.ZPOPULARITY,
                    ZKEYWORD.ZSTORE, ZKEYWORD.ZLASTUPDATE
             FROM ZKEYWORD
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE LOWER(ZKEYWORD.ZTEXT) LIKE LOWER(?)",
        );
        let mut params = vec![like(keyword)];
        push_filter(&mut sql, &mut params, filter);
        sql.push_str(" ORDER BY ZKEYWORD.ZCURRENTRANKING ASC NULLS LAST");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(KeywordEntry {
                    app: row.get(0)?,
                    keyword: row.get(1)?,
                    current_ranking: opt_rank(row.get(2)?),
                    previous_ranking: opt_rank(row.get(3)?),
                    difficulty: row.get(4)?,
                    popularity: row.get(5)?,
                    apps_count: None,
                    store: row.get(6)?,
                    last_update: opt_ts(row.get(7)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// All keyword entries for an app (the caller validates that an app
    /// filter is present)
    pub fn app_keywords(&self, filter: &QueryFilter) -> Result<Vec<KeywordEntry>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZKEYWORD.ZTEXT, ZKEYWORD.ZCURRENTRANKING,
                    ZKEYWORD.ZPREVIOUSRANKING, ZKEYWORD.ZDIFFICULTY, ZKEYWORD.ZPOPULARITY,
                    ZKEYWORD.ZAPPSCOUNT, ZKEYWORD.ZSTORE, ZKEYWORD.ZLASTUPDATE
             FROM ZKEYWORD
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE 1=1",
        );
        let mut params = Vec::new();
        push_filter(&mut sql, &mut params, filter);
        sql.push_str(" ORDER BY ZKEYWORD.ZCURRENTRANKING ASC NULLS LAST");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(KeywordEntry {
                    app: row.get(0)?,
                    keyword: row.get(1)?,
                    current_ranking: opt_rank(row.get(2)?),
                    previous_ranking: opt_rank(row.get(3)?),
                    difficulty: row.get(4)?,
                    popularity: row.get(5)?,
                    apps_count: row.get(6)?,
                    store: row.get(7)?,
                    last_update: opt_ts(row.get(8)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Ranking history for keyword matches, date ascending, newer than
    /// `cutoff` (Core Data seconds)
    pub fn historical_rankings(
        &self,
        keyword: &str,
        filter: &QueryFilter,
        cutoff: f64,
    ) -> Result<Vec<RankingRecord>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZKEYWORD.ZTEXT, ZKEYWORD.ZSTORE,
                    ZRANKINGDATAPOINT.ZRANKING, ZRANKINGDATAPOINT.ZDATE
             FROM ZRANKINGDATAPOINT
             JOIN ZKEYWORD ON ZRANKINGDATAPOINT.ZKEYWORD = ZKEYWORD.Z_PK
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE LOWER(ZKEYWORD.ZTEXT) LIKE LOWER(?)
             AND ZRANKINGDATAPOINT.ZDATE >= ?",
        );
        let mut params = vec![like(keyword), Value::Real(cutoff)];
        push_filter(&mut sql, &mut params, filter);
        sql.push_str(" ORDER BY ZRANKINGDATAPOINT.ZDATE ASC");

        self.ranking_rows(&sql, params)
    }

    /// Ranking observations within one day of `target` (Core Data seconds)
    pub fn rankings_near_date(
        &self,
        keyword: &str,
        filter: &QueryFilter,
        target: f64,
    ) -> Result<Vec<RankingRecord>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZKEYWORD.ZTEXT, ZKEYWORD.ZSTORE,
                    ZRANKINGDATAPOINT.ZRANKING, ZRANKINGDATAPOINT.ZDATE
             FROM ZRANKINGDATAPOINT
             JOIN ZKEYWORD ON ZRANKINGDATAPOINT.ZKEYWORD = ZKEYWORD.Z_PK
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE LOWER(ZKEYWORD.ZTEXT) LIKE LOWER(?)
             AND ABS(ZRANKINGDATAPOINT.ZDATE - ?) < ?",
        );
        let mut params = vec![like(keyword), Value::Real(target), Value::Real(DAY_SECONDS)];
        push_filter(&mut sql, &mut params, filter);

        self.ranking_rows(&sql, params)
    }

    fn ranking_rows(&self, sql: &str, params: Vec<Value>) -> Result<Vec<RankingRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(RankingRecord {
                    app: row.get(0)?,
                    keyword: row.get(1)?,
                    store: row.get(2)?,
                    rank: opt_rank(row.get(3)?),
                    date: core_date(row.get(4)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Rating snapshots newer than `cutoff`, most recent first
    pub fn app_ratings(&self, filter: &QueryFilter, cutoff: f64) -> Result<Vec<RatingEntry>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZRATING.ZAVERAGEUSERRATING, ZRATING.ZUSERRATINGCOUNT,
                    ZRATING.ZCOUNTRYNAME, ZRATING.ZSTORE, ZRATING.ZDATE
             FROM ZRATING
             JOIN ZAPP ON ZRATING.ZAPP = ZAPP.Z_PK
             WHERE ZRATING.ZDATE >= ?",
        );
        let mut params = vec![Value::Real(cutoff)];
        if let Some(name) = &filter.app_name {
            sql.push_str(" AND LOWER(ZAPP.ZNAME) LIKE LOWER(?)");
            params.push(like(name));
        }
        if let Some(id) = &filter.app_id {
            sql.push_str(" AND ZAPP.ZAPPID = ?");
            params.push(Value::Text(id.clone()));
        }
        if let Some(store) = filter.store {
            sql.push_str(" AND LOWER(ZRATING.ZSTORE) = LOWER(?)");
            params.push(Value::Text(store.as_str().to_string()));
        }
        sql.push_str(" ORDER BY ZRATING.ZDATE DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(RatingEntry {
                    app: row.get(0)?,
                    avg_rating: row.get(1)?,
                    rating_count: row.get(2)?,
                    country: row.get(3)?,
                    store: row.get(4)?,
                    date: core_date(row.get(5)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Apps ranked for a keyword, best rank first
    pub fn keyword_competitors(
        &self,
        keyword: &str,
        store: Option<Store>,
        limit: u32,
    ) -> Result<Vec<CompetitorRow>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZAPP.ZAPPID, ZKEYWORD.ZCURRENTRANKING
             FROM ZKEYWORD
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE LOWER(ZKEYWORD.ZTEXT) LIKE LOWER(?)
             AND ZKEYWORD.ZCURRENTRANKING IS NOT NULL",
        );
        let mut params = vec![like(keyword)];
        if let Some(store) = store {
            sql.push_str(" AND LOWER(ZKEYWORD.ZSTORE) = LOWER(?)");
            params.push(Value::Text(store.as_str().to_string()));
        }
        sql.push_str(" ORDER BY ZKEYWORD.ZCURRENTRANKING ASC LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(CompetitorRow {
                    app_name: row.get(0)?,
                    app_id: row.get(1)?,
                    ranking: row.get::<_, i64>(2)?.max(0) as u32,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Keywords sharing at least one word with the seed keyword, most
    /// popular first
    pub fn similar_keywords(
        &self,
        keyword: &str,
        store: Option<Store>,
        limit: u32,
    ) -> Result<Vec<SimilarKeyword>> {
        let words: Vec<&str> = keyword.split_whitespace().collect();
        let word_clause = words
            .iter()
            .map(|_| "LOWER(ZKEYWORD.ZTEXT) LIKE ?")
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut sql = format!(
            "SELECT DISTINCT ZKEYWORD.ZTEXT, ZKEYWORD.ZDIFFICULTY,
                    ZKEYWORD.ZPOPULARITY, ZKEYWORD.ZSTORE
             FROM ZKEYWORD
             WHERE ZKEYWORD.ZTEXT != ?
             AND ({word_clause})",
        );
        let mut params = vec![Value::Text(keyword.to_string())];
        for word in &words {
            params.push(like(&word.to_lowercase()));
        }
        if let Some(store) = store {
            sql.push_str(" AND LOWER(ZKEYWORD.ZSTORE) = LOWER(?)");
            params.push(Value::Text(store.as_str().to_string()));
        }
        sql.push_str(" ORDER BY ZKEYWORD.ZPOPULARITY DESC NULLS LAST LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(SimilarKeyword {
                    keyword: row.get(0)?,
                    difficulty: row.get(1)?,
                    popularity: row.get(2)?,
                    store: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Keywords passing the opportunity filters, best popularity/difficulty
    /// spread first
    pub fn opportunity_rows(
        &self,
        filter: &QueryFilter,
        min_popularity: f64,
        max_difficulty: f64,
    ) -> Result<Vec<OpportunityRow>> {
        let mut sql = String::from(
            "SELECT ZKEYWORD.ZTEXT, ZKEYWORD.ZCURRENTRANKING, ZKEYWORD.ZDIFFICULTY,
                    ZKEYWORD.ZPOPULARITY, ZKEYWORD.ZAPPSCOUNT, ZKEYWORD.ZSTORE
             FROM ZKEYWORD
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE ZKEYWORD.ZPOPULARITY >= ?
             AND ZKEYWORD.ZDIFFICULTY <= ?",
        );
        let mut params = vec![Value::Real(min_popularity), Value::Real(max_difficulty)];
        push_filter(&mut sql, &mut params, filter);
        sql.push_str(" ORDER BY (ZKEYWORD.ZPOPULARITY - ZKEYWORD.ZDIFFICULTY) DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(OpportunityRow {
                    keyword: row.get(0)?,
                    current_ranking: opt_rank(row.get(1)?),
                    difficulty: row.get(2)?,
                    popularity: row.get(3)?,
                    competition: row.get(4)?,
                    store: row.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Keywords with low difficulty and decent popularity across all
    /// tracked apps
    pub fn low_competition_rows(
        &self,
        store: Option<Store>,
        max_difficulty: f64,
        min_popularity: f64,
        limit: u32,
    ) -> Result<Vec<LowCompetitionRow>> {
        let mut sql = String::from(
            "SELECT DISTINCT ZKEYWORD.ZTEXT, ZKEYWORD.ZDIFFICULTY, ZKEYWORD.ZPOPULARITY,
                    ZKEYWORD.ZAPPSCOUNT, ZKEYWORD.ZSTORE
             FROM ZKEYWORD
             WHERE ZKEYWORD.ZDIFFICULTY <= ?
             AND ZKEYWORD.ZPOPULARITY >= ?
             AND ZKEYWORD.ZDIFFICULTY IS NOT NULL
             AND ZKEYWORD.ZPOPULARITY IS NOT NULL",
        );
        let mut params = vec![Value::Real(max_difficulty), Value::Real(min_popularity)];
        if let Some(store) = store {
            sql.push_str(" AND LOWER(ZKEYWORD.ZSTORE) = LOWER(?)");
            params.push(Value::Text(store.as_str().to_string()));
        }
        sql.push_str(" ORDER BY (ZKEYWORD.ZPOPULARITY - ZKEYWORD.ZDIFFICULTY) DESC LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(LowCompetitionRow {
                    keyword: row.get(0)?,
                    difficulty: row.get(1)?,
                    popularity: row.get(2)?,
                    apps_count: row.get(3)?,
                    store: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Keyword entries whose current and previous ranks are both present and
    /// differ by at least `threshold`, largest movement first
    pub fn anomaly_rows(&self, filter: &QueryFilter, threshold: u32) -> Result<Vec<KeywordEntry>> {
        let mut sql = String::from(
            "SELECT ZAPP.ZNAME, ZKEYWORD.ZTEXT, ZKEYWORD.ZCURRENTRANKING,
                    ZKEYWORD.ZPREVIOUSRANKING, ZKEYWORD.ZDIFFICULTY, ZKEYWORD.ZPOPULARITY,
                    ZKEYWORD.ZSTORE, ZKEYWORD.ZLASTUPDATE
             FROM ZKEYWORD
             JOIN ZAPP ON ZKEYWORD.ZAPP = ZAPP.Z_PK
             WHERE ZKEYWORD.ZCURRENTRANKING IS NOT NULL
             AND ZKEYWORD.ZPREVIOUSRANKING IS NOT NULL
             AND ABS(ZKEYWORD.ZCURRENTRANKING - ZKEYWORD.ZPREVIOUSRANKING) >= ?",
        );
        let mut params = vec![Value::Integer(i64::from(threshold))];
        push_filter(&mut sql, &mut params, filter);
        sql.push_str(
            " ORDER BY ABS(ZKEYWORD.ZCURRENTRANKING - ZKEYWORD.ZPREVIOUSRANKING) DESC",
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                Ok(KeywordEntry {
                    app: row.get(0)?,
                    keyword: row.get(1)?,
                    current_ranking: opt_rank(row.get(2)?),
                    previous_ranking: opt_rank(row.get(3)?),
                    difficulty: row.get(4)?,
                    popularity: row.get(5)?,
                    apps_count: None,
                    store: row.get(6)?,
                    last_update: opt_ts(row.get(7)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

/// LIKE pattern for a substring match
fn like(term: &str) -> Value {
    Value::Text(format!("%{term}%"))
}

/// Append the shared keyword-table filters to a query
fn push_filter(sql: &mut String, params: &mut Vec<Value>, filter: &QueryFilter) {
    if let Some(store) = filter.store {
        sql.push_str(" AND LOWER(ZKEYWORD.ZSTORE) = LOWER(?)");
        params.push(Value::Text(store.as_str().to_string()));
    }
    if let Some(name) = &filter.app_name {
        sql.push_str(" AND LOWER(ZAPP.ZNAME) LIKE LOWER(?)");
        params.push(like(name));
    }
    if let Some(id) = &filter.app_id {
        sql.push_str(" AND ZAPP.ZAPPID = ?");
        params.push(Value::Text(id.clone()));
    }
}

fn opt_rank(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

fn opt_ts(value: Option<f64>) -> Option<chrono::DateTime<chrono::Utc>> {
    value.and_then(from_core_data_ts)
}

/// Out-of-range timestamps collapse to the date floor rather than failing
/// the whole row
fn core_date(secs: f64) -> NaiveDate {
    from_core_data_ts(secs).map_or(NaiveDate::MIN, |dt| dt.date_naive())
}
