//! Configuration and query-parameter handling for astrolens
//!
//! Every recognized option is an explicit field with an explicit default;
//! parameters are validated here, at the boundary, before reaching the
//! analytics functions.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::models::{to_core_data_ts, Store};

/// Default look-back window for historical queries (days)
pub const DEFAULT_DAYS_BACK: u32 = 30;

/// Default forecast horizon for predictions (days)
pub const DEFAULT_DAYS_FORWARD: u32 = 7;

/// History window predictions regress over (days)
pub const PREDICTION_HISTORY_DAYS: u32 = 30;

/// Default minimum rank change for anomaly detection
pub const DEFAULT_ANOMALY_THRESHOLD: u32 = 10;

/// Default result limit for competitor and similar-keyword queries
pub const DEFAULT_RESULT_LIMIT: u32 = 10;

/// Default opportunity filters
pub const DEFAULT_MIN_POPULARITY: f64 = 20.0;
pub const DEFAULT_MAX_DIFFICULTY: f64 = 50.0;

/// Default low-competition filters
pub const LOW_COMPETITION_MAX_DIFFICULTY: f64 = 30.0;
pub const LOW_COMPETITION_MIN_POPULARITY: f64 = 20.0;
pub const LOW_COMPETITION_LIMIT: u32 = 20;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "ASTROLENS_DB_PATH";

/// Astro's Core Data store, relative to the home directory
const ASTRO_DB_RELATIVE: &str =
    "Library/Containers/matteospada.it.ASO/Data/Library/Application Support/Astro/Model.sqlite";

/// Resolve the database path: explicit flag, then `ASTROLENS_DB_PATH`, then
/// the Astro app's container location under the home directory.
pub fn resolve_db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| Error::config("could not determine the home directory"))?;
    Ok(home.join(ASTRO_DB_RELATIVE))
}

/// Reporting period for trend queries
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl Period {
    /// Look-back window in days
    #[must_use]
    pub fn days(&self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
            Self::All => 3650,
        }
    }

    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Core Data timestamp for "now minus `days_back` days", the cutoff used by
/// historical queries.
#[must_use]
pub fn history_cutoff(days_back: u32) -> f64 {
    to_core_data_ts(Utc::now() - Duration::days(i64::from(days_back)))
}

/// Common query filter shared by most operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Keyword substring match (case-insensitive)
    pub keyword: Option<String>,

    /// App display-name substring match (case-insensitive)
    pub app_name: Option<String>,

    /// Exact store app identifier
    pub app_id: Option<String>,

    /// Marketplace filter
    pub store: Option<Store>,
}

impl QueryFilter {
    /// Require the keyword parameter. Whitespace-only input carries no
    /// matchable text and is rejected the same as a missing value.
    pub fn require_keyword(&self) -> Result<&str> {
        self.keyword
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::validation("keyword parameter is required"))
    }

    /// Require either an app name or an app id
    pub fn require_app(&self) -> Result<()> {
        if self.app_name.as_deref().is_some_and(|v| !v.is_empty())
            || self.app_id.as_deref().is_some_and(|v| !v.is_empty())
        {
            Ok(())
        } else {
            Err(Error::validation(
                "Either appName or appId parameter is required",
            ))
        }
    }

    /// Label used in reports when no app filter narrows the result
    #[must_use]
    pub fn app_label(&self) -> String {
        self.app_name
            .clone()
            .or_else(|| self.app_id.clone())
            .unwrap_or_else(|| "all".to_string())
    }

    /// Label used in reports for the store filter
    #[must_use]
    pub fn store_label(&self) -> String {
        self.store
            .map_or_else(|| "all".to_string(), |s| s.as_str().to_string())
    }
}
