//! astrolens - ASO ranking analytics over the Astro app's local database
//!
//! A command-line companion to the Astro Mac app: it reads the app's local
//! Core Data SQLite store (read-only) and derives keyword-ranking insights
//! from it.
//!
//! # Architecture
//!
//! - [`config`] - Query parameters, defaults, and database-path resolution
//! - [`commands`] - CLI operations tying storage and analytics together
//! - [`models`] - Core data structures and Core Data timestamp handling
//! - [`storage`] - Read-only SQLite access to the Astro database
//! - [`analytics`] - Pure ranking analytics: trends, anomalies, predictions,
//!   and portfolio health
//!
//! # Example
//!
//! ```no_run
//! use astrolens::analytics::{classify_trend, predict_ranking, TrendDirection};
//!
//! let ranks = [50, 40, 30];
//! assert_eq!(classify_trend(&ranks), TrendDirection::Improving);
//! let _forecast = predict_ranking(&ranks, 7);
//! ```

pub mod analytics;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analytics::{
        AnomalyEvent, Forecast, HealthStatus, MarketShare, Prediction, TrendDirection,
        TrendSummary,
    };
    pub use crate::config::{Period, QueryFilter};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{
        group_records, AppInfo, KeywordEntry, RankingRecord, RankingSeries, Store,
    };
    pub use crate::storage::AstroDatabase;
}

// Direct re-exports for convenience
pub use error::{Error, Result};
pub use models::Store;
