use serde_json::Value;

use crate::config::{history_cutoff, QueryFilter};
use crate::error::Result;
use crate::storage::AstroDatabase;

/// List all tracked apps
pub fn apps(db: &AstroDatabase) -> Result<Value> {
    let apps = db.list_apps()?;
    tracing::info!(count = apps.len(), "listed tracked apps");
    Ok(serde_json::to_value(apps)?)
}

/// List every keyword tracked for an app
pub fn keywords(db: &AstroDatabase, filter: &QueryFilter) -> Result<Value> {
    filter.require_app()?;
    let rows = db.app_keywords(filter)?;
    tracing::info!(count = rows.len(), app = %filter.app_label(), "fetched app keywords");
    Ok(serde_json::to_value(rows)?)
}

/// Recent rating snapshots for an app
pub fn ratings(db: &AstroDatabase, filter: &QueryFilter, days_back: u32) -> Result<Value> {
    filter.require_app()?;
    let rows = db.app_ratings(filter, history_cutoff(days_back))?;
    tracing::info!(count = rows.len(), days_back, "fetched rating snapshots");
    Ok(serde_json::to_value(rows)?)
}
