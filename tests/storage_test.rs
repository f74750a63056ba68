//! Query behavior against an in-memory database carrying the Astro schema

mod common;

use std::path::Path;

use astrolens::config::{history_cutoff, QueryFilter};
use astrolens::models::{to_core_data_ts, Store};
use astrolens::storage::AstroDatabase;
use astrolens::Error;
use chrono::{Duration, Utc};

use common::{
    insert_app, insert_keyword, insert_ranking_point, schema_conn, seeded_db, KeywordFixture,
};

fn store_filter(store: Store) -> QueryFilter {
    QueryFilter {
        store: Some(store),
        ..Default::default()
    }
}

#[test]
fn test_open_missing_file_is_not_found() {
    let err = AstroDatabase::open(Path::new("/nonexistent/Model.sqlite")).unwrap_err();
    assert!(matches!(err, Error::DatabaseNotFound { .. }));
    assert!(err.to_string().contains("/nonexistent/Model.sqlite"));
}

#[test]
fn test_open_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Model.sqlite");
    let conn = rusqlite::Connection::open(&path).unwrap();
    common::create_schema(&conn);
    drop(conn);

    let db = AstroDatabase::open(&path).unwrap();
    assert!(db.list_apps().unwrap().is_empty());
}

#[test]
fn test_list_apps_alphabetical() {
    let db = seeded_db();
    let apps = db.list_apps().unwrap();

    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0].name, "Bear");
    assert_eq!(apps[0].platform, Store::Ios);
    assert_eq!(apps[1].name, "Things");
    assert_eq!(apps[1].platform, Store::Mac);
}

#[test]
fn test_keyword_search_ranked_first() {
    let db = seeded_db();
    let rows = db
        .keyword_search("notes", &QueryFilter::default())
        .unwrap();

    // "notes" (rank 5) before "markdown notes" (rank 40); substring match
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].keyword, "notes");
    assert_eq!(rows[0].current_ranking, Some(5));
    assert_eq!(rows[1].keyword, "markdown notes");
}

#[test]
fn test_keyword_search_is_case_insensitive() {
    let db = seeded_db();
    let rows = db
        .keyword_search("NOTES", &QueryFilter::default())
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_app_keywords_unranked_sort_last() {
    let db = seeded_db();
    let filter = QueryFilter {
        app_name: Some("bear".to_string()),
        ..Default::default()
    };
    let rows = db.app_keywords(&filter).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].keyword, "notes");
    assert_eq!(rows[2].keyword, "todo list");
    assert_eq!(rows[2].current_ranking, None);
}

#[test]
fn test_store_filter_narrows_results() {
    let db = seeded_db();
    let rows = db
        .keyword_search("todo", &store_filter(Store::Mac))
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].app, "Things");
}

#[test]
fn test_app_id_filter_is_exact() {
    let db = seeded_db();
    let filter = QueryFilter {
        app_id: Some("1016366447".to_string()),
        ..Default::default()
    };
    let rows = db.app_keywords(&filter).unwrap();
    assert_eq!(rows.len(), 3);

    let filter = QueryFilter {
        app_id: Some("10163".to_string()),
        ..Default::default()
    };
    assert!(db.app_keywords(&filter).unwrap().is_empty());
}

#[test]
fn test_historical_rankings_window_and_order() {
    let conn = schema_conn();
    let app = insert_app(&conn, "Bear", "1016366447", 0);
    let keyword = insert_keyword(&conn, &KeywordFixture::new(app, "notes").ranked(5, 8));
    insert_ranking_point(&conn, keyword, 40, 80); // outside a 30-day window
    insert_ranking_point(&conn, keyword, 10, 20);
    insert_ranking_point(&conn, keyword, 2, 5);
    let db = AstroDatabase::from_connection(conn);

    let records = db
        .historical_rankings("notes", &QueryFilter::default(), history_cutoff(30))
        .unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].rank, Some(20));
    assert_eq!(records[1].rank, Some(5));
    assert!(records[0].date <= records[1].date);
}

#[test]
fn test_rankings_near_date_one_day_window() {
    let conn = schema_conn();
    let app = insert_app(&conn, "Bear", "1016366447", 0);
    let keyword = insert_keyword(&conn, &KeywordFixture::new(app, "notes").ranked(5, 8));
    insert_ranking_point(&conn, keyword, 10, 30);
    insert_ranking_point(&conn, keyword, 5, 12);
    let db = AstroDatabase::from_connection(conn);

    let target = to_core_data_ts(Utc::now() - Duration::days(10));
    let records = db
        .rankings_near_date("notes", &QueryFilter::default(), target)
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].rank, Some(30));
}

#[test]
fn test_app_ratings_most_recent_first() {
    let conn = schema_conn();
    let app = insert_app(&conn, "Bear", "1016366447", 0);
    common::insert_rating(&conn, app, 4.2, 100, 20);
    common::insert_rating(&conn, app, 4.6, 150, 2);
    let db = AstroDatabase::from_connection(conn);

    let filter = QueryFilter {
        app_name: Some("Bear".to_string()),
        ..Default::default()
    };
    let ratings = db.app_ratings(&filter, history_cutoff(30)).unwrap();

    assert_eq!(ratings.len(), 2);
    assert_eq!(ratings[0].avg_rating, Some(4.6));
    assert_eq!(ratings[1].avg_rating, Some(4.2));
}

#[test]
fn test_competitors_best_rank_first_with_limit() {
    let conn = schema_conn();
    for (name, rank) in [("Alpha", 30i64), ("Beta", 3), ("Gamma", 12)] {
        let app = insert_app(&conn, name, name, 0);
        insert_keyword(&conn, &KeywordFixture::new(app, "notes").ranked(rank, rank));
    }
    let db = AstroDatabase::from_connection(conn);

    let rows = db.keyword_competitors("notes", None, 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].app_name, "Beta");
    assert_eq!(rows[0].ranking, 3);
    assert_eq!(rows[1].app_name, "Gamma");
}

#[test]
fn test_similar_keywords_share_a_word() {
    let db = seeded_db();
    let rows = db.similar_keywords("markdown notes", None, 10).unwrap();

    // Word overlap on "notes"; the seed text itself is excluded
    let texts: Vec<&str> = rows.iter().map(|r| r.keyword.as_str()).collect();
    assert!(texts.contains(&"notes"));
    assert!(!texts.contains(&"markdown notes"));
}

#[test]
fn test_similar_keywords_popularity_descending() {
    let conn = schema_conn();
    let app = insert_app(&conn, "Bear", "1016366447", 0);
    insert_keyword(
        &conn,
        &KeywordFixture::new(app, "notes app").metrics(10.0, 30.0),
    );
    insert_keyword(
        &conn,
        &KeywordFixture::new(app, "quick notes").metrics(10.0, 80.0),
    );
    insert_keyword(&conn, &KeywordFixture::new(app, "notes widget"));
    let db = AstroDatabase::from_connection(conn);

    let rows = db.similar_keywords("notes", None, 10).unwrap();
    assert_eq!(rows[0].keyword, "quick notes");
    assert_eq!(rows[1].keyword, "notes app");
    // NULL popularity sorts last
    assert_eq!(rows[2].keyword, "notes widget");
}

#[test]
fn test_opportunity_rows_filter_bounds() {
    let db = seeded_db();
    let rows = db
        .opportunity_rows(&QueryFilter::default(), 20.0, 50.0)
        .unwrap();

    // "markdown notes" (25/45) and "todo list" iOS (20/35) pass; inclusive
    // bounds keep popularity exactly 20 out only when below
    let texts: Vec<&str> = rows.iter().map(|r| r.keyword.as_str()).collect();
    assert!(texts.contains(&"markdown notes"));
    assert!(texts.contains(&"todo list"));
    assert!(!texts.contains(&"notes")); // difficulty 55 exceeds the cap
}

#[test]
fn test_low_competition_ordering_and_filters() {
    let db = seeded_db();
    let rows = db.low_competition_rows(None, 30.0, 20.0, 20).unwrap();

    // markdown notes spread 20, todo list spread 15
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].keyword, "markdown notes");
    assert_eq!(rows[1].keyword, "todo list");
}

#[test]
fn test_anomaly_rows_threshold_and_order() {
    let db = seeded_db();
    let filter = QueryFilter {
        app_name: Some("Bear".to_string()),
        ..Default::default()
    };

    // markdown notes moved 50 positions, notes moved 3
    let rows = db.anomaly_rows(&filter, 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].keyword, "markdown notes");
    assert_eq!(rows[0].previous_ranking, Some(90));
    assert_eq!(rows[0].current_ranking, Some(40));

    let rows = db.anomaly_rows(&filter, 3).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].keyword, "markdown notes");
    assert_eq!(rows[1].keyword, "notes");
}
