//! Shared fixtures: an in-memory database carrying the Astro Core Data schema

#![allow(dead_code)]

use chrono::{Duration, Utc};
use rusqlite::{params, Connection};

use astrolens::models::to_core_data_ts;
use astrolens::storage::AstroDatabase;

/// Create the Core Data tables astrolens queries
pub fn create_schema(conn: &Connection) {
    conn.execute_batch(
        "CREATE TABLE ZAPP (
             Z_PK INTEGER PRIMARY KEY,
             ZNAME TEXT NOT NULL,
             ZAPPID TEXT,
             ZDEVELOPER TEXT,
             ZPLATFORM INTEGER NOT NULL
         );
         CREATE TABLE ZKEYWORD (
             Z_PK INTEGER PRIMARY KEY,
             ZTEXT TEXT NOT NULL,
             ZCURRENTRANKING INTEGER,
             ZPREVIOUSRANKING INTEGER,
             ZDIFFICULTY REAL,
             ZPOPULARITY REAL,
             ZSTORE TEXT NOT NULL,
             ZAPPSCOUNT INTEGER,
             ZLASTUPDATE REAL,
             ZAPP INTEGER NOT NULL
         );
         CREATE TABLE ZRANKINGDATAPOINT (
             Z_PK INTEGER PRIMARY KEY,
             ZRANKING INTEGER,
             ZDATE REAL NOT NULL,
             ZKEYWORD INTEGER NOT NULL
         );
         CREATE TABLE ZRATING (
             Z_PK INTEGER PRIMARY KEY,
             ZAVERAGEUSERRATING REAL,
             ZUSERRATINGCOUNT INTEGER,
             ZCOUNTRYNAME TEXT,
             ZSTORE TEXT NOT NULL,
             ZDATE REAL NOT NULL,
             ZAPP INTEGER NOT NULL
         );",
    )
    .expect("fixture schema");
}

pub fn insert_app(conn: &Connection, name: &str, app_id: &str, platform: i64) -> i64 {
    conn.execute(
        "INSERT INTO ZAPP (ZNAME, ZAPPID, ZDEVELOPER, ZPLATFORM) VALUES (?1, ?2, ?3, ?4)",
        params![name, app_id, "Fixture Dev", platform],
    )
    .expect("insert app");
    conn.last_insert_rowid()
}

#[derive(Debug, Clone)]
pub struct KeywordFixture<'a> {
    pub app: i64,
    pub text: &'a str,
    pub current: Option<i64>,
    pub previous: Option<i64>,
    pub difficulty: Option<f64>,
    pub popularity: Option<f64>,
    pub store: &'a str,
    pub apps_count: Option<i64>,
}

impl<'a> KeywordFixture<'a> {
    pub fn new(app: i64, text: &'a str) -> Self {
        Self {
            app,
            text,
            current: None,
            previous: None,
            difficulty: None,
            popularity: None,
            store: "ios",
            apps_count: None,
        }
    }

    pub fn ranked(mut self, current: i64, previous: i64) -> Self {
        self.current = Some(current);
        self.previous = Some(previous);
        self
    }

    pub fn metrics(mut self, difficulty: f64, popularity: f64) -> Self {
        self.difficulty = Some(difficulty);
        self.popularity = Some(popularity);
        self
    }

    pub fn store(mut self, store: &'a str) -> Self {
        self.store = store;
        self
    }
}

pub fn insert_keyword(conn: &Connection, fixture: &KeywordFixture<'_>) -> i64 {
    let last_update = to_core_data_ts(Utc::now());
    conn.execute(
        "INSERT INTO ZKEYWORD
             (ZTEXT, ZCURRENTRANKING, ZPREVIOUSRANKING, ZDIFFICULTY, ZPOPULARITY,
              ZSTORE, ZAPPSCOUNT, ZLASTUPDATE, ZAPP)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            fixture.text,
            fixture.current,
            fixture.previous,
            fixture.difficulty,
            fixture.popularity,
            fixture.store,
            fixture.apps_count,
            last_update,
            fixture.app,
        ],
    )
    .expect("insert keyword");
    conn.last_insert_rowid()
}

/// Insert a ranking observation `days_ago` days before now
pub fn insert_ranking_point(conn: &Connection, keyword: i64, days_ago: i64, ranking: i64) {
    let date = to_core_data_ts(Utc::now() - Duration::days(days_ago));
    conn.execute(
        "INSERT INTO ZRANKINGDATAPOINT (ZRANKING, ZDATE, ZKEYWORD) VALUES (?1, ?2, ?3)",
        params![ranking, date, keyword],
    )
    .expect("insert ranking point");
}

pub fn insert_rating(conn: &Connection, app: i64, avg: f64, count: i64, days_ago: i64) {
    let date = to_core_data_ts(Utc::now() - Duration::days(days_ago));
    conn.execute(
        "INSERT INTO ZRATING (ZAVERAGEUSERRATING, ZUSERRATINGCOUNT, ZCOUNTRYNAME, ZSTORE, ZDATE, ZAPP)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![avg, count, "United States", "ios", date, app],
    )
    .expect("insert rating");
}

/// In-memory connection with the Astro schema and no rows.
/// Seed it with the insert helpers, then wrap via `AstroDatabase::from_connection`.
pub fn schema_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("in-memory db");
    create_schema(&conn);
    conn
}

/// Fixture database with two apps and a representative keyword portfolio.
///
/// Bear (iOS): "notes" ranked 5 (prev 8), "markdown notes" ranked 40 (prev 90),
/// "todo list" unranked. Things (Mac): "todo list" ranked 12 (prev 10).
pub fn seeded_db() -> AstroDatabase {
    let conn = Connection::open_in_memory().expect("in-memory db");
    create_schema(&conn);

    let bear = insert_app(&conn, "Bear", "1016366447", 0);
    let things = insert_app(&conn, "Things", "904280696", 1);

    let notes = insert_keyword(
        &conn,
        &KeywordFixture::new(bear, "notes")
            .ranked(5, 8)
            .metrics(55.0, 70.0),
    );
    insert_keyword(
        &conn,
        &KeywordFixture::new(bear, "markdown notes")
            .ranked(40, 90)
            .metrics(25.0, 45.0),
    );
    insert_keyword(
        &conn,
        &KeywordFixture::new(bear, "todo list").metrics(20.0, 35.0),
    );
    insert_keyword(
        &conn,
        &KeywordFixture::new(things, "todo list")
            .ranked(12, 10)
            .metrics(60.0, 80.0)
            .store("mac"),
    );

    // A 30-day improving history for Bear / "notes"
    for (days_ago, rank) in [(6, 20), (4, 15), (2, 5)] {
        insert_ranking_point(&conn, notes, days_ago, rank);
    }

    insert_rating(&conn, bear, 4.6, 12_345, 3);

    AstroDatabase::from_connection(conn)
}
