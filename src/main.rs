use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use astrolens::commands;
use astrolens::config::{self, Period, QueryFilter};
use astrolens::models::Store;
use astrolens::storage::AstroDatabase;

#[derive(Parser)]
#[command(
    name = "astrolens",
    version,
    about = "ASO ranking analytics over the Astro app's local database",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the Astro Model.sqlite file (defaults to the app container)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

/// Filters shared by most subcommands
#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Keyword substring to match (case-insensitive)
    #[arg(short, long)]
    keyword: Option<String>,

    /// App display-name substring to match (case-insensitive)
    #[arg(long)]
    app_name: Option<String>,

    /// Exact store app identifier
    #[arg(long)]
    app_id: Option<String>,

    /// Marketplace to filter by
    #[arg(short, long, value_enum)]
    store: Option<Store>,
}

impl From<FilterArgs> for QueryFilter {
    fn from(args: FilterArgs) -> Self {
        Self {
            keyword: args.keyword,
            app_name: args.app_name,
            app_id: args.app_id,
            store: args.store,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List all tracked apps
    Apps,

    /// Search current keyword rankings
    Search {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List every keyword tracked for an app
    Keywords {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Historical ranking series for a keyword
    History {
        #[command(flatten)]
        filter: FilterArgs,

        /// Days of history to include
        #[arg(long, default_value_t = config::DEFAULT_DAYS_BACK)]
        days_back: u32,
    },

    /// Trend summaries for a keyword
    Trends {
        #[command(flatten)]
        filter: FilterArgs,

        /// Reporting period
        #[arg(short, long, value_enum, default_value_t = Period::Month)]
        period: Period,
    },

    /// Compare rankings observed near two dates
    Compare {
        #[command(flatten)]
        filter: FilterArgs,

        /// Earlier date (YYYY-MM-DD)
        #[arg(long)]
        date1: NaiveDate,

        /// Later date (YYYY-MM-DD)
        #[arg(long)]
        date2: NaiveDate,
    },

    /// Recent rating snapshots for an app
    Ratings {
        #[command(flatten)]
        filter: FilterArgs,

        /// Days of history to include
        #[arg(long, default_value_t = config::DEFAULT_DAYS_BACK)]
        days_back: u32,
    },

    /// Apps competing for a keyword
    Competitors {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of competitors to return
        #[arg(short, long, default_value_t = config::DEFAULT_RESULT_LIMIT)]
        limit: u32,
    },

    /// Keywords similar to a seed keyword
    Similar {
        #[command(flatten)]
        filter: FilterArgs,

        /// Maximum number of keywords to return
        #[arg(short, long, default_value_t = config::DEFAULT_RESULT_LIMIT)]
        limit: u32,
    },

    /// Competitive landscape for an app's keyword portfolio
    Landscape {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Keyword opportunities for an app
    Opportunities {
        #[command(flatten)]
        filter: FilterArgs,

        /// Minimum keyword popularity
        #[arg(long, default_value_t = config::DEFAULT_MIN_POPULARITY)]
        min_popularity: f64,

        /// Maximum keyword difficulty
        #[arg(long, default_value_t = config::DEFAULT_MAX_DIFFICULTY)]
        max_difficulty: f64,
    },

    /// Keywords with sudden ranking movements
    Anomalies {
        #[command(flatten)]
        filter: FilterArgs,

        /// Minimum rank change to report
        #[arg(short, long, default_value_t = config::DEFAULT_ANOMALY_THRESHOLD)]
        threshold: u32,
    },

    /// Forecast rankings via linear regression
    Predict {
        #[command(flatten)]
        filter: FilterArgs,

        /// Days into the future to forecast
        #[arg(long, default_value_t = config::DEFAULT_DAYS_FORWARD)]
        days_forward: u32,
    },

    /// Low-competition keywords across all tracked apps
    LowCompetition {
        /// Marketplace to filter by
        #[arg(short, long, value_enum)]
        store: Option<Store>,

        /// Maximum keyword difficulty
        #[arg(long, default_value_t = config::LOW_COMPETITION_MAX_DIFFICULTY)]
        max_difficulty: f64,

        /// Minimum keyword popularity
        #[arg(long, default_value_t = config::LOW_COMPETITION_MIN_POPULARITY)]
        min_popularity: f64,

        /// Maximum number of keywords to return
        #[arg(short, long, default_value_t = config::LOW_COMPETITION_LIMIT)]
        limit: u32,
    },

    /// Overall ASO health report for an app
    Health {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_format, cli.verbose) {
        eprintln!("failed to initialize logging: {e}");
    }

    // The envelope is the only stdout output; logging goes to stderr
    match run(cli) {
        Ok(data) => {
            println!("{}", serde_json::json!({ "success": true, "data": data }));
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "success": false, "error": e.to_string() }));
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> astrolens::Result<serde_json::Value> {
    let db_path = config::resolve_db_path(cli.db_path)?;
    let db = AstroDatabase::open(&db_path)?;

    match cli.command {
        Commands::Apps => commands::apps(&db),
        Commands::Search { filter } => commands::search(&db, &filter.into()),
        Commands::Keywords { filter } => commands::keywords(&db, &filter.into()),
        Commands::History { filter, days_back } => {
            commands::history(&db, &filter.into(), days_back)
        }
        Commands::Trends { filter, period } => commands::trends(&db, &filter.into(), period),
        Commands::Compare {
            filter,
            date1,
            date2,
        } => commands::compare(&db, &filter.into(), date1, date2),
        Commands::Ratings { filter, days_back } => {
            commands::ratings(&db, &filter.into(), days_back)
        }
        Commands::Competitors { filter, limit } => {
            commands::competitors(&db, &filter.into(), limit)
        }
        Commands::Similar { filter, limit } => commands::similar(&db, &filter.into(), limit),
        Commands::Landscape { filter } => commands::landscape(&db, &filter.into()),
        Commands::Opportunities {
            filter,
            min_popularity,
            max_difficulty,
        } => commands::opportunities(&db, &filter.into(), min_popularity, max_difficulty),
        Commands::Anomalies { filter, threshold } => {
            commands::anomalies(&db, &filter.into(), threshold)
        }
        Commands::Predict {
            filter,
            days_forward,
        } => commands::predict(&db, &filter.into(), days_forward),
        Commands::LowCompetition {
            store,
            max_difficulty,
            min_popularity,
            limit,
        } => commands::low_competition(&db, store, max_difficulty, min_popularity, limit),
        Commands::Health { filter } => commands::health(&db, &filter.into()),
    }
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("astrolens=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("astrolens=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()?;
        }
    }

    Ok(())
}
