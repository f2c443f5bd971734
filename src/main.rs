use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod db;
mod http;
mod models;
mod report;
mod stats;

use stats::GradingPolicy;

#[derive(Parser)]
#[command(name = "gradebook-stats")]
#[command(about = "Weighted grade statistics over a gradebook store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load deterministic sample grade data
    Seed,
    /// Import score entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Run the HTTP statistics server
    Serve {
        #[arg(long, default_value = "0.0.0.0:5050")]
        bind: String,
    },
    /// Print the threshold summary and top learners by weighted average
    Stats {
        #[arg(long)]
        class: Option<i32>,
        #[arg(long, default_value_t = 70.0)]
        threshold: f64,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("scope")
            .args(["class", "learner"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        class: Option<i32>,
        #[arg(long)]
        learner: Option<i32>,
        #[arg(long, default_value_t = 70.0)]
        threshold: f64,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} score entries from {}.", csv.display());
        }
        Commands::Serve { bind } => {
            let addr: SocketAddr = bind.parse().context("invalid bind address")?;
            let state = http::AppState {
                pool,
                policy: GradingPolicy::default(),
            };
            http::serve(state, addr).await?;
        }
        Commands::Stats {
            class,
            threshold,
            limit,
        } => {
            let policy = GradingPolicy {
                pass_threshold: threshold,
                ..GradingPolicy::default()
            };
            let rows = db::fetch_score_rows(&pool, class, None).await?;

            if rows.is_empty() {
                println!("No grades found for this scope.");
                return Ok(());
            }

            let summary = stats::summarize(&rows, &policy);
            println!(
                "Learners at or above {threshold}: {} of {} ({}%)",
                summary.passing, summary.total, summary.percentage
            );

            println!("Top learners by weighted average:");
            for average in stats::learner_averages(&rows, &policy).iter().take(limit) {
                println!("- learner {}: {:.2}", average.learner_id, average.weighted_avg);
            }
        }
        Commands::Report {
            class,
            learner,
            threshold,
            out,
        } => {
            let policy = GradingPolicy {
                pass_threshold: threshold,
                ..GradingPolicy::default()
            };
            let rows = db::fetch_score_rows(&pool, class, learner).await?;
            let report = report::build_report(class, learner, &rows, &policy);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
