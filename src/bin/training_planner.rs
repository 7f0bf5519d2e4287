// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

use training_planner::config::Config;
use training_planner::engine::TrainingPlanner;
use training_planner::intake::IntakeError;
use training_planner::logging;
use training_planner::storage::{load_snapshot, FileStore, PlanStore};

#[derive(Parser)]
#[command(name = "training-planner")]
#[command(version, about = "Rolling 7-day training planner")]
struct Cli {
    /// Config file (defaults to the user config dir, then environment)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Directory holding intake, streams and the calendar
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Planning date, YYYY-MM-DD (defaults to today in the configured time zone)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one planning cycle and rewrite the calendar and weekly window
    Generate,

    /// Resolve planned sessions against performed activities
    Reconcile,

    /// Print the next 7 days of the persisted calendar
    Window,

    /// Validate the intake document
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env()?;

    let cli = Cli::parse();

    let mut config = Config::load(cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    let now = Utc::now();
    let today = cli.today.unwrap_or_else(|| config.local_today(now));
    let store = FileStore::new(&config.data_dir);

    info!(
        data_dir = %config.data_dir.display(),
        today = %today,
        "Training planner starting"
    );

    match cli.command {
        Commands::Generate => generate(&config, &store, today).await,
        Commands::Reconcile => reconcile(&config, &store, today).await,
        Commands::Window => window(&store, today).await,
        Commands::Validate => validate(&store).await,
    }
}

async fn generate(config: &Config, store: &FileStore, today: NaiveDate) -> Result<()> {
    let now = Utc::now();
    let snapshot = load_snapshot(store, today, now, &config.timezone).await?;
    let planner = TrainingPlanner::new(config.planner.clone(), config.rule_table()?);

    let cycle = planner
        .generate(&snapshot)
        .context("Planning cycle failed")?;
    let window = cycle.calendar.weekly_window(today);

    store
        .save_calendar(&cycle.calendar)
        .await
        .context("Failed to save calendar")?;
    store
        .save_weekly_window(&window)
        .await
        .context("Failed to save weekly window")?;

    println!("{}", serde_json::to_string_pretty(&window)?);
    Ok(())
}

async fn reconcile(config: &Config, store: &FileStore, today: NaiveDate) -> Result<()> {
    let mut calendar = store
        .load_calendar()
        .await?
        .context("No calendar found; run `generate` first")?;
    let activities = store.load_activities().await?;
    let status_window = store.load_status_window().await?;
    let cancellations = store.load_cancellations().await?;

    let planner = TrainingPlanner::new(config.planner.clone(), config.rule_table()?);
    let report = planner.reconcile(
        &mut calendar,
        &activities,
        status_window.as_ref(),
        &cancellations,
        today,
        Utc::now(),
    );

    store
        .save_calendar(&calendar)
        .await
        .context("Failed to save calendar")?;
    store
        .save_weekly_window(&calendar.weekly_window(today))
        .await
        .context("Failed to save weekly window")?;

    let summary = json!({
        "completed": report.completed,
        "missed": report.missed,
        "skipped": report.skipped,
        "cancelled": report.cancelled,
        "events": report.events,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn window(store: &FileStore, today: NaiveDate) -> Result<()> {
    let calendar = store
        .load_calendar()
        .await?
        .context("No calendar found; run `generate` first")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&calendar.weekly_window(today))?
    );
    Ok(())
}

async fn validate(store: &FileStore) -> Result<()> {
    let intake = store
        .load_intake()
        .await
        .context("Failed to load intake")?;

    match intake.validate() {
        Ok(()) => {
            println!("{}", json!({ "valid": true, "violations": [] }));
            Ok(())
        }
        Err(IntakeError::Invalid { violations }) => {
            let count = violations.len();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "valid": false, "violations": violations }))?
            );
            anyhow::bail!("Intake has {} violation(s)", count)
        }
    }
}
