// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Training Planner
//!
//! A rolling 7-day training planner for endurance, strength and hybrid
//! athletes. Each planning cycle reads the athlete's goals, recent
//! activities and wellness data, and writes a calendar of sessions that
//! respects recovery spacing, a weekly hard-session budget and the
//! athlete's availability.
//!
//! ## Features
//!
//! - **Load signals**: hard-day detection, ACWR and same-day readiness
//! - **Periodization**: base/build/peak/taper phases toward a dated event
//! - **Guardrails**: no adjacent hard days, a hard budget per 7 days, one
//!   modality per day
//! - **Readiness gating**: low readiness downgrades the next session and
//!   carries a long run over to a later date
//! - **Reconciliation**: planned sessions resolve to completed, missed,
//!   skipped or cancelled with cited rules
//!
//! ## Architecture
//!
//! - **Models**: canonical sessions and activity records
//! - **Intake**: goals, constraints and baseline with validation
//! - **Engine**: pure planning transforms over an input snapshot
//! - **Calendar**: the persisted plan and its append-only adaptation log
//! - **Storage**: the flat-file boundary
//! - **Config**: thresholds and the missed-workout rule table
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use training_planner::config::Config;
//! use training_planner::engine::TrainingPlanner;
//! use training_planner::storage::{load_snapshot, FileStore, PlanStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let store = FileStore::new(&config.data_dir);
//!
//!     let now = Utc::now();
//!     let today = config.local_today(now);
//!     let snapshot = load_snapshot(&store, today, now, &config.timezone).await?;
//!
//!     let planner = TrainingPlanner::new(config.planner.clone(), config.rule_table()?);
//!     let cycle = planner.generate(&snapshot)?;
//!     store.save_calendar(&cycle.calendar).await?;
//!
//!     Ok(())
//! }
//! ```

/// Persisted plan container and weekly window projection
pub mod calendar;

/// Configuration management and persistence
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Planning and reconciliation engine
pub mod engine;

/// Goal, constraint and baseline document
pub mod intake;

/// Structured logging setup
pub mod logging;

/// Canonical data models and the activity normalization boundary
pub mod models;

/// Flat-file inputs and outputs
pub mod storage;
