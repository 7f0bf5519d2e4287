// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Constants Module
//!
//! Application constants and environment-based configuration values.
//! This module provides both hardcoded constants and environment variable configuration.

use std::env;

/// Service identity used by logging and the CLI
pub mod service {
    /// Default service name for structured logging
    pub const SERVICE_NAME: &str = "training-planner";

    /// Service version from Cargo.toml
    pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Directory name under the user's config dir
    pub const CONFIG_DIR_NAME: &str = "training-planner";

    /// Default config file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Environment-based configuration
pub mod env_config {
    use super::env;

    /// Get the data directory from environment or default
    pub fn data_dir() -> String {
        env::var("PLANNER_DATA_DIR").unwrap_or_else(|_| "./data".to_string())
    }

    /// Get the calendar time zone from environment or default to the host zone
    pub fn timezone() -> String {
        env::var("PLANNER_TIMEZONE").unwrap_or_else(|_| "local".to_string())
    }

    /// Get an explicit missed-workout rule table path from environment
    pub fn rules_path() -> Option<String> {
        env::var("PLANNER_RULES_PATH").ok()
    }

    /// Get log level from environment or default
    pub fn log_level() -> String {
        env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    }
}

/// File names inside the data directory
pub mod files {
    /// Goal/constraint/baseline document
    pub const INTAKE: &str = "intake.json";
    /// Append-only activity stream
    pub const ACTIVITIES: &str = "activities.jsonl";
    /// Append-only sleep/vitals stream
    pub const WELLNESS: &str = "wellness.jsonl";
    /// Optional illness/travel window
    pub const STATUS: &str = "status.json";
    /// Session IDs whose published events were deleted externally
    pub const CANCELLATIONS: &str = "cancellations.json";
    /// Persisted plan container
    pub const CALENDAR: &str = "calendar.json";
    /// Next-7-days projection for downstream consumers
    pub const WEEKLY_WINDOW: &str = "weekly.json";
}

/// Numeric limits and windows
pub mod limits {
    /// Number of calendar dates in one planning cycle
    pub const PLANNING_HORIZON_DAYS: i64 = 7;

    /// Trailing window for hard/very-hard dates and recent volume
    pub const RECENT_WINDOW_DAYS: i64 = 7;

    /// Trailing window for chronic load
    pub const CHRONIC_WINDOW_DAYS: i64 = 28;

    /// Past sessions and activity history kept in the calendar
    pub const HISTORY_RETENTION_DAYS: i64 = 28;

    /// Upper bound on strength dates protected from endurance in hybrid mode
    pub const PROTECTED_STRENGTH_DATES: u32 = 2;

    /// Minimum prior HRV readings before HRV contributes to readiness
    pub const MIN_HRV_BASELINE_READINGS: usize = 3;

    /// Durations are rounded to this many minutes
    pub const DURATION_ROUNDING_MINUTES: u32 = 5;

    /// Shortest session the builder will emit
    pub const MIN_SESSION_MINUTES: u32 = 15;
}

/// Rule identifiers cited by sessions and adaptation events
pub mod rule_ids {
    // Missed-workout rule table
    pub const LR_MISSED_SWAP_OR_SHORTEN: &str = "LR_MISSED_SWAP_OR_SHORTEN";
    pub const TEMPO_MISSED_DO_NOT_STACK: &str = "TEMPO_MISSED_DO_NOT_STACK";
    pub const INTERVALS_MISSED_DROP_FIRST: &str = "INTERVALS_MISSED_DROP_FIRST";
    pub const MP_MISSED_FOLD_INTO_LR: &str = "MP_MISSED_FOLD_INTO_LR";
    pub const STRENGTH_MISSED_RESUME_ROTATION: &str = "STRENGTH_MISSED_RESUME_ROTATION";
    pub const BIKE_MISSED_NO_MAKEUP: &str = "BIKE_MISSED_NO_MAKEUP";
    pub const SWIM_MISSED_NO_MAKEUP: &str = "SWIM_MISSED_NO_MAKEUP";
    pub const BRICK_MISSED_SPLIT_OR_DROP: &str = "BRICK_MISSED_SPLIT_OR_DROP";
    pub const Z2_SKIPPED_NO_SWAP: &str = "Z2_SKIPPED_NO_SWAP";
    pub const UNTRACKED_SKIPPED: &str = "UNTRACKED_SKIPPED";

    // Reconciliation
    pub const MATCHED_ACTIVITY: &str = "MATCHED_ACTIVITY";
    pub const STATUS_WINDOW_SKIP: &str = "STATUS_WINDOW_SKIP";
    pub const EXTERNAL_EVENT_DELETED: &str = "EXTERNAL_EVENT_DELETED";

    // Guardrails
    pub const GUARDRAIL_HARD_SPACING: &str = "GUARDRAIL_HARD_SPACING";
    pub const GUARDRAIL_HARD_BUDGET: &str = "GUARDRAIL_HARD_BUDGET";
    pub const GUARDRAIL_SINGLE_MODALITY: &str = "GUARDRAIL_SINGLE_MODALITY";
    pub const GUARDRAIL_ONE_PER_DAY: &str = "GUARDRAIL_ONE_PER_DAY";

    // Readiness and carry-over
    pub const READINESS_DOWNGRADE_SEVERE: &str = "READINESS_DOWNGRADE_SEVERE";
    pub const READINESS_DOWNGRADE_QUALITY: &str = "READINESS_DOWNGRADE_QUALITY";
    pub const LR_CARRYOVER_RELOCATED: &str = "LR_CARRYOVER_RELOCATED";
    pub const LR_CARRYOVER_REPLACED_Z2: &str = "LR_CARRYOVER_REPLACED_Z2";
    pub const LR_CARRYOVER_FAILED: &str = "LR_CARRYOVER_FAILED";

    // Load and periodization
    pub const DELOAD_ACWR: &str = "DELOAD_ACWR";
    pub const DELOAD_VOLUME_FALLBACK: &str = "DELOAD_VOLUME_FALLBACK";
    pub const DELOAD_PLANNED_WEEK: &str = "DELOAD_PLANNED_WEEK";
    pub const QUALITY_WEEK_PARITY: &str = "QUALITY_WEEK_PARITY";
    pub const BASE_TEMPO_GATE: &str = "BASE_TEMPO_GATE";
    pub const BUILD_QUALITY_ALTERNATION: &str = "BUILD_QUALITY_ALTERNATION";
    pub const PEAK_DOUBLE_QUALITY: &str = "PEAK_DOUBLE_QUALITY";
    pub const TAPER_SHARPEN: &str = "TAPER_SHARPEN";
    pub const TAPER_SHAKEOUT_ONLY: &str = "TAPER_SHAKEOUT_ONLY";
    pub const POST_EVENT_RECOVERY: &str = "POST_EVENT_RECOVERY";
    pub const LONG_CAP_RAISED: &str = "LONG_CAP_RAISED";
    pub const STRENGTH_VOLUME_REDUCED: &str = "STRENGTH_VOLUME_REDUCED";
}
