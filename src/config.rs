// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the training planner

pub mod planner_config;
pub mod rules;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{env_config, service};

pub use planner_config::PlannerConfig;
pub use rules::{MissedRule, RuleTable};

fn default_data_dir() -> PathBuf {
    PathBuf::from(env_config::data_dir())
}

fn default_timezone() -> String {
    env_config::timezone()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Directory holding intake, activity streams and the calendar
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Calendar time zone: `local`, `UTC`, or a fixed offset such as `-07:00`.
    /// Zone names (`America/Denver`) are kept as a label and resolve through
    /// the host's local zone.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub planner: PlannerConfig,
    /// Replacement missed-workout rule table
    #[serde(default)]
    pub rules_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            timezone: default_timezone(),
            planner: PlannerConfig::default(),
            rules_path: None,
        }
    }
}

fn default_config_path() -> String {
    dirs::config_dir()
        .map(|p| p.join(service::CONFIG_DIR_NAME).join(service::CONFIG_FILE_NAME))
        .unwrap_or_else(|| service::CONFIG_FILE_NAME.into())
        .to_string_lossy()
        .to_string()
}

impl Config {
    /// Load from an explicit path, the user config dir, or the environment
    pub fn load(path: Option<String>) -> Result<Self> {
        if let Some(config_path) = path {
            return Self::load_from_file(&config_path);
        }

        let config_path = default_config_path();
        if Path::new(&config_path).exists() {
            Self::load_from_file(&config_path)
        } else {
            dotenv::dotenv().ok();
            Ok(Self::from_env())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Defaults overridden by `PLANNER_*` variables
    pub fn from_env() -> Self {
        Self {
            data_dir: default_data_dir(),
            timezone: default_timezone(),
            planner: PlannerConfig::default(),
            rules_path: env_config::rules_path().map(PathBuf::from),
        }
    }

    pub fn save(&self, path: Option<String>) -> Result<()> {
        let config_path = path.unwrap_or_else(default_config_path);

        let parent = Path::new(&config_path)
            .parent()
            .context("Invalid config path")?;
        fs::create_dir_all(parent)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&config_path, content)?;

        Ok(())
    }

    /// Calendar date at `now` in the configured time zone
    pub fn local_today(&self, now: DateTime<Utc>) -> NaiveDate {
        match parse_offset(&self.timezone) {
            Some(offset) => now.with_timezone(&offset).date_naive(),
            None => now.with_timezone(&Local).date_naive(),
        }
    }

    /// Missed-workout rules: the configured file, or the built-in table
    pub fn rule_table(&self) -> Result<RuleTable> {
        match &self.rules_path {
            Some(path) => RuleTable::load_from_file(path)
                .with_context(|| format!("Failed to load rule table: {}", path.display())),
            None => Ok(RuleTable::default()),
        }
    }
}

/// `UTC`/`Z` or `±HH:MM`/`±HHMM`; anything else is not a fixed offset
fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let zone = zone.trim();
    if matches!(zone.to_ascii_uppercase().as_str(), "UTC" | "Z" | "GMT" | "ETC/UTC") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match zone.as_bytes().first()? {
        b'+' => (1, &zone[1..]),
        b'-' => (-1, &zone[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
