// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Planner thresholds for load signals, periodization, readiness and matching

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// All numeric knobs of the planning engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PlannerConfig {
    pub signals: SignalThresholds,
    pub load: LoadThresholds,
    pub phase: PhaseSettings,
    pub readiness: ReadinessThresholds,
    pub matching: MatchingSettings,
}

/// Intensity multiplier applied to duration when only the activity type is known
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeIntensity {
    pub keyword: String,
    pub multiplier: f64,
}

/// Hard/very-hard classification and per-activity load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// Effort at or above this is hard
    pub hard_effort: u8,
    /// Effort at or above this is very hard
    pub very_hard_effort: u8,
    /// Sessions longer than this use the zone ratio rule
    pub long_session_minutes: f64,
    /// Zone 4-5 share of duration marking a long session as hard
    pub high_zone_ratio: f64,
    /// Zone 4-5 minutes marking a shorter session as hard
    pub high_zone_minutes: f64,
    /// Zone 4-5 minutes marking any session as very hard
    pub very_hard_zone_minutes: f64,
    /// Hard sessions at least this long are very hard
    pub very_long_minutes: f64,
    pub hard_classification_keywords: Vec<String>,
    /// Only consulted when neither effort nor HR zones exist
    pub hard_type_keywords: Vec<String>,
    pub type_intensity: Vec<TypeIntensity>,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        let type_intensity = [
            ("hiit", 8.0),
            ("race", 8.0),
            ("interval", 8.0),
            ("run", 6.0),
            ("swim", 6.0),
            ("row", 6.0),
            ("cycl", 5.0),
            ("ride", 5.0),
            ("bike", 5.0),
            ("strength", 5.0),
            ("weight", 5.0),
            ("hike", 4.0),
            ("walk", 3.0),
            ("yoga", 2.0),
        ]
        .into_iter()
        .map(|(keyword, multiplier)| TypeIntensity {
            keyword: keyword.to_string(),
            multiplier,
        })
        .collect();

        Self {
            hard_effort: 7,
            very_hard_effort: 8,
            long_session_minutes: 90.0,
            high_zone_ratio: 0.15,
            high_zone_minutes: 12.0,
            very_hard_zone_minutes: 20.0,
            very_long_minutes: 120.0,
            hard_classification_keywords: ["tempo", "interval", "threshold", "vo2max"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hard_type_keywords: ["hiit", "interval", "race", "crossfit", "strength", "weight"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            type_intensity,
        }
    }
}

/// ACWR and deload triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadThresholds {
    /// ACWR above this triggers a deload
    pub acwr_deload: f64,
    /// ACWR at or above this lets base phase add tempo work
    pub acwr_progress_gate: f64,
    /// Days of history required before ACWR is reported
    pub min_history_days: i64,
    /// Trailing 7-day minutes that trigger a deload without ACWR
    pub fallback_volume_minutes: f64,
    /// Trailing 7-day session count that triggers a deload without ACWR
    pub fallback_session_count: usize,
    /// Volume multiplier during a deload
    pub deload_multiplier: f64,
    /// Strength session duration multiplier during a deload
    pub deload_strength_factor: f64,
    /// Every Nth week of base/build is a planned deload
    pub planned_deload_every_weeks: u32,
}

impl Default for LoadThresholds {
    fn default() -> Self {
        Self {
            acwr_deload: 1.3,
            acwr_progress_gate: 0.8,
            min_history_days: 7,
            fallback_volume_minutes: 600.0,
            fallback_session_count: 9,
            deload_multiplier: 0.55,
            deload_strength_factor: 0.7,
            planned_deload_every_weeks: 4,
        }
    }
}

/// Periodization shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSettings {
    /// Share of the pre-peak weeks given to build
    pub build_share: f64,
    /// Long-session factor for taper weeks 1, 2 and 3
    pub taper_factors: [f64; 3],
    /// Base ends at this fraction of the peak long session
    pub base_long_fraction: f64,
    /// Floor of the daily-minutes cap for long sessions in marathon phases
    pub marathon_long_cap_floor: u32,
    /// Preparation length assumed when the goal has no start date
    pub default_preparation_weeks: u32,
    pub min_preparation_weeks: u32,
    pub max_preparation_weeks: u32,
    /// Long-session minutes prescribed after the event
    pub post_event_minutes: u32,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            build_share: 0.35,
            taper_factors: [0.75, 0.60, 0.40],
            base_long_fraction: 0.75,
            marathon_long_cap_floor: 150,
            default_preparation_weeks: 18,
            min_preparation_weeks: 8,
            max_preparation_weeks: 32,
            post_event_minutes: 30,
        }
    }
}

/// Same-day readiness gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessThresholds {
    /// Gate engages at or below this score
    pub gate_max: f64,
    /// Below this, long runs and strength are downgraded too
    pub severe_below: f64,
    /// Downgraded endurance keeps this share of the planned duration
    pub downgrade_duration_factor: f64,
    pub downgrade_max_minutes: u32,
    /// Light strength keeps this share of the planned duration
    pub light_strength_factor: f64,
    pub sleep_weight: f64,
    pub hrv_weight: f64,
    pub load_weight: f64,
}

impl Default for ReadinessThresholds {
    fn default() -> Self {
        Self {
            gate_max: 65.0,
            severe_below: 50.0,
            downgrade_duration_factor: 0.6,
            downgrade_max_minutes: 60,
            light_strength_factor: 0.7,
            sleep_weight: 0.4,
            hrv_weight: 0.4,
            load_weight: 0.2,
        }
    }
}

/// Activity-to-session matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Allowed relative deviation from the planned duration
    pub duration_tolerance: f64,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            duration_tolerance: 0.30,
        }
    }
}

impl PlannerConfig {
    /// Load planner thresholds from a standalone TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read planner config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse planner config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_thresholds() {
        let config = PlannerConfig::default();

        assert_eq!(config.signals.hard_effort, 7);
        assert_eq!(config.load.acwr_deload, 1.3);
        assert_eq!(config.load.deload_multiplier, 0.55);
        assert_eq!(config.load.deload_strength_factor, 0.7);
        assert_eq!(config.phase.taper_factors, [0.75, 0.60, 0.40]);
        assert_eq!(config.readiness.gate_max, 65.0);
        assert_eq!(config.matching.duration_tolerance, 0.30);
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(
            temp_file,
            r#"
[load]
acwr_deload = 1.4

[matching]
duration_tolerance = 0.2
"#
        )?;

        let config = PlannerConfig::load_from_file(temp_file.path())?;

        assert_eq!(config.load.acwr_deload, 1.4);
        assert_eq!(config.load.acwr_progress_gate, 0.8);
        assert_eq!(config.matching.duration_tolerance, 0.2);
        assert_eq!(config.readiness.severe_below, 50.0);

        Ok(())
    }
}
