// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Data Models
//!
//! Core data structures shared by the planning engine and the file boundary.
//!
//! ## Design Principles
//!
//! - **Closed kinds**: every session kind is a [`SessionKind`] variant whose
//!   hardness, modality and matching keywords come from one lookup table
//! - **Normalized input**: raw activity records are converted once into
//!   [`ActivityRecord`]; nothing downstream looks at source field names
//! - **Serializable**: all models round-trip through the JSON files the
//!   engine reads and writes
//!
//! ## Core Models
//!
//! - [`ActivityRecord`]: a completed workout, immutable once synced
//! - [`WellnessRecord`]: a day of sleep/vitals used for readiness
//! - [`StatusWindow`]: an illness or travel period
//! - [`Session`]: the scheduling unit persisted in the calendar

use chrono::{NaiveDate, Weekday};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Whether a session needs at least one day of recovery afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hardness {
    Easy,
    Hard,
}

/// Training modality of a session or activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Endurance,
    Strength,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endurance => write!(f, "endurance"),
            Self::Strength => write!(f, "strength"),
        }
    }
}

/// Static attributes of a session kind
#[derive(Debug)]
pub struct KindTraits {
    pub code: &'static str,
    /// Default session title
    pub title: &'static str,
    /// Default intensity cue
    pub intensity: &'static str,
    pub hardness: Hardness,
    pub modality: Modality,
    /// Key workouts become `missed` rather than `skipped` when not done
    pub tracked: bool,
    /// Lower value wins when guardrails must choose between sessions
    pub priority: u8,
    /// Lowercase substrings of an activity type that count as this kind
    pub match_keywords: &'static [&'static str],
}

const RUN_KEYWORDS: &[&str] = &["run", "jog", "walk", "zone"];
const AEROBIC_KEYWORDS: &[&str] = &[
    "run", "jog", "walk", "zone", "hike", "cycl", "bike", "ride", "swim", "row", "ellip",
];
const STRENGTH_KEYWORDS: &[&str] = &[
    "strength", "weight", "lift", "functional", "crossfit", "gym", "resistance",
];
const BIKE_KEYWORDS: &[&str] = &["cycl", "bike", "ride", "spin"];
const SWIM_KEYWORDS: &[&str] = &["swim"];
const BRICK_KEYWORDS: &[&str] = &["brick", "run", "cycl", "bike", "ride"];

/// Closed set of session kinds the engine plans and reconciles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "LR")]
    LongRun,
    Tempo,
    Intervals,
    #[serde(rename = "MP")]
    MarathonPace,
    Z2,
    Easy,
    Shakeout,
    Strength,
    Cycling,
    Swim,
    Bike,
    Brick,
}

impl SessionKind {
    pub const ALL: [SessionKind; 12] = [
        Self::LongRun,
        Self::Tempo,
        Self::Intervals,
        Self::MarathonPace,
        Self::Z2,
        Self::Easy,
        Self::Shakeout,
        Self::Strength,
        Self::Cycling,
        Self::Swim,
        Self::Bike,
        Self::Brick,
    ];

    /// Lookup table entry for this kind
    pub fn traits(self) -> &'static KindTraits {
        match self {
            Self::LongRun => &KindTraits {
                code: "LR",
                title: "Long Run",
                intensity: "easy aerobic, conversational",
                hardness: Hardness::Hard,
                modality: Modality::Endurance,
                tracked: true,
                priority: 0,
                match_keywords: RUN_KEYWORDS,
            },
            Self::Tempo => &KindTraits {
                code: "Tempo",
                title: "Tempo Run",
                intensity: "comfortably hard, threshold",
                hardness: Hardness::Hard,
                modality: Modality::Endurance,
                tracked: true,
                priority: 1,
                match_keywords: RUN_KEYWORDS,
            },
            Self::Intervals => &KindTraits {
                code: "Intervals",
                title: "Intervals",
                intensity: "hard repeats at 5k-10k effort",
                hardness: Hardness::Hard,
                modality: Modality::Endurance,
                tracked: true,
                priority: 2,
                match_keywords: RUN_KEYWORDS,
            },
            Self::MarathonPace => &KindTraits {
                code: "MP",
                title: "Marathon Pace Run",
                intensity: "goal marathon pace blocks",
                hardness: Hardness::Hard,
                modality: Modality::Endurance,
                tracked: true,
                priority: 3,
                match_keywords: RUN_KEYWORDS,
            },
            Self::Strength => &KindTraits {
                code: "Strength",
                title: "Strength",
                intensity: "RPE 7-8",
                hardness: Hardness::Hard,
                modality: Modality::Strength,
                tracked: true,
                priority: 4,
                match_keywords: STRENGTH_KEYWORDS,
            },
            Self::Cycling => &KindTraits {
                code: "Cycling",
                title: "Endurance Ride",
                intensity: "easy",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: true,
                priority: 5,
                match_keywords: BIKE_KEYWORDS,
            },
            Self::Bike => &KindTraits {
                code: "Bike",
                title: "Bike",
                intensity: "easy",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: true,
                priority: 5,
                match_keywords: BIKE_KEYWORDS,
            },
            Self::Swim => &KindTraits {
                code: "Swim",
                title: "Aerobic Swim",
                intensity: "easy",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: true,
                priority: 5,
                match_keywords: SWIM_KEYWORDS,
            },
            Self::Brick => &KindTraits {
                code: "Brick",
                title: "Bike-Run Brick",
                intensity: "easy to moderate",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: true,
                priority: 5,
                match_keywords: BRICK_KEYWORDS,
            },
            Self::Z2 => &KindTraits {
                code: "Z2",
                title: "Zone 2 Aerobic",
                intensity: "zone 2",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: false,
                priority: 6,
                match_keywords: AEROBIC_KEYWORDS,
            },
            Self::Easy => &KindTraits {
                code: "Easy",
                title: "Easy Run",
                intensity: "easy",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: false,
                priority: 7,
                match_keywords: RUN_KEYWORDS,
            },
            Self::Shakeout => &KindTraits {
                code: "Shakeout",
                title: "Shakeout Run",
                intensity: "very easy with strides",
                hardness: Hardness::Easy,
                modality: Modality::Endurance,
                tracked: false,
                priority: 8,
                match_keywords: RUN_KEYWORDS,
            },
        }
    }

    pub fn code(self) -> &'static str {
        self.traits().code
    }

    pub fn hardness(self) -> Hardness {
        self.traits().hardness
    }

    pub fn modality(self) -> Modality {
        self.traits().modality
    }

    pub fn is_hard(self) -> bool {
        self.hardness() == Hardness::Hard
    }

    /// Key workouts tracked by the missed-workout rules
    pub fn is_tracked(self) -> bool {
        self.traits().tracked
    }

    pub fn priority(self) -> u8 {
        self.traits().priority
    }

    /// Tempo, intervals and marathon-pace work
    pub fn is_quality(self) -> bool {
        matches!(self, Self::Tempo | Self::Intervals | Self::MarathonPace)
    }

    /// Whether an activity of `activity_type` can fulfil this kind
    pub fn matches_activity_type(self, activity_type: &str) -> bool {
        let lowered = activity_type.to_lowercase();
        self.traits()
            .match_keywords
            .iter()
            .any(|keyword| lowered.contains(keyword))
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        let kind = match normalized.as_str() {
            "lr" | "long_run" | "long" => Self::LongRun,
            "tempo" | "threshold" => Self::Tempo,
            "intervals" | "interval" => Self::Intervals,
            "mp" | "marathon_pace" => Self::MarathonPace,
            "z2" | "zone2" | "zone_2" => Self::Z2,
            "easy" | "recovery" => Self::Easy,
            "shakeout" => Self::Shakeout,
            "strength" => Self::Strength,
            "cycling" => Self::Cycling,
            "swim" => Self::Swim,
            "bike" => Self::Bike,
            "brick" => Self::Brick,
            _ => return Err(format!("Unknown session kind: {}", s)),
        };
        Ok(kind)
    }
}

/// Lifecycle of a planned session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Planned,
    Completed,
    Missed,
    Skipped,
    Cancelled,
}

impl SessionStatus {
    /// Every status except `planned` is terminal
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Planned)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Planned => "planned",
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Skipped => "skipped",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(Self::Planned),
            "completed" => Ok(Self::Completed),
            "missed" => Ok(Self::Missed),
            "skipped" => Ok(Self::Skipped),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(format!("Unknown session status: {}", s)),
        }
    }
}

/// Attempted to move a session out of a terminal status
#[derive(Debug, thiserror::Error)]
#[error("Session {id} is already {status} and cannot become {requested}")]
pub struct TransitionError {
    pub id: String,
    pub status: SessionStatus,
    pub requested: SessionStatus,
}

/// Minutes spent in each heart-rate zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateZones {
    #[serde(default, alias = "zone1")]
    pub z1: f64,
    #[serde(default, alias = "zone2")]
    pub z2: f64,
    #[serde(default, alias = "zone3")]
    pub z3: f64,
    #[serde(default, alias = "zone4")]
    pub z4: f64,
    #[serde(default, alias = "zone5")]
    pub z5: f64,
}

impl HeartRateZones {
    pub fn total(&self) -> f64 {
        self.z1 + self.z2 + self.z3 + self.z4 + self.z5
    }

    /// Minutes in zones 4 and 5
    pub fn high_intensity_minutes(&self) -> f64 {
        self.z4 + self.z5
    }

    /// Zone-weighted load: minutes in zone N count N times
    pub fn weighted_load(&self) -> f64 {
        self.z1 + 2.0 * self.z2 + 3.0 * self.z3 + 4.0 * self.z4 + 5.0 * self.z5
    }
}

/// A completed workout in canonical form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Local calendar date the workout was performed on
    pub date: NaiveDate,
    pub duration_minutes: f64,
    /// Perceived effort, 1-10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effort: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_zone_minutes: Option<HeartRateZones>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

impl ActivityRecord {
    /// Strength if the type looks like resistance work, endurance otherwise
    pub fn modality(&self) -> Modality {
        if SessionKind::Strength.matches_activity_type(&self.activity_type) {
            Modality::Strength
        } else {
            Modality::Endurance
        }
    }

    /// Whether any physiological signal (effort or HR zones) is present
    pub fn has_physiological_signal(&self) -> bool {
        self.effort.is_some() || self.hr_zone_minutes.map_or(false, |z| z.total() > 0.0)
    }
}

/// Activity record as written by upstream sync, with every field-name variant seen in the wild
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawActivityRecord {
    #[serde(default, alias = "activity_id")]
    pub id: Option<serde_json::Value>,
    #[serde(default, rename = "type", alias = "activity_type", alias = "sport_type")]
    pub activity_type: Option<String>,
    #[serde(default, alias = "local_date")]
    pub date: Option<String>,
    #[serde(default, alias = "start_time_local")]
    pub start_date_local: Option<String>,
    #[serde(default, alias = "duration_min", alias = "moving_time_minutes")]
    pub duration_minutes: Option<f64>,
    #[serde(default, alias = "moving_time", alias = "elapsed_time")]
    pub duration_seconds: Option<f64>,
    #[serde(default, alias = "rpe", alias = "perceived_exertion")]
    pub effort: Option<f64>,
    #[serde(default, alias = "zones", alias = "hr_zones")]
    pub hr_zone_minutes: Option<HeartRateZones>,
    #[serde(default, alias = "workout_type", alias = "tag")]
    pub classification: Option<String>,
}

impl RawActivityRecord {
    fn local_date(&self) -> Option<NaiveDate> {
        self.date
            .as_deref()
            .or(self.start_date_local.as_deref())
            .and_then(|value| value.get(..10))
            .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
    }

    fn minutes(&self) -> Option<f64> {
        self.duration_minutes
            .or(self.duration_seconds.map(|seconds| seconds / 60.0))
            .filter(|minutes| minutes.is_finite() && *minutes >= 0.0)
    }

    /// Convert to canonical form; `index` seeds the fallback ID
    pub fn normalize(self, index: usize) -> Option<ActivityRecord> {
        let date = self.local_date()?;
        let duration_minutes = self.minutes()?;
        let activity_type = self
            .activity_type
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Workout".to_string());

        let id = match &self.id {
            Some(serde_json::Value::String(id)) if !id.is_empty() => id.clone(),
            Some(serde_json::Value::Number(id)) => id.to_string(),
            _ => format!(
                "{}-{}-{}",
                date,
                activity_type.to_lowercase().replace(' ', "_"),
                index
            ),
        };

        let effort = self
            .effort
            .filter(|e| e.is_finite())
            .map(|e| e.round().clamp(1.0, 10.0) as u8);

        Some(ActivityRecord {
            id,
            activity_type,
            date,
            duration_minutes,
            effort,
            hr_zone_minutes: self.hr_zone_minutes,
            classification: self.classification.filter(|c| !c.trim().is_empty()),
        })
    }
}

/// Normalize a raw stream, dropping records without a date or duration
pub fn normalize_activities(raw: Vec<RawActivityRecord>) -> Vec<ActivityRecord> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let normalized = record.normalize(index);
            if normalized.is_none() {
                warn!(record.index = index, "Dropping activity record without date or duration");
            }
            normalized
        })
        .collect()
}

/// One day of sleep and vitals from the wellness stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessRecord {
    #[serde(alias = "local_date")]
    pub date: NaiveDate,
    /// Device-provided readiness, 0-100
    #[serde(default, alias = "readiness_score")]
    pub readiness: Option<f64>,
    #[serde(default)]
    pub sleep_score: Option<f64>,
    #[serde(default, alias = "sleep_duration_hours")]
    pub sleep_hours: Option<f64>,
    #[serde(default, alias = "hrv", alias = "hrv_rmssd")]
    pub hrv_ms: Option<f64>,
    #[serde(default, alias = "rhr")]
    pub resting_hr: Option<f64>,
}

/// Reason the athlete is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityStatus {
    Illness,
    Travel,
}

/// Illness or travel period; every date inside it forces `skipped`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusWindow {
    pub status: AvailabilityStatus,
    pub since: NaiveDate,
    /// Open-ended when absent
    #[serde(default)]
    pub until: Option<NaiveDate>,
}

impl StatusWindow {
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.since && self.until.map_or(true, |until| date <= until)
    }
}

/// Duration and intensity prescription of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTargets {
    pub duration_minutes: u32,
    pub intensity: String,
    /// Set/rep scheme for strength work
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

/// The scheduling unit persisted in the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    /// Goal/program this session serves
    pub program: String,
    pub date: NaiveDate,
    pub kind: SessionKind,
    pub modality: Modality,
    pub hardness: Hardness,
    pub title: String,
    pub targets: SessionTargets,
    #[serde(default)]
    pub status: SessionStatus,
    #[serde(default)]
    pub rule_refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_activity_id: Option<String>,
}

impl Session {
    /// Stable identity for a program/date/kind triple
    pub fn deterministic_id(program: &str, date: NaiveDate, kind: SessionKind) -> String {
        let name = format!("{}:{}:{}", program, date, kind.code());
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn is_hard(&self) -> bool {
        self.hardness == Hardness::Hard
    }

    pub fn is_planned(&self) -> bool {
        self.status == SessionStatus::Planned
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }

    /// Move out of `planned`; a session transitions exactly once
    pub fn transition(&mut self, next: SessionStatus) -> Result<(), TransitionError> {
        if self.status.is_terminal() || next == SessionStatus::Planned {
            return Err(TransitionError {
                id: self.id.clone(),
                status: self.status,
                requested: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(kind: SessionKind) -> Session {
        let date = NaiveDate::from_ymd_opt(2026, 4, 3).unwrap();
        Session {
            id: Session::deterministic_id("marathon", date, kind),
            program: "marathon".to_string(),
            date,
            kind,
            modality: kind.modality(),
            hardness: kind.hardness(),
            title: kind.code().to_string(),
            targets: SessionTargets {
                duration_minutes: 60,
                intensity: "easy".to_string(),
                scheme: None,
            },
            status: SessionStatus::Planned,
            rule_refs: vec![],
            matched_activity_id: None,
        }
    }

    #[test]
    fn test_kind_table_is_consistent() {
        for kind in SessionKind::ALL {
            let parsed: SessionKind = kind.code().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        let hard: Vec<_> = SessionKind::ALL.iter().filter(|k| k.is_hard()).collect();
        assert_eq!(hard.len(), 5);
        assert_eq!(SessionKind::Strength.modality(), Modality::Strength);
        assert!(!SessionKind::Z2.is_tracked());
        assert!(SessionKind::Brick.is_tracked());
        assert!(SessionKind::LongRun.priority() < SessionKind::Tempo.priority());
        assert!(SessionKind::Strength.priority() < SessionKind::Z2.priority());
    }

    #[test]
    fn test_kind_serde_codes() {
        assert_eq!(serde_json::to_value(SessionKind::LongRun).unwrap(), json!("LR"));
        assert_eq!(serde_json::to_value(SessionKind::MarathonPace).unwrap(), json!("MP"));
        let kind: SessionKind = serde_json::from_value(json!("Intervals")).unwrap();
        assert_eq!(kind, SessionKind::Intervals);
    }

    #[test]
    fn test_activity_type_matching() {
        assert!(SessionKind::LongRun.matches_activity_type("Running"));
        assert!(SessionKind::LongRun.matches_activity_type("Zone 2 Walk"));
        assert!(!SessionKind::LongRun.matches_activity_type("Cycling"));
        assert!(SessionKind::Strength.matches_activity_type("Traditional Strength Training"));
        assert!(SessionKind::Z2.matches_activity_type("Indoor Cycling"));
    }

    #[test]
    fn test_normalize_field_variants() {
        let raw: Vec<RawActivityRecord> = serde_json::from_value(json!([
            {"activity_id": 991, "sport_type": "Run", "start_date_local": "2026-04-03T07:15:00", "moving_time": 5400, "rpe": 6.6},
            {"type": "Strength Training", "local_date": "2026-04-04", "duration_min": 45, "workout_type": "push"},
            {"type": "Run", "duration_minutes": 30},
        ]))
        .unwrap();

        let records = normalize_activities(raw);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id, "991");
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2026, 4, 3).unwrap());
        assert_eq!(records[0].duration_minutes, 90.0);
        assert_eq!(records[0].effort, Some(7));

        assert_eq!(records[1].id, "2026-04-04-strength_training-1");
        assert_eq!(records[1].modality(), Modality::Strength);
        assert_eq!(records[1].classification.as_deref(), Some("push"));
    }

    #[test]
    fn test_status_window_covers() {
        let window = StatusWindow {
            status: AvailabilityStatus::Illness,
            since: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            until: Some(NaiveDate::from_ymd_opt(2026, 4, 3).unwrap()),
        };
        assert!(window.covers(NaiveDate::from_ymd_opt(2026, 4, 3).unwrap()));
        assert!(!window.covers(NaiveDate::from_ymd_opt(2026, 4, 4).unwrap()));

        let open = StatusWindow { until: None, ..window };
        assert!(open.covers(NaiveDate::from_ymd_opt(2026, 12, 4).unwrap()));
    }

    #[test]
    fn test_session_transitions_once() {
        let mut lr = session(SessionKind::LongRun);
        assert!(lr.transition(SessionStatus::Completed).is_ok());
        assert!(lr.transition(SessionStatus::Missed).is_err());
        assert_eq!(lr.status, SessionStatus::Completed);
    }

    #[test]
    fn test_deterministic_ids() {
        let date = NaiveDate::from_ymd_opt(2026, 4, 3).unwrap();
        assert_eq!(
            Session::deterministic_id("marathon", date, SessionKind::LongRun),
            Session::deterministic_id("marathon", date, SessionKind::LongRun)
        );
        assert_ne!(
            Session::deterministic_id("marathon", date, SessionKind::LongRun),
            Session::deterministic_id("marathon", date, SessionKind::Tempo)
        );
    }
}
