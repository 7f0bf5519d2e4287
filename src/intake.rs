// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Intake document: goals, scheduling constraints and baseline fitness
//!
//! The intake is owned by an upstream collaborator and is read-only to the
//! engine. It is validated before any planning happens; every violation is
//! collected so the user sees the full list at once.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Category of a training goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Endurance,
    Strength,
    Bodycomp,
    Sleep,
    General,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Endurance => "endurance",
            Self::Strength => "strength",
            Self::Bodycomp => "bodycomp",
            Self::Sleep => "sleep",
            Self::General => "general",
        }
    }

    /// Goal kinds that call for endurance sessions
    pub fn wants_endurance(&self) -> bool {
        matches!(self, Self::Endurance | Self::General | Self::Bodycomp)
    }

    /// Goal kinds that call for strength sessions
    pub fn wants_strength(&self) -> bool {
        matches!(self, Self::Strength | Self::Bodycomp)
    }
}

/// Target event of an endurance goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnduranceEvent {
    #[serde(rename = "marathon")]
    Marathon,
    #[serde(rename = "half_marathon", alias = "half")]
    HalfMarathon,
    #[serde(rename = "ultra")]
    Ultra,
    #[serde(rename = "10k")]
    TenK,
    #[serde(rename = "5k")]
    FiveK,
    #[serde(other, rename = "other")]
    Other,
}

impl EnduranceEvent {
    /// Long-session duration at peak, in minutes
    pub fn peak_long_minutes(&self) -> u32 {
        match self {
            Self::Marathon => 180,
            Self::Ultra => 210,
            Self::HalfMarathon => 120,
            Self::TenK => 90,
            Self::FiveK => 75,
            Self::Other => 120,
        }
    }

    /// Events planned with the phase-aware marathon builder
    pub fn is_marathon_family(&self) -> bool {
        matches!(self, Self::Marathon | Self::HalfMarathon | Self::Ultra)
    }
}

/// A single training goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(default)]
    pub id: Option<String>,
    pub kind: GoalKind,
    #[serde(default, alias = "subKind")]
    pub sub_kind: Option<EnduranceEvent>,
    #[serde(default, alias = "targetDate")]
    pub target_date: Option<NaiveDate>,
    /// First day of the preparation block
    #[serde(default, alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Goal {
    /// Program identifier stamped on every session serving this goal
    pub fn program(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.kind.as_str().to_string())
    }

    pub fn event(&self) -> EnduranceEvent {
        self.sub_kind.unwrap_or(EnduranceEvent::Other)
    }
}

/// Month and day of a recurring yearly date, written `MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl FromStr for MonthDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("Expected MM-DD, got {}", s))?;
        let month: u32 = month.parse().map_err(|_| format!("Invalid month in {}", s))?;
        let day: u32 = day.parse().map_err(|_| format!("Invalid day in {}", s))?;
        // 2024 is a leap year so 02-29 is accepted
        if NaiveDate::from_ymd_opt(2024, month, day).is_none() {
            return Err(format!("No such calendar day: {}", s));
        }
        Ok(Self { month, day })
    }
}

impl TryFrom<String> for MonthDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(value: MonthDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Yearly window during which a recurring appointment is active
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl SeasonWindow {
    /// Inclusive; windows like `11-01`..`02-28` wrap across the new year
    pub fn contains(&self, date: NaiveDate) -> bool {
        let day = MonthDay::of(date);
        if self.start <= self.end {
            self.start <= day && day <= self.end
        } else {
            day >= self.start || day <= self.end
        }
    }
}

/// External commitment occupying whole weekdays (e.g. league games)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAppointment {
    pub name: String,
    pub weekdays: Vec<Weekday>,
    #[serde(default)]
    pub season: Option<SeasonWindow>,
}

impl FixedAppointment {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.weekdays.contains(&date.weekday())
            && self.season.map_or(true, |season| season.contains(date))
    }
}

/// Scheduling constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(alias = "availableDays")]
    pub available_days: Vec<Weekday>,
    #[serde(default, alias = "restDays")]
    pub rest_days: Vec<Weekday>,
    #[serde(default, alias = "maxMinutesPerDay")]
    pub max_minutes_per_day: Option<u32>,
    #[serde(default, alias = "maxSessionsPerWeek")]
    pub max_sessions_per_week: Option<u32>,
    #[serde(default, alias = "fixedAppointments")]
    pub fixed_appointments: Vec<FixedAppointment>,
    #[serde(default, alias = "allowTwoADays")]
    pub allow_two_a_days: bool,
}

impl Constraints {
    /// Available weekdays that are not preferred rest days
    pub fn schedulable_days(&self) -> BTreeSet<u32> {
        self.available_days
            .iter()
            .filter(|day| !self.rest_days.contains(day))
            .map(|day| day.num_days_from_monday())
            .collect()
    }
}

/// Self-reported fitness tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitnessTier {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

/// Preferred strength split, which drives the session title rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrengthSplit {
    #[default]
    FullBody,
    UpperLower,
    PushPullLegs,
    BroSplit,
}

impl StrengthSplit {
    pub fn rotation(&self) -> &'static [&'static str] {
        match self {
            Self::FullBody => &["Full Body A", "Full Body B", "Full Body C"],
            Self::UpperLower => &["Upper", "Lower"],
            Self::PushPullLegs => &["Push", "Pull", "Legs"],
            Self::BroSplit => &["Chest", "Back", "Legs", "Shoulders", "Arms"],
        }
    }
}

/// Baseline fitness anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Baseline {
    #[serde(default, alias = "fitnessTier")]
    pub fitness_tier: FitnessTier,
    #[serde(default, alias = "runsPerWeek")]
    pub runs_per_week: Option<u32>,
    #[serde(default, alias = "strengthPerWeek")]
    pub strength_per_week: Option<u32>,
    #[serde(default, alias = "longestRunMinutes")]
    pub longest_run_minutes: Option<u32>,
    #[serde(default, alias = "strengthSessionMinutes")]
    pub strength_session_minutes: Option<u32>,
    #[serde(default, alias = "strengthSplit")]
    pub strength_split: StrengthSplit,
    /// Explicit cap on hard sessions per 7 days
    #[serde(default, alias = "maxHardPerWeek")]
    pub max_hard_per_week: Option<u32>,
}

/// Intake validation failure carrying every violation found
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Invalid intake: {}", .violations.join("; "))]
    Invalid { violations: Vec<String> },
}

/// Goal/constraint/baseline document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    #[serde(default)]
    pub goals: Vec<Goal>,
    pub constraints: Constraints,
    #[serde(default)]
    pub baseline: Baseline,
}

impl Intake {
    /// Check the document and report all violations together
    pub fn validate(&self) -> Result<(), IntakeError> {
        let mut violations = Vec::new();

        if self.goals.is_empty() {
            violations.push("goals must contain at least one goal".to_string());
        }
        if self.constraints.available_days.is_empty() {
            violations.push("constraints.available_days must list at least one weekday".to_string());
        } else if self.constraints.schedulable_days().is_empty() {
            violations.push("every available weekday is also a preferred rest day".to_string());
        }
        if self.constraints.max_minutes_per_day == Some(0) {
            violations.push("constraints.max_minutes_per_day must be greater than zero".to_string());
        }
        if self.constraints.max_sessions_per_week == Some(0) {
            violations.push("constraints.max_sessions_per_week must be greater than zero".to_string());
        }
        for appointment in &self.constraints.fixed_appointments {
            if appointment.weekdays.is_empty() {
                violations.push(format!(
                    "fixed appointment '{}' must list at least one weekday",
                    appointment.name
                ));
            }
        }
        for (index, goal) in self.goals.iter().enumerate() {
            if let (Some(start), Some(target)) = (goal.start_date, goal.target_date) {
                if start >= target {
                    violations.push(format!(
                        "goals[{}].start_date must be before its target_date",
                        index
                    ));
                }
            }
            if goal.sub_kind.is_some() && goal.kind != GoalKind::Endurance {
                violations.push(format!(
                    "goals[{}].sub_kind is only valid for endurance goals",
                    index
                ));
            }
        }
        if self.baseline.runs_per_week.map_or(false, |n| n > 7) {
            violations.push("baseline.runs_per_week cannot exceed 7".to_string());
        }
        if self.baseline.strength_per_week.map_or(false, |n| n > 7) {
            violations.push("baseline.strength_per_week cannot exceed 7".to_string());
        }
        if self.baseline.max_hard_per_week == Some(0) {
            violations.push("baseline.max_hard_per_week must be at least 1".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(IntakeError::Invalid { violations })
        }
    }

    /// First endurance goal, which owns the endurance program
    pub fn endurance_goal(&self) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.kind.wants_endurance())
    }

    /// First goal that calls for strength work
    pub fn strength_goal(&self) -> Option<&Goal> {
        self.goals.iter().find(|goal| goal.kind.wants_strength())
    }

    /// Dated endurance goal driving periodization
    pub fn dated_endurance_goal(&self) -> Option<&Goal> {
        self.goals
            .iter()
            .find(|goal| goal.kind == GoalKind::Endurance && goal.target_date.is_some())
    }
}
