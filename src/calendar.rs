// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Calendar
//!
//! The persisted plan container. Each planning cycle rewrites
//! `plan.sessions` and the diagnostic `blueprint`; the adaptation log is
//! append-only and never rewritten.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::limits;
use crate::engine::phase::{Milestone, PhaseInfo};
use crate::engine::signals::{AcwrZone, DeloadDecision, Readiness};
use crate::intake::Goal;
use crate::models::{ActivityRecord, Session};

/// The current rolling plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub sessions: Vec<Session>,
    /// Human-readable notices: shortfalls, carryover failures, deloads
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Sessions per modality the cycle aimed for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyTargets {
    pub endurance_sessions: u32,
    pub strength_sessions: u32,
    pub max_hard_sessions: u32,
}

/// Diagnostic snapshot of the inputs behind the current plan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub targets: WeeklyTargets,
    #[serde(default)]
    pub acwr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acwr_zone: Option<AcwrZone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseInfo>,
    #[serde(default)]
    pub deload: DeloadDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness: Option<Readiness>,
}

/// What an adaptation event records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptationKind {
    Completed,
    Missed,
    Skipped,
    Cancelled,
    Downgraded,
    CarriedOver,
    CarryoverFailed,
    Deload,
    GuardrailRemoved,
}

/// One entry of the append-only audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationEvent {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub kind: AdaptationKind,
    #[serde(default)]
    pub rule_ids: Vec<String>,
    #[serde(default)]
    pub detail: String,
}

impl AdaptationEvent {
    pub fn new(
        kind: AdaptationKind,
        date: NaiveDate,
        session_id: Option<String>,
        rule_ids: Vec<String>,
        detail: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            recorded_at,
            date,
            session_id,
            kind,
            rule_ids,
            detail: detail.into(),
        }
    }

    /// Same kind, date, session and rules; ID and timestamp are ignored
    pub fn same_as(&self, other: &AdaptationEvent) -> bool {
        self.kind == other.kind
            && self.date == other.date
            && self.session_id == other.session_id
            && self.rule_ids == other.rule_ids
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdaptationLog {
    #[serde(default)]
    pub events: Vec<AdaptationEvent>,
}

impl AdaptationLog {
    pub fn append(&mut self, event: AdaptationEvent) {
        self.events.push(event);
    }

    /// Append unless an identical event is already logged; returns whether it was added
    pub fn append_unique(&mut self, event: AdaptationEvent) -> bool {
        if self.events.iter().any(|existing| existing.same_as(&event)) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    /// Trailing activity window the plan was built from
    #[serde(default)]
    pub history: Vec<ActivityRecord>,
    #[serde(default)]
    pub plan: Plan,
    #[serde(default)]
    pub blueprint: Blueprint,
    #[serde(default)]
    pub adaptation: AdaptationLog,
}

/// The next 7 days of a calendar, for publishing and notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyWindow {
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl Calendar {
    pub fn empty(timezone: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            timezone: timezone.into(),
            generated_at: now,
            goals: Vec::new(),
            milestones: Vec::new(),
            history: Vec::new(),
            plan: Plan::default(),
            blueprint: Blueprint::default(),
            adaptation: AdaptationLog::default(),
        }
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.plan.sessions.iter().find(|s| s.id == id)
    }

    /// Sessions dated `[today, today + 6]`
    pub fn weekly_window(&self, today: NaiveDate) -> WeeklyWindow {
        let end = today + Duration::days(limits::PLANNING_HORIZON_DAYS - 1);
        WeeklyWindow {
            timezone: self.timezone.clone(),
            generated_at: self.generated_at,
            start: today,
            end,
            sessions: self
                .plan
                .sessions
                .iter()
                .filter(|s| s.date >= today && s.date <= end)
                .cloned()
                .collect(),
            recommendations: self.plan.recommendations.clone(),
        }
    }
}
