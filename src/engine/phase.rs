// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Periodization relative to a dated endurance event
//!
//! The preparation block is split backwards from the event: a 3-week taper,
//! one peak week, and the remaining weeks divided between build and base.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::round_minutes;
use crate::config::planner_config::PhaseSettings;
use crate::constants::limits;
use crate::intake::{EnduranceEvent, Goal};

const TAPER_DAYS: i64 = 21;
const PEAK_DAYS: i64 = 28;
const TAPER_WEEKS: u32 = 3;

/// Training phase of the preparation block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Base,
    Build,
    Peak,
    Taper,
    Post,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Base => "base",
            Self::Build => "build",
            Self::Peak => "peak",
            Self::Taper => "taper",
            Self::Post => "post",
        };
        f.write_str(label)
    }
}

/// Where `today` sits in the preparation block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseInfo {
    pub phase: Phase,
    /// 1-based week within the current phase
    pub week_in_phase: u32,
    pub phase_weeks: u32,
    /// Fraction of the current phase completed, 0-1
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taper_week: Option<u32>,
    pub days_to_event: i64,
    pub preparation_weeks: u32,
    /// Long-session target before any deload reduction
    pub long_session_minutes: u32,
    pub event: EnduranceEvent,
    pub event_date: NaiveDate,
}

impl PhaseInfo {
    pub fn is_taper(&self) -> bool {
        self.phase == Phase::Taper
    }

    /// Base, build and peak: the phases that still progress volume
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Base | Phase::Build | Phase::Peak)
    }
}

/// Date a new phase (or the event) begins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

/// Week counts of the pre-peak block
#[derive(Debug, Clone, Copy)]
struct BlockShape {
    base_weeks: u32,
    build_weeks: u32,
}

#[derive(Debug, Clone)]
pub struct PhaseModel {
    settings: PhaseSettings,
}

impl PhaseModel {
    pub fn new(settings: PhaseSettings) -> Self {
        Self { settings }
    }

    /// Length of the preparation block in weeks
    pub fn preparation_weeks(&self, goal: &Goal, today: NaiveDate) -> u32 {
        let s = &self.settings;
        let Some(target) = goal.target_date else {
            return s.default_preparation_weeks;
        };

        let weeks = match goal.start_date {
            Some(start) => ceil_weeks((target - start).num_days()),
            None => ceil_weeks((target - today).num_days()).max(s.default_preparation_weeks),
        };
        weeks.clamp(s.min_preparation_weeks, s.max_preparation_weeks)
    }

    fn block_shape(&self, preparation_weeks: u32) -> BlockShape {
        let pre_peak = preparation_weeks.saturating_sub(TAPER_WEEKS + 1).max(1);
        let build_weeks = (f64::from(pre_peak) * self.settings.build_share).round() as u32;
        let build_weeks = build_weeks.min(pre_peak);
        BlockShape {
            base_weeks: pre_peak - build_weeks,
            build_weeks,
        }
    }

    /// Phase for `today`, or `None` when the goal has no target date
    pub fn classify(
        &self,
        goal: &Goal,
        today: NaiveDate,
        baseline_long_minutes: u32,
    ) -> Option<PhaseInfo> {
        let event_date = goal.target_date?;
        let event = goal.event();
        let days_to_event = (event_date - today).num_days();
        let preparation_weeks = self.preparation_weeks(goal, today);
        let shape = self.block_shape(preparation_weeks);

        let (phase, week_in_phase, phase_weeks, taper_week) = if days_to_event < 0 {
            (Phase::Post, 1, 1, None)
        } else if days_to_event <= TAPER_DAYS {
            let week = TAPER_WEEKS - ((days_to_event.max(1) - 1) / 7) as u32;
            (Phase::Taper, week, TAPER_WEEKS, Some(week))
        } else if days_to_event <= PEAK_DAYS {
            (Phase::Peak, 1, 1, None)
        } else {
            let weeks_before_peak = ((days_to_event - PEAK_DAYS + 6) / 7) as u32;
            if weeks_before_peak <= shape.build_weeks {
                let week = shape.build_weeks - weeks_before_peak + 1;
                (Phase::Build, week, shape.build_weeks, None)
            } else {
                let into_base = weeks_before_peak - shape.build_weeks;
                let week = shape.base_weeks.saturating_sub(into_base) + 1;
                (Phase::Base, week.max(1), shape.base_weeks.max(1), None)
            }
        };

        let progress = (f64::from(week_in_phase) / f64::from(phase_weeks.max(1))).clamp(0.0, 1.0);

        let mut info = PhaseInfo {
            phase,
            week_in_phase,
            phase_weeks,
            progress,
            taper_week,
            days_to_event,
            preparation_weeks,
            long_session_minutes: 0,
            event,
            event_date,
        };
        info.long_session_minutes = self.long_session_minutes(&info, baseline_long_minutes);
        Some(info)
    }

    /// Long-session target for the phase, rounded to 5 minutes
    pub fn long_session_minutes(&self, info: &PhaseInfo, baseline_long_minutes: u32) -> u32 {
        let s = &self.settings;
        let peak = f64::from(info.event.peak_long_minutes());
        let base_end = peak * s.base_long_fraction;

        let minutes = match info.phase {
            Phase::Base => {
                let start = f64::from(baseline_long_minutes).min(base_end);
                start + (base_end - start) * info.progress
            }
            Phase::Build => base_end + (peak - base_end) * info.progress,
            Phase::Peak => peak,
            Phase::Taper => {
                let index = info.taper_week.unwrap_or(1).clamp(1, TAPER_WEEKS) as usize - 1;
                peak * s.taper_factors[index]
            }
            Phase::Post => f64::from(s.post_event_minutes),
        };

        round_minutes(minutes, limits::DURATION_ROUNDING_MINUTES)
    }

    /// Phase boundaries of the whole block
    pub fn milestones(&self, goal: &Goal, today: NaiveDate) -> Vec<Milestone> {
        let Some(event_date) = goal.target_date else {
            return Vec::new();
        };
        let shape = self.block_shape(self.preparation_weeks(goal, today));

        let peak_start = event_date - Duration::days(PEAK_DAYS);
        let build_start = peak_start - Duration::weeks(i64::from(shape.build_weeks));
        let base_start = build_start - Duration::weeks(i64::from(shape.base_weeks));
        let taper_start = event_date - Duration::days(TAPER_DAYS);

        let mut milestones = Vec::new();
        if shape.base_weeks > 0 {
            milestones.push(milestone("Base phase begins", base_start, Some(Phase::Base)));
        }
        if shape.build_weeks > 0 {
            milestones.push(milestone("Build phase begins", build_start, Some(Phase::Build)));
        }
        milestones.push(milestone("Peak week begins", peak_start, Some(Phase::Peak)));
        milestones.push(milestone("Taper begins", taper_start, Some(Phase::Taper)));
        let event_name = goal
            .title
            .clone()
            .unwrap_or_else(|| format!("{} event", goal.program()));
        milestones.push(Milestone {
            name: event_name,
            date: event_date,
            phase: None,
        });
        milestones.push(milestone(
            "Recovery begins",
            event_date + Duration::days(1),
            Some(Phase::Post),
        ));
        milestones
    }
}

fn milestone(name: &str, date: NaiveDate, phase: Option<Phase>) -> Milestone {
    Milestone {
        name: name.to_string(),
        date,
        phase,
    }
}

fn ceil_weeks(days: i64) -> u32 {
    if days <= 0 {
        0
    } else {
        ((days + 6) / 7) as u32
    }
}
