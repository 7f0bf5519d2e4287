// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Planning Engine
//!
//! Pure transforms over an immutable input snapshot. Nothing in here
//! touches the filesystem; the [`crate::storage`] boundary loads inputs
//! before a run and writes the calendar after it.
//!
//! This module includes:
//! - Load and readiness signals (hard days, ACWR, readiness)
//! - Periodization phases counting down to a target event
//! - Slot allocation over the next 7 calendar dates
//! - Session templates per modality
//! - Greedy placement, guardrail sweep and readiness gating
//! - Reconciliation of planned sessions against performed workouts

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub mod guardrails;
pub mod phase;
pub mod planner;
pub mod readiness;
pub mod reconciler;
pub mod scheduler;
pub mod signals;
pub mod slots;
pub mod specs;

pub use guardrails::{GuardrailEngine, GuardrailReport, SpacingRule};
pub use phase::{Phase, PhaseInfo, PhaseModel};
pub use planner::{CycleResult, PlanError, PlanningSnapshot, TrainingPlanner};
pub use readiness::{CarryoverOutcome, CarryoverResolver, Downgrade, ReadinessGate};
pub use reconciler::{ReconcileInput, ReconcileReport, Reconciler};
pub use scheduler::{PlacedSession, ScheduleOutcome, Scheduler};
pub use signals::{AcwrZone, DeloadDecision, Readiness, SignalModel, Signals};
pub use slots::SlotAllocator;
pub use specs::{CycleSpecs, SessionSpec, SessionSpecBuilder};

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `days` consecutive dates starting at `start`
pub fn date_range(start: NaiveDate, days: i64) -> impl Iterator<Item = NaiveDate> {
    (0..days.max(0)).map(move |offset| start + Duration::days(offset))
}

/// Round minutes to the nearest multiple of `step`
pub fn round_minutes(minutes: f64, step: u32) -> u32 {
    if step == 0 || !minutes.is_finite() || minutes <= 0.0 {
        return minutes.max(0.0) as u32;
    }
    let step = f64::from(step);
    ((minutes / step).round() * step) as u32
}
