// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Greedy placement of session specs onto slots
//!
//! Deterministic: specs are placed in list order, each on the first slot
//! (in its kind's preferred order) that is unused, keeps hard spacing and
//! budget, and stays below the weekly target for its modality.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use tracing::debug;

use super::guardrails::SpacingRule;
use super::is_weekend;
use super::signals::Signals;
use super::specs::{CycleSpecs, SessionSpec};
use crate::constants::limits;
use crate::models::{Modality, SessionKind};

/// A spec assigned to a date
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSession {
    pub spec: SessionSpec,
    pub date: NaiveDate,
    /// Shares its date with a session of the other modality
    pub two_a_day: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutcome {
    pub placed: Vec<PlacedSession>,
    /// Specs with no legal slot this cycle
    pub shortfalls: Vec<SessionSpec>,
}

/// Preferred slot order for a kind
pub fn ordered_slots(kind: SessionKind, slots: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut ordered = slots.to_vec();
    ordered.sort();
    if kind == SessionKind::LongRun {
        ordered.sort_by_key(|date| !is_weekend(*date));
    } else if kind.is_quality() {
        ordered.reverse();
    }
    ordered
}

#[derive(Debug, Default)]
struct Placement {
    placed: Vec<PlacedSession>,
    used: BTreeSet<NaiveDate>,
    hard: BTreeSet<NaiveDate>,
    shortfalls: Vec<SessionSpec>,
}

impl Placement {
    fn placed_count(&self, modality: Modality) -> usize {
        self.placed
            .iter()
            .filter(|p| p.spec.modality() == modality)
            .count()
    }

    fn record(&mut self, spec: SessionSpec, date: NaiveDate, two_a_day: bool) {
        debug!(session.kind = %spec.kind, session.date = %date, two_a_day, "Spec placed");
        self.used.insert(date);
        if spec.is_hard() {
            self.hard.insert(date);
        }
        self.placed.push(PlacedSession {
            spec,
            date,
            two_a_day,
        });
    }
}

pub struct Scheduler<'a> {
    signals: &'a Signals,
    rule: SpacingRule<'a>,
    allow_two_a_days: bool,
}

impl<'a> Scheduler<'a> {
    pub fn new(signals: &'a Signals, max_hard: u32, allow_two_a_days: bool) -> Self {
        Self {
            signals,
            rule: SpacingRule::new(signals, max_hard),
            allow_two_a_days,
        }
    }

    /// Completed activities of `modality` in `[date - 6, date]` plus sessions
    /// already placed this cycle
    fn rolling_count(&self, state: &Placement, modality: Modality, date: NaiveDate) -> usize {
        self.signals
            .completed_modality_count(modality, date - Duration::days(6), date)
            + state.placed_count(modality)
    }

    fn find_slot(
        &self,
        state: &Placement,
        spec: &SessionSpec,
        candidates: &[NaiveDate],
        target: usize,
    ) -> Option<NaiveDate> {
        ordered_slots(spec.kind, candidates).into_iter().find(|date| {
            !state.used.contains(date)
                && (!spec.is_hard() || self.rule.allows_hard(*date, &state.hard))
                && self.rolling_count(state, spec.modality(), *date) < target
        })
    }

    fn place_all(
        &self,
        state: &mut Placement,
        specs: &[SessionSpec],
        candidates: &[NaiveDate],
        target: usize,
    ) {
        for spec in specs {
            match self.find_slot(state, spec, candidates, target) {
                Some(date) => state.record(spec.clone(), date, false),
                None => {
                    debug!(session.kind = %spec.kind, "No legal slot for spec");
                    state.shortfalls.push(spec.clone());
                }
            }
        }
    }

    /// Date the long run would take on an empty week, weekend first
    fn long_run_anchor(
        &self,
        endurance: &[SessionSpec],
        slots: &[NaiveDate],
        target: usize,
    ) -> Option<NaiveDate> {
        let long_run = endurance.iter().find(|spec| spec.kind == SessionKind::LongRun)?;
        self.find_slot(&Placement::default(), long_run, slots, target)
    }

    /// Earliest slots that can each host a hard session without touching
    /// one another or the long-run anchor
    fn protected_strength_dates(
        &self,
        slots: &[NaiveDate],
        wanted: usize,
        anchor: Option<NaiveDate>,
    ) -> Vec<NaiveDate> {
        let mut taken: BTreeSet<NaiveDate> = anchor.into_iter().collect();
        let mut protected = Vec::new();
        for date in slots {
            if protected.len() >= wanted {
                break;
            }
            if Some(*date) != anchor && self.rule.allows_hard(*date, &taken) {
                taken.insert(*date);
                protected.push(*date);
            }
        }
        protected
    }

    pub fn schedule(&self, specs: &CycleSpecs, slots: &[NaiveDate]) -> ScheduleOutcome {
        let mut slots = slots.to_vec();
        slots.sort();
        let mut state = Placement::default();

        let endurance_target = specs.target(Modality::Endurance);
        let strength_target = specs.target(Modality::Strength);

        if specs.is_hybrid() {
            let wanted = strength_target.min(limits::PROTECTED_STRENGTH_DATES as usize);
            let anchor = self.long_run_anchor(&specs.endurance, &slots, endurance_target);
            let protected = self.protected_strength_dates(&slots, wanted, anchor);
            let open: Vec<NaiveDate> = slots
                .iter()
                .copied()
                .filter(|date| !protected.contains(date))
                .collect();

            // Reserved dates count as hard while endurance is placed
            state.hard.extend(protected.iter().copied());
            self.place_all(&mut state, &specs.endurance, &open, endurance_target);
            for date in &protected {
                state.hard.remove(date);
            }

            let (first, rest) = specs
                .strength
                .split_at(protected.len().min(specs.strength.len()));
            self.place_all(&mut state, first, &protected, strength_target);
            self.place_all(&mut state, rest, &slots, strength_target);
        } else {
            self.place_all(&mut state, &specs.endurance, &slots, endurance_target);
            self.place_all(&mut state, &specs.strength, &slots, strength_target);
        }

        if self.allow_two_a_days {
            self.two_a_day_fallback(&mut state, strength_target);
        }

        state.placed.sort_by_key(|p| (p.date, p.spec.kind.priority()));
        ScheduleOutcome {
            placed: state.placed,
            shortfalls: state.shortfalls,
        }
    }

    /// Strength still short: share a date with an easy endurance session
    fn two_a_day_fallback(&self, state: &mut Placement, strength_target: usize) {
        let pending: Vec<SessionSpec> = state
            .shortfalls
            .iter()
            .filter(|spec| spec.modality() == Modality::Strength)
            .cloned()
            .collect();
        if pending.is_empty() {
            return;
        }
        state
            .shortfalls
            .retain(|spec| spec.modality() != Modality::Strength);

        for spec in pending {
            let host = state
                .placed
                .iter()
                .filter(|p| p.spec.modality() == Modality::Endurance && !p.spec.is_hard())
                .map(|p| p.date)
                .filter(|date| {
                    !state
                        .placed
                        .iter()
                        .any(|p| p.date == *date && p.spec.modality() == Modality::Strength)
                })
                .find(|date| {
                    self.rule.allows_hard(*date, &state.hard)
                        && self.rolling_count(state, Modality::Strength, *date) < strength_target
                });

            match host {
                Some(date) => state.record(spec, date, true),
                None => state.shortfalls.push(spec),
            }
        }
    }
}
