// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Hard-session spacing, hard budget and single-modality guardrails
//!
//! [`SpacingRule`] is consulted during placement; [`GuardrailEngine`] sweeps
//! the placed schedule once more and removes whatever still violates a rule.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::signals::Signals;
use crate::constants::rule_ids;
use crate::intake::{Baseline, FitnessTier};
use crate::models::{Modality, Session};

/// Hard sessions allowed in any 7-day window
pub fn max_hard_per_week(baseline: &Baseline, hybrid: bool, deload: bool) -> u32 {
    let derived = baseline.max_hard_per_week.unwrap_or(match (baseline.fitness_tier, hybrid) {
        (FitnessTier::Beginner, false) => 2,
        (FitnessTier::Intermediate | FitnessTier::Advanced, false) => 3,
        (FitnessTier::Beginner, true) => 3,
        (FitnessTier::Intermediate | FitnessTier::Advanced, true) => 4,
    });

    if deload {
        derived.saturating_sub(1).max(1)
    } else {
        derived
    }
}

/// Why a hard session may not go on a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardViolation {
    Spacing,
    Budget,
}

impl HardViolation {
    pub fn rule_id(self) -> &'static str {
        match self {
            Self::Spacing => rule_ids::GUARDRAIL_HARD_SPACING,
            Self::Budget => rule_ids::GUARDRAIL_HARD_BUDGET,
        }
    }
}

/// Spacing and budget checks against completed signals plus a set of
/// already-placed hard dates
#[derive(Debug, Clone, Copy)]
pub struct SpacingRule<'a> {
    signals: &'a Signals,
    max_hard: u32,
}

impl<'a> SpacingRule<'a> {
    pub fn new(signals: &'a Signals, max_hard: u32) -> Self {
        Self { signals, max_hard }
    }

    pub fn max_hard(&self) -> u32 {
        self.max_hard
    }

    /// No hard session on the same or an adjacent date, no completed hard
    /// activity that day or the day before, no very hard one two days before
    pub fn spacing_ok(&self, date: NaiveDate, placed_hard: &BTreeSet<NaiveDate>) -> bool {
        let day = Duration::days(1);
        let planned_clash = placed_hard.contains(&date)
            || placed_hard.contains(&(date - day))
            || placed_hard.contains(&(date + day));

        !planned_clash
            && !self.signals.completed_hard_on(date)
            && !self.signals.completed_hard_on(date - day)
            && !self.signals.completed_very_hard_on(date - Duration::days(2))
    }

    /// Every 7-day window containing `date` stays within the budget
    pub fn budget_ok(&self, date: NaiveDate, placed_hard: &BTreeSet<NaiveDate>) -> bool {
        (0..7).all(|back| {
            let start = date - Duration::days(back);
            let end = start + Duration::days(6);
            let completed = self.signals.hard_dates_between(start, end);
            let planned = placed_hard.range(start..=end).count();
            (completed + planned + 1) as u32 <= self.max_hard
        })
    }

    pub fn check(&self, date: NaiveDate, placed_hard: &BTreeSet<NaiveDate>) -> Result<(), HardViolation> {
        if !self.spacing_ok(date, placed_hard) {
            return Err(HardViolation::Spacing);
        }
        if !self.budget_ok(date, placed_hard) {
            return Err(HardViolation::Budget);
        }
        Ok(())
    }

    pub fn allows_hard(&self, date: NaiveDate, placed_hard: &BTreeSet<NaiveDate>) -> bool {
        self.check(date, placed_hard).is_ok()
    }
}

/// A session dropped by the sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Removal {
    pub session: Session,
    pub rule_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuardrailReport {
    pub kept: Vec<Session>,
    pub removed: Vec<Removal>,
}

/// Final sweep over a placed schedule
#[derive(Debug, Clone, Copy)]
pub struct GuardrailEngine<'a> {
    rule: SpacingRule<'a>,
    allow_two_a_days: bool,
}

impl<'a> GuardrailEngine<'a> {
    pub fn new(signals: &'a Signals, max_hard: u32, allow_two_a_days: bool) -> Self {
        Self {
            rule: SpacingRule::new(signals, max_hard),
            allow_two_a_days,
        }
    }

    /// Keep the highest-priority sessions that satisfy every rule
    pub fn sweep(&self, mut sessions: Vec<Session>) -> GuardrailReport {
        sessions.sort_by_key(|s| (s.kind.priority(), s.date));

        let mut report = GuardrailReport::default();
        let mut by_date: BTreeMap<NaiveDate, Vec<Modality>> = BTreeMap::new();
        let mut modality_kept = Vec::new();

        for session in sessions {
            let present = by_date.entry(session.date).or_default();
            let verdict = match present.as_slice() {
                [] => None,
                [existing] if self.allow_two_a_days && *existing != session.modality => None,
                existing if existing.contains(&session.modality) => Some((
                    rule_ids::GUARDRAIL_ONE_PER_DAY,
                    format!("{} already has a {} session", session.date, session.modality),
                )),
                _ => Some((
                    rule_ids::GUARDRAIL_SINGLE_MODALITY,
                    format!("{} already has a session of another modality", session.date),
                )),
            };

            match verdict {
                None => {
                    present.push(session.modality);
                    modality_kept.push(session);
                }
                Some((rule_id, reason)) => {
                    debug!(session.kind = %session.kind, session.date = %session.date, rule.id = rule_id, "Guardrail removal");
                    report.removed.push(Removal {
                        session,
                        rule_id: rule_id.to_string(),
                        reason,
                    });
                }
            }
        }

        let mut placed_hard = BTreeSet::new();
        for session in modality_kept {
            if !session.is_hard() {
                report.kept.push(session);
                continue;
            }
            match self.rule.check(session.date, &placed_hard) {
                Ok(()) => {
                    placed_hard.insert(session.date);
                    report.kept.push(session);
                }
                Err(violation) => {
                    let reason = match violation {
                        HardViolation::Spacing => format!(
                            "{} on {} would sit next to another hard day",
                            session.kind, session.date
                        ),
                        HardViolation::Budget => format!(
                            "{} on {} exceeds {} hard sessions per 7 days",
                            session.kind,
                            session.date,
                            self.rule.max_hard()
                        ),
                    };
                    debug!(session.kind = %session.kind, session.date = %session.date, rule.id = violation.rule_id(), "Guardrail removal");
                    report.removed.push(Removal {
                        session,
                        rule_id: violation.rule_id().to_string(),
                        reason,
                    });
                }
            }
        }

        report
            .kept
            .sort_by_key(|s| (s.date, s.kind.priority()));
        report
    }
}
