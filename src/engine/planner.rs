// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Training Planner
//!
//! Entry points of the engine. [`TrainingPlanner::generate`] runs one
//! planning cycle over a [`PlanningSnapshot`] and returns the rewritten
//! [`Calendar`]; [`TrainingPlanner::reconcile`] resolves session status
//! against performed activities.
//!
//! A cycle runs in a fixed order:
//!
//! 1. signals from the trailing activity and wellness windows
//! 2. phase and deload decision
//! 3. slot allocation over the next 7 dates
//! 4. session specs, greedy placement, guardrail sweep
//! 5. readiness gate and long-run carryover

use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};

use super::guardrails::{max_hard_per_week, GuardrailEngine, Removal, SpacingRule};
use super::phase::PhaseModel;
use super::readiness::{CarryoverOutcome, CarryoverResolver, Downgrade, ReadinessGate};
use super::reconciler::{ReconcileInput, ReconcileReport, Reconciler};
use super::scheduler::{PlacedSession, Scheduler};
use super::signals::{AcwrZone, DeloadDecision, SignalModel, Signals};
use super::slots::SlotAllocator;
use super::specs::{CycleSpecs, SessionSpec, SessionSpecBuilder, SpecContext};
use crate::calendar::{
    AdaptationEvent, AdaptationKind, AdaptationLog, Blueprint, Calendar, Plan, WeeklyTargets,
};
use crate::config::planner_config::PlannerConfig;
use crate::config::rules::RuleTable;
use crate::constants::limits;
use crate::intake::{Intake, IntakeError};
use crate::logging::PlannerLogger;
use crate::models::{ActivityRecord, Session, SessionStatus, StatusWindow, WellnessRecord};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
}

/// Everything one planning run reads, loaded once at the boundary
#[derive(Debug, Clone)]
pub struct PlanningSnapshot {
    pub intake: Intake,
    pub activities: Vec<ActivityRecord>,
    pub wellness: Vec<WellnessRecord>,
    pub status_window: Option<StatusWindow>,
    /// Calendar persisted by the previous run
    pub previous: Option<Calendar>,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
    pub timezone: String,
}

/// Output of one planning cycle
#[derive(Debug, Clone)]
pub struct CycleResult {
    pub calendar: Calendar,
    pub signals: Signals,
    pub removals: Vec<Removal>,
    pub downgrades: Vec<Downgrade>,
    pub carryover: Option<CarryoverOutcome>,
    pub shortfalls: Vec<SessionSpec>,
}

pub struct TrainingPlanner {
    config: PlannerConfig,
    rules: RuleTable,
}

impl TrainingPlanner {
    pub fn new(config: PlannerConfig, rules: RuleTable) -> Self {
        Self { config, rules }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Run one planning cycle
    pub fn generate(&self, snapshot: &PlanningSnapshot) -> Result<CycleResult, PlanError> {
        let intake = &snapshot.intake;
        intake.validate()?;
        let today = snapshot.today;

        let signals = SignalModel::from_config(&self.config).compute(
            &snapshot.activities,
            &snapshot.wellness,
            today,
        );

        let builder = SessionSpecBuilder::new(intake, &self.config);
        let phase_model = PhaseModel::new(self.config.phase.clone());
        let (phase, milestones) = match intake.dated_endurance_goal() {
            Some(goal) => (
                phase_model.classify(goal, today, builder.baseline_long_minutes()),
                phase_model.milestones(goal, today),
            ),
            None => (None, Vec::new()),
        };
        let deload = DeloadDecision::evaluate(&signals, &self.config.load, phase.as_ref());

        let retained = retained_sessions(snapshot.previous.as_ref(), today);
        let mut excluded: BTreeSet<NaiveDate> = signals.completed_dates.clone();
        excluded.extend(
            retained
                .iter()
                .filter(|s| s.date >= today && !s.is_planned())
                .map(|s| s.date),
        );
        let slots = SlotAllocator::new(&intake.constraints).allocate(today, &excluded);

        let specs = builder.build(&SpecContext {
            today,
            phase: phase.as_ref(),
            deload: deload.active,
            acwr: signals.acwr,
        });
        let max_hard = max_hard_per_week(&intake.baseline, specs.is_hybrid(), deload.active);
        let allow_two_a_days = intake.constraints.allow_two_a_days;

        let outcome = Scheduler::new(&signals, max_hard, allow_two_a_days).schedule(&specs, &slots);
        for spec in &outcome.shortfalls {
            PlannerLogger::log_placement_shortfall(spec.kind, spec.duration_minutes);
        }

        let placed: Vec<Session> = outcome.placed.iter().map(to_session).collect();
        let report = GuardrailEngine::new(&signals, max_hard, allow_two_a_days).sweep(placed);
        for removal in &report.removed {
            PlannerLogger::log_guardrail_removal(
                removal.session.kind,
                removal.session.date,
                &removal.rule_id,
                &removal.reason,
            );
        }

        let mut sessions = report.kept;
        let downgrades = ReadinessGate::new(&self.config.readiness).apply(
            &mut sessions,
            signals.readiness.as_ref(),
            today,
        );
        for downgrade in &downgrades {
            PlannerLogger::log_readiness_gate(
                downgrade.score,
                downgrade.date,
                downgrade.from_kind,
                downgrade.to_kind,
            );
        }

        let carryover = downgrades.iter().find(|d| d.is_long_run()).map(|downgrade| {
            CarryoverResolver::new(SpacingRule::new(&signals, max_hard)).resolve(
                &mut sessions,
                downgrade,
                &slots,
            )
        });

        let mut merged = retained;
        merged.extend(sessions);
        merged.sort_by_key(|s| (s.date, s.kind.priority()));

        let recommendations = recommendations(
            &outcome.shortfalls,
            carryover.as_ref(),
            snapshot.status_window.as_ref(),
            &deload,
            &downgrades,
            today,
        );

        let mut adaptation = snapshot
            .previous
            .as_ref()
            .map(|calendar| calendar.adaptation.clone())
            .unwrap_or_default();
        let appended = append_cycle_events(
            &mut adaptation,
            &deload,
            &report.removed,
            &downgrades,
            carryover.as_ref(),
            today,
            snapshot.now,
        );
        debug!(events = appended, "Adaptation events appended");

        let history_start = today - Duration::days(limits::HISTORY_RETENTION_DAYS - 1);
        let history: Vec<ActivityRecord> = snapshot
            .activities
            .iter()
            .filter(|a| a.date >= history_start && a.date <= today)
            .cloned()
            .collect();

        let calendar = Calendar {
            timezone: snapshot.timezone.clone(),
            generated_at: snapshot.now,
            goals: intake.goals.clone(),
            milestones,
            history,
            plan: Plan {
                sessions: merged,
                recommendations,
            },
            blueprint: Blueprint {
                targets: weekly_targets(&specs, max_hard),
                acwr: signals.acwr,
                acwr_zone: signals
                    .acwr
                    .map(|acwr| AcwrZone::classify(acwr, &self.config.load)),
                phase,
                deload: deload.clone(),
                readiness: signals.readiness,
            },
            adaptation,
        };

        PlannerLogger::log_cycle_generated(
            today,
            calendar
                .plan
                .sessions
                .iter()
                .filter(|s| s.date >= today && s.is_planned())
                .count(),
            deload.active,
            signals.acwr,
        );

        Ok(CycleResult {
            calendar,
            signals,
            removals: report.removed,
            downgrades,
            carryover,
            shortfalls: outcome.shortfalls,
        })
    }

    /// Resolve planned sessions against performed activities and log the
    /// resulting adaptation events
    pub fn reconcile(
        &self,
        calendar: &mut Calendar,
        activities: &[ActivityRecord],
        status_window: Option<&StatusWindow>,
        cancellations: &BTreeSet<String>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> ReconcileReport {
        let input = ReconcileInput {
            activities,
            status_window,
            cancellations,
            today,
            now,
        };
        let report = Reconciler::new(&self.rules, &self.config.matching)
            .reconcile(&mut calendar.plan.sessions, &input);

        for transition in &report.transitions {
            PlannerLogger::log_session_transition(
                &transition.session_id,
                transition.date,
                transition.status,
                &transition.rule_ids,
            );
        }
        for event in &report.events {
            calendar.adaptation.append(event.clone());
        }

        info!(
            completed = report.completed,
            missed = report.missed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Calendar reconciled"
        );
        report
    }
}

/// Sessions carried over from the previous calendar: the trailing 28 days
/// before today, and anything already resolved from today on
fn retained_sessions(previous: Option<&Calendar>, today: NaiveDate) -> Vec<Session> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    let oldest = today - Duration::days(limits::HISTORY_RETENTION_DAYS);
    previous
        .plan
        .sessions
        .iter()
        .filter(|s| {
            (s.date < today && s.date >= oldest)
                || (s.date >= today && s.status != SessionStatus::Planned)
        })
        .cloned()
        .collect()
}

fn to_session(placed: &PlacedSession) -> Session {
    let spec = &placed.spec;
    Session {
        id: Session::deterministic_id(&spec.program, placed.date, spec.kind),
        program: spec.program.clone(),
        date: placed.date,
        kind: spec.kind,
        modality: spec.modality(),
        hardness: spec.hardness,
        title: spec.title.clone(),
        targets: spec.targets(),
        status: SessionStatus::Planned,
        rule_refs: spec.rule_refs.clone(),
        matched_activity_id: None,
    }
}

fn weekly_targets(specs: &CycleSpecs, max_hard: u32) -> WeeklyTargets {
    WeeklyTargets {
        endurance_sessions: specs.endurance.len() as u32,
        strength_sessions: specs.strength.len() as u32,
        max_hard_sessions: max_hard,
    }
}

fn recommendations(
    shortfalls: &[SessionSpec],
    carryover: Option<&CarryoverOutcome>,
    status_window: Option<&StatusWindow>,
    deload: &DeloadDecision,
    downgrades: &[Downgrade],
    today: NaiveDate,
) -> Vec<String> {
    let mut notes = Vec::new();

    if let Some(window) = status_window.filter(|w| w.covers(today)) {
        let until = window
            .until
            .map(|date| date.to_string())
            .unwrap_or_else(|| "further notice".to_string());
        notes.push(format!(
            "{:?} window active since {} until {}: sessions inside it will be skipped",
            window.status, window.since, until
        ));
    }
    if deload.active {
        if let Some(reason) = &deload.reason {
            notes.push(format!("Deload week: {}", reason));
        }
    }
    if let Some(first) = downgrades.first() {
        notes.push(format!(
            "Readiness {:.0}: {} session(s) on {} downgraded",
            first.score,
            downgrades.len(),
            first.date
        ));
    }
    if let Some(CarryoverOutcome::Failed { reason }) = carryover {
        notes.push(format!("Long run carryover failed: {}", reason));
    }
    for spec in shortfalls {
        notes.push(format!(
            "Could not place {} ({} min) this cycle without breaking recovery rules",
            spec.title, spec.duration_minutes
        ));
    }
    notes
}

fn append_cycle_events(
    log: &mut AdaptationLog,
    deload: &DeloadDecision,
    removed: &[Removal],
    downgrades: &[Downgrade],
    carryover: Option<&CarryoverOutcome>,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> usize {
    let mut events = Vec::new();

    if deload.active {
        events.push(AdaptationEvent::new(
            AdaptationKind::Deload,
            today,
            None,
            deload.rule_id.iter().cloned().collect(),
            deload.reason.clone().unwrap_or_default(),
            now,
        ));
    }
    for removal in removed {
        events.push(AdaptationEvent::new(
            AdaptationKind::GuardrailRemoved,
            removal.session.date,
            Some(removal.session.id.clone()),
            vec![removal.rule_id.clone()],
            removal.reason.clone(),
            now,
        ));
    }
    for downgrade in downgrades {
        events.push(AdaptationEvent::new(
            AdaptationKind::Downgraded,
            downgrade.date,
            Some(downgrade.session_id.clone()),
            vec![downgrade.rule_id.clone()],
            format!(
                "{} to {} at readiness {:.0}",
                downgrade.from_kind, downgrade.to_kind, downgrade.score
            ),
            now,
        ));
    }
    if let Some(outcome) = carryover {
        let (kind, date, session_id, detail) = match outcome {
            CarryoverOutcome::Relocated { date, session_id } => (
                AdaptationKind::CarriedOver,
                *date,
                Some(session_id.clone()),
                format!("Long run moved to {}", date),
            ),
            CarryoverOutcome::ReplacedEasy {
                date,
                session_id,
                replaced_session_id,
            } => (
                AdaptationKind::CarriedOver,
                *date,
                Some(session_id.clone()),
                format!("Long run replaced session {}", replaced_session_id),
            ),
            CarryoverOutcome::Failed { reason } => {
                (AdaptationKind::CarryoverFailed, today, None, reason.clone())
            }
        };
        events.push(AdaptationEvent::new(
            kind,
            date,
            session_id,
            vec![outcome.rule_id().to_string()],
            detail,
            now,
        ));
    }

    events
        .into_iter()
        .filter(|event| log.append_unique(event.clone()))
        .count()
}
