// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Matches performed activities to planned sessions and resolves status
//!
//! Matching is first-match in plan order, not best-match: the first
//! unclaimed activity on the same date with a compatible type and a
//! duration within tolerance wins. Rule citations in the adaptation log
//! depend on this order.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::calendar::{AdaptationEvent, AdaptationKind};
use crate::config::planner_config::MatchingSettings;
use crate::config::rules::RuleTable;
use crate::constants::rule_ids;
use crate::models::{ActivityRecord, Session, SessionStatus, StatusWindow};

/// Read-only inputs of one reconciliation pass
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub activities: &'a [ActivityRecord],
    pub status_window: Option<&'a StatusWindow>,
    /// Session IDs whose published events were deleted externally
    pub cancellations: &'a BTreeSet<String>,
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

/// A status change made by the pass
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub session_id: String,
    pub date: NaiveDate,
    pub status: SessionStatus,
    pub rule_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub completed: usize,
    pub missed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub transitions: Vec<Transition>,
    pub events: Vec<AdaptationEvent>,
}

impl ReconcileReport {
    pub fn total(&self) -> usize {
        self.completed + self.missed + self.skipped + self.cancelled
    }

    fn record(
        &mut self,
        session: &Session,
        kind: AdaptationKind,
        rule_ids: Vec<String>,
        detail: String,
        now: DateTime<Utc>,
    ) {
        match session.status {
            SessionStatus::Completed => self.completed += 1,
            SessionStatus::Missed => self.missed += 1,
            SessionStatus::Skipped => self.skipped += 1,
            SessionStatus::Cancelled => self.cancelled += 1,
            SessionStatus::Planned => {}
        }
        self.transitions.push(Transition {
            session_id: session.id.clone(),
            date: session.date,
            status: session.status,
            rule_ids: rule_ids.clone(),
        });
        self.events.push(AdaptationEvent::new(
            kind,
            session.date,
            Some(session.id.clone()),
            rule_ids,
            detail,
            now,
        ));
    }
}

pub struct Reconciler<'a> {
    rules: &'a RuleTable,
    matching: &'a MatchingSettings,
}

impl<'a> Reconciler<'a> {
    pub fn new(rules: &'a RuleTable, matching: &'a MatchingSettings) -> Self {
        Self { rules, matching }
    }

    /// Same date, compatible type, duration within tolerance
    pub fn matches(&self, session: &Session, activity: &ActivityRecord) -> bool {
        let planned = f64::from(session.targets.duration_minutes);
        activity.date == session.date
            && session.kind.matches_activity_type(&activity.activity_type)
            && (activity.duration_minutes - planned).abs()
                <= planned * self.matching.duration_tolerance
    }

    pub fn reconcile(&self, sessions: &mut [Session], input: &ReconcileInput<'_>) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        // Activities bound on earlier passes stay claimed
        let mut used: BTreeSet<String> = sessions
            .iter()
            .filter_map(|s| s.matched_activity_id.clone())
            .collect();

        for session in sessions.iter_mut().filter(|s| s.is_planned()) {
            if input.cancellations.contains(&session.id) {
                if self.transition(session, SessionStatus::Cancelled) {
                    report.record(
                        session,
                        AdaptationKind::Cancelled,
                        vec![rule_ids::EXTERNAL_EVENT_DELETED.to_string()],
                        format!("Published {} on {} was deleted", session.kind, session.date),
                        input.now,
                    );
                }
                continue;
            }

            if session.date > input.today {
                continue;
            }

            let matched = input
                .activities
                .iter()
                .find(|activity| !used.contains(&activity.id) && self.matches(session, activity));

            if let Some(activity) = matched {
                if self.transition(session, SessionStatus::Completed) {
                    used.insert(activity.id.clone());
                    session.matched_activity_id = Some(activity.id.clone());
                    report.record(
                        session,
                        AdaptationKind::Completed,
                        vec![rule_ids::MATCHED_ACTIVITY.to_string()],
                        format!(
                            "{} matched {} ({:.0} min)",
                            session.kind, activity.activity_type, activity.duration_minutes
                        ),
                        input.now,
                    );
                }
                continue;
            }

            if session.date == input.today {
                continue;
            }

            if let Some(window) = input.status_window.filter(|w| w.covers(session.date)) {
                if self.transition(session, SessionStatus::Skipped) {
                    report.record(
                        session,
                        AdaptationKind::Skipped,
                        vec![rule_ids::STATUS_WINDOW_SKIP.to_string()],
                        format!("{:?} window since {}", window.status, window.since),
                        input.now,
                    );
                }
                continue;
            }

            let rule = self.rules.lookup(session.kind);
            let kind = match rule.status {
                SessionStatus::Missed => AdaptationKind::Missed,
                _ => AdaptationKind::Skipped,
            };
            if self.transition(session, rule.status) {
                let detail = if rule.citation.is_empty() {
                    format!("{} on {} not performed", session.kind, session.date)
                } else {
                    rule.citation.clone()
                };
                report.record(session, kind, rule.rule_ids.clone(), detail, input.now);
            }
        }

        debug!(
            completed = report.completed,
            missed = report.missed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            "Reconciliation pass finished"
        );
        report
    }

    fn transition(&self, session: &mut Session, next: SessionStatus) -> bool {
        match session.transition(next) {
            Ok(()) => true,
            Err(e) => {
                warn!("Rejected status change: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityStatus, SessionKind, SessionTargets};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, d).unwrap()
    }

    fn session(kind: SessionKind, date: NaiveDate, minutes: u32) -> Session {
        Session {
            id: Session::deterministic_id("marathon", date, kind),
            program: "marathon".to_string(),
            date,
            kind,
            modality: kind.modality(),
            hardness: kind.hardness(),
            title: kind.to_string(),
            targets: SessionTargets {
                duration_minutes: minutes,
                intensity: "steady".to_string(),
                scheme: None,
            },
            status: SessionStatus::Planned,
            rule_refs: vec![],
            matched_activity_id: None,
        }
    }

    fn activity(id: &str, activity_type: &str, date: NaiveDate, minutes: f64) -> ActivityRecord {
        ActivityRecord {
            id: id.to_string(),
            activity_type: activity_type.to_string(),
            date,
            duration_minutes: minutes,
            effort: None,
            hr_zone_minutes: None,
            classification: None,
        }
    }

    fn input<'a>(
        activities: &'a [ActivityRecord],
        cancellations: &'a BTreeSet<String>,
        today: NaiveDate,
    ) -> ReconcileInput<'a> {
        ReconcileInput {
            activities,
            status_window: None,
            cancellations,
            today,
            now: Utc::now(),
        }
    }

    #[test]
    fn test_long_run_match_within_tolerance() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);
        let none = BTreeSet::new();

        let mut sessions = vec![session(SessionKind::LongRun, day(3), 90)];
        let activities = vec![activity("a1", "Running", day(3), 95.0)];
        let report = reconciler.reconcile(&mut sessions, &input(&activities, &none, day(4)));

        assert_eq!(report.completed, 1);
        assert_eq!(sessions[0].status, SessionStatus::Completed);
        assert_eq!(sessions[0].matched_activity_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_short_activity_leaves_long_run_missed() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);
        let none = BTreeSet::new();

        let mut sessions = vec![session(SessionKind::LongRun, day(3), 90)];
        let activities = vec![activity("a1", "Running", day(3), 50.0)];
        let report = reconciler.reconcile(&mut sessions, &input(&activities, &none, day(4)));

        assert_eq!(sessions[0].status, SessionStatus::Missed);
        assert_eq!(
            report.events[0].rule_ids,
            vec![rule_ids::LR_MISSED_SWAP_OR_SHORTEN.to_string()]
        );
        assert_eq!(report.events[0].kind, AdaptationKind::Missed);
    }

    #[test]
    fn test_first_match_wins_and_activity_is_claimed_once() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);
        let none = BTreeSet::new();

        let mut sessions = vec![
            session(SessionKind::Z2, day(3), 40),
            session(SessionKind::Easy, day(3), 45),
        ];
        let activities = vec![
            activity("a1", "Run", day(3), 30.0),
            activity("a2", "Run", day(3), 44.0),
        ];
        let report = reconciler.reconcile(&mut sessions, &input(&activities, &none, day(4)));

        // a1 fits Z2 within 30%, so Z2 takes it even though a2 is closer
        assert_eq!(sessions[0].matched_activity_id.as_deref(), Some("a1"));
        assert_eq!(sessions[1].matched_activity_id.as_deref(), Some("a2"));
        assert_eq!(report.completed, 2);
    }

    #[test]
    fn test_future_and_today_sessions() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);
        let none = BTreeSet::new();

        let mut sessions = vec![
            session(SessionKind::Strength, day(4), 45),
            session(SessionKind::Tempo, day(5), 45),
        ];
        let activities = vec![activity("lift", "Weight Training", day(4), 50.0)];
        let report = reconciler.reconcile(&mut sessions, &input(&activities, &none, day(4)));

        assert_eq!(sessions[0].status, SessionStatus::Completed);
        assert_eq!(sessions[1].status, SessionStatus::Planned);
        assert_eq!(report.total(), 1);

        // Unmatched sessions dated today stay planned
        let mut today_only = vec![session(SessionKind::Tempo, day(4), 45)];
        reconciler.reconcile(&mut today_only, &input(&[], &none, day(4)));
        assert_eq!(today_only[0].status, SessionStatus::Planned);
    }

    #[test]
    fn test_status_window_overrides_rule_table() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);
        let none = BTreeSet::new();
        let window = StatusWindow {
            status: AvailabilityStatus::Illness,
            since: day(2),
            until: None,
        };

        let mut sessions = vec![session(SessionKind::LongRun, day(3), 90)];
        let mut reconcile_input = input(&[], &none, day(5));
        reconcile_input.status_window = Some(&window);
        let report = reconciler.reconcile(&mut sessions, &reconcile_input);

        assert_eq!(sessions[0].status, SessionStatus::Skipped);
        assert_eq!(report.events[0].rule_ids, vec![rule_ids::STATUS_WINDOW_SKIP.to_string()]);
    }

    #[test]
    fn test_cancellation_and_monotonic_status() {
        let rules = RuleTable::default();
        let matching = MatchingSettings::default();
        let reconciler = Reconciler::new(&rules, &matching);

        let mut sessions = vec![
            session(SessionKind::Tempo, day(6), 45),
            session(SessionKind::LongRun, day(3), 90),
        ];
        let cancellations: BTreeSet<String> = [sessions[0].id.clone()].into_iter().collect();
        let activities = vec![activity("a1", "Run", day(3), 90.0)];

        let first = reconciler.reconcile(&mut sessions, &input(&activities, &cancellations, day(4)));
        assert_eq!(first.cancelled, 1);
        assert_eq!(first.completed, 1);

        // A second pass with no activities must not touch resolved sessions
        let second = reconciler.reconcile(&mut sessions, &input(&[], &cancellations, day(10)));
        assert_eq!(second.total(), 0);
        assert_eq!(sessions[1].status, SessionStatus::Completed);
        assert_eq!(sessions[0].status, SessionStatus::Cancelled);
    }
}
