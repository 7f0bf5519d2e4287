// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Same-day readiness gating and long-run carryover
//!
//! Readiness only says something about today, so the gate touches the
//! nearest planned date and only when that date is today or tomorrow.
//! Both components rewrite targets; neither changes session status.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use super::guardrails::SpacingRule;
use super::signals::Readiness;
use super::{is_weekend, round_minutes};
use crate::config::planner_config::ReadinessThresholds;
use crate::constants::{limits, rule_ids};
use crate::models::{Hardness, Session, SessionKind, SessionTargets};

const LIGHT_STRENGTH_SCHEME: &str = "2x12-15";

/// A target rewrite applied by the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Downgrade {
    pub session_id: String,
    pub program: String,
    pub date: NaiveDate,
    pub from_kind: SessionKind,
    pub to_kind: SessionKind,
    /// Targets before the downgrade
    pub original: SessionTargets,
    pub rule_id: String,
    pub score: f64,
}

impl Downgrade {
    pub fn is_long_run(&self) -> bool {
        self.from_kind == SessionKind::LongRun
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReadinessGate<'a> {
    thresholds: &'a ReadinessThresholds,
}

impl<'a> ReadinessGate<'a> {
    pub fn new(thresholds: &'a ReadinessThresholds) -> Self {
        Self { thresholds }
    }

    /// Whether `kind` is downgraded at this score
    pub fn affected(&self, kind: SessionKind, score: f64) -> bool {
        if score > self.thresholds.gate_max {
            return false;
        }
        if score < self.thresholds.severe_below {
            matches!(
                kind,
                SessionKind::LongRun
                    | SessionKind::Tempo
                    | SessionKind::Intervals
                    | SessionKind::MarathonPace
                    | SessionKind::Strength
            )
        } else {
            kind.is_quality()
        }
    }

    /// Downgrade sessions on the nearest planned date if it is today or tomorrow
    pub fn apply(
        &self,
        sessions: &mut [Session],
        readiness: Option<&Readiness>,
        today: NaiveDate,
    ) -> Vec<Downgrade> {
        let Some(readiness) = readiness else {
            return Vec::new();
        };
        let score = readiness.score;
        if score > self.thresholds.gate_max {
            return Vec::new();
        }

        let Some(nearest) = sessions
            .iter()
            .filter(|s| s.is_planned() && s.date >= today)
            .map(|s| s.date)
            .min()
        else {
            return Vec::new();
        };
        if nearest > today + Duration::days(1) {
            debug!(nearest = %nearest, "Nearest session is beyond the readiness horizon");
            return Vec::new();
        }

        let severe = score < self.thresholds.severe_below;
        let rule_id = if severe {
            rule_ids::READINESS_DOWNGRADE_SEVERE
        } else {
            rule_ids::READINESS_DOWNGRADE_QUALITY
        };

        let mut downgrades = Vec::new();
        for session in sessions
            .iter_mut()
            .filter(|s| s.is_planned() && s.date == nearest)
        {
            if !self.affected(session.kind, score) {
                continue;
            }
            let original = session.targets.clone();
            let from_kind = session.kind;

            if session.kind == SessionKind::Strength {
                self.lighten_strength(session);
            } else {
                self.to_aerobic(session);
            }
            session.rule_refs.push(rule_id.to_string());

            downgrades.push(Downgrade {
                session_id: session.id.clone(),
                program: session.program.clone(),
                date: session.date,
                from_kind,
                to_kind: session.kind,
                original,
                rule_id: rule_id.to_string(),
                score,
            });
        }
        downgrades
    }

    fn to_aerobic(&self, session: &mut Session) {
        let t = self.thresholds;
        let minutes = (f64::from(session.targets.duration_minutes) * t.downgrade_duration_factor)
            .min(f64::from(t.downgrade_max_minutes));
        let from = session.kind;

        session.kind = SessionKind::Z2;
        session.hardness = Hardness::Easy;
        session.title = format!("Zone 2 Aerobic (was {})", from);
        session.targets = SessionTargets {
            duration_minutes: round_minutes(minutes, limits::DURATION_ROUNDING_MINUTES)
                .max(limits::MIN_SESSION_MINUTES),
            intensity: "zone 2, conversational".to_string(),
            scheme: None,
        };
    }

    fn lighten_strength(&self, session: &mut Session) {
        let minutes =
            f64::from(session.targets.duration_minutes) * self.thresholds.light_strength_factor;
        session.hardness = Hardness::Easy;
        session.targets = SessionTargets {
            duration_minutes: round_minutes(minutes, limits::DURATION_ROUNDING_MINUTES)
                .max(limits::MIN_SESSION_MINUTES),
            intensity: "light, RPE 5-6".to_string(),
            scheme: Some(LIGHT_STRENGTH_SCHEME.to_string()),
        };
    }
}

/// Where a downgraded long run ended up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CarryoverOutcome {
    /// Placed on an unused weekend slot
    Relocated { date: NaiveDate, session_id: String },
    /// Took over a later easy session
    ReplacedEasy {
        date: NaiveDate,
        session_id: String,
        replaced_session_id: String,
    },
    Failed { reason: String },
}

impl CarryoverOutcome {
    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::Relocated { .. } => rule_ids::LR_CARRYOVER_RELOCATED,
            Self::ReplacedEasy { .. } => rule_ids::LR_CARRYOVER_REPLACED_Z2,
            Self::Failed { .. } => rule_ids::LR_CARRYOVER_FAILED,
        }
    }
}

/// Moves a downgraded long run later in the same 7-day window
#[derive(Debug, Clone, Copy)]
pub struct CarryoverResolver<'a> {
    rule: SpacingRule<'a>,
}

impl<'a> CarryoverResolver<'a> {
    pub fn new(rule: SpacingRule<'a>) -> Self {
        Self { rule }
    }

    fn hard_dates(sessions: &[Session]) -> BTreeSet<NaiveDate> {
        sessions
            .iter()
            .filter(|s| s.is_planned() && s.is_hard())
            .map(|s| s.date)
            .collect()
    }

    /// Unused weekend slot first, then a later Z2/Easy session (weekend first)
    pub fn resolve(
        &self,
        sessions: &mut Vec<Session>,
        downgrade: &Downgrade,
        slots: &[NaiveDate],
    ) -> CarryoverOutcome {
        let hard = Self::hard_dates(sessions);
        let occupied: BTreeSet<NaiveDate> = sessions.iter().map(|s| s.date).collect();

        let mut weekend_slots: Vec<NaiveDate> = slots
            .iter()
            .copied()
            .filter(|date| *date > downgrade.date && is_weekend(*date) && !occupied.contains(date))
            .collect();
        weekend_slots.sort();
        let weekend = weekend_slots
            .into_iter()
            .find(|date| self.rule.allows_hard(*date, &hard));

        if let Some(date) = weekend {
            let session = carried_long_run(downgrade, date, rule_ids::LR_CARRYOVER_RELOCATED);
            let session_id = session.id.clone();
            sessions.push(session);
            sessions.sort_by_key(|s| (s.date, s.kind.priority()));
            debug!(session.date = %date, "Long run relocated");
            return CarryoverOutcome::Relocated { date, session_id };
        }

        let mut easy: Vec<usize> = sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.is_planned()
                    && s.date > downgrade.date
                    && matches!(s.kind, SessionKind::Z2 | SessionKind::Easy)
                    && s.program == downgrade.program
            })
            .map(|(index, _)| index)
            .collect();
        easy.sort_by_key(|index| (!is_weekend(sessions[*index].date), sessions[*index].date));

        let replaceable = easy.into_iter().find(|index| {
            let date = sessions[*index].date;
            let others_hard = sessions
                .iter()
                .any(|s| s.date == date && s.is_planned() && s.is_hard());
            !others_hard && self.rule.allows_hard(date, &hard)
        });

        if let Some(index) = replaceable {
            let date = sessions[index].date;
            let replaced_session_id = sessions[index].id.clone();
            let session = carried_long_run(downgrade, date, rule_ids::LR_CARRYOVER_REPLACED_Z2);
            let session_id = session.id.clone();
            sessions[index] = session;
            debug!(session.date = %date, "Long run replaced a later easy session");
            return CarryoverOutcome::ReplacedEasy {
                date,
                session_id,
                replaced_session_id,
            };
        }

        CarryoverOutcome::Failed {
            reason: format!(
                "No legal date after {} for the {}-minute long run",
                downgrade.date, downgrade.original.duration_minutes
            ),
        }
    }
}

fn carried_long_run(downgrade: &Downgrade, date: NaiveDate, rule_id: &str) -> Session {
    let kind = SessionKind::LongRun;
    Session {
        id: Session::deterministic_id(&downgrade.program, date, kind),
        program: downgrade.program.clone(),
        date,
        kind,
        modality: kind.modality(),
        hardness: kind.hardness(),
        title: "Long Run (carried over)".to_string(),
        targets: downgrade.original.clone(),
        status: Default::default(),
        rule_refs: vec![rule_id.to_string()],
        matched_activity_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::signals::{DataQuality, ReadinessComponents, Signals};
    use crate::models::SessionStatus;

    // 2026-04-06 is a Monday
    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap() + Duration::days(offset)
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

    fn readiness(score: f64) -> Readiness {
        Readiness {
            score,
            quality: DataQuality::Device,
            components: ReadinessComponents::default(),
        }
    }

    #[test]
    fn test_severe_readiness_downgrades_long_run() {
        let thresholds = ReadinessThresholds::default();
        let gate = ReadinessGate::new(&thresholds);
        let mut sessions = vec![
            session(SessionKind::LongRun, day(0), 120),
            session(SessionKind::Tempo, day(3), 45),
        ];

        let downgrades = gate.apply(&mut sessions, Some(&readiness(42.0)), day(0));

        assert_eq!(downgrades.len(), 1);
        assert!(downgrades[0].is_long_run());
        assert_eq!(downgrades[0].original.duration_minutes, 120);
        assert_eq!(sessions[0].kind, SessionKind::Z2);
        assert_eq!(sessions[0].targets.duration_minutes, 60);
        assert!(!sessions[0].is_hard());
        assert_eq!(sessions[0].id, Session::deterministic_id("marathon", day(0), SessionKind::LongRun));
        assert_eq!(sessions[1].kind, SessionKind::Tempo, "only the nearest date is gated");
    }

    #[test]
    fn test_moderate_readiness_spares_long_run_and_strength() {
        let thresholds = ReadinessThresholds::default();
        let gate = ReadinessGate::new(&thresholds);
        let mut sessions = vec![
            session(SessionKind::LongRun, day(1), 120),
            session(SessionKind::Strength, day(1), 45),
            session(SessionKind::Intervals, day(1), 45),
        ];

        let downgrades = gate.apply(&mut sessions, Some(&readiness(58.0)), day(0));
        assert_eq!(downgrades.len(), 1);
        assert_eq!(downgrades[0].from_kind, SessionKind::Intervals);
        assert_eq!(sessions[0].kind, SessionKind::LongRun);

        let downgrades = gate.apply(&mut sessions, Some(&readiness(45.0)), day(0));
        let strength = &sessions[1];
        assert!(downgrades.iter().any(|d| d.from_kind == SessionKind::Strength));
        assert_eq!(strength.targets.scheme.as_deref(), Some(LIGHT_STRENGTH_SCHEME));
        assert_eq!(strength.hardness, Hardness::Easy);
    }

    #[test]
    fn test_gate_ignores_distant_sessions_and_good_scores() {
        let thresholds = ReadinessThresholds::default();
        let gate = ReadinessGate::new(&thresholds);
        let mut sessions = vec![session(SessionKind::Tempo, day(2), 45)];

        assert!(gate.apply(&mut sessions, Some(&readiness(30.0)), day(0)).is_empty());
        assert!(gate.apply(&mut sessions, Some(&readiness(80.0)), day(2)).is_empty());
        assert!(gate.apply(&mut sessions, None, day(2)).is_empty());
    }

    #[test]
    fn test_carryover_prefers_free_weekend_slot() {
        let thresholds = ReadinessThresholds::default();
        let signals = Signals::default();
        let mut sessions = vec![
            session(SessionKind::LongRun, day(0), 120),
            session(SessionKind::Z2, day(2), 45),
        ];
        let downgrades = ReadinessGate::new(&thresholds).apply(&mut sessions, Some(&readiness(40.0)), day(0));

        let resolver = CarryoverResolver::new(SpacingRule::new(&signals, 3));
        let slots = vec![day(0), day(2), day(5), day(6)];
        let outcome = resolver.resolve(&mut sessions, &downgrades[0], &slots);

        assert_eq!(
            outcome,
            CarryoverOutcome::Relocated {
                date: day(5),
                session_id: Session::deterministic_id("marathon", day(5), SessionKind::LongRun),
            }
        );
        let relocated = sessions.iter().find(|s| s.date == day(5)).unwrap();
        assert_eq!(relocated.targets.duration_minutes, 120);
    }

    #[test]
    fn test_carryover_replaces_easy_session_or_fails() {
        let thresholds = ReadinessThresholds::default();
        let signals = Signals::default();
        let resolver = CarryoverResolver::new(SpacingRule::new(&signals, 3));

        let mut sessions = vec![
            session(SessionKind::LongRun, day(0), 120),
            session(SessionKind::Z2, day(2), 45),
            session(SessionKind::Z2, day(5), 45),
        ];
        let downgrades = ReadinessGate::new(&thresholds).apply(&mut sessions, Some(&readiness(40.0)), day(0));
        let slots = vec![day(0), day(2), day(5)];
        let outcome = resolver.resolve(&mut sessions, &downgrades[0], &slots);
        assert!(matches!(outcome, CarryoverOutcome::ReplacedEasy { date, .. } if date == day(5)));
        assert_eq!(sessions[2].kind, SessionKind::LongRun);

        let mut crowded = vec![
            session(SessionKind::LongRun, day(0), 120),
            session(SessionKind::Tempo, day(3), 45),
            session(SessionKind::Z2, day(4), 45),
        ];
        let downgrades = ReadinessGate::new(&thresholds).apply(&mut crowded, Some(&readiness(40.0)), day(0));
        let outcome = resolver.resolve(&mut crowded, &downgrades[0], &[day(0), day(3), day(4)]);
        assert_eq!(outcome.rule_id(), rule_ids::LR_CARRYOVER_FAILED);
    }
}
