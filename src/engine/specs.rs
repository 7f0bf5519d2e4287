// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Session templates for one planning cycle
//!
//! Specs are produced per modality in placement order: the scheduler walks
//! each list front to back, so the most important session comes first.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseInfo};
use super::round_minutes;
use crate::config::planner_config::PlannerConfig;
use crate::constants::{limits, rule_ids};
use crate::intake::{FitnessTier, Goal, Intake};
use crate::models::{Hardness, Modality, SessionKind, SessionTargets};

const DEFAULT_RUNS_PER_WEEK: u32 = 4;
const SHAKEOUT_MINUTES: u32 = 20;
const LIGHT_STRENGTH_SCHEME: &str = "2x10 light";
const DELOAD_STRENGTH_SCHEME: &str = "2x8 @ RPE 6";
const MAINTENANCE_STRENGTH_SCHEME: &str = "2x5";

/// An unplaced session template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSpec {
    pub program: String,
    pub kind: SessionKind,
    pub hardness: Hardness,
    /// Needs a recovery day afterwards
    pub requires_recovery: bool,
    pub title: String,
    pub duration_minutes: u32,
    pub intensity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default)]
    pub rule_refs: Vec<String>,
}

impl SessionSpec {
    pub fn new(program: &str, kind: SessionKind, duration_minutes: u32) -> Self {
        let hardness = kind.hardness();
        Self {
            program: program.to_string(),
            kind,
            hardness,
            requires_recovery: hardness == Hardness::Hard,
            title: kind.traits().title.to_string(),
            duration_minutes,
            intensity: kind.traits().intensity.to_string(),
            scheme: None,
            rule_refs: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_intensity(mut self, intensity: impl Into<String>) -> Self {
        self.intensity = intensity.into();
        self
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    pub fn with_rule(mut self, rule_id: &str) -> Self {
        self.rule_refs.push(rule_id.to_string());
        self
    }

    pub fn modality(&self) -> Modality {
        self.kind.modality()
    }

    pub fn is_hard(&self) -> bool {
        self.hardness == Hardness::Hard
    }

    pub fn targets(&self) -> SessionTargets {
        SessionTargets {
            duration_minutes: self.duration_minutes,
            intensity: self.intensity.clone(),
            scheme: self.scheme.clone(),
        }
    }
}

/// Both modality lists for one cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CycleSpecs {
    pub endurance: Vec<SessionSpec>,
    pub strength: Vec<SessionSpec>,
}

impl CycleSpecs {
    pub fn len(&self) -> usize {
        self.endurance.len() + self.strength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endurance.is_empty() && self.strength.is_empty()
    }

    /// Endurance and strength are both planned this cycle
    pub fn is_hybrid(&self) -> bool {
        !self.endurance.is_empty() && !self.strength.is_empty()
    }

    pub fn target(&self, modality: Modality) -> usize {
        match modality {
            Modality::Endurance => self.endurance.len(),
            Modality::Strength => self.strength.len(),
        }
    }
}

/// Per-cycle inputs that shape the templates
#[derive(Debug, Clone, Copy)]
pub struct SpecContext<'a> {
    pub today: NaiveDate,
    pub phase: Option<&'a PhaseInfo>,
    pub deload: bool,
    pub acwr: Option<f64>,
}

impl SpecContext<'_> {
    fn phase_kind(&self) -> Option<Phase> {
        self.phase.map(|info| info.phase)
    }

    /// Deload reduces volume everywhere except taper and post-event weeks
    fn deload_applies(&self) -> bool {
        self.deload && !matches!(self.phase_kind(), Some(Phase::Taper | Phase::Post))
    }

    fn iso_week(&self) -> u32 {
        self.today.iso_week().week()
    }
}

pub struct SessionSpecBuilder<'a> {
    intake: &'a Intake,
    config: &'a PlannerConfig,
}

impl<'a> SessionSpecBuilder<'a> {
    pub fn new(intake: &'a Intake, config: &'a PlannerConfig) -> Self {
        Self { intake, config }
    }

    fn tier(&self) -> FitnessTier {
        self.intake.baseline.fitness_tier
    }

    /// Longest recent long session, or a tier default
    pub fn baseline_long_minutes(&self) -> u32 {
        self.intake
            .baseline
            .longest_run_minutes
            .unwrap_or(match self.tier() {
                FitnessTier::Beginner => 50,
                FitnessTier::Intermediate => 75,
                FitnessTier::Advanced => 90,
            })
    }

    fn easy_minutes(&self) -> u32 {
        match self.tier() {
            FitnessTier::Beginner => 30,
            FitnessTier::Intermediate => 45,
            FitnessTier::Advanced => 50,
        }
    }

    fn quality_minutes(&self) -> u32 {
        match self.tier() {
            FitnessTier::Beginner => 35,
            FitnessTier::Intermediate => 45,
            FitnessTier::Advanced => 55,
        }
    }

    pub fn build(&self, ctx: &SpecContext<'_>) -> CycleSpecs {
        let endurance = self
            .intake
            .endurance_goal()
            .map(|goal| self.endurance_specs(goal, ctx))
            .unwrap_or_default();
        let strength = self
            .intake
            .strength_goal()
            .map(|goal| self.strength_specs(goal, ctx))
            .unwrap_or_default();

        CycleSpecs {
            endurance,
            strength,
        }
    }

    /// Phase-aware templates for dated marathon-family goals, the default
    /// 4-session cycle otherwise
    pub fn endurance_specs(&self, goal: &Goal, ctx: &SpecContext<'_>) -> Vec<SessionSpec> {
        let phased = ctx
            .phase
            .filter(|_| goal.target_date.is_some() && goal.event().is_marathon_family());

        let specs = match phased {
            Some(info) => self.phased_endurance(&goal.program(), info, ctx),
            None => self.default_endurance(&goal.program(), ctx),
        };

        specs
            .into_iter()
            .map(|spec| self.finish_endurance(spec, ctx))
            .collect()
    }

    fn default_endurance(&self, program: &str, ctx: &SpecContext<'_>) -> Vec<SessionSpec> {
        let runs = self
            .intake
            .baseline
            .runs_per_week
            .unwrap_or(DEFAULT_RUNS_PER_WEEK)
            .max(1) as usize;

        let long_minutes = ctx
            .phase
            .map(|info| info.long_session_minutes)
            .unwrap_or_else(|| self.baseline_long_minutes());
        let quality_kind = if ctx.iso_week() % 2 == 0 {
            SessionKind::Tempo
        } else {
            SessionKind::Intervals
        };

        let mut specs = vec![
            SessionSpec::new(program, SessionKind::LongRun, long_minutes),
            SessionSpec::new(program, quality_kind, self.quality_minutes())
                .with_rule(rule_ids::QUALITY_WEEK_PARITY),
        ];
        while specs.len() < runs {
            specs.push(SessionSpec::new(program, SessionKind::Z2, self.easy_minutes()));
        }
        specs.truncate(runs);
        specs
    }

    fn tempo_gate_passes(&self, info: &PhaseInfo, ctx: &SpecContext<'_>) -> bool {
        self.tier() != FitnessTier::Beginner
            && info.week_in_phase >= 3
            && self.baseline_long_minutes() >= 60
            && ctx
                .acwr
                .map_or(false, |acwr| acwr >= self.config.load.acwr_progress_gate)
    }

    fn phased_endurance(
        &self,
        program: &str,
        info: &PhaseInfo,
        ctx: &SpecContext<'_>,
    ) -> Vec<SessionSpec> {
        let runs = self
            .intake
            .baseline
            .runs_per_week
            .unwrap_or(DEFAULT_RUNS_PER_WEEK)
            .clamp(3, 6) as usize;
        let long = SessionSpec::new(program, SessionKind::LongRun, info.long_session_minutes);
        let quality = self.quality_minutes();

        let mut specs = match info.phase {
            Phase::Base => {
                let mut specs = vec![long];
                if self.tempo_gate_passes(info, ctx) {
                    specs.push(
                        SessionSpec::new(program, SessionKind::Tempo, quality)
                            .with_rule(rule_ids::BASE_TEMPO_GATE),
                    );
                }
                specs
            }
            Phase::Build => {
                let kind = if info.week_in_phase % 2 == 1 {
                    SessionKind::Intervals
                } else {
                    SessionKind::MarathonPace
                };
                vec![
                    long,
                    SessionSpec::new(program, kind, quality)
                        .with_rule(rule_ids::BUILD_QUALITY_ALTERNATION),
                ]
            }
            Phase::Peak => vec![
                long,
                SessionSpec::new(program, SessionKind::Intervals, quality)
                    .with_rule(rule_ids::PEAK_DOUBLE_QUALITY),
                SessionSpec::new(program, SessionKind::MarathonPace, quality + 15)
                    .with_rule(rule_ids::PEAK_DOUBLE_QUALITY),
            ],
            Phase::Taper if info.taper_week.unwrap_or(1) < 3 => {
                let sharp = round_minutes(f64::from(quality) * 0.7, limits::DURATION_ROUNDING_MINUTES);
                vec![
                    long.with_rule(rule_ids::TAPER_SHARPEN),
                    SessionSpec::new(program, SessionKind::Intervals, sharp)
                        .with_title("Sharpening Intervals")
                        .with_intensity("short fast repeats, full recovery")
                        .with_rule(rule_ids::TAPER_SHARPEN),
                ]
            }
            Phase::Taper => {
                return vec![SessionSpec::new(program, SessionKind::Shakeout, SHAKEOUT_MINUTES)
                    .with_rule(rule_ids::TAPER_SHAKEOUT_ONLY)];
            }
            Phase::Post => {
                return (0..2)
                    .map(|_| {
                        SessionSpec::new(program, SessionKind::Easy, info.long_session_minutes)
                            .with_title("Recovery Run")
                            .with_rule(rule_ids::POST_EVENT_RECOVERY)
                    })
                    .collect();
            }
        };

        let easy = if info.is_taper() {
            round_minutes(f64::from(self.easy_minutes()) * 0.8, limits::DURATION_ROUNDING_MINUTES)
        } else {
            self.easy_minutes()
        };
        while specs.len() < runs {
            specs.push(SessionSpec::new(program, SessionKind::Easy, easy));
        }
        specs
    }

    /// Apply deload and the per-day cap to an endurance template
    fn finish_endurance(&self, mut spec: SessionSpec, ctx: &SpecContext<'_>) -> SessionSpec {
        let mut minutes = f64::from(spec.duration_minutes);
        if ctx.deload_applies() {
            minutes *= self.config.load.deload_multiplier;
        }
        let mut minutes = round_minutes(minutes, limits::DURATION_ROUNDING_MINUTES)
            .max(limits::MIN_SESSION_MINUTES);

        if let Some(cap) = self.intake.constraints.max_minutes_per_day {
            let marathon_phase = ctx.phase.map_or(false, |info| {
                info.is_loading() && info.event.is_marathon_family()
            });
            let cap = if spec.kind == SessionKind::LongRun && marathon_phase {
                let raised = cap.max(self.config.phase.marathon_long_cap_floor);
                if raised > cap && minutes > cap {
                    spec.rule_refs.push(rule_ids::LONG_CAP_RAISED.to_string());
                }
                raised
            } else {
                cap
            };
            minutes = minutes.min(cap);
        }

        spec.duration_minutes = minutes;
        spec
    }

    /// Strength templates: volume is reduced by phase and deload, never cancelled
    pub fn strength_specs(&self, goal: &Goal, ctx: &SpecContext<'_>) -> Vec<SessionSpec> {
        let baseline = &self.intake.baseline;
        let count = baseline.strength_per_week.unwrap_or(match self.tier() {
            FitnessTier::Beginner => 2,
            FitnessTier::Intermediate | FitnessTier::Advanced => 3,
        }) as usize;
        let base_minutes = f64::from(baseline.strength_session_minutes.unwrap_or(45));

        let base_scheme = match self.tier() {
            FitnessTier::Beginner => "3x10-12",
            FitnessTier::Intermediate => "4x6-10",
            FitnessTier::Advanced => "5x5",
        };

        let (scheme, factor, reduced) = match ctx.phase_kind() {
            Some(Phase::Post) => (LIGHT_STRENGTH_SCHEME.to_string(), 0.7, true),
            Some(Phase::Peak | Phase::Taper) => {
                (MAINTENANCE_STRENGTH_SCHEME.to_string(), 0.75, true)
            }
            _ if ctx.deload => (
                DELOAD_STRENGTH_SCHEME.to_string(),
                self.config.load.deload_strength_factor,
                true,
            ),
            Some(Phase::Build) => (drop_one_set(base_scheme), 1.0, true),
            _ => (base_scheme.to_string(), 1.0, false),
        };

        let mut minutes = round_minutes(base_minutes * factor, limits::DURATION_ROUNDING_MINUTES)
            .max(limits::MIN_SESSION_MINUTES);
        if let Some(cap) = self.intake.constraints.max_minutes_per_day {
            minutes = minutes.min(cap);
        }

        let rotation = baseline.strength_split.rotation();
        let offset = (ctx.iso_week() as usize * count) % rotation.len();
        let program = goal.program();

        (0..count)
            .map(|index| {
                let title = rotation[(offset + index) % rotation.len()];
                let spec = SessionSpec::new(&program, SessionKind::Strength, minutes)
                    .with_title(format!("Strength: {}", title))
                    .with_scheme(scheme.clone());
                if reduced {
                    spec.with_rule(rule_ids::STRENGTH_VOLUME_REDUCED)
                } else {
                    spec
                }
            })
            .collect()
    }
}

/// `4x6-10` becomes `3x6-10`; never below one set
fn drop_one_set(scheme: &str) -> String {
    match scheme.split_once('x') {
        Some((sets, reps)) => match sets.trim().parse::<u32>() {
            Ok(sets) => format!("{}x{}", sets.saturating_sub(1).max(1), reps),
            Err(_) => scheme.to_string(),
        },
        None => scheme.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::planner_config::PhaseSettings;
    use crate::engine::phase::PhaseModel;
    use crate::intake::{Baseline, Constraints, EnduranceEvent, GoalKind, StrengthSplit};
    use chrono::{Duration, Weekday};

    fn goal(kind: GoalKind, event: Option<EnduranceEvent>, target: Option<NaiveDate>) -> Goal {
        Goal {
            id: None,
            kind,
            sub_kind: event,
            target_date: target,
            start_date: None,
            title: None,
        }
    }

    fn intake(goals: Vec<Goal>) -> Intake {
        Intake {
            goals,
            constraints: Constraints {
                available_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Sat, Weekday::Sun],
                rest_days: vec![],
                max_minutes_per_day: Some(90),
                max_sessions_per_week: None,
                fixed_appointments: vec![],
                allow_two_a_days: false,
            },
            baseline: Baseline {
                longest_run_minutes: Some(80),
                strength_split: StrengthSplit::PushPullLegs,
                ..Default::default()
            },
        }
    }

    // ISO week 15 of 2026
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap()
    }

    fn ctx(phase: Option<&PhaseInfo>, deload: bool) -> SpecContext<'_> {
        SpecContext {
            today: today(),
            phase,
            deload,
            acwr: Some(1.0),
        }
    }

    fn kinds(specs: &[SessionSpec]) -> Vec<SessionKind> {
        specs.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn test_default_cycle_alternates_quality_by_week() {
        let config = PlannerConfig::default();
        let intake = intake(vec![goal(GoalKind::Endurance, None, None)]);
        let builder = SessionSpecBuilder::new(&intake, &config);

        let odd_week = builder.build(&ctx(None, false));
        assert_eq!(
            kinds(&odd_week.endurance),
            vec![SessionKind::LongRun, SessionKind::Intervals, SessionKind::Z2, SessionKind::Z2]
        );
        assert!(odd_week.strength.is_empty());
        assert_eq!(odd_week.endurance[0].duration_minutes, 80);
        assert_eq!(odd_week.endurance[0].title, "Long Run");
        assert_eq!(odd_week.endurance[2].intensity, "zone 2");

        let next_week = SpecContext {
            today: today() + Duration::days(7),
            ..ctx(None, false)
        };
        assert_eq!(builder.build(&next_week).endurance[1].kind, SessionKind::Tempo);
    }

    #[test]
    fn test_deload_reduces_duration_not_frequency() {
        let config = PlannerConfig::default();
        let intake = intake(vec![goal(GoalKind::Endurance, None, None)]);
        let builder = SessionSpecBuilder::new(&intake, &config);

        let normal = builder.build(&ctx(None, false));
        let deload = builder.build(&ctx(None, true));
        assert_eq!(normal.len(), deload.len());
        // 80 * 0.55 = 44 -> 45
        assert_eq!(deload.endurance[0].duration_minutes, 45);
    }

    #[test]
    fn test_marathon_phases() {
        let config = PlannerConfig::default();
        let event = today() + Duration::days(40);
        let marathon = goal(GoalKind::Endurance, Some(EnduranceEvent::Marathon), Some(event));
        let intake = intake(vec![marathon.clone()]);
        let builder = SessionSpecBuilder::new(&intake, &config);
        let phases = PhaseModel::new(PhaseSettings::default());

        let peak = phases
            .classify(&marathon, event - Duration::days(25), 80)
            .unwrap();
        let specs = builder.build(&ctx(Some(&peak), false)).endurance;
        assert_eq!(
            kinds(&specs),
            vec![SessionKind::LongRun, SessionKind::Intervals, SessionKind::MarathonPace, SessionKind::Easy]
        );
        // Daily cap of 90 is raised to 150 for the long run
        assert_eq!(specs[0].duration_minutes, 150);
        assert!(specs[0].rule_refs.contains(&rule_ids::LONG_CAP_RAISED.to_string()));

        let race_week = phases.classify(&marathon, event - Duration::days(4), 80).unwrap();
        let specs = builder.build(&ctx(Some(&race_week), true)).endurance;
        assert_eq!(kinds(&specs), vec![SessionKind::Shakeout]);
        assert_eq!(specs[0].duration_minutes, 20, "deload does not stack on taper");
    }

    #[test]
    fn test_base_tempo_gate() {
        let config = PlannerConfig::default();
        let event = today() + Duration::days(200);
        let marathon = goal(GoalKind::Endurance, Some(EnduranceEvent::Marathon), Some(event));
        let intake = intake(vec![marathon.clone()]);
        let builder = SessionSpecBuilder::new(&intake, &config);
        let phases = PhaseModel::new(PhaseSettings::default());

        let mut base = phases.classify(&marathon, today(), 80).unwrap();
        assert_eq!(base.phase, Phase::Base);

        base.week_in_phase = 3;
        let gated = builder.build(&ctx(Some(&base), false)).endurance;
        assert!(gated.iter().any(|s| s.kind == SessionKind::Tempo));

        let low_acwr = SpecContext {
            acwr: Some(0.6),
            ..ctx(Some(&base), false)
        };
        let specs = builder.build(&low_acwr).endurance;
        assert!(specs.iter().all(|s| s.kind != SessionKind::Tempo));
        assert!(specs.iter().all(|s| !s.kind.is_quality()));
    }

    #[test]
    fn test_strength_rotation_and_volume() {
        let config = PlannerConfig::default();
        let intake = intake(vec![goal(GoalKind::Strength, None, None)]);
        let builder = SessionSpecBuilder::new(&intake, &config);

        let specs = builder.build(&ctx(None, false)).strength;
        assert_eq!(specs.len(), 3);
        let titles: Vec<_> = specs.iter().map(|s| s.title.as_str()).collect();
        // (15 * 3) % 3 == 0
        assert_eq!(titles, vec!["Strength: Push", "Strength: Pull", "Strength: Legs"]);
        assert_eq!(specs[0].scheme.as_deref(), Some("4x6-10"));
        assert!(specs.iter().all(|s| s.is_hard()));

        let deload = builder.build(&ctx(None, true)).strength;
        assert_eq!(deload.len(), 3, "deload keeps strength sessions");
        assert_eq!(deload[0].scheme.as_deref(), Some(DELOAD_STRENGTH_SCHEME));
        assert!(deload[0].duration_minutes < specs[0].duration_minutes);
    }

    #[test]
    fn test_deload_strength_factor_is_independent_of_readiness() {
        let mut config = PlannerConfig::default();
        config.load.deload_strength_factor = 0.8;
        config.readiness.light_strength_factor = 0.5;
        let intake = intake(vec![goal(GoalKind::Strength, None, None)]);
        let builder = SessionSpecBuilder::new(&intake, &config);

        // 45 * 0.8 = 36 -> 35
        let deload = builder.build(&ctx(None, true)).strength;
        assert!(deload.iter().all(|s| s.duration_minutes == 35));
    }

    #[test]
    fn test_drop_one_set() {
        assert_eq!(drop_one_set("4x6-10"), "3x6-10");
        assert_eq!(drop_one_set("1x5"), "1x5");
        assert_eq!(drop_one_set("AMRAP"), "AMRAP");
    }
}
