// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Plan invariants checked across a grid of dates, intakes and histories

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use serde_json::json;
use std::collections::BTreeMap;
use training_planner::config::{PlannerConfig, RuleTable};
use training_planner::engine::{CycleResult, Phase, PlanningSnapshot, TrainingPlanner};
use training_planner::intake::Intake;
use training_planner::models::{ActivityRecord, Modality, Session, SessionKind, WellnessRecord};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn intake(goals: serde_json::Value, constraints: serde_json::Value) -> Intake {
    serde_json::from_value(json!({
        "goals": goals,
        "constraints": constraints,
        "baseline": { "fitness_tier": "intermediate" }
    }))
    .unwrap()
}

fn every_day() -> serde_json::Value {
    json!({ "available_days": ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"] })
}

fn intakes() -> Vec<(&'static str, Intake)> {
    vec![
        (
            "endurance",
            intake(json!([{ "kind": "endurance" }]), every_day()),
        ),
        (
            "hybrid",
            intake(
                json!([{ "kind": "endurance" }, { "kind": "strength" }]),
                every_day(),
            ),
        ),
        (
            "marathon-hybrid",
            intake(
                json!([
                    { "kind": "endurance", "sub_kind": "marathon", "target_date": "2026-06-14" },
                    { "kind": "strength" }
                ]),
                every_day(),
            ),
        ),
        (
            "weekday-limited",
            intake(
                json!([{ "kind": "bodycomp" }]),
                json!({
                    "available_days": ["Mon", "Wed", "Thu", "Sat", "Sun"],
                    "rest_days": ["Wed"],
                    "max_sessions_per_week": 4
                }),
            ),
        ),
    ]
}

fn run(id: &str, date: NaiveDate, minutes: f64, effort: Option<u8>) -> ActivityRecord {
    ActivityRecord {
        id: id.to_string(),
        activity_type: "Run".to_string(),
        date,
        duration_minutes: minutes,
        effort,
        hr_zone_minutes: None,
        classification: None,
    }
}

/// Five weeks of running with a hard effort every third day
fn busy_history(today: NaiveDate) -> Vec<ActivityRecord> {
    (1..35)
        .map(|back| {
            let day = today - Duration::days(back);
            let effort = if back % 3 == 1 { Some(8) } else { Some(4) };
            run(&format!("run-{}", back), day, 50.0, effort)
        })
        .collect()
}

fn readiness(today: NaiveDate, score: Option<f64>) -> Vec<WellnessRecord> {
    score
        .map(|score| {
            WellnessRecord {
                date: today,
                readiness: Some(score),
                sleep_score: None,
                sleep_hours: None,
                hrv_ms: None,
                resting_hr: None,
            }
        })
        .into_iter()
        .collect()
}

fn snapshot(intake: &Intake, activities: Vec<ActivityRecord>, today: NaiveDate) -> PlanningSnapshot {
    PlanningSnapshot {
        intake: intake.clone(),
        activities,
        wellness: Vec::new(),
        status_window: None,
        previous: None,
        today,
        now: Utc.with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap(),
        timezone: "UTC".to_string(),
    }
}

fn planner() -> TrainingPlanner {
    TrainingPlanner::new(PlannerConfig::default(), RuleTable::default())
}

fn upcoming(result: &CycleResult, today: NaiveDate) -> Vec<&Session> {
    result
        .calendar
        .plan
        .sessions
        .iter()
        .filter(|s| s.date >= today && s.is_planned())
        .collect()
}

/// Every (intake, today, history, readiness) combination of the grid
fn grid() -> Result<Vec<(String, NaiveDate, CycleResult)>> {
    let planner = planner();
    let mut cases = Vec::new();
    for (label, intake) in intakes() {
        for offset in 0..14 {
            let today = date(2026, 3, 2) + Duration::days(offset);
            for (history_label, history) in [("fresh", Vec::new()), ("busy", busy_history(today))] {
                for score in [None, Some(60.0), Some(42.0)] {
                    let mut snap = snapshot(&intake, history.clone(), today);
                    snap.wellness = readiness(today, score);
                    let result = planner.generate(&snap)?;
                    cases.push((
                        format!("{}/{}/{:?}/{}", label, history_label, score, today),
                        today,
                        result,
                    ));
                }
            }
        }
    }
    Ok(cases)
}

#[test]
fn test_no_adjacent_hard_sessions() -> Result<()> {
    for (label, today, result) in grid()? {
        let hard: Vec<NaiveDate> = upcoming(&result, today)
            .iter()
            .filter(|s| s.is_hard())
            .map(|s| s.date)
            .collect();

        for pair in hard.windows(2) {
            assert!(
                (pair[1] - pair[0]).num_days() >= 2,
                "{}: hard sessions on {} and {}",
                label,
                pair[0],
                pair[1]
            );
        }
        for planned in &hard {
            let yesterday = *planned - Duration::days(1);
            assert!(
                !result.signals.hard_dates.contains(planned)
                    && !result.signals.hard_dates.contains(&yesterday),
                "{}: hard session on {} next to completed hard activity",
                label,
                planned
            );
            assert!(
                !result
                    .signals
                    .very_hard_dates
                    .contains(&(*planned - Duration::days(2))),
                "{}: hard session on {} two days after a very hard activity",
                label,
                planned
            );
        }
    }
    Ok(())
}

#[test]
fn test_hard_budget_per_rolling_week() -> Result<()> {
    for (label, today, result) in grid()? {
        let max_hard = result.calendar.blueprint.targets.max_hard_sessions as usize;
        let hard: Vec<NaiveDate> = upcoming(&result, today)
            .iter()
            .filter(|s| s.is_hard())
            .map(|s| s.date)
            .collect();

        for start_offset in -6..7 {
            let start = today + Duration::days(start_offset);
            let end = start + Duration::days(6);
            let completed = result.signals.hard_dates.range(start..=end).count();
            let planned = hard.iter().filter(|d| **d >= start && **d <= end).count();
            assert!(
                completed + planned <= max_hard,
                "{}: window {}..{} has {} completed + {} planned hard (max {})",
                label,
                start,
                end,
                completed,
                planned,
                max_hard
            );
        }
    }
    Ok(())
}

#[test]
fn test_single_modality_per_day() -> Result<()> {
    for (label, today, result) in grid()? {
        let mut by_date: BTreeMap<NaiveDate, Vec<Modality>> = BTreeMap::new();
        for session in upcoming(&result, today) {
            by_date.entry(session.date).or_default().push(session.modality);
        }
        for (day, modalities) in by_date {
            assert_eq!(modalities.len(), 1, "{}: {} has {:?}", label, day, modalities);
        }
    }
    Ok(())
}

#[test]
fn test_sessions_stay_on_open_slots() -> Result<()> {
    for (label, today, result) in grid()? {
        for session in upcoming(&result, today) {
            assert!(session.date <= today + Duration::days(6), "{}", label);
            assert!(
                !result.signals.completed_dates.contains(&session.date),
                "{}: {} already has a completed activity",
                label,
                session.date
            );
        }
        if label.starts_with("weekday-limited") {
            assert!(upcoming(&result, today).len() <= 4, "{}", label);
        }
    }
    Ok(())
}

#[test]
fn test_long_run_lands_on_weekend_from_every_start_day() -> Result<()> {
    let planner = planner();
    for (label, intake) in intakes()
        .into_iter()
        .filter(|(label, _)| *label != "weekday-limited")
    {
        // 2026-03-02 is a Monday
        for offset in 0..7 {
            let today = date(2026, 3, 2) + Duration::days(offset);
            let result = planner.generate(&snapshot(&intake, Vec::new(), today))?;
            let long_runs: Vec<NaiveDate> = upcoming(&result, today)
                .iter()
                .filter(|s| s.kind == SessionKind::LongRun)
                .map(|s| s.date)
                .collect();

            assert_eq!(long_runs.len(), 1, "{}/{}", label, today);
            assert!(
                matches!(long_runs[0].weekday(), Weekday::Sat | Weekday::Sun),
                "{}/{}: long run on {}",
                label,
                today,
                long_runs[0]
            );
        }
    }
    Ok(())
}

#[test]
fn test_low_readiness_downgrades_without_breaking_spacing() -> Result<()> {
    // Sunday with a long run planned today
    let today = date(2026, 3, 8);
    let intake = intake(json!([{ "kind": "endurance" }]), every_day());
    let mut snap = snapshot(&intake, Vec::new(), today);
    snap.wellness = readiness(today, Some(42.0));

    let result = planner().generate(&snap)?;
    assert_eq!(result.downgrades.len(), 1);
    assert_eq!(result.downgrades[0].from_kind, SessionKind::LongRun);
    assert!(result.carryover.is_some());

    let todays: Vec<&Session> = upcoming(&result, today)
        .into_iter()
        .filter(|s| s.date == today)
        .collect();
    assert!(todays.iter().all(|s| !s.is_hard()));
    Ok(())
}

#[test]
fn test_regeneration_same_day_is_idempotent() -> Result<()> {
    let planner = planner();
    for (label, intake) in intakes() {
        let today = date(2026, 3, 4);
        let mut snap = snapshot(&intake, busy_history(today), today);

        let first = planner.generate(&snap)?;
        snap.previous = Some(first.calendar.clone());
        let second = planner.generate(&snap)?;
        snap.previous = Some(second.calendar.clone());
        let third = planner.generate(&snap)?;

        assert_eq!(
            first.calendar.plan.sessions, second.calendar.plan.sessions,
            "{}",
            label
        );
        assert_eq!(
            second.calendar.plan.sessions, third.calendar.plan.sessions,
            "{}",
            label
        );
        assert_eq!(
            second.calendar.adaptation.len(),
            third.calendar.adaptation.len(),
            "{}",
            label
        );
    }
    Ok(())
}

#[test]
fn test_phase_boundary_around_taper() -> Result<()> {
    let planner = planner();
    let race = date(2026, 6, 14);
    let intake = intake(
        json!([{ "kind": "endurance", "sub_kind": "marathon", "target_date": race }]),
        every_day(),
    );

    let taper = planner.generate(&snapshot(&intake, Vec::new(), race - Duration::days(21)))?;
    let phase = taper.calendar.blueprint.phase.clone().unwrap();
    assert_eq!(phase.phase, Phase::Taper);
    assert_eq!(phase.taper_week, Some(1));

    let peak = planner.generate(&snapshot(&intake, Vec::new(), race - Duration::days(22)))?;
    assert_eq!(peak.calendar.blueprint.phase.map(|p| p.phase), Some(Phase::Peak));

    let post = planner.generate(&snapshot(&intake, Vec::new(), race + Duration::days(3)))?;
    assert_eq!(post.calendar.blueprint.phase.as_ref().map(|p| p.phase), Some(Phase::Post));
    assert!(upcoming(&post, race + Duration::days(3))
        .iter()
        .all(|s| !s.is_hard()));
    Ok(())
}

#[test]
fn test_acwr_spike_triggers_deload() -> Result<()> {
    let today = date(2026, 3, 30);
    let mut activities: Vec<ActivityRecord> = (7..28)
        .map(|back| run(&format!("base-{}", back), today - Duration::days(back), 30.0, None))
        .collect();
    activities.extend(
        (0..7).map(|back| run(&format!("spike-{}", back), today - Duration::days(back), 90.0, None)),
    );

    let intake = intake(json!([{ "kind": "endurance" }]), every_day());
    let result = planner().generate(&snapshot(&intake, activities, today))?;

    let acwr = result.signals.acwr.unwrap();
    assert!(acwr > 1.3, "acwr {}", acwr);
    assert!(result.calendar.blueprint.deload.active);
    assert!(result
        .calendar
        .plan
        .recommendations
        .iter()
        .any(|note| note.starts_with("Deload week")));
    Ok(())
}
