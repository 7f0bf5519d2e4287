// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Training-load and readiness signals derived from recent activity
//!
//! Every run recomputes these from the activity snapshot; nothing here is
//! persisted except the diagnostic copy in the calendar blueprint.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::phase::{Phase, PhaseInfo};
use crate::config::planner_config::{
    LoadThresholds, PlannerConfig, ReadinessThresholds, SignalThresholds,
};
use crate::constants::{limits, rule_ids};
use crate::models::{ActivityRecord, Modality, WellnessRecord};

/// Recovery demand of a single activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Easy,
    Hard,
    VeryHard,
}

/// Injury-risk band of an ACWR value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrZone {
    Undertrained,
    Safe,
    Caution,
    HighRisk,
}

impl AcwrZone {
    pub fn classify(acwr: f64, thresholds: &LoadThresholds) -> Self {
        if acwr < thresholds.acwr_progress_gate {
            Self::Undertrained
        } else if acwr <= thresholds.acwr_deload {
            Self::Safe
        } else if acwr <= 1.5 {
            Self::Caution
        } else {
            Self::HighRisk
        }
    }
}

/// Where a readiness score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    /// Reported directly by the wearable
    Device,
    /// Sleep, HRV and load all contributed
    Complete,
    /// Only some components were available
    Partial,
}

/// Component scores behind a composite readiness value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadinessComponents {
    pub sleep: Option<f64>,
    pub hrv: Option<f64>,
    pub load: Option<f64>,
}

/// Same-day readiness, 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readiness {
    pub score: f64,
    pub quality: DataQuality,
    #[serde(default)]
    pub components: ReadinessComponents,
}

/// Completed sessions per modality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalityCounts {
    pub endurance: usize,
    pub strength: usize,
}

impl ModalityCounts {
    pub fn get(&self, modality: Modality) -> usize {
        match modality {
            Modality::Endurance => self.endurance,
            Modality::Strength => self.strength,
        }
    }

    fn add(&mut self, modality: Modality) {
        match modality {
            Modality::Endurance => self.endurance += 1,
            Modality::Strength => self.strength += 1,
        }
    }
}

/// Derived signals for one planning run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signals {
    pub hard_dates: BTreeSet<NaiveDate>,
    pub very_hard_dates: BTreeSet<NaiveDate>,
    /// Dates carrying any completed activity
    pub completed_dates: BTreeSet<NaiveDate>,
    pub completed_modalities: BTreeMap<NaiveDate, Vec<Modality>>,
    pub completed_counts: ModalityCounts,
    pub recent_volume_minutes: f64,
    pub recent_session_count: usize,
    /// Acute:chronic ratio; absent without enough history
    pub acwr: Option<f64>,
    pub readiness: Option<Readiness>,
}

impl Signals {
    pub fn completed_hard_on(&self, date: NaiveDate) -> bool {
        self.hard_dates.contains(&date)
    }

    pub fn completed_very_hard_on(&self, date: NaiveDate) -> bool {
        self.very_hard_dates.contains(&date)
    }

    /// Completed hard dates in the inclusive range
    pub fn hard_dates_between(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.hard_dates.range(start..=end).count()
    }

    /// Completed activities of `modality` in the inclusive range
    pub fn completed_modality_count(
        &self,
        modality: Modality,
        start: NaiveDate,
        end: NaiveDate,
    ) -> usize {
        self.completed_modalities
            .range(start..=end)
            .flat_map(|(_, modalities)| modalities.iter())
            .filter(|m| **m == modality)
            .count()
    }
}

/// ACWR from already-summed loads: acute ÷ (chronic ÷ 4)
pub fn acwr_from_sums(acute_total: f64, chronic_total: f64) -> Option<f64> {
    let chronic_weekly = chronic_total / 4.0;
    if chronic_weekly <= 0.0 {
        None
    } else {
        Some(acute_total / chronic_weekly)
    }
}

/// Classifies activities and derives load and readiness signals
#[derive(Debug, Clone)]
pub struct SignalModel {
    thresholds: SignalThresholds,
    load: LoadThresholds,
    readiness: ReadinessThresholds,
}

impl SignalModel {
    pub fn new(
        thresholds: SignalThresholds,
        load: LoadThresholds,
        readiness: ReadinessThresholds,
    ) -> Self {
        Self {
            thresholds,
            load,
            readiness,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(
            config.signals.clone(),
            config.load.clone(),
            config.readiness.clone(),
        )
    }

    /// Hard classification: effort, then classification tag, then HR zones,
    /// then activity type when no physiological signal exists
    pub fn is_hard(&self, activity: &ActivityRecord) -> bool {
        let t = &self.thresholds;

        if let Some(effort) = activity.effort {
            return effort >= t.hard_effort;
        }

        if let Some(classification) = &activity.classification {
            let tag = classification.to_lowercase().replace(' ', "");
            if t
                .hard_classification_keywords
                .iter()
                .any(|keyword| tag.contains(keyword.as_str()))
            {
                return true;
            }
        }

        if let Some(zones) = activity.hr_zone_minutes.filter(|z| z.total() > 0.0) {
            let high = zones.high_intensity_minutes();
            return if activity.duration_minutes > t.long_session_minutes {
                high / activity.duration_minutes >= t.high_zone_ratio
            } else {
                high >= t.high_zone_minutes
            };
        }

        let activity_type = activity.activity_type.to_lowercase();
        t.hard_type_keywords
            .iter()
            .any(|keyword| activity_type.contains(keyword.as_str()))
    }

    pub fn is_very_hard(&self, activity: &ActivityRecord) -> bool {
        let t = &self.thresholds;
        let effort_very_hard = activity
            .effort
            .map_or(false, |effort| effort >= t.very_hard_effort);
        let zones_very_hard = activity
            .hr_zone_minutes
            .map_or(false, |z| z.high_intensity_minutes() >= t.very_hard_zone_minutes);
        let long_and_hard =
            activity.duration_minutes >= t.very_long_minutes && self.is_hard(activity);

        effort_very_hard || zones_very_hard || long_and_hard
    }

    pub fn classify(&self, activity: &ActivityRecord) -> Intensity {
        if self.is_very_hard(activity) {
            Intensity::VeryHard
        } else if self.is_hard(activity) {
            Intensity::Hard
        } else {
            Intensity::Easy
        }
    }

    /// Load of one activity: zone-weighted, else effort × duration, else
    /// type multiplier × duration, else duration
    pub fn activity_load(&self, activity: &ActivityRecord) -> f64 {
        if let Some(zones) = activity.hr_zone_minutes.filter(|z| z.total() > 0.0) {
            return zones.weighted_load();
        }
        if let Some(effort) = activity.effort {
            return f64::from(effort) * activity.duration_minutes;
        }
        let activity_type = activity.activity_type.to_lowercase();
        if let Some(entry) = self
            .thresholds
            .type_intensity
            .iter()
            .find(|entry| activity_type.contains(entry.keyword.as_str()))
        {
            return entry.multiplier * activity.duration_minutes;
        }
        activity.duration_minutes
    }

    /// Total load of activities dated in the inclusive range; rest days add zero
    pub fn load_between(
        &self,
        activities: &[ActivityRecord],
        start: NaiveDate,
        end: NaiveDate,
    ) -> f64 {
        activities
            .iter()
            .filter(|a| a.date >= start && a.date <= end)
            .map(|a| self.activity_load(a))
            .sum()
    }

    /// Trailing 7-day load over a quarter of the trailing 28-day load
    pub fn acwr(&self, activities: &[ActivityRecord], today: NaiveDate) -> Option<f64> {
        let earliest = activities
            .iter()
            .filter(|a| a.date <= today)
            .map(|a| a.date)
            .min()?;
        let history_days = (today - earliest).num_days() + 1;
        if history_days < self.load.min_history_days {
            debug!(history_days, "Not enough history for ACWR");
            return None;
        }

        let acute_start = today - Duration::days(limits::RECENT_WINDOW_DAYS - 1);
        let chronic_start = today - Duration::days(limits::CHRONIC_WINDOW_DAYS - 1);
        let acute = self.load_between(activities, acute_start, today);
        let chronic = self.load_between(activities, chronic_start, today);

        acwr_from_sums(acute, chronic)
    }

    /// Today's readiness from the wellness stream, if there is a record for today
    pub fn readiness(
        &self,
        wellness: &[WellnessRecord],
        acwr: Option<f64>,
        today: NaiveDate,
    ) -> Option<Readiness> {
        // Append-only stream: the last record for a date wins
        let record = wellness.iter().filter(|w| w.date == today).last()?;

        if let Some(score) = record.readiness.filter(|s| s.is_finite()) {
            return Some(Readiness {
                score: score.clamp(0.0, 100.0),
                quality: DataQuality::Device,
                components: ReadinessComponents::default(),
            });
        }

        let sleep = record
            .sleep_score
            .map(|score| score.clamp(0.0, 100.0))
            .or_else(|| record.sleep_hours.map(|hours| (hours / 8.0 * 100.0).clamp(0.0, 100.0)));

        let hrv = record.hrv_ms.and_then(|today_hrv| {
            let baseline_start = today - Duration::days(limits::CHRONIC_WINDOW_DAYS);
            let history: Vec<f64> = wellness
                .iter()
                .filter(|w| w.date >= baseline_start && w.date < today)
                .filter_map(|w| w.hrv_ms)
                .collect();
            if history.len() < limits::MIN_HRV_BASELINE_READINGS {
                return None;
            }
            let mean = history.iter().sum::<f64>() / history.len() as f64;
            if mean <= 0.0 {
                return None;
            }
            Some((75.0 + (today_hrv / mean - 1.0) * 250.0).clamp(0.0, 100.0))
        });

        if sleep.is_none() && hrv.is_none() {
            return None;
        }

        let load = acwr.map(|ratio| {
            if ratio <= 1.0 {
                100.0
            } else {
                (100.0 - (ratio - 1.0) * 120.0).clamp(20.0, 100.0)
            }
        });

        let weights = &self.readiness;
        let weighted = [
            (sleep, weights.sleep_weight),
            (hrv, weights.hrv_weight),
            (load, weights.load_weight),
        ];
        let total_weight: f64 = weighted
            .iter()
            .filter(|(value, _)| value.is_some())
            .map(|(_, weight)| weight)
            .sum();
        if total_weight <= 0.0 {
            return None;
        }
        let score = weighted
            .iter()
            .filter_map(|(value, weight)| value.map(|v| v * weight))
            .sum::<f64>()
            / total_weight;

        let quality = if sleep.is_some() && hrv.is_some() && load.is_some() {
            DataQuality::Complete
        } else {
            DataQuality::Partial
        };

        Some(Readiness {
            score: (score * 10.0).round() / 10.0,
            quality,
            components: ReadinessComponents { sleep, hrv, load },
        })
    }

    /// Recompute every signal for `today`
    pub fn compute(
        &self,
        activities: &[ActivityRecord],
        wellness: &[WellnessRecord],
        today: NaiveDate,
    ) -> Signals {
        let recent_start = today - Duration::days(limits::RECENT_WINDOW_DAYS - 1);
        let horizon_end = today + Duration::days(limits::PLANNING_HORIZON_DAYS - 1);
        let mut signals = Signals::default();

        for activity in activities {
            if activity.date >= recent_start && activity.date <= horizon_end {
                signals.completed_dates.insert(activity.date);
            }
            if activity.date < recent_start || activity.date > today {
                continue;
            }

            match self.classify(activity) {
                Intensity::VeryHard => {
                    signals.hard_dates.insert(activity.date);
                    signals.very_hard_dates.insert(activity.date);
                }
                Intensity::Hard => {
                    signals.hard_dates.insert(activity.date);
                }
                Intensity::Easy => {}
            }

            let modality = activity.modality();
            signals
                .completed_modalities
                .entry(activity.date)
                .or_default()
                .push(modality);
            signals.completed_counts.add(modality);
            signals.recent_volume_minutes += activity.duration_minutes;
            signals.recent_session_count += 1;
        }

        signals.acwr = self.acwr(activities, today);
        signals.readiness = self.readiness(wellness, signals.acwr, today);

        debug!(
            hard_days = signals.hard_dates.len(),
            very_hard_days = signals.very_hard_dates.len(),
            volume_minutes = signals.recent_volume_minutes,
            acwr = ?signals.acwr,
            readiness = ?signals.readiness.map(|r| r.score),
            "Signals computed"
        );

        signals
    }
}

/// Whether this cycle runs at reduced volume, and why
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeloadDecision {
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl DeloadDecision {
    fn triggered(rule_id: &str, reason: String) -> Self {
        Self {
            active: true,
            reason: Some(reason),
            rule_id: Some(rule_id.to_string()),
        }
    }

    /// ACWR when available, a blunt volume/frequency check otherwise, then
    /// the planned deload week of base/build phases
    pub fn evaluate(
        signals: &Signals,
        thresholds: &LoadThresholds,
        phase: Option<&PhaseInfo>,
    ) -> Self {
        match signals.acwr {
            Some(acwr) if acwr > thresholds.acwr_deload => {
                return Self::triggered(
                    rule_ids::DELOAD_ACWR,
                    format!("ACWR {:.2} above {:.2}", acwr, thresholds.acwr_deload),
                );
            }
            Some(_) => {}
            None => {
                if signals.recent_volume_minutes > thresholds.fallback_volume_minutes {
                    return Self::triggered(
                        rule_ids::DELOAD_VOLUME_FALLBACK,
                        format!(
                            "{:.0} minutes in the last 7 days exceeds {:.0}",
                            signals.recent_volume_minutes, thresholds.fallback_volume_minutes
                        ),
                    );
                }
                if signals.recent_session_count >= thresholds.fallback_session_count {
                    return Self::triggered(
                        rule_ids::DELOAD_VOLUME_FALLBACK,
                        format!(
                            "{} sessions in the last 7 days",
                            signals.recent_session_count
                        ),
                    );
                }
            }
        }

        if let Some(info) = phase {
            let every = thresholds.planned_deload_every_weeks;
            if matches!(info.phase, Phase::Base | Phase::Build)
                && every > 0
                && info.week_in_phase > 0
                && info.week_in_phase % every == 0
            {
                return Self::triggered(
                    rule_ids::DELOAD_PLANNED_WEEK,
                    format!("Planned deload: week {} of {}", info.week_in_phase, info.phase),
                );
            }
        }

        Self::default()
    }
}
