// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Candidate training dates for the next 7 days

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use tracing::debug;

use super::date_range;
use crate::constants::limits;
use crate::intake::Constraints;

/// Filters the rolling window down to dates a session may occupy
#[derive(Debug, Clone)]
pub struct SlotAllocator<'a> {
    constraints: &'a Constraints,
}

impl<'a> SlotAllocator<'a> {
    pub fn new(constraints: &'a Constraints) -> Self {
        Self { constraints }
    }

    /// Whether `date` is open for training at all
    pub fn is_open(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday();
        self.constraints.available_days.contains(&weekday)
            && !self.constraints.rest_days.contains(&weekday)
            && !self
                .constraints
                .fixed_appointments
                .iter()
                .any(|appointment| appointment.covers(date))
    }

    /// Ordered slots in `[today, today + 6]`, minus `excluded`, capped at
    /// the weekly session limit
    pub fn allocate(&self, today: NaiveDate, excluded: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
        let mut slots: Vec<NaiveDate> = date_range(today, limits::PLANNING_HORIZON_DAYS)
            .filter(|date| self.is_open(*date) && !excluded.contains(date))
            .collect();

        if let Some(cap) = self.constraints.max_sessions_per_week {
            slots.truncate(cap as usize);
        }

        debug!(slots = slots.len(), excluded = excluded.len(), "Slots allocated");
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{FixedAppointment, SeasonWindow};
    use chrono::Weekday;

    fn constraints() -> Constraints {
        Constraints {
            available_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
            rest_days: vec![Weekday::Fri],
            max_minutes_per_day: None,
            max_sessions_per_week: None,
            fixed_appointments: vec![],
            allow_two_a_days: false,
        }
    }

    // 2026-04-06 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, 6).unwrap()
    }

    #[test]
    fn test_rest_days_are_never_slots() {
        let constraints = constraints();
        let slots = SlotAllocator::new(&constraints).allocate(monday(), &BTreeSet::new());
        assert_eq!(slots.len(), 6);
        assert!(slots.iter().all(|d| d.weekday() != Weekday::Fri));
        assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_seasonal_appointment_blocks_weekday() {
        let mut constraints = constraints();
        constraints.fixed_appointments.push(FixedAppointment {
            name: "Hockey".to_string(),
            weekdays: vec![Weekday::Wed],
            season: Some(SeasonWindow {
                start: "10-01".parse().unwrap(),
                end: "03-31".parse().unwrap(),
            }),
        });
        let allocator = SlotAllocator::new(&constraints);

        // April is out of season
        assert!(allocator.is_open(NaiveDate::from_ymd_opt(2026, 4, 8).unwrap()));
        assert!(!allocator.is_open(NaiveDate::from_ymd_opt(2026, 11, 4).unwrap()));
    }

    #[test]
    fn test_excluded_dates_and_weekly_cap() {
        let mut constraints = constraints();
        constraints.max_sessions_per_week = Some(3);
        let excluded: BTreeSet<_> = [monday()].into_iter().collect();

        let slots = SlotAllocator::new(&constraints).allocate(monday(), &excluded);
        assert_eq!(slots.len(), 3);
        assert!(!slots.contains(&monday()));
        assert_eq!(slots[0], NaiveDate::from_ymd_opt(2026, 4, 7).unwrap());
    }
}
