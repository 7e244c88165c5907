//! Filtering and bucketing sessions into the seven day columns of a week.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::event::ScheduledEvent;

pub const DAYS_PER_WEEK: usize = 7;

/// Program / coach / location selections from the calendar toolbar.
///
/// `None`, an empty string, and `"all"` all mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct EventFilters {
    pub program: Option<String>,
    pub coach: Option<String>,
    pub location: Option<String>,
}

impl EventFilters {
    /// Conjunctive match: every restricted criterion must agree.
    #[must_use]
    pub fn matches(&self, event: &ScheduledEvent) -> bool {
        criterion_matches(self.program.as_deref(), Some(event.program_id.as_str()))
            && criterion_matches(self.coach.as_deref(), event.coach_id.as_deref())
            && criterion_matches(self.location.as_deref(), event.location_id.as_deref())
    }

    /// Whether any criterion is restricted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        [&self.program, &self.coach, &self.location]
            .into_iter()
            .any(|c| restriction(c.as_deref()).is_some())
    }
}

fn restriction(selection: Option<&str>) -> Option<&str> {
    selection
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

fn criterion_matches(selection: Option<&str>, value: Option<&str>) -> bool {
    restriction(selection).is_none_or(|wanted| value == Some(wanted))
}

/// Events of one week grouped by day index `0..=6`; every index is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBuckets {
    pub week_start: NaiveDate,
    pub days: BTreeMap<usize, Vec<ScheduledEvent>>,
}

impl WeekBuckets {
    fn empty(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            days: (0..DAYS_PER_WEEK).map(|i| (i, Vec::new())).collect(),
        }
    }

    /// Events for `index`, empty for out-of-range indices.
    #[must_use]
    pub fn day(&self, index: usize) -> &[ScheduledEvent] {
        self.days.get(&index).map_or(&[], Vec::as_slice)
    }

    /// Calendar date of each day column.
    #[must_use]
    pub fn dates(&self) -> Vec<NaiveDate> {
        week_dates(self.week_start)
    }

    #[must_use]
    pub fn total_events(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }
}

/// Filter `all_events` and bucket the survivors into the week starting at `week_start`.
///
/// Bucketing uses the start date only: a session running past midnight stays
/// on the day it began. Sessions outside the week are dropped. Each day is
/// ordered by `(start, id)`.
pub fn assemble_week(
    all_events: &[ScheduledEvent],
    filters: &EventFilters,
    week_start: NaiveDate,
) -> WeekBuckets {
    let mut week = WeekBuckets::empty(week_start);
    for event in all_events.iter().filter(|e| filters.matches(e)) {
        if let Some(index) = day_index(week_start, event.interval.start_date()) {
            week.days.entry(index).or_default().push(event.clone());
        }
    }
    for events in week.days.values_mut() {
        events.sort_by(|a, b| {
            a.interval
                .start()
                .cmp(&b.interval.start())
                .then_with(|| a.id.cmp(&b.id))
        });
    }
    week
}

/// Offset of `date` from `week_start`, if it falls inside the week.
#[must_use]
pub fn day_index(week_start: NaiveDate, date: NaiveDate) -> Option<usize> {
    let offset = date.signed_duration_since(week_start).num_days();
    usize::try_from(offset).ok().filter(|i| *i < DAYS_PER_WEEK)
}

/// First day of the week containing `date`.
#[must_use]
pub fn week_start_for(date: NaiveDate, starts_on: Weekday) -> NaiveDate {
    let back = (date.weekday().num_days_from_monday() + 7 - starts_on.num_days_from_monday()) % 7;
    date.checked_sub_days(Days::new(u64::from(back)))
        .unwrap_or(date)
}

/// The seven dates starting at `week_start`.
#[must_use]
pub fn week_dates(week_start: NaiveDate) -> Vec<NaiveDate> {
    week_start.iter_days().take(DAYS_PER_WEEK).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::interval::TimeInterval;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn event(id: &str, day: u32, start_h: u32, end_h: u32) -> ScheduledEvent {
        let interval = TimeInterval::new(
            date(day).and_hms_opt(start_h, 0, 0).unwrap(),
            date(day).and_hms_opt(end_h, 0, 0).unwrap(),
        )
        .unwrap();
        ScheduledEvent::new(id, interval)
    }

    fn tagged(
        id: &str,
        day: u32,
        program: &str,
        coach: Option<&str>,
        location: Option<&str>,
    ) -> ScheduledEvent {
        let mut e = event(id, day, 9, 10);
        e.program_id = program.to_string();
        e.coach_id = coach.map(str::to_string);
        e.location_id = location.map(str::to_string);
        e
    }

    #[test]
    fn buckets_by_start_date() {
        // 2024-05-06 is a Monday.
        let events = [event("mon", 6, 9, 10), event("sun", 12, 9, 10), event("next", 13, 9, 10)];
        let week = assemble_week(&events, &EventFilters::default(), date(6));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.day(0)[0].id, "mon");
        assert_eq!(week.day(6)[0].id, "sun");
        assert_eq!(week.total_events(), 2);
    }

    #[test]
    fn overnight_session_stays_on_start_day() {
        let interval = TimeInterval::new(
            date(7).and_hms_opt(22, 0, 0).unwrap(),
            date(8).and_hms_opt(1, 0, 0).unwrap(),
        )
        .unwrap();
        let week = assemble_week(
            &[ScheduledEvent::new("late", interval)],
            &EventFilters::default(),
            date(6),
        );
        assert_eq!(week.day(1).len(), 1);
        assert!(week.day(2).is_empty());
    }

    #[test]
    fn filters_are_conjunctive() {
        let events = [
            tagged("a", 6, "p1", Some("c1"), Some("l1")),
            tagged("b", 6, "p1", Some("c2"), Some("l1")),
            tagged("c", 6, "p2", Some("c1"), Some("l1")),
            tagged("d", 6, "p1", None, None),
        ];
        let filters = EventFilters {
            program: Some("p1".into()),
            coach: Some("c1".into()),
            location: Some("all".into()),
        };
        let week = assemble_week(&events, &filters, date(6));
        let ids: Vec<&str> = week.day(0).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn all_and_blank_mean_unrestricted() {
        let filters = EventFilters {
            program: Some("ALL".into()),
            coach: Some("  ".into()),
            location: None,
        };
        assert!(!filters.is_active());
        assert!(filters.matches(&tagged("x", 6, "p9", None, None)));
    }

    #[test]
    fn filter_matching_nothing_gives_seven_empty_days() {
        let filters = EventFilters {
            program: Some("nope".into()),
            ..EventFilters::default()
        };
        let week = assemble_week(&[event("a", 6, 9, 10)], &filters, date(6));
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.total_events(), 0);
    }

    #[test]
    fn days_sorted_by_start_then_id() {
        let events = [event("z", 6, 9, 10), event("b", 6, 8, 9), event("a", 6, 9, 11)];
        let week = assemble_week(&events, &EventFilters::default(), date(6));
        let ids: Vec<&str> = week.day(0).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z"]);
    }

    #[test]
    fn week_start_for_handles_both_conventions() {
        // Thursday 2024-05-09.
        assert_eq!(week_start_for(date(9), Weekday::Mon), date(6));
        assert_eq!(week_start_for(date(9), Weekday::Sun), date(5));
        assert_eq!(week_start_for(date(6), Weekday::Mon), date(6));
        assert_eq!(
            week_start_for(date(5), Weekday::Mon),
            NaiveDate::from_ymd_opt(2024, 4, 29).unwrap()
        );
    }

    #[test]
    fn day_index_bounds() {
        assert_eq!(day_index(date(6), date(6)), Some(0));
        assert_eq!(day_index(date(6), date(12)), Some(6));
        assert_eq!(day_index(date(6), date(13)), None);
        assert_eq!(day_index(date(6), date(5)), None);
        assert_eq!(week_dates(date(6)).last(), Some(&date(12)));
    }
}
