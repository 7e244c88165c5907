//! Validated time intervals on the academy's local wall clock.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::core::errors::{CalError, Result};

/// Half-open span `[start, end)` with `start < end`.
///
/// Construction is the only validation point: once built, every consumer may
/// assume a strictly positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeInterval {
    /// Build an interval, rejecting zero and negative durations.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        Self::for_event("<anonymous>", start, end)
    }

    /// Same as [`TimeInterval::new`] but names the owning event in the error.
    pub fn for_event(event_id: &str, start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end <= start {
            return Err(CalError::MalformedInterval {
                event_id: event_id.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Inclusive start instant.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive end instant.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Calendar day of the start instant.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Length in minutes, with seconds as a fraction.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }

    /// Minutes elapsed between local midnight and the start instant.
    #[must_use]
    pub fn start_minutes_since_midnight(&self) -> f64 {
        f64::from(self.start.num_seconds_from_midnight()) / 60.0
    }

    /// Half-open intersection test: `self.start < other.end && other.start < self.end`.
    ///
    /// Back-to-back intervals (one ends exactly when the other starts) do not
    /// overlap; intervals sharing a start instant always do.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl<'de> Deserialize<'de> for TimeInterval {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveDateTime,
            end: NaiveDateTime,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn rejects_zero_duration() {
        let err = TimeInterval::new(at(9, 0), at(9, 0)).unwrap_err();
        assert_eq!(err.code(), "ACAL-2001");
    }

    #[test]
    fn rejects_negative_duration_and_names_event() {
        let err = TimeInterval::for_event("evt-9", at(10, 0), at(9, 0)).unwrap_err();
        assert!(err.to_string().contains("evt-9"));
    }

    #[test]
    fn minutes_helpers() {
        let iv = TimeInterval::new(at(9, 30), at(10, 15)).unwrap();
        assert!((iv.duration_minutes() - 45.0).abs() < f64::EPSILON);
        assert!((iv.start_minutes_since_midnight() - 570.0).abs() < f64::EPSILON);
        assert_eq!(iv.start_date(), NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
    }

    #[test]
    fn back_to_back_intervals_do_not_overlap() {
        let a = TimeInterval::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeInterval::new(at(10, 0), at(11, 0)).unwrap();
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn shared_start_and_containment_overlap() {
        let outer = TimeInterval::new(at(9, 0), at(11, 0)).unwrap();
        let same_start = TimeInterval::new(at(9, 0), at(9, 30)).unwrap();
        let inside = TimeInterval::new(at(9, 45), at(10, 0)).unwrap();
        assert!(outer.overlaps(&same_start));
        assert!(outer.overlaps(&inside));
        assert!(inside.overlaps(&outer));
        assert!(!same_start.overlaps(&inside));
    }

    #[test]
    fn deserialize_validates() {
        let ok: TimeInterval =
            serde_json::from_str(r#"{"start":"2024-05-06T09:00:00","end":"2024-05-06T10:00:00"}"#)
                .unwrap();
        assert_eq!(ok.start(), at(9, 0));

        let bad = serde_json::from_str::<TimeInterval>(
            r#"{"start":"2024-05-06T10:00:00","end":"2024-05-06T10:00:00"}"#,
        );
        assert!(bad.is_err());
    }
}
